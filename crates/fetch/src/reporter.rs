use mbgolden_core::Event;

use crate::error::FetchError;

/// Collects everything a metric set reports during a cycle.
#[derive(Debug, Default)]
pub struct CapturingReporter {
    events: Vec<Event>,
    errors: Vec<FetchError>,
}

impl CapturingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn error(&mut self, error: FetchError) {
        log::debug!("Fetch error reported: {}", error);
        self.errors.push(error);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn errors(&self) -> &[FetchError] {
        &self.errors
    }

    pub fn into_output(self) -> FetchOutput {
        FetchOutput {
            events: self.events,
            errors: self.errors,
        }
    }
}

/// Events and errors from one collection cycle.
#[derive(Debug, Default)]
pub struct FetchOutput {
    pub events: Vec<Event>,
    pub errors: Vec<FetchError>,
}

impl FetchOutput {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
