use std::fmt;

#[derive(Debug)]
pub enum FixtureError {
    /// The fixture path does not exist.
    NotFound { path: String },
    /// The fixture exists but could not be read.
    Read { path: String, message: String },
    /// The expected file is not a JSON array of events.
    Decode { path: String, message: String },
    /// The expected file could not be written.
    Write { path: String, message: String },
}

impl FixtureError {
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path }
            | Self::Read { path, .. }
            | Self::Decode { path, .. }
            | Self::Write { path, .. } => path,
        }
    }
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "fixture not found: {path}"),
            Self::Read { path, message } => write!(f, "cannot read fixture {path}: {message}"),
            Self::Decode { path, message } => {
                write!(f, "cannot decode expected events in {path}: {message}")
            }
            Self::Write { path, message } => write!(f, "cannot write fixture {path}: {message}"),
        }
    }
}

impl std::error::Error for FixtureError {}
