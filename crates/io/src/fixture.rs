// Fixture store
// Raw payloads are opaque bytes. Expected files are tab-indented JSON arrays
// of events so regenerated fixtures diff cleanly under version control.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use mbgolden_core::Event;

use crate::error::FixtureError;

/// Loads and saves fixtures, resolving relative locators against `base`.
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    base: Option<PathBuf>,
}

impl FixtureStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: Some(base.into()) }
    }

    pub fn resolve(&self, locator: &Path) -> PathBuf {
        match &self.base {
            Some(base) if locator.is_relative() => base.join(locator),
            _ => locator.to_path_buf(),
        }
    }

    /// Read a raw metrics payload.
    pub fn load_raw(&self, locator: &Path) -> Result<Vec<u8>, FixtureError> {
        let path = self.resolve(locator);
        fs::read(&path).map_err(|e| read_error(&path, e))
    }

    /// Read and decode an expected-events file.
    pub fn load_expected(&self, locator: &Path) -> Result<Vec<Event>, FixtureError> {
        let path = self.resolve(locator);
        let bytes = fs::read(&path).map_err(|e| read_error(&path, e))?;
        decode_events(&bytes, &path)
    }

    /// Replace the expected-events file with `events`.
    pub fn save_expected(&self, locator: &Path, events: &[Event]) -> Result<(), FixtureError> {
        let path = self.resolve(locator);
        let bytes = encode_events(events).map_err(|message| FixtureError::Write {
            path: path.display().to_string(),
            message,
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| FixtureError::Write {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        }

        fs::write(&path, bytes).map_err(|e| FixtureError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        log::info!("Wrote {} expected event(s) to {}", events.len(), path.display());
        Ok(())
    }
}

fn read_error(path: &Path, err: std::io::Error) -> FixtureError {
    if err.kind() == ErrorKind::NotFound {
        FixtureError::NotFound { path: path.display().to_string() }
    } else {
        FixtureError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Decode an expected-events document. A bare `null` reads as no events.
pub fn decode_events(bytes: &[u8], path: &Path) -> Result<Vec<Event>, FixtureError> {
    let events: Option<Vec<Event>> =
        serde_json::from_slice(bytes).map_err(|e| FixtureError::Decode {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    Ok(events.unwrap_or_default())
}

/// Encode events as a tab-indented JSON array with a trailing newline.
pub fn encode_events(events: &[Event]) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    events.serialize(&mut ser).map_err(|e| e.to_string())?;
    buf.push(b'\n');
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn event(job: &str, up: f64) -> Event {
        Event::new()
            .with_module("labels.job", json!(job))
            .with_metricset("metrics.up", json!(up))
    }

    #[test]
    fn load_raw_returns_exact_bytes() {
        let dir = tempdir().unwrap();
        let payload = b"# TYPE up gauge\nup 1\n\xff";
        fs::write(dir.path().join("metrics"), payload).unwrap();

        let store = FixtureStore::new(dir.path());
        assert_eq!(store.load_raw(Path::new("metrics")).unwrap(), payload.to_vec());
    }

    #[test]
    fn load_raw_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FixtureStore::new(dir.path());
        let err = store.load_raw(Path::new("absent")).unwrap_err();
        assert!(matches!(err, FixtureError::NotFound { .. }));
        assert!(err.path().ends_with("absent"));
    }

    #[test]
    fn load_raw_directory_is_read_failure() {
        let dir = tempdir().unwrap();
        let store = FixtureStore::new(dir.path());
        let err = store.load_raw(Path::new(".")).unwrap_err();
        assert!(matches!(err, FixtureError::Read { .. }));
    }

    #[test]
    fn save_then_load_preserves_events() {
        let dir = tempdir().unwrap();
        let store = FixtureStore::new(dir.path());
        let events = vec![event("node", 1.0), event("node", 1.0), event("db", 0.0)];

        store.save_expected(Path::new("out/expected.json"), &events).unwrap();
        let loaded = store.load_expected(Path::new("out/expected.json")).unwrap();

        assert_eq!(loaded.len(), 3);
        for (a, b) in events.iter().zip(&loaded) {
            assert!(a.matches(b));
        }
    }

    #[test]
    fn save_uses_tab_indent_and_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("expected.json");
        fs::write(&path, "stale content that is much longer than the new file").unwrap();

        let store = FixtureStore::default();
        store.save_expected(&path, &[event("node", 1.0)]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n\t{"));
        assert!(text.ends_with("]\n"));
        assert!(!text.contains("stale"));
    }

    #[test]
    fn save_empty_writes_empty_array() {
        let dir = tempdir().unwrap();
        let store = FixtureStore::new(dir.path());
        store.save_expected(Path::new("e.json"), &[]).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("e.json")).unwrap(), "[]\n");
        assert!(store.load_expected(Path::new("e.json")).unwrap().is_empty());
    }

    #[test]
    fn load_expected_null_is_empty() {
        let events = decode_events(b"null", Path::new("x.json")).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn load_expected_malformed_is_decode_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "[{\"root_fields\": ").unwrap();
        let store = FixtureStore::new(dir.path());
        let err = store.load_expected(Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, FixtureError::Decode { .. }));
    }

    #[test]
    fn load_expected_wrong_shape_is_decode_error() {
        let err = decode_events(br#"{"root_fields": {}}"#, Path::new("obj.json")).unwrap_err();
        assert!(err.to_string().contains("obj.json"));
    }

    #[test]
    fn save_into_unwritable_location_fails() {
        let dir = tempdir().unwrap();
        // A regular file where a directory is needed
        fs::write(dir.path().join("blocker"), "x").unwrap();
        let store = FixtureStore::new(dir.path());
        let err = store
            .save_expected(Path::new("blocker/expected.json"), &[event("node", 1.0)])
            .unwrap_err();
        assert!(matches!(err, FixtureError::Write { .. }));
    }

    #[test]
    fn absolute_locator_ignores_base() {
        let store = FixtureStore::new("/does/not/matter");
        let abs = std::env::temp_dir().join("x.json");
        assert_eq!(store.resolve(&abs), abs);
    }
}
