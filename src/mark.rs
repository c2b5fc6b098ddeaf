//! Machine marks: key/value facts a requester reports about its host

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

pub const MARK_MACHINE_ID: &str = "machine-id";

/// Default location of the machine identifier
pub const MACHINE_ID_PATH: &str = "/etc/machine-id";

/// One reported fact
///
/// When the value could not be collected, `e` says why and `v` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mark {
    #[serde(rename = "K")]
    pub k: String,
    #[serde(rename = "V")]
    pub v: String,
    #[serde(rename = "E")]
    pub e: String,
}

impl Mark {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            k: key.into(),
            v: value.into(),
            e: String::new(),
        }
    }

    pub fn failed(key: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            k: key.into(),
            v: String::new(),
            e: error.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.e.is_empty()
    }
}

/// Something that can produce a mark
pub trait MarkSource {
    fn collect(&self) -> Mark;
}

/// Reads the host's machine identifier from a file
#[derive(Debug, Clone)]
pub struct MachineId {
    path: PathBuf,
}

impl MachineId {
    pub fn new() -> Self {
        Self::from_path(MACHINE_ID_PATH)
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for MachineId {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkSource for MachineId {
    fn collect(&self) -> Mark {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => Mark::new(MARK_MACHINE_ID, data.trim()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read machine id");
                Mark::failed(MARK_MACHINE_ID, e.to_string())
            }
        }
    }
}

/// Collect one mark from each source, in order
pub fn collect_marks(sources: &[&dyn MarkSource]) -> Vec<Mark> {
    sources.iter().map(|source| source.collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mark_json_keys() {
        let json = serde_json::to_string(&Mark::new("machine-id", "abc")).unwrap();
        assert_eq!(json, r#"{"K":"machine-id","V":"abc","E":""}"#);
    }

    #[test]
    fn test_machine_id_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  0123456789abcdef  ").unwrap();

        let mark = MachineId::from_path(file.path()).collect();
        assert_eq!(mark, Mark::new(MARK_MACHINE_ID, "0123456789abcdef"));
        assert!(mark.is_ok());
    }

    #[test]
    fn test_missing_machine_id_records_error() {
        let dir = tempfile::tempdir().unwrap();
        let mark = MachineId::from_path(dir.path().join("absent")).collect();
        assert_eq!(mark.k, MARK_MACHINE_ID);
        assert!(mark.v.is_empty());
        assert!(!mark.is_ok());
    }

    #[test]
    fn test_collect_marks_preserves_order() {
        struct Fixed(&'static str);
        impl MarkSource for Fixed {
            fn collect(&self) -> Mark {
                Mark::new(self.0, "x")
            }
        }

        let marks = collect_marks(&[&Fixed("a"), &Fixed("b")]);
        let keys: Vec<&str> = marks.iter().map(|m| m.k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
