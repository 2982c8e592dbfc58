//! JSON and RON snapshots of a net together with its marking.
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::structure::{Marking, NetDefinition, StructureError, Tokens};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron error: {0}")]
    RonParse(#[from] ron::error::SpannedError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Plain-data form of the whole state, field names as written on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "P")]
    pub places: usize,
    #[serde(rename = "T")]
    pub transitions: usize,
    #[serde(rename = "M")]
    pub marking: Vec<Tokens>,
    #[serde(rename = "W_in")]
    pub w_in: Vec<Vec<u8>>,
    #[serde(rename = "W_out")]
    pub w_out: Vec<Vec<u8>>,
    #[serde(rename = "MAX_TOKENS")]
    pub max_tokens: Tokens,
}

impl NetSnapshot {
    pub fn capture(net: &NetDefinition, marking: &Marking) -> Self {
        Self {
            name: None,
            places: net.places(),
            transitions: net.transitions(),
            marking: marking.to_vec(),
            w_in: net.w_in().to_rows(),
            w_out: net.w_out().to_rows(),
            max_tokens: marking.capacity(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Validates everything and splits into the live types.
    pub fn into_parts(self) -> Result<(NetDefinition, Marking), StructureError> {
        let net = NetDefinition::new(self.places, self.transitions, &self.w_in, &self.w_out)?;
        let marking = Marking::new(self.marking, self.max_tokens)?;
        net.check_marking(&marking)?;
        Ok((net, marking))
    }
}

pub fn to_json_string(snapshot: &NetSnapshot) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

pub fn from_json_str(s: &str) -> Result<NetSnapshot, IoError> {
    Ok(serde_json::from_str(s)?)
}

pub fn write_json<P: AsRef<Path>>(path: P, snapshot: &NetSnapshot) -> Result<(), IoError> {
    let mut file = File::create(path)?;
    let content = to_json_string(snapshot)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn read_json<P: AsRef<Path>>(path: P) -> Result<NetSnapshot, IoError> {
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    from_json_str(&content)
}

pub fn to_ron_string(snapshot: &NetSnapshot) -> Result<String, IoError> {
    let mut pretty = PrettyConfig::default();
    pretty.new_line = "\n".into();
    Ok(ron::ser::to_string_pretty(snapshot, pretty)?)
}

pub fn from_ron_str(s: &str) -> Result<NetSnapshot, IoError> {
    Ok(ron::from_str(s)?)
}

pub fn write_ron<P: AsRef<Path>>(path: P, snapshot: &NetSnapshot) -> Result<(), IoError> {
    let mut file = File::create(path)?;
    let content = to_ron_string(snapshot)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn read_ron<P: AsRef<Path>>(path: P) -> Result<NetSnapshot, IoError> {
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    from_ron_str(&content)
}

/// Reads RON when the file ends in `.ron`, JSON otherwise.
pub fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<NetSnapshot, IoError> {
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ron")) {
        read_ron(path)
    } else {
        read_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::structure::MAX_TOKENS;

    fn sample() -> (NetDefinition, Marking) {
        let net = NetDefinition::new(2, 1, &[vec![1, 0]], &[vec![0, 1]]).unwrap();
        let marking = Marking::new(vec![2, 0], MAX_TOKENS).unwrap();
        (net, marking)
    }

    #[test]
    fn json_uses_upper_case_field_names() {
        let (net, marking) = sample();
        let json = to_json_string(&NetSnapshot::capture(&net, &marking).named("demo")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "demo");
        assert_eq!(value["P"], 2);
        assert_eq!(value["M"], serde_json::json!([2, 0]));
        assert_eq!(value["W_in"], serde_json::json!([[1, 0]]));
        assert_eq!(value["MAX_TOKENS"], 3);

        let back = from_json_str(&json).unwrap().into_parts().unwrap();
        assert_eq!(back, (net, marking));
    }

    #[test]
    fn ron_snapshot_reads_back() {
        let (net, marking) = sample();
        let snapshot = NetSnapshot::capture(&net, &marking);
        let ron = to_ron_string(&snapshot).unwrap();
        assert_eq!(from_ron_str(&ron).unwrap(), snapshot);
    }

    #[test]
    fn snapshot_files_are_read_by_extension() {
        let (net, marking) = sample();
        let snapshot = NetSnapshot::capture(&net, &marking).named("files");
        let dir = std::env::temp_dir();
        let json_path = dir.join(format!("petri-sim-io-{}.json", std::process::id()));
        let ron_path = dir.join(format!("petri-sim-io-{}.ron", std::process::id()));

        write_json(&json_path, &snapshot).unwrap();
        write_ron(&ron_path, &snapshot).unwrap();
        let from_json = read_snapshot(&json_path);
        let from_ron = read_snapshot(&ron_path);
        let ron_as_json = read_json(&ron_path);
        let _ = std::fs::remove_file(&json_path);
        let _ = std::fs::remove_file(&ron_path);

        assert_eq!(from_json.unwrap(), snapshot);
        assert_eq!(from_ron.unwrap(), snapshot);
        assert!(matches!(ron_as_json, Err(IoError::Json(_))));
        assert!(matches!(
            read_snapshot(dir.join("petri-sim-io-missing.json")),
            Err(IoError::Io(_))
        ));
    }

    #[test]
    fn invalid_snapshot_is_rejected() {
        let json = r#"{"P": 2, "T": 1, "M": [0, 0], "W_in": [[0, 0]], "W_out": [[0, 1]], "MAX_TOKENS": 3}"#;
        let snapshot = from_json_str(json).unwrap();
        assert!(matches!(
            snapshot.into_parts(),
            Err(StructureError::Disconnected { .. })
        ));

        let json = r#"{"P": 2, "T": 1, "M": [0, 0, 1], "W_in": [[1, 0]], "W_out": [[0, 1]], "MAX_TOKENS": 3}"#;
        assert!(matches!(
            from_json_str(json).unwrap().into_parts(),
            Err(StructureError::MarkingLength { expected: 2, found: 3 })
        ));
    }
}
