//! Units of planned work handed to the executor.
//!
//! A split names one file and optionally a half-open line range within it.
//! JSON form: `{"path": ...}` or `{"path": ..., "startLine": n, "endLine": m}`.

use std::fmt;
use std::net::SocketAddr;

use floe_common::{Error, Result};
use prost::Message;
use serde::{Deserialize, Serialize};

/// Half-open range of zero-based line numbers: `start_line..end_line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineRange {
    start_line: u64,
    end_line: u64,
}

impl LineRange {
    pub fn new(start_line: u64, end_line: u64) -> Result<Self> {
        if start_line > end_line {
            return Err(Error::Parse(format!(
                "line range start {start_line} is after end {end_line}"
            )));
        }
        Ok(Self { start_line, end_line })
    }

    /// Builds a range, collapsing an inverted `end_line` onto `start_line`.
    pub(crate) fn clamped(start_line: u64, end_line: u64) -> Self {
        Self {
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    pub fn start_line(&self) -> u64 {
        self.start_line
    }

    pub fn end_line(&self) -> u64 {
        self.end_line
    }

    pub fn len(&self) -> u64 {
        self.end_line.saturating_sub(self.start_line)
    }

    pub fn is_empty(&self) -> bool {
        self.start_line == self.end_line
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "SplitJson", into = "SplitJson")]
pub struct Split {
    path: String,
    range: Option<LineRange>,
}

impl Split {
    pub fn whole_file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            range: None,
        }
    }

    pub fn line_range(path: impl Into<String>, range: LineRange) -> Self {
        Self {
            path: path.into(),
            range: Some(range),
        }
    }

    fn from_parts(path: String, start_line: Option<u64>, end_line: Option<u64>) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::Parse("split path must not be empty".to_string()));
        }
        let range = match (start_line, end_line) {
            (None, None) => None,
            (Some(start), Some(end)) => Some(LineRange::new(start, end)?),
            _ => {
                return Err(Error::Parse(format!(
                    "split for {path} must carry both startLine and endLine or neither"
                )))
            }
        };
        Ok(Self { path, range })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn range(&self) -> Option<LineRange> {
        self.range
    }

    /// Any worker may process a split; storage is assumed shared.
    pub fn is_remotely_accessible(&self) -> bool {
        true
    }

    /// Preferred hosts. Always empty: the file backend has no locality information.
    pub fn addresses(&self) -> &[SocketAddr] {
        &[]
    }

    pub fn encode_proto(&self) -> Vec<u8> {
        SplitProto::from(self).encode_to_vec()
    }

    pub fn decode_proto(bytes: &[u8]) -> Result<Self> {
        let proto = SplitProto::decode(bytes)
            .map_err(|e| Error::Parse(format!("invalid split message: {e}")))?;
        Self::from_parts(proto.path, proto.start_line, proto.end_line)
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            Some(range) => write!(f, "{}[{}..{})", self.path, range.start_line, range.end_line),
            None => f.write_str(&self.path),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SplitJson {
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_line: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_line: Option<u64>,
}

impl TryFrom<SplitJson> for Split {
    type Error = Error;

    fn try_from(json: SplitJson) -> Result<Self> {
        Split::from_parts(json.path, json.start_line, json.end_line)
    }
}

impl From<Split> for SplitJson {
    fn from(split: Split) -> Self {
        SplitJson {
            path: split.path,
            start_line: split.range.map(|r| r.start_line),
            end_line: split.range.map(|r| r.end_line),
        }
    }
}

/// Protobuf form of a split, as sent to workers.
#[derive(Clone, PartialEq, Message)]
pub struct SplitProto {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(uint64, optional, tag = "2")]
    pub start_line: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub end_line: Option<u64>,
}

impl From<&Split> for SplitProto {
    fn from(split: &Split) -> Self {
        SplitProto {
            path: split.path.clone(),
            start_line: split.range.map(|r| r.start_line),
            end_line: split.range.map(|r| r.end_line),
        }
    }
}
