//! Request groups: a JSON object mapping a group name to request names.
//!
//! ```json
//! { "employees": ["cEmp", "reqEmp"], "lobs": ["src"] }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Request-groups loading errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum GroupsError {
    #[error("cannot read request groups {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("malformed request groups {path}: {message}")]
    #[diagnostic(help("expected a JSON object mapping each group to an array of request names"))]
    Malformed { path: PathBuf, message: String },
}

/// Group membership of request names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestGroups {
    groups: BTreeMap<String, Vec<String>>,
}

impl RequestGroups {
    pub fn load(path: &Path) -> Result<Self, GroupsError> {
        let text = std::fs::read_to_string(path).map_err(|e| GroupsError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|e| GroupsError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse the mapping. Keys whose value is not an array of strings are ignored.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(text)?;
        let groups = raw
            .into_iter()
            .filter_map(|(group, value)| {
                serde_json::from_value::<Vec<String>>(value)
                    .ok()
                    .map(|names| (group, names))
            })
            .collect();
        Ok(Self { groups })
    }

    /// The first group (in name order) listing `request`.
    pub fn group_of(&self, request: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, names)| names.iter().any(|n| n == request))
            .map(|(group, _)| group.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
