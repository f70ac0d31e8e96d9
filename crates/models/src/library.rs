use serde::{Deserialize, Serialize};

/// A library as served by `/api/v1/libraries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub id: String,
    pub name: String,
    /// Server-side root path of the library.
    pub root: String,
}
