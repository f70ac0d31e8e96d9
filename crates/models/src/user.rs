//! Authenticated user snapshot returned by `/api/v2/users/me`.

use serde::{Deserialize, Serialize};

/// Identity and authorization attributes of the logged-in user.
///
/// A read-only snapshot: fetched through the credential-bearing request
/// pipeline, cached by the session, and never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub roles: Vec<String>,
    pub shared_all_libraries: bool,
    pub shared_libraries_ids: Vec<String>,
    pub labels_allow: Vec<String>,
    pub labels_exclude: Vec<String>,
    #[serde(default)]
    pub age_restriction: Option<AgeRestriction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRestriction {
    pub age: i32,
    pub restriction: Restriction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Restriction {
    AllowOnly,
    Exclude,
}
