//! Resource model: metadata, spec, and server-observed status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Known lifecycle states.
///
/// States are provider-defined; the poller compares them as opaque strings.
/// These constants cover the values the API is known to report. Deletion has
/// no state of its own - a deleted resource answers 404 on subsequent reads.
pub mod state {
    pub const CREATING: &str = "Creating";
    pub const UPDATING: &str = "Updating";
    pub const ACTIVE: &str = "Active";
    pub const SUSPENDED: &str = "Suspended";
}

/// Resource identity and provenance.
///
/// `verb` reflects the HTTP verb of the operation that produced this view of
/// the resource: `PUT` after create-or-update, `GET` after a read. Scenarios
/// assert it when building expectations; the poller ignores it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    pub provider: String,
    pub api_version: String,
    pub kind: String,
    pub verb: String,
    pub tenant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// One recorded lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateTransition {
    pub state: String,
    pub at: DateTime<Utc>,
}

/// Server-observed lifecycle status. Only this part of a resource is mutated
/// by the server after a mutating call returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Status {
    pub state: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<StateTransition>,
}

/// A managed resource: metadata plus a typed spec plus observable status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource<S> {
    pub metadata: Metadata,
    pub spec: S,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl<S> Resource<S> {
    /// Current lifecycle state, if the server has reported one.
    pub fn state(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.state.as_str())
    }
}
