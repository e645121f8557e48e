//! Entity model for the TaskTick client
//!
//! Value types for the server-owned entities (users, projects, tasks, notes)
//! and the lightweight project reference form. Identifiers are opaque strings
//! minted by the server; the client never parses them and never infers
//! relationships from anything but explicit id fields.
//!
//! Wire field names are camelCase (`firstName`, `imgUrl`, `lastUpdated`);
//! timestamps are Unix milliseconds.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an opaque server-minted identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the raw identifier string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        // Ids are opaque server-minted strings; display them verbatim
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Unique identifier for a user
    UserId
);
id_type!(
    /// Unique identifier for a project
    ProjectId
);
id_type!(
    /// Unique identifier for a task
    TaskId
);
id_type!(
    /// Unique identifier for a note
    NoteId
);

/// A user account, as sent by the server
///
/// Immutable from the client's perspective; replaced wholesale on receipt,
/// never partially patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    /// Full display name (`first last`)
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A project with its task membership as id references
///
/// `tasks` is a set of identifiers; the authoritative task content lives in
/// the Task store, never embedded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub owner: UserId,
    pub team: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskId>,
}

/// Lightweight project reference (`ProjectRefList` form)
///
/// Carries only enough to render a project picker; upserts as a skeleton
/// project when the full form has not arrived yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: ProjectId,
    pub name: String,
}

impl ProjectRef {
    /// Expand into a skeleton [`Project`] with empty owner/team/description
    pub fn into_skeleton(self) -> Project {
        Project {
            id: self.id,
            name: self.name,
            owner: UserId::new(""),
            team: String::new(),
            description: String::new(),
            img_url: None,
            tasks: Vec::new(),
        }
    }
}

/// A task belonging to exactly one project
///
/// `project` is a back-reference used for lookup only; deleting a project
/// never cascades to its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub project: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default)]
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Task {
    /// Toggle the done flag, stamping `last_updated`
    ///
    /// This is the one permitted optimistic local edit: callers flip the flag
    /// on an already-known task before re-sending it via `EditTask`.
    pub fn toggle_done(&mut self) {
        self.done = !self.done;
        self.last_updated = chrono::Utc::now().timestamp_millis();
    }
}

/// A note attached to exactly one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub user: UserId,
    pub note: String,
    #[serde(default)]
    pub date: i64,
    pub project: ProjectId,
    pub task: TaskId,
}
