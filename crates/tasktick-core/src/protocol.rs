//! Wire protocol for the TaskTick gateway
//!
//! Every message crosses the socket as a JSON text frame with one outer
//! wrapper: `{"payload": {"_type": "<namespace>.<EventName>", ...fields}}`.
//! The `_type` tag identifies both the semantic event and its payload shape.
//!
//! Both directions are closed unions. Outbound, the tag is derived from the
//! [`ClientEvent`] variant at serialization time, so a tag/payload mismatch
//! is unrepresentable. Inbound, unrecognized tags decode to the explicit
//! [`ServerEvent::Unrecognized`] variant and are dropped as a no-op; that is
//! deliberate forward compatibility, not an error.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::types::{Note, Project, ProjectId, ProjectRef, Task, TaskId, User, UserId};

/// Namespace prefix shared by client and server for every `_type` tag
pub const EVENT_NAMESPACE: &str = "io.surfkit.gateway.api";

/// Events the client sends to the server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "_type")]
pub enum ClientEvent {
    /// Request the current user (first half of the bootstrap sequence)
    #[serde(rename = "io.surfkit.gateway.api.GetUser")]
    GetUser,

    /// Request a page of projects (second half of the bootstrap sequence)
    #[serde(rename = "io.surfkit.gateway.api.GetProjects")]
    GetProjects { skip: u32, take: u32 },

    /// Create a new project
    #[serde(rename = "io.surfkit.gateway.api.NewProject")]
    NewProject {
        name: String,
        description: String,
        owner: UserId,
        team: String,
    },

    /// Create a new task in a project
    #[serde(rename = "io.surfkit.gateway.api.NewTask")]
    NewTask {
        project: ProjectId,
        name: String,
        description: String,
        section: String,
    },

    /// Replace a task wholesale with an edited copy
    #[serde(rename = "io.surfkit.gateway.api.EditTask")]
    EditTask { task: Task },

    /// Attach a note to a task
    #[serde(rename = "io.surfkit.gateway.api.NewNote")]
    NewNote {
        task: TaskId,
        project: ProjectId,
        note: String,
    },

    /// Liveness ping; fire-and-forget, no reply is awaited
    #[serde(rename = "io.surfkit.gateway.api.HeartBeat")]
    HeartBeat { ts: i64 },
}

impl ClientEvent {
    /// `GetProjects` for one page starting at `skip`
    pub fn get_projects(skip: u32, take: u32) -> Self {
        ClientEvent::GetProjects { skip, take }
    }

    /// `NewProject` with locally minted placeholder owner/team ids
    ///
    /// The server replaces the placeholders with real ids; the client only
    /// needs them to be unique within the request.
    pub fn new_project(name: impl Into<String>, description: impl Into<String>) -> Self {
        ClientEvent::NewProject {
            name: name.into(),
            description: description.into(),
            owner: UserId::new(uuid::Uuid::new_v4().to_string()),
            team: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// `HeartBeat` stamped with the current time in Unix milliseconds
    pub fn heartbeat() -> Self {
        ClientEvent::HeartBeat {
            ts: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// The namespaced `_type` tag this event serializes under
    pub fn type_tag(&self) -> &'static str {
        match self {
            ClientEvent::GetUser => "io.surfkit.gateway.api.GetUser",
            ClientEvent::GetProjects { .. } => "io.surfkit.gateway.api.GetProjects",
            ClientEvent::NewProject { .. } => "io.surfkit.gateway.api.NewProject",
            ClientEvent::NewTask { .. } => "io.surfkit.gateway.api.NewTask",
            ClientEvent::EditTask { .. } => "io.surfkit.gateway.api.EditTask",
            ClientEvent::NewNote { .. } => "io.surfkit.gateway.api.NewNote",
            ClientEvent::HeartBeat { .. } => "io.surfkit.gateway.api.HeartBeat",
        }
    }
}

/// A project as it appears on the wire in `ProjectList`
///
/// The full form embeds complete Task objects inline; every other inbound
/// list references tasks by id only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWire {
    pub id: ProjectId,
    pub name: String,
    pub owner: UserId,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ProjectWire {
    /// Split into the store form: a [`Project`] holding task ids, plus the
    /// embedded tasks themselves
    pub fn into_parts(self) -> (Project, Vec<Task>) {
        let project = Project {
            id: self.id,
            name: self.name,
            owner: self.owner,
            team: self.team,
            description: self.description,
            img_url: self.img_url,
            tasks: self.tasks.iter().map(|t| t.id.clone()).collect(),
        };
        (project, self.tasks)
    }
}

/// Events the server sends to the client
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "_type")]
pub enum ServerEvent {
    /// Full projects with tasks embedded inline
    #[serde(rename = "io.surfkit.gateway.api.ProjectList")]
    ProjectList { projects: Vec<ProjectWire> },

    /// Lightweight project references (id and name only)
    #[serde(rename = "io.surfkit.gateway.api.ProjectRefList")]
    ProjectRefList { projects: Vec<ProjectRef> },

    /// Users, replaced wholesale on receipt
    #[serde(rename = "io.surfkit.gateway.api.UserList")]
    UserList { users: Vec<User> },

    /// Tasks referencing their projects by id
    #[serde(rename = "io.surfkit.gateway.api.TaskList")]
    TaskList { tasks: Vec<Task> },

    /// Notes referencing their tasks by id
    #[serde(rename = "io.surfkit.gateway.api.NoteList")]
    NoteList { notes: Vec<Note> },

    /// Any tag this client does not know; dropped as a no-op
    #[serde(other)]
    Unrecognized,
}

/// Outbound envelope: `{"payload": {...}}`
#[derive(Debug, Clone, Serialize)]
pub struct ClientEnvelope {
    pub payload: ClientEvent,
}

impl ClientEnvelope {
    /// Wrap an event for transmission
    pub fn new(payload: ClientEvent) -> Self {
        Self { payload }
    }

    /// Encode to a JSON text frame
    pub fn encode(&self) -> ClientResult<String> {
        serde_json::to_string(self).map_err(|e| ClientError::Serialization(e.to_string()))
    }
}

/// Inbound envelope: `{"payload": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ServerEnvelope {
    pub payload: ServerEvent,
}

impl ServerEnvelope {
    /// Decode from a JSON text frame
    pub fn decode(frame: &str) -> ClientResult<Self> {
        serde_json::from_str(frame).map_err(|e| ClientError::Serialization(e.to_string()))
    }
}
