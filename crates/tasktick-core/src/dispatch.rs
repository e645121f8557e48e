//! Inbound event dispatch
//!
//! [`Dispatcher`] applies decoded [`ServerEvent`]s to the entity stores. Each
//! arm does exactly one thing: pull zero or more entities out of the payload
//! and call the matching store upsert. Handlers never touch the wire and
//! retain no state of their own; the `Stores` handle is injected at
//! construction rather than reached through any process-wide global.
//!
//! The match is exhaustive over the closed event union, so a newly added
//! inbound kind fails to compile until it is handled here. Unrecognized tags
//! land in the explicit catch-all variant and are dropped as a logged no-op.

use tracing::{debug, trace};

use crate::protocol::ServerEvent;
use crate::store::Stores;

/// Applies server events to the injected store handle
#[derive(Clone)]
pub struct Dispatcher {
    stores: Stores,
}

impl Dispatcher {
    /// Create a dispatcher writing into `stores`
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Decode-and-apply one inbound event
    pub fn apply(&self, event: ServerEvent) {
        match event {
            ServerEvent::ProjectList { projects } => {
                trace!(count = projects.len(), "applying ProjectList");
                for wire in projects {
                    let (project, tasks) = wire.into_parts();
                    self.stores.upsert_project(project);
                    for task in tasks {
                        self.stores.upsert_task(task);
                    }
                }
            }
            ServerEvent::ProjectRefList { projects } => {
                trace!(count = projects.len(), "applying ProjectRefList");
                for reference in projects {
                    self.stores.upsert_project_ref(reference);
                }
            }
            ServerEvent::UserList { users } => {
                trace!(count = users.len(), "applying UserList");
                for user in users {
                    self.stores.upsert_user(user);
                }
            }
            ServerEvent::TaskList { tasks } => {
                trace!(count = tasks.len(), "applying TaskList");
                for task in tasks {
                    self.stores.upsert_task(task);
                }
            }
            ServerEvent::NoteList { notes } => {
                trace!(count = notes.len(), "applying NoteList");
                for note in notes {
                    self.stores.upsert_note(note);
                }
            }
            ServerEvent::Unrecognized => {
                debug!("ignoring unrecognized server event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ServerEnvelope;
    use crate::types::{ProjectId, TaskId};

    fn dispatch(dispatcher: &Dispatcher, frame: &str) {
        dispatcher.apply(ServerEnvelope::decode(frame).unwrap().payload);
    }

    #[test]
    fn test_task_list_links_into_existing_project() {
        let stores = Stores::new();
        let dispatcher = Dispatcher::new(stores.clone());

        dispatch(
            &dispatcher,
            r#"{"payload":{"_type":"io.surfkit.gateway.api.ProjectRefList",
                "projects":[{"id":"p1","name":"Apollo"}]}}"#,
        );
        dispatch(
            &dispatcher,
            r#"{"payload":{"_type":"io.surfkit.gateway.api.TaskList",
                "tasks":[{"id":"t1","project":"p1","name":"x"}]}}"#,
        );

        let p1 = stores.project(&ProjectId::new("p1")).unwrap();
        assert_eq!(p1.tasks, vec![TaskId::new("t1")]);
    }

    #[test]
    fn test_same_task_list_twice_is_idempotent() {
        let stores = Stores::new();
        let dispatcher = Dispatcher::new(stores.clone());
        let frame = r#"{"payload":{"_type":"io.surfkit.gateway.api.TaskList",
            "tasks":[{"id":"t1","project":"p1","name":"x"}]}}"#;

        dispatch(
            &dispatcher,
            r#"{"payload":{"_type":"io.surfkit.gateway.api.ProjectRefList",
                "projects":[{"id":"p1","name":"Apollo"}]}}"#,
        );
        dispatch(&dispatcher, frame);
        dispatch(&dispatcher, frame);

        let p1 = stores.project(&ProjectId::new("p1")).unwrap();
        assert_eq!(p1.tasks, vec![TaskId::new("t1")]);
        assert_eq!(stores.task_count(), 1);
    }

    #[test]
    fn test_project_list_upserts_embedded_tasks() {
        let stores = Stores::new();
        let dispatcher = Dispatcher::new(stores.clone());

        dispatch(
            &dispatcher,
            r#"{"payload":{"_type":"io.surfkit.gateway.api.ProjectList",
                "projects":[{"id":"p1","name":"Apollo","owner":"u1",
                    "tasks":[{"id":"t1","project":"p1","name":"x"},
                             {"id":"t2","project":"p1","name":"y"}]}]}}"#,
        );

        assert_eq!(stores.task_count(), 2);
        let p1 = stores.project(&ProjectId::new("p1")).unwrap();
        assert_eq!(p1.tasks, vec![TaskId::new("t1"), TaskId::new("t2")]);
    }

    #[test]
    fn test_embedded_task_with_foreign_back_reference_is_not_linked() {
        let stores = Stores::new();
        let dispatcher = Dispatcher::new(stores.clone());

        dispatch(
            &dispatcher,
            r#"{"payload":{"_type":"io.surfkit.gateway.api.ProjectList",
                "projects":[{"id":"p1","name":"Apollo","owner":"u1",
                    "tasks":[{"id":"t1","project":"p2","name":"x"}]}]}}"#,
        );

        // The back-reference wins: t1 is stored under p2, not linked into p1
        assert!(stores.project(&ProjectId::new("p1")).unwrap().tasks.is_empty());
        assert_eq!(
            stores.task(&TaskId::new("t1")).unwrap().project,
            ProjectId::new("p2")
        );
    }

    #[test]
    fn test_unrecognized_event_leaves_stores_unchanged() {
        let stores = Stores::new();
        let dispatcher = Dispatcher::new(stores.clone());

        dispatch(
            &dispatcher,
            r#"{"payload":{"_type":"io.surfkit.gateway.api.SomeFutureThing","x":1}}"#,
        );

        assert_eq!(stores.project_count(), 0);
        assert_eq!(stores.task_count(), 0);
    }

    #[test]
    fn test_user_list_sets_current_user() {
        let stores = Stores::new();
        let dispatcher = Dispatcher::new(stores.clone());

        dispatch(
            &dispatcher,
            r#"{"payload":{"_type":"io.surfkit.gateway.api.UserList",
                "users":[{"id":"u1","firstName":"Ada","lastName":"Lovelace",
                          "email":"ada@example.com"}]}}"#,
        );

        assert_eq!(stores.current_user().unwrap().email, "ada@example.com");
    }

    #[test]
    fn test_note_list_nests_into_task() {
        let stores = Stores::new();
        let dispatcher = Dispatcher::new(stores.clone());

        dispatch(
            &dispatcher,
            r#"{"payload":{"_type":"io.surfkit.gateway.api.TaskList",
                "tasks":[{"id":"t1","project":"p1","name":"x"}]}}"#,
        );
        let note_frame = r#"{"payload":{"_type":"io.surfkit.gateway.api.NoteList",
            "notes":[{"id":"n1","user":"u1","note":"hello","date":1,
                      "project":"p1","task":"t1"}]}}"#;
        dispatch(&dispatcher, note_frame);
        dispatch(&dispatcher, note_frame);

        let t1 = stores.task(&TaskId::new("t1")).unwrap();
        assert_eq!(t1.notes.len(), 1);
    }
}
