//! Observable entity stores
//!
//! [`Stores`] is a cheap-to-clone handle over the in-memory replica of
//! server-owned entities. All mutation goes through upsert operations that
//! enforce the reconciliation rules in [`replica`]; each mutation is followed
//! by an explicit [`StoreEvent`] on a broadcast channel, so change
//! notification is a separate signal rather than implicit reactivity.
//!
//! The replica sits behind a single `parking_lot::RwLock`. Mutations are
//! applied inside one lock scope, so an observer never sees a partially
//! applied merge.

mod replica;

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::types::{Note, NoteId, Project, ProjectId, ProjectRef, Task, TaskId, User, UserId};
use replica::Replica;

/// Default capacity for the store event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notifications emitted after each store mutation
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A user was inserted or replaced
    UserUpserted { id: UserId },
    /// A project was inserted or replaced (links re-derived)
    ProjectUpserted { id: ProjectId },
    /// A task was inserted or replaced (links maintained)
    TaskUpserted { id: TaskId },
    /// A note was inserted or replaced in its owning task
    NoteUpserted { id: NoteId },
    /// Every map was emptied in a single transition (logout)
    Cleared,
}

/// Shared handle to the entity replica
///
/// Clone freely; all clones observe the same state. Mutation happens only
/// through the upsert operations below, which the dispatch layer drives.
#[derive(Clone)]
pub struct Stores {
    inner: Arc<RwLock<Replica>>,
    event_tx: broadcast::Sender<StoreEvent>,
}

impl Stores {
    /// Create an empty store set
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(Replica::new())),
            event_tx,
        }
    }

    /// Subscribe to change notifications
    ///
    /// Multiple subscribers can exist; events are broadcast to all.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No receivers is fine; sends are best-effort notifications
        let _ = self.event_tx.send(event);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mutation (driven by the dispatch layer)
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert or replace a user wholesale
    pub fn upsert_user(&self, user: User) {
        let id = user.id.clone();
        self.inner.write().upsert_user(user);
        self.emit(StoreEvent::UserUpserted { id });
    }

    /// Insert or replace a project, re-deriving its task membership
    pub fn upsert_project(&self, project: Project) {
        let id = project.id.clone();
        self.inner.write().upsert_project(project);
        self.emit(StoreEvent::ProjectUpserted { id });
    }

    /// Insert or replace the skeleton form of a project reference
    pub fn upsert_project_ref(&self, reference: ProjectRef) {
        let id = reference.id.clone();
        self.inner.write().upsert_project_ref(reference);
        self.emit(StoreEvent::ProjectUpserted { id });
    }

    /// Insert or replace a task, maintaining project and note links
    pub fn upsert_task(&self, task: Task) {
        let id = task.id.clone();
        self.inner.write().upsert_task(task);
        self.emit(StoreEvent::TaskUpserted { id });
    }

    /// Insert or replace a note in its owning task
    pub fn upsert_note(&self, note: Note) {
        let id = note.id.clone();
        self.inner.write().upsert_note(note);
        self.emit(StoreEvent::NoteUpserted { id });
    }

    /// Empty every map atomically (logout)
    pub fn clear(&self) {
        self.inner.write().clear();
        self.emit(StoreEvent::Cleared);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reads (cloned snapshots)
    // ═══════════════════════════════════════════════════════════════════════

    /// The session's current user, if the bootstrap reply has arrived
    pub fn current_user(&self) -> Option<User> {
        self.inner.read().current_user().cloned()
    }

    /// Look up a user by id
    pub fn user(&self, id: &UserId) -> Option<User> {
        self.inner.read().user(id).cloned()
    }

    /// All known users in arrival order
    pub fn users(&self) -> Vec<User> {
        self.inner.read().users().cloned().collect()
    }

    /// Look up a project by id
    pub fn project(&self, id: &ProjectId) -> Option<Project> {
        self.inner.read().project(id).cloned()
    }

    /// All known projects in arrival order
    pub fn projects(&self) -> Vec<Project> {
        self.inner.read().projects().cloned().collect()
    }

    /// Look up a task by id
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.inner.read().task(id).cloned()
    }

    /// All known tasks in arrival order
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.read().tasks().cloned().collect()
    }

    /// Tasks belonging to a project, derived from `Task.project` at read time
    pub fn tasks_for(&self, project: &ProjectId) -> Vec<Task> {
        self.inner.read().tasks_for(project).cloned().collect()
    }

    /// Look up a note by id
    pub fn note(&self, id: &NoteId) -> Option<Note> {
        self.inner.read().note(id).cloned()
    }

    /// Number of known tasks
    pub fn task_count(&self) -> usize {
        self.inner.read().task_count()
    }

    /// Number of known projects
    pub fn project_count(&self) -> usize {
        self.inner.read().project_count()
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, project: &str) -> Task {
        Task {
            id: TaskId::new(id),
            project: ProjectId::new(project),
            name: format!("task {}", id),
            description: String::new(),
            done: false,
            assigned: None,
            start_date: None,
            end_date: None,
            last_updated: 0,
            section: "backlog".to_string(),
            parent: None,
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_clones_share_state() {
        let stores = Stores::new();
        let other = stores.clone();

        stores.upsert_task(task("t1", "p1"));
        assert_eq!(other.task_count(), 1);
    }

    #[test]
    fn test_upsert_emits_event() {
        let stores = Stores::new();
        let mut events = stores.subscribe();

        stores.upsert_task(task("t1", "p1"));
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::TaskUpserted {
                id: TaskId::new("t1")
            }
        );
    }

    #[test]
    fn test_clear_emits_single_event() {
        let stores = Stores::new();
        stores.upsert_task(task("t1", "p1"));
        stores.upsert_task(task("t2", "p1"));

        let mut events = stores.subscribe();
        stores.clear();

        assert_eq!(events.try_recv().unwrap(), StoreEvent::Cleared);
        assert!(events.try_recv().is_err());
        assert_eq!(stores.task_count(), 0);
    }

    #[test]
    fn test_snapshot_is_detached_from_store() {
        let stores = Stores::new();
        stores.upsert_task(task("t1", "p1"));

        let mut snapshot = stores.task(&TaskId::new("t1")).unwrap();
        snapshot.name = "local edit".to_string();

        // Local edits to a snapshot do not leak back into the replica
        assert_eq!(stores.task(&TaskId::new("t1")).unwrap().name, "task t1");
    }
}
