//! In-memory entity replica with merge reconciliation
//!
//! [`Replica`] holds every entity map behind one writer (see the `Stores`
//! handle for locking) and enforces cross-entity consistency on each write:
//!
//! - Upsert-by-id is last-write-wins; the server is authoritative for the
//!   fields it sends.
//! - A project's `tasks` list and a task's `project` field stay mutually
//!   consistent after every merge, with at most one entry per id.
//! - Arrival order does not matter: tasks and notes live in their own maps,
//!   and parent links are re-derived whenever the parent is upserted, so a
//!   child arriving before its parent self-heals instead of being dropped.

use indexmap::IndexMap;

use crate::types::{Note, NoteId, Project, ProjectId, ProjectRef, Task, TaskId, User, UserId};

/// The entity maps, insertion-ordered so observers see arrival order
#[derive(Debug, Default)]
pub(super) struct Replica {
    users: IndexMap<UserId, User>,
    projects: IndexMap<ProjectId, Project>,
    tasks: IndexMap<TaskId, Task>,
    notes: IndexMap<NoteId, Note>,
    /// First user ever upserted; the bootstrap `GetUser` reply arrives
    /// before any other `UserList`
    current_user: Option<UserId>,
}

impl Replica {
    pub(super) fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Upserts
    // ═══════════════════════════════════════════════════════════════════════

    /// Replace-or-insert a user wholesale
    pub(super) fn upsert_user(&mut self, user: User) {
        if self.current_user.is_none() {
            self.current_user = Some(user.id.clone());
        }
        self.users.insert(user.id.clone(), user);
    }

    /// Replace-or-insert a project, re-deriving its task membership
    ///
    /// The incoming `tasks` list is deduped, then extended with every known
    /// task whose `project` back-reference matches. A task that arrived
    /// before this project is therefore linked now rather than lost. The
    /// back-reference is authoritative: an incoming id whose known task
    /// points at a different project is dropped.
    pub(super) fn upsert_project(&mut self, mut project: Project) {
        let mut linked: Vec<TaskId> = Vec::with_capacity(project.tasks.len());
        for id in project.tasks.drain(..) {
            if let Some(task) = self.tasks.get(&id) {
                if task.project != project.id {
                    continue;
                }
            }
            if !linked.contains(&id) {
                linked.push(id);
            }
        }
        for (id, task) in &self.tasks {
            if task.project == project.id && !linked.contains(id) {
                linked.push(id.clone());
            }
        }
        project.tasks = linked;
        self.projects.insert(project.id.clone(), project);
    }

    /// Upsert the skeleton form of a project reference
    pub(super) fn upsert_project_ref(&mut self, reference: ProjectRef) {
        self.upsert_project(reference.into_skeleton());
    }

    /// Replace-or-insert a task, maintaining both surrounding links
    ///
    /// Embedded notes are folded into the note map, the task's own `notes`
    /// collection is rebuilt with one entry per note id, and the owning
    /// project (if known) gets the task id exactly once.
    pub(super) fn upsert_task(&mut self, mut task: Task) {
        // The back-reference is authoritative: this id may not stay linked
        // in any project other than `task.project`, including projects that
        // announced it before the task itself arrived
        for project in self.projects.values_mut() {
            if project.id != task.project {
                project.tasks.retain(|id| id != &task.id);
            }
        }

        for note in &task.notes {
            self.notes.insert(note.id.clone(), note.clone());
        }

        let mut notes: Vec<Note> = Vec::with_capacity(task.notes.len());
        for note in task.notes.drain(..) {
            if note.task == task.id && !notes.iter().any(|n| n.id == note.id) {
                notes.push(note);
            }
        }
        for note in self.notes.values() {
            if note.task == task.id && !notes.iter().any(|n| n.id == note.id) {
                notes.push(note.clone());
            }
        }
        task.notes = notes;

        if let Some(project) = self.projects.get_mut(&task.project) {
            if !project.tasks.contains(&task.id) {
                project.tasks.push(task.id.clone());
            }
        }
        self.tasks.insert(task.id.clone(), task);
    }

    /// Replace-or-insert a note, placing it in its owning task exactly once
    pub(super) fn upsert_note(&mut self, note: Note) {
        // Reassignment unlinks from the previous owner
        if let Some(previous) = self.notes.get(&note.id) {
            if previous.task != note.task {
                if let Some(old) = self.tasks.get_mut(&previous.task) {
                    old.notes.retain(|n| n.id != note.id);
                }
            }
        }

        if let Some(task) = self.tasks.get_mut(&note.task) {
            if let Some(existing) = task.notes.iter_mut().find(|n| n.id == note.id) {
                *existing = note.clone();
            } else {
                task.notes.push(note.clone());
            }
        }
        self.notes.insert(note.id.clone(), note);
    }

    /// Empty every map in one step (logout)
    pub(super) fn clear(&mut self) {
        self.users.clear();
        self.projects.clear();
        self.tasks.clear();
        self.notes.clear();
        self.current_user = None;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn user(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    pub(super) fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub(super) fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref().and_then(|id| self.users.get(id))
    }

    pub(super) fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id)
    }

    pub(super) fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub(super) fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub(super) fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Membership derived from `Task.project` at read time, independent of
    /// the denormalized `Project.tasks` list
    pub(super) fn tasks_for(&self, project: &ProjectId) -> impl Iterator<Item = &Task> {
        let project = project.clone();
        self.tasks.values().filter(move |t| t.project == project)
    }

    pub(super) fn note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.get(id)
    }

    pub(super) fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub(super) fn project_count(&self) -> usize {
        self.projects.len()
    }
}
