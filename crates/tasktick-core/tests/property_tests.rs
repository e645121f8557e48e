//! Property-based tests for store merge invariants
//!
//! Uses proptest to verify that no interleaving of inbound upserts can break
//! the cross-entity consistency rules: project/task links stay mutually
//! consistent, with at most one entry per id, regardless of arrival order or
//! repetition.

use proptest::prelude::*;

use tasktick_core::{Note, NoteId, Project, ProjectId, Stores, Task, TaskId, UserId};

// ============================================================================
// Strategy Generators
// ============================================================================

fn project(index: usize, task_indices: &[usize]) -> Project {
    Project {
        id: ProjectId::new(format!("p{}", index)),
        name: format!("project {}", index),
        owner: UserId::new("u1"),
        team: "team".to_string(),
        description: String::new(),
        img_url: None,
        tasks: task_indices
            .iter()
            .map(|i| TaskId::new(format!("t{}", i)))
            .collect(),
    }
}

fn task(index: usize, project_index: usize) -> Task {
    Task {
        id: TaskId::new(format!("t{}", index)),
        project: ProjectId::new(format!("p{}", project_index)),
        name: format!("task {}", index),
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

fn note(index: usize, task_index: usize, project_index: usize) -> Note {
    Note {
        id: NoteId::new(format!("n{}", index)),
        user: UserId::new("u1"),
        note: format!("note {}", index),
        date: 0,
        project: ProjectId::new(format!("p{}", project_index)),
        task: TaskId::new(format!("t{}", task_index)),
    }
}

/// One inbound upsert drawn from a small id pool so collisions are frequent
///
/// Project payloads carry their own incoming task-id lists, so forward links
/// can disagree with a task's back-reference (including ids of tasks that
/// have not arrived yet).
#[derive(Debug, Clone)]
enum StoreOp {
    Project { project: usize, tasks: Vec<usize> },
    Task { task: usize, project: usize },
    Note { note: usize, task: usize },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (0..3usize, prop::collection::vec(0..6usize, 0..4))
            .prop_map(|(project, tasks)| StoreOp::Project { project, tasks }),
        (0..6usize, 0..3usize).prop_map(|(task, project)| StoreOp::Task { task, project }),
        (0..6usize, 0..6usize).prop_map(|(note, task)| StoreOp::Note { note, task }),
    ]
}

fn apply(stores: &Stores, op: &StoreOp) {
    match op {
        StoreOp::Project { project: p, tasks } => stores.upsert_project(project(*p, tasks)),
        StoreOp::Task { task: t, project: p } => stores.upsert_task(task(*t, *p)),
        StoreOp::Note { note: n, task: t } => stores.upsert_note(note(*n, *t, 0)),
    }
}

/// The cross-entity consistency rules that must hold after any merge
fn assert_consistent(stores: &Stores) {
    for p in stores.projects() {
        // No duplicate ids in any project's task list
        let mut seen = std::collections::HashSet::new();
        for id in &p.tasks {
            assert!(seen.insert(id.clone()), "duplicate task id in {}", p.id);
        }
        // Every known task pointing at this project is linked
        for t in stores.tasks_for(&p.id) {
            assert!(p.tasks.contains(&t.id), "missing link {} -> {}", p.id, t.id);
        }
        // Every linked task that exists points back at this project
        for id in &p.tasks {
            if let Some(t) = stores.task(id) {
                assert_eq!(t.project, p.id, "stale link {} -> {}", p.id, id);
            }
        }
    }
    for t in stores.tasks() {
        let mut seen = std::collections::HashSet::new();
        for n in &t.notes {
            assert!(seen.insert(n.id.clone()), "duplicate note id in {}", t.id);
            assert_eq!(n.task, t.id, "foreign note nested in {}", t.id);
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Applying the same project payload twice equals applying it once
    #[test]
    fn project_upsert_is_idempotent(ops in prop::collection::vec(store_op_strategy(), 0..20), p in 0..3usize, ids in prop::collection::vec(0..6usize, 0..4)) {
        let stores = Stores::new();
        for op in &ops {
            apply(&stores, op);
        }

        stores.upsert_project(project(p, &ids));
        let once = stores.projects();
        stores.upsert_project(project(p, &ids));
        let twice = stores.projects();

        prop_assert_eq!(once, twice);
    }

    /// Repeating any upsert never changes the final state
    #[test]
    fn repeated_op_is_idempotent(ops in prop::collection::vec(store_op_strategy(), 0..20), last in store_op_strategy()) {
        let stores = Stores::new();
        for op in &ops {
            apply(&stores, op);
        }

        apply(&stores, &last);
        let once = (stores.projects(), stores.tasks());
        apply(&stores, &last);
        let twice = (stores.projects(), stores.tasks());

        prop_assert_eq!(once, twice);
    }

    /// Links are consistent after any interleaving of arrivals
    #[test]
    fn any_arrival_order_is_consistent(ops in prop::collection::vec(store_op_strategy(), 0..40)) {
        let stores = Stores::new();
        for op in &ops {
            apply(&stores, op);
            assert_consistent(&stores);
        }
    }

    /// Task membership derived at read time matches the denormalized list
    /// once the project is known
    #[test]
    fn derived_membership_matches_links(ops in prop::collection::vec(store_op_strategy(), 0..40)) {
        let stores = Stores::new();
        for op in &ops {
            apply(&stores, op);
        }

        for p in stores.projects() {
            let derived: std::collections::HashSet<_> =
                stores.tasks_for(&p.id).into_iter().map(|t| t.id).collect();
            let linked: std::collections::HashSet<_> = p
                .tasks
                .iter()
                .filter(|id| stores.task(id).is_some())
                .cloned()
                .collect();
            prop_assert_eq!(derived, linked);
        }
    }

    /// Clear always yields an empty, consistent replica
    #[test]
    fn clear_resets_everything(ops in prop::collection::vec(store_op_strategy(), 0..20)) {
        let stores = Stores::new();
        for op in &ops {
            apply(&stores, op);
        }

        stores.clear();
        prop_assert_eq!(stores.project_count(), 0);
        prop_assert_eq!(stores.task_count(), 0);
        prop_assert!(stores.current_user().is_none());
    }
}
