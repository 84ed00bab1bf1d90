//! Schedule walker
//!
//! Enumerates work schedules and flattens each schedule's task tree in
//! depth-first pre-order, so that every parent is visited before its
//! sub-tasks.

use std::collections::HashSet;

use ifc4d_core::{EntityId, GanttError, ScheduleModel, TaskAttributes, TaskRecord, WorkSchedule};
use tracing::{debug, warn};

/// All work schedules of the model, in file declaration order
pub fn collect_schedules<M: ScheduleModel + ?Sized>(model: &M) -> Vec<WorkSchedule> {
    model.work_schedules()
}

/// Walk the task tree of one schedule.
///
/// Sub-tasks are visited in the order the model declares them. Reaching a
/// task a second time fails with [`GanttError::CyclicHierarchy`].
pub fn walk<M: ScheduleModel + ?Sized>(
    model: &M,
    schedule: &WorkSchedule,
) -> Result<Vec<TaskRecord>, GanttError> {
    let mut records = Vec::new();
    let mut visited: HashSet<EntityId> = HashSet::new();

    // (task, attributes, parent, depth); pushed in reverse so pops follow
    // declaration order
    let mut stack: Vec<(EntityId, TaskAttributes, Option<EntityId>, usize)> =
        known_tasks(model, model.root_tasks(schedule.id))
            .into_iter()
            .rev()
            .map(|(task, attributes)| (task, attributes, None, 0))
            .collect();

    while let Some((task, attributes, parent, depth)) = stack.pop() {
        if !visited.insert(task) {
            return Err(GanttError::CyclicHierarchy {
                task,
                name: attributes.display_name().to_string(),
            });
        }

        let children = known_tasks(model, model.child_tasks(task));
        records.push(TaskRecord {
            task,
            attributes,
            parent,
            depth,
            child_count: children.len(),
        });

        for (child, child_attributes) in children.into_iter().rev() {
            stack.push((child, child_attributes, Some(task), depth + 1));
        }
    }

    debug!(
        schedule = %schedule.id,
        tasks = records.len(),
        "walked work schedule"
    );
    Ok(records)
}

/// Resolve references to tasks, dropping those the model cannot resolve
fn known_tasks<M: ScheduleModel + ?Sized>(
    model: &M,
    ids: Vec<EntityId>,
) -> Vec<(EntityId, TaskAttributes)> {
    ids.into_iter()
        .filter_map(|id| {
            let attributes = model.task(id);
            if attributes.is_none() {
                warn!(entity = %id, "skipping reference to an entity that is not a task");
            }
            Some((id, attributes?))
        })
        .collect()
}
