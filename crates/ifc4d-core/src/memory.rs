//! In-memory schedule model.
//!
//! Builds a model programmatically instead of reading a file. Links are
//! stored as given, so malformed graphs (cycles, shared children) can be
//! represented as well.

use std::collections::HashMap;

use crate::{
    EntityId, Predecessor, ScheduleModel, SequenceType, TaskAttributes, WorkSchedule,
};

#[derive(Clone, Debug, Default)]
pub struct MemoryModel {
    source_name: Option<String>,
    schedules: Vec<WorkSchedule>,
    roots: HashMap<EntityId, Vec<EntityId>>,
    children: HashMap<EntityId, Vec<EntityId>>,
    tasks: HashMap<EntityId, TaskAttributes>,
    predecessors: HashMap<EntityId, Vec<Predecessor>>,
    last_id: u64,
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file name reported by `source_name`
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    fn next_id(&mut self) -> EntityId {
        self.last_id += 1;
        EntityId(self.last_id)
    }

    pub fn add_schedule(&mut self, name: impl Into<String>) -> EntityId {
        let id = self.next_id();
        self.schedules.push(WorkSchedule::new(id, name));
        id
    }

    /// Add a schedule without a name
    pub fn add_unnamed_schedule(&mut self) -> EntityId {
        let id = self.next_id();
        self.schedules.push(WorkSchedule {
            id,
            name: None,
            creation_date: None,
        });
        id
    }

    /// Add a top-level task to a schedule
    pub fn add_task(&mut self, schedule: EntityId, attributes: TaskAttributes) -> EntityId {
        let id = self.next_id();
        self.tasks.insert(id, attributes);
        self.roots.entry(schedule).or_default().push(id);
        id
    }

    /// Add a sub-task under `parent`
    pub fn add_subtask(&mut self, parent: EntityId, attributes: TaskAttributes) -> EntityId {
        let id = self.next_id();
        self.tasks.insert(id, attributes);
        self.nest(parent, id);
        id
    }

    /// Declare `child` as a sub-task of `parent`
    pub fn nest(&mut self, parent: EntityId, child: EntityId) {
        self.children.entry(parent).or_default().push(child);
    }

    /// Declare that `successor` follows `predecessor`
    pub fn add_sequence(&mut self, predecessor: EntityId, successor: EntityId, kind: SequenceType) {
        self.predecessors
            .entry(successor)
            .or_default()
            .push(Predecessor {
                task: predecessor,
                kind,
            });
    }

    /// Number of tasks in the model
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl ScheduleModel for MemoryModel {
    fn work_schedules(&self) -> Vec<WorkSchedule> {
        self.schedules.clone()
    }

    fn root_tasks(&self, schedule: EntityId) -> Vec<EntityId> {
        self.roots.get(&schedule).cloned().unwrap_or_default()
    }

    fn child_tasks(&self, task: EntityId) -> Vec<EntityId> {
        self.children.get(&task).cloned().unwrap_or_default()
    }

    fn task(&self, task: EntityId) -> Option<TaskAttributes> {
        self.tasks.get(&task).cloned()
    }

    fn predecessors(&self, task: EntityId) -> Vec<Predecessor> {
        self.predecessors.get(&task).cloned().unwrap_or_default()
    }

    fn source_name(&self) -> Option<String> {
        self.source_name.clone()
    }
}
