//! # ifc4d-core
//!
//! Core domain model and traits for ifc4d-gantt.
//!
//! This crate provides:
//! - Domain types: `WorkSchedule`, `TaskAttributes`, `TaskRecord`, `Row`, `Extraction`
//! - Core traits: `ScheduleModel` (read-only model access), `Renderer`
//! - An in-memory `ScheduleModel` for tests and programmatic use
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use ifc4d_core::{MemoryModel, ScheduleModel, TaskAttributes};
//!
//! let mut model = MemoryModel::new();
//! let schedule = model.add_schedule("Construction");
//! let shell = model.add_task(schedule, TaskAttributes::named("Shell"));
//! model.add_subtask(shell, TaskAttributes::named("Foundations"));
//!
//! assert_eq!(model.work_schedules().len(), 1);
//! assert_eq!(model.child_tasks(shell).len(), 1);
//! ```

pub mod memory;
pub mod temporal;

pub use memory::MemoryModel;
pub use temporal::{parse_date, Duration};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Name used for schedules and tasks that carry no name in the model
pub const UNNAMED: &str = "Unnamed";

// ============================================================================
// Identity
// ============================================================================

/// Identity of an entity inside the source model (the STEP instance number)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Model entities
// ============================================================================

/// A named container of top-level tasks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkSchedule {
    pub id: EntityId,
    pub name: Option<String>,
    /// Creation date as written in the model
    pub creation_date: Option<String>,
}

impl WorkSchedule {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            creation_date: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }
}

/// Scheduling attributes of a single task, as stated in the model
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskAttributes {
    pub name: Option<String>,
    pub description: Option<String>,
    /// WBS code or other user identification
    pub identification: Option<String>,
    pub is_milestone: bool,
    /// Nominal start date
    pub start: Option<NaiveDate>,
    /// Nominal finish date
    pub finish: Option<NaiveDate>,
    /// Nominal duration
    pub duration: Option<Duration>,
    /// Completion as a ratio (0.0-1.0) or a percentage (above 1.0)
    pub completion: Option<f64>,
}

impl TaskAttributes {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn start(mut self, date: NaiveDate) -> Self {
        self.start = Some(date);
        self
    }

    pub fn finish(mut self, date: NaiveDate) -> Self {
        self.finish = Some(date);
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn completion(mut self, completion: f64) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn milestone(mut self) -> Self {
        self.is_milestone = true;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }
}

/// Kind of a sequence link between two tasks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceType {
    #[default]
    FinishStart,
    StartStart,
    FinishFinish,
    StartFinish,
}

impl SequenceType {
    /// Two-letter code understood by the chart widget
    pub fn code(self) -> &'static str {
        match self {
            SequenceType::FinishStart => "FS",
            SequenceType::StartStart => "SS",
            SequenceType::FinishFinish => "FF",
            SequenceType::StartFinish => "SF",
        }
    }
}

/// A predecessor of a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predecessor {
    pub task: EntityId,
    pub kind: SequenceType,
}

// ============================================================================
// Model access
// ============================================================================

/// Read-only view of a building-data model, narrowed to what schedule
/// extraction needs.
///
/// Implementations must return lists in model declaration order so that
/// extraction is deterministic.
pub trait ScheduleModel {
    /// All work schedules, in file declaration order
    fn work_schedules(&self) -> Vec<WorkSchedule>;

    /// Top-level tasks controlled by a work schedule
    fn root_tasks(&self, schedule: EntityId) -> Vec<EntityId>;

    /// Direct sub-tasks of a task, in decomposition order
    fn child_tasks(&self, task: EntityId) -> Vec<EntityId>;

    /// Attributes of a task, or `None` if the entity is not a task
    fn task(&self, task: EntityId) -> Option<TaskAttributes>;

    /// Tasks that precede `task` through sequence links
    fn predecessors(&self, _task: EntityId) -> Vec<Predecessor> {
        Vec::new()
    }

    /// File name recorded for the model, if known
    fn source_name(&self) -> Option<String> {
        None
    }
}

// ============================================================================
// Extraction output
// ============================================================================

/// One visited task, as produced by the schedule walker
#[derive(Clone, Debug, PartialEq)]
pub struct TaskRecord {
    pub task: EntityId,
    pub attributes: TaskAttributes,
    /// Parent task, `None` for roots of the schedule
    pub parent: Option<EntityId>,
    /// Depth in the hierarchy (0 for roots)
    pub depth: usize,
    /// Number of direct sub-tasks
    pub child_count: usize,
}

impl TaskRecord {
    pub fn is_group(&self) -> bool {
        self.child_count > 0
    }
}

/// A resolved link to a predecessor row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDependency {
    pub predecessor: u32,
    pub kind: SequenceType,
}

/// Flattened, chart-ready representation of a task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Sequential id, 1-based, unique across the document
    pub id: u32,
    /// Id of the parent row, 0 for roots
    pub parent: u32,
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Duration in whole days
    pub duration_days: Option<i64>,
    /// 0-100
    pub percent_complete: u8,
    pub is_group: bool,
    pub is_milestone: bool,
    pub notes: String,
    pub depends: Vec<RowDependency>,
    pub depth: usize,
}

/// Rows belonging to one work schedule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRows {
    pub schedule: WorkSchedule,
    pub rows: Vec<Row>,
}

/// Result of one extraction pass over a model
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub source_name: Option<String>,
    pub schedules: Vec<ScheduleRows>,
}

impl Extraction {
    /// All rows of the document, in id order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.schedules.iter().flat_map(|s| s.rows.iter())
    }

    pub fn row_count(&self) -> usize {
        self.schedules.iter().map(|s| s.rows.len()).sum()
    }
}

/// Output renderer trait
pub trait Renderer {
    type Output;

    fn render(&self, extraction: &Extraction) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Fatal errors of an extraction run
#[derive(Debug, Error)]
pub enum GanttError {
    #[error("Failed to open model {}: {message}", .path.display())]
    ModelOpen { path: PathBuf, message: String },

    #[error("Cyclic task hierarchy: task {task} ({name}) is reached more than once")]
    CyclicHierarchy { task: EntityId, name: String },

    #[error("Failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read widget asset {}: {source}", .path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
