//! Row builder
//!
//! Converts walker records into chart rows with sequential ids. Ids run
//! across the whole file; parents are found by entity identity, which works
//! because the walker emits parents first. Dependencies stay within the
//! schedule of the row.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use ifc4d_core::{EntityId, Row, RowDependency, ScheduleModel, TaskAttributes, TaskRecord};
use tracing::debug;

/// Start, end and duration after filling gaps from each other
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolvedDates {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub duration_days: Option<i64>,
}

/// Fill in whichever of start, end and duration can be derived from the
/// other two.
///
/// The end is exclusive: a task starting 2024-01-01 lasting 5 days ends
/// 2024-01-06. Stated values are never overwritten, and missing data leaves
/// the field empty.
pub fn resolve_dates(attributes: &TaskAttributes) -> ResolvedDates {
    let mut resolved = ResolvedDates {
        start: attributes.start,
        end: attributes.finish,
        duration_days: attributes.duration.map(|d| d.whole_days()),
    };

    match (resolved.start, resolved.end, resolved.duration_days) {
        (Some(start), None, Some(days)) => resolved.end = shift(start, days),
        (None, Some(end), Some(days)) => resolved.start = shift(end, -days),
        (Some(start), Some(end), None) => resolved.duration_days = Some((end - start).num_days()),
        _ => {}
    }

    resolved
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Completion as an integer percentage.
///
/// Values up to 1.0 are ratios, larger values are already percentages.
pub fn percent_complete(completion: Option<f64>) -> u8 {
    let Some(value) = completion.filter(|v| v.is_finite()) else {
        return 0;
    };
    let percent = if value <= 1.0 { value * 100.0 } else { value };
    percent.round().clamp(0.0, 100.0) as u8
}

/// Assigns row ids and resolves parents for one extraction run
#[derive(Debug, Default)]
pub struct RowBuilder {
    ids: HashMap<EntityId, u32>,
    /// Task of each row, indexed by `id - 1`
    tasks: Vec<EntityId>,
}

impl RowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows built so far
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Row id most recently assigned to a task
    pub fn row_id(&self, task: EntityId) -> Option<u32> {
        self.ids.get(&task).copied()
    }

    /// Build the next row
    pub fn push(&mut self, record: &TaskRecord) -> Row {
        self.tasks.push(record.task);
        let id = self.tasks.len() as u32;
        self.ids.insert(record.task, id);

        let parent = record
            .parent
            .and_then(|p| self.row_id(p))
            .unwrap_or(0);

        let attributes = &record.attributes;
        let dates = resolve_dates(attributes);

        Row {
            id,
            parent,
            name: attributes.display_name().to_string(),
            start: dates.start,
            end: dates.end,
            duration_days: dates.duration_days,
            percent_complete: percent_complete(attributes.completion),
            is_group: record.is_group(),
            is_milestone: attributes.is_milestone,
            notes: attributes.description.clone().unwrap_or_default(),
            depends: Vec::new(),
            depth: record.depth,
        }
    }

    /// Resolve sequence links of the rows of one schedule.
    ///
    /// Must run after the whole schedule has been pushed, since a predecessor
    /// may appear later in traversal order. Predecessors without a row in
    /// `rows` are dropped, so links never leave their chart.
    pub fn link_dependencies<M: ScheduleModel + ?Sized>(&self, model: &M, rows: &mut [Row]) {
        let local: HashMap<EntityId, u32> = rows
            .iter()
            .filter_map(|row| Some((self.task_of(row.id)?, row.id)))
            .collect();

        for row in rows {
            let Some(task) = self.task_of(row.id) else {
                continue;
            };
            row.depends = model
                .predecessors(task)
                .into_iter()
                .filter_map(|pred| match local.get(&pred.task) {
                    Some(&predecessor) => Some(RowDependency {
                        predecessor,
                        kind: pred.kind,
                    }),
                    None => {
                        debug!(
                            task = %task,
                            predecessor = %pred.task,
                            "predecessor has no row in this schedule"
                        );
                        None
                    }
                })
                .collect();
        }
    }

    fn task_of(&self, id: u32) -> Option<EntityId> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.tasks.get(index).copied()
    }
}
