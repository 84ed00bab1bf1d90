//! # ifc4d-extract
//!
//! Turns the work schedules of a building-data model into chart rows.
//!
//! This crate provides:
//! - The schedule walker (`collect_schedules`, `walk`)
//! - The row builder (sequential ids, parent links, date resolution)
//! - `extract`, which runs both over a whole model
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use ifc4d_core::{Duration, MemoryModel, TaskAttributes};
//! use ifc4d_extract::extract;
//!
//! let mut model = MemoryModel::new();
//! let schedule = model.add_schedule("Construction");
//! model.add_task(
//!     schedule,
//!     TaskAttributes::named("Excavation")
//!         .start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
//!         .duration(Duration::days(5)),
//! );
//!
//! let extraction = extract(&model).unwrap();
//! let row = extraction.rows().next().unwrap();
//! assert_eq!(row.id, 1);
//! assert_eq!(row.end, NaiveDate::from_ymd_opt(2024, 1, 6));
//! ```

pub mod rows;
pub mod walker;

pub use rows::{percent_complete, resolve_dates, ResolvedDates, RowBuilder};
pub use walker::{collect_schedules, walk};

use ifc4d_core::{Extraction, GanttError, Row, ScheduleModel, ScheduleRows};
use tracing::debug;

/// Run one extraction pass over the whole model.
///
/// Row ids continue across schedules. Fails only on a cyclic task hierarchy;
/// missing scheduling data produces empty fields.
pub fn extract<M: ScheduleModel + ?Sized>(model: &M) -> Result<Extraction, GanttError> {
    let mut builder = RowBuilder::new();
    let mut schedules = Vec::new();

    for schedule in collect_schedules(model) {
        let records = walk(model, &schedule)?;
        let rows: Vec<Row> = records.iter().map(|record| builder.push(record)).collect();
        debug!(
            schedule = %schedule.id,
            name = schedule.display_name(),
            rows = rows.len(),
            "built rows"
        );
        schedules.push(ScheduleRows { schedule, rows });
    }

    for schedule in &mut schedules {
        builder.link_dependencies(model, &mut schedule.rows);
    }

    Ok(Extraction {
        source_name: model.source_name(),
        schedules,
    })
}
