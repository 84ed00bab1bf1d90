//! # ifc4d-step
//!
//! Reader for STEP physical files (ISO 10303-21), the text encoding of
//! `.ifc` models, and the IFC-backed `ScheduleModel`.
//!
//! This crate provides:
//! - `StepFile`: entity instances and header records, queryable by type
//! - `IfcModel`: work schedules, tasks, nesting and sequencing of an IFC file
//! - `open`: read and index a file in one step
//!
//! ## Example
//!
//! ```rust
//! use ifc4d_core::ScheduleModel;
//! use ifc4d_step::{IfcModel, StepFile};
//!
//! let input = r#"ISO-10303-21;
//! HEADER;
//! FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
//! FILE_NAME('site.ifc','2024-01-01T00:00:00',(''),(''),'','','');
//! FILE_SCHEMA(('IFC4'));
//! ENDSEC;
//! DATA;
//! #1=IFCWORKSCHEDULE('0aB',$,'Site works',$,$,$,'2024-01-01T00:00:00',$,$,$,$,'2024-01-01T00:00:00',$,.PLANNED.);
//! ENDSEC;
//! END-ISO-10303-21;
//! "#;
//!
//! let model = IfcModel::new(StepFile::parse(input).unwrap());
//! let schedules = model.work_schedules();
//! assert_eq!(schedules[0].display_name(), "Site works");
//! ```

pub mod ifc;
pub mod parser;

pub use ifc::{open, IfcModel, Schema};
pub use parser::{Entity, StepFile, Value};

use thiserror::Error;

/// STEP reading error
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Instance #{0} is defined more than once")]
    DuplicateInstance(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_display() {
        let err = StepError::Syntax {
            line: 12,
            column: 3,
            message: "expected parameter".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("line 12"));
        assert!(msg.contains("column 3"));

        assert!(StepError::InvalidValue("99999999999999999999".into())
            .to_string()
            .contains("99999999999999999999"));
        assert!(StepError::DuplicateInstance(7).to_string().contains("#7"));
    }
}
