//! Reading IFC files from disk and extracting their schedules

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ifc4d_core::{GanttError, ScheduleModel, SequenceType};
use ifc4d_extract::extract;
use ifc4d_step::{open, Schema};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

#[test]
fn opens_ifc4_schedule_file() {
    let model = open(fixture("office_schedule.ifc")).unwrap();

    assert_eq!(model.schema(), Schema::Ifc4);
    // Windows path in FILE_NAME reduced to the base name
    assert_eq!(model.source_name().as_deref(), Some("office_schedule.ifc"));

    let names: Vec<String> = model
        .work_schedules()
        .iter()
        .map(|s| s.display_name().to_string())
        .collect();
    assert_eq!(names, vec!["Construction", "Fit-out"]);
}

#[test]
fn extracts_rows_from_ifc4_file() {
    let model = open(fixture("office_schedule.ifc")).unwrap();
    let extraction = extract(&model).unwrap();

    let outline: Vec<(u32, u32, &str, bool)> = extraction
        .rows()
        .map(|r| (r.id, r.parent, r.name.as_str(), r.is_group))
        .collect();
    assert_eq!(
        outline,
        vec![
            (1, 0, "Shell", true),
            (2, 1, "Substructure", true),
            (3, 2, "Excavation", false),
            (4, 2, "Piling", false),
            (5, 1, "Frame complete", false),
            (6, 0, "Partitions", false),
            (7, 0, "Ceilings", false),
        ]
    );
    assert_eq!(extraction.schedules[0].rows.len(), 5);
    assert_eq!(extraction.schedules[1].rows.len(), 2);
}

#[test]
fn task_times_are_resolved() {
    let model = open(fixture("office_schedule.ifc")).unwrap();
    let extraction = extract(&model).unwrap();
    let row = |name: &str| extraction.rows().find(|r| r.name == name).unwrap().clone();

    let shell = row("Shell");
    assert_eq!((shell.start, shell.end), (date(2024, 1, 1), date(2024, 3, 1)));
    assert_eq!(shell.duration_days, Some(60));
    assert_eq!(shell.notes, "Structure and envelope");

    let excavation = row("Excavation");
    assert_eq!(excavation.end, date(2024, 1, 6));

    let piling = row("Piling");
    assert_eq!(piling.duration_days, Some(11));
    assert_eq!(piling.percent_complete, 40);
    assert_eq!(piling.notes, "Bored piles, see drawing S-101");

    let frame = row("Frame complete");
    assert!(frame.is_milestone);
    assert_eq!((frame.start, frame.end), (date(2024, 2, 28), date(2024, 2, 28)));

    // PT80H is three whole days
    let partitions = row("Partitions");
    assert_eq!(partitions.duration_days, Some(3));
    assert_eq!(partitions.end, date(2024, 3, 7));

    let ceilings = row("Ceilings");
    assert_eq!((ceilings.start, ceilings.end), (None, None));
    assert_eq!(ceilings.percent_complete, 0);
}

#[test]
fn sequences_become_row_dependencies() {
    let model = open(fixture("office_schedule.ifc")).unwrap();
    let extraction = extract(&model).unwrap();

    let depends: Vec<(u32, Vec<(u32, SequenceType)>)> = extraction
        .rows()
        .filter(|r| !r.depends.is_empty())
        .map(|r| {
            (
                r.id,
                r.depends.iter().map(|d| (d.predecessor, d.kind)).collect(),
            )
        })
        .collect();
    assert_eq!(
        depends,
        vec![
            (4, vec![(3, SequenceType::FinishStart)]),
            (5, vec![(4, SequenceType::StartStart)]),
        ]
    );
}

#[test]
fn cyclic_nesting_is_reported() {
    let model = open(fixture("cyclic_hierarchy.ifc")).unwrap();

    match extract(&model) {
        Err(GanttError::CyclicHierarchy { name, .. }) => assert_eq!(name, "Task A"),
        other => panic!("expected CyclicHierarchy, got {other:?}"),
    }
}

#[test]
fn assigned_sub_tasks_are_walked_under_their_parent() {
    let model = open(fixture("nested_assignment.ifc")).unwrap();
    let extraction = extract(&model).unwrap();

    let outline: Vec<(u32, u32, &str)> = extraction
        .rows()
        .map(|row| (row.id, row.parent, row.name.as_str()))
        .collect();
    assert_eq!(
        outline,
        vec![(1, 0, "Earthworks"), (2, 1, "Topsoil strip"), (3, 0, "Drainage")]
    );
}

#[test]
fn file_without_schedules_extracts_nothing() {
    let model = open(fixture("no_schedules.ifc")).unwrap();
    let extraction = extract(&model).unwrap();

    assert!(extraction.schedules.is_empty());
    // Empty FILE_NAME falls back to the path on disk
    assert_eq!(extraction.source_name.as_deref(), Some("no_schedules.ifc"));
}

#[test]
fn schedule_without_tasks_is_kept() {
    let model = open(fixture("empty_schedule.ifc")).unwrap();
    let extraction = extract(&model).unwrap();

    assert_eq!(extraction.schedules.len(), 1);
    assert!(extraction.schedules[0].rows.is_empty());
    assert_eq!(
        extraction.schedules[0].schedule.creation_date.as_deref(),
        Some("2023-12-01T00:00:00")
    );
}

#[test]
fn missing_file_is_a_model_open_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.ifc");

    match open(&path) {
        Err(GanttError::ModelOpen { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected ModelOpen, got {other:?}"),
    }
}

#[test]
fn non_step_content_is_a_model_open_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.ifc");
    fs::write(&path, "this is not a STEP file\n").unwrap();

    let err = open(&path).unwrap_err();
    assert!(matches!(err, GanttError::ModelOpen { .. }));
    assert!(err.to_string().contains("notes.ifc"));
}

#[test]
fn non_ifc_schema_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("part.stp");
    fs::write(
        &path,
        "ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION((''),'2;1');\n\
         FILE_NAME('part.stp','',(''),(''),'','','');\n\
         FILE_SCHEMA(('AUTOMOTIVE_DESIGN'));\nENDSEC;\nDATA;\nENDSEC;\nEND-ISO-10303-21;\n",
    )
    .unwrap();

    let err = open(&path).unwrap_err();
    assert!(err.to_string().contains("AUTOMOTIVE_DESIGN"));
}
