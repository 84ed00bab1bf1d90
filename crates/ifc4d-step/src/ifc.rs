//! IFC work schedules over a parsed STEP file
//!
//! Entities and attribute positions used here:
//!
//! | Entity | Attributes (0-based) |
//! |--------|----------------------|
//! | `IfcWorkSchedule` | Name 2, CreationDate 6 |
//! | `IfcRelAssignsToControl` | RelatedObjects 4, RelatingControl 6 |
//! | `IfcRelNests` | RelatingObject 4, RelatedObjects 5 |
//! | `IfcRelSequence` | RelatingProcess 4, RelatedProcess 5, SequenceType 7 |
//! | `IfcTask` (IFC4) | Name 2, Description 3, Identification 5, IsMilestone 9, TaskTime 11 |
//! | `IfcTask`, `IfcMove`, `IfcOrderAction` (IFC2X3) | Name 2, Description 3, TaskId 5, IsMilestone 8 |
//! | `IfcTaskTime` | ScheduleDuration 4, ScheduleStart 5, ScheduleFinish 6, Completion 19 |
//! | `IfcRelAssignsTasks` (IFC2X3) | TimeForTask 7 |
//! | `IfcScheduleTimeControl` (IFC2X3) | ScheduleStart 8, ScheduleFinish 12, ScheduleDuration 13, Completion 22 |

use std::collections::{HashMap, HashSet};
use std::path::Path;

use ifc4d_core::{
    parse_date, Duration, EntityId, GanttError, Predecessor, ScheduleModel, SequenceType,
    TaskAttributes, WorkSchedule,
};
use tracing::{debug, info};

use crate::parser::{Entity, StepFile, Value};

const WORK_SCHEDULE: &str = "IFCWORKSCHEDULE";
/// `IfcTask` and its IFC2X3 subtypes, which share its leading attributes
const TASK_TYPES: [&str; 3] = ["IFCTASK", "IFCMOVE", "IFCORDERACTION"];

fn is_task(entity: &Entity) -> bool {
    TASK_TYPES.iter().any(|keyword| entity.is_a(keyword))
}

/// IFC schema family of a file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schema {
    Ifc2x3,
    /// IFC4 and later (IFC4X1 .. IFC4X3)
    Ifc4,
}

impl Schema {
    fn detect(identifiers: &[String]) -> Self {
        if identifiers
            .iter()
            .any(|id| id.to_ascii_uppercase().starts_with("IFC2X"))
        {
            Schema::Ifc2x3
        } else {
            Schema::Ifc4
        }
    }
}

/// Read and index an IFC file.
///
/// Every failure (missing file, syntax error, non-IFC schema) is reported as
/// [`GanttError::ModelOpen`].
pub fn open(path: impl AsRef<Path>) -> Result<IfcModel, GanttError> {
    let path = path.as_ref();
    let open_error = |message: String| GanttError::ModelOpen {
        path: path.to_path_buf(),
        message,
    };

    let bytes = std::fs::read(path).map_err(|e| open_error(e.to_string()))?;
    let content = String::from_utf8_lossy(&bytes);
    let file = StepFile::parse(&content).map_err(|e| open_error(e.to_string()))?;

    let schemas = file.schema_identifiers();
    if !schemas
        .iter()
        .any(|s| s.to_ascii_uppercase().starts_with("IFC"))
    {
        return Err(open_error(format!(
            "not an IFC file (schema: {})",
            if schemas.is_empty() {
                "none".to_string()
            } else {
                schemas.join(", ")
            }
        )));
    }

    let mut model = IfcModel::new(file);
    if model.source_name.is_none() {
        model.source_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
    }

    info!(
        path = %path.display(),
        entities = model.file.len(),
        schema = ?model.schema,
        "opened model"
    );
    Ok(model)
}

/// `ScheduleModel` backed by an IFC file
#[derive(Debug)]
pub struct IfcModel {
    file: StepFile,
    schema: Schema,
    source_name: Option<String>,
    roots: HashMap<EntityId, Vec<EntityId>>,
    children: HashMap<EntityId, Vec<EntityId>>,
    predecessors: HashMap<EntityId, Vec<Predecessor>>,
    /// IFC2X3 only: IfcScheduleTimeControl of each task
    time_controls: HashMap<EntityId, EntityId>,
}

impl IfcModel {
    pub fn new(file: StepFile) -> Self {
        let schema = Schema::detect(&file.schema_identifiers());
        // FILE_NAME may hold a Windows or POSIX path
        let source_name = file
            .file_name()
            .and_then(|name| name.rsplit(['/', '\\']).next())
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let mut model = Self {
            file,
            schema,
            source_name,
            roots: HashMap::new(),
            children: HashMap::new(),
            predecessors: HashMap::new(),
            time_controls: HashMap::new(),
        };
        model.index_nesting();
        model.index_controls();
        model.index_sequences();
        model
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn file(&self) -> &StepFile {
        &self.file
    }

    fn is_a(&self, id: EntityId, keyword: &str) -> bool {
        self.file.entity(id).is_some_and(|e| e.is_a(keyword))
    }

    fn is_task(&self, id: EntityId) -> bool {
        self.file.entity(id).is_some_and(is_task)
    }

    fn index_nesting(&mut self) {
        let mut children: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        for rel in self.file.by_type("IFCRELNESTS") {
            let Some(parent) = rel.param(4).and_then(Value::as_reference) else {
                continue;
            };
            if !self.is_task(parent) {
                continue;
            }
            let related = rel.param(5).map(Value::references).unwrap_or_default();
            children
                .entry(parent)
                .or_default()
                .extend(related.into_iter().filter(|id| self.is_task(*id)));
        }
        self.children = children;
    }

    fn index_controls(&mut self) {
        let mut roots: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        let mut time_controls = HashMap::new();

        let mut assign = |schedule: EntityId, tasks: Vec<EntityId>| {
            let entry = roots.entry(schedule).or_default();
            for task in tasks {
                if !entry.contains(&task) {
                    entry.push(task);
                }
            }
        };

        for rel in self.file.by_type("IFCRELASSIGNSTOCONTROL") {
            if let Some((schedule, tasks)) = self.controlled_tasks(rel) {
                assign(schedule, tasks);
            }
        }

        if self.schema == Schema::Ifc2x3 {
            // IfcRelAssignsTasks also links the time control of each task
            for rel in self.file.by_type("IFCRELASSIGNSTASKS") {
                let Some((schedule, tasks)) = self.controlled_tasks(rel) else {
                    continue;
                };
                if let Some(control) = rel.param(7).and_then(Value::as_reference) {
                    for task in &tasks {
                        time_controls.insert(*task, control);
                    }
                }
                assign(schedule, tasks);
            }
        }

        self.roots = roots
            .into_iter()
            .map(|(schedule, tasks)| (schedule, self.top_level(tasks)))
            .collect();
        self.time_controls = time_controls;
    }

    /// Drop assigned tasks that sit below another assigned task.
    ///
    /// Schedules may assign every task, nested or not. Tasks on a common
    /// nesting cycle are all kept so the walk still reaches the cycle.
    fn top_level(&self, tasks: Vec<EntityId>) -> Vec<EntityId> {
        let below: Vec<HashSet<EntityId>> =
            tasks.iter().map(|task| self.descendants(*task)).collect();
        tasks
            .iter()
            .enumerate()
            .filter(|&(i, task)| {
                !tasks.iter().enumerate().any(|(j, other)| {
                    j != i && below[j].contains(task) && !below[i].contains(other)
                })
            })
            .map(|(_, task)| *task)
            .collect()
    }

    fn descendants(&self, task: EntityId) -> HashSet<EntityId> {
        let mut seen = HashSet::new();
        let mut stack = self.child_tasks(task);
        while let Some(next) = stack.pop() {
            if seen.insert(next) {
                stack.extend(self.child_tasks(next));
            }
        }
        seen
    }

    /// Work schedule and task objects of an assignment relationship
    fn controlled_tasks(&self, rel: &Entity) -> Option<(EntityId, Vec<EntityId>)> {
        let schedule = rel.param(6).and_then(Value::as_reference)?;
        if !self.is_a(schedule, WORK_SCHEDULE) {
            return None;
        }
        let tasks = rel
            .param(4)
            .map(Value::references)
            .unwrap_or_default()
            .into_iter()
            .filter(|id| self.is_task(*id))
            .collect();
        Some((schedule, tasks))
    }

    fn index_sequences(&mut self) {
        let mut predecessors: HashMap<EntityId, Vec<Predecessor>> = HashMap::new();
        for rel in self.file.by_type("IFCRELSEQUENCE") {
            let (Some(relating), Some(related)) = (
                rel.param(4).and_then(Value::as_reference),
                rel.param(5).and_then(Value::as_reference),
            ) else {
                continue;
            };
            let kind = rel
                .param(7)
                .and_then(Value::as_enumeration)
                .map(sequence_type)
                .unwrap_or_default();
            predecessors.entry(related).or_default().push(Predecessor {
                task: relating,
                kind,
            });
        }
        self.predecessors = predecessors;
    }

    fn string_param(entity: &Entity, index: usize) -> Option<String> {
        entity.param(index).and_then(Value::as_str).map(str::to_string)
    }

    /// Date held either as an ISO string (IFC4) or a date entity (IFC2X3)
    fn date_value(&self, value: &Value) -> Option<chrono::NaiveDate> {
        if let Some(text) = value.as_str() {
            return parse_date(text);
        }
        let entity = self.file.entity(value.as_reference()?)?;
        if entity.is_a("IFCCALENDARDATE") {
            let day = entity.param(0)?.as_i64()?;
            let month = entity.param(1)?.as_i64()?;
            let year = entity.param(2)?.as_i64()?;
            chrono::NaiveDate::from_ymd_opt(
                i32::try_from(year).ok()?,
                u32::try_from(month).ok()?,
                u32::try_from(day).ok()?,
            )
        } else if entity.is_a("IFCDATEANDTIME") {
            self.date_value(entity.param(0)?)
        } else {
            None
        }
    }

    fn task_time_ifc4(&self, task: &Entity, attributes: &mut TaskAttributes) {
        let Some(time) = task
            .param(11)
            .and_then(Value::as_reference)
            .and_then(|id| self.file.entity(id))
        else {
            return;
        };
        attributes.duration = time
            .param(4)
            .and_then(Value::as_str)
            .and_then(Duration::parse_iso8601);
        attributes.start = time.param(5).and_then(|v| self.date_value(v));
        attributes.finish = time.param(6).and_then(|v| self.date_value(v));
        attributes.completion = time.param(19).and_then(Value::as_f64);
    }

    fn task_time_ifc2x3(&self, task: EntityId, attributes: &mut TaskAttributes) {
        let Some(control) = self
            .time_controls
            .get(&task)
            .and_then(|id| self.file.entity(*id))
        else {
            return;
        };
        attributes.start = control.param(8).and_then(|v| self.date_value(v));
        attributes.finish = control.param(12).and_then(|v| self.date_value(v));
        // IfcTimeMeasure, in seconds
        attributes.duration = control
            .param(13)
            .and_then(Value::as_f64)
            .map(|seconds| Duration::seconds(seconds.round() as i64));
        attributes.completion = control.param(22).and_then(Value::as_f64);
    }
}

fn sequence_type(literal: &str) -> SequenceType {
    match literal {
        "START_START" => SequenceType::StartStart,
        "FINISH_FINISH" => SequenceType::FinishFinish,
        "START_FINISH" => SequenceType::StartFinish,
        _ => SequenceType::FinishStart,
    }
}

impl ScheduleModel for IfcModel {
    fn work_schedules(&self) -> Vec<WorkSchedule> {
        self.file
            .by_type(WORK_SCHEDULE)
            .map(|entity| WorkSchedule {
                id: entity.id,
                name: Self::string_param(entity, 2),
                creation_date: entity.param(6).and_then(|value| match value.as_str() {
                    Some(text) => Some(text.to_string()),
                    None => self.date_value(value).map(|d| d.to_string()),
                }),
            })
            .collect()
    }

    fn root_tasks(&self, schedule: EntityId) -> Vec<EntityId> {
        self.roots.get(&schedule).cloned().unwrap_or_default()
    }

    fn child_tasks(&self, task: EntityId) -> Vec<EntityId> {
        self.children.get(&task).cloned().unwrap_or_default()
    }

    fn task(&self, task: EntityId) -> Option<TaskAttributes> {
        let entity = self.file.entity(task).filter(|e| is_task(e))?;
        let milestone_index = match self.schema {
            Schema::Ifc2x3 => 8,
            Schema::Ifc4 => 9,
        };

        let mut attributes = TaskAttributes {
            name: Self::string_param(entity, 2),
            description: Self::string_param(entity, 3),
            identification: Self::string_param(entity, 5),
            is_milestone: entity
                .param(milestone_index)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            ..TaskAttributes::default()
        };

        match self.schema {
            Schema::Ifc4 => self.task_time_ifc4(entity, &mut attributes),
            Schema::Ifc2x3 => self.task_time_ifc2x3(task, &mut attributes),
        }

        debug!(task = %task, name = attributes.display_name(), "read task");
        Some(attributes)
    }

    fn predecessors(&self, task: EntityId) -> Vec<Predecessor> {
        self.predecessors.get(&task).cloned().unwrap_or_default()
    }

    fn source_name(&self) -> Option<String> {
        self.source_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ifc4(data: &str) -> IfcModel {
        let input = format!(
            "ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION((''),'2;1');\n\
             FILE_NAME('/projects/site/model-v2.ifc','',(''),(''),'','','');\n\
             FILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n{data}\nENDSEC;\nEND-ISO-10303-21;\n"
        );
        IfcModel::new(StepFile::parse(&input).unwrap())
    }

    #[test]
    fn source_name_is_the_base_name() {
        let model = ifc4("");
        assert_eq!(model.source_name().as_deref(), Some("model-v2.ifc"));
        assert_eq!(model.schema(), Schema::Ifc4);
    }

    #[test]
    fn reads_ifc4_task_time() {
        let model = ifc4(
            "#1=IFCTASK('g',$,'Pour slab','Level 1',$,'A.1',$,$,$,.F.,$,#2,.CONSTRUCTION.);\n\
             #2=IFCTASKTIME($,$,$,.WORKTIME.,'P5D','2024-01-01T08:00:00',$,$,$,$,$,$,$,$,$,$,$,$,$,0.25);",
        );

        let task = model.task(EntityId(1)).unwrap();
        assert_eq!(task.name.as_deref(), Some("Pour slab"));
        assert_eq!(task.description.as_deref(), Some("Level 1"));
        assert_eq!(task.identification.as_deref(), Some("A.1"));
        assert!(!task.is_milestone);
        assert_eq!(task.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(task.finish, None);
        assert_eq!(task.duration, Some(Duration::days(5)));
        assert_eq!(task.completion, Some(0.25));
    }

    #[test]
    fn non_tasks_are_not_tasks() {
        let model = ifc4("#1=IFCWALL('g',$,'Wall',$,$,$,$,$,$);");
        assert!(model.task(EntityId(1)).is_none());
        assert!(model.task(EntityId(2)).is_none());
    }

    #[test]
    fn roots_exclude_tasks_nested_below_another_root() {
        let model = ifc4(
            "#1=IFCWORKSCHEDULE('s',$,'Build',$,$,$,$,$,$,$,$,$,$,$);\n\
             #2=IFCTASK('a',$,'Frame',$,$,$,$,$,$,.F.,$,$,$);\n\
             #3=IFCTASK('b',$,'Columns',$,$,$,$,$,$,.F.,$,$,$);\n\
             #4=IFCTASK('c',$,'Beams',$,$,$,$,$,$,.F.,$,$,$);\n\
             #5=IFCRELASSIGNSTOCONTROL('r',$,$,$,(#4,#3,#2),$,#1);\n\
             #6=IFCRELNESTS('n',$,$,$,#2,(#3));\n\
             #7=IFCRELNESTS('m',$,$,$,#3,(#4));",
        );
        assert_eq!(model.root_tasks(EntityId(1)), vec![EntityId(2)]);
    }

    #[test]
    fn tasks_nested_in_a_loop_stay_roots() {
        let model = ifc4(
            "#1=IFCWORKSCHEDULE('s',$,'Build',$,$,$,$,$,$,$,$,$,$,$);\n\
             #2=IFCTASK('a',$,'A',$,$,$,$,$,$,.F.,$,$,$);\n\
             #3=IFCTASK('b',$,'B',$,$,$,$,$,$,.F.,$,$,$);\n\
             #5=IFCRELASSIGNSTOCONTROL('r',$,$,$,(#2,#3),$,#1);\n\
             #6=IFCRELNESTS('n',$,$,$,#2,(#3));\n\
             #7=IFCRELNESTS('m',$,$,$,#3,(#2));",
        );
        assert_eq!(
            model.root_tasks(EntityId(1)),
            vec![EntityId(2), EntityId(3)]
        );
        assert!(matches!(
            ifc4d_extract::extract(&model),
            Err(GanttError::CyclicHierarchy { .. })
        ));
    }

    #[test]
    fn sequence_literals_map_to_link_types() {
        assert_eq!(sequence_type("START_START"), SequenceType::StartStart);
        assert_eq!(sequence_type("FINISH_FINISH"), SequenceType::FinishFinish);
        assert_eq!(sequence_type("START_FINISH"), SequenceType::StartFinish);
        assert_eq!(sequence_type("FINISH_START"), SequenceType::FinishStart);
        assert_eq!(sequence_type("NOTDEFINED"), SequenceType::FinishStart);
    }

    #[test]
    fn ifc2x3_dates_come_from_time_controls() {
        let input = "ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION((''),'2;1');\n\
             FILE_NAME('old.ifc','',(''),(''),'','','');\nFILE_SCHEMA(('IFC2X3'));\nENDSEC;\nDATA;\n\
             #1=IFCWORKSCHEDULE('s',$,'Legacy',$,$,$,#9,$,$,$,$,$,#9,$,$);\n\
             #2=IFCTASK('t',$,'Frame',$,$,'T1',$,$,.T.,$);\n\
             #3=IFCSCHEDULETIMECONTROL('c',$,$,$,$,$,$,$,#9,$,$,$,#10,172800.,$,$,$,$,$,$,$,$,50.);\n\
             #4=IFCRELASSIGNSTASKS('r',$,$,$,(#2),$,#1,#3);\n\
             #9=IFCCALENDARDATE(15,4,2024);\n\
             #10=IFCDATEANDTIME(#11,$);\n\
             #11=IFCCALENDARDATE(17,4,2024);\n\
             ENDSEC;\nEND-ISO-10303-21;\n";
        let model = IfcModel::new(StepFile::parse(input).unwrap());
        assert_eq!(model.schema(), Schema::Ifc2x3);

        let schedules = model.work_schedules();
        assert_eq!(schedules[0].creation_date.as_deref(), Some("2024-04-15"));
        assert_eq!(model.root_tasks(EntityId(1)), vec![EntityId(2)]);

        let task = model.task(EntityId(2)).unwrap();
        assert!(task.is_milestone);
        assert_eq!(task.start, NaiveDate::from_ymd_opt(2024, 4, 15));
        assert_eq!(task.finish, NaiveDate::from_ymd_opt(2024, 4, 17));
        assert_eq!(task.duration, Some(Duration::days(2)));
        assert_eq!(task.completion, Some(50.0));
    }

    #[test]
    fn ifc2x3_task_subtypes_are_tasks() {
        let input = "ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION((''),'2;1');\n\
             FILE_NAME('old.ifc','',(''),(''),'','','');\nFILE_SCHEMA(('IFC2X3'));\nENDSEC;\nDATA;\n\
             #1=IFCWORKSCHEDULE('s',$,'Relocation',$,$,$,$,$,$,$,$,$,$,$,$);\n\
             #2=IFCTASK('t',$,'Relocate staff',$,$,'R',$,$,.F.,$);\n\
             #3=IFCMOVE('m',$,'Move floor 3',$,$,'R.1',$,$,.F.,$,$,$,$);\n\
             #4=IFCORDERACTION('o',$,'Order crates',$,$,'R.2',$,$,.T.,$,'PO-7');\n\
             #5=IFCRELNESTS('n',$,$,$,#2,(#3,#4));\n\
             #6=IFCRELASSIGNSTASKS('r',$,$,$,(#2,#3,#4),$,#1,$);\n\
             ENDSEC;\nEND-ISO-10303-21;\n";
        let model = IfcModel::new(StepFile::parse(input).unwrap());

        assert_eq!(model.root_tasks(EntityId(1)), vec![EntityId(2)]);
        assert_eq!(
            model.child_tasks(EntityId(2)),
            vec![EntityId(3), EntityId(4)]
        );
        assert_eq!(
            model.task(EntityId(3)).unwrap().name.as_deref(),
            Some("Move floor 3")
        );
        assert!(model.task(EntityId(4)).unwrap().is_milestone);
    }
}
