//! jsGantt task objects
//!
//! Field names follow the jsGantt-improved JSON task format. Missing dates
//! serialize as empty strings, flags as 0/1 integers.

use ifc4d_core::{Row, ScheduleRows};
use serde::{Serialize, Serializer};

pub const CLASS_TASK: &str = "gtaskblue";
pub const CLASS_GROUP: &str = "ggroupblack";
pub const CLASS_MILESTONE: &str = "gmilestone";

/// One entry of the widget's task list
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JsGanttTask {
    #[serde(rename = "pID")]
    pub id: u32,
    #[serde(rename = "pName")]
    pub name: String,
    #[serde(rename = "pStart")]
    pub start: String,
    #[serde(rename = "pEnd")]
    pub end: String,
    #[serde(rename = "pDuration", serialize_with = "days_or_empty")]
    pub duration: Option<i64>,
    #[serde(rename = "pClass")]
    pub class: &'static str,
    #[serde(rename = "pLink")]
    pub link: String,
    #[serde(rename = "pMile")]
    pub milestone: u8,
    #[serde(rename = "pRes")]
    pub resource: String,
    #[serde(rename = "pComp")]
    pub complete: u8,
    #[serde(rename = "pGroup")]
    pub group: u8,
    #[serde(rename = "pParent")]
    pub parent: u32,
    #[serde(rename = "pOpen")]
    pub open: u8,
    #[serde(rename = "pDepend")]
    pub depend: String,
    #[serde(rename = "pCaption")]
    pub caption: String,
    #[serde(rename = "pNotes")]
    pub notes: String,
}

fn days_or_empty<S: Serializer>(days: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
    match days {
        Some(days) => serializer.serialize_i64(*days),
        None => serializer.serialize_str(""),
    }
}

impl From<&Row> for JsGanttTask {
    fn from(row: &Row) -> Self {
        let class = if row.is_group {
            CLASS_GROUP
        } else if row.is_milestone {
            CLASS_MILESTONE
        } else {
            CLASS_TASK
        };

        Self {
            id: row.id,
            name: row.name.clone(),
            start: row.start.map(|d| d.to_string()).unwrap_or_default(),
            end: row.end.map(|d| d.to_string()).unwrap_or_default(),
            duration: row.duration_days,
            class,
            link: String::new(),
            milestone: u8::from(row.is_milestone),
            resource: String::new(),
            complete: row.percent_complete,
            group: u8::from(row.is_group),
            parent: row.parent,
            open: 1,
            depend: depend_list(row),
            caption: String::new(),
            notes: row.notes.clone(),
        }
    }
}

/// `pDepend` value, e.g. `"3FS,4SS"`
pub fn depend_list(row: &Row) -> String {
    row.depends
        .iter()
        .map(|d| format!("{}{}", d.predecessor, d.kind.code()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Task list of one schedule, in ascending row id
pub fn schedule_tasks(schedule: &ScheduleRows) -> Vec<JsGanttTask> {
    let mut tasks: Vec<JsGanttTask> = schedule.rows.iter().map(JsGanttTask::from).collect();
    tasks.sort_by_key(|t| t.id);
    tasks
}

/// JSON array literal safe to embed in a `<script>` element
pub fn to_script_json(tasks: &[JsGanttTask]) -> serde_json::Result<String> {
    let json = serde_json::to_string_pretty(tasks)?;
    // "<\/" is the same string in JSON but cannot close the script element
    Ok(json.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ifc4d_core::{RowDependency, SequenceType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(id: u32) -> Row {
        Row {
            id,
            parent: 0,
            name: format!("Task {id}"),
            start: None,
            end: None,
            duration_days: None,
            percent_complete: 0,
            is_group: false,
            is_milestone: false,
            notes: String::new(),
            depends: Vec::new(),
            depth: 0,
        }
    }

    #[test]
    fn serializes_jsgantt_field_names() {
        let mut r = row(3);
        r.parent = 1;
        r.start = NaiveDate::from_ymd_opt(2024, 1, 1);
        r.end = NaiveDate::from_ymd_opt(2024, 1, 6);
        r.duration_days = Some(5);
        r.percent_complete = 40;
        r.notes = "Level 1".into();

        let value = serde_json::to_value(JsGanttTask::from(&r)).unwrap();
        assert_eq!(
            value,
            json!({
                "pID": 3,
                "pName": "Task 3",
                "pStart": "2024-01-01",
                "pEnd": "2024-01-06",
                "pDuration": 5,
                "pClass": "gtaskblue",
                "pLink": "",
                "pMile": 0,
                "pRes": "",
                "pComp": 40,
                "pGroup": 0,
                "pParent": 1,
                "pOpen": 1,
                "pDepend": "",
                "pCaption": "",
                "pNotes": "Level 1"
            })
        );
    }

    #[test]
    fn missing_values_are_empty_strings() {
        let value = serde_json::to_value(JsGanttTask::from(&row(1))).unwrap();
        assert_eq!(value["pStart"], "");
        assert_eq!(value["pEnd"], "");
        assert_eq!(value["pDuration"], "");
        assert_eq!(value["pParent"], 0);
    }

    #[test]
    fn classes_follow_row_kind() {
        let mut group = row(1);
        group.is_group = true;
        let mut milestone = row(2);
        milestone.is_milestone = true;

        assert_eq!(JsGanttTask::from(&group).class, CLASS_GROUP);
        assert_eq!(JsGanttTask::from(&group).group, 1);
        assert_eq!(JsGanttTask::from(&milestone).class, CLASS_MILESTONE);
        assert_eq!(JsGanttTask::from(&milestone).milestone, 1);
        assert_eq!(JsGanttTask::from(&row(3)).class, CLASS_TASK);
    }

    #[test]
    fn dependencies_join_row_ids_and_link_codes() {
        let mut r = row(5);
        r.depends = vec![
            RowDependency {
                predecessor: 3,
                kind: SequenceType::FinishStart,
            },
            RowDependency {
                predecessor: 4,
                kind: SequenceType::StartStart,
            },
        ];
        assert_eq!(depend_list(&r), "3FS,4SS");
    }

    #[test]
    fn script_json_cannot_close_the_script_element() {
        let mut r = row(1);
        r.name = "</script><b>".into();

        let json = to_script_json(&[JsGanttTask::from(&r)]).unwrap();
        assert!(!json.contains("</script"));

        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0]["pName"], "</script><b>");
    }
}
