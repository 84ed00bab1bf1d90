//! Standalone HTML Gantt document
//!
//! One chart section per work schedule, each driven by the jsGantt widget
//! API. Hierarchy is expressed only through `pParent`/`pGroup` in the task
//! data; the widget draws the tree.

use ifc4d_core::{Extraction, RenderError, Renderer, ScheduleRows};
use tracing::debug;

use crate::assets::WidgetAssets;
use crate::jsgantt::{schedule_tasks, to_script_json};

/// Source name used when the model does not record one
pub const DEFAULT_SOURCE_NAME: &str = "model.ifc";

/// Body text of a document without work schedules
pub const NO_SCHEDULES_MESSAGE: &str = "No work schedules found in this IFC file.";

/// Initial time scale of the charts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChartView {
    Day,
    #[default]
    Week,
    Month,
    Quarter,
}

impl ChartView {
    /// jsGantt `vFormat` value
    pub fn as_str(self) -> &'static str {
        match self {
            ChartView::Day => "day",
            ChartView::Week => "week",
            ChartView::Month => "month",
            ChartView::Quarter => "quarter",
        }
    }
}

/// HTML Gantt document renderer configuration
#[derive(Clone, Debug)]
pub struct HtmlGanttRenderer {
    /// Initial time scale
    pub view: ChartView,
    /// Widget source
    pub assets: WidgetAssets,
    /// Replaces the source file name in the page title and heading
    pub title: Option<String>,
    /// Show the duration column
    pub show_duration: bool,
    /// Show the completion column
    pub show_completion: bool,
}

impl Default for HtmlGanttRenderer {
    fn default() -> Self {
        Self {
            view: ChartView::Week,
            assets: WidgetAssets::Bundled,
            title: None,
            show_duration: true,
            show_completion: true,
        }
    }
}

impl HtmlGanttRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial time scale
    pub fn view(mut self, view: ChartView) -> Self {
        self.view = view;
        self
    }

    /// Choose where the widget is loaded from
    pub fn assets(mut self, assets: WidgetAssets) -> Self {
        self.assets = assets;
        self
    }

    /// Override the name shown in the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Hide the duration column
    pub fn hide_duration(mut self) -> Self {
        self.show_duration = false;
        self
    }

    /// Hide the completion column
    pub fn hide_completion(mut self) -> Self {
        self.show_completion = false;
        self
    }

    fn source_name<'a>(&'a self, extraction: &'a Extraction) -> &'a str {
        self.title
            .as_deref()
            .or(extraction.source_name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_SOURCE_NAME)
    }

    fn render_section(&self, index: usize, schedule: &ScheduleRows) -> Result<String, RenderError> {
        let tasks = to_script_json(&schedule_tasks(schedule))
            .map_err(|e| RenderError::Format(format!("task data: {e}")))?;
        let div_id = format!("GanttChartDIV_{index}");
        let meta = schedule
            .schedule
            .creation_date
            .as_deref()
            .filter(|date| !date.is_empty())
            .map(|date| {
                format!(
                    "\n        <p class=\"schedule-meta\">Created {}</p>",
                    html_escape(date)
                )
            })
            .unwrap_or_default();

        Ok(format!(
            r#"    <div class="schedule-section">
        <h2>{name}</h2>{meta}
        <div id="{div_id}"></div>
        <script>
            var g{index} = new JSGantt.GanttChart(document.getElementById('{div_id}'), '{view}');
            g{index}.setOptions({{
                vCaptionType: 'Complete',
                vFormat: '{view}',
                vShowRes: false,
                vShowDur: {show_duration},
                vShowComp: {show_completion}
            }});
            var tasks{index} = {tasks};
            JSGantt.addJSONTask(g{index}, tasks{index});
            g{index}.Draw();
        </script>
    </div>"#,
            name = html_escape(schedule.schedule.display_name()),
            view = self.view.as_str(),
            show_duration = self.show_duration,
            show_completion = self.show_completion,
        ))
    }

    fn generate_html(&self, source_name: &str, assets: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Gantt Chart - {source}</title>
{assets}
    <style>
        body {{
            font-family: system-ui, -apple-system, sans-serif;
            margin: 20px;
        }}
        .schedule-section {{
            margin-bottom: 50px;
            page-break-after: always;
        }}
        .schedule-meta {{
            color: #666;
            margin: 0 0 10px;
        }}
        h1 {{
            margin-top: 20px;
        }}
        h2 {{
            margin-top: 10px;
            margin-bottom: 10px;
        }}
    </style>
</head>
<body>
    <h1>Work Schedules - {source}</h1>
{body}
</body>
</html>
"#,
            source = html_escape(source_name),
        )
    }
}

impl Renderer for HtmlGanttRenderer {
    type Output = String;

    fn render(&self, extraction: &Extraction) -> Result<String, RenderError> {
        let assets = self.assets.head_markup()?;

        let body = if extraction.schedules.is_empty() {
            format!("    <p>{NO_SCHEDULES_MESSAGE}</p>")
        } else {
            extraction
                .schedules
                .iter()
                .enumerate()
                .map(|(index, schedule)| self.render_section(index, schedule))
                .collect::<Result<Vec<_>, _>>()?
                .join("\n")
        };

        debug!(
            schedules = extraction.schedules.len(),
            rows = extraction.row_count(),
            view = self.view.as_str(),
            "rendered HTML document"
        );
        Ok(self.generate_html(self.source_name(extraction), &assets, &body))
    }
}

/// HTML-escape a string
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
