//! # ifc4d-render
//!
//! Output documents for ifc4d-gantt extractions.
//!
//! This crate provides:
//! - Standalone HTML Gantt documents driven by the jsGantt widget API
//! - The jsGantt task record format
//! - A JSON dump of the extraction
//! - Atomic document writing
//!
//! ## Example
//!
//! ```rust
//! use ifc4d_core::{MemoryModel, Renderer, TaskAttributes};
//! use ifc4d_extract::extract;
//! use ifc4d_render::{ChartView, HtmlGanttRenderer};
//!
//! let mut model = MemoryModel::new().with_source_name("site.ifc");
//! let schedule = model.add_schedule("Site works");
//! model.add_task(schedule, TaskAttributes::named("Clear site"));
//! let extraction = extract(&model).unwrap();
//!
//! let html = HtmlGanttRenderer::new()
//!     .view(ChartView::Month)
//!     .render(&extraction)
//!     .unwrap();
//! assert!(html.contains("<title>Gantt Chart - site.ifc</title>"));
//! ```

pub mod assets;
pub mod gantt;
pub mod jsgantt;
pub mod json;
pub mod output;

pub use assets::WidgetAssets;
pub use gantt::{ChartView, HtmlGanttRenderer, DEFAULT_SOURCE_NAME, NO_SCHEDULES_MESSAGE};
pub use jsgantt::JsGanttTask;
pub use json::JsonRenderer;
pub use output::write_document;
