//! ifc4d-gantt CLI
//!
//! Reads an IFC file and writes its work schedules as a standalone Gantt
//! chart document.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ifc4d_core::Renderer;
use ifc4d_extract::extract;
use ifc4d_render::{write_document, ChartView, HtmlGanttRenderer, JsonRenderer, WidgetAssets};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ifc4d-gantt")]
#[command(author, version, about = "Interactive Gantt charts from IFC work schedules", long_about = None)]
struct Cli {
    /// IFC file to read
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Document to write
    #[arg(value_name = "OUTPUT", default_value = "gantt.html")]
    output: PathBuf,

    /// Initial time scale of the charts
    #[arg(long, value_enum, default_value_t = View::Week, env = "IFC4D_GANTT_VIEW")]
    view: View,

    /// Inline jsgantt.js and jsgantt.css from DIR instead of the bundled widget
    #[arg(long, value_name = "DIR", env = "IFC4D_GANTT_ASSETS")]
    assets: Option<PathBuf>,

    /// Link jsGantt-improved from the jsDelivr CDN (overrides --assets)
    #[arg(long)]
    cdn: bool,

    /// Name shown in the page title instead of the IFC file name
    #[arg(long, value_name = "TEXT")]
    title: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum View {
    Day,
    Week,
    Month,
    Quarter,
}

impl From<View> for ChartView {
    fn from(view: View) -> Self {
        match view {
            View::Day => ChartView::Day,
            View::Week => ChartView::Week,
            View::Month => ChartView::Month,
            View::Quarter => ChartView::Quarter,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Standalone HTML Gantt chart
    Html,
    /// Extracted schedules and rows as JSON
    Json,
}

impl Cli {
    fn html_renderer(&self) -> HtmlGanttRenderer {
        let assets = if self.cdn {
            WidgetAssets::Cdn
        } else if let Some(dir) = &self.assets {
            WidgetAssets::Directory(dir.clone())
        } else {
            WidgetAssets::Bundled
        };

        let renderer = HtmlGanttRenderer::new().view(self.view.into()).assets(assets);
        match &self.title {
            Some(title) => renderer.title(title.clone()),
            None => renderer,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries the summary line only
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn schedule_count(count: usize) -> String {
    format!("{count} schedule{}", if count == 1 { "" } else { "s" })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let model = ifc4d_step::open(&cli.input)?;
    let extraction = extract(&model)?;

    let document = match cli.format {
        Format::Html => cli
            .html_renderer()
            .render(&extraction)
            .context("Failed to render HTML document")?,
        Format::Json => JsonRenderer::new()
            .render(&extraction)
            .context("Failed to render JSON document")?,
    };
    write_document(&cli.output, &document)?;

    let schedules = extraction.schedules.len();
    info!(
        output = %cli.output.display(),
        schedules,
        rows = extraction.row_count(),
        "document written"
    );

    match cli.format {
        Format::Html => println!(
            "Gantt chart generated: {} ({})",
            cli.output.display(),
            schedule_count(schedules)
        ),
        Format::Json => println!(
            "Schedule data written: {} ({})",
            cli.output.display(),
            schedule_count(schedules)
        ),
    }

    Ok(())
}
