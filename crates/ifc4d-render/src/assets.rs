//! Chart widget assets

use std::path::{Path, PathBuf};

use ifc4d_core::RenderError;

/// jsGantt-improved release linked by [`WidgetAssets::Cdn`]
pub const CDN_BASE: &str = "https://cdn.jsdelivr.net/npm/jsgantt-improved@2.1.0/dist";

const BUNDLED_JS: &str = include_str!("../assets/jsgantt-lite.js");
const BUNDLED_CSS: &str = include_str!("../assets/jsgantt-lite.css");

/// Where the document gets its chart widget from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum WidgetAssets {
    /// Inline the lite widget shipped with this crate
    #[default]
    Bundled,
    /// Inline `jsgantt.js` and `jsgantt.css` read from a directory
    Directory(PathBuf),
    /// Link jsGantt-improved from the jsDelivr CDN
    Cdn,
}

impl WidgetAssets {
    /// `<head>` markup that loads the widget
    pub fn head_markup(&self) -> Result<String, RenderError> {
        match self {
            WidgetAssets::Bundled => Ok(inline(BUNDLED_CSS, BUNDLED_JS)),
            WidgetAssets::Directory(dir) => {
                let css = read_asset(dir, "jsgantt.css")?;
                let js = read_asset(dir, "jsgantt.js")?;
                Ok(inline(&css, &js))
            }
            WidgetAssets::Cdn => Ok(format!(
                r#"    <link rel="stylesheet" href="{CDN_BASE}/jsgantt.css"/>
    <script src="{CDN_BASE}/jsgantt.min.js"></script>"#
            )),
        }
    }
}

fn read_asset(dir: &Path, name: &str) -> Result<String, RenderError> {
    let path = dir.join(name);
    std::fs::read_to_string(&path).map_err(|source| RenderError::Asset { path, source })
}

fn inline(css: &str, js: &str) -> String {
    format!(
        "    <style>\n{css}\n    </style>\n    <script>\n{js}\n    </script>",
        css = css.replace("</style", "<\\/style"),
        js = js.replace("</script", "<\\/script"),
    )
}
