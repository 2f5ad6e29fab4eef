// Library exports for titanic-report

pub mod aggregate;
pub mod catalog;
pub mod chart;
pub mod data;
pub mod error;
pub mod page;
pub mod parser;
pub mod report;
pub mod resolve;
pub mod runtime;
pub mod server;

// Chart rendering pipeline
pub mod compiler;
pub mod graph;
pub mod ir;
pub mod palette;
pub mod scale;
pub mod transform;

pub use error::{ReportError, Result};
pub use report::{build_report, DisplayNode, DisplayTree};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    Png,
    #[serde(rename = "svg")]
    #[default]
    Svg,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 900 }
fn default_height() -> u32 { 500 }

/// Largest accepted chart width or height, in pixels
pub const MAX_DIMENSION: u32 = 8192;

impl RenderOptions {
    /// Reject sizes no backend can draw
    pub fn validate(&self) -> anyhow::Result<()> {
        check_dimensions(self.width, self.height)
    }
}

pub(crate) fn check_dimensions(width: u32, height: u32) -> anyhow::Result<()> {
    anyhow::ensure!(
        width > 0 && height > 0,
        "Chart size must be non-zero, got {}x{}",
        width,
        height
    );
    anyhow::ensure!(
        width <= MAX_DIMENSION && height <= MAX_DIMENSION,
        "Chart size {}x{} exceeds the {}px limit",
        width,
        height,
        MAX_DIMENSION
    );
    Ok(())
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Svg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_defaults() {
        let opts: RenderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, RenderOptions::default());
        assert_eq!((opts.width, opts.height), (900, 500));
    }

    #[test]
    fn test_render_options_png() {
        let opts: RenderOptions = serde_json::from_str(r#"{"width": 640, "type": "png"}"#).unwrap();
        assert_eq!(opts.width, 640);
        assert_eq!(opts.height, 500);
        assert_eq!(opts.format, OutputFormat::Png);
    }

    #[test]
    fn test_render_options_size_limits() {
        assert!(RenderOptions::default().validate().is_ok());

        let zero: RenderOptions = serde_json::from_str(r#"{"width": 0}"#).unwrap();
        assert!(zero.validate().is_err());

        let huge: RenderOptions =
            serde_json::from_str(r#"{"type": "png", "width": 40000, "height": 40000}"#).unwrap();
        let err = huge.validate().unwrap_err();
        assert!(err.to_string().contains("40000x40000"));
    }
}
