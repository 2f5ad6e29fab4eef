// Render pipeline: bound chart -> panels -> scales -> scene -> image

use crate::chart::ChartNode;
use crate::compiler::compile_geometry;
use crate::error::{ReportError, Result};
use crate::graph;
use crate::palette::ColorPalette;
use crate::scale::build_scales;
use crate::transform::apply_transformations;
use crate::{OutputFormat, RenderOptions};
use tracing::debug;

/// A chart drawn in one of the supported output formats
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedChart {
    Svg(String),
    Png(Vec<u8>),
}

impl RenderedChart {
    pub fn content_type(&self) -> &'static str {
        match self {
            RenderedChart::Svg(_) => "image/svg+xml",
            RenderedChart::Png(_) => "image/png",
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RenderedChart::Svg(s) => s.as_bytes(),
            RenderedChart::Png(b) => b,
        }
    }
}

/// Render a bound chart in the requested format
pub fn render_chart(node: &ChartNode, options: &RenderOptions) -> Result<RenderedChart> {
    let chart_name = node
        .title
        .clone()
        .unwrap_or_else(|| node.kind.as_str().to_string());

    render_inner(node, options).map_err(|e| ReportError::Render {
        chart: chart_name,
        message: format!("{:#}", e),
    })
}

fn render_inner(node: &ChartNode, options: &RenderOptions) -> anyhow::Result<RenderedChart> {
    options.validate()?;

    // 1. Transform
    let render_data = apply_transformations(node)?;

    // 2. Scale
    let scales = build_scales(&render_data, node.kind)?;

    // 3. Compile
    let scene = compile_geometry(node, render_data, scales, options)?;
    debug!(
        kind = node.kind.as_str(),
        panels = scene.panels.len(),
        "compiled scene"
    );

    // 4. Render
    let palette = ColorPalette::plotly();
    match options.format {
        OutputFormat::Svg => Ok(RenderedChart::Svg(graph::render_svg(&scene, &palette)?)),
        OutputFormat::Png => Ok(RenderedChart::Png(graph::render_png(&scene, &palette)?)),
    }
}

/// Render every chart in order, stopping at the first failure
pub fn render_all<'a, I>(nodes: I, options: &RenderOptions) -> Result<Vec<RenderedChart>>
where
    I: IntoIterator<Item = &'a ChartNode>,
{
    nodes.into_iter().map(|node| render_chart(node, options)).collect()
}
