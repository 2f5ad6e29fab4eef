use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::ir::{DrawCommand, Ink, Legend, PanelScene, SceneGraph};
use crate::palette::ColorPalette;

const FONT: &str = "sans-serif";
const LEGEND_WIDTH: u32 = 150;
const LEGEND_SWATCH: i32 = 12;
const LEGEND_ROW: i32 = 22;

/// Draw the scene as an SVG document
pub fn render_svg(scene: &SceneGraph, palette: &ColorPalette) -> Result<String> {
    crate::check_dimensions(scene.width, scene.height)?;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (scene.width, scene.height)).into_drawing_area();
        draw_scene(&root, scene, palette)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg)
}

/// Draw the scene into an RGB buffer and encode it as PNG
pub fn render_png(scene: &SceneGraph, palette: &ColorPalette) -> Result<Vec<u8>> {
    crate::check_dimensions(scene.width, scene.height)?;
    let size = (scene.width as usize)
        .checked_mul(scene.height as usize)
        .and_then(|n| n.checked_mul(3))
        .context("PNG buffer size overflows")?;
    let mut buffer = vec![0u8; size];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height))
            .into_drawing_area();
        draw_scene(&root, scene, palette)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, scene.width, scene.height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

fn draw_scene<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    scene: &SceneGraph,
    palette: &ColorPalette,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    let body = match &scene.title {
        Some(title) => root
            .titled(title, (FONT, 20))
            .context("Failed to draw title")?,
        None => root.clone(),
    };

    let plot_area = if scene.legend.entries.is_empty() {
        body
    } else {
        let (w, _) = body.dim_in_pixel();
        let (plot_area, legend_area) = body.split_horizontally(w.saturating_sub(LEGEND_WIDTH));
        draw_legend(&legend_area, &scene.legend, palette)?;
        plot_area
    };

    let cells = plot_area.split_evenly((scene.nrow.max(1), scene.ncol.max(1)));
    for panel in &scene.panels {
        let idx = panel.row * scene.ncol.max(1) + panel.col;
        let Some(cell) = cells.get(idx) else {
            anyhow::bail!("Panel ({}, {}) lies outside the facet grid", panel.row, panel.col);
        };
        if panel.show_axes {
            draw_panel(cell, panel, palette)?;
        } else {
            draw_pie_panel(cell, panel, palette)?;
        }
    }

    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &PanelScene,
    palette: &ColorPalette,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (x0, x1) = panel.x_scale.domain;
    let (y0, y1) = panel.y_scale.domain;

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(panel.title.as_deref().unwrap_or(""), (FONT, 14))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)
        .context("Failed to build chart")?;

    let categories = &panel.x_scale.categories;
    let category_label = |x: &f64| {
        let idx = x.round();
        if (x - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < categories.len() {
            categories[idx as usize].clone()
        } else {
            String::new()
        }
    };

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(panel.x_label.as_deref().unwrap_or(""))
        .y_desc(panel.y_label.as_deref().unwrap_or(""));
    if panel.x_scale.is_categorical {
        mesh.disable_x_mesh()
            .x_labels(categories.len() + 1)
            .x_label_formatter(&category_label);
    }
    mesh.draw().context("Failed to draw mesh")?;

    for command in &panel.commands {
        match command {
            DrawCommand::DrawLine { points, color, width } => {
                let c = ink(palette, *color);
                chart
                    .draw_series(LineSeries::new(points.iter().copied(), c.stroke_width(*width)))
                    .context("Failed to draw line series")?;
            }
            DrawCommand::DrawPoint { points, color, size, alpha } => {
                let style = ink(palette, *color).mix(*alpha).filled();
                chart
                    .draw_series(points.iter().map(|&p| Circle::new(p, *size as i32, style)))
                    .context("Failed to draw point series")?;
            }
            DrawCommand::DrawRect { tl, br, color, alpha } => {
                let style = ink(palette, *color).mix(*alpha).filled();
                chart
                    .draw_series(std::iter::once(Rectangle::new([*tl, *br], style)))
                    .context("Failed to draw rectangle")?;
            }
            DrawCommand::DrawPolygon { points, color, alpha } => {
                let style = ink(palette, *color).mix(*alpha).filled();
                chart
                    .draw_series(std::iter::once(Polygon::new(points.clone(), style)))
                    .context("Failed to draw polygon")?;
            }
            DrawCommand::DrawText { at, text } => {
                let style = (FONT, 12).into_font().color(&BLACK);
                chart
                    .draw_series(std::iter::once(Text::new(text.clone(), *at, style)))
                    .context("Failed to draw text")?;
            }
        }
    }

    Ok(())
}

/// Pies are drawn in the largest centred square of the cell, without axes
fn draw_pie_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &PanelScene,
    palette: &ColorPalette,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (w, h) = area.dim_in_pixel();
    let side = w.min(h);
    let pad_x = (w - side) / 2;
    let pad_y = (h - side) / 2;
    let square = area.margin(pad_y, pad_y, pad_x, pad_x);

    let (x0, x1) = panel.x_scale.domain;
    let (y0, y1) = panel.y_scale.domain;
    let mut chart = ChartBuilder::on(&square)
        .margin(10)
        .build_cartesian_2d(x0..x1, y0..y1)
        .context("Failed to build chart")?;

    let label_style = (FONT, 14)
        .into_font()
        .color(&WHITE)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for command in &panel.commands {
        match command {
            DrawCommand::DrawPolygon { points, color, alpha } => {
                let style = ink(palette, *color).mix(*alpha).filled();
                chart
                    .draw_series(std::iter::once(Polygon::new(points.clone(), style)))
                    .context("Failed to draw wedge")?;
            }
            DrawCommand::DrawText { at, text } => {
                chart
                    .draw_series(std::iter::once(Text::new(text.clone(), *at, label_style.clone())))
                    .context("Failed to draw wedge label")?;
            }
            _ => {}
        }
    }

    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    legend: &Legend,
    palette: &ColorPalette,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let x = 10;
    let mut y = 30;

    if let Some(title) = &legend.title {
        area.draw(&Text::new(title.clone(), (x, y), (FONT, 14).into_font()))
            .context("Failed to draw legend title")?;
        y += LEGEND_ROW;
    }

    for (label, color) in &legend.entries {
        let swatch = palette.color(*color).filled();
        area.draw(&Rectangle::new([(x, y), (x + LEGEND_SWATCH, y + LEGEND_SWATCH)], swatch))
            .context("Failed to draw legend swatch")?;
        area.draw(&Text::new(label.clone(), (x + LEGEND_SWATCH + 8, y), (FONT, 13).into_font()))
            .context("Failed to draw legend label")?;
        y += LEGEND_ROW;
    }

    Ok(())
}

fn ink(palette: &ColorPalette, color: Ink) -> RGBColor {
    match color {
        Ink::Palette(idx) => palette.color(idx),
        Ink::White => WHITE,
        Ink::Dark => RGBColor(42, 63, 95),
    }
}
