use anyhow::Result;
use crate::chart::ChartKind;
use crate::ir::{GroupGeometry, PanelData, RenderData, Scale, ScaleSystem};

/// Half-width of the square a pie is drawn in; leaves room for labels
pub const PIE_EXTENT: f64 = 1.2;

/// Build the scale system for the chart. Facet panels share one set of
/// scales so bars in different cells compare directly.
pub fn build_scales(data: &RenderData, kind: ChartKind) -> Result<ScaleSystem> {
    if kind == ChartKind::Pie {
        let unit = Scale {
            domain: (-PIE_EXTENT, PIE_EXTENT),
            is_categorical: false,
            categories: Vec::new(),
        };
        return Ok(ScaleSystem { x: unit.clone(), y: unit });
    }

    // 1. Merge raw ranges across panels
    let mut x_mm = MinMax::default();
    let mut y_mm = MinMax::default();
    for panel in &data.panels {
        extend_ranges(panel, &mut x_mm, &mut y_mm);
    }

    // 2. X-Axis
    let x = match &data.x_categories {
        Some(categories) => {
            let n = categories.len().max(1) as f64;
            Scale {
                domain: (-0.5, n - 0.5),
                is_categorical: true,
                categories: categories.clone(),
            }
        }
        None => Scale {
            domain: pad_range(x_mm.min_or(0.0), x_mm.max_or(1.0)),
            is_categorical: false,
            categories: Vec::new(),
        },
    };

    // 3. Y-Axis (bar charts always include 0)
    let (mut min, mut max) = (y_mm.min_or(0.0), y_mm.max_or(1.0));
    let has_bars = kind == ChartKind::Bar;
    if has_bars {
        if min > 0.0 { min = 0.0; }
        if max < 0.0 { max = 0.0; }
    }
    let (mut lo, hi) = pad_range(min, max);
    if has_bars && min == 0.0 {
        lo = 0.0;
    }

    Ok(ScaleSystem {
        x,
        y: Scale {
            domain: (lo, hi),
            is_categorical: false,
            categories: Vec::new(),
        },
    })
}

#[derive(Debug, Clone, Copy)]
struct MinMax {
    min: f64,
    max: f64,
}

impl Default for MinMax {
    fn default() -> Self {
        Self { min: f64::INFINITY, max: f64::NEG_INFINITY }
    }
}

impl MinMax {
    fn push(&mut self, v: f64) {
        if v < self.min { self.min = v; }
        if v > self.max { self.max = v; }
    }

    fn min_or(&self, fallback: f64) -> f64 {
        if self.min.is_finite() { self.min } else { fallback }
    }

    fn max_or(&self, fallback: f64) -> f64 {
        if self.max.is_finite() { self.max } else { fallback }
    }
}

fn extend_ranges(panel: &PanelData, x_mm: &mut MinMax, y_mm: &mut MinMax) {
    for group in &panel.groups {
        match &group.geometry {
            GroupGeometry::Bars { x, y_start, y_end } => {
                x.iter().for_each(|&v| x_mm.push(v));
                y_start.iter().chain(y_end).for_each(|&v| y_mm.push(v));
            }
            GroupGeometry::Points(points) => {
                for &(px, py) in points {
                    x_mm.push(px);
                    y_mm.push(py);
                }
            }
            GroupGeometry::Boxes { x, stats } => {
                x.iter().for_each(|&v| x_mm.push(v));
                for s in stats {
                    y_mm.push(s.lower_whisker);
                    y_mm.push(s.upper_whisker);
                    s.outliers.iter().for_each(|&v| y_mm.push(v));
                }
            }
            GroupGeometry::Violins { x, stats } => {
                x.iter().for_each(|&v| x_mm.push(v));
                for s in stats {
                    s.grid.iter().for_each(|&v| y_mm.push(v));
                }
            }
        }
    }
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FacetLayout, GroupData, Legend};

    fn render_data(groups: Vec<GroupGeometry>, x_categories: Option<Vec<String>>) -> RenderData {
        RenderData {
            panels: vec![PanelData {
                index: 0,
                row: 0,
                col: 0,
                title: None,
                groups: groups
                    .into_iter()
                    .enumerate()
                    .map(|(i, geometry)| GroupData { key: i.to_string(), color: i, geometry })
                    .collect(),
                slices: vec![],
            }],
            facet_layout: FacetLayout { nrow: 1, ncol: 1 },
            x_categories,
            legend: Legend::default(),
        }
    }

    #[test]
    fn test_scale_continuous() {
        let data = render_data(vec![GroupGeometry::Points(vec![(0.0, 0.0), (10.0, 100.0)])], None);
        let scales = build_scales(&data, ChartKind::Scatter).unwrap();

        // Check padding
        assert!(scales.x.domain.0 < 0.0);
        assert!(scales.x.domain.1 > 10.0);
        assert!(!scales.x.is_categorical);
    }

    #[test]
    fn test_scale_single_point() {
        let data = render_data(vec![GroupGeometry::Points(vec![(5.0, 5.0)])], None);
        let scales = build_scales(&data, ChartKind::Scatter).unwrap();
        assert_eq!(scales.x.domain, (4.0, 6.0));
    }

    #[test]
    fn test_scale_categorical_bars_start_at_zero() {
        let data = render_data(
            vec![GroupGeometry::Bars { x: vec![0.0, 1.0], y_start: vec![0.0, 0.0], y_end: vec![10.0, 20.0] }],
            Some(vec!["A".to_string(), "B".to_string()]),
        );
        let scales = build_scales(&data, ChartKind::Bar).unwrap();

        assert!(scales.x.is_categorical);
        assert_eq!(scales.x.categories, vec!["A", "B"]);
        assert_eq!(scales.x.domain, (-0.5, 1.5));
        assert_eq!(scales.y.domain.0, 0.0);
        assert!(scales.y.domain.1 > 20.0);
    }

    #[test]
    fn test_scale_empty_panels() {
        let data = render_data(vec![], None);
        let scales = build_scales(&data, ChartKind::Scatter).unwrap();
        assert!(scales.y.domain.0 < scales.y.domain.1);
    }

    #[test]
    fn test_pie_uses_unit_square() {
        let data = render_data(vec![], None);
        let scales = build_scales(&data, ChartKind::Pie).unwrap();
        assert_eq!(scales.x.domain, (-PIE_EXTENT, PIE_EXTENT));
        assert_eq!(scales.y.domain, scales.x.domain);
    }
}
