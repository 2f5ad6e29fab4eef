use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use crate::chart::{ChartKind, ChartNode};
use crate::data::{Dataset, Datum};
use crate::ir::{
    BoxStats, FacetLayout, GroupData, GroupGeometry, Legend, PanelData, PieSlice, RenderData,
    ViolinStats,
};
use crate::parser::BarPosition;

/// Main entry point: reshape a bound chart into renderable panels
pub fn apply_transformations(node: &ChartNode) -> Result<RenderData> {
    let data = &node.data;
    let ch = &node.channels;

    // 1. Facet grid values (a single `None` when the axis is not faceted)
    let facet_rows = facet_values(data, ch.facet_row.as_deref())?;
    let facet_cols = facet_values(data, ch.facet_col.as_deref())?;

    // 2. Colour groups, shared by every panel so colours stay stable
    let color_idx = optional_col(data, ch.color.as_deref())?;
    let color_keys: Vec<Datum> = match color_idx {
        Some(idx) => distinct_sorted(data, idx),
        None => Vec::new(),
    };
    let legend = Legend {
        title: ch.color.as_deref().map(|c| node.label_for(c).to_string()),
        entries: color_keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.label(), i))
            .collect(),
    };

    // 3. Discrete x axis for everything but scatter and pie
    let x_idx = optional_col(data, ch.x.as_deref())?;
    let x_categories: Option<Vec<Datum>> = match (node.kind, x_idx) {
        (ChartKind::Bar | ChartKind::Box | ChartKind::Violin, Some(idx)) => {
            Some(distinct_sorted(data, idx))
        }
        _ => None,
    };

    // 4. Build each panel
    let row_idx = optional_col(data, ch.facet_row.as_deref())?;
    let col_idx = optional_col(data, ch.facet_col.as_deref())?;

    let mut panels = Vec::new();
    for (r, row_val) in facet_rows.iter().enumerate() {
        for (c, col_val) in facet_cols.iter().enumerate() {
            let rows: Vec<&Vec<Datum>> = data
                .rows
                .iter()
                .filter(|row| matches_facet(row, row_idx, row_val.as_ref()))
                .filter(|row| matches_facet(row, col_idx, col_val.as_ref()))
                .collect();

            let mut title_parts = Vec::new();
            if let (Some(name), Some(v)) = (ch.facet_row.as_deref(), row_val) {
                title_parts.push(format!("{}={}", node.label_for(name), v.label()));
            }
            if let (Some(name), Some(v)) = (ch.facet_col.as_deref(), col_val) {
                title_parts.push(format!("{}={}", node.label_for(name), v.label()));
            }

            let ctx = PanelContext {
                node,
                rows: &rows,
                color_idx,
                color_keys: &color_keys,
                x_categories: x_categories.as_deref(),
            };

            let (groups, slices) = match node.kind {
                ChartKind::Bar => (build_bars(&ctx)?, Vec::new()),
                ChartKind::Scatter => (build_points(&ctx)?, Vec::new()),
                ChartKind::Box => (build_boxes(&ctx)?, Vec::new()),
                ChartKind::Violin => (build_violins(&ctx)?, Vec::new()),
                ChartKind::Pie => (Vec::new(), build_pie(&ctx)?),
            };

            panels.push(PanelData {
                index: panels.len(),
                row: r,
                col: c,
                title: if title_parts.is_empty() { None } else { Some(title_parts.join(", ")) },
                groups,
                slices,
            });
        }
    }

    Ok(RenderData {
        panels,
        facet_layout: FacetLayout {
            nrow: facet_rows.len(),
            ncol: facet_cols.len(),
        },
        x_categories: x_categories.map(|cats| cats.iter().map(Datum::label).collect()),
        legend,
    })
}

struct PanelContext<'a> {
    node: &'a ChartNode,
    rows: &'a [&'a Vec<Datum>],
    color_idx: Option<usize>,
    color_keys: &'a [Datum],
    x_categories: Option<&'a [Datum]>,
}

impl<'a> PanelContext<'a> {
    /// Panel rows split by colour key, in legend order. Without a colour
    /// channel there is one unnamed group holding every row.
    fn color_groups(&self) -> Vec<(String, usize, Vec<&'a Vec<Datum>>)> {
        match self.color_idx {
            None => vec![(String::new(), 0, self.rows.to_vec())],
            Some(idx) => self
                .color_keys
                .iter()
                .enumerate()
                .map(|(i, key)| {
                    let rows = self.rows.iter().copied().filter(|r| &r[idx] == key).collect();
                    (key.label(), i, rows)
                })
                .collect(),
        }
    }

    fn x_index(&self, value: &Datum) -> Option<usize> {
        self.x_categories?.iter().position(|c| c == value)
    }

    fn col(&self, name: Option<&str>) -> Result<usize> {
        let name = name.ok_or_else(|| anyhow!("{} chart has an unbound channel", self.node.kind.as_str()))?;
        Ok(self.node.data.column_index(name)?)
    }
}

fn build_bars(ctx: &PanelContext) -> Result<Vec<GroupData>> {
    let x_col = ctx.col(ctx.node.channels.x.as_deref())?;
    let y_col = ctx.col(ctx.node.channels.y.as_deref())?;
    let y_name = ctx.node.channels.y.as_deref().unwrap_or_default();
    let stacked = ctx.node.bar_position == BarPosition::Relative;

    // Running top of each stack, keyed by category index
    let mut stack_top: BTreeMap<usize, f64> = BTreeMap::new();
    let mut groups = Vec::new();

    for (key, color, rows) in ctx.color_groups() {
        let mut sums: BTreeMap<usize, f64> = BTreeMap::new();
        for row in rows {
            let Some(xi) = ctx.x_index(&row[x_col]) else { continue };
            let Some(y) = numeric(&row[y_col], y_name)? else { continue };
            *sums.entry(xi).or_default() += y;
        }
        if sums.is_empty() {
            continue;
        }

        let mut x = Vec::new();
        let mut y_start = Vec::new();
        let mut y_end = Vec::new();
        for (xi, value) in sums {
            let base = if stacked { *stack_top.get(&xi).unwrap_or(&0.0) } else { 0.0 };
            x.push(xi as f64);
            y_start.push(base);
            y_end.push(base + value);
            if stacked {
                stack_top.insert(xi, base + value);
            }
        }

        groups.push(GroupData {
            key,
            color,
            geometry: GroupGeometry::Bars { x, y_start, y_end },
        });
    }

    Ok(groups)
}

fn build_points(ctx: &PanelContext) -> Result<Vec<GroupData>> {
    let x_col = ctx.col(ctx.node.channels.x.as_deref())?;
    let y_col = ctx.col(ctx.node.channels.y.as_deref())?;
    let x_name = ctx.node.channels.x.as_deref().unwrap_or_default();
    let y_name = ctx.node.channels.y.as_deref().unwrap_or_default();

    let mut groups = Vec::new();
    for (key, color, rows) in ctx.color_groups() {
        let mut points = Vec::new();
        for row in rows {
            // A point needs both coordinates
            if let (Some(x), Some(y)) = (numeric(&row[x_col], x_name)?, numeric(&row[y_col], y_name)?) {
                points.push((x, y));
            }
        }
        groups.push(GroupData {
            key,
            color,
            geometry: GroupGeometry::Points(points),
        });
    }
    Ok(groups)
}

/// Numeric y values of each x category, per colour group
fn collect_by_category(
    ctx: &PanelContext,
) -> Result<Vec<(String, usize, BTreeMap<usize, Vec<f64>>)>> {
    let x_col = ctx.col(ctx.node.channels.x.as_deref())?;
    let y_col = ctx.col(ctx.node.channels.y.as_deref())?;
    let y_name = ctx.node.channels.y.as_deref().unwrap_or_default();

    let mut out = Vec::new();
    for (key, color, rows) in ctx.color_groups() {
        let mut by_x: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for row in rows {
            let Some(xi) = ctx.x_index(&row[x_col]) else { continue };
            if let Some(y) = numeric(&row[y_col], y_name)? {
                by_x.entry(xi).or_default().push(y);
            }
        }
        out.push((key, color, by_x));
    }
    Ok(out)
}

fn build_boxes(ctx: &PanelContext) -> Result<Vec<GroupData>> {
    let mut groups = Vec::new();
    for (key, color, by_x) in collect_by_category(ctx)? {
        let mut x = Vec::new();
        let mut stats = Vec::new();
        for (xi, mut ys) in by_x {
            ys.sort_by(f64::total_cmp);
            if let Some(s) = compute_box_stats(&ys) {
                x.push(xi as f64);
                stats.push(s);
            }
        }
        if x.is_empty() {
            continue;
        }
        groups.push(GroupData {
            key,
            color,
            geometry: GroupGeometry::Boxes { x, stats },
        });
    }
    Ok(groups)
}

fn build_violins(ctx: &PanelContext) -> Result<Vec<GroupData>> {
    let mut groups = Vec::new();
    for (key, color, by_x) in collect_by_category(ctx)? {
        let mut x = Vec::new();
        let mut stats = Vec::new();
        for (xi, mut ys) in by_x {
            if ys.is_empty() {
                continue;
            }
            ys.sort_by(f64::total_cmp);
            let bandwidth = silverman_bandwidth(&ys);
            let (grid, density) = compute_kde(&ys, bandwidth);
            x.push(xi as f64);
            stats.push(ViolinStats {
                grid,
                density,
                median: percentile(&ys, 0.5),
            });
        }
        if x.is_empty() {
            continue;
        }
        groups.push(GroupData {
            key,
            color,
            geometry: GroupGeometry::Violins { x, stats },
        });
    }
    Ok(groups)
}

/// One slice per distinct `names` value; duplicate names are summed
fn build_pie(ctx: &PanelContext) -> Result<Vec<PieSlice>> {
    let names_col = ctx.col(ctx.node.channels.names.as_deref())?;
    let values_col = ctx.col(ctx.node.channels.values.as_deref())?;
    let values_name = ctx.node.channels.values.as_deref().unwrap_or_default();

    let mut sums: BTreeMap<&Datum, f64> = BTreeMap::new();
    for row in ctx.rows {
        if let Some(v) = numeric(&row[values_col], values_name)? {
            *sums.entry(&row[names_col]).or_default() += v;
        }
    }

    let total: f64 = sums.values().sum();
    Ok(sums
        .into_iter()
        .enumerate()
        .map(|(i, (name, value))| PieSlice {
            label: name.label(),
            value,
            fraction: if total > 0.0 { value / total } else { 0.0 },
            color: i,
        })
        .collect())
}

fn optional_col(data: &Dataset, name: Option<&str>) -> Result<Option<usize>> {
    match name {
        Some(n) => Ok(Some(data.column_index(n)?)),
        None => Ok(None),
    }
}

fn facet_values(data: &Dataset, name: Option<&str>) -> Result<Vec<Option<Datum>>> {
    match optional_col(data, name)? {
        Some(idx) => Ok(distinct_sorted(data, idx).into_iter().map(Some).collect()),
        None => Ok(vec![None]),
    }
}

fn matches_facet(row: &[Datum], idx: Option<usize>, value: Option<&Datum>) -> bool {
    match (idx, value) {
        (Some(i), Some(v)) => &row[i] == v,
        _ => true,
    }
}

fn distinct_sorted(data: &Dataset, idx: usize) -> Vec<Datum> {
    let mut values: Vec<Datum> = data.rows.iter().map(|r| r[idx].clone()).collect();
    values.sort();
    values.dedup();
    values
}

/// Missing cells are skipped; text in a numeric channel is an error
fn numeric(value: &Datum, column: &str) -> Result<Option<f64>> {
    match value {
        Datum::Number(n) => Ok(Some(*n)),
        Datum::Missing => Ok(None),
        Datum::Text(s) => Err(anyhow!("Column '{}' holds non-numeric value '{}'", column, s)),
    }
}

/// Tukey summary of already-sorted values
fn compute_box_stats(sorted: &[f64]) -> Option<BoxStats> {
    if sorted.is_empty() {
        return None;
    }

    let q1 = percentile(sorted, 0.25);
    let median = percentile(sorted, 0.50);
    let q3 = percentile(sorted, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    // Whiskers: Range of data within fences
    let lower_whisker = sorted.iter().copied().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper_whisker = sorted.iter().rev().copied().find(|&v| v <= upper_fence).unwrap_or(q3);

    let outliers: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}

/// Silverman's rule of thumb for bandwidth selection
fn silverman_bandwidth(sorted: &[f64]) -> f64 {
    let n = sorted.len() as f64;
    if n < 2.0 { return 1.0; }

    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    // IQR-based estimate for robustness
    let iqr = percentile(sorted, 0.75) - percentile(sorted, 0.25);

    // h = 0.9 * min(std, IQR/1.34) * n^(-1/5)
    let scale = if iqr > 0.0 { std_dev.min(iqr / 1.34) } else { std_dev };
    if scale <= 0.0 { return 1.0; }
    0.9 * scale * n.powf(-0.2)
}

fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

/// Gaussian KDE over an evenly spaced grid spanning the data plus three
/// bandwidths either side. Density is normalised to a 0..1 peak.
fn compute_kde(data: &[f64], bandwidth: f64) -> (Vec<f64>, Vec<f64>) {
    const GRID_POINTS: usize = 128;

    let n = data.len() as f64;
    if n == 0.0 { return (vec![], vec![]); }

    let min_y = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max_y = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    let extend = 3.0 * bandwidth;
    let y_start = min_y - extend;
    let y_end = max_y + extend;

    let range = y_end - y_start;
    if range <= 0.0 { return (vec![min_y], vec![1.0]); }

    let step = range / (GRID_POINTS - 1) as f64;
    let mut grid = Vec::with_capacity(GRID_POINTS);
    let mut density = Vec::with_capacity(GRID_POINTS);

    for i in 0..GRID_POINTS {
        let y = y_start + i as f64 * step;
        grid.push(y);
        let d: f64 = data.iter().map(|&xi| gaussian_kernel((y - xi) / bandwidth)).sum();
        density.push(d / (n * bandwidth));
    }

    let max_density = density.iter().fold(0.0f64, |a, &b| a.max(b));
    if max_density > 0.0 {
        for d in &mut density {
            *d /= max_density;
        }
    }

    (grid, density)
}

/// Linear-interpolated percentile of sorted data
fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return 0.0; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}
