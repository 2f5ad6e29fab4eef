use anyhow::Result;
use crate::chart::{ChartKind, ChartNode};
use crate::ir::{
    BoxStats, DrawCommand, GroupGeometry, Ink, Legend, PanelData, PanelScene, PieSlice,
    RenderData, ScaleSystem, SceneGraph, ViolinStats,
};
use crate::parser::BarPosition;
use crate::RenderOptions;

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, TAU};

const BAR_WIDTH: f64 = 0.8;
const BOX_WIDTH: f64 = 0.5;
const VIOLIN_WIDTH: f64 = 0.8;
const PIE_LABEL_RADIUS: f64 = 0.65;

// =============================================================================
// Boxplot Geometry Helpers
// =============================================================================

/// Computed geometry for a single boxplot, expressed as primitive shapes
struct BoxplotGeometry {
    lower_whisker: Vec<(f64, f64)>,
    upper_whisker: Vec<(f64, f64)>,
    min_cap: Vec<(f64, f64)>,
    max_cap: Vec<(f64, f64)>,
    box_tl: (f64, f64),
    box_br: (f64, f64),
    median_line: Vec<(f64, f64)>,
    outlier_points: Vec<(f64, f64)>,
}

fn compute_boxplot_geometry(x: f64, width: f64, s: &BoxStats) -> BoxplotGeometry {
    let half_width = width / 2.0;
    let cap_half = width * 0.2;

    BoxplotGeometry {
        lower_whisker: vec![(x, s.lower_whisker), (x, s.q1)],
        upper_whisker: vec![(x, s.q3), (x, s.upper_whisker)],
        min_cap: vec![(x - cap_half, s.lower_whisker), (x + cap_half, s.lower_whisker)],
        max_cap: vec![(x - cap_half, s.upper_whisker), (x + cap_half, s.upper_whisker)],
        box_tl: (x - half_width, s.q3),
        box_br: (x + half_width, s.q1),
        median_line: vec![(x - half_width, s.median), (x + half_width, s.median)],
        outlier_points: s.outliers.iter().map(|&v| (x, v)).collect(),
    }
}

/// Mirrored density outline: right edge bottom-up, then left edge top-down
fn violin_outline(x: f64, width: f64, s: &ViolinStats) -> Vec<(f64, f64)> {
    let half_width = width / 2.0;
    let mut points = Vec::with_capacity(s.grid.len() * 2);
    for (&y, &d) in s.grid.iter().zip(&s.density) {
        points.push((x + d * half_width, y));
    }
    for (&y, &d) in s.grid.iter().zip(&s.density).rev() {
        points.push((x - d * half_width, y));
    }
    points
}

/// Groups present at each category, for side-by-side placement.
/// Map: Quantized X -> List of Group Indices present at that X
fn occupancy(panel: &PanelData) -> HashMap<i64, Vec<usize>> {
    let mut x_occupancy: HashMap<i64, Vec<usize>> = HashMap::new();
    for (g_idx, group) in panel.groups.iter().enumerate() {
        let xs = match &group.geometry {
            GroupGeometry::Bars { x, .. }
            | GroupGeometry::Boxes { x, .. }
            | GroupGeometry::Violins { x, .. } => x,
            GroupGeometry::Points(_) => continue,
        };
        for &x in xs {
            x_occupancy.entry(x.round() as i64).or_default().push(g_idx);
        }
    }
    for groups_at_x in x_occupancy.values_mut() {
        groups_at_x.sort();
        groups_at_x.dedup();
    }
    x_occupancy
}

/// Slot width and centre offset of one group at one category
fn dodge(
    x_occupancy: &HashMap<i64, Vec<usize>>,
    x_center: f64,
    group_idx: usize,
    width_ratio: f64,
) -> (f64, f64) {
    let Some(occupants) = x_occupancy.get(&(x_center.round() as i64)) else {
        return (width_ratio, 0.0);
    };
    let Some(rank) = occupants.iter().position(|&g| g == group_idx) else {
        return (width_ratio, 0.0);
    };
    let num_at_x = occupants.len() as f64;
    let slot = width_ratio / num_at_x;
    let offset = (rank as f64 - (num_at_x - 1.0) / 2.0) * slot;
    (slot, offset)
}

fn compile_groups(panel: &PanelData, position: BarPosition) -> Vec<DrawCommand> {
    let mut commands = Vec::new();
    let x_occupancy = occupancy(panel);

    for (group_idx, group) in panel.groups.iter().enumerate() {
        let ink = Ink::Palette(group.color);
        match &group.geometry {
            GroupGeometry::Bars { x, y_start, y_end } => {
                for i in 0..x.len() {
                    let (slot_width, x_offset) = match position {
                        BarPosition::Group => dodge(&x_occupancy, x[i], group_idx, BAR_WIDTH),
                        BarPosition::Relative => (BAR_WIDTH, 0.0),
                    };
                    let x_final = x[i] + x_offset;
                    let half_width = slot_width / 2.0;
                    commands.push(DrawCommand::DrawRect {
                        tl: (x_final - half_width, y_end[i]),
                        br: (x_final + half_width, y_start[i]),
                        color: ink,
                        alpha: 1.0,
                    });
                }
            }
            GroupGeometry::Points(points) => {
                commands.push(DrawCommand::DrawPoint {
                    points: points.clone(),
                    color: ink,
                    size: 4,
                    alpha: 0.8,
                });
            }
            GroupGeometry::Boxes { x, stats } => {
                for (&x_center, s) in x.iter().zip(stats) {
                    let (slot_width, x_offset) = dodge(&x_occupancy, x_center, group_idx, BOX_WIDTH);
                    let geom = compute_boxplot_geometry(x_center + x_offset, slot_width, s);

                    // Emit primitive commands in correct z-order
                    for line in [geom.lower_whisker, geom.upper_whisker, geom.min_cap, geom.max_cap] {
                        commands.push(DrawCommand::DrawLine { points: line, color: ink, width: 2 });
                    }
                    commands.push(DrawCommand::DrawRect {
                        tl: geom.box_tl,
                        br: geom.box_br,
                        color: ink,
                        alpha: 0.6,
                    });
                    commands.push(DrawCommand::DrawLine {
                        points: geom.median_line,
                        color: Ink::White,
                        width: 2,
                    });
                    if !geom.outlier_points.is_empty() {
                        commands.push(DrawCommand::DrawPoint {
                            points: geom.outlier_points,
                            color: ink,
                            size: 3,
                            alpha: 0.8,
                        });
                    }
                }
            }
            GroupGeometry::Violins { x, stats } => {
                for (&x_center, s) in x.iter().zip(stats) {
                    let (slot_width, x_offset) = dodge(&x_occupancy, x_center, group_idx, VIOLIN_WIDTH);
                    let x_final = x_center + x_offset;
                    commands.push(DrawCommand::DrawPolygon {
                        points: violin_outline(x_final, slot_width, s),
                        color: ink,
                        alpha: 0.5,
                    });
                    let quarter = slot_width / 4.0;
                    commands.push(DrawCommand::DrawLine {
                        points: vec![(x_final - quarter, s.median), (x_final + quarter, s.median)],
                        color: Ink::Dark,
                        width: 2,
                    });
                }
            }
        }
    }

    commands
}

/// Wedges run clockwise from twelve o'clock, each labelled with its share
fn compile_pie(slices: &[PieSlice]) -> Vec<DrawCommand> {
    let mut commands = Vec::new();
    let mut cumulative = 0.0;

    for slice in slices {
        if slice.fraction <= 0.0 {
            continue;
        }
        let start = FRAC_PI_2 - TAU * cumulative;
        let end = FRAC_PI_2 - TAU * (cumulative + slice.fraction);
        let steps = ((slice.fraction * 180.0).ceil() as usize).max(2);

        let mut points = Vec::with_capacity(steps + 2);
        points.push((0.0, 0.0));
        for i in 0..=steps {
            let theta = start + (end - start) * i as f64 / steps as f64;
            points.push((theta.cos(), theta.sin()));
        }
        commands.push(DrawCommand::DrawPolygon {
            points,
            color: Ink::Palette(slice.color),
            alpha: 1.0,
        });

        let mid = (start + end) / 2.0;
        commands.push(DrawCommand::DrawText {
            at: (PIE_LABEL_RADIUS * mid.cos(), PIE_LABEL_RADIUS * mid.sin()),
            text: format!("{:.1}%", slice.fraction * 100.0),
        });

        cumulative += slice.fraction;
    }

    commands
}

/// Compile data and scales into a SceneGraph of drawing commands
pub fn compile_geometry(
    node: &ChartNode,
    data: RenderData,
    scales: ScaleSystem,
    options: &RenderOptions,
) -> Result<SceneGraph> {
    let is_pie = node.kind == ChartKind::Pie;
    let axis_label = |col: &Option<String>| col.as_deref().map(|c| node.label_for(c).to_string());

    let panels = data
        .panels
        .iter()
        .map(|panel| {
            let commands = if is_pie {
                compile_pie(&panel.slices)
            } else {
                compile_groups(panel, node.bar_position)
            };
            PanelScene {
                row: panel.row,
                col: panel.col,
                title: panel.title.clone(),
                x_label: if is_pie { None } else { axis_label(&node.channels.x) },
                y_label: if is_pie { None } else { axis_label(&node.channels.y) },
                x_scale: scales.x.clone(),
                y_scale: scales.y.clone(),
                show_axes: !is_pie,
                commands,
            }
        })
        .collect();

    // A pie's legend names its slices
    let legend = if is_pie {
        Legend {
            title: axis_label(&node.channels.names),
            entries: data
                .panels
                .first()
                .map(|p| p.slices.iter().map(|s| (s.label.clone(), s.color)).collect())
                .unwrap_or_default(),
        }
    } else {
        data.legend
    };

    Ok(SceneGraph {
        width: options.width,
        height: options.height,
        title: node.title.clone(),
        nrow: data.facet_layout.nrow,
        ncol: data.facet_layout.ncol,
        panels,
        legend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ChartSpec;
    use crate::data::Dataset;
    use crate::resolve::bind;
    use crate::scale::build_scales;
    use crate::transform::apply_transformations;

    fn scene_for(recipe: &str, data: &Dataset) -> SceneGraph {
        let spec = ChartSpec::parse(recipe).unwrap();
        let table = match spec.aggregation() {
            Some(agg) => agg.apply(data).unwrap().to_dataset(),
            None => data.clone(),
        };
        let node = bind(&spec, &table).unwrap();
        let rd = apply_transformations(&node).unwrap();
        let scales = build_scales(&rd, node.kind).unwrap();
        compile_geometry(&node, rd, scales, &RenderOptions::default()).unwrap()
    }

    fn survivors() -> Dataset {
        Dataset::from_strings(
            &["Survived", "Sex", "Fare"],
            &[
                vec!["0", "male", "7.25"],
                vec!["1", "female", "71.28"],
                vec!["1", "male", "8.05"],
                vec!["1", "female", "53.1"],
            ],
        )
    }

    fn rects(scene: &SceneGraph) -> Vec<((f64, f64), (f64, f64))> {
        scene.panels[0]
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawRect { tl, br, .. } => Some((*tl, *br)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_grouped_bars_share_the_slot() {
        let scene = scene_for(
            r#"count(Survived, Sex) | bar(x: Sex, y: Count, color: Survived, position: "group") | labs(Sex: "Gender")"#,
            &survivors(),
        );
        assert_eq!(scene.panels[0].x_label.as_deref(), Some("Gender"));
        let bars = rects(&scene);
        assert_eq!(bars.len(), 3);

        // female has only survivors: one full-width bar
        let (tl, br) = bars[1];
        assert!((br.0 - tl.0 - BAR_WIDTH).abs() < 1e-9);

        // male has both groups: half-width bars either side of the tick
        let (tl0, br0) = bars[0];
        let (tl2, _) = bars[2];
        assert!((br0.0 - tl0.0 - BAR_WIDTH / 2.0).abs() < 1e-9);
        assert!(tl0.0 < 1.0 && tl2.0 >= 1.0 - 1e-9);
    }

    #[test]
    fn test_dodge_offsets() {
        let mut occ = HashMap::new();
        occ.insert(0, vec![0, 1]);
        let (slot, left) = dodge(&occ, 0.0, 0, 0.8);
        let (_, right) = dodge(&occ, 0.0, 1, 0.8);
        assert_eq!(slot, 0.4);
        assert_eq!(left, -0.2);
        assert_eq!(right, 0.2);
    }

    #[test]
    fn test_boxplot_emits_primitives() {
        let scene = scene_for("data | boxplot(x: Survived, y: Fare)", &survivors());
        let cmds = &scene.panels[0].commands;
        // Two categories, each: 4 lines + box + median
        let lines = cmds.iter().filter(|c| matches!(c, DrawCommand::DrawLine { .. })).count();
        assert_eq!(lines, 10);
        assert!(cmds.iter().any(|c| matches!(c, DrawCommand::DrawLine { color: Ink::White, .. })));
    }

    #[test]
    fn test_pie_wedges_and_percentages() {
        let scene = scene_for(
            "count(Survived, Sex) | pie(names: Sex, values: Count, color: Survived)",
            &survivors(),
        );
        let panel = &scene.panels[0];
        assert!(!panel.show_axes);
        assert!(panel.x_label.is_none());
        let texts: Vec<&str> = panel
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["50.0%", "50.0%"]);
        assert_eq!(scene.legend.entries.len(), 2);
        assert_eq!(scene.legend.entries[0].0, "female");
    }

    #[test]
    fn test_violin_outline_is_mirrored() {
        let s = ViolinStats { grid: vec![0.0, 1.0], density: vec![1.0, 0.5], median: 0.5 };
        let pts = violin_outline(2.0, 0.8, &s);
        let expected = [(2.4, 0.0), (2.2, 1.0), (1.8, 1.0), (1.6, 0.0)];
        assert_eq!(pts.len(), expected.len());
        for (got, want) in pts.iter().zip(expected) {
            assert!((got.0 - want.0).abs() < 1e-9 && got.1 == want.1, "{:?} != {:?}", got, want);
        }
    }

    #[test]
    fn test_scene_carries_title_and_size() {
        let scene = scene_for(
            r#"data | point(x: Fare, y: Survived) | labs(title: "Fares")"#,
            &survivors(),
        );
        assert_eq!(scene.title.as_deref(), Some("Fares"));
        assert_eq!((scene.width, scene.height), (900, 500));
        assert_eq!(scene.nrow, 1);
    }
}
