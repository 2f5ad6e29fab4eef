//! Report assembly: dataset in, ordered display tree out.

use crate::aggregate::{aggregate_all, AggregatedTable};
use crate::catalog;
use crate::chart::ChartNode;
use crate::parser::ChartSpec;
use crate::data::Dataset;
use crate::error::Result;
use crate::resolve::bind;
use tracing::info;

/// CSS declarations in insertion order
pub type Style = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayNode {
    Heading {
        level: u8,
        text: String,
        style: Style,
    },
    Paragraph(String),
    List(Vec<String>),
    Chart(ChartNode),
    Container {
        style: Style,
        children: Vec<DisplayNode>,
    },
}

impl DisplayNode {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        DisplayNode::Heading {
            level,
            text: text.into(),
            style: Style::new(),
        }
    }

    pub fn styled_heading(level: u8, text: impl Into<String>, style: &[(&str, &str)]) -> Self {
        DisplayNode::Heading {
            level,
            text: text.into(),
            style: to_style(style),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        DisplayNode::Paragraph(text.into())
    }
}

fn to_style(pairs: &[(&str, &str)]) -> Style {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The finished report. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayTree {
    pub nodes: Vec<DisplayNode>,
}

impl DisplayTree {
    /// Every node, depth first, containers before their children
    pub fn flatten(&self) -> Vec<&DisplayNode> {
        fn walk<'a>(nodes: &'a [DisplayNode], out: &mut Vec<&'a DisplayNode>) {
            for node in nodes {
                out.push(node);
                if let DisplayNode::Container { children, .. } = node {
                    walk(children, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Charts in page order
    pub fn charts(&self) -> Vec<&ChartNode> {
        self.flatten()
            .into_iter()
            .filter_map(|n| match n {
                DisplayNode::Chart(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn headings(&self, level: u8) -> Vec<&str> {
        self.flatten()
            .into_iter()
            .filter_map(|n| match n {
                DisplayNode::Heading { level: l, text, .. } if *l == level => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn lists(&self) -> Vec<&[String]> {
        self.flatten()
            .into_iter()
            .filter_map(|n| match n {
                DisplayNode::List(items) => Some(items.as_slice()),
                _ => None,
            })
            .collect()
    }
}

/// Parse a recipe and bind it to its source: the raw dataset, or the
/// precomputed count table with matching grouping columns.
fn bind_recipe(recipe: &str, data: &Dataset, tables: &[AggregatedTable]) -> Result<ChartNode> {
    let spec = ChartSpec::parse(recipe)?;
    match spec.aggregation() {
        None => bind(&spec, data),
        Some(agg) => {
            let table = match tables.iter().find(|t| t.group_by == agg.group_by) {
                Some(t) => t.to_dataset(),
                None => agg.apply(data)?.to_dataset(),
            };
            bind(&spec, &table)
        }
    }
}

/// Aggregate, bind every chart and lay out the page. Any failure aborts
/// the whole build; there is no partial report.
pub fn build_report(data: &Dataset) -> Result<DisplayTree> {
    let tables = aggregate_all(data, &catalog::aggregation_specs())?;
    info!(tables = tables.len(), rows = data.len(), "aggregations computed");

    let mut nodes = vec![DisplayNode::styled_heading(
        1,
        catalog::PAGE_TITLE,
        &[("text-align", "center")],
    )];

    for section in &catalog::BASELINE {
        nodes.push(DisplayNode::heading(2, section.heading));
        nodes.push(DisplayNode::Chart(bind_recipe(section.recipe, data, &tables)?));
    }

    for hypothesis in &catalog::HYPOTHESES {
        nodes.push(DisplayNode::heading(2, hypothesis.heading));
        nodes.push(DisplayNode::heading(3, hypothesis.subheading));
        nodes.push(DisplayNode::Chart(bind_recipe(hypothesis.recipe, data, &tables)?));
        nodes.push(DisplayNode::paragraph(hypothesis.explanation));
    }

    nodes.push(DisplayNode::Container {
        style: Style::new(),
        children: vec![
            DisplayNode::heading(2, catalog::CONCLUSIONS_HEADING),
            DisplayNode::paragraph(catalog::CONCLUSIONS_INTRO),
            DisplayNode::List(catalog::CONCLUSIONS.iter().map(|s| s.to_string()).collect()),
        ],
    });

    nodes.push(DisplayNode::Container {
        style: to_style(&catalog::CREDITS_STYLE),
        children: vec![
            DisplayNode::styled_heading(2, catalog::CREDITS_HEADING, &[("margin-bottom", "10px")]),
            DisplayNode::paragraph(catalog::CREDITS_TEXT),
        ],
    });

    let tree = DisplayTree { nodes };
    info!(charts = tree.charts().len(), "report assembled");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartKind, Channels};
    use crate::parser::BarPosition;

    fn sample() -> Dataset {
        Dataset::from_strings(
            &["PassengerId", "Survived", "Pclass", "Sex", "Age", "SibSp", "Parch", "Fare", "Embarked"],
            &[
                vec!["1", "0", "3", "male", "22", "1", "0", "7.25", "S"],
                vec!["2", "1", "1", "female", "38", "1", "0", "71.28", "C"],
                vec!["3", "1", "3", "female", "26", "0", "0", "7.92", "S"],
                vec!["4", "1", "1", "female", "35", "1", "0", "53.1", "S"],
                vec!["5", "0", "3", "male", "35", "0", "0", "8.05", "S"],
                vec!["6", "0", "3", "male", "", "0", "0", "8.46", "Q"],
                vec!["7", "0", "1", "male", "54", "0", "0", "51.86", "S"],
                vec!["8", "1", "2", "female", "14", "1", "2", "30.07", ""],
            ],
        )
    }

    #[test]
    fn test_report_structure() {
        let tree = build_report(&sample()).unwrap();

        assert_eq!(tree.headings(1), vec!["Titanic Dataset Analysis"]);
        assert_eq!(tree.charts().len(), 11);

        let hypotheses: Vec<&str> = tree
            .headings(2)
            .into_iter()
            .filter(|h| h.starts_with("Hypothesis "))
            .collect();
        assert_eq!(hypotheses.len(), 7);
        assert_eq!(tree.headings(3).len(), 7);

        let lists = tree.lists();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].len(), 4);
    }

    #[test]
    fn test_hypothesis_blocks_are_contiguous() {
        let tree = build_report(&sample()).unwrap();
        // H1 + 4 × (H2, chart) precede the first hypothesis
        let first = 1 + 4 * 2;
        for i in 0..7 {
            let block = &tree.nodes[first + i * 4..first + i * 4 + 4];
            assert!(matches!(block[0], DisplayNode::Heading { level: 2, .. }));
            assert!(matches!(block[1], DisplayNode::Heading { level: 3, .. }));
            assert!(matches!(block[2], DisplayNode::Chart(_)));
            assert!(matches!(block[3], DisplayNode::Paragraph(_)));
        }
    }

    #[test]
    fn test_chart_kinds_in_order() {
        let tree = build_report(&sample()).unwrap();
        let kinds: Vec<ChartKind> = tree.charts().iter().map(|c| c.kind).collect();
        assert_eq!(kinds[..4], [ChartKind::Bar, ChartKind::Pie, ChartKind::Scatter, ChartKind::Box]);
        assert_eq!(kinds[6], ChartKind::Violin);
    }

    /// Channels as (x, y, color, names, values, facet row, facet col)
    fn channels(c: [Option<&str>; 7]) -> Channels {
        let owned = c.map(|v| v.map(str::to_string));
        let [x, y, color, names, values, facet_row, facet_col] = owned;
        Channels { x, y, color, names, values, facet_row, facet_col }
    }

    #[test]
    fn test_baseline_headings() {
        let tree = build_report(&sample()).unwrap();
        assert_eq!(
            tree.headings(2)[..4],
            [
                "Survival Rate based on Gender",
                "Proportion of Survivors and Non-Survivors by Passenger Class",
                "Age vs. Fare with Survival Status",
                "Distribution of Fares for Survivors and Non-Survivors by Passenger Class",
            ]
        );
    }

    #[test]
    fn test_chart_bindings() {
        let s = Some;
        let expected = [
            (ChartKind::Bar, channels([s("Sex"), s("Count"), s("Survived"), None, None, None, None])),
            (ChartKind::Pie, channels([None, None, s("Survived"), s("Pclass"), s("Count"), None, None])),
            (ChartKind::Scatter, channels([s("Age"), s("Fare"), s("Survived"), None, None, None, None])),
            (ChartKind::Box, channels([s("Pclass"), s("Fare"), s("Survived"), None, None, None, None])),
            (ChartKind::Bar, channels([s("Pclass"), s("Count"), s("Survived"), None, None, s("Survived"), s("Sex")])),
            (ChartKind::Box, channels([s("Survived"), s("Age"), s("Survived"), None, None, None, None])),
            (ChartKind::Violin, channels([s("Pclass"), s("Fare"), s("Survived"), None, None, None, None])),
            (ChartKind::Bar, channels([s("Embarked"), s("Count"), s("Survived"), None, None, None, None])),
            (ChartKind::Bar, channels([s("SibSp"), s("Count"), s("Survived"), None, None, None, None])),
            (ChartKind::Box, channels([s("Survived"), s("Fare"), s("Survived"), None, None, None, None])),
            (ChartKind::Bar, channels([s("Parch"), s("Count"), s("Survived"), None, None, None, None])),
        ];

        let tree = build_report(&sample()).unwrap();
        let charts = tree.charts();
        assert_eq!(charts.len(), expected.len());
        for (i, (chart, (kind, channels))) in charts.iter().zip(expected).enumerate() {
            assert_eq!(chart.kind, kind, "chart {}", i);
            assert_eq!(chart.channels, channels, "chart {}", i);
        }
        assert!(charts
            .iter()
            .filter(|c| c.kind == ChartKind::Bar)
            .all(|c| c.bar_position == BarPosition::Group));
    }

    #[test]
    fn test_count_charts_preserve_totals() {
        let data = sample();
        let tree = build_report(&data).unwrap();
        let embarked = tree.charts()[7];
        let count_idx = embarked.data.column_index("Count").unwrap();
        let total: f64 = embarked
            .data
            .rows
            .iter()
            .filter_map(|r| r[count_idx].as_f64())
            .sum();
        assert_eq!(total as usize, data.len());
    }

    #[test]
    fn test_credits_container_style() {
        let tree = build_report(&sample()).unwrap();
        match tree.nodes.last().unwrap() {
            DisplayNode::Container { style, children } => {
                assert_eq!(style.len(), 7);
                assert_eq!(style[0], ("font-size".to_string(), "16px".to_string()));
                assert!(matches!(&children[0], DisplayNode::Heading { text, .. } if text == "Credits"));
            }
            other => panic!("Expected credits container, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_embarked_fails_before_charts() {
        let data = sample();
        let keep: Vec<&str> = data
            .headers
            .iter()
            .map(String::as_str)
            .filter(|h| *h != "Embarked")
            .collect();
        let trimmed = data.project(&keep).unwrap();
        let err = build_report(&trimmed).unwrap_err();
        assert!(err.is_schema_error());
        assert!(err.to_string().contains("Embarked"));
    }

    #[test]
    fn test_deterministic() {
        let data = sample();
        assert_eq!(build_report(&data).unwrap(), build_report(&data).unwrap());
    }
}
