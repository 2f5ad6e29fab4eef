//! Chart recipes and the bound chart objects they produce.

use crate::aggregate::AggregationSpec;
use crate::data::Dataset;
use crate::error::{ReportError, Result};
use crate::parser::{self, BarPosition, ChartSpec, Geom, Labels, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Pie,
    Scatter,
    Box,
    Violin,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
            ChartKind::Box => "box",
            ChartKind::Violin => "violin",
        }
    }
}

/// Column bound to each visual channel. Unused channels are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Channels {
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
    pub names: Option<String>,
    pub values: Option<String>,
    pub facet_row: Option<String>,
    pub facet_col: Option<String>,
}

impl Channels {
    /// Bound columns in channel order: x, y, color, names, values, facet row, facet col.
    pub fn columns(&self) -> Vec<&str> {
        [
            &self.x,
            &self.y,
            &self.color,
            &self.names,
            &self.values,
            &self.facet_row,
            &self.facet_col,
        ]
        .into_iter()
        .filter_map(|c| c.as_deref())
        .collect()
    }
}

impl ChartSpec {
    /// Parse a recipe such as `data | point(x: Age, y: Fare)`.
    pub fn parse(recipe: &str) -> Result<Self> {
        match parser::parse_chart_spec(recipe) {
            Ok((_, spec)) => Ok(spec),
            Err(e) => Err(ReportError::Spec {
                recipe: recipe.split_whitespace().collect::<Vec<_>>().join(" "),
                message: format!("{:?}", e),
            }),
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self.geom {
            Geom::Bar(_) => ChartKind::Bar,
            Geom::Pie(_) => ChartKind::Pie,
            Geom::Point(_) => ChartKind::Scatter,
            Geom::Boxplot(_) => ChartKind::Box,
            Geom::Violin(_) => ChartKind::Violin,
        }
    }

    /// The group-by-count feeding this chart, if it does not read raw rows.
    pub fn aggregation(&self) -> Option<AggregationSpec> {
        match &self.source {
            Source::Data => None,
            Source::Count(cols) => Some(AggregationSpec::new(cols.as_slice())),
        }
    }

    pub fn channels(&self) -> Channels {
        let mut channels = Channels::default();
        match &self.geom {
            Geom::Bar(b) => {
                channels.x = Some(b.x.clone());
                channels.y = Some(b.y.clone());
                channels.color = b.color.clone();
            }
            Geom::Pie(p) => {
                channels.names = Some(p.names.clone());
                channels.values = Some(p.values.clone());
                channels.color = p.color.clone();
            }
            Geom::Point(g) | Geom::Boxplot(g) | Geom::Violin(g) => {
                channels.x = Some(g.x.clone());
                channels.y = Some(g.y.clone());
                channels.color = g.color.clone();
            }
        }
        if let Some(facet) = &self.facet {
            channels.facet_row = facet.rows.clone();
            channels.facet_col = facet.cols.clone();
        }
        channels
    }

    pub fn bar_position(&self) -> BarPosition {
        match &self.geom {
            Geom::Bar(b) => b.position,
            _ => BarPosition::default(),
        }
    }

    /// Title, or the chart kind when the recipe has none.
    pub fn name(&self) -> String {
        self.labels
            .title
            .clone()
            .unwrap_or_else(|| self.kind().as_str().to_string())
    }
}

/// A chart bound to its data, ready for a renderer. Owns a projection of
/// the source table holding only the bound columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartNode {
    pub kind: ChartKind,
    pub title: Option<String>,
    pub labels: Labels,
    pub channels: Channels,
    pub bar_position: BarPosition,
    pub data: Dataset,
}

impl ChartNode {
    /// Axis or legend title for a bound column.
    pub fn label_for<'a>(&'a self, column: &'a str) -> &'a str {
        self.labels.display(column)
    }
}
