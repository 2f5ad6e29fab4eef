// Abstract Syntax Tree for chart recipes

/// A complete chart recipe: where the rows come from, how they are drawn,
/// optional faceting and the labels shown to the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub source: Source,
    pub geom: Geom,
    pub facet: Option<FacetGrid>,
    pub labels: Labels,
}

/// Table a chart is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// The raw dataset
    Data,
    /// A group-by-count over these columns
    Count(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geom {
    Bar(BarGeom),
    Pie(PieGeom),
    Point(XyGeom),
    Boxplot(XyGeom),
    Violin(XyGeom),
}

/// How bars sharing an x category are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarPosition {
    /// Side by side
    Group,
    /// On top of each other
    #[default]
    Relative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarGeom {
    pub x: String,
    pub y: String,
    pub color: Option<String>,
    pub position: BarPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieGeom {
    pub names: String,
    pub values: String,
    pub color: Option<String>,
}

/// Shared shape of point, boxplot and violin geoms
#[derive(Debug, Clone, PartialEq)]
pub struct XyGeom {
    pub x: String,
    pub y: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FacetGrid {
    pub rows: Option<String>,
    pub cols: Option<String>,
}

/// Chart title plus display names for raw column names, in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Labels {
    pub title: Option<String>,
    pub columns: Vec<(String, String)>,
}

impl Labels {
    /// Display name for a column, falling back to the column itself.
    pub fn display<'a>(&'a self, column: &'a str) -> &'a str {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, d)| d.as_str())
            .unwrap_or(column)
    }
}
