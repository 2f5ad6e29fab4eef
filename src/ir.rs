// =============================================================================
// Phase 1: Transformation
// =============================================================================

/// A bound chart reshaped for drawing. Split into panels (one per facet
/// cell, or a single panel when the chart is not faceted).
#[derive(Debug, Clone)]
pub struct RenderData {
    pub panels: Vec<PanelData>,
    pub facet_layout: FacetLayout,
    /// Category labels when the x channel is discrete (bar, box, violin)
    pub x_categories: Option<Vec<String>>,
    pub legend: Legend,
}

#[derive(Debug, Clone)]
pub struct FacetLayout {
    pub nrow: usize,
    pub ncol: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Legend {
    pub title: Option<String>,
    /// (label, palette index) in display order
    pub entries: Vec<(String, usize)>,
}

/// Data for a single plot panel (one facet)
#[derive(Debug, Clone)]
pub struct PanelData {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub title: Option<String>,
    pub groups: Vec<GroupData>,
    pub slices: Vec<PieSlice>,
}

/// The atomic unit of rendering: marks sharing one colour.
#[derive(Debug, Clone)]
pub struct GroupData {
    pub key: String,
    pub color: usize,
    pub geometry: GroupGeometry,
}

#[derive(Debug, Clone)]
pub enum GroupGeometry {
    /// Stacking is pre-calculated: each bar spans y_start..y_end
    Bars {
        x: Vec<f64>,
        y_start: Vec<f64>,
        y_end: Vec<f64>,
    },
    Points(Vec<(f64, f64)>),
    Boxes {
        x: Vec<f64>,
        stats: Vec<BoxStats>,
    },
    Violins {
        x: Vec<f64>,
        stats: Vec<ViolinStats>,
    },
}

/// Tukey boxplot summary of one category
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Kernel density summary of one category
#[derive(Debug, Clone)]
pub struct ViolinStats {
    /// Y coordinates of the density curve
    pub grid: Vec<f64>,
    /// Density at each grid point, normalised to 0..1
    pub density: Vec<f64>,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub fraction: f64,
    pub color: usize,
}

// =============================================================================
// Phase 2: Scaling
// =============================================================================

/// Scales shared by every panel of a chart (facets use fixed scales)
#[derive(Debug, Clone)]
pub struct ScaleSystem {
    pub x: Scale,
    pub y: Scale,
}

#[derive(Debug, Clone)]
pub struct Scale {
    pub domain: (f64, f64),
    pub is_categorical: bool,
    pub categories: Vec<String>, // If categorical, maps index -> label
}

// =============================================================================
// Phase 3: Compilation (Scene Graph)
// =============================================================================

/// A list of primitive drawing commands.
/// The Backend just executes these blindly.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub nrow: usize,
    pub ncol: usize,
    pub panels: Vec<PanelScene>,
    pub legend: Legend,
}

#[derive(Debug, Clone)]
pub struct PanelScene {
    pub row: usize,
    pub col: usize,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_scale: Scale,
    pub y_scale: Scale,
    /// Pie panels draw in a unit square without axes
    pub show_axes: bool,
    pub commands: Vec<DrawCommand>,
}

/// Fill or stroke colour of a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ink {
    /// Index into the chart palette
    Palette(usize),
    White,
    Dark,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    DrawLine {
        points: Vec<(f64, f64)>,
        color: Ink,
        width: u32,
    },
    DrawPoint {
        points: Vec<(f64, f64)>,
        color: Ink,
        size: u32,
        alpha: f64,
    },
    DrawRect {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        color: Ink,
        alpha: f64,
    },
    DrawPolygon {
        points: Vec<(f64, f64)>,
        color: Ink,
        alpha: f64,
    },
    DrawText {
        at: (f64, f64),
        text: String,
    },
}
