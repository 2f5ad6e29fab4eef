// Chart recipe parser module

pub mod ast;
pub mod facet;
pub mod geom;
pub mod labels;
pub mod lexer;
pub mod pipeline;

// Public API re-exports
pub use ast::{BarPosition, ChartSpec, FacetGrid, Geom, Labels, Source};
pub use pipeline::parse_chart_spec;
