use crate::chart::ChartNode;
use crate::parser::ChartSpec;
use crate::data::Dataset;
use crate::error::{ReportError, Result};
use tracing::debug;

/// Bind a chart recipe to the table it draws from.
///
/// Every channel column must exist in `table`; the first absent one (in
/// channel order) is reported as a binding error. The returned node owns a
/// projection of `table` holding just the bound columns.
pub fn bind(spec: &ChartSpec, table: &Dataset) -> Result<ChartNode> {
    let channels = spec.channels();
    let columns = channels.columns();

    for column in &columns {
        if !table.has_column(column) {
            return Err(ReportError::Binding {
                chart: spec.name(),
                column: column.to_string(),
            });
        }
    }

    let data = table.project(&columns)?;

    debug!(
        chart = %spec.name(),
        kind = spec.kind().as_str(),
        rows = data.len(),
        "bound chart"
    );

    Ok(ChartNode {
        kind: spec.kind(),
        title: spec.labels.title.clone(),
        labels: spec.labels.clone(),
        channels,
        bar_position: spec.bar_position(),
        data,
    })
}
