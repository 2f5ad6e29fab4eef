//! Static HTML rendering of a [`DisplayTree`].

use crate::report::{DisplayNode, DisplayTree, Style};
use crate::runtime::RenderedChart;
use std::fs;
use std::io;
use std::path::Path;

/// Charts in page order, as drawn by [`crate::runtime::render_all`]
pub type RenderedCharts = Vec<RenderedChart>;

/// Relative URL of the `index`-th chart when it is served as an image.
/// Resolves the same from the server root and from an exported directory.
pub fn chart_path(index: usize) -> String {
    format!("charts/{}.png", index)
}

/// Write the page to `path`, and any PNG charts under `charts/` beside it
pub fn export(path: &Path, html: &str, charts: &RenderedCharts) -> io::Result<()> {
    fs::write(path, html)?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    for (index, chart) in charts.iter().enumerate() {
        if let RenderedChart::Png(bytes) = chart {
            let target = dir.join(chart_path(index));
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(target, bytes)?;
        }
    }
    Ok(())
}

/// Render the whole report as one HTML document
pub fn render_page(tree: &DisplayTree, charts: &RenderedCharts) -> String {
    let title = tree
        .headings(1)
        .first()
        .map(|t| html_escape(t))
        .unwrap_or_default();

    let mut next_chart = 0;
    let body = render_nodes(&tree.nodes, charts, &mut next_chart);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
{body}
    </div>
</body>
</html>"#,
        title = title,
        css = inline_css(),
        body = body,
    )
}

fn inline_css() -> &'static str {
    r#"
        body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; color: #222; margin: 0; }
        .container { max-width: 1000px; margin: 0 auto; padding: 20px; }
        .chart { margin: 10px 0 30px 0; }
        .chart svg, .chart img { max-width: 100%; height: auto; }
    "#
}

fn render_nodes(nodes: &[DisplayNode], charts: &RenderedCharts, next_chart: &mut usize) -> String {
    nodes
        .iter()
        .map(|node| render_node(node, charts, next_chart))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_node(node: &DisplayNode, charts: &RenderedCharts, next_chart: &mut usize) -> String {
    match node {
        DisplayNode::Heading { level, text, style } => {
            let level = (*level).clamp(1, 6);
            format!(
                "<h{level}{style}>{text}</h{level}>",
                level = level,
                style = style_attr(style),
                text = html_escape(text),
            )
        }
        DisplayNode::Paragraph(text) => format!("<p>{}</p>", html_escape(text)),
        DisplayNode::List(items) => {
            let items: String = items
                .iter()
                .map(|item| format!("<li>{}</li>", html_escape(item)))
                .collect();
            format!("<ul>{}</ul>", items)
        }
        DisplayNode::Chart(chart) => {
            let index = *next_chart;
            *next_chart += 1;
            let alt = html_escape(chart.title.as_deref().unwrap_or(chart.kind.as_str()));
            match charts.get(index) {
                // Plotters writes a self-contained <svg> element
                Some(RenderedChart::Svg(svg)) => format!("<div class=\"chart\">{}</div>", svg),
                Some(RenderedChart::Png(_)) => format!(
                    "<div class=\"chart\"><img src=\"{}\" alt=\"{}\"></div>",
                    chart_path(index),
                    alt
                ),
                None => format!("<div class=\"chart\" title=\"{}\"></div>", alt),
            }
        }
        DisplayNode::Container { style, children } => format!(
            "<div{}>\n{}\n</div>",
            style_attr(style),
            render_nodes(children, charts, next_chart)
        ),
    }
}

/// ` style="k: v; ..."`, or nothing for an empty map
fn style_attr(style: &Style) -> String {
    if style.is_empty() {
        return String::new();
    }
    let css = style
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("; ");
    format!(" style=\"{}\"", html_escape(&css))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartKind, ChartNode, Channels};
    use crate::data::Dataset;
    use crate::parser::{BarPosition, Labels};

    fn chart(title: &str) -> DisplayNode {
        DisplayNode::Chart(ChartNode {
            kind: ChartKind::Bar,
            title: Some(title.to_string()),
            labels: Labels::default(),
            channels: Channels::default(),
            bar_position: BarPosition::Group,
            data: Dataset::new(vec![], vec![]),
        })
    }

    fn tree() -> DisplayTree {
        DisplayTree {
            nodes: vec![
                DisplayNode::styled_heading(1, "Titanic <Analysis>", &[("text-align", "center")]),
                chart("First"),
                DisplayNode::Container {
                    style: vec![
                        ("padding".to_string(), "10px".to_string()),
                        ("border".to_string(), "1px solid #dddddd".to_string()),
                    ],
                    children: vec![
                        DisplayNode::heading(2, "Credits"),
                        chart("Second"),
                        DisplayNode::List(vec!["a & b".to_string()]),
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;");
    }

    #[test]
    fn test_headings_and_styles() {
        let html = render_page(&tree(), &vec![]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Titanic &lt;Analysis&gt;</title>"));
        assert!(html.contains(r#"<h1 style="text-align: center">Titanic &lt;Analysis&gt;</h1>"#));
        assert!(html.contains(r#"<div style="padding: 10px; border: 1px solid #dddddd">"#));
        assert!(html.contains("<h2>Credits</h2>"));
        assert!(html.contains("<ul><li>a &amp; b</li></ul>"));
    }

    #[test]
    fn test_charts_numbered_in_page_order() {
        let charts = vec![
            RenderedChart::Svg("<svg id=\"first\"></svg>".to_string()),
            RenderedChart::Png(vec![0x89]),
        ];
        let html = render_page(&tree(), &charts);
        assert!(html.contains("<svg id=\"first\"></svg>"));
        assert!(html.contains(r#"<img src="charts/1.png" alt="Second">"#));
    }

    #[test]
    fn test_export_writes_png_charts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.html");
        let charts = vec![
            RenderedChart::Svg("<svg></svg>".to_string()),
            RenderedChart::Png(vec![1, 2, 3]),
        ];
        export(&out, "<html></html>", &charts).unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "<html></html>");
        assert_eq!(fs::read(dir.path().join("charts/1.png")).unwrap(), vec![1, 2, 3]);
        assert!(!dir.path().join("charts/0.png").exists());
    }

    #[test]
    fn test_missing_chart_leaves_placeholder() {
        let html = render_page(&tree(), &vec![]);
        assert!(html.contains(r#"<div class="chart" title="First"></div>"#));
    }
}
