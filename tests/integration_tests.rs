use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;
use titanic_report::aggregate::AggregationSpec;
use titanic_report::catalog;
use titanic_report::data::Dataset;
use titanic_report::page::render_page;
use titanic_report::runtime::{render_all, RenderedChart};
use titanic_report::{build_report, DisplayNode, OutputFormat, RenderOptions};

const PASSENGERS: &str = "\
PassengerId,Survived,Pclass,Name,Sex,Age,SibSp,Parch,Ticket,Fare,Cabin,Embarked
1,0,3,\"Braund, Mr. Owen Harris\",male,22,1,0,A/5 21171,7.25,,S
2,1,1,\"Cumings, Mrs. John Bradley\",female,38,1,0,PC 17599,71.2833,C85,C
3,1,3,\"Heikkinen, Miss. Laina\",female,26,0,0,STON/O2. 3101282,7.925,,S
4,1,1,\"Futrelle, Mrs. Jacques Heath\",female,35,1,0,113803,53.1,C123,S
5,0,3,\"Allen, Mr. William Henry\",male,35,0,0,373450,8.05,,S
6,0,3,\"Moran, Mr. James\",male,,0,0,330877,8.4583,,Q
7,0,1,\"McCarthy, Mr. Timothy J\",male,54,0,0,17463,51.8625,E46,S
8,0,3,\"Palsson, Master. Gosta Leonard\",male,2,3,1,349909,21.075,,S
9,1,3,\"Johnson, Mrs. Oscar W\",female,27,0,2,347742,11.1333,,S
10,1,2,\"Nasser, Mrs. Nicholas\",female,14,1,0,237736,30.0708,,C
11,1,3,\"Sandstrom, Miss. Marguerite Rut\",female,4,1,1,PP 9549,16.7,G6,S
12,1,1,\"Bonnell, Miss. Elizabeth\",female,58,0,0,113783,26.55,C103,
";

/// Write CSV text to a temporary file that lives as long as the handle
fn csv_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes()).expect("Failed to write CSV");
    file
}

fn load(content: &str) -> Dataset {
    let file = csv_file(content);
    Dataset::from_path(file.path()).expect("Failed to load dataset")
}

/// Drop one column from the CSV text
fn without_column(content: &str, column: &str) -> String {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr.headers().unwrap().clone();
    let idx = headers.iter().position(|h| h == column).unwrap();

    let mut wtr = csv::Writer::from_writer(vec![]);
    let keep = |r: &csv::StringRecord| -> Vec<String> {
        r.iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, v)| v.to_string())
            .collect()
    };
    wtr.write_record(keep(&headers)).unwrap();
    for record in rdr.records() {
        wtr.write_record(keep(&record.unwrap())).unwrap();
    }
    String::from_utf8(wtr.into_inner().unwrap()).unwrap()
}

#[test]
fn test_report_structure() {
    let tree = build_report(&load(PASSENGERS)).expect("Failed to build report");

    assert_eq!(tree.headings(1), vec![catalog::PAGE_TITLE]);
    assert_eq!(tree.charts().len(), 11);

    let hypotheses = tree
        .headings(2)
        .into_iter()
        .filter(|h| h.starts_with("Hypothesis "))
        .count();
    assert_eq!(hypotheses, 7);
    assert_eq!(tree.headings(3).len(), 7);
    assert_eq!(tree.lists().len(), 1);
    assert_eq!(tree.lists()[0].len(), 4);

    // Conclusions then credits close the page
    let n = tree.nodes.len();
    assert!(matches!(&tree.nodes[n - 2], DisplayNode::Container { style, .. } if style.is_empty()));
    assert!(matches!(&tree.nodes[n - 1], DisplayNode::Container { style, .. } if !style.is_empty()));
}

#[test]
fn test_aggregation_totals_match_row_count() {
    let data = load(PASSENGERS);
    for spec in catalog::aggregation_specs() {
        let table = spec.apply(&data).unwrap();
        assert_eq!(table.total(), data.len(), "totals differ for {}", spec.name());
    }

    // The missing port forms its own, last group
    let embarked = AggregationSpec::new(&["Embarked"]).apply(&data).unwrap();
    let last = embarked.rows.last().unwrap();
    assert!(last.key[0].is_missing());
    assert_eq!(last.count, 1);
}

#[test]
fn test_pipeline_is_deterministic() {
    let data = load(PASSENGERS);
    let first = build_report(&data).unwrap();
    let second = build_report(&data).unwrap();
    assert_eq!(first, second);

    let options = RenderOptions::default();
    let a = render_page(&first, &render_all(first.charts(), &options).unwrap());
    let b = render_page(&second, &render_all(second.charts(), &options).unwrap());
    assert_eq!(a, b);
}

#[test]
fn test_missing_embarked_is_schema_error() {
    let data = load(&without_column(PASSENGERS, "Embarked"));
    let err = build_report(&data).unwrap_err();
    assert!(err.is_schema_error(), "unexpected error: {}", err);
    assert!(err.to_string().contains("Embarked"));
}

#[test]
fn test_nonexistent_file_is_load_error() {
    let err = Dataset::from_path(Path::new("/nonexistent/train.csv")).unwrap_err();
    assert!(err.is_load_error());
}

#[test]
fn test_ragged_csv_is_load_error() {
    let file = csv_file("Survived,Sex\n1,male\n0\n");
    let err = Dataset::from_path(file.path()).unwrap_err();
    assert!(err.is_load_error());
}

#[test]
fn test_page_inlines_svg_charts() {
    let tree = build_report(&load(PASSENGERS)).unwrap();
    let charts = render_all(tree.charts(), &RenderOptions::default()).unwrap();
    assert!(charts.iter().all(|c| matches!(c, RenderedChart::Svg(_))));

    let html = render_page(&tree, &charts);
    assert!(html.contains(r#"<h1 style="text-align: center">Titanic Dataset Analysis</h1>"#));
    assert!(html.contains(r#"<h2 style="margin-bottom: 10px">Credits</h2>"#));
    assert_eq!(html.matches("<svg").count(), 11);
}

#[test]
fn test_page_links_png_charts() {
    let tree = build_report(&load(PASSENGERS)).unwrap();
    let options = RenderOptions { width: 400, height: 300, format: OutputFormat::Png };
    let charts = render_all(tree.charts(), &options).unwrap();

    let html = render_page(&tree, &charts);
    assert!(html.contains(r#"src="charts/0.png""#));
    assert!(html.contains(r#"src="charts/10.png""#));
}

#[test]
fn test_static_export_via_binary() {
    let data = csv_file(PASSENGERS);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.html");

    let status = Command::new(env!("CARGO_BIN_EXE_titanic-report"))
        .arg("--data")
        .arg(data.path())
        .arg("--output")
        .arg(&out)
        .arg("--render-options")
        .arg(r#"{"type": "png", "width": 400, "height": 300}"#)
        .status()
        .expect("Failed to spawn binary");
    assert!(status.success());

    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains("Hypothesis 7: Survival Rate based on Number of Parents/Children"));
    for i in 0..11 {
        assert!(dir.path().join(format!("charts/{}.png", i)).exists());
    }
}

#[test]
fn test_binary_fails_on_missing_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.html");

    let output = Command::new(env!("CARGO_BIN_EXE_titanic-report"))
        .arg("--data")
        .arg(dir.path().join("missing.csv"))
        .arg("--output")
        .arg(&out)
        .output()
        .expect("Failed to spawn binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load dataset"));
    assert!(!out.exists());
}

#[test]
fn test_binary_rejects_oversized_render_options() {
    let data = csv_file(PASSENGERS);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.html");

    let output = Command::new(env!("CARGO_BIN_EXE_titanic-report"))
        .arg("--data")
        .arg(data.path())
        .arg("--output")
        .arg(&out)
        .arg("--render-options")
        .arg(r#"{"type": "png", "width": 40000, "height": 40000}"#)
        .output()
        .expect("Failed to spawn binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid render options"));
    assert!(!out.exists());
}
