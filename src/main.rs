use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use titanic_report::data::Dataset;
use titanic_report::page::{self, render_page};
use titanic_report::runtime::render_all;
use titanic_report::server::{self, Site};
use titanic_report::{build_report, RenderOptions};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "titanic-report")]
#[command(about = "Exploratory dashboard for the Titanic passenger dataset", long_about = None)]
struct Args {
    /// Passenger table (CSV, or JSON array of objects with a .json extension)
    #[arg(long, default_value = "train.csv")]
    data: PathBuf,

    /// Address to serve the dashboard on
    #[arg(long, default_value = "127.0.0.1:8050")]
    addr: String,

    /// Chart rendering options as JSON (e.g., '{"width": 900, "height": 500, "type": "svg"}')
    #[arg(long)]
    render_options: Option<String>,

    /// Write the page to this file and exit instead of serving it
    #[arg(long)]
    output: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let options: RenderOptions = match &args.render_options {
        Some(json) => serde_json::from_str(json).context("Failed to parse render options")?,
        None => RenderOptions::default(),
    };
    options.validate().context("Invalid render options")?;

    // Everything up to the rendered page happens before anything is served
    let dataset = Dataset::from_path(&args.data)
        .with_context(|| format!("Failed to load dataset {}", args.data.display()))?;
    let tree = build_report(&dataset).context("Failed to build report")?;
    let charts = render_all(tree.charts(), &options).context("Failed to render charts")?;
    let html = render_page(&tree, &charts);

    if let Some(output) = &args.output {
        page::export(output, &html, &charts)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!(path = %output.display(), charts = charts.len(), "page written");
        return Ok(());
    }

    server::serve(&args.addr, Site::new(html, charts)).context("Failed to serve report")?;
    Ok(())
}
