mod file_io;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mindmap_core::{Document, NodeId};
use mindmap_export::SvgSurface;
use mindmap_geometry::Size;
use mindmap_session::MindMap;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Lay out a mind map snapshot and export it as SVG
#[derive(Parser, Debug)]
#[command(name = "mindmap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Snapshot to render (JSON map of node id to record)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Where to write the SVG (defaults to FILE with an .svg extension)
    #[arg(short, long, value_name = "SVG")]
    output: Option<PathBuf>,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Initial zoom (1.0 = 100%)
    #[arg(long)]
    scale: Option<f64>,

    /// Engine config (JSON)
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Collapse these nodes before rendering
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    collapse: Vec<String>,

    /// Also write the normalized snapshot back out
    #[arg(long, value_name = "JSON")]
    dump: Option<PathBuf>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();
    let output = run(&args)?;
    println!("Exported to {}", output.display());
    Ok(())
}

fn run(args: &Args) -> Result<PathBuf> {
    let mut config = file_io::load_config(args.config.as_deref())?;
    if let Some(scale) = args.scale {
        config.initial_scale = scale;
    }

    let snapshot = file_io::load_snapshot(&args.file)?;
    if snapshot.root_id().is_none() {
        bail!("{:?} has no root node", args.file);
    }

    let mut doc = Document::new();
    doc.load_snapshot(&snapshot).context("Failed to load snapshot into the document")?;
    for id in &args.collapse {
        let id = NodeId::from(id.as_str());
        if !snapshot.contains(&id) {
            warn!(%id, "cannot collapse unknown node");
            continue;
        }
        doc.set_expand(&id, false)?;
    }

    if let Some(dump) = &args.dump {
        file_io::save_snapshot(&doc.snapshot()?, dump)?;
    }

    let mut map = MindMap::new(doc, SvgSurface::new(), Size::new(args.width, args.height), config);
    if let Some(stats) = map.pump() {
        info!(created = stats.created, "rendered {} nodes", map.reconciler().tree().len());
    }
    if let Some(status) = map.status_message() {
        bail!("{}", status);
    }

    let output = args.output.clone().unwrap_or_else(|| file_io::default_svg_path(&args.file));
    map.surface().save_svg(map.viewport(), &output)?;
    Ok(output)
}
