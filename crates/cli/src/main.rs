use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use treetrend_core::export::{layout_to_csv, layout_to_json, to_svg};
use treetrend_core::{logging, Controller, LoadMsg, Loader, RenderConfig};

#[derive(Parser, Debug)]
#[command(name = "treetrend-cli", about = "Render a time-indexed treemap with sparklines")]
struct Args {
    /// Dataset: JSON array of time points
    input: PathBuf,
    /// Time index to render (defaults to the latest)
    #[arg(short, long)]
    index: Option<usize>,
    /// Render config (JSON); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    padding: Option<f64>,
    /// Output SVG path
    #[arg(long)]
    svg: Option<PathBuf>,
    /// Output JSON layout report path
    #[arg(short, long)]
    json: Option<PathBuf>,
    /// Output CSV layout report path
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() {
    logging::init("info");
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = match &args.config {
        Some(path) => RenderConfig::from_path(path)?,
        None => RenderConfig::default(),
    };
    if let Some(w) = args.width {
        cfg.width = w;
    }
    if let Some(h) = args.height {
        cfg.height = h;
    }
    if let Some(p) = args.padding {
        cfg.padding = p;
    }

    let (tx, rx) = crossbeam_channel::unbounded::<LoadMsg>();
    let loader = Loader::new(Arc::new(AtomicBool::new(false)), cfg.size_scale);
    std::thread::spawn({
        let input = args.input.clone();
        move || loader.load(input, tx)
    });

    let mut skipped = 0usize;
    let mut dataset = None;
    while let Ok(msg) = rx.recv() {
        match msg {
            LoadMsg::Issue(_) => skipped += 1,
            LoadMsg::Done(d) => {
                dataset = Some(d);
                break;
            }
            LoadMsg::Error(e) => return Err(e.into()),
            LoadMsg::Progress { .. } => {}
        }
    }
    let Some(dataset) = dataset else {
        return Err("no data".into());
    };

    let (mut controller, _events) = Controller::new(cfg.clone());
    let mut frame = controller.load(dataset.time_points);
    if let Some(index) = args.index {
        frame = controller
            .select(index)
            .ok_or_else(|| format!("index {index} is out of range"))?;
    }

    if let Some(path) = &args.svg {
        std::fs::write(path, to_svg(&frame, &cfg))?;
    }
    if let Some(path) = &args.json {
        std::fs::write(path, serde_json::to_string_pretty(&layout_to_json(controller.layout()))?)?;
    }
    if let Some(path) = &args.csv {
        layout_to_csv(controller.layout(), std::fs::File::create(path)?)?;
    }

    let leaves = controller.layout().iter().filter(|n| n.is_leaf()).count();
    println!(
        "Rendered {} ({} of {} time points): {} leaves, {} records skipped",
        frame.label.as_deref().unwrap_or("-"),
        frame.index.map(|i| i + 1).unwrap_or(0),
        controller.time_points().len(),
        leaves,
        skipped
    );
    Ok(())
}
