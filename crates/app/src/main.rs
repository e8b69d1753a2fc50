mod state;
mod ui;

use anyhow::Context as _;
use eframe::egui;
use state::AppState;
use treetrend_core::{logging, RenderConfig};

struct TreetrendApp {
    state: AppState,
}

impl TreetrendApp {
    fn new(_cc: &eframe::CreationContext<'_>, config: RenderConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for TreetrendApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::draw(&mut self.state, ctx);
    }
}

/// `TREETREND_CONFIG` may point at a JSON render config.
fn load_config() -> anyhow::Result<RenderConfig> {
    match std::env::var_os("TREETREND_CONFIG") {
        Some(path) => RenderConfig::from_path(&path)
            .with_context(|| format!("loading config from {}", path.to_string_lossy())),
        None => Ok(RenderConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    logging::init("info");
    let config = load_config()?;
    let initial = std::env::args_os().nth(1).map(std::path::PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([
            config.width as f32 + 40.0,
            (config.height + config.timeline_height) as f32 + 120.0,
        ]),
        ..Default::default()
    };
    eframe::run_native(
        "Treetrend",
        options,
        Box::new(move |cc| {
            let mut app = TreetrendApp::new(cc, config);
            if let Some(path) = initial {
                app.state.start_load(path);
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
