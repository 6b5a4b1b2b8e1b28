//! Native entry point: wire configuration, pipeline and window together.

use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use funcplot::{
    config, spawn_sampler, Expression, GraphCanvas, PlotShared, PlotterApp, SampleCache,
};

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // optional config file path as the only argument
    let config_path: Option<PathBuf> = std::env::args().nth(1).map(PathBuf::from);
    let cfg = config::load_or_default(config_path.as_deref());

    let canvas = GraphCanvas::new(
        cfg.window_width,
        cfg.window_height,
        (cfg.center[0], cfg.center[1]),
    );
    let mut cache = SampleCache::new(cfg.sample_count);
    match Expression::parse(&cfg.initial_expression, &["x"]) {
        Ok(expr) => cache.set_current(expr),
        Err(err) => warn!("initial expression rejected: {err}"),
    }

    let shared = PlotShared::new(canvas, cache);
    let worker = spawn_sampler(Arc::clone(&shared));
    let app = PlotterApp::new(shared, worker);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(egui::vec2(cfg.window_width as f32, cfg.window_height as f32)),
        ..Default::default()
    };
    eframe::run_native("funcplot", options, Box::new(|_cc| Ok(Box::new(app))))
}
