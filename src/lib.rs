//! funcplot crate root: re-exports and module wiring.
//!
//! An interactive single-variable function plotter built on egui/eframe:
//! the user types an expression, a background worker resamples it over the
//! visible range, and the view pans and zooms in real time.
//!
//! Module map:
//! - `engine`: symbolic expressions (parse, evaluate, derive, integrate)
//! - `data`: expression history and the sample cache
//! - `view`: logical<->screen transform, zoom and label precision
//! - `canvas`: double-buffered raster surface and the draw pass
//! - `pipeline`: background sampling worker and shared state
//! - `config`: JSON-persisted startup configuration
//! - `app`: the egui foreground loop

pub mod app;
pub mod canvas;
pub mod config;
pub mod data;
pub mod engine;
pub mod pipeline;
pub mod view;

// Public re-exports for a compact external API
pub use app::PlotterApp;
pub use canvas::GraphCanvas;
pub use config::PlotConfig;
pub use data::history::{History, HISTORY_CAPACITY};
pub use data::samples::{Sample, SampleCache, SampleRange, SampleSource, DEFAULT_SAMPLE_COUNT};
pub use engine::{EngineError, Expression};
pub use pipeline::{spawn_sampler, GraphState, PlotShared};
pub use view::ViewTransform;
