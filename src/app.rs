//! Foreground loop: control widgets, pointer interaction, presentation.
//!
//! The GUI is immediate mode and retains no plot state of its own. Every
//! frame handles input (which may mutate the shared view), runs the
//! widgets, then unconditionally requests a sampling pass and blocks on
//! the ready gate before drawing and presenting the front surface.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use eframe::egui;
use tracing::debug;

use crate::engine::Expression;
use crate::pipeline::{GraphState, PlotShared};

const ZOOM_WHEEL_FACTOR: f32 = 1.1;
const TEXTURE_OPTIONS: egui::TextureOptions = egui::TextureOptions::NEAREST;

/// The plotter window.
pub struct PlotterApp {
    shared: Arc<PlotShared>,
    worker: Option<JoinHandle<()>>,
    texture: Option<egui::TextureHandle>,
    expr_input: String,
    variable_input: String,
    lower_input: String,
    upper_input: String,
    integrate_numeric: bool,
    numeric_result: f64,
    error: Option<String>,
    cursor_logical: (f64, f64),
}

impl PlotterApp {
    /// Wrap the shared pipeline state; `worker` is joined on drop.
    pub fn new(shared: Arc<PlotShared>, worker: JoinHandle<()>) -> Self {
        let expr_input = shared
            .graph
            .lock()
            .expect("graph state lock")
            .cache
            .current_label()
            .to_string();
        Self {
            shared,
            worker: Some(worker),
            texture: None,
            expr_input,
            variable_input: "x".to_string(),
            lower_input: String::new(),
            upper_input: String::new(),
            integrate_numeric: false,
            numeric_result: 0.0,
            error: None,
            cursor_logical: (0.0, 0.0),
        }
    }

    fn report(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("user-facing error: {message}");
        self.error = Some(message);
    }

    /// "Build graph": parse the typed expression and make it current,
    /// unless it is syntactically identical to the current version.
    fn build_graph(&mut self) {
        if self.expr_input.trim().is_empty() {
            self.report("Empty expression!");
            return;
        }
        match Expression::parse(&self.expr_input, &["x"]) {
            Ok(expr) => {
                let mut graph = self.shared.graph.lock().expect("graph state lock");
                if !graph.cache.matches_current(expr.display_string()) {
                    graph.cache.set_current(expr);
                }
            }
            Err(err) => self.report(err.to_string()),
        }
    }

    /// Replace the current expression with its derivative.
    fn differentiate(&mut self) {
        if self.variable_input.trim().is_empty() {
            self.report("variable not set");
            return;
        }
        let mut graph = self.shared.graph.lock().expect("graph state lock");
        let Some(current) = graph.cache.current().cloned() else {
            drop(graph);
            self.report("Empty expression!");
            return;
        };
        match current.derivative(self.variable_input.trim()) {
            Ok(derived) => {
                self.expr_input = derived.display_string().to_string();
                graph.cache.set_current(derived);
            }
            Err(err) => {
                drop(graph);
                self.report(err.to_string());
            }
        }
    }

    /// Replace the current expression with its antiderivative (constant 0),
    /// or compute a numeric definite integral over the typed bounds.
    fn integrate(&mut self) {
        if self.variable_input.trim().is_empty() {
            self.report("variable not set");
            return;
        }
        let current = {
            let graph = self.shared.graph.lock().expect("graph state lock");
            graph.cache.current().cloned()
        };
        let Some(current) = current else {
            self.report("Empty expression!");
            return;
        };
        let variable = self.variable_input.trim().to_string();

        if self.integrate_numeric {
            let lower: f64 = match self.lower_input.trim().parse() {
                Ok(v) => v,
                Err(_) => {
                    self.report("Failed to parse lower bound!");
                    return;
                }
            };
            let upper: f64 = match self.upper_input.trim().parse() {
                Ok(v) => v,
                Err(_) => {
                    self.report("Failed to parse upper bound!");
                    return;
                }
            };
            match current.definite_integral(&variable, lower, upper) {
                Ok(value) => self.numeric_result = value,
                Err(err) => self.report(err.to_string()),
            }
        } else {
            match current.antiderivative(&variable, 0.0) {
                Ok(anti) => {
                    self.expr_input = anti.display_string().to_string();
                    let mut graph = self.shared.graph.lock().expect("graph state lock");
                    graph.cache.set_current(anti);
                }
                Err(err) => self.report(err.to_string()),
            }
        }
    }

    /// Step the expression history and mirror the result into the input.
    fn history_step(&mut self, back: bool) {
        let mut graph = self.shared.graph.lock().expect("graph state lock");
        let moved = if back {
            graph.cache.undo()
        } else {
            graph.cache.redo()
        };
        if moved {
            self.expr_input = graph.cache.current_label().to_string();
        }
    }

    fn controls_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Build graph!").clicked() {
                    self.build_graph();
                }
                let expr_edit = ui.add(
                    egui::TextEdit::singleline(&mut self.expr_input)
                        .hint_text("Expression...")
                        .desired_width(220.0),
                );
                if expr_edit.has_focus() {
                    // arrow keys page through the expression history
                    if ui.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::ArrowUp))
                    {
                        self.history_step(true);
                    }
                    if ui
                        .input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::ArrowDown))
                    {
                        self.history_step(false);
                    }
                }
                if ui
                    .button("Differentiate")
                    .on_hover_text("Differentiate the currently shown function")
                    .clicked()
                {
                    self.differentiate();
                }
                ui.add(
                    egui::TextEdit::singleline(&mut self.variable_input)
                        .hint_text("by var...")
                        .desired_width(60.0),
                )
                .on_hover_text("Integration/differentiation variable");
            });

            ui.horizontal(|ui| {
                ui.checkbox(&mut self.integrate_numeric, "Numeric integration");
                if ui
                    .button("Integrate")
                    .on_hover_text("Integrate the currently shown function")
                    .clicked()
                {
                    self.integrate();
                }
                let precision = {
                    let graph = self.shared.graph.lock().expect("graph state lock");
                    graph.canvas.view().precision().max(3) as usize
                };
                ui.monospace(format!(
                    "X: {:+.precision$}; Y: {:+.precision$}",
                    self.cursor_logical.0, self.cursor_logical.1
                ));
                if ui.button("Reset view").clicked() {
                    let mut graph = self.shared.graph.lock().expect("graph state lock");
                    graph.canvas.view_mut().reset_scale();
                }
            });

            if self.integrate_numeric {
                ui.horizontal(|ui| {
                    ui.label("x1:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.lower_input).desired_width(80.0),
                    );
                    ui.label("x2:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.upper_input).desired_width(80.0),
                    );
                    ui.label(format!("I = {}", self.numeric_result));
                });
            }
        });
    }

    fn graph_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            let want = (avail.x.max(1.0) as u32, avail.y.max(1.0) as u32);
            {
                let mut graph = self.shared.graph.lock().expect("graph state lock");
                if graph.canvas.view().size() != want {
                    graph.canvas.resize(want.0, want.1);
                }
            }

            let Some(texture) = self.texture.as_ref() else {
                return;
            };
            let response = ui.add(
                egui::Image::new(texture).sense(egui::Sense::click_and_drag()),
            );
            let origin = response.rect.min;

            if let Some(pointer) = response.hover_pos() {
                let local = (
                    (pointer.x - origin.x) as f64,
                    (pointer.y - origin.y) as f64,
                );
                let scroll = ui.input(|i| i.raw_scroll_delta.y);
                let mut graph = self.shared.graph.lock().expect("graph state lock");
                self.cursor_logical = graph.canvas.view().screen_to_logical(local);
                if scroll != 0.0 {
                    let view = graph.canvas.view_mut();
                    view.set_pivot(local);
                    let scale = view.scale();
                    if scroll > 0.0 {
                        view.set_scale(scale * ZOOM_WHEEL_FACTOR);
                    } else {
                        view.set_scale(scale / ZOOM_WHEEL_FACTOR);
                    }
                }
            }

            if response.dragged_by(egui::PointerButton::Primary) {
                let delta = response.drag_delta();
                if delta != egui::Vec2::ZERO {
                    let mut graph = self.shared.graph.lock().expect("graph state lock");
                    graph
                        .canvas
                        .view_mut()
                        .pan((-delta.x as f64, delta.y as f64));
                }
            }
        });
    }

    fn error_popup(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error.clone() else {
            return;
        };
        egui::Window::new("Error!")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.separator();
                if ui.button("Ok").clicked() {
                    self.error = None;
                }
            });
    }

    /// Copy the front surface into the presented texture.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let front = {
            let graph = self.shared.graph.lock().expect("graph state lock");
            graph.canvas.front()
        };
        let image = {
            let pixmap = front.lock().expect("front buffer lock");
            egui::ColorImage::from_rgba_premultiplied(
                [pixmap.width() as usize, pixmap.height() as usize],
                pixmap.data(),
            )
        };
        match self.texture.as_mut() {
            Some(texture) => texture.set(image, TEXTURE_OPTIONS),
            None => self.texture = Some(ctx.load_texture("graph", image, TEXTURE_OPTIONS)),
        }
    }
}

impl eframe::App for PlotterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controls_panel(ctx);
        self.graph_panel(ctx);
        self.error_popup(ctx);

        // the widgets retain nothing, so every frame asks for a fresh pass;
        // the cache turns no-op requests into hits
        self.shared.request_recompute();
        self.shared.wait_ready();

        {
            let mut graph = self.shared.graph.lock().expect("graph state lock");
            let GraphState { canvas, cache } = &mut *graph;
            canvas.draw(cache.samples());
        }
        self.refresh_texture(ctx);

        ctx.request_repaint_after(Duration::from_millis(16));
    }
}

impl Drop for PlotterApp {
    fn drop(&mut self) {
        self.shared.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
