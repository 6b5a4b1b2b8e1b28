//! Double-buffered raster surface for the graph.
//!
//! All drawing happens into the back buffer; [`GraphCanvas::draw`] finishes
//! by swapping buffers under the presentation lock, so a reader holding the
//! front buffer never observes a partially drawn frame.

use std::sync::{Arc, Mutex};

use fontdue::Font;
use once_cell::sync::Lazy;
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};
use tracing::warn;

use crate::data::samples::Sample;
use crate::view::ViewTransform;

const AXIS_THICKNESS: f32 = 4.0;
const CURVE_WIDTH: f32 = 2.0;
const LABEL_PX: f32 = 16.0;
/// Pixel gap between a grid line and its label.
const LABEL_OFFSET: f64 = 4.0;
const ZERO_EPS: f64 = 1e-9;

fn background() -> Color {
    Color::WHITE
}

fn grid_color() -> Color {
    Color::from_rgba8(128, 128, 128, 255)
}

fn axis_color() -> Color {
    Color::BLACK
}

fn curve_color() -> Color {
    Color::from_rgba8(220, 30, 30, 255)
}

const LABEL_RGB: (u8, u8, u8) = (0, 0, 0);

/// Grid label font, taken from egui's bundled defaults so no font asset
/// ships with the crate. `None` if extraction fails; labels are skipped
/// then.
static LABEL_FONT: Lazy<Option<Font>> = Lazy::new(|| {
    let defs = egui::FontDefinitions::default();
    let data = defs
        .font_data
        .get("Hack")
        .or_else(|| defs.font_data.values().next())?;
    match Font::from_bytes(&data.font[..], fontdue::FontSettings::default()) {
        Ok(font) => Some(font),
        Err(err) => {
            warn!("label font unavailable, grid labels disabled: {err}");
            None
        }
    }
});

/// The off-screen graph surface: a view transform plus two pixmaps.
pub struct GraphCanvas {
    view: ViewTransform,
    back: Pixmap,
    front: Arc<Mutex<Pixmap>>,
    /// Approximate glyph cell of the label font, in pixels.
    symbol_w: f64,
    symbol_h: f64,
    x_axis_visible: bool,
    y_axis_visible: bool,
}

impl GraphCanvas {
    /// A `width x height` surface whose view is centered on `center`.
    pub fn new(width: u32, height: u32, center: (f64, f64)) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let (symbol_w, symbol_h) = match LABEL_FONT.as_ref() {
            Some(font) => {
                let m = font.metrics('0', LABEL_PX);
                (m.advance_width as f64, m.height as f64)
            }
            None => (LABEL_PX as f64 * 0.5, LABEL_PX as f64),
        };
        Self {
            view: ViewTransform::new(width, height, center),
            back: Pixmap::new(width, height).expect("non-zero surface size"),
            front: Arc::new(Mutex::new(
                Pixmap::new(width, height).expect("non-zero surface size"),
            )),
            symbol_w,
            symbol_h,
            x_axis_visible: false,
            y_axis_visible: false,
        }
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewTransform {
        &mut self.view
    }

    /// Handle to the presented surface. Lock it only briefly: the draw
    /// pass takes the same lock for the buffer swap.
    pub fn front(&self) -> Arc<Mutex<Pixmap>> {
        Arc::clone(&self.front)
    }

    /// Resize both surfaces and the view (top-left anchored).
    pub fn resize(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        self.view.resize(width, height);
        self.back = Pixmap::new(width, height).expect("non-zero surface size");
        let mut front = self.front.lock().expect("front buffer lock");
        *front = Pixmap::new(width, height).expect("non-zero surface size");
    }

    /// Render grid, axes, labels and the sampled polyline into the back
    /// buffer, then publish it with an atomic buffer swap.
    pub fn draw(&mut self, samples: &[Sample]) {
        self.back.fill(background());

        let unit = self.view.step() / self.view.pixels_per_step();
        let (x_min, x_max) = self.view.x_bounds();
        let (y_min, y_max) = self.view.y_bounds();
        // an axis is drawn only when logical zero is inside the view with
        // one glyph of margin, so axis labels never hang off the surface
        self.x_axis_visible = y_min + self.symbol_h * unit <= 0.0 && y_max >= 0.0;
        self.y_axis_visible = x_min + self.symbol_w * unit <= 0.0 && x_max >= 0.0;

        self.draw_grid();
        self.draw_axes();
        self.draw_labels();
        self.draw_curve(samples);

        let mut front = self.front.lock().expect("front buffer lock");
        std::mem::swap(&mut *front, &mut self.back);
    }

    fn draw_grid(&mut self) {
        let (width, height) = self.view.size();
        let step = self.view.step();
        let px_step = self.view.pixels_per_step();
        let (x_min, _) = self.view.x_bounds();
        let (_, y_max) = self.view.y_bounds();
        let mut pb = PathBuilder::new();

        // vertical lines, starting from the grid coordinate at or left of
        // the view edge
        let first_x = x_min - x_min % step;
        let mut pos = self.view.logical_to_screen((first_x, 0.0)).0;
        while pos < width as f64 {
            pb.move_to(pos as f32, 0.0);
            pb.line_to(pos as f32, height as f32);
            pos += px_step;
        }

        // horizontal lines
        let first_y = y_max - y_max % step;
        let mut pos = self.view.logical_to_screen((0.0, first_y)).1;
        while pos < height as f64 {
            pb.move_to(0.0, pos as f32);
            pb.line_to(width as f32, pos as f32);
            pos += px_step;
        }

        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(grid_color());
            let stroke = Stroke {
                width: 1.0,
                ..Stroke::default()
            };
            self.back
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    fn draw_axes(&mut self) {
        let (width, height) = self.view.size();
        let origin = self.view.logical_to_screen((0.0, 0.0));
        let mut paint = Paint::default();
        paint.set_color(axis_color());

        if self.y_axis_visible {
            if let Some(rect) = Rect::from_xywh(
                origin.0 as f32 - AXIS_THICKNESS / 2.0,
                0.0,
                AXIS_THICKNESS,
                height as f32,
            ) {
                self.back.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
        if self.x_axis_visible {
            if let Some(rect) = Rect::from_xywh(
                0.0,
                origin.1 as f32 - AXIS_THICKNESS / 2.0,
                width as f32,
                AXIS_THICKNESS,
            ) {
                self.back.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
    }

    fn draw_labels(&mut self) {
        let Some(font) = LABEL_FONT.as_ref() else {
            return;
        };
        let (width, height) = self.view.size();
        let step = self.view.step();
        let px_step = self.view.pixels_per_step();
        let precision = self.view.precision() as usize;
        let (x_min, _) = self.view.x_bounds();
        let (_, y_max) = self.view.y_bounds();
        let origin = self.view.logical_to_screen((0.0, 0.0));

        // labels on vertical grid lines sit just below the X axis, or at
        // the bottom edge when the axis is out of view
        let y_pos = if self.x_axis_visible {
            origin.1 + LABEL_OFFSET
        } else {
            height as f64 - (LABEL_OFFSET + self.symbol_h * 2.0)
        };
        let mut value = x_min - x_min % step;
        let mut pos = self.view.logical_to_screen((value, 0.0)).0;
        while pos < width as f64 {
            // the origin is labeled by the axes themselves
            if value.abs() > ZERO_EPS {
                let text = format_label(value, precision);
                let offset = text.chars().count() as f64 * self.symbol_w / 2.0;
                self.draw_text(font, &text, (pos - offset).round(), y_pos);
            }
            pos += px_step;
            value += step;
        }

        // labels on horizontal grid lines hug the Y axis, or the right
        // edge when the axis is out of view
        let x_pos = if self.y_axis_visible {
            origin.0
        } else {
            width as f64 - LABEL_OFFSET
        };
        let mut value = y_max - y_max % step;
        let mut pos = self.view.logical_to_screen((0.0, value)).1 + LABEL_OFFSET;
        while pos < height as f64 {
            let suppressed = self.y_axis_visible && value.abs() < ZERO_EPS;
            if !suppressed {
                let text = format_label(value, precision);
                let offset = text.chars().count() as f64 * self.symbol_w;
                self.draw_text(font, &text, (x_pos - offset).round(), pos);
            }
            pos += px_step;
            value -= step;
        }
    }

    /// Rasterize `text` with its top-left near `(x, y)` and alpha-blend
    /// the glyphs over the back buffer.
    fn draw_text(&mut self, font: &Font, text: &str, x: f64, y: f64) {
        let width = self.back.width() as i32;
        let height = self.back.height() as i32;
        let baseline = y + self.symbol_h;
        let mut pen_x = x;

        for ch in text.chars() {
            let (metrics, bitmap) = font.rasterize(ch, LABEL_PX);
            let glyph_x = (pen_x + metrics.xmin as f64).round() as i32;
            let glyph_y = (baseline - metrics.height as f64 - metrics.ymin as f64).round() as i32;

            let pixels = self.back.pixels_mut();
            for (row, chunk) in bitmap.chunks(metrics.width.max(1)).enumerate() {
                let py = glyph_y + row as i32;
                if py < 0 || py >= height {
                    continue;
                }
                for (col, &alpha) in chunk.iter().enumerate() {
                    if alpha == 0 {
                        continue;
                    }
                    let px = glyph_x + col as i32;
                    if px < 0 || px >= width {
                        continue;
                    }
                    let idx = py as usize * width as usize + px as usize;
                    let dst = pixels[idx];
                    let t = alpha as u32;
                    let blend = |d: u8, s: u8| -> u8 {
                        ((d as u32 * (255 - t) + s as u32 * t) / 255) as u8
                    };
                    pixels[idx] = tiny_skia::ColorU8::from_rgba(
                        blend(dst.red(), LABEL_RGB.0),
                        blend(dst.green(), LABEL_RGB.1),
                        blend(dst.blue(), LABEL_RGB.2),
                        255,
                    )
                    .premultiply();
                }
            }
            pen_x += metrics.advance_width as f64;
        }
    }

    /// Stroke the sampled polyline, breaking the path at every segment
    /// end so discontinuities render as gaps.
    fn draw_curve(&mut self, samples: &[Sample]) {
        let mut pb = PathBuilder::new();
        let mut start_new = true;
        for sample in samples {
            let (sx, sy) = self.view.logical_to_screen((sample.x, sample.y));
            if start_new {
                pb.move_to(sx as f32, sy as f32);
            } else {
                pb.line_to(sx as f32, sy as f32);
            }
            start_new = sample.segment_end;
        }

        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(curve_color());
            paint.anti_alias = true;
            let stroke = Stroke {
                width: CURVE_WIDTH,
                ..Stroke::default()
            };
            self.back
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

/// Decimal label text with a sign slot, so positive and negative values
/// line up on the grid.
fn format_label(value: f64, precision: usize) -> String {
    if value.is_sign_negative() {
        format!("{value:.precision$}")
    } else {
        format!(" {value:.precision$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                let x = -2.0 + i as f64 * 4.0 / (n - 1) as f64;
                Sample {
                    x,
                    y: x * x,
                    segment_end: i == n - 1,
                }
            })
            .collect()
    }

    fn is_white(p: tiny_skia::PremultipliedColorU8) -> bool {
        p.red() == 255 && p.green() == 255 && p.blue() == 255
    }

    #[test]
    fn draw_publishes_to_the_front_buffer() {
        let mut canvas = GraphCanvas::new(200, 150, (0.0, 0.0));
        {
            let front = canvas.front();
            let front = front.lock().unwrap();
            // nothing presented yet
            assert!(front.pixels().iter().all(|p| p.alpha() == 0));
        }
        canvas.draw(&solid_samples(50));
        let front = canvas.front();
        let front = front.lock().unwrap();
        assert!(front.pixels().iter().any(|p| !is_white(*p)));
    }

    #[test]
    fn curve_pixels_are_painted() {
        let mut canvas = GraphCanvas::new(200, 150, (0.0, 0.0));
        canvas.draw(&solid_samples(50));
        let front = canvas.front();
        let front = front.lock().unwrap();
        // (0, 0) lies on the curve; sample the corresponding pixel area
        let origin = (100, 75);
        let mut found = false;
        for dy in -3i32..=3 {
            for dx in -3i32..=3 {
                let x = (origin.0 + dx) as usize;
                let y = (origin.1 + dy) as usize;
                let p = front.pixels()[y * 200 + x];
                if p.red() > 150 && p.green() < 120 && p.blue() < 120 {
                    found = true;
                }
            }
        }
        assert!(found, "curve stroke expected near the origin");
    }

    #[test]
    fn resize_recreates_both_surfaces() {
        let mut canvas = GraphCanvas::new(200, 150, (0.0, 0.0));
        canvas.draw(&solid_samples(10));
        canvas.resize(320, 240);
        assert_eq!(canvas.view().size(), (320, 240));
        let front = canvas.front();
        assert_eq!(front.lock().unwrap().width(), 320);
        canvas.draw(&solid_samples(10));
        assert_eq!(canvas.front().lock().unwrap().width(), 320);
    }

    #[test]
    fn empty_sample_set_still_draws_the_grid() {
        let mut canvas = GraphCanvas::new(200, 150, (0.0, 0.0));
        canvas.draw(&[]);
        let front = canvas.front();
        let front = front.lock().unwrap();
        assert!(front.pixels().iter().any(|p| !is_white(*p)));
        assert!(front.pixels().iter().any(|p| is_white(*p)));
    }

    #[test]
    fn label_format_reserves_a_sign_slot() {
        assert_eq!(format_label(1.5, 2), " 1.50");
        assert_eq!(format_label(-1.5, 2), "-1.50");
        assert_eq!(format_label(2.0, 0), " 2");
    }
}
