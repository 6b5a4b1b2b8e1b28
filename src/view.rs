//! Logical<->screen view transform.
//!
//! Owns the visible logical bounds, the zoom scale and everything derived
//! from it: the quantized grid step, the on-screen grid density and the
//! label precision. Bounds are always *recomputed* from the pivot, scale
//! and surface size rather than mutated ad hoc, so the mapping stays
//! exactly invertible.

/// A point in logical (graph) coordinates.
pub type LogicalPoint = (f64, f64);

/// A point in screen (pixel) coordinates of the plot surface.
pub type ScreenPoint = (f64, f64);

/// Grid density baseline: how many pixels one logical unit occupies at
/// scale 1. The effective value is kept within `[BASE, 2*BASE)` by the
/// step quantization, so grid lines never crowd or starve visually.
const BASE_PIXELS_PER_UNIT: f64 = 80.0;

#[derive(Debug, Clone)]
pub struct ViewTransform {
    width: u32,
    height: u32,
    scale: f32,
    base_scale: f32,
    /// Logical distance between adjacent grid lines; always the base step
    /// scaled by a power of two, so labeled values stay "nice".
    step: f64,
    base_step: f64,
    pixels_per_unit: f64,
    /// Decimal digits used for grid labels.
    precision: u32,
    /// Zoom anchor: this logical point stays under this screen point
    /// across scale changes.
    pivot: LogicalPoint,
    pivot_screen: ScreenPoint,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl ViewTransform {
    /// A view of `width x height` pixels centered on `center`.
    pub fn new(width: u32, height: u32, center: LogicalPoint) -> Self {
        let half_x = width as f64 / (BASE_PIXELS_PER_UNIT * 2.0);
        let half_y = height as f64 / (BASE_PIXELS_PER_UNIT * 2.0);
        Self {
            width,
            height,
            scale: 1.0,
            base_scale: 1.0,
            step: 1.0,
            base_step: 1.0,
            pixels_per_unit: BASE_PIXELS_PER_UNIT,
            precision: 0,
            pivot: center,
            pivot_screen: (width as f64 / 2.0, height as f64 / 2.0),
            x_min: center.0 - half_x,
            x_max: center.0 + half_x,
            y_min: center.1 - half_y,
            y_max: center.1 + half_y,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Logical grid step between adjacent lines.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// On-screen distance between adjacent grid lines, in pixels.
    pub fn pixels_per_step(&self) -> f64 {
        self.pixels_per_unit
    }

    /// Decimal digits for grid labels.
    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn x_bounds(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    pub fn y_bounds(&self) -> (f64, f64) {
        (self.y_min, self.y_max)
    }

    /// Record the zoom anchor from a screen position (typically the
    /// cursor). Must be called before [`set_scale`](Self::set_scale) to
    /// anchor the zoom there; otherwise the previous anchor is reused.
    pub fn set_pivot(&mut self, screen: ScreenPoint) {
        self.pivot_screen = screen;
        self.pivot = self.screen_to_logical(screen);
    }

    /// Apply a new zoom scale and recompute every derived quantity.
    ///
    /// Label precision steps by one digit per octave crossing of the
    /// scale (never on raw value jitter): zooming in past a power of two
    /// adds a digit, zooming back out removes one down to zero. The grid
    /// step snaps to the base step scaled by that power of two, and the
    /// pixel density is folded back into `[base, 2*base)` by
    /// doubling/halving. The screen pivot stays fixed: the logical point
    /// under the cursor does not move.
    pub fn set_scale(&mut self, scale: f32) {
        let ratio = self.scale as f64 / scale as f64;
        let new_exp = scale.log2().floor() as i32;
        let old_exp = self.scale.log2().floor() as i32;

        if new_exp > old_exp && scale > 1.0 {
            self.precision += 1;
        } else if new_exp < old_exp && self.precision > 0 {
            self.precision -= 1;
        }

        self.scale = scale;
        self.step = self.base_step / 2f64.powi(new_exp);
        self.pixels_per_unit /= ratio;
        while self.pixels_per_unit < BASE_PIXELS_PER_UNIT {
            self.pixels_per_unit *= 2.0;
        }
        while self.pixels_per_unit >= 2.0 * BASE_PIXELS_PER_UNIT {
            self.pixels_per_unit /= 2.0;
        }

        let unit = self.step / self.pixels_per_unit;
        self.x_min = self.pivot.0 - self.pivot_screen.0 * unit;
        self.x_max = self.pivot.0 + (self.width as f64 - self.pivot_screen.0) * unit;
        self.y_min = self.pivot.1 - (self.height as f64 - self.pivot_screen.1) * unit;
        self.y_max = self.pivot.1 + self.pivot_screen.1 * unit;
    }

    /// Back to the initial zoom and label precision.
    pub fn reset_scale(&mut self) {
        self.set_scale(self.base_scale);
        self.precision = 0;
    }

    /// Resize the view, keeping the top-left logical corner fixed and
    /// recomputing the bottom-right one from the new pixel size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let corner = self.screen_to_logical((width as f64, height as f64));
        self.x_max = corner.0;
        self.y_min = corner.1;
    }

    /// Translate the view by a pixel delta (positive x moves the visible
    /// range right, positive y moves it up).
    pub fn pan(&mut self, delta: ScreenPoint) {
        let unit = self.step / self.pixels_per_unit;
        let dx = delta.0 * unit;
        let dy = delta.1 * unit;
        self.x_min += dx;
        self.x_max += dx;
        self.y_min += dy;
        self.y_max += dy;
    }

    pub fn logical_to_screen(&self, p: LogicalPoint) -> ScreenPoint {
        let per_unit = self.pixels_per_unit / self.step;
        ((p.0 - self.x_min) * per_unit, (self.y_max - p.1) * per_unit)
    }

    pub fn screen_to_logical(&self, p: ScreenPoint) -> LogicalPoint {
        let unit = self.step / self.pixels_per_unit;
        (self.x_min + p.0 * unit, self.y_max - p.1 * unit)
    }
}
