//! Sample buffer and the recompute-avoidance cache around it.

use std::sync::Arc;

use crate::data::history::History;
use crate::engine::Expression;

/// Bounds tolerance for the cache hit test and the left shift applied to
/// the first sample (evaluating exactly on a range boundary trips domain
/// errors for functions like `sqrt` at 0).
const EPSILON: f64 = 1e-9;

/// Default number of samples per pass.
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;

/// One evaluated point. `segment_end` marks the last point of a
/// contiguous run before a gap (domain error) or the end of the range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub segment_end: bool,
}

/// An x-range to sample; normalized so `lower <= upper` before use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRange {
    pub lower: f64,
    pub upper: f64,
}

impl SampleRange {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    fn normalized(self) -> Self {
        if self.lower > self.upper {
            Self {
                lower: self.upper,
                upper: self.lower,
            }
        } else {
            self
        }
    }
}

/// Anything the sampler can evaluate pointwise. `None` marks a domain
/// error at that point, which becomes a gap in the rendered polyline.
pub trait SampleSource {
    fn y_at(&self, x: f64) -> Option<f64>;
    /// Display text, compared against user input to skip duplicate pushes.
    fn label(&self) -> &str;
}

impl SampleSource for Expression {
    fn y_at(&self, x: f64) -> Option<f64> {
        self.evaluate(&[x]).ok()
    }

    fn label(&self) -> &str {
        self.display_string()
    }
}

/// Owns the version history and the most recent sample buffer, and decides
/// whether a requested range actually needs recomputation.
///
/// A pass is skipped when no version change is pending and the requested
/// bounds match the previously sampled ones within [`EPSILON`]: panning
/// by sub-epsilon amounts or redrawing without input must not re-run the
/// expression engine.
pub struct SampleCache<S = Expression> {
    history: History<S>,
    buffer: Vec<Sample>,
    valid: usize,
    count: usize,
    last_range: SampleRange,
    force: bool,
}

impl<S: SampleSource> SampleCache<S> {
    pub fn new(count: usize) -> Self {
        let count = count.max(3);
        Self {
            history: History::new(),
            buffer: vec![Sample::default(); count],
            valid: 0,
            count,
            last_range: SampleRange::new(f64::NAN, f64::NAN),
            force: false,
        }
    }

    /// Change the number of samples per pass; takes effect on the next
    /// recomputation.
    pub fn set_sample_count(&mut self, count: usize) {
        self.count = count.max(3);
        self.buffer.resize(self.count, Sample::default());
        self.valid = self.valid.min(self.count);
        self.force = true;
    }

    /// Push a new current version. The next pass recomputes regardless of
    /// whether the bounds match.
    pub fn set_current(&mut self, version: S) {
        self.history.push(version);
        self.force = true;
    }

    /// Move to the previous version, if any.
    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        if moved {
            self.force = true;
        }
        moved
    }

    /// Move to the next version, if any.
    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        if moved {
            self.force = true;
        }
        moved
    }

    /// The version at the history cursor.
    pub fn current(&self) -> Option<&Arc<S>> {
        self.history.current()
    }

    /// Display text of the current version ("" when the history is empty).
    pub fn current_label(&self) -> &str {
        self.current().map(|v| v.label()).unwrap_or("")
    }

    /// Whether `text` is exactly the current version's display text.
    /// Callers use this to avoid pushing a syntactically identical
    /// duplicate into the history.
    pub fn matches_current(&self, text: &str) -> bool {
        self.current()
            .map(|v| v.label() == text)
            .unwrap_or(false)
    }

    /// The valid prefix of the most recent sample buffer.
    pub fn samples(&self) -> &[Sample] {
        &self.buffer[..self.valid]
    }

    /// Sample the current version over `range`, reusing the previous
    /// buffer when nothing changed. Returns the valid samples.
    pub fn sample(&mut self, range: SampleRange) -> &[Sample] {
        if self.history.is_empty() {
            self.valid = 0;
            return self.samples();
        }

        let range = range.normalized();
        let hit = !self.force
            && !self.buffer.is_empty()
            && (self.last_range.lower - range.lower).abs() < EPSILON
            && (self.last_range.upper - range.upper).abs() < EPSILON;
        if hit {
            return self.samples();
        }

        self.last_range = range;
        let source = self
            .history
            .current()
            .cloned()
            .expect("history checked non-empty");

        let step = (range.upper - range.lower) / (self.count as f64 - 2.0);
        let mut x = range.lower - EPSILON;
        self.valid = 0;
        let mut prev_ok = false;

        for _ in 0..self.count {
            match source.y_at(x) {
                Some(y) => {
                    self.buffer[self.valid] = Sample {
                        x,
                        y,
                        segment_end: false,
                    };
                    self.valid += 1;
                    prev_ok = true;
                }
                None => {
                    // close the open segment at the discontinuity
                    if prev_ok {
                        self.buffer[self.valid - 1].segment_end = true;
                    }
                    prev_ok = false;
                }
            }
            x += step;
        }

        if self.valid > 0 {
            self.buffer[self.valid - 1].segment_end = true;
        }
        self.force = false;
        self.samples()
    }
}
