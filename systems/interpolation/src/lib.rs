#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Time-driven interpolation of numeric fields.
//!
//! An [`Interpolation`] names a field of a shared object through a typed
//! accessor bound at creation time. The [`Interpolator`] owns every active
//! interpolation but only holds weak references to their targets: when the
//! owner of a target drops it, the interpolations writing to it are discarded
//! on the next [`Interpolator::advance`] without error.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
    time::Duration,
};

/// Accessor that projects a mutable numeric field out of its holder.
pub type FieldAccessor<T> = fn(&mut T) -> &mut f32;

/// Curve that remaps normalised progress before it is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Easing {
    /// Constant rate of change.
    #[default]
    Linear,
    /// Accelerating curve, `p²`.
    EaseIn,
    /// Decelerating curve, `1 - (1 - p)²`.
    EaseOut,
    /// Accelerates through the first half and decelerates through the second.
    EaseInOut,
}

impl Easing {
    /// Remaps `progress`, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn apply(self, progress: f32) -> f32 {
        let p = progress.clamp(0.0, 1.0);
        match self {
            Self::Linear => p,
            Self::EaseIn => p * p,
            Self::EaseOut => 1.0 - (1.0 - p) * (1.0 - p),
            Self::EaseInOut => {
                if p < 0.5 {
                    2.0 * p * p
                } else {
                    1.0 - (-2.0 * p + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

trait Channel {
    /// Writes `value` into the target. Returns `false` once the target is gone.
    fn write(&self, value: f32) -> bool;
}

struct FieldChannel<T> {
    target: Weak<RefCell<T>>,
    field: FieldAccessor<T>,
}

impl<T> Channel for FieldChannel<T> {
    fn write(&self, value: f32) -> bool {
        let Some(target) = self.target.upgrade() else {
            return false;
        };
        let mut holder = target.borrow_mut();
        *(self.field)(&mut *holder) = value;
        true
    }
}

/// Outcome of advancing a single interpolation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// The interpolation wrote an intermediate value and keeps running.
    Running,
    /// The interpolation wrote its exact end value.
    Finished,
    /// The target no longer exists; nothing was written.
    Orphaned,
}

/// Tween of one numeric field from a start value to an end value.
pub struct Interpolation {
    channel: Box<dyn Channel>,
    start: f32,
    end: f32,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
}

impl Interpolation {
    /// Creates an interpolation with explicit start and end values.
    #[must_use]
    pub fn new<T: 'static>(
        target: &Rc<RefCell<T>>,
        field: FieldAccessor<T>,
        start: f32,
        end: f32,
        duration: Duration,
        easing: Easing,
    ) -> Self {
        Self {
            channel: Box::new(FieldChannel {
                target: Rc::downgrade(target),
                field,
            }),
            start,
            end,
            duration,
            elapsed: Duration::ZERO,
            easing,
        }
    }

    /// Creates an interpolation that starts from the field's current value.
    #[must_use]
    pub fn towards<T: 'static>(
        target: &Rc<RefCell<T>>,
        field: FieldAccessor<T>,
        end: f32,
        duration: Duration,
        easing: Easing,
    ) -> Self {
        let start = *field(&mut *target.borrow_mut());
        Self::new(target, field, start, end, duration, easing)
    }

    /// Value the field starts from.
    #[must_use]
    pub fn start(&self) -> f32 {
        self.start
    }

    /// Value the field ends at.
    #[must_use]
    pub fn end(&self) -> f32 {
        self.end
    }

    /// Time accumulated so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Normalised progress before easing.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Accumulates `delta` and writes the eased value into the target.
    pub fn advance(&mut self, delta: Duration) -> Progress {
        self.elapsed = self.elapsed.saturating_add(delta).min(self.duration);
        let progress = self.progress();
        let value = if progress >= 1.0 {
            self.end
        } else {
            self.start + (self.end - self.start) * self.easing.apply(progress)
        };

        match (self.channel.write(value), progress >= 1.0) {
            (false, _) => Progress::Orphaned,
            (true, true) => Progress::Finished,
            (true, false) => Progress::Running,
        }
    }
}

impl fmt::Debug for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpolation")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .field("easing", &self.easing)
            .finish_non_exhaustive()
    }
}

/// Registry of active interpolations, advanced once per frame.
#[derive(Debug, Default)]
pub struct Interpolator {
    active: Vec<Interpolation>,
}

impl Interpolator {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new interpolation. It is first advanced on the next call to [`Self::advance`].
    pub fn add(&mut self, interpolation: Interpolation) {
        tracing::trace!(?interpolation, "interpolation registered");
        self.active.push(interpolation);
    }

    /// Advances every interpolation in registration order, dropping finished and orphaned ones.
    pub fn advance(&mut self, delta: Duration) {
        self.active
            .retain_mut(|interpolation| match interpolation.advance(delta) {
                Progress::Running => true,
                Progress::Finished => {
                    tracing::trace!(end = interpolation.end(), "interpolation finished");
                    false
                }
                Progress::Orphaned => {
                    tracing::trace!("interpolation target dropped");
                    false
                }
            });
    }

    /// Number of interpolations still running.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns whether no interpolation is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Gauge {
        value: f32,
        other: f32,
    }

    fn value(gauge: &mut Gauge) -> &mut f32 {
        &mut gauge.value
    }

    fn other(gauge: &mut Gauge) -> &mut f32 {
        &mut gauge.other
    }

    #[test]
    fn uneven_steps_land_exactly_on_end_value() {
        let gauge = Rc::new(RefCell::new(Gauge::default()));
        let mut interpolator = Interpolator::new();
        interpolator.add(Interpolation::new(
            &gauge,
            value,
            0.3,
            7.7,
            Duration::from_millis(100),
            Easing::EaseOut,
        ));

        for step in [7, 13, 29, 3, 41, 11, 50] {
            interpolator.advance(Duration::from_millis(step));
        }

        assert_eq!(gauge.borrow().value, 7.7);
        assert!(interpolator.is_empty());
    }

    #[test]
    fn linear_midpoint_is_halfway() {
        let gauge = Rc::new(RefCell::new(Gauge::default()));
        let mut interpolator = Interpolator::new();
        interpolator.add(Interpolation::new(
            &gauge,
            value,
            10.0,
            20.0,
            Duration::from_millis(200),
            Easing::Linear,
        ));

        interpolator.advance(Duration::from_millis(100));

        assert!((gauge.borrow().value - 15.0).abs() < 1e-4);
        assert_eq!(interpolator.len(), 1);
    }

    #[test]
    fn ease_out_decelerates_monotonically() {
        let gauge = Rc::new(RefCell::new(Gauge::default()));
        let mut interpolator = Interpolator::new();
        interpolator.add(Interpolation::new(
            &gauge,
            value,
            0.0,
            100.0,
            Duration::from_millis(500),
            Easing::EaseOut,
        ));

        let mut previous_value = 0.0;
        let mut previous_rate = f32::INFINITY;
        for _ in 0..9 {
            interpolator.advance(Duration::from_millis(50));
            let current = gauge.borrow().value;
            let rate = current - previous_value;
            assert!(rate > 0.0, "value must keep increasing");
            assert!(rate < previous_rate, "rate of change must strictly decrease");
            previous_rate = rate;
            previous_value = current;
        }
    }

    #[test]
    fn towards_reads_current_value_as_start() {
        let gauge = Rc::new(RefCell::new(Gauge {
            value: 4.0,
            other: 0.0,
        }));
        let interpolation =
            Interpolation::towards(&gauge, value, 8.0, Duration::from_secs(1), Easing::Linear);

        assert_eq!(interpolation.start(), 4.0);
        assert_eq!(interpolation.end(), 8.0);
    }

    #[test]
    fn dropped_target_is_discarded_silently() {
        let gauge = Rc::new(RefCell::new(Gauge::default()));
        let mut interpolator = Interpolator::new();
        interpolator.add(Interpolation::new(
            &gauge,
            value,
            0.0,
            1.0,
            Duration::from_secs(1),
            Easing::Linear,
        ));
        drop(gauge);

        interpolator.advance(Duration::from_millis(16));

        assert!(interpolator.is_empty());
    }

    #[test]
    fn later_registration_wins_on_shared_field() {
        let gauge = Rc::new(RefCell::new(Gauge::default()));
        let mut interpolator = Interpolator::new();
        interpolator.add(Interpolation::new(
            &gauge,
            value,
            0.0,
            10.0,
            Duration::from_millis(100),
            Easing::Linear,
        ));
        interpolator.add(Interpolation::new(
            &gauge,
            value,
            0.0,
            -10.0,
            Duration::from_millis(100),
            Easing::Linear,
        ));

        interpolator.advance(Duration::from_millis(100));

        assert_eq!(gauge.borrow().value, -10.0);
    }

    #[test]
    fn independent_fields_advance_together() {
        let gauge = Rc::new(RefCell::new(Gauge::default()));
        let mut interpolator = Interpolator::new();
        interpolator.add(Interpolation::new(
            &gauge,
            value,
            0.0,
            1.0,
            Duration::from_millis(60),
            Easing::Linear,
        ));
        interpolator.add(Interpolation::new(
            &gauge,
            other,
            255.0,
            0.0,
            Duration::from_millis(60),
            Easing::EaseIn,
        ));

        interpolator.advance(Duration::from_millis(60));

        let gauge = gauge.borrow();
        assert_eq!(gauge.value, 1.0);
        assert_eq!(gauge.other, 0.0);
    }

    #[test]
    fn zero_duration_completes_on_first_advance() {
        let gauge = Rc::new(RefCell::new(Gauge::default()));
        let mut interpolation =
            Interpolation::new(&gauge, value, 1.0, 2.0, Duration::ZERO, Easing::EaseInOut);

        assert_eq!(interpolation.advance(Duration::ZERO), Progress::Finished);
        assert_eq!(gauge.borrow().value, 2.0);
    }

    #[test]
    fn easing_curves_hit_both_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?} start");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?} end");
        }
        assert!(Easing::EaseOut.apply(0.25) > Easing::Linear.apply(0.25));
        assert!(Easing::EaseIn.apply(0.25) < Easing::Linear.apply(0.25));
    }
}
