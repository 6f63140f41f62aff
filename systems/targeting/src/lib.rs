#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Timing minigame that turns a cursor stop position into hit power.

use std::{cell::RefCell, rc::Rc, time::Duration};

use battle_engine_core::{Color, Rect, Renderer};
use battle_engine_system_interpolation::{Easing, Interpolation, Interpolator};

/// Horizontal cursor speed in pixels per second.
pub const CURSOR_SPEED: f32 = 420.0;

/// Time the bar takes to fade and shrink once hidden.
pub const HIDE_DURATION: Duration = Duration::from_millis(400);

const CURSOR_WIDTH: f32 = 6.0;
const BORDER_THICKNESS: f32 = 3.0;

/// Computes hit power for a cursor stopped at `stop_x` over `bar`.
///
/// Power peaks at `max_health / 8` over the bar center and falls linearly to
/// zero at either edge.
#[must_use]
pub fn hit_power(stop_x: f32, bar: Rect, max_health: i32) -> f32 {
    let half_width = bar.width / 2.0;
    if half_width <= 0.0 {
        return 0.0;
    }
    let accuracy = (1.0 - (stop_x - bar.center().x).abs() / half_width).max(0.0);
    accuracy * max_health as f32 / 8.0
}

/// Bar fields animated while the minigame hides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarGeometry {
    /// Left edge of the bar.
    pub x: f32,
    /// Width of the bar.
    pub width: f32,
    /// Opacity in `0.0..=255.0`.
    pub alpha: f32,
}

fn bar_x(geometry: &mut BarGeometry) -> &mut f32 {
    &mut geometry.x
}

fn bar_width(geometry: &mut BarGeometry) -> &mut f32 {
    &mut geometry.width
}

fn bar_alpha(geometry: &mut BarGeometry) -> &mut f32 {
    &mut geometry.alpha
}

/// Progress of the fade-out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Visibility {
    Shown,
    /// Tweens were registered and start moving on the next interpolator advance.
    HideRequested,
    Hiding(Duration),
    Hidden,
}

/// Targeting bar with an oscillating cursor.
#[derive(Debug)]
pub struct TargetUi {
    geometry: Rc<RefCell<BarGeometry>>,
    y: f32,
    height: f32,
    cursor_x: f32,
    direction: f32,
    speed: f32,
    active: bool,
    visibility: Visibility,
    max_health: i32,
}

impl TargetUi {
    /// Creates an active, shown minigame over `bar` for an enemy with `max_health`.
    ///
    /// The cursor starts at the left edge moving right.
    #[must_use]
    pub fn new(bar: Rect, max_health: i32) -> Self {
        Self {
            geometry: Rc::new(RefCell::new(BarGeometry {
                x: bar.x,
                width: bar.width,
                alpha: 255.0,
            })),
            y: bar.y,
            height: bar.height,
            cursor_x: bar.x,
            direction: 1.0,
            speed: CURSOR_SPEED,
            active: true,
            visibility: Visibility::Shown,
            max_health,
        }
    }

    /// Overrides the cursor speed in pixels per second.
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.abs();
        self
    }

    /// Current bar rectangle.
    #[must_use]
    pub fn bar(&self) -> Rect {
        let geometry = self.geometry.borrow();
        Rect::new(geometry.x, self.y, geometry.width, self.height)
    }

    /// Current opacity of the bar.
    #[must_use]
    pub fn alpha(&self) -> u8 {
        // Clamped first, so the cast cannot wrap.
        self.geometry.borrow().alpha.clamp(0.0, 255.0).round() as u8
    }

    /// Horizontal cursor position.
    #[must_use]
    pub fn cursor_x(&self) -> f32 {
        self.cursor_x
    }

    /// Direction of travel, `1.0` moving right and `-1.0` moving left.
    #[must_use]
    pub fn direction(&self) -> f32 {
        self.direction
    }

    /// Returns whether the cursor still moves.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns whether the minigame is still drawn.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.visibility != Visibility::Hidden
    }

    /// Moves the cursor by `delta` and counts down a pending hide.
    ///
    /// The countdown starts on the first update after [`Self::hide`], matching
    /// the first interpolator advance that moves the hide tweens.
    pub fn update(&mut self, delta: Duration) {
        if self.active {
            let bar = self.bar();
            let mut position = self.cursor_x + self.direction * self.speed * delta.as_secs_f32();
            if position >= bar.right() {
                position = (2.0 * bar.right() - position).max(bar.left());
                self.direction = -1.0;
            } else if position <= bar.left() {
                position = (2.0 * bar.left() - position).min(bar.right());
                self.direction = 1.0;
            }
            self.cursor_x = position;
        }

        self.visibility = match self.visibility {
            Visibility::HideRequested => Visibility::Hiding(HIDE_DURATION),
            Visibility::Hiding(remaining) => match remaining.saturating_sub(delta) {
                remaining if remaining.is_zero() => Visibility::Hidden,
                remaining => Visibility::Hiding(remaining),
            },
            visibility => visibility,
        };
    }

    /// Freezes the cursor and returns the resulting hit power.
    ///
    /// Returns `None` when the cursor was already stopped.
    pub fn stop(&mut self) -> Option<f32> {
        if !self.active {
            return None;
        }
        self.active = false;
        Some(hit_power(self.cursor_x, self.bar(), self.max_health))
    }

    /// Fades the bar out while shrinking it towards its center.
    ///
    /// The three tweens share [`HIDE_DURATION`]; once it has elapsed
    /// [`Self::is_shown`] turns false. Hiding twice has no further effect.
    pub fn hide(&mut self, interpolator: &mut Interpolator) {
        if self.visibility != Visibility::Shown {
            return;
        }
        self.active = false;
        let BarGeometry { x, width, alpha } = *self.geometry.borrow();
        let shrunk = width / 5.0;

        interpolator.add(Interpolation::new(
            &self.geometry,
            bar_alpha,
            alpha,
            0.0,
            HIDE_DURATION,
            Easing::Linear,
        ));
        interpolator.add(Interpolation::new(
            &self.geometry,
            bar_width,
            width,
            shrunk,
            HIDE_DURATION,
            Easing::EaseOut,
        ));
        interpolator.add(Interpolation::new(
            &self.geometry,
            bar_x,
            x,
            x + (width - shrunk) / 2.0,
            HIDE_DURATION,
            Easing::EaseOut,
        ));
        self.visibility = Visibility::HideRequested;
    }

    /// Draws the bar and the cursor.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        if !self.is_shown() {
            return;
        }
        let alpha = self.alpha();
        let bar = self.bar();
        renderer.fill_rect(bar, Color::BLACK.with_alpha(alpha));
        renderer.draw_rect(bar, BORDER_THICKNESS, Color::WHITE.with_alpha(alpha));

        let center = bar.center().x;
        renderer.fill_rect(
            Rect::new(center - 1.0, bar.y, 2.0, bar.height),
            Color::YELLOW.with_alpha(alpha),
        );

        let cursor_color = if self.active {
            Color::WHITE
        } else {
            Color::ORANGE
        };
        renderer.fill_rect(
            Rect::new(
                self.cursor_x - CURSOR_WIDTH / 2.0,
                bar.y,
                CURSOR_WIDTH,
                bar.height,
            ),
            cursor_color.with_alpha(alpha),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAR: Rect = Rect::new(40.0, 250.0, 560.0, 130.0);

    #[test]
    fn center_stop_yields_an_eighth_of_max_health() {
        assert_eq!(hit_power(BAR.center().x, BAR, 100), 12.5);
    }

    #[test]
    fn edge_stops_yield_zero() {
        assert_eq!(hit_power(BAR.left(), BAR, 100), 0.0);
        assert_eq!(hit_power(BAR.right(), BAR, 100), 0.0);
        assert_eq!(hit_power(BAR.right() + 50.0, BAR, 100), 0.0);
    }

    #[test]
    fn power_is_symmetric_around_center() {
        let center = BAR.center().x;
        assert_eq!(
            hit_power(center - 70.0, BAR, 80),
            hit_power(center + 70.0, BAR, 80)
        );
    }

    #[test]
    fn cursor_reflects_at_both_bounds() {
        let mut ui = TargetUi::new(BAR, 100).with_speed(100.0);

        ui.update(Duration::from_secs(6));
        assert_eq!(ui.direction(), -1.0);
        assert!((ui.cursor_x() - 560.0).abs() < 1e-3);

        ui.update(Duration::from_secs(6));
        assert_eq!(ui.direction(), 1.0);
        assert!((ui.cursor_x() - 120.0).abs() < 1e-3);
    }

    #[test]
    fn cursor_never_leaves_the_bar() {
        let mut ui = TargetUi::new(BAR, 100).with_speed(10_000.0);
        for _ in 0..50 {
            ui.update(Duration::from_millis(37));
            assert!(ui.cursor_x() >= BAR.left() && ui.cursor_x() <= BAR.right());
        }
    }

    #[test]
    fn stop_freezes_the_cursor_once() {
        let mut ui = TargetUi::new(BAR, 100).with_speed(280.0);
        ui.update(Duration::from_secs(1));

        assert_eq!(ui.stop(), Some(12.5));
        assert_eq!(ui.stop(), None);
        ui.update(Duration::from_secs(1));
        assert_eq!(ui.cursor_x(), 320.0);
    }
}
