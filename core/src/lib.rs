#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the battle engine.
//!
//! This crate defines the vocabulary that connects the pure systems, the
//! authoritative battle and the adapters. Adapters implement the
//! [`Renderer`] and [`Clock`] capabilities and translate device input into
//! [`FrameInput`] snapshots; the battle consumes those snapshots once per
//! frame and renders itself through the capability traits without knowing
//! which backend sits behind them.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Logical window resolution the battle layout is authored against.
pub const DESIGN_RESOLUTION: Vec2 = Vec2::new(640.0, 480.0);

/// RGBA color with byte channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel intensity.
    pub red: u8,
    /// Green channel intensity.
    pub green: u8,
    /// Blue channel intensity.
    pub blue: u8,
    /// Alpha channel intensity, 255 being fully opaque.
    pub alpha: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::from_rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::from_rgb(0, 0, 0);
    /// Opaque red used for damage numbers and the soul.
    pub const RED: Self = Self::from_rgb(255, 0, 0);
    /// Opaque yellow used for current health.
    pub const YELLOW: Self = Self::from_rgb(255, 255, 0);
    /// Opaque dark red used for missing health.
    pub const DARK_RED: Self = Self::from_rgb(192, 0, 0);
    /// Opaque orange used for highlighted buttons.
    pub const ORANGE: Self = Self::from_rgb(255, 127, 39);

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 255,
        }
    }

    /// Returns the same color with the provided alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self { alpha, ..self }
    }

    /// Parses a six digit `RRGGBB` hexadecimal string, with or without a leading `#`.
    #[must_use]
    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }

        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Axis-aligned rectangle in screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge of the rectangle.
    #[must_use]
    pub const fn left(&self) -> f32 {
        self.x
    }

    /// Right edge of the rectangle.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge of the rectangle.
    #[must_use]
    pub const fn top(&self) -> f32 {
        self.y
    }

    /// Bottom edge of the rectangle.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Top-left corner.
    #[must_use]
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Geometric center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shrinks the rectangle by `amount` on every side.
    #[must_use]
    pub fn inset(&self, amount: f32) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            (self.width - 2.0 * amount).max(0.0),
            (self.height - 2.0 * amount).max(0.0),
        )
    }

    /// Clamps the top-left corner of a box of `size` so the box stays inside the rectangle.
    #[must_use]
    pub fn clamp_box(&self, position: Vec2, size: Vec2) -> Vec2 {
        let max_x = (self.right() - size.x).max(self.x);
        let max_y = (self.bottom() - size.y).max(self.y);
        Vec2::new(position.x.clamp(self.x, max_x), position.y.clamp(self.y, max_y))
    }
}

/// Reference point of a text block relative to its draw position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Position names the top-left corner.
    #[default]
    TopLeft,
    /// Position names the center.
    Center,
    /// Position names the middle of the left edge.
    MidLeft,
    /// Position names the top-right corner.
    TopRight,
    /// Position names the middle of the right edge.
    MidRight,
}

impl Anchor {
    /// Converts an anchored position into the top-left corner of a block of `size`.
    #[must_use]
    pub fn top_left(self, position: Vec2, size: TextSize) -> Vec2 {
        match self {
            Self::TopLeft => position,
            Self::Center => position - Vec2::new(size.width / 2.0, size.height / 2.0),
            Self::MidLeft => position - Vec2::new(0.0, size.height / 2.0),
            Self::TopRight => position - Vec2::new(size.width, 0.0),
            Self::MidRight => position - Vec2::new(size.width, size.height / 2.0),
        }
    }
}

/// Fonts registered with the rendering collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontKey {
    /// Dialogue font.
    #[default]
    DtmSans,
    /// Damage-number font.
    UtAttack,
    /// Status bar font.
    UtHud,
}

impl FontKey {
    /// Looks up a font by its registered name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::DtmSans, Self::UtAttack, Self::UtHud]
            .into_iter()
            .find(|font| font.name().eq_ignore_ascii_case(name))
    }

    /// Name under which the font is registered.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DtmSans => "DTM-Sans",
            Self::UtAttack => "UT-Attack",
            Self::UtHud => "UT-HUD",
        }
    }
}

/// Opaque handle naming an image resolved by the rendering collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageKey(String);

impl ImageKey {
    /// Creates a handle from an asset name such as `battle/button/fight0`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Asset name carried by the handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Measured extent of a run of text.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextSize {
    /// Horizontal extent in pixels.
    pub width: f32,
    /// Vertical extent in pixels.
    pub height: f32,
}

impl TextSize {
    /// Creates a new text extent.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Styling applied to a single `draw_text` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextParams {
    /// Font size in pixels.
    pub size: u16,
    /// Fill color.
    pub color: Color,
    /// Font face.
    pub font: FontKey,
    /// Reference point of the draw position.
    pub anchor: Anchor,
    /// Rotation in degrees, counter-clockwise.
    pub rotation: f32,
}

impl TextParams {
    /// Creates top-left anchored, unrotated parameters in the dialogue font.
    #[must_use]
    pub const fn new(size: u16, color: Color) -> Self {
        Self {
            size,
            color,
            font: FontKey::DtmSans,
            anchor: Anchor::TopLeft,
            rotation: 0.0,
        }
    }

    /// Overrides the font face.
    #[must_use]
    pub const fn with_font(mut self, font: FontKey) -> Self {
        self.font = font;
        self
    }

    /// Overrides the anchor.
    #[must_use]
    pub const fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Overrides the rotation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Logical keys understood by the battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    /// Move left.
    Left,
    /// Move right.
    Right,
    /// Move up.
    Up,
    /// Move down.
    Down,
    /// Confirm the current selection.
    Confirm,
    /// Back out of the current selection.
    Cancel,
    /// Rotate the soul counter-clockwise.
    RotateLeft,
    /// Rotate the soul clockwise.
    RotateRight,
}

impl Key {
    /// Maps a single script character to a key.
    ///
    /// `<`, `>`, `^`, `v` are the arrows, `z` confirms, `x` cancels and `q`/`e` rotate.
    #[must_use]
    pub fn from_script_char(ch: char) -> Option<Self> {
        match ch.to_ascii_lowercase() {
            '<' => Some(Self::Left),
            '>' => Some(Self::Right),
            '^' => Some(Self::Up),
            'v' => Some(Self::Down),
            'z' => Some(Self::Confirm),
            'x' => Some(Self::Cancel),
            'q' => Some(Self::RotateLeft),
            'e' => Some(Self::RotateRight),
            _ => None,
        }
    }
}

/// Input snapshot gathered by adapters before updating the battle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Keys held down for the whole frame.
    pub held: Vec<Key>,
    /// Discrete key-down events observed this frame, in arrival order.
    pub pressed: Vec<Key>,
}

impl FrameInput {
    /// Creates a snapshot with the provided key-down events and nothing held.
    #[must_use]
    pub fn pressed(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            held: Vec::new(),
            pressed: keys.into_iter().collect(),
        }
    }

    /// Creates a snapshot with the provided keys held and no key-down events.
    #[must_use]
    pub fn held(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            held: keys.into_iter().collect(),
            pressed: Vec::new(),
        }
    }

    /// Returns whether `key` is held during this frame.
    #[must_use]
    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }
}

/// Text measurement capability of the rendering collaborator.
pub trait TextMetrics {
    /// Measures `text` rendered at `size` in `font`.
    fn measure_text(&self, text: &str, size: u16, font: FontKey) -> TextSize;

    /// Height of a single glyph line at `size` in `font`.
    fn glyph_height(&self, size: u16, font: FontKey) -> f32 {
        self.measure_text("M", size, font).height
    }
}

/// Drawing capability of the rendering collaborator.
///
/// Implementations never mutate battle state; the battle calls these during
/// its read-only render pass.
pub trait Renderer: TextMetrics {
    /// Draws `text` at `position` interpreted through `params.anchor`.
    fn draw_text(&mut self, text: &str, params: TextParams, position: Vec2);

    /// Draws an image with its top-left corner at `position`.
    fn draw_image(&mut self, image: &ImageKey, position: Vec2, rotation: f32, alpha: u8);

    /// Size of an image in pixels.
    fn image_size(&self, image: &ImageKey) -> Vec2;

    /// Fills `rect` with `color`.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Outlines `rect` with a border of `thickness` pixels drawn inward.
    fn draw_rect(&mut self, rect: Rect, thickness: f32, color: Color);
}

/// Frame timing capability.
pub trait Clock {
    /// Returns the time elapsed since the previous call.
    fn tick(&mut self) -> Duration;
}

/// Clock that reports the same delta every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock {
    delta: Duration,
}

impl FixedClock {
    /// Delta produced by a clock running at the battle's 30 frames per second.
    pub const THIRTY_FPS: Duration = Duration::from_micros(33_333);

    /// Creates a clock that always reports `delta`.
    #[must_use]
    pub const fn new(delta: Duration) -> Self {
        Self { delta }
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(Self::THIRTY_FPS)
    }
}

impl Clock for FixedClock {
    fn tick(&mut self) -> Duration {
        self.delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_with_and_without_hash() {
        assert_eq!(Color::from_hex("FF0000"), Some(Color::RED));
        assert_eq!(Color::from_hex("#ffff00"), Some(Color::YELLOW));
        assert_eq!(Color::from_hex("FF00"), None);
        assert_eq!(Color::from_hex("GG0000"), None);
    }

    #[test]
    fn font_lookup_ignores_case() {
        assert_eq!(FontKey::from_name("ut-hud"), Some(FontKey::UtHud));
        assert_eq!(FontKey::from_name("DTM-Sans"), Some(FontKey::DtmSans));
        assert_eq!(FontKey::from_name("Comic"), None);
    }

    #[test]
    fn clamp_box_keeps_box_inside_rect() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);
        let clamped = rect.clamp_box(Vec2::new(200.0, -5.0), Vec2::new(16.0, 16.0));

        assert_eq!(clamped, Vec2::new(94.0, 10.0));
    }

    #[test]
    fn anchors_resolve_to_top_left() {
        let size = TextSize::new(40.0, 20.0);
        let position = Vec2::new(100.0, 100.0);

        assert_eq!(Anchor::TopLeft.top_left(position, size), position);
        assert_eq!(Anchor::Center.top_left(position, size), Vec2::new(80.0, 90.0));
        assert_eq!(Anchor::MidRight.top_left(position, size), Vec2::new(60.0, 90.0));
    }

    #[test]
    fn script_characters_map_to_keys() {
        let keys: Vec<_> = "<>^vzxqe?".chars().filter_map(Key::from_script_char).collect();

        assert_eq!(
            keys,
            vec![
                Key::Left,
                Key::Right,
                Key::Up,
                Key::Down,
                Key::Confirm,
                Key::Cancel,
                Key::RotateLeft,
                Key::RotateRight,
            ]
        );
    }
}
