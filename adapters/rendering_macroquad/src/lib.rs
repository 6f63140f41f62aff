#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for the battle engine.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! Asset loading is not part of this adapter: images are drawn as outlined
//! placeholders labelled with their handle, and every font is macroquad's
//! built-in one scaled to the requested size.

use std::{collections::BTreeMap, time::Duration};

use anyhow::Result;
use battle_engine_core::{
    Color, FontKey, FrameInput, ImageKey, Key, Rect, Renderer, TextMetrics, TextParams, TextSize,
};
use battle_engine_rendering::{FrameControl, Presentation, RenderingBackend};
use glam::Vec2;
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};

const PLACEHOLDER_COLOR: Color = Color::from_rgb(128, 128, 128);
const PLACEHOLDER_LABEL_SIZE: u16 = 10;
const DEFAULT_IMAGE_SIZE: Vec2 = Vec2::new(64.0, 64.0);

/// Physical keys and the logical key each one produces.
const KEY_BINDINGS: [(KeyCode, Key); 11] = [
    (KeyCode::Left, Key::Left),
    (KeyCode::Right, Key::Right),
    (KeyCode::Up, Key::Up),
    (KeyCode::Down, Key::Down),
    (KeyCode::Z, Key::Confirm),
    (KeyCode::Enter, Key::Confirm),
    (KeyCode::X, Key::Cancel),
    (KeyCode::LeftShift, Key::Cancel),
    (KeyCode::RightShift, Key::Cancel),
    (KeyCode::Q, Key::RotateLeft),
    (KeyCode::E, Key::RotateRight),
];

/// Sizes reported for the engine's well-known images.
fn default_image_sizes() -> BTreeMap<String, Vec2> {
    let button = Vec2::new(110.0, 42.0);
    let mut sizes = BTreeMap::new();
    for stem in ["fight", "act", "item", "mercy"] {
        for state in 0..2 {
            let _ = sizes.insert(format!("battle/button/{stem}{state}"), button);
        }
    }
    let _ = sizes.insert("battle/soul".to_owned(), Vec2::splat(16.0));
    let _ = sizes.insert("battle/hp".to_owned(), Vec2::new(22.0, 10.0));
    for frame in 0..6 {
        let _ = sizes.insert(format!("battle/slash{frame}"), Vec2::new(26.0, 110.0));
    }
    sizes
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    image_sizes: BTreeMap<String, Vec2>,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            image_sizes: default_image_sizes(),
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Reports `size` for placeholders of `image`.
    #[must_use]
    pub fn with_image_size(mut self, image: &ImageKey, size: Vec2) -> Self {
        let _ = self.image_sizes.insert(image.as_str().to_owned(), size);
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut frame: F) -> Result<()>
    where
        F: FnMut(Duration, &FrameInput, &mut dyn Renderer) -> FrameControl + 'static,
    {
        let Self {
            swap_interval,
            image_sizes,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            resolution,
        } = presentation;

        // Window dimensions are whole pixels.
        let mut config = macroquad::window::Conf {
            window_title,
            window_width: resolution.x.round() as i32,
            window_height: resolution.y.round() as i32,
            window_resizable: false,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let background = to_macroquad_color(clear_color);
            let mut renderer = MacroquadRenderer { image_sizes };

            loop {
                if is_key_pressed(KeyCode::Escape) {
                    tracing::info!("escape pressed, closing window");
                    break;
                }

                macroquad::window::clear_background(background);

                let delta = frame_delta(macroquad::time::get_frame_time());
                let input = gather_frame_input();
                if frame(delta, &input, &mut renderer) == FrameControl::Exit {
                    break;
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Converts macroquad's frame time in seconds, ignoring negative or non-finite readings.
fn frame_delta(seconds: f32) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f32(seconds)
    } else {
        Duration::ZERO
    }
}

fn gather_frame_input() -> FrameInput {
    input_from_observations(is_key_pressed, is_key_down)
}

/// Builds the logical input from physical key observations.
///
/// Keys are reported once even when several physical keys map to them.
fn input_from_observations(
    pressed: impl Fn(KeyCode) -> bool,
    down: impl Fn(KeyCode) -> bool,
) -> FrameInput {
    let mut input = FrameInput::default();
    for (code, key) in KEY_BINDINGS {
        if pressed(code) && !input.pressed.contains(&key) {
            input.pressed.push(key);
        }
        if down(code) && !input.held.contains(&key) {
            input.held.push(key);
        }
    }
    input
}

struct MacroquadRenderer {
    image_sizes: BTreeMap<String, Vec2>,
}

impl TextMetrics for MacroquadRenderer {
    fn measure_text(&self, text: &str, size: u16, _font: FontKey) -> TextSize {
        let dimensions = macroquad::text::measure_text(text, None, size, 1.0);
        TextSize::new(dimensions.width, f32::from(size).max(dimensions.height))
    }
}

impl Renderer for MacroquadRenderer {
    fn draw_text(&mut self, text: &str, params: TextParams, position: Vec2) {
        let dimensions = macroquad::text::measure_text(text, None, params.size, 1.0);
        let size = TextSize::new(dimensions.width, f32::from(params.size));
        let top_left = params.anchor.top_left(position, size);
        macroquad::text::draw_text_ex(
            text,
            top_left.x,
            top_left.y + dimensions.offset_y,
            macroquad::text::TextParams {
                font_size: params.size,
                color: to_macroquad_color(params.color),
                ..macroquad::text::TextParams::default()
            },
        );
    }

    fn draw_image(&mut self, image: &ImageKey, position: Vec2, rotation: f32, alpha: u8) {
        let size = self.image_size(image);
        let color = PLACEHOLDER_COLOR.with_alpha(alpha);
        macroquad::shapes::draw_rectangle_lines(
            position.x,
            position.y,
            size.x,
            size.y,
            1.0,
            to_macroquad_color(color),
        );
        if rotation != 0.0 {
            let center = position + size / 2.0;
            let heading = Vec2::from_angle(rotation.to_radians()) * size.x / 2.0;
            macroquad::shapes::draw_line(
                center.x,
                center.y,
                center.x + heading.x,
                center.y + heading.y,
                1.0,
                to_macroquad_color(color),
            );
        }
        let label = placeholder_label(image);
        macroquad::text::draw_text(
            label,
            position.x + 2.0,
            position.y + f32::from(PLACEHOLDER_LABEL_SIZE),
            f32::from(PLACEHOLDER_LABEL_SIZE),
            to_macroquad_color(color),
        );
    }

    fn image_size(&self, image: &ImageKey) -> Vec2 {
        self.image_sizes
            .get(image.as_str())
            .copied()
            .unwrap_or(DEFAULT_IMAGE_SIZE)
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        macroquad::shapes::draw_rectangle(
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            to_macroquad_color(color),
        );
    }

    fn draw_rect(&mut self, rect: Rect, thickness: f32, color: Color) {
        macroquad::shapes::draw_rectangle_lines(
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            thickness,
            to_macroquad_color(color),
        );
    }
}

/// Last path segment of an image handle.
fn placeholder_label(image: &ImageKey) -> &str {
    image.as_str().rsplit('/').next().unwrap_or_default()
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::from_rgba(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_action_keys_map_to_logical_keys() {
        let input = input_from_observations(
            |code| matches!(code, KeyCode::Z | KeyCode::Left),
            |code| code == KeyCode::Q,
        );

        assert_eq!(input.pressed, vec![Key::Left, Key::Confirm]);
        assert_eq!(input.held, vec![Key::RotateLeft]);
    }

    #[test]
    fn aliases_report_a_key_once() {
        let input = input_from_observations(
            |code| matches!(code, KeyCode::Z | KeyCode::Enter),
            |code| matches!(code, KeyCode::LeftShift | KeyCode::X),
        );

        assert_eq!(input.pressed, vec![Key::Confirm]);
        assert_eq!(input.held, vec![Key::Cancel]);
    }

    #[test]
    fn frame_delta_ignores_bad_readings() {
        assert_eq!(frame_delta(0.5), Duration::from_millis(500));
        assert_eq!(frame_delta(-1.0), Duration::ZERO);
        assert_eq!(frame_delta(f32::NAN), Duration::ZERO);
    }

    #[test]
    fn placeholders_use_known_sizes() {
        let backend = MacroquadBackend::new()
            .with_image_size(&ImageKey::new("papyrus"), Vec2::new(90.0, 150.0));
        let renderer = MacroquadRenderer {
            image_sizes: backend.image_sizes,
        };

        assert_eq!(
            renderer.image_size(&ImageKey::new("battle/button/fight1")),
            Vec2::new(110.0, 42.0)
        );
        assert_eq!(
            renderer.image_size(&ImageKey::new("papyrus")),
            Vec2::new(90.0, 150.0)
        );
        assert_eq!(
            renderer.image_size(&ImageKey::new("unknown")),
            DEFAULT_IMAGE_SIZE
        );
        assert_eq!(placeholder_label(&ImageKey::new("battle/soul")), "soul");
    }

    #[test]
    fn colors_convert_channel_by_channel() {
        let color = to_macroquad_color(Color::from_rgb(255, 0, 0).with_alpha(0));

        assert_eq!(color.r, 1.0);
        assert_eq!(color.g, 0.0);
        assert_eq!(color.a, 0.0);
    }
}
