#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for battle engine adapters.

use anyhow::Result as AnyResult;
use battle_engine_core::{
    Clock, Color, FixedClock, FontKey, FrameInput, ImageKey, Key, Rect, Renderer, TextMetrics,
    TextParams, TextSize, DESIGN_RESOLUTION,
};
use glam::Vec2;
use std::{collections::BTreeMap, error::Error, fmt, time::Duration};

/// Describes how a backend should present the battle.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Logical resolution the battle draws against.
    pub resolution: Vec2,
}

impl Presentation {
    /// Constructs a new presentation descriptor at the design resolution.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            resolution: DESIGN_RESOLUTION,
        }
    }
}

/// Decision returned by the frame closure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameControl {
    /// Keep running.
    Continue,
    /// Stop after this frame.
    Exit,
}

/// Rendering backend capable of driving the battle loop.
pub trait RenderingBackend {
    /// Runs the backend until the frame closure asks to exit or the backend stops.
    ///
    /// The `frame` closure receives the frame delta, the input captured by the
    /// adapter and the renderer to draw the frame into.
    fn run<F>(self, presentation: Presentation, frame: F) -> AnyResult<()>
    where
        F: FnMut(Duration, &FrameInput, &mut dyn Renderer) -> FrameControl + 'static;
}

/// Draw call captured by the [`RecordingRenderer`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// A `draw_text` call.
    Text {
        /// Text drawn.
        text: String,
        /// Styling used.
        params: TextParams,
        /// Anchored position.
        position: Vec2,
    },
    /// A `draw_image` call.
    Image {
        /// Image drawn.
        image: ImageKey,
        /// Top-left corner.
        position: Vec2,
        /// Rotation in degrees.
        rotation: f32,
        /// Opacity.
        alpha: u8,
    },
    /// A `fill_rect` call.
    FillRect {
        /// Filled area.
        rect: Rect,
        /// Fill color.
        color: Color,
    },
    /// A `draw_rect` call.
    DrawRect {
        /// Outlined area.
        rect: Rect,
        /// Border thickness.
        thickness: f32,
        /// Border color.
        color: Color,
    },
}

/// Renderer that records draw calls and measures text with fixed glyph metrics.
///
/// Every glyph is `size / 2` pixels wide and `size` pixels tall regardless of
/// the font, which keeps layout assertions exact.
#[derive(Clone, Debug)]
pub struct RecordingRenderer {
    commands: Vec<DrawCommand>,
    image_sizes: BTreeMap<ImageKey, Vec2>,
    default_image_size: Vec2,
}

impl RecordingRenderer {
    /// Size reported for images without an explicit size.
    pub const DEFAULT_IMAGE_SIZE: Vec2 = Vec2::new(32.0, 32.0);

    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            image_sizes: BTreeMap::new(),
            default_image_size: Self::DEFAULT_IMAGE_SIZE,
        }
    }

    /// Reports `size` for `image`.
    #[must_use]
    pub fn with_image_size(mut self, image: ImageKey, size: Vec2) -> Self {
        let _ = self.image_sizes.insert(image, size);
        self
    }

    /// Draw calls recorded since the last [`Self::clear`].
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Text drawn since the last [`Self::clear`], in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Text drawn since the last [`Self::clear`], concatenated.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.texts().collect()
    }

    /// Images drawn since the last [`Self::clear`], in draw order.
    pub fn images(&self) -> impl Iterator<Item = &ImageKey> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Image { image, .. } => Some(image),
            _ => None,
        })
    }

    /// Forgets every recorded draw call.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMetrics for RecordingRenderer {
    fn measure_text(&self, text: &str, size: u16, _font: FontKey) -> TextSize {
        let size = f32::from(size);
        TextSize::new(text.chars().count() as f32 * size / 2.0, size)
    }
}

impl Renderer for RecordingRenderer {
    fn draw_text(&mut self, text: &str, params: TextParams, position: Vec2) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            params,
            position,
        });
    }

    fn draw_image(&mut self, image: &ImageKey, position: Vec2, rotation: f32, alpha: u8) {
        self.commands.push(DrawCommand::Image {
            image: image.clone(),
            position,
            rotation,
            alpha,
        });
    }

    fn image_size(&self, image: &ImageKey) -> Vec2 {
        self.image_sizes
            .get(image)
            .copied()
            .unwrap_or(self.default_image_size)
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn draw_rect(&mut self, rect: Rect, thickness: f32, color: Color) {
        self.commands.push(DrawCommand::DrawRect {
            rect,
            thickness,
            color,
        });
    }
}

/// Errors that can occur when parsing a key script.
#[derive(Debug, PartialEq, Eq)]
pub enum ScriptError {
    /// The character does not name a key.
    UnknownKey {
        /// Offending character.
        ch: char,
        /// Character offset in the script.
        position: usize,
    },
    /// A `+` hold marker is not followed by a key.
    DanglingHold {
        /// Character offset of the marker.
        position: usize,
    },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey { ch, position } => {
                write!(f, "unknown key `{ch}` at position {position}")
            }
            Self::DanglingHold { position } => {
                write!(f, "hold marker at position {position} is not followed by a key")
            }
        }
    }
}

impl Error for ScriptError {}

/// Parses a key script into one input snapshot per frame.
///
/// Each key character (see [`Key::from_script_char`]) is pressed on its own
/// frame, `+` followed by a key holds that key for one frame, `.` is an idle
/// frame and whitespace is ignored.
pub fn parse_script(script: &str) -> Result<Vec<FrameInput>, ScriptError> {
    let mut frames = Vec::new();
    let mut chars = script.chars().enumerate();

    while let Some((position, ch)) = chars.next() {
        match ch {
            '.' => frames.push(FrameInput::default()),
            '+' => {
                let (held_position, held) = chars
                    .next()
                    .ok_or(ScriptError::DanglingHold { position })?;
                let key = Key::from_script_char(held).ok_or(ScriptError::UnknownKey {
                    ch: held,
                    position: held_position,
                })?;
                frames.push(FrameInput::held([key]));
            }
            ch if ch.is_whitespace() => {}
            ch => {
                let key = Key::from_script_char(ch).ok_or(ScriptError::UnknownKey { ch, position })?;
                frames.push(FrameInput::pressed([key]));
            }
        }
    }

    Ok(frames)
}

/// Backend that runs a fixed number of frames without a window.
#[derive(Clone, Debug)]
pub struct HeadlessBackend {
    frames: u32,
    clock: FixedClock,
    script: Vec<FrameInput>,
    renderer: RecordingRenderer,
}

impl HeadlessBackend {
    /// Creates a backend that runs `frames` idle frames at 30 frames per second.
    #[must_use]
    pub fn new(frames: u32) -> Self {
        Self {
            frames,
            clock: FixedClock::default(),
            script: Vec::new(),
            renderer: RecordingRenderer::new(),
        }
    }

    /// Feeds `script` one snapshot per frame; frames past its end are idle.
    #[must_use]
    pub fn with_script(mut self, script: Vec<FrameInput>) -> Self {
        self.script = script;
        self
    }

    /// Overrides the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: FixedClock) -> Self {
        self.clock = clock;
        self
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(mut self, _presentation: Presentation, mut frame: F) -> AnyResult<()>
    where
        F: FnMut(Duration, &FrameInput, &mut dyn Renderer) -> FrameControl + 'static,
    {
        let idle = FrameInput::default();
        for index in 0..self.frames {
            let input = usize::try_from(index)
                .ok()
                .and_then(|index| self.script.get(index))
                .unwrap_or(&idle);
            self.renderer.clear();
            if frame(self.clock.tick(), input, &mut self.renderer) == FrameControl::Exit {
                break;
            }
        }
        Ok(())
    }
}
