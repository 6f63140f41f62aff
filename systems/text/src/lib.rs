#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Typewriter-style progressive text with inline styling commands.
//!
//! Templates are tokenized once when they are set; the per-frame reveal loop
//! only counts ticks and recomputes the wrapped layout when another character
//! becomes visible.

pub mod layout;
pub mod template;

use battle_engine_core::{Renderer, TextMetrics, TextParams};

pub use layout::{GlyphStyle, PlacedGlyph, TextBox, TextLayout};
pub use template::{parse, parse_strict, TemplateError, TextCommand, TextTemplate};

/// Text that reveals one character every few update ticks.
#[derive(Clone, Debug)]
pub struct ProgressiveText {
    raw: String,
    template: TextTemplate,
    frame: TextBox,
    base_style: GlyphStyle,
    revealed: usize,
    tick_accumulator: u32,
    ticks_per_character: u32,
    layout: TextLayout,
    needs_layout: bool,
    finished: bool,
}

impl ProgressiveText {
    /// Creates a text revealing `template` inside `frame`.
    ///
    /// `ticks_per_character` below one is treated as one.
    #[must_use]
    pub fn new(
        template: &str,
        frame: TextBox,
        base_style: GlyphStyle,
        ticks_per_character: u32,
    ) -> Self {
        let mut text = Self {
            raw: String::new(),
            template: TextTemplate::default(),
            frame,
            base_style,
            revealed: 0,
            tick_accumulator: 0,
            ticks_per_character: ticks_per_character.max(1),
            layout: TextLayout::default(),
            needs_layout: true,
            finished: false,
        };
        text.set_text(template);
        text
    }

    /// Replaces the template and restarts the reveal.
    pub fn set_text(&mut self, template: &str) {
        self.raw = template.to_owned();
        self.template = parse(template);
        self.revealed = if self.template.is_instant() {
            self.template.len()
        } else {
            0
        };
        self.tick_accumulator = 0;
        self.finished = false;
        self.needs_layout = true;
    }

    /// Moves the text to another region.
    pub fn set_frame(&mut self, frame: TextBox) {
        if self.frame != frame {
            self.frame = frame;
            self.needs_layout = true;
        }
    }

    /// Advances the reveal by one tick and refreshes the layout.
    pub fn update<M: TextMetrics + ?Sized>(&mut self, metrics: &M) {
        if !self.finished && self.revealed < self.template.len() {
            self.tick_accumulator += 1;
            if self.tick_accumulator >= self.ticks_per_character {
                self.tick_accumulator = 0;
                self.revealed += 1;
                self.needs_layout = true;
            }
        }

        if self.needs_layout {
            self.layout = layout::layout(
                &self.template,
                self.revealed,
                self.frame,
                self.base_style,
                metrics,
            );
            self.needs_layout = false;
        }

        self.finished = self.revealed == self.template.len();
    }

    /// Reveals the whole text. The next [`Self::update`] marks it finished.
    pub fn skip(&mut self) {
        if self.revealed != self.template.len() {
            self.revealed = self.template.len();
            self.needs_layout = true;
        }
    }

    /// Draws the glyphs laid out by the last update.
    pub fn draw(&self, renderer: &mut dyn Renderer) {
        let mut buffer = [0; 4];
        for glyph in self.layout.glyphs() {
            let params = TextParams::new(glyph.style.size, glyph.style.color)
                .with_font(glyph.style.font);
            renderer.draw_text(glyph.ch.encode_utf8(&mut buffer), params, glyph.position);
        }
    }

    /// Template as it was set, commands included.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Text with commands stripped.
    #[must_use]
    pub fn clean_text(&self) -> &str {
        self.template.clean_text()
    }

    /// Prefix of the clean text revealed so far.
    #[must_use]
    pub fn revealed_text(&self) -> &str {
        &self.template.clean_text()[..self.template.byte_offset(self.revealed)]
    }

    /// Number of characters revealed so far.
    #[must_use]
    pub fn revealed_len(&self) -> usize {
        self.revealed
    }

    /// Commands activating at clean-text `index`.
    #[must_use]
    pub fn commands_at(&self, index: usize) -> &[TextCommand] {
        self.template.commands_at(index)
    }

    /// Returns whether every character was revealed as of the last update.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Layout computed by the last update.
    #[must_use]
    pub fn layout(&self) -> &TextLayout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use battle_engine_core::{Color, FontKey, TextSize};
    use glam::Vec2;

    use super::*;

    struct Monospace;

    impl TextMetrics for Monospace {
        fn measure_text(&self, text: &str, size: u16, _font: FontKey) -> TextSize {
            TextSize::new(text.chars().count() as f32 * 10.0, f32::from(size))
        }
    }

    fn text(template: &str, ticks_per_character: u32) -> ProgressiveText {
        ProgressiveText::new(
            template,
            TextBox::new(Vec2::ZERO, 1000.0),
            GlyphStyle::new(Color::WHITE, FontKey::DtmSans, 20),
            ticks_per_character,
        )
    }

    #[test]
    fn reveal_takes_length_times_ticks_per_character_updates() {
        let mut progressive = text("Hello", 3);
        let mut previous = 0;

        for call in 1..=15 {
            assert!(!progressive.is_finished(), "finished early at call {call}");
            progressive.update(&Monospace);
            assert!(progressive.revealed_len() >= previous);
            previous = progressive.revealed_len();
        }

        assert_eq!(progressive.revealed_text(), "Hello");
        assert!(progressive.is_finished());
    }

    #[test]
    fn finished_flag_stays_set_until_text_changes() {
        let mut progressive = text("Hi", 1);
        for _ in 0..5 {
            progressive.update(&Monospace);
        }
        assert!(progressive.is_finished());

        progressive.set_text("Again");

        assert!(!progressive.is_finished());
        assert_eq!(progressive.revealed_text(), "");
    }

    #[test]
    fn skip_reveals_now_and_finishes_next_update() {
        let mut progressive = text("Long enough", 4);

        progressive.skip();

        assert_eq!(progressive.revealed_text(), "Long enough");
        assert!(!progressive.is_finished());
        progressive.update(&Monospace);
        assert!(progressive.is_finished());
    }

    #[test]
    fn instant_text_is_revealed_on_set() {
        let progressive = text("[instant]Now.", 5);

        assert_eq!(progressive.revealed_text(), "Now.");
        assert_eq!(progressive.raw_text(), "[instant]Now.");
    }

    #[test]
    fn zero_ticks_per_character_reveals_one_per_update() {
        let mut progressive = text("ab", 0);

        progressive.update(&Monospace);

        assert_eq!(progressive.revealed_text(), "a");
    }
}
