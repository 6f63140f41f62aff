//! Greedy word-wrap layout of a partially revealed template.

use battle_engine_core::{Color, FontKey, TextMetrics};
use glam::Vec2;

use crate::template::{TextCommand, TextTemplate};

/// Prefix drawn in front of `[asterisk]` paragraphs.
const PARAGRAPH_PREFIX: &str = "* ";

/// Region text is laid out into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBox {
    /// Top-left corner of the first line.
    pub origin: Vec2,
    /// Width after which lines wrap.
    pub max_width: f32,
}

impl TextBox {
    /// Creates a text box.
    #[must_use]
    pub const fn new(origin: Vec2, max_width: f32) -> Self {
        Self { origin, max_width }
    }
}

/// Style in effect for a glyph after applying every command before it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphStyle {
    /// Fill color.
    pub color: Color,
    /// Font face.
    pub font: FontKey,
    /// Font size in pixels.
    pub size: u16,
    /// Extra horizontal advance after each glyph.
    pub spacing: f32,
}

impl GlyphStyle {
    /// Creates a style with no extra spacing.
    #[must_use]
    pub const fn new(color: Color, font: FontKey, size: u16) -> Self {
        Self {
            color,
            font,
            size,
            spacing: 0.0,
        }
    }

    fn apply(&mut self, command: TextCommand) {
        match command {
            TextCommand::Color(color) => self.color = color,
            TextCommand::Font(font) => self.font = font,
            TextCommand::Size(size) => self.size = size,
            TextCommand::CharSpacing(spacing) => self.spacing = spacing,
            TextCommand::Instant | TextCommand::Asterisk => {}
        }
    }
}

/// Glyph positioned on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    /// Character to draw.
    pub ch: char,
    /// Top-left corner of the glyph.
    pub position: Vec2,
    /// Style in effect for the glyph.
    pub style: GlyphStyle,
    /// Clean-text index the glyph was produced from, `None` for paragraph prefixes.
    pub source: Option<usize>,
}

/// Positioned glyphs for a revealed prefix of a template.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextLayout {
    glyphs: Vec<PlacedGlyph>,
    lines: usize,
}

impl TextLayout {
    /// Glyphs in draw order.
    #[must_use]
    pub fn glyphs(&self) -> &[PlacedGlyph] {
        &self.glyphs
    }

    /// Number of lines the glyphs occupy.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Glyph produced from clean-text `index`, if it is revealed and drawn.
    #[must_use]
    pub fn glyph_for(&self, index: usize) -> Option<&PlacedGlyph> {
        self.glyphs.iter().find(|glyph| glyph.source == Some(index))
    }
}

struct Cursor {
    x: f32,
    y: f32,
    line_height: f32,
    indent: f32,
    at_line_start: bool,
    lines: usize,
}

impl Cursor {
    fn break_line<M: TextMetrics + ?Sized>(&mut self, metrics: &M, style: &GlyphStyle) {
        self.y += self.line_height;
        self.x = self.indent;
        self.line_height = metrics.glyph_height(style.size, style.font);
        self.at_line_start = true;
        self.lines += 1;
    }
}

/// Lays out the first `revealed` characters of `template` inside `frame`.
///
/// Commands apply cumulatively from their index onward. Before a space is
/// placed the width of the following word is measured against the full text,
/// so a word never jumps lines while it is being revealed.
#[must_use]
pub fn layout<M: TextMetrics + ?Sized>(
    template: &TextTemplate,
    revealed: usize,
    frame: TextBox,
    base: GlyphStyle,
    metrics: &M,
) -> TextLayout {
    let chars = template.chars();
    let revealed = revealed.min(chars.len());
    let mut style = base;
    let mut glyphs = Vec::with_capacity(revealed);
    let mut cursor = Cursor {
        x: 0.0,
        y: 0.0,
        line_height: metrics.glyph_height(style.size, style.font),
        indent: 0.0,
        at_line_start: true,
        lines: usize::from(revealed > 0),
    };

    for (index, &ch) in chars[..revealed].iter().enumerate() {
        for &command in template.commands_at(index) {
            style.apply(command);
            if command == TextCommand::Asterisk {
                if !cursor.at_line_start {
                    cursor.indent = 0.0;
                    cursor.break_line(metrics, &style);
                }
                cursor.line_height = metrics.glyph_height(style.size, style.font);
                glyphs.push(PlacedGlyph {
                    ch: '*',
                    position: frame.origin + Vec2::new(0.0, cursor.y),
                    style,
                    source: None,
                });
                cursor.indent = metrics
                    .measure_text(PARAGRAPH_PREFIX, style.size, style.font)
                    .width;
                cursor.x = cursor.indent;
                cursor.at_line_start = false;
            }
        }

        match ch {
            '\n' => {
                cursor.break_line(metrics, &style);
                continue;
            }
            ' ' => {
                let next_word = word_width(&chars[index + 1..], &style, metrics);
                if !cursor.at_line_start && cursor.x + next_word > frame.max_width {
                    cursor.break_line(metrics, &style);
                    continue;
                }
            }
            _ => {}
        }

        if cursor.at_line_start {
            cursor.line_height = metrics.glyph_height(style.size, style.font);
        }
        glyphs.push(PlacedGlyph {
            ch,
            position: frame.origin + Vec2::new(cursor.x, cursor.y),
            style,
            source: Some(index),
        });
        cursor.x += char_width(ch, &style, metrics) + style.spacing;
        cursor.at_line_start = false;
    }

    TextLayout {
        glyphs,
        lines: cursor.lines,
    }
}

fn word_width<M: TextMetrics + ?Sized>(rest: &[char], style: &GlyphStyle, metrics: &M) -> f32 {
    rest.iter()
        .take_while(|ch| !matches!(ch, ' ' | '\n'))
        .map(|&ch| char_width(ch, style, metrics) + style.spacing)
        .sum()
}

fn char_width<M: TextMetrics + ?Sized>(ch: char, style: &GlyphStyle, metrics: &M) -> f32 {
    let mut buffer = [0; 4];
    metrics
        .measure_text(ch.encode_utf8(&mut buffer), style.size, style.font)
        .width
}
