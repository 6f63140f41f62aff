//! Tokenizer for bracket-delimited inline text commands.
//!
//! A template interleaves plain text with commands of the form `[key:value]`
//! or `[key]`. Tokenizing strips every command from the text and records it
//! against the index of the first clean character it applies to. A doubled
//! bracket `[[` produces a literal `[`.

use std::collections::BTreeMap;

use battle_engine_core::{Color, FontKey};
use thiserror::Error;

/// Styling or behavior change that activates at a clean-text index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextCommand {
    /// Switches the fill color, `[color:RRGGBB]`.
    Color(Color),
    /// Switches the font face, `[font:UT-HUD]`.
    Font(FontKey),
    /// Switches the font size, `[size:20]`.
    Size(u16),
    /// Switches the extra spacing inserted after each character, `[char-spacing:2]`.
    CharSpacing(f32),
    /// Reveals the whole text as soon as it is set, `[instant]`.
    Instant,
    /// Starts a `* ` prefixed paragraph, `[asterisk]`.
    Asterisk,
}

/// Reasons a template is rejected by [`parse_strict`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `[` has no closing `]`.
    #[error("unterminated command starting at byte {offset}")]
    Unterminated {
        /// Byte offset of the opening bracket.
        offset: usize,
    },
    /// A command has no key, such as `[]` or `[:FF0000]`.
    #[error("empty command at byte {offset}")]
    EmptyKey {
        /// Byte offset of the opening bracket.
        offset: usize,
    },
    /// The command key is not recognised.
    #[error("unknown command `{key}`")]
    UnknownKey {
        /// Key as written in the template.
        key: String,
    },
    /// The command requires a value but none was given.
    #[error("command `{key}` requires a value")]
    MissingValue {
        /// Key as written in the template.
        key: String,
    },
    /// The command is a flag but a value was given.
    #[error("command `{key}` does not take a value")]
    UnexpectedValue {
        /// Key as written in the template.
        key: String,
    },
    /// The value could not be interpreted for the key.
    #[error("invalid value `{value}` for command `{key}`")]
    InvalidValue {
        /// Key as written in the template.
        key: String,
        /// Value as written in the template.
        value: String,
    },
}

/// Template with its commands stripped and indexed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextTemplate {
    clean: String,
    chars: Vec<char>,
    commands: BTreeMap<usize, Vec<TextCommand>>,
}

impl TextTemplate {
    /// Text with every command removed.
    #[must_use]
    pub fn clean_text(&self) -> &str {
        &self.clean
    }

    /// Characters of the clean text.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Number of characters in the clean text.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Returns whether the clean text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Commands activating at clean-text `index`, in template order.
    #[must_use]
    pub fn commands_at(&self, index: usize) -> &[TextCommand] {
        self.commands.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every recorded command keyed by clean-text index.
    #[must_use]
    pub fn commands(&self) -> &BTreeMap<usize, Vec<TextCommand>> {
        &self.commands
    }

    /// Returns whether the template carries the `instant` flag anywhere.
    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.commands
            .values()
            .flatten()
            .any(|command| matches!(command, TextCommand::Instant))
    }

    /// Byte length of the first `count` characters of the clean text.
    #[must_use]
    pub fn byte_offset(&self, count: usize) -> usize {
        self.clean
            .char_indices()
            .nth(count)
            .map_or(self.clean.len(), |(offset, _)| offset)
    }
}

/// Tokenizes a template, skipping malformed commands with a warning.
#[must_use]
pub fn parse(template: &str) -> TextTemplate {
    let (parsed, errors) = tokenize(template);
    for error in errors {
        tracing::warn!(%error, template, "ignoring malformed text command");
    }
    parsed
}

/// Tokenizes a template, rejecting the first malformed command.
pub fn parse_strict(template: &str) -> Result<TextTemplate, TemplateError> {
    let (parsed, errors) = tokenize(template);
    match errors.into_iter().next() {
        Some(error) => Err(error),
        None => Ok(parsed),
    }
}

fn tokenize(template: &str) -> (TextTemplate, Vec<TemplateError>) {
    let mut parsed = TextTemplate::default();
    let mut errors = Vec::new();
    let mut rest = template;
    let mut consumed = 0;

    while let Some(open) = rest.find('[') {
        push_literal(&mut parsed, &rest[..open]);
        let after_open = &rest[open + 1..];

        if let Some(escaped) = after_open.strip_prefix('[') {
            push_literal(&mut parsed, "[");
            consumed += open + 2;
            rest = escaped;
            continue;
        }

        let Some(close) = after_open.find(']') else {
            errors.push(TemplateError::Unterminated {
                offset: consumed + open,
            });
            push_literal(&mut parsed, &rest[open..]);
            return (parsed, errors);
        };

        match parse_command(&after_open[..close], consumed + open) {
            Ok(command) => parsed
                .commands
                .entry(parsed.chars.len())
                .or_default()
                .push(command),
            Err(error) => errors.push(error),
        }

        consumed += open + close + 2;
        rest = &after_open[close + 1..];
    }

    push_literal(&mut parsed, rest);
    (parsed, errors)
}

fn push_literal(parsed: &mut TextTemplate, literal: &str) {
    parsed.clean.push_str(literal);
    parsed.chars.extend(literal.chars());
}

fn parse_command(body: &str, offset: usize) -> Result<TextCommand, TemplateError> {
    let (key, value) = match body.split_once(':') {
        Some((key, value)) => (key.trim(), Some(value.trim())),
        None => (body.trim(), None),
    };
    if key.is_empty() {
        return Err(TemplateError::EmptyKey { offset });
    }

    let invalid = |value: &str| TemplateError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    };
    let required = || {
        value.ok_or_else(|| TemplateError::MissingValue {
            key: key.to_owned(),
        })
    };
    let flag = |command: TextCommand| match value {
        Some(_) => Err(TemplateError::UnexpectedValue {
            key: key.to_owned(),
        }),
        None => Ok(command),
    };

    match key.to_ascii_lowercase().as_str() {
        "color" => {
            let value = required()?;
            Color::from_hex(value)
                .map(TextCommand::Color)
                .ok_or_else(|| invalid(value))
        }
        "font" => {
            let value = required()?;
            FontKey::from_name(value)
                .map(TextCommand::Font)
                .ok_or_else(|| invalid(value))
        }
        "size" => {
            let value = required()?;
            match value.parse::<u16>() {
                Ok(size) if size > 0 => Ok(TextCommand::Size(size)),
                _ => Err(invalid(value)),
            }
        }
        "char-spacing" => {
            let value = required()?;
            match value.parse::<f32>() {
                Ok(spacing) if spacing.is_finite() => Ok(TextCommand::CharSpacing(spacing)),
                _ => Err(invalid(value)),
            }
        }
        "instant" => flag(TextCommand::Instant),
        "asterisk" => flag(TextCommand::Asterisk),
        _ => Err(TemplateError::UnknownKey {
            key: key.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_command_is_recorded_at_clean_index() {
        let parsed = parse_strict("A[color:FF0000]B").expect("template is valid");

        assert_eq!(parsed.clean_text(), "AB");
        assert_eq!(parsed.commands_at(1), &[TextCommand::Color(Color::RED)]);
        assert!(parsed.commands_at(0).is_empty());
    }

    #[test]
    fn adjacent_commands_share_an_index_in_order() {
        let parsed =
            parse_strict("[asterisk][font:UT-HUD][size:18]Hey").expect("template is valid");

        assert_eq!(parsed.clean_text(), "Hey");
        assert_eq!(
            parsed.commands_at(0),
            &[
                TextCommand::Asterisk,
                TextCommand::Font(FontKey::UtHud),
                TextCommand::Size(18),
            ]
        );
    }

    #[test]
    fn instant_flag_is_detected_anywhere() {
        let parsed = parse("Done.[instant]");

        assert!(parsed.is_instant());
        assert_eq!(parsed.len(), 5);
    }

    #[test]
    fn doubled_bracket_is_literal() {
        let parsed = parse_strict("[[x] marks").expect("template is valid");

        assert_eq!(parsed.clean_text(), "[x] marks");
        assert!(parsed.commands().is_empty());
    }

    #[test]
    fn strict_parse_rejects_malformed_commands() {
        assert_eq!(
            parse_strict("oops [color"),
            Err(TemplateError::Unterminated { offset: 5 })
        );
        assert_eq!(
            parse_strict("[]"),
            Err(TemplateError::EmptyKey { offset: 0 })
        );
        assert_eq!(
            parse_strict("[wobble]"),
            Err(TemplateError::UnknownKey {
                key: "wobble".to_owned()
            })
        );
        assert_eq!(
            parse_strict("[color:red]"),
            Err(TemplateError::InvalidValue {
                key: "color".to_owned(),
                value: "red".to_owned()
            })
        );
        assert_eq!(
            parse_strict("[size]"),
            Err(TemplateError::MissingValue {
                key: "size".to_owned()
            })
        );
        assert_eq!(
            parse_strict("[instant:yes]"),
            Err(TemplateError::UnexpectedValue {
                key: "instant".to_owned()
            })
        );
    }

    #[test]
    fn lenient_parse_drops_bad_commands_and_keeps_text() {
        let parsed = parse("a[wobble]b[color:00FF00]c [tail");

        assert_eq!(parsed.clean_text(), "abc [tail");
        assert_eq!(
            parsed.commands_at(2),
            &[TextCommand::Color(Color::from_rgb(0, 255, 0))]
        );
        assert_eq!(parsed.commands().len(), 1);
    }

    #[test]
    fn byte_offsets_respect_multibyte_characters() {
        let parsed = parse("h\u{e9}llo");

        assert_eq!(parsed.byte_offset(2), 3);
        assert_eq!(parsed.byte_offset(10), parsed.clean_text().len());
    }
}
