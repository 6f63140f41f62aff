//! Encounter description loaded from TOML.

use std::time::Duration;

use battle_engine_core::Rect;
use battle_engine_system_text::{parse_strict, TemplateError};
use serde::Deserialize;
use thiserror::Error;

/// Everything needed to start a battle.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncounterConfig {
    /// Player statistics and inventory.
    pub player: PlayerConfig,
    /// Enemy roster in display order.
    pub enemies: Vec<EnemyConfig>,
    /// Encounter text.
    pub text: TextConfig,
    /// Turn timing.
    pub timing: TimingConfig,
    /// Enemy and item menu layout.
    pub menu: MenuConfig,
    /// Battle box placement.
    pub arena: ArenaConfig,
}

impl Default for EncounterConfig {
    /// Demo encounter against a single skeleton.
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            enemies: vec![EnemyConfig::default()],
            text: TextConfig::default(),
            timing: TimingConfig::default(),
            menu: MenuConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}

/// Player statistics shown in the status bar.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Display name.
    pub name: String,
    /// Love level.
    pub level: u32,
    /// Starting health.
    pub health: i32,
    /// Maximum health.
    pub max_health: i32,
    /// Consumable items in inventory order.
    pub items: Vec<ItemConfig>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: "Chara".to_owned(),
            level: 19,
            health: 90,
            max_health: 92,
            items: vec![
                ItemConfig::new("Butterscotch Pie", 99),
                ItemConfig::new("Snowman Piece", 45),
                ItemConfig::new("Bandage", 10),
            ],
        }
    }
}

/// Healing item.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemConfig {
    /// Display name.
    pub name: String,
    /// Health restored on use.
    pub heal: i32,
}

impl ItemConfig {
    /// Creates a healing item.
    #[must_use]
    pub fn new(name: impl Into<String>, heal: i32) -> Self {
        Self {
            name: name.into(),
            heal,
        }
    }
}

/// One enemy of the roster.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnemyConfig {
    /// Display name.
    pub name: String,
    /// Image handle of the enemy sprite.
    pub sprite: String,
    /// Top-left corner of the sprite.
    pub position: [f32; 2],
    /// Maximum and starting health.
    pub max_health: i32,
    /// Description shown by the `Check` act.
    #[serde(default)]
    pub check: String,
    /// Whether the enemy can be spared from the start.
    #[serde(default)]
    pub spareable: bool,
    /// Additional acts offered after `Check`.
    #[serde(default)]
    pub acts: Vec<ActConfig>,
}

/// Act offered for an enemy.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActConfig {
    /// Menu label.
    pub name: String,
    /// Text shown when the act is performed.
    pub response: String,
    /// Whether performing the act lets the enemy be spared.
    #[serde(default)]
    pub makes_spareable: bool,
}

/// Encounter text settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    /// Text shown when the battle starts.
    pub intro: String,
    /// Flavor text shown at the start of each later turn, cycled.
    pub rounds: Vec<String>,
    /// Update ticks spent on each revealed character.
    pub ticks_per_character: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            intro: "[asterisk]Papyrus blocks the way! This is a very long sentence to test \
                    out the automatic line break that should work here."
                .to_owned(),
            rounds: vec![
                "[asterisk]Now prepare to die...".to_owned(),
                "[asterisk]Papyrus is [color:FFFF00]preparing a bone attack[color:FFFFFF]."
                    .to_owned(),
                "[asterisk]Smells like bones.".to_owned(),
            ],
            ticks_per_character: 2,
        }
    }
}

/// Turn timing.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Length of the defending phase in seconds.
    pub defend_seconds: f32,
}

impl TimingConfig {
    /// Length of the defending phase.
    ///
    /// Fails for non-positive, non-finite or unrepresentably long times.
    pub fn defend_duration(&self) -> Result<Duration, EncounterError> {
        let seconds = self.defend_seconds;
        match Duration::try_from_secs_f32(seconds) {
            Ok(duration) if !duration.is_zero() => Ok(duration),
            _ => Err(EncounterError::InvalidDefendTime { seconds }),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            defend_seconds: 3.0,
        }
    }
}

/// Layout of the menus opened from the action buttons.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MenuConfig {
    /// Number of item columns.
    pub columns: usize,
    /// Vertical gap between rows.
    pub item_spacing: f32,
    /// Font size of item text.
    pub font_size: u16,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            columns: 2,
            item_spacing: 5.0,
            font_size: 27,
        }
    }
}

/// Placement of the battle box.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width including the border.
    pub width: f32,
    /// Height including the border.
    pub height: f32,
}

impl ArenaConfig {
    /// Battle box rectangle.
    #[must_use]
    pub const fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            x: 33.0,
            y: 249.0,
            width: 575.0,
            height: 140.0,
        }
    }
}

/// Reasons an encounter cannot be started.
#[derive(Debug, Error)]
pub enum EncounterError {
    /// The TOML document is malformed or does not match the schema.
    #[error("failed to parse encounter")]
    Parse(#[from] toml::de::Error),
    /// The roster is empty.
    #[error("encounter has no enemies")]
    NoEnemies,
    /// An enemy would start defeated.
    #[error("enemy `{enemy}` must have positive max health, got {max_health}")]
    NonPositiveMaxHealth {
        /// Enemy name.
        enemy: String,
        /// Configured max health.
        max_health: i32,
    },
    /// The player has no health pool.
    #[error("player max health must be positive, got {max_health}")]
    NonPositivePlayerHealth {
        /// Configured max health.
        max_health: i32,
    },
    /// The player would start dead or above full health.
    #[error("player health must lie in 0..={max_health}, got {health}")]
    PlayerHealthOutOfRange {
        /// Configured starting health.
        health: i32,
        /// Configured max health.
        max_health: i32,
    },
    /// An item would drain health instead of restoring it.
    #[error("item `{item}` must not heal a negative amount, got {heal}")]
    NegativeHeal {
        /// Item name.
        item: String,
        /// Configured heal amount.
        heal: i32,
    },
    /// Text would never reveal.
    #[error("ticks per character must be at least one")]
    ZeroTicksPerCharacter,
    /// Menus would have nowhere to place items.
    #[error("menu columns must be at least one")]
    ZeroColumns,
    /// The defending phase would never end or never start.
    #[error("defend time must be positive and finite, got {seconds}")]
    InvalidDefendTime {
        /// Configured seconds.
        seconds: f32,
    },
    /// The battle box has no area.
    #[error("battle box must have positive size, got {width}x{height}")]
    NonPositiveBoxSize {
        /// Configured width.
        width: f32,
        /// Configured height.
        height: f32,
    },
    /// A text field contains a malformed inline command.
    #[error("invalid text in {field}")]
    InvalidText {
        /// Location of the text in the encounter.
        field: String,
        /// Tokenizer failure.
        #[source]
        source: TemplateError,
    },
}

impl EncounterConfig {
    /// Parses and validates an encounter from TOML.
    pub fn from_toml_str(document: &str) -> Result<Self, EncounterError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every invariant the battle relies on.
    pub fn validate(&self) -> Result<(), EncounterError> {
        if self.enemies.is_empty() {
            return Err(EncounterError::NoEnemies);
        }
        if let Some(enemy) = self.enemies.iter().find(|enemy| enemy.max_health <= 0) {
            return Err(EncounterError::NonPositiveMaxHealth {
                enemy: enemy.name.clone(),
                max_health: enemy.max_health,
            });
        }
        if self.player.max_health <= 0 {
            return Err(EncounterError::NonPositivePlayerHealth {
                max_health: self.player.max_health,
            });
        }
        if !(0..=self.player.max_health).contains(&self.player.health) {
            return Err(EncounterError::PlayerHealthOutOfRange {
                health: self.player.health,
                max_health: self.player.max_health,
            });
        }
        if let Some(item) = self.player.items.iter().find(|item| item.heal < 0) {
            return Err(EncounterError::NegativeHeal {
                item: item.name.clone(),
                heal: item.heal,
            });
        }
        if self.text.ticks_per_character == 0 {
            return Err(EncounterError::ZeroTicksPerCharacter);
        }
        if self.menu.columns == 0 {
            return Err(EncounterError::ZeroColumns);
        }
        let _ = self.timing.defend_duration()?;
        if self.arena.width <= 0.0 || self.arena.height <= 0.0 {
            return Err(EncounterError::NonPositiveBoxSize {
                width: self.arena.width,
                height: self.arena.height,
            });
        }

        check_text("text.intro", &self.text.intro)?;
        for (index, round) in self.text.rounds.iter().enumerate() {
            check_text(&format!("text.rounds[{index}]"), round)?;
        }
        for enemy in &self.enemies {
            check_text(&format!("{}.check", enemy.name), &enemy.check)?;
            for act in &enemy.acts {
                check_text(&format!("{}.{}", enemy.name, act.name), &act.response)?;
            }
        }
        Ok(())
    }
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            name: "Papyrus".to_owned(),
            sprite: "papyrus".to_owned(),
            position: [250.0, 20.0],
            max_health: 100,
            check: "[asterisk]PAPYRUS - ATK 8 DEF 2\n[asterisk]He likes to say: \"Nyeh heh heh!\""
                .to_owned(),
            spareable: false,
            acts: vec![
                ActConfig {
                    name: "Flirt".to_owned(),
                    response: "[asterisk]You flirt with Papyrus.\n[asterisk]He seems flattered."
                        .to_owned(),
                    makes_spareable: true,
                },
                ActConfig {
                    name: "Insult".to_owned(),
                    response: "[asterisk]You call Papyrus a lazybones.\n[asterisk]He takes it \
                               as a compliment."
                        .to_owned(),
                    makes_spareable: false,
                },
            ],
        }
    }
}

fn check_text(field: &str, text: &str) -> Result<(), EncounterError> {
    let _ = parse_strict(text).map_err(|source| EncounterError::InvalidText {
        field: field.to_owned(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_encounter_is_valid() {
        let config = EncounterConfig::default();

        config.validate().expect("default encounter validates");
        assert_eq!(config.enemies.len(), 1);
        assert_eq!(config.enemies[0].position, [250.0, 20.0]);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = EncounterConfig::from_toml_str(
            r#"
            [[enemies]]
            name = "Froggit"
            sprite = "froggit"
            position = [280.0, 60.0]
            max_health = 30
            "#,
        )
        .expect("minimal encounter parses");

        assert_eq!(config.enemies[0].name, "Froggit");
        assert!(config.enemies[0].acts.is_empty());
        assert_eq!(config.player, PlayerConfig::default());
        assert_eq!(config.menu.columns, 2);
    }

    #[test]
    fn empty_roster_is_rejected() {
        let error = EncounterConfig::from_toml_str("enemies = []").expect_err("no enemies");

        assert!(matches!(error, EncounterError::NoEnemies));
    }

    #[test]
    fn malformed_text_is_rejected_with_its_location() {
        let mut config = EncounterConfig::default();
        config.text.rounds.push("[colour:FF0000]oops".to_owned());

        let error = config.validate().expect_err("unknown command");

        match error {
            EncounterError::InvalidText { field, source } => {
                assert_eq!(field, "text.rounds[3]");
                assert!(matches!(source, TemplateError::UnknownKey { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut config = EncounterConfig::default();
        config.menu.columns = 0;
        assert!(matches!(config.validate(), Err(EncounterError::ZeroColumns)));

        let mut config = EncounterConfig::default();
        config.timing.defend_seconds = 0.0;
        assert!(matches!(
            config.validate(),
            Err(EncounterError::InvalidDefendTime { .. })
        ));

        let mut config = EncounterConfig::default();
        config.enemies[0].max_health = 0;
        assert!(matches!(
            config.validate(),
            Err(EncounterError::NonPositiveMaxHealth { .. })
        ));
    }

    #[test]
    fn defend_time_must_fit_a_duration() {
        for seconds in [-1.0, f32::NAN, f32::INFINITY, 1e30] {
            let mut config = EncounterConfig::default();
            config.timing.defend_seconds = seconds;

            assert!(
                matches!(
                    config.validate(),
                    Err(EncounterError::InvalidDefendTime { .. })
                ),
                "{seconds} should be rejected"
            );
        }

        assert_eq!(
            TimingConfig::default().defend_duration().expect("default fits"),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn player_health_must_lie_within_its_pool() {
        for health in [-7, 93] {
            let mut config = EncounterConfig::default();
            config.player.health = health;

            assert!(matches!(
                config.validate(),
                Err(EncounterError::PlayerHealthOutOfRange {
                    max_health: 92,
                    ..
                })
            ));
        }

        let mut config = EncounterConfig::default();
        config.player.health = 0;
        config.validate().expect("zero health is allowed");
    }

    #[test]
    fn draining_items_are_rejected() {
        let mut config = EncounterConfig::default();
        config.player.items.push(ItemConfig::new("Spider Cider", -500));

        match config.validate() {
            Err(EncounterError::NegativeHeal { item, heal }) => {
                assert_eq!(item, "Spider Cider");
                assert_eq!(heal, -500);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = EncounterConfig::from_toml_str("[player]\nmana = 3").expect_err("unknown field");

        assert!(matches!(error, EncounterError::Parse(_)));
    }
}
