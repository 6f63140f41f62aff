//! Everything the states act on: enemies, player, HUD layers and timers.

use std::time::Duration;

use battle_engine_core::{Color, FontKey, Rect, Renderer, TextMetrics, DESIGN_RESOLUTION};
use battle_engine_system_interpolation::Interpolator;
use battle_engine_system_menu::{Menu, MenuContainer, MenuItem, MenuLayout};
use battle_engine_system_targeting::TargetUi;
use battle_engine_system_text::{GlyphStyle, ProgressiveText, TextBox};
use glam::Vec2;

use crate::{
    config::{EncounterConfig, MenuConfig},
    enemy::{Enemy, HitProgress},
    hud::{self, ActionButton, BattleBox, ButtonRow, Player, Soul, SoulPointer, SOUL_SIZE},
    states::{Defending, Narration, Target, Transition},
    BattleEvent, EnemyId, Outcome,
};

const TEXT_FONT_SIZE: u16 = 27;
const TEXT_MARGIN: f32 = 10.0;
const MENU_MARGIN: Vec2 = Vec2::new(20.0, 10.0);
const MENU_TEXT_INDENT: f32 = SOUL_SIZE + 14.0;
const STATS_ORIGIN: Vec2 = Vec2::new(40.0, DESIGN_RESOLUTION.y - 80.0);

/// Effect bound to a menu item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MenuAction {
    Attack(EnemyId),
    Check(EnemyId),
    Act { enemy: EnemyId, act: usize },
    UseItem(usize),
    Spare,
    Flee,
}

pub(crate) struct Field {
    pub(crate) buttons: ButtonRow,
    pub(crate) enemies: Vec<Enemy>,
    pub(crate) player: Player,
    pub(crate) soul: Soul,
    pub(crate) battle_box: BattleBox,
    pub(crate) text: ProgressiveText,
    pub(crate) interpolator: Interpolator,
    pub(crate) targeting: Option<TargetUi>,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) round: u32,
    pub(crate) defend_duration: Duration,
    rounds: Vec<String>,
    intro: String,
    menu: MenuConfig,
}

impl Field {
    pub(crate) fn new(config: &EncounterConfig, defend_duration: Duration) -> Self {
        let battle_box = BattleBox::new(config.arena.rect());
        let inner = battle_box.home_inner_rect();
        let text = ProgressiveText::new(
            &config.text.intro,
            TextBox::new(
                inner.origin() + Vec2::splat(TEXT_MARGIN),
                inner.width - 2.0 * TEXT_MARGIN,
            ),
            GlyphStyle::new(Color::WHITE, FontKey::DtmSans, TEXT_FONT_SIZE),
            config.text.ticks_per_character,
        );
        tracing::debug!(text = %config.text.intro, "encounter text set");

        let buttons = ButtonRow::new(DESIGN_RESOLUTION);
        let mut field = Self {
            soul: Soul::new(buttons.soul_anchor(0)),
            buttons,
            enemies: config.enemies.iter().map(Enemy::from_config).collect(),
            player: Player::from_config(&config.player),
            battle_box,
            text,
            interpolator: Interpolator::new(),
            targeting: None,
            outcome: None,
            round: 0,
            defend_duration,
            rounds: config.text.rounds.clone(),
            intro: config.text.intro.clone(),
            menu: config.menu,
        };
        field.highlight_button(0);
        field
    }

    pub(crate) fn set_text(&mut self, text: &str) {
        tracing::debug!(text, "encounter text set");
        self.text.set_text(text);
    }

    pub(crate) fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(id.index())
    }

    fn live_enemies(&self) -> impl Iterator<Item = (EnemyId, &Enemy)> + '_ {
        self.enemies
            .iter()
            .enumerate()
            .filter(|(_, enemy)| enemy.is_live())
            .map(|(index, enemy)| (EnemyId::new(index), enemy))
    }

    /// Highlights `index` and parks the soul on it without reporting a selection.
    pub(crate) fn highlight_button(&mut self, index: usize) {
        self.buttons.set_active(Some(index));
        self.soul.position = self.buttons.soul_anchor(index);
        self.soul.rotation = 0.0;
    }

    pub(crate) fn select_button(&mut self, index: usize, out_events: &mut Vec<BattleEvent>) {
        self.highlight_button(index);
        out_events.push(BattleEvent::ButtonSelected {
            button: ActionButton::from_index(index),
        });
    }

    pub(crate) fn soul_pointer(&mut self, line_height: f32) -> SoulPointer<'_> {
        SoulPointer {
            soul: &mut self.soul,
            line_height,
        }
    }

    /// Builds the menu behind `button`, or `None` when it would be empty.
    pub(crate) fn open_menu(&self, button: ActionButton) -> Option<Menu<MenuAction>> {
        let menu = match button {
            ActionButton::Fight => self.live_enemies().fold(Menu::new("Fight"), |menu, (id, enemy)| {
                menu.with_item(MenuItem::action(
                    format!("* {}", enemy.name()),
                    MenuAction::Attack(id),
                ))
            }),
            ActionButton::Act => self.live_enemies().fold(Menu::new("Act"), |menu, (id, enemy)| {
                let acts = enemy.acts().iter().enumerate().fold(
                    Menu::new(enemy.name())
                        .with_item(MenuItem::action("* Check", MenuAction::Check(id))),
                    |acts, (act, config)| {
                        acts.with_item(MenuItem::action(
                            format!("* {}", config.name),
                            MenuAction::Act { enemy: id, act },
                        ))
                    },
                );
                menu.with_item(MenuItem::submenu(format!("* {}", enemy.name()), acts))
            }),
            ActionButton::Item => self.player.items.iter().enumerate().fold(
                Menu::new("Item"),
                |menu, (index, item)| {
                    menu.with_item(MenuItem::action(
                        format!("* {}", item.name),
                        MenuAction::UseItem(index),
                    ))
                },
            ),
            ActionButton::Mercy => Menu::new("Mercy")
                .with_item(MenuItem::action("* Spare", MenuAction::Spare))
                .with_item(MenuItem::action("* Flee", MenuAction::Flee)),
        };
        (!menu.is_empty()).then_some(menu)
    }

    pub(crate) fn menu_container<M: TextMetrics + ?Sized>(
        &self,
        menu: Menu<MenuAction>,
        metrics: &M,
    ) -> MenuContainer<MenuAction> {
        let inner = self.battle_box.home_inner_rect();
        let rect = Rect::new(
            inner.x + MENU_MARGIN.x,
            inner.y + MENU_MARGIN.y,
            inner.width - 2.0 * MENU_MARGIN.x,
            inner.height - 2.0 * MENU_MARGIN.y,
        );
        let line_height = metrics.glyph_height(self.menu.font_size, FontKey::DtmSans);
        let layout = MenuLayout::new(rect, self.menu.font_size, line_height)
            .with_columns(self.menu.columns)
            .with_item_spacing(self.menu.item_spacing)
            .with_text_indent(MENU_TEXT_INDENT);
        MenuContainer::new(menu, layout)
    }

    /// Runs a confirmed menu action.
    pub(crate) fn perform(
        &mut self,
        action: MenuAction,
        out_events: &mut Vec<BattleEvent>,
    ) -> Transition {
        match action {
            MenuAction::Attack(id) => {
                if self.enemy(id).is_some_and(Enemy::is_live) {
                    Transition::Push(Target::enter(id, self))
                } else {
                    Transition::Stay
                }
            }
            MenuAction::Check(id) => {
                let Some(enemy) = self.enemy(id) else {
                    return Transition::Stay;
                };
                let text = if enemy.check().is_empty() {
                    format!("[asterisk]{} - No data.", enemy.name().to_uppercase())
                } else {
                    enemy.check().to_owned()
                };
                self.set_text(&text);
                Transition::Push(Narration::enter())
            }
            MenuAction::Act { enemy, act } => {
                let Some(target) = self.enemies.get_mut(enemy.index()) else {
                    return Transition::Stay;
                };
                let Some(config) = target.acts().get(act).cloned() else {
                    return Transition::Stay;
                };
                if config.makes_spareable {
                    target.make_spareable();
                }
                self.set_text(&config.response);
                Transition::Push(Narration::enter())
            }
            MenuAction::UseItem(index) => {
                let Some((item, restored)) = self.player.use_item(index) else {
                    return Transition::Stay;
                };
                let text = if self.player.health == self.player.max_health {
                    format!(
                        "[asterisk]You ate the {}.\n[asterisk]Your HP was maxed out.",
                        item.name
                    )
                } else {
                    format!(
                        "[asterisk]You ate the {}.\n[asterisk]You recovered {restored} HP!",
                        item.name
                    )
                };
                out_events.push(BattleEvent::PlayerHealed {
                    item: item.name,
                    restored,
                    health: self.player.health,
                });
                self.set_text(&text);
                Transition::Push(Narration::enter())
            }
            MenuAction::Spare => {
                let spared: Vec<EnemyId> = self
                    .live_enemies()
                    .filter(|(_, enemy)| enemy.is_spareable())
                    .map(|(id, _)| id)
                    .collect();
                for &id in &spared {
                    if let Some(enemy) = self.enemies.get_mut(id.index()) {
                        enemy.spare();
                    }
                    out_events.push(BattleEvent::EnemySpared { enemy: id });
                }
                match self.settled_outcome() {
                    Some(outcome) => self.reach_outcome(outcome, out_events),
                    None if spared.is_empty() => {
                        self.set_text("[asterisk]Nobody is ready to be spared.");
                    }
                    None => self.set_text("[asterisk]You spared an enemy."),
                }
                Transition::Push(Narration::enter())
            }
            MenuAction::Flee => {
                self.reach_outcome(Outcome::Fled, out_events);
                Transition::Push(Narration::enter())
            }
        }
    }

    pub(crate) fn show_targeting(&mut self, enemy: EnemyId) {
        let max_health = self.enemy(enemy).map_or(0, Enemy::max_health);
        self.targeting = Some(TargetUi::new(
            self.battle_box.home_inner_rect(),
            max_health,
        ));
    }

    pub(crate) fn stop_targeting(&mut self) -> Option<f32> {
        self.targeting.as_mut().and_then(TargetUi::stop)
    }

    pub(crate) fn hide_targeting(&mut self) {
        if let Some(targeting) = self.targeting.as_mut() {
            targeting.hide(&mut self.interpolator);
        }
    }

    /// Starts the strike sequence on `enemy`. Returns `false` when it cannot be struck.
    pub(crate) fn strike(&mut self, id: EnemyId, power: i32) -> bool {
        match self.enemies.get_mut(id.index()) {
            Some(enemy) if enemy.is_live() => {
                let started = enemy.hit(power);
                if started {
                    tracing::debug!(enemy = enemy.name(), power, "strike started");
                }
                started
            }
            _ => false,
        }
    }

    /// Advances every enemy's strike sequence and reacts to finished strikes.
    pub(crate) fn update_enemies(&mut self, out_events: &mut Vec<BattleEvent>) -> Transition {
        let mut resolved = Vec::new();
        for (index, enemy) in self.enemies.iter_mut().enumerate() {
            match enemy.update(&mut self.interpolator) {
                Some(HitProgress::Damaged { power, health }) => {
                    tracing::debug!(enemy = enemy.name(), power, health, "strike landed");
                    out_events.push(BattleEvent::EnemyStruck {
                        enemy: EnemyId::new(index),
                        power,
                        health,
                    });
                }
                Some(HitProgress::Resolved) => resolved.push(EnemyId::new(index)),
                None => {}
            }
        }
        if resolved.is_empty() {
            return Transition::Stay;
        }

        self.hide_targeting();
        for id in resolved {
            if let Some(enemy) = self.enemies.get_mut(id.index()) {
                if enemy.settle() {
                    tracing::debug!(enemy = enemy.name(), "enemy defeated");
                    out_events.push(BattleEvent::EnemyDefeated { enemy: id });
                }
            }
        }

        match self.settled_outcome() {
            Some(outcome) => {
                self.reach_outcome(outcome, out_events);
                Transition::Push(Narration::enter())
            }
            None => Transition::Push(Defending::enter(self)),
        }
    }

    /// Counts down the targeting bar and drops it once fully hidden.
    pub(crate) fn update_targeting(&mut self, delta: Duration) {
        if let Some(targeting) = self.targeting.as_mut() {
            targeting.update(delta);
            if !targeting.is_shown() {
                self.targeting = None;
            }
        }
    }

    /// Outcome implied by the roster, `None` while any enemy still fights.
    fn settled_outcome(&self) -> Option<Outcome> {
        if self.enemies.iter().any(Enemy::is_live) {
            return None;
        }
        if self.enemies.iter().all(Enemy::is_defeated) {
            Some(Outcome::Victory)
        } else {
            Some(Outcome::Spared)
        }
    }

    pub(crate) fn reach_outcome(&mut self, outcome: Outcome, out_events: &mut Vec<BattleEvent>) {
        if self.outcome.is_some() {
            return;
        }
        tracing::debug!(?outcome, "battle outcome reached");
        self.outcome = Some(outcome);
        self.buttons.set_active(None);
        let text = match outcome {
            Outcome::Victory => "[asterisk]YOU WON!\n[asterisk]You earned 0 EXP and 0 gold.",
            Outcome::Spared => "[asterisk]YOU WON!\n[asterisk]Nobody was hurt.",
            Outcome::Fled => "[asterisk]Escaped...",
        };
        self.set_text(text);
        out_events.push(BattleEvent::OutcomeReached { outcome });
    }

    pub(crate) fn begin_defending(&mut self) {
        self.buttons.set_active(None);
        let arena = self.battle_box.defending_rect();
        self.battle_box.animate_to(arena, &mut self.interpolator);
        self.soul.rotation = 0.0;
        self.soul.center_in(arena);
    }

    pub(crate) fn move_soul(&mut self, direction: Vec2, rotation: f32) {
        self.soul.translate(direction);
        self.soul.rotate(rotation);
        self.soul.clamp_to(self.battle_box.inner_rect());
    }

    /// Restores the box, advances the round counter and shows the next flavor text.
    pub(crate) fn end_turn(&mut self, out_events: &mut Vec<BattleEvent>) {
        self.battle_box
            .animate_to(self.battle_box.home(), &mut self.interpolator);
        self.round += 1;
        let text = match self.rounds.len() {
            0 => self.intro.clone(),
            count => {
                // Rounds start at one, so the first later turn shows the first entry.
                let index = (self.round as usize - 1) % count;
                self.rounds[index].clone()
            }
        };
        self.set_text(&text);
        tracing::debug!(round = self.round, "turn started");
        out_events.push(BattleEvent::TurnStarted { round: self.round });
    }

    /// Always-on layers drawn beneath the top state.
    pub(crate) fn render_base(&self, renderer: &mut dyn Renderer) {
        hud::render_backdrop(renderer, DESIGN_RESOLUTION);
        self.buttons.render(renderer);
        for enemy in &self.enemies {
            enemy.render(renderer);
        }
        self.player.render(renderer, STATS_ORIGIN);
        self.battle_box.render(renderer);
        if let Some(targeting) = &self.targeting {
            targeting.render(renderer);
        }
    }
}
