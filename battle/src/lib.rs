#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battle state for the encounter engine.
//!
//! A [`Battle`] owns a stack of input states on top of a shared field of
//! enemies, HUD layers and timers. Adapters feed it one [`FrameContext`] per
//! frame and render it afterwards; everything it changes is reported as
//! [`BattleEvent`]s.

use std::time::Duration;

use battle_engine_core::{FrameInput, Key, Renderer, TextMetrics};

pub mod config;
mod enemy;
mod field;
mod hud;
mod states;

pub use hud::ActionButton;

use config::{EncounterConfig, EncounterError};
use field::Field;
use states::{BattleState, Transition};

/// Index of an enemy in the encounter roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(usize);

impl EnemyId {
    /// Wraps a roster index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in the roster.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Kind of a state on the battle stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// Choosing one of the action buttons.
    ButtonSelect,
    /// Choosing an item of a menu.
    MenuSelect,
    /// Timing a strike on the targeting bar.
    Target,
    /// Reading the result of an action.
    Narration,
    /// Dodging inside the shrunken battle box.
    Defending,
}

/// How an encounter ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Every enemy was defeated.
    Victory,
    /// Every enemy was spared or defeated, at least one spared.
    Spared,
    /// The player ran away.
    Fled,
}

/// Observable changes produced while updating a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BattleEvent {
    /// A state became the top of the stack.
    StatePushed {
        /// Kind of the new top state.
        state: StateKind,
    },
    /// The top state was removed.
    StatePopped {
        /// Kind of the removed state.
        state: StateKind,
    },
    /// The player moved the button highlight.
    ButtonSelected {
        /// Newly highlighted button.
        button: ActionButton,
    },
    /// A strike landed.
    EnemyStruck {
        /// Struck enemy.
        enemy: EnemyId,
        /// Damage dealt.
        power: i32,
        /// Health after the strike, possibly negative.
        health: i32,
    },
    /// An enemy ran out of health.
    EnemyDefeated {
        /// Defeated enemy.
        enemy: EnemyId,
    },
    /// An enemy was spared.
    EnemySpared {
        /// Spared enemy.
        enemy: EnemyId,
    },
    /// The player consumed a healing item.
    PlayerHealed {
        /// Item name.
        item: String,
        /// Health actually restored.
        restored: i32,
        /// Health after healing.
        health: i32,
    },
    /// A defending turn finished and a new round began.
    TurnStarted {
        /// Round counter, starting at one for the first completed turn.
        round: u32,
    },
    /// The encounter ended.
    OutcomeReached {
        /// How it ended.
        outcome: Outcome,
    },
}

/// Everything a battle reads during one frame.
#[derive(Debug)]
pub struct FrameContext<'a, M: ?Sized> {
    /// Time elapsed since the previous frame.
    pub delta: Duration,
    /// Keys pressed and held during the frame.
    pub input: &'a FrameInput,
    /// Text measurement used for layout.
    pub metrics: &'a M,
}

impl<'a, M: ?Sized> FrameContext<'a, M> {
    /// Bundles one frame's inputs.
    #[must_use]
    pub fn new(delta: Duration, input: &'a FrameInput, metrics: &'a M) -> Self {
        Self {
            delta,
            input,
            metrics,
        }
    }
}

/// A running encounter.
pub struct Battle {
    stack: Vec<BattleState>,
    field: Field,
}

impl std::fmt::Debug for Battle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Battle")
            .field("stack", &query::stack(self))
            .field("round", &self.field.round)
            .field("outcome", &self.field.outcome)
            .finish_non_exhaustive()
    }
}

impl Battle {
    /// Starts an encounter with `ButtonSelect` as the only state.
    pub fn new(config: &EncounterConfig) -> Result<Self, EncounterError> {
        config.validate()?;
        let defend_duration = config.timing.defend_duration()?;
        tracing::debug!(enemies = config.enemies.len(), "battle started");
        Ok(Self {
            stack: vec![BattleState::root()],
            field: Field::new(config, defend_duration),
        })
    }

    /// Advances the battle by one frame.
    ///
    /// Interpolations advance first, then pressed keys are routed to the top
    /// state one at a time, then the top state and the enemies update.
    pub fn update<M: TextMetrics + ?Sized>(
        &mut self,
        ctx: &FrameContext<'_, M>,
        out_events: &mut Vec<BattleEvent>,
    ) {
        self.field.interpolator.advance(ctx.delta);

        for &key in &ctx.input.pressed {
            self.route_key(key, ctx.metrics, out_events);
        }

        self.field.text.update(ctx.metrics);

        if let Some(top) = self.stack.last_mut() {
            let transition = top.update(ctx, &mut self.field, out_events);
            self.apply_transition(transition, out_events);
        }

        let transition = self.field.update_enemies(out_events);
        self.apply_transition(transition, out_events);
        self.field.update_targeting(ctx.delta);
    }

    fn route_key<M: TextMetrics + ?Sized>(
        &mut self,
        key: Key,
        metrics: &M,
        out_events: &mut Vec<BattleEvent>,
    ) {
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        // After the outcome only the closing narration still listens.
        if self.field.outcome.is_some() && top.kind() != StateKind::Narration {
            return;
        }
        let transition = top.handle_input(key, &mut self.field, metrics, out_events);
        self.apply_transition(transition, out_events);
    }

    fn apply_transition(&mut self, transition: Transition, out_events: &mut Vec<BattleEvent>) {
        match transition {
            Transition::Stay => {}
            Transition::Push(state) => {
                let kind = state.kind();
                tracing::debug!(state = ?kind, depth = self.stack.len() + 1, "state pushed");
                self.stack.push(state);
                out_events.push(BattleEvent::StatePushed { state: kind });
            }
            Transition::Pop => {
                if self.stack.len() > 1 {
                    self.pop_state(out_events);
                    self.resume_top();
                }
            }
            Transition::Unwind => {
                while self.stack.len() > 1 {
                    self.pop_state(out_events);
                }
                self.resume_top();
            }
        }
    }

    fn pop_state(&mut self, out_events: &mut Vec<BattleEvent>) {
        if let Some(state) = self.stack.pop() {
            let kind = state.kind();
            tracing::debug!(state = ?kind, depth = self.stack.len(), "state popped");
            out_events.push(BattleEvent::StatePopped { state: kind });
        }
    }

    fn resume_top(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            top.resume(&mut self.field);
        }
    }

    /// Draws the current frame. Performs no mutation.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        self.field.render_base(renderer);
        let Some(top) = self.stack.last() else {
            return;
        };
        top.render(&self.field, renderer);
        if top.show_soul() && self.field.outcome.is_none() {
            self.field.soul.render(renderer);
        }
    }

    /// Starts a strike of `power` on `enemy` as if the targeting bar stopped.
    ///
    /// Returns `false` for unknown, defeated or spared enemies and while a
    /// strike on the enemy is still running.
    pub fn strike(&mut self, enemy: EnemyId, power: i32) -> bool {
        self.field.strike(enemy, power)
    }

    /// Returns whether an outcome was reached.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.field.outcome.is_some()
    }

    /// Outcome of the encounter, if it ended.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.field.outcome
    }
}

/// Read-only views of a battle for adapters and tests.
pub mod query {
    use battle_engine_core::Rect;
    use glam::Vec2;

    use super::{ActionButton, Battle, EnemyId, Outcome, StateKind};
    use battle_engine_system_menu::MenuEntry;

    /// Kind of the state receiving input.
    #[must_use]
    pub fn active_state(battle: &Battle) -> StateKind {
        battle
            .stack
            .last()
            .map_or(StateKind::ButtonSelect, |state| state.kind())
    }

    /// Kinds of every stacked state, bottom first.
    #[must_use]
    pub fn stack(battle: &Battle) -> Vec<StateKind> {
        battle.stack.iter().map(|state| state.kind()).collect()
    }

    /// Button remembered by the root state.
    #[must_use]
    pub fn selected_button(battle: &Battle) -> Option<ActionButton> {
        battle
            .stack
            .first()
            .and_then(|state| state.as_button_select())
            .map(|state| state.selected())
    }

    /// Read-only view of an enemy.
    #[derive(Clone, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Roster index.
        pub id: EnemyId,
        /// Display name.
        pub name: String,
        /// Current, possibly shaken, position.
        pub position: Vec2,
        /// Health, possibly negative after an overkill.
        pub health: i32,
        /// Health at the start of the encounter.
        pub max_health: i32,
        /// Value shown by the health gauge.
        pub displayed_health: f32,
        /// Whether Spare would succeed.
        pub spareable: bool,
        /// Whether the enemy ran out of health.
        pub defeated: bool,
        /// Whether the enemy was spared.
        pub spared: bool,
        /// Whether a strike sequence is running.
        pub being_attacked: bool,
        /// Whether the health gauge is drawn.
        pub health_bar_visible: bool,
    }

    /// Snapshots of every enemy in roster order.
    #[must_use]
    pub fn enemies(battle: &Battle) -> Vec<EnemySnapshot> {
        (0..battle.field.enemies.len())
            .filter_map(|index| enemy(battle, EnemyId::new(index)))
            .collect()
    }

    /// Snapshot of one enemy.
    #[must_use]
    pub fn enemy(battle: &Battle, id: EnemyId) -> Option<EnemySnapshot> {
        battle.field.enemy(id).map(|enemy| EnemySnapshot {
            id,
            name: enemy.name().to_owned(),
            position: enemy.position(),
            health: enemy.health(),
            max_health: enemy.max_health(),
            displayed_health: enemy.displayed_health(),
            spareable: enemy.is_spareable(),
            defeated: enemy.is_defeated(),
            spared: enemy.is_spared(),
            being_attacked: enemy.is_being_attacked(),
            health_bar_visible: enemy.health_bar_visible(),
        })
    }

    /// Read-only view of the player.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct PlayerSnapshot {
        /// Display name.
        pub name: String,
        /// Love level.
        pub level: u32,
        /// Current health.
        pub health: i32,
        /// Maximum health.
        pub max_health: i32,
        /// Names of the remaining items.
        pub items: Vec<String>,
    }

    /// Snapshot of the player.
    #[must_use]
    pub fn player(battle: &Battle) -> PlayerSnapshot {
        let player = &battle.field.player;
        PlayerSnapshot {
            name: player.name.clone(),
            level: player.level,
            health: player.health,
            max_health: player.max_health,
            items: player.items.iter().map(|item| item.name.clone()).collect(),
        }
    }

    /// Outcome of the encounter, if it ended.
    #[must_use]
    pub fn outcome(battle: &Battle) -> Option<Outcome> {
        battle.field.outcome
    }

    /// Encounter text template currently shown.
    #[must_use]
    pub fn encounter_text(battle: &Battle) -> &str {
        battle.field.text.raw_text()
    }

    /// Part of the encounter text revealed so far, without commands.
    #[must_use]
    pub fn revealed_text(battle: &Battle) -> &str {
        battle.field.text.revealed_text()
    }

    /// Returns whether the encounter text is fully revealed.
    #[must_use]
    pub fn text_finished(battle: &Battle) -> bool {
        battle.field.text.is_finished()
    }

    /// Read-only view of the soul.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct SoulSnapshot {
        /// Top-left corner.
        pub position: Vec2,
        /// Rotation in degrees.
        pub rotation: f32,
        /// Whether the soul is drawn this frame.
        pub visible: bool,
    }

    /// Snapshot of the soul.
    #[must_use]
    pub fn soul(battle: &Battle) -> SoulSnapshot {
        let visible = battle.field.outcome.is_none()
            && battle.stack.last().is_some_and(|state| state.show_soul());
        SoulSnapshot {
            position: battle.field.soul.position,
            rotation: battle.field.soul.rotation,
            visible,
        }
    }

    /// Current outer rectangle of the battle box.
    #[must_use]
    pub fn battle_box(battle: &Battle) -> Rect {
        battle.field.battle_box.rect()
    }

    /// Read-only view of the open menu.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct MenuView {
        /// Menu title.
        pub title: String,
        /// Text of every item.
        pub items: Vec<String>,
        /// Which items open a sub-menu.
        pub submenus: Vec<bool>,
        /// Selected item index.
        pub selected_index: usize,
        /// One-indexed page holding the selection.
        pub current_page: usize,
        /// Number of pages.
        pub page_count: usize,
    }

    /// View of the menu receiving input, if the top state is a menu.
    #[must_use]
    pub fn menu(battle: &Battle) -> Option<MenuView> {
        let container = battle.stack.last()?.as_menu_select()?.container();
        let menu = container.menu();
        Some(MenuView {
            title: menu.title().to_owned(),
            items: menu.items().iter().map(|item| item.text().to_owned()).collect(),
            submenus: menu
                .items()
                .iter()
                .map(|item| matches!(item.entry(), MenuEntry::Submenu(_)))
                .collect(),
            selected_index: menu.selected_index(),
            current_page: container.current_page(),
            page_count: container.page_count(),
        })
    }

    /// Number of completed defending turns.
    #[must_use]
    pub fn round(battle: &Battle) -> u32 {
        battle.field.round
    }

    /// Read-only view of the targeting bar.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct TargetingSnapshot {
        /// Current bar rectangle.
        pub bar: Rect,
        /// Cursor x coordinate.
        pub cursor_x: f32,
        /// Bar opacity.
        pub alpha: u8,
        /// Whether the cursor still moves.
        pub active: bool,
    }

    /// Snapshot of the targeting bar while it is shown.
    #[must_use]
    pub fn targeting(battle: &Battle) -> Option<TargetingSnapshot> {
        battle
            .field
            .targeting
            .as_ref()
            .map(|targeting| TargetingSnapshot {
                bar: targeting.bar(),
                cursor_x: targeting.cursor_x(),
                alpha: targeting.alpha(),
                active: targeting.is_active(),
            })
    }
}
