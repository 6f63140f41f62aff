//! Stack states and the transitions they request.

use std::time::Duration;

use battle_engine_core::{Color, Key, Renderer, TextMetrics};
use battle_engine_system_menu::{CursorIndicator, Menu, MenuContainer, MenuEntry};
use glam::Vec2;

use crate::{
    field::{Field, MenuAction},
    hud::{ActionButton, SOUL_ROTATION_STEP},
    BattleEvent, EnemyId, FrameContext, StateKind,
};

/// Stack change requested by the top state. Applied before the next event is routed.
pub(crate) enum Transition {
    Stay,
    Push(BattleState),
    Pop,
    /// Pops everything above the root state.
    Unwind,
}

pub(crate) enum BattleState {
    ButtonSelect(ButtonSelect),
    MenuSelect(MenuSelect),
    Target(Target),
    Narration(Narration),
    Defending(Defending),
}

impl BattleState {
    pub(crate) fn root() -> Self {
        Self::ButtonSelect(ButtonSelect { selected: 0 })
    }

    pub(crate) fn kind(&self) -> StateKind {
        match self {
            Self::ButtonSelect(_) => StateKind::ButtonSelect,
            Self::MenuSelect(_) => StateKind::MenuSelect,
            Self::Target(_) => StateKind::Target,
            Self::Narration(_) => StateKind::Narration,
            Self::Defending(_) => StateKind::Defending,
        }
    }

    pub(crate) fn handle_input<M: TextMetrics + ?Sized>(
        &mut self,
        key: Key,
        field: &mut Field,
        metrics: &M,
        out_events: &mut Vec<BattleEvent>,
    ) -> Transition {
        match self {
            Self::ButtonSelect(state) => state.handle_input(key, field, metrics, out_events),
            Self::MenuSelect(state) => state.handle_input(key, field, metrics, out_events),
            Self::Target(state) => state.handle_input(key, field),
            Self::Narration(_) => Narration::handle_input(key, field),
            Self::Defending(_) => Transition::Stay,
        }
    }

    pub(crate) fn update<M: TextMetrics + ?Sized>(
        &mut self,
        ctx: &FrameContext<'_, M>,
        field: &mut Field,
        out_events: &mut Vec<BattleEvent>,
    ) -> Transition {
        match self {
            Self::Defending(state) => state.update(ctx, field, out_events),
            Self::ButtonSelect(_) | Self::MenuSelect(_) | Self::Target(_) | Self::Narration(_) => {
                Transition::Stay
            }
        }
    }

    pub(crate) fn render(&self, field: &Field, renderer: &mut dyn Renderer) {
        match self {
            Self::ButtonSelect(_) | Self::Narration(_) => field.text.draw(renderer),
            Self::MenuSelect(state) => state.container.render(renderer, Color::WHITE),
            Self::Target(_) | Self::Defending(_) => {}
        }
    }

    pub(crate) fn show_soul(&self) -> bool {
        match self {
            Self::ButtonSelect(_) | Self::MenuSelect(_) | Self::Defending(_) => true,
            Self::Target(_) | Self::Narration(_) => false,
        }
    }

    /// Called when the state becomes the top again. Restores what it shows
    /// without resetting its own progress.
    pub(crate) fn resume(&mut self, field: &mut Field) {
        match self {
            Self::ButtonSelect(state) => field.highlight_button(state.selected),
            Self::MenuSelect(state) => {
                let position = state.container.cursor_position();
                let line_height = state.container.layout().line_height;
                field.soul_pointer(line_height).move_to(position);
            }
            Self::Target(_) | Self::Narration(_) | Self::Defending(_) => {}
        }
    }

    pub(crate) fn as_button_select(&self) -> Option<&ButtonSelect> {
        match self {
            Self::ButtonSelect(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn as_menu_select(&self) -> Option<&MenuSelect> {
        match self {
            Self::MenuSelect(state) => Some(state),
            _ => None,
        }
    }
}

pub(crate) struct ButtonSelect {
    selected: usize,
}

impl ButtonSelect {
    pub(crate) fn selected(&self) -> ActionButton {
        ActionButton::from_index(self.selected)
    }

    fn handle_input<M: TextMetrics + ?Sized>(
        &mut self,
        key: Key,
        field: &mut Field,
        metrics: &M,
        out_events: &mut Vec<BattleEvent>,
    ) -> Transition {
        let count = field.buttons.len();
        match key {
            Key::Left => {
                self.selected = (self.selected + count - 1) % count;
                field.select_button(self.selected, out_events);
                Transition::Stay
            }
            Key::Right => {
                self.selected = (self.selected + 1) % count;
                field.select_button(self.selected, out_events);
                Transition::Stay
            }
            Key::Confirm => match field.open_menu(self.selected()) {
                Some(menu) => Transition::Push(MenuSelect::enter(menu, field, metrics)),
                None => Transition::Stay,
            },
            _ => Transition::Stay,
        }
    }
}

pub(crate) struct MenuSelect {
    container: MenuContainer<MenuAction>,
}

impl MenuSelect {
    fn enter<M: TextMetrics + ?Sized>(
        menu: Menu<MenuAction>,
        field: &mut Field,
        metrics: &M,
    ) -> BattleState {
        let mut container = field.menu_container(menu, metrics);
        let line_height = container.layout().line_height;
        container.select_item(0, &mut field.soul_pointer(line_height));
        BattleState::MenuSelect(Self { container })
    }

    pub(crate) fn container(&self) -> &MenuContainer<MenuAction> {
        &self.container
    }

    fn handle_input<M: TextMetrics + ?Sized>(
        &mut self,
        key: Key,
        field: &mut Field,
        metrics: &M,
        out_events: &mut Vec<BattleEvent>,
    ) -> Transition {
        let line_height = self.container.layout().line_height;
        match key {
            Key::Left => {
                self.container
                    .select_next_in_row(-1, &mut field.soul_pointer(line_height));
                Transition::Stay
            }
            Key::Right => {
                self.container
                    .select_next_in_row(1, &mut field.soul_pointer(line_height));
                Transition::Stay
            }
            Key::Up => {
                self.container
                    .select_next_in_column(-1, &mut field.soul_pointer(line_height));
                Transition::Stay
            }
            Key::Down => {
                self.container
                    .select_next_in_column(1, &mut field.soul_pointer(line_height));
                Transition::Stay
            }
            Key::Confirm => {
                let Some(item) = self.container.menu().selected_item() else {
                    return Transition::Stay;
                };
                match item.entry() {
                    MenuEntry::Action(action) => field.perform(*action, out_events),
                    MenuEntry::Submenu(submenu) => {
                        Transition::Push(Self::enter(submenu.clone(), field, metrics))
                    }
                }
            }
            Key::Cancel => Transition::Pop,
            Key::RotateLeft | Key::RotateRight => Transition::Stay,
        }
    }
}

pub(crate) struct Target {
    enemy: EnemyId,
}

impl Target {
    pub(crate) fn enter(enemy: EnemyId, field: &mut Field) -> BattleState {
        field.show_targeting(enemy);
        BattleState::Target(Self { enemy })
    }

    fn handle_input(&mut self, key: Key, field: &mut Field) -> Transition {
        if key != Key::Confirm {
            return Transition::Stay;
        }
        let Some(power) = field.stop_targeting() else {
            return Transition::Stay;
        };
        // Hit power never exceeds an eighth of max health, so it fits in i32.
        if field.strike(self.enemy, power.round() as i32) {
            return Transition::Stay;
        }
        tracing::warn!(enemy = self.enemy.index(), "strike refused, leaving the targeting bar");
        field.hide_targeting();
        Transition::Pop
    }
}

pub(crate) struct Narration;

impl Narration {
    pub(crate) fn enter() -> BattleState {
        BattleState::Narration(Self)
    }

    fn handle_input(key: Key, field: &mut Field) -> Transition {
        if key != Key::Confirm {
            return Transition::Stay;
        }
        if !field.text.is_finished() {
            field.text.skip();
            return Transition::Stay;
        }
        if field.outcome.is_some() {
            return Transition::Stay;
        }
        Transition::Push(Defending::enter(field))
    }
}

pub(crate) struct Defending {
    elapsed: Duration,
    duration: Duration,
}

impl Defending {
    pub(crate) fn enter(field: &mut Field) -> BattleState {
        field.begin_defending();
        BattleState::Defending(Self {
            elapsed: Duration::ZERO,
            duration: field.defend_duration,
        })
    }

    fn update<M: TextMetrics + ?Sized>(
        &mut self,
        ctx: &FrameContext<'_, M>,
        field: &mut Field,
        out_events: &mut Vec<BattleEvent>,
    ) -> Transition {
        let mut direction = Vec2::ZERO;
        let mut rotation = 0.0;
        for key in &ctx.input.held {
            match key {
                Key::Left => direction.x -= 1.0,
                Key::Right => direction.x += 1.0,
                Key::Up => direction.y -= 1.0,
                Key::Down => direction.y += 1.0,
                Key::RotateLeft => rotation -= SOUL_ROTATION_STEP,
                Key::RotateRight => rotation += SOUL_ROTATION_STEP,
                Key::Confirm | Key::Cancel => {}
            }
        }
        field.move_soul(direction, rotation);

        self.elapsed = self.elapsed.saturating_add(ctx.delta);
        if self.elapsed < self.duration {
            return Transition::Stay;
        }
        field.end_turn(out_events);
        Transition::Unwind
    }
}
