//! Always-on layers: action buttons, player stats, the battle box and the soul.

use std::{cell::RefCell, rc::Rc, time::Duration};

use battle_engine_core::{Color, FontKey, ImageKey, Rect, Renderer, TextParams};
use battle_engine_system_interpolation::{Easing, Interpolation, Interpolator};
use battle_engine_system_menu::CursorIndicator;
use glam::Vec2;

use crate::config::{ItemConfig, PlayerConfig};

/// Size of an action button image.
pub(crate) const BUTTON_SIZE: Vec2 = Vec2::new(110.0, 42.0);
/// Distance of the button row from the bottom of the screen.
const BUTTON_BOTTOM_OFFSET: f32 = 47.0;
/// Edge length of the soul image.
pub(crate) const SOUL_SIZE: f32 = 16.0;
/// Soul movement per update tick while defending.
pub(crate) const SOUL_SPEED: f32 = 5.0;
/// Soul rotation per update tick, in degrees.
pub(crate) const SOUL_ROTATION_STEP: f32 = 5.0;
/// Time the battle box takes to change shape.
pub(crate) const BOX_TRANSITION: Duration = Duration::from_millis(300);

const BOX_BORDER: f32 = 5.0;
const STATS_FONT_SIZE: u16 = 15;
const STATS_TEXT_OFFSET: f32 = 6.0;
const HP_BAR_OFFSET: f32 = 250.0;
const HP_BAR_HEIGHT: f32 = 21.0;
const GRADIENT_BLOCKS: u8 = 6;
const GRADIENT_ALPHA: u8 = 25;

/// The four action buttons, left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionButton {
    /// Attack an enemy.
    Fight,
    /// Interact with an enemy.
    Act,
    /// Use an inventory item.
    Item,
    /// Spare an enemy or flee.
    Mercy,
}

impl ActionButton {
    /// Buttons in display order.
    pub const ALL: [Self; 4] = [Self::Fight, Self::Act, Self::Item, Self::Mercy];

    /// Button at `index`, wrapping around the row.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    fn asset_stem(self) -> &'static str {
        match self {
            Self::Fight => "fight",
            Self::Act => "act",
            Self::Item => "item",
            Self::Mercy => "mercy",
        }
    }

    fn image(self, active: bool) -> ImageKey {
        ImageKey::new(format!(
            "battle/button/{}{}",
            self.asset_stem(),
            u8::from(active)
        ))
    }
}

/// Horizontal spacing that distributes `count` buttons evenly across `screen_width`.
pub(crate) fn button_spacing(count: usize, screen_width: f32) -> f32 {
    let count = count as f32;
    (screen_width - count * BUTTON_SIZE.x) / (count + 1.0)
}

#[derive(Debug)]
pub(crate) struct ButtonRow {
    positions: Vec<Vec2>,
    active: Option<usize>,
}

impl ButtonRow {
    pub(crate) fn new(screen: Vec2) -> Self {
        let spacing = button_spacing(ActionButton::ALL.len(), screen.x);
        let y = screen.y - BUTTON_BOTTOM_OFFSET;
        let positions = (0..ActionButton::ALL.len())
            .map(|index| Vec2::new(spacing + (BUTTON_SIZE.x + spacing) * index as f32, y))
            .collect();
        Self {
            positions,
            active: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.positions.len()
    }

    pub(crate) fn set_active(&mut self, active: Option<usize>) {
        self.active = active;
    }

    /// Where the soul rests while `index` is highlighted.
    pub(crate) fn soul_anchor(&self, index: usize) -> Vec2 {
        let position = self.positions[index % self.positions.len()];
        Vec2::new(
            position.x + 10.0,
            position.y + BUTTON_SIZE.y / 2.0 - SOUL_SIZE / 2.0,
        )
    }

    pub(crate) fn render(&self, renderer: &mut dyn Renderer) {
        for (index, (button, position)) in ActionButton::ALL.iter().zip(&self.positions).enumerate()
        {
            let image = button.image(self.active == Some(index));
            renderer.draw_image(&image, *position, 0.0, 255);
        }
    }
}

/// Player statistics and inventory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Player {
    pub(crate) name: String,
    pub(crate) level: u32,
    pub(crate) health: i32,
    pub(crate) max_health: i32,
    pub(crate) items: Vec<ItemConfig>,
}

impl Player {
    pub(crate) fn from_config(config: &PlayerConfig) -> Self {
        Self {
            name: config.name.clone(),
            level: config.level,
            health: config.health.min(config.max_health),
            max_health: config.max_health,
            items: config.items.clone(),
        }
    }

    /// Consumes the item at `index`, returning it with the health actually restored.
    pub(crate) fn use_item(&mut self, index: usize) -> Option<(ItemConfig, i32)> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        let before = self.health;
        self.health = self.max_health.min(self.health.saturating_add(item.heal));
        let restored = self.health - before;
        Some((item, restored))
    }

    pub(crate) fn render(&self, renderer: &mut dyn Renderer, origin: Vec2) {
        let params = TextParams::new(STATS_FONT_SIZE, Color::WHITE).with_font(FontKey::UtHud);
        let text_y = origin.y - STATS_TEXT_OFFSET;
        renderer.draw_text(&self.name, params, Vec2::new(origin.x, text_y));
        renderer.draw_text(
            &format!("LV {}", self.level),
            params,
            Vec2::new(origin.x + 100.0, text_y),
        );

        let bar_x = origin.x + HP_BAR_OFFSET;
        let hp_label = ImageKey::new("battle/hp");
        let label_size = renderer.image_size(&hp_label);
        renderer.draw_image(
            &hp_label,
            Vec2::new(bar_x - label_size.x - 10.0, origin.y + 5.0),
            0.0,
            255,
        );

        let max = self.max_health as f32;
        let current = self.health.clamp(0, self.max_health) as f32;
        renderer.fill_rect(Rect::new(bar_x, origin.y, max, HP_BAR_HEIGHT), Color::DARK_RED);
        renderer.fill_rect(Rect::new(bar_x, origin.y, current, HP_BAR_HEIGHT), Color::YELLOW);
        renderer.draw_text(
            &format!("{} / {}", self.health, self.max_health),
            params,
            Vec2::new(bar_x + max + 10.0, text_y),
        );
    }
}

#[derive(Debug, Default)]
pub(crate) struct BoxGeometry {
    x: f32,
    width: f32,
}

fn box_x(geometry: &mut BoxGeometry) -> &mut f32 {
    &mut geometry.x
}

fn box_width(geometry: &mut BoxGeometry) -> &mut f32 {
    &mut geometry.width
}

/// Bordered arena. Its horizontal extent animates between the wide dialogue
/// shape and the square defending shape.
#[derive(Debug)]
pub(crate) struct BattleBox {
    home: Rect,
    geometry: Rc<RefCell<BoxGeometry>>,
}

impl BattleBox {
    pub(crate) fn new(home: Rect) -> Self {
        Self {
            home,
            geometry: Rc::new(RefCell::new(BoxGeometry {
                x: home.x,
                width: home.width,
            })),
        }
    }

    pub(crate) fn rect(&self) -> Rect {
        let geometry = self.geometry.borrow();
        Rect::new(geometry.x, self.home.y, geometry.width, self.home.height)
    }

    /// Area inside the border.
    pub(crate) fn inner_rect(&self) -> Rect {
        self.rect().inset(BOX_BORDER)
    }

    /// Inner area of the wide shape, used for text and menus.
    pub(crate) fn home_inner_rect(&self) -> Rect {
        self.home.inset(BOX_BORDER)
    }

    /// Square the box shrinks to while defending, centred on the wide shape.
    pub(crate) fn defending_rect(&self) -> Rect {
        let side = self.home.height.min(self.home.width);
        Rect::new(
            self.home.center().x - side / 2.0,
            self.home.y,
            side,
            self.home.height,
        )
    }

    pub(crate) fn animate_to(&self, target: Rect, interpolator: &mut Interpolator) {
        interpolator.add(Interpolation::towards(
            &self.geometry,
            box_x,
            target.x,
            BOX_TRANSITION,
            Easing::EaseOut,
        ));
        interpolator.add(Interpolation::towards(
            &self.geometry,
            box_width,
            target.width,
            BOX_TRANSITION,
            Easing::EaseOut,
        ));
    }

    pub(crate) fn home(&self) -> Rect {
        self.home
    }

    pub(crate) fn render(&self, renderer: &mut dyn Renderer) {
        let rect = self.rect();
        renderer.fill_rect(rect, Color::BLACK);
        renderer.draw_rect(rect, BOX_BORDER, Color::WHITE);
    }
}

/// Player-controlled heart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Soul {
    pub(crate) position: Vec2,
    pub(crate) rotation: f32,
}

impl Soul {
    pub(crate) fn new(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }

    pub(crate) fn translate(&mut self, direction: Vec2) {
        self.position += direction * SOUL_SPEED;
    }

    pub(crate) fn rotate(&mut self, degrees: f32) {
        self.rotation += degrees;
    }

    pub(crate) fn clamp_to(&mut self, area: Rect) {
        self.position = area.clamp_box(self.position, Vec2::splat(SOUL_SIZE));
    }

    pub(crate) fn center_in(&mut self, area: Rect) {
        self.position = area.center() - Vec2::splat(SOUL_SIZE / 2.0);
    }

    pub(crate) fn render(&self, renderer: &mut dyn Renderer) {
        renderer.draw_image(&ImageKey::new("battle/soul"), self.position, self.rotation, 255);
    }
}

/// Points the soul at menu items, vertically centred on the item's line.
pub(crate) struct SoulPointer<'a> {
    pub(crate) soul: &'a mut Soul,
    pub(crate) line_height: f32,
}

impl CursorIndicator for SoulPointer<'_> {
    fn move_to(&mut self, position: Vec2) {
        self.soul.position = position + Vec2::new(0.0, (self.line_height - SOUL_SIZE) / 2.0);
    }
}

/// Translucent bands fading in towards the bottom half of the screen.
pub(crate) fn render_backdrop(renderer: &mut dyn Renderer, screen: Vec2) {
    let max_height = screen.y / 2.0;
    let block_height = max_height / f32::from(GRADIENT_BLOCKS);
    let color = Color::WHITE.with_alpha(GRADIENT_ALPHA);
    for index in 0..GRADIENT_BLOCKS {
        let y = screen.y - max_height + block_height * (f32::from(index) + 1.0);
        renderer.fill_rect(Rect::new(0.0, y, screen.x, screen.y / 2.0), color);
    }
}
