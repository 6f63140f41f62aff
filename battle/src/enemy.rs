//! Enemy state and the strike animation sequence.

use std::{cell::RefCell, rc::Rc, time::Duration};

use battle_engine_core::{Anchor, Color, FontKey, ImageKey, Rect, Renderer, TextParams};
use battle_engine_system_interpolation::{Easing, Interpolation, Interpolator};
use glam::Vec2;

use crate::config::{ActConfig, EnemyConfig};

/// Update ticks the slash animation plays before damage lands.
pub(crate) const HIT_VISUAL_FRAMES: u32 = 6;
/// Update ticks a strike shakes the enemy for.
pub(crate) const SHAKE_TICKS: u32 = 30;
/// Update ticks the health gauge stays visible after a strike.
pub(crate) const HEALTH_BAR_TICKS: u32 = 45;

const SHAKE_DECAY: f32 = 0.9;
const GAUGE_DURATION: Duration = Duration::from_millis(600);
const GAUGE_SIZE: Vec2 = Vec2::new(100.0, 13.0);
const GAUGE_BACKGROUND: Color = Color::from_rgb(64, 64, 64);
const GAUGE_FOREGROUND: Color = Color::from_rgb(0, 255, 0);
const DAMAGE_FONT_SIZE: u16 = 30;
const MISS_COLOR: Color = Color::from_rgb(192, 192, 192);

#[derive(Debug, Default)]
struct HealthGauge {
    displayed: f32,
}

fn gauge_value(gauge: &mut HealthGauge) -> &mut f32 {
    &mut gauge.displayed
}

/// What happened to an enemy during one update tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HitProgress {
    /// Damage landed and the shake started.
    Damaged {
        /// Damage dealt.
        power: i32,
        /// Health after the damage.
        health: i32,
    },
    /// The shake finished and the enemy is back at rest.
    Resolved,
}

#[derive(Clone, Copy, Debug)]
struct Shake {
    remaining: u32,
    speed: u32,
    since_flip: u32,
    sign: f32,
    magnitude: f32,
}

/// Enemy taking part in the battle.
#[derive(Debug)]
pub(crate) struct Enemy {
    name: String,
    sprite: ImageKey,
    position: Vec2,
    base_position: Vec2,
    rotation: f32,
    health: i32,
    max_health: i32,
    check: String,
    acts: Vec<ActConfig>,
    spareable: bool,
    defeated: bool,
    spared: bool,
    being_attacked: bool,
    pending_power: Option<i32>,
    hit_visual: Option<u32>,
    shake: Option<Shake>,
    health_bar_remaining: u32,
    last_damage: Option<i32>,
    gauge: Rc<RefCell<HealthGauge>>,
}

impl Enemy {
    pub(crate) fn from_config(config: &EnemyConfig) -> Self {
        let position = Vec2::from_array(config.position);
        Self {
            name: config.name.clone(),
            sprite: ImageKey::new(config.sprite.clone()),
            position,
            base_position: position,
            rotation: 0.0,
            health: config.max_health,
            max_health: config.max_health,
            check: config.check.clone(),
            acts: config.acts.clone(),
            spareable: config.spareable,
            defeated: false,
            spared: false,
            being_attacked: false,
            pending_power: None,
            hit_visual: None,
            shake: None,
            health_bar_remaining: 0,
            last_damage: None,
            gauge: Rc::new(RefCell::new(HealthGauge {
                displayed: config.max_health as f32,
            })),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn health(&self) -> i32 {
        self.health
    }

    pub(crate) fn max_health(&self) -> i32 {
        self.max_health
    }

    pub(crate) fn check(&self) -> &str {
        &self.check
    }

    pub(crate) fn acts(&self) -> &[ActConfig] {
        &self.acts
    }

    pub(crate) fn is_spareable(&self) -> bool {
        self.spareable
    }

    pub(crate) fn make_spareable(&mut self) {
        self.spareable = true;
    }

    pub(crate) fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub(crate) fn is_spared(&self) -> bool {
        self.spared
    }

    /// Still fighting: neither defeated nor spared.
    pub(crate) fn is_live(&self) -> bool {
        !self.defeated && !self.spared
    }

    pub(crate) fn is_being_attacked(&self) -> bool {
        self.being_attacked
    }

    pub(crate) fn health_bar_visible(&self) -> bool {
        self.health_bar_remaining > 0
    }

    pub(crate) fn displayed_health(&self) -> f32 {
        self.gauge.borrow().displayed
    }

    pub(crate) fn spare(&mut self) {
        self.spared = true;
    }

    /// Marks the enemy defeated once its health ran out.
    pub(crate) fn settle(&mut self) -> bool {
        if self.health <= 0 && !self.defeated {
            self.defeated = true;
            return true;
        }
        false
    }

    /// Starts the strike sequence. Ignored while a strike is in progress.
    pub(crate) fn hit(&mut self, power: i32) -> bool {
        if self.being_attacked {
            return false;
        }
        self.being_attacked = true;
        self.pending_power = Some(power.max(0));
        self.hit_visual = Some(0);
        true
    }

    /// Advances the strike sequence by one tick.
    pub(crate) fn update(&mut self, interpolator: &mut Interpolator) -> Option<HitProgress> {
        self.health_bar_remaining = self.health_bar_remaining.saturating_sub(1);
        if !self.being_attacked {
            return None;
        }

        if let Some(frame) = self.hit_visual {
            let frame = frame + 1;
            self.hit_visual = (frame < HIT_VISUAL_FRAMES).then_some(frame);
            return None;
        }

        if self.shake.is_none() {
            let power = self.pending_power.take()?;
            return Some(self.land(power, interpolator));
        }

        self.step_shake()
    }

    fn land(&mut self, power: i32, interpolator: &mut Interpolator) -> HitProgress {
        let ratio = (power as f32 / self.max_health as f32).min(1.0);
        // Ratio lies in 0..=1, so the truncated product fits in 0..=3.
        let speed = 4_u32.saturating_sub((3.0 * ratio).floor() as u32).max(1);
        self.shake = Some(Shake {
            remaining: SHAKE_TICKS,
            speed,
            since_flip: 0,
            sign: 1.0,
            magnitude: 4.0 + 16.0 * ratio,
        });

        self.health -= power;
        self.last_damage = Some(power);
        self.health_bar_remaining = HEALTH_BAR_TICKS;
        interpolator.add(Interpolation::towards(
            &self.gauge,
            gauge_value,
            self.health.max(0) as f32,
            GAUGE_DURATION,
            Easing::EaseOut,
        ));

        HitProgress::Damaged {
            power,
            health: self.health,
        }
    }

    fn step_shake(&mut self) -> Option<HitProgress> {
        let shake = self.shake.as_mut()?;
        shake.remaining -= 1;
        shake.since_flip += 1;
        if shake.since_flip >= shake.speed {
            shake.since_flip = 0;
            shake.sign = -shake.sign;
            shake.magnitude *= SHAKE_DECAY;
        }

        if shake.remaining == 0 {
            self.shake = None;
            self.position = self.base_position;
            self.being_attacked = false;
            return Some(HitProgress::Resolved);
        }

        self.position = self.base_position + Vec2::new(shake.sign * shake.magnitude, 0.0);
        None
    }

    pub(crate) fn render(&self, renderer: &mut dyn Renderer) {
        if self.defeated {
            return;
        }
        let alpha = if self.spared { 128 } else { 255 };
        renderer.draw_image(&self.sprite, self.position, self.rotation, alpha);

        let size = renderer.image_size(&self.sprite);
        let center = self.base_position + size / 2.0;
        if let Some(frame) = self.hit_visual {
            let slash = ImageKey::new(format!("battle/slash{frame}"));
            let slash_size = renderer.image_size(&slash);
            renderer.draw_image(&slash, center - slash_size / 2.0, 0.0, 255);
        }

        if !self.health_bar_visible() {
            return;
        }
        let gauge_origin = Vec2::new(center.x - GAUGE_SIZE.x / 2.0, self.base_position.y + size.y + 8.0);
        let background = Rect::new(gauge_origin.x, gauge_origin.y, GAUGE_SIZE.x, GAUGE_SIZE.y);
        renderer.fill_rect(background, GAUGE_BACKGROUND);
        let fraction = (self.displayed_health() / self.max_health as f32).clamp(0.0, 1.0);
        renderer.fill_rect(
            Rect::new(background.x, background.y, background.width * fraction, background.height),
            GAUGE_FOREGROUND,
        );

        if let Some(damage) = self.last_damage {
            let (label, color) = match damage {
                0 => ("MISS".to_owned(), MISS_COLOR),
                damage => (damage.to_string(), Color::RED),
            };
            let params = TextParams::new(DAMAGE_FONT_SIZE, color)
                .with_font(FontKey::UtAttack)
                .with_anchor(Anchor::Center);
            renderer.draw_text(&label, params, Vec2::new(center.x, gauge_origin.y - 24.0));
        }
    }
}
