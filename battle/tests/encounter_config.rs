use battle_engine_battle::{
    config::{EncounterConfig, EncounterError},
    query, Battle, BattleEvent, EnemyId, FrameContext, StateKind,
};
use battle_engine_core::{Clock, FixedClock, FrameInput, Key, Rect};
use battle_engine_rendering::RecordingRenderer;

const TWO_DOGS: &str = r#"
[player]
name = "Frisk"
level = 1
health = 20
max_health = 20
items = [{ name = "Monster Candy", heal = 10 }]

[[enemies]]
name = "Dogamy"
sprite = "dogamy"
position = [150.0, 40.0]
max_health = 40
check = "[asterisk]DOGAMY - ATK 14 DEF 4"

[[enemies]]
name = "Dogaressa"
sprite = "dogaressa"
position = [350.0, 40.0]
max_health = 40
spareable = true

[[enemies.acts]]
name = "Pet"
response = "[asterisk]You pet Dogaressa."
makes_spareable = true

[text]
intro = "[asterisk]Dogi assault you!"
rounds = []
ticks_per_character = 1

[timing]
defend_seconds = 0.5

[menu]
columns = 1

[arena]
x = 40.0
y = 240.0
width = 560.0
height = 150.0
"#;

struct Driver {
    battle: Battle,
    clock: FixedClock,
    renderer: RecordingRenderer,
    events: Vec<BattleEvent>,
}

impl Driver {
    fn frame(&mut self, input: FrameInput) {
        let delta = self.clock.tick();
        let ctx = FrameContext::new(delta, &input, &self.renderer);
        self.battle.update(&ctx, &mut self.events);
    }

    fn press(&mut self, key: Key) {
        self.frame(FrameInput::pressed([key]));
    }
}

#[test]
fn toml_encounter_drives_the_battle() {
    let config = EncounterConfig::from_toml_str(TWO_DOGS).expect("encounter parses");
    let mut driver = Driver {
        battle: Battle::new(&config).expect("encounter is valid"),
        clock: FixedClock::default(),
        renderer: RecordingRenderer::new(),
        events: Vec::new(),
    };

    let names: Vec<String> = query::enemies(&driver.battle)
        .into_iter()
        .map(|enemy| enemy.name)
        .collect();
    assert_eq!(names, vec!["Dogamy".to_owned(), "Dogaressa".to_owned()]);
    assert_eq!(query::player(&driver.battle).name, "Frisk");
    assert_eq!(
        query::battle_box(&driver.battle),
        Rect::new(40.0, 240.0, 560.0, 150.0)
    );

    driver.press(Key::Left);
    driver.press(Key::Confirm);
    driver.press(Key::Confirm);

    assert!(driver.events.contains(&BattleEvent::EnemySpared {
        enemy: EnemyId::new(1)
    }));
    assert!(!driver.battle.is_over());
    assert_eq!(query::active_state(&driver.battle), StateKind::Narration);

    driver.press(Key::Confirm);
    driver.press(Key::Confirm);
    assert_eq!(query::active_state(&driver.battle), StateKind::Defending);
    for _ in 0..20 {
        driver.frame(FrameInput::default());
    }

    assert_eq!(query::active_state(&driver.battle), StateKind::ButtonSelect);
    assert_eq!(
        query::encounter_text(&driver.battle),
        "[asterisk]Dogi assault you!"
    );

    driver.press(Key::Right);
    driver.press(Key::Confirm);
    let fight = query::menu(&driver.battle).expect("fight menu is open");
    assert_eq!(fight.items, vec!["* Dogamy".to_owned()]);
}

#[test]
fn unknown_keys_are_rejected() {
    let error = EncounterConfig::from_toml_str("[timing]\ndefend_secs = 2.0\n")
        .expect_err("typo is rejected");

    assert!(matches!(error, EncounterError::Parse(_)));
}

#[test]
fn malformed_inline_commands_are_rejected() {
    let error = EncounterConfig::from_toml_str("[text]\nintro = \"[color:nothex]hi\"\n")
        .expect_err("bad color is rejected");

    assert!(matches!(error, EncounterError::InvalidText { .. }));
}

#[test]
fn empty_roster_is_rejected() {
    let config = EncounterConfig {
        enemies: Vec::new(),
        ..EncounterConfig::default()
    };

    assert!(matches!(
        Battle::new(&config),
        Err(EncounterError::NoEnemies)
    ));
}

#[test]
fn unrepresentable_defend_time_is_an_error() {
    let mut config = EncounterConfig::default();
    config.timing.defend_seconds = 1e30;

    assert!(matches!(
        Battle::new(&config),
        Err(EncounterError::InvalidDefendTime { .. })
    ));
}

#[test]
fn draining_items_and_bad_starting_health_are_rejected() {
    let error = EncounterConfig::from_toml_str(
        "[player]\nhealth = 5\nmax_health = 20\nitems = [{ name = \"Poison\", heal = -500 }]\n",
    )
    .expect_err("negative heal is rejected");
    assert!(matches!(error, EncounterError::NegativeHeal { heal: -500, .. }));

    let error = EncounterConfig::from_toml_str("[player]\nhealth = -7\nmax_health = 20\n")
        .expect_err("negative health is rejected");
    assert!(matches!(
        error,
        EncounterError::PlayerHealthOutOfRange {
            health: -7,
            max_health: 20
        }
    ));
}
