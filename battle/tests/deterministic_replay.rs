use battle_engine_battle::{
    config::EncounterConfig,
    query::{self, EnemySnapshot, PlayerSnapshot, SoulSnapshot},
    Battle, BattleEvent, FrameContext, StateKind,
};
use battle_engine_core::{Clock, FixedClock};
use battle_engine_rendering::{parse_script, DrawCommand, RecordingRenderer};

/// Opens Fight, strikes after a short wait, dodges to the right and then
/// browses the Act menu.
const SCRIPT: &str = "z z .......... z \
                      ........................................ \
                      +> +> +> +e +e +^ +^ +v \
                      .................................................................. \
                      ................................................................. \
                      > z z v v x x";

#[derive(Debug, PartialEq)]
struct Replay {
    events: Vec<BattleEvent>,
    stack: Vec<StateKind>,
    enemies: Vec<EnemySnapshot>,
    player: PlayerSnapshot,
    soul: SoulSnapshot,
    round: u32,
    last_frame: Vec<DrawCommand>,
}

fn replay(script: &str) -> Replay {
    let inputs = parse_script(script).expect("script parses");
    let mut battle = Battle::new(&EncounterConfig::default()).expect("encounter is valid");
    let mut clock = FixedClock::default();
    let mut renderer = RecordingRenderer::new();
    let mut events = Vec::new();

    for input in &inputs {
        renderer.clear();
        let delta = clock.tick();
        let ctx = FrameContext::new(delta, input, &renderer);
        battle.update(&ctx, &mut events);
        battle.render(&mut renderer);
    }

    Replay {
        events,
        stack: query::stack(&battle),
        enemies: query::enemies(&battle),
        player: query::player(&battle),
        soul: query::soul(&battle),
        round: query::round(&battle),
        last_frame: renderer.commands().to_vec(),
    }
}

#[test]
fn identical_scripts_produce_identical_runs() {
    let first = replay(SCRIPT);
    let second = replay(SCRIPT);

    assert_eq!(first, second, "replay diverged between runs");
    assert!(!first.last_frame.is_empty());
}

#[test]
fn scripted_run_reaches_the_expected_milestones() {
    let run = replay(SCRIPT);

    let struck: Vec<_> = run
        .events
        .iter()
        .filter(|event| matches!(event, BattleEvent::EnemyStruck { .. }))
        .collect();
    assert_eq!(struck.len(), 1, "exactly one strike lands");
    assert!(run
        .events
        .contains(&BattleEvent::TurnStarted { round: 1 }));
    assert_eq!(run.round, 1);
    assert_eq!(run.stack, vec![StateKind::ButtonSelect]);
    assert!(run.enemies[0].health < run.enemies[0].max_health);
    assert_eq!(run.player.health, 90);
}
