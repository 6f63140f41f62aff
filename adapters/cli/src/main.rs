#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a battle encounter.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use battle_engine_battle::{config::EncounterConfig, Battle, BattleEvent, FrameContext};
use battle_engine_core::{Color, FrameInput, Renderer};
use battle_engine_rendering::{
    parse_script, FrameControl, HeadlessBackend, Presentation, RenderingBackend,
};
use battle_engine_rendering_macroquad::MacroquadBackend;
use clap::Parser;
use tracing_subscriber::EnvFilter;

const WINDOW_TITLE: &str = "Battle Engine";

/// Runs a turn-based battle encounter.
#[derive(Debug, Parser)]
#[command(name = "battle-engine", version, about)]
struct CliArgs {
    /// TOML encounter description. The bundled demo runs when omitted.
    #[arg(long, value_name = "PATH")]
    encounter: Option<PathBuf>,
    /// Runs without a window against a recording renderer.
    #[arg(long)]
    headless: bool,
    /// Headless key script: `<>^v` arrows, `z` confirm, `x` cancel, `q`/`e`
    /// rotate, `.` idle frame, `+k` holds `k` for one frame.
    #[arg(long, value_name = "KEYS", requires = "headless")]
    script: Option<String>,
    /// Number of frames a headless run lasts.
    #[arg(long, value_name = "COUNT", default_value_t = 300)]
    frames: u32,
    /// Synchronises presentation with the display refresh rate.
    #[arg(long)]
    vsync: bool,
    /// Log filter such as `debug` or `battle_engine_battle=trace`.
    /// Falls back to `RUST_LOG`, then to `info`.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

/// Entry point for the battle engine command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_level.as_deref())?;

    let config = match &args.encounter {
        Some(path) => load_encounter(path)?,
        None => EncounterConfig::default(),
    };
    let battle = Battle::new(&config).context("encounter cannot start")?;
    let presentation = Presentation::new(WINDOW_TITLE, Color::BLACK);

    if args.headless {
        let script = match &args.script {
            Some(script) => parse_script(script).context("invalid key script")?,
            None => Vec::new(),
        };
        tracing::info!(frames = args.frames, scripted = script.len(), "running headless");
        HeadlessBackend::new(args.frames)
            .with_script(script)
            .run(presentation, frame_loop(battle))
    } else {
        MacroquadBackend::new()
            .with_vsync(args.vsync)
            .run(presentation, frame_loop(battle))
    }
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("invalid log level `{level}`"))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!(error))
        .context("failed to install the log subscriber")
}

fn load_encounter(path: &Path) -> Result<EncounterConfig> {
    let document = fs::read_to_string(path)
        .with_context(|| format!("failed to read encounter {}", path.display()))?;
    EncounterConfig::from_toml_str(&document)
        .with_context(|| format!("invalid encounter {}", path.display()))
}

/// Wraps the battle into the per-frame callback driven by a backend.
fn frame_loop(
    mut battle: Battle,
) -> impl FnMut(Duration, &FrameInput, &mut dyn Renderer) -> FrameControl + 'static {
    let mut events = Vec::new();
    move |delta, input, renderer| {
        events.clear();
        let ctx = FrameContext::new(delta, input, &*renderer);
        battle.update(&ctx, &mut events);
        for event in &events {
            match event {
                BattleEvent::OutcomeReached { outcome } => {
                    tracing::info!(?outcome, "battle over");
                }
                BattleEvent::TurnStarted { round } => tracing::info!(round, "turn started"),
                event => tracing::debug!(?event, "battle event"),
            }
        }
        battle.render(renderer);
        FrameControl::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn demo_encounter() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../encounters/papyrus.toml")
    }

    #[test]
    fn arguments_are_well_formed() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn headless_flags_parse() {
        let args = CliArgs::try_parse_from([
            "battle-engine",
            "--headless",
            "--script",
            "zz..z",
            "--frames",
            "12",
            "--log-level",
            "debug",
        ])
        .expect("arguments parse");

        assert!(args.headless);
        assert_eq!(args.script.as_deref(), Some("zz..z"));
        assert_eq!(args.frames, 12);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.encounter.is_none());
    }

    #[test]
    fn script_requires_headless() {
        assert!(CliArgs::try_parse_from(["battle-engine", "--script", "z"]).is_err());
    }

    #[test]
    fn bundled_encounter_loads() {
        let config = load_encounter(&demo_encounter()).expect("bundled encounter loads");

        assert_eq!(config.enemies[0].name, "Papyrus");
        assert!(Battle::new(&config).is_ok());
    }

    #[test]
    fn missing_encounter_names_the_path() {
        let error = load_encounter(Path::new("does/not/exist.toml"))
            .expect_err("missing file is reported");

        assert!(format!("{error:#}").contains("does/not/exist.toml"));
    }

    #[test]
    fn headless_run_completes() {
        let config = EncounterConfig::default();
        let battle = Battle::new(&config).expect("default encounter starts");
        let script = parse_script("> z x").expect("script parses");

        HeadlessBackend::new(5)
            .with_script(script)
            .run(
                Presentation::new(WINDOW_TITLE, Color::BLACK),
                frame_loop(battle),
            )
            .expect("headless run succeeds");
    }
}
