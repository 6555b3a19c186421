/// Entry point and game loop.
///
/// The loop is the external timer and dispatcher for the engine: it turns
/// key presses into moves, starts a move only when the previous one has
/// finished (one queued move is kept), and advances the animation every
/// `[speed] frame_ms`.
///
/// Usage:
///   jumpgrid [LEVEL_FILE] [--replay up,left,up-right,...]
///
/// `--replay` runs the moves headless and prints where the player ends up.

mod ui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use jumpgrid::config::GameConfig;
use jumpgrid::domain::tile::ItemKind;
use jumpgrid::sim::event::GameEvent;
use jumpgrid::sim::level::new_game;
use jumpgrid::sim::save::write_save;
use jumpgrid::{Advance, Engine, Move};
use ui::input::{Command, InputState};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

const USAGE: &str = "usage: jumpgrid [LEVEL_FILE] [--replay MOVE,MOVE,...]";

struct Args {
    level: Option<PathBuf>,
    replay: Option<Vec<Move>>,
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let (config, config_err) = match GameConfig::load() {
        Ok(c) => (c, None),
        Err(e) => (GameConfig::default(), Some(e)),
    };
    if let Err(e) = init_tracing(&config) {
        eprintln!("Logging disabled: {e}");
    }
    if let Some(e) = config_err {
        warn!(error = %e, "config unusable, using default settings");
    }

    let state = match new_game(&config, args.level.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let mut engine = Engine::new(state, config.debug.clone());

    if let Some(moves) = args.replay {
        return replay(&mut engine, &moves);
    }

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return ExitCode::FAILURE;
    }

    let result = game_loop(&mut engine, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
        return ExitCode::FAILURE;
    }

    println!("Thanks for playing Jumpgrid! Coins held: {}", engine.state().inventory.coins);
    ExitCode::SUCCESS
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args { level: None, replay: None };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--replay" => {
                let list = args.next().ok_or("--replay needs a move list")?;
                let moves = list
                    .split(',')
                    .filter(|m| !m.trim().is_empty())
                    .map(|m| m.trim().parse::<Move>().map_err(|e| e.to_string()))
                    .collect::<Result<Vec<_>, _>>()?;
                parsed.replay = Some(moves);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            path => {
                if parsed.level.replace(PathBuf::from(path)).is_some() {
                    return Err("only one level file may be given".into());
                }
            }
        }
    }
    Ok(parsed)
}

/// Log to the configured file; the terminal belongs to the game.
fn init_tracing(config: &GameConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.debug.log_level))?;
    let file = std::fs::File::create(&config.general.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()?;
    Ok(())
}

fn replay(engine: &mut Engine, moves: &[Move]) -> ExitCode {
    for mv in moves {
        match engine.play_out(*mv) {
            Ok(events) => {
                let p = &engine.state().player;
                println!(
                    "{mv:>9}  pos {:>7}  impetus {}  sprite {}{}",
                    p.pos.to_string(),
                    p.impetus,
                    p.anim_state.name(),
                    if p.dead { "  DEAD" } else { "" }
                );
                for e in &events {
                    println!("           {}", describe(e));
                }
            }
            Err(e) => {
                eprintln!("{mv}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn game_loop(
    engine: &mut Engine,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputState::new();
    input.honor_release = renderer.reports_key_release();
    let frame_period = Duration::from_millis(config.speed.frame_ms);
    let mut last_frame = Instant::now();
    let mut queued: Option<Move> = None;
    let mut status = String::from("Crouch (down) on solid ground to charge, then jump.");

    loop {
        input.drain_events();
        if input.ctrl_c_pressed() {
            break;
        }

        for cmd in input.commands() {
            match cmd {
                Command::Quit => return Ok(()),
                Command::Save => {
                    let path = &config.general.save_path;
                    status = match write_save(path, engine.state()) {
                        Ok(()) => {
                            info!(path = %path.display(), "layer saved");
                            format!("Saved to {}", path.display())
                        }
                        Err(e) => {
                            warn!(error = %e, "save failed");
                            format!("Save failed: {e}")
                        }
                    };
                }
                Command::Move(mv) => queued = Some(mv),
            }
        }

        let advance = if !engine.is_animating() {
            match queued.take().or_else(|| input.held_move()) {
                Some(mv) => {
                    last_frame = Instant::now();
                    Some(engine.begin(mv)?)
                }
                None => None,
            }
        } else if last_frame.elapsed() >= frame_period {
            last_frame = Instant::now();
            Some(engine.next_frame()?)
        } else {
            None
        };

        if let Some(Advance::Finished(events)) = advance {
            for e in &events {
                info!(event = ?e, "game event");
            }
            if let Some(last) = events.last() {
                status = describe(last);
            }
        }

        renderer.render(engine.frame(), &status)?;
        std::thread::sleep(FRAME_SLEEP);
    }
    Ok(())
}

fn describe(event: &GameEvent) -> String {
    match event {
        GameEvent::PlayerDied { pos } => format!("Ouch, spikes at {pos}. Any move respawns."),
        GameEvent::SavePointReached { pos } => format!("Save point at {pos}."),
        GameEvent::ItemCollected { item: ItemKind::Coin, .. } => "Got a coin.".into(),
        GameEvent::ItemCollected { item: ItemKind::ImpetusFruit, .. } => "Impetus fruit: every jump goes higher.".into(),
        GameEvent::BlockMelted { pos } => format!("A fragile box at {pos} crumbles."),
        GameEvent::CoinSpent { pos } => format!("Spent a coin to open {pos}."),
        GameEvent::LevelReset => "Back to the last save point.".into(),
    }
}
