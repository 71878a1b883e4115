//! Headless demo: a seeded single-player match stepped at 60 frames per
//! second, with a scripted pilot standing in for the human player.

use std::thread;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spintop_battle::config::Config;
use spintop_battle::game::input::{AbilityTrigger, InputAggregator};
use spintop_battle::game::snapshot::MatchSnapshot;
use spintop_battle::game::{BattleMatch, MatchMode, MatchSetup};
use spintop_battle::util::time::{FrameClock, TARGET_FPS};

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    info!(
        seed = config.seed,
        player = %config.player_loadout,
        opponent = %config.opponent_loadout,
        "starting battle demo"
    );

    let setup = MatchSetup {
        seed: config.seed,
        arena: config.arena.clone(),
        player_one: config.player_loadout.clone(),
        player_two: config.opponent_loadout.clone(),
        mode: MatchMode::SinglePlayer,
    };
    let mut battle = BattleMatch::with_catalog(setup)?;
    battle.on_match_end(|winner| info!(?winner, "decision"));

    let clock = FrameClock::new();
    let step = 1.0 / TARGET_FPS as f64;
    let frame_gap = Duration::from_secs_f64(step);
    let mut t = 0.0;
    battle.start(t);

    while battle.is_running() {
        if config.realtime {
            thread::sleep(frame_gap);
            t = clock.now();
        } else {
            t += step;
        }
        if t > config.max_match_secs {
            info!("demo time limit reached");
            battle.stop();
            break;
        }

        let Some(snapshot) = battle.frame(t) else {
            break;
        };
        for event in &snapshot.events {
            info!(tick = snapshot.tick, ?event, "event");
        }
        pilot(&snapshot, battle.input_mut());
    }

    let summary = battle.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Stands in for the human: chases the opponent by pointer, burns full power
/// on the cinematic move, dodges at point-blank range, and otherwise pokes
/// with heavy attacks.
fn pilot(snapshot: &MatchSnapshot, input: &mut InputAggregator) {
    if !snapshot.is_playing {
        return;
    }
    let [me, them] = &snapshot.combatants[..] else {
        return;
    };
    if me.is_dead || them.is_dead {
        return;
    }

    input.pointer_moved(them.position);

    let range = (them.position - me.position).length();
    if me.power >= 25.0 {
        input.press(AbilityTrigger::CinematicMove);
    } else if range < 45.0 && me.power >= 10.0 {
        input.press(AbilityTrigger::DodgeRight);
    } else if range < 130.0 && me.power >= 15.0 {
        input.press(AbilityTrigger::HeavyAttack);
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
