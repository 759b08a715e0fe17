//! minefield standalone simulation runner
//!
//! drives one [`Engine`] against a pool of deductive [`Solver`] agents with
//! no transport attached at all — useful for benchmarking the solver and
//! engine without paying for a server. the frame loop (actions-per-frame,
//! pause/reset/quit handling, soft 60Hz pacing) mirrors the original
//! command-line driver's `while (!quit && !(finished && benchmark))` shape.

use clap::Parser;
use minefield::agent::Agent;
use minefield::engine::{Action, ActionKind, Engine, Update};
use minefield::geometry::Point;
use minefield::solver::{Solver, Strategy};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "minefield-run")]
struct Cli {
    /// board width and height, in cells.
    #[arg(long, default_value_t = 1440)]
    size: i32,

    /// fraction of cells that are mines, in `(0, 1)`.
    #[arg(long, default_value_t = 0.16)]
    mines: f32,

    /// RNG seed; `0` draws a fresh one from the clock.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// number of solver agents to run concurrently against the one board.
    #[arg(long, default_value_t = 1)]
    agents: usize,

    /// actions issued per frame; `0` derives a value from `size`/`agents`.
    #[arg(long, default_value_t = 0)]
    aps: u32,

    /// use the random-pop solver strategy instead of nearest-to-target.
    #[arg(long)]
    random_strategy: bool,

    /// exit as soon as every agent passes once, instead of looping forever.
    #[arg(long)]
    benchmark: bool,
}

fn main() {
    #[cfg(feature = "server")]
    minefield::init();
    let cli = Cli::parse();
    let dims = Point::new(cli.size, cli.size);

    let apf = if cli.aps > 0 {
        (cli.aps / 60).max(1)
    } else {
        (dims.x as usize / cli.agents.max(1)).max(1) as u32
    };
    log::info!("grid: {}x{}, actions per frame: {apf}", dims.x, dims.y);

    let mut engine = Engine::new(dims, cli.mines, cli.seed);
    let mut updates: Vec<Update> = engine.reset();

    let strategy = if cli.random_strategy { Strategy::Random } else { Strategy::Nearest };
    let mut agents: Vec<Agent> = (0..cli.agents.max(1))
        .map(|i| {
            let user = (i + 1) as minefield::UserId;
            let seed = if cli.seed == 0 { 0 } else { cli.seed.wrapping_add(i as u64) };
            Agent::Solver(Solver::new(dims, user, strategy, seed))
        })
        .collect();

    let bench_start = Instant::now();
    let mut bench_actions: u64 = 0;
    let mut paused = false;
    let mut finished = false;
    let mut quit = false;

    while !quit && !(finished && cli.benchmark) {
        let frame_start = Instant::now();
        finished = false;

        let mut i = 0;
        while i < apf && !quit && !finished {
            let actions: Vec<Action> = agents.iter_mut().map(|a| a.step(&updates, paused)).collect();
            updates.clear();
            finished = true;

            for action in actions {
                match action.kind {
                    ActionKind::Open | ActionKind::Mark => {
                        bench_actions += 1;
                        finished = false;
                        updates.extend(engine.apply(action));
                    }
                    ActionKind::Unmark => {
                        finished = false;
                        updates.extend(engine.apply(action));
                    }
                    ActionKind::Reset => {
                        updates = engine.reset();
                        finished = false;
                        break;
                    }
                    ActionKind::Pause => {
                        paused = !paused;
                        break;
                    }
                    ActionKind::Quit => {
                        quit = true;
                        break;
                    }
                    ActionKind::Pass => {}
                }
            }

            if minefield::SHUTDOWN.load(std::sync::atomic::Ordering::Relaxed) {
                quit = true;
            }
            i += 1;
        }

        if !cli.benchmark {
            let frame_time = Duration::from_micros(1_000_000 / 60);
            let elapsed = frame_start.elapsed();
            if elapsed < frame_time {
                std::thread::sleep(frame_time - elapsed);
            }
        }
    }

    let duration = bench_start.elapsed();
    let actions_per_sec = if duration.as_micros() > 0 {
        bench_actions * 1_000_000 / duration.as_micros() as u64
    } else {
        0
    };
    let valid = engine.validate();
    println!("actions: {bench_actions} action/s: {actions_per_sec}");
    if cli.benchmark {
        let summary = Summary {
            actions: bench_actions,
            actions_per_sec,
            valid,
        };
        println!("{}", serde_json::to_string(&summary).expect("serialize summary"));
    }
    assert!(valid);
}

#[derive(serde::Serialize)]
struct Summary {
    actions: u64,
    actions_per_sec: u64,
    valid: bool,
}
