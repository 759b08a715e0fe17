#![allow(dead_code)]

pub mod agent;
pub mod board;
pub mod engine;
pub mod geometry;
pub mod shadow;
pub mod solver;
pub mod spatial;

#[cfg(feature = "server")]
pub mod protected;

#[cfg(feature = "server")]
pub mod server;

/// user id; 0 means "not logged in" / "no user", matching the wire protocol.
/// `i32` so a `Cell` (state + bomb/neighbor bitfield + cleared + marked +
/// user) packs into 8 bytes as specified.
pub type UserId = i32;

/// initialize logging. call once, from each binary's `main`.
#[cfg(feature = "server")]
pub fn init() {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term]).expect("initialize logger");
}

/// process-wide shutdown flag, flipped by a ctrl-c handler. the one sanctioned
/// global in this crate: everything else threads its state explicitly.
pub static SHUTDOWN: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// install a ctrl-c handler that flips [`SHUTDOWN`] instead of exiting
/// immediately, so the server's accept loop and periodic tasks can wind down.
#[cfg(feature = "server")]
pub fn install_shutdown_handler() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("received ctrl-c, winding down");
            SHUTDOWN.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });
}
