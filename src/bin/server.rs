//! minefield server binary
//!
//! runs the coordination server: one shared authoritative board, fanned out
//! to every connected client over WebSockets, plus the static file server
//! for the browser UI.

use clap::Parser;
use minefield::geometry::Point;
use minefield::server::{Config, Server};

#[derive(Parser, Debug)]
#[command(name = "minefield-server")]
struct Cli {
    /// board width and height, in cells.
    #[arg(long, default_value_t = 1000)]
    size: i32,

    /// fraction of cells that are mines, in `(0, 1)`.
    #[arg(long, default_value_t = 0.16)]
    mines: f32,

    /// RNG seed; `0` draws a fresh one from the clock.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// address to bind the HTTP/WebSocket listener on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:9001")]
    bind_addr: String,

    /// directory the static UI bundle is served from.
    #[arg(long, env = "DOC_ROOT", default_value = "static")]
    doc_root: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    minefield::init();
    minefield::install_shutdown_handler();
    let cli = Cli::parse();

    let config = Config {
        dims: Point::new(cli.size, cli.size),
        bomb_percentage: cli.mines,
        seed: cli.seed,
        bind_addr: cli.bind_addr,
        doc_root: cli.doc_root,
    };
    Server::run(config).await
}
