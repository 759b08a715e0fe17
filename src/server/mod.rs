//! the multi-user coordination server: owns the authoritative [`Engine`],
//! authenticates clients over the text protocol in [`protocol`], routes
//! per-viewport delta streams to subscribed clients, scores opens, and
//! arbitrates concurrent actions under the single-writer discipline in §5.
//!
//! grounded on `hosting::casino::Casino`/`hosting::server::Server` for the
//! `actix-web` + `actix-ws` wiring, generalized from one room per game to
//! one board shared by every connection.

mod http;
mod protocol;
mod state;
mod ws;

pub use state::{ClientHandle, Registry, User};

use crate::board::CellState;
use crate::engine::{Action, Engine, Update};
use crate::geometry::{Point, Rect};
use crate::protected::Protected;
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Notify, oneshot};
use uuid::Uuid;

/// process inputs per §6: dimensions, mine fraction, seed, bind address,
/// and static-file document root. any equivalent channel is acceptable; we
/// read these from environment variables with `clap`-parsed defaults in
/// the binary, and construct this directly in tests.
#[derive(Debug, Clone)]
pub struct Config {
    pub dims: Point<i32>,
    pub bomb_percentage: f32,
    pub seed: u64,
    pub bind_addr: String,
    pub doc_root: PathBuf,
}

/// one unit of work handed to the engine-owning task: either mutate the
/// board, or take a read-only snapshot of a rectangle for a client's
/// `view` resync. bundling both into one FIFO queue keeps a `view` request
/// ordered against concurrently arriving `act`s exactly as the
/// single-writer discipline sequentializes them (§5).
enum Job {
    Act(Action),
    Reset,
    Snapshot {
        rect: Rect<i32>,
        respond: oneshot::Sender<Vec<Update>>,
    },
}

/// shared server state, reachable from every connection task. the
/// [`Engine`] itself is not a field here — it is owned exclusively by the
/// task loop spawned from [`GameServer::run_engine`]; every other task
/// reaches it only by pushing a [`Job`] onto `jobs`, mirrored on
/// `hosting::handle::RoomHandle`'s channel-endpoint split between a
/// session-facing handle and the task that owns the real state.
pub struct GameServer {
    dims: Point<i32>,
    jobs: Protected<VecDeque<Job>>,
    wake: Notify,
    registry: Protected<Registry>,
    clients: Protected<HashMap<Uuid, ClientHandle>>,
}

impl GameServer {
    fn new(dims: Point<i32>) -> Self {
        Self {
            dims,
            jobs: Protected::new(VecDeque::new()),
            wake: Notify::new(),
            registry: Protected::new(Registry::new()),
            clients: Protected::new(HashMap::new()),
        }
    }

    async fn enqueue(&self, job: Job) {
        self.jobs.with(|q| q.push_back(job)).await;
        self.wake.notify_one();
    }

    async fn snapshot(&self, rect: Rect<i32>) -> Vec<Update> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(Job::Snapshot { rect, respond: tx }).await;
        rx.await.unwrap_or_default()
    }

    /// the single engine-owning task: pops jobs in FIFO order, applies
    /// them to the one `Engine` this function owns, and fans the
    /// resulting updates out to subscribed clients. nothing else in the
    /// process ever touches `engine`.
    async fn run_engine(self: Arc<Self>, mut engine: Engine) {
        let initial = engine.reset();
        self.fan_out(initial).await;
        loop {
            self.wake.notified().await;
            loop {
                let job = self.jobs.with(|q| q.pop_front()).await;
                let Some(job) = job else { break };
                match job {
                    Job::Act(action) => {
                        let updates = engine.apply(action);
                        self.fan_out(updates).await;
                    }
                    Job::Reset => {
                        let updates = engine.reset();
                        self.fan_out(updates).await;
                        self.broadcast(protocol::reset()).await;
                    }
                    Job::Snapshot { rect, respond } => {
                        let updates = engine
                            .board()
                            .iter_rect(rect)
                            .filter(|(_, c)| c.state != CellState::HIDDEN || c.user != 0)
                            .map(|(p, c)| Update {
                                state: c.state,
                                point: p,
                                user: c.user,
                            })
                            .collect();
                        let _ = respond.send(updates);
                    }
                }
            }
        }
    }

    /// score each update against its user, then send `update` to every
    /// logged-in client whose viewport contains it (pre-`SCORE_*` states
    /// only — score promotions are reported via `score`, unicast to the
    /// scorer, not rebroadcast as `update`), per §4.5's fanout rule.
    async fn fan_out(&self, updates: Vec<Update>) {
        for u in updates {
            let mut delta = 0i64;
            if u.user != 0 {
                delta = self
                    .registry
                    .with(|reg| {
                        reg.users.get_mut(&u.user).map(|user| {
                            if u.state.is_scored() {
                                user.score_for_count(u.state.low_count())
                            } else if u.state == CellState::BOMB {
                                user.score_for_bomb()
                            } else {
                                0
                            }
                        })
                    })
                    .await
                    .unwrap_or(0);
            }

            if u.state.0 < CellState::SCORE_ZERO.0 {
                let wire = protocol::update(u);
                let candidates = self
                    .clients
                    .with(|c| c.values().map(|h| (h.userid, h.tx.clone())).collect::<Vec<_>>())
                    .await;
                for (userid, tx) in candidates {
                    if userid == 0 {
                        continue;
                    }
                    let in_view = self
                        .registry
                        .with(|reg| {
                            reg.users
                                .get(&userid)
                                .map(|user| user.view.contains(u.point))
                                .unwrap_or(false)
                        })
                        .await;
                    if in_view {
                        let _ = tx.send(wire.clone());
                    }
                }
            }

            // a bomb penalty is always <= -100, so `delta > 0` selects exactly
            // the SCORE_* events the wire protocol unicasts `score` for.
            if delta > 0 {
                let scorer = self
                    .clients
                    .with(|c| c.values().find(|h| h.userid == u.user).map(|h| h.tx.clone()))
                    .await;
                if let Some(tx) = scorer {
                    let _ = tx.send(protocol::score(delta, u.point));
                }
            }
        }
    }

    async fn broadcast(&self, line: String) {
        let txs = self
            .clients
            .with(|c| c.values().map(|h| h.tx.clone()).collect::<Vec<_>>())
            .await;
        for tx in txs {
            let _ = tx.send(line.clone());
        }
    }
}

pub struct Server;

impl Server {
    pub async fn run(config: Config) -> std::io::Result<()> {
        let engine = Engine::new(config.dims, config.bomb_percentage, config.seed);
        let server = Arc::new(GameServer::new(config.dims));
        tokio::spawn(server.clone().run_engine(engine));
        tokio::spawn(ws::liveness_task(server.clone()));

        let doc_root = config.doc_root.clone();
        let data = web::Data::new(server);
        let doc_root_data = web::Data::new(http::DocRoot(doc_root));
        log::info!("starting minefield server on {}", config.bind_addr);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
                .app_data(data.clone())
                .app_data(doc_root_data.clone())
                .route("/minefield", web::get().to(ws::connect))
                .default_service(web::get().to(http::serve_static))
        })
        .workers(1)
        .bind(&config.bind_addr)?
        .run()
        .await
    }
}
