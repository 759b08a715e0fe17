//! per-connection WebSocket bridging and the client→server dispatch table.
//!
//! the bridge task itself is `Casino::bridge`'s `tokio::select!` shape,
//! generalized from one room's channel pair to the single shared
//! [`GameServer`]; the dispatch table (`login`/`register`/`act`/`view`/
//! `mouse`/`settings`/`ping`) is `minesweeper-server.cc`'s per-message
//! `if (verb == ...)` chain translated into a `match`.

use super::protocol::ClientMessage;
use super::{ClientHandle, GameServer, Job, protocol};
use crate::engine::Action;
use crate::geometry::Rect;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub async fn connect(
    req: HttpRequest,
    body: web::Payload,
    server: web::Data<Arc<GameServer>>,
) -> impl Responder {
    let server = server.get_ref().clone();
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            actix_web::rt::spawn(bridge(server, session, stream));
            response
        }
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

async fn bridge(server: Arc<GameServer>, mut session: actix_ws::Session, mut stream: actix_ws::MessageStream) {
    let id = Uuid::new_v4();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    server
        .clients
        .with(|c| c.insert(id, ClientHandle { tx: tx.clone(), userid: 0 }))
        .await;
    let _ = tx.send(protocol::grid(server.dims));

    loop {
        tokio::select! {
            biased;
            msg = rx.recv() => match msg {
                Some(line) => if session.text(line).await.is_err() { break },
                None => break,
            },
            msg = stream.next() => match msg {
                Some(Ok(actix_ws::Message::Text(text))) => {
                    dispatch(&server, id, &text.to_string()).await;
                }
                Some(Ok(actix_ws::Message::Close(_))) => break,
                Some(Err(_)) => break,
                None => break,
                _ => continue,
            },
        }
    }

    server.clients.with(|c| c.remove(&id)).await;
    log::info!("client {id} disconnected");
}

/// the userid this connection has authenticated as, or `0` before
/// `login`/`register` succeeds.
async fn userid_of(server: &GameServer, id: Uuid) -> crate::UserId {
    server.clients.with(|c| c.get(&id).map(|h| h.userid).unwrap_or(0)).await
}

async fn send_to(server: &GameServer, id: Uuid, line: String) {
    let tx = server.clients.with(|c| c.get(&id).map(|h| h.tx.clone())).await;
    if let Some(tx) = tx {
        let _ = tx.send(line);
    }
}

async fn dispatch(server: &Arc<GameServer>, id: Uuid, line: &str) {
    let message = ClientMessage::parse(line);
    let userid = userid_of(server, id).await;

    if userid == 0 && !matches!(message, ClientMessage::Login { .. } | ClientMessage::Register { .. } | ClientMessage::Ping { .. }) {
        log::warn!("client {id} sent {message:?} before logging in, dropping");
        return;
    }

    match message {
        ClientMessage::Ping { tag } => send_to(server, id, protocol::pong(&tag)).await,
        ClientMessage::Login { name } => on_auth(server, id, server.registry.with(|r| r.login(&name)).await).await,
        ClientMessage::Register { name, color, emoji } => {
            on_auth(server, id, server.registry.with(|r| r.register(&name, color, emoji)).await).await
        }
        ClientMessage::Act { kind, point } => {
            let bounds = Rect::new(crate::geometry::Point::new(0, 0), server.dims);
            if !bounds.contains(point) {
                log::warn!("client {id} (user {userid}) acted out of bounds at {point}");
                return;
            }
            server.registry.with(|r| {
                if let Some(user) = r.users.get_mut(&userid) {
                    user.touch();
                }
            }).await;
            server.enqueue(Job::Act(Action::new(kind, point, userid))).await;
        }
        ClientMessage::View { rect, force } => on_view(server, id, userid, rect, force).await,
        ClientMessage::Mouse { point } => on_mouse(server, userid, point).await,
        ClientMessage::Settings { color, emoji } => {
            server.registry.with(|r| {
                if let Some(user) = r.users.get_mut(&userid) {
                    user.color = color;
                    user.emoji = emoji;
                }
            }).await;
        }
        ClientMessage::Malformed => log::warn!("client {id} sent an unparseable line: {line:?}"),
    }
}

/// common tail of `login`/`register`: reply with the resolved userid,
/// announce this user to everyone else, and catch the new client up on
/// every user active within the last 7 days (§6).
async fn on_auth(server: &Arc<GameServer>, id: Uuid, userid: crate::UserId) {
    server.clients.with(|c| { if let Some(h) = c.get_mut(&id) { h.userid = userid; } }).await;
    send_to(server, id, protocol::userid(userid)).await;

    const ACTIVE_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    let now = Instant::now();
    let rows = server.registry.with(|r| {
        r.users
            .values()
            .filter(|u| now.duration_since(u.last_active) <= ACTIVE_WINDOW)
            .map(|u| {
                protocol::user(
                    u.userid,
                    &u.name,
                    u.color,
                    u.emoji,
                    u.score,
                    u.view,
                    now.duration_since(u.last_active).as_secs(),
                )
            })
            .collect::<Vec<_>>()
    }).await;
    for row in rows {
        send_to(server, id, row).await;
    }

    let announce = server.registry.with(|r| {
        r.users.get(&userid).map(|u| protocol::user(u.userid, &u.name, u.color, u.emoji, u.score, u.view, 0))
    }).await;
    if let Some(line) = announce {
        let others = server.clients.with(|c| {
            c.iter().filter(|(cid, h)| **cid != id && h.userid != 0).map(|(_, h)| h.tx.clone()).collect::<Vec<_>>()
        }).await;
        for tx in others {
            let _ = tx.send(line.clone());
        }
    }
}

/// `view <x1> <y1> <x2> <y2> <force>`: resync a client's viewport. unforced,
/// only the newly-exposed area (`new.difference(&old)`) is resent; forced,
/// every non-default cell in the whole new rect is.
async fn on_view(server: &Arc<GameServer>, id: Uuid, userid: crate::UserId, rect: Rect<i32>, force: bool) {
    let bounds = Rect::new(crate::geometry::Point::new(0, 0), server.dims);
    let rect = rect.intersection(&bounds).unwrap_or_default();
    let old = server.registry.with(|r| r.users.get(&userid).map(|u| u.view).unwrap_or_default()).await;
    server.registry.with(|r| { if let Some(u) = r.users.get_mut(&userid) { u.view = rect; u.touch(); } }).await;

    let pieces = if force { vec![rect] } else { rect.difference(&old) };
    for piece in pieces {
        for update in server.snapshot(piece).await {
            send_to(server, id, protocol::update(update)).await;
        }
    }
}

/// `mouse <x> <y>`: broadcast a cursor position to every other client whose
/// own viewport currently contains that point, and who's been active in
/// the last 60 seconds — stale viewers don't need a cursor feed they can't
/// see drawn.
async fn on_mouse(server: &Arc<GameServer>, userid: crate::UserId, point: crate::geometry::Point<f32>) {
    server.registry.with(|r| { if let Some(u) = r.users.get_mut(&userid) { u.mouse = point; u.touch(); } }).await;
    let cell: crate::geometry::Point<i32> = point.into();
    let now = Instant::now();
    let recipients = server.registry.with(|r| {
        r.users
            .values()
            .filter(|u| u.userid != userid)
            .filter(|u| now.duration_since(u.last_active) <= Duration::from_secs(60))
            .filter(|u| u.view.contains(cell))
            .map(|u| u.userid)
            .collect::<Vec<_>>()
    }).await;
    if recipients.is_empty() {
        return;
    }
    let line = protocol::mouse(userid, point);
    let txs = server.clients.with(|c| {
        c.values().filter(|h| recipients.contains(&h.userid)).map(|h| h.tx.clone()).collect::<Vec<_>>()
    }).await;
    for tx in txs {
        let _ = tx.send(line.clone());
    }
}

/// the 1Hz liveness broadcast: every active user's current row goes out to
/// every client once a second, so a client that never issues `view` again
/// still sees opponents' scores tick and cursors settle. `2` seconds of
/// slack (`frequency + 1`) absorbs scheduling jitter around the 1-second
/// tick without a user flickering in and out of "active".
pub async fn liveness_task(server: Arc<GameServer>) {
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    loop {
        tick.tick().await;
        if crate::SHUTDOWN.load(std::sync::atomic::Ordering::Relaxed) {
            return;
        }
        let now = Instant::now();
        let rows = server.registry.with(|r| {
            r.users
                .values()
                .filter(|u| now.duration_since(u.last_active) <= Duration::from_secs(2))
                .map(|u| protocol::user(u.userid, &u.name, u.color, u.emoji, u.score, u.view, 0))
                .collect::<Vec<_>>()
        }).await;
        for row in rows {
            server.broadcast(row).await;
        }
    }
}
