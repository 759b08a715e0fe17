//! the line-oriented text protocol from §6: whitespace-delimited tokens,
//! one verb per frame, no trailing newline (frame boundary is the WebSocket
//! frame itself).

use crate::UserId;
use crate::engine::{ActionKind, Update};
use crate::geometry::{Point, Rect};

/// a parsed client→server frame. anything that doesn't fit one of these
/// shapes (wrong arity, non-numeric argument, unknown verb) is
/// [`ClientMessage::Malformed`] and is logged and dropped, per §7 — never
/// an error frame back to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Ping { tag: String },
    Login { name: String },
    Register { name: String, color: i32, emoji: i32 },
    Act { kind: ActionKind, point: Point<i32> },
    View { rect: Rect<i32>, force: bool },
    Mouse { point: Point<f32> },
    Settings { color: i32, emoji: i32 },
    Malformed,
}

fn action_kind(tag: &str) -> Option<ActionKind> {
    match tag {
        "1" => Some(ActionKind::Open),
        "2" => Some(ActionKind::Mark),
        "3" => Some(ActionKind::Unmark),
        _ => None,
    }
}

impl ClientMessage {
    /// parse one line. never panics on malformed input — returns
    /// [`ClientMessage::Malformed`] instead.
    pub fn parse(line: &str) -> ClientMessage {
        let mut tokens = line.split_whitespace();
        let Some(verb) = tokens.next() else {
            return ClientMessage::Malformed;
        };
        match verb {
            "ping" => match tokens.next() {
                Some(tag) if tokens.next().is_none() => ClientMessage::Ping { tag: tag.to_string() },
                _ => ClientMessage::Malformed,
            },
            "login" => match tokens.next() {
                Some(name) if tokens.next().is_none() => ClientMessage::Login { name: name.to_string() },
                _ => ClientMessage::Malformed,
            },
            "register" => match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(name), Some(color), Some(emoji)) if tokens.next().is_none() => {
                    match (color.parse(), emoji.parse()) {
                        (Ok(color), Ok(emoji)) => ClientMessage::Register {
                            name: name.to_string(),
                            color,
                            emoji,
                        },
                        _ => ClientMessage::Malformed,
                    }
                }
                _ => ClientMessage::Malformed,
            },
            "act" => match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(a), Some(x), Some(y)) if tokens.next().is_none() => {
                    match (action_kind(a), x.parse(), y.parse()) {
                        (Some(kind), Ok(x), Ok(y)) => ClientMessage::Act {
                            kind,
                            point: Point::new(x, y),
                        },
                        _ => ClientMessage::Malformed,
                    }
                }
                _ => ClientMessage::Malformed,
            },
            "view" => {
                let args: Vec<&str> = tokens.collect();
                match args.as_slice() {
                    [x1, y1, x2, y2, force] => {
                        match (x1.parse(), y1.parse(), x2.parse(), y2.parse(), force.parse::<i32>()) {
                            (Ok(x1), Ok(y1), Ok(x2), Ok(y2), Ok(force)) => ClientMessage::View {
                                rect: Rect::from_coords(x1, y1, x2, y2),
                                force: force != 0,
                            },
                            _ => ClientMessage::Malformed,
                        }
                    }
                    _ => ClientMessage::Malformed,
                }
            }
            "mouse" => match (tokens.next(), tokens.next()) {
                (Some(x), Some(y)) if tokens.next().is_none() => match (x.parse(), y.parse()) {
                    (Ok(x), Ok(y)) => ClientMessage::Mouse {
                        point: Point::new(x, y),
                    },
                    _ => ClientMessage::Malformed,
                },
                _ => ClientMessage::Malformed,
            },
            "settings" => match (tokens.next(), tokens.next()) {
                (Some(color), Some(emoji)) if tokens.next().is_none() => {
                    match (color.parse(), emoji.parse()) {
                        (Ok(color), Ok(emoji)) => ClientMessage::Settings { color, emoji },
                        _ => ClientMessage::Malformed,
                    }
                }
                _ => ClientMessage::Malformed,
            },
            _ => ClientMessage::Malformed,
        }
    }
}

pub fn grid(dims: Point<i32>) -> String {
    format!("grid {} {}", dims.x, dims.y)
}

pub fn userid(userid: UserId) -> String {
    format!("userid {userid}")
}

pub fn pong(tag: &str) -> String {
    format!("pong {tag}")
}

pub fn reset() -> String {
    "reset".to_string()
}

/// `state & 15` is the displayed number, per §6's wire contract.
pub fn update(u: Update) -> String {
    format!("update {} {} {} {}", u.state.displayed(), u.point.x, u.point.y, u.user)
}

pub fn score(delta: i64, point: Point<i32>) -> String {
    format!("score {} {} {}", delta, point.x, point.y)
}

pub fn mouse(userid: UserId, point: Point<f32>) -> String {
    format!("mouse {} {:.1} {:.1}", userid, point.x, point.y)
}

#[allow(clippy::too_many_arguments)]
pub fn user(
    userid: UserId,
    name: &str,
    color: i32,
    emoji: i32,
    score: i64,
    view: Rect<i32>,
    seconds_since_active: u64,
) -> String {
    format!(
        "user {} {} {} {} {} {} {} {} {} {}",
        userid, name, color, emoji, score, view.tl.x, view.tl.y, view.br.x, view.br.y, seconds_since_active
    )
}
