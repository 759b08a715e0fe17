use crate::UserId;
use crate::geometry::{Point, Rect};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// server-side per-user record: `{userid, name, color, emoji, score, view,
/// mouse, last_active}` per the data model. never destroyed once created —
/// retained for score history across reconnects.
#[derive(Debug, Clone)]
pub struct User {
    pub userid: UserId,
    pub name: String,
    pub color: i32,
    pub emoji: i32,
    pub score: i64,
    pub view: Rect<i32>,
    pub mouse: Point<f32>,
    pub last_active: Instant,
}

impl User {
    fn new(userid: UserId, name: String, color: i32, emoji: i32) -> Self {
        Self {
            userid,
            name,
            color,
            emoji,
            score: 0,
            view: Rect::default(),
            mouse: Point::default(),
            last_active: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// award `count^2` for a `SCORE_*` event, or deduct `max(100, score)` on
    /// a self-detonated bomb. returns the signed delta applied, so callers
    /// can report it back to the scoring user.
    pub fn score_for_count(&mut self, count: u8) -> i64 {
        let delta = (count as i64) * (count as i64);
        self.score += delta;
        delta
    }

    pub fn score_for_bomb(&mut self) -> i64 {
        let delta = -(self.score.max(100));
        self.score += delta;
        delta
    }
}

/// the registry of known users, keyed both by id and by name, plus the
/// monotonic id counter — never destroyed, mirroring `User`'s own lifecycle.
#[derive(Debug, Default)]
pub struct Registry {
    pub users: HashMap<UserId, User>,
    pub usernames: HashMap<String, UserId>,
    next_userid: UserId,
}

/// server truncates names to this many characters, per §6.
const MAX_NAME_LEN: usize = 32;

impl Registry {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            usernames: HashMap::new(),
            next_userid: 1,
        }
    }

    fn truncate_name(name: &str) -> String {
        name.chars().take(MAX_NAME_LEN).collect()
    }

    fn alloc_userid(&mut self) -> UserId {
        let id = self.next_userid;
        self.next_userid += 1;
        id
    }

    /// `login <name>`: reattach to an existing user by name, or create one.
    /// returns the resolved userid.
    pub fn login(&mut self, name: &str) -> UserId {
        let name = Self::truncate_name(name);
        if let Some(&userid) = self.usernames.get(&name) {
            if let Some(user) = self.users.get_mut(&userid) {
                user.touch();
            }
            return userid;
        }
        let userid = self.alloc_userid();
        self.usernames.insert(name.clone(), userid);
        self.users.insert(userid, User::new(userid, name, -1, -1));
        userid
    }

    /// `register <name> <color> <emoji>`: always creates a fresh user, even
    /// if the name is already taken by another one.
    pub fn register(&mut self, name: &str, color: i32, emoji: i32) -> UserId {
        let name = Self::truncate_name(name);
        let userid = self.alloc_userid();
        self.usernames.insert(name.clone(), userid);
        self.users.insert(userid, User::new(userid, name, color, emoji));
        userid
    }
}

/// per-connection bookkeeping the server keeps outside the user registry:
/// the outbound message channel and the userid this socket has logged in
/// as (0 until `login`/`register` succeeds).
#[derive(Debug)]
pub struct ClientHandle {
    pub tx: UnboundedSender<String>,
    pub userid: UserId,
}
