use crate::display::{
    LeaderboardRow,
    NONE_TEXT,
    ZERO_TEXT,
};
use chrono::{
    DateTime,
    Local,
};
use std::time::{
    Duration,
    Instant,
};

pub const NOT_CONNECTED_STATUS: &str = "Not connected";
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);
const NOTIFICATION_HISTORY: usize = 50;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Wallet,
    MatchOptions,
    Match,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LeaderboardPanel {
    #[default]
    Cleared,
    Rows(Vec<LeaderboardRow>),
    NoData,
    Error,
}

/// Everything the screen shows, as last rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewState {
    pub active: View,
    pub status_text: String,
    pub match_id: String,
    pub room_code: String,
    pub wager: String,
    pub turn: String,
    pub your_cards: String,
    pub opponent_cards: String,
    pub tokens: String,
    pub tokens_percent: u16,
    pub leaderboard: LeaderboardPanel,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            active: View::Wallet,
            status_text: NOT_CONNECTED_STATUS.to_owned(),
            match_id: NONE_TEXT.to_owned(),
            room_code: NONE_TEXT.to_owned(),
            wager: ZERO_TEXT.to_owned(),
            turn: NONE_TEXT.to_owned(),
            your_cards: NONE_TEXT.to_owned(),
            opponent_cards: NONE_TEXT.to_owned(),
            tokens: ZERO_TEXT.to_owned(),
            tokens_percent: 0,
            leaderboard: LeaderboardPanel::Cleared,
        }
    }
}

impl ViewState {
    /// Puts the match panel back to its defaults, leaving view, status and
    /// leaderboard alone.
    pub fn reset_match(&mut self) {
        let defaults = Self::default();
        self.match_id = defaults.match_id;
        self.room_code = defaults.room_code;
        self.wager = defaults.wager;
        self.turn = defaults.turn;
        self.your_cards = defaults.your_cards;
        self.opponent_cards = defaults.opponent_cards;
        self.tokens = defaults.tokens;
        self.tokens_percent = defaults.tokens_percent;
    }
}

/// Form fields, kept as typed so validation sees exactly what was entered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inputs {
    pub wager: String,
    pub room_code: String,
    pub card: String,
    pub move_type: String,
    pub target: String,
}

impl Inputs {
    pub fn clear_turn_selection(&mut self) {
        self.card.clear();
        self.move_type.clear();
        self.target.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Notification {
    pub text: String,
    pub kind: NotificationKind,
    pub raised_at: Instant,
    pub logged_at: DateTime<Local>,
}

impl Notification {
    pub fn new(kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
            raised_at: Instant::now(),
            logged_at: Local::now(),
        }
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) < NOTIFICATION_TTL
    }
}

#[derive(Clone, Debug, Default)]
pub struct Notifications {
    current: Option<Notification>,
    history: Vec<Notification>,
}

impl Notifications {
    pub fn push(&mut self, notification: Notification) {
        self.history.push(notification.clone());
        if self.history.len() > NOTIFICATION_HISTORY {
            let drain = self.history.len() - NOTIFICATION_HISTORY;
            self.history.drain(0..drain);
        }
        self.current = Some(notification);
    }

    /// Latest notification, whether or not it has expired.
    pub fn latest(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn visible_at(&self, now: Instant) -> Option<&Notification> {
        self.current.as_ref().filter(|n| n.is_visible_at(now))
    }

    pub fn history(&self) -> &[Notification] {
        &self.history
    }
}

/// What the UI draws from on each frame.
#[derive(Clone, Debug, Default)]
pub struct AppSnapshot {
    pub view: ViewState,
    pub inputs: Inputs,
    pub notification: Option<Notification>,
    pub history: Vec<Notification>,
    pub busy: Option<String>,
}
