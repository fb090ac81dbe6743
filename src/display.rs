use crate::protocol::{
    Card,
    LeaderboardEntry,
    MAX_PLAY_COUNT,
    PlayerCards,
};
use itertools::Itertools;

pub const NONE_TEXT: &str = "None";
pub const ZERO_TEXT: &str = "0";
pub const LEADERBOARD_ROWS: usize = 5;
const SHORTEN_ABOVE: usize = 10;
const PLAYER_A_SUFFIX: &str = " (Player A)";

/// `abcdef...mnop` for anything longer than ten characters.
pub fn shorten(id: &str) -> String {
    let len = id.chars().count();
    if len <= SHORTEN_ABOVE {
        return id.to_owned();
    }
    let head: String = id.chars().take(6).collect();
    let tail: String = id.chars().skip(len - 4).collect();
    format!("{head}...{tail}")
}

pub fn connected_status(address: &str) -> String {
    let head: String = address.chars().take(8).collect();
    format!("Connected: {head}...")
}

/// Drops the first `" (Player A)"` marker the process appends to a turn holder.
pub fn strip_player_marker(turn: &str) -> String {
    turn.replacen(PLAYER_A_SUFFIX, "", 1)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerSlot {
    A,
    B,
}

impl PlayerSlot {
    pub fn key(self) -> &'static str {
        match self {
            PlayerSlot::A => "A",
            PlayerSlot::B => "B",
        }
    }

    pub fn opponent(self) -> PlayerSlot {
        match self {
            PlayerSlot::A => PlayerSlot::B,
            PlayerSlot::B => PlayerSlot::A,
        }
    }
}

pub fn player_slot(
    address: Option<&str>,
    player_a: Option<&str>,
    player_b: Option<&str>,
) -> Option<PlayerSlot> {
    let address = address?;
    if player_a == Some(address) {
        Some(PlayerSlot::A)
    } else if player_b == Some(address) {
        Some(PlayerSlot::B)
    } else {
        None
    }
}

pub fn card_line(card: &Card) -> String {
    format!(
        "{}: {} HP, {}/{}",
        card.name, card.hp, card.play_count, MAX_PLAY_COUNT
    )
}

pub fn cards_text(cards: Option<&PlayerCards>) -> String {
    match cards {
        Some(player) => player.cards.iter().map(card_line).join(", "),
        None => NONE_TEXT.to_owned(),
    }
}

/// Token balance as a gauge percentage, one token per percent, capped at 100.
pub fn token_percent(tokens: &str) -> u16 {
    leading_integer(tokens)
        .map(|n| n.clamp(0, 100) as u16)
        .unwrap_or(0)
}

// Reads an optionally signed run of digits at the start, ignoring the rest.
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub address: String,
    pub wins: String,
    pub tokens: String,
}

pub fn leaderboard_rows(entries: &[LeaderboardEntry]) -> Vec<LeaderboardRow> {
    entries
        .iter()
        .take(LEADERBOARD_ROWS)
        .enumerate()
        .map(|(index, entry)| LeaderboardRow {
            rank: index + 1,
            address: shorten(&entry.address),
            wins: entry.wins.clone().unwrap_or_else(|| ZERO_TEXT.to_owned()),
            tokens: entry.tokens.clone().unwrap_or_else(|| ZERO_TEXT.to_owned()),
        })
        .collect()
}
