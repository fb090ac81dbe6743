//! Wire vocabulary of the arena process: action names, tags, and the JSON
//! replies each action produces.
//!
//! Every payload carries a `status` field. [`Reply::parse`] turns a raw payload
//! into either the action's typed body or the process-supplied failure message,
//! so callers match on the outcome instead of probing loose fields.

use crate::{
    Error,
    Result,
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    de::DeserializeOwned,
};
use serde_json::{
    Map,
    Value,
};
use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
};

pub const ACTION_TAG: &str = "Action";
pub const FILETYPE_TAG: &str = "filetype";
pub const FILETYPE_JSON: &str = "json";
pub const COORDINATE_ROOM_RESPONSE: &str = "CoordinateRoomResponse";
pub const STATUS_SUCCESS: &str = "success";
pub const MAX_PLAY_COUNT: u32 = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Validation failures detected before anything is sent to the process.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Please connect wallet first")]
    WalletNotConnected,
    #[error("Please enter a valid wager greater than 0")]
    InvalidWager,
    #[error("Please enter a room code")]
    MissingRoomCode,
    #[error("Please select card, move type, target, and ensure room code is set")]
    IncompleteTurn,
    #[error("Invalid card or target index (must be 1-4)")]
    InvalidIndex,
    #[error("Invalid move type (must be Normal or Special)")]
    InvalidMoveType,
}

/// One of the four card positions a player holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CardSlot(u8);

impl CardSlot {
    pub const ALL: [CardSlot; 4] = [CardSlot(1), CardSlot(2), CardSlot(3), CardSlot(4)];

    pub fn get(self) -> u8 {
        self.0
    }
}

impl FromStr for CardSlot {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(CardSlot(1)),
            "2" => Ok(CardSlot(2)),
            "3" => Ok(CardSlot(3)),
            "4" => Ok(CardSlot(4)),
            _ => Err(InputError::InvalidIndex),
        }
    }
}

impl fmt::Display for CardSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveType {
    Normal,
    Special,
}

impl MoveType {
    pub const ALL: [MoveType; 2] = [MoveType::Normal, MoveType::Special];

    pub fn as_str(self) -> &'static str {
        match self {
            MoveType::Normal => "Normal",
            MoveType::Special => "Special",
        }
    }
}

impl FromStr for MoveType {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(MoveType::Normal),
            "Special" => Ok(MoveType::Special),
            _ => Err(InputError::InvalidMoveType),
        }
    }
}

impl fmt::Display for MoveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the wager field. Only whole numbers above zero are accepted.
pub fn parse_wager(raw: &str) -> Result<u64, InputError> {
    match raw.trim().parse::<u64>() {
        Ok(wager) if wager > 0 => Ok(wager),
        _ => Err(InputError::InvalidWager),
    }
}

pub fn parse_room_code(raw: &str) -> Result<String, InputError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(InputError::MissingRoomCode);
    }
    Ok(code.to_owned())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnSelection {
    pub room_code: String,
    pub card: CardSlot,
    pub move_type: MoveType,
    pub target: CardSlot,
}

impl TurnSelection {
    /// Checks presence first, then the index ranges, then the move type.
    pub fn parse(
        card: &str,
        move_type: &str,
        target: &str,
        room_code: &str,
    ) -> Result<Self, InputError> {
        let room_code = room_code.trim();
        if card.is_empty()
            || move_type.is_empty()
            || target.is_empty()
            || room_code.is_empty()
        {
            return Err(InputError::IncompleteTurn);
        }
        let card = card.parse::<CardSlot>()?;
        let target = target.parse::<CardSlot>()?;
        let move_type = move_type.parse::<MoveType>()?;
        Ok(Self {
            room_code: room_code.to_owned(),
            card,
            move_type,
            target,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    GetLeaderboard,
    GetMatchState {
        address: String,
        room_code: String,
    },
    JoinGame {
        address: String,
    },
    CreateRoom {
        address: String,
        wager: u64,
    },
    JoinRoom {
        address: String,
        room_code: String,
    },
    ProcessTurn {
        address: String,
        turn: TurnSelection,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::GetLeaderboard => "GetLeaderboard",
            Action::GetMatchState { .. } => "GetMatchState",
            Action::JoinGame { .. } => "JoinGame",
            Action::CreateRoom { .. } | Action::JoinRoom { .. } => "CoordinateRoom",
            Action::ProcessTurn { .. } => "ProcessTurn",
        }
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            Action::GetLeaderboard => None,
            Action::GetMatchState { address, .. }
            | Action::JoinGame { address }
            | Action::CreateRoom { address, .. }
            | Action::JoinRoom { address, .. }
            | Action::ProcessTurn { address, .. } => Some(address),
        }
    }

    /// `Action` first, then the action's own tags, then the data format marker.
    pub fn tags(&self) -> Vec<Tag> {
        let mut tags = vec![Tag::new(ACTION_TAG, self.name())];
        match self {
            Action::GetLeaderboard => {}
            Action::GetMatchState { address, room_code } => {
                tags.push(Tag::new("Address", address.as_str()));
                tags.push(Tag::new("RoomCode", room_code.as_str()));
            }
            Action::JoinGame { address } => {
                tags.push(Tag::new("Address", address.as_str()));
            }
            Action::CreateRoom { address, wager } => {
                tags.push(Tag::new("Address", address.as_str()));
                tags.push(Tag::new("WagerAmount", wager.to_string()));
            }
            Action::JoinRoom { address, room_code } => {
                tags.push(Tag::new("Address", address.as_str()));
                tags.push(Tag::new("RoomCode", room_code.as_str()));
            }
            Action::ProcessTurn { address, turn } => {
                tags.push(Tag::new("Address", address.as_str()));
                tags.push(Tag::new("RoomCode", turn.room_code.as_str()));
                tags.push(Tag::new("CardIdx", turn.card.to_string()));
                tags.push(Tag::new("MoveType", turn.move_type.as_str()));
                tags.push(Tag::new("TargetIdx", turn.target.to_string()));
            }
        }
        tags.push(Tag::new(FILETYPE_TAG, FILETYPE_JSON));
        tags
    }
}

/// Result of a dry run as returned by the compute unit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DryRunResult {
    #[serde(rename = "Messages", default)]
    pub messages: Vec<ResultMessage>,
    #[serde(rename = "Output", default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    #[serde(rename = "Data", default, deserialize_with = "lenient_text")]
    pub data: Option<String>,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<Tag>,
}

impl ResultMessage {
    pub fn has_tag(&self, name: &str, value: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == name && tag.value == value)
    }

    /// Message payload, with an absent body read as an empty object.
    pub fn data(&self) -> &str {
        self.data.as_deref().unwrap_or("{}")
    }
}

impl DryRunResult {
    pub fn first_data(&self) -> &str {
        self.messages.first().map(ResultMessage::data).unwrap_or("{}")
    }

    /// Finds the message tagged `Action=<action>`, wherever it sits in the list.
    pub fn tagged(&self, action: &str) -> Option<&ResultMessage> {
        self.messages
            .iter()
            .find(|message| message.has_tag(ACTION_TAG, action))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Reply<T> {
    Success(T),
    Failure { message: Option<String> },
}

impl<T: DeserializeOwned> Reply<T> {
    pub fn parse(data: &str) -> Result<Self> {
        let object = parse_object(data)?;
        let succeeded =
            object.get("status").and_then(Value::as_str) == Some(STATUS_SUCCESS);
        if !succeeded {
            let message = object.get("message").and_then(text_of);
            return Ok(Reply::Failure { message });
        }
        let body = serde_json::from_value(Value::Object(object))
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;
        Ok(Reply::Success(body))
    }
}

impl<T> Reply<T> {
    /// `fallback` stands in when the process failed without saying why.
    pub fn into_result(self, fallback: &str) -> Result<T> {
        match self {
            Reply::Success(body) => Ok(body),
            Reply::Failure { message } => Err(Error::Rejected {
                message: message.unwrap_or_else(|| fallback.to_owned()),
            }),
        }
    }
}

fn parse_object(data: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(Error::MalformedResponse(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(Error::MalformedResponse(e.to_string())),
    }
}

/// Reads the `tokens` balance from a `JoinGame` dry-run payload. The status
/// field is not consulted.
pub fn tokens_from_payload(data: &str) -> Result<Option<String>> {
    Ok(parse_object(data)?.get("tokens").and_then(text_of))
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LeaderboardReply {
    #[serde(default)]
    pub leaderboard: Option<Vec<LeaderboardEntry>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(deserialize_with = "required_text")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub wins: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tokens: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MatchStateReply {
    #[serde(default, deserialize_with = "lenient_text")]
    pub match_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub room_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub wager: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub turn: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub player_a: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub player_b: Option<String>,
    #[serde(default, deserialize_with = "lenient_cards")]
    pub cards: HashMap<String, PlayerCards>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PlayerCards {
    #[serde(default)]
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Card {
    #[serde(deserialize_with = "required_text")]
    pub name: String,
    #[serde(deserialize_with = "required_text")]
    pub hp: String,
    #[serde(deserialize_with = "required_text")]
    pub play_count: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CreateRoomReply {
    #[serde(default, deserialize_with = "lenient_text")]
    pub match_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub room_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub wager: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tokens_remaining: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct JoinRoomReply {
    #[serde(deserialize_with = "required_text")]
    pub match_id: String,
    #[serde(deserialize_with = "required_text")]
    pub opponent: String,
    #[serde(deserialize_with = "required_text")]
    pub current_turn: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub wager: Option<String>,
}

/// Every field is display-only; a final move may carry no `next_turn`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TurnReply {
    #[serde(default, deserialize_with = "lenient_text")]
    pub card: Option<String>,
    #[serde(rename = "move", default, deserialize_with = "lenient_text")]
    pub move_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub damage: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub next_turn: Option<String>,
}

// The process encodes scalars as strings or numbers depending on the handler;
// both render the same. Empty strings count as absent.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_of))
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Err(serde::de::Error::custom("expected a value, found null")),
        Value::String(s) => Ok(s.clone()),
        other => Ok(other.to_string()),
    }
}

// Empty Lua tables serialize as `[]`, so anything but an object means no cards.
fn lenient_cards<'de, D>(deserializer: D) -> Result<HashMap<String, PlayerCards>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(HashMap::new()),
    }
}
