use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::endgame::LeaderboardEntry;
use crate::sim::PickupKind;

pub const DEFAULT_PORT: u16 = 5555;
pub const FRAME_DELIMITER: u8 = b'\n';
pub const READ_CHUNK_SIZE: usize = 1024;
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Floats on the wire are rounded to this many steps per unit.
pub const WIRE_PRECISION: f32 = 100.0;

const KEY_SCORES_SYNC: &str = "scores_sync";
const KEY_SCORES_MERGED: &str = "scores_merged";
const KEY_REMATCH: &str = "rematch";
const KEY_MATCH_OVER: &str = "match_over";

/// One decoded frame: an ordered mapping of string keys to JSON values.
pub type WireObject = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Joiner,
}

impl Role {
    pub fn opponent(self) -> Self {
        match self {
            Self::Host => Self::Joiner,
            Self::Joiner => Self::Host,
        }
    }

    pub fn is_host(self) -> bool {
        self == Self::Host
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Joiner => "joiner",
        }
    }
}

#[inline]
pub fn round_wire(value: f32) -> f32 {
    (value * WIRE_PRECISION).round() / WIRE_PRECISION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellRecord {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    #[serde(default)]
    pub bounces: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRecord {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: PickupKind,
}

/// One peer's authoritative state for one tick.
///
/// `powerups_data` is only ever sent by the host and is always present in its
/// snapshots, so an empty list means "no pickups left". `picked_powerup_ids`
/// is only sent by the joiner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub hull_angle: f32,
    #[serde(alias = "angle")]
    pub turret_angle: f32,
    pub health: u32,
    #[serde(default)]
    pub ammo: u8,
    #[serde(default)]
    pub shells_data: Vec<ShellRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powerups_data: Option<Vec<PickupRecord>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub picked_powerup_ids: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct MatchOverBody {
    winner: Role,
}

/// Every message the two peers exchange, classified by its distinguishing key.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Snapshot(Snapshot),
    ScoresSync(Vec<LeaderboardEntry>),
    ScoresMerged(Vec<LeaderboardEntry>),
    Rematch(bool),
    MatchOver { winner: Role },
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("frame is not a JSON object")]
    NotAnObject,
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

impl Message {
    pub fn is_control(&self) -> bool {
        !matches!(self, Self::Snapshot(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Snapshot(_) => "snapshot",
            Self::ScoresSync(_) => KEY_SCORES_SYNC,
            Self::ScoresMerged(_) => KEY_SCORES_MERGED,
            Self::Rematch(_) => KEY_REMATCH,
            Self::MatchOver { .. } => KEY_MATCH_OVER,
        }
    }

    pub fn to_wire(&self) -> Result<WireObject, ProtocolError> {
        let (key, value) = match self {
            Self::Snapshot(snapshot) => {
                return match serde_json::to_value(snapshot)? {
                    Value::Object(object) => Ok(object),
                    _ => Err(ProtocolError::NotAnObject),
                };
            }
            Self::ScoresSync(entries) => (KEY_SCORES_SYNC, serde_json::to_value(entries)?),
            Self::ScoresMerged(entries) => (KEY_SCORES_MERGED, serde_json::to_value(entries)?),
            Self::Rematch(requested) => (KEY_REMATCH, Value::Bool(*requested)),
            Self::MatchOver { winner } => (
                KEY_MATCH_OVER,
                serde_json::to_value(MatchOverBody { winner: *winner })?,
            ),
        };

        let mut object = WireObject::new();
        object.insert(key.to_owned(), value);
        Ok(object)
    }

    pub fn from_wire(mut object: WireObject) -> Result<Self, ProtocolError> {
        if let Some(value) = object.remove(KEY_SCORES_SYNC) {
            return Ok(Self::ScoresSync(serde_json::from_value(value)?));
        }
        if let Some(value) = object.remove(KEY_SCORES_MERGED) {
            return Ok(Self::ScoresMerged(serde_json::from_value(value)?));
        }
        if let Some(value) = object.remove(KEY_MATCH_OVER) {
            let body: MatchOverBody = serde_json::from_value(value)?;
            return Ok(Self::MatchOver {
                winner: body.winner,
            });
        }
        if let Some(value) = object.get(KEY_REMATCH) {
            return Ok(Self::Rematch(is_truthy(value)));
        }

        let snapshot = serde_json::from_value(Value::Object(object))?;
        Ok(Self::Snapshot(snapshot))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Null => false,
    }
}
