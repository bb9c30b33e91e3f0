//! src/message.rs
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::game::{Assignment, Team, TeamStats};
use crate::types::Theme;

/// Invocation frame: { "type": 1, "target": "...", "arguments": [...] }
#[derive(Debug, Deserialize)]
pub struct Incoming {
    #[serde(rename = "type")]
    pub frame_type: u8,
    pub target: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct Outgoing<'a, T: Serialize> {
    #[serde(rename = "type")]
    pub frame_type: u8,
    pub target: &'a str,
    pub arguments: [T; 1],
}

impl<'a, T: Serialize> Outgoing<'a, T> {
    pub fn new(target: &'a str, payload: T) -> Self {
        Self {
            frame_type: 1,
            target,
            arguments: [payload],
        }
    }
}

/// Serialized frame text for `target` carrying `payload`.
pub fn frame<T: Serialize>(target: &str, payload: T) -> String {
    serde_json::to_string(&Outgoing::new(target, payload))
        .unwrap_or_else(|e| error_frame(&e.to_string()))
}

fn error_frame(message: &str) -> String {
    json!({ "type": 1, "target": "error", "arguments": [message] }).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    CreateList { name: String, heroes: Vec<String> },
    SelectList { id: String },
    Lists,
    Generate,
    ReshuffleTeams,
    ReshuffleHeroes,
    ReshuffleAll,
    ReshuffleOne { slot: usize },
    ExcludeOne { slot: usize, confirmed: Option<bool> },
    ExcludeAll { confirmed: Option<bool> },
    ResetSession { confirmed: Option<bool> },
    LastGeneration,
    SetTheme { theme: Theme },
    Stats,
    RawUnknown(String),
}

fn payload<T: for<'de> Deserialize<'de>>(msg: &Incoming) -> Result<T, String> {
    let arg = msg
        .arguments
        .first()
        .cloned()
        .unwrap_or(Value::Object(Default::default()));
    serde_json::from_value(arg).map_err(|e| format!("bad {} payload: {e}", msg.target))
}

pub fn to_client_event(msg: Incoming) -> Result<ClientEvent, String> {
    #[derive(Deserialize)]
    struct CreateListPayload {
        name: String,
        heroes: Vec<String>,
    }
    #[derive(Deserialize)]
    struct IdPayload {
        id: String,
    }
    #[derive(Deserialize)]
    struct SlotPayload {
        slot: usize,
        #[serde(default)]
        confirmed: Option<bool>,
    }
    #[derive(Deserialize)]
    struct ConfirmPayload {
        #[serde(default)]
        confirmed: Option<bool>,
    }
    #[derive(Deserialize)]
    struct ThemePayload {
        theme: Theme,
    }

    let event = match msg.target.as_str() {
        "createList" => {
            let CreateListPayload { name, heroes } = payload(&msg)?;
            ClientEvent::CreateList { name, heroes }
        }
        "selectList" => {
            let IdPayload { id } = payload(&msg)?;
            ClientEvent::SelectList { id }
        }
        "lists" => ClientEvent::Lists,
        "generate" => ClientEvent::Generate,
        "reshuffleTeams" => ClientEvent::ReshuffleTeams,
        "reshuffleHeroes" => ClientEvent::ReshuffleHeroes,
        "reshuffleAll" => ClientEvent::ReshuffleAll,
        "reshuffleOne" => {
            let SlotPayload { slot, .. } = payload(&msg)?;
            ClientEvent::ReshuffleOne { slot }
        }
        "excludeOne" => {
            let SlotPayload { slot, confirmed } = payload(&msg)?;
            ClientEvent::ExcludeOne { slot, confirmed }
        }
        "excludeAll" => {
            let ConfirmPayload { confirmed } = payload(&msg)?;
            ClientEvent::ExcludeAll { confirmed }
        }
        "resetSession" => {
            let ConfirmPayload { confirmed } = payload(&msg)?;
            ClientEvent::ResetSession { confirmed }
        }
        "lastGeneration" => ClientEvent::LastGeneration,
        "setTheme" => {
            let ThemePayload { theme } = payload(&msg)?;
            ClientEvent::SetTheme { theme }
        }
        "stats" => ClientEvent::Stats,
        _ => ClientEvent::RawUnknown(msg.target),
    };
    Ok(event)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView<'a> {
    pub slot_index: usize,
    pub player_number: u8,
    pub hero: &'a str,
    pub team: Team,
}

/// Assignment as the browser renders it, team included.
#[derive(Debug, Serialize)]
pub struct AssignmentView<'a> {
    pub slots: Vec<SlotView<'a>>,
    pub teams: TeamStats,
    pub balanced: bool,
}

impl<'a> From<&'a Assignment> for AssignmentView<'a> {
    fn from(assignment: &'a Assignment) -> Self {
        Self {
            slots: assignment
                .slots()
                .iter()
                .map(|s| SlotView {
                    slot_index: s.slot_index,
                    player_number: s.player_number,
                    hero: &s.hero,
                    team: s.team(),
                })
                .collect(),
            teams: assignment.team_stats(),
            balanced: assignment.is_balanced(),
        }
    }
}
