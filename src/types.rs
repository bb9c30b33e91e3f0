use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::Assignment;

pub type ListId = String;
pub type ClientId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Local,
    /// Exclusion list derived from another list.
    Temp,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Local => "local",
            ListKind::Temp => "temp",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroList {
    pub id: ListId,
    pub name: String,
    pub heroes: Vec<String>,
    pub kind: ListKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_list_id: Option<ListId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The last assignment handed to the user, with the list it was drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    pub timestamp: DateTime<Utc>,
    pub assignment: Assignment,
    pub active_list_id: Option<ListId>,
}
