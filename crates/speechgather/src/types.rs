use std::{fmt::Display, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::normalize::normalize;

pub const UNKNOWN_SPEAKER: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
#[error("Invalid chamber '{0}'. Accepted values: 'representatives', 'senate'")]
pub struct ChamberParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chamber {
    Representatives,
    Senate,
}

impl Chamber {
    pub fn api_value(&self) -> &'static str {
        match self {
            Chamber::Representatives => "representatives",
            Chamber::Senate => "senate",
        }
    }

    pub fn members_function(&self) -> &'static str {
        match self {
            Chamber::Representatives => "getRepresentatives",
            Chamber::Senate => "getSenators",
        }
    }
}

impl FromStr for Chamber {
    type Err = ChamberParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "representatives" => Ok(Chamber::Representatives),
            "senate" => Ok(Chamber::Senate),
            _ => Err(ChamberParseError(s.to_string())),
        }
    }
}

impl Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chamber::Representatives => write!(f, "House of Representatives"),
            Chamber::Senate => write!(f, "Senate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "gid", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "hdate")]
    pub date: String,
    #[serde(rename = "speaker", default, deserialize_with = "speaker_full_name")]
    pub speaker_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(rename = "listurl", default)]
    pub detail_url: Option<String>,
}

impl RawRecord {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSpeech {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub speaker_name: String,
    pub source_url: String,
    pub full_text: String,
}

impl CanonicalSpeech {
    pub fn to_ascii(&self) -> CanonicalSpeech {
        CanonicalSpeech {
            id: self.id.clone(),
            date: self.date,
            speaker_name: normalize(&self.speaker_name),
            source_url: self.source_url.clone(),
            full_text: normalize(&self.full_text),
        }
    }
}

impl Display for CanonicalSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let date = self
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown date".to_string());
        writeln!(f, "┌─ {} ─ {} ─ {}", self.speaker_name, date, self.id)?;
        writeln!(f, "│  {}", self.source_url)?;
        let preview: String = self.full_text.chars().take(240).collect();
        if preview.len() < self.full_text.len() {
            writeln!(f, "└─ {}…", preview)
        } else {
            writeln!(f, "└─ {}", preview)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MemberRow")]
pub struct Member {
    pub member_id: Option<String>,
    pub person_id: String,
    pub name: String,
    pub party: Option<String>,
    pub constituency: Option<String>,
}

// Listings name the member `name`; single-member lookups use `full_name`.
#[derive(Deserialize)]
struct MemberRow {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    member_id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    person_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    party: Option<String>,
    #[serde(default)]
    constituency: Option<String>,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member {
            member_id: row.member_id,
            person_id: row.person_id,
            name: row.name.or(row.full_name).unwrap_or_default(),
            party: row.party,
            constituency: row.constituency,
        }
    }
}

impl Display for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(party) = &self.party {
            write!(f, " ({})", party)?;
        }
        if let Some(constituency) = &self.constituency {
            write!(f, " — {}", constituency)?;
        }
        write!(f, " [person {}]", self.person_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "string_or_number")]
    pub comment_id: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub posted: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl Display for Comment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} on {}: {}",
            self.username.as_deref().unwrap_or(UNKNOWN_SPEAKER),
            self.posted.as_deref().unwrap_or("unknown date"),
            self.body
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub name: String,
}

impl Display for Division {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_string(value).ok_or_else(|| serde::de::Error::custom("expected string or number"))
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// The API sends an object for a known speaker and `[]` or nothing otherwise.
fn speaker_full_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .get("full_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string))
}
