//! Turn and HistoryRecord - entries of the append-only history log
//!
//! Each record is stored as one line: `<rfc3339>\t<tag>\t<escaped text>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::CapabilityId;

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One utterance, immutable once appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Anything written to the history log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryRecord {
    Turn(Turn),
    /// A capability was synthesized and persisted
    CapabilityCreated {
        id: CapabilityId,
        timestamp: DateTime<Utc>,
    },
    /// Operational note (e.g. a rejected empty input)
    Notice {
        text: String,
        timestamp: DateTime<Utc>,
    },
}

impl HistoryRecord {
    pub fn created(id: CapabilityId) -> Self {
        Self::CapabilityCreated {
            id,
            timestamp: Utc::now(),
        }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::Notice {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Turn(turn) => turn.timestamp,
            Self::CapabilityCreated { timestamp, .. } | Self::Notice { timestamp, .. } => {
                *timestamp
            }
        }
    }

    /// Human-readable form, used in prompts and listings
    pub fn describe(&self) -> String {
        match self {
            Self::Turn(Turn {
                role: Role::User,
                text,
                ..
            }) => format!("User: {}", text),
            Self::Turn(Turn {
                role: Role::Agent,
                text,
                ..
            }) => format!("AI: {}", text),
            Self::CapabilityCreated { id, .. } => format!(
                "Created command '{}' in category '{}'",
                id.name(),
                id.category()
            ),
            Self::Notice { text, .. } => format!("Notice: {}", text),
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Self::Turn(Turn {
                role: Role::User, ..
            }) => "user",
            Self::Turn(Turn {
                role: Role::Agent, ..
            }) => "agent",
            Self::CapabilityCreated { .. } => "created",
            Self::Notice { .. } => "notice",
        }
    }

    /// Encode as a single log line
    pub fn to_line(&self) -> String {
        let body = match self {
            Self::Turn(turn) => turn.text.clone(),
            Self::CapabilityCreated { id, .. } => id.to_string(),
            Self::Notice { text, .. } => text.clone(),
        };
        format!(
            "{}\t{}\t{}",
            self.timestamp().to_rfc3339(),
            self.tag(),
            escape(&body)
        )
    }

    /// Decode a log line; `None` when the line is not a valid record
    pub fn from_line(line: &str) -> Option<Self> {
        let mut parts = line.splitn(3, '\t');
        let timestamp = DateTime::parse_from_rfc3339(parts.next()?)
            .ok()?
            .with_timezone(&Utc);
        let tag = parts.next()?;
        let text = unescape(parts.next()?);

        match tag {
            "user" => Some(Self::Turn(Turn {
                role: Role::User,
                text,
                timestamp,
            })),
            "agent" => Some(Self::Turn(Turn {
                role: Role::Agent,
                text,
                timestamp,
            })),
            "created" => {
                let (category, name) = text.split_once('/')?;
                let id = CapabilityId::new(category, name).ok()?;
                Some(Self::CapabilityCreated { id, timestamp })
            }
            "notice" => Some(Self::Notice { text, timestamp }),
            _ => None,
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
