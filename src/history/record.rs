use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DiceError, Result},
    rules::conditions::Outcome,
};

/// One evaluated roll, stamped with the moment it was created.
///
/// Internally a tagged enum; on the wire the variant is implied by which
/// fields are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RollRecord {
    #[serde(rename_all = "camelCase")]
    ModifiedTested {
        face: u32,
        modified_value: i32,
        outcome: Outcome,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Modified {
        face: u32,
        modified_value: i32,
        timestamp: DateTime<Utc>,
    },
    Tested {
        face: u32,
        outcome: Outcome,
        timestamp: DateTime<Utc>,
    },
    Plain { face: u32, timestamp: DateTime<Utc> },
}

/// Field-presence form shared by both record shapes on the way in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawRecord {
    face: u32,
    #[serde(default)]
    modified_value: Option<i32>,
    #[serde(default)]
    outcome: Option<Outcome>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

impl TryFrom<RawRecord> for RollRecord {
    type Error = DiceError;

    fn try_from(raw: RawRecord) -> Result<Self> {
        let Some(timestamp) = raw.timestamp else {
            return Err(DiceError::invalid_argument("roll record has no timestamp"));
        };
        let record = match (raw.modified_value, raw.outcome) {
            (None, None) => RollRecord::plain_at(raw.face, timestamp),
            (Some(value), None) => RollRecord::modified_at(raw.face, value, timestamp),
            (None, Some(outcome)) => RollRecord::tested_at(raw.face, outcome, timestamp),
            (Some(value), Some(outcome)) => {
                RollRecord::modified_tested_at(raw.face, value, outcome, timestamp)
            }
        };
        record.validate()?;
        Ok(record)
    }
}

impl TryFrom<RawRecord> for StrippedRecord {
    type Error = DiceError;

    fn try_from(raw: RawRecord) -> Result<Self> {
        if raw.timestamp.is_some() {
            return Err(DiceError::invalid_argument("stripped record carries a timestamp"));
        }
        if raw.face < 1 {
            return Err(DiceError::invalid_argument("a rolled face starts at 1"));
        }
        let face = raw.face;
        Ok(match (raw.modified_value, raw.outcome) {
            (None, None) => StrippedRecord::Plain { face },
            (Some(modified_value), None) => StrippedRecord::Modified {
                face,
                modified_value,
            },
            (None, Some(outcome)) => StrippedRecord::Tested { face, outcome },
            (Some(modified_value), Some(outcome)) => StrippedRecord::ModifiedTested {
                face,
                modified_value,
                outcome,
            },
        })
    }
}

impl<'de> Deserialize<'de> for RollRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawRecord::deserialize(deserializer)?;
        RollRecord::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for StrippedRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawRecord::deserialize(deserializer)?;
        StrippedRecord::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl RollRecord {
    pub fn plain(face: u32) -> Self {
        Self::plain_at(face, Utc::now())
    }

    pub fn modified(face: u32, modified_value: i32) -> Self {
        Self::modified_at(face, modified_value, Utc::now())
    }

    pub fn tested(face: u32, outcome: Outcome) -> Self {
        Self::tested_at(face, outcome, Utc::now())
    }

    pub fn modified_tested(face: u32, modified_value: i32, outcome: Outcome) -> Self {
        Self::modified_tested_at(face, modified_value, outcome, Utc::now())
    }

    pub fn plain_at(face: u32, timestamp: DateTime<Utc>) -> Self {
        RollRecord::Plain { face, timestamp }
    }

    pub fn modified_at(face: u32, modified_value: i32, timestamp: DateTime<Utc>) -> Self {
        RollRecord::Modified {
            face,
            modified_value,
            timestamp,
        }
    }

    pub fn tested_at(face: u32, outcome: Outcome, timestamp: DateTime<Utc>) -> Self {
        RollRecord::Tested {
            face,
            outcome,
            timestamp,
        }
    }

    pub fn modified_tested_at(
        face: u32,
        modified_value: i32,
        outcome: Outcome,
        timestamp: DateTime<Utc>,
    ) -> Self {
        RollRecord::ModifiedTested {
            face,
            modified_value,
            outcome,
            timestamp,
        }
    }

    /// Reads a record from untyped JSON, rejecting anything that is not an
    /// object shaped like one of the known variants.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(DiceError::invalid_argument(format!(
                "a roll record must be an object, got {value}"
            )));
        }
        serde_json::from_value(value).map_err(|e| {
            DiceError::invalid_argument(format!("object matches no roll record shape: {e}"))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.face() < 1 {
            return Err(DiceError::invalid_argument("a rolled face starts at 1"));
        }
        Ok(())
    }

    pub fn face(&self) -> u32 {
        match self {
            RollRecord::Plain { face, .. }
            | RollRecord::Modified { face, .. }
            | RollRecord::Tested { face, .. }
            | RollRecord::ModifiedTested { face, .. } => *face,
        }
    }

    pub fn modified_value(&self) -> Option<i32> {
        match self {
            RollRecord::Modified { modified_value, .. }
            | RollRecord::ModifiedTested { modified_value, .. } => Some(*modified_value),
            RollRecord::Plain { .. } | RollRecord::Tested { .. } => None,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            RollRecord::Tested { outcome, .. } | RollRecord::ModifiedTested { outcome, .. } => {
                Some(*outcome)
            }
            RollRecord::Plain { .. } | RollRecord::Modified { .. } => None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            RollRecord::Plain { timestamp, .. }
            | RollRecord::Modified { timestamp, .. }
            | RollRecord::Tested { timestamp, .. }
            | RollRecord::ModifiedTested { timestamp, .. } => *timestamp,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, RollRecord::Plain { .. })
    }

    pub fn is_modified(&self) -> bool {
        self.modified_value().is_some()
    }

    pub fn is_tested(&self) -> bool {
        self.outcome().is_some()
    }

    /// The same record without its timestamp.
    pub fn strip(&self) -> StrippedRecord {
        match *self {
            RollRecord::Plain { face, .. } => StrippedRecord::Plain { face },
            RollRecord::Modified {
                face,
                modified_value,
                ..
            } => StrippedRecord::Modified {
                face,
                modified_value,
            },
            RollRecord::Tested { face, outcome, .. } => StrippedRecord::Tested { face, outcome },
            RollRecord::ModifiedTested {
                face,
                modified_value,
                outcome,
                ..
            } => StrippedRecord::ModifiedTested {
                face,
                modified_value,
                outcome,
            },
        }
    }

    pub fn pretty_print(&self, f: &mut impl std::fmt::Write) -> std::fmt::Result {
        self.strip().pretty_print(f)?;
        write!(f, " at {}", self.timestamp().format("%H:%M:%S%.3f"))
    }
}

/// A [`RollRecord`] projected without its timestamp, for non-verbose reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StrippedRecord {
    #[serde(rename_all = "camelCase")]
    ModifiedTested {
        face: u32,
        modified_value: i32,
        outcome: Outcome,
    },
    #[serde(rename_all = "camelCase")]
    Modified { face: u32, modified_value: i32 },
    Tested { face: u32, outcome: Outcome },
    Plain { face: u32 },
}

impl StrippedRecord {
    pub fn face(&self) -> u32 {
        match self {
            StrippedRecord::Plain { face }
            | StrippedRecord::Modified { face, .. }
            | StrippedRecord::Tested { face, .. }
            | StrippedRecord::ModifiedTested { face, .. } => *face,
        }
    }

    pub fn pretty_print(&self, f: &mut impl std::fmt::Write) -> std::fmt::Result {
        match self {
            StrippedRecord::Plain { face } => write!(f, "rolled {face}"),
            StrippedRecord::Modified {
                face,
                modified_value,
            } => write!(f, "rolled {face} -> {modified_value}"),
            StrippedRecord::Tested { face, outcome } => write!(f, "rolled {face} ({outcome})"),
            StrippedRecord::ModifiedTested {
                face,
                modified_value,
                outcome,
            } => write!(f, "rolled {face} -> {modified_value} ({outcome})"),
        }
    }
}

/// A record as it appears in a report: with or without its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordView {
    Full(RollRecord),
    Stripped(StrippedRecord),
}

impl RecordView {
    pub fn face(&self) -> u32 {
        match self {
            RecordView::Full(record) => record.face(),
            RecordView::Stripped(record) => record.face(),
        }
    }
}

impl From<RollRecord> for RecordView {
    fn from(record: RollRecord) -> Self {
        RecordView::Full(record)
    }
}

impl From<StrippedRecord> for RecordView {
    fn from(record: StrippedRecord) -> Self {
        RecordView::Stripped(record)
    }
}
