//! Slot-filling wizard state for structured tasks (club creation).
//!
//! The stage names map to the CHECK constraint on `wizard_states.stage`:
//! `CHECK (stage IN ('start', 'name', 'description', 'category', 'city',
//! 'confirm', 'committed', 'cancelled'))`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Stage of the club-creation wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStage {
    Start,
    Name,
    Description,
    Category,
    City,
    Confirm,
    Committed,
    Cancelled,
}

impl WizardStage {
    /// `committed` and `cancelled` end the wizard and release the agent.
    pub fn is_terminal(self) -> bool {
        matches!(self, WizardStage::Committed | WizardStage::Cancelled)
    }

    /// Completion percentage shown to clients.
    pub fn progress(self) -> u8 {
        match self {
            WizardStage::Start | WizardStage::Cancelled => 0,
            WizardStage::Name => 20,
            WizardStage::Description => 40,
            WizardStage::Category => 60,
            WizardStage::City => 80,
            WizardStage::Confirm => 90,
            WizardStage::Committed => 100,
        }
    }
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardStage::Start => write!(f, "start"),
            WizardStage::Name => write!(f, "name"),
            WizardStage::Description => write!(f, "description"),
            WizardStage::Category => write!(f, "category"),
            WizardStage::City => write!(f, "city"),
            WizardStage::Confirm => write!(f, "confirm"),
            WizardStage::Committed => write!(f, "committed"),
            WizardStage::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for WizardStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(WizardStage::Start),
            "name" => Ok(WizardStage::Name),
            "description" => Ok(WizardStage::Description),
            "category" => Ok(WizardStage::Category),
            "city" => Ok(WizardStage::City),
            "confirm" => Ok(WizardStage::Confirm),
            "committed" => Ok(WizardStage::Committed),
            "cancelled" => Ok(WizardStage::Cancelled),
            other => Err(format!("invalid wizard stage: '{other}'")),
        }
    }
}

/// A field the user can ask to correct at the confirm stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClubField {
    Name,
    Description,
    Category,
    City,
}

impl ClubField {
    /// The stage that collects this field.
    pub fn stage(self) -> WizardStage {
        match self {
            ClubField::Name => WizardStage::Name,
            ClubField::Description => WizardStage::Description,
            ClubField::Category => WizardStage::Category,
            ClubField::City => WizardStage::City,
        }
    }
}

/// Values collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// `None` either because the stage was not reached or the user skipped it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Per-session wizard progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub session_id: Uuid,
    pub stage: WizardStage,
    pub fields: ClubDraft,
    /// Message from the last failed commit, if any.
    pub last_error: Option<String>,
    /// Set while re-entering a single field requested from `confirm`.
    #[serde(default)]
    pub correcting: bool,
    pub updated_at: DateTime<Utc>,
}

impl WizardState {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            stage: WizardStage::Start,
            fields: ClubDraft::default(),
            last_error: None,
            correcting: false,
            updated_at: Utc::now(),
        }
    }

    pub fn progress(&self) -> u8 {
        self.stage.progress()
    }
}
