//! Unified error classification and recovery.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Timeout,
    Process,
    Authentication,
    Permission,
    Configuration,
    Serialization,
    Unknown,
}

impl ErrorCategory {
    pub fn recovery_suggestion(self) -> RecoverySuggestion {
        match self {
            Self::Validation => RecoverySuggestion::FixInput,
            Self::Timeout => RecoverySuggestion::IncreaseTimeout,
            Self::Process => RecoverySuggestion::InstallCli,
            Self::Authentication => RecoverySuggestion::CheckCredentials,
            Self::Permission => RecoverySuggestion::CheckPermissions,
            Self::Configuration => RecoverySuggestion::CheckConfiguration,
            Self::Serialization | Self::Unknown => RecoverySuggestion::InspectLogs,
        }
    }
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    FixInput,
    IncreaseTimeout,
    InstallCli,
    CheckCredentials,
    CheckPermissions,
    CheckConfiguration,
    InspectLogs,
}
