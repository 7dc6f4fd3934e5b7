use crate::model::{PgyLevel, ShiftType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Compteurs d'une génération, remis à zéro à chaque run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStats {
    pub days_processed: u32,
    pub shifts_assigned: u32,
    pub rules_checked: u32,
    pub violations_found: u32,
    pub fixes_applied: u32,
    pub requests_honored: u32,
    pub monthly_blocks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    Low,
    Medium,
    High,
    Critical,
}

impl IssuePriority {
    pub fn as_str(self) -> &'static str {
        match self {
            IssuePriority::Low => "low",
            IssuePriority::Medium => "medium",
            IssuePriority::High => "high",
            IssuePriority::Critical => "critical",
        }
    }
}

/// Garde requise restée sans titulaire, à résoudre manuellement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageIssue {
    pub date: NaiveDate,
    pub issue_type: String,
    pub needed_shift_types: Vec<ShiftType>,
    pub available_residents: Vec<String>,
    pub unavailable_reasons: BTreeMap<String, Vec<String>>,
    pub priority: IssuePriority,
}

/// Demande protégée avant la boucle journalière.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedEntry {
    pub resident: String,
    pub shift_type: ShiftType,
    pub priority: PgyLevel,
}

pub type ProtectedDates = BTreeMap<NaiveDate, Vec<ProtectedEntry>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MonthlyLimitExceeded,
    ConsecutiveDays,
    QuotaExceeded,
    WeeklyLimitExceeded,
}

/// Écart détecté par la passe de validation finale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub resident: String,
    pub date: Option<NaiveDate>,
    pub detail: String,
}

/// Résultat d'une génération menée jusqu'au bout (éventuellement avec trous).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub run_id: Uuid,
    pub stats: ScheduleStats,
    pub coverage_issues: usize,
    pub violations: Vec<Violation>,
}

impl ScheduleOutcome {
    pub fn is_complete(&self) -> bool {
        self.coverage_issues == 0 && self.violations.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("unknown resident: {0}")]
    UnknownResident(String),
    #[error("date {0} is outside the scheduling period")]
    DateOutOfRange(NaiveDate),
    #[error("invalid roster: {0}")]
    InvalidRoster(String),
    #[error("date arithmetic overflow after {0}")]
    DateOverflow(NaiveDate),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
