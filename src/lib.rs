#![forbid(unsafe_code)]
//! Callplan : planification trimestrielle des gardes d'internes.
//!
//! - Gardes de semaine (call + moonlight), blocs week-end par niveau PGY.
//! - Règles : congés, récupération post-garde, blackouts PGY-2, plafonds
//!   mensuels et hebdomadaires, jours consécutifs.
//! - Classement des candidats par dette de quota, demandes protégées,
//!   trous de couverture signalés plutôt que comblés en silence.
//! - Stockage fichiers (JSON/CSV), sans base de données.

pub mod config;
pub mod demo;
pub mod io;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use config::{export_config_json, load_config_from_file, SchedulerConfig};
pub use demo::{demo_residents, demo_roster};
pub use model::{
    AssignedBy, CategoryCounts, PgyLevel, Quotas, Resident, ResidentState, Roster, Schedule,
    Shift, ShiftCategory, ShiftType,
};
pub use scheduler::{
    CoverageIssue, IssuePriority, Journal, JournalEntry, ProtectedEntry, SchedError,
    ScheduleOutcome, ScheduleStats, Scheduler, Severity, Violation, ViolationKind,
};
pub use storage::{JsonStorage, Storage};
