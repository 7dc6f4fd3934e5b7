mod availability;
mod journal;
mod mutate;
mod ranking;
mod requests;
mod types;
mod util;
mod validation;
mod weekday;
mod weekend;

pub use journal::{Journal, JournalEntry, Severity};
pub use types::{
    CoverageIssue, IssuePriority, ProtectedDates, ProtectedEntry, SchedError, ScheduleOutcome,
    ScheduleStats, Violation, ViolationKind,
};
pub use util::week_start;

use crate::config::SchedulerConfig;
use crate::model::{AssignedBy, Resident, ResidentState, Roster, Schedule, Shift, ShiftType};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Session de génération : roster, état des internes, planning, demandes
/// protégées, statistiques, journal et trous de couverture.
///
/// Une instance par génération ; rien n'est partagé entre deux sessions.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: SchedulerConfig,
    residents: Vec<Resident>,
    states: BTreeMap<String, ResidentState>,
    schedule: Schedule,
    protected: ProtectedDates,
    stats: ScheduleStats,
    journal: Journal,
    issues: Vec<CoverageIssue>,
    current_date: NaiveDate,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, residents: Vec<Resident>) -> Result<Self, SchedError> {
        config.validate()?;
        let mut seen = HashSet::new();
        for r in &residents {
            if r.name.trim().is_empty() {
                return Err(SchedError::InvalidRoster("empty resident name".into()));
            }
            if !seen.insert(r.name.as_str()) {
                return Err(SchedError::InvalidRoster(format!(
                    "duplicate resident: {}",
                    r.name
                )));
            }
        }
        let states = residents
            .iter()
            .map(|r| (r.name.clone(), ResidentState::default()))
            .collect();
        let current_date = config.quarter_start;
        Ok(Self {
            config,
            residents,
            states,
            schedule: Schedule::new(),
            protected: ProtectedDates::new(),
            stats: ScheduleStats::default(),
            journal: Journal::default(),
            issues: Vec::new(),
            current_date,
        })
    }

    /// Recharge un roster persisté : les gardes stockées repassent par la
    /// comptabilité pour que les compteurs reflètent le planning.
    pub fn from_roster(config: SchedulerConfig, roster: Roster) -> Result<Self, SchedError> {
        let mut scheduler = Self::new(config, roster.residents)?;
        for shift in roster.schedule.shifts() {
            scheduler.record_assignment(
                shift.date,
                &shift.resident,
                shift.shift_type,
                shift.assigned_by,
            )?;
        }
        scheduler.stats = ScheduleStats::default();
        scheduler.journal.clear();
        Ok(scheduler)
    }

    pub fn to_roster(&self) -> Roster {
        Roster {
            residents: self.residents.clone(),
            schedule: self.schedule.clone(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
    pub fn residents(&self) -> &[Resident] {
        &self.residents
    }
    pub fn resident(&self, name: &str) -> Option<&Resident> {
        self.residents.iter().find(|r| r.name == name)
    }
    pub fn resident_state(&self, name: &str) -> Option<&ResidentState> {
        self.states.get(name)
    }
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }
    pub fn protected_dates(&self) -> &ProtectedDates {
        &self.protected
    }
    pub fn stats(&self) -> &ScheduleStats {
        &self.stats
    }
    pub fn journal(&self) -> &Journal {
        &self.journal
    }
    pub fn coverage_issues(&self) -> &[CoverageIssue] {
        &self.issues
    }

    /// Date de référence pour le calcul de la dette de quota.
    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }
    pub fn set_current_date(&mut self, date: NaiveDate) {
        self.current_date = date;
    }

    /// Réinitialise tout l'état de génération, affectations du chef comprises.
    pub fn reset_schedule(&mut self) {
        self.schedule.clear();
        self.protected.clear();
        self.stats = ScheduleStats::default();
        self.journal.clear();
        self.issues.clear();
        self.current_date = self.config.quarter_start;
        for state in self.states.values_mut() {
            *state = ResidentState::default();
        }
    }

    /// Génère le trimestre complet. Les affectations `chief` déjà présentes
    /// sont conservées ; tout le reste est recalculé.
    pub fn generate_schedule(&mut self) -> Result<ScheduleOutcome, SchedError> {
        let run_id = Uuid::new_v4();
        match self.run_generation(run_id) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.journal
                    .error(Some(self.current_date), format!("generation {run_id} aborted: {err}"));
                Err(err)
            }
        }
    }

    fn run_generation(&mut self, run_id: Uuid) -> Result<ScheduleOutcome, SchedError> {
        let overrides: Vec<Shift> = self
            .schedule
            .shifts()
            .filter(|s| s.assigned_by == AssignedBy::Chief)
            .cloned()
            .collect();
        self.reset_schedule();
        self.journal.info(
            None,
            format!(
                "generation {run_id}: {} residents, {} .. {}",
                self.residents.len(),
                self.config.quarter_start,
                self.config.quarter_end
            ),
        );

        for shift in overrides {
            if self.resident(&shift.resident).is_none() {
                self.journal.warn(
                    Some(shift.date),
                    format!("dropping chief override for unknown resident {}", shift.resident),
                );
                continue;
            }
            self.record_assignment(shift.date, &shift.resident, shift.shift_type, AssignedBy::Chief)?;
        }

        self.process_all_requests();

        let mut date = self.config.quarter_start;
        while date <= self.config.quarter_end {
            self.current_date = date;
            self.stats.days_processed += 1;
            match date.weekday() {
                Weekday::Sat => self.process_weekend(date)?,
                // le dimanche est toujours traité avec son samedi
                Weekday::Sun => {}
                _ => self.process_weekday(date),
            }
            date = date.succ_opt().ok_or(SchedError::DateOverflow(date))?;
        }

        let violations = self.run_comprehensive_validation();
        self.journal.info(
            None,
            format!(
                "generation {run_id} done: {} shifts, {} coverage issues, {} violations",
                self.stats.shifts_assigned,
                self.issues.len(),
                violations.len()
            ),
        );

        Ok(ScheduleOutcome {
            run_id,
            stats: self.stats,
            coverage_issues: self.issues.len(),
            violations,
        })
    }

    /// Enregistre un trou de couverture avec l'instantané des disponibilités.
    fn raise_issue(
        &mut self,
        date: NaiveDate,
        issue_type: &str,
        needed_shift_types: Vec<ShiftType>,
        priority: IssuePriority,
    ) {
        let mut available_residents = Vec::new();
        let mut unavailable_reasons = BTreeMap::new();
        for resident in &self.residents {
            let reasons = self.get_unavailability_reasons(&resident.name, date);
            if reasons.is_empty() {
                available_residents.push(resident.name.clone());
            } else {
                unavailable_reasons.insert(resident.name.clone(), reasons);
            }
        }
        let needed = needed_shift_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let message = format!(
            "coverage issue ({}, {}): {needed}",
            priority.as_str(),
            issue_type
        );
        if priority >= IssuePriority::High {
            self.journal.error(Some(date), message);
        } else {
            self.journal.warn(Some(date), message);
        }
        self.issues.push(CoverageIssue {
            date,
            issue_type: issue_type.to_string(),
            needed_shift_types,
            available_residents,
            unavailable_reasons,
            priority,
        });
    }
}
