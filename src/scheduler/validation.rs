use super::{util, Scheduler, Violation, ViolationKind};
use crate::model::{ShiftCategory, ShiftType};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeMap;

impl Scheduler {
    /// Repasse sur l'état final : plafonds mensuels, jours consécutifs,
    /// dépassements de cible trimestrielle, plafond hebdomadaire.
    /// Diagnostic uniquement, rien n'est corrigé.
    pub fn run_comprehensive_validation(&mut self) -> Vec<Violation> {
        let mut out = Vec::new();
        for resident in &self.residents {
            let name = resident.name.as_str();
            let Some(state) = self.states.get(name) else {
                continue;
            };

            let limits = resident.monthly_limits();
            for (month, counts) in &state.monthly_stats {
                for category in ShiftCategory::QUOTA {
                    let limit = limits.get(category).unwrap_or(f64::INFINITY);
                    let done = counts.get(category);
                    if done > limit + util::EPSILON {
                        out.push(Violation {
                            kind: ViolationKind::MonthlyLimitExceeded,
                            resident: name.to_string(),
                            date: None,
                            detail: format!("{month}: {category} {done} > {limit}"),
                        });
                    }
                }
            }

            let mut by_day: BTreeMap<NaiveDate, Vec<ShiftType>> = BTreeMap::new();
            for shift in self.schedule.shifts_of(name) {
                by_day.entry(shift.date).or_default().push(shift.shift_type);
            }
            for (date, types) in &by_day {
                let Some(next_types) = by_day.get(&(*date + Duration::days(1))) else {
                    continue;
                };
                if adjacency_allowed(*date, types, next_types) {
                    continue;
                }
                out.push(Violation {
                    kind: ViolationKind::ConsecutiveDays,
                    resident: name.to_string(),
                    date: Some(*date),
                    detail: format!("shifts on {date} and the following day"),
                });
            }

            let mut weeks: BTreeMap<NaiveDate, (u32, bool)> = BTreeMap::new();
            for (date, types) in &by_day {
                let week = weeks.entry(util::week_start(*date)).or_default();
                week.0 += u32::try_from(types.len()).unwrap_or(u32::MAX);
                if date.weekday() == Weekday::Sat && types.iter().any(|t| t.is_weekend_block()) {
                    week.1 = true;
                }
            }
            for (start, (count, has_block)) in weeks {
                let load = count + u32::from(has_block);
                if load > self.config.weekly_shift_cap {
                    out.push(Violation {
                        kind: ViolationKind::WeeklyLimitExceeded,
                        resident: name.to_string(),
                        date: Some(start),
                        detail: format!(
                            "{load} slots in week of {start} (cap {})",
                            self.config.weekly_shift_cap
                        ),
                    });
                }
            }

            for category in ShiftCategory::QUOTA {
                let Some(target) = resident.quarter_targets.get(category) else {
                    continue;
                };
                let done = state.current_stats.get(category);
                if done > target + util::EPSILON {
                    out.push(Violation {
                        kind: ViolationKind::QuotaExceeded,
                        resident: name.to_string(),
                        date: None,
                        detail: format!("{category} {done} > target {target}"),
                    });
                }
            }
        }

        self.report_violations(&out);
        out
    }

    fn report_violations(&mut self, violations: &[Violation]) {
        if violations.is_empty() {
            self.journal.info(None, "validation passed: no violations");
            return;
        }
        let shown = self.config.validation_report_limit;
        for v in violations.iter().take(shown) {
            self.journal
                .warn(v.date, format!("{:?} for {}: {}", v.kind, v.resident, v.detail));
        }
        if violations.len() > shown {
            self.journal.warn(
                None,
                format!("... and {} more violations", violations.len() - shown),
            );
        }
        self.journal.info(
            None,
            format!("validation found {} violations", violations.len()),
        );
    }
}

/// Vendredi -> samedi, ou samedi -> dimanche à l'intérieur d'un bloc week-end.
fn adjacency_allowed(date: NaiveDate, today: &[ShiftType], tomorrow: &[ShiftType]) -> bool {
    match date.weekday() {
        Weekday::Fri => true,
        Weekday::Sat => {
            today.iter().all(|t| t.is_weekend_block()) && tomorrow.iter().all(|t| t.is_weekend_block())
        }
        _ => false,
    }
}
