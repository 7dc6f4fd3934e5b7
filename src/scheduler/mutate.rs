use super::{IssuePriority, SchedError, Scheduler};
use crate::model::{month_key, AssignedBy, CategoryCounts, ResidentState, Shift, ShiftType};
use chrono::{Duration, NaiveDate};

impl Scheduler {
    /// Ajoute une garde au planning et met à jour les compteurs de l'interne.
    pub(super) fn record_assignment(
        &mut self,
        date: NaiveDate,
        name: &str,
        shift_type: ShiftType,
        assigned_by: AssignedBy,
    ) -> Result<(), SchedError> {
        let pgy_level = self
            .resident(name)
            .map(|r| r.pgy_level)
            .ok_or_else(|| SchedError::UnknownResident(name.to_string()))?;

        let state = self.states.entry(name.to_string()).or_default();
        apply_to_state(state, date, shift_type);

        self.schedule.push(Shift {
            date,
            shift_type,
            resident: name.to_string(),
            pgy_level,
            assigned_by,
        });
        self.stats.shifts_assigned += 1;
        self.journal.info(
            Some(date),
            format!("{shift_type} -> {name} ({pgy_level}, {})", assigned_by.as_str()),
        );
        Ok(())
    }

    /// Affectation interne au moteur : le candidat vient du roster, l'échec
    /// est donc un défaut de cohérence et reste journalisé.
    pub(super) fn assign(&mut self, date: NaiveDate, name: &str, shift_type: ShiftType) {
        self.assign_as(date, name, shift_type, AssignedBy::System);
    }

    pub(super) fn assign_as(
        &mut self,
        date: NaiveDate,
        name: &str,
        shift_type: ShiftType,
        assigned_by: AssignedBy,
    ) {
        if let Err(err) = self.record_assignment(date, name, shift_type, assigned_by) {
            self.journal.error(Some(date), format!("assignment failed: {err}"));
        }
    }

    /// Bloc samedi + dimanche (le dimanche seulement s'il est dans la période).
    /// Chaque moitié déjà tenue est laissée telle quelle ; une moitié que
    /// `name` ne peut pas prendre devient un trou de couverture.
    pub(super) fn assign_block(
        &mut self,
        saturday: NaiveDate,
        sunday: Option<NaiveDate>,
        name: &str,
        shift_type: ShiftType,
    ) {
        for day in std::iter::once(saturday).chain(sunday) {
            if self.schedule.find(day, shift_type).is_some() {
                continue;
            }
            if self.free_on(name, day) {
                self.assign(day, name, shift_type);
            } else {
                self.journal.warn(
                    Some(day),
                    format!("{name} cannot complete the {shift_type} block on {day}"),
                );
                self.raise_issue(
                    day,
                    "incomplete_weekend_block",
                    vec![shift_type],
                    IssuePriority::High,
                );
            }
        }
    }

    /// Affectation manuelle du chef : remplace la garde du même type à cette
    /// date (jamais d'empilement), puis affecte `name`.
    pub fn apply_override(
        &mut self,
        date: NaiveDate,
        name: &str,
        shift_type: ShiftType,
    ) -> Result<(), SchedError> {
        if self.resident(name).is_none() {
            return Err(SchedError::UnknownResident(name.to_string()));
        }
        if !self.config.contains(date) {
            return Err(SchedError::DateOutOfRange(date));
        }

        let removed = self.schedule.remove(date, shift_type);
        for shift in &removed {
            self.stats.shifts_assigned = self.stats.shifts_assigned.saturating_sub(1);
            self.rebuild_counters(&shift.resident);
            self.journal.info(
                Some(date),
                format!("override removes {shift_type} from {}", shift.resident),
            );
        }

        if let Some(other) = self
            .schedule
            .on(date)
            .iter()
            .find(|s| s.resident == name)
            .map(|s| s.shift_type)
        {
            self.journal.warn(
                Some(date),
                format!("override gives {name} a second shift that day ({other})"),
            );
        }

        self.record_assignment(date, name, shift_type, AssignedBy::Chief)?;
        self.stats.fixes_applied += 1;
        Ok(())
    }

    /// Recalcule les compteurs dérivables du planning pour un interne.
    /// Les compteurs d'anti-regroupement et de premier week-end sont conservés.
    fn rebuild_counters(&mut self, name: &str) {
        let shifts: Vec<(NaiveDate, ShiftType)> = self
            .schedule
            .shifts_of(name)
            .map(|s| (s.date, s.shift_type))
            .collect();
        let Some(state) = self.states.get_mut(name) else {
            return;
        };
        state.current_stats = CategoryCounts::default();
        state.monthly_stats.clear();
        state.shift_count = 0;
        state.last_assigned = None;
        state.recovery_until = None;
        state.last_weekend_moonlight = None;
        for (date, shift_type) in shifts {
            apply_to_state(state, date, shift_type);
        }
    }
}

fn apply_to_state(state: &mut ResidentState, date: NaiveDate, shift_type: ShiftType) {
    let category = shift_type.category();
    let weight = shift_type.quota_weight();
    state.current_stats.add(category, weight);
    state
        .monthly_stats
        .entry(month_key(date))
        .or_default()
        .add(category, weight);
    state.shift_count += 1;
    state.last_assigned = state.last_assigned.max(Some(date));
    if shift_type.starts_recovery() {
        state.recovery_until = state.recovery_until.max(Some(date + Duration::days(1)));
    }
    if shift_type == ShiftType::WeekendMoonlight {
        state.last_weekend_moonlight = state.last_weekend_moonlight.max(Some(date));
    }
}
