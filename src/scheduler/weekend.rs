use super::{IssuePriority, SchedError, Scheduler};
use crate::model::{AssignedBy, PgyLevel, ShiftCategory, ShiftType};
use chrono::NaiveDate;
use std::cmp::Reverse;

const CHIEF_WEEKEND_SLOTS: [ShiftType; 2] = [ShiftType::WeekendCall, ShiftType::WeekendMoonlight];

impl Scheduler {
    /// Samedi, ancre du bloc week-end ; le dimanche en découle.
    pub(super) fn process_weekend(&mut self, saturday: NaiveDate) -> Result<(), SchedError> {
        let sunday = saturday
            .succ_opt()
            .ok_or(SchedError::DateOverflow(saturday))?;
        let sunday = self.config.contains(sunday).then_some(sunday);

        match self.weekend_number(saturday) {
            Some(n) if n <= self.config.chief_weekends => {
                self.process_chief_weekend(saturday, sunday, n)
            }
            _ => self.process_pgy2_weekend(saturday, sunday),
        }
        Ok(())
    }

    fn has_chief_shift(&self, date: NaiveDate) -> bool {
        self.schedule
            .on(date)
            .iter()
            .any(|s| s.assigned_by == AssignedBy::Chief)
    }

    /// Week-ends réservés au chef : sans saisie de sa part, rien n'est
    /// affecté ; sinon les créneaux manquants sont complétés.
    fn process_chief_weekend(&mut self, saturday: NaiveDate, sunday: Option<NaiveDate>, n: u32) {
        let chief_started =
            self.has_chief_shift(saturday) || sunday.is_some_and(|d| self.has_chief_shift(d));
        if !chief_started {
            self.journal.warn(
                Some(saturday),
                format!("weekend {n} is chief-controlled and has no chief assignment"),
            );
            self.raise_issue(
                saturday,
                "chief_input_required",
                vec![
                    ShiftType::WeekendCall,
                    ShiftType::BackupCall,
                    ShiftType::WeekendMoonlight,
                ],
                IssuePriority::Critical,
            );
            return;
        }

        let days: Vec<(NaiveDate, Option<NaiveDate>)> = match sunday {
            Some(sunday) => vec![(saturday, Some(sunday)), (sunday, Some(saturday))],
            None => vec![(saturday, None)],
        };
        for (day, partner) in days {
            for slot in CHIEF_WEEKEND_SLOTS {
                if self.schedule.find(day, slot).is_some() {
                    continue;
                }
                self.fill_chief_gap(day, partner, slot);
            }
        }
    }

    /// Comble un créneau vide d'un week-end du chef, en gardant de préférence
    /// le titulaire de l'autre jour du bloc.
    fn fill_chief_gap(&mut self, day: NaiveDate, partner: Option<NaiveDate>, slot: ShiftType) {
        let partner_holder = partner
            .and_then(|p| self.schedule.find(p, slot))
            .map(|s| s.resident.clone())
            .filter(|name| self.free_on(name, day));
        if let Some(name) = partner_holder {
            self.assign(day, &name, slot);
            return;
        }

        let busy = self.schedule.residents_on(day);
        let eligible = self.get_eligible_residents(day, slot, &busy, None);
        match self.pick(&eligible, slot.category()) {
            Some(winner) => self.assign(day, &winner, slot),
            None => {
                self.stats.violations_found += 1;
                self.raise_issue(day, "chief_weekend_gap", vec![slot], IssuePriority::High);
            }
        }
    }

    /// Candidats pour un bloc : éligibles le samedi et libres le dimanche.
    fn block_candidates(
        &mut self,
        saturday: NaiveDate,
        sunday: Option<NaiveDate>,
        slot: ShiftType,
        exclude: &[String],
        pgy_level: Option<PgyLevel>,
    ) -> Vec<String> {
        let eligible = self.get_eligible_residents(saturday, slot, exclude, pgy_level);
        match sunday {
            Some(sunday) => eligible
                .into_iter()
                .filter(|name| self.is_available(name, sunday))
                .collect(),
            None => eligible,
        }
    }

    /// Titulaires déjà en place pour ce type de bloc, samedi d'abord, ou
    /// `None` si le bloc est vide. Un bloc à moitié tenu est complété par le
    /// même interne ; deux titulaires différents sont signalés sans ajout.
    fn existing_block(
        &mut self,
        saturday: NaiveDate,
        sunday: Option<NaiveDate>,
        slot: ShiftType,
    ) -> Option<Vec<String>> {
        let sat_holder = self
            .schedule
            .find(saturday, slot)
            .map(|s| s.resident.clone());
        let sun_holder = sunday
            .and_then(|d| self.schedule.find(d, slot))
            .map(|s| s.resident.clone());
        match (sat_holder, sun_holder) {
            (None, None) => None,
            (Some(sat), Some(sun)) if sat != sun => {
                self.journal.warn(
                    Some(saturday),
                    format!("{slot} block is split between {sat} and {sun}"),
                );
                self.raise_issue(
                    saturday,
                    "split_weekend_block",
                    vec![slot],
                    IssuePriority::High,
                );
                Some(vec![sat, sun])
            }
            (Some(name), _) | (None, Some(name)) => {
                self.assign_block(saturday, sunday, &name, slot);
                Some(vec![name])
            }
        }
    }

    /// Week-ends 3+ : PGY-2 de garde (avec mentor PGY-4 pour son premier
    /// week-end), backup du même niveau, moonlight PGY-3/4.
    pub fn process_pgy2_weekend(&mut self, saturday: NaiveDate, sunday: Option<NaiveDate>) {
        let mut staffed: Vec<String> = Vec::new();

        let primary = match self.existing_block(saturday, sunday, ShiftType::WeekendCall) {
            Some(holders) => {
                staffed.extend(holders.iter().cloned());
                holders.into_iter().next()
            }
            None => {
                let picked = self.select_weekend_primary(saturday, sunday);
                if let Some(name) = &picked {
                    self.assign_block(saturday, sunday, name, ShiftType::WeekendCall);
                    staffed.push(name.clone());
                }
                picked
            }
        };
        let Some(primary) = primary else {
            self.stats.violations_found += 1;
            self.raise_issue(
                saturday,
                "no_pgy2_weekend_call",
                vec![ShiftType::WeekendCall],
                IssuePriority::Critical,
            );
            self.fill_weekend_moonlight(saturday, sunday, &staffed);
            return;
        };

        let primary_level = self.resident(&primary).map(|r| r.pgy_level);
        let first_weekend = primary_level == Some(PgyLevel::PGY2)
            && self
                .states
                .get(&primary)
                .is_some_and(|s| !s.has_done_first_weekend);
        match self.existing_block(saturday, sunday, ShiftType::SplitCall) {
            Some(holders) => staffed.extend(holders),
            None if first_weekend => {
                if let Some(mentor) = self.fill_mentor(saturday, sunday, &staffed) {
                    staffed.push(mentor);
                }
            }
            None => {}
        }
        if first_weekend {
            if let Some(state) = self.states.get_mut(&primary) {
                state.has_done_first_weekend = true;
            }
        }

        match self.existing_block(saturday, sunday, ShiftType::BackupCall) {
            Some(holders) => staffed.extend(holders),
            None => {
                if let Some(backup) = self.fill_backup(saturday, sunday, &staffed, primary_level) {
                    staffed.push(backup);
                }
            }
        }
        self.fill_weekend_moonlight(saturday, sunday, &staffed);
    }

    /// PGY-2 n'ayant pas encore fait de week-end d'abord, puis la plus forte
    /// dette de week-end.
    fn select_weekend_primary(
        &mut self,
        saturday: NaiveDate,
        sunday: Option<NaiveDate>,
    ) -> Option<String> {
        let candidates = self.block_candidates(
            saturday,
            sunday,
            ShiftType::WeekendCall,
            &[],
            Some(PgyLevel::PGY2),
        );
        let mut ranked: Vec<(String, bool, f64)> = candidates
            .into_iter()
            .map(|name| {
                let done = self
                    .states
                    .get(&name)
                    .is_some_and(|s| s.has_done_first_weekend);
                let debt = self.get_quota_debt(&name, ShiftCategory::Weekend);
                (name, done, debt)
            })
            .collect();
        ranked.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| b.2.total_cmp(&a.2)));
        ranked.into_iter().next().map(|(name, _, _)| name)
    }

    fn fill_mentor(
        &mut self,
        saturday: NaiveDate,
        sunday: Option<NaiveDate>,
        staffed: &[String],
    ) -> Option<String> {
        let candidates = self.block_candidates(
            saturday,
            sunday,
            ShiftType::SplitCall,
            staffed,
            Some(PgyLevel::PGY4),
        );
        match self.pick(&candidates, ShiftCategory::Weekend) {
            Some(mentor) => {
                self.assign_block(saturday, sunday, &mentor, ShiftType::SplitCall);
                Some(mentor)
            }
            None => {
                self.raise_issue(
                    saturday,
                    "no_pgy4_mentor",
                    vec![ShiftType::SplitCall],
                    IssuePriority::High,
                );
                None
            }
        }
    }

    fn fill_backup(
        &mut self,
        saturday: NaiveDate,
        sunday: Option<NaiveDate>,
        staffed: &[String],
        level: Option<PgyLevel>,
    ) -> Option<String> {
        let candidates =
            self.block_candidates(saturday, sunday, ShiftType::BackupCall, staffed, level);
        match self.pick(&candidates, ShiftCategory::Backup) {
            Some(backup) => {
                self.assign_block(saturday, sunday, &backup, ShiftType::BackupCall);
                Some(backup)
            }
            None => {
                self.raise_issue(
                    saturday,
                    "no_backup_call",
                    vec![ShiftType::BackupCall],
                    IssuePriority::Medium,
                );
                None
            }
        }
    }

    /// PGY-3/4 dont le dernier moonlight de week-end est le plus ancien,
    /// départagés par la dette de moonlight.
    fn fill_weekend_moonlight(
        &mut self,
        saturday: NaiveDate,
        sunday: Option<NaiveDate>,
        staffed: &[String],
    ) {
        if self
            .existing_block(saturday, sunday, ShiftType::WeekendMoonlight)
            .is_some()
        {
            return;
        }
        let candidates = self.block_candidates(
            saturday,
            sunday,
            ShiftType::WeekendMoonlight,
            staffed,
            None,
        );
        let mut ranked: Vec<(String, Reverse<i64>, f64)> = candidates
            .into_iter()
            .map(|name| {
                let gap = self
                    .states
                    .get(&name)
                    .and_then(|s| s.last_weekend_moonlight)
                    .map(|last| (saturday - last).num_days())
                    .unwrap_or(i64::MAX);
                let debt = self.get_quota_debt(&name, ShiftCategory::Moonlight);
                (name, Reverse(gap), debt)
            })
            .collect();
        ranked.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| b.2.total_cmp(&a.2)));

        match ranked.into_iter().next() {
            Some((name, _, _)) => {
                self.assign_block(saturday, sunday, &name, ShiftType::WeekendMoonlight);
            }
            None => {
                self.stats.violations_found += 1;
                self.raise_issue(
                    saturday,
                    "no_weekend_moonlight",
                    vec![ShiftType::WeekendMoonlight],
                    IssuePriority::High,
                );
            }
        }
    }
}
