use super::{util, Scheduler};
use crate::model::{PgyLevel, Resident, ShiftCategory, ShiftType};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

impl Scheduler {
    /// Congé, garde déjà tenue ce jour-là, ou fenêtre de récupération post-garde.
    pub fn is_available(&self, name: &str, date: NaiveDate) -> bool {
        let Some(resident) = self.resident(name) else {
            return false;
        };
        !resident.time_off.contains(&date)
            && !self.schedule.has_resident(date, name)
            && self.recovery_until(name, date).is_none()
    }

    /// Ni congé ni garde ce jour-là ; sert à compléter le dimanche d'un bloc
    /// dont le samedi ouvre déjà une récupération.
    pub(super) fn free_on(&self, name: &str, date: NaiveDate) -> bool {
        self.resident(name)
            .is_some_and(|r| !r.time_off.contains(&date))
            && !self.schedule.has_resident(date, name)
    }

    /// Fin de la récupération qui couvre `date`, le cas échéant.
    fn recovery_until(&self, name: &str, date: NaiveDate) -> Option<NaiveDate> {
        let prev = date.pred_opt()?;
        let called_yesterday = self
            .schedule
            .on(prev)
            .iter()
            .any(|s| s.resident == name && s.shift_type.starts_recovery());
        if called_yesterday {
            return Some(date);
        }
        let until = self.states.get(name)?.recovery_until?;
        (until - Duration::days(1) <= date && date <= until).then_some(until)
    }

    /// Blackouts PGY-2 de début d'année : pas de call avant le 15 juillet,
    /// pas de moonlight avant le 1er août.
    pub fn pgy2_blackout_ok(&self, name: &str, date: NaiveDate, shift_type: ShiftType) -> bool {
        let Some(resident) = self.resident(name) else {
            return false;
        };
        if resident.pgy_level != PgyLevel::PGY2 {
            return true;
        }
        if shift_type.is_call_duty() && date < self.config.pgy2_call_start {
            return false;
        }
        if shift_type.is_moonlight() && date < self.config.pgy2_moonlight_start {
            return false;
        }
        true
    }

    /// Plafond mensuel de la catégorie. Au plafond, l'interne n'est bloqué que
    /// si un pair du même PGY est sous son propre plafond et disponible.
    pub fn monthly_limit_ok(&mut self, name: &str, date: NaiveDate, shift_type: ShiftType) -> bool {
        if !self.monthly_block_applies(name, date, shift_type) {
            return true;
        }
        self.stats.monthly_blocks += 1;
        self.journal.warn(
            Some(date),
            format!(
                "{name} blocked by monthly {} limit; same-level peers still have room",
                shift_type.category()
            ),
        );
        false
    }

    pub(super) fn monthly_block_applies(
        &self,
        name: &str,
        date: NaiveDate,
        shift_type: ShiftType,
    ) -> bool {
        let Some(resident) = self.resident(name) else {
            return false;
        };
        let category = shift_type.category();
        if !self.at_monthly_limit(resident, date, category) {
            return false;
        }
        self.residents.iter().any(|peer| {
            peer.name != resident.name
                && peer.pgy_level == resident.pgy_level
                && !self.at_monthly_limit(peer, date, category)
                && self.is_available(&peer.name, date)
        })
    }

    pub(super) fn at_monthly_limit(
        &self,
        resident: &Resident,
        date: NaiveDate,
        category: ShiftCategory,
    ) -> bool {
        let Some(limit) = resident.monthly_limits().get(category) else {
            return false;
        };
        let done = self
            .states
            .get(&resident.name)
            .map(|s| s.monthly(date, category))
            .unwrap_or(0.0);
        done + util::EPSILON >= limit
    }

    /// Aucune garde la veille, sauf vendredi -> samedi (entrée de bloc week-end).
    pub fn consecutive_day_ok(&self, name: &str, date: NaiveDate) -> bool {
        let Some(prev) = date.pred_opt() else {
            return true;
        };
        if util::is_friday_to_saturday(prev, date) {
            return true;
        }
        !self.schedule.has_resident(prev, name)
    }

    /// Pas de moonlight le lendemain d'une garde de type call.
    pub fn post_call_recovery_ok(&self, name: &str, date: NaiveDate) -> bool {
        let Some(prev) = date.pred_opt() else {
            return true;
        };
        !self
            .schedule
            .on(prev)
            .iter()
            .any(|s| s.resident == name && s.shift_type.is_call_duty())
    }

    /// Plafond hebdomadaire : une affectation du samedi compte pour deux
    /// (le bloc samedi + dimanche).
    pub fn weekly_limit_ok(&self, name: &str, date: NaiveDate) -> bool {
        let slots = if date.weekday() == Weekday::Sat { 2 } else { 1 };
        self.week_count(name, date) + slots <= self.config.weekly_shift_cap
    }

    pub(super) fn week_count(&self, name: &str, date: NaiveDate) -> u32 {
        let count = self
            .schedule
            .shifts_of(name)
            .filter(|s| util::in_week_of(date, s.date))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Numéro du week-end dans le trimestre (1 = premier samedi).
    pub fn weekend_number(&self, date: NaiveDate) -> Option<u32> {
        let first = util::first_saturday(self.config.quarter_start);
        let offset = (date - first).num_days();
        if offset < 0 {
            return None;
        }
        u32::try_from(offset / 7 + 1).ok()
    }

    /// Le vendredi, le `weekday_call` est réservé aux PGY-3.
    fn friday_call_ok(resident: &Resident, date: NaiveDate, shift_type: ShiftType) -> bool {
        !(shift_type == ShiftType::WeekdayCall && date.weekday() == Weekday::Fri)
            || resident.pgy_level == PgyLevel::PGY3
    }

    /// Niveaux autorisés par rôle de week-end.
    fn weekend_tier_ok(&self, resident: &Resident, date: NaiveDate, shift_type: ShiftType) -> bool {
        match shift_type {
            ShiftType::WeekendCall => match self.weekend_number(date) {
                Some(n) if n <= self.config.chief_weekends => resident.pgy_level == PgyLevel::PGY3,
                Some(_) => resident.pgy_level == PgyLevel::PGY2,
                None => true,
            },
            ShiftType::WeekendMoonlight => resident.pgy_level >= PgyLevel::PGY3,
            ShiftType::SplitCall => resident.pgy_level == PgyLevel::PGY4,
            _ => true,
        }
    }

    /// Internes éligibles pour `shift_type` à `date`, dans l'ordre du roster.
    pub fn get_eligible_residents(
        &mut self,
        date: NaiveDate,
        shift_type: ShiftType,
        exclude: &[String],
        pgy_level: Option<PgyLevel>,
    ) -> Vec<String> {
        let pool: Vec<Resident> = self
            .residents
            .iter()
            .filter(|r| !exclude.contains(&r.name))
            .filter(|r| pgy_level.map_or(true, |level| r.pgy_level == level))
            .cloned()
            .collect();

        let mut eligible = Vec::new();
        for resident in pool {
            self.stats.rules_checked += 1;
            let name = resident.name.as_str();
            let ok = self.is_available(name, date)
                && self.pgy2_blackout_ok(name, date, shift_type)
                && self.monthly_limit_ok(name, date, shift_type)
                && Self::friday_call_ok(&resident, date, shift_type)
                && self.weekend_tier_ok(&resident, date, shift_type)
                && self.consecutive_day_ok(name, date)
                && (!shift_type.is_moonlight() || self.post_call_recovery_ok(name, date))
                && self.weekly_limit_ok(name, date);
            if ok {
                eligible.push(resident.name);
            }
        }
        eligible
    }

    /// Raisons lisibles pour lesquelles un interne ne peut pas travailler ce
    /// jour-là (vide s'il est libre).
    pub fn get_unavailability_reasons(&self, name: &str, date: NaiveDate) -> Vec<String> {
        let Some(resident) = self.resident(name) else {
            return vec![format!("unknown resident {name}")];
        };
        let mut reasons = Vec::new();

        if resident.time_off.contains(&date) {
            reasons.push("time off".to_string());
        }
        let held: Vec<&str> = self
            .schedule
            .on(date)
            .iter()
            .filter(|s| s.resident == name)
            .map(|s| s.shift_type.as_str())
            .collect();
        if !held.is_empty() {
            reasons.push(format!("already assigned: {}", held.join(", ")));
        }
        if let Some(until) = self.recovery_until(name, date) {
            reasons.push(format!("post-call recovery until {until}"));
        }
        if resident.pgy_level == PgyLevel::PGY2 {
            if date < self.config.pgy2_call_start {
                reasons.push(format!(
                    "PGY-2 call blackout until {}",
                    self.config.pgy2_call_start
                ));
            }
            if date < self.config.pgy2_moonlight_start {
                reasons.push(format!(
                    "PGY-2 moonlight blackout until {}",
                    self.config.pgy2_moonlight_start
                ));
            }
        }
        let limits = resident.monthly_limits();
        for category in ShiftCategory::QUOTA {
            if self.at_monthly_limit(resident, date, category) {
                let done = self
                    .states
                    .get(name)
                    .map(|s| s.monthly(date, category))
                    .unwrap_or(0.0);
                let limit = limits.get(category).unwrap_or(0.0);
                reasons.push(format!(
                    "monthly {category} limit reached ({done}/{limit} in {})",
                    crate::model::month_key(date)
                ));
            }
        }
        if !self.consecutive_day_ok(name, date) {
            reasons.push("worked the previous day".to_string());
        }
        let week = self.week_count(name, date);
        if week >= self.config.weekly_shift_cap {
            reasons.push(format!(
                "weekly limit reached ({week}/{} in week of {})",
                self.config.weekly_shift_cap,
                util::week_start(date)
            ));
        }
        reasons
    }
}
