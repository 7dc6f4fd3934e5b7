use super::{IssuePriority, Scheduler};
use crate::model::{ShiftCategory, ShiftType};
use chrono::{Datelike, NaiveDate, Weekday};

impl Scheduler {
    /// Lundi..vendredi : demande protégée d'abord, sinon un `weekday_call`
    /// puis le(s) moonlight(s) du jour.
    pub(super) fn process_weekday(&mut self, date: NaiveDate) {
        if self.process_protected_dates(date) {
            return;
        }
        let mut exclude = Vec::new();
        if let Some(caller) = self.fill_weekday_call(date) {
            exclude.push(caller);
        }
        self.fill_moonlight(date, exclude);
    }

    fn fill_weekday_call(&mut self, date: NaiveDate) -> Option<String> {
        if let Some(existing) = self.schedule.find(date, ShiftType::WeekdayCall) {
            return Some(existing.resident.clone());
        }
        let eligible = self.get_eligible_residents(date, ShiftType::WeekdayCall, &[], None);
        match self.pick(&eligible, ShiftCategory::Call) {
            Some(winner) => {
                self.assign(date, &winner, ShiftType::WeekdayCall);
                Some(winner)
            }
            None => {
                self.stats.violations_found += 1;
                self.raise_issue(
                    date,
                    "no_call_coverage",
                    vec![ShiftType::WeekdayCall],
                    IssuePriority::Critical,
                );
                None
            }
        }
    }

    /// Vendredi : deux moonlights successifs ; autres jours : un seul.
    /// Chaque gagnant est exclu des créneaux suivants.
    pub(super) fn fill_moonlight(&mut self, date: NaiveDate, mut exclude: Vec<String>) {
        let slots: &[ShiftType] = if date.weekday() == Weekday::Fri {
            &[ShiftType::FridayMoonlight1, ShiftType::FridayMoonlight2]
        } else {
            &[ShiftType::WeekdayMoonlight]
        };

        for &slot in slots {
            if let Some(existing) = self.schedule.find(date, slot) {
                exclude.push(existing.resident.clone());
                continue;
            }
            let eligible = self.get_eligible_residents(date, slot, &exclude, None);
            match self.pick(&eligible, ShiftCategory::Moonlight) {
                Some(winner) => {
                    self.assign(date, &winner, slot);
                    exclude.push(winner);
                }
                None => {
                    self.stats.violations_found += 1;
                    self.raise_issue(date, "no_moonlight_coverage", vec![slot], IssuePriority::High);
                }
            }
        }
    }
}
