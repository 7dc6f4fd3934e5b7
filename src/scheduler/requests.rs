use super::{util, ProtectedDates, ProtectedEntry, Scheduler};
use crate::model::{AssignedBy, PgyLevel, ShiftType};
use chrono::NaiveDate;
use std::cmp::Reverse;

struct Request {
    resident: String,
    date: NaiveDate,
    pgy_level: PgyLevel,
}

impl Scheduler {
    /// Pré-traite toutes les demandes de date : tri par PGY décroissant puis
    /// par date, la première demande valide d'une date l'emporte, les
    /// suivantes sont journalisées et abandonnées.
    pub fn process_all_requests(&mut self) -> &ProtectedDates {
        self.protected.clear();

        let mut requests: Vec<Request> = self
            .residents
            .iter()
            .flat_map(|r| {
                r.specific_requests.iter().map(|date| Request {
                    resident: r.name.clone(),
                    date: *date,
                    pgy_level: r.pgy_level,
                })
            })
            .collect();
        requests.sort_by_key(|r| (Reverse(r.pgy_level), r.date));

        for request in requests {
            let Request {
                resident,
                date,
                pgy_level,
            } = request;

            let holder = self.protected.get(&date).and_then(|entries| {
                entries
                    .iter()
                    .find(|e| e.shift_type == ShiftType::WeekdayCall)
                    .map(|e| e.resident.clone())
            });
            if let Some(holder) = holder {
                self.journal.warn(
                    Some(date),
                    format!("request conflict: {resident} loses {date} to {holder}"),
                );
                continue;
            }

            match self.request_feasibility(&resident, date) {
                Ok(()) => {
                    self.journal
                        .info(Some(date), format!("protected weekday_call for {resident}"));
                    self.protected.entry(date).or_default().push(ProtectedEntry {
                        resident,
                        shift_type: ShiftType::WeekdayCall,
                        priority: pgy_level,
                    });
                }
                Err(reason) => {
                    self.journal
                        .warn(Some(date), format!("request from {resident} rejected: {reason}"));
                }
            }
        }
        &self.protected
    }

    /// Contrôles appliqués à une demande : période, jour de semaine,
    /// disponibilité, blackout PGY-2, veille, semaine, plafond mensuel.
    fn request_feasibility(&mut self, name: &str, date: NaiveDate) -> Result<(), String> {
        if !self.config.contains(date) {
            return Err("date outside the quarter".into());
        }
        if util::is_weekend(date) {
            return Err("weekday call requested on a weekend".into());
        }
        if let Some(holder) = self.schedule.find(date, ShiftType::WeekdayCall) {
            return Err(format!("weekday_call already held by {}", holder.resident));
        }
        if !self.is_available(name, date) {
            return Err("resident unavailable".into());
        }
        if !self.pgy2_blackout_ok(name, date, ShiftType::WeekdayCall) {
            return Err("PGY-2 call blackout".into());
        }
        if !self.consecutive_day_ok(name, date) {
            return Err("worked the previous day".into());
        }
        if !self.weekly_limit_ok(name, date) {
            return Err("weekly limit reached".into());
        }
        if !self.monthly_limit_ok(name, date, ShiftType::WeekdayCall) {
            return Err("monthly call limit reached".into());
        }
        Ok(())
    }

    /// Honore la demande protégée du jour si elle tient toujours, puis complète
    /// les moonlights. Renvoie `true` si la journée est réglée.
    pub fn process_protected_dates(&mut self, date: NaiveDate) -> bool {
        let Some(entry) = self.protected.get(&date).and_then(|entries| {
            entries
                .iter()
                .find(|e| e.shift_type == ShiftType::WeekdayCall)
                .cloned()
        }) else {
            return false;
        };

        if let Err(reason) = self.request_feasibility(&entry.resident, date) {
            self.stats.violations_found += 1;
            self.journal.error(
                Some(date),
                format!("protected request for {} no longer valid: {reason}", entry.resident),
            );
            return false;
        }

        self.assign_as(date, &entry.resident, ShiftType::WeekdayCall, AssignedBy::Request);
        self.stats.requests_honored += 1;
        self.fill_moonlight(date, vec![entry.resident]);
        true
    }
}
