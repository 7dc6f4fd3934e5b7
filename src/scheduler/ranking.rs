use super::{util, Scheduler};
use crate::model::ShiftCategory;
use std::cmp::Ordering;

/// Clé de tri d'un candidat ; l'ordre croissant place le meilleur en tête.
#[derive(Debug, Clone, Copy)]
struct RankKey {
    over_target: bool,
    debt: f64,
    shift_count: u32,
    consecutive: u32,
    days_since_last: i64,
}

impl RankKey {
    fn compare(&self, other: &Self) -> Ordering {
        self.over_target
            .cmp(&other.over_target)
            .then_with(|| other.debt.total_cmp(&self.debt))
            .then_with(|| self.shift_count.cmp(&other.shift_count))
            .then_with(|| self.consecutive.cmp(&other.consecutive))
            .then_with(|| other.days_since_last.cmp(&self.days_since_last))
    }
}

impl Scheduler {
    /// Dette de quota : retard sur la progression attendue à la date courante.
    ///
    /// `attendu = cible * min(1, jours écoulés / jours du trimestre) * rythme`,
    /// rythme 0.7 pour le week-end, 0.8 sinon. Au-delà de la cible, la dette
    /// devient une pénalité `-(dépassement + 1) * 100` qui relègue l'interne
    /// en fin de classement.
    pub fn get_quota_debt(&self, name: &str, category: ShiftCategory) -> f64 {
        let Some(resident) = self.resident(name) else {
            return 0.0;
        };
        let Some(target) = resident.quarter_targets.get(category) else {
            return 0.0;
        };
        let current = self
            .states
            .get(name)
            .map(|s| s.current_stats.get(category))
            .unwrap_or(0.0);

        if current + util::EPSILON >= target {
            return -((current - target + 1.0) * self.config.over_quota_penalty);
        }

        let total = self.config.total_days();
        let elapsed = (self.current_date - self.config.quarter_start).num_days().max(0);
        let progress = if total <= 0 {
            1.0
        } else {
            (elapsed as f64 / total as f64).min(1.0)
        };
        let pacing = match category {
            ShiftCategory::Weekend => self.config.weekend_pacing,
            _ => self.config.call_moonlight_pacing,
        };
        target * progress * pacing - current
    }

    fn over_target(&self, name: &str, category: ShiftCategory) -> bool {
        let (Some(resident), Some(state)) = (self.resident(name), self.states.get(name)) else {
            return false;
        };
        resident
            .quarter_targets
            .get(category)
            .is_some_and(|target| state.current_stats.get(category) + util::EPSILON >= target)
    }

    /// Jours depuis la dernière garde ; jamais affecté = le plus ancien possible.
    pub(super) fn days_since_last_assignment(&self, name: &str) -> i64 {
        self.states
            .get(name)
            .and_then(|s| s.last_assigned)
            .map(|last| (self.current_date - last).num_days())
            .unwrap_or(i64::MAX)
    }

    fn rank_key(&self, name: &str, category: ShiftCategory) -> RankKey {
        let state = self.states.get(name);
        RankKey {
            over_target: self.over_target(name, category),
            debt: self.get_quota_debt(name, category),
            shift_count: state.map_or(0, |s| s.shift_count),
            consecutive: state.map_or(0, |s| s.consecutive_shift_count),
            days_since_last: self.days_since_last_assignment(name),
        }
    }

    /// Meilleur candidat pour la catégorie. À égalité parfaite, l'ordre
    /// d'entrée est conservé (tri stable).
    pub fn select_best_candidate(
        &self,
        candidates: &[String],
        category: ShiftCategory,
    ) -> Option<String> {
        match candidates {
            [] => None,
            [only] => Some(only.clone()),
            _ => {
                let mut ranked: Vec<(&String, RankKey)> = candidates
                    .iter()
                    .map(|name| (name, self.rank_key(name, category)))
                    .collect();
                ranked.sort_by(|a, b| a.1.compare(&b.1));
                ranked.first().map(|(name, _)| (*name).clone())
            }
        }
    }

    /// Anti-regroupement : le gagnant prend +1, les autres candidats -1 (plancher 0).
    pub fn rebalance_consecutive(&mut self, winner: &str, candidates: &[String]) {
        for name in candidates {
            let Some(state) = self.states.get_mut(name) else {
                continue;
            };
            if name == winner {
                state.consecutive_shift_count += 1;
            } else {
                state.consecutive_shift_count = state.consecutive_shift_count.saturating_sub(1);
            }
        }
    }

    /// Sélection + rééquilibrage, la séquence utilisée par l'orchestrateur.
    pub(super) fn pick(&mut self, candidates: &[String], category: ShiftCategory) -> Option<String> {
        let winner = self.select_best_candidate(candidates, category)?;
        self.rebalance_consecutive(&winner, candidates);
        Some(winner)
    }
}
