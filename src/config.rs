use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Paramètres d'une génération : période du trimestre, blackouts PGY-2,
/// coefficients de rythme et plafonds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub quarter_start: NaiveDate,
    pub quarter_end: NaiveDate,
    /// Premier jour où un PGY-2 peut prendre une garde de type call.
    pub pgy2_call_start: NaiveDate,
    /// Premier jour où un PGY-2 peut prendre un moonlight.
    pub pgy2_moonlight_start: NaiveDate,
    pub weekend_pacing: f64,
    pub call_moonlight_pacing: f64,
    pub over_quota_penalty: f64,
    pub weekly_shift_cap: u32,
    /// Week-ends laissés à la main du chef en début de trimestre.
    pub chief_weekends: u32,
    pub validation_report_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::for_quarter(2025, 7, 1, 9, 30)
    }
}

impl SchedulerConfig {
    fn for_quarter(year: i32, sm: u32, sd: u32, em: u32, ed: u32) -> Self {
        let date = |m, d| NaiveDate::from_ymd_opt(year, m, d).unwrap_or(NaiveDate::MIN);
        Self {
            quarter_start: date(sm, sd),
            quarter_end: date(em, ed),
            pgy2_call_start: date(7, 15),
            pgy2_moonlight_start: date(8, 1),
            weekend_pacing: 0.7,
            call_moonlight_pacing: 0.8,
            over_quota_penalty: 100.0,
            weekly_shift_cap: 2,
            chief_weekends: 2,
            validation_report_limit: 10,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.quarter_end < self.quarter_start {
            bail!("quarter_end must not be before quarter_start");
        }
        // un dimanche n'est jamais traité sans son samedi
        if self.quarter_start.weekday() == Weekday::Sun {
            bail!("quarter_start must not be a Sunday: {}", self.quarter_start);
        }
        if self.pgy2_moonlight_start < self.pgy2_call_start {
            bail!("pgy2_moonlight_start must not be before pgy2_call_start");
        }
        for (name, value) in [
            ("weekend_pacing", self.weekend_pacing),
            ("call_moonlight_pacing", self.call_moonlight_pacing),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                bail!("{name} must be in (0, 1]");
            }
        }
        if self.over_quota_penalty <= 0.0 {
            bail!("over_quota_penalty must be > 0");
        }
        if self.weekly_shift_cap < 2 {
            bail!("weekly_shift_cap must be >= 2 (a weekend block counts as 2)");
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.quarter_start <= date && date <= self.quarter_end
    }

    pub fn total_days(&self) -> i64 {
        (self.quarter_end - self.quarter_start).num_days()
    }
}

pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<SchedulerConfig> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
    let config: SchedulerConfig = serde_json::from_slice(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

pub fn export_config_json<P: AsRef<Path>>(path: P, config: &SchedulerConfig) -> Result<()> {
    config.validate()?;
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}
