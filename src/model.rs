use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Année d'internat (PGY) : 2, 3 ou 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PgyLevel(u8);

impl PgyLevel {
    pub const PGY2: PgyLevel = PgyLevel(2);
    pub const PGY3: PgyLevel = PgyLevel(3);
    pub const PGY4: PgyLevel = PgyLevel(4);

    pub fn new(level: u8) -> Result<Self, String> {
        if (2..=4).contains(&level) {
            Ok(Self(level))
        } else {
            Err(format!("pgy level must be 2, 3 or 4 (got {level})"))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PgyLevel {
    type Error = String;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PgyLevel::new(value)
    }
}

impl From<PgyLevel> for u8 {
    fn from(value: PgyLevel) -> Self {
        value.0
    }
}

impl fmt::Display for PgyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PGY-{}", self.0)
    }
}

/// Catégorie de quota à laquelle une garde est imputée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftCategory {
    Call,
    Moonlight,
    Weekend,
    Backup,
}

impl ShiftCategory {
    pub const QUOTA: [ShiftCategory; 3] = [
        ShiftCategory::Call,
        ShiftCategory::Moonlight,
        ShiftCategory::Weekend,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftCategory::Call => "call",
            ShiftCategory::Moonlight => "moonlight",
            ShiftCategory::Weekend => "weekend",
            ShiftCategory::Backup => "backup",
        }
    }
}

impl fmt::Display for ShiftCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type de garde. Les libellés sérialisés sont ceux consommés par les exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShiftType {
    #[serde(rename = "weekday_call")]
    WeekdayCall,
    #[serde(rename = "weekday_moonlight")]
    WeekdayMoonlight,
    #[serde(rename = "friday_moonlight_1")]
    FridayMoonlight1,
    #[serde(rename = "friday_moonlight_2")]
    FridayMoonlight2,
    #[serde(rename = "weekend_call")]
    WeekendCall,
    #[serde(rename = "weekend_moonlight")]
    WeekendMoonlight,
    #[serde(rename = "split_call")]
    SplitCall,
    #[serde(rename = "backup_call")]
    BackupCall,
}

impl ShiftType {
    pub const ALL: [ShiftType; 8] = [
        ShiftType::WeekdayCall,
        ShiftType::WeekdayMoonlight,
        ShiftType::FridayMoonlight1,
        ShiftType::FridayMoonlight2,
        ShiftType::WeekendCall,
        ShiftType::WeekendMoonlight,
        ShiftType::SplitCall,
        ShiftType::BackupCall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::WeekdayCall => "weekday_call",
            ShiftType::WeekdayMoonlight => "weekday_moonlight",
            ShiftType::FridayMoonlight1 => "friday_moonlight_1",
            ShiftType::FridayMoonlight2 => "friday_moonlight_2",
            ShiftType::WeekendCall => "weekend_call",
            ShiftType::WeekendMoonlight => "weekend_moonlight",
            ShiftType::SplitCall => "split_call",
            ShiftType::BackupCall => "backup_call",
        }
    }

    pub fn category(self) -> ShiftCategory {
        match self {
            ShiftType::WeekdayCall => ShiftCategory::Call,
            ShiftType::WeekdayMoonlight
            | ShiftType::FridayMoonlight1
            | ShiftType::FridayMoonlight2
            | ShiftType::WeekendMoonlight => ShiftCategory::Moonlight,
            ShiftType::WeekendCall | ShiftType::SplitCall => ShiftCategory::Weekend,
            ShiftType::BackupCall => ShiftCategory::Backup,
        }
    }

    /// Toute garde de type « call » (soumise au blackout PGY-2 d'été).
    pub fn is_call_duty(self) -> bool {
        matches!(
            self,
            ShiftType::WeekdayCall
                | ShiftType::WeekendCall
                | ShiftType::SplitCall
                | ShiftType::BackupCall
        )
    }

    pub fn is_moonlight(self) -> bool {
        self.category() == ShiftCategory::Moonlight
    }

    /// Gardes qui ouvrent une fenêtre de récupération jusqu'au lendemain.
    pub fn starts_recovery(self) -> bool {
        matches!(
            self,
            ShiftType::WeekdayCall | ShiftType::WeekendCall | ShiftType::SplitCall
        )
    }

    /// Gardes attribuées en bloc samedi + dimanche.
    pub fn is_weekend_block(self) -> bool {
        matches!(
            self,
            ShiftType::WeekendCall
                | ShiftType::WeekendMoonlight
                | ShiftType::SplitCall
                | ShiftType::BackupCall
        )
    }

    /// Poids imputé au compteur de la catégorie, par jour de garde.
    ///
    /// Un bloc week-end de `weekend_call` vaut 1 week-end, un bloc de
    /// `split_call` un demi week-end (d'où les quotas fractionnaires).
    pub fn quota_weight(self) -> f64 {
        match self {
            ShiftType::WeekendCall => 0.5,
            ShiftType::SplitCall => 0.25,
            _ => 1.0,
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShiftType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("unknown shift type: {s}"))
    }
}

/// Origine d'une affectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignedBy {
    System,
    Chief,
    Request,
}

impl AssignedBy {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignedBy::System => "system",
            AssignedBy::Chief => "chief",
            AssignedBy::Request => "request",
        }
    }
}

/// Quotas par catégorie (annuels ou trimestriels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quotas {
    pub call: f64,
    pub moonlight: f64,
    pub weekend: f64,
}

impl Quotas {
    pub fn new(call: f64, moonlight: f64, weekend: f64) -> Self {
        Self {
            call,
            moonlight,
            weekend,
        }
    }

    /// `None` pour le backup, qui n'a pas de quota.
    pub fn get(&self, category: ShiftCategory) -> Option<f64> {
        match category {
            ShiftCategory::Call => Some(self.call),
            ShiftCategory::Moonlight => Some(self.moonlight),
            ShiftCategory::Weekend => Some(self.weekend),
            ShiftCategory::Backup => None,
        }
    }

    /// Plafonds mensuels dérivés : `ceil(annuel / 12)`.
    pub fn monthly_limits(&self) -> Quotas {
        Quotas {
            call: (self.call / 12.0).ceil(),
            moonlight: (self.moonlight / 12.0).ceil(),
            weekend: (self.weekend / 12.0).ceil(),
        }
    }
}

/// Interne et ses contraintes, tels que saisis pour le trimestre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    pub name: String,
    pub pgy_level: PgyLevel,
    pub annual_quotas: Quotas,
    pub quarter_targets: Quotas,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub time_off: BTreeSet<NaiveDate>,
    /// Dates souhaitées pour un `weekday_call`, dans l'ordre de saisie.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific_requests: Vec<NaiveDate>,
}

impl Resident {
    pub fn new<N: Into<String>>(
        name: N,
        pgy_level: PgyLevel,
        annual_quotas: Quotas,
        quarter_targets: Quotas,
    ) -> Self {
        Self {
            name: name.into(),
            pgy_level,
            annual_quotas,
            quarter_targets,
            time_off: BTreeSet::new(),
            specific_requests: Vec::new(),
        }
    }

    pub fn with_time_off(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.time_off.extend(dates);
        self
    }

    pub fn with_requests(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.specific_requests.extend(dates);
        self
    }

    pub fn monthly_limits(&self) -> Quotas {
        self.annual_quotas.monthly_limits()
    }
}

/// Compteurs par catégorie (quotas + backup).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub call: f64,
    pub moonlight: f64,
    pub weekend: f64,
    pub backup: f64,
}

impl CategoryCounts {
    pub fn get(&self, category: ShiftCategory) -> f64 {
        match category {
            ShiftCategory::Call => self.call,
            ShiftCategory::Moonlight => self.moonlight,
            ShiftCategory::Weekend => self.weekend,
            ShiftCategory::Backup => self.backup,
        }
    }

    pub fn add(&mut self, category: ShiftCategory, amount: f64) {
        let slot = match category {
            ShiftCategory::Call => &mut self.call,
            ShiftCategory::Moonlight => &mut self.moonlight,
            ShiftCategory::Weekend => &mut self.weekend,
            ShiftCategory::Backup => &mut self.backup,
        };
        *slot = (*slot + amount).max(0.0);
    }
}

/// Clé de mois `YYYY-MM`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// État mutable d'un interne pendant une génération.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResidentState {
    pub current_stats: CategoryCounts,
    pub monthly_stats: BTreeMap<String, CategoryCounts>,
    pub has_done_first_weekend: bool,
    pub last_weekend_moonlight: Option<NaiveDate>,
    pub last_assigned: Option<NaiveDate>,
    pub consecutive_shift_count: u32,
    pub recovery_until: Option<NaiveDate>,
    /// Nombre total de gardes (toutes catégories confondues).
    pub shift_count: u32,
}

impl ResidentState {
    pub fn monthly(&self, date: NaiveDate, category: ShiftCategory) -> f64 {
        self.monthly_stats
            .get(&month_key(date))
            .map(|c| c.get(category))
            .unwrap_or(0.0)
    }
}

/// Affectation d'un interne à une garde. Immuable une fois créée.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub resident: String,
    pub pgy_level: PgyLevel,
    pub assigned_by: AssignedBy,
}

/// Planning : date -> gardes dans l'ordre d'affectation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    days: BTreeMap<NaiveDate, Vec<Shift>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, date: NaiveDate) -> &[Shift] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, date: NaiveDate, shift_type: ShiftType) -> Option<&Shift> {
        self.on(date).iter().find(|s| s.shift_type == shift_type)
    }

    pub fn count(&self, date: NaiveDate, shift_type: ShiftType) -> usize {
        self.on(date)
            .iter()
            .filter(|s| s.shift_type == shift_type)
            .count()
    }

    pub fn has_resident(&self, date: NaiveDate, resident: &str) -> bool {
        self.on(date).iter().any(|s| s.resident == resident)
    }

    pub fn residents_on(&self, date: NaiveDate) -> Vec<String> {
        self.on(date).iter().map(|s| s.resident.clone()).collect()
    }

    pub fn push(&mut self, shift: Shift) {
        self.days.entry(shift.date).or_default().push(shift);
    }

    /// Retire les gardes du type donné à cette date et les renvoie.
    pub fn remove(&mut self, date: NaiveDate, shift_type: ShiftType) -> Vec<Shift> {
        let Some(day) = self.days.get_mut(&date) else {
            return Vec::new();
        };
        let (removed, kept): (Vec<Shift>, Vec<Shift>) =
            day.drain(..).partition(|s| s.shift_type == shift_type);
        *day = kept;
        if day.is_empty() {
            self.days.remove(&date);
        }
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &Vec<Shift>)> {
        self.days.iter()
    }

    pub fn shifts(&self) -> impl Iterator<Item = &Shift> {
        self.days.values().flatten()
    }

    pub fn shifts_of<'a>(&'a self, resident: &'a str) -> impl Iterator<Item = &'a Shift> + 'a {
        self.shifts().filter(move |s| s.resident == resident)
    }

    pub fn len(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }
}

/// Roster complet (document persisté)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Roster {
    pub residents: Vec<Resident>,
    #[serde(default)]
    pub schedule: Schedule,
}

impl Roster {
    pub fn find_resident<'a>(&'a self, name: &str) -> Option<&'a Resident> {
        self.residents.iter().find(|r| r.name == name)
    }
    pub fn find_resident_mut(&mut self, name: &str) -> Option<&mut Resident> {
        self.residents.iter_mut().find(|r| r.name == name)
    }
}
