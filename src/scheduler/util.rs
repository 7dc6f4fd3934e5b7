use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub(super) const EPSILON: f64 = 1e-9;

/// Début de la fenêtre hebdomadaire utilisée pour le plafond de gardes.
///
/// Un dimanche est son propre début de fenêtre ; les autres jours remontent
/// au dimanche précédent. La fenêtre couvre donc dimanche..samedi.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    if date.weekday() == Weekday::Sun {
        date
    } else {
        date - Duration::days(i64::from(date.weekday().num_days_from_monday()) + 1)
    }
}

pub(super) fn in_week_of(anchor: NaiveDate, date: NaiveDate) -> bool {
    let start = week_start(anchor);
    start <= date && date <= start + Duration::days(6)
}

/// Premier samedi à partir de `from` (inclus).
pub(super) fn first_saturday(from: NaiveDate) -> NaiveDate {
    let offset = (7 + 5 - i64::from(from.weekday().num_days_from_monday())) % 7;
    from + Duration::days(offset)
}

/// Vendredi -> samedi : la seule adjacence tolérée (entrée dans un bloc week-end).
pub(super) fn is_friday_to_saturday(prev: NaiveDate, date: NaiveDate) -> bool {
    prev.weekday() == Weekday::Fri && date.weekday() == Weekday::Sat
}

pub(super) fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
