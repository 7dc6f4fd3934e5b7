//! Roster de référence : 14 internes (5 PGY-2, 5 PGY-3, 4 PGY-4) pour le
//! trimestre juillet-septembre 2025.

use crate::model::{PgyLevel, Quotas, Resident, Roster};
use chrono::{Duration, NaiveDate};

fn day(month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, d).unwrap_or_default()
}

fn span(month: u32, from: u32, to: u32) -> impl Iterator<Item = NaiveDate> {
    let start = day(month, from);
    (0..=i64::from(to.saturating_sub(from))).map(move |i| start + Duration::days(i))
}

fn pgy2(name: &str) -> Resident {
    Resident::new(
        name,
        PgyLevel::PGY2,
        Quotas::new(16.0, 24.0, 7.5),
        Quotas::new(3.0, 6.0, 2.0),
    )
}

fn pgy3(name: &str) -> Resident {
    Resident::new(
        name,
        PgyLevel::PGY3,
        Quotas::new(28.0, 36.0, 4.0),
        Quotas::new(7.0, 9.0, 1.0),
    )
}

fn pgy4(name: &str) -> Resident {
    Resident::new(
        name,
        PgyLevel::PGY4,
        Quotas::new(20.0, 48.0, 3.0),
        Quotas::new(5.0, 12.0, 1.0),
    )
}

pub fn demo_residents() -> Vec<Resident> {
    vec![
        pgy2("Dr. Kim").with_requests([day(7, 10), day(8, 20)]),
        pgy2("Dr. Alvarez").with_time_off(span(8, 11, 15)),
        pgy2("Dr. Nguyen"),
        pgy2("Dr. Okafor").with_time_off(span(9, 8, 12)),
        pgy2("Dr. Silva").with_requests([day(9, 17)]),
        pgy3("Dr. Chen").with_requests([day(7, 8), day(8, 12)]),
        pgy3("Dr. Rossi").with_requests([day(8, 20)]),
        pgy3("Dr. Haddad").with_time_off(span(7, 21, 25)),
        pgy3("Dr. Larsen"),
        pgy3("Dr. Moreau").with_time_off([day(9, 1), day(9, 2)]),
        pgy4("Dr. Patel").with_requests([day(7, 8), day(9, 3)]),
        pgy4("Dr. Novak").with_time_off(span(8, 25, 29)),
        pgy4("Dr. Ibrahim"),
        pgy4("Dr. Walsh").with_requests([day(7, 22)]),
    ]
}

pub fn demo_roster() -> Roster {
    Roster {
        residents: demo_residents(),
        ..Roster::default()
    }
}
