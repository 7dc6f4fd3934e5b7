#![forbid(unsafe_code)]
use callplan::{
    demo_residents, AssignedBy, IssuePriority, PgyLevel, Quotas, Resident, SchedError, Scheduler,
    SchedulerConfig, Severity, ShiftCategory, ShiftType, ViolationKind,
};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeMap;

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, day).unwrap()
}

fn days(config: &SchedulerConfig) -> impl Iterator<Item = NaiveDate> + '_ {
    let n = (config.quarter_end - config.quarter_start).num_days();
    (0..=n).map(move |i| config.quarter_start + Duration::days(i))
}

fn generated() -> Scheduler {
    let mut s = Scheduler::new(SchedulerConfig::default(), demo_residents()).unwrap();
    s.generate_schedule().unwrap();
    s
}

fn has_issue(s: &Scheduler, date: NaiveDate, issue_type: &str) -> bool {
    s.coverage_issues()
        .iter()
        .any(|i| i.date == date && i.issue_type == issue_type)
}

#[test]
fn demo_quarter_covers_every_weekday() {
    let s = generated();
    assert!(s.stats().shifts_assigned > 0);
    assert_eq!(s.stats().days_processed, 92);

    for date in days(s.config()) {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => {}
            weekday => {
                let calls = s.schedule().count(date, ShiftType::WeekdayCall);
                assert!(
                    calls == 1 || (calls == 0 && has_issue(&s, date, "no_call_coverage")),
                    "{date}: {calls} weekday_call"
                );
                if weekday == Weekday::Fri {
                    for slot in [ShiftType::FridayMoonlight1, ShiftType::FridayMoonlight2] {
                        assert!(
                            s.schedule().count(date, slot) == 1
                                || has_issue(&s, date, "no_moonlight_coverage"),
                            "{date}: missing {slot}"
                        );
                    }
                    assert_eq!(s.schedule().count(date, ShiftType::WeekdayMoonlight), 0);
                } else {
                    assert!(
                        s.schedule().count(date, ShiftType::WeekdayMoonlight) == 1
                            || has_issue(&s, date, "no_moonlight_coverage"),
                        "{date}: missing weekday_moonlight"
                    );
                }
            }
        }
    }

    let critical = s
        .coverage_issues()
        .iter()
        .filter(|i| i.priority == IssuePriority::Critical && i.issue_type == "no_call_coverage")
        .count();
    assert!(critical <= s.stats().violations_found as usize);
}

#[test]
fn friday_call_goes_to_pgy3() {
    let s = generated();
    for shift in s.schedule().shifts() {
        if shift.shift_type == ShiftType::WeekdayCall && shift.date.weekday() == Weekday::Fri {
            assert_eq!(shift.pgy_level, PgyLevel::PGY3, "{}", shift.date);
        }
    }
}

#[test]
fn chief_weekends_wait_for_chief_input() {
    let s = generated();
    for saturday in [d(7, 5), d(7, 12)] {
        assert!(s.schedule().on(saturday).is_empty());
        assert!(s.schedule().on(saturday + Duration::days(1)).is_empty());
        let issue = s
            .coverage_issues()
            .iter()
            .find(|i| i.date == saturday && i.issue_type == "chief_input_required")
            .unwrap();
        assert_eq!(issue.priority, IssuePriority::Critical);
        assert_eq!(
            issue.needed_shift_types,
            vec![
                ShiftType::WeekendCall,
                ShiftType::BackupCall,
                ShiftType::WeekendMoonlight
            ]
        );
        assert_eq!(
            issue.available_residents.len() + issue.unavailable_reasons.len(),
            14
        );
    }
}

#[test]
fn later_weekends_are_pgy2_blocks() {
    let s = generated();
    let mut saturday = d(7, 19);
    while saturday <= s.config().quarter_end {
        let sunday = saturday + Duration::days(1);
        match s.schedule().find(saturday, ShiftType::WeekendCall) {
            Some(primary) => {
                assert_eq!(primary.pgy_level, PgyLevel::PGY2, "{saturday}");
                if let Some(sun) = s.schedule().find(sunday, ShiftType::WeekendCall) {
                    assert_eq!(sun.resident, primary.resident);
                }
                if let Some(backup) = s.schedule().find(saturday, ShiftType::BackupCall) {
                    assert_eq!(backup.pgy_level, primary.pgy_level);
                    assert_ne!(backup.resident, primary.resident);
                }
                if let Some(mentor) = s.schedule().find(saturday, ShiftType::SplitCall) {
                    assert_eq!(mentor.pgy_level, PgyLevel::PGY4);
                }
            }
            None => assert!(has_issue(&s, saturday, "no_pgy2_weekend_call"), "{saturday}"),
        }
        if let Some(moon) = s.schedule().find(saturday, ShiftType::WeekendMoonlight) {
            assert!(moon.pgy_level >= PgyLevel::PGY3);
        }
        saturday += Duration::days(7);
    }
}

#[test]
fn first_pgy2_weekend_gets_a_mentor() {
    let s = generated();
    let mut first: BTreeMap<String, NaiveDate> = BTreeMap::new();
    for shift in s.schedule().shifts() {
        if shift.shift_type == ShiftType::WeekendCall && shift.date.weekday() == Weekday::Sat {
            first.entry(shift.resident.clone()).or_insert(shift.date);
        }
    }
    assert!(!first.is_empty());
    for (resident, saturday) in first {
        assert!(
            s.schedule().count(saturday, ShiftType::SplitCall) == 1
                || has_issue(&s, saturday, "no_pgy4_mentor"),
            "{resident} alone on {saturday}"
        );
        assert!(s.resident_state(&resident).unwrap().has_done_first_weekend);
    }
}

#[test]
fn pgy2_blackouts_hold() {
    let s = generated();
    for shift in s.schedule().shifts() {
        if shift.pgy_level != PgyLevel::PGY2 {
            continue;
        }
        if shift.shift_type.is_call_duty() {
            assert!(shift.date >= d(7, 15), "{} {}", shift.date, shift.shift_type);
        }
        if shift.shift_type.is_moonlight() {
            assert!(shift.date >= d(8, 1), "{} {}", shift.date, shift.shift_type);
        }
    }
}

#[test]
fn no_back_to_back_days_outside_weekend_blocks() {
    let s = generated();
    for resident in s.residents() {
        let mut by_day: BTreeMap<NaiveDate, Vec<ShiftType>> = BTreeMap::new();
        for shift in s.schedule().shifts_of(&resident.name) {
            by_day.entry(shift.date).or_default().push(shift.shift_type);
        }
        for (date, types) in &by_day {
            let next = *date + Duration::days(1);
            let Some(next_types) = by_day.get(&next) else {
                continue;
            };
            let allowed = match date.weekday() {
                Weekday::Fri => true,
                Weekday::Sat => {
                    types.iter().all(|t| t.is_weekend_block())
                        && next_types.iter().all(|t| t.is_weekend_block())
                }
                _ => false,
            };
            assert!(allowed, "{} works {date} and {next}", resident.name);
        }
    }
}

#[test]
fn validation_finds_no_rest_or_weekly_breaches() {
    let mut s = generated();
    let violations = s.run_comprehensive_validation();
    assert!(!violations.iter().any(|v| matches!(
        v.kind,
        ViolationKind::ConsecutiveDays | ViolationKind::WeeklyLimitExceeded
    )));
}

#[test]
fn generation_is_deterministic() {
    let a = generated();
    let b = generated();
    assert_eq!(a.schedule(), b.schedule());
    assert_eq!(a.coverage_issues(), b.coverage_issues());
    assert_eq!(a.stats(), b.stats());
}

#[test]
fn outcome_reports_gaps() {
    let mut s = Scheduler::new(SchedulerConfig::default(), demo_residents()).unwrap();
    let outcome = s.generate_schedule().unwrap();
    assert_eq!(outcome.stats, *s.stats());
    assert_eq!(outcome.coverage_issues, s.coverage_issues().len());
    // les deux premiers week-ends attendent le chef
    assert!(!outcome.is_complete());
}

#[test]
fn override_replaces_instead_of_stacking() {
    let mut s = Scheduler::new(SchedulerConfig::default(), demo_residents()).unwrap();
    s.apply_override(d(7, 9), "Dr. Chen", ShiftType::WeekdayCall)
        .unwrap();
    s.apply_override(d(7, 9), "Dr. Larsen", ShiftType::WeekdayCall)
        .unwrap();

    assert_eq!(s.schedule().count(d(7, 9), ShiftType::WeekdayCall), 1);
    let call = s.schedule().find(d(7, 9), ShiftType::WeekdayCall).unwrap();
    assert_eq!(call.resident, "Dr. Larsen");
    assert_eq!(call.assigned_by, AssignedBy::Chief);

    let chen = s.resident_state("Dr. Chen").unwrap();
    assert_eq!(chen.shift_count, 0);
    assert_eq!(chen.current_stats.get(ShiftCategory::Call), 0.0);
    assert_eq!(chen.recovery_until, None);
    assert_eq!(s.stats().fixes_applied, 2);
    assert_eq!(s.stats().shifts_assigned, 1);
}

#[test]
fn override_rejects_unknown_resident_and_foreign_dates() {
    let mut s = Scheduler::new(SchedulerConfig::default(), demo_residents()).unwrap();
    assert!(matches!(
        s.apply_override(d(7, 9), "Dr. Nobody", ShiftType::WeekdayCall),
        Err(SchedError::UnknownResident(_))
    ));
    assert!(matches!(
        s.apply_override(d(10, 1), "Dr. Chen", ShiftType::WeekdayCall),
        Err(SchedError::DateOutOfRange(_))
    ));
    assert!(s.schedule().is_empty());
}

#[test]
fn chief_override_survives_generation_and_seeds_the_block() {
    let mut s = Scheduler::new(SchedulerConfig::default(), demo_residents()).unwrap();
    s.apply_override(d(7, 5), "Dr. Chen", ShiftType::WeekendCall)
        .unwrap();
    s.generate_schedule().unwrap();

    let sat = s.schedule().find(d(7, 5), ShiftType::WeekendCall).unwrap();
    assert_eq!(sat.resident, "Dr. Chen");
    assert_eq!(sat.assigned_by, AssignedBy::Chief);

    let sun = s.schedule().find(d(7, 6), ShiftType::WeekendCall).unwrap();
    assert_eq!(sun.resident, "Dr. Chen");
    assert_eq!(sun.assigned_by, AssignedBy::System);

    assert!(!has_issue(&s, d(7, 5), "chief_input_required"));
    assert!(has_issue(&s, d(7, 12), "chief_input_required"));
}

#[test]
fn partial_chief_blocks_are_completed_by_the_same_resident() {
    let mut s = Scheduler::new(SchedulerConfig::default(), demo_residents()).unwrap();
    s.apply_override(d(7, 19), "Dr. Walsh", ShiftType::SplitCall)
        .unwrap();
    s.apply_override(d(8, 9), "Dr. Kim", ShiftType::BackupCall)
        .unwrap();
    s.apply_override(d(8, 17), "Dr. Nguyen", ShiftType::WeekendCall)
        .unwrap();
    s.generate_schedule().unwrap();

    let holders = |date: NaiveDate, slot: ShiftType| -> Vec<(String, AssignedBy)> {
        s.schedule()
            .on(date)
            .iter()
            .filter(|shift| shift.shift_type == slot)
            .map(|shift| (shift.resident.clone(), shift.assigned_by))
            .collect()
    };
    let walsh = "Dr. Walsh".to_string();
    let kim = "Dr. Kim".to_string();
    let nguyen = "Dr. Nguyen".to_string();

    assert_eq!(
        holders(d(7, 19), ShiftType::SplitCall),
        vec![(walsh.clone(), AssignedBy::Chief)]
    );
    assert_eq!(
        holders(d(7, 20), ShiftType::SplitCall),
        vec![(walsh, AssignedBy::System)]
    );
    assert_eq!(
        holders(d(8, 9), ShiftType::BackupCall),
        vec![(kim.clone(), AssignedBy::Chief)]
    );
    assert_eq!(
        holders(d(8, 10), ShiftType::BackupCall),
        vec![(kim, AssignedBy::System)]
    );
    // le dimanche du chef fixe aussi le samedi
    assert_eq!(
        holders(d(8, 16), ShiftType::WeekendCall),
        vec![(nguyen.clone(), AssignedBy::System)]
    );
    assert_eq!(
        holders(d(8, 17), ShiftType::WeekendCall),
        vec![(nguyen, AssignedBy::Chief)]
    );

    for saturday in [d(7, 19), d(8, 9), d(8, 16)] {
        assert!(!has_issue(&s, saturday, "split_weekend_block"), "{saturday}");
        assert!(!has_issue(&s, saturday, "incomplete_weekend_block"), "{saturday}");
    }
}

#[test]
fn split_chief_block_is_reported_not_tripled() {
    let mut s = Scheduler::new(SchedulerConfig::default(), demo_residents()).unwrap();
    s.apply_override(d(8, 23), "Dr. Alvarez", ShiftType::WeekendCall)
        .unwrap();
    s.apply_override(d(8, 24), "Dr. Okafor", ShiftType::WeekendCall)
        .unwrap();
    s.generate_schedule().unwrap();

    assert_eq!(s.schedule().count(d(8, 23), ShiftType::WeekendCall), 1);
    assert_eq!(s.schedule().count(d(8, 24), ShiftType::WeekendCall), 1);
    assert_eq!(
        s.schedule()
            .find(d(8, 23), ShiftType::WeekendCall)
            .unwrap()
            .resident,
        "Dr. Alvarez"
    );
    assert_eq!(
        s.schedule()
            .find(d(8, 24), ShiftType::WeekendCall)
            .unwrap()
            .resident,
        "Dr. Okafor"
    );

    let issue = s
        .coverage_issues()
        .iter()
        .find(|i| i.date == d(8, 23) && i.issue_type == "split_weekend_block")
        .unwrap();
    assert_eq!(issue.priority, IssuePriority::High);
    assert_eq!(issue.needed_shift_types, vec![ShiftType::WeekendCall]);
    assert!(!has_issue(&s, d(8, 23), "no_pgy2_weekend_call"));

    // aucun des deux ne sert de backup sur ce week-end
    for date in [d(8, 23), d(8, 24)] {
        if let Some(backup) = s.schedule().find(date, ShiftType::BackupCall) {
            assert_ne!(backup.resident, "Dr. Alvarez");
            assert_ne!(backup.resident, "Dr. Okafor");
        }
    }
}

#[test]
fn validation_report_is_truncated_to_the_limit() {
    let config = SchedulerConfig {
        validation_report_limit: 2,
        ..SchedulerConfig::default()
    };
    let tight = Resident::new(
        "A",
        PgyLevel::PGY3,
        Quotas::new(12.0, 12.0, 12.0),
        Quotas::new(1.0, 1.0, 1.0),
    );
    let mut s = Scheduler::new(config, vec![tight]).unwrap();
    s.apply_override(d(7, 1), "A", ShiftType::WeekdayCall).unwrap();
    s.apply_override(d(7, 3), "A", ShiftType::WeekdayCall).unwrap();
    s.apply_override(d(7, 8), "A", ShiftType::WeekdayMoonlight)
        .unwrap();
    s.apply_override(d(7, 10), "A", ShiftType::WeekdayMoonlight)
        .unwrap();

    // deux plafonds mensuels et deux cibles trimestrielles dépassés
    let violations = s.run_comprehensive_validation();
    assert_eq!(violations.len(), 4);

    let warnings: Vec<&str> = s
        .journal()
        .with_severity(Severity::Warning)
        .map(|e| e.message.as_str())
        .collect();
    assert_eq!(warnings.len(), 3);
    assert!(warnings[0].starts_with("MonthlyLimitExceeded for A: 2025-07:"));
    assert!(warnings[1].starts_with("MonthlyLimitExceeded for A: 2025-07:"));
    assert_eq!(warnings[2], "... and 2 more violations");
    assert!(s
        .journal()
        .with_severity(Severity::Info)
        .any(|e| e.message == "validation found 4 violations"));
}

#[test]
fn duplicate_names_are_refused() {
    let mut residents = demo_residents();
    residents.push(residents[0].clone());
    assert!(matches!(
        Scheduler::new(SchedulerConfig::default(), residents),
        Err(SchedError::InvalidRoster(_))
    ));
}

#[test]
fn reset_clears_the_session() {
    let mut s = generated();
    s.reset_schedule();
    assert!(s.schedule().is_empty());
    assert!(s.coverage_issues().is_empty());
    assert!(s.journal().entries().is_empty());
    assert!(s.protected_dates().is_empty());
    assert_eq!(s.stats().shifts_assigned, 0);
    assert_eq!(s.current_date(), s.config().quarter_start);
    assert_eq!(s.resident_state("Dr. Kim").unwrap().shift_count, 0);
}

#[test]
fn roster_roundtrip_rebuilds_counters() {
    let s = generated();
    let reloaded = Scheduler::from_roster(s.config().clone(), s.to_roster()).unwrap();
    assert_eq!(reloaded.schedule(), s.schedule());
    for r in s.residents() {
        let before = s.resident_state(&r.name).unwrap();
        let after = reloaded.resident_state(&r.name).unwrap();
        assert_eq!(after.current_stats, before.current_stats, "{}", r.name);
        assert_eq!(after.monthly_stats, before.monthly_stats, "{}", r.name);
        assert_eq!(after.shift_count, before.shift_count, "{}", r.name);
    }
    assert_eq!(reloaded.stats().shifts_assigned, 0);
}

#[test]
fn shift_serializes_with_flat_fields() {
    let mut s = Scheduler::new(SchedulerConfig::default(), demo_residents()).unwrap();
    s.apply_override(d(7, 9), "Dr. Chen", ShiftType::WeekdayCall)
        .unwrap();
    let shift = s.schedule().find(d(7, 9), ShiftType::WeekdayCall).unwrap();
    insta::assert_snapshot!(
        serde_json::to_string(shift).unwrap(),
        @r#"{"date":"2025-07-09","shift_type":"weekday_call","resident":"Dr. Chen","pgy_level":3,"assigned_by":"chief"}"#
    );
}

fn peer(name: &str) -> Resident {
    // plafond mensuel de call = 1
    Resident::new(
        name,
        PgyLevel::PGY3,
        Quotas::new(12.0, 120.0, 12.0),
        Quotas::new(6.0, 6.0, 1.0),
    )
}

#[test]
fn monthly_cap_yields_only_when_every_peer_is_saturated() {
    let config = SchedulerConfig {
        quarter_start: d(8, 4),
        quarter_end: d(8, 8),
        ..SchedulerConfig::default()
    };
    let mut s = Scheduler::new(config, vec![peer("A"), peer("B"), peer("C")]).unwrap();
    let outcome = s.generate_schedule().unwrap();

    let call = |date| {
        s.schedule()
            .find(date, ShiftType::WeekdayCall)
            .map(|c| c.resident.as_str())
    };
    let moon = |date| {
        s.schedule()
            .find(date, ShiftType::WeekdayMoonlight)
            .map(|c| c.resident.as_str())
    };
    assert_eq!(call(d(8, 4)), Some("A"));
    assert_eq!(moon(d(8, 4)), Some("B"));
    assert_eq!(call(d(8, 5)), Some("C"));
    assert_eq!(moon(d(8, 5)), None);
    // A est au plafond alors que B a encore de la marge
    assert_eq!(call(d(8, 6)), Some("B"));
    assert_eq!(moon(d(8, 6)), Some("A"));
    // tout le monde est au plafond : C passe au-delà
    assert_eq!(call(d(8, 7)), Some("C"));
    assert_eq!(call(d(8, 8)), None);

    assert_eq!(s.stats().monthly_blocks, 1);
    assert_eq!(s.stats().shifts_assigned, 6);
    assert_eq!(outcome.coverage_issues, 5);
    assert!(has_issue(&s, d(8, 8), "no_call_coverage"));

    assert_eq!(outcome.violations.len(), 1);
    let v = &outcome.violations[0];
    assert_eq!(v.kind, ViolationKind::MonthlyLimitExceeded);
    assert_eq!(v.resident, "C");

    assert!(s
        .journal()
        .with_severity(Severity::Info)
        .any(|e| e.message == "validation found 1 violations"));
}
