use crate::model::{PgyLevel, Quotas, Resident, Schedule, Shift};
use crate::scheduler::CoverageIssue;
use anyhow::{bail, Context};
use chrono::{Duration, NaiveDate};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import d'internes depuis CSV, header :
/// `name,pgy_level,annual_call,annual_moonlight,annual_weekend,target_call,target_moonlight,target_weekend[,time_off][,requests]`
///
/// `time_off` et `requests` : dates `YYYY-MM-DD` séparées par `;`, ou plages
/// inclusives `début..fin` / `début/fin`.
pub fn import_residents_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Resident>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        if name.is_empty() {
            bail!("invalid resident row (empty name)");
        }
        let level: u8 = field(&rec, 1, "pgy_level")?
            .parse()
            .with_context(|| format!("invalid pgy_level for {name}"))?;
        let pgy_level = PgyLevel::new(level).map_err(anyhow::Error::msg)?;
        let annual = Quotas::new(
            number(&rec, 2, "annual_call", name)?,
            number(&rec, 3, "annual_moonlight", name)?,
            number(&rec, 4, "annual_weekend", name)?,
        );
        let targets = Quotas::new(
            number(&rec, 5, "target_call", name)?,
            number(&rec, 6, "target_moonlight", name)?,
            number(&rec, 7, "target_weekend", name)?,
        );
        let mut resident = Resident::new(name, pgy_level, annual, targets);
        if let Some(raw) = rec.get(8).map(str::trim).filter(|s| !s.is_empty()) {
            resident.time_off = parse_dates(raw)
                .with_context(|| format!("invalid time_off value for {name}"))?
                .into_iter()
                .collect();
        }
        if let Some(raw) = rec.get(9).map(str::trim).filter(|s| !s.is_empty()) {
            resident.specific_requests = parse_dates(raw)
                .with_context(|| format!("invalid requests value for {name}"))?;
        }
        out.push(resident);
    }
    Ok(out)
}

fn field<'a>(rec: &'a StringRecord, idx: usize, label: &str) -> anyhow::Result<&'a str> {
    rec.get(idx)
        .map(str::trim)
        .with_context(|| format!("missing {label}"))
}

fn number(rec: &StringRecord, idx: usize, label: &str, name: &str) -> anyhow::Result<f64> {
    let value: f64 = field(rec, idx, label)?
        .parse()
        .with_context(|| format!("invalid {label} for {name}"))?;
    if !value.is_finite() || value < 0.0 {
        bail!("{label} for {name} must be a non-negative number");
    }
    Ok(value)
}

fn parse_dates(raw: &str) -> anyhow::Result<Vec<NaiveDate>> {
    let mut out = Vec::new();
    for chunk in raw.split(';').map(str::trim).filter(|c| !c.is_empty()) {
        out.extend(parse_date_chunk(chunk)?);
    }
    Ok(out)
}

fn parse_date_chunk(chunk: &str) -> anyhow::Result<Vec<NaiveDate>> {
    let Some((start_raw, end_raw)) = chunk.split_once("..").or_else(|| chunk.split_once('/'))
    else {
        return Ok(vec![parse_date(chunk)?]);
    };
    let start = parse_date(start_raw.trim())?;
    let end = parse_date(end_raw.trim())?;
    if end < start {
        bail!("date range end before start: {chunk}");
    }
    let days = (end - start).num_days();
    Ok((0..=days).map(|i| start + Duration::days(i)).collect())
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

/// Export JSON du planning : liste plate de gardes
/// `{date, shift_type, resident, pgy_level, assigned_by}`.
pub fn export_schedule_json<P: AsRef<Path>>(path: P, schedule: &Schedule) -> anyhow::Result<()> {
    let shifts: Vec<&Shift> = schedule.shifts().collect();
    let s = serde_json::to_string_pretty(&shifts)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV du planning: header `date,shift_type,resident,pgy_level,assigned_by`
pub fn export_schedule_csv<P: AsRef<Path>>(path: P, schedule: &Schedule) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["date", "shift_type", "resident", "pgy_level", "assigned_by"])?;
    for s in schedule.shifts() {
        let date = s.date.to_string();
        let level = s.pgy_level.get().to_string();
        w.write_record([
            date.as_str(),
            s.shift_type.as_str(),
            s.resident.as_str(),
            level.as_str(),
            s.assigned_by.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des trous de couverture: header `date,priority,issue_type,needed,available`
pub fn export_coverage_csv<P: AsRef<Path>>(path: P, issues: &[CoverageIssue]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["date", "priority", "issue_type", "needed", "available"])?;
    for issue in issues {
        let date = issue.date.to_string();
        let needed = issue
            .needed_shift_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let available = issue.available_residents.join(";");
        w.write_record([
            date.as_str(),
            issue.priority.as_str(),
            issue.issue_type.as_str(),
            needed.as_str(),
            available.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
