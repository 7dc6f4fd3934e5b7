#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use callplan::{
    config::{load_config_from_file, SchedulerConfig},
    demo::demo_roster,
    io,
    model::ShiftType,
    scheduler::{ScheduleOutcome, Scheduler},
    storage::{JsonStorage, Storage},
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification des gardes d'internes (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du roster (internes + planning)
    #[arg(long, global = true, default_value = "roster.json")]
    roster: String,

    /// Fichier JSON de configuration (trimestre, coefficients)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Écrire le roster de référence (14 internes)
    Init {
        /// Écrase un roster existant
        #[arg(long)]
        force: bool,
    },

    /// Importer des internes depuis un CSV
    ImportResidents {
        #[arg(long)]
        csv: String,
    },

    /// Générer le planning du trimestre
    Generate {
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
        /// Export CSV des trous de couverture
        #[arg(long)]
        issues_csv: Option<String>,
    },

    /// Affectation manuelle (chef) remplaçant la garde du même type
    Override {
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        resident: String,
        /// ex. weekend_call, weekday_moonlight
        #[arg(long)]
        shift_type: String,
    },

    /// Expliquer pourquoi un interne est indisponible un jour donné
    Explain {
        #[arg(long)]
        resident: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
    },

    /// Revalider le planning stocké
    Check,

    /// Lister le planning
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let config = match &cli.config {
        Some(path) => load_config_from_file(path)?,
        None => SchedulerConfig::default(),
    };
    let storage = JsonStorage::open(&cli.roster)?;

    let code = match cli.cmd {
        Commands::Init { force } => {
            if storage.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    storage.path().display()
                );
            }
            let roster = demo_roster();
            storage.save(&roster)?;
            println!(
                "Wrote {} residents to {}",
                roster.residents.len(),
                storage.path().display()
            );
            0
        }
        Commands::ImportResidents { csv } => {
            let residents = io::import_residents_csv(csv)?;
            let mut roster = storage.load_or_default()?;
            for resident in residents {
                match roster.find_resident_mut(&resident.name) {
                    Some(existing) => *existing = resident,
                    None => roster.residents.push(resident),
                }
            }
            storage.save(&roster)?;
            0
        }
        Commands::Generate {
            out_json,
            out_csv,
            issues_csv,
        } => {
            let mut scheduler = Scheduler::from_roster(config, storage.load()?)?;
            let outcome = scheduler.generate_schedule()?;
            storage.save(&scheduler.to_roster())?;
            if let Some(path) = out_json {
                io::export_schedule_json(path, scheduler.schedule())?;
            }
            if let Some(path) = out_csv {
                io::export_schedule_csv(path, scheduler.schedule())?;
            }
            if let Some(path) = issues_csv {
                io::export_coverage_csv(path, scheduler.coverage_issues())?;
            }
            print_outcome(&outcome);
            for issue in scheduler.coverage_issues() {
                eprintln!(
                    "{} | {} | {}",
                    issue.date,
                    issue.priority.as_str(),
                    issue.issue_type
                );
            }
            if outcome.is_complete() {
                0
            } else {
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Override {
            date,
            resident,
            shift_type,
        } => {
            let date = parse_date(&date)?;
            let shift_type: ShiftType = shift_type.parse().map_err(anyhow::Error::msg)?;
            let mut scheduler = Scheduler::from_roster(config, storage.load()?)?;
            scheduler.apply_override(date, &resident, shift_type)?;
            storage.save(&scheduler.to_roster())?;
            println!("{date} | {shift_type} -> {resident}");
            0
        }
        Commands::Explain { resident, date } => {
            let date = parse_date(&date)?;
            let scheduler = Scheduler::from_roster(config, storage.load()?)?;
            if scheduler.resident(&resident).is_none() {
                bail!("unknown resident: {resident}");
            }
            let reasons = scheduler.get_unavailability_reasons(&resident, date);
            if reasons.is_empty() {
                println!("{resident} is available on {date}");
            } else {
                for reason in reasons {
                    println!("- {reason}");
                }
            }
            0
        }
        Commands::Check => {
            let mut scheduler = Scheduler::from_roster(config, storage.load()?)?;
            let violations = scheduler.run_comprehensive_validation();
            if violations.is_empty() {
                println!("OK: no violations");
                0
            } else {
                eprintln!("Found {} violation(s)", violations.len());
                for v in &violations {
                    eprintln!("{:?} | {} | {}", v.kind, v.resident, v.detail);
                }
                2
            }
        }
        Commands::List => {
            let roster = storage.load()?;
            for (date, shifts) in roster.schedule.iter() {
                for s in shifts {
                    println!(
                        "{} | {} | {} ({}) | {}",
                        date,
                        s.shift_type,
                        s.resident,
                        s.pgy_level,
                        s.assigned_by.as_str()
                    );
                }
            }
            0
        }
    };

    std::process::exit(code);
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

fn print_outcome(outcome: &ScheduleOutcome) {
    let stats = &outcome.stats;
    println!("run {}", outcome.run_id);
    println!(
        "days: {} | shifts: {} | requests honored: {} | monthly blocks: {}",
        stats.days_processed, stats.shifts_assigned, stats.requests_honored, stats.monthly_blocks
    );
    println!(
        "coverage issues: {} | violations: {}",
        outcome.coverage_issues,
        outcome.violations.len()
    );
}
