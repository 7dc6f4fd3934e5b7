use crate::model::Roster;
use anyhow::{bail, Context};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub trait Storage {
    /// Charge un roster (internes + dernier planning) depuis un support.
    fn load(&self) -> anyhow::Result<Roster>;
    /// Sauvegarde de manière atomique.
    fn save(&self, roster: &Roster) -> anyhow::Result<()>;
    /// Vrai si un roster a déjà été écrit.
    fn exists(&self) -> bool;

    /// Roster vide tant que rien n'a été sauvegardé.
    fn load_or_default(&self) -> anyhow::Result<Roster> {
        if self.exists() {
            self.load()
        } else {
            Ok(Roster::default())
        }
    }
}

/// Roster persisté dans un unique fichier JSON.
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Roster> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let roster: Roster = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        check_roster(&roster).with_context(|| format!("checking {}", self.path.display()))?;
        Ok(roster)
    }

    fn save(&self, roster: &Roster) -> anyhow::Result<()> {
        check_roster(roster)?;
        let json = serde_json::to_vec_pretty(roster)?;
        let dir = self.parent_dir();
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Noms uniques, et chaque garde du planning appartient à un interne connu
/// dont le niveau PGY correspond.
fn check_roster(roster: &Roster) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for r in &roster.residents {
        if !seen.insert(r.name.as_str()) {
            bail!("duplicate resident: {}", r.name);
        }
    }
    for shift in roster.schedule.shifts() {
        let Some(resident) = roster.find_resident(&shift.resident) else {
            bail!(
                "{} on {} is assigned to unknown resident {}",
                shift.shift_type,
                shift.date,
                shift.resident
            );
        };
        if resident.pgy_level != shift.pgy_level {
            bail!(
                "{} on {}: {} is {}, shift says {}",
                shift.shift_type,
                shift.date,
                shift.resident,
                resident.pgy_level,
                shift.pgy_level
            );
        }
    }
    Ok(())
}
