use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::investigation::InvestigationConfig;
use crate::pipeline::PipelineConfig;
use crate::scoring::ScoringConfig;
use crate::signal::SignalConfig;
use crate::structure::StructureConfig;
use crate::vds::VdsConfig;

/// Every tunable of the analysis pipeline. Missing sections and fields take
/// their defaults, so a settings file only needs what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub signal: SignalConfig,
    pub structure: StructureConfig,
    pub scoring: ScoringConfig,
    pub vds: VdsConfig,
    pub investigation: InvestigationConfig,
    pub pipeline: PipelineConfig,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AnalysisSettings>,
}

impl SettingsStore {
    /// Open the store at `path`. A missing file means defaults; an unreadable
    /// or malformed one is an error.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            read_settings(&path)?
        } else {
            AnalysisSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> Result<AnalysisSettings> {
        Ok(self.read()?.clone())
    }

    pub fn update(&self, settings: AnalysisSettings) -> Result<()> {
        let mut guard = self.write()?;
        *guard = settings;
        self.persist(&guard)
    }

    /// Apply `change` to the current settings and persist the result.
    pub fn modify<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut AnalysisSettings),
    {
        let mut guard = self.write()?;
        change(&mut guard);
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let data = read_settings(&self.path)?;
        *self.write()? = data;
        Ok(())
    }

    fn persist(&self, data: &AnalysisSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, AnalysisSettings>> {
        self.data
            .read()
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, AnalysisSettings>> {
        self.data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))
    }
}

fn read_settings(path: &PathBuf) -> Result<AnalysisSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse settings in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sector;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("docforensics-settings-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn missing_file_gives_defaults() {
        let store = SettingsStore::new(scratch_path()).unwrap();
        assert_eq!(store.current().unwrap(), AnalysisSettings::default());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let path = scratch_path();
        fs::write(&path, r#"{ "signal": { "blur_threshold": 80.0 }, "vds": { "max_ela": 10.0 } }"#)
            .unwrap();
        let settings = SettingsStore::new(path.clone()).unwrap().current().unwrap();
        assert_eq!(settings.signal.blur_threshold, 80.0);
        assert_eq!(settings.signal.ela_quality, 90);
        assert_eq!(settings.vds.max_ela, 10.0);
        assert_eq!(settings.scoring, ScoringConfig::default());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn update_persists_and_reload_reads_back() {
        let path = scratch_path();
        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .modify(|settings| {
                if let Some(policy) = settings.scoring.policies.get_mut(&Sector::Banque) {
                    policy.green_ceiling = 15;
                }
            })
            .unwrap();

        let reopened = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reopened.current().unwrap().scoring.ceilings(Sector::Banque), (15, 45));

        fs::write(&path, r#"{ "pipeline": { "snippet_chars": 120 } }"#).unwrap();
        reopened.reload().unwrap();
        let settings = reopened.current().unwrap();
        assert_eq!(settings.pipeline.snippet_chars, 120);
        assert_eq!(settings.scoring.ceilings(Sector::Banque), (10, 40));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = scratch_path();
        fs::write(&path, "{ not json").unwrap();
        assert!(SettingsStore::new(path.clone()).is_err());
        fs::remove_file(path).unwrap();
    }
}
