//! RON definition loader

use crate::error::{Error, Result};
use courtside_core::{
    AchievementDef, Catalog, Definitions, EngineConfig, Rule, RuleSet, TierTable, TierThreshold,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loader for RON definition files
#[derive(Debug, Default)]
pub struct Loader {
    catalog: Option<Catalog>,
    rules: Option<RuleSet>,
    tiers: Option<TierTable>,
    config: Option<EngineConfig>,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        debug!(file = %path.display(), "Loading definitions");

        match kind_from_content(&content).or_else(|| kind_from_filename(filename)) {
            Some(DefinitionKind::Achievements) => self.load_achievements_str(&content),
            Some(DefinitionKind::Rules) => self.load_rules_str(&content),
            Some(DefinitionKind::Tiers) => self.load_tiers_str(&content),
            Some(DefinitionKind::Engine) => self.load_config_str(&content),
            None => Err(Error::InvalidSchema(format!(
                "{}: not an achievement, rule, tier or engine file",
                path.display()
            ))),
        }
    }

    /// Load achievements from a RON string
    pub fn load_achievements_str(&mut self, content: &str) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct AchievementFile {
            achievements: Vec<AchievementDef>,
        }

        let file: AchievementFile = ron::from_str(content)?;
        let catalog = self.catalog.get_or_insert_with(Catalog::new);
        for def in file.achievements {
            if catalog.contains(def.id) {
                return Err(Error::DuplicateDefinition(def.id.to_string()));
            }
            catalog.insert(def)?;
        }
        Ok(())
    }

    /// Load rules from a RON string
    pub fn load_rules_str(&mut self, content: &str) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct RuleFile {
            rules: Vec<Rule>,
        }

        let file: RuleFile = ron::from_str(content)?;
        let rules = self.rules.get_or_insert_with(RuleSet::default);
        for rule in file.rules {
            rules.push(rule);
        }
        Ok(())
    }

    /// Load tier thresholds from a RON string
    pub fn load_tiers_str(&mut self, content: &str) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct TierFile {
            tiers: Vec<TierThreshold>,
        }

        if self.tiers.is_some() {
            return Err(Error::DuplicateDefinition("tiers".to_string()));
        }
        let file: TierFile = ron::from_str(content)?;
        self.tiers = Some(TierTable::new(file.tiers)?);
        Ok(())
    }

    /// Load engine settings from a RON string
    pub fn load_config_str(&mut self, content: &str) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct EngineFile {
            engine: EngineConfig,
        }

        if self.config.is_some() {
            return Err(Error::DuplicateDefinition("engine".to_string()));
        }
        let file: EngineFile = ron::from_str(content)?;
        self.config = Some(file.engine);
        Ok(())
    }

    /// Load all RON files from a directory, in file name order
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        entries.sort();

        for file_path in entries {
            if file_path.extension().map(|e| e == "ron").unwrap_or(false) {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    /// Finish loading, filling gaps with the standard definitions.
    ///
    /// Standard rules follow the loaded engine settings. Fails if any rule
    /// targets an achievement outside the catalog or the engine settings are
    /// invalid.
    pub fn finish(self) -> Result<Definitions> {
        let config = self.config.unwrap_or_default();
        let defs = Definitions {
            catalog: self.catalog.unwrap_or_else(Catalog::standard),
            rules: self
                .rules
                .unwrap_or_else(|| RuleSet::standard_for(&config)),
            tiers: self.tiers.unwrap_or_else(TierTable::standard),
            config,
        };
        defs.validate()?;
        info!(
            achievements = defs.catalog.len(),
            rules = defs.rules.len(),
            rivalries = defs.config.rivalries.len(),
            "Definitions loaded"
        );
        Ok(defs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefinitionKind {
    Achievements,
    Rules,
    Tiers,
    Engine,
}

/// Kind named by the first top-level key of a definition file
fn kind_from_content(content: &str) -> Option<DefinitionKind> {
    const KEYS: [(&str, DefinitionKind); 4] = [
        ("achievements:", DefinitionKind::Achievements),
        ("rules:", DefinitionKind::Rules),
        ("tiers:", DefinitionKind::Tiers),
        ("engine:", DefinitionKind::Engine),
    ];
    KEYS.iter()
        .filter_map(|(key, kind)| content.find(key).map(|at| (at, *kind)))
        .min_by_key(|(at, _)| *at)
        .map(|(_, kind)| kind)
}

/// Kind suggested by a file name, used when the content names none
fn kind_from_filename(filename: &str) -> Option<DefinitionKind> {
    const NAMES: [(&str, DefinitionKind); 4] = [
        ("rule", DefinitionKind::Rules),
        ("tier", DefinitionKind::Tiers),
        ("engine", DefinitionKind::Engine),
        ("achievement", DefinitionKind::Achievements),
    ];
    NAMES
        .iter()
        .find(|(name, _)| filename.contains(name))
        .map(|(_, kind)| *kind)
}
