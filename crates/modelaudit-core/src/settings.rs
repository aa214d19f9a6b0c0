//! Audit settings and their TOML file.

use directories::ProjectDirs;
use modelaudit_engine::engine::PatternRules;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AuditError, Result};

const MAX_SETTINGS_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// Thresholds and switches for one audit run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSettings {
    /// How many leading rows are searched for the period axis.
    pub axis_scan_rows: usize,
    /// 1-based column where the audit zone starts when no axis is found.
    pub fallback_start_col: usize,
    /// Leading columns searched for a row label.
    pub label_columns: usize,
    pub label_max_chars: usize,
    pub min_formulas_for_dominant: usize,
    /// Share of a row's formulas the dominant shape must cover.
    pub dominant_share: f64,
    /// Issues stored per run; counting continues past it.
    pub max_issues: usize,
    pub complexity_threshold: u8,
    pub check_hardcodes: bool,
    pub check_pattern_breaks: bool,
    pub check_errors: bool,
    pub check_volatile: bool,
    /// Count formulas that reference their own column and a neighbour within three columns.
    pub check_shifted_references: bool,
    /// Report sheet name that is never audited.
    pub dashboard_name: String,
}

impl Default for AuditSettings {
    fn default() -> Self {
        AuditSettings {
            axis_scan_rows: 15,
            fallback_start_col: 5,
            label_columns: 4,
            label_max_chars: 50,
            min_formulas_for_dominant: 3,
            dominant_share: 0.4,
            max_issues: 2000,
            complexity_threshold: 7,
            check_hardcodes: true,
            check_pattern_breaks: true,
            check_errors: true,
            check_volatile: true,
            check_shifted_references: true,
            dashboard_name: "AUDIT_MASTER".to_string(),
        }
    }
}

impl AuditSettings {
    /// Parse settings from TOML text. Missing keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: AuditSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > MAX_SETTINGS_FILE_BYTES {
            return Err(AuditError::Config(format!(
                "refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_SETTINGS_FILE_BYTES
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load the user's settings file if it exists, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => match Self::default_path() {
                Some(p) if p.is_file() => Self::load(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    /// `<config dir>/audit.toml` for this application, when a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("me", "shoryuken", "modelaudit")?;
        let mut path = proj.config_dir().to_path_buf();
        path.push("audit.toml");
        Some(path)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dominant_share > 0.0 && self.dominant_share <= 1.0) {
            return Err(AuditError::Config(format!(
                "dominant_share must be in (0, 1], got {}",
                self.dominant_share
            )));
        }
        if self.label_columns == 0 {
            return Err(AuditError::Config("label_columns must be at least 1".into()));
        }
        if self.fallback_start_col == 0 {
            return Err(AuditError::Config("fallback_start_col is 1-based and must be at least 1".into()));
        }
        Ok(())
    }

    pub fn pattern_rules(&self) -> PatternRules {
        PatternRules {
            min_formulas: self.min_formulas_for_dominant,
            min_share: self.dominant_share,
        }
    }
}
