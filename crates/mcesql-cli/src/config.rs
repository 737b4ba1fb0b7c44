//! Configuration file handling

use std::path::{Path, PathBuf};

use mcesql_core::CoordinatorConfig;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::args::OutputFormat;

pub const CONFIG_FILE_NAME: &str = "mcesql.toml";

/// Contents of mcesql.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data extension metadata file
    pub schema: Option<PathBuf>,

    /// Query file patterns to check
    pub files: Vec<String>,

    pub format: Option<OutputFormat>,

    /// Rules to disable (e.g., ["not-equal-style", "nolock"])
    pub disable: Vec<String>,

    /// Run the deep parse as well as the rules
    pub deep: bool,

    pub coordinator: CoordinatorConfig,
}

/// Values given on the command line for `check`
pub struct CheckArgs<'a> {
    pub files: &'a [PathBuf],
    pub schema: &'a Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub deep: bool,
    pub disable: &'a [String],
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).into_diagnostic()
    }

    /// Try to find and load mcesql.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let mut current_dir = std::env::current_dir().into_diagnostic()?;

        loop {
            let config_path = current_dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "using config file");
                return Ok(Some(Self::from_file(&config_path)?));
            }

            if !current_dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(mut self, args: CheckArgs<'_>) -> Self {
        if let Some(schema) = args.schema {
            self.schema = Some(schema.clone());
        }

        if !args.files.is_empty() {
            self.files = args.files.iter().map(|p| p.display().to_string()).collect();
        }

        if args.format.is_some() {
            self.format = args.format;
        }

        if !args.disable.is_empty() {
            self.disable = args.disable.to_vec();
        }

        self.deep |= args.deep;
        self
    }
}
