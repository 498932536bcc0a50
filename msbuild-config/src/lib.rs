//! Configuration for msbuild-inspect
//!
//! Sources, lowest precedence first:
//!
//! 1. `defaults/msbuild.default.toml`, embedded at compile time;
//! 2. [`LOCAL_FILE`] in the working directory, when present;
//! 3. a file named on the command line, which must exist;
//! 4. `MSBUILD_INSPECT_*` environment variables, with `__` between nested keys
//!    (`MSBUILD_INSPECT_OUTPUT__FORMAT=json`);
//! 5. command-line flags.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, Map, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/msbuild.default.toml");

/// Per-directory settings file picked up by [`Loader::local_file`].
pub const LOCAL_FILE: &str = "msbuild-inspect.toml";

/// Prefix of environment variables read by [`Loader::build`].
pub const ENV_PREFIX: &str = "MSBUILD_INSPECT";

#[derive(Debug, Clone, Deserialize)]
pub struct InspectorConfig {
    pub logging: LoggingConfig,
    pub positions: PositionsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive applied when `RUST_LOG` is unset.
    pub level: String,
    /// Forward reader capture traces as well as warnings and errors.
    pub trace_reader: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionsConfig {
    pub input_basis: InputBasis,
}

/// Numbering of line/column arguments given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputBasis {
    OneBased,
    ZeroBased,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub show_ranges: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Treeviz,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Treeviz => "treeviz",
            OutputFormat::Json => "json",
        }
    }

    /// Inverse of [`OutputFormat::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "treeviz" => Some(OutputFormat::Treeviz),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Collects the configuration sources for one run of the inspector.
#[derive(Debug, Clone)]
pub struct Loader {
    files: ConfigBuilder<DefaultState>,
    environment: Environment,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            files: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
            environment: Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        }
    }

    /// Pick up [`LOCAL_FILE`] from `dir` if there is one.
    pub fn local_file(self, dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(LOCAL_FILE);
        self.toml(&path, false)
    }

    /// Layer a settings file the user asked for; a missing file fails [`Loader::build`].
    pub fn user_file(self, path: impl AsRef<Path>) -> Self {
        self.toml(path.as_ref(), true)
    }

    /// Read `MSBUILD_INSPECT_*` variables from `vars` rather than the process environment.
    pub fn environment_from(mut self, vars: Map<String, String>) -> Self {
        self.environment = self.environment.source(Some(vars));
        self
    }

    pub fn output_format(self, format: OutputFormat) -> Result<Self, ConfigError> {
        self.flag("output.format", format.as_str())
    }

    pub fn show_ranges(self) -> Result<Self, ConfigError> {
        self.flag("output.show_ranges", true)
    }

    pub fn build(self) -> Result<InspectorConfig, ConfigError> {
        self.files
            .add_source(self.environment)
            .build()?
            .try_deserialize()
    }

    fn toml(mut self, path: &Path, required: bool) -> Self {
        self.files = self
            .files
            .add_source(File::from(path).format(FileFormat::Toml).required(required));
        self
    }

    // Overrides outrank every source, whatever order they were added in.
    fn flag(mut self, key: &str, value: impl Into<ValueKind>) -> Result<Self, ConfigError> {
        self.files = self.files.set_override(key, value)?;
        Ok(self)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn isolated() -> Loader {
        Loader::new().environment_from(Map::new())
    }

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = isolated().build().expect("defaults to deserialize");
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.trace_reader);
        assert_eq!(config.positions.input_basis, InputBasis::OneBased);
        assert_eq!(config.output.format, OutputFormat::Treeviz);
        assert!(!config.output.show_ranges);
    }

    #[test]
    fn test_flags() {
        let config = isolated()
            .output_format(OutputFormat::Json)
            .expect("override to apply")
            .show_ranges()
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.show_ranges);
    }

    #[test]
    fn test_user_file_layers_over_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "[positions]\ninput_basis = \"zero-based\"").expect("write config");

        let config = isolated()
            .user_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(config.positions.input_basis, InputBasis::ZeroBased);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_local_file_is_optional() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(isolated().local_file(dir.path()).build().is_ok());
        assert!(isolated().user_file(dir.path().join(LOCAL_FILE)).build().is_err());

        std::fs::write(dir.path().join(LOCAL_FILE), "[output]\nformat = \"json\"\n")
            .expect("write config");
        let config = isolated()
            .local_file(dir.path())
            .build()
            .expect("config to build");
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_environment_outranks_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join(LOCAL_FILE), "[output]\nformat = \"json\"\n")
            .expect("write config");

        let config = Loader::new()
            .local_file(dir.path())
            .environment_from(vars(&[
                ("MSBUILD_INSPECT_OUTPUT__FORMAT", "treeviz"),
                ("MSBUILD_INSPECT_OUTPUT__SHOW_RANGES", "true"),
                ("MSBUILD_INSPECT_LOGGING__LEVEL", "debug"),
                ("UNRELATED_OUTPUT__FORMAT", "json"),
            ]))
            .build()
            .expect("config to build");
        assert_eq!(config.output.format, OutputFormat::Treeviz);
        assert!(config.output.show_ranges);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_flags_outrank_environment() {
        let config = Loader::new()
            .environment_from(vars(&[("MSBUILD_INSPECT_OUTPUT__FORMAT", "treeviz")]))
            .output_format(OutputFormat::Json)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_rejects_unknown_format() {
        let result = isolated()
            .environment_from(vars(&[("MSBUILD_INSPECT_OUTPUT__FORMAT", "yaml")]))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_format_names() {
        for format in [OutputFormat::Treeviz, OutputFormat::Json] {
            assert_eq!(OutputFormat::from_name(format.as_str()), Some(format));
        }
        assert_eq!(OutputFormat::from_name("yaml"), None);
    }
}
