//! Layered configuration for cbx.
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A configuration file, format chosen by extension (`.toml`, `.yaml`/`.yml`
//!    or `.json`). Without an explicit path, `config.toml` in the platform
//!    configuration directory is used if it exists.
//! 3. `CBX_`-prefixed environment variables, nested keys separated by `__`
//!    (`CBX_SIDECAR__SPOOL_THRESHOLD=65536`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

const ENV_PREFIX: &str = "CBX_";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub sidecar: SidecarConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Extension given to renamed page files.
    pub extension: ExtensionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    /// Sidecar content up to this many bytes is buffered in memory; larger
    /// sidecars spill to an anonymous temporary file. RAR sidecars are
    /// decoded whole in memory before they reach the buffer.
    pub spool_threshold: usize,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self { spool_threshold: 1024 * 1024 }
    }
}

/// How renamed page files get their extension.
///
/// Configured as `"preserve"` or `{ uniform = "jpg" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionPolicy {
    /// Keep each page's original extension (none if it had none).
    #[default]
    Preserve,
    /// Give every page the same extension, whatever it was stored as.
    Uniform(String),
}

impl ExtensionPolicy {
    /// Suffix (including the leading dot, or empty) for a page originally
    /// named `base_name`.
    pub fn suffix_for(&self, base_name: &str) -> String {
        let extension = match self {
            ExtensionPolicy::Preserve => Path::new(base_name).extension().and_then(|ext| ext.to_str()).unwrap_or(""),
            ExtensionPolicy::Uniform(extension) => extension.trim_start_matches('.'),
        };
        if extension.is_empty() { String::new() } else { format!(".{extension}") }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Some(path.to_path_buf()),
            None => default_path().filter(|candidate| candidate.is_file()),
        };
        if let Some(file) = &file {
            tracing::debug!(path = %file.display(), "reading configuration file");
        }
        Self::from_figment(&figment(file.as_deref())?)
    }

    /// Extract and validate a configuration from an already assembled
    /// [`Figment`].
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config =
            figment.extract().or_raise(|| ErrorKind::Invalid("cannot deserialize configuration".to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let ExtensionPolicy::Uniform(extension) = &self.extraction.extension {
            let extension = extension.trim_start_matches('.');
            exn::ensure!(
                !extension.is_empty() && !extension.contains(['/', '\\', '.']),
                ErrorKind::Invalid(format!("uniform page extension {extension:?} is not a plain extension"))
            );
        }
        Ok(())
    }
}

/// `config.toml` in the platform configuration directory for cbx.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cbx").map(|dirs| dirs.config_dir().join(DEFAULT_FILE_NAME))
}

/// Assemble the provider stack: defaults, then `file` (if any), then the
/// environment.
pub fn figment(file: Option<&Path>) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = file {
        exn::ensure!(path.is_file(), ErrorKind::Invalid(format!("configuration file {} not found", path.display())));
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
        figment = match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file_exact(path)),
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
            Some("json") => figment.merge(Json::file_exact(path)),
            _ => exn::bail!(ErrorKind::Invalid(format!(
                "unsupported configuration format for {}",
                path.display()
            ))),
        };
    }
    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.extraction.extension, ExtensionPolicy::Preserve);
        assert_eq!(config.sidecar.spool_threshold, 1_048_576);
    }

    // Every test reading the environment runs inside a `Jail`, which
    // serialises them and restores the environment afterwards.
    #[rstest]
    #[case("config.toml", "[extraction]\nextension = { uniform = \"jpg\" }\n")]
    #[case("config.yaml", "extraction:\n  extension:\n    uniform: jpg\n")]
    #[case("config.yml", "extraction:\n  extension:\n    uniform: jpg\n")]
    #[case("config.json", r#"{"extraction": {"extension": {"uniform": "jpg"}}}"#)]
    fn test_load_file_formats(#[case] file_name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(file_name, contents)?;
            let config = Config::load(Some(Path::new(file_name))).unwrap();
            assert_eq!(config.extraction.extension, ExtensionPolicy::Uniform("jpg".to_string()));
            assert_eq!(config.sidecar, SidecarConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_load_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, "[extraction]\n").unwrap();
        let err = figment(Some(&path)).unwrap_err();
        assert!(matches!(*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_load_rejects_bad_values() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[sidecar]\nspool_threshold = \"lots\"\n")?;
            let err = Config::load(Some(Path::new("config.toml"))).unwrap_err();
            assert!(matches!(*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("../jpg")]
    #[case("tar.gz")]
    fn test_validate_uniform_extension(#[case] extension: &str) {
        let mut config = Config::default();
        config.extraction.extension = ExtensionPolicy::Uniform(extension.to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("cbx.toml", "[extraction]\nextension = { uniform = \"png\" }\n")?;
            jail.set_env("CBX_EXTRACTION__EXTENSION", "preserve");
            jail.set_env("CBX_SIDECAR__SPOOL_THRESHOLD", 4096);
            let config = Config::from_figment(&figment(Some(Path::new("cbx.toml"))).unwrap()).unwrap();
            assert_eq!(config.extraction.extension, ExtensionPolicy::Preserve);
            assert_eq!(config.sidecar.spool_threshold, 4096);
            Ok(())
        });
    }

    #[test]
    fn test_environment_nested_variant() {
        Jail::expect_with(|jail| {
            jail.set_env("CBX_EXTRACTION__EXTENSION__UNIFORM", "webp");
            let config = Config::from_figment(&figment(None).unwrap()).unwrap();
            assert_eq!(config.extraction.extension, ExtensionPolicy::Uniform("webp".to_string()));
            Ok(())
        });
    }

    #[rstest]
    #[case(ExtensionPolicy::Preserve, "001.JPG", ".JPG")]
    #[case(ExtensionPolicy::Preserve, "cover.page.png", ".png")]
    #[case(ExtensionPolicy::Preserve, "README", "")]
    #[case(ExtensionPolicy::Uniform("jpg".to_string()), "001.png", ".jpg")]
    #[case(ExtensionPolicy::Uniform(".webp".to_string()), "README", ".webp")]
    fn test_suffix_for(#[case] policy: ExtensionPolicy, #[case] base_name: &str, #[case] expected: &str) {
        assert_eq!(policy.suffix_for(base_name), expected);
    }
}
