//! `scriptor.toml` configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::{EvaluationConfig, MIN_USER_POINTS_FLOOR};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "scriptor.toml";

/// Evaluation log file name inside `output_dir`.
pub const EVALUATION_LOG: &str = "evaluations.jsonl";

/// Top-level scriptor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScribeConfig {
    /// Catalog file or directory. The embedded catalog is used when absent.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Where the evaluation log is written by default.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Scoring parameters.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./scriptor-results")
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            output_dir: default_output_dir(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl ScribeConfig {
    /// Default evaluation log, `<output_dir>/evaluations.jsonl`.
    pub fn evaluation_log(&self) -> PathBuf {
        self.output_dir.join(EVALUATION_LOG)
    }

    /// Reject parameter combinations the engine cannot score with.
    pub fn validate(&self) -> Result<()> {
        let eval = &self.evaluation;
        if eval.resample_points < 2 {
            anyhow::bail!(
                "evaluation.resample_points must be at least 2, got {}",
                eval.resample_points
            );
        }
        if eval.min_user_points < MIN_USER_POINTS_FLOOR {
            anyhow::bail!(
                "evaluation.min_user_points must be at least {MIN_USER_POINTS_FLOOR}, got {}",
                eval.min_user_points
            );
        }
        let p = &eval.pressure;
        let ordered = 0.0 < p.tolerance && p.tolerance < p.ideal_center && p.ideal_center < 1.0;
        if !ordered || p.ideal_center + p.tolerance >= 1.0 {
            anyhow::bail!(
                "evaluation.pressure must satisfy 0 < tolerance < ideal_center and ideal_center + tolerance < 1 (got center {}, tolerance {})",
                p.ideal_center,
                p.tolerance
            );
        }
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        from = start + value.len();
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Parse configuration from TOML text, resolving `${VAR}` references.
pub fn parse_config_str(content: &str, source: &Path) -> Result<ScribeConfig> {
    let mut config: ScribeConfig = toml::from_str(content)
        .with_context(|| format!("failed to parse config: {}", source.display()))?;
    config.catalog = config.catalog.as_deref().map(resolve_path);
    config.output_dir = resolve_path(&config.output_dir);
    config
        .validate()
        .with_context(|| format!("invalid config: {}", source.display()))?;
    Ok(config)
}

/// Load `scriptor.toml` from the working directory, or defaults.
pub fn load_config() -> Result<ScribeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or from [`CONFIG_FILE`] when present.
///
/// An explicit path that does not exist is an error; a missing default file
/// yields [`ScribeConfig::default`].
pub fn load_config_from(path: Option<&Path>) -> Result<ScribeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE);
            local.exists().then_some(local)
        }
    };

    match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            parse_config_str(&content, &path)
        }
        None => Ok(ScribeConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_SCRIPTOR_TEST_DIR", "/data");
        assert_eq!(resolve_env_vars("${_SCRIPTOR_TEST_DIR}"), "/data");
        assert_eq!(
            resolve_env_vars("${_SCRIPTOR_TEST_DIR}/catalog.toml"),
            "/data/catalog.toml"
        );
        assert_eq!(resolve_env_vars("${_SCRIPTOR_UNSET_VAR}x"), "x");
        assert_eq!(resolve_env_vars("no refs"), "no refs");
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_SCRIPTOR_TEST_DIR");
    }

    #[test]
    fn default_config() {
        let config = ScribeConfig::default();
        assert_eq!(config.catalog, None);
        assert_eq!(config.evaluation.resample_points, 20);
        assert_eq!(config.evaluation.min_user_points, 5);
        assert_eq!(config.evaluation.pressure.ideal_center, 0.5);
        config.validate().unwrap();
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
catalog = "catalog/cp-2025.toml"
output_dir = "./out"

[evaluation]
resample_points = 32
min_user_points = 8

[evaluation.pressure]
ideal_center = 0.45
tolerance = 0.1
"#;
        let config = parse_config_str(toml_str, Path::new("scriptor.toml")).unwrap();
        assert_eq!(config.catalog, Some(PathBuf::from("catalog/cp-2025.toml")));
        assert_eq!(config.output_dir, PathBuf::from("./out"));
        assert_eq!(config.evaluation_log(), PathBuf::from("./out/evaluations.jsonl"));
        assert_eq!(config.evaluation.resample_points, 32);
        assert_eq!(config.evaluation.min_user_points, 8);
        assert_eq!(config.evaluation.pressure.tolerance, 0.1);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config = parse_config_str("[evaluation]\nmin_user_points = 6\n", Path::new("x")).unwrap();
        assert_eq!(config.evaluation.min_user_points, 6);
        assert_eq!(config.evaluation.resample_points, 20);
        assert_eq!(config.output_dir, PathBuf::from("./scriptor-results"));
    }

    #[test]
    fn rejects_bad_parameters() {
        let bad = [
            "[evaluation]\nresample_points = 1\n",
            "[evaluation]\nmin_user_points = 0\n",
            "[evaluation]\nmin_user_points = 3\n",
            "[evaluation]\nmin_user_points = 4\n",
            "[evaluation.pressure]\nideal_center = 0.5\ntolerance = 0.0\n",
            "[evaluation.pressure]\nideal_center = 0.2\ntolerance = 0.3\n",
            "[evaluation.pressure]\nideal_center = 0.9\ntolerance = 0.2\n",
        ];
        for content in bad {
            assert!(
                parse_config_str(content, Path::new("bad.toml")).is_err(),
                "accepted: {content}"
            );
        }
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scriptor.toml");
        std::fs::write(&path, "output_dir = \"./reports\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("./reports"));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
