//! Where config files live and how their layers stack.
//!
//! Two candidate files, lowest precedence first:
//! 1. `<config dir>/config.toml`, where the config dir is `$SATCHEL_CONFIG_DIR`
//!    or the platform default
//! 2. `./satchel.toml` next to the running server
//!
//! CLI flags sit on top of both and are applied by the binary.

use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, SatchelConfig};

/// File name of the project-local layer.
pub const PROJECT_FILE: &str = "satchel.toml";

/// File name of the user layer inside the config dir.
pub const USER_FILE: &str = "config.toml";

const CONFIG_DIR_ENV: &str = "SATCHEL_CONFIG_DIR";

/// A candidate file and whether it contributed to the merged config.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Candidate path.
    pub path: PathBuf,
    /// True when the file existed and parsed.
    pub loaded: bool,
}

/// Merged configuration plus the trail of how it was assembled.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: SatchelConfig,
    /// Every candidate checked, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Layers that existed but were skipped, with the reason.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Load exactly one file, bypassing discovery. Any failure is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self {
            config: load_config_file(path)?,
            sources: vec![ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }],
            warnings: Vec::new(),
        })
    }

    /// Paths of the layers that actually contributed.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Ordered candidate files, lowest precedence first.
#[derive(Debug, Clone)]
pub struct Layers {
    paths: Vec<PathBuf>,
}

impl Layers {
    /// Layers for this process: the user config dir, then the working directory.
    pub fn discover() -> Self {
        Self::new(config_dir().as_deref(), Path::new("."))
    }

    /// Layers rooted at explicit directories.
    pub fn new(user_dir: Option<&Path>, project_dir: &Path) -> Self {
        let paths = user_dir
            .map(|dir| dir.join(USER_FILE))
            .into_iter()
            .chain([project_dir.join(PROJECT_FILE)])
            .collect();
        Self { paths }
    }

    /// Candidate paths in merge order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Merge every layer that exists.
    ///
    /// Missing files are skipped silently. Unreadable or malformed files are
    /// skipped with a warning so one bad layer cannot keep the server down.
    pub fn load(&self) -> LoadedConfig {
        let mut loaded = LoadedConfig::default();

        for path in &self.paths {
            let applied = match path.is_file().then(|| load_config_file(path)) {
                None => false,
                Some(Ok(layer)) => {
                    loaded.config.merge(layer);
                    true
                }
                Some(Err(e)) => {
                    loaded.warnings.push(format!("skipped {}: {}", path.display(), e));
                    false
                }
            };
            loaded.sources.push(ConfigSource {
                path: path.clone(),
                loaded: applied,
            });
        }

        loaded
    }
}

/// Discover and merge the config layers for this process.
pub fn load_config() -> LoadedConfig {
    Layers::discover().load()
}

/// Parse one config file.
pub fn load_config_file(path: &Path) -> Result<SatchelConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    SatchelConfig::from_toml(&contents)
}

/// Write `config` to `path`, creating parent directories.
pub fn save_config(config: &SatchelConfig, path: &Path) -> Result<()> {
    let write_err = |p: &Path, e| ConfigError::WriteFile {
        path: p.display().to_string(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|e| write_err(path, e))
}

/// Satchel's config dir: `$SATCHEL_CONFIG_DIR` when set, else the platform default.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join("satchel"))
}

/// Path of the user layer.
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(USER_FILE))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[session]\ncookie_name = \"sid\"\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.session.unwrap().cookie_name, "sid");
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_layer_order() {
        let layers = Layers::new(Some(Path::new("/home/u/.config/satchel")), Path::new("/srv"));
        assert_eq!(
            layers.paths(),
            [
                PathBuf::from("/home/u/.config/satchel/config.toml"),
                PathBuf::from("/srv/satchel.toml"),
            ]
        );

        let project_only = Layers::new(None, Path::new("/srv"));
        assert_eq!(project_only.paths(), [PathBuf::from("/srv/satchel.toml")]);
    }

    #[test]
    fn test_no_files_yields_defaults() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        let loaded = Layers::new(Some(user.path()), project.path()).load();
        assert_eq!(loaded.config, SatchelConfig::default());
        assert_eq!(loaded.sources.len(), 2);
        assert!(loaded.loaded_from().is_empty());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_project_layer_overrides_user_layer() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        fs::write(
            user.path().join("config.toml"),
            "[session]\ncookie_name = \"user_sid\"\nmax_age_secs = 600\n\n[server]\nport = 8080\n",
        )
        .unwrap();
        fs::write(project.path().join("satchel.toml"), "[server]\nport = 3000\n").unwrap();

        let loaded = Layers::new(Some(user.path()), project.path()).load();

        assert_eq!(loaded.config.server_or_default().port, 3000);
        assert_eq!(loaded.config.session_or_default().cookie_name, "user_sid");
        assert_eq!(loaded.loaded_from().len(), 2);
    }

    #[test]
    fn test_malformed_layer_is_skipped_with_warning() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(user.path().join("config.toml"), "[server]\nport = 9000\n").unwrap();
        fs::write(project.path().join("satchel.toml"), "not valid toml {{{{").unwrap();

        let loaded = Layers::new(Some(user.path()), project.path()).load();

        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].starts_with("skipped "));
        assert_eq!(loaded.config.server_or_default().port, 9000);
        assert_eq!(loaded.loaded_from(), vec![user.path().join("config.toml").as_path()]);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("satchel.toml");

        let mut config = SatchelConfig::new();
        config.session = Some(crate::SessionSection {
            max_age_secs: 42,
            ..Default::default()
        });
        save_config(&config, &path).unwrap();

        let loaded = LoadedConfig::from_file(&path).unwrap();
        assert_eq!(loaded.config, config);
        assert_eq!(loaded.loaded_from(), vec![path.as_path()]);
    }
}
