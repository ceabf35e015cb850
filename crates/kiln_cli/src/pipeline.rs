//! Shared setup for CLI commands: locating and loading `kiln.toml` and
//! building the language registry from it.

use std::path::{Path, PathBuf};

use kiln_config::{find_config, load_config, KilnConfig};
use kiln_lang::Registry;

use crate::GlobalArgs;

/// Loaded configuration plus the registry built from it.
pub struct Setup {
    /// The parsed configuration (defaults when no file was found).
    pub config: KilnConfig,
    /// Registry with the configuration applied.
    pub registry: Registry,
}

/// Finds the configuration file to use, if any.
///
/// `--config` wins; otherwise the nearest `kiln.toml` walking up from the
/// current directory.
pub fn config_path(global: &GlobalArgs) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    if let Some(ref path) = global.config {
        return Ok(Some(PathBuf::from(path)));
    }
    Ok(find_config(&std::env::current_dir()?))
}

/// Loads the configuration and builds the registry.
pub fn setup(global: &GlobalArgs) -> Result<Setup, Box<dyn std::error::Error>> {
    let config = match config_path(global)? {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            load_config(&path)?
        }
        None => KilnConfig::default(),
    };
    let registry = config.build_registry()?;
    Ok(Setup { config, registry })
}

/// Expands a `--libs` argument: `@<file>` reads the file, anything else is
/// used verbatim.
pub fn read_libraries(spec: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    match spec {
        None => Ok(String::new()),
        Some(spec) => match spec.strip_prefix('@') {
            Some(file) => std::fs::read_to_string(Path::new(file))
                .map_err(|e| format!("failed to read libraries file {file}: {e}").into()),
            None => Ok(spec.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global_with(config: Option<String>) -> GlobalArgs {
        GlobalArgs {
            quiet: false,
            verbose: false,
            color: false,
            config,
        }
    }

    #[test]
    fn explicit_config_is_loaded() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("custom.toml");
        let cache = tmp.path().join("artifacts");
        std::fs::write(
            &path,
            format!(
                "[cache]\nroot = \"{}\"\n\n[remote]\nurl = \"http://c/\"\ntimeout_secs = 5\n",
                cache.display()
            ),
        )
        .unwrap();

        let setup = setup(&global_with(Some(path.display().to_string()))).unwrap();
        assert_eq!(setup.config.timeout().as_secs(), 5);
        let sol = setup.registry.get("sol").unwrap();
        assert_eq!(sol.cache_dir, cache.join("sol"));
        assert_eq!(sol.remote_url.as_deref(), Some("http://c/"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent.toml");
        assert!(setup(&global_with(Some(path.display().to_string()))).is_err());
    }

    #[test]
    fn libraries_verbatim_or_from_file() {
        assert_eq!(read_libraries(None).unwrap(), "");
        assert_eq!(read_libraries(Some("Math:0x01")).unwrap(), "Math:0x01");

        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("libs.txt");
        std::fs::write(&file, "Math:0x02\n").unwrap();
        let arg = format!("@{}", file.display());
        assert_eq!(read_libraries(Some(&arg)).unwrap(), "Math:0x02\n");

        let missing = format!("@{}", tmp.path().join("nope").display());
        assert!(read_libraries(Some(&missing)).is_err());
    }
}
