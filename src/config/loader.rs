//! Config file loader and serialization.

use super::BootstrapConfig;
use crate::error::ConfigError;
use std::fs;
use std::path::Path;

/// Load config from a TOML file. Keys absent from the file keep their defaults.
pub fn load_config_from_file(path: &Path) -> Result<BootstrapConfig, ConfigError> {
    validate_config_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!(
                "Configuration file not found at: {}",
                path.display()
            ))
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let config: BootstrapConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Render a config as TOML. The credential is never included.
pub fn to_toml_string(config: &BootstrapConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}

/// Validate config path (.toml extension required).
pub fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path cannot be empty".to_string(),
        ));
    }

    match path.extension() {
        Some(ext) if ext == "toml" => Ok(()),
        Some(ext) => Err(ConfigError::ValidationFailed(format!(
            "Configuration file must have .toml extension, got .{}",
            ext.to_string_lossy()
        ))),
        None => Err(ConfigError::ValidationFailed(
            "Configuration file must have .toml extension".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Credential;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bootstrap.toml");
        fs::write(&path, "log_level = \"warn\"\n[layout]\nnested_subdir = \"flux\"\n").unwrap();

        let config = load_config_from_file(&path).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.layout.nested_subdir, "flux");
        assert_eq!(config.layout.primary.repo_id, "Wan-AI/Wan2.2-Animate-14B");
        assert_eq!(config.hub_command, vec!["huggingface-cli"]);
    }

    #[test]
    fn test_missing_file() {
        let result = load_config_from_file(&PathBuf::from("/nonexistent/bootstrap.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "log_level = [").unwrap();
        assert!(matches!(
            load_config_from_file(&path),
            Err(ConfigError::InvalidToml(_))
        ));
    }

    #[test]
    fn test_wrong_extension() {
        assert!(validate_config_path(Path::new("bootstrap.json")).is_err());
        assert!(validate_config_path(Path::new("bootstrap")).is_err());
        assert!(validate_config_path(Path::new("")).is_err());
        assert!(validate_config_path(Path::new("bootstrap.toml")).is_ok());
    }

    #[test]
    fn test_rendered_config_omits_credential() {
        let mut config = BootstrapConfig::default();
        config.credential = Credential::new("hf_do_not_print");
        let rendered = to_toml_string(&config).unwrap();
        assert!(!rendered.contains("hf_do_not_print"));
        assert!(rendered.contains("Wan-AI/Wan2.2-Animate-14B"));
    }
}
