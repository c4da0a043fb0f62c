use super::Config;
use anyhow::Result;
use std::path::Path;

pub fn load_config(path: &str) -> Result<Config> {
    let config = Config::from_file(path)?;
    config.validate()?;
    Ok(config)
}

/// Load the config at `path`, falling back to defaults when the file is absent.
///
/// A file that exists but fails to parse or validate is still an error.
pub fn load_config_or_default(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        let config = load_config(path)?;
        log::info!("Loaded configuration from: {}", path);
        Ok(config)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config_or_default("/nonexistent/mail-briefing.yaml").unwrap();
        assert_eq!(config.summarizer.min_interval_ms, 1000);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let path = std::env::temp_dir().join(format!(
            "mail-briefing-invalid-{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, "summarizer:\n  cache_capacity: 0\n").unwrap();
        let result = load_config_or_default(&path.to_string_lossy());
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
