//! Configuration loader with environment variable support

use super::Config;
use crate::error::Result;
use config::{Environment, File};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = config::Config::builder()
        .add_source(File::from(path.as_ref()))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    Ok(cfg)
}

/// Load configuration from a TOML file with `SILICONCLOUD__*` overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = config::Config::builder()
        .add_source(File::from(path.as_ref()))
        .add_source(
            Environment::with_prefix("SILICONCLOUD")
                .separator("__")
                .try_parsing(true)
        )
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn write_temp_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.toml", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_config_from_file() {
        let path = write_temp_config(
            "siliconcloud-loader",
            r#"
                [embedding]
                base_url = "https://example.com/v1"
                api_key = "Bearer sk-abc"
                max_token_size = 512

                [chat]
                timeout_secs = 60

                [logging]
                level = "debug"
                format = "json"
            "#,
        );

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.embedding.base_url, "https://example.com/v1");
        assert_eq!(cfg.embedding.max_token_size, 512);
        assert_eq!(cfg.embedding.api_key.unwrap().expose_secret(), "Bearer sk-abc");
        assert_eq!(cfg.chat.timeout_secs, 60);
        assert_eq!(cfg.logging.level, "debug");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("/nonexistent/siliconcloud.toml");
        assert!(matches!(result, Err(crate::error::AdapterError::Config(_))));
    }
}
