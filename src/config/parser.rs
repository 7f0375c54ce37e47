use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use site_harvester::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is logged at start-up so runs can be matched to the exact
/// configuration that produced them.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{AssetNaming, FingerprintMode};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
base-url = "https://tuyensinh.uel.edu.vn"
max-depth = 3
concurrency = 10
fingerprint = "visible-text"

[fetch]
retries = 5
delay-ms = 250

[admission]
domain-marker = "uel"
excluded-substrings = ["facebook"]

[output]
table-path = "./pages.csv"
download-folder = "./pdf"
asset-naming = "content-hash"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 3);
        assert_eq!(config.crawler.concurrency, 10);
        assert_eq!(config.crawler.fingerprint, FingerprintMode::VisibleText);
        assert_eq!(config.fetch.retries, 5);
        assert_eq!(config.fetch.delay_ms, 250);
        assert_eq!(config.fetch.text_timeout_secs, 10);
        assert_eq!(config.admission.excluded_substrings, vec!["facebook"]);
        assert_eq!(config.admission.pdf_suffix, ".pdf");
        assert_eq!(config.output.asset_naming, AssetNaming::ContentHash);
    }

    #[test]
    fn test_defaults_for_optional_sections() {
        let config_content = r#"
[crawler]
base-url = "https://tuyensinh.uel.edu.vn"
max-depth = 1

[output]
table-path = "./pages.csv"
download-folder = "./pdf"
"#;

        let config = parse_config(config_content).unwrap();

        assert_eq!(config.crawler.concurrency, 16);
        assert_eq!(config.crawler.max_pages, 0);
        assert_eq!(config.crawler.fingerprint, FingerprintMode::RawHtml);
        assert_eq!(config.fetch.retries, 3);
        assert_eq!(config.fetch.delay_ms, 1000);
        assert_eq!(config.fetch.binary_timeout_secs, 20);
        assert_eq!(config.admission.domain_marker, "uel");
        assert_eq!(config.admission.required_prefix, "https");
        assert!(config
            .admission
            .excluded_extensions
            .contains(&".mp4".to_string()));
        assert_eq!(config.output.asset_naming, AssetNaming::Basename);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
base-url = "https://tuyensinh.uel.edu.vn"
max-depth = 3
concurrency = 0

[output]
table-path = "./pages.csv"
download-folder = "./pdf"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
