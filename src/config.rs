//! Configuration management for jaf.
//!
//! Settings come from three places, later ones winning:
//! - Sensible defaults for everything
//! - Command-line arguments and `JAF_` environment variables (clap)
//! - An optional `Key: value` config file (`--config-file`)
//!
//! # Environment Variables
//!
//! - `JAF_HOST` - Server bind address (default: 0.0.0.0)
//! - `JAF_PORT` - Server port (default: 4711)
//! - `JAF_LINK_PREFIX` - Prefix of returned links (default: https://jaf.example.com/)
//! - `JAF_FILE_DIR` - Upload directory (default: /var/www/jaf/)
//! - `JAF_LINK_LENGTH` - Random characters per file name (default: 5)
//! - `JAF_SCRUB_EXIF` - Scrub EXIF from JPEG/PNG uploads (default: true)
//! - `JAF_EXIF_ALLOWED_IDS` - Comma-separated tag ids to keep, decimal or `0x` hex
//! - `JAF_EXIF_ALLOWED_PATHS` - Comma-separated tag paths to keep, e.g. `IFD/Orientation`
//! - `JAF_EXIF_ABORT_ON_ERROR` - Reject uploads that cannot be scrubbed (default: true)
//! - `JAF_MAX_UPLOAD_SIZE` - Largest accepted request body in bytes
//! - `JAF_REQUEST_TIMEOUT` - Request timeout in seconds (default: 30)
//! - `JAF_CONFIG_FILE` - Path of a config file to load
//!
//! # Config File
//!
//! ```text
//! # Lines starting with '#' are comments
//! Port: 4711
//! LinkPrefix: https://jaf.example.com/
//! FileDir: /var/www/jaf/
//! LinkLength: 5
//! ScrubExif: true
//! ExifAllowedIds: 0x0112 274
//! ExifAllowedPaths: IFD/Orientation IFD/Exif/Flash
//! ExifAbortOnError: true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing::warn;

use crate::error::ConfigError;
use crate::scrub::ExifScrubber;
use crate::server::{RouterConfig, DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::upload::UploadSettings;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 4711;

/// Default prefix of returned links.
pub const DEFAULT_LINK_PREFIX: &str = "https://jaf.example.com/";

/// Default upload directory.
pub const DEFAULT_FILE_DIR: &str = "/var/www/jaf/";

/// Default number of random characters per file name.
pub const DEFAULT_LINK_LENGTH: usize = 5;

/// Longest supported random file name.
pub const MAX_LINK_LENGTH: usize = 128;

const COMMENT_PREFIX: char = '#';

// =============================================================================
// CLI Arguments
// =============================================================================

/// jaf - just another file host.
///
/// Accepts file uploads over HTTP, stores them under short random names and
/// strips EXIF metadata from JPEG and PNG images on the way in.
#[derive(Parser, Debug, Clone)]
#[command(name = "jaf")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "JAF_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "JAF_PORT")]
    pub port: u16,

    /// Largest accepted request body in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_SIZE, env = "JAF_MAX_UPLOAD_SIZE")]
    pub max_upload_size: usize,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, env = "JAF_REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Prefix prepended to a stored file's name to form its link.
    #[arg(long, default_value = DEFAULT_LINK_PREFIX, env = "JAF_LINK_PREFIX")]
    pub link_prefix: String,

    /// Directory uploads are stored in.
    #[arg(long, default_value = DEFAULT_FILE_DIR, env = "JAF_FILE_DIR")]
    pub file_dir: PathBuf,

    /// Number of random characters in a stored file's name.
    #[arg(long, default_value_t = DEFAULT_LINK_LENGTH, env = "JAF_LINK_LENGTH")]
    pub link_length: usize,

    // =========================================================================
    // EXIF Configuration
    // =========================================================================
    /// Scrub EXIF metadata from JPEG and PNG uploads.
    #[arg(long, default_value_t = true, action = ArgAction::Set, env = "JAF_SCRUB_EXIF")]
    pub scrub_exif: bool,

    /// EXIF tag ids to keep in every directory (comma-separated, decimal or 0x hex).
    #[arg(
        long,
        env = "JAF_EXIF_ALLOWED_IDS",
        value_delimiter = ',',
        value_parser = parse_tag_id
    )]
    pub exif_allowed_ids: Vec<u16>,

    /// EXIF tag paths to keep (comma-separated, e.g. IFD/Orientation).
    #[arg(long, env = "JAF_EXIF_ALLOWED_PATHS", value_delimiter = ',')]
    pub exif_allowed_paths: Vec<String>,

    /// Reject uploads whose EXIF cannot be scrubbed instead of storing them unmodified.
    #[arg(long, default_value_t = true, action = ArgAction::Set, env = "JAF_EXIF_ABORT_ON_ERROR")]
    pub exif_abort_on_error: bool,

    /// Config file in `Key: value` format; its values override the ones above.
    #[arg(long, env = "JAF_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.link_length == 0 || self.link_length > MAX_LINK_LENGTH {
            return Err(format!(
                "link_length must be between 1 and {}",
                MAX_LINK_LENGTH
            ));
        }

        if self.file_dir.as_os_str().is_empty() {
            return Err("file_dir must not be empty. Set --file-dir or JAF_FILE_DIR".to_string());
        }

        if self.max_upload_size == 0 {
            return Err("max_upload_size must be greater than 0".to_string());
        }

        if self.request_timeout == 0 {
            return Err("request_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Load a `Key: value` config file and apply its values.
    pub fn apply_config_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        self.apply_config_str(&contents)
    }

    /// Apply config file contents.
    ///
    /// Comment lines and blank lines are skipped. A line without `:` or an
    /// unparseable id in `ExifAllowedIds` is logged and ignored; an unknown
    /// key or an invalid scalar value is an error.
    pub fn apply_config_str(&mut self, contents: &str) -> Result<(), ConfigError> {
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                warn!(line = line, "Unexpected config line, ignoring");
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "Port" => self.port = parse_value(key, value, str::parse)?,
                "LinkPrefix" => self.link_prefix = value.to_string(),
                "FileDir" => self.file_dir = PathBuf::from(value),
                "LinkLength" => self.link_length = parse_value(key, value, str::parse)?,
                "ScrubExif" => self.scrub_exif = parse_value(key, value, parse_bool)?,
                "ExifAllowedIds" => {
                    if value.is_empty() {
                        continue;
                    }
                    self.exif_allowed_ids = value
                        .split_whitespace()
                        .filter_map(|id| match parse_tag_id(id) {
                            Ok(id) => Some(id),
                            Err(e) => {
                                warn!(id = id, error = %e, "Could not parse tag id, ignoring");
                                None
                            }
                        })
                        .collect();
                }
                "ExifAllowedPaths" => {
                    if value.is_empty() {
                        continue;
                    }
                    self.exif_allowed_paths =
                        value.split_whitespace().map(str::to_string).collect();
                }
                "ExifAbortOnError" => {
                    self.exif_abort_on_error = parse_value(key, value, parse_bool)?
                }
                _ => return Err(ConfigError::UnknownKey(key.to_string())),
            }
        }

        Ok(())
    }

    /// Settings for the upload service.
    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            file_dir: self.file_dir.clone(),
            link_prefix: self.link_prefix.clone(),
            link_length: self.link_length,
            scrub_exif: self.scrub_exif,
            exif_abort_on_error: self.exif_abort_on_error,
        }
    }

    /// Scrubber keeping the configured tag ids and paths.
    pub fn scrubber(&self) -> ExifScrubber {
        ExifScrubber::new(
            self.exif_allowed_ids.iter().copied(),
            self.exif_allowed_paths.iter().cloned(),
        )
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig::default()
            .with_max_upload_size(self.max_upload_size)
            .with_request_timeout(Duration::from_secs(self.request_timeout))
            .with_tracing(!self.no_tracing)
    }
}

// =============================================================================
// Value Parsers
// =============================================================================

/// Parse a tag id written in decimal or with a `0x` hex prefix.
pub fn parse_tag_id(s: &str) -> Result<u16, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid tag id \"{}\": {}", s, e))
}

/// Parse a boolean the way config files have always spelled them.
fn parse_bool(s: &str) -> Result<bool, ()> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(()),
    }
}

fn parse_value<T, E>(
    key: &str,
    value: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<T, ConfigError> {
    parse(value).map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
