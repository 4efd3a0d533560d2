use crate::error::ConfigError;
use crate::image::{TargetSize, FILENAME_PLACEHOLDER};
use aws_sdk_s3 as s3;
use std::env;
use std::path::PathBuf;

pub const TARGET_BUCKET: &str = "TARGET_BUCKET";
pub const TARGET_KEY_TEMPLATE: &str = "TARGET_KEY_TEMPLATE";
pub const TARGET_WIDTH: &str = "TARGET_WIDTH";
pub const TARGET_HEIGHT: &str = "TARGET_HEIGHT";
pub const SCRATCH_DIR: &str = "SCRATCH_DIR";
pub const RESIZE_DEBUG: &str = "RESIZE_DEBUG";
pub const FIXTURE_PATH: &str = "FIXTURE_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Bucket the resized images are published to.
    pub destination_bucket: String,

    /// Key for the resized image, `{filename}` is replaced with the source key's basename.
    pub destination_key_template: String,

    pub target_size: TargetSize,

    /// Directory for the per-record original and resized files.
    pub scratch_dir: PathBuf,

    /// Swap the S3 collaborators for local stubs and log at DEBUG.
    pub debug: bool,

    /// Image the stub download copies in place of the real object.
    pub fixture_path: PathBuf,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        HandlerConfig {
            destination_bucket: "target_bucket".to_string(),
            destination_key_template: "images/{filename}".to_string(),
            target_size: TargetSize::new(400, 400),
            scratch_dir: env::temp_dir(),
            debug: false,
            fixture_path: PathBuf::from("shared/res/test-img.png"),
        }
    }
}

impl HandlerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the config from `lookup`, falling back to the defaults for
    /// every variable it doesn't return.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = HandlerConfig::default();

        let config = HandlerConfig {
            destination_bucket: lookup(TARGET_BUCKET).unwrap_or(defaults.destination_bucket),
            destination_key_template: lookup(TARGET_KEY_TEMPLATE)
                .unwrap_or(defaults.destination_key_template),
            target_size: TargetSize::new(
                parse_dimension(TARGET_WIDTH, lookup(TARGET_WIDTH), defaults.target_size.width)?,
                parse_dimension(
                    TARGET_HEIGHT,
                    lookup(TARGET_HEIGHT),
                    defaults.target_size.height,
                )?,
            ),
            scratch_dir: lookup(SCRATCH_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            debug: Self::debug_from_lookup(&lookup)?,
            fixture_path: lookup(FIXTURE_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.fixture_path),
        };

        config.validate()?;

        tracing::event!(tracing::Level::DEBUG, "{:?}", config);

        Ok(config)
    }

    /// Reads only the debug flag, so logging can be set up before the rest
    /// of the config is loaded and logged.
    pub fn debug_from_env() -> Result<bool, ConfigError> {
        Self::debug_from_lookup(|var| env::var(var).ok())
    }

    pub fn debug_from_lookup<F>(lookup: F) -> Result<bool, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        parse_flag(RESIZE_DEBUG, lookup(RESIZE_DEBUG), HandlerConfig::default().debug)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let TargetSize { width, height } = self.target_size;
        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroDimension { width, height });
        }

        if !self.destination_key_template.contains(FILENAME_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder {
                template: self.destination_key_template.clone(),
            });
        }

        Ok(())
    }
}

fn parse_dimension(var: &'static str, value: Option<String>, default: u32) -> Result<u32, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidNumber { var, value, source }),
        None => Ok(default),
    }
}

fn parse_flag(var: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { var, value }),
    }
}

pub async fn get_s3_client() -> s3::Client {
    let cfg = aws_config::load_from_env().await;

    s3::Client::new(&cfg)
}
