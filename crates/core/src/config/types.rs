use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::upload::License;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Upload intake configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes (default: 50 MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Accepted image MIME types
    #[serde(default = "default_image_types")]
    pub image_types: Vec<String>,
    /// Accepted video MIME types
    #[serde(default = "default_video_types")]
    pub video_types: Vec<String>,
    /// License assigned to newly accepted files
    #[serde(default)]
    pub default_license: License,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            image_types: default_image_types(),
            video_types: default_video_types(),
            default_license: License::default(),
        }
    }
}

impl UploadConfig {
    /// Returns true if the given MIME type is in the supported set.
    pub fn is_supported_type(&self, mime_type: &str) -> bool {
        self.image_types.iter().any(|t| t == mime_type)
            || self.video_types.iter().any(|t| t == mime_type)
    }
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024
}

fn default_image_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/gif", "image/webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_video_types() -> Vec<String> {
    ["video/mp4", "video/webm", "video/quicktime"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Transfer simulator configuration
///
/// Step sizes and delays are drawn uniformly from the configured ranges,
/// modeling variable network throughput. A per-entry fault is drawn from
/// `failure_probability` when the transfer starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    /// Smallest progress increment per step, in percent (must be >= 1)
    #[serde(default = "default_min_step")]
    pub min_step_pct: u8,
    /// Largest progress increment per step, in percent
    #[serde(default = "default_max_step")]
    pub max_step_pct: u8,
    /// Smallest inter-step delay in milliseconds
    #[serde(default = "default_min_delay")]
    pub min_step_delay_ms: u64,
    /// Largest inter-step delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_step_delay_ms: u64,
    /// Probability that a given transfer fails before completing (0.0 - 1.0)
    #[serde(default = "default_failure_probability")]
    pub failure_probability: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            min_step_pct: default_min_step(),
            max_step_pct: default_max_step(),
            min_step_delay_ms: default_min_delay(),
            max_step_delay_ms: default_max_delay(),
            failure_probability: default_failure_probability(),
        }
    }
}

impl SimulatorConfig {
    /// Config for tests: deterministic-friendly, no real waiting.
    pub fn instant() -> Self {
        Self {
            min_step_delay_ms: 0,
            max_step_delay_ms: 0,
            ..Self::default()
        }
    }
}

fn default_min_step() -> u8 {
    5
}

fn default_max_step() -> u8 {
    15
}

fn default_min_delay() -> u64 {
    100
}

fn default_max_delay() -> u64 {
    300
}

fn default_failure_probability() -> f64 {
    0.1
}
