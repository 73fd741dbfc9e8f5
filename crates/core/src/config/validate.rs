use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upload size limit and supported type lists are non-trivial
/// - Simulator step/delay ranges are well-formed and termination is bounded
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Upload validation
    if config.upload.max_file_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "upload.max_file_size_bytes cannot be 0".to_string(),
        ));
    }
    if config.upload.image_types.is_empty() && config.upload.video_types.is_empty() {
        return Err(ConfigError::ValidationError(
            "upload must accept at least one MIME type".to_string(),
        ));
    }

    // Simulator validation: a zero min step would never terminate
    let sim = &config.simulator;
    if sim.min_step_pct == 0 {
        return Err(ConfigError::ValidationError(
            "simulator.min_step_pct must be at least 1".to_string(),
        ));
    }
    if sim.max_step_pct < sim.min_step_pct || sim.max_step_pct > 100 {
        return Err(ConfigError::ValidationError(format!(
            "simulator step range {}-{} is invalid",
            sim.min_step_pct, sim.max_step_pct
        )));
    }
    if sim.max_step_delay_ms < sim.min_step_delay_ms {
        return Err(ConfigError::ValidationError(format!(
            "simulator delay range {}-{} is invalid",
            sim.min_step_delay_ms, sim.max_step_delay_ms
        )));
    }
    if !(0.0..=1.0).contains(&sim.failure_probability) {
        return Err(ConfigError::ValidationError(format!(
            "simulator.failure_probability {} is not within 0.0-1.0",
            sim.failure_probability
        )));
    }

    Ok(())
}
