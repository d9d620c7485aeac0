//! Tuning parameters loaded from TOML.

use std::path::{Path, PathBuf};

use rapier3d::prelude::Real;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Horizontal speed scale applied to the displacement.
    pub movement_speed: Real,
    pub run_multiplier: Real,
    /// Gravity used by the fall state (negative).
    pub fall_gravity: Real,
    /// Vertical velocity held while grounded; keeps the character seated.
    pub grounded_gravity: Real,
    pub max_jump_height: Real,
    /// Total duration of the first-stage jump in seconds.
    pub max_jump_time: Real,
    /// Extra apex height per jump stage (1..=3).
    pub stage_height_offsets: [Real; 3],
    /// Time-to-apex multiplier per jump stage (1..=3).
    pub stage_apex_stretch: [Real; 3],
    pub fall_multiplier: Real,
    /// Applied-vertical floor for the fall state and first-stage jumps.
    pub fall_speed_floor: Real,
    /// Applied-vertical floor once the jump chain reaches stage 2.
    pub multi_jump_fall_speed_floor: Real,
    /// Seconds after landing before the jump chain resets.
    pub jump_reset_delay: Real,
    pub rotation_factor_per_second: Real,
    /// Extra reach below the character for the ground probe.
    pub probe_margin: Real,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            movement_speed: 2.5,
            run_multiplier: 2.0,
            fall_gravity: -9.8,
            grounded_gravity: -0.05,
            max_jump_height: 1.2,
            max_jump_time: 0.85,
            stage_height_offsets: [0.0, 1.0, 3.0],
            stage_apex_stretch: [1.0, 1.25, 1.75],
            fall_multiplier: 2.0,
            fall_speed_floor: -20.0,
            multi_jump_fall_speed_floor: -30.0,
            jump_reset_delay: 0.5,
            rotation_factor_per_second: 15.0,
            probe_margin: 0.1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse locomotion config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid locomotion config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[derive(Clone, Debug, Default)]
pub struct ConfigValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConfigValidation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl LocomotionConfig {
    pub fn parse_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a tuning file without validating it.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&text)
    }

    /// Reads, parses and validates a tuning file. Warnings are logged, errors
    /// reject the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::read(path)?;
        let validation = config.validate();
        for warning in &validation.warnings {
            tracing::warn!(path = %path.display(), "{}", warning);
        }
        if !validation.is_ok() {
            return Err(ConfigError::Invalid(validation.errors));
        }
        Ok(config)
    }

    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::default();
        let mut require = |ok: bool, message: &str| {
            if !ok {
                validation.errors.push(message.to_string());
            }
        };
        require(
            positive(self.movement_speed),
            "movement_speed must be > 0",
        );
        require(positive(self.run_multiplier), "run_multiplier must be > 0");
        require(negative(self.fall_gravity), "fall_gravity must be < 0");
        require(
            self.grounded_gravity.is_finite() && self.grounded_gravity <= 0.0,
            "grounded_gravity must be <= 0",
        );
        require(positive(self.max_jump_height), "max_jump_height must be > 0");
        require(positive(self.max_jump_time), "max_jump_time must be > 0");
        require(
            self.stage_height_offsets
                .iter()
                .all(|offset| offset.is_finite() && *offset >= 0.0),
            "stage_height_offsets must be >= 0",
        );
        require(
            self.stage_apex_stretch
                .iter()
                .all(|stretch| stretch.is_finite() && *stretch >= 1.0),
            "stage_apex_stretch must be >= 1",
        );
        require(
            self.fall_multiplier.is_finite() && self.fall_multiplier >= 1.0,
            "fall_multiplier must be >= 1",
        );
        require(negative(self.fall_speed_floor), "fall_speed_floor must be < 0");
        require(
            negative(self.multi_jump_fall_speed_floor),
            "multi_jump_fall_speed_floor must be < 0",
        );
        require(
            self.jump_reset_delay.is_finite() && self.jump_reset_delay >= 0.0,
            "jump_reset_delay must be >= 0",
        );
        require(
            self.rotation_factor_per_second.is_finite() && self.rotation_factor_per_second >= 0.0,
            "rotation_factor_per_second must be >= 0",
        );
        require(
            self.probe_margin.is_finite() && self.probe_margin >= 0.0,
            "probe_margin must be >= 0",
        );

        if self.multi_jump_fall_speed_floor > self.fall_speed_floor {
            validation
                .warnings
                .push("multi_jump_fall_speed_floor is above fall_speed_floor".to_string());
        }
        if self.rotation_factor_per_second == 0.0 {
            validation
                .warnings
                .push("rotation_factor_per_second is 0; facing never turns".to_string());
        }
        validation
    }
}

fn positive(value: Real) -> bool {
    value.is_finite() && value > 0.0
}

fn negative(value: Real) -> bool {
    value.is_finite() && value < 0.0
}
