//! Per-stage jump kinematics derived from apex height and jump duration.

use rapier3d::prelude::Real;

use crate::config::LocomotionConfig;

/// Length of a consecutive jump chain before it resets.
pub const MAX_JUMP_COUNT: u8 = 3;

/// How each stage of a jump chain grows relative to the first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpStages {
    pub height_offsets: [Real; 3],
    pub apex_stretch: [Real; 3],
}

impl Default for JumpStages {
    fn default() -> Self {
        Self {
            height_offsets: [0.0, 1.0, 3.0],
            apex_stretch: [1.0, 1.25, 1.75],
        }
    }
}

/// Initial upward velocity for stages 1..=3 and gravity for stages 0..=3.
/// Stage 0 (no jump in progress) shares stage 1 gravity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpProfile {
    initial_velocities: [Real; MAX_JUMP_COUNT as usize],
    gravities: [Real; MAX_JUMP_COUNT as usize + 1],
}

pub fn build_jump_profile(max_height: Real, max_duration: Real) -> JumpProfile {
    JumpProfile::with_stages(max_height, max_duration, JumpStages::default())
}

impl JumpProfile {
    pub fn with_stages(max_height: Real, max_duration: Real, stages: JumpStages) -> Self {
        let time_to_apex = max_duration * 0.5;
        let mut initial_velocities = [0.0; MAX_JUMP_COUNT as usize];
        let mut gravities = [0.0; MAX_JUMP_COUNT as usize + 1];
        for stage in 0..MAX_JUMP_COUNT as usize {
            let height = max_height + stages.height_offsets[stage];
            let apex = time_to_apex * stages.apex_stretch[stage];
            gravities[stage + 1] = -2.0 * height / (apex * apex);
            initial_velocities[stage] = 2.0 * height / apex;
        }
        gravities[0] = gravities[1];
        Self {
            initial_velocities,
            gravities,
        }
    }

    pub fn from_config(config: &LocomotionConfig) -> Self {
        Self::with_stages(
            config.max_jump_height,
            config.max_jump_time,
            JumpStages {
                height_offsets: config.stage_height_offsets,
                apex_stretch: config.stage_apex_stretch,
            },
        )
    }

    pub fn initial_velocity(&self, stage: u8) -> Real {
        assert!(
            (1..=MAX_JUMP_COUNT).contains(&stage),
            "jump stage {} has no initial velocity",
            stage
        );
        self.initial_velocities[stage as usize - 1]
    }

    pub fn gravity(&self, stage: u8) -> Real {
        assert!(stage <= MAX_JUMP_COUNT, "jump stage {} out of range", stage);
        self.gravities[stage as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Real, b: Real) -> bool {
        (a - b).abs() < 1.0e-4
    }

    #[test]
    fn first_stage_matches_kinematics() {
        let profile = build_jump_profile(1.2, 0.85);
        let apex = 0.425;
        assert!(approx(profile.gravity(1), -2.0 * 1.2 / (apex * apex)));
        assert!(approx(profile.initial_velocity(1), 2.0 * 1.2 / apex));
        assert_eq!(profile.gravity(0), profile.gravity(1));
    }

    #[test]
    fn later_stages_are_higher_and_slower() {
        let profile = build_jump_profile(1.2, 0.85);
        let apex = 0.425;
        let second_apex = apex * 1.25;
        let third_apex = apex * 1.75;
        assert!(approx(profile.initial_velocity(2), 2.0 * 2.2 / second_apex));
        assert!(approx(profile.gravity(2), -2.0 * 2.2 / (second_apex * second_apex)));
        assert!(approx(profile.initial_velocity(3), 2.0 * 4.2 / third_apex));
        assert!(approx(profile.gravity(3), -2.0 * 4.2 / (third_apex * third_apex)));
    }

    #[test]
    fn signs_hold_for_any_positive_inputs() {
        for (height, duration) in [(0.1, 0.2), (1.2, 0.85), (5.0, 3.0), (20.0, 0.5)] {
            let profile = build_jump_profile(height, duration);
            for stage in 0..=MAX_JUMP_COUNT {
                assert!(profile.gravity(stage) < 0.0);
            }
            for stage in 1..=MAX_JUMP_COUNT {
                assert!(profile.initial_velocity(stage) > 0.0);
            }
        }
    }

    #[test]
    fn apex_height_is_reached() {
        let profile = build_jump_profile(1.2, 0.85);
        let v = profile.initial_velocity(1);
        let g = profile.gravity(1);
        let apex_height = -(v * v) / (2.0 * g);
        assert!(approx(apex_height, 1.2));
    }

    #[test]
    #[should_panic]
    fn stage_zero_has_no_velocity() {
        build_jump_profile(1.2, 0.85).initial_velocity(0);
    }
}
