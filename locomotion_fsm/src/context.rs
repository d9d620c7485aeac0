//! Per-character mutable motion state shared by every locomotion state.

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::config::LocomotionConfig;
use crate::jump_profile::{JumpProfile, MAX_JUMP_COUNT};
use crate::timer::DeferredReset;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionInput {
    pub move_axis: [Real; 2],
    pub run: bool,
    pub jump: bool,
}

/// Flags consumed by the animation collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimationFlags {
    pub walking: bool,
    pub running: bool,
    pub jumping: bool,
    pub falling: bool,
}

/// Read-only tuning handed to states alongside the mutable context.
#[derive(Clone, Copy, Debug)]
pub struct MotionTuning {
    pub config: LocomotionConfig,
    pub profile: JumpProfile,
}

impl MotionTuning {
    pub fn new(config: LocomotionConfig) -> Self {
        Self {
            profile: JumpProfile::from_config(&config),
            config,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MotionContext {
    pub movement_input: [Real; 2],
    pub is_movement_pressed: bool,
    pub is_run_pressed: bool,
    pub is_jump_pressed: bool,
    /// Set once a jump consumes the current press; cleared on any jump
    /// button edge.
    pub required_new_jump_press: bool,
    /// Integrated vertical velocity.
    pub current_movement_y: Real,
    /// Per-second movement contribution for this tick, before speed and dt.
    pub applied_movement: Vector<Real>,
    pub is_grounded: bool,
    pub jump_count: u8,
    pub jump_reset: DeferredReset,
    pub animation: AnimationFlags,
}

impl Default for MotionContext {
    fn default() -> Self {
        Self {
            movement_input: [0.0, 0.0],
            is_movement_pressed: false,
            is_run_pressed: false,
            is_jump_pressed: false,
            required_new_jump_press: false,
            current_movement_y: 0.0,
            applied_movement: Vector::zeros(),
            is_grounded: false,
            jump_count: 0,
            jump_reset: DeferredReset::default(),
            animation: AnimationFlags::default(),
        }
    }
}

impl MotionContext {
    pub fn apply_input(&mut self, input: MotionInput, grounded: bool) {
        let axis = [
            input.move_axis[0].clamp(-1.0, 1.0),
            input.move_axis[1].clamp(-1.0, 1.0),
        ];
        self.movement_input = axis;
        self.is_movement_pressed = axis[0] != 0.0 || axis[1] != 0.0;
        self.is_run_pressed = input.run;
        if input.jump != self.is_jump_pressed {
            self.required_new_jump_press = false;
        }
        self.is_jump_pressed = input.jump;
        self.is_grounded = grounded;
    }

    pub fn set_horizontal(&mut self, scale: Real) {
        self.applied_movement.x = self.movement_input[0] * scale;
        self.applied_movement.z = self.movement_input[1] * scale;
    }

    pub fn set_vertical(&mut self, velocity: Real) {
        self.current_movement_y = velocity;
        self.applied_movement.y = velocity;
    }

    /// Integrates vertical velocity with `gravity` and applies the average of
    /// the previous and new velocity, optionally clamped from below.
    pub fn integrate_vertical(&mut self, gravity: Real, dt: Real, floor: Option<Real>) {
        let previous = self.current_movement_y;
        self.current_movement_y = previous + gravity * dt;
        let applied = (previous + self.current_movement_y) * 0.5;
        self.applied_movement.y = match floor {
            Some(floor) => applied.max(floor),
            None => applied,
        };
    }

    pub fn reset_jump_chain(&mut self) {
        self.jump_count = 0;
        self.jump_reset.cancel();
    }

    pub(crate) fn assert_invariants(&self) {
        assert!(
            self.jump_count <= MAX_JUMP_COUNT,
            "jump count {} exceeds {}",
            self.jump_count,
            MAX_JUMP_COUNT
        );
    }
}
