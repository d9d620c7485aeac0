//! Tick driver owning the active root state.

use rapier3d::math::{Rotation, Vector};
use rapier3d::prelude::Real;
use tracing::{debug, trace};

use crate::config::LocomotionConfig;
use crate::context::{AnimationFlags, MotionContext, MotionInput, MotionTuning};
use crate::facing::Facing;
use crate::jump_profile::JumpProfile;
use crate::state::{StateKind, StateNode};

/// Everything the engine side needs after one tick.
#[derive(Clone, Copy, Debug)]
pub struct LocomotionFrame {
    /// World-space translation to apply this tick.
    pub displacement: Vector<Real>,
    pub animation: AnimationFlags,
    pub jump_count: u8,
    pub root: StateKind,
    pub substate: Option<StateKind>,
    pub facing: Rotation<Real>,
}

pub struct Driver {
    tuning: MotionTuning,
    ctx: MotionContext,
    root: StateNode,
    facing: Facing,
}

impl Driver {
    /// Starts grounded with an idle substate.
    pub fn new(config: LocomotionConfig) -> Self {
        let tuning = MotionTuning::new(config);
        let mut ctx = MotionContext::default();
        let mut root = StateNode::create(StateKind::Grounded, &ctx);
        root.enter_chain(&mut ctx, &tuning);
        Self {
            facing: Facing::new(config.rotation_factor_per_second),
            tuning,
            ctx,
            root,
        }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.tuning.config
    }

    pub fn profile(&self) -> &JumpProfile {
        &self.tuning.profile
    }

    pub fn context(&self) -> &MotionContext {
        &self.ctx
    }

    pub fn root(&self) -> &StateNode {
        &self.root
    }

    /// Root and substate kinds from the top of the chain down.
    pub fn active_chain(&self) -> Vec<StateKind> {
        let mut chain = vec![self.root.kind()];
        let mut node = self.root.substate();
        while let Some(current) = node {
            chain.push(current.kind());
            node = current.substate();
        }
        chain
    }

    pub fn facing(&self) -> &Facing {
        &self.facing
    }

    pub fn facing_mut(&mut self) -> &mut Facing {
        &mut self.facing
    }

    pub fn tick(&mut self, input: MotionInput, grounded: bool, dt: Real) -> LocomotionFrame {
        let dt = dt.max(0.0);
        if self.ctx.jump_reset.advance(dt) {
            self.ctx.jump_count = 0;
            debug!("jump chain reset after delay");
        }
        self.ctx.apply_input(input, grounded);

        if let Some(target) = self.root.update(&mut self.ctx, &self.tuning, dt) {
            self.switch_root(target);
        }
        self.root.update_substate(&mut self.ctx, &self.tuning, dt);
        self.ctx.assert_invariants();

        let facing = self.facing.update(
            self.ctx.movement_input,
            self.ctx.is_movement_pressed,
            dt,
        );
        let speed = self.tuning.config.movement_speed;
        let applied = self.ctx.applied_movement;
        let displacement = Vector::new(applied.x * speed, applied.y, applied.z * speed) * dt;
        trace!(
            root = %self.root.kind(),
            dx = displacement.x,
            dy = displacement.y,
            dz = displacement.z,
            "locomotion tick"
        );
        LocomotionFrame {
            displacement,
            animation: self.ctx.animation,
            jump_count: self.ctx.jump_count,
            root: self.root.kind(),
            substate: self.root.substate().map(StateNode::kind),
            facing,
        }
    }

    fn switch_root(&mut self, target: StateKind) {
        assert!(
            target.is_root(),
            "{} requested non-root state {} at the root level",
            self.root.kind(),
            target
        );
        let mut next = StateNode::create(target, &self.ctx);
        self.root.exit_chain(&mut self.ctx, &self.tuning);
        next.enter_chain(&mut self.ctx, &self.tuning);
        let previous = std::mem::replace(&mut self.root, next);
        debug!(scope = "root", from = %previous.kind(), to = %target, "locomotion transition");
    }
}
