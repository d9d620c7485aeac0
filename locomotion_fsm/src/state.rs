//! Locomotion state tree.
//!
//! Root states (grounded, jump, fall) are owned by the driver; each root owns
//! exactly one locomotion substate (idle, walk, run). A transition is requested
//! by returning the target kind from `update`, and the owner of the requesting
//! node performs the swap: the driver for roots, the root for substates.

use std::fmt;

use rapier3d::prelude::Real;
use tracing::debug;

use crate::context::{MotionContext, MotionTuning};
use crate::jump_profile::MAX_JUMP_COUNT;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKind {
    Grounded,
    Jump,
    Fall,
    Idle,
    Walk,
    Run,
}

impl StateKind {
    pub fn is_root(self) -> bool {
        matches!(self, StateKind::Grounded | StateKind::Jump | StateKind::Fall)
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StateKind::Grounded => "grounded",
            StateKind::Jump => "jump",
            StateKind::Fall => "fall",
            StateKind::Idle => "idle",
            StateKind::Walk => "walk",
            StateKind::Run => "run",
        };
        write!(f, "{}", label)
    }
}

#[derive(Clone, Debug)]
pub struct StateNode {
    kind: StateKind,
    /// Kind of the owning root; `None` for roots.
    superstate: Option<StateKind>,
    substate: Option<Box<StateNode>>,
}

impl StateNode {
    /// Builds a state of `kind`. Roots immediately pick their substate from the
    /// current input; neither node has entered yet.
    pub fn create(kind: StateKind, ctx: &MotionContext) -> Self {
        let mut node = Self {
            kind,
            superstate: None,
            substate: None,
        };
        if kind.is_root() {
            node.init_substate(ctx);
        }
        node
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    pub fn superstate(&self) -> Option<StateKind> {
        self.superstate
    }

    pub fn substate(&self) -> Option<&StateNode> {
        self.substate.as_deref()
    }

    pub fn init_substate(&mut self, ctx: &MotionContext) {
        if !self.kind.is_root() {
            return;
        }
        let kind = if !ctx.is_movement_pressed && !ctx.is_run_pressed {
            StateKind::Idle
        } else if ctx.is_movement_pressed && !ctx.is_run_pressed {
            StateKind::Walk
        } else {
            StateKind::Run
        };
        self.set_substate(StateNode::create(kind, ctx));
    }

    fn set_substate(&mut self, mut node: StateNode) {
        assert!(
            !node.kind.is_root(),
            "root state {} cannot be nested under {}",
            node.kind,
            self.kind
        );
        node.superstate = Some(self.kind);
        self.substate = Some(Box::new(node));
    }

    pub fn enter(&mut self, ctx: &mut MotionContext, tuning: &MotionTuning) {
        match self.kind {
            StateKind::Idle => ctx.set_horizontal(0.0),
            StateKind::Walk => {
                ctx.animation.walking = true;
                ctx.animation.running = false;
                ctx.set_horizontal(1.0);
            }
            StateKind::Run => {
                ctx.animation.walking = true;
                ctx.animation.running = true;
                ctx.set_horizontal(tuning.config.run_multiplier);
            }
            StateKind::Grounded => ctx.set_vertical(tuning.config.grounded_gravity),
            StateKind::Jump => enter_jump(ctx, tuning),
            StateKind::Fall => ctx.animation.falling = true,
        }
    }

    pub fn exit(&mut self, ctx: &mut MotionContext, tuning: &MotionTuning) {
        match self.kind {
            StateKind::Idle | StateKind::Grounded => {}
            StateKind::Walk => ctx.animation.walking = false,
            StateKind::Run => {
                ctx.animation.walking = false;
                ctx.animation.running = false;
            }
            StateKind::Jump => exit_jump(ctx, tuning),
            StateKind::Fall => ctx.animation.falling = false,
        }
    }

    /// Decides the next state from the context alone; `None` stays.
    pub fn check_transition(&self, ctx: &MotionContext) -> Option<StateKind> {
        match self.kind {
            StateKind::Idle => {
                if ctx.is_movement_pressed && ctx.is_run_pressed {
                    Some(StateKind::Run)
                } else if ctx.is_movement_pressed {
                    Some(StateKind::Walk)
                } else {
                    None
                }
            }
            StateKind::Walk => {
                if !ctx.is_movement_pressed {
                    Some(StateKind::Idle)
                } else if ctx.is_run_pressed {
                    Some(StateKind::Run)
                } else {
                    None
                }
            }
            StateKind::Run => {
                if !ctx.is_movement_pressed {
                    Some(StateKind::Idle)
                } else if !ctx.is_run_pressed {
                    Some(StateKind::Walk)
                } else {
                    None
                }
            }
            StateKind::Grounded => {
                if ctx.is_jump_pressed && !ctx.required_new_jump_press {
                    Some(StateKind::Jump)
                } else if !ctx.is_grounded {
                    Some(StateKind::Fall)
                } else {
                    None
                }
            }
            StateKind::Jump | StateKind::Fall => ctx.is_grounded.then_some(StateKind::Grounded),
        }
    }

    /// Runs this node's per-tick physics, then reports the requested
    /// transition for this node's level.
    pub fn update(
        &mut self,
        ctx: &mut MotionContext,
        tuning: &MotionTuning,
        dt: Real,
    ) -> Option<StateKind> {
        match self.kind {
            StateKind::Idle => ctx.set_horizontal(0.0),
            StateKind::Walk => ctx.set_horizontal(1.0),
            StateKind::Run => ctx.set_horizontal(tuning.config.run_multiplier),
            StateKind::Grounded => {}
            StateKind::Jump => integrate_jump(ctx, tuning, dt),
            StateKind::Fall => ctx.integrate_vertical(
                tuning.config.fall_gravity,
                dt,
                Some(tuning.config.fall_speed_floor),
            ),
        }
        self.check_transition(ctx)
    }

    /// Updates the active substate and applies any transition it requests.
    pub fn update_substate(&mut self, ctx: &mut MotionContext, tuning: &MotionTuning, dt: Real) {
        let Some(substate) = self.substate.as_mut() else {
            return;
        };
        if let Some(target) = substate.update(ctx, tuning, dt) {
            self.replace_substate(target, ctx, tuning);
        }
    }

    fn replace_substate(
        &mut self,
        target: StateKind,
        ctx: &mut MotionContext,
        tuning: &MotionTuning,
    ) {
        let mut current = self
            .substate
            .take()
            .unwrap_or_else(|| panic!("{} has no substate to replace", self.kind));
        assert_eq!(
            current.superstate,
            Some(self.kind),
            "substate {} is not owned by {}",
            current.kind,
            self.kind
        );
        let next = StateNode::create(target, ctx);
        current.exit(ctx, tuning);
        self.set_substate(next);
        if let Some(next) = self.substate.as_mut() {
            next.enter(ctx, tuning);
        }
        debug!(scope = "substate", from = %current.kind, to = %target, "locomotion transition");
    }

    /// Enters this node, then its substate.
    pub fn enter_chain(&mut self, ctx: &mut MotionContext, tuning: &MotionTuning) {
        self.enter(ctx, tuning);
        if let Some(substate) = self.substate.as_mut() {
            substate.enter(ctx, tuning);
        }
    }

    /// Exits the substate, then this node.
    pub fn exit_chain(&mut self, ctx: &mut MotionContext, tuning: &MotionTuning) {
        if let Some(substate) = self.substate.as_mut() {
            substate.exit(ctx, tuning);
        }
        self.exit(ctx, tuning);
    }
}

fn enter_jump(ctx: &mut MotionContext, tuning: &MotionTuning) {
    if ctx.jump_count < MAX_JUMP_COUNT && ctx.jump_reset.is_pending() {
        ctx.jump_reset.cancel();
    }
    ctx.animation.jumping = true;
    ctx.required_new_jump_press = true;
    ctx.jump_count += 1;
    ctx.assert_invariants();
    let velocity = tuning.profile.initial_velocity(ctx.jump_count);
    ctx.set_vertical(velocity);
    debug!(jump_count = ctx.jump_count, velocity, "jump");
}

fn exit_jump(ctx: &mut MotionContext, tuning: &MotionTuning) {
    ctx.animation.jumping = false;
    if ctx.is_jump_pressed {
        ctx.required_new_jump_press = true;
    }
    ctx.jump_reset.schedule(tuning.config.jump_reset_delay);
    if ctx.jump_count == MAX_JUMP_COUNT {
        ctx.reset_jump_chain();
        debug!("jump chain complete");
    }
}

fn integrate_jump(ctx: &mut MotionContext, tuning: &MotionTuning, dt: Real) {
    let config = &tuning.config;
    let gravity = tuning.profile.gravity(ctx.jump_count);
    let falling = ctx.current_movement_y <= 0.0 || !ctx.is_jump_pressed;
    if falling {
        let floor = if ctx.jump_count >= 2 {
            config.multi_jump_fall_speed_floor
        } else {
            config.fall_speed_floor
        };
        ctx.integrate_vertical(gravity * config.fall_multiplier, dt, Some(floor));
    } else {
        ctx.integrate_vertical(gravity, dt, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocomotionConfig;
    use crate::context::MotionInput;

    fn tuning() -> MotionTuning {
        MotionTuning::new(LocomotionConfig::default())
    }

    fn context(axis: [Real; 2], run: bool, jump: bool, grounded: bool) -> MotionContext {
        let mut ctx = MotionContext::default();
        ctx.apply_input(
            MotionInput {
                move_axis: axis,
                run,
                jump,
            },
            grounded,
        );
        ctx
    }

    #[test]
    fn roots_select_substate_from_input() {
        let cases = [
            ([0.0, 0.0], false, StateKind::Idle),
            ([0.0, 1.0], false, StateKind::Walk),
            ([1.0, 0.0], true, StateKind::Run),
            // Run held without movement still picks run.
            ([0.0, 0.0], true, StateKind::Run),
        ];
        for (axis, run, expected) in cases {
            let ctx = context(axis, run, false, true);
            for root in [StateKind::Grounded, StateKind::Jump, StateKind::Fall] {
                let node = StateNode::create(root, &ctx);
                let sub = node.substate().expect("substate");
                assert_eq!(sub.kind(), expected);
                assert_eq!(sub.superstate(), Some(root));
                assert!(sub.substate().is_none());
            }
        }
    }

    #[test]
    fn substates_have_no_children() {
        let ctx = context([1.0, 0.0], false, false, true);
        let node = StateNode::create(StateKind::Walk, &ctx);
        assert!(node.substate().is_none());
    }

    #[test]
    fn check_transition_is_repeatable() {
        let ctx = context([0.0, 1.0], true, true, false);
        for kind in [
            StateKind::Grounded,
            StateKind::Jump,
            StateKind::Fall,
            StateKind::Idle,
            StateKind::Walk,
            StateKind::Run,
        ] {
            let node = StateNode::create(kind, &ctx);
            assert_eq!(node.check_transition(&ctx), node.check_transition(&ctx));
        }
    }

    #[test]
    fn locomotion_transition_table() {
        let idle = StateNode::create(StateKind::Idle, &MotionContext::default());
        let walk = StateNode::create(StateKind::Walk, &MotionContext::default());
        let run = StateNode::create(StateKind::Run, &MotionContext::default());

        let still = context([0.0, 0.0], false, false, true);
        let moving = context([0.5, 0.0], false, false, true);
        let sprinting = context([0.5, 0.0], true, false, true);

        assert_eq!(idle.check_transition(&still), None);
        assert_eq!(idle.check_transition(&moving), Some(StateKind::Walk));
        assert_eq!(idle.check_transition(&sprinting), Some(StateKind::Run));
        assert_eq!(walk.check_transition(&still), Some(StateKind::Idle));
        assert_eq!(walk.check_transition(&moving), None);
        assert_eq!(walk.check_transition(&sprinting), Some(StateKind::Run));
        assert_eq!(run.check_transition(&still), Some(StateKind::Idle));
        assert_eq!(run.check_transition(&moving), Some(StateKind::Walk));
        assert_eq!(run.check_transition(&sprinting), None);
    }

    #[test]
    fn grounded_prefers_jump_over_fall() {
        let ctx = context([0.0, 0.0], false, true, false);
        let grounded = StateNode::create(StateKind::Grounded, &ctx);
        assert_eq!(grounded.check_transition(&ctx), Some(StateKind::Jump));

        let mut held = ctx.clone();
        held.required_new_jump_press = true;
        assert_eq!(grounded.check_transition(&held), Some(StateKind::Fall));
    }

    #[test]
    fn substate_switch_updates_animation_flags() {
        let tuning = tuning();
        let mut ctx = context([0.0, 1.0], false, false, true);
        let mut root = StateNode::create(StateKind::Grounded, &ctx);
        root.enter_chain(&mut ctx, &tuning);
        assert!(ctx.animation.walking);
        assert!(!ctx.animation.running);

        ctx.apply_input(
            MotionInput {
                move_axis: [0.0, 1.0],
                run: true,
                jump: false,
            },
            true,
        );
        root.update_substate(&mut ctx, &tuning, 1.0 / 60.0);
        assert_eq!(root.substate().map(StateNode::kind), Some(StateKind::Run));
        assert!(ctx.animation.walking);
        assert!(ctx.animation.running);

        ctx.apply_input(MotionInput::default(), true);
        root.update_substate(&mut ctx, &tuning, 1.0 / 60.0);
        assert_eq!(root.substate().map(StateNode::kind), Some(StateKind::Idle));
        assert!(!ctx.animation.walking);
        assert!(!ctx.animation.running);
    }

    #[test]
    fn run_scales_horizontal_movement() {
        let tuning = tuning();
        let mut ctx = context([0.5, -1.0], true, false, true);
        let mut run = StateNode::create(StateKind::Run, &ctx);
        assert_eq!(run.update(&mut ctx, &tuning, 0.1), None);
        assert_eq!(ctx.applied_movement.x, 1.0);
        assert_eq!(ctx.applied_movement.z, -2.0);
    }

    #[test]
    fn jump_enter_and_exit_bookkeeping() {
        let tuning = tuning();
        let mut ctx = context([0.0, 0.0], false, true, true);
        ctx.jump_reset.schedule(0.5);
        let mut jump = StateNode::create(StateKind::Jump, &ctx);
        jump.enter(&mut ctx, &tuning);
        assert_eq!(ctx.jump_count, 1);
        assert!(ctx.required_new_jump_press);
        assert!(ctx.animation.jumping);
        assert!(!ctx.jump_reset.is_pending());
        assert_eq!(ctx.current_movement_y, tuning.profile.initial_velocity(1));

        ctx.required_new_jump_press = false;
        jump.exit(&mut ctx, &tuning);
        assert!(!ctx.animation.jumping);
        assert!(ctx.required_new_jump_press);
        assert!(ctx.jump_reset.is_pending());
        assert_eq!(ctx.jump_count, 1);
    }

    #[test]
    fn third_jump_exit_resets_chain() {
        let tuning = tuning();
        let mut ctx = context([0.0, 0.0], false, false, true);
        ctx.jump_count = 2;
        let mut jump = StateNode::create(StateKind::Jump, &ctx);
        jump.enter(&mut ctx, &tuning);
        assert_eq!(ctx.jump_count, 3);
        jump.exit(&mut ctx, &tuning);
        assert_eq!(ctx.jump_count, 0);
        assert!(!ctx.jump_reset.is_pending());
    }

    #[test]
    fn jump_gravity_doubles_once_released() {
        let tuning = tuning();
        let dt = 0.01;
        let gravity = tuning.profile.gravity(1);

        let mut held = context([0.0, 0.0], false, true, false);
        let mut jump = StateNode::create(StateKind::Jump, &held);
        jump.enter(&mut held, &tuning);
        let start = held.current_movement_y;
        jump.update(&mut held, &tuning, dt);
        assert!((held.current_movement_y - (start + gravity * dt)).abs() < 1.0e-4);

        let mut released = context([0.0, 0.0], false, true, false);
        jump.enter(&mut released, &tuning);
        released.apply_input(MotionInput::default(), false);
        jump.update(&mut released, &tuning, dt);
        assert!((released.current_movement_y - (start + gravity * 2.0 * dt)).abs() < 1.0e-4);
    }

    #[test]
    fn jump_floor_depends_on_stage() {
        let tuning = tuning();
        let mut ctx = context([0.0, 0.0], false, false, false);
        let mut jump = StateNode::create(StateKind::Jump, &ctx);

        ctx.jump_count = 1;
        ctx.set_vertical(-100.0);
        jump.update(&mut ctx, &tuning, 0.1);
        assert_eq!(ctx.applied_movement.y, tuning.config.fall_speed_floor);

        ctx.jump_count = 2;
        ctx.set_vertical(-100.0);
        jump.update(&mut ctx, &tuning, 0.1);
        assert_eq!(ctx.applied_movement.y, tuning.config.multi_jump_fall_speed_floor);
    }

    #[test]
    #[should_panic]
    fn root_cannot_be_nested() {
        let ctx = MotionContext::default();
        let mut root = StateNode::create(StateKind::Grounded, &ctx);
        root.set_substate(StateNode::create(StateKind::Fall, &ctx));
    }

    #[test]
    #[should_panic(expected = "has no substate to replace")]
    fn replacing_missing_substate_is_fatal() {
        let tuning = tuning();
        let mut ctx = MotionContext::default();
        let mut root = StateNode::create(StateKind::Grounded, &ctx);
        root.substate.take();
        root.replace_substate(StateKind::Walk, &mut ctx, &tuning);
    }
}
