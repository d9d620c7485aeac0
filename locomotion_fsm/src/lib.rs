//! Hierarchical locomotion state machine (idle, walk, run, jump, fall).
//!
//! The driver owns a two-level state tree: a root state (grounded, jump,
//! fall) holding one locomotion substate (idle, walk, run). Engine glue feeds
//! input and a grounded flag each tick and applies the returned displacement.
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod driver;
pub mod facing;
pub mod jump_profile;
pub mod state;
pub mod timer;

pub use config::{ConfigError, ConfigValidation, LocomotionConfig};
pub use context::{AnimationFlags, MotionContext, MotionInput, MotionTuning};
pub use driver::{Driver, LocomotionFrame};
pub use facing::Facing;
pub use jump_profile::{build_jump_profile, JumpProfile, JumpStages, MAX_JUMP_COUNT};
pub use state::{StateKind, StateNode};
pub use timer::DeferredReset;
