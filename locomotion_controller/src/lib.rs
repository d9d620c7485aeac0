//! Character locomotion composition (input + ground probe + state machine).
#![forbid(unsafe_code)]

use ground_probe::{GroundProbe, SurfaceWorld};
use locomotion_fsm::{Driver, LocomotionConfig, LocomotionFrame, MotionInput};
use rapier3d::math::Isometry;
use rapier3d::prelude::Real;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default)]
pub struct RawInput {
    pub move_x: Real,
    pub move_y: Real,
    pub run: bool,
    pub jump: bool,
}

pub trait InputAdapter {
    fn intent(&mut self, raw: RawInput) -> MotionInput;
}

#[derive(Default)]
pub struct DirectInputAdapter;

impl DirectInputAdapter {
    fn normalize_axis(axis: [Real; 2]) -> [Real; 2] {
        let axis = [axis[0].clamp(-1.0, 1.0), axis[1].clamp(-1.0, 1.0)];
        let len = (axis[0] * axis[0] + axis[1] * axis[1]).sqrt();
        if len > 1.0 {
            [axis[0] / len, axis[1] / len]
        } else {
            axis
        }
    }
}

impl InputAdapter for DirectInputAdapter {
    fn intent(&mut self, raw: RawInput) -> MotionInput {
        MotionInput {
            move_axis: Self::normalize_axis([raw.move_x, raw.move_y]),
            run: raw.run,
            jump: raw.jump,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ControllerFrame {
    pub position: Isometry<Real>,
    pub grounded: bool,
    pub locomotion: LocomotionFrame,
}

pub struct LocomotionController<A: InputAdapter> {
    input: A,
    probe: GroundProbe,
    driver: Driver,
    position: Isometry<Real>,
    grounded: bool,
    last_vertical: Real,
}

impl<A: InputAdapter> LocomotionController<A> {
    /// `half_height` is the distance from the character centre to its feet.
    pub fn new(
        input: A,
        config: LocomotionConfig,
        half_height: Real,
        position: Isometry<Real>,
    ) -> Self {
        Self {
            input,
            probe: GroundProbe::new(half_height, config.probe_margin),
            driver: Driver::new(config),
            position,
            grounded: false,
            last_vertical: 0.0,
        }
    }

    pub fn position(&self) -> &Isometry<Real> {
        &self.position
    }

    pub fn set_position(&mut self, position: Isometry<Real>) {
        self.position = position;
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn probe(&self) -> &GroundProbe {
        &self.probe
    }

    pub fn tick(&mut self, world: &SurfaceWorld, raw: RawInput, dt: Real) -> ControllerFrame {
        let intent = self.input.intent(raw);
        // A rising character still inside probe reach has just left the ground.
        let grounded = self.probe.is_grounded(world, &self.position) && self.last_vertical <= 0.0;
        if grounded != self.grounded {
            debug!(grounded, y = self.position.translation.y, "ground contact changed");
            self.grounded = grounded;
        }

        let locomotion = self.driver.tick(intent, grounded, dt);
        self.position.translation.vector += locomotion.displacement;
        if locomotion.displacement.y <= 0.0 {
            if let Some(depth) = self.probe.penetration(world, &self.position) {
                self.position.translation.vector.y += depth;
            }
        }
        self.position.rotation = locomotion.facing;
        self.last_vertical = locomotion.displacement.y;

        ControllerFrame {
            position: self.position,
            grounded,
            locomotion,
        }
    }
}
