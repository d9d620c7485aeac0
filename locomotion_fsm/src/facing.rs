use rapier3d::math::{Rotation, Vector};
use rapier3d::prelude::Real;

/// Character heading, turned toward the movement input at a fixed rate.
#[derive(Clone, Copy, Debug)]
pub struct Facing {
    rotation: Rotation<Real>,
    factor_per_second: Real,
}

impl Facing {
    pub fn new(factor_per_second: Real) -> Self {
        Self {
            rotation: Rotation::identity(),
            factor_per_second,
        }
    }

    pub fn rotation(&self) -> Rotation<Real> {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Rotation<Real>) {
        self.rotation = rotation;
    }

    /// Rotation whose forward (+Z) axis points along the input on the ground
    /// plane, or `None` for a zero axis.
    pub fn target(axis: [Real; 2]) -> Option<Rotation<Real>> {
        let look = Vector::new(axis[0], 0.0, axis[1]);
        if look.norm_squared() <= 1.0e-8 {
            return None;
        }
        Some(Rotation::face_towards(&look, &Vector::y()))
    }

    pub fn update(&mut self, axis: [Real; 2], movement_pressed: bool, dt: Real) -> Rotation<Real> {
        if !movement_pressed {
            return self.rotation;
        }
        let Some(target) = Self::target(axis) else {
            return self.rotation;
        };
        let t = (self.factor_per_second * dt.max(0.0)).clamp(0.0, 1.0);
        self.rotation = self
            .rotation
            .try_slerp(&target, t, 1.0e-6)
            .unwrap_or(target);
        self.rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward(rotation: Rotation<Real>) -> Vector<Real> {
        rotation * Vector::z()
    }

    #[test]
    fn idle_input_keeps_rotation() {
        let mut facing = Facing::new(15.0);
        let before = facing.rotation();
        let after = facing.update([0.0, 0.0], false, 1.0 / 60.0);
        assert_eq!(before, after);
    }

    #[test]
    fn turns_partially_toward_input() {
        let mut facing = Facing::new(15.0);
        facing.update([1.0, 0.0], true, 1.0 / 60.0);
        let dir = forward(facing.rotation());
        assert!(dir.x > 0.0 && dir.x < 1.0);
        assert!(dir.z > 0.0);
    }

    #[test]
    fn large_step_snaps_to_target() {
        let mut facing = Facing::new(15.0);
        facing.update([1.0, 0.0], true, 1.0);
        let dir = forward(facing.rotation());
        assert!((dir.x - 1.0).abs() < 1.0e-4);
        assert!(dir.y.abs() < 1.0e-4);
    }

    #[test]
    fn reversing_direction_does_not_panic() {
        let mut facing = Facing::new(15.0);
        facing.update([0.0, -1.0], true, 1.0 / 60.0);
        let dir = forward(facing.rotation());
        assert!(dir.z < 0.0);
    }
}
