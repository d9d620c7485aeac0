//! Walkable-surface queries backing the locomotion grounded flag.
//!
//! Only colliders tagged walkable stop the probe; scenery (walls, props) is
//! ignored even when it sits directly under the character.
#![forbid(unsafe_code)]

use rapier3d::math::{Isometry, Point, Vector};
use rapier3d::prelude::{
    Collider, ColliderHandle, ColliderSet, Group, InteractionGroups, QueryFilter, QueryPipeline,
    Ray, RayIntersection, Real, RigidBodySet,
};

pub const WALKABLE_GROUP: Group = Group::GROUP_1;
pub const SCENERY_GROUP: Group = Group::GROUP_2;

/// Static colliders plus the query structure used by the probe.
pub struct SurfaceWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    query_pipeline: QueryPipeline,
}

impl Default for SurfaceWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceWorld {
    pub fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn insert_walkable(&mut self, mut collider: Collider) -> ColliderHandle {
        collider.set_collision_groups(InteractionGroups::new(WALKABLE_GROUP, Group::ALL));
        self.colliders.insert(collider)
    }

    pub fn insert_scenery(&mut self, mut collider: Collider) -> ColliderHandle {
        collider.set_collision_groups(InteractionGroups::new(SCENERY_GROUP, Group::ALL));
        self.colliders.insert(collider)
    }

    /// Rebuilds query acceleration after colliders change.
    pub fn refresh(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }

    fn cast_walkable(
        &self,
        ray: &Ray,
        max_distance: Real,
    ) -> Option<(ColliderHandle, RayIntersection)> {
        let filter =
            QueryFilter::default().groups(InteractionGroups::new(Group::ALL, WALKABLE_GROUP));
        self.query_pipeline.cast_ray_and_get_normal(
            &self.bodies,
            &self.colliders,
            ray,
            max_distance,
            true,
            filter,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundHit {
    pub collider: ColliderHandle,
    /// Distance from the character centre down to the surface.
    pub distance: Real,
    /// Surface normal at the hit; zero when the ray starts inside the collider.
    pub normal: Vector<Real>,
}

/// Downward ray from the character centre, reaching `half_height + margin`.
#[derive(Clone, Copy, Debug)]
pub struct GroundProbe {
    pub half_height: Real,
    pub margin: Real,
}

impl GroundProbe {
    pub fn new(half_height: Real, margin: Real) -> Self {
        Self {
            half_height: half_height.max(0.0),
            margin: margin.max(0.0),
        }
    }

    pub fn reach(&self) -> Real {
        self.half_height + self.margin
    }

    pub fn probe(&self, world: &SurfaceWorld, position: &Isometry<Real>) -> Option<GroundHit> {
        let origin = Point::from(position.translation.vector);
        let ray = Ray::new(origin, -Vector::y());
        world
            .cast_walkable(&ray, self.reach())
            .map(|(collider, hit)| GroundHit {
                collider,
                distance: hit.time_of_impact,
                normal: hit.normal,
            })
    }

    pub fn is_grounded(&self, world: &SurfaceWorld, position: &Isometry<Real>) -> bool {
        self.probe(world, position).is_some()
    }

    /// Upward correction that puts the character's feet back on a surface it
    /// sank into, if any.
    pub fn penetration(&self, world: &SurfaceWorld, position: &Isometry<Real>) -> Option<Real> {
        let hit = self.probe(world, position)?;
        let depth = self.half_height - hit.distance;
        (depth > 0.0).then_some(depth)
    }
}
