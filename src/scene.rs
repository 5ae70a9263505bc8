//! The avatar scene: everything created once per mount and dropped together
//! on teardown.

use crate::fx::{ParticleField, RingSet};
use crate::rig::builder::{build_rig, RigHandles};
use crate::rig::scene_graph::{SceneBuilder, SceneGraph};

pub const DEFAULT_PARTICLE_COUNT: usize = 140;

#[derive(Debug, Clone)]
pub struct AvatarScene {
    pub graph: SceneGraph,
    pub rig: RigHandles,
    pub rings: RingSet,
    pub particles: ParticleField,
}

impl AvatarScene {
    /// Build the rig and rings under one scene root, with a seeded particle
    /// field of `particle_count` points.
    pub fn new(particle_count: usize, seed: u64) -> Self {
        let mut b = SceneBuilder::new("scene");
        let root = b.root();
        let rig = build_rig(&mut b, root);
        let rings = RingSet::build(&mut b, root);
        Self {
            graph: b.finish(),
            rig,
            rings,
            particles: ParticleField::seeded(particle_count, seed),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

impl Default for AvatarScene {
    fn default() -> Self {
        Self::new(DEFAULT_PARTICLE_COUNT, 0)
    }
}
