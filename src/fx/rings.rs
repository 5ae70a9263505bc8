//! Holographic rings: three tilted translucent tori spinning around the
//! bust, their opacity pulsing with time and brightening while speaking.

use std::f32::consts::{PI, TAU};

use crate::rig::primitives::{MaterialPreset, Shape};
use crate::rig::scene_graph::{NodeId, SceneBuilder, SceneGraph, Transform};

const TUBE: f32 = 0.009;

/// (radius, color, tilt about X, spin per frame about Z, spin per frame about Y)
const RING_TABLE: [(f32, u32, f32, f32, f32); 3] = [
    (0.90, 0x00aaff, PI / 2.0, 0.009, 0.003),
    (1.10, 0xc5a028, PI / 3.0, -0.006, 0.008),
    (1.36, 0x00ff88, PI / 4.0, 0.007, -0.005),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub radius: f32,
    pub color: u32,
    pub tilt: f32,
    pub spin_z: f32,
    pub spin_y: f32,
    pub node: NodeId,
    pub opacity: f32,
}

/// Opacity of ring `index` at phase `t`, clamped to [0, 1].
pub fn ring_opacity(index: usize, t: f64, speaking: bool) -> f32 {
    let base = 0.4 + ((t * 2.0 + index as f64 * 1.5).sin() * 0.22) as f32;
    let boost = if speaking { 0.25 } else { 0.0 };
    (base + boost).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct RingSet {
    rings: Vec<Ring>,
}

impl RingSet {
    /// Add the rings under `parent`, normally the scene root so they do not
    /// inherit the rig's sway.
    pub fn build(b: &mut SceneBuilder, parent: NodeId) -> Self {
        let rings = RING_TABLE
            .iter()
            .map(|&(radius, color, tilt, spin_z, spin_y)| {
                let material = MaterialPreset::Hologram(color).material();
                let node = b.mesh(
                    parent,
                    "holo.ring",
                    Shape::torus(radius, TUBE),
                    material,
                    Transform::default().rotated(tilt, 0.0, 0.0),
                );
                Ring {
                    radius,
                    color,
                    tilt,
                    spin_z,
                    spin_y,
                    node,
                    opacity: material.opacity,
                }
            })
            .collect();
        Self { rings }
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Spin each ring by its increments and write its opacity for phase `t`.
    /// Spin angles stay wrapped to one turn.
    pub fn update(&mut self, graph: &mut SceneGraph, t: f64, speaking: bool) {
        for (i, ring) in self.rings.iter_mut().enumerate() {
            let tf = graph.transform_mut(ring.node);
            tf.rotation.z = (tf.rotation.z + ring.spin_z).rem_euclid(TAU);
            tf.rotation.y = (tf.rotation.y + ring.spin_y).rem_euclid(TAU);

            ring.opacity = ring_opacity(i, t, speaking);
            if let Some(m) = graph.material_mut(ring.node) {
                m.opacity = ring.opacity;
            }
        }
    }
}
