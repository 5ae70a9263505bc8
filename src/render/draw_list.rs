//! Flattening of the scene tree into a list of world-placed primitives.

use glam::{Mat4, Vec3};

use crate::rig::primitives::{Material, Shape};
use crate::rig::scene_graph::SceneGraph;

/// One visible mesh, ready to be evaluated in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawPrimitive {
    pub shape: Shape,
    pub material: Material,
    /// World to local
    pub inverse: Mat4,
    /// Smallest axis scale of the world matrix; multiplies local distances
    /// so they stay conservative under non-uniform scale.
    pub distance_scale: f32,
    pub center: Vec3,
    pub bound: f32,
}

impl DrawPrimitive {
    fn new(shape: Shape, material: Material, world: Mat4) -> Self {
        let axes = [
            world.x_axis.truncate().length(),
            world.y_axis.truncate().length(),
            world.z_axis.truncate().length(),
        ];
        let min_scale = axes.iter().copied().fold(f32::MAX, f32::min);
        let max_scale = axes.iter().copied().fold(0.0, f32::max);
        Self {
            shape,
            material,
            inverse: world.inverse(),
            distance_scale: min_scale,
            center: world.w_axis.truncate(),
            bound: shape.bounding_radius() * max_scale,
        }
    }

    /// Approximate signed distance from a world point.
    pub fn distance(&self, p: Vec3) -> f32 {
        self.shape.distance(self.inverse.transform_point3(p)) * self.distance_scale
    }

    /// Whether the ray `origin + t·dir` (unit `dir`) passes within the
    /// bounding sphere.
    pub fn ray_hits_bound(&self, origin: Vec3, dir: Vec3) -> bool {
        let oc = self.center - origin;
        let along = oc.dot(dir);
        let closest_sq = oc.length_squared() - along * along;
        let r = self.bound + 1e-3;
        closest_sq <= r * r && (along >= 0.0 || oc.length_squared() <= r * r)
    }

    pub fn is_translucent(&self) -> bool {
        self.material.effective_opacity() < 1.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub primitives: Vec<DrawPrimitive>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_graph(graph: &SceneGraph) -> Self {
        let mut list = Self::new();
        list.rebuild(graph);
        list
    }

    /// Refill from the graph's visible meshes, reusing the allocation.
    pub fn rebuild(&mut self, graph: &SceneGraph) {
        self.primitives.clear();
        graph.visit_visible(|_, node, world| {
            if let Some(mesh) = node.mesh {
                self.primitives.push(DrawPrimitive::new(mesh.shape, mesh.material, world));
            }
        });
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::primitives::MaterialPreset;
    use crate::rig::scene_graph::{SceneBuilder, Transform};
    use crate::scene::AvatarScene;

    #[test]
    fn hidden_meshes_are_skipped() {
        let scene = AvatarScene::new(0, 0);
        let list = DrawList::from_graph(&scene.graph);
        // teeth start hidden
        assert_eq!(list.len(), scene.graph.mesh_count() - 1);
    }

    #[test]
    fn world_distance_respects_scale() {
        let mut b = SceneBuilder::new("scene");
        let root = b.root();
        b.mesh(
            root,
            "ball",
            Shape::sphere(1.0),
            MaterialPreset::Skin.material(),
            Transform::at(0.0, 1.0, 0.0).scaled(2.0, 2.0, 2.0),
        );
        let list = DrawList::from_graph(&b.finish());
        let prim = list.primitives[0];
        assert!((prim.distance(Vec3::new(3.0, 1.0, 0.0)) - 1.0).abs() < 1e-5);
        assert!((prim.bound - 2.0).abs() < 1e-5);
        assert!(prim.ray_hits_bound(Vec3::new(0.0, 1.0, 5.0), Vec3::NEG_Z));
        assert!(!prim.ray_hits_bound(Vec3::new(0.0, 1.0, 5.0), Vec3::Z));
        assert!(!prim.ray_hits_bound(Vec3::new(0.0, 4.0, 5.0), Vec3::NEG_Z));
    }

    #[test]
    fn squashed_distance_is_conservative() {
        let mut b = SceneBuilder::new("scene");
        let root = b.root();
        b.mesh(
            root,
            "lip",
            Shape::sphere(0.1),
            MaterialPreset::Lip.material(),
            Transform::default().scaled(1.12, 0.42, 0.52),
        );
        let prim = DrawList::from_graph(&b.finish()).primitives[0];
        // true distance along X from 0.5 is 0.5 - 0.112
        let d = prim.distance(Vec3::new(0.5, 0.0, 0.0));
        assert!(d > 0.0 && d <= 0.5 - 0.112 + 1e-5);
    }

    #[test]
    fn rebuild_reuses_list() {
        let mut scene = AvatarScene::new(0, 0);
        let mut list = DrawList::from_graph(&scene.graph);
        let before = list.len();
        scene.graph.set_visible(scene.rig.teeth, true);
        list.rebuild(&scene.graph);
        assert_eq!(list.len(), before + 1);
    }
}
