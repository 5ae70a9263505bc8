//! Arena-backed scene tree.
//!
//! Nodes are appended through [`SceneBuilder`], which fixes every node's
//! parent at creation. [`SceneBuilder::finish`] hands back a [`SceneGraph`]
//! whose structure is frozen: only transforms, visibility and materials can
//! change afterwards, so a [`NodeId`] stays valid for the graph's lifetime.

use glam::{EulerRot, Mat4, Quat, Vec3};

use super::primitives::{Material, Shape};

/// Index of a node inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Local transform: translation, Euler XYZ rotation (radians), scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            ..Default::default()
        }
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    pub fn scaled(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = Vec3::new(x, y, z);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        let q = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_scale_rotation_translation(self.scale, q, self.position)
    }
}

/// Drawable payload of a mesh node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mesh {
    pub shape: Shape,
    pub material: Material,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: &'static str,
    pub transform: Transform,
    pub visible: bool,
    /// `None` for pure grouping nodes
    pub mesh: Option<Mesh>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Append-only construction phase of a scene tree.
#[derive(Debug)]
pub struct SceneBuilder {
    nodes: Vec<Node>,
}

impl SceneBuilder {
    /// Start a tree with a single top-level group.
    pub fn new(root_name: &'static str) -> Self {
        Self {
            nodes: vec![Node {
                name: root_name,
                transform: Transform::default(),
                visible: true,
                mesh: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn group(&mut self, parent: NodeId, name: &'static str, transform: Transform) -> NodeId {
        self.push(parent, name, transform, None)
    }

    pub fn mesh(
        &mut self,
        parent: NodeId,
        name: &'static str,
        shape: Shape,
        material: Material,
        transform: Transform,
    ) -> NodeId {
        self.push(parent, name, transform, Some(Mesh { shape, material }))
    }

    /// Set the initial visibility of a node before the structure is frozen.
    pub fn hide(&mut self, id: NodeId) {
        self.nodes[id.0].visible = false;
    }

    pub fn finish(self) -> SceneGraph {
        SceneGraph { nodes: self.nodes }
    }

    fn push(
        &mut self,
        parent: NodeId,
        name: &'static str,
        transform: Transform,
        mesh: Option<Mesh>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            transform,
            visible: true,
            mesh,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }
}

/// Frozen-structure scene tree.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.mesh.is_some()).count()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn transform(&self, id: NodeId) -> &Transform {
        &self.nodes[id.0].transform
    }

    pub fn transform_mut(&mut self, id: NodeId) -> &mut Transform {
        &mut self.nodes[id.0].transform
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes[id.0].visible
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.nodes[id.0].visible = visible;
    }

    pub fn material_mut(&mut self, id: NodeId) -> Option<&mut Material> {
        self.nodes[id.0].mesh.as_mut().map(|m| &mut m.material)
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Depth-first walk over visible nodes, yielding each node with its
    /// world matrix. Hidden nodes prune their subtree.
    pub fn visit_visible<F: FnMut(NodeId, &Node, Mat4)>(&self, mut f: F) {
        let mut stack = vec![(self.root(), Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.0];
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.matrix();
            f(id, node, world);
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }

    /// World matrix of a single node, composed up through its ancestors.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut m = self.nodes[id.0].transform.matrix();
        let mut cur = self.nodes[id.0].parent;
        while let Some(p) = cur {
            m = self.nodes[p.0].transform.matrix() * m;
            cur = self.nodes[p.0].parent;
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::primitives::MaterialPreset;

    fn small_tree() -> (SceneGraph, NodeId, NodeId) {
        let mut b = SceneBuilder::new("scene");
        let g = b.group(b.root(), "group", Transform::at(0.0, 1.0, 0.0));
        let m = b.mesh(
            g,
            "ball",
            Shape::sphere(0.1),
            MaterialPreset::Skin.material(),
            Transform::at(1.0, 0.0, 0.0),
        );
        (b.finish(), g, m)
    }

    #[test]
    fn parents_are_fixed_at_creation() {
        let (graph, g, m) = small_tree();
        assert_eq!(graph.node(m).parent(), Some(g));
        assert_eq!(graph.node(g).parent(), Some(graph.root()));
        assert_eq!(graph.node(graph.root()).children(), &[g]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.mesh_count(), 1);
    }

    #[test]
    fn world_matrix_composes_ancestors() {
        let (mut graph, g, m) = small_tree();
        graph.transform_mut(g).scale = Vec3::splat(2.0);
        let p = graph.world_matrix(m).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn hidden_nodes_prune_subtree() {
        let (mut graph, g, _) = small_tree();
        let mut seen = 0;
        graph.visit_visible(|_, _, _| seen += 1);
        assert_eq!(seen, 3);

        graph.set_visible(g, false);
        let mut seen = 0;
        graph.visit_visible(|_, _, _| seen += 1);
        assert_eq!(seen, 1);
    }

    #[test]
    fn euler_order_matches_xyz() {
        let t = Transform::default().rotated(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        let p = t.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn find_by_name() {
        let (graph, _, m) = small_tree();
        assert_eq!(graph.find("ball"), Some(m));
        assert_eq!(graph.find("missing"), None);
    }
}
