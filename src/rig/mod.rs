//! Procedural rig: primitives, the scene tree they live in, and the
//! builder that assembles the officer bust.

pub mod builder;
pub mod primitives;
pub mod scene_graph;

pub use builder::{build_rig, build_rig_graph, RigHandles, LOWER_LIP_REST_Y, UPPER_LIP_REST_Y};
pub use primitives::{Material, MaterialPreset, Shape};
pub use scene_graph::{Mesh, Node, NodeId, SceneBuilder, SceneGraph, Transform};
