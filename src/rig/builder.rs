//! Rig builder: assembles the officer bust from primitives.
//!
//! Layout (units are scene meters, +Y up, +Z towards the camera):
//!
//! ```text
//!   root ── torso, collar, tie, buttons, badge, medals
//!     │  ── arms ×2 (shoulder, upper arm, forearm, hand, epaulette)
//!     │  ── neck
//!     │  ── platform, platform ring
//!     └── head (y = 1.08)
//!           ── skull, ears ×2, hair, sideburns ×2, brows ×2
//!           ── eyes ×2 (white, iris, highlight)
//!           ── nose, nostrils ×2
//!           ── mouth (upper lip, lower lip, teeth)
//!           ── glasses (frames ×2, lenses ×2, bridge)
//!           ── cap (brim, crown, band, emblem)
//! ```
//!
//! Bilateral parts are emitted once per side by mirroring a single offset
//! across the sagittal (x = 0) plane.

use std::f32::consts::PI;

use super::primitives::{MaterialPreset, Shape};
use super::scene_graph::{NodeId, SceneBuilder, SceneGraph, Transform};

/// Rest height of the upper lip inside the mouth group.
pub const UPPER_LIP_REST_Y: f32 = 0.020;
/// Rest height of the lower lip inside the mouth group.
pub const LOWER_LIP_REST_Y: f32 = -0.024;

const HEAD_Y: f32 = 1.08;
const EYE_X: f32 = 0.17;
const EYE_Y: f32 = 0.09;

const SIDES: [f32; 2] = [-1.0, 1.0];

/// Named references to the nodes the animation driver mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RigHandles {
    pub root: NodeId,
    pub head: NodeId,
    pub eyes: [NodeId; 2],
    pub upper_lip: NodeId,
    pub lower_lip: NodeId,
    pub teeth: NodeId,
}

fn sided(s: f32, left: &'static str, right: &'static str) -> &'static str {
    if s < 0.0 {
        left
    } else {
        right
    }
}

/// Build the bust under `parent` and return its handles.
pub fn build_rig(b: &mut SceneBuilder, parent: NodeId) -> RigHandles {
    use MaterialPreset as M;

    let root = b.group(parent, "rig.root", Transform::default());

    // ── Torso ──
    b.mesh(
        root,
        "torso",
        Shape::cylinder(0.40, 0.34, 1.15),
        M::Uniform.material(),
        Transform::at(0.0, 0.1, 0.0),
    );
    b.mesh(
        root,
        "collar",
        Shape::cylinder(0.14, 0.14, 0.30),
        M::White.material(),
        Transform::at(0.0, 0.74, 0.06),
    );
    b.mesh(
        root,
        "tie",
        Shape::cuboid(0.07, 0.54, 0.05),
        M::Tie.material(),
        Transform::at(0.0, 0.38, 0.30),
    );
    for i in 0..3 {
        b.mesh(
            root,
            "button",
            Shape::sphere(0.018),
            M::Gold.material(),
            Transform::at(0.0, 0.6 - i as f32 * 0.15, 0.31),
        );
    }
    b.mesh(
        root,
        "badge",
        Shape::cuboid(0.19, 0.11, 0.03),
        M::Gold.material(),
        Transform::at(-0.19, 0.44, 0.32),
    );
    for (i, x) in [-0.08f32, 0.04, 0.16].into_iter().enumerate() {
        // medal faces point at the camera
        b.mesh(
            root,
            "medal",
            Shape::cylinder(0.033, 0.033, 0.016),
            M::Gold.material(),
            Transform::at(0.16 + x, 0.50 - i as f32 * 0.05, 0.31).rotated(PI / 2.0, 0.0, 0.0),
        );
    }

    // ── Arms ──
    for s in SIDES {
        b.mesh(
            root,
            sided(s, "shoulder.l", "shoulder.r"),
            Shape::sphere(0.19),
            M::Uniform.material(),
            Transform::at(s * 0.48, 0.64, 0.0),
        );
        b.mesh(
            root,
            sided(s, "upper_arm.l", "upper_arm.r"),
            Shape::cylinder(0.13, 0.11, 0.58),
            M::Uniform.material(),
            Transform::at(s * 0.54, 0.28, 0.0).rotated(0.0, 0.0, s * 0.22),
        );
        b.mesh(
            root,
            sided(s, "forearm.l", "forearm.r"),
            Shape::cylinder(0.10, 0.09, 0.52),
            M::Skin.material(),
            Transform::at(s * 0.59, -0.14, 0.10),
        );
        b.mesh(
            root,
            sided(s, "hand.l", "hand.r"),
            Shape::sphere(0.11),
            M::Skin.material(),
            Transform::at(s * 0.60, -0.43, 0.12),
        );
        b.mesh(
            root,
            sided(s, "epaulette.l", "epaulette.r"),
            Shape::cuboid(0.21, 0.045, 0.19),
            M::Gold.material(),
            Transform::at(s * 0.47, 0.77, 0.0),
        );
    }

    // ── Neck ──
    b.mesh(
        root,
        "neck",
        Shape::cylinder(0.11, 0.14, 0.24),
        M::Skin.material(),
        Transform::at(0.0, 0.87, 0.0),
    );

    // ── Head ──
    let head = b.group(root, "head", Transform::at(0.0, HEAD_Y, 0.0));
    b.mesh(
        head,
        "skull",
        Shape::sphere(0.43),
        M::Skin.material(),
        Transform::default().scaled(1.0, 1.13, 0.96),
    );
    for s in SIDES {
        b.mesh(
            head,
            sided(s, "ear.l", "ear.r"),
            Shape::sphere(0.09),
            M::DarkSkin.material(),
            Transform::at(s * 0.43, -0.02, 0.0).scaled(0.6, 1.0, 0.6),
        );
    }

    // hair
    b.mesh(
        head,
        "hair",
        Shape::sphere(0.45),
        M::Hair.material(),
        Transform::at(0.0, 0.14, -0.05).scaled(1.0, 0.68, 1.0),
    );
    for s in SIDES {
        b.mesh(
            head,
            sided(s, "hair_side.l", "hair_side.r"),
            Shape::sphere(0.30),
            M::Hair.material(),
            Transform::at(s * 0.36, 0.0, 0.0).scaled(0.48, 0.92, 0.8),
        );
        b.mesh(
            head,
            sided(s, "sideburn.l", "sideburn.r"),
            Shape::cuboid(0.08, 0.25, 0.05),
            M::Hair.material(),
            Transform::at(s * 0.42, -0.18, 0.25),
        );
        b.mesh(
            head,
            sided(s, "brow.l", "brow.r"),
            Shape::cuboid(0.19, 0.028, 0.045),
            M::Hair.material(),
            Transform::at(s * EYE_X, 0.20, 0.38).rotated(0.0, 0.0, s * -0.08),
        );
    }

    // eyes
    let mut eyes = [head; 2];
    for (slot, s) in SIDES.into_iter().enumerate() {
        let eye = b.group(head, sided(s, "eye.l", "eye.r"), Transform::at(s * EYE_X, EYE_Y, 0.37));
        b.mesh(
            eye,
            "eye.white",
            Shape::sphere(0.095),
            M::EyeWhite.material(),
            Transform::default().scaled(1.0, 0.72, 0.72),
        );
        b.mesh(
            eye,
            "eye.iris",
            Shape::sphere(0.058),
            M::Iris.material(),
            Transform::at(0.0, 0.0, 0.06),
        );
        b.mesh(
            eye,
            "eye.glint",
            Shape::sphere(0.022),
            M::White.material(),
            Transform::at(0.022, 0.022, 0.11),
        );
        eyes[slot] = eye;
    }

    // nose
    b.mesh(
        head,
        "nose",
        Shape::sphere(0.075),
        M::DarkSkin.material(),
        Transform::at(0.0, -0.05, 0.42).scaled(0.82, 0.72, 0.92),
    );
    for s in SIDES {
        b.mesh(
            head,
            sided(s, "nostril.l", "nostril.r"),
            Shape::sphere(0.032),
            M::Nostril.material(),
            Transform::at(s * 0.058, -0.10, 0.41),
        );
    }

    // mouth
    let mouth = b.group(head, "mouth", Transform::at(0.0, -0.175, 0.40));
    let upper_lip = b.mesh(
        mouth,
        "lip.upper",
        Shape::sphere(0.10),
        M::Lip.material(),
        Transform::at(0.0, UPPER_LIP_REST_Y, 0.0).scaled(1.12, 0.42, 0.52),
    );
    let lower_lip = b.mesh(
        mouth,
        "lip.lower",
        Shape::sphere(0.10),
        M::Lip.material(),
        Transform::at(0.0, LOWER_LIP_REST_Y, 0.0).scaled(1.22, 0.46, 0.56),
    );
    let teeth = b.mesh(
        mouth,
        "teeth",
        Shape::cuboid(0.14, 0.04, 0.03),
        M::Teeth.material(),
        Transform::at(0.0, 0.0, 0.04),
    );
    b.hide(teeth);

    // glasses
    for s in SIDES {
        b.mesh(
            head,
            sided(s, "glasses.frame.l", "glasses.frame.r"),
            Shape::torus(0.105, 0.013),
            M::GlassFrame.material(),
            Transform::at(s * EYE_X, EYE_Y, 0.39).scaled(1.0, 0.76, 0.42),
        );
        b.mesh(
            head,
            sided(s, "glasses.lens.l", "glasses.lens.r"),
            Shape::disc(0.10),
            M::Glass.material(),
            Transform::at(s * EYE_X, EYE_Y, 0.392).scaled(1.0, 0.76, 1.0),
        );
    }
    b.mesh(
        head,
        "glasses.bridge",
        Shape::cylinder(0.009, 0.009, 0.1),
        M::GlassFrame.material(),
        Transform::at(0.0, EYE_Y, 0.392).rotated(0.0, 0.0, PI / 2.0),
    );

    // cap
    b.mesh(
        head,
        "cap.brim",
        Shape::cylinder(0.54, 0.54, 0.045),
        M::Uniform.material(),
        Transform::at(0.0, 0.36, 0.0),
    );
    b.mesh(
        head,
        "cap.crown",
        Shape::cylinder(0.37, 0.45, 0.30),
        M::Uniform.material(),
        Transform::at(0.0, 0.49, 0.0),
    );
    b.mesh(
        head,
        "cap.band",
        Shape::cylinder(0.452, 0.452, 0.052),
        M::Gold.material(),
        Transform::at(0.0, 0.36, 0.0),
    );
    b.mesh(
        head,
        "cap.emblem",
        Shape::sphere(0.072),
        M::Gold.material(),
        Transform::at(0.0, 0.37, 0.45).scaled(1.0, 0.52, 0.32),
    );

    // ── Platform ──
    b.mesh(
        root,
        "platform",
        Shape::cylinder(0.65, 0.75, 0.065),
        M::Platform.material(),
        Transform::at(0.0, -0.95, 0.0),
    );
    b.mesh(
        root,
        "platform.ring",
        Shape::torus(0.68, 0.027),
        M::Gold.material(),
        Transform::at(0.0, -0.92, 0.0).rotated(PI / 2.0, 0.0, 0.0),
    );

    RigHandles {
        root,
        head,
        eyes,
        upper_lip,
        lower_lip,
        teeth,
    }
}

/// Build a standalone graph holding only the rig.
pub fn build_rig_graph() -> (SceneGraph, RigHandles) {
    let mut b = SceneBuilder::new("scene");
    let root = b.root();
    let handles = build_rig(&mut b, root);
    (b.finish(), handles)
}
