//! Animation driver: advances the clock and writes every layer into the
//! scene, in a fixed order.

use glam::Vec3;

use super::clock::AnimationClock;
use super::layers::{self, MouthPose};
use crate::scene::AvatarScene;
use crate::signals::SignalSnapshot;

/// Values applied during one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub t: f64,
    pub blink: f32,
    pub mouth: MouthPose,
    pub root_scale: f32,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationDriver {
    clock: AnimationClock,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    /// Advance one frame and apply every layer to `scene`.
    pub fn step(&mut self, scene: &mut AvatarScene, signals: SignalSnapshot) -> FrameReport {
        let t = self.clock.tick();
        let rig = scene.rig;
        let graph = &mut scene.graph;

        // sway
        let (yaw, sway_y) = layers::idle_sway(t);
        {
            let root = graph.transform_mut(rig.root);
            root.rotation.y = yaw;
            root.position.y = sway_y;
        }

        // head
        let (head_yaw, head_pitch) = layers::head_motion(t);
        {
            let head = graph.transform_mut(rig.head);
            head.rotation.y = head_yaw;
            head.rotation.x = head_pitch;
        }

        // blink
        let blink = layers::blink_scale(t);
        for eye in rig.eyes {
            graph.transform_mut(eye).scale.y = blink;
        }

        // mouth
        let mouth = layers::mouth_pose(t, signals.speaking);
        graph.transform_mut(rig.upper_lip).position.y = mouth.upper_lip_y;
        graph.transform_mut(rig.lower_lip).position.y = mouth.lower_lip_y;
        graph.set_visible(rig.teeth, mouth.teeth_visible);
        graph.transform_mut(rig.root).position.y += mouth.jitter_y;

        // listening
        let root_scale = layers::listen_scale(t, signals.listening);
        graph.transform_mut(rig.root).scale = Vec3::splat(root_scale);

        scene.rings.update(graph, t, signals.speaking);
        scene.particles.advance();

        FrameReport {
            frame: self.clock.frames(),
            t,
            blink,
            mouth,
            root_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::builder::{LOWER_LIP_REST_Y, UPPER_LIP_REST_Y};

    const IDLE: SignalSnapshot = SignalSnapshot {
        speaking: false,
        listening: false,
    };
    const SPEAKING: SignalSnapshot = SignalSnapshot {
        speaking: true,
        listening: false,
    };

    #[test]
    fn first_step_uses_one_frame_of_phase() {
        let mut scene = AvatarScene::new(4, 0);
        let mut d = AnimationDriver::new();
        let r = d.step(&mut scene, IDLE);
        assert_eq!(r.frame, 1);
        assert!((r.t - 0.016).abs() < 1e-7);
    }

    #[test]
    fn idle_sway_ignores_listening() {
        let mut a = AvatarScene::new(4, 0);
        let mut b = AvatarScene::new(4, 0);
        let (mut da, mut db) = (AnimationDriver::new(), AnimationDriver::new());
        let listening = SignalSnapshot {
            speaking: false,
            listening: true,
        };
        for _ in 0..200 {
            da.step(&mut a, IDLE);
            db.step(&mut b, listening);
            let ta = a.graph.transform(a.rig.root);
            let tb = b.graph.transform(b.rig.root);
            assert_eq!(ta.rotation, tb.rotation);
            assert_eq!(ta.position, tb.position);
        }
    }

    #[test]
    fn speaking_only_adds_jitter_to_root_height() {
        let mut a = AvatarScene::new(4, 0);
        let mut b = AvatarScene::new(4, 0);
        let (mut da, mut db) = (AnimationDriver::new(), AnimationDriver::new());
        for _ in 0..200 {
            da.step(&mut a, IDLE);
            let r = db.step(&mut b, SPEAKING);
            let ya = a.graph.transform(a.rig.root).position.y;
            let yb = b.graph.transform(b.rig.root).position.y;
            assert!((yb - ya - r.mouth.jitter_y).abs() < 1e-6);
            assert_eq!(
                a.graph.transform(a.rig.root).rotation,
                b.graph.transform(b.rig.root).rotation
            );
        }
    }

    #[test]
    fn stopping_speech_resets_mouth_immediately() {
        let mut scene = AvatarScene::new(4, 0);
        let mut d = AnimationDriver::new();
        for _ in 0..30 {
            d.step(&mut scene, SPEAKING);
        }
        d.step(&mut scene, IDLE);
        assert_eq!(scene.graph.transform(scene.rig.upper_lip).position.y, UPPER_LIP_REST_Y);
        assert_eq!(scene.graph.transform(scene.rig.lower_lip).position.y, LOWER_LIP_REST_Y);
        assert!(!scene.graph.is_visible(scene.rig.teeth));
    }

    #[test]
    fn blink_applies_to_both_eyes() {
        let mut scene = AvatarScene::new(4, 0);
        let mut d = AnimationDriver::new();
        for _ in 0..400 {
            let r = d.step(&mut scene, IDLE);
            for eye in scene.rig.eyes {
                assert_eq!(scene.graph.transform(eye).scale.y, r.blink);
            }
        }
    }

    #[test]
    fn listening_scales_root_uniformly() {
        let mut scene = AvatarScene::new(4, 0);
        let mut d = AnimationDriver::new();
        let listening = SignalSnapshot {
            speaking: false,
            listening: true,
        };
        let r = d.step(&mut scene, listening);
        assert_eq!(scene.graph.transform(scene.rig.root).scale, Vec3::splat(r.root_scale));
        d.step(&mut scene, IDLE);
        assert_eq!(scene.graph.transform(scene.rig.root).scale, Vec3::ONE);
    }
}
