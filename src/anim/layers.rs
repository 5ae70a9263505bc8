//! Motion layers as pure functions of the phase `t` and external state.
//!
//! The driver applies them in declaration order; each is usable on its own
//! for tests and previews. The phase is `f64` and every sinusoid is
//! evaluated at that precision; only the resulting offsets narrow to `f32`.

use crate::rig::builder::{LOWER_LIP_REST_Y, UPPER_LIP_REST_Y};

/// Blink trigger threshold on `sin(0.85t)`.
pub const BLINK_THRESHOLD: f32 = 0.965;
/// Smallest eye scale reached mid-blink.
pub const BLINK_MIN_SCALE: f32 = 0.05;
/// Mouth openness above which the teeth show.
pub const TEETH_THRESHOLD: f32 = 0.18;

/// Root yaw and vertical offset of the idle sway.
pub fn idle_sway(t: f64) -> (f32, f32) {
    (((t * 0.38).sin() * 0.07) as f32, ((t * 0.65).sin() * 0.032) as f32)
}

/// Head yaw and pitch.
pub fn head_motion(t: f64) -> (f32, f32) {
    (((t * 0.28).sin() * 0.09) as f32, ((t * 0.48).sin() * 0.05) as f32)
}

/// Vertical scale of both eye groups. 1 outside a blink.
pub fn blink_scale(t: f64) -> f32 {
    let v = (t * 0.85).sin() as f32;
    if v > BLINK_THRESHOLD {
        (1.0 - (v - BLINK_THRESHOLD) / (1.0 - BLINK_THRESHOLD)).max(BLINK_MIN_SCALE)
    } else {
        1.0
    }
}

/// Mouth openness while speaking, in [0, 0.8].
pub fn mouth_openness(t: f64) -> f32 {
    ((t * 13.0).sin().abs() * 0.5 + (t * 8.7).sin().abs() * 0.3) as f32
}

/// Lip heights, teeth visibility and the extra root jitter for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouthPose {
    pub openness: f32,
    pub upper_lip_y: f32,
    pub lower_lip_y: f32,
    pub teeth_visible: bool,
    pub jitter_y: f32,
}

impl MouthPose {
    pub const REST: MouthPose = MouthPose {
        openness: 0.0,
        upper_lip_y: UPPER_LIP_REST_Y,
        lower_lip_y: LOWER_LIP_REST_Y,
        teeth_visible: false,
        jitter_y: 0.0,
    };
}

pub fn mouth_pose(t: f64, speaking: bool) -> MouthPose {
    if !speaking {
        return MouthPose::REST;
    }
    let open = mouth_openness(t);
    MouthPose {
        openness: open,
        upper_lip_y: UPPER_LIP_REST_Y + open * 0.045,
        lower_lip_y: LOWER_LIP_REST_Y - open * 0.075,
        teeth_visible: open > TEETH_THRESHOLD,
        jitter_y: ((t * 16.0).sin() * 0.005) as f32,
    }
}

/// Uniform root scale; exactly 1 unless listening.
pub fn listen_scale(t: f64, listening: bool) -> f32 {
    if listening {
        1.0 + ((t * 8.0).sin() * 0.012) as f32
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phases() -> impl Iterator<Item = f64> {
        (0..5000).map(|i| i as f64 * 0.016)
    }

    #[test]
    fn blink_stays_in_range() {
        for t in phases() {
            let s = blink_scale(t);
            assert!((BLINK_MIN_SCALE..=1.0).contains(&s), "t={t} s={s}");
            if ((t * 0.85).sin() as f32) <= BLINK_THRESHOLD {
                assert_eq!(s, 1.0);
            }
        }
    }

    #[test]
    fn blink_closes_at_peak() {
        // sin(0.85t) = 1 at t = π / 1.7
        let t = std::f64::consts::PI / 1.7;
        assert!(blink_scale(t) <= BLINK_MIN_SCALE + 1e-3);
    }

    #[test]
    fn openness_range_and_teeth() {
        for t in phases() {
            let pose = mouth_pose(t, true);
            assert!((0.0..=0.8 + 1e-6).contains(&pose.openness));
            assert_eq!(pose.teeth_visible, pose.openness > TEETH_THRESHOLD);
            assert!(pose.upper_lip_y >= UPPER_LIP_REST_Y);
            assert!(pose.lower_lip_y <= LOWER_LIP_REST_Y);
        }
    }

    #[test]
    fn silent_mouth_is_at_rest() {
        for t in phases().take(100) {
            assert_eq!(mouth_pose(t, false), MouthPose::REST);
        }
    }

    #[test]
    fn listening_pulse_bounds() {
        for t in phases() {
            assert_eq!(listen_scale(t, false), 1.0);
            let s = listen_scale(t, true);
            assert!((0.988 - 1e-6..=1.012 + 1e-6).contains(&s));
        }
    }

    #[test]
    fn sway_is_bounded() {
        for t in phases() {
            let (yaw, y) = idle_sway(t);
            assert!(yaw.abs() <= 0.07 + 1e-6);
            assert!(y.abs() <= 0.032 + 1e-6);
            let (hy, hp) = head_motion(t);
            assert!(hy.abs() <= 0.09 + 1e-6 && hp.abs() <= 0.05 + 1e-6);
        }
    }

    #[test]
    fn late_phases_keep_full_resolution() {
        // ten million frames in: one step must still move the sway smoothly
        let t0 = 10_000_000.0 * 0.016;
        let (a, _) = idle_sway(t0);
        let (b, _) = idle_sway(t0 + 0.016);
        let expected = 0.07 * 0.38 * 0.016 * (t0 * 0.38).cos();
        assert!(((b - a) as f64 - expected).abs() < 1e-5);
    }
}
