//! Screen-space splatting of the particle field over a rendered frame.

use glam::Vec3;

use super::camera::Camera;
use crate::rig::primitives::MaterialPreset;

/// World-space diameter of one particle.
pub const POINT_SIZE: f32 = 0.028;

/// Blend round points for every position into `pixels` (RGBA, `size`).
/// Points behind the camera or off-screen are skipped; writes never leave
/// the buffer.
pub fn splat_points(pixels: &mut [u8], size: [u32; 2], camera: &Camera, positions: &[[f32; 3]]) {
    let [w, h] = size.map(|v| v as i64);
    if w == 0 || h == 0 || pixels.len() < (w * h * 4) as usize {
        return;
    }
    let material = MaterialPreset::Particle.material();
    let color = Vec3::from(material.color);
    let opacity = material.effective_opacity();

    for pos in positions {
        let world = Vec3::from(*pos);
        let depth = (world - camera.origin).dot(camera.forward);
        if depth <= camera.near {
            continue;
        }
        let Some([nx, ny]) = camera.project(world) else {
            continue;
        };
        let cx = (nx * 0.5 + 0.5) * w as f32;
        let cy = (0.5 - ny * 0.5) * h as f32;
        let radius = (POINT_SIZE * h as f32 / (4.0 * camera.fov_factor * depth)).max(0.75);

        let x0 = ((cx - radius).floor() as i64).max(0);
        let x1 = ((cx + radius).ceil() as i64).min(w - 1);
        let y0 = ((cy - radius).floor() as i64).max(0);
        let y1 = ((cy + radius).ceil() as i64).min(h - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let falloff = 1.0 - (dx * dx + dy * dy).sqrt() / radius;
                if falloff <= 0.0 {
                    continue;
                }
                let a = opacity * falloff.min(1.0);
                let i = ((y * w + x) * 4) as usize;
                for (c, k) in [color.x, color.y, color.z].into_iter().enumerate() {
                    let dst = pixels[i + c] as f32 / 255.0;
                    pixels[i + c] = ((dst * (1.0 - a) + k * a).clamp(0.0, 1.0) * 255.0) as u8;
                }
            }
        }
    }
}
