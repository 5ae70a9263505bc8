//! CPU raymarcher.
//!
//! Sphere traces the flattened draw list with rayon-parallel rows. Each
//! ray first collects the primitives whose bounding sphere it crosses, so
//! the per-step distance only looks at a handful of shapes. Translucent
//! surfaces are composited front to back: once a ray enters one it is
//! shaded, blended, then ignored for the rest of the march.

use glam::Vec3;
use rayon::prelude::*;

use super::camera::Camera;
use super::draw_list::{DrawList, DrawPrimitive};
use super::lights::Lighting;
use super::Rasterizer;

const MAX_STEPS: u32 = 128;
const MAX_DIST: f32 = 14.0;
const HIT_EPS: f32 = 0.0008;
/// Nudge past a translucent surface before resuming the march.
const LAYER_STEP: f32 = 0.002;
pub const MAX_LAYERS: usize = 4;

pub const BACKGROUND_TOP: [f32; 3] = [0.008, 0.031, 0.075];
pub const BACKGROUND_BOTTOM: [f32; 3] = [0.024, 0.094, 0.176];

/// Vertical gradient behind the bust, `v` in [-1, 1] bottom to top.
pub fn background(v: f32) -> Vec3 {
    let t = (v * 0.5 + 0.5).clamp(0.0, 1.0);
    Vec3::from(BACKGROUND_BOTTOM).lerp(Vec3::from(BACKGROUND_TOP), t)
}

#[derive(Debug, Default)]
pub struct CpuRaymarcher {
    frames: u64,
}

impl CpuRaymarcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Rasterizer for CpuRaymarcher {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn render(
        &mut self,
        list: &DrawList,
        camera: &Camera,
        lighting: &Lighting,
        size: [u32; 2],
    ) -> Option<Vec<u8>> {
        let pixels = render_cpu(list, camera, lighting, size)?;
        self.frames += 1;
        Some(pixels)
    }

    fn release(&mut self) {
        log::debug!("cpu raymarcher released after {} frames", self.frames);
    }
}

/// Render the draw list into an RGBA buffer of `size[0] × size[1]`.
pub fn render_cpu(
    list: &DrawList,
    camera: &Camera,
    lighting: &Lighting,
    size: [u32; 2],
) -> Option<Vec<u8>> {
    let [width, height] = size.map(|v| v as usize);
    if width == 0 || height == 0 {
        return None;
    }

    let mut pixels = vec![0u8; width * height * 4];
    pixels
        .par_chunks_exact_mut(width * 4)
        .enumerate()
        .for_each(|(py, row)| {
            let v = -((py as f32 + 0.5) / height as f32 * 2.0 - 1.0);
            let mut candidates: Vec<&DrawPrimitive> = Vec::with_capacity(list.len());
            for px in 0..width {
                let u = (px as f32 + 0.5) / width as f32 * 2.0 - 1.0;
                let dir = camera.ray(u, v);

                candidates.clear();
                candidates.extend(
                    list.primitives
                        .iter()
                        .filter(|p| p.ray_hits_bound(camera.origin, dir)),
                );

                let col = trace(&candidates, camera.origin, dir, lighting, v);
                let idx = px * 4;
                row[idx] = to_u8(col.x);
                row[idx + 1] = to_u8(col.y);
                row[idx + 2] = to_u8(col.z);
                row[idx + 3] = 255;
            }
        });
    Some(pixels)
}

fn to_u8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0) as u8
}

/// March one ray through `candidates`, compositing up to [`MAX_LAYERS`]
/// translucent surfaces over the first opaque hit or the background.
fn trace(
    candidates: &[&DrawPrimitive],
    origin: Vec3,
    dir: Vec3,
    lighting: &Lighting,
    v: f32,
) -> Vec3 {
    let mut color = Vec3::ZERO;
    let mut transmit = 1.0f32;
    let mut passed = [usize::MAX; MAX_LAYERS];
    let mut layers = 0;

    if !candidates.is_empty() {
        let mut t = 0.0f32;
        for _ in 0..MAX_STEPS {
            let p = origin + dir * t;
            let Some((d, hit)) = nearest(candidates, p, &passed[..layers]) else {
                break;
            };
            if d < HIT_EPS {
                let prim = candidates[hit];
                let n = normal(prim, p);
                let base = Vec3::from(prim.material.color);
                let lit = lighting.shade(base, prim.material.shininess, n, -dir);
                let alpha = prim.material.effective_opacity();
                color += lit * alpha * transmit;
                transmit *= 1.0 - alpha;
                if alpha >= 1.0 || layers == MAX_LAYERS || transmit < 0.01 {
                    break;
                }
                passed[layers] = hit;
                layers += 1;
                t += LAYER_STEP;
                continue;
            }
            t += d;
            if t > MAX_DIST {
                break;
            }
        }
    }

    color + background(v) * transmit
}

fn nearest(candidates: &[&DrawPrimitive], p: Vec3, skip: &[usize]) -> Option<(f32, usize)> {
    let mut best: Option<(f32, usize)> = None;
    for (i, prim) in candidates.iter().enumerate() {
        if skip.contains(&i) {
            continue;
        }
        let limit = best.map_or(f32::MAX, |(d, _)| d);
        // bounding sphere gives a cheap lower bound
        if (p - prim.center).length() - prim.bound > limit {
            continue;
        }
        let d = prim.distance(p);
        if d < limit {
            best = Some((d, i));
        }
    }
    best
}

fn normal(prim: &DrawPrimitive, p: Vec3) -> Vec3 {
    let e = 0.0005;
    Vec3::new(
        prim.distance(p + Vec3::X * e) - prim.distance(p - Vec3::X * e),
        prim.distance(p + Vec3::Y * e) - prim.distance(p - Vec3::Y * e),
        prim.distance(p + Vec3::Z * e) - prim.distance(p - Vec3::Z * e),
    )
    .normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::primitives::{MaterialPreset, Shape};
    use crate::rig::scene_graph::{SceneBuilder, Transform};
    use crate::scene::AvatarScene;

    fn pixel(buf: &[u8], w: usize, x: usize, y: usize) -> [u8; 3] {
        let i = (y * w + x) * 4;
        [buf[i], buf[i + 1], buf[i + 2]]
    }

    #[test]
    fn renders_the_bust() {
        let scene = AvatarScene::new(0, 0);
        let list = DrawList::from_graph(&scene.graph);
        let mut cam = Camera::portrait();
        cam.set_aspect(48, 64);
        let px = render_cpu(&list, &cam, &Lighting::studio(), [48, 64]).unwrap();
        assert_eq!(px.len(), 48 * 64 * 4);

        let bg = background(-((32.0 + 0.5) / 64.0 * 2.0 - 1.0));
        let bg = [to_u8(bg.x), to_u8(bg.y), to_u8(bg.z)];
        // the head fills the middle of the frame
        assert_ne!(pixel(&px, 48, 24, 32), bg);
        assert!(px.chunks(4).all(|c| c[3] == 255));
    }

    #[test]
    fn empty_list_draws_background() {
        let cam = Camera::portrait();
        let px = render_cpu(&DrawList::new(), &cam, &Lighting::studio(), [8, 8]).unwrap();
        let top = pixel(&px, 8, 0, 0);
        let bottom = pixel(&px, 8, 0, 7);
        assert_ne!(top, bottom);
    }

    #[test]
    fn zero_size_renders_nothing() {
        let cam = Camera::portrait();
        assert!(render_cpu(&DrawList::new(), &cam, &Lighting::studio(), [0, 10]).is_none());
    }

    #[test]
    fn translucent_shows_what_is_behind() {
        let mut b = SceneBuilder::new("scene");
        let root = b.root();
        let glass = MaterialPreset::Glass.material();
        b.mesh(root, "glass", Shape::cuboid(2.0, 2.0, 0.1), glass, Transform::at(0.0, 1.2, 1.0));
        let opaque_only = {
            let mut b = SceneBuilder::new("scene");
            let root = b.root();
            let back = MaterialPreset::Tie.material();
            b.mesh(root, "back", Shape::cuboid(2.0, 2.0, 0.1), back, Transform::at(0.0, 1.2, 0.0));
            DrawList::from_graph(&b.finish())
        };
        let back = MaterialPreset::Tie.material();
        b.mesh(root, "back", Shape::cuboid(2.0, 2.0, 0.1), back, Transform::at(0.0, 1.2, 0.0));
        let layered = DrawList::from_graph(&b.finish());

        let mut cam = Camera::portrait();
        cam.set_aspect(9, 9);
        let l = Lighting::studio();
        let a = render_cpu(&opaque_only, &cam, &l, [9, 9]).unwrap();
        let c = render_cpu(&layered, &cam, &l, [9, 9]).unwrap();
        let red_alone = pixel(&a, 9, 4, 4)[0];
        let red_behind_glass = pixel(&c, 9, 4, 4)[0];
        // red survives through the glass, attenuated
        assert!(red_behind_glass > 0);
        assert!(red_behind_glass < red_alone);
    }

    #[test]
    fn rasterizer_counts_frames() {
        let mut r = CpuRaymarcher::new();
        let cam = Camera::portrait();
        r.render(&DrawList::new(), &cam, &Lighting::studio(), [4, 4]).unwrap();
        assert_eq!(r.frames_rendered(), 1);
        assert_eq!(r.name(), "cpu");
    }
}
