//! Perspective camera shared by both raymarchers and the point splatter.

use glam::{Mat4, Vec3};

pub const FOV_DEG: f32 = 42.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 100.0;
pub const EYE: Vec3 = Vec3::new(0.0, 1.3, 4.8);
pub const TARGET: Vec3 = Vec3::new(0.0, 1.2, 0.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub origin: Vec3,
    pub target: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// tan(fov / 2), vertical
    pub fov_factor: f32,
    aspect: f32,
}

impl Camera {
    pub fn look_at(eye: Vec3, target: Vec3, fov_deg: f32) -> Self {
        let forward = (target - eye).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        Self {
            origin: eye,
            target,
            forward,
            right,
            up,
            fov_deg,
            near: NEAR,
            far: FAR,
            fov_factor: (fov_deg.to_radians() * 0.5).tan(),
            aspect: 1.0,
        }
    }

    /// The framing used for the officer bust.
    pub fn portrait() -> Self {
        Self::look_at(EYE, TARGET, FOV_DEG)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Recompute the aspect ratio from a surface size. Zero-sized surfaces
    /// leave it unchanged.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Ray direction through normalized device coordinates `u`, `v` in
    /// [-1, 1], `v` pointing up.
    pub fn ray(&self, u: f32, v: f32) -> Vec3 {
        (self.forward
            + self.right * (u * self.fov_factor * self.aspect)
            + self.up * (v * self.fov_factor))
            .normalize()
    }

    pub fn view_projection(&self) -> Mat4 {
        let proj =
            Mat4::perspective_rh(self.fov_deg.to_radians(), self.aspect, self.near, self.far);
        let view = Mat4::look_at_rh(self.origin, self.target, Vec3::Y);
        proj * view
    }

    /// Project a world point to NDC `[x, y]`, `None` when it falls outside
    /// the near/far range.
    pub fn project(&self, world: Vec3) -> Option<[f32; 2]> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !(0.0..=1.0).contains(&ndc.z) {
            return None;
        }
        Some([ndc.x, ndc.y])
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::portrait()
    }
}
