//! Primitive factory: parameterized solids and material records.
//!
//! Every drawable in the rig is one of the [`Shape`] variants below, shaded
//! with one of the [`MaterialPreset`]s. Shapes are evaluated as signed
//! distance functions in their own local frame; the renderers bring world
//! points into that frame through the node's inverse world matrix.

use glam::{Vec2, Vec3};

/// Half thickness given to flat discs so they can be sphere traced.
const DISC_HALF_THICKNESS: f32 = 0.002;

/// Solid primitive types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere {
        radius: f32,
    },
    /// Truncated cone along local Y, centered on the origin
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
    },
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    /// Ring lying in the local XY plane, revolving around Z
    Torus {
        radius: f32,
        tube: f32,
    },
    /// Flat circle in the local XY plane, facing +Z
    Disc {
        radius: f32,
    },
}

impl Shape {
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32) -> Self {
        Self::Cylinder {
            radius_top,
            radius_bottom,
            height,
        }
    }

    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::Box {
            width,
            height,
            depth,
        }
    }

    pub fn torus(radius: f32, tube: f32) -> Self {
        Self::Torus { radius, tube }
    }

    pub fn disc(radius: f32) -> Self {
        Self::Disc { radius }
    }

    /// Numeric tag shared with the GPU shader.
    pub fn kind_id(&self) -> u32 {
        match self {
            Shape::Sphere { .. } => 0,
            Shape::Cylinder { .. } => 1,
            Shape::Box { .. } => 2,
            Shape::Torus { .. } => 3,
            Shape::Disc { .. } => 4,
        }
    }

    /// Shape parameters packed as `[a, b, c]` in the order the shader reads them.
    pub fn params(&self) -> [f32; 3] {
        match *self {
            Shape::Sphere { radius } => [radius, 0.0, 0.0],
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
            } => [radius_top, radius_bottom, height],
            Shape::Box {
                width,
                height,
                depth,
            } => [width, height, depth],
            Shape::Torus { radius, tube } => [radius, tube, 0.0],
            Shape::Disc { radius } => [radius, DISC_HALF_THICKNESS, 0.0],
        }
    }

    /// Radius of a sphere around the local origin enclosing the shape.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Shape::Sphere { radius } => radius,
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
            } => {
                let r = radius_top.max(radius_bottom);
                (r * r + height * height * 0.25).sqrt()
            }
            Shape::Box {
                width,
                height,
                depth,
            } => Vec3::new(width, height, depth).length() * 0.5,
            Shape::Torus { radius, tube } => radius + tube,
            Shape::Disc { radius } => radius,
        }
    }

    /// Signed distance from a local-space point to the surface.
    pub fn distance(&self, p: Vec3) -> f32 {
        match *self {
            Shape::Sphere { radius } => p.length() - radius,
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
            } => capped_cone(p, height * 0.5, radius_bottom, radius_top),
            Shape::Box {
                width,
                height,
                depth,
            } => {
                let q = p.abs() - Vec3::new(width, height, depth) * 0.5;
                q.max(Vec3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0)
            }
            Shape::Torus { radius, tube } => {
                let q = Vec2::new(Vec2::new(p.x, p.y).length() - radius, p.z);
                q.length() - tube
            }
            Shape::Disc { radius } => {
                let d = Vec2::new(
                    Vec2::new(p.x, p.y).length() - radius,
                    p.z.abs() - DISC_HALF_THICKNESS,
                );
                d.x.max(d.y).min(0.0) + d.max(Vec2::ZERO).length()
            }
        }
    }
}

/// Exact distance to a capped cone of half height `h`, bottom radius `r1`,
/// top radius `r2`.
fn capped_cone(p: Vec3, h: f32, r1: f32, r2: f32) -> f32 {
    let q = Vec2::new(Vec2::new(p.x, p.z).length(), p.y);
    let k1 = Vec2::new(r2, h);
    let k2 = Vec2::new(r2 - r1, 2.0 * h);
    let cap_r = if q.y < 0.0 { r1 } else { r2 };
    let ca = Vec2::new(q.x - q.x.min(cap_r), q.y.abs() - h);
    let cb = q - k1 + k2 * ((k1 - q).dot(k2) / k2.dot(k2)).clamp(0.0, 1.0);
    let s = if cb.x < 0.0 && ca.y < 0.0 { -1.0 } else { 1.0 };
    s * ca.length_squared().min(cb.length_squared()).sqrt()
}

/// Convert a `0xRRGGBB` literal into linear-ish `[r, g, b]` in 0..1.
pub fn hex_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

/// Surface appearance of a drawable node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    /// Specular exponent
    pub shininess: f32,
    /// Whether `opacity` participates in blending
    pub transparent: bool,
    /// 0.0–1.0, ignored unless `transparent`
    pub opacity: f32,
}

impl Material {
    pub fn opaque(hex: u32, shininess: f32) -> Self {
        Self {
            color: hex_rgb(hex),
            shininess,
            transparent: false,
            opacity: 1.0,
        }
    }

    pub fn translucent(hex: u32, shininess: f32, opacity: f32) -> Self {
        Self {
            color: hex_rgb(hex),
            shininess,
            transparent: true,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// Opacity actually used for compositing.
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent {
            self.opacity
        } else {
            1.0
        }
    }
}

/// The closed set of looks used by the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialPreset {
    Skin,
    DarkSkin,
    Hair,
    Uniform,
    Gold,
    White,
    Iris,
    EyeWhite,
    Lip,
    Teeth,
    Glass,
    GlassFrame,
    Tie,
    Nostril,
    Platform,
    /// Translucent ring tinted with the given `0xRRGGBB` color
    Hologram(u32),
    Particle,
}

impl MaterialPreset {
    pub fn material(self) -> Material {
        match self {
            MaterialPreset::Skin => Material::opaque(0xd4956a, 30.0),
            MaterialPreset::DarkSkin => Material::opaque(0xb87848, 20.0),
            MaterialPreset::Hair => Material::opaque(0x180800, 10.0),
            MaterialPreset::Uniform => Material::opaque(0x0d2d52, 50.0),
            MaterialPreset::Gold => Material::opaque(0xc5a028, 150.0),
            MaterialPreset::White => Material::opaque(0xffffff, 10.0),
            MaterialPreset::Iris => Material::opaque(0x100500, 200.0),
            MaterialPreset::EyeWhite => Material::opaque(0xf8f4ee, 20.0),
            MaterialPreset::Lip => Material::opaque(0x8b3a3a, 60.0),
            MaterialPreset::Teeth => Material::opaque(0xfffae0, 20.0),
            MaterialPreset::Glass => Material::translucent(0x88aacc, 200.0, 0.45),
            MaterialPreset::GlassFrame => Material::opaque(0x1a1a1a, 120.0),
            MaterialPreset::Tie => Material::opaque(0xbb1111, 40.0),
            MaterialPreset::Nostril => Material::opaque(0x8b5e3c, 10.0),
            MaterialPreset::Platform => Material::translucent(0x0a2a4a, 200.0, 0.75),
            MaterialPreset::Hologram(hex) => Material::translucent(hex, 200.0, 0.55),
            MaterialPreset::Particle => Material::translucent(0x4488ff, 0.0, 0.75),
        }
    }
}
