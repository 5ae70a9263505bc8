//! Studio lighting: ambient fill plus key, fill and rim directional lights,
//! shaded Blinn-Phong.

use glam::Vec3;

use crate::rig::primitives::hex_rgb;

/// Specular tint of every material.
const SPECULAR: f32 = 0.067;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Unit vector pointing from the surface towards the light
    pub direction: Vec3,
    /// Color premultiplied by intensity
    pub color: Vec3,
}

impl DirectionalLight {
    /// Light placed at `position`, shining at the origin.
    pub fn from_position(position: Vec3, hex: u32, intensity: f32) -> Self {
        Self {
            direction: position.normalize(),
            color: Vec3::from(hex_rgb(hex)) * intensity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: Vec3,
    pub lights: [DirectionalLight; 3],
}

impl Lighting {
    pub fn studio() -> Self {
        Self {
            ambient: Vec3::from(hex_rgb(0xaabbff)) * 0.7,
            lights: [
                DirectionalLight::from_position(Vec3::new(2.0, 5.0, 4.0), 0xffffff, 1.3),
                DirectionalLight::from_position(Vec3::new(-3.0, 2.0, 3.0), 0x4488ff, 0.6),
                DirectionalLight::from_position(Vec3::new(0.0, 4.0, -5.0), 0xffd700, 0.5),
            ],
        }
    }

    /// Lit color of a surface with albedo `base`, normal `n`, looking back
    /// along `view` (surface to eye).
    pub fn shade(&self, base: Vec3, shininess: f32, n: Vec3, view: Vec3) -> Vec3 {
        let mut diffuse = self.ambient;
        let mut specular = Vec3::ZERO;
        for light in &self.lights {
            let n_dot_l = n.dot(light.direction);
            if n_dot_l <= 0.0 {
                continue;
            }
            diffuse += light.color * n_dot_l;
            if shininess > 0.0 {
                let h = (light.direction + view).normalize_or_zero();
                specular += light.color * n.dot(h).max(0.0).powf(shininess);
            }
        }
        base * diffuse + specular * SPECULAR
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::studio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lit_side_is_brighter() {
        let l = Lighting::studio();
        let base = Vec3::splat(0.5);
        let key = l.lights[0].direction;
        let lit = l.shade(base, 30.0, key, Vec3::Z);
        let dark = l.shade(base, 30.0, -key, Vec3::Z);
        assert!(lit.length() > dark.length());
    }

    #[test]
    fn back_facing_gets_ambient_only() {
        let l = Lighting::studio();
        let c = l.shade(Vec3::ONE, 0.0, Vec3::new(0.0, -1.0, 0.0), Vec3::Z);
        assert!((c - l.ambient).length() < 1e-5);
    }

    #[test]
    fn directions_are_unit() {
        for light in Lighting::studio().lights {
            assert!((light.direction.length() - 1.0).abs() < 1e-5);
        }
    }
}
