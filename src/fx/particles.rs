//! Particle field orbiting the bust.
//!
//! Each particle circles the vertical axis at its own radius and angular
//! speed while drifting upward; past the ceiling it wraps back to the floor.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lowest height a particle can occupy.
pub const FLOOR: f32 = -1.8;
/// A particle rising above this height wraps back to [`FLOOR`].
pub const CEILING: f32 = 2.8;
/// Vertical drift per frame.
pub const RISE_PER_FRAME: f32 = 0.006;

const RADIUS_MIN: f32 = 1.25;
const RADIUS_SPAN: f32 = 1.3;
const SPEED_MIN: f32 = 0.002;
const SPEED_SPAN: f32 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub angle: f32,
    pub radius: f32,
    pub height: f32,
    pub speed: f32,
}

impl Particle {
    fn position(&self) -> [f32; 3] {
        [
            self.angle.cos() * self.radius,
            self.height,
            self.angle.sin() * self.radius,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    positions: Vec<[f32; 3]>,
}

impl ParticleField {
    pub fn new<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let particles: Vec<Particle> = (0..count)
            .map(|_| Particle {
                angle: rng.gen_range(0.0..TAU),
                radius: RADIUS_MIN + rng.gen::<f32>() * RADIUS_SPAN,
                height: rng.gen_range(FLOOR..=CEILING),
                speed: SPEED_MIN + rng.gen::<f32>() * SPEED_SPAN,
            })
            .collect();
        let positions = particles.iter().map(Particle::position).collect();
        Self {
            particles,
            positions,
        }
    }

    /// Deterministic field for a given seed.
    pub fn seeded(count: usize, seed: u64) -> Self {
        Self::new(count, &mut StdRng::seed_from_u64(seed))
    }

    /// Move every particle one frame along its orbit and rewrite positions
    /// in place. Angles stay wrapped to one turn.
    pub fn advance(&mut self) {
        for (p, out) in self.particles.iter_mut().zip(self.positions.iter_mut()) {
            p.angle = (p.angle + p.speed).rem_euclid(TAU);
            p.height += RISE_PER_FRAME;
            if p.height > CEILING {
                p.height = FLOOR;
            }
            *out = p.position();
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// World positions as of the last advance.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_ranges() {
        let field = ParticleField::seeded(500, 7);
        assert_eq!(field.len(), 500);
        for p in field.particles() {
            assert!((0.0..TAU).contains(&p.angle));
            assert!((RADIUS_MIN..RADIUS_MIN + RADIUS_SPAN).contains(&p.radius));
            assert!((FLOOR..=CEILING).contains(&p.height));
            assert!((SPEED_MIN..SPEED_MIN + SPEED_SPAN).contains(&p.speed));
        }
    }

    #[test]
    fn heights_stay_in_band_and_radii_constant() {
        let mut field = ParticleField::seeded(140, 42);
        let radii: Vec<f32> = field.particles().iter().map(|p| p.radius).collect();
        for _ in 0..2000 {
            field.advance();
            for p in field.particles() {
                assert!(p.height >= FLOOR && p.height <= CEILING);
            }
        }
        let after: Vec<f32> = field.particles().iter().map(|p| p.radius).collect();
        assert_eq!(radii, after);
        assert_eq!(field.positions().len(), 140);
    }

    #[test]
    fn orbit_step_holds_after_many_turns() {
        let mut field = ParticleField::seeded(1, 5);
        let speed = field.particles[0].speed;
        // angle reached after about ten million frames, already wrapped
        field.particles[0].angle = (speed * 1.0e7).rem_euclid(TAU);
        for _ in 0..1000 {
            let before = field.particles()[0].angle;
            field.advance();
            let after = field.particles()[0].angle;
            assert!((0.0..=TAU).contains(&after));
            let step = (after - before).rem_euclid(TAU);
            assert!((step - speed).abs() < 1e-5, "step {step} vs {speed}");
        }
    }

    #[test]
    fn wraps_to_floor() {
        let mut field = ParticleField::seeded(1, 1);
        field.particles[0].height = CEILING - RISE_PER_FRAME * 0.5;
        field.advance();
        assert_eq!(field.particles()[0].height, FLOOR);
        assert_eq!(field.positions()[0][1], FLOOR);
    }

    #[test]
    fn positions_follow_orbit() {
        let mut field = ParticleField::seeded(16, 3);
        field.advance();
        for (p, pos) in field.particles().iter().zip(field.positions()) {
            let r = (pos[0] * pos[0] + pos[2] * pos[2]).sqrt();
            assert!((r - p.radius).abs() < 1e-4);
            assert_eq!(pos[1], p.height);
        }
    }

    #[test]
    fn same_seed_same_field() {
        let a = ParticleField::seeded(32, 9);
        let b = ParticleField::seeded(32, 9);
        assert_eq!(a.particles(), b.particles());
    }
}
