// Copyright (c) 2026 rezky_nightky

//! Render-facing copies of simulation state.
//!
//! A snapshot is rebuilt in place after each step and owns its data, so a
//! renderer reading it can never observe a half-applied step.

use glam::DVec2;

use crate::force::layer_scale;
use crate::lifecycle::MAX_DEFORMATION;
use crate::particle::{DepthLayer, DropletPhase, Particle, ParticleKind, Shape};
use crate::puddle::Ripple;
use crate::stepper::{EffectKind, StepReport};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleView {
    pub kind: ParticleKind,
    pub layer: DepthLayer,
    pub position: DVec2,
    pub velocity: DVec2,
    pub opacity: f64,
    pub shape: Shape,
    /// Cosmetic size multiplier from depth.
    pub scale: f64,
    /// Elongation along the direction of travel; `1.0` is round.
    pub stretch: f64,
    /// Radians from straight down, positive toward +x.
    pub rotation: f64,
    /// Highlight multiplier for droplets; `1.0` elsewhere.
    pub shimmer: f64,
    pub state: Option<DropletPhase>,
}

impl ParticleView {
    pub fn of(p: &Particle, highlight: f64) -> Self {
        let (stretch, shimmer) = match p.droplet {
            Some(d) => (d.deformation.clamp(1.0, MAX_DEFORMATION), highlight),
            None => (1.0, 1.0),
        };
        let rotation = if p.velocity.length_squared() > 1e-12 {
            p.velocity.x.atan2(p.velocity.y)
        } else {
            0.0
        };
        Self {
            kind: p.kind,
            layer: p.layer,
            position: p.position,
            velocity: p.velocity,
            opacity: p.opacity,
            shape: p.shape,
            scale: layer_scale(p.layer),
            stretch,
            rotation,
            shimmer,
            state: p.droplet_phase(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectSnapshot {
    pub effect: EffectKind,
    pub frame: u64,
    pub time: f64,
    pub capacity: usize,
    pub particles: Vec<ParticleView>,
    pub report: StepReport,
}

impl EffectSnapshot {
    pub fn new(effect: EffectKind) -> Self {
        Self {
            effect,
            frame: 0,
            time: 0.0,
            capacity: 0,
            particles: Vec::new(),
            report: StepReport::default(),
        }
    }

    pub fn count(&self, kind: ParticleKind) -> usize {
        self.particles.iter().filter(|v| v.kind == kind).count()
    }
}

/// Everything a host needs to draw one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub time: f64,
    pub effects: Vec<EffectSnapshot>,
    pub ripples: Vec<Ripple>,
    pub ground_y: f64,
    pub water_level: f64,
}

impl FrameSnapshot {
    pub fn particle_count(&self) -> usize {
        self.effects.iter().map(|e| e.particles.len()).sum()
    }

    pub fn particles(&self) -> impl Iterator<Item = &ParticleView> + '_ {
        self.effects.iter().flat_map(|e| e.particles.iter())
    }

    pub fn effect(&self, effect: EffectKind) -> Option<&EffectSnapshot> {
        self.effects.iter().find(|e| e.effect == effect)
    }

    pub fn report(&self) -> StepReport {
        self.effects
            .iter()
            .fold(StepReport::default(), |acc, e| acc.merged(&e.report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::{Anchor, Droplet};

    #[test]
    fn free_particle_view_is_round_and_tilts_with_velocity() {
        let p = Particle::new(ParticleKind::Rain, DepthLayer::Near, DVec2::new(0.5, 0.5), 1.0)
            .with_velocity(DVec2::new(0.2, 0.2));
        let v = ParticleView::of(&p, 0.9);
        assert_eq!(v.stretch, 1.0);
        assert_eq!(v.shimmer, 1.0);
        assert!((v.rotation - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert_eq!(v.state, None);
    }

    #[test]
    fn droplet_view_carries_phase_and_highlight() {
        let mut d = Droplet::accumulating(Anchor::Glass, DVec2::ZERO, 0.05);
        d.deformation = 5.0;
        let p = Particle::new(ParticleKind::GlassDrop, DepthLayer::Near, DVec2::ZERO, 1.0)
            .with_droplet(d);
        let v = ParticleView::of(&p, 0.9);
        assert_eq!(v.state, Some(DropletPhase::Accumulating));
        assert_eq!(v.stretch, MAX_DEFORMATION);
        assert_eq!(v.shimmer, 0.9);
        assert_eq!(v.rotation, 0.0);
    }
}
