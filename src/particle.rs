// Copyright (c) 2026 rezky_nightky

use glam::DVec2;

pub const MIN_MASS: f64 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    Rain,
    Snow,
    GlassDrop,
    WallDrop,
    Cloud,
    Fog,
}

impl ParticleKind {
    pub const ALL: [ParticleKind; 6] = [
        ParticleKind::Rain,
        ParticleKind::Snow,
        ParticleKind::GlassDrop,
        ParticleKind::WallDrop,
        ParticleKind::Cloud,
        ParticleKind::Fog,
    ];

    /// Participates in the accumulating/sliding/falling/fading machine.
    pub fn is_droplet(self) -> bool {
        matches!(self, ParticleKind::GlassDrop | ParticleKind::WallDrop)
    }

    /// Rain and snow carry a finite lifetime that fades them out.
    pub fn has_lifetime(self) -> bool {
        matches!(self, ParticleKind::Rain | ParticleKind::Snow)
    }

    pub fn label(self) -> &'static str {
        match self {
            ParticleKind::Rain => "rain",
            ParticleKind::Snow => "snow",
            ParticleKind::GlassDrop => "glass-drop",
            ParticleKind::WallDrop => "wall-drop",
            ParticleKind::Cloud => "cloud",
            ParticleKind::Fog => "fog",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DepthLayer {
    Far,
    Mid,
    Near,
}

impl DepthLayer {
    pub const ALL: [DepthLayer; 3] = [DepthLayer::Far, DepthLayer::Mid, DepthLayer::Near];

    pub fn index(self) -> usize {
        match self {
            DepthLayer::Far => 0,
            DepthLayer::Mid => 1,
            DepthLayer::Near => 2,
        }
    }

    /// Force sensitivity; nearer layers feel wind and sway more.
    pub fn factor(self) -> f64 {
        1.0 + self.index() as f64 * 0.3
    }

    /// Vertical spawn band for precipitation, in scene heights above the top
    /// edge. The far layer starts higher so every depth reads as falling from
    /// the same cloud deck.
    pub fn spawn_band(self) -> (f64, f64) {
        match self {
            DepthLayer::Far => (-0.5, -0.1),
            DepthLayer::Mid => (-0.35, -0.05),
            DepthLayer::Near => (-0.2, 0.0),
        }
    }

    /// Vertical band occupied by cloud blobs and fog banks.
    pub fn cloud_band(self) -> (f64, f64) {
        match self {
            DepthLayer::Far => (0.02, 0.12),
            DepthLayer::Mid => (0.06, 0.2),
            DepthLayer::Near => (0.12, 0.3),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DropletPhase {
    Accumulating,
    Sliding,
    Falling,
    Fading,
}

impl DropletPhase {
    pub fn label(self) -> &'static str {
        match self {
            DropletPhase::Accumulating => "accumulating",
            DropletPhase::Sliding => "sliding",
            DropletPhase::Falling => "falling",
            DropletPhase::Fading => "fading",
        }
    }
}

/// What a droplet is stuck to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// Index into the host's surface list for the current frame.
    Surface(usize),
    /// The viewport itself.
    Glass,
    Free,
}

impl Anchor {
    pub fn surface_index(self) -> Option<usize> {
        match self {
            Anchor::Surface(i) => Some(i),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Droplet {
    pub phase: DropletPhase,
    pub anchor: Anchor,
    /// Offset from the anchor rect's origin. Unused once free.
    pub local: DVec2,
    pub slide_progress: f64,
    pub slide_speed: f64,
    pub deformation: f64,
}

impl Droplet {
    pub fn accumulating(anchor: Anchor, local: DVec2, slide_speed: f64) -> Self {
        Self {
            phase: DropletPhase::Accumulating,
            anchor,
            local,
            slide_progress: 0.0,
            slide_speed: slide_speed.max(0.0),
            deformation: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Streak { length: f64, thickness: f64 },
    Flake { size: f64, blur: f64 },
    Bead { radius: f64 },
    Blob { radius: f64, puffiness: f64 },
}

impl Shape {
    pub fn extent(self) -> f64 {
        match self {
            Shape::Streak { length, .. } => length,
            Shape::Flake { size, .. } => size,
            Shape::Bead { radius } => radius * 2.0,
            Shape::Blob { radius, .. } => radius * 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub kind: ParticleKind,
    pub layer: DepthLayer,
    pub position: DVec2,
    pub velocity: DVec2,
    mass: f64,
    pub opacity: f64,
    pub base_opacity: f64,
    /// Transient opacity multiplier from interaction zones.
    pub disperse: f64,
    pub age: f64,
    pub max_age: f64,
    /// Fixed at spawn; decorrelates sway and drift between particles.
    pub phase: f64,
    pub shape: Shape,
    pub droplet: Option<Droplet>,
}

impl Particle {
    pub fn new(kind: ParticleKind, layer: DepthLayer, position: DVec2, mass: f64) -> Self {
        let mass = if mass.is_finite() {
            mass.max(MIN_MASS)
        } else {
            1.0
        };
        Self {
            kind,
            layer,
            position,
            velocity: DVec2::ZERO,
            mass,
            opacity: 1.0,
            base_opacity: 1.0,
            disperse: 1.0,
            age: 0.0,
            max_age: 0.0,
            phase: 0.0,
            shape: Shape::Bead { radius: 0.004 },
            droplet: None,
        }
    }

    pub fn with_velocity(mut self, v: DVec2) -> Self {
        self.velocity = v;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.base_opacity = clamp_unit(opacity);
        self.opacity = self.base_opacity;
        self
    }

    pub fn with_lifetime(mut self, max_age: f64) -> Self {
        self.max_age = if max_age.is_finite() {
            max_age.max(0.0)
        } else {
            0.0
        };
        self
    }

    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_droplet(mut self, droplet: Droplet) -> Self {
        self.droplet = Some(droplet);
        self
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    /// Remaining fraction of the lifetime; `1.0` for particles without one.
    pub fn life_ratio(&self) -> f64 {
        if self.max_age <= 0.0 {
            return 1.0;
        }
        clamp_unit((self.max_age - self.age) / self.max_age)
    }

    pub fn is_expired(&self) -> bool {
        self.max_age > 0.0 && self.age > self.max_age
    }

    pub fn droplet_phase(&self) -> Option<DropletPhase> {
        self.droplet.map(|d| d.phase)
    }
}

#[inline]
pub fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_is_forced_positive() {
        let p = Particle::new(ParticleKind::Rain, DepthLayer::Far, DVec2::ZERO, -3.0);
        assert!(p.mass() > 0.0);
        let p = Particle::new(ParticleKind::Rain, DepthLayer::Far, DVec2::ZERO, f64::NAN);
        assert!(p.mass() > 0.0);
    }

    #[test]
    fn opacity_builder_clamps() {
        let p = Particle::new(ParticleKind::Snow, DepthLayer::Mid, DVec2::ZERO, 1.0)
            .with_opacity(7.0);
        assert_eq!(p.opacity, 1.0);
        let p = p.with_opacity(f64::NAN);
        assert_eq!(p.opacity, 0.0);
    }

    #[test]
    fn far_layer_spawns_above_near_layer() {
        let (far_lo, far_hi) = DepthLayer::Far.spawn_band();
        let (near_lo, near_hi) = DepthLayer::Near.spawn_band();
        assert!(far_lo < near_lo);
        assert!(far_hi < near_hi);
        assert_eq!(DepthLayer::Far.spawn_band(), (-0.5, -0.1));
    }

    #[test]
    fn droplet_phases_are_ordered() {
        assert!(DropletPhase::Accumulating < DropletPhase::Sliding);
        assert!(DropletPhase::Sliding < DropletPhase::Falling);
        assert!(DropletPhase::Falling < DropletPhase::Fading);
    }

    #[test]
    fn life_ratio_without_lifetime_is_one() {
        let mut p = Particle::new(ParticleKind::Cloud, DepthLayer::Near, DVec2::ZERO, 5.0);
        p.age = 100.0;
        assert_eq!(p.life_ratio(), 1.0);
        assert!(!p.is_expired());
    }
}
