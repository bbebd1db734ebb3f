// Copyright (c) 2026 rezky_nightky

//! Read-only inputs handed to the simulation once per step.
//!
//! None of these are retained across steps. Each one has a `sanitized`/
//! `is_usable` helper so a single bad frame of host input degrades into a
//! frame of wrong-looking output instead of poisoning the pool.

use glam::DVec2;

pub const MIN_INTENSITY: f64 = 0.1;
pub const MAX_INTENSITY: f64 = 4.0;
pub const MAX_WIND_SPEED: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvironmentState {
    pub wind_speed: f64,
    /// Radians; `0` blows toward +x, `π/2` toward +y (downward).
    pub wind_direction: f64,
    pub intensity: f64,
    pub turbulence: f64,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self::calm()
    }
}

impl EnvironmentState {
    pub const fn calm() -> Self {
        Self {
            wind_speed: 0.0,
            wind_direction: 0.0,
            intensity: 1.0,
            turbulence: 0.0,
        }
    }

    pub fn with_wind(mut self, speed: f64, direction: f64) -> Self {
        self.wind_speed = speed;
        self.wind_direction = direction;
        self
    }

    pub fn with_intensity(mut self, intensity: f64) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_turbulence(mut self, turbulence: f64) -> Self {
        self.turbulence = turbulence;
        self
    }

    pub fn wind_vector(&self) -> DVec2 {
        DVec2::from_angle(self.wind_direction)
    }

    pub fn is_sane(&self) -> bool {
        *self == self.sanitized()
    }

    pub fn sanitized(&self) -> Self {
        let calm = Self::calm();
        Self {
            wind_speed: finite_or(self.wind_speed, calm.wind_speed)
                .clamp(-MAX_WIND_SPEED, MAX_WIND_SPEED),
            wind_direction: finite_or(self.wind_direction, calm.wind_direction),
            intensity: finite_or(self.intensity, calm.intensity)
                .clamp(MIN_INTENSITY, MAX_INTENSITY),
            turbulence: finite_or(self.turbulence, calm.turbulence).clamp(0.0, 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepulsionZone {
    pub center: DVec2,
    pub radius: f64,
    pub strength: f64,
}

impl RepulsionZone {
    pub fn new(center: DVec2, radius: f64, strength: f64) -> Self {
        Self {
            center,
            radius,
            strength,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.center.is_finite() && self.radius.is_finite() && self.radius > 0.0
    }

    /// Strength clamped into `[0, 1]`; non-finite strength counts as zero.
    pub fn effective_strength(&self) -> f64 {
        if self.strength.is_finite() {
            self.strength.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionField {
    pub zones: Vec<RepulsionZone>,
}

impl InteractionField {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(zone: RepulsionZone) -> Self {
        Self { zones: vec![zone] }
    }

    pub fn push(&mut self, zone: RepulsionZone) {
        self.zones.push(zone);
    }

    pub fn clear(&mut self) {
        self.zones.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Zones that can contribute; negative or zero radii are ignored.
    pub fn usable(&self) -> impl Iterator<Item = &RepulsionZone> + '_ {
        self.zones.iter().filter(|z| z.is_usable())
    }

    pub fn rejected(&self) -> usize {
        self.zones.iter().filter(|z| !z.is_usable()).count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceRect {
    pub origin: DVec2,
    pub size: DVec2,
}

impl SurfaceRect {
    /// The whole scene, which is what glass drops cling to.
    pub const VIEWPORT: SurfaceRect = SurfaceRect {
        origin: DVec2::ZERO,
        size: DVec2::ONE,
    };

    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            origin: DVec2::new(x, y),
            size: DVec2::new(w, h),
        }
    }

    pub fn is_usable(&self) -> bool {
        self.origin.is_finite() && self.size.is_finite() && self.size.x > 0.0 && self.size.y > 0.0
    }

    pub fn max(&self) -> DVec2 {
        self.origin + self.size
    }

    pub fn contains(&self, p: DVec2) -> bool {
        if !self.is_usable() {
            return false;
        }
        let max = self.max();
        p.x >= self.origin.x && p.x <= max.x && p.y >= self.origin.y && p.y <= max.y
    }

    pub fn to_local(&self, p: DVec2) -> DVec2 {
        p - self.origin
    }

    pub fn to_world(&self, local: DVec2) -> DVec2 {
        self.origin + local
    }
}

/// First usable surface containing `p`, skipping `except`.
pub fn surface_at(surfaces: &[SurfaceRect], p: DVec2, except: Option<usize>) -> Option<usize> {
    surfaces
        .iter()
        .enumerate()
        .find(|(i, r)| Some(*i) != except && r.contains(p))
        .map(|(i, _)| i)
}

#[inline]
fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}
