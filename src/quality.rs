// Copyright (c) 2026 rezky_nightky

//! Quality tiers: how many particles each layer gets and how they look.
//!
//! Tiers only decide spawn counts and cosmetic parameters. The physics is the
//! same at every tier.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const MIN_PARTICLE_BUDGET: usize = 100;
pub const MAX_PARTICLE_BUDGET: usize = 20_000;

const FPS_WEIGHT: f64 = 0.45;
const BUDGET_WEIGHT: f64 = 0.35;
const SCALE_WEIGHT: f64 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualitySettings {
    pub target_fps: f64,
    pub max_particles: usize,
    pub render_scale: f64,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            max_particles: 2000,
            render_scale: 1.0,
        }
    }
}

impl QualitySettings {
    pub fn new(target_fps: f64, max_particles: usize, render_scale: f64) -> Self {
        Self {
            target_fps,
            max_particles,
            render_scale,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target_fps.is_finite() || !(1.0..=240.0).contains(&self.target_fps) {
            return Err(Error::OutOfRange {
                name: "target fps",
                value: self.target_fps,
                min: 1.0,
                max: 240.0,
            });
        }
        if !(MIN_PARTICLE_BUDGET..=MAX_PARTICLE_BUDGET).contains(&self.max_particles) {
            return Err(Error::InvalidBudget(self.max_particles));
        }
        if !self.render_scale.is_finite() || !(0.25..=2.0).contains(&self.render_scale) {
            return Err(Error::OutOfRange {
                name: "render scale",
                value: self.render_scale,
                min: 0.25,
                max: 2.0,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QualityTier {
    Extreme,
    Balanced,
    EnergySaving,
    Adaptive,
}

impl QualityTier {
    pub const DEFAULT: QualityTier = QualityTier::Balanced;

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "extreme" | "ultra" => Ok(QualityTier::Extreme),
            "balanced" | "default" => Ok(QualityTier::Balanced),
            "energy-saving" | "energy_saving" | "energysaving" | "eco" => {
                Ok(QualityTier::EnergySaving)
            }
            "adaptive" => Ok(QualityTier::Adaptive),
            _ => Err(Error::UnknownTier(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QualityTier::Extreme => "extreme",
            QualityTier::Balanced => "balanced",
            QualityTier::EnergySaving => "energy-saving",
            QualityTier::Adaptive => "adaptive",
        }
    }

    /// Highest fixed tier the settings qualify for, else adaptive.
    pub fn select(settings: &QualitySettings) -> Self {
        let fps = settings.target_fps;
        let n = settings.max_particles;
        if fps >= 120.0 && n >= 3000 {
            QualityTier::Extreme
        } else if fps >= 60.0 && n >= 2000 {
            QualityTier::Balanced
        } else if fps >= 30.0 && n >= 1000 {
            QualityTier::EnergySaving
        } else {
            QualityTier::Adaptive
        }
    }

    pub fn profile(self, settings: &QualitySettings) -> QualityProfile {
        let base = match self {
            QualityTier::Extreme => QualityProfile::extreme(),
            QualityTier::Balanced => QualityProfile::balanced(),
            QualityTier::EnergySaving => QualityProfile::energy_saving(),
            QualityTier::Adaptive => QualityProfile::lerp(
                &QualityProfile::energy_saving(),
                &QualityProfile::extreme(),
                adaptive_score(settings),
            ),
        };
        let mut profile = base.fit_budget(settings.max_particles);
        profile.tier = self;
        profile
    }
}

impl FromStr for QualityTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weighted `[0, 1]` score of frame rate, particle budget and render scale,
/// measured from the energy-saving floor to the extreme ceiling.
pub fn adaptive_score(settings: &QualitySettings) -> f64 {
    let fps = unit(settings.target_fps, 30.0, 120.0);
    let budget = unit(settings.max_particles as f64, 1000.0, 3000.0);
    let scale = unit(settings.render_scale, 0.5, 1.0);
    (fps * FPS_WEIGHT + budget * BUDGET_WEIGHT + scale * SCALE_WEIGHT).clamp(0.0, 1.0)
}

fn unit(v: f64, lo: f64, hi: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RainVisual {
    pub length: f64,
    pub thickness: f64,
    pub opacity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnowVisual {
    pub size: f64,
    pub opacity: f64,
    pub blur: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudVisual {
    pub radius: f64,
    pub opacity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QualityProfile {
    pub tier: QualityTier,
    pub rain_counts: [usize; 3],
    pub snow_counts: [usize; 3],
    pub cloud_counts: [usize; 3],
    pub fog_counts: [usize; 3],
    pub droplet_budget: usize,
    pub rain: [RainVisual; 3],
    pub snow: [SnowVisual; 3],
    pub cloud: [CloudVisual; 3],
}

impl QualityProfile {
    pub fn extreme() -> Self {
        Self {
            tier: QualityTier::Extreme,
            rain_counts: [1200, 1000, 800],
            snow_counts: [900, 700, 400],
            cloud_counts: [8, 6, 5],
            fog_counts: [4, 3, 3],
            droplet_budget: 160,
            rain: [
                rain(0.012, 0.6, 0.35),
                rain(0.02, 0.9, 0.55),
                rain(0.032, 1.3, 0.8),
            ],
            snow: [
                snow(0.003, 0.45, 0.6),
                snow(0.005, 0.65, 0.3),
                snow(0.008, 0.9, 0.0),
            ],
            cloud: [cloud(0.08, 0.25), cloud(0.11, 0.35), cloud(0.15, 0.45)],
        }
    }

    pub fn balanced() -> Self {
        Self {
            tier: QualityTier::Balanced,
            rain_counts: [800, 700, 500],
            snow_counts: [600, 450, 250],
            cloud_counts: [6, 5, 4],
            fog_counts: [3, 2, 2],
            droplet_budget: 96,
            rain: [
                rain(0.012, 0.6, 0.3),
                rain(0.018, 0.8, 0.5),
                rain(0.028, 1.2, 0.75),
            ],
            snow: [
                snow(0.003, 0.4, 0.3),
                snow(0.005, 0.6, 0.15),
                snow(0.007, 0.85, 0.0),
            ],
            cloud: [cloud(0.08, 0.22), cloud(0.11, 0.32), cloud(0.14, 0.42)],
        }
    }

    pub fn energy_saving() -> Self {
        Self {
            tier: QualityTier::EnergySaving,
            rain_counts: [400, 350, 250],
            snow_counts: [300, 220, 120],
            cloud_counts: [4, 3, 2],
            fog_counts: [2, 1, 1],
            droplet_budget: 48,
            rain: [
                rain(0.01, 0.5, 0.25),
                rain(0.016, 0.7, 0.45),
                rain(0.024, 1.0, 0.7),
            ],
            snow: [
                snow(0.003, 0.35, 0.0),
                snow(0.004, 0.55, 0.0),
                snow(0.006, 0.8, 0.0),
            ],
            cloud: [cloud(0.07, 0.2), cloud(0.1, 0.3), cloud(0.13, 0.4)],
        }
    }

    pub fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let n = |x: usize, y: usize| (x as f64 + (y as f64 - x as f64) * t).round() as usize;
        let f = |x: f64, y: f64| x + (y - x) * t;
        let counts = |x: &[usize; 3], y: &[usize; 3]| {
            [n(x[0], y[0]), n(x[1], y[1]), n(x[2], y[2])]
        };
        Self {
            tier: QualityTier::Adaptive,
            rain_counts: counts(&a.rain_counts, &b.rain_counts),
            snow_counts: counts(&a.snow_counts, &b.snow_counts),
            cloud_counts: counts(&a.cloud_counts, &b.cloud_counts),
            fog_counts: counts(&a.fog_counts, &b.fog_counts),
            droplet_budget: n(a.droplet_budget, b.droplet_budget),
            rain: std::array::from_fn(|i| RainVisual {
                length: f(a.rain[i].length, b.rain[i].length),
                thickness: f(a.rain[i].thickness, b.rain[i].thickness),
                opacity: f(a.rain[i].opacity, b.rain[i].opacity),
            }),
            snow: std::array::from_fn(|i| SnowVisual {
                size: f(a.snow[i].size, b.snow[i].size),
                opacity: f(a.snow[i].opacity, b.snow[i].opacity),
                blur: f(a.snow[i].blur, b.snow[i].blur),
            }),
            cloud: std::array::from_fn(|i| CloudVisual {
                radius: f(a.cloud[i].radius, b.cloud[i].radius),
                opacity: f(a.cloud[i].opacity, b.cloud[i].opacity),
            }),
        }
    }

    /// Scales layer counts down so no single effect exceeds `max_particles`.
    pub fn fit_budget(mut self, max_particles: usize) -> Self {
        let max = max_particles.max(MIN_PARTICLE_BUDGET);
        fit_counts(&mut self.rain_counts, max);
        fit_counts(&mut self.snow_counts, max);
        self
    }

    pub fn rain_total(&self) -> usize {
        self.rain_counts.iter().sum()
    }

    pub fn snow_total(&self) -> usize {
        self.snow_counts.iter().sum()
    }

    pub fn cloud_total(&self) -> usize {
        self.cloud_counts.iter().sum::<usize>() + self.fog_counts.iter().sum::<usize>()
    }
}

fn fit_counts(counts: &mut [usize; 3], max: usize) {
    let total: usize = counts.iter().sum();
    if total <= max || total == 0 {
        return;
    }
    let scale = max as f64 / total as f64;
    for c in counts.iter_mut() {
        *c = (*c as f64 * scale).floor() as usize;
    }
}

const fn rain(length: f64, thickness: f64, opacity: f64) -> RainVisual {
    RainVisual {
        length,
        thickness,
        opacity,
    }
}

const fn snow(size: f64, opacity: f64, blur: f64) -> SnowVisual {
    SnowVisual {
        size,
        opacity,
        blur,
    }
}

const fn cloud(radius: f64, opacity: f64) -> CloudVisual {
    CloudVisual { radius, opacity }
}
