// Copyright (c) 2026 rezky_nightky

//! Per-particle force contributions.
//!
//! Everything is expressed as an acceleration in scene heights per second
//! squared; mass only enters through drag. The per-kind multipliers live in
//! one [`ForceProfile`] table so rain, snow and clouds share the same code.

use glam::DVec2;

use crate::environment::{EnvironmentState, InteractionField};
use crate::noise;
use crate::particle::{DepthLayer, Particle, ParticleKind};

pub const GRAVITY: f64 = 2.4;

/// Opacity left at the centre of a full-strength zone is `1 - MAX_DISPERSE`.
pub const MAX_DISPERSE: f64 = 0.9;
pub const MIN_DISPERSE_FACTOR: f64 = 1.0 - MAX_DISPERSE;

const TURBULENCE_GAIN: f64 = 0.5;
const SWAY_RATE: f64 = 2.0;
const DRIFT_RATE: f64 = 0.6;
const ZONE_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceProfile {
    pub gravity_scale: f64,
    pub wind_scale: f64,
    pub drag_coefficient: f64,
    pub lateral_damping: f64,
    pub terminal_velocity: f64,
    pub lateral_limit: f64,
    pub intensity_scaled: bool,
    pub repulsion: f64,
    pub sway_amplitude: f64,
    pub drift_amplitude: f64,
    /// Constant upward acceleration (fog rises).
    pub buoyancy: f64,
    pub noise_scale: f64,
    pub noise_rate: f64,
}

const RAIN: ForceProfile = ForceProfile {
    gravity_scale: 1.0,
    wind_scale: 0.3,
    drag_coefficient: 1.0,
    lateral_damping: 1.5,
    terminal_velocity: 1.2,
    lateral_limit: 0.8,
    intensity_scaled: true,
    repulsion: 4.0,
    sway_amplitude: 0.0,
    drift_amplitude: 0.0,
    buoyancy: 0.0,
    noise_scale: 3.0,
    noise_rate: 0.6,
};

const SNOW: ForceProfile = ForceProfile {
    gravity_scale: 0.15,
    wind_scale: 0.8,
    drag_coefficient: 6.0,
    lateral_damping: 0.8,
    terminal_velocity: 0.18,
    lateral_limit: 0.6,
    intensity_scaled: true,
    repulsion: 2.0,
    sway_amplitude: 0.06,
    drift_amplitude: 0.0,
    buoyancy: 0.0,
    noise_scale: 2.0,
    noise_rate: 0.3,
};

const CLOUD: ForceProfile = ForceProfile {
    gravity_scale: 0.0,
    wind_scale: 0.2,
    drag_coefficient: 0.0,
    lateral_damping: 2.0,
    terminal_velocity: 0.05,
    lateral_limit: 0.2,
    intensity_scaled: false,
    repulsion: 0.6,
    sway_amplitude: 0.0,
    drift_amplitude: 0.004,
    buoyancy: 0.0,
    noise_scale: 1.2,
    noise_rate: 0.1,
};

const FOG: ForceProfile = ForceProfile {
    gravity_scale: 0.0,
    wind_scale: 0.1,
    drag_coefficient: 0.0,
    lateral_damping: 2.0,
    terminal_velocity: 0.03,
    lateral_limit: 0.15,
    intensity_scaled: false,
    repulsion: 0.8,
    sway_amplitude: 0.0,
    drift_amplitude: 0.003,
    buoyancy: 0.002,
    noise_scale: 0.8,
    noise_rate: 0.05,
};

const DROPLET: ForceProfile = ForceProfile {
    gravity_scale: 1.0,
    wind_scale: 0.0,
    drag_coefficient: 0.0,
    lateral_damping: 0.0,
    terminal_velocity: 1.6,
    lateral_limit: 0.0,
    intensity_scaled: false,
    repulsion: 0.0,
    sway_amplitude: 0.0,
    drift_amplitude: 0.0,
    buoyancy: 0.0,
    noise_scale: 6.0,
    noise_rate: 0.4,
};

impl ForceProfile {
    pub fn of(kind: ParticleKind) -> &'static ForceProfile {
        match kind {
            ParticleKind::Rain => &RAIN,
            ParticleKind::Snow => &SNOW,
            ParticleKind::Cloud => &CLOUD,
            ParticleKind::Fog => &FOG,
            ParticleKind::GlassDrop | ParticleKind::WallDrop => &DROPLET,
        }
    }
}

/// Borrowed per-step inputs. Never outlives one `advance` call.
#[derive(Clone, Copy, Debug)]
pub struct ForceContext<'a> {
    pub env: &'a EnvironmentState,
    pub field: &'a InteractionField,
    pub time: f64,
    /// Slow multiplier on wind strength, resampled by the stepper.
    pub gust: f64,
}

pub fn force(p: &Particle, ctx: &ForceContext<'_>) -> DVec2 {
    let profile = ForceProfile::of(p.kind);
    gravity(profile)
        + wind(p, profile, ctx)
        + repulsion(p.position, ctx.field, profile.repulsion)
        + sway(p, profile, ctx.time)
        + drift(p, profile, ctx.time)
}

pub fn gravity(profile: &ForceProfile) -> DVec2 {
    DVec2::new(0.0, GRAVITY * profile.gravity_scale - profile.buoyancy)
}

/// Noise-driven turbulence sample in `[0, 1)`.
pub fn turbulence(position: DVec2, profile: &ForceProfile, time: f64) -> f64 {
    noise::value2d(position * profile.noise_scale + DVec2::splat(time * profile.noise_rate))
}

pub fn wind(p: &Particle, profile: &ForceProfile, ctx: &ForceContext<'_>) -> DVec2 {
    if profile.wind_scale == 0.0 {
        return DVec2::ZERO;
    }
    let layer = p.layer.factor();
    let t = turbulence(p.position, profile, ctx.time);
    let steady = ctx.env.wind_vector()
        * ctx.env.wind_speed
        * (0.5 + 0.5 * t)
        * profile.wind_scale
        * layer
        * ctx.gust;

    if ctx.env.turbulence <= 0.0 {
        return steady;
    }
    let jitter_at = p.position * profile.noise_scale + DVec2::new(31.7, ctx.time * profile.noise_rate);
    let jitter = noise::signed(jitter_at) * ctx.env.turbulence * TURBULENCE_GAIN;
    steady + DVec2::new(jitter * profile.wind_scale * layer, 0.0)
}

/// Quadratic falloff: `1` at the centre, `0` at and beyond the radius.
pub fn repulsion_falloff(distance: f64, radius: f64) -> f64 {
    if radius.is_nan() || radius <= 0.0 || !distance.is_finite() || distance >= radius {
        return 0.0;
    }
    let r = (distance / radius).max(0.0);
    1.0 - r * r
}

pub fn repulsion_magnitude(base: f64, strength: f64, distance: f64, radius: f64) -> f64 {
    base * strength * repulsion_falloff(distance, radius)
}

/// Sum of outward pushes from every zone containing `position`. A particle
/// sitting exactly on a centre has no defined direction and is skipped.
pub fn repulsion(position: DVec2, field: &InteractionField, base: f64) -> DVec2 {
    if base == 0.0 {
        return DVec2::ZERO;
    }
    let mut total = DVec2::ZERO;
    for zone in field.usable() {
        let offset = position - zone.center;
        let d = offset.length();
        if d <= ZONE_EPSILON {
            continue;
        }
        let m = repulsion_magnitude(base, zone.effective_strength(), d, zone.radius);
        if m > 0.0 {
            total += offset / d * m;
        }
    }
    total
}

/// Opacity multiplier from the strongest zone at `position`. Unlike the
/// force, overlapping zones do not accumulate: the minimum wins.
pub fn disperse_factor(position: DVec2, field: &InteractionField) -> f64 {
    let mut factor: f64 = 1.0;
    for zone in field.usable() {
        let d = (position - zone.center).length();
        let falloff = repulsion_falloff(d, zone.radius);
        if falloff > 0.0 {
            factor = factor.min(1.0 - zone.effective_strength() * MAX_DISPERSE * falloff);
        }
    }
    factor.clamp(MIN_DISPERSE_FACTOR, 1.0)
}

pub fn sway(p: &Particle, profile: &ForceProfile, time: f64) -> DVec2 {
    if profile.sway_amplitude == 0.0 {
        return DVec2::ZERO;
    }
    let s = (time * SWAY_RATE + p.phase).sin() * profile.sway_amplitude * p.layer.factor();
    DVec2::new(s, 0.0)
}

/// Slow vertical bob standing in for gravity on clouds and fog.
pub fn drift(p: &Particle, profile: &ForceProfile, time: f64) -> DVec2 {
    if profile.drift_amplitude == 0.0 {
        return DVec2::ZERO;
    }
    DVec2::new(0.0, (time * DRIFT_RATE + p.phase).sin() * profile.drift_amplitude)
}

/// Quadratic drag on vertical speed plus linear damping on horizontal speed.
/// Drag can bring a component to rest but never reverses it.
pub fn apply_drag(v: DVec2, profile: &ForceProfile, mass: f64, dt: f64) -> DVec2 {
    let mass = mass.max(crate::particle::MIN_MASS);
    let drag = profile.drag_coefficient * v.y * v.y / mass;
    let vy = (v.y.abs() - drag * dt).max(0.0) * v.y.signum();
    let vx = v.x * (1.0 - profile.lateral_damping * dt).max(0.0);
    DVec2::new(vx, vy)
}

pub fn terminal_velocity(kind: ParticleKind, intensity: f64) -> f64 {
    let profile = ForceProfile::of(kind);
    if profile.intensity_scaled {
        profile.terminal_velocity * intensity.max(crate::environment::MIN_INTENSITY)
    } else {
        profile.terminal_velocity
    }
}

pub fn clamp_terminal(v: DVec2, kind: ParticleKind, intensity: f64) -> DVec2 {
    let profile = ForceProfile::of(kind);
    let terminal = terminal_velocity(kind, intensity);
    let lateral = profile.lateral_limit.max(0.0);
    DVec2::new(v.x.clamp(-lateral, lateral), v.y.clamp(-terminal, terminal))
}

/// Scale applied to cosmetic size by depth.
pub fn layer_scale(layer: DepthLayer) -> f64 {
    match layer {
        DepthLayer::Far => 0.55,
        DepthLayer::Mid => 0.8,
        DepthLayer::Near => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::RepulsionZone;

    fn rain_at(pos: DVec2) -> Particle {
        Particle::new(ParticleKind::Rain, DepthLayer::Near, pos, 1.0)
    }

    #[test]
    fn repulsion_falloff_profile() {
        assert_eq!(repulsion_falloff(0.0, 1.0), 1.0);
        assert_eq!(repulsion_falloff(1.0, 1.0), 0.0);
        assert_eq!(repulsion_falloff(2.0, 1.0), 0.0);
        assert!((repulsion_falloff(0.5, 1.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn repulsion_magnitude_half_radius_is_three_quarters_of_max() {
        let max = repulsion_magnitude(4.0, 1.0, 0.0, 100.0);
        let half = repulsion_magnitude(4.0, 1.0, 50.0, 100.0);
        let edge = repulsion_magnitude(4.0, 1.0, 100.0, 100.0);
        assert_eq!(max, 4.0);
        assert!((half / max - 0.75).abs() < 1e-12);
        assert_eq!(edge, 0.0);
    }

    #[test]
    fn repulsion_points_outward_and_sums() {
        let zone = RepulsionZone::new(DVec2::new(0.5, 0.5), 0.2, 1.0);
        let field = InteractionField::single(zone);
        let f = repulsion(DVec2::new(0.6, 0.5), &field, 2.0);
        assert!(f.x > 0.0);
        assert!(f.y.abs() < 1e-12);

        let mut double = field.clone();
        double.push(zone);
        let f2 = repulsion(DVec2::new(0.6, 0.5), &double, 2.0);
        assert!((f2.x - 2.0 * f.x).abs() < 1e-12);
    }

    #[test]
    fn repulsion_skips_exact_centre() {
        let field = InteractionField::single(RepulsionZone::new(DVec2::new(0.5, 0.5), 0.2, 1.0));
        assert_eq!(repulsion(DVec2::new(0.5, 0.5), &field, 2.0), DVec2::ZERO);
    }

    #[test]
    fn disperse_takes_minimum_not_sum() {
        let weak = RepulsionZone::new(DVec2::new(0.5, 0.5), 0.2, 0.2);
        let strong = RepulsionZone::new(DVec2::new(0.5, 0.5), 0.2, 1.0);
        let field = InteractionField {
            zones: vec![weak, strong, weak],
        };
        let f = disperse_factor(DVec2::new(0.5, 0.5), &field);
        assert!((f - MIN_DISPERSE_FACTOR).abs() < 1e-12);

        let only_weak = InteractionField {
            zones: vec![weak, weak],
        };
        let w = disperse_factor(DVec2::new(0.5, 0.5), &only_weak);
        assert!((w - (1.0 - 0.2 * MAX_DISPERSE)).abs() < 1e-12);
    }

    #[test]
    fn no_wind_means_no_lateral_force_on_rain() {
        let env = EnvironmentState::calm();
        let field = InteractionField::empty();
        let ctx = ForceContext {
            env: &env,
            field: &field,
            time: 3.0,
            gust: 1.0,
        };
        let f = force(&rain_at(DVec2::new(0.3, 0.4)), &ctx);
        assert_eq!(f.x, 0.0);
        assert!(f.y > 0.0);
    }

    #[test]
    fn nearer_layers_feel_more_wind() {
        let env = EnvironmentState::calm().with_wind(1.0, 0.0);
        let field = InteractionField::empty();
        let ctx = ForceContext {
            env: &env,
            field: &field,
            time: 0.0,
            gust: 1.0,
        };
        let pos = DVec2::new(0.25, 0.25);
        let far = Particle::new(ParticleKind::Snow, DepthLayer::Far, pos, 1.0);
        let near = Particle::new(ParticleKind::Snow, DepthLayer::Near, pos, 1.0);
        let wf = wind(&far, ForceProfile::of(far.kind), &ctx).x;
        let wn = wind(&near, ForceProfile::of(near.kind), &ctx).x;
        assert!((wn / wf - 1.6).abs() < 1e-9);
    }

    #[test]
    fn fog_rises_and_rain_falls() {
        assert!(gravity(ForceProfile::of(ParticleKind::Fog)).y < 0.0);
        assert!(gravity(ForceProfile::of(ParticleKind::Rain)).y > 0.0);
        assert!(gravity(ForceProfile::of(ParticleKind::Snow)).y < GRAVITY);
    }

    #[test]
    fn drag_never_reverses_velocity() {
        let profile = ForceProfile::of(ParticleKind::Snow);
        let v = apply_drag(DVec2::new(0.5, 5.0), profile, 0.01, 0.1);
        assert_eq!(v.y, 0.0);
        assert!(v.x >= 0.0);
        let up = apply_drag(DVec2::new(0.0, -5.0), profile, 0.01, 0.1);
        assert!(up.y <= 0.0);
    }

    #[test]
    fn terminal_clamp_scales_with_intensity() {
        let v = clamp_terminal(DVec2::new(0.0, 10.0), ParticleKind::Rain, 1.0);
        assert_eq!(v.y, 1.2);
        let v = clamp_terminal(DVec2::new(0.0, 10.0), ParticleKind::Rain, 2.0);
        assert_eq!(v.y, 2.4);
        let v = clamp_terminal(DVec2::new(0.0, 10.0), ParticleKind::Cloud, 2.0);
        assert_eq!(v.y, 0.05);
    }

    #[test]
    fn snow_sway_depends_on_phase() {
        let env = EnvironmentState::calm();
        let field = InteractionField::empty();
        let ctx = ForceContext {
            env: &env,
            field: &field,
            time: 1.0,
            gust: 1.0,
        };
        let pos = DVec2::new(0.5, 0.5);
        let a = Particle::new(ParticleKind::Snow, DepthLayer::Mid, pos, 0.5).with_phase(0.0);
        let b = Particle::new(ParticleKind::Snow, DepthLayer::Mid, pos, 0.5).with_phase(1.5);
        assert_ne!(force(&a, &ctx).x, force(&b, &ctx).x);
    }
}
