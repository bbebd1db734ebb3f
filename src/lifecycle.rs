// Copyright (c) 2026 rezky_nightky

//! Lifecycles: the droplet state machine and the respawn rules for free
//! particles.
//!
//! Droplets only ever move forward through
//! accumulating → sliding → falling → fading and leave the pool from there.
//! Free particles never leave the pool; they are reseeded when they exit the
//! scene.

use glam::DVec2;

use crate::environment::{surface_at, SurfaceRect};
use crate::force::{ForceProfile, GRAVITY};
use crate::noise;
use crate::particle::{Anchor, Droplet, DropletPhase, Particle, ParticleKind};
use crate::pool::Fate;
use crate::puddle::PuddleSink;

/// Fraction of `max_age` a droplet spends accumulating before it slides.
pub const ACCUMULATE_FRACTION: f64 = 0.1;
/// Absorbs the rounding of repeatedly summed frame deltas.
const AGE_EPSILON: f64 = 1e-6;

pub const HANDOFF_DEFORMATION: f64 = 1.5;
pub const RELEASE_DEFORMATION: f64 = 1.2;
pub const MAX_DEFORMATION: f64 = 2.0;
const DEFORMATION_RECOVERY: f64 = 0.8;
const DEFORMATION_PER_SPEED: f64 = 0.5;

/// Downward speed given to a drop the moment it leaves its surface.
pub const RELEASE_SPEED: f64 = 0.05;
/// Falling drops faster than this start fading.
pub const FADE_SPEED: f64 = 1.0;
/// Opacity lost per second while fading.
pub const FADE_RATE: f64 = 1.6;

const GLASS_WOBBLE: f64 = 0.015;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneBounds {
    pub ground_y: f64,
    /// How far past the left/right edges a free particle may travel.
    pub side_margin: f64,
    /// How far past the ground a free particle may travel.
    pub floor_margin: f64,
    /// A falling drop past this line starts fading.
    pub soft_lower_bound: f64,
    /// A fading drop past this line is removed.
    pub terminal_lower_bound: f64,
    /// Clouds and fog drifting above this line are recycled.
    pub ceiling: f64,
}

impl Default for SceneBounds {
    fn default() -> Self {
        Self {
            ground_y: 1.0,
            side_margin: 0.1,
            floor_margin: 0.05,
            soft_lower_bound: 0.92,
            terminal_lower_bound: 1.1,
            ceiling: -0.4,
        }
    }
}

impl SceneBounds {
    pub fn floor(&self) -> f64 {
        self.ground_y + self.floor_margin
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RespawnCause {
    Floor,
    Edge,
    Expired,
    NonFinite,
}

/// Why a free particle needs reseeding, if it does.
pub fn check_free(p: &Particle, bounds: &SceneBounds) -> Option<RespawnCause> {
    if !p.is_finite() {
        return Some(RespawnCause::NonFinite);
    }
    if p.kind.has_lifetime() && p.is_expired() {
        return Some(RespawnCause::Expired);
    }

    let pos = p.position;
    match p.kind {
        ParticleKind::Cloud | ParticleKind::Fog => {
            let reach = bounds.side_margin + p.shape.extent();
            if pos.x < -reach || pos.x > 1.0 + reach || pos.y < bounds.ceiling || pos.y > bounds.floor() {
                return Some(RespawnCause::Edge);
            }
            None
        }
        _ => {
            if pos.y > bounds.floor() {
                return Some(RespawnCause::Floor);
            }
            if pos.x < -bounds.side_margin || pos.x > 1.0 + bounds.side_margin {
                return Some(RespawnCause::Edge);
            }
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalCause {
    /// Hit the hard lifetime cap.
    Expired,
    /// Crossed the water line.
    Splashed,
    Faded,
    /// Fell past the terminal lower bound.
    LeftScene,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropletFate {
    Keep,
    Remove(RemovalCause),
}

impl DropletFate {
    pub fn fate(self) -> Fate {
        match self {
            DropletFate::Keep => Fate::Keep,
            DropletFate::Remove(_) => Fate::Remove,
        }
    }
}

/// Per-step inputs for [`step_droplet`].
pub struct DropletContext<'a> {
    pub dt: f64,
    pub time: f64,
    pub surfaces: &'a [SurfaceRect],
    pub bounds: &'a SceneBounds,
    pub puddle: &'a mut dyn PuddleSink,
}

fn anchor_rect(anchor: Anchor, surfaces: &[SurfaceRect]) -> Option<SurfaceRect> {
    match anchor {
        Anchor::Glass => Some(SurfaceRect::VIEWPORT),
        Anchor::Surface(i) => surfaces.get(i).copied().filter(|r| r.is_usable()),
        Anchor::Free => None,
    }
}

fn release(p: &mut Particle, d: &mut Droplet) {
    d.phase = DropletPhase::Falling;
    d.anchor = Anchor::Free;
    d.deformation = RELEASE_DEFORMATION;
    p.velocity = DVec2::new(0.0, RELEASE_SPEED);
}

fn relax(d: &mut Droplet, dt: f64) {
    d.deformation = (d.deformation - DEFORMATION_RECOVERY * dt).max(1.0);
}

fn fall(p: &mut Particle, dt: f64) {
    let profile = ForceProfile::of(p.kind);
    let vy = (p.velocity.y + GRAVITY * profile.gravity_scale * dt).min(profile.terminal_velocity);
    p.velocity = DVec2::new(0.0, vy);
    p.position.y += vy * dt;
}

/// Advances one droplet by `ctx.dt`: ages it, moves it, and applies at most
/// one state transition. The particle is left untouched for non-droplets.
pub fn step_droplet(p: &mut Particle, ctx: &mut DropletContext<'_>) -> DropletFate {
    let Some(mut d) = p.droplet else {
        return DropletFate::Keep;
    };
    let dt = ctx.dt;
    p.age += dt;

    if p.is_expired() {
        return DropletFate::Remove(RemovalCause::Expired);
    }

    let fate = match d.phase {
        DropletPhase::Accumulating => {
            relax(&mut d, dt);
            match anchor_rect(d.anchor, ctx.surfaces) {
                Some(rect) => {
                    p.position = rect.to_world(d.local);
                    if p.age + AGE_EPSILON >= p.max_age * ACCUMULATE_FRACTION {
                        d.phase = DropletPhase::Sliding;
                    }
                }
                None => release(p, &mut d),
            }
            DropletFate::Keep
        }
        DropletPhase::Sliding => {
            slide(p, &mut d, ctx);
            DropletFate::Keep
        }
        DropletPhase::Falling => {
            fall(p, dt);
            d.deformation = (RELEASE_DEFORMATION + p.velocity.y * DEFORMATION_PER_SPEED).min(MAX_DEFORMATION);
            let water = ctx.puddle.water_level().unwrap_or(ctx.bounds.ground_y);
            if p.position.y >= water {
                ctx.puddle.add_ripple(p.position.x, ctx.bounds.ground_y);
                DropletFate::Remove(RemovalCause::Splashed)
            } else {
                if p.velocity.y > FADE_SPEED || p.position.y > ctx.bounds.soft_lower_bound {
                    d.phase = DropletPhase::Fading;
                }
                DropletFate::Keep
            }
        }
        DropletPhase::Fading => {
            fall(p, dt);
            p.base_opacity = (p.base_opacity - FADE_RATE * dt).max(0.0);
            if p.base_opacity <= 0.0 {
                DropletFate::Remove(RemovalCause::Faded)
            } else if p.position.y > ctx.bounds.terminal_lower_bound {
                DropletFate::Remove(RemovalCause::LeftScene)
            } else {
                DropletFate::Keep
            }
        }
    };

    p.droplet = Some(d);
    fate
}

fn slide(p: &mut Particle, d: &mut Droplet, ctx: &mut DropletContext<'_>) {
    let dt = ctx.dt;
    let Some(rect) = anchor_rect(d.anchor, ctx.surfaces) else {
        release(p, d);
        return;
    };

    relax(d, dt);
    let before = rect.to_world(d.local);
    d.local.y += d.slide_speed * dt;
    if d.anchor == Anchor::Glass {
        let wobble = noise::signed(DVec2::new(p.phase * 7.0, ctx.time * 0.8));
        d.local.x = (d.local.x + wobble * GLASS_WOBBLE * dt).clamp(0.0, rect.size.x);
    }
    d.slide_progress = d.slide_progress.max((d.local.y / rect.size.y).clamp(0.0, 1.0));

    let world = rect.to_world(d.local);
    p.position = world;
    let Some(current) = d.anchor.surface_index() else {
        if d.local.y > rect.size.y {
            release(p, d);
        }
        return;
    };

    // Crossing into another surface hands the drop over, even mid-slide.
    let next = if d.local.y <= rect.size.y {
        entered_surface(ctx.surfaces, before, world, current)
    } else {
        surface_at(ctx.surfaces, world, Some(current))
    };
    match next {
        Some(j) => {
            d.anchor = Anchor::Surface(j);
            d.local = ctx.surfaces[j].to_local(world);
            d.deformation = HANDOFF_DEFORMATION;
        }
        None if d.local.y > rect.size.y => release(p, d),
        None => {}
    }
}

/// First surface other than `current` that contains `to` but not `from`.
fn entered_surface(surfaces: &[SurfaceRect], from: DVec2, to: DVec2, current: usize) -> Option<usize> {
    surfaces
        .iter()
        .enumerate()
        .find(|&(i, r)| i != current && r.contains(to) && !r.contains(from))
        .map(|(i, _)| i)
}
