// Copyright (c) 2026 rezky_nightky

use glam::DVec2;

use crate::environment::{surface_at, EnvironmentState, InteractionField, SurfaceRect};
use crate::force::{apply_drag, clamp_terminal, disperse_factor, force, ForceContext, ForceProfile};
use crate::lifecycle::{check_free, step_droplet, DropletContext, DropletFate, RemovalCause, RespawnCause, SceneBounds};
use crate::noise;
use crate::particle::{clamp_unit, Anchor, DepthLayer, Particle, ParticleKind};
use crate::pool::{Fate, ParticlePool};
use crate::puddle::PuddleSink;
use crate::quality::QualityProfile;
use crate::snapshot::{EffectSnapshot, ParticleView};
use crate::spawn::Spawner;
use crate::ticker::Ticker;

pub const MIN_DT: f64 = 0.001;
pub const MAX_DT: f64 = 0.1;

pub const GUST_INTERVAL: f64 = 0.5;
pub const CONDENSATION_INTERVAL: f64 = 0.25;
pub const FLICKER_INTERVAL: f64 = 0.08;

const GUST_RANGE: (f64, f64) = (0.75, 1.25);
const GUST_EASE: f64 = 2.0;
/// Noise-space distance travelled per second by the gust sampler.
const GUST_RATE: f64 = 0.35;
const GUST_OCTAVES: u32 = 3;
const FLICKER_RANGE: (f64, f64) = (0.85, 1.0);
const CONDENSATION_CHANCE: f64 = 0.35;
/// Puddle depth added per unit of rain mass reaching the ground.
const WATER_PER_DROP: f64 = 2e-5;
const WARN_EVERY_FRAMES: u64 = 300;

/// Gust multiplier at `time`, read off a slow fbm track in `GUST_RANGE`.
fn gust_sample(time: f64, offset: f64) -> f64 {
    let n = noise::fbm(DVec2::new(time * GUST_RATE, offset), GUST_OCTAVES);
    GUST_RANGE.0 + (GUST_RANGE.1 - GUST_RANGE.0) * n
}

/// Places each seed on its own row of the gust noise.
fn gust_offset(seed: u64) -> f64 {
    (seed % 4096) as f64 * 13.7
}

/// Frame delta the integrator will actually use.
pub fn clamp_dt(dt: f64) -> f64 {
    if dt.is_nan() {
        return MIN_DT;
    }
    dt.clamp(MIN_DT, MAX_DT)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Rain,
    Snow,
    Cloud,
}

impl EffectKind {
    pub const ALL: [EffectKind; 3] = [EffectKind::Rain, EffectKind::Snow, EffectKind::Cloud];

    pub fn label(self) -> &'static str {
        match self {
            EffectKind::Rain => "rain",
            EffectKind::Snow => "snow",
            EffectKind::Cloud => "cloud",
        }
    }

    pub fn capacity(self, profile: &QualityProfile) -> usize {
        match self {
            EffectKind::Rain => profile.rain_total() + profile.droplet_budget,
            EffectKind::Snow => profile.snow_total(),
            EffectKind::Cloud => profile.cloud_total(),
        }
    }

    /// Free particles this effect keeps alive, per layer.
    fn population(self, profile: &QualityProfile) -> Vec<(ParticleKind, [usize; 3])> {
        match self {
            EffectKind::Rain => vec![(ParticleKind::Rain, profile.rain_counts)],
            EffectKind::Snow => vec![(ParticleKind::Snow, profile.snow_counts)],
            EffectKind::Cloud => vec![
                (ParticleKind::Cloud, profile.cloud_counts),
                (ParticleKind::Fog, profile.fog_counts),
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectConfig {
    pub seed: u64,
    pub bounds: SceneBounds,
    /// Rain hitting a surface leaves a wall drop behind.
    pub stick_to_surfaces: bool,
    /// Beads periodically form on the glass while it rains.
    pub condensation: bool,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            seed: 0x1234567,
            bounds: SceneBounds::default(),
            stick_to_surfaces: true,
            condensation: true,
        }
    }
}

impl EffectConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Counters for one `advance` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub floor_respawns: u32,
    pub edge_respawns: u32,
    pub expired_respawns: u32,
    pub non_finite_recoveries: u32,
    pub impacts: u32,
    pub droplets_spawned: u32,
    /// Droplet spawns that found no free slot.
    pub droplets_dropped: u32,
    pub droplets_removed: u32,
    pub ripples: u32,
}

impl StepReport {
    pub fn respawns(&self) -> u32 {
        self.floor_respawns + self.edge_respawns + self.expired_respawns + self.non_finite_recoveries
    }

    pub fn merged(&self, other: &StepReport) -> StepReport {
        StepReport {
            floor_respawns: self.floor_respawns + other.floor_respawns,
            edge_respawns: self.edge_respawns + other.edge_respawns,
            expired_respawns: self.expired_respawns + other.expired_respawns,
            non_finite_recoveries: self.non_finite_recoveries + other.non_finite_recoveries,
            impacts: self.impacts + other.impacts,
            droplets_spawned: self.droplets_spawned + other.droplets_spawned,
            droplets_dropped: self.droplets_dropped + other.droplets_dropped,
            droplets_removed: self.droplets_removed + other.droplets_removed,
            ripples: self.ripples + other.ripples,
        }
    }

    fn count_respawn(&mut self, cause: RespawnCause) {
        match cause {
            RespawnCause::Floor => self.floor_respawns += 1,
            RespawnCause::Edge => self.edge_respawns += 1,
            RespawnCause::Expired => self.expired_respawns += 1,
            RespawnCause::NonFinite => self.non_finite_recoveries += 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct WarnThrottle {
    last: Option<u64>,
}

/// One throttle per kind of input defect, so one never hides another.
#[derive(Clone, Copy, Debug, Default)]
struct Warnings {
    environment: WarnThrottle,
    rejected_inputs: WarnThrottle,
    non_finite: WarnThrottle,
}

impl WarnThrottle {
    fn ready(&mut self, frame: u64) -> bool {
        match self.last {
            Some(last) if frame.saturating_sub(last) < WARN_EVERY_FRAMES => false,
            _ => {
                self.last = Some(frame);
                true
            }
        }
    }
}

/// Owns one effect's pool and advances it a frame at a time.
///
/// All particle mutation happens inside [`SimulationStepper::advance`]. Host
/// inputs are only borrowed for the duration of that call.
#[derive(Clone, Debug)]
pub struct SimulationStepper {
    effect: EffectKind,
    pool: ParticlePool,
    spawner: Spawner,
    bounds: SceneBounds,
    stick_to_surfaces: bool,
    condensation: bool,
    /// Droplets created mid-pass; inserted once the pass is over.
    pending: Vec<Particle>,

    time: f64,
    frame: u64,
    gust: f64,
    gust_target: f64,
    gust_offset: f64,
    highlight: f64,
    gust_ticker: Ticker,
    condensation_ticker: Ticker,
    flicker_ticker: Ticker,

    last_report: StepReport,
    warnings: Warnings,
}

impl SimulationStepper {
    pub fn new(effect: EffectKind, profile: &QualityProfile, config: &EffectConfig) -> Self {
        let capacity = effect.capacity(profile);
        let mut stepper = Self {
            effect,
            pool: ParticlePool::with_capacity(capacity),
            spawner: Spawner::new(config.seed, profile, config.bounds),
            bounds: config.bounds,
            stick_to_surfaces: config.stick_to_surfaces,
            condensation: config.condensation,
            pending: Vec::with_capacity(profile.droplet_budget),
            time: 0.0,
            frame: 0,
            gust: 1.0,
            gust_target: 1.0,
            gust_offset: gust_offset(config.seed),
            highlight: 1.0,
            gust_ticker: Ticker::new(GUST_INTERVAL),
            condensation_ticker: Ticker::new(CONDENSATION_INTERVAL),
            flicker_ticker: Ticker::new(FLICKER_INTERVAL),
            last_report: StepReport::default(),
            warnings: Warnings::default(),
        };
        stepper.prefill(profile);
        log::debug!(
            "{} stepper ready: {} particles, capacity {} ({} tier)",
            effect.label(),
            stepper.pool.len(),
            capacity,
            profile.tier.name()
        );
        stepper
    }

    fn prefill(&mut self, profile: &QualityProfile) {
        for (kind, counts) in self.effect.population(profile) {
            for layer in DepthLayer::ALL {
                for _ in 0..counts[layer.index()] {
                    let p = self.spawner.free(kind, layer, 0.0, true);
                    if self.pool.spawn(p).is_none() {
                        return;
                    }
                }
            }
        }
    }

    pub fn effect(&self) -> EffectKind {
        self.effect
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn gust(&self) -> f64 {
        self.gust
    }

    pub fn highlight(&self) -> f64 {
        self.highlight
    }

    pub fn last_report(&self) -> StepReport {
        self.last_report
    }

    /// Inserts a particle into a free slot. A full pool drops the request.
    pub fn spawn(&mut self, particle: Particle) -> Option<usize> {
        self.pool.spawn(particle)
    }

    fn tick_subsystems(&mut self, dt: f64) -> bool {
        if self.gust_ticker.feed(dt) {
            self.gust_target = gust_sample(self.time, self.gust_offset);
        }
        self.gust += (self.gust_target - self.gust) * (dt * GUST_EASE).min(1.0);

        if self.flicker_ticker.feed(dt) {
            self.highlight = self.spawner.between(FLICKER_RANGE.0, FLICKER_RANGE.1);
        }

        self.condensation_ticker.feed(dt)
    }

    /// Advances every live particle by one clamped frame delta.
    pub fn advance(
        &mut self,
        dt: f64,
        env: &EnvironmentState,
        field: &InteractionField,
        surfaces: &[SurfaceRect],
        puddle: &mut dyn PuddleSink,
    ) -> StepReport {
        let dt = clamp_dt(dt);
        self.frame += 1;
        self.time += dt;

        let env = if env.is_sane() {
            *env
        } else {
            if self.warnings.environment.ready(self.frame) {
                log::warn!("{}: environment out of range, clamping {:?}", self.effect.label(), env);
            }
            env.sanitized()
        };
        let rejected = field.rejected() + surfaces.iter().filter(|r| !r.is_usable()).count();
        if rejected > 0 && self.warnings.rejected_inputs.ready(self.frame) {
            log::warn!("{}: ignoring {} degenerate zones/surfaces", self.effect.label(), rejected);
        }

        let condense_due = self.tick_subsystems(dt);

        let mut report = StepReport::default();
        let time = self.time;
        let bounds = self.bounds;
        let intensity = env.intensity;
        let stick = self.stick_to_surfaces && self.effect == EffectKind::Rain && !surfaces.is_empty();
        let room = self.pool.free_slots();
        let ctx = ForceContext {
            env: &env,
            field,
            time,
            gust: self.gust,
        };
        let mut dctx = DropletContext {
            dt,
            time,
            surfaces,
            bounds: &bounds,
            puddle,
        };
        let spawner = &mut self.spawner;
        let pending = &mut self.pending;

        self.pool.for_each_mut(|_, p| {
            if p.kind.is_droplet() {
                let fate = step_droplet(p, &mut dctx);
                match fate {
                    DropletFate::Remove(cause) => {
                        report.droplets_removed += 1;
                        if cause == RemovalCause::Splashed {
                            report.ripples += 1;
                        }
                    }
                    DropletFate::Keep => {
                        p.disperse = disperse_factor(p.position, field);
                        p.opacity = clamp_unit(p.base_opacity * p.disperse);
                    }
                }
                return fate.fate();
            }

            p.age += dt;
            if p.is_finite() {
                let profile = ForceProfile::of(p.kind);
                let v = p.velocity + force(p, &ctx) * dt;
                let v = apply_drag(v, profile, p.mass(), dt);
                p.velocity = clamp_terminal(v, p.kind, intensity);
                p.position += p.velocity * dt;
                p.disperse = disperse_factor(p.position, field);
            }

            if stick && p.kind == ParticleKind::Rain && p.is_finite() {
                if let Some(i) = surface_at(surfaces, p.position, None) {
                    report.impacts += 1;
                    if pending.len() < room {
                        let rect = surfaces[i];
                        let local = rect.to_local(p.position);
                        pending.push(spawner.droplet(ParticleKind::WallDrop, Anchor::Surface(i), &rect, local));
                        report.droplets_spawned += 1;
                    } else {
                        report.droplets_dropped += 1;
                    }
                    spawner.reseed(p, time, false);
                }
            }

            if let Some(cause) = check_free(p, &bounds) {
                report.count_respawn(cause);
                if cause == RespawnCause::Floor && p.kind == ParticleKind::Rain {
                    dctx.puddle.add_water(WATER_PER_DROP * p.mass());
                }
                spawner.reseed(p, time, false);
            }

            let life = if p.kind.has_lifetime() { p.life_ratio() } else { 1.0 };
            p.opacity = clamp_unit(p.base_opacity * life * p.disperse);
            Fate::Keep
        });

        for drop in self.pending.drain(..) {
            if self.pool.spawn(drop).is_none() {
                report.droplets_spawned -= 1;
                report.droplets_dropped += 1;
            }
        }

        if condense_due && self.condensation && self.effect == EffectKind::Rain {
            let chance = CONDENSATION_CHANCE * intensity.min(1.0);
            if self.spawner.chance() < chance {
                let at = self.spawner.condensation_point(time);
                let bead = self
                    .spawner
                    .droplet(ParticleKind::GlassDrop, Anchor::Glass, &SurfaceRect::VIEWPORT, at);
                if self.pool.spawn(bead).is_some() {
                    report.droplets_spawned += 1;
                } else {
                    report.droplets_dropped += 1;
                }
            }
        }

        if report.non_finite_recoveries > 0 && self.warnings.non_finite.ready(self.frame) {
            log::warn!(
                "{}: recovered {} non-finite particles",
                self.effect.label(),
                report.non_finite_recoveries
            );
        }
        log::trace!("{} frame {}: {:?}", self.effect.label(), self.frame, report);

        self.last_report = report;
        report
    }

    /// Rewrites `out` to reflect the last completed step, reusing its buffer.
    pub fn snapshot_into(&self, out: &mut EffectSnapshot) {
        out.effect = self.effect;
        out.frame = self.frame;
        out.time = self.time;
        out.capacity = self.pool.capacity();
        out.report = self.last_report;
        out.particles.clear();
        out.particles
            .extend(self.pool.iter().map(|p| ParticleView::of(p, self.highlight)));
    }

    pub fn snapshot(&self) -> EffectSnapshot {
        let mut out = EffectSnapshot::new(self.effect);
        self.snapshot_into(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::environment::RepulsionZone;
    use crate::force::terminal_velocity;
    use crate::particle::{Droplet, DropletPhase};
    use crate::puddle::{NoPuddle, Puddle};
    use crate::spawn::velocity_range;

    fn quiet() -> EffectConfig {
        EffectConfig {
            stick_to_surfaces: false,
            condensation: false,
            ..EffectConfig::default()
        }
    }

    fn rain(config: &EffectConfig) -> SimulationStepper {
        SimulationStepper::new(EffectKind::Rain, &QualityProfile::energy_saving(), config)
    }

    #[test]
    fn dt_is_clamped() {
        assert_eq!(clamp_dt(0.0), MIN_DT);
        assert_eq!(clamp_dt(-1.0), MIN_DT);
        assert_eq!(clamp_dt(5.0), MAX_DT);
        assert_eq!(clamp_dt(f64::NAN), MIN_DT);
        assert_eq!(clamp_dt(f64::INFINITY), MAX_DT);
        assert_eq!(clamp_dt(0.016), 0.016);
    }

    #[test]
    fn prefill_matches_profile() {
        let profile = QualityProfile::energy_saving();
        let s = SimulationStepper::new(EffectKind::Cloud, &profile, &quiet());
        assert_eq!(s.pool().count_kind(ParticleKind::Cloud), 9);
        assert_eq!(s.pool().count_kind(ParticleKind::Fog), 4);
        assert!(s.pool().is_full());

        let r = rain(&quiet());
        assert_eq!(r.pool().len(), profile.rain_total());
        assert_eq!(r.pool().free_slots(), profile.droplet_budget);
    }

    #[test]
    fn floor_respawn_lands_in_layer_band() {
        let mut s = rain(&quiet());
        s.pool.for_each_mut(|_, p| {
            p.position.y = 2.0;
            Fate::Keep
        });
        let report = s.advance(
            0.016,
            &EnvironmentState::calm(),
            &InteractionField::empty(),
            &[],
            &mut NoPuddle,
        );
        assert_eq!(report.floor_respawns as usize, s.pool().len());
        for p in s.pool().iter() {
            let (lo, hi) = p.layer.spawn_band();
            assert!(p.position.y >= lo && p.position.y <= hi, "{:?}", p.position);
            assert!(velocity_range(p.kind, p.layer).contains(p.velocity));
            assert_eq!(p.age, 0.0);
        }
    }

    #[test]
    fn same_seed_same_frames() {
        let env = EnvironmentState::calm().with_wind(1.0, 0.3).with_turbulence(0.5);
        let field = InteractionField::single(RepulsionZone::new(DVec2::new(0.5, 0.5), 0.2, 1.0));
        let mut a = rain(&EffectConfig::default());
        let mut b = rain(&EffectConfig::default());
        for _ in 0..60 {
            a.advance(0.016, &env, &field, &[], &mut NoPuddle);
            b.advance(0.016, &env, &field, &[], &mut NoPuddle);
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn rain_never_exceeds_terminal_velocity() {
        let mut s = rain(&quiet());
        let env = EnvironmentState::calm().with_intensity(1.5);
        let limit = terminal_velocity(ParticleKind::Rain, 1.5);
        for _ in 0..400 {
            s.advance(0.016, &env, &InteractionField::empty(), &[], &mut NoPuddle);
            for p in s.pool().iter() {
                assert!(p.velocity.y <= limit + 1e-12);
            }
        }
    }

    #[test]
    fn no_wind_means_no_sideways_drift() {
        let mut s = rain(&quiet());
        for _ in 0..200 {
            s.advance(0.016, &EnvironmentState::calm(), &InteractionField::empty(), &[], &mut NoPuddle);
        }
        for p in s.pool().iter() {
            assert!(p.velocity.x.abs() < 1e-12);
        }
    }

    #[test]
    fn wall_drop_walks_through_its_states() {
        let mut s = rain(&quiet());
        let surfaces = [SurfaceRect::new(0.3, 0.3, 0.2, 0.05)];
        let drop = Particle::new(ParticleKind::WallDrop, DepthLayer::Near, DVec2::new(0.4, 0.3), 1.0)
            .with_opacity(0.9)
            .with_lifetime(10.0)
            .with_droplet(Droplet::accumulating(Anchor::Surface(0), DVec2::new(0.1, 0.0), 0.1));
        let idx = s.spawn(drop).expect("free slot");
        let env = EnvironmentState::calm();
        let field = InteractionField::empty();
        let phase = |s: &SimulationStepper| s.pool().get(idx).and_then(|p| p.droplet_phase());

        for _ in 0..9 {
            s.advance(0.1, &env, &field, &surfaces, &mut NoPuddle);
            assert_eq!(phase(&s), Some(DropletPhase::Accumulating));
        }
        s.advance(0.1, &env, &field, &surfaces, &mut NoPuddle);
        assert_eq!(phase(&s), Some(DropletPhase::Sliding));

        let mut steps = 0;
        while phase(&s) == Some(DropletPhase::Sliding) {
            s.advance(0.1, &env, &field, &surfaces, &mut NoPuddle);
            steps += 1;
            assert!(steps < 100);
        }
        let p = s.pool().get(idx).expect("still alive");
        let d = p.droplet.expect("droplet");
        assert_eq!(d.phase, DropletPhase::Falling);
        assert_eq!(d.anchor, Anchor::Free);
    }

    #[test]
    fn impacts_leave_wall_drops_within_budget() {
        let mut s = rain(&EffectConfig {
            condensation: false,
            ..EffectConfig::default()
        });
        let surfaces = [SurfaceRect::new(0.0, 0.4, 1.0, 0.3)];
        let mut puddle = Puddle::new(1.0);
        let mut impacts = 0;
        let mut dropped = 0;
        for _ in 0..300 {
            let r = s.advance(0.016, &EnvironmentState::calm(), &InteractionField::empty(), &surfaces, &mut puddle);
            impacts += r.impacts;
            dropped += r.droplets_dropped;
            assert!(s.pool().len() <= s.capacity());
        }
        assert!(impacts > 0);
        assert!(s.pool().count_kind(ParticleKind::WallDrop) > 0);
        assert!(dropped > 0);
    }

    #[test]
    fn every_rain_layer_can_stick_to_a_surface() {
        let mut s = rain(&EffectConfig {
            condensation: false,
            ..EffectConfig::default()
        });
        let surfaces = [SurfaceRect::new(0.0, 0.2, 1.0, 0.6)];
        for layer in [DepthLayer::Far, DepthLayer::Mid] {
            s.pool.for_each_mut(|_, p| {
                if p.kind.is_droplet() {
                    return Fate::Remove;
                }
                p.layer = layer;
                p.position = DVec2::new(p.position.x.clamp(0.05, 0.95), 0.5);
                Fate::Keep
            });
            let free = s.pool().count_kind(ParticleKind::Rain);
            let report = s.advance(
                0.016,
                &EnvironmentState::calm(),
                &InteractionField::empty(),
                &surfaces,
                &mut NoPuddle,
            );
            assert_eq!(report.impacts as usize, free, "{:?}", layer);
            assert!(report.droplets_spawned > 0, "{:?}", layer);
            assert!(s.pool().count_kind(ParticleKind::WallDrop) > 0);
            assert!(s.pool().len() <= s.capacity());
        }
    }

    #[test]
    fn each_defect_kind_warns_on_its_own_schedule() {
        let mut s = SimulationStepper::new(EffectKind::Snow, &QualityProfile::energy_saving(), &quiet());
        let bad_env = EnvironmentState {
            wind_speed: f64::NAN,
            ..EnvironmentState::calm()
        };
        let bad_field = InteractionField::single(RepulsionZone::new(DVec2::new(0.5, 0.5), -1.0, 1.0));
        s.advance(0.016, &bad_env, &bad_field, &[], &mut NoPuddle);
        assert_eq!(s.warnings.environment.last, Some(1));
        assert_eq!(s.warnings.rejected_inputs.last, Some(1));
        assert_eq!(s.warnings.non_finite.last, None);

        s.advance(0.016, &bad_env, &bad_field, &[], &mut NoPuddle);
        assert_eq!(s.warnings.environment.last, Some(1));
        assert_eq!(s.warnings.rejected_inputs.last, Some(1));
    }

    #[test]
    fn gusts_follow_the_noise_track() {
        let mut s = rain(&quiet());
        let offset = gust_offset(EffectConfig::default().seed);
        let mut changes = 0;
        for _ in 0..40 {
            let before = s.gust_target;
            s.advance(0.1, &EnvironmentState::calm(), &InteractionField::empty(), &[], &mut NoPuddle);
            if s.gust_target != before {
                changes += 1;
                assert_eq!(s.gust_target, gust_sample(s.time(), offset));
                assert!((GUST_RANGE.0..=GUST_RANGE.1).contains(&s.gust_target));
            }
        }
        assert!(changes >= 5, "{changes}");
    }

    #[test]
    fn hostile_inputs_do_not_poison_the_pool() {
        let mut s = SimulationStepper::new(EffectKind::Snow, &QualityProfile::energy_saving(), &quiet());
        let env = EnvironmentState {
            wind_speed: f64::INFINITY,
            wind_direction: f64::NAN,
            intensity: -3.0,
            turbulence: f64::NAN,
        };
        let field = InteractionField {
            zones: vec![
                RepulsionZone::new(DVec2::new(0.5, 0.5), -1.0, 1.0),
                RepulsionZone::new(DVec2::new(f64::NAN, 0.5), 0.1, 1.0),
                RepulsionZone::new(DVec2::new(0.5, 0.5), 0.3, f64::INFINITY),
            ],
        };
        let surfaces = [SurfaceRect::new(0.1, 0.1, -0.2, f64::NAN)];
        for _ in 0..100 {
            s.advance(f64::NAN, &env, &field, &surfaces, &mut NoPuddle);
            s.advance(1e9, &env, &field, &surfaces, &mut NoPuddle);
        }
        for p in s.pool().iter() {
            assert!(p.is_finite());
            assert!((0.0..=1.0).contains(&p.opacity));
        }
    }

    #[test]
    fn snapshot_reflects_last_step() {
        let mut s = rain(&quiet());
        s.advance(0.05, &EnvironmentState::calm(), &InteractionField::empty(), &[], &mut NoPuddle);
        let snap = s.snapshot();
        assert_eq!(snap.frame, 1);
        assert_eq!(snap.particles.len(), s.pool().len());
        assert_eq!(snap.report, s.last_report());
        assert!((snap.time - 0.05).abs() < 1e-12);
    }
}
