// Copyright (c) 2026 rezky_nightky

//! Drives one stepper per active effect from a host clock and publishes a
//! combined snapshot per frame.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::environment::{EnvironmentState, InteractionField, SurfaceRect};
use crate::error::{Error, Result};
use crate::puddle::Puddle;
use crate::quality::{QualityProfile, QualitySettings, QualityTier};
use crate::snapshot::{EffectSnapshot, FrameSnapshot};
use crate::stepper::{clamp_dt, EffectConfig, EffectKind, SimulationStepper};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeatherMode {
    Clear,
    Cloudy,
    Rain,
    Storm,
    Snow,
    Blizzard,
    Fog,
}

impl WeatherMode {
    pub const ALL: [WeatherMode; 7] = [
        WeatherMode::Clear,
        WeatherMode::Cloudy,
        WeatherMode::Rain,
        WeatherMode::Storm,
        WeatherMode::Snow,
        WeatherMode::Blizzard,
        WeatherMode::Fog,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WeatherMode::Clear => "clear",
            WeatherMode::Cloudy => "cloudy",
            WeatherMode::Rain => "rain",
            WeatherMode::Storm => "storm",
            WeatherMode::Snow => "snow",
            WeatherMode::Blizzard => "blizzard",
            WeatherMode::Fog => "fog",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "clear" | "none" => Ok(WeatherMode::Clear),
            "cloudy" | "clouds" | "cloud" => Ok(WeatherMode::Cloudy),
            "rain" | "rainy" => Ok(WeatherMode::Rain),
            "storm" | "thunderstorm" => Ok(WeatherMode::Storm),
            "snow" | "snowy" => Ok(WeatherMode::Snow),
            "blizzard" => Ok(WeatherMode::Blizzard),
            "fog" | "foggy" | "mist" => Ok(WeatherMode::Fog),
            _ => Err(Error::UnknownMode(name.to_string())),
        }
    }

    pub fn effects(self) -> &'static [EffectKind] {
        match self {
            WeatherMode::Clear => &[],
            WeatherMode::Cloudy | WeatherMode::Fog => &[EffectKind::Cloud],
            WeatherMode::Rain => &[EffectKind::Rain],
            WeatherMode::Storm => &[EffectKind::Cloud, EffectKind::Rain],
            WeatherMode::Snow => &[EffectKind::Snow],
            WeatherMode::Blizzard => &[EffectKind::Cloud, EffectKind::Snow],
        }
    }

    /// Applies the mode's character on top of the host's environment.
    pub fn shape(self, env: &EnvironmentState) -> EnvironmentState {
        let mut out = *env;
        match self {
            WeatherMode::Storm => {
                out.intensity *= 1.6;
                out.wind_speed *= 1.2;
                out.turbulence = out.turbulence.max(0.5);
            }
            WeatherMode::Blizzard => {
                out.wind_speed *= 1.5;
                out.turbulence = out.turbulence.max(0.6);
            }
            WeatherMode::Fog => {
                out.wind_speed *= 0.5;
            }
            _ => {}
        }
        out
    }

    /// Cycles through modes in declaration order.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl FromStr for WeatherMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for WeatherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Measures host frame deltas. Never reports time that passed while the
/// clock was reset, so resuming does not replay a pause.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous tick; `0` on the first tick after a reset.
    pub fn tick(&mut self, now: Instant) -> f64 {
        let dt = self
            .last
            .map(|last| now.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

pub struct EffectOrchestrator {
    mode: WeatherMode,
    tier: QualityTier,
    settings: QualitySettings,
    profile: QualityProfile,
    config: EffectConfig,
    steppers: Vec<SimulationStepper>,
    puddle: Puddle,
    clock: FrameClock,
    paused: bool,
    frame: u64,
    time: f64,
    snapshot: FrameSnapshot,
}

impl EffectOrchestrator {
    pub fn new(
        mode: WeatherMode,
        tier: QualityTier,
        settings: QualitySettings,
        config: EffectConfig,
    ) -> Result<Self> {
        settings.validate()?;
        let profile = tier.profile(&settings);
        let mut orchestrator = Self {
            mode,
            tier,
            settings,
            profile,
            config,
            steppers: Vec::new(),
            puddle: Puddle::new(config.bounds.ground_y),
            clock: FrameClock::new(),
            paused: false,
            frame: 0,
            time: 0.0,
            snapshot: FrameSnapshot::default(),
        };
        orchestrator.rebuild();
        Ok(orchestrator)
    }

    fn rebuild(&mut self) {
        self.steppers = self
            .mode
            .effects()
            .iter()
            .map(|&effect| {
                let salt = EffectKind::ALL
                    .iter()
                    .position(|e| *e == effect)
                    .unwrap_or(0) as u64;
                let config = self
                    .config
                    .with_seed(self.config.seed.wrapping_add(salt.wrapping_mul(0x9E37_79B9)));
                SimulationStepper::new(effect, &self.profile, &config)
            })
            .collect();
        self.snapshot.effects = self
            .steppers
            .iter()
            .map(|s| s.snapshot())
            .collect();
        self.refresh_puddle_view();
        log::info!(
            "weather {} at {} quality: {} particles",
            self.mode,
            self.profile.tier,
            self.snapshot.particle_count()
        );
    }

    pub fn mode(&self) -> WeatherMode {
        self.mode
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn profile(&self) -> &QualityProfile {
        &self.profile
    }

    pub fn steppers(&self) -> &[SimulationStepper] {
        &self.steppers
    }

    pub fn puddle(&self) -> &Puddle {
        &self.puddle
    }

    pub fn snapshot(&self) -> &FrameSnapshot {
        &self.snapshot
    }

    pub fn set_mode(&mut self, mode: WeatherMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.rebuild();
    }

    /// Drains the puddle and refills every pool from scratch.
    pub fn restart(&mut self) {
        self.puddle.reset();
        self.clock.reset();
        self.rebuild();
    }

    /// Re-sizes every pool. A rejected configuration leaves the current one
    /// running.
    pub fn set_quality(&mut self, tier: QualityTier, settings: QualitySettings) -> Result<()> {
        settings.validate()?;
        self.tier = tier;
        self.settings = settings;
        self.profile = tier.profile(&settings);
        self.rebuild();
        Ok(())
    }

    pub fn settings(&self) -> &QualitySettings {
        &self.settings
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.clock.reset();
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Host entry point: measures `dt` from `now` and steps. Returns `None`
    /// while paused, in which case nothing moves.
    pub fn tick(
        &mut self,
        now: Instant,
        env: &EnvironmentState,
        field: &InteractionField,
        surfaces: &[SurfaceRect],
    ) -> Option<&FrameSnapshot> {
        if self.paused {
            return None;
        }
        let dt = self.clock.tick(now);
        Some(self.advance(dt, env, field, surfaces))
    }

    pub fn advance(
        &mut self,
        dt: f64,
        env: &EnvironmentState,
        field: &InteractionField,
        surfaces: &[SurfaceRect],
    ) -> &FrameSnapshot {
        let env = self.mode.shape(env);
        for stepper in &mut self.steppers {
            stepper.advance(dt, &env, field, surfaces, &mut self.puddle);
        }
        let dt = clamp_dt(dt);
        self.puddle.update(dt);
        self.frame += 1;
        self.time += dt;

        if self.snapshot.effects.len() != self.steppers.len() {
            self.snapshot.effects = self
                .steppers
                .iter()
                .map(|s| EffectSnapshot::new(s.effect()))
                .collect();
        }
        for (stepper, out) in self.steppers.iter().zip(self.snapshot.effects.iter_mut()) {
            stepper.snapshot_into(out);
        }
        self.refresh_puddle_view();
        &self.snapshot
    }

    fn refresh_puddle_view(&mut self) {
        self.snapshot.frame = self.frame;
        self.snapshot.time = self.time;
        self.snapshot.ground_y = self.puddle.ground_y();
        self.snapshot.water_level = self.puddle.surface_y();
        self.snapshot.ripples.clear();
        self.snapshot
            .ripples
            .extend_from_slice(self.puddle.ripples());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    fn orchestrator(mode: WeatherMode) -> EffectOrchestrator {
        EffectOrchestrator::new(
            mode,
            QualityTier::EnergySaving,
            QualitySettings::new(30.0, 1000, 1.0),
            EffectConfig::default(),
        )
        .expect("valid settings")
    }

    #[test]
    fn mode_names_round_trip() {
        for mode in WeatherMode::ALL {
            assert_eq!(WeatherMode::from_name(mode.name()), Ok(mode));
        }
        assert_eq!(
            "hail".parse::<WeatherMode>(),
            Err(Error::UnknownMode("hail".to_string()))
        );
        assert_eq!(WeatherMode::Fog.next(), WeatherMode::Clear);
    }

    #[test]
    fn storm_runs_clouds_and_heavier_rain() {
        let o = orchestrator(WeatherMode::Storm);
        let effects: Vec<EffectKind> = o.steppers().iter().map(|s| s.effect()).collect();
        assert_eq!(effects, vec![EffectKind::Cloud, EffectKind::Rain]);
        let env = WeatherMode::Storm.shape(&EnvironmentState::calm());
        assert!((env.intensity - 1.6).abs() < 1e-12);
    }

    #[test]
    fn clear_sky_has_no_particles() {
        let mut o = orchestrator(WeatherMode::Clear);
        let snap = o.advance(0.016, &EnvironmentState::calm(), &InteractionField::empty(), &[]);
        assert_eq!(snap.particle_count(), 0);
    }

    #[test]
    fn paused_tick_does_not_advance() {
        let mut o = orchestrator(WeatherMode::Rain);
        let env = EnvironmentState::calm();
        let field = InteractionField::empty();
        let t0 = Instant::now();
        assert!(o.tick(t0, &env, &field, &[]).is_some());
        o.pause();
        assert!(o.tick(t0 + Duration::from_secs(1), &env, &field, &[]).is_none());
        assert_eq!(o.snapshot().frame, 1);
    }

    #[test]
    fn resume_does_not_replay_the_pause() {
        let mut o = orchestrator(WeatherMode::Snow);
        let env = EnvironmentState::calm();
        let field = InteractionField::empty();
        let t0 = Instant::now();
        o.tick(t0, &env, &field, &[]);
        o.tick(t0 + Duration::from_millis(16), &env, &field, &[]);
        let before = o.snapshot().time;

        o.pause();
        o.resume();
        let snap = o
            .tick(t0 + Duration::from_secs(60), &env, &field, &[])
            .expect("running");
        assert!(snap.time - before <= 0.001 + 1e-12);
    }

    #[test]
    fn mode_switch_rebuilds_pools() {
        let mut o = orchestrator(WeatherMode::Rain);
        o.set_mode(WeatherMode::Blizzard);
        let snap = o.advance(0.016, &EnvironmentState::calm(), &InteractionField::empty(), &[]);
        assert!(snap.effect(EffectKind::Snow).is_some());
        assert!(snap.effect(EffectKind::Rain).is_none());
    }

    #[test]
    fn restart_replays_the_same_opening() {
        let mut o = orchestrator(WeatherMode::Rain);
        let env = EnvironmentState::calm();
        let field = InteractionField::empty();
        let first = o.advance(0.016, &env, &field, &[]).clone();
        let first_depth = o.puddle().depth();
        for _ in 0..30 {
            o.advance(0.016, &env, &field, &[]);
        }
        o.restart();
        let again = o.advance(0.016, &env, &field, &[]);
        assert_eq!(again.effects[0].particles, first.effects[0].particles);
        assert_eq!(o.puddle().depth(), first_depth);
    }

    #[test]
    fn rejected_quality_keeps_current_profile() {
        let mut o = orchestrator(WeatherMode::Rain);
        let before = o.profile().clone();
        let err = o.set_quality(QualityTier::Extreme, QualitySettings::new(60.0, 5, 1.0));
        assert_eq!(err, Err(Error::InvalidBudget(5)));
        assert_eq!(o.profile(), &before);
    }
}
