// Copyright (c) 2026 rezky_nightky

use glam::DVec2;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use overcast::force::{disperse_factor, terminal_velocity, MIN_DISPERSE_FACTOR};
use overcast::lifecycle::{step_droplet, DropletContext, DropletFate};
use overcast::particle::Droplet;
use overcast::puddle::NoPuddle;
use overcast::{
    Anchor, DepthLayer, DropletPhase, EffectConfig, EffectKind, EffectOrchestrator,
    EnvironmentState, InteractionField, Particle, ParticleKind, QualityProfile, QualitySettings,
    QualityTier, RepulsionZone, SceneBounds, SimulationStepper, SurfaceRect, WeatherMode,
};

fn quiet() -> EffectConfig {
    EffectConfig {
        stick_to_surfaces: false,
        condensation: false,
        ..EffectConfig::default()
    }
}

fn hundred_drops() -> QualityProfile {
    let mut profile = QualityProfile::energy_saving();
    profile.rain_counts = [34, 33, 33];
    profile.droplet_budget = 0;
    profile
}

#[test]
fn calm_rain_settles_at_terminal_speed() {
    let mut s = SimulationStepper::new(EffectKind::Rain, &hundred_drops(), &quiet());
    assert_eq!(s.pool().len(), 100);

    let env = EnvironmentState::calm();
    let field = InteractionField::empty();
    let terminal = terminal_velocity(ParticleKind::Rain, env.intensity);

    let mut floor_respawns = 0;
    let mut settled_speed = 0.0;
    let mut settled = 0usize;
    for frame in 0..300 {
        let report = s.advance(0.016, &env, &field, &[], &mut NoPuddle);
        floor_respawns += report.floor_respawns;
        for p in s.pool().iter() {
            assert!(p.position.is_finite());
            assert!(p.velocity.y <= terminal + 1e-12);
            // The initial fill starts with arbitrary ages, so let it cycle once.
            if frame >= 60 && p.age > 1.0 {
                settled_speed += p.velocity.y;
                settled += 1;
            }
        }
    }

    assert!(floor_respawns >= 1);
    assert!(settled > 0);
    let mean = settled_speed / settled as f64;
    assert!(mean > 0.95 * terminal, "mean {mean} terminal {terminal}");
}

#[test]
fn wall_drop_slides_after_a_tenth_of_its_life_then_falls() {
    let surfaces = [SurfaceRect::new(0.25, 0.4, 0.3, 0.08)];
    let bounds = SceneBounds::default();
    let mut sink = NoPuddle;
    let mut p = Particle::new(ParticleKind::WallDrop, DepthLayer::Near, DVec2::ZERO, 1.0)
        .with_opacity(0.9)
        .with_lifetime(10.0)
        .with_droplet(Droplet::accumulating(
            Anchor::Surface(0),
            DVec2::new(0.15, 0.0),
            0.2,
        ));

    let mut step = |p: &mut Particle| {
        let mut ctx = DropletContext {
            dt: 0.1,
            time: p.age,
            surfaces: &surfaces,
            bounds: &bounds,
            puddle: &mut sink,
        };
        step_droplet(p, &mut ctx)
    };

    for _ in 0..9 {
        assert_eq!(step(&mut p), DropletFate::Keep);
        assert_eq!(p.droplet_phase(), Some(DropletPhase::Accumulating));
    }
    step(&mut p);
    assert_eq!(p.droplet_phase(), Some(DropletPhase::Sliding));

    let mut guard = 0;
    while p.droplet_phase() == Some(DropletPhase::Sliding) {
        assert_eq!(step(&mut p), DropletFate::Keep);
        guard += 1;
        assert!(guard < 50);
    }
    let d = p.droplet.expect("droplet state");
    assert_eq!(d.phase, DropletPhase::Falling);
    assert_eq!(d.anchor, Anchor::Free);
    assert_eq!(d.anchor.surface_index(), None);
}

#[test]
fn zone_centred_on_a_particle_disperses_it_fully() {
    let pos = DVec2::new(0.42, 0.37);
    let field = InteractionField::single(RepulsionZone::new(pos, 100.0, 1.0));
    assert!((disperse_factor(pos, &field) - 0.1).abs() < 1e-12);
    assert_eq!(MIN_DISPERSE_FACTOR, 1.0 - 1.0 * 0.9);

    let mut s = SimulationStepper::new(EffectKind::Cloud, &QualityProfile::energy_saving(), &quiet());
    s.advance(0.016, &EnvironmentState::calm(), &field, &[], &mut NoPuddle);
    for p in s.pool().iter() {
        // Every particle sits well inside the zone, so the falloff is ~1.
        assert!((p.disperse - 0.1).abs() < 1e-3, "{}", p.disperse);
        assert!(p.opacity <= p.base_opacity * 0.1 + 1e-3);
    }
}

#[test]
fn orchestrated_storm_keeps_pools_bounded() {
    let mut o = EffectOrchestrator::new(
        WeatherMode::Storm,
        QualityTier::Adaptive,
        QualitySettings::new(45.0, 1500, 0.75),
        EffectConfig::default(),
    )
    .expect("valid settings");
    let env = EnvironmentState::calm().with_wind(1.5, 0.2).with_turbulence(0.4);
    let surfaces = [
        SurfaceRect::new(0.1, 0.3, 0.35, 0.2),
        SurfaceRect::new(0.55, 0.45, 0.3, 0.25),
    ];
    let mut field = InteractionField::empty();
    for i in 0..240 {
        field.clear();
        field.push(RepulsionZone::new(
            DVec2::new((i as f64 * 0.01) % 1.0, 0.5),
            0.12,
            1.0,
        ));
        let snap = o.advance(1.0 / 60.0, &env, &field, &surfaces);
        for effect in &snap.effects {
            assert!(effect.particles.len() <= effect.capacity);
        }
        assert!(snap.ripples.len() <= overcast::puddle::MAX_RIPPLES);
    }
    let rain = o.snapshot().effect(EffectKind::Rain).expect("storm has rain");
    assert!(rain.count(ParticleKind::Rain) > 0);
}

fn effect_strategy() -> impl Strategy<Value = EffectKind> {
    prop_oneof![
        Just(EffectKind::Rain),
        Just(EffectKind::Snow),
        Just(EffectKind::Cloud),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn particles_stay_sane_under_any_input(
        seed in any::<u64>(),
        effect in effect_strategy(),
        wind in -50.0f64..50.0,
        direction in -10.0f64..10.0,
        intensity in -2.0f64..8.0,
        turbulence in -1.0f64..3.0,
        radius in -0.3f64..0.6,
        strength in -1.0f64..3.0,
        dts in prop::collection::vec(-0.1f64..0.5, 1..80),
    ) {
        let config = EffectConfig { seed, ..EffectConfig::default() };
        let mut s = SimulationStepper::new(effect, &QualityProfile::energy_saving(), &config);
        let env = EnvironmentState {
            wind_speed: wind,
            wind_direction: direction,
            intensity,
            turbulence,
        };
        let field = InteractionField::single(RepulsionZone::new(DVec2::new(0.5, 0.5), radius, strength));
        let surfaces = [SurfaceRect::new(0.2, 0.5, 0.6, 0.2)];
        let mut puddle = overcast::Puddle::new(1.0);

        for dt in dts {
            s.advance(dt, &env, &field, &surfaces, &mut puddle);
            prop_assert!(s.pool().len() <= s.capacity());
            for p in s.pool().iter() {
                prop_assert!((0.0..=1.0).contains(&p.opacity));
                prop_assert!(p.mass() > 0.0);
                prop_assert!(p.position.is_finite());
                prop_assert!(p.velocity.is_finite());
            }
        }
    }

    #[test]
    fn droplet_phase_never_moves_backwards(
        slide_speed in 0.0f64..0.5,
        max_age in 0.5f64..30.0,
        dts in prop::collection::vec(0.001f64..0.1, 1..200),
    ) {
        let surfaces = [SurfaceRect::new(0.3, 0.2, 0.2, 0.1), SurfaceRect::new(0.2, 0.3, 0.4, 0.2)];
        let bounds = SceneBounds::default();
        let mut sink = NoPuddle;
        let mut p = Particle::new(ParticleKind::WallDrop, DepthLayer::Near, DVec2::ZERO, 1.0)
            .with_opacity(1.0)
            .with_lifetime(max_age)
            .with_droplet(Droplet::accumulating(Anchor::Surface(0), DVec2::new(0.1, 0.0), slide_speed));
        let mut last = DropletPhase::Accumulating;
        for dt in dts {
            let mut ctx = DropletContext { dt, time: p.age, surfaces: &surfaces, bounds: &bounds, puddle: &mut sink };
            if step_droplet(&mut p, &mut ctx) != DropletFate::Keep {
                break;
            }
            let phase = p.droplet_phase().unwrap_or(last);
            prop_assert!(phase >= last);
            prop_assert!(p.droplet.map_or(true, |d| d.deformation >= 1.0 && (0.0..=1.0).contains(&d.slide_progress)));
            last = phase;
        }
    }
}
