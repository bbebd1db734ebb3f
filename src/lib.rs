// Copyright (c) 2026 rezky_nightky

//! Per-frame particle simulation for rain, snow and cloud overlays.
//!
//! Scene coordinates are normalized: `x` runs `0..1` left to right and `y`
//! runs `0..1` top to bottom. An [`EffectOrchestrator`] owns one
//! [`SimulationStepper`] per active effect; each call to `advance` mutates
//! the pools in place and republishes a [`FrameSnapshot`] for the renderer.

pub mod environment;
pub mod error;
pub mod force;
pub mod lifecycle;
pub mod noise;
pub mod orchestrator;
pub mod particle;
pub mod pool;
pub mod puddle;
pub mod quality;
pub mod snapshot;
pub mod spawn;
pub mod stepper;
pub mod ticker;

pub use environment::{EnvironmentState, InteractionField, RepulsionZone, SurfaceRect};
pub use error::{Error, Result};
pub use lifecycle::SceneBounds;
pub use orchestrator::{EffectOrchestrator, FrameClock, WeatherMode};
pub use particle::{Anchor, DepthLayer, DropletPhase, Particle, ParticleKind, Shape};
pub use pool::ParticlePool;
pub use puddle::{Puddle, PuddleSink};
pub use quality::{QualityProfile, QualitySettings, QualityTier};
pub use snapshot::{EffectSnapshot, FrameSnapshot, ParticleView};
pub use stepper::{EffectConfig, EffectKind, SimulationStepper, StepReport};
