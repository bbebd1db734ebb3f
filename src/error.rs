// Copyright (c) 2026 rezky_nightky

//! Errors for the configuration surface. The per-frame step itself cannot
//! fail; it clamps whatever it is given.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("unknown quality tier: {0} (expected extreme, balanced, energy-saving or adaptive)")]
    UnknownTier(String),

    #[error("unknown weather mode: {0}")]
    UnknownMode(String),

    #[error("invalid particle budget: {0} (must be at least {min})", min = crate::quality::MIN_PARTICLE_BUDGET)]
    InvalidBudget(usize),

    #[error("invalid {name}: {value} (min {min} max {max})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
