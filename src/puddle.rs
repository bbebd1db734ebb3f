// Copyright (c) 2026 rezky_nightky

//! Side channel for water reaching the ground.
//!
//! The stepper only emits events through [`PuddleSink`]; how many ripples
//! are alive at once and how deep the water gets is the sink's business.

pub const MAX_RIPPLES: usize = 24;
pub const RIPPLE_LIFETIME: f64 = 1.2;
pub const RIPPLE_GROWTH: f64 = 0.08;
pub const MAX_DEPTH: f64 = 0.06;
pub const EVAPORATION_RATE: f64 = 0.0015;

pub trait PuddleSink {
    fn add_ripple(&mut self, x: f64, ground_y: f64);
    fn add_water(&mut self, amount: f64);

    /// Current water surface, in scene y. `None` means "use the ground line".
    fn water_level(&self) -> Option<f64> {
        None
    }
}

/// Sink for effects with no ground interaction.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPuddle;

impl PuddleSink for NoPuddle {
    fn add_ripple(&mut self, _x: f64, _ground_y: f64) {}
    fn add_water(&mut self, _amount: f64) {}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PuddleEvent {
    Ripple { x: f64, ground_y: f64 },
    Water(f64),
}

/// Records events verbatim; handy for hosts that batch them elsewhere.
impl PuddleSink for Vec<PuddleEvent> {
    fn add_ripple(&mut self, x: f64, ground_y: f64) {
        self.push(PuddleEvent::Ripple { x, ground_y });
    }

    fn add_water(&mut self, amount: f64) {
        self.push(PuddleEvent::Water(amount));
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ripple {
    pub x: f64,
    pub y: f64,
    pub age: f64,
    pub radius: f64,
}

impl Ripple {
    pub fn strength(&self) -> f64 {
        (1.0 - self.age / RIPPLE_LIFETIME).clamp(0.0, 1.0)
    }
}

/// Reference accumulator: a shallow pool along the ground line.
#[derive(Clone, Debug)]
pub struct Puddle {
    ground_y: f64,
    depth: f64,
    ripples: Vec<Ripple>,
    ripples_dropped: u64,
}

impl Puddle {
    pub fn new(ground_y: f64) -> Self {
        Self {
            ground_y,
            depth: 0.0,
            ripples: Vec::with_capacity(MAX_RIPPLES),
            ripples_dropped: 0,
        }
    }

    pub fn ground_y(&self) -> f64 {
        self.ground_y
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    pub fn surface_y(&self) -> f64 {
        self.ground_y - self.depth
    }

    pub fn ripples(&self) -> &[Ripple] {
        &self.ripples
    }

    pub fn ripples_dropped(&self) -> u64 {
        self.ripples_dropped
    }

    pub fn update(&mut self, dt: f64) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        self.depth = (self.depth - EVAPORATION_RATE * dt).max(0.0);
        for r in &mut self.ripples {
            r.age += dt;
            r.radius += RIPPLE_GROWTH * dt;
        }
        self.ripples.retain(|r| r.age < RIPPLE_LIFETIME);
    }

    pub fn reset(&mut self) {
        self.depth = 0.0;
        self.ripples.clear();
    }
}

impl PuddleSink for Puddle {
    fn add_ripple(&mut self, x: f64, ground_y: f64) {
        if !x.is_finite() || !ground_y.is_finite() {
            return;
        }
        if self.ripples.len() >= MAX_RIPPLES {
            self.ripples_dropped += 1;
            return;
        }
        self.ripples.push(Ripple {
            x,
            y: ground_y,
            age: 0.0,
            radius: 0.0,
        });
    }

    fn add_water(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.depth = (self.depth + amount).min(MAX_DEPTH);
        }
    }

    fn water_level(&self) -> Option<f64> {
        Some(self.surface_y())
    }
}
