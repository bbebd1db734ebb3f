// Copyright (c) 2026 rezky_nightky

use glam::DVec2;

use crate::particle::{DepthLayer, Particle, ParticleKind};

/// What the per-particle callback wants done with the slot it was handed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fate {
    Keep,
    Remove,
}

#[derive(Clone, Debug)]
struct Slot {
    is_alive: bool,
    particle: Particle,
}

impl Slot {
    fn dormant() -> Self {
        Self {
            is_alive: false,
            particle: Particle::new(ParticleKind::Rain, DepthLayer::Far, DVec2::ZERO, 1.0),
        }
    }
}

/// Fixed-capacity particle storage.
///
/// Storage is allocated once. Removing a particle only flips its slot to
/// dormant and spawning overwrites a dormant slot in place, so the pool never
/// grows and never reallocates.
#[derive(Clone, Debug)]
pub struct ParticlePool {
    slots: Vec<Slot>,
    live: usize,
    /// Lowest index that might be dormant.
    free_hint: usize,
}

impl ParticlePool {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::dormant);
        Self {
            slots,
            live: 0,
            free_hint: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn is_full(&self) -> bool {
        self.live >= self.slots.len()
    }

    pub fn free_slots(&self) -> usize {
        self.slots.len() - self.live
    }

    /// Places `particle` in a dormant slot. Returns the slot index, or `None`
    /// when the pool is full and the request was dropped.
    pub fn spawn(&mut self, particle: Particle) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let mut idx = self.free_hint;
        while idx < self.slots.len() {
            if !self.slots[idx].is_alive {
                break;
            }
            idx += 1;
        }
        let slot = self.slots.get_mut(idx)?;
        slot.particle = particle;
        slot.is_alive = true;
        self.live += 1;
        self.free_hint = idx + 1;
        Some(idx)
    }

    pub fn remove(&mut self, idx: usize) -> bool {
        match self.slots.get_mut(idx) {
            Some(slot) if slot.is_alive => {
                slot.is_alive = false;
                self.live -= 1;
                self.free_hint = self.free_hint.min(idx);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.is_alive = false;
        }
        self.live = 0;
        self.free_hint = 0;
    }

    pub fn get(&self, idx: usize) -> Option<&Particle> {
        self.slots
            .get(idx)
            .filter(|s| s.is_alive)
            .map(|s| &s.particle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.slots
            .iter()
            .filter(|s| s.is_alive)
            .map(|s| &s.particle)
    }

    pub fn count_kind(&self, kind: ParticleKind) -> usize {
        self.iter().filter(|p| p.kind == kind).count()
    }

    /// Visits every live particle once. Slots the callback removes are
    /// tombstoned immediately and are not revisited in this pass; slots
    /// spawned from outside the callback are only seen by the next pass.
    pub fn for_each_mut<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(usize, &mut Particle) -> Fate,
    {
        let mut removed = 0usize;
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if !slot.is_alive {
                continue;
            }
            if f(idx, &mut slot.particle) == Fate::Remove {
                slot.is_alive = false;
                removed += 1;
                self.free_hint = self.free_hint.min(idx);
            }
        }
        self.live -= removed;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drop_at(y: f64) -> Particle {
        Particle::new(ParticleKind::Rain, DepthLayer::Mid, DVec2::new(0.5, y), 1.0)
    }

    #[test]
    fn spawn_beyond_capacity_is_dropped() {
        let mut pool = ParticlePool::with_capacity(2);
        assert_eq!(pool.spawn(drop_at(0.1)), Some(0));
        assert_eq!(pool.spawn(drop_at(0.2)), Some(1));
        assert_eq!(pool.spawn(drop_at(0.3)), None);
        assert_eq!(pool.len(), 2);
        assert!(pool.is_full());
    }

    #[test]
    fn removed_slot_is_recycled_in_place() {
        let mut pool = ParticlePool::with_capacity(3);
        for i in 0..3 {
            pool.spawn(drop_at(i as f64));
        }
        assert!(pool.remove(1));
        assert!(!pool.remove(1));
        assert_eq!(pool.spawn(drop_at(9.0)), Some(1));
        assert_eq!(pool.get(1).map(|p| p.position.y), Some(9.0));
        assert_eq!(pool.capacity(), 3);
    }

    #[test]
    fn for_each_mut_removes_without_revisiting() {
        let mut pool = ParticlePool::with_capacity(5);
        for i in 0..5 {
            pool.spawn(drop_at(i as f64));
        }
        let mut visits = 0;
        let removed = pool.for_each_mut(|_, p| {
            visits += 1;
            if p.position.y as usize % 2 == 0 {
                Fate::Remove
            } else {
                Fate::Keep
            }
        });
        assert_eq!(visits, 5);
        assert_eq!(removed, 3);
        assert_eq!(pool.len(), 2);

        let mut second = 0;
        pool.for_each_mut(|_, _| {
            second += 1;
            Fate::Keep
        });
        assert_eq!(second, 2);
    }

    #[test]
    fn clear_makes_everything_dormant() {
        let mut pool = ParticlePool::with_capacity(4);
        pool.spawn(drop_at(0.0));
        pool.spawn(drop_at(0.0));
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.free_slots(), 4);
        assert_eq!(pool.iter().count(), 0);
    }
}
