// Copyright (c) 2026 rezky_nightky

//! Stateless value noise.
//!
//! Lattice corners are hashed with the classic `fract(sin(dot(p, k)) * c)`
//! trick and blended with a `3t² - 2t³` fade. Every function here is a pure
//! function of its inputs: no tables, no allocation, no RNG.

use glam::DVec2;

const HASH_KEY: DVec2 = DVec2::new(127.1, 311.7);
const HASH_SCALE: f64 = 43_758.545_312_3;

#[inline]
pub fn fract(v: f64) -> f64 {
    v - v.floor()
}

#[inline]
pub fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn mix(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Hash of a lattice point, in `[0, 1)`.
#[inline]
pub fn hash(p: DVec2) -> f64 {
    let h = fract((p.dot(HASH_KEY)).sin() * HASH_SCALE);
    // fract() can round up to exactly 1.0 for tiny negative products.
    if h.is_finite() && h < 1.0 {
        h
    } else {
        0.0
    }
}

pub fn value2d(p: DVec2) -> f64 {
    if !p.is_finite() {
        return 0.0;
    }

    let i = p.floor();
    let f = p - i;

    let a = hash(i);
    let b = hash(i + DVec2::X);
    let c = hash(i + DVec2::Y);
    let d = hash(i + DVec2::ONE);

    let ux = smoothstep(f.x);
    let uy = smoothstep(f.y);

    let v = mix(mix(a, b, ux), mix(c, d, ux), uy);
    v.clamp(0.0, 1.0 - f64::EPSILON)
}

#[inline]
pub fn value(x: f64, y: f64) -> f64 {
    value2d(DVec2::new(x, y))
}

/// Fractal sum of `octaves` value-noise layers, renormalised to `[0, 1)`.
pub fn fbm(p: DVec2, octaves: u32) -> f64 {
    let octaves = octaves.clamp(1, 8);
    let mut sum = 0.0;
    let mut norm = 0.0;
    let mut amp = 0.5;
    let mut q = p;
    for _ in 0..octaves {
        sum += value2d(q) * amp;
        norm += amp;
        amp *= 0.5;
        q = q * 2.0 + DVec2::new(17.3, -9.1);
    }
    (sum / norm).clamp(0.0, 1.0 - f64::EPSILON)
}

/// Signed variant centred on zero, in `[-1, 1)`.
#[inline]
pub fn signed(p: DVec2) -> f64 {
    value2d(p) * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_is_deterministic() {
        let a = value(3.25, -7.5);
        let b = value(3.25, -7.5);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn value_stays_in_unit_range() {
        for i in 0..2000 {
            let x = (i as f64) * 0.173 - 150.0;
            let y = (i as f64) * -0.311 + 42.0;
            let v = value(x, y);
            assert!((0.0..1.0).contains(&v), "value({x}, {y}) = {v}");
        }
    }

    #[test]
    fn value_matches_corner_hash_on_lattice_points() {
        let p = DVec2::new(4.0, 9.0);
        assert!((value2d(p) - hash(p)).abs() < 1e-12);
    }

    #[test]
    fn value_is_continuous_across_cells() {
        let left = value(2.0 - 1e-9, 0.5);
        let right = value(2.0 + 1e-9, 0.5);
        assert!((left - right).abs() < 1e-6);
    }

    #[test]
    fn non_finite_input_is_neutral() {
        assert_eq!(value(f64::NAN, 1.0), 0.0);
        assert_eq!(value(1.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn fbm_stays_in_unit_range() {
        for i in 0..500 {
            let p = DVec2::new(i as f64 * 0.07, i as f64 * 0.13);
            let v = fbm(p, 4);
            assert!((0.0..1.0).contains(&v));
        }
    }
}
