//! Seeded 2D value noise.
//!
//! Lattice points get a pseudo-random value from a hash of their integer
//! coordinates and the seed; values between lattice points are smoothly
//! interpolated. Summing octaves gives fractal noise in `[0, 1)`.

// Lattice coordinates are small and always converted through f64.
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

/// Smooth, continuous noise field parameterised by a seed.
#[derive(Debug, Clone, Copy)]
pub struct ValueNoise {
    seed: u64,
    octaves: u32,
    frequency: f64,
    persistence: f64,
}

impl ValueNoise {
    /// Create a field with `octaves` layers and a base `frequency` in cycles per tile.
    #[must_use]
    pub const fn new(seed: u64, octaves: u32, frequency: f64) -> Self {
        Self {
            seed,
            octaves,
            frequency,
            persistence: 0.5,
        }
    }

    /// Fractal noise at `(x, y)`, normalised to `[0, 1)`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut norm = 0.0;
        let mut frequency = self.frequency;
        for octave in 0..self.octaves.max(1) {
            let seed = self.seed.wrapping_add(u64::from(octave).wrapping_mul(0x9E37_79B9));
            total += amplitude * smooth_value(seed, x * frequency, y * frequency);
            norm += amplitude;
            amplitude *= self.persistence;
            frequency *= 2.0;
        }
        total / norm
    }
}

fn smooth_value(seed: u64, x: f64, y: f64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let tx = fade(x - x0);
    let ty = fade(y - y0);
    let (ix, iy) = (x0 as i64, y0 as i64);

    let v00 = lattice(seed, ix, iy);
    let v10 = lattice(seed, ix + 1, iy);
    let v01 = lattice(seed, ix, iy + 1);
    let v11 = lattice(seed, ix + 1, iy + 1);

    let top = lerp(v00, v10, tx);
    let bottom = lerp(v01, v11, tx);
    lerp(top, bottom, ty)
}

/// Quintic fade curve: continuous first and second derivatives.
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Value in `[0, 1)` for an integer lattice point.
fn lattice(seed: u64, x: i64, y: i64) -> f64 {
    #[allow(clippy::cast_sign_loss)]
    let mut h = seed ^ (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    // splitmix64 finaliser
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    (h >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_is_deterministic() {
        let a = ValueNoise::new(42, 4, 0.05);
        let b = ValueNoise::new(42, 4, 0.05);
        for i in 0..50 {
            let (x, y) = (f64::from(i) * 1.7, f64::from(i) * 0.3);
            assert!((a.sample(x, y) - b.sample(x, y)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_noise_range() {
        let noise = ValueNoise::new(7, 5, 0.02);
        for y in 0..64 {
            for x in 0..64 {
                let v = noise.sample(f64::from(x), f64::from(y));
                assert!((0.0..1.0).contains(&v), "out of range: {v}");
            }
        }
    }

    #[test]
    fn test_noise_is_smooth() {
        let noise = ValueNoise::new(3, 1, 0.05);
        let a = noise.sample(10.0, 10.0);
        let b = noise.sample(10.01, 10.0);
        assert!((a - b).abs() < 0.01);
    }

    #[test]
    fn test_seeds_differ() {
        let a = ValueNoise::new(1, 3, 0.05);
        let b = ValueNoise::new(2, 3, 0.05);
        let differs = (0..20).any(|i| {
            let x = f64::from(i) * 3.1;
            (a.sample(x, x) - b.sample(x, x)).abs() > 1e-6
        });
        assert!(differs);
    }
}
