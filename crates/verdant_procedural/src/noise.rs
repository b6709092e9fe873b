//! # Noise Field
//!
//! Deterministic coherent-noise primitives and the two world samplers built
//! on top of them:
//!
//! - **Height**: a multi-octave composite of simplex and Perlin noise,
//!   divided by a cellular distance to add texture variance.
//! - **River mask**: a thresholded `sin(cellular - fbm)` field over
//!   domain-warped coordinates, producing narrow water courses.
//!
//! ## Determinism Guarantee
//!
//! Every primitive is seeded from the `WorldSeed` through `WorldSeed::derive`,
//! and both samplers are pure functions of the world coordinate. The field
//! holds no mutable state, so it can be shared across the per-chunk worker
//! threads.

use crate::config::{NoiseConfig, RiverConfig};
use crate::error::{WorldGenError, WorldGenResult};
use crate::random::SpawnRng;

/// Divisor applied to `2 * maxPossibleHeight` when normalising heights.
pub const NORMALIZATION_SPREAD: f64 = 2.75;

/// Seed offsets are drawn uniformly from `[-SEED_OFFSET_RANGE, SEED_OFFSET_RANGE)`.
pub const SEED_OFFSET_RANGE: i32 = 10_000;

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Hashes a textual seed (the form players type in) with FNV-1a.
    #[must_use]
    pub fn from_phrase(phrase: &str) -> Self {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in phrase.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Self(hash)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., river noise).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// Pre-computed permutation table shared by every noise primitive.
///
/// This is computed once from the seed and reused.
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
}

impl PermutationTable {
    /// 12 gradient vectors for 2D noise.
    const GRADIENTS: [[i8; 2]; 12] = [
        [1, 0], [1, 1], [0, 1], [-1, 1],
        [-1, 0], [-1, -1], [0, -1], [1, -1],
        [1, 0], [0, 1], [-1, 0], [0, -1],
    ];

    /// Creates a new permutation table from a seed.
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];

        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates shuffle driven by xorshift64
        let mut rng_state = seed.value() | 1;
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = (rng_state as usize) % (i + 1);
            perm.swap(i, j);
        }

        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        Self { perm }
    }

    /// Gets a permutation value (with automatic wrapping).
    #[inline]
    fn get(&self, index: usize) -> u8 {
        self.perm[index & 511]
    }

    /// Hashes an integer lattice point.
    #[inline]
    fn hash2(&self, i: i32, j: i32) -> u8 {
        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        self.get(ii + self.get(jj) as usize)
    }

    /// Dot product of the hashed gradient with `(x, y)`.
    #[inline]
    fn gradient_dot(hash: u8, x: f64, y: f64) -> f64 {
        let grad = Self::GRADIENTS[(hash % 12) as usize];
        x * f64::from(grad[0]) + y * f64::from(grad[1])
    }
}

/// 2D Simplex noise generator.
///
/// Produces smooth, continuous noise values in the range [-1, 1].
pub struct SimplexNoise {
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for 2D simplex grid.
    const F2: f64 = 0.366_025_403_784_439; // (sqrt(3) - 1) / 2
    /// Unskewing factor for 2D simplex grid.
    const G2: f64 = 0.211_324_865_405_187; // (3 - sqrt(3)) / 6

    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 2D simplex noise at the given coordinates.
    ///
    /// # Returns
    ///
    /// A value in the range [-1, 1].
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        // Skew input coordinates to simplex grid
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        let unskew = f64::from(i.wrapping_add(j)) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Upper or lower triangle
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + Self::G2;
        let y1 = y0 - f64::from(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let gi0 = self.perm_table.hash2(i, j);
        let gi1 = self.perm_table.hash2(i.wrapping_add(i1), j.wrapping_add(j1));
        let gi2 = self.perm_table.hash2(i.wrapping_add(1), j.wrapping_add(1));

        let n0 = Self::contribution(x0, y0, gi0);
        let n1 = Self::contribution(x1, y1, gi1);
        let n2 = Self::contribution(x2, y2, gi2);

        // 70.0 normalises the sum to [-1, 1]
        70.0 * (n0 + n1 + n2)
    }

    /// Calculates the contribution from one corner of the simplex.
    #[inline]
    fn contribution(x: f64, y: f64, gradient_index: u8) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            0.0
        } else {
            let t2 = t * t;
            t2 * t2 * PermutationTable::gradient_dot(gradient_index, x, y)
        }
    }
}

/// Classic 2D gradient (Perlin) noise.
///
/// Output is roughly within [-1, 1] and exactly 0 on lattice points.
pub struct PerlinNoise {
    perm_table: PermutationTable,
}

impl PerlinNoise {
    /// Creates a new Perlin noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples Perlin noise at the given coordinates.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let xi = fast_floor(x);
        let yi = fast_floor(y);
        let xf = x - f64::from(xi);
        let yf = y - f64::from(yi);

        let u = fade(xf);
        let v = fade(yf);

        let aa = self.perm_table.hash2(xi, yi);
        let ba = self.perm_table.hash2(xi.wrapping_add(1), yi);
        let ab = self.perm_table.hash2(xi, yi.wrapping_add(1));
        let bb = self.perm_table.hash2(xi.wrapping_add(1), yi.wrapping_add(1));

        let bottom = lerp(
            PermutationTable::gradient_dot(aa, xf, yf),
            PermutationTable::gradient_dot(ba, xf - 1.0, yf),
            u,
        );
        let top = lerp(
            PermutationTable::gradient_dot(ab, xf, yf - 1.0),
            PermutationTable::gradient_dot(bb, xf - 1.0, yf - 1.0),
            u,
        );
        lerp(bottom, top, v)
    }

    /// Fractal Brownian motion over this noise.
    ///
    /// Combines `octaves` layers, each `lacunarity` times the frequency and
    /// `gain` times the amplitude of the last, and rescales the sum by the
    /// total amplitude so the result stays roughly within [-1, 1].
    #[must_use]
    pub fn fractal(&self, x: f64, y: f64, octaves: u32, lacunarity: f64, gain: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= gain;
            frequency *= lacunarity;
        }

        if max_amplitude > 0.0 {
            total / max_amplitude
        } else {
            0.0
        }
    }
}

/// 2D cellular (Worley) noise with one jittered feature point per lattice cell.
pub struct CellularNoise {
    perm_table: PermutationTable,
}

impl CellularNoise {
    /// Creates a new cellular noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Returns the Euclidean distances to the nearest and second-nearest
    /// feature points, `(f1, f2)`, with `f1 <= f2`.
    #[must_use]
    pub fn distances(&self, x: f64, y: f64) -> (f64, f64) {
        let xi = fast_floor(x);
        let yi = fast_floor(y);
        let mut f1 = f64::MAX;
        let mut f2 = f64::MAX;

        for dy in -1..=1 {
            for dx in -1..=1 {
                let cx = xi.wrapping_add(dx);
                let cy = yi.wrapping_add(dy);
                let h = self.perm_table.hash2(cx, cy);
                let h2 = self.perm_table.get(h as usize + 101);

                let px = f64::from(cx) + f64::from(h) / 255.0;
                let py = f64::from(cy) + f64::from(h2) / 255.0;
                let d = ((px - x) * (px - x) + (py - y) * (py - y)).sqrt();

                if d < f1 {
                    f2 = f1;
                    f1 = d;
                } else if d < f2 {
                    f2 = d;
                }
            }
        }

        (f1, f2)
    }
}

/// Integer offsets added to every sampled world coordinate.
///
/// Drawn from the world sequence before any chunk exists, so the same seed
/// always lands on the same region of noise space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoiseOffsets {
    /// X offset.
    pub x: i32,
    /// Y offset.
    pub y: i32,
}

impl NoiseOffsets {
    /// Draws both offsets from the world sequence (x first, then y).
    pub fn draw<R: SpawnRng + ?Sized>(rng: &mut R) -> Self {
        let x = rng.range(-SEED_OFFSET_RANGE, SEED_OFFSET_RANGE);
        let y = rng.range(-SEED_OFFSET_RANGE, SEED_OFFSET_RANGE);
        Self { x, y }
    }
}

/// River mask of a cell and its eight neighbours.
///
/// Bit `i` corresponds to `RiverMask::OFFSETS[i]`; a set bit means the
/// river sampler returned 1 there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RiverMask {
    bits: u16,
}

impl RiverMask {
    /// Sample offsets, centre first.
    pub const OFFSETS: [(i32, i32); 9] = [
        (0, 0),
        (0, -1),
        (0, 1),
        (-1, 0),
        (1, 0),
        (1, 1),
        (-1, 1),
        (1, -1),
        (-1, -1),
    ];

    /// A neighbourhood without any river.
    pub const CLEAR: Self = Self { bits: 0 };

    /// Builds a mask from the nine sampled values (non-zero means river).
    #[must_use]
    pub fn from_samples(samples: [u8; 9]) -> Self {
        let mut bits = 0u16;
        for (i, sample) in samples.iter().enumerate() {
            if *sample != 0 {
                bits |= 1 << i;
            }
        }
        Self { bits }
    }

    /// Returns a copy with the sample at `index` marked as river.
    #[must_use]
    pub const fn with(self, index: usize) -> Self {
        Self {
            bits: self.bits | (1 << index),
        }
    }

    /// True if the sample at `index` is river.
    #[must_use]
    pub const fn is_set(self, index: usize) -> bool {
        index < 9 && self.bits & (1 << index) != 0
    }

    /// True when neither the cell nor any neighbour is river; only such cells
    /// are eligible for land tiles.
    #[must_use]
    pub const fn is_clear(self) -> bool {
        self.bits == 0
    }
}

/// Height and river samplers for one world.
pub struct NoiseField {
    noise: NoiseConfig,
    river: RiverConfig,
    offsets: NoiseOffsets,
    max_possible_height: f64,
    simplex: SimplexNoise,
    perlin: PerlinNoise,
    cells: CellularNoise,
    river_cells: CellularNoise,
    river_fbm: PerlinNoise,
    warp_x: PerlinNoise,
    warp_y: PerlinNoise,
}

impl NoiseField {
    /// Builds the field for a seed.
    ///
    /// # Errors
    ///
    /// Rejects noise settings whose amplitude series cannot be normalised.
    pub fn new(
        seed: WorldSeed,
        noise: &NoiseConfig,
        river: &RiverConfig,
        offsets: NoiseOffsets,
    ) -> WorldGenResult<Self> {
        noise.validate()?;
        let max_possible_height = noise.max_possible_height();
        if !(max_possible_height.is_finite() && max_possible_height > 0.0) {
            return Err(WorldGenError::DegenerateNormalization {
                max_possible_height: max_possible_height.to_string(),
            });
        }

        Ok(Self {
            noise: noise.clone(),
            river: river.clone(),
            offsets,
            max_possible_height,
            simplex: SimplexNoise::new(seed.derive(1)),
            perlin: PerlinNoise::new(seed.derive(2)),
            cells: CellularNoise::new(seed.derive(3)),
            river_cells: CellularNoise::new(seed.derive(4)),
            river_fbm: PerlinNoise::new(seed.derive(5)),
            warp_x: PerlinNoise::new(seed.derive(6)),
            warp_y: PerlinNoise::new(seed.derive(7)),
        })
    }

    /// Offsets applied to every sample.
    #[must_use]
    pub const fn offsets(&self) -> NoiseOffsets {
        self.offsets
    }

    /// Sum of the per-octave amplitudes; the normalisation reference.
    #[must_use]
    pub const fn max_possible_height(&self) -> f64 {
        self.max_possible_height
    }

    /// Accumulated octave value at a world cell, before normalisation.
    #[must_use]
    pub fn raw_height(&self, world_x: i32, world_y: i32) -> f64 {
        let ox = f64::from(self.offsets.x);
        let oy = f64::from(self.offsets.y);
        let cx = f64::from(world_x) + ox;
        let cy = f64::from(world_y) + oy;

        let mut amplitude = self.noise.base_amplitude;
        let mut frequency = 1.0;
        let mut noise_height = 0.0;

        for _ in 0..self.noise.octaves {
            let px = cx / self.noise.scale * frequency + ox;
            let py = cy / self.noise.scale * frequency + oy;

            let mut value = self.simplex.sample(px, py) * self.perlin.sample(px, py);
            value /= self.cells.distances(px, py).0.max(f64::EPSILON);
            noise_height += value * amplitude;

            amplitude *= self.noise.persistence;
            frequency *= self.noise.lacunarity;
        }

        noise_height
    }

    /// Maps a raw octave sum onto the world's height scale.
    ///
    /// The result is deliberately unclamped; the generation job applies the
    /// lower bound.
    #[must_use]
    pub fn normalize(&self, raw: f64) -> f64 {
        (raw + 1.0) / (2.0 * self.max_possible_height / NORMALIZATION_SPREAD)
    }

    /// Normalised (but unclamped) height at a world cell.
    #[must_use]
    pub fn sample_height(&self, world_x: i32, world_y: i32) -> f64 {
        self.normalize(self.raw_height(world_x, world_y))
    }

    /// River mask at a world cell: 1 inside a water course, 0 elsewhere.
    #[must_use]
    pub fn sample_river_mask(&self, world_x: i32, world_y: i32) -> u8 {
        let x = f64::from(world_x.saturating_add(self.offsets.x));
        let y = f64::from(world_y.saturating_add(self.offsets.y));
        let cfg = &self.river;

        let (px, py) = self.perturb(x / cfg.coordinate_divisor, y / cfg.coordinate_divisor);
        let (f1, f2) = self.river_cells.distances(px * cfg.frequency, py * cfg.frequency);
        let cellular = if f2 > 0.0 { f1 / f2 } else { 0.0 };
        let fbm = self.river_fbm.fractal(
            x * cfg.frequency,
            y * cfg.frequency,
            cfg.octaves,
            cfg.lacunarity,
            cfg.gain,
        );

        let p = (cellular - fbm).sin();
        u8::from(p > cfg.threshold)
    }

    /// Samples the river mask at a cell and its eight neighbours.
    #[must_use]
    pub fn river_neighborhood(&self, world_x: i32, world_y: i32) -> RiverMask {
        let mut samples = [0u8; 9];
        for (slot, (dx, dy)) in samples.iter_mut().zip(RiverMask::OFFSETS) {
            *slot = self.sample_river_mask(world_x.saturating_add(dx), world_y.saturating_add(dy));
        }
        RiverMask::from_samples(samples)
    }

    /// Fractal domain warp applied to river coordinates.
    fn perturb(&self, mut x: f64, mut y: f64) -> (f64, f64) {
        let cfg = &self.river;
        let mut bounding = 0.0;
        let mut gain = 1.0;
        for _ in 0..cfg.octaves {
            bounding += gain;
            gain *= cfg.gain;
        }
        if bounding <= 0.0 {
            return (x, y);
        }

        let mut amplitude = cfg.perturb_amplitude / bounding;
        let mut frequency = cfg.frequency;
        for _ in 0..cfg.octaves {
            let dx = self.warp_x.sample(x * frequency, y * frequency);
            let dy = self.warp_y.sample(x * frequency, y * frequency);
            x += dx * amplitude;
            y += dy * amplitude;
            amplitude *= cfg.gain;
            frequency *= cfg.lacunarity;
        }
        (x, y)
    }
}

/// Fast floor function.
///
/// Faster than `f64::floor()` for our use case.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) { xi - 1 } else { xi }
}

/// Quintic fade curve.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}
