//! MT19937 generator seeded and scaled the same way as CPython's `random`.
//!
//! Camera layouts generated by the original tooling were drawn from
//! `random.Random(seed).random()`. Reproducing those layouts bit for bit
//! needs the same integer seeding (`init_by_array` over the 32-bit words of
//! `|seed|`) and the same 53-bit float construction.

use rand::RngCore;

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// 32-bit Mersenne Twister with CPython-compatible seeding.
#[derive(Clone)]
pub struct Mt19937 {
    state: Box<[u32; N]>,
    index: usize,
}

impl std::fmt::Debug for Mt19937 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mt19937").field("index", &self.index).finish()
    }
}

impl Mt19937 {
    /// Reference seeding routine (`init_genrand`).
    pub fn new(seed: u32) -> Self {
        let mut state = Box::new([0u32; N]);
        state[0] = seed;
        for i in 1..N {
            let prev = state[i - 1];
            state[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        Self { state, index: N }
    }

    /// Reference array seeding routine (`init_by_array`).
    pub fn from_key(key: &[u32]) -> Self {
        let key: &[u32] = if key.is_empty() { &[0] } else { key };
        let mut rng = Self::new(19_650_218);
        let mt = &mut rng.state;

        let mut i = 1usize;
        let mut j = 0usize;
        for _ in 0..N.max(key.len()) {
            let prev = mt[i - 1];
            mt[i] = (mt[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_664_525))
                .wrapping_add(key[j])
                .wrapping_add(j as u32);
            i += 1;
            j += 1;
            if i >= N {
                mt[0] = mt[N - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
        }
        for _ in 0..N - 1 {
            let prev = mt[i - 1];
            mt[i] = (mt[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_566_083_941))
                .wrapping_sub(i as u32);
            i += 1;
            if i >= N {
                mt[0] = mt[N - 1];
                i = 1;
            }
        }
        mt[0] = 0x8000_0000;
        rng
    }

    /// Seed from an arbitrary signed integer like `random.Random(int)`.
    ///
    /// The sign is dropped and the magnitude is split into little-endian
    /// 32-bit words; zero seeds with the single word `[0]`.
    pub fn from_python_seed(seed: i128) -> Self {
        let mut magnitude = seed.unsigned_abs();
        let mut key = Vec::with_capacity(4);
        while magnitude != 0 {
            key.push((magnitude & 0xffff_ffff) as u32);
            magnitude >>= 32;
        }
        Self::from_key(&key)
    }

    fn generate(&mut self) {
        let mt = &mut self.state;
        for kk in 0..N {
            let y = (mt[kk] & UPPER_MASK) | (mt[(kk + 1) % N] & LOWER_MASK);
            let mag = if y & 1 == 0 { 0 } else { MATRIX_A };
            mt[kk] = mt[(kk + M) % N] ^ (y >> 1) ^ mag;
        }
        self.index = 0;
    }

    /// Next tempered 32-bit output (`genrand_uint32`).
    pub fn next_word(&mut self) -> u32 {
        if self.index >= N {
            self.generate();
        }
        let mut y = self.state[self.index];
        self.index += 1;

        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^= y >> 18;
        y
    }

    /// Uniform float in `[0, 1)` with 53-bit resolution (`genrand_res53`).
    pub fn random(&mut self) -> f64 {
        let a = (self.next_word() >> 5) as f64;
        let b = (self.next_word() >> 6) as f64;
        (a * 67_108_864.0 + b) * (1.0 / 9_007_199_254_740_992.0)
    }
}

impl RngCore for Mt19937 {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(self.next_word());
        let hi = u64::from(self.next_word());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_default_seed_first_output() {
        let mut rng = Mt19937::new(5489);
        assert_eq!(rng.next_word(), 3_499_211_612);
        assert_eq!(rng.next_word(), 581_869_302);
    }

    #[test]
    fn reference_init_by_array_outputs() {
        // mt19937ar.c test vector: init_by_array({0x123, 0x234, 0x345, 0x456}).
        let mut rng = Mt19937::from_key(&[0x123, 0x234, 0x345, 0x456]);
        assert_eq!(rng.next_word(), 1_067_595_299);
        assert_eq!(rng.next_word(), 955_945_823);
        assert_eq!(rng.next_word(), 477_289_528);
    }

    #[test]
    fn python_seed_matches_cpython_random() {
        // random.Random(0).random(), random.Random(42).random()
        assert_eq!(Mt19937::from_python_seed(0).random(), 0.844_421_851_525_048_1);
        assert_eq!(Mt19937::from_python_seed(42).random(), 0.639_426_798_457_883_7);
    }

    #[test]
    fn negative_seed_uses_magnitude() {
        let mut a = Mt19937::from_python_seed(-12345);
        let mut b = Mt19937::from_python_seed(12345);
        for _ in 0..10 {
            assert_eq!(a.next_word(), b.next_word());
        }
    }

    #[test]
    fn random_is_in_unit_interval() {
        let mut rng = Mt19937::from_python_seed(2024);
        for _ in 0..10_000 {
            let u = rng.random();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn fill_bytes_handles_partial_words() {
        let mut a = Mt19937::new(1);
        let mut b = Mt19937::new(1);
        let mut buf = [0u8; 6];
        a.fill_bytes(&mut buf);
        let w0 = b.next_word().to_le_bytes();
        let w1 = b.next_word().to_le_bytes();
        assert_eq!(&buf[..4], &w0);
        assert_eq!(&buf[4..], &w1[..2]);
    }
}
