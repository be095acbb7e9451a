use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Owns the single random stream a generation run draws from.
///
/// Stages receive it one after another in a fixed order, so the sequence of
/// draws (and therefore the world) is a pure function of the seed.
pub struct RngManager {
    seed: u64,
    stream: ChaCha8Rng,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            stream: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&mut self) -> SystemRng<'_> {
        SystemRng {
            inner: &mut self.stream,
        }
    }
}

pub struct SystemRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl<'a> RngCore for SystemRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Stable 64-bit FNV-1a hash of a textual seed.
pub fn seed_from_str(text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    text.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}
