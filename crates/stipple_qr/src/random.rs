//! Injectable randomness for asset selection

/// Source of random numbers for the grouping engine
pub trait RandomSource {
    fn next_u32(&mut self) -> u32;

    /// Uniform index into a collection of `len` items, `None` when empty
    fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.next_u32() as usize % len)
    }
}

/// Deterministic generator: a counter run through an integer hash
#[derive(Clone, Debug)]
pub struct SeededRandom {
    seed: u64,
    counter: u32,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }
}

impl RandomSource for SeededRandom {
    fn next_u32(&mut self) -> u32 {
        let value = hash(self.counter, self.seed);
        self.counter = self.counter.wrapping_add(1);
        value
    }
}

fn hash(index: u32, seed: u64) -> u32 {
    let mut h = (seed as u32) ^ ((seed >> 32) as u32);
    h = h.wrapping_mul(374761393);
    h = h.wrapping_add(index.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

/// Replays a fixed sequence, wrapping around at the end
#[derive(Clone, Debug)]
pub struct FixedSequence {
    values: Vec<u32>,
    index: usize,
}

impl FixedSequence {
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, index: 0 }
    }
}

impl RandomSource for FixedSequence {
    fn next_u32(&mut self) -> u32 {
        let Some(value) = self.values.get(self.index % self.values.len().max(1)) else {
            return 0;
        };
        self.index += 1;
        *value
    }
}
