//! The uniform bit stream every sampler consumes.

use rand::RngCore;

/// A source of independent, uniformly distributed words.
///
/// Every `rand` engine is a `BitSource`. Calls into this crate issue an
/// ordered sequence of draws, so a source must not be shared between two
/// in-flight calls without external synchronisation.
pub trait BitSource {
    fn next32(&mut self) -> u32;
    fn next64(&mut self) -> u64;
}

impl<R: RngCore + ?Sized> BitSource for R {
    #[inline]
    fn next32(&mut self) -> u32 {
        self.next_u32()
    }

    #[inline]
    fn next64(&mut self) -> u64 {
        self.next_u64()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use rand::{SeedableRng, rngs::StdRng};

    pub fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Replays a fixed script of words and counts how many were taken.
    pub struct Scripted {
        words: Vec<u64>,
        pub taken: usize,
    }

    impl Scripted {
        pub fn new(words: &[u64]) -> Self {
            Self {
                words: words.to_vec(),
                taken: 0,
            }
        }
    }

    impl rand::RngCore for Scripted {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }

        fn next_u64(&mut self) -> u64 {
            let w = self.words[self.taken % self.words.len()];
            self.taken += 1;
            w
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            rand::rand_core::impls::fill_bytes_via_next(self, dst)
        }
    }

    /// Wraps another source and counts draws.
    pub struct Counting<R> {
        pub inner: R,
        pub draws: usize,
    }

    impl<R: rand::RngCore> rand::RngCore for Counting<R> {
        fn next_u32(&mut self) -> u32 {
            self.draws += 1;
            self.inner.next_u32()
        }

        fn next_u64(&mut self) -> u64 {
            self.draws += 1;
            self.inner.next_u64()
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            self.inner.fill_bytes(dst)
        }
    }
}
