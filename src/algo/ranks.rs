use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sux::bits::BitVec;

/// The source of vertex/instance pairs in increasing rank order, as consumed
/// by the greedy sketch-building phase.
///
/// Rather than permuting all n·ℓ pairs up front, the stream keeps one
/// permutation of the vertices, reshuffled every time the rank counter wraps
/// a multiple of n, and draws the instance uniformly among those not yet
/// processed for the drawn source. While most instances are still free a
/// rejection loop is cheapest; once only about a tenth of the instances
/// remain the stream switches to indexing the free instances directly.
///
/// Every (source, instance) pair is produced exactly once over the life of
/// the stream.
pub struct RankStream {
    num_vertices: u32,
    num_instances: u16,
    rank: u64,
    num_ranks: u64,
    permutation: Vec<u32>,
    /// One bit per vertex and instance: the pair was already drawn.
    processed: Vec<BitVec>,
    num_permutations: u32,
    /// Permutation count at which instance selection switches from rejection
    /// sampling to a linear scan of the free instances.
    rejection_threshold: u32,
    rng: StdRng,
}

impl RankStream {
    pub fn new(num_vertices: u32, num_instances: u16, random_seed: u64) -> Self {
        assert!(num_instances > 0);
        let num_ranks = num_vertices as u64 * num_instances as u64;
        RankStream {
            num_vertices,
            num_instances,
            rank: 0,
            num_ranks,
            permutation: (0..num_vertices).collect(),
            processed: (0..num_instances)
                .map(|_| BitVec::new(num_vertices as usize))
                .collect(),
            num_permutations: 0,
            rejection_threshold: num_instances as u32 - (num_instances as u32 / 10 + 1),
            rng: StdRng::seed_from_u64(random_seed),
        }
    }

    /// The number of ranks drawn so far; the pair returned by the last
    /// [`next_pair`](RankStream::next_pair) call has rank `rank() - 1`.
    pub fn rank(&self) -> u64 {
        self.rank
    }

    pub fn num_permutations(&self) -> u32 {
        self.num_permutations
    }

    /// Draws the next vertex/instance pair, or `None` once all n·ℓ pairs
    /// have been produced.
    pub fn next_pair(&mut self) -> Option<(u32, u16)> {
        if self.rank == self.num_ranks {
            return None;
        }
        let position = (self.rank % self.num_vertices as u64) as usize;
        if position == 0 {
            self.permutation.shuffle(&mut self.rng);
            self.num_permutations += 1;
        }
        let source = self.permutation[position];

        let instance = if self.num_permutations < self.rejection_threshold {
            loop {
                let i = self.rng.gen_range(0..self.num_instances);
                if !self.processed[i as usize][source as usize] {
                    break i;
                }
            }
        } else {
            // The source has been processed in num_permutations - 1
            // instances already; index uniformly into the remaining ones.
            let free = self.num_instances as u32 - self.num_permutations + 1;
            let mut skip = self.rng.gen_range(0..self.num_instances) as u32 % free;
            let mut chosen = None;
            for i in 0..self.num_instances {
                if !self.processed[i as usize][source as usize] {
                    if skip == 0 {
                        chosen = Some(i);
                        break;
                    }
                    skip -= 1;
                }
            }
            chosen.expect("fewer free instances than the permutation count implies")
        };

        self.processed[instance as usize].set(source as usize, true);
        self.rank += 1;
        Some((source, instance))
    }
}
