use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Returns a uniformly random permutation of `[0, num_elements)` produced by
/// a Fisher–Yates shuffle of the identity, seeded deterministically.
pub fn random_permutation(num_elements: u64, seed: u64) -> Vec<u64> {
    let mut permutation: Vec<u64> = (0..num_elements).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);
    permutation
}

/// Tests whether a slice of length n is a permutation of `[0, n)`.
pub fn is_permutation(permutation: &[u64]) -> bool {
    let mut appears = vec![false; permutation.len()];
    for &item in permutation {
        let Some(seen) = appears.get_mut(item as usize) else {
            return false;
        };
        if *seen {
            return false;
        }
        *seen = true;
    }
    true
}
