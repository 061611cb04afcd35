//! Bottom-k rank sketch primitives.
//!
//! A sketch is an ascending vector of at most k ranks: the k smallest ranks
//! whose source vertex/instance pair reaches the sketch's owner. Sketches
//! over different instances combine by sorted union, so the per-instance
//! local sketches built during preprocessing fold into the global ones
//! without ever sorting.

/// Merges the ascending rank list `other` into the ascending sketch `into`,
/// dropping duplicates and trimming the result to the `k` smallest ranks.
/// `scratch` is the merge buffer, kept by the caller to avoid reallocation.
pub fn merge_trimmed(into: &mut Vec<u64>, other: &[u64], k: usize, scratch: &mut Vec<u64>) {
    scratch.clear();
    let (mut a, mut b) = (0, 0);
    while scratch.len() < k && (a < into.len() || b < other.len()) {
        if b == other.len() || (a < into.len() && into[a] <= other[b]) {
            if a < into.len() && b < other.len() && into[a] == other[b] {
                b += 1;
            }
            scratch.push(into[a]);
            a += 1;
        } else {
            scratch.push(other[b]);
            b += 1;
        }
    }
    std::mem::swap(into, scratch);
}

/// The largest rank of a sketch, or `sentinel` (conventionally n·ℓ, one past
/// every assignable rank) if the sketch holds fewer than `k` ranks.
pub fn tau(sketch: &[u64], k: usize, sentinel: u64) -> u64 {
    if sketch.len() == k {
        *sketch.last().expect("k is positive")
    } else {
        sentinel
    }
}
