mod kahan;
pub use kahan::KahanSummation;

mod perm;
pub use perm::{is_permutation, random_permutation};

mod ranges;
pub use ranges::extract_range;

mod threads;
pub use threads::Threads;

mod visit_set;
pub use visit_set::VisitSet;
