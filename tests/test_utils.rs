use anyhow::Result;
use influmax::utils::{extract_range, is_permutation, random_permutation, VisitSet};

#[test]
fn test_visit_set() {
    let mut set = VisitSet::new(10);
    assert!(set.is_empty());

    set.insert(3);
    set.insert(7);
    set.insert(3);
    assert_eq!(set.len(), 2);
    assert!(set.contains(3));
    assert!(set.contains(7));
    assert!(!set.contains(0));
    assert_eq!(set.key(0), 3);
    assert_eq!(set.key(1), 7);
    assert_eq!(set.keys(), &[3, 7]);

    assert_eq!(set.delete_back(), 7);
    assert!(!set.contains(7));
    assert_eq!(set.len(), 1);

    set.insert(7);
    set.insert(9);
    assert_eq!(set.delete_by_index(0), 3);
    assert!(!set.contains(3));
    assert_eq!(set.len(), 2);

    set.clear();
    assert!(set.is_empty());
    for key in 0..10 {
        assert!(!set.contains(key));
    }

    // The set stays usable after clearing.
    set.insert(0);
    assert_eq!(set.len(), 1);
    assert!(set.contains(0));
}

#[test]
fn test_extract_range() -> Result<()> {
    assert_eq!(extract_range("1-5")?, vec![1, 2, 3, 4, 5]);
    assert_eq!(extract_range("5,1,3")?, vec![1, 3, 5]);
    assert_eq!(extract_range("5-10,20-22")?, vec![5, 6, 7, 8, 9, 10, 20, 21, 22]);
    assert_eq!(extract_range("3,1-4")?, vec![1, 2, 3, 4]);
    assert_eq!(extract_range("7")?, vec![7]);

    assert!(extract_range("").is_err());
    assert!(extract_range("a-b").is_err());
    assert!(extract_range("5-1").is_err());
    Ok(())
}

#[test]
fn test_random_permutation() {
    let permutation = random_permutation(1000, 31101982);
    assert_eq!(permutation.len(), 1000);
    assert!(is_permutation(&permutation));

    assert_eq!(permutation, random_permutation(1000, 31101982));
    assert_ne!(permutation, random_permutation(1000, 31101983));

    assert!(is_permutation(&[]));
    assert!(is_permutation(&[0]));
    assert!(!is_permutation(&[1]));
    assert!(!is_permutation(&[0, 0]));
    assert!(!is_permutation(&[0, 2]));
}
