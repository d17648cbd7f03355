//! Binary search helpers over buffers kept sorted at replace time.
//!
//! All helpers compare through a key projection, so the map can search its
//! `(K, V)` pairs by key alone and the set can search its values directly.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::ops::{Bound, Range, RangeBounds};

/// Returns the first index whose projected key is not less than `key`.
///
/// `items` must be sorted by the projection. With duplicate keys this is the
/// first of the run.
#[inline]
pub fn lower_bound_by_key<T, K, Q, F>(items: &[T], key: &Q, project: F) -> usize
where
    F: Fn(&T) -> &K,
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    items.partition_point(|item| project(item).borrow() < key)
}

/// Returns the first index whose projected key is greater than `key`.
#[inline]
pub fn upper_bound_by_key<T, K, Q, F>(items: &[T], key: &Q, project: F) -> usize
where
    F: Fn(&T) -> &K,
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    items.partition_point(|item| project(item).borrow() <= key)
}

/// Lower bound confirmed by an equality check.
///
/// Returns `Ok(idx)` of the first matching item, or `Err(idx)` with the
/// insertion point, same as `binary_search`.
#[inline]
pub fn find_by_key<T, K, Q, F>(items: &[T], key: &Q, project: F) -> Result<usize, usize>
where
    F: Fn(&T) -> &K,
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    let idx = lower_bound_by_key(items, key, &project);
    match items.get(idx) {
        Some(item) if project(item).borrow().cmp(key) == Ordering::Equal => Ok(idx),
        _ => Err(idx),
    }
}

/// Translates key bounds into an index range of `items`.
///
/// An inverted range (start after end) yields an empty index range rather than
/// panicking.
pub fn range_by_key<T, K, Q, F, R>(items: &[T], range: &R, project: F) -> Range<usize>
where
    F: Fn(&T) -> &K,
    K: Borrow<Q>,
    Q: Ord + ?Sized,
    R: RangeBounds<Q> + ?Sized,
{
    let start = match range.start_bound() {
        Bound::Included(k) => lower_bound_by_key(items, k, &project),
        Bound::Excluded(k) => upper_bound_by_key(items, k, &project),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(k) => upper_bound_by_key(items, k, &project),
        Bound::Excluded(k) => lower_bound_by_key(items, k, &project),
        Bound::Unbounded => items.len(),
    };

    start..end.max(start)
}

#[inline]
pub(crate) fn identity<T>(item: &T) -> &T {
    item
}

#[inline]
pub(crate) fn pair_key<K, V>(pair: &(K, V)) -> &K {
    &pair.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn even_keys() -> Vec<u32> {
        (0..64).map(|i| (i + 1) * 2).collect()
    }

    #[test]
    fn test_find_by_key() {
        let keys = even_keys();
        let find = |k: u32| find_by_key(&keys, &k, identity);

        assert_eq!(find(1), Err(0));
        assert_eq!(find(2), Ok(0));
        assert_eq!(find(3), Err(1));
        assert_eq!(find(4), Ok(1));
        assert_eq!(find(5), Err(2));
        assert_eq!(find(6), Ok(2));
        assert_eq!(find(128), Ok(63));
        assert_eq!(find(129), Err(64));
        assert_eq!(find(130), Err(64));

        for k in 0..140 {
            assert_eq!(find(k), keys.binary_search(&k));
        }
    }

    #[test]
    fn test_find_empty() {
        let keys: Vec<u32> = vec![];
        assert_eq!(find_by_key(&keys, &1, identity), Err(0));
        assert_eq!(lower_bound_by_key(&keys, &1, identity), 0);
        assert_eq!(upper_bound_by_key(&keys, &1, identity), 0);
    }

    #[test]
    fn test_duplicates_return_first() {
        let pairs = vec![(1, 'a'), (3, 'b'), (3, 'c'), (3, 'd'), (5, 'e')];
        assert_eq!(find_by_key(&pairs, &3, pair_key), Ok(1));
        assert_eq!(lower_bound_by_key(&pairs, &3, pair_key), 1);
        assert_eq!(upper_bound_by_key(&pairs, &3, pair_key), 4);
        assert_eq!(find_by_key(&pairs, &4, pair_key), Err(4));
    }

    #[test]
    fn test_range_by_key() {
        fn range<R: RangeBounds<i32>>(r: R) -> Range<usize> {
            let keys = [1, 3, 3, 5, 7, 9];
            range_by_key(&keys, &r, identity)
        }

        assert_eq!(range(..), 0..6);
        assert_eq!(range(3..7), 1..4);
        assert_eq!(range(3..=7), 1..5);
        assert_eq!(range(4..), 3..6);
        assert_eq!(range(..=3), 0..3);
        assert_eq!(range(10..), 6..6);
        assert_eq!(range((Bound::Excluded(3), Bound::Unbounded)), 3..6);
        // inverted
        assert_eq!(range((Bound::Included(7), Bound::Excluded(2))), 4..4);
    }

    #[test]
    fn test_borrowed_key() {
        let pairs = vec![("a".to_string(), 1), ("c".to_string(), 2)];
        assert_eq!(find_by_key(&pairs, "c", pair_key), Ok(1));
        assert_eq!(find_by_key(&pairs, "b", pair_key), Err(1));
    }
}
