use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::ops::{Index, RangeBounds};

use tracing::trace;

use crate::search::{find_by_key, pair_key, range_by_key};
use crate::{Error, FixedSequence, Result};

/// Map backed by a [`FixedSequence`] of `(K, V)` pairs, sorted by key after every
/// construction and replace.
///
/// Lookups are binary searches comparing keys only, so their cost does not depend
/// on the value size. Entries can not be inserted or removed one by one; the map
/// is rebuilt with [`replace`](Self::replace).
///
/// Keys are not deduplicated. With duplicate keys, lookups return the first
/// entry in sorted order, and which of the duplicates that is depends on the
/// unstable sort.
///
/// `PartialEq`, `Eq` and `Hash` look at the sorted entries in order. Maps with
/// unique keys built from the same entries are equal whatever the input order,
/// but with duplicate keys the order among them is unspecified, so two such maps
/// built from the same entries may compare unequal.
///
/// # Example
/// ```rust
/// use write_rare::SortedMap;
///
/// let mut map = SortedMap::from([(2, "b"), (1, "a")]);
/// assert_eq!(map.get(&1), Some(&"a"));
/// assert!(map.find(&3).is_none());
///
/// map.replace([(9, "y"), (4, "z")]);
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.iter().collect::<Vec<_>>(), vec![(&4, &"z"), (&9, &"y")]);
/// assert!(map.find(&1).is_none());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SortedMap<K, V> {
    inner: FixedSequence<(K, V)>,
}

impl<K, V> Default for SortedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SortedMap<K, V> {
    /// Create an empty map, no allocation is made
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::SortedMap;
    ///
    /// let map = SortedMap::<i32, i32>::new();
    ///
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: FixedSequence::new(),
        }
    }

    /// Returns entry count in the map
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the map contains no entry
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn has_allocation(&self) -> bool {
        self.inner.has_allocation()
    }

    /// Drop every entry and release the allocation.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns an iterator over the entries in key order.
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::SortedMap;
    ///
    /// let map = SortedMap::from([(2, 3), (1, 2)]);
    ///
    /// let kvs = map.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>();
    /// assert_eq!(kvs, vec![(1, 2), (2, 3)]);
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.inner.iter(),
        }
    }

    /// Returns an iterator over the keys in order
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.inner.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over the values in key order
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.inner.iter().map(|(_, v)| v)
    }

    /// The sorted entries as a slice
    #[inline]
    pub fn as_slice(&self) -> &[(K, V)] {
        self.inner.as_slice()
    }

    /// Returns the entry at sorted position `index`.
    pub fn entry_at(&self, index: usize) -> Result<(&K, &V)> {
        self.inner.at(index).map(|(k, v)| (k, v))
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.inner.first().map(|(k, v)| (k, v))
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.inner.last().map(|(k, v)| (k, v))
    }

    /// Consume the map, returning the sorted backing sequence
    pub fn into_sequence(self) -> FixedSequence<(K, V)> {
        self.inner
    }

    pub fn into_vec(self) -> Vec<(K, V)> {
        self.inner.into_vec()
    }
}

impl<K: Ord, V> SortedMap<K, V> {
    fn from_sequence(inner: FixedSequence<(K, V)>) -> Self {
        let mut me = Self { inner };
        me.sort();
        me
    }

    fn sort(&mut self) {
        self.inner
            .as_mut_slice()
            .sort_unstable_by(|a, b| a.0.cmp(&b.0));
        trace!(len = self.inner.len(), "map entries sorted");
    }

    /// Build a map from an iterator that declares its entry count up front.
    ///
    /// See [`FixedSequence::from_exact_iter`] for the failure modes.
    pub fn from_exact_iter<I>(iter: I, count: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        FixedSequence::from_exact_iter(iter, count).map(Self::from_sequence)
    }

    /// Build a map from any iterator, reporting allocation failure.
    pub fn try_from_iter<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        FixedSequence::try_from_iter(iter).map(Self::from_sequence)
    }

    /// Build a map from a cloneable forward iterator, walking a clone of it to
    /// size the buffer.
    pub fn from_forward_iter<I>(iter: I) -> Result<Self>
    where
        I: Iterator<Item = (K, V)> + Clone,
    {
        FixedSequence::from_forward_iter(iter).map(Self::from_sequence)
    }

    /// Replace every entry with the entries of `iter`, then sort by key.
    pub fn replace<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.inner.replace(iter);
        self.sort();
    }

    /// Checked form of [`replace`](Self::replace). On error the old entries are kept.
    pub fn try_replace<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.inner.try_replace(iter)?;
        self.sort();
        Ok(())
    }

    /// Replace every entry with exactly `count` entries from `iter`.
    /// On error the old entries are kept.
    pub fn replace_exact<I>(&mut self, iter: I, count: usize) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.inner.replace_exact(iter, count)?;
        self.sort();
        Ok(())
    }

    /// Returns the position of the first entry with `key`
    pub fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        find_by_key(self.inner.as_slice(), key, pair_key).ok()
    }

    /// Returns 1 if the map holds an entry with `key`, 0 otherwise.
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::SortedMap;
    ///
    /// let map = SortedMap::from([(1, "a"), (1, "b")]);
    /// assert_eq!(map.count(&1), 1);
    /// assert_eq!(map.count(&2), 0);
    /// ```
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.position(key).is_some() as usize
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.position(key).is_some()
    }

    /// Returns an entry whose key matches, or `None`.
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::SortedMap;
    ///
    /// let map = SortedMap::from([("b".to_string(), 2), ("a".to_string(), 1)]);
    /// assert_eq!(map.find("a"), Some((&"a".to_string(), &1)));
    /// assert_eq!(map.find("c"), None);
    /// ```
    pub fn find<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.position(key)?;
        let (k, v) = &self.inner.as_slice()[idx];
        Some((k, v))
    }

    /// Returns the value for `key`, or `None`
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|(_, v)| v)
    }

    /// Returns the value for `key`, failing with [`Error::KeyNotFound`] on a miss.
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::{Error, SortedMap};
    ///
    /// let map = SortedMap::from([(1, "a")]);
    /// assert_eq!(map.at(&1), Ok(&"a"));
    /// assert_eq!(map.at(&2), Err(Error::KeyNotFound));
    /// ```
    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns the entries whose keys fall in `range`, in key order.
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::SortedMap;
    ///
    /// let map: SortedMap<i32, char> = (0..10).zip('a'..).collect();
    /// let keys = map.range(3..6).map(|(k, _)| *k).collect::<Vec<_>>();
    /// assert_eq!(keys, vec![3, 4, 5]);
    /// ```
    pub fn range<Q, R>(&self, range: R) -> Iter<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        R: RangeBounds<Q>,
    {
        let slice = self.inner.as_slice();
        let idx = range_by_key(slice, &range, pair_key);
        Iter {
            inner: slice[idx].iter(),
        }
    }
}

impl<K, V, Q> Index<&Q> for SortedMap<K, V>
where
    K: Ord + Borrow<Q>,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// Panics if the key is absent, use [`SortedMap::at`] for the checked form.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found")
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for SortedMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for SortedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_sequence(iter.into_iter().collect())
    }
}

impl<K: Ord, V> From<Vec<(K, V)>> for SortedMap<K, V> {
    fn from(v: Vec<(K, V)>) -> Self {
        Self::from_sequence(v.into())
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for SortedMap<K, V> {
    fn from(items: [(K, V); N]) -> Self {
        Self::from_sequence(items.into())
    }
}

impl<K: Ord, V> From<BTreeMap<K, V>> for SortedMap<K, V> {
    fn from(m: BTreeMap<K, V>) -> Self {
        Self::from_sequence(m.into_iter().collect())
    }
}

impl<K: Ord, V> From<FixedSequence<(K, V)>> for SortedMap<K, V> {
    fn from(seq: FixedSequence<(K, V)>) -> Self {
        Self::from_sequence(seq)
    }
}

impl<K, V> IntoIterator for SortedMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a SortedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub use iter::Iter;

mod iter {
    use std::iter::FusedIterator;

    /// Borrowed iterator over map entries in key order
    #[derive(Clone)]
    pub struct Iter<'a, K, V> {
        pub(super) inner: std::slice::Iter<'a, (K, V)>,
    }

    impl<'a, K, V> Iterator for Iter<'a, K, V> {
        type Item = (&'a K, &'a V);

        #[inline]
        fn size_hint(&self) -> (usize, Option<usize>) {
            self.inner.size_hint()
        }

        #[inline]
        fn next(&mut self) -> Option<Self::Item> {
            self.inner.next().map(|(k, v)| (k, v))
        }
    }

    impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
        fn next_back(&mut self) -> Option<Self::Item> {
            self.inner.next_back().map(|(k, v)| (k, v))
        }
    }

    impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}
    impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}
}
