use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::ops::RangeBounds;

use tracing::trace;

use crate::search::{find_by_key, identity, range_by_key};
use crate::{FixedSequence, Result};

/// Set backed by a [`FixedSequence`], sorted after every construction and replace.
///
/// Membership is a binary search. Values are not deduplicated: duplicates stay
/// in the buffer and show up as distinct slots during iteration.
///
/// # Example
/// ```rust
/// use write_rare::SortedSet;
///
/// let set = SortedSet::from([5, 3, 3, 1]);
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 3, 3, 5]);
/// assert!(set.count(&3));
/// assert!(!set.count(&4));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SortedSet<T> {
    inner: FixedSequence<T>,
}

impl<T> Default for SortedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SortedSet<T> {
    /// Create an empty set
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::SortedSet;
    ///
    /// let set = SortedSet::<i32>::new();
    /// assert!(set.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: FixedSequence::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn has_allocation(&self) -> bool {
        self.inner.has_allocation()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns an iterator over the values in order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.inner.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }

    pub fn first(&self) -> Option<&T> {
        self.inner.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.inner.last()
    }

    pub fn into_sequence(self) -> FixedSequence<T> {
        self.inner
    }

    pub fn into_vec(self) -> Vec<T> {
        self.inner.into_vec()
    }
}

impl<T: Ord> SortedSet<T> {
    fn from_sequence(inner: FixedSequence<T>) -> Self {
        let mut me = Self { inner };
        me.sort();
        me
    }

    fn sort(&mut self) {
        self.inner.as_mut_slice().sort_unstable();
        trace!(len = self.inner.len(), "set values sorted");
    }

    pub fn from_exact_iter<I>(iter: I, count: usize) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        FixedSequence::from_exact_iter(iter, count).map(Self::from_sequence)
    }

    pub fn try_from_iter<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        FixedSequence::try_from_iter(iter).map(Self::from_sequence)
    }

    pub fn from_forward_iter<I>(iter: I) -> Result<Self>
    where
        I: Iterator<Item = T> + Clone,
    {
        FixedSequence::from_forward_iter(iter).map(Self::from_sequence)
    }

    /// Replace every value with the values of `iter`, then sort.
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::SortedSet;
    ///
    /// let mut set = SortedSet::from(["b", "a"]);
    /// set.replace(["z", "x", "y"]);
    /// assert_eq!(set.as_slice(), &["x", "y", "z"]);
    /// ```
    pub fn replace<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.inner.replace(iter);
        self.sort();
    }

    /// Checked form of [`replace`](Self::replace). On error the old values are kept.
    pub fn try_replace<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.inner.try_replace(iter)?;
        self.sort();
        Ok(())
    }

    /// Replace every value with exactly `count` values from `iter`.
    /// On error the old values are kept.
    pub fn replace_exact<I>(&mut self, iter: I, count: usize) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.inner.replace_exact(iter, count)?;
        self.sort();
        Ok(())
    }

    /// Membership test by binary search.
    pub fn count<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        find_by_key(self.inner.as_slice(), value, identity).is_ok()
    }

    #[inline]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.count(value)
    }

    /// Returns the stored value equal to `value`, if any
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = find_by_key(self.inner.as_slice(), value, identity).ok()?;
        self.inner.get(idx)
    }

    /// Returns the values that fall in `range`, in order
    pub fn range<Q, R>(&self, range: R) -> std::slice::Iter<'_, T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
        R: RangeBounds<Q>,
    {
        let slice = self.inner.as_slice();
        slice[range_by_key(slice, &range, identity)].iter()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SortedSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord> FromIterator<T> for SortedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_sequence(iter.into_iter().collect())
    }
}

impl<T: Ord> From<Vec<T>> for SortedSet<T> {
    fn from(v: Vec<T>) -> Self {
        Self::from_sequence(v.into())
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for SortedSet<T> {
    fn from(items: [T; N]) -> Self {
        Self::from_sequence(items.into())
    }
}

impl<T: Ord> From<BTreeSet<T>> for SortedSet<T> {
    fn from(s: BTreeSet<T>) -> Self {
        Self::from_sequence(s.into_iter().collect())
    }
}

impl<T: Ord> From<FixedSequence<T>> for SortedSet<T> {
    fn from(seq: FixedSequence<T>) -> Self {
        Self::from_sequence(seq)
    }
}

impl<T> IntoIterator for SortedSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a SortedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
