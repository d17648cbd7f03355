use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::utils::{iter_distance, stage, stage_exact};
use crate::{Error, Result};

/// Owning, contiguous, fixed length buffer that is only ever replaced wholesale.
///
/// There is no `push`, `insert` or `remove`. The buffer length always equals the
/// allocation size, and the empty sequence owns no allocation at all. The only way
/// to change the element count is [`replace`](Self::replace) and friends, which
/// move every element out of a source and drop the old contents.
///
/// Replacing stages the new elements into a fresh buffer first, so a failed
/// `try_replace`/`replace_exact` leaves the old contents untouched.
///
/// Concurrent reads of a sequence are fine (`&FixedSequence<T>` is `Sync` when
/// `T` is). Replacing takes `&mut self`, so it can never race with a reader.
///
/// # Example
/// ```rust
/// use write_rare::FixedSequence;
///
/// let mut seq = FixedSequence::<i32>::new();
/// assert!(seq.is_empty());
///
/// seq.replace([3, 1, 2]);
/// assert_eq!(seq.len(), 3);
/// // a sequence keeps source order
/// assert_eq!(seq.as_slice(), &[3, 1, 2]);
///
/// assert!(seq.at(3).is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedSequence<T> {
    buf: Box<[T]>,
}

impl<T> Default for FixedSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FixedSequence<T> {
    /// Create an empty sequence, no allocation is made
    #[inline]
    pub fn new() -> Self {
        Self {
            buf: Box::default(),
        }
    }

    /// Build a sequence from an iterator that declares its element count up front.
    ///
    /// Fails with [`Error::LengthMismatch`] if the iterator yields a different
    /// number of elements, and with [`Error::AllocationFailed`] if the buffer can
    /// not be reserved.
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::FixedSequence;
    ///
    /// let seq = FixedSequence::from_exact_iter(vec![1, 2, 3], 3).unwrap();
    /// assert_eq!(seq.len(), 3);
    ///
    /// assert!(FixedSequence::from_exact_iter(vec![1, 2, 3], 5).is_err());
    /// ```
    pub fn from_exact_iter<I>(iter: I, count: usize) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let buf = stage_exact(iter.into_iter(), count)?;
        Ok(Self::from_buf(buf))
    }

    /// Build a sequence from any iterator, reporting allocation failure.
    pub fn try_from_iter<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let buf = stage(iter.into_iter())?;
        Ok(Self::from_buf(buf))
    }

    /// Build a sequence from a cloneable forward iterator.
    ///
    /// A clone of `iter` is walked to count the elements, then the buffer is
    /// reserved once and the elements are moved out of `iter`. Useful for
    /// iterators whose size hint is not exact, e.g. filtered ranges.
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::FixedSequence;
    ///
    /// let evens = FixedSequence::from_forward_iter((0..10).filter(|i| i % 2 == 0)).unwrap();
    /// assert_eq!(evens.as_slice(), &[0, 2, 4, 6, 8]);
    /// ```
    pub fn from_forward_iter<I>(iter: I) -> Result<Self>
    where
        I: Iterator<Item = T> + Clone,
    {
        let count = iter_distance(iter.clone());
        Self::from_exact_iter(iter, count)
    }

    fn from_buf(buf: Box<[T]>) -> Self {
        trace!(len = buf.len(), "sequence constructed");
        Self { buf }
    }

    /// Replace the whole content with the elements of `iter`.
    ///
    /// Every old element is dropped; the length becomes the number of elements
    /// `iter` yields. Aborts on allocation failure like `Vec`, see
    /// [`try_replace`](Self::try_replace) for the checked form.
    ///
    /// The new elements always go into a fresh allocation, even when the length
    /// does not change. The old allocation is released only after the new buffer
    /// is complete and is never reused.
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::FixedSequence;
    ///
    /// let mut seq = FixedSequence::from([1, 2, 3, 4]);
    /// seq.replace(vec![9, 8]);
    /// assert_eq!(seq.as_slice(), &[9, 8]);
    /// ```
    pub fn replace<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        let buf: Box<[T]> = iter.into_iter().collect();
        self.install(buf);
    }

    /// Replace the whole content, returning an error instead of aborting when the
    /// buffer can not be allocated. On error the old content is kept.
    ///
    /// The size hint of `iter` only sizes the first reservation; a source that
    /// yields more or fewer elements than it hinted still replaces the content.
    /// Like [`replace`](Self::replace), the old allocation is not reused.
    pub fn try_replace<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let buf = stage(iter.into_iter())?;
        self.install(buf);
        Ok(())
    }

    /// Replace the whole content with exactly `count` elements from `iter`.
    ///
    /// If `iter` does not yield exactly `count` elements the call fails with
    /// [`Error::LengthMismatch`] and the old content is kept. A source whose size
    /// hint rules out `count` is rejected without being read, and a longer source
    /// is read no further than `count + 1` elements, so an unbounded iterator
    /// fails instead of running forever.
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::{Error, FixedSequence};
    ///
    /// let mut seq = FixedSequence::from([1, 2]);
    /// let err = seq.replace_exact([7, 8, 9], 2).unwrap_err();
    /// assert_eq!(err, Error::LengthMismatch { declared: 2, actual: 3 });
    /// assert_eq!(seq.as_slice(), &[1, 2]);
    /// ```
    pub fn replace_exact<I>(&mut self, iter: I, count: usize) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let buf = stage_exact(iter.into_iter(), count)?;
        self.install(buf);
        Ok(())
    }

    /// Drop every element and release the allocation.
    pub fn clear(&mut self) {
        self.install(Box::default());
    }

    fn install(&mut self, buf: Box<[T]>) {
        trace!(old_len = self.buf.len(), new_len = buf.len(), "replacing buffer");
        // the old buffer (and every element in it) is dropped here
        self.buf = buf;
    }

    /// Returns element count
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if the sequence holds no element
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns true if the sequence currently owns a heap allocation.
    ///
    /// The empty sequence never does; neither does a sequence of zero sized
    /// elements.
    #[inline]
    pub fn has_allocation(&self) -> bool {
        !self.buf.is_empty() && std::mem::size_of::<T>() != 0
    }

    /// Returns an iterator over the elements in storage order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.buf.iter()
    }

    /// Returns a mutable iterator. Elements may be changed in place, the length
    /// can not.
    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.buf.iter_mut()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.buf
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.buf
    }

    /// Returns the element at `index`, or `None` if out of bounds
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.buf.get(index)
    }

    /// Returns the element at `index`.
    ///
    /// # Examples
    /// ```rust
    /// use write_rare::{Error, FixedSequence};
    ///
    /// let seq = FixedSequence::from(["a", "b"]);
    /// assert_eq!(seq.at(1), Ok(&"b"));
    /// assert_eq!(seq.at(2), Err(Error::IndexOutOfBounds { index: 2, len: 2 }));
    /// ```
    pub fn at(&self, index: usize) -> Result<&T> {
        self.buf.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            len: self.buf.len(),
        })
    }

    /// Consume the sequence, returning its elements
    pub fn into_vec(self) -> Vec<T> {
        self.buf.into_vec()
    }

    pub fn into_boxed_slice(self) -> Box<[T]> {
        self.buf
    }
}

impl<T> Deref for FixedSequence<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        &self.buf
    }
}

impl<T> DerefMut for FixedSequence<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.buf
    }
}

impl<T> AsRef<[T]> for FixedSequence<T> {
    fn as_ref(&self) -> &[T] {
        &self.buf
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for FixedSequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.buf.iter()).finish()
    }
}

impl<T> FromIterator<T> for FixedSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_buf(iter.into_iter().collect())
    }
}

impl<T> From<Vec<T>> for FixedSequence<T> {
    fn from(v: Vec<T>) -> Self {
        Self::from_buf(v.into_boxed_slice())
    }
}

impl<T> From<Box<[T]>> for FixedSequence<T> {
    fn from(buf: Box<[T]>) -> Self {
        Self::from_buf(buf)
    }
}

impl<T, const N: usize> From<[T; N]> for FixedSequence<T> {
    fn from(items: [T; N]) -> Self {
        Self::from_buf(Vec::from(items).into_boxed_slice())
    }
}

impl<T> From<FixedSequence<T>> for Vec<T> {
    fn from(seq: FixedSequence<T>) -> Self {
        seq.into_vec()
    }
}

impl<T> IntoIterator for FixedSequence<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

impl<'a, T> IntoIterator for &'a FixedSequence<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut FixedSequence<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// ensure FixedSequence is send and sync for send and sync T
fn _ensure_send_sync<T: Send + Sync>() {
    fn _assert_send_sync<S: Send + Sync>() {}
    _assert_send_sync::<FixedSequence<T>>();
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[derive(Clone)]
    struct TestValue {
        counter: Rc<AtomicU64>,
    }

    impl TestValue {
        fn new(counter: Rc<AtomicU64>) -> Self {
            Self { counter }
        }
    }

    impl Drop for TestValue {
        fn drop(&mut self) {
            self.counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_empty_then_replace() {
        let mut seq: FixedSequence<i32> = FixedSequence::from(vec![]);
        assert!(seq.is_empty());
        assert_eq!(seq.len(), 0);
        assert!(!seq.has_allocation());

        seq.replace([10, 30, 20]);
        assert_eq!(seq.len(), 3);
        assert!(seq.has_allocation());
        assert_eq!(seq.iter().copied().collect::<Vec<_>>(), vec![10, 30, 20]);
    }

    #[test]
    fn test_replace_to_empty_releases() {
        let mut seq = FixedSequence::from([1, 2, 3]);
        seq.replace(std::iter::empty());
        assert!(seq.is_empty());
        assert!(!seq.has_allocation());

        // clearing an already empty sequence is a no-op
        seq.clear();
        seq.clear();
        assert!(seq.is_empty());
    }

    #[test]
    fn test_size_follows_each_replace() {
        let mut seq = FixedSequence::from_iter(0..5);
        for n in [0, 7, 7, 2, 100, 0, 1] {
            seq.replace(0..n);
            assert_eq!(seq.len(), n);
            assert_eq!(seq.last().copied(), n.checked_sub(1));
        }
    }

    #[test]
    fn test_index_one_past_end() {
        let seq = FixedSequence::from([1u8, 2, 3]);
        assert_eq!(
            seq.at(seq.len()),
            Err(Error::IndexOutOfBounds { index: 3, len: 3 })
        );
        assert_eq!(seq.get(3), None);
        assert_eq!(seq.at(0), Ok(&1));

        let empty = FixedSequence::<u8>::new();
        assert_eq!(
            empty.at(0),
            Err(Error::IndexOutOfBounds { index: 0, len: 0 })
        );
    }

    #[test]
    #[should_panic]
    fn test_index_operator_checks_bounds() {
        let seq = FixedSequence::from([1u8, 2, 3]);
        let _ = seq[3];
    }

    #[test]
    fn test_replace_drops_old_elements() {
        let counter = Rc::new(AtomicU64::new(0));
        let mut seq: FixedSequence<TestValue> =
            (0..10).map(|_| TestValue::new(counter.clone())).collect();
        assert_eq!(counter.load(Ordering::Relaxed), 0);

        seq.replace((0..10).map(|_| TestValue::new(counter.clone())));
        assert_eq!(counter.load(Ordering::Relaxed), 10);

        seq.replace((0..3).map(|_| TestValue::new(counter.clone())));
        assert_eq!(counter.load(Ordering::Relaxed), 20);

        drop(seq);
        assert_eq!(counter.load(Ordering::Relaxed), 23);
    }

    #[test]
    fn test_values_are_moved_not_cloned() {
        let counter = Rc::new(AtomicU64::new(0));
        let source = (0..4)
            .map(|_| TestValue::new(counter.clone()))
            .collect::<Vec<_>>();

        let seq = FixedSequence::from_exact_iter(source, 4).unwrap();
        // nothing dropped while moving, no clone ever made
        assert_eq!(counter.load(Ordering::Relaxed), 0);
        assert_eq!(Rc::strong_count(&counter), 5);
        drop(seq);
        assert_eq!(counter.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_replace_exact_mismatch_keeps_old() {
        let mut seq = FixedSequence::from([1, 2, 3]);

        let err = seq.replace_exact(vec![4, 5], 3).unwrap_err();
        assert_eq!(
            err,
            Error::LengthMismatch {
                declared: 3,
                actual: 2
            }
        );
        assert_eq!(seq.as_slice(), &[1, 2, 3]);

        let err = seq.replace_exact(0..10, 3).unwrap_err();
        assert_eq!(
            err,
            Error::LengthMismatch {
                declared: 3,
                actual: 10
            }
        );
        assert_eq!(seq.as_slice(), &[1, 2, 3]);

        seq.replace_exact([6, 5, 4], 3).unwrap();
        assert_eq!(seq.as_slice(), &[6, 5, 4]);
    }

    #[test]
    fn test_replace_exact_unbounded_source() {
        let mut seq = FixedSequence::from([1, 2, 3]);

        let err = seq.replace_exact(std::iter::repeat(7), 3).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { declared: 3, .. }));
        assert_eq!(seq.as_slice(), &[1, 2, 3]);

        // no size hint to go on, stops one element past the declared count
        let err = seq
            .replace_exact(std::iter::repeat(7).filter(|_| true), 3)
            .unwrap_err();
        assert_eq!(
            err,
            Error::LengthMismatch {
                declared: 3,
                actual: 4
            }
        );
        assert_eq!(seq.as_slice(), &[1, 2, 3]);

        let err = FixedSequence::from_exact_iter(0u64..50_000_000_000, 3).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { declared: 3, .. }));
    }

    #[test]
    fn test_try_replace_ignores_wrong_size_hint() {
        struct Hinted<I> {
            inner: I,
            hint: usize,
        }

        // reports an exact length that does not match what it yields
        impl<I: Iterator> Iterator for Hinted<I> {
            type Item = I::Item;

            fn next(&mut self) -> Option<Self::Item> {
                self.inner.next()
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                (self.hint, Some(self.hint))
            }
        }

        let mut seq = FixedSequence::from([1, 2]);
        seq.try_replace(Hinted {
            inner: 10..15,
            hint: 2,
        })
        .unwrap();
        assert_eq!(seq.as_slice(), &[10, 11, 12, 13, 14]);
        assert_eq!(seq.len(), 5);

        seq.try_replace(Hinted {
            inner: 0..1,
            hint: 6,
        })
        .unwrap();
        assert_eq!(seq.as_slice(), &[0]);

        let seq = FixedSequence::try_from_iter(Hinted {
            inner: 0..3,
            hint: 1,
        })
        .unwrap();
        assert_eq!(seq.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_same_length_replace_uses_new_allocation() {
        let mut seq = FixedSequence::from([1u64, 2, 3]);
        let old = seq.as_slice().as_ptr();

        seq.replace([4, 5, 6]);
        assert_eq!(seq.as_slice(), &[4, 5, 6]);
        // the new buffer is filled while the old one is still alive
        assert_ne!(seq.as_slice().as_ptr(), old);
    }

    #[test]
    fn test_allocation_failure_keeps_old() {
        struct Huge<I>(I);

        // claims an absurd exact length so staging asks for too much memory
        impl<I: Iterator> Iterator for Huge<I> {
            type Item = I::Item;

            fn next(&mut self) -> Option<Self::Item> {
                self.0.next()
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                (usize::MAX, Some(usize::MAX))
            }
        }

        let mut seq = FixedSequence::from([1u64, 2]);
        let err = seq.try_replace(Huge(0u64..3)).unwrap_err();
        assert!(matches!(err, Error::AllocationFailed { .. }));
        assert_eq!(seq.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_try_replace() {
        let mut seq = FixedSequence::new();
        seq.try_replace((0..50).filter(|i| i % 5 == 0)).unwrap();
        assert_eq!(seq.as_slice(), &[0, 5, 10, 15, 20, 25, 30, 35, 40, 45]);
    }

    #[test]
    fn test_iter_double_ended() {
        let seq = FixedSequence::from_iter(0..100);
        let kvs = seq.iter().collect::<Vec<_>>();
        let rev_kvs = seq.iter().rev().collect::<Vec<_>>();

        assert_eq!(rev_kvs.len(), kvs.len());
        assert_eq!(rev_kvs, kvs.iter().rev().cloned().collect::<Vec<_>>());
        assert_eq!(seq.iter().len(), 100);
    }

    #[test]
    fn test_iter_mut_in_place() {
        let mut seq = FixedSequence::from([1, 2, 3]);
        for v in &mut seq {
            *v *= 10;
        }
        assert_eq!(seq.into_vec(), vec![10, 20, 30]);
    }

    #[test]
    fn test_into_iter_drops_remaining() {
        let counter = Rc::new(AtomicU64::new(0));
        let seq: FixedSequence<TestValue> =
            (0..10).map(|_| TestValue::new(counter.clone())).collect();
        let mut iter = seq.into_iter();
        let first = iter.next();
        drop(iter);
        assert_eq!(counter.load(Ordering::Relaxed), 9);
        drop(first);
        assert_eq!(counter.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_debug_and_eq() {
        let a = FixedSequence::from([1, 2]);
        let b: FixedSequence<i32> = vec![1, 2].into();
        assert_eq!(a, b);
        assert_eq!(format!("{a:?}"), "[1, 2]");
    }
}
