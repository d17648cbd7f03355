use tracing::debug;

use crate::{Error, Result};

/// Counts the elements of a forward iterator by walking it to the end.
///
/// Used by the forward-iterator constructors, which take a cloneable iterator and
/// walk one copy to size the buffer before moving elements out of the other.
pub fn iter_distance<I: Iterator>(iter: I) -> usize {
    let mut out = 0;
    for _ in iter {
        out += 1;
    }
    out
}

fn reserve_exact<T>(buf: &mut Vec<T>, additional: usize) -> Result<()> {
    buf.try_reserve_exact(additional).map_err(|source| {
        let requested = buf.len().saturating_add(additional);
        debug!(requested, "buffer allocation failed");
        Error::AllocationFailed { requested, source }
    })
}

fn length_mismatch(declared: usize, actual: usize) -> Error {
    debug!(declared, actual, "source length does not match declared count");
    Error::LengthMismatch { declared, actual }
}

/// Moves exactly `declared` elements out of `iter` into a freshly reserved buffer.
///
/// A size hint that rules out `declared` rejects the source before anything is
/// reserved or read. Otherwise the source is read at most `declared + 1` times:
/// one element past the declared count is enough to reject it, the rest is never
/// walked.
pub(crate) fn stage_exact<T, I>(mut iter: I, declared: usize) -> Result<Box<[T]>>
where
    I: Iterator<Item = T>,
{
    match iter.size_hint() {
        (lower, _) if lower > declared => return Err(length_mismatch(declared, lower)),
        (_, Some(upper)) if upper < declared => return Err(length_mismatch(declared, upper)),
        _ => {}
    }

    let mut buf = Vec::new();
    reserve_exact(&mut buf, declared)?;

    for item in iter.by_ref() {
        if buf.len() == declared {
            return Err(length_mismatch(declared, declared + 1));
        }
        buf.push(item);
    }

    if buf.len() != declared {
        return Err(length_mismatch(declared, buf.len()));
    }

    // len == capacity, so this never reallocates
    Ok(buf.into_boxed_slice())
}

/// Moves every element out of `iter` into a buffer sized exactly to the element count.
///
/// The size hint only sizes the first reservation; the buffer grows past it if
/// the source yields more, and is shrunk to fit at the end.
pub(crate) fn stage<T, I>(iter: I) -> Result<Box<[T]>>
where
    I: Iterator<Item = T>,
{
    let mut buf = Vec::new();
    reserve_exact(&mut buf, iter.size_hint().0)?;
    for item in iter {
        if buf.len() == buf.capacity() {
            let grow = buf.capacity().max(4);
            reserve_exact(&mut buf, grow)?;
        }
        buf.push(item);
    }

    Ok(buf.into_boxed_slice())
}
