//! Position stack: step into an absolute offset, do nested work, step back.
//!
//! A field that is "an offset to a sub-structure elsewhere in the file" is
//! handled by stepping in to the offset, parsing the sub-structure with a
//! plain recursive call, and stepping out to resume the parent's sequential
//! fields. Steps nest without limit.
//!
//! Three forms are available on every [`Seekable`] cursor:
//!
//! - [`Seekable::step_in`] / [`Seekable::step_out`]: explicit push and pop.
//! - [`Seekable::stepped`]: a [`Step`] guard that restores on drop, so the
//!   position comes back on every exit path including `?` returns.
//! - [`Seekable::at`]: run a closure at an offset.

use std::ops::{Deref, DerefMut};

use crate::{Error, Result};

/// Saved positions of the enclosing steps, innermost last.
#[derive(Debug, Clone, Default)]
pub struct StepStack {
    frames: Vec<usize>,
}

impl StepStack {
    /// Create an empty stack.
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Number of open frames.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame is open.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn push(&mut self, position: usize) {
        self.frames.push(position);
    }

    fn pop(&mut self) -> Option<usize> {
        self.frames.pop()
    }

    fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    /// Fail if any frame is still open.
    pub fn ensure_empty(&self) -> Result<()> {
        if self.frames.is_empty() {
            Ok(())
        } else {
            Err(Error::UnbalancedSteps {
                depth: self.frames.len(),
            })
        }
    }
}

/// A cursor with an absolute position and a step stack.
pub trait Seekable {
    /// Current absolute position.
    fn position(&self) -> usize;

    /// Move to an absolute position without touching the step stack.
    fn seek(&mut self, position: usize);

    fn steps(&self) -> &StepStack;

    fn steps_mut(&mut self) -> &mut StepStack;

    /// Validate a step target. Readers reject offsets past the end.
    fn check_step_target(&self, _offset: usize) -> Result<()> {
        Ok(())
    }

    /// Number of open step frames.
    fn step_depth(&self) -> usize {
        self.steps().depth()
    }

    /// Save the current position and jump to `offset`.
    fn step_in(&mut self, offset: usize) -> Result<()> {
        self.check_step_target(offset)?;
        let from = self.position();
        self.steps_mut().push(from);
        self.seek(offset);
        tracing::trace!(from, to = offset, depth = self.step_depth(), "step in");
        Ok(())
    }

    /// Return to the position saved by the matching [`step_in`](Self::step_in).
    fn step_out(&mut self) -> Result<()> {
        let back = self.steps_mut().pop().ok_or(Error::StepUnderflow)?;
        tracing::trace!(to = back, depth = self.step_depth(), "step out");
        self.seek(back);
        Ok(())
    }

    /// Step in to `offset` for the lifetime of the returned guard.
    ///
    /// # Example
    ///
    /// ```
    /// use patchcord_common::{BinaryReader, Seekable};
    ///
    /// let data = [0x08, 0, 0, 0, 0xAA, 0xBB, 0xCC, 0xDD, 0x2A];
    /// let mut reader = BinaryReader::new(&data);
    ///
    /// let offset = reader.read_u32()? as usize;
    /// let child = reader.stepped(offset)?.read_u8()?;
    ///
    /// assert_eq!(child, 0x2A);
    /// assert_eq!(reader.position(), 4);
    /// # Ok::<(), patchcord_common::Error>(())
    /// ```
    fn stepped(&mut self, offset: usize) -> Result<Step<'_, Self>>
    where
        Self: Sized,
    {
        let depth = self.step_depth();
        self.step_in(offset)?;
        Ok(Step {
            cursor: self,
            depth,
        })
    }

    /// Run `f` with the cursor stepped in to `offset`, then step back out.
    ///
    /// If `f` succeeds but leaves inner frames open, or steps out of the
    /// frame opened here, the result is [`Error::UnbalancedSteps`]. The
    /// position is restored either way.
    fn at<T, E, F>(&mut self, offset: usize, f: F) -> std::result::Result<T, E>
    where
        Self: Sized,
        E: From<Error>,
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
    {
        let mut step = self.stepped(offset)?;
        let value = f(&mut *step)?;
        let expected = step.depth + 1;
        let actual = step.step_depth();
        if actual != expected {
            return Err(Error::UnbalancedSteps {
                depth: actual.abs_diff(expected),
            }
            .into());
        }
        Ok(value)
    }
}

/// Guard returned by [`Seekable::stepped`].
///
/// Dereferences to the cursor. Dropping it closes any frames opened inside
/// it and restores the position saved when it was created.
#[must_use = "the step is undone as soon as the guard is dropped"]
pub struct Step<'c, C: Seekable> {
    cursor: &'c mut C,
    depth: usize,
}

impl<C: Seekable> Step<'_, C> {
    /// Position the guard will restore.
    pub fn return_position(&self) -> Option<usize> {
        self.cursor.steps().frames.get(self.depth).copied()
    }
}

impl<C: Seekable> Deref for Step<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.cursor
    }
}

impl<C: Seekable> DerefMut for Step<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.cursor
    }
}

impl<C: Seekable> Drop for Step<'_, C> {
    fn drop(&mut self) {
        let steps = self.cursor.steps_mut();
        if steps.depth() <= self.depth {
            // Our frame was already popped by an explicit step_out.
            return;
        }
        steps.truncate(self.depth + 1);
        if let Some(back) = steps.pop() {
            self.cursor.seek(back);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryReader, BinaryWriter};

    #[test]
    fn test_step_out_without_step_in() {
        let data = [0u8; 4];
        let mut reader = BinaryReader::new(&data);
        assert!(matches!(reader.step_out(), Err(Error::StepUnderflow)));
    }

    #[test]
    fn test_nested_steps_restore_outermost_position() {
        let data = [0u8; 64];
        let mut reader = BinaryReader::new(&data);
        reader.seek(3);

        reader.step_in(10).unwrap();
        reader.read_u32().unwrap();
        reader.step_in(40).unwrap();
        reader.step_in(20).unwrap();
        reader.read_u8().unwrap();
        reader.step_out().unwrap();
        assert_eq!(reader.position(), 40);
        reader.step_out().unwrap();
        assert_eq!(reader.position(), 14);
        reader.step_out().unwrap();

        assert_eq!(reader.position(), 3);
        assert_eq!(reader.step_depth(), 0);
    }

    #[test]
    fn test_guard_restores_on_error() {
        let data = [0u8; 8];
        let mut reader = BinaryReader::new(&data);
        reader.seek(2);

        let result: Result<u64> = reader.at(6, |r| r.read_u64());
        assert!(matches!(result, Err(Error::UnexpectedEof { .. })));
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.step_depth(), 0);
    }

    #[test]
    fn test_guard_closes_leaked_inner_frames() {
        let data = [0u8; 32];
        let mut reader = BinaryReader::new(&data);
        {
            let mut step = reader.stepped(8).unwrap();
            step.step_in(16).unwrap();
            step.step_in(24).unwrap();
            assert_eq!(step.return_position(), Some(0));
        }
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.step_depth(), 0);
    }

    #[test]
    fn test_at_reports_leaked_inner_step() {
        let data = [0u8; 16];
        let mut reader = BinaryReader::new(&data);
        reader.seek(2);

        let result = reader.at(0, |r| r.step_in(8));
        assert!(matches!(result, Err(Error::UnbalancedSteps { depth: 1 })));
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.step_depth(), 0);
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_at_reports_stepping_out_of_its_frame() {
        let data = [0u8; 16];
        let mut reader = BinaryReader::new(&data);

        let result = reader.at(4, |r| r.step_out());
        assert!(matches!(result, Err(Error::UnbalancedSteps { depth: 1 })));
        assert_eq!(reader.step_depth(), 0);
    }

    #[test]
    fn test_at_accepts_balanced_inner_steps() {
        let data = [0u8, 0, 0, 0, 0, 0, 0, 0, 0x2A];
        let mut reader = BinaryReader::new(&data);

        let value = reader
            .at(4, |r| {
                r.step_in(8)?;
                let value = r.read_u8()?;
                r.step_out()?;
                Ok::<_, Error>(value)
            })
            .unwrap();
        assert_eq!(value, 0x2A);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_guard_after_explicit_step_out() {
        let data = [0u8; 32];
        let mut reader = BinaryReader::new(&data);
        reader.seek(5);
        {
            let mut step = reader.stepped(8).unwrap();
            step.step_out().unwrap();
            step.seek(12);
        }
        assert_eq!(reader.position(), 12);
    }

    #[test]
    fn test_reader_rejects_step_past_end() {
        let data = [0u8; 4];
        let mut reader = BinaryReader::new(&data);
        assert!(reader.step_in(4).is_ok());
        reader.step_out().unwrap();
        assert!(matches!(
            reader.step_in(5),
            Err(Error::OffsetOutOfRange { offset: 5, len: 4 })
        ));
        assert_eq!(reader.step_depth(), 0);
    }

    #[test]
    fn test_writer_steps_back_into_written_region() {
        let mut writer = BinaryWriter::new();
        writer.write_u32(0);
        writer.write_u32(0);
        writer
            .at(4, |w| -> Result<()> {
                w.write_u16(0xBEEF);
                Ok(())
            })
            .unwrap();
        assert_eq!(writer.position(), 8);
        assert_eq!(writer.as_bytes(), &[0, 0, 0, 0, 0xEF, 0xBE, 0, 0]);
    }

    #[test]
    fn test_deep_recursion() {
        fn descend(reader: &mut BinaryReader<'_>, depth: usize) -> Result<usize> {
            if depth == 0 {
                return Ok(reader.position());
            }
            let target = (reader.position() + 1) % reader.len();
            reader.at(target, |r| descend(r, depth - 1))
        }

        let data = [0u8; 16];
        let mut reader = BinaryReader::new(&data);
        let deepest = descend(&mut reader, 500).unwrap();
        assert_eq!(deepest, 500 % 16);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.step_depth(), 0);
    }
}
