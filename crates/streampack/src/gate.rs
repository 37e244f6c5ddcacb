//! Sequencing and error state shared by a reader hierarchy.
//!
//! The borrow checker already guarantees that at most one child sub-reader
//! is alive at a time. What it cannot see is whether that child was driven
//! to the end of its encoding before being dropped: a child dropped early
//! leaves the byte stream somewhere in the middle of its item, and every
//! later operation on an ancestor would decode garbage. Each reader root
//! therefore carries a gate; a child poisons it on an unfinished drop, and
//! every reader operation consults it.
//!
//! A child counts as finished only once an operation has *observed* the end
//! of its encoding — a short read, a `None`, a consumed terminator. Seeking
//! to exactly the end of a blob does not observe it; seeking past it does.
//!
//! The poison state is always maintained (it is one bool), but violations
//! are only reported while debug assertions are compiled in. Without them a
//! violating sequence leaves the stream at an indeterminate offset, which
//! is the documented no-rewind contract.
//!
//! The gate also latches the first wire or stream error: a reader that has
//! failed is dead, and every further operation on the tree reports the same
//! error instead of decoding from an indeterminate position.

use std::io;

use crate::error::{Error, Result};

/// The latched cause of death of a reader tree.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DeadEnd {
    IllFormed,
    IntegerOverflow,
    Eof,
    Io(io::ErrorKind),
}

/// Per-reader-root state shared with every descendant.
#[derive(Debug, Default)]
pub(crate) struct Gate {
    poisoned: bool,
    dead: Option<DeadEnd>,
}

impl Gate {
    /// Records that a child was dropped before its end was observed.
    pub(crate) fn poison(&mut self) {
        self.poisoned = true;
    }

    /// Latches a wire-level failure and returns the error to propagate.
    pub(crate) fn fail(&mut self, dead: DeadEnd) -> Error {
        if self.dead.is_none() {
            self.dead = Some(dead);
        }
        dead.to_error()
    }

    /// Latches a byte-stream failure and returns the error to propagate.
    pub(crate) fn fail_io(&mut self, error: io::Error) -> Error {
        if self.dead.is_none() {
            self.dead = Some(DeadEnd::Io(error.kind()));
        }
        Error::Io(error)
    }

    /// Replays a latched error, and in checked builds fails with
    /// [`Error::LibraryMisused`] if a child was abandoned mid-item.
    pub(crate) fn check(&self) -> Result<()> {
        if let Some(dead) = self.dead {
            return Err(dead.to_error());
        }
        if cfg!(debug_assertions) && self.poisoned {
            return Err(Error::LibraryMisused);
        }
        Ok(())
    }
}

impl DeadEnd {
    fn to_error(self) -> Error {
        match self {
            DeadEnd::IllFormed => Error::IllFormed,
            DeadEnd::IntegerOverflow => Error::IntegerOverflow,
            DeadEnd::Eof => Error::Eof,
            DeadEnd::Io(kind) => Error::Io(kind.into()),
        }
    }
}

/// Key/value alternation state of a map reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MapPhase {
    /// The next operation must be `read_next_key`.
    Key,
    /// The next operation must be `read_value`.
    Value,
    /// The map has been read to its end.
    Done,
}

/// Reports an alternation violation in checked builds; a no-op otherwise.
pub(crate) fn sequence_error() -> Result<()> {
    if cfg!(debug_assertions) {
        return Err(Error::LibraryMisused);
    }
    Ok(())
}
