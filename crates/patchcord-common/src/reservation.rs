//! Deferred-patch table for [`BinaryWriter`](crate::BinaryWriter).
//!
//! A writer emits zero bytes for a value it does not know yet (typically the
//! offset or size of something written later) and receives a [`Reservation`]
//! handle. Once the value is known the handle is passed back to `fill`, which
//! patches the placeholder in place without moving the write position.
//!
//! Handles are move-only, so a slot cannot be filled twice. A handle from a
//! different writer is rejected. A writer refuses to finish while any slot is
//! still unfilled.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::{Error, Result};

static NEXT_OWNER: AtomicU32 = AtomicU32::new(1);

/// Handle to a placeholder emitted by a writer.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "a reservation must be filled before the writer finishes"]
pub struct Reservation {
    owner: u32,
    index: usize,
}

impl Reservation {
    /// Sequence number of this reservation within its writer.
    pub fn id(&self) -> usize {
        self.index
    }
}

/// Where a reservation lives in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Absolute offset of the placeholder.
    pub offset: usize,
    /// Placeholder width in bytes.
    pub width: usize,
}

#[derive(Debug)]
struct Entry {
    slot: Slot,
    filled: bool,
}

/// Registry of reservations for one writer.
#[derive(Debug)]
pub(crate) struct ReservationTable {
    owner: u32,
    entries: Vec<Entry>,
    outstanding: usize,
}

impl ReservationTable {
    pub(crate) fn new() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            entries: Vec::new(),
            outstanding: 0,
        }
    }

    /// Record a placeholder and hand out its handle.
    pub(crate) fn record(&mut self, offset: usize, width: usize) -> Reservation {
        let index = self.entries.len();
        self.entries.push(Entry {
            slot: Slot { offset, width },
            filled: false,
        });
        self.outstanding += 1;
        Reservation {
            owner: self.owner,
            index,
        }
    }

    /// Look up an unfilled reservation.
    pub(crate) fn slot(&self, reservation: &Reservation) -> Result<Slot> {
        let unknown = || Error::UnknownReservation {
            id: reservation.index,
        };
        if reservation.owner != self.owner {
            return Err(unknown());
        }
        match self.entries.get(reservation.index) {
            Some(entry) if !entry.filled => Ok(entry.slot),
            _ => Err(unknown()),
        }
    }

    /// Mark a reservation as filled, consuming its handle.
    pub(crate) fn consume(&mut self, reservation: Reservation) {
        if reservation.owner != self.owner {
            return;
        }
        if let Some(entry) = self.entries.get_mut(reservation.index) {
            if !entry.filled {
                entry.filled = true;
                self.outstanding -= 1;
            }
        }
    }

    /// Number of reservations not yet filled.
    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Fail unless every reservation has been filled.
    pub(crate) fn ensure_closed(&self) -> Result<()> {
        if self.outstanding == 0 {
            return Ok(());
        }
        let first_offset = self
            .entries
            .iter()
            .find(|entry| !entry.filled)
            .map(|entry| entry.slot.offset)
            .unwrap_or_default();
        Err(Error::UnfilledReservations {
            count: self.outstanding,
            first_offset,
        })
    }
}
