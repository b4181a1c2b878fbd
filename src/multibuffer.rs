/*!
Multibuffering index protocol.

This implements the slot bookkeeping behind a texture stream.  The main idea is,

1.  We have N slots, each able to hold one complete upload.
2.  The producer writes slots round-robin, one slot per upload.
3.  The consumer reads whichever slot most recently finished its upload.
4.  The producer never writes the slot the consumer reads.  When the next slot in the ring is the
    read slot, the upload is dropped instead of waiting.

Whether a slot has finished is supplied by the caller as a predicate, so the protocol here is
independent of fences and devices.
*/

/// Read/write cursors over a ring of slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlotRing {
    slots: usize,
    write: usize,
    read: usize,
}

impl SlotRing {
    pub fn new(slots: usize) -> Self {
        assert!(slots > 0, "SlotRing needs at least one slot");
        SlotRing {
            slots,
            write: 0,
            read: 0,
        }
    }

    pub fn write_index(&self) -> usize {
        self.write
    }

    pub fn read_index(&self) -> usize {
        self.read
    }

    pub fn reset(&mut self) {
        self.write = 0;
        self.read = 0;
    }

    /// Slots from the write cursor backwards, wrapping, each slot once.
    pub fn freshest_first(&self) -> impl Iterator<Item = usize> + use<> {
        let (slots, write) = (self.slots, self.write);
        (0..slots).map(move |n| (write + slots - n) % slots)
    }

    /**
    Moves the read cursor to the freshest finished slot that is not older than the current read.

    `finished` is called for slots in [SlotRing::freshest_first] order until it first returns
    true.  The scan ends at the read slot: everything past it was written before the data
    already being read.  Returns whether a finished slot was found; if not, the read cursor
    stays put.
    */
    pub fn refresh_read<F: FnMut(usize) -> bool>(&mut self, mut finished: F) -> bool {
        for slot in self.freshest_first() {
            if finished(slot) {
                self.read = slot;
                return true;
            }
            if slot == self.read {
                break;
            }
        }
        false
    }

    /**
    Claims the next slot for writing.

    With one slot this is always slot 0.  Otherwise the read cursor is refreshed first, then the
    write cursor steps forward; if it would land on the read slot it steps back and `None`
    is returned.
    */
    pub fn advance_write<F: FnMut(usize) -> bool>(&mut self, finished: F) -> Option<usize> {
        if self.slots == 1 {
            self.write = 0;
            return Some(0);
        }
        self.refresh_read(finished);
        let next = (self.write + 1) % self.slots;
        if next == self.read {
            None
        } else {
            self.write = next;
            Some(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SlotRing;

    #[test]
    fn scan_starts_at_write_and_wraps() {
        let mut ring = SlotRing::new(3);
        ring.write = 1;
        assert_eq!(ring.freshest_first().collect::<Vec<_>>(), vec![1, 0, 2]);
    }

    #[test]
    fn freshest_signalled_slot_wins() {
        let mut ring = SlotRing::new(3);
        ring.write = 2;
        let signalled = [true, false, true];
        assert!(ring.refresh_read(|slot| signalled[slot]));
        assert_eq!(ring.read_index(), 2);
    }

    #[test]
    fn older_slot_used_when_newer_pending() {
        let mut ring = SlotRing::new(3);
        ring.write = 0;
        ring.read = 1;
        let signalled = [false, false, true];
        assert!(ring.refresh_read(|slot| signalled[slot]));
        assert_eq!(ring.read_index(), 2);
    }

    #[test]
    fn scan_stops_at_read_slot() {
        let mut ring = SlotRing::new(3);
        ring.write = 1;
        ring.read = 0;
        // slot 2 was written before slot 0 and must not replace it
        assert!(!ring.refresh_read(|slot| {
            assert_ne!(slot, 2, "scanned past the read slot");
            false
        }));
        assert_eq!(ring.read_index(), 0);
    }

    #[test]
    fn nothing_signalled_keeps_read() {
        let mut ring = SlotRing::new(2);
        ring.read = 1;
        assert!(!ring.refresh_read(|_| false));
        assert_eq!(ring.read_index(), 1);
    }

    #[test]
    fn advance_refuses_read_slot() {
        let mut ring = SlotRing::new(2);
        assert_eq!(ring.advance_write(|_| false), Some(1));
        assert_eq!(ring.advance_write(|_| false), None);
        assert_eq!(ring.write_index(), 1);
        assert_eq!(ring.read_index(), 0);
    }

    #[test]
    fn advance_follows_reader() {
        let mut ring = SlotRing::new(2);
        assert_eq!(ring.advance_write(|_| false), Some(1));
        // slot 1 finished: reader moves there, slot 0 becomes writable
        assert_eq!(ring.advance_write(|slot| slot == 1), Some(0));
        assert_eq!(ring.read_index(), 1);
    }

    #[test]
    fn single_slot_always_writes_zero() {
        let mut ring = SlotRing::new(1);
        for _ in 0..3 {
            assert_eq!(ring.advance_write(|_| panic!("single slot never scans")), Some(0));
        }
    }
}
