use parking_lot::Mutex;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::store::Item;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryState {
    Armed,
    Fired,
    Cancelled,
}

/// A deferred expiry armed against a deadline. It fires at most once, and only
/// while still armed.
#[derive(Debug)]
pub struct ExpiryHandle {
    deadline: OffsetDateTime,
    state: ExpiryState,
}

impl ExpiryHandle {
    /// Delays that run past the representable range saturate at the latest
    /// representable instant.
    pub fn arm(now: OffsetDateTime, delay: Duration) -> Self {
        let deadline = now
            .checked_add(delay)
            .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_offset(now.offset()));
        Self {
            deadline,
            state: ExpiryState::Armed,
        }
    }

    pub fn state(&self) -> ExpiryState {
        self.state
    }

    /// No-op unless armed.
    pub fn cancel(&mut self) {
        if self.state == ExpiryState::Armed {
            self.state = ExpiryState::Cancelled;
        }
    }

    /// Returns true exactly once, on the first poll at or after the deadline.
    pub fn poll(&mut self, now: OffsetDateTime) -> bool {
        if self.state == ExpiryState::Armed && now >= self.deadline {
            self.state = ExpiryState::Fired;
            return true;
        }
        false
    }

    fn is_due(&self, now: OffsetDateTime) -> bool {
        self.state() != ExpiryState::Armed || now >= self.deadline
    }
}

#[derive(Debug)]
struct UndoSlot {
    snapshot: Item,
    expiry: ExpiryHandle,
}

/// Single-slot holding area for the most recently deleted item.
#[derive(Debug, Default)]
pub struct UndoBuffer {
    slot: Option<UndoSlot>,
}

impl UndoBuffer {
    /// Stores `snapshot`, cancelling and returning whatever was held before.
    pub fn capture(&mut self, snapshot: Item, expiry: ExpiryHandle) -> Option<Item> {
        let previous = self.slot.replace(UndoSlot { snapshot, expiry });
        previous.map(|mut slot| {
            slot.expiry.cancel();
            slot.snapshot
        })
    }

    /// Fires the expiry if due; returns the discarded snapshot when it does.
    pub fn poll(&mut self, now: OffsetDateTime) -> Option<Item> {
        let fired = match self.slot.as_mut() {
            Some(slot) => slot.expiry.poll(now),
            None => false,
        };
        if fired {
            self.slot.take().map(|slot| slot.snapshot)
        } else {
            None
        }
    }

    /// Takes the snapshot back out if its window is still open.
    pub fn restore(&mut self, now: OffsetDateTime) -> Option<Item> {
        if self.poll(now).is_some() {
            return None;
        }
        let mut slot = self.slot.take()?;
        slot.expiry.cancel();
        Some(slot.snapshot)
    }

    pub fn live(&self, now: OffsetDateTime) -> Option<&Item> {
        self.slot
            .as_ref()
            .filter(|slot| !slot.expiry.is_due(now))
            .map(|slot| &slot.snapshot)
    }
}
