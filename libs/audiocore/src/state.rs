//! The device state machine (§4.6): five states, transitions serialized by
//! the device mutex, observed lock-free elsewhere via atomic loads.

use std::sync::atomic::{AtomicU8, Ordering};

/// One of the five states a device can be in between `open` and `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceState {
    Uninitialized = 0,
    Stopped = 1,
    Starting = 2,
    Started = 3,
    Stopping = 4,
}

impl DeviceState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => DeviceState::Uninitialized,
            1 => DeviceState::Stopped,
            2 => DeviceState::Starting,
            3 => DeviceState::Started,
            4 => DeviceState::Stopping,
            _ => unreachable!("invalid device state byte {v}"),
        }
    }
}

/// An atomic cell holding a [`DeviceState`].
///
/// Transitions happen under the device mutex; the worker and any other
/// reader load the value without taking that mutex, per §5.
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new(initial: DeviceState) -> Self {
        StateCell(AtomicU8::new(initial as u8))
    }

    #[inline]
    pub fn load(&self) -> DeviceState {
        DeviceState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn store(&self, state: DeviceState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_state() {
        let cell = StateCell::new(DeviceState::Uninitialized);
        for state in [
            DeviceState::Stopped,
            DeviceState::Starting,
            DeviceState::Started,
            DeviceState::Stopping,
            DeviceState::Uninitialized,
        ] {
            cell.store(state);
            assert_eq!(cell.load(), state);
        }
    }
}
