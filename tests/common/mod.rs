//! Shared test utilities for port engine tests.
//!
//! - A recording listener capturing every callback in order
//! - Port construction over a mock transport and a manual clock

#![allow(dead_code)]

use lineport::engine::{ManualClock, Port, PortSettings};
use lineport::port::{MockTransport, PortListener};
use std::cell::RefCell;

/// A single listener callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Partial(Vec<u8>),
    PartialUpdate(Vec<u8>, usize),
    LineComplete(Vec<u8>),
}

/// Listener that records every callback.
#[derive(Debug, Default)]
pub struct RecordingListener {
    calls: RefCell<Vec<Callback>>,
}

impl RecordingListener {
    pub fn calls(&self) -> Vec<Callback> {
        self.calls.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Callback::LineComplete(l) => Some(String::from_utf8_lossy(l).into_owned()),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<(String, usize)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Callback::PartialUpdate(b, n) => Some((String::from_utf8_lossy(b).into_owned(), *n)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl PortListener for RecordingListener {
    fn on_partial(&self, buffer: &[u8]) {
        self.calls.borrow_mut().push(Callback::Partial(buffer.to_vec()));
    }

    fn on_partial_update(&self, buffer: &[u8], len: usize) {
        self.calls
            .borrow_mut()
            .push(Callback::PartialUpdate(buffer.to_vec(), len));
    }

    fn on_line_complete(&self, line: &[u8]) {
        self.calls.borrow_mut().push(Callback::LineComplete(line.to_vec()));
    }
}

/// Everything a test needs to drive a port by hand.
pub struct Harness<'l> {
    pub mock: MockTransport,
    pub clock: ManualClock,
    pub port: Port<'l, MockTransport, ManualClock>,
}

/// Build a port over a fresh mock, with the clock starting at zero.
pub fn harness<'l>(settings: PortSettings) -> Harness<'l> {
    let clock = ManualClock::new(0);
    let mock = MockTransport::new();
    let port = Port::with_clock("TEST", mock.clone(), clock.clone(), settings);
    Harness { mock, clock, port }
}

/// Same as [`harness`], with the port already opened by one `listen` call.
pub fn open_harness<'l>(settings: PortSettings) -> Harness<'l> {
    let mut h = harness(settings);
    h.port.listen(10);
    assert!(h.port.is_open(), "mock port should open on first listen");
    h.mock.reset_counters();
    h
}
