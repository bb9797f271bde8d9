//! Scriptable transport for tests and simulations.
//!
//! Provides a `MockTransport` that replays a queued byte stream without any
//! hardware, can be told to fail opens or reads, and records every call the
//! engine makes so tests can assert on ordering.

use super::error::PortError;
use super::traits::Transport;
use crate::engine::ManualClock;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// One call made against the transport, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Open(u32),
    Close,
    Read,
}

#[derive(Debug, Default)]
struct MockState {
    open: bool,
    read_queue: VecDeque<u8>,
    /// Every byte handed out by a successful read.
    read_log: Vec<u8>,
    /// Bytes ever queued, survives `reset_counters`.
    total_enqueued: usize,
    calls: Vec<Call>,
    fail_open: bool,
    error_on_read: bool,
    fail_next_read: bool,
    open_count: usize,
    close_count: usize,
    read_count: usize,
    last_open_speed: Option<u32>,
    clock: Option<(ManualClock, u64)>,
}

/// Mock transport.
///
/// Clones share state: hand one clone to the [`Port`](crate::engine::Port)
/// and keep another to enqueue data and inspect counters.
///
/// # Example
/// ```
/// use lineport::port::{MockTransport, Transport};
///
/// let mut transport = MockTransport::new();
/// transport.enqueue_line("$GPGLL");
///
/// transport.open(4800).unwrap();
/// assert_eq!(transport.read().unwrap(), Some(b'$'));
/// assert_eq!(transport.available_bytes(), 7);
/// ```
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `clock` by `latency_ms` on every read, so budget handling can
    /// be tested deterministically.
    pub fn with_clock(self, clock: ManualClock, latency_ms: u64) -> Self {
        self.state.lock().clock = Some((clock, latency_ms));
        self
    }

    /// Queue raw bytes, terminators included or not.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        let mut state = self.state.lock();
        state.read_queue.extend(data);
        state.total_enqueued += data.len();
    }

    /// Queue a line followed by CR-LF.
    pub fn enqueue_line(&mut self, line: impl AsRef<[u8]>) {
        let line = line.as_ref();
        let mut state = self.state.lock();
        state.read_queue.extend(line);
        state.read_queue.extend(b"\r\n");
        state.total_enqueued += line.len() + 2;
    }

    pub fn enqueue_lines<I, L>(&mut self, lines: I)
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        for line in lines {
            self.enqueue_line(line);
        }
    }

    /// Make every read report a fault until cleared.
    pub fn set_error_on_read(&mut self, error: bool) {
        self.state.lock().error_on_read = error;
    }

    /// Make only the next read report a fault.
    pub fn fail_next_read(&mut self) {
        self.state.lock().fail_next_read = true;
    }

    /// Make open attempts leave the transport closed.
    pub fn set_fail_open(&mut self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().open_count
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().close_count
    }

    pub fn read_count(&self) -> usize {
        self.state.lock().read_count
    }

    pub fn last_open_speed(&self) -> Option<u32> {
        self.state.lock().last_open_speed
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn read_log(&self) -> Vec<u8> {
        self.state.lock().read_log.clone()
    }

    /// Total bytes queued since construction, terminators included.
    pub fn total_enqueued(&self) -> usize {
        self.state.lock().total_enqueued
    }

    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    pub fn is_read_queue_empty(&self) -> bool {
        self.state.lock().read_queue.is_empty()
    }

    /// Zero counters and forget recorded calls. Queue and flags are kept.
    pub fn reset_counters(&mut self) {
        let mut state = self.state.lock();
        state.open_count = 0;
        state.close_count = 0;
        state.read_count = 0;
        state.calls.clear();
        state.read_log.clear();
    }

    pub fn clear_read_queue(&mut self) {
        self.state.lock().read_queue.clear();
    }
}

impl Transport for MockTransport {
    fn open(&mut self, speed: u32) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.open_count += 1;
        state.last_open_speed = Some(speed);
        state.calls.push(Call::Open(speed));

        if state.fail_open {
            return Err(PortError::not_found("MOCK"));
        }
        state.open = true;
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.close_count += 1;
        state.calls.push(Call::Close);
        state.open = false;
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn read(&mut self) -> Result<Option<u8>, PortError> {
        let mut state = self.state.lock();
        state.read_count += 1;
        state.calls.push(Call::Read);
        if let Some((clock, latency)) = &state.clock {
            clock.advance(*latency);
        }

        if !state.open {
            return Err(PortError::NotOpen);
        }
        if state.error_on_read || state.fail_next_read {
            state.fail_next_read = false;
            return Err(PortError::fault("forced read error"));
        }

        let byte = state.read_queue.pop_front();
        if let Some(b) = byte {
            state.read_log.push(b);
        }
        Ok(byte)
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockTransport")
            .field("open", &state.open)
            .field("available_bytes", &state.read_queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Clock;

    #[test]
    fn test_enqueue_and_read() {
        let mut mock = MockTransport::new();
        mock.enqueue_read(b"Hi");
        mock.open(4800).unwrap();

        assert_eq!(mock.read().unwrap(), Some(b'H'));
        assert_eq!(mock.read().unwrap(), Some(b'i'));
        assert_eq!(mock.read().unwrap(), None);
        assert_eq!(mock.read_count(), 3);
        assert_eq!(mock.read_log(), b"Hi");
    }

    #[test]
    fn test_enqueue_lines_appends_crlf() {
        let mut mock = MockTransport::new();
        mock.enqueue_lines(["A", "BC"]);
        assert_eq!(mock.available_bytes(), 7);
    }

    #[test]
    fn test_total_enqueued_counts_every_queued_byte() {
        let mut mock = MockTransport::new();
        mock.enqueue_line("$GPGLL");
        mock.enqueue_read(b"ab");
        assert_eq!(mock.total_enqueued(), 10);

        mock.open(4800).unwrap();
        mock.read().unwrap();
        mock.reset_counters();
        mock.clear_read_queue();
        assert_eq!(mock.total_enqueued(), 10);
        assert_eq!(mock.available_bytes(), 0);
    }

    #[test]
    fn test_read_when_closed_errors() {
        let mut mock = MockTransport::new();
        mock.enqueue_read(b"x");
        assert!(matches!(mock.read(), Err(PortError::NotOpen)));
        assert_eq!(mock.available_bytes(), 1);
    }

    #[test]
    fn test_forced_errors() {
        let mut mock = MockTransport::new();
        mock.enqueue_read(b"ab");
        mock.open(4800).unwrap();

        mock.fail_next_read();
        assert!(mock.read().is_err());
        assert_eq!(mock.read().unwrap(), Some(b'a'));

        mock.set_error_on_read(true);
        assert!(mock.read().is_err());
        assert!(mock.read().is_err());
        mock.set_error_on_read(false);
        assert_eq!(mock.read().unwrap(), Some(b'b'));
    }

    #[test]
    fn test_fail_open_stays_closed() {
        let mut mock = MockTransport::new();
        mock.set_fail_open(true);
        assert!(mock.open(9600).is_err());
        assert!(!mock.is_open());
        assert_eq!(mock.open_count(), 1);
        assert_eq!(mock.last_open_speed(), Some(9600));
    }

    #[test]
    fn test_close_is_idempotent_and_logged() {
        let mut mock = MockTransport::new();
        mock.open(4800).unwrap();
        mock.close();
        mock.close();
        assert!(!mock.is_open());
        assert_eq!(mock.calls(), vec![Call::Open(4800), Call::Close, Call::Close]);
    }

    #[test]
    fn test_clones_share_state() {
        let mock = MockTransport::new();
        let mut handle = mock.clone();
        handle.enqueue_read(b"xyz");
        assert_eq!(mock.available_bytes(), 3);
    }

    #[test]
    fn test_reads_advance_clock() {
        let clock = ManualClock::new(0);
        let mut mock = MockTransport::new().with_clock(clock.clone(), 3);
        mock.open(4800).unwrap();
        mock.read().unwrap();
        mock.read().unwrap();
        assert_eq!(clock.now_ms(), 6);
    }

    #[test]
    fn test_reset_counters() {
        let mut mock = MockTransport::new();
        mock.enqueue_read(b"q");
        mock.open(4800).unwrap();
        mock.read().unwrap();
        mock.reset_counters();
        assert_eq!(mock.open_count(), 0);
        assert_eq!(mock.read_count(), 0);
        assert!(mock.calls().is_empty());
        assert!(mock.is_open());
    }
}
