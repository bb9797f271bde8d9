//! The Port engine: one time-budgeted polling entry point tying a
//! [`Transport`], the connection lifecycle and the line buffer together.

use super::clock::{Clock, SystemClock};
use super::framing::{LineBuffer, LineEvent, OverflowPolicy, PORT_BUFFER_SIZE};
use super::lifecycle::{Lifecycle, Maintenance, DEFAULT_BACKOFF_MS};
use crate::port::{PortListener, Transport};
use tracing::{debug, warn};

/// Port names longer than this are cut (at a char boundary).
pub const MAX_PORT_NAME_LEN: usize = 15;

/// Speed a port starts with unless told otherwise.
pub const DEFAULT_PORT_SPEED: u32 = 38400;

/// Construction-time knobs for a [`Port`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSettings {
    pub speed: u32,
    pub backoff_ms: u64,
    pub buffer_capacity: usize,
    pub overflow: OverflowPolicy,
    /// Keep a half-received line across a close/reopen instead of
    /// discarding it.
    pub keep_partial_on_close: bool,
    pub trace: bool,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            speed: DEFAULT_PORT_SPEED,
            backoff_ms: DEFAULT_BACKOFF_MS,
            buffer_capacity: PORT_BUFFER_SIZE,
            overflow: OverflowPolicy::Wrap,
            keep_partial_on_close: false,
            trace: false,
        }
    }
}

/// A line-oriented serial port.
///
/// Drive it by calling [`listen`](Self::listen) from the scheduling loop.
/// Everything else (reconnects, speed changes, line assembly) happens inside
/// those calls. The listener is borrowed, never owned: it must outlive the
/// port's use of it.
///
/// # Example
/// ```
/// use lineport::engine::{ManualClock, Port, PortSettings};
/// use lineport::port::{MockTransport, PortListener};
/// use std::cell::RefCell;
///
/// #[derive(Default)]
/// struct Lines(RefCell<Vec<String>>);
///
/// impl PortListener for Lines {
///     fn on_line_complete(&self, line: &[u8]) {
///         self.0.borrow_mut().push(String::from_utf8_lossy(line).into_owned());
///     }
/// }
///
/// let lines = Lines::default();
/// let mut transport = MockTransport::new();
/// transport.enqueue_line("$GPGGA,1");
///
/// let mut port = Port::with_clock("gps", transport, ManualClock::new(0), PortSettings::default());
/// port.set_listener(&lines);
/// port.listen(50);
///
/// assert_eq!(*lines.0.borrow(), vec!["$GPGGA,1".to_string()]);
/// ```
pub struct Port<'l, T, C = SystemClock> {
    name: String,
    transport: T,
    clock: C,
    lifecycle: Lifecycle,
    line: LineBuffer,
    bytes_received: u64,
    lines_received: u64,
    keep_partial_on_close: bool,
    trace: bool,
    listener: Option<&'l dyn PortListener>,
}

impl<'l, T: Transport> Port<'l, T, SystemClock> {
    pub fn new(name: &str, transport: T) -> Self {
        Self::with_settings(name, transport, PortSettings::default())
    }

    pub fn with_settings(name: &str, transport: T, settings: PortSettings) -> Self {
        Self::with_clock(name, transport, SystemClock::new(), settings)
    }
}

impl<'l, T: Transport, C: Clock> Port<'l, T, C> {
    pub fn with_clock(name: &str, transport: T, clock: C, settings: PortSettings) -> Self {
        Self {
            name: bounded_name(name),
            transport,
            clock,
            lifecycle: Lifecycle::new(settings.speed, settings.backoff_ms),
            line: LineBuffer::new(settings.buffer_capacity, settings.overflow),
            bytes_received: 0,
            lines_received: 0,
            keep_partial_on_close: settings.keep_partial_on_close,
            trace: settings.trace,
            listener: None,
        }
    }

    /// Poll the port for at most `budget_ms`.
    ///
    /// Runs lifecycle maintenance once, then reads byte by byte until the
    /// transport has nothing more, faults, or the budget runs out. A single
    /// read may overshoot the budget if the transport blocks.
    pub fn listen(&mut self, budget_ms: u64) {
        let t0 = self.clock.now_ms();

        match self.lifecycle.maintain(&mut self.transport, t0, &self.name) {
            Maintenance::Open => {}
            Maintenance::SpeedReset => {
                self.discard_partial();
                return;
            }
            Maintenance::Closed => return,
        }

        while self.clock.now_ms().saturating_sub(t0) < budget_ms {
            match self.transport.read() {
                Ok(Some(byte)) => {
                    self.bytes_received += 1;
                    self.process_byte(byte);
                }
                Ok(None) => return,
                Err(e) => {
                    warn!(port = %self.name, error = %e, "Read failed, closing port");
                    self.close();
                    return;
                }
            }
        }
    }

    /// Open immediately at the desired speed, bypassing backoff. Returns
    /// whether the transport reports open afterwards.
    pub fn open(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.lifecycle.open(&mut self.transport, now, &self.name)
    }

    pub fn close(&mut self) {
        self.transport.close();
        self.discard_partial();
    }

    /// Request a new speed. Takes effect on the next [`listen`](Self::listen),
    /// which closes the port; a later call reopens it at `speed`.
    pub fn set_speed(&mut self, speed: u32) {
        self.lifecycle.set_speed(speed);
    }

    /// Register the listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: &'l dyn PortListener) {
        self.listener = Some(listener);
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Log every completed line at debug level.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    pub fn lines_received(&self) -> u64 {
        self.lines_received
    }

    /// Payload bytes lost to a `Truncate` or capped `Grow` overflow policy.
    pub fn bytes_dropped(&self) -> u64 {
        self.line.dropped()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speed(&self) -> u32 {
        self.lifecycle.desired_speed()
    }

    /// Speed the transport was last opened (or reset) with.
    pub fn last_speed(&self) -> u32 {
        self.lifecycle.last_speed()
    }

    pub fn trace(&self) -> bool {
        self.trace
    }

    /// Bytes received since the last terminator.
    pub fn pending_line(&self) -> &[u8] {
        self.line.as_bytes()
    }

    pub fn line_buffer(&self) -> &LineBuffer {
        &self.line
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn discard_partial(&mut self) {
        if !self.keep_partial_on_close {
            self.line.clear();
        }
    }

    fn process_byte(&mut self, byte: u8) {
        let listener = self.listener;
        let trace = self.trace;
        let name = &self.name;
        let mut completed = false;

        self.line.feed(byte, |event| match event {
            LineEvent::Partial(buffer) => {
                if let Some(l) = listener {
                    l.on_partial_update(buffer, buffer.len());
                    l.on_partial(buffer);
                }
            }
            LineEvent::Complete(line) => {
                if let Some(l) = listener {
                    l.on_line_complete(line);
                }
                if trace {
                    debug!(port = %name, buffer = %String::from_utf8_lossy(line), "Read");
                }
                completed = true;
            }
        });

        if completed {
            self.lines_received += 1;
        }
    }
}

impl<T: Transport, C: Clock> std::fmt::Debug for Port<'_, T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.name)
            .field("transport", &self.transport)
            .field("speed", &self.lifecycle.desired_speed())
            .field("last_speed", &self.lifecycle.last_speed())
            .field("bytes_received", &self.bytes_received)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

fn bounded_name(name: &str) -> String {
    let mut end = name.len().min(MAX_PORT_NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}
