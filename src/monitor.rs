//! The scheduling loop and line printer behind `line-monitor`.

use crate::config::{MonitorConfig, OutputFormat};
use crate::engine::{Clock, Port};
use crate::port::{PortListener, Transport};
use serde::Serialize;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::io::Write;
use tracing::{info, warn};

/// One printed line in `json` output mode.
#[derive(Debug, Serialize)]
pub struct LineRecord<'a> {
    pub port: &'a str,
    pub seq: u64,
    pub len: usize,
    pub line: Cow<'a, str>,
}

/// Listener that writes every completed line to `out`.
///
/// Write failures cannot be returned from a callback, so the first one is
/// logged and the rest are only counted.
pub struct LinePrinter<W: Write> {
    port_name: String,
    format: OutputFormat,
    out: RefCell<W>,
    lines: Cell<u64>,
    write_errors: Cell<u64>,
}

impl<W: Write> LinePrinter<W> {
    pub fn new(port_name: impl Into<String>, format: OutputFormat, out: W) -> Self {
        Self {
            port_name: port_name.into(),
            format,
            out: RefCell::new(out),
            lines: Cell::new(0),
            write_errors: Cell::new(0),
        }
    }

    pub fn lines(&self) -> u64 {
        self.lines.get()
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors.get()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_line(&self, line: &[u8], seq: u64) -> crate::error::AppResult<()> {
        let mut out = self.out.borrow_mut();
        match self.format {
            OutputFormat::Plain => {
                out.write_all(line)?;
                out.write_all(b"\n")?;
            }
            OutputFormat::Json => {
                let record = LineRecord {
                    port: &self.port_name,
                    seq,
                    len: line.len(),
                    line: String::from_utf8_lossy(line),
                };
                serde_json::to_writer(&mut *out, &record)?;
                out.write_all(b"\n")?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

impl<W: Write> PortListener for LinePrinter<W> {
    fn on_line_complete(&self, line: &[u8]) {
        let seq = self.lines.get() + 1;
        self.lines.set(seq);

        if let Err(e) = self.write_line(line, seq) {
            if self.write_errors.get() == 0 {
                warn!(port = %self.port_name, error = %e, "Cannot write line");
            }
            self.write_errors.set(self.write_errors.get() + 1);
        }
    }
}

/// Call `listen` once per tick until `keep_running` returns false.
///
/// Open/closed transitions are logged here, since the engine itself keeps
/// quiet about them.
pub fn run<T, C, F>(port: &mut Port<'_, T, C>, config: &MonitorConfig, mut keep_running: F)
where
    T: Transport,
    C: Clock,
    F: FnMut() -> bool,
{
    let mut was_open = port.is_open();
    info!(
        port = %port.name(),
        speed = port.speed(),
        budget_ms = config.budget_ms,
        tick_ms = config.tick_ms,
        "Monitoring"
    );

    while keep_running() {
        port.listen(config.budget_ms);

        let open = port.is_open();
        if open != was_open {
            if open {
                info!(port = %port.name(), speed = port.last_speed(), "Connected");
            } else {
                info!(port = %port.name(), bytes = port.bytes_received(), "Disconnected");
            }
            was_open = open;
        }

        if !config.tick().is_zero() {
            std::thread::sleep(config.tick());
        }
    }
}
