//! `tracing` setup.
//!
//! In the browser every formatted event goes to the developer console, with
//! errors and warnings on their own console channels. Elsewhere errors and
//! warnings go to stderr and the rest to stdout.

use std::io;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Installs the global subscriber. Later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_max_level(Level::DEBUG)
        .with_writer(ConsoleMakeWriter)
        .try_init();
}

/// Buffers one event and flushes it to the console when dropped.
pub struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn emit(&self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }

        #[cfg(target_arch = "wasm32")]
        {
            let v = wasm_bindgen::JsValue::from_str(line);
            match self.level {
                Level::ERROR => web_sys::console::error_1(&v),
                Level::WARN => web_sys::console::warn_1(&v),
                _ => web_sys::console::log_1(&v),
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::io::Write as _;
            let _ = match self.level {
                Level::ERROR | Level::WARN => writeln!(io::stderr(), "{line}"),
                _ => writeln!(io::stdout(), "{line}"),
            };
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        self.emit();
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: Level::INFO,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buf: Vec::new(),
        }
    }
}
