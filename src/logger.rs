//! Core buffered-write engine.
//!
//! This module provides [`LogContext`], which owns the staging buffer, the
//! log session, and the concurrency gate, and exposes the public write
//! surface plus the call-site macros.

use std::fmt;

use chrono::Local;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::format::render_line;
use crate::hex;
use crate::storage::{StorageDevice, StorageError, StorageFile};

/// Device-root path of the backing logfile.
pub const LOG_FILE_NAME: &str = "/sdlog.log";

/// Staging buffer capacity of [`DebugLog`]: 4 MiB.
pub const LOG_BUF_CAPACITY: usize = 0x40_0000;

pub(crate) const CRLF: &str = "\r\n";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 64 underscores plus CRLF, written once at the start of every session that
/// appends to a non-empty logfile.
const SESSION_SEPARATOR: &str =
    "________________________________________________________________\r\n";

/// Internal outcome of a private operation.
///
/// None of these ever reach a caller; the public surface swallows them so
/// logging cannot alter the behavior of the system it instruments. They exist
/// so failure paths are testable.
#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("required input is empty")]
    EmptyInput,
    #[error("staging buffer allocation failed")]
    BufferAlloc,
    #[error("log line rendering failed")]
    Format,
    #[error("flush left pending bytes behind")]
    PartialFlush,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One open connection to the backing logfile.
struct Session {
    file: Box<dyn StorageFile>,
    /// Next write position. Monotonically non-decreasing for the lifetime of
    /// the session.
    offset: u64,
}

/// All mutable state, guarded by the single lock in [`LogContext`].
///
/// Methods here never lock; the outermost public entry points acquire the
/// gate exactly once and delegate.
struct Inner<const CAP: usize> {
    device: Box<dyn StorageDevice>,
    session: Option<Session>,
    buffer: Option<Vec<u8>>,
    force_flush: bool,
}

impl<const CAP: usize> Inner<CAP> {
    fn write_text(&mut self, s: &str) -> Result<(), Error> {
        if s.is_empty() {
            return Err(Error::EmptyInput);
        }
        self.ensure_buffer()?;
        self.ensure_session()?;
        self.append_bytes(s.as_bytes())
    }

    fn write_formatted(
        &mut self,
        file: &str,
        line: u32,
        func: &str,
        args: fmt::Arguments<'_>,
    ) -> Result<(), Error> {
        if file.is_empty() || func.is_empty() || is_empty_template(&args) {
            return Err(Error::EmptyInput);
        }
        self.ensure_buffer()?;
        self.ensure_session()?;
        let rendered = render_line(Local::now(), file, line, func, args).ok_or(Error::Format)?;
        self.append_bytes(rendered.as_bytes())
    }

    /// Lazily allocates the staging buffer.
    fn ensure_buffer(&mut self) -> Result<(), Error> {
        if self.buffer.is_none() {
            let mut buf = Vec::new();
            buf.try_reserve_exact(CAP).map_err(|_| Error::BufferAlloc)?;
            self.buffer = Some(buf);
        }
        Ok(())
    }

    /// Guarantees an open session with a seeded offset and its marker written.
    ///
    /// On any failure past the open, the handle is dropped (closing it) and
    /// the session stays unset, so the next call retries from scratch.
    fn ensure_session(&mut self) -> Result<(), Error> {
        if self.session.is_some() {
            return Ok(());
        }

        // Creation fails when the logfile already exists; that is expected.
        let _ = self.device.create_file(LOG_FILE_NAME);

        let mut file = self.device.open_file(LOG_FILE_NAME)?;
        let mut offset = file.size()?;

        let marker: &[u8] = if offset == 0 {
            UTF8_BOM
        } else {
            SESSION_SEPARATOR.as_bytes()
        };
        file.write_at(offset, marker, true)?;
        offset += marker.len() as u64;

        debug!(offset, "log session opened");
        self.session = Some(Session { file, offset });
        Ok(())
    }

    /// Appends a block of rendered text, flushing or bypassing the buffer as
    /// its length demands.
    fn append_bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        if data.len() < CAP {
            let fill = self.buffer.as_ref().map_or(0, Vec::len);
            if fill + data.len() >= CAP {
                self.drain_for_append()?;
            }
            if let Some(buffer) = self.buffer.as_mut() {
                buffer.extend_from_slice(data);
            }
        } else {
            // Oversized payload: bypass the buffer with capacity-sized
            // chunks, each flushed to the medium on its own.
            self.drain_for_append()?;

            let Some(session) = self.session.as_mut() else {
                return Ok(());
            };
            let mut rest = data;
            while rest.len() >= CAP {
                let (chunk, tail) = rest.split_at(CAP);
                if let Err(err) = session.file.write_at(session.offset, chunk, true) {
                    // No rollback of chunks that already landed.
                    warn!(%err, "chunked write failed, dropping payload remainder");
                    return Err(err.into());
                }
                session.offset += CAP as u64;
                rest = tail;
            }
            if !rest.is_empty() {
                if let Some(buffer) = self.buffer.as_mut() {
                    buffer.extend_from_slice(rest);
                }
            }
        }

        if self.force_flush {
            let _ = self.flush_pending();
        }
        Ok(())
    }

    /// Flushes ahead of an append that needs the buffer empty. A flush that
    /// leaves bytes behind aborts the append.
    fn drain_for_append(&mut self) -> Result<(), Error> {
        let _ = self.flush_pending();
        if self.buffer.as_ref().is_some_and(|buf| !buf.is_empty()) {
            return Err(Error::PartialFlush);
        }
        Ok(())
    }

    /// Writes the buffered bytes at the current offset and resets the length
    /// counter. On write failure the buffer is kept for a later attempt.
    fn flush_pending(&mut self) -> Result<(), Error> {
        let (Some(session), Some(buffer)) = (self.session.as_mut(), self.buffer.as_mut()) else {
            return Ok(());
        };
        if buffer.is_empty() {
            return Ok(());
        }
        if let Err(err) = session.file.write_at(session.offset, buffer, true) {
            warn!(pending = buffer.len(), %err, "flush failed, keeping buffered bytes");
            return Err(err.into());
        }
        session.offset += buffer.len() as u64;
        buffer.clear();
        Ok(())
    }

    /// Full teardown: best-effort flush, close, commit, free the buffer.
    fn close(&mut self) {
        let _ = self.flush_pending();
        if self.session.take().is_some() {
            if let Err(err) = self.device.commit() {
                debug!(%err, "storage commit failed on close");
            }
            debug!("log session closed");
        }
        self.buffer = None;
    }
}

fn is_empty_template(args: &fmt::Arguments<'_>) -> bool {
    matches!(args.as_str(), Some(""))
}

/// Buffered debug logger writing to a single append-only logfile.
///
/// The context owns the staging buffer (capacity `CAP` bytes), the session
/// state, and a single lock that serializes every public operation. It is
/// `Send + Sync`; share it behind an `Arc` to log from multiple threads.
///
/// All operations are infallible from the caller's point of view: invalid
/// input, allocation failure, and storage errors are contained internally,
/// and the only observable effect of a failure is missing log content.
///
/// # Type Parameters
///
/// * `CAP` - Staging buffer capacity in bytes. Payloads of `CAP` bytes or
///   more bypass the buffer and go to storage in `CAP`-sized chunks.
pub struct LogContext<const CAP: usize> {
    inner: Mutex<Inner<CAP>>,
}

/// The standard context shape: a 4 MiB staging buffer.
pub type DebugLog = LogContext<LOG_BUF_CAPACITY>;

impl<const CAP: usize> LogContext<CAP> {
    /// Creates a context over the given storage device.
    ///
    /// Nothing touches the device until the first write: the staging buffer
    /// is allocated and the logfile created/opened lazily.
    pub fn new(device: impl StorageDevice + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner {
                device: Box::new(device),
                session: None,
                buffer: None,
                force_flush: false,
            }),
        }
    }

    /// Flushes the buffer after every accepted write. Off by default; meant
    /// for environments that need durability over throughput.
    pub fn force_flush(mut self, on: bool) -> Self {
        self.inner.get_mut().force_flush = on;
        self
    }

    /// Appends `s` to the log as-is. No-op when `s` is empty.
    pub fn write_text(&self, s: &str) {
        let _ = self.inner.lock().write_text(s);
    }

    /// Appends one timestamped, source-located line. No-op when `file`,
    /// `func`, or the message template is empty.
    ///
    /// Prefer the [`log_msg!`](crate::log_msg) macro, which fills in the
    /// location fields from the call site.
    pub fn write_formatted(&self, file: &str, line: u32, func: &str, args: fmt::Arguments<'_>) {
        let _ = self.inner.lock().write_formatted(file, line, func, args);
    }

    /// Appends a formatted header line followed by a line holding the
    /// uppercase hex rendition of `data`, both under one lock acquisition.
    /// No-op when `data`, `func`, or the message template is empty.
    pub fn write_binary(&self, data: &[u8], file: &str, line: u32, func: &str, args: fmt::Arguments<'_>) {
        if data.is_empty() || func.is_empty() || is_empty_template(&args) {
            return;
        }

        // Hex rendering happens outside the gate.
        let mut hex_line = hex::encode_upper(data);
        hex_line.push_str(CRLF);

        let mut inner = self.inner.lock();
        let _ = inner.write_formatted(file, line, func, args);
        let _ = inner.write_text(&hex_line);
    }

    /// Writes any pending buffered bytes to storage immediately. No-op when
    /// nothing is pending or no session is open.
    pub fn flush(&self) {
        let _ = self.inner.lock().flush_pending();
    }

    /// Flushes pending content, closes the logfile, asks the device to
    /// commit, and frees the staging buffer. Idempotent; the next write
    /// after a close starts a fresh session.
    pub fn close(&self) {
        self.inner.lock().close();
    }
}

impl<const CAP: usize> Drop for LogContext<CAP> {
    fn drop(&mut self) {
        self.inner.get_mut().close();
    }
}

/// Appends a plain text block to the log.
///
/// Compiles to nothing when the `debug-log` feature is disabled.
#[macro_export]
macro_rules! log_text {
    ($ctx:expr, $s:expr) => {{
        if $crate::DEBUG_LOG_ENABLED {
            $ctx.write_text($s);
        }
    }};
}

/// Appends one formatted log line, capturing the source file, line number,
/// and enclosing function name from the call site.
///
/// # Examples
///
/// ```
/// # use sdlog::{log_msg, DebugLog, FsDevice};
/// # let dir = tempfile::tempdir().unwrap();
/// # let log = DebugLog::new(FsDevice::new(dir.path()));
/// log_msg!(log, "cache ready, {} entries", 3);
/// ```
#[macro_export]
macro_rules! log_msg {
    ($ctx:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        if $crate::DEBUG_LOG_ENABLED {
            $ctx.write_formatted(
                file!(),
                line!(),
                $crate::__function_name!(),
                format_args!($fmt $(, $arg)*),
            );
        }
    }};
}

/// Appends a formatted header line followed by the uppercase hex dump of a
/// byte slice.
#[macro_export]
macro_rules! log_bin {
    ($ctx:expr, $data:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        if $crate::DEBUG_LOG_ENABLED {
            $ctx.write_binary(
                $data,
                file!(),
                line!(),
                $crate::__function_name!(),
                format_args!($fmt $(, $arg)*),
            );
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        name.rsplit("::").next().unwrap_or(name)
    }};
}
