//! # sdlog
//!
//! A debug-mode logging library for resource-constrained targets that stages
//! diagnostic text in a fixed-capacity memory buffer and appends it to a
//! single logfile on removable storage.
//!
//! ## Key Features
//!
//! * Fixed 4 MiB staging buffer, flushed automatically when a write would
//!   cross capacity
//! * Oversized payloads bypass the buffer in capacity-sized chunks
//! * One-time session markers: UTF-8 BOM for a fresh logfile, an underscore
//!   separator line when appending to an existing one
//! * Timestamped, source-located lines and uppercase hex dumps of binary data
//! * A single lock serializes all writers; logging never surfaces errors to
//!   its callers
//!
//! ## Main Components
//!
//! * `LogContext`: the logging engine; `DebugLog` is the 4 MiB alias
//! * `StorageDevice` / `StorageFile`: the storage seam; `FsDevice` implements
//!   it over a local directory
//! * `log_text!` / `log_msg!` / `log_bin!`: call-site macros that capture the
//!   source location and compile out with the `debug-log` feature disabled
//!
//! ## Quick Start
//!
//! ```
//! use sdlog::{log_bin, log_msg, log_text, DebugLog, FsDevice};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let log = DebugLog::new(FsDevice::new(dir.path()));
//!
//! log_text!(log, "raw line\r\n");
//! log_msg!(log, "cache ready, {} entries", 3);
//! log_bin!(log, &[0xDE, 0xAD], "payload:");
//!
//! log.flush();
//! log.close();
//! ```

mod format;
pub mod hex;
pub mod logger;
pub mod storage;

pub use logger::{DebugLog, LogContext, LOG_BUF_CAPACITY, LOG_FILE_NAME};
pub use storage::{FsDevice, StorageDevice, StorageError, StorageFile};

/// Whether the call-site macros were compiled in.
#[doc(hidden)]
pub const DEBUG_LOG_ENABLED: bool = cfg!(feature = "debug-log");
