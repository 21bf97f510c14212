//! Walkthrough of the logging surface against a real directory.
//!
//! Run with `cargo run --example basic`. Set `RUST_LOG=sdlog=debug` to see
//! the crate's internal diagnostics.

use sdlog::{log_bin, log_msg, log_text, DebugLog, FsDevice, LOG_FILE_NAME};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let dir = std::env::temp_dir().join("sdlog-demo");
    std::fs::create_dir_all(&dir).expect("create demo directory");

    let device = FsDevice::new(&dir);
    let path = device.resolve(LOG_FILE_NAME);

    let log = DebugLog::new(device);

    log_text!(log, "raw text goes in unchanged\r\n");
    log_msg!(log, "startup complete, {} modules loaded", 4);
    log_bin!(log, &[0xDE, 0xAD, 0xBE, 0xEF], "firmware header:");

    log.flush();
    log.close();

    println!("log written to {}", path.display());
    println!("run again to see the session separator between runs");
}
