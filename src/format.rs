//! Log line rendering.
//!
//! Every formatted log line has the fixed layout
//! `[YYYY-MM-DD HH:MM:SS.nnnnnnnnn] <file>:<line>:<func> -> <message>` with a
//! CRLF terminator. The clock sample is taken by the caller so rendering
//! stays pure and testable against a fixed instant.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Local};

use crate::logger::CRLF;

/// Renders one complete log line into a growable string.
///
/// Returns `None` when formatting fails, i.e. a `Display` impl behind
/// `args` reports an error. The line grows to whatever length the message
/// needs; nothing is ever truncated.
pub(crate) fn render_line(
    stamp: DateTime<Local>,
    file: &str,
    line: u32,
    func: &str,
    args: fmt::Arguments<'_>,
) -> Option<String> {
    let mut out = String::new();
    write!(
        out,
        "[{}] {}:{}:{} -> ",
        stamp.format("%Y-%m-%d %H:%M:%S.%f"),
        file,
        line,
        func
    )
    .ok()?;
    out.write_fmt(args).ok()?;
    out.push_str(CRLF);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn fixed_stamp() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 3, 7, 4, 5, 6)
            .unwrap()
            .with_nanosecond(12_345)
            .unwrap()
    }

    #[test]
    fn test_line_layout() {
        let line = render_line(fixed_stamp(), "main.c", 42, "run", format_args!("value={}", 7))
            .expect("rendering should succeed");
        assert_eq!(line, "[2026-03-07 04:05:06.000012345] main.c:42:run -> value=7\r\n");
    }

    #[test]
    fn test_nanoseconds_zero_padded_to_nine_digits() {
        let line = render_line(fixed_stamp(), "a.c", 1, "f", format_args!("x")).unwrap();
        let frac = line
            .split('.')
            .nth(1)
            .and_then(|rest| rest.split(']').next())
            .expect("line should carry a fractional-seconds field");
        assert_eq!(frac.len(), 9);
        assert!(frac.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_crlf_terminator() {
        let line = render_line(fixed_stamp(), "a.c", 1, "f", format_args!("msg")).unwrap();
        assert!(line.ends_with("\r\n"));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_failing_display_aborts() {
        struct Broken;
        impl std::fmt::Display for Broken {
            fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                Err(std::fmt::Error)
            }
        }

        let rendered = render_line(fixed_stamp(), "a.c", 1, "f", format_args!("{}", Broken));
        assert!(rendered.is_none(), "A failing Display impl should abort rendering");
    }

    #[test]
    fn test_long_message_not_truncated() {
        let msg = "x".repeat(100_000);
        let line = render_line(fixed_stamp(), "a.c", 1, "f", format_args!("{}", msg)).unwrap();
        assert!(line.contains(&msg));
    }
}
