pub use log::debug;

/// Print a debug message if either the global debug log level is active, or a local debug flag
/// is set
///
/// With the local flag set, the message bypasses the logger and goes straight to stderr, so that
/// tracing for a single component can be enabled without the full debug log.
///
/// # Examples
///
/// ```ignore
/// debug_msg!(false, "Merging cluster {}", x); // debug log message, shown with --debug
/// debug_msg!(true, "Merging cluster {}", x); // always printed to stderr
/// ```
macro_rules! debug_msg {
    ($flag:expr, $($arg:tt)+) => {
        if $flag {
            eprintln!($($arg)+);
        } else {
            $crate::log_utils::debug!($($arg)+);
        }
    }
}

pub(crate) use debug_msg;
