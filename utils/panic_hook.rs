use std::{backtrace, panic};

/// Installs a process-wide hook that prints the panic message together with
/// a forced backtrace to stderr, so startup failures are loud even without
/// RUST_BACKTRACE set.
pub fn init() {
    panic::set_hook(Box::new(|info| {
        let backtrace = backtrace::Backtrace::force_capture();
        eprintln!("{info}\n\n{backtrace}");
    }));
}
