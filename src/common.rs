// Licensed under the Apache-2.0 license

//! Crate-wide helpers shared by the bus drivers.

use core::fmt::Arguments;

/// Sink for driver diagnostics.
///
/// Drivers take a logger as a generic parameter defaulting to [`NoOpLogger`],
/// so a build without a console pays nothing for the log calls.
pub trait Logger {
    fn debug(&mut self, args: Arguments<'_>);
    fn warn(&mut self, args: Arguments<'_>);
    fn error(&mut self, args: Arguments<'_>);
}

/// Logger that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _args: Arguments<'_>) {}
    fn warn(&mut self, _args: Arguments<'_>) {}
    fn error(&mut self, _args: Arguments<'_>) {}
}

/// Forwards driver diagnostics to the `log` facade.
#[cfg(feature = "log")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LogLogger;

#[cfg(feature = "log")]
impl Logger for LogLogger {
    fn debug(&mut self, args: Arguments<'_>) {
        log::debug!("{}", args);
    }

    fn warn(&mut self, args: Arguments<'_>) {
        log::warn!("{}", args);
    }

    fn error(&mut self, args: Arguments<'_>) {
        log::error!("{}", args);
    }
}
