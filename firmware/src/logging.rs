//! `log` records from the core crate, forwarded to defmt over RTT.

pub use log::Level;
use log::{Metadata, Record};

use defmt::Display2Format;

struct DefmtLogger;

static LOGGER: DefmtLogger = DefmtLogger;

pub fn init(level: Level) {
    // Only fails if a logger is already installed, which leaves that one in charge.
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level.to_level_filter());
    }
}

impl log::Log for DefmtLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let args = Display2Format(record.args());
        match record.level() {
            Level::Trace => defmt::trace!("{}: {}", record.target(), args),
            Level::Debug => defmt::debug!("{}: {}", record.target(), args),
            Level::Info => defmt::info!("{}", args),
            Level::Warn => defmt::warn!("{}", args),
            Level::Error => defmt::error!("{}", args),
        }
    }

    fn flush(&self) {}
}
