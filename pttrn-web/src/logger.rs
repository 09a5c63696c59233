//! `log` backend writing to the browser console.

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;

pub struct ConsoleLogger {
    level: LevelFilter,
}

static LOGGER: ConsoleLogger = ConsoleLogger::new(LevelFilter::Info);

impl ConsoleLogger {
    #[must_use]
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// Installs the console logger at `Info`. Returns `false` when another
    /// logger was already installed.
    pub fn init() -> bool {
        let installed = log::set_logger(&LOGGER).is_ok();
        if installed {
            log::set_max_level(LOGGER.level);
        }
        installed
    }
}

/// The console line for `record`: `[LEVEL target] message`.
#[must_use]
pub fn format_record(record: &Record<'_>) -> String {
    format!("[{} {}] {}", record.level(), record.target(), record.args())
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from(format_record(record));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}
