use std::str::FromStr;

use log::LevelFilter;

/// Initialize the global logger from a textual level ("trace", "debug",
/// "info", "warn", "error"). Falls back to `info` for an unrecognized level
/// rather than failing startup over a typo'd flag.
pub fn init(level: &str) {
    let level = LevelFilter::from_str(level).unwrap_or(LevelFilter::Info);

    env_logger::Builder::new().format_timestamp_millis().filter(None, level).init();
}
