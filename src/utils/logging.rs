//! Logging configuration for the scanner.

use chrono::Local;
use env_logger::{Builder, Env, Target};
use log::{info, warn, LevelFilter};
use std::io::Write;

const LOG_ENV: &str = "MERCATOR_LOG";

/// Initialize the logging system. `MERCATOR_LOG` overrides `level`.
///
/// Without `MERCATOR_LOG` the writer accepts every level and `level` is
/// applied as the global maximum, so `set_log_level` can change it later.
pub fn init_logging(level: &str) {
    let env = Env::default().filter_or(LOG_ENV, "trace").write_style_or("MERCATOR_LOG_STYLE", "auto");

    Builder::from_env(env)
        .format(|buf, record| {
            let level = record.level();
            let level_color = match level {
                | log::Level::Error => "\x1b[31m", // Red
                | log::Level::Warn => "\x1b[33m",  // Yellow
                | log::Level::Info => "\x1b[32m",  // Green
                | log::Level::Debug => "\x1b[36m", // Cyan
                | log::Level::Trace => "\x1b[35m", // Magenta
            };
            let reset = "\x1b[0m";

            writeln!(
                buf,
                "{} {}{:5}{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                level_color,
                level,
                reset,
                record.target(),
                record.args()
            )
        })
        .target(Target::Stdout)
        .try_init()
        .ok();

    set_log_level(level);
    info!("Logging initialized at level: {}", level);
}

/// Change the global level once configuration is loaded. No effect while
/// `MERCATOR_LOG` is set.
pub fn set_log_level(level: &str) {
    if std::env::var_os(LOG_ENV).is_some() {
        return;
    }
    match level_filter(level) {
        | Some(filter) => log::set_max_level(filter),
        | None => warn!("Unknown log level {:?}, keeping {}", level, log::max_level()),
    }
}

fn level_filter(level: &str) -> Option<LevelFilter> {
    level.trim().parse().ok()
}

/// Initialize test logging (for use in tests)
#[cfg(test)]
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).filter_level(log::LevelFilter::Debug).try_init();
}
