//! Logger setup for the command line.

use colored::*;
use log::{Level, LevelFilter};
use time::macros::format_description;
use time::OffsetDateTime;

fn colored_level(level: Level) -> ColoredString {
    let name = format!("{:5}", level);
    match level {
        Level::Error => name.bright_red(),
        Level::Warn => name.yellow(),
        Level::Info => name.green(),
        Level::Debug => name.blue(),
        Level::Trace => name.dimmed(),
    }
}

fn timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ))
    .unwrap_or_default()
}

/// Parse a `COMPONENT[=LEVEL]` specification.
///
/// Components are module paths relative to the crate (`dom::resolve`); a
/// missing level means `trace`.
pub fn parse_component(spec: &str) -> Result<(String, LevelFilter), String> {
    let (name, level) = match spec.split_once('=') {
        Some((name, level)) => {
            let level = level
                .trim()
                .parse::<LevelFilter>()
                .map_err(|_| format!("Invalid log level '{}' in '{}'", level.trim(), spec))?;
            (name.trim(), level)
        }
        None => (spec.trim(), LevelFilter::Trace),
    };
    if name.is_empty() {
        return Err(format!("Invalid log specification '{}': missing component", spec));
    }
    let module = if name.starts_with("yoml_rs") {
        name.to_string()
    } else {
        format!("yoml_rs::{}", name)
    };
    Ok((module, level))
}

pub fn setup(verbose: u8, components: Vec<&str>, log_time: bool) -> Result<(), String> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            if log_time {
                out.finish(format_args!(
                    "{} {} [{}] {}",
                    timestamp().dimmed(),
                    colored_level(record.level()),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "{} [{}] {}",
                    colored_level(record.level()),
                    record.target(),
                    message
                ))
            }
        })
        .level(level);

    for component in components {
        let (module, level) = parse_component(component)?;
        dispatch = dispatch.level_for(module, level);
    }

    dispatch
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| format!("Failed to set up logging: {}", e))
}
