use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter};

/// Dependencies only get through when something is actually wrong.
const EXTERNAL_FLOOR: Level = Level::Warn;

pub fn init_logger() {
    fern::Dispatch::new()
        .format(|out, message, record| {
            let time = chrono::Local::now().format("%H:%M:%S");

            out.finish(format_args!(
                "{} {} {} {}",
                time.to_string().bright_black(),
                badge(record.level()),
                scope(record.target()),
                message
            ))
        })
        .level(LevelFilter::Info)
        .filter(|meta| is_own_crate(meta.target()) || meta.level() <= EXTERNAL_FLOOR)
        .chain(std::io::stdout())
        .apply()
        .expect("logging is initialized")
}

fn is_own_crate(target: &str) -> bool {
    let root = target.split("::").next().unwrap_or(target);

    matches!(root, "jam" | "jam_engine" | "jam_server")
}

fn scope(target: &str) -> ColoredString {
    match target.split("::").next().unwrap_or(target) {
        "jam_engine" => "engine".bright_purple().bold(),
        "jam_server" => "server".bright_green().bold(),
        "jam" => "jam".blue().bold(),
        other => other.normal(),
    }
}

fn badge(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".red().bold(),
        Level::Warn => " WARN".yellow().bold(),
        Level::Info => " INFO".green(),
        Level::Debug => "DEBUG".bright_black(),
        Level::Trace => "TRACE".bright_black(),
    }
}
