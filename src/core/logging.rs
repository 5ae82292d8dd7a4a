use console::Style;
use log::{Level, LevelFilter};

use crate::types::config::LogConfig;

fn level_style(level: Level) -> Style {
    match level {
        Level::Error => Style::new().red().bold(),
        Level::Warn => Style::new().yellow(),
        Level::Info => Style::new().green(),
        Level::Debug => Style::new().cyan(),
        Level::Trace => Style::new().dim(),
    }
}

/// Route `log` records to stderr. Only the first call takes effect.
pub fn init_logging(log: &LogConfig) {
    let level = log.level().parse::<LevelFilter>().unwrap_or(LevelFilter::Info);
    let colors = log.color().unwrap_or_else(console::colors_enabled_stderr);
    console::set_colors_enabled_stderr(colors);
    // styled values inside info messages follow the same setting
    console::set_colors_enabled(colors);

    let _ = fern::Dispatch::new()
        .format(|out, message, record| {
            let level = record.level();
            if level == Level::Info {
                out.finish(format_args!("{message}"))
            } else {
                let tag = level_style(level)
                    .for_stderr()
                    .apply_to(level.to_string().to_lowercase());
                out.finish(format_args!("[{tag}] {message}"))
            }
        })
        .level(level)
        .chain(std::io::stderr())
        .apply();
}
