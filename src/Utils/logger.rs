use log::info;
use simplelog::LevelFilter;
use simplelog::*;

/// Initializes a console logger for the parse/validate/reduce pipeline.
/// Levels "off"/"none" disable logging entirely; an unknown level is an
/// error rather than a panic.
pub fn init_console_logger(loglevel: Option<&str>) -> Result<(), String> {
    let is_logging_disabled = loglevel
        .map(|level| level == "off" || level == "none")
        .unwrap_or(false);
    if is_logging_disabled {
        return Ok(());
    }
    let log_option = if let Some(level) = loglevel {
        match level {
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            _ => return Err("loglevel must be debug, info, warn or error".to_string()),
        }
    } else {
        LevelFilter::Info
    };
    let logger_instance = CombinedLogger::init(vec![TermLogger::new(
        log_option,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
    match logger_instance {
        Ok(()) => {
            info!("logger started with loglevel: {}", log_option);
            Ok(())
        }
        // already initialized, keep going with the existing logger
        Err(_) => Ok(()),
    }
}
