use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;

const DEFAULT_FILTER: &str = "warn,narration_sync=info,narration_sync::services::realign=debug";

/// Собирает логгер: сначала приглушаем шумные модули, затем применяем
/// фильтры из `RUST_LOG` (или значения по умолчанию), они перекрывают приглушение.
pub fn logger_builder(filters: &str) -> Builder {
    let mut builder = Builder::new();

    // Шумные модули HTTP-клиента и декодеров
    builder
        .filter_module("hyper", LevelFilter::Error)
        .filter_module("hyper_util", LevelFilter::Error)
        .filter_module("mio", LevelFilter::Error)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("rustls", LevelFilter::Warn)
        .filter_module("symphonia_core", LevelFilter::Warn)
        .filter_module("symphonia_bundle_mp3", LevelFilter::Warn)
        .parse_filters(filters)
        // Форматирование логов
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Stderr);

    builder
}

pub fn init_logger() {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    logger_builder(&filters).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(filters: &str, target: &str, level: Level) -> bool {
        let logger = logger_builder(filters).build();
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn test_default_filters() {
        assert!(enabled(DEFAULT_FILTER, "narration_sync::pipeline", Level::Info));
        assert!(!enabled(DEFAULT_FILTER, "narration_sync::pipeline", Level::Debug));
        assert!(enabled(DEFAULT_FILTER, "narration_sync::services::realign", Level::Debug));
        assert!(!enabled(DEFAULT_FILTER, "hyper::client", Level::Warn));
    }

    #[test]
    fn test_environment_overrides_quiet_modules() {
        assert!(enabled("warn,reqwest=debug", "reqwest::connect", Level::Debug));
        assert!(enabled("hyper=info", "hyper::client", Level::Info));
        // Не упомянутые в окружении модули остаются приглушенными
        assert!(!enabled("reqwest=debug", "rustls::conn", Level::Info));
    }
}
