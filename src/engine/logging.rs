use std::sync::Once;

static INIT: Once = Once::new();

/// Installs the global `env_logger` backend.
///
/// `filter` uses the `env_logger` filter syntax (e.g. "info" or
/// "runst_render=debug"). Without one, `RUST_LOG` is consulted, then Info.
/// Only the first call has an effect.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.format_timestamp_millis();
        builder.init();

        log::debug!("logging initialized");
    });
}
