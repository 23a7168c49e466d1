use std::sync::Once;

/// Filter used when neither the caller nor `RUST_LOG` picks one. The wgpu
/// internals log every pipeline and buffer at info.
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn";

/// Settings for the `env_logger` backend installed by [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directive string such as `"tessel_engine=trace,wgpu=warn"`. Overrides `RUST_LOG`.
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the `log` backend. Only the first call has any effect.
///
/// If another logger is already installed (a host binary, a test harness) it is
/// left alone.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = resolve_filter(config.env_filter, std::env::var("RUST_LOG").ok());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);

        match builder.try_init() {
            Ok(()) => log::debug!("logger installed with filter {filter:?}"),
            Err(_) => log::debug!("logger already installed; keeping it"),
        }
    });
}

/// Picks the filter directives: explicit config, then `RUST_LOG`, then [`DEFAULT_FILTER`].
/// Blank strings count as unset.
fn resolve_filter(explicit: Option<String>, from_env: Option<String>) -> String {
    explicit
        .filter(|f| !f.trim().is_empty())
        .or_else(|| from_env.filter(|f| !f.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}
