//! Logging integration.
//!
//! Configures a [`tracing`] subscriber from [`PublicFormsSettings`] and
//! provides the per-block span that wraps every lifecycle phase.

use crate::settings::PublicFormsSettings;

/// Installs the global tracing subscriber described by `settings`.
///
/// The filter comes from `settings.log_level`; an unparsable directive falls
/// back to `info`. Debug mode uses a pretty format, otherwise JSON lines.
/// Calling this twice is harmless: the second install is ignored.
pub fn setup_logging(settings: &PublicFormsSettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates the span for one content block's lifecycle phase.
///
/// # Examples
///
/// ```
/// use public_forms_core::logging::block_span;
///
/// let span = block_span("home_main_0_create", "render");
/// let _guard = span.enter();
/// tracing::debug!("rendering block");
/// ```
pub fn block_span(token: &str, phase: &'static str) -> tracing::Span {
    tracing::info_span!("public_form", token = token, phase = phase)
}
