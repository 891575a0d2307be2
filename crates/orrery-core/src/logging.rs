//! Tracing subscriber setup.

/// Default filter: verbose for the content crates, quiet for everything else.
pub const DEFAULT_FILTER: &str = "info,orrery_content=debug,orrery_core=debug";

/// Install a global `fmt` subscriber using [`DEFAULT_FILTER`].
///
/// `RUST_LOG` is ignored here; use [`init_with_filter`] to pick the directives yourself.
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Install a global `fmt` subscriber with the given env-filter directives.
///
/// Calling this more than once is harmless; later calls keep the first subscriber.
pub fn init_with_filter(filter: &str) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
