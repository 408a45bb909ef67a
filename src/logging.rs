use std::io;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Filtering comes from `BF_LOG` (e.g. `BF_LOG=rewind_bf=trace`) and
/// defaults to `warn`. Events go to stderr so program output on stdout is
/// never interleaved with diagnostics. Calling this twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_env("BF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
