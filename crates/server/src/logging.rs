use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::FmtSubscriber;

/// Installs the process-wide fmt subscriber. Must be called at most once.
pub fn init(max_level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder().with_max_level(max_level).with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)
}
