use std::sync::OnceLock;

use log::debug;
use tokio::runtime::Runtime;

static GLOBAL_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Runtime used by foreign callers that do not bring their own. Timers of the
/// workout session and blocking database work run here.
pub fn global_runtime() -> std::io::Result<&'static Runtime> {
    if let Some(rt) = GLOBAL_RUNTIME.get() {
        return Ok(rt);
    }

    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .max(2);
    debug!("Initializing global runtime with {} threads", threads);
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(threads)
        .thread_name("kinetic-worker")
        .enable_all()
        .build()?;

    // A concurrent caller may have won the race; its runtime is kept.
    Ok(GLOBAL_RUNTIME.get_or_init(|| rt))
}
