//! Process-wide shutdown state.
//!
//! `SHUTDOWN` is set by the Ctrl+C handler. A watch session registers a
//! channel to be told about it; without one the process exits right away.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::Sender;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Shutdown signal sender for the actor system
static SHUTDOWN_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// - Before `register_shutdown()`: exit immediately, nothing to clean up
/// - After `register_shutdown()`: notify the coordinator, which disposes
///   the watcher and waits for the compiler actor
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        match SHUTDOWN_TX.get() {
            Some(tx) => {
                crate::log!("watch"; "shutting down...");
                let _ = tx.send(());
            }
            None => std::process::exit(0),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the coordinator's shutdown channel.
///
/// Returns `false` if a channel was already registered.
pub fn register_shutdown(tx: Sender<()>) -> bool {
    SHUTDOWN_TX.set(tx).is_ok()
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_registration() {
        let (tx, rx) = crossbeam::channel::bounded(1);
        assert!(register_shutdown(tx));

        let (other, _) = crossbeam::channel::bounded(1);
        assert!(!register_shutdown(other));

        // Simulate the handler without installing it.
        if let Some(tx) = SHUTDOWN_TX.get() {
            tx.send(()).unwrap();
        }
        assert!(rx.try_recv().is_ok());
        assert!(!is_shutdown());
    }
}
