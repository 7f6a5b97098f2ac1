//! Ctrl-C handling.
//!
//! The first interrupt raises a flag that the dispatcher polls, so running
//! work settles and the status line ends with `Aborted.`. A second
//! interrupt exits right away.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Exit status of a process ended by SIGINT.
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Starts listening for Ctrl-C on a background thread and returns the
/// flag it raises.
pub fn watch() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let raised = Arc::clone(&flag);

    let spawned = thread::Builder::new()
        .name("sork-interrupt".to_string())
        .spawn(move || listen(&raised));

    if let Err(e) = spawned {
        warn!("Failed to start interrupt listener: {e}");
    }

    flag
}

fn listen(flag: &AtomicBool) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            warn!("Failed to start interrupt listener: {e}");
            return;
        }
    };

    runtime.block_on(async {
        while tokio::signal::ctrl_c().await.is_ok() {
            if flag.swap(true, Ordering::SeqCst) {
                std::process::exit(i32::from(INTERRUPTED_EXIT_CODE));
            }
            debug!("Interrupted, waiting for running work to settle");
        }
    });
}

/// Returns `true` if `err` reports that the run was interrupted.
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sork_core::Error>(),
        Some(sork_core::Error::Dispatch(sork_core::concurrent::DispatchError::Interrupted))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sork_core::concurrent::DispatchError;

    #[test]
    fn interrupted_dispatch_is_recognized() {
        let err = anyhow::Error::from(sork_core::Error::from(DispatchError::Interrupted));
        assert!(is_interrupted(&err));
    }

    #[test]
    fn other_errors_are_not_interruptions() {
        let err = anyhow::Error::from(sork_core::Error::Command("failed".to_string()));
        assert!(!is_interrupted(&err));
        assert!(!is_interrupted(&anyhow::anyhow!("interrupted")));
    }
}
