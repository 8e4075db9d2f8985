// ============================================================
// Layer 6 — Interrupt Handling
// ============================================================
// Cancellation is cooperative: Ctrl-C only flips a shared flag,
// and the training loop checks it between steps. The loop then
// saves one last checkpoint and stops.
//
// A second Ctrl-C exits immediately without waiting for the save.
//
// Reference: tokio docs (tokio::signal::ctrl_c)

use anyhow::{Context, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared "please stop" flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Exit code used when a second Ctrl-C forces the process down
const FORCED_EXIT_CODE: i32 = 130;

/// Listen for Ctrl-C on a background thread and cancel `token` on the first one.
pub fn install_ctrlc_handler(token: CancellationToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Cannot start the signal listener runtime")?;

    std::thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            runtime.block_on(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("Ctrl-C listener unavailable: {}", e);
                    return;
                }
                tracing::warn!("Interrupt received, stopping after the current step");
                token.cancel();

                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\nSecond interrupt, exiting without saving.");
                    std::process::exit(FORCED_EXIT_CODE);
                }
            });
        })
        .context("Cannot spawn the signal listener thread")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }
}
