//! # ddev Signal Handling
//!
//! File: cli/src/common/interrupt.rs
//!
//! ## Overview
//!
//! One-shot ddev invocations must die cleanly on SIGINT/SIGTERM: in-flight
//! work is cancelled at its next await point, advisory locks are released
//! by the OS on exit, and the exit code follows the shell convention
//! (130 for SIGINT, 143 for SIGTERM).
//!
//! The exception is work past a point of no return — a database container
//! already switched into restore mode, a sync reset mid-teardown. Such
//! sections hold a [`CriticalSection`] guard; a signal received while any
//! guard is alive waits for the last guard to drop before the process is
//! allowed to exit.
//!
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::signal;

static CRITICAL_DEPTH: AtomicUsize = AtomicUsize::new(0);

/// RAII guard marking a non-interruptible section.
#[derive(Debug)]
pub struct CriticalSection(());

impl CriticalSection {
    pub fn enter() -> CriticalSection {
        CRITICAL_DEPTH.fetch_add(1, Ordering::SeqCst);
        CriticalSection(())
    }
}

impl Drop for CriticalSection {
    fn drop(&mut self) {
        CRITICAL_DEPTH.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Which signal terminated the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl Signal {
    pub fn exit_code(self) -> i32 {
        match self {
            Signal::Interrupt => 130,
            Signal::Terminate => 143,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
        }
    }
}

/// Resolves when the process has received SIGINT or SIGTERM *and* no
/// critical section is active. Raced against the command future with
/// `tokio::select!` at the command boundary; dropping the command future
/// cancels its workers at their next suspension point.
pub async fn shutdown_signal() -> Signal {
    let received = wait_for_signal().await;
    while CRITICAL_DEPTH.load(Ordering::SeqCst) > 0 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    received
}

#[cfg(unix)]
async fn wait_for_signal() -> Signal {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        _ = ctrl_c => Signal::Interrupt,
        _ = terminate => Signal::Terminate,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Signal {
    signal::ctrl_c()
        .await
        .expect("failed to install SIGINT handler");
    Signal::Interrupt
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_shell_convention() {
        assert_eq!(Signal::Interrupt.exit_code(), 130);
        assert_eq!(Signal::Terminate.exit_code(), 143);
    }

    #[test]
    fn test_critical_section_nesting() {
        assert_eq!(CRITICAL_DEPTH.load(Ordering::SeqCst), 0);
        {
            let _outer = CriticalSection::enter();
            {
                let _inner = CriticalSection::enter();
                assert_eq!(CRITICAL_DEPTH.load(Ordering::SeqCst), 2);
            }
            assert_eq!(CRITICAL_DEPTH.load(Ordering::SeqCst), 1);
        }
        assert_eq!(CRITICAL_DEPTH.load(Ordering::SeqCst), 0);
    }
}
