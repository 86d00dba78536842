use std::{
    future::Future,
    io,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, warn};

/// Resolves once the process is asked to stop.
pub struct ShutdownSignal {
    inner: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl std::fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownSignal").finish_non_exhaustive()
    }
}

impl ShutdownSignal {
    /// Listen for SIGINT and SIGTERM.
    pub fn new() -> io::Result<Self> {
        let mut term = signal(SignalKind::terminate())?;
        Ok(Self::from_future(async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => match res {
                    Ok(()) => debug!("Received SIGINT signal"),
                    Err(e) => warn!(error = %e, "Failed to listen for SIGINT, shutting down"),
                },
                _ = term.recv() => debug!("Received SIGTERM signal"),
            }
        }))
    }

    /// Shut down when `fut` completes.
    pub fn from_future(fut: impl Future<Output = ()> + Send + 'static) -> Self {
        Self { inner: Box::pin(fut) }
    }
}

impl Future for ShutdownSignal {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.as_mut().poll(cx)
    }
}

/// Run `fut` until it completes or `shutdown` fires.
///
/// Returns `None` when interrupted; `on_shutdown` runs in that case only.
pub async fn run_until_shutdown<F, O, C>(fut: F, shutdown: ShutdownSignal, on_shutdown: C) -> Option<O>
where
    F: Future<Output = O>,
    C: FnOnce(),
{
    tokio::select! {
        // NOTE: wrap with a `Box` so we don't allocate a
        // huge future state machine on the stack.
        result = Box::pin(fut) => Some(result),
        _ = shutdown => {
            on_shutdown();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::Duration,
    };
    use tokio::{sync::oneshot, time};

    #[tokio::test]
    async fn completes_without_signal() {
        let shutdown = ShutdownSignal::from_future(std::future::pending());
        let result = run_until_shutdown(async { "completed" }, shutdown, || {}).await;
        assert_eq!(result, Some("completed"));
    }

    #[tokio::test(start_paused = true)]
    async fn signal_interrupts_long_future() {
        let (tx, rx) = oneshot::channel::<()>();
        let shutdown = ShutdownSignal::from_future(async move {
            let _ = rx.await;
        });
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);

        tokio::spawn(async move {
            time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send(());
        });

        let result = run_until_shutdown(
            time::sleep(Duration::from_secs(3600)),
            shutdown,
            move || flag.store(true, Ordering::SeqCst),
        )
        .await;
        assert!(result.is_none());
        assert!(called.load(Ordering::SeqCst));
    }
}
