//! Background runs with an explicit handle.
//!
//! A [`Runner`] starts [`crate::convert::convert`] on the tokio runtime and
//! hands back a [`RunHandle`] the caller can await, abort or poll. One runner
//! allows one run at a time: `start` while a run is in flight returns
//! [`Pdf2VisionError::Busy`] instead of interleaving two page loops into the
//! same observer.
//!
//! ```rust,no_run
//! use edgequake_pdf2vision::{Runner, VisionConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = Runner::new(VisionConfig::from_env().build()?);
//! let handle = runner.start("scan.pdf")?;
//! assert!(runner.start("other.pdf").is_err()); // still busy
//! let output = handle.join().await?;
//! println!("{}", output.transcript.text());
//! # Ok(())
//! # }
//! ```

use crate::config::VisionConfig;
use crate::convert::convert_leased;
use crate::error::Pdf2VisionError;
use crate::output::ConversionOutput;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Starts runs, one at a time.
#[derive(Debug, Clone)]
pub struct Runner {
    config: VisionConfig,
    busy: Arc<AtomicBool>,
}

impl Runner {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// True while a started run is in flight. An aborted run counts until
    /// its render job has let go of the image directory.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Spawn a run for `pdf_path`. Must be called from within a tokio
    /// runtime.
    pub fn start(&self, pdf_path: impl Into<PathBuf>) -> Result<RunHandle, Pdf2VisionError> {
        let pdf_path = pdf_path.into();
        let config = self.config.clone();
        info!("Queueing background run: {}", pdf_path.display());
        self.spawn_guarded(move |lease| async move {
            convert_leased(&pdf_path, &config, Some(lease)).await
        })
    }

    fn spawn_guarded<F, Fut>(&self, run: F) -> Result<RunHandle, Pdf2VisionError>
    where
        F: FnOnce(RunLease) -> Fut,
        Fut: Future<Output = Result<ConversionOutput, Pdf2VisionError>> + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Pdf2VisionError::Busy);
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let lease = RunLease {
            inner: Arc::new(Lease {
                busy: Arc::clone(&self.busy),
                cancelled: Arc::clone(&cancelled),
            }),
        };

        let run = run(lease.clone());
        let inner = tokio::spawn(async move {
            let _lease = lease;
            run.await
        });

        Ok(RunHandle { inner, cancelled })
    }
}

/// Share of a run's claim on its [`Runner`].
///
/// The async task holds one clone; blocking work that outlives an abort
/// (the pdfium render job) holds another. The runner is released when the
/// last clone is dropped.
#[derive(Debug, Clone)]
pub(crate) struct RunLease {
    inner: Arc<Lease>,
}

#[derive(Debug)]
struct Lease {
    busy: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
        debug!("Runner released");
    }
}

impl RunLease {
    /// Set once the run's handle was aborted.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// A lease not tied to any runner.
    #[cfg(test)]
    pub(crate) fn standalone() -> Self {
        Self {
            inner: Arc::new(Lease {
                busy: Arc::new(AtomicBool::new(true)),
                cancelled: Arc::new(AtomicBool::new(false)),
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Handle to a background run.
#[derive(Debug)]
pub struct RunHandle {
    inner: JoinHandle<Result<ConversionOutput, Pdf2VisionError>>,
    cancelled: Arc<AtomicBool>,
}

impl RunHandle {
    /// Request cancellation. The run stops at its next await point; pages not
    /// yet uploaded are never sent. A render job in progress stops before its
    /// next page and keeps the runner busy until then.
    pub fn abort(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.inner.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Wait for the run. An aborted run yields [`Pdf2VisionError::Cancelled`].
    pub async fn join(self) -> Result<ConversionOutput, Pdf2VisionError> {
        match self.inner.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(Pdf2VisionError::Cancelled),
            Err(e) => Err(Pdf2VisionError::Internal(format!("Run task panicked: {}", e))),
        }
    }
}
