/// Polled by the indexer between files (§4.7, §5 "cancellation is
/// cooperative: the worker checks the job record between files"). Kept
/// synchronous and separate from `ProgressSink` since the check itself
/// needs no `await` from the indexer's point of view — the worker binary
/// is the one bridging an on-disk job record into this via a background
/// poll, not the indexer.
pub trait CancellationToken: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// The default when a caller never intends to cancel a run (unit tests,
/// one-shot direct `IndexStoreUseCase::execute` calls outside the job
/// manager).
pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Flips once and stays flipped. The worker binary sets this from a
/// background task that polls the job record on disk; the indexer only
/// ever reads it.
#[derive(Default)]
pub struct FlagCancellationToken(std::sync::atomic::AtomicBool);

impl FlagCancellationToken {
    pub fn new() -> Self {
        Self(std::sync::atomic::AtomicBool::new(false))
    }

    pub fn cancel(&self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

impl CancellationToken for FlagCancellationToken {
    fn is_cancelled(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
