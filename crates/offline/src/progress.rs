//! Download progress reporting.

/// Observer for the content-blob transfer of a download.
///
/// Only the primary content transfer reports progress; the metadata snapshot
/// and thumbnail are too small to matter. Implementations must tolerate
/// never seeing a final 100% notification — callers typically reset their
/// indicator on settlement instead of rendering completion.
pub trait DownloadProgress: Send + Sync {
    /// Called once per observed change in cumulative transferred bytes,
    /// with the expected total when the server advertised one.
    fn transferred(&self, bytes: u64, total: Option<u64>);
}

/// Observer that discards all notifications.
pub struct NoProgress;

impl DownloadProgress for NoProgress {
    fn transferred(&self, _bytes: u64, _total: Option<u64>) {}
}
