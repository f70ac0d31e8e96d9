//! The shelf: download, list, delete, presence.

use crate::error::{ErrorKind, Result};
use crate::key::{IdentityKey, META_SUFFIX, staged};
use crate::progress::DownloadProgress;
use crate::source::{SourceHandle, Transfer};
use futures::TryStreamExt;
use std::collections::HashSet;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use yomu_models::Book;

/// One record of the offline listing.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineBook {
    /// The metadata snapshot, parsed back into the full entity record.
    pub book: Book,
    /// Expected thumbnail path. Not verified at list time — a completed
    /// download always promotes all three artifacts together.
    pub thumbnail: PathBuf,
}

/// Result of a presence check.
///
/// `Unknown` is the caller-side initial state while the (async) check is
/// still pending; the check itself only ever resolves to `Absent` or
/// `Downloaded`. Keeping the third state in the type lets UIs avoid
/// flashing the wrong button before the check settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    #[default]
    Unknown,
    Absent,
    Downloaded,
}

/// Durable local mirror of downloaded books.
///
/// All artifacts live flat under one root directory. Every operation is
/// independent of connectivity except [`download`](Self::download), which
/// pulls bytes through the configured [`ContentSource`](crate::ContentSource).
pub struct OfflineStore {
    root: PathBuf,
    source: SourceHandle,
    /// Identity keys with a download currently in flight.
    inflight: Mutex<HashSet<String>>,
}

impl OfflineStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute or cannot be created.
    pub fn new(root: impl AsRef<Path>, source: SourceHandle) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidRoot(root));
        }
        // Non-async here; this happens once at startup.
        sync_create_dir(&root).map_err(ErrorKind::Io)?;
        Ok(Self {
            root,
            source,
            inflight: Mutex::new(HashSet::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the shelf and return every downloaded book.
    ///
    /// Rescans the directory on every call — the disk is the source of
    /// truth, there is no cached index to go stale. Listing keys off the
    /// metadata snapshots; a snapshot that fails to parse is skipped with a
    /// warning so one corrupt file never hides the rest of the shelf.
    pub async fn list(&self) -> Result<Vec<OfflineBook>> {
        let mut entries = fs::read_dir(&self.root).await.map_err(ErrorKind::Io)?;
        let mut books = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(ErrorKind::Io)? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some(stem) = name.strip_suffix(META_SUFFIX) else {
                continue;
            };
            match self.read_snapshot(&path).await {
                Ok(book) => {
                    let key = IdentityKey::from_stem(stem);
                    books.push(OfflineBook {
                        book,
                        thumbnail: key.thumbnail_path(&self.root),
                    });
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable metadata snapshot",
                    );
                },
            }
        }
        Ok(books)
    }

    async fn read_snapshot(&self, path: &Path) -> Result<Book> {
        let raw = fs::read(path).await.map_err(ErrorKind::Io)?;
        serde_json::from_slice(&raw).map_err(|_| ErrorKind::Metadata(path.to_path_buf()).into())
    }

    /// Download a book onto the shelf: content blob, metadata snapshot and
    /// thumbnail, all-or-nothing.
    ///
    /// The three writes run concurrently and stage under `.part` names; only
    /// after every transfer succeeds are they promoted to their final names.
    /// Any failure sweeps the staging files and reports a single error —
    /// the shelf never holds a partial set, and a re-download that fails
    /// cannot clobber a previously completed copy.
    ///
    /// `progress` observes the content transfer only, once per change in
    /// cumulative byte count. At most one download per identity key may be
    /// in flight; a concurrent second request is rejected with
    /// [`ErrorKind::InProgress`].
    pub async fn download(&self, book: &Book, progress: &dyn DownloadProgress) -> Result<OfflineBook> {
        let key = IdentityKey::derive(&book.metadata.title, &book.id);
        {
            let mut inflight = self.inflight.lock().await;
            if !inflight.insert(key.as_str().to_string()) {
                exn::bail!(ErrorKind::InProgress(key.as_str().to_string()));
            }
        }
        let result = self.download_inner(&key, book, progress).await;
        self.inflight.lock().await.remove(key.as_str());
        result
    }

    async fn download_inner(
        &self,
        key: &IdentityKey,
        book: &Book,
        progress: &dyn DownloadProgress,
    ) -> Result<OfflineBook> {
        let content = key.content_path(&self.root);
        let metadata = key.metadata_path(&self.root);
        let thumbnail = key.thumbnail_path(&self.root);
        let stage_content = staged(&content);
        let stage_metadata = staged(&metadata);
        let stage_thumbnail = staged(&thumbnail);

        let transfers = futures::try_join!(
            self.transfer_book(&book.id, &stage_content, progress),
            self.write_snapshot(book, &stage_metadata),
            self.transfer_thumbnail(&book.id, &stage_thumbnail),
        );
        if let Err(e) = transfers {
            tracing::warn!(key = %key, error = %e, "download failed; sweeping staged artifacts");
            sweep(&stage_content).await;
            sweep(&stage_metadata).await;
            sweep(&stage_thumbnail).await;
            return Err(e);
        }

        let promoted = self
            .promote([
                (&stage_content, &content),
                (&stage_metadata, &metadata),
                (&stage_thumbnail, &thumbnail),
            ])
            .await;
        if let Err(e) = promoted {
            // A partial promotion is the one place final-named artifacts can
            // be incomplete as a set; sweep both generations.
            tracing::warn!(key = %key, error = %e, "promotion failed; sweeping all artifacts");
            for path in [
                &stage_content,
                &stage_metadata,
                &stage_thumbnail,
                &content,
                &metadata,
                &thumbnail,
            ] {
                sweep(path).await;
            }
            return Err(e);
        }

        tracing::info!(key = %key, "book downloaded");
        Ok(OfflineBook {
            book: book.clone(),
            thumbnail,
        })
    }

    async fn promote(&self, pairs: [(&PathBuf, &PathBuf); 3]) -> Result<()> {
        for (from, to) in pairs {
            fs::rename(from, to).await.map_err(ErrorKind::Io)?;
        }
        Ok(())
    }

    async fn transfer_book(&self, book_id: &str, dest: &Path, progress: &dyn DownloadProgress) -> Result<()> {
        let transfer = self.source.fetch_book(book_id).await?;
        write_stream(transfer, dest, Some(progress)).await
    }

    async fn transfer_thumbnail(&self, book_id: &str, dest: &Path) -> Result<()> {
        let transfer = self.source.fetch_thumbnail(book_id).await?;
        write_stream(transfer, dest, None).await
    }

    /// Serialize the input record verbatim; offline detail screens read it
    /// back without a server round trip.
    async fn write_snapshot(&self, book: &Book, dest: &Path) -> Result<()> {
        let raw = serde_json::to_vec(book).map_err(|_| ErrorKind::Serialize)?;
        fs::write(dest, raw).await.map_err(ErrorKind::Io)?;
        Ok(())
    }

    /// Remove a book from the shelf.
    ///
    /// Deletes all three artifacts plus any stale staging files, tolerating
    /// absence of any of them — deleting twice, or deleting a book that was
    /// never downloaded, is not an error.
    pub async fn delete(&self, book: &Book) -> Result<()> {
        self.delete_key(&IdentityKey::derive(&book.metadata.title, &book.id)).await
    }

    /// [`delete`](Self::delete) by identity key, for callers that only have
    /// the listing record.
    pub async fn delete_key(&self, key: &IdentityKey) -> Result<()> {
        for path in [
            key.content_path(&self.root),
            key.metadata_path(&self.root),
            key.thumbnail_path(&self.root),
        ] {
            remove_artifact(&path).await?;
            // Orphaned staging files from a crashed download get collected
            // here too; failures to do so are not worth surfacing.
            sweep(&staged(&path)).await;
        }
        tracing::info!(key = %key, "book deleted from shelf");
        Ok(())
    }

    /// Check whether a book is on the shelf.
    ///
    /// Only the content blob is checked — the download contract guarantees
    /// the siblings exist whenever it does. Resolves to
    /// [`Presence::Downloaded`] or [`Presence::Absent`];
    /// [`Presence::Unknown`] is the caller's state before this resolves.
    pub async fn presence(&self, book: &Book) -> Result<Presence> {
        self.presence_of(&IdentityKey::derive(&book.metadata.title, &book.id)).await
    }

    pub async fn presence_of(&self, key: &IdentityKey) -> Result<Presence> {
        let exists = fs::try_exists(key.content_path(&self.root)).await.map_err(ErrorKind::Io)?;
        Ok(match exists {
            true => Presence::Downloaded,
            false => Presence::Absent,
        })
    }
}

/// Stream a transfer to disk, reporting cumulative progress when asked.
async fn write_stream(mut transfer: Transfer, dest: &Path, progress: Option<&dyn DownloadProgress>) -> Result<()> {
    let mut file = fs::File::create(dest).await.map_err(ErrorKind::Io)?;
    let mut transferred: u64 = 0;
    let mut last_reported: u64 = 0;
    while let Some(chunk) = transfer.stream.try_next().await? {
        file.write_all(&chunk).await.map_err(ErrorKind::Io)?;
        transferred += chunk.len() as u64;
        if let Some(progress) = progress
            && transferred != last_reported
        {
            progress.transferred(transferred, transfer.total_bytes);
            last_reported = transferred;
        }
    }
    file.flush().await.map_err(ErrorKind::Io)?;
    Ok(())
}

/// Best-effort removal; absence is expected, anything else is logged only.
async fn sweep(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove artifact");
    }
}

/// Idempotent removal that still surfaces real filesystem errors.
async fn remove_artifact(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ErrorKind::Io(e).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSource;
    use crate::progress::NoProgress;
    use std::sync::{Arc, Mutex as StdMutex};

    fn sample_book(id: &str, title: &str) -> Book {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "seriesId": "s1",
            "seriesTitle": "Some Series",
            "libraryId": "l1",
            "name": format!("{title} file"),
            "url": format!("/books/{title}.epub"),
            "number": 1,
            "created": "2024-11-02T09:12:44Z",
            "lastModified": "2025-01-15T20:01:03Z",
            "fileLastModified": "2024-11-01T23:58:10Z",
            "size": "64 B",
            "sizeBytes": 64,
            "fileHash": "abc",
            "deleted": false,
            "oneshot": false,
            "media": {
                "status": "READY",
                "mediaType": "application/epub+zip",
                "mediaProfile": "EPUB",
                "pagesCount": 12,
                "comment": "",
                "epubDivinaCompatible": false,
                "epubIsKepub": false
            },
            "metadata": {
                "title": title,
                "summary": "",
                "number": "1",
                "numberSort": 1.0,
                "releaseDate": null,
                "authors": [],
                "tags": [],
                "isbn": "",
                "links": [],
                "created": "2024-11-02T09:12:44Z",
                "lastModified": "2024-11-02T09:12:44Z"
            },
            "readProgress": null
        }))
        .unwrap()
    }

    fn store_with(root: &Path, source: MockSource) -> OfflineStore {
        OfflineStore::new(root, Arc::new(source)).unwrap()
    }

    /// Collects every progress notification.
    #[derive(Default)]
    struct Recorder(StdMutex<Vec<(u64, Option<u64>)>>);
    impl DownloadProgress for Recorder {
        fn transferred(&self, bytes: u64, total: Option<u64>) {
            self.0.lock().unwrap().push((bytes, total));
        }
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(OfflineStore::new(temp_dir.path(), Arc::new(MockSource::new())).is_ok());
        assert!(OfflineStore::new("relative/shelf", Arc::new(MockSource::new())).is_err());
    }

    #[tokio::test]
    async fn test_download_produces_all_three_artifacts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book = sample_book("b1", "Title");
        let store = store_with(
            temp_dir.path(),
            MockSource::new().with_book("b1", b"epub bytes".to_vec()).with_thumbnail("b1", b"png".to_vec()),
        );

        let record = store.download(&book, &NoProgress).await.unwrap();
        let key = IdentityKey::derive("Title", "b1");
        assert_eq!(record.thumbnail, key.thumbnail_path(store.root()));

        let content = std::fs::read(key.content_path(store.root())).unwrap();
        assert_eq!(content, b"epub bytes");
        let snapshot: Book =
            serde_json::from_slice(&std::fs::read(key.metadata_path(store.root())).unwrap()).unwrap();
        assert_eq!(snapshot, book);
        assert!(key.thumbnail_path(store.root()).exists());
        // No staging residue.
        assert!(!staged(&key.content_path(store.root())).exists());
    }

    #[tokio::test]
    async fn test_download_reports_progress_per_chunk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data = vec![7u8; 50];
        let book = sample_book("b1", "Title");
        let store = store_with(
            temp_dir.path(),
            MockSource::new().with_book("b1", data.clone()).with_thumbnail("b1", b"png".to_vec()),
        );

        let recorder = Recorder::default();
        store.download(&book, &recorder).await.unwrap();
        let notifications = recorder.0.lock().unwrap();
        // 50 bytes in 8-byte chunks: strictly increasing cumulative counts.
        assert!(notifications.len() > 1);
        assert!(notifications.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(*notifications.last().unwrap(), (50, Some(50)));
    }

    #[tokio::test]
    async fn test_failed_thumbnail_rolls_back_everything() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book = sample_book("b1", "Title");
        let store = store_with(
            temp_dir.path(),
            MockSource::new()
                .with_book("b1", b"epub bytes".to_vec())
                .with_thumbnail("b1", b"png".to_vec())
                .failing_thumbnails(),
        );

        let err = store.download(&book, &NoProgress).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Source(_)));
        // Nothing on disk, staged or final.
        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_book_transfer_rolls_back_everything() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book = sample_book("b1", "Title");
        let store = store_with(
            temp_dir.path(),
            MockSource::new()
                .with_book("b1", b"epub bytes".to_vec())
                .with_thumbnail("b1", b"png".to_vec())
                .failing_books(),
        );

        store.download(&book, &NoProgress).await.unwrap_err();
        assert!(std::fs::read_dir(temp_dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_failed_download_preserves_previous_copy() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book = sample_book("b1", "Title");
        let store = store_with(
            temp_dir.path(),
            MockSource::new().with_book("b1", b"first".to_vec()).with_thumbnail("b1", b"png".to_vec()),
        );
        store.download(&book, &NoProgress).await.unwrap();

        // Second store over the same shelf, now with a failing source.
        let store = store_with(
            temp_dir.path(),
            MockSource::new()
                .with_book("b1", b"second".to_vec())
                .with_thumbnail("b1", b"png".to_vec())
                .failing_books(),
        );
        store.download(&book, &NoProgress).await.unwrap_err();

        let key = IdentityKey::derive("Title", "b1");
        let content = std::fs::read(key.content_path(store.root())).unwrap();
        assert_eq!(content, b"first", "failed re-download must not clobber the shelf");
        assert_eq!(store.presence(&book).await.unwrap(), Presence::Downloaded);
    }

    #[tokio::test]
    async fn test_concurrent_download_of_same_key_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book = sample_book("b1", "Title");
        let store = Arc::new(store_with(
            temp_dir.path(),
            MockSource::new().with_book("b1", b"data".to_vec()).with_thumbnail("b1", b"png".to_vec()).stalling_books(),
        ));

        let first = tokio::spawn({
            let store = Arc::clone(&store);
            let book = book.clone();
            async move { store.download(&book, &NoProgress).await }
        });
        // Let the first download claim its key.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let err = store.download(&book, &NoProgress).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InProgress(_)), "{err}");
        first.abort();
    }

    #[tokio::test]
    async fn test_list_skips_corrupt_snapshot() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book = sample_book("b1", "Title");
        let store = store_with(
            temp_dir.path(),
            MockSource::new().with_book("b1", b"data".to_vec()).with_thumbnail("b1", b"png".to_vec()),
        );
        store.download(&book, &NoProgress).await.unwrap();
        std::fs::write(temp_dir.path().join("broken.meta.json"), b"{not json").unwrap();

        let listing = store.list().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].book.id, "b1");
    }

    #[tokio::test]
    async fn test_delete_of_never_downloaded_book_is_noop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_with(temp_dir.path(), MockSource::new());
        let book = sample_book("ghost", "Never Here");
        store.delete(&book).await.unwrap();
        store.delete(&book).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_download_list_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book = sample_book("b1", "Round Trip");
        let store = store_with(
            temp_dir.path(),
            MockSource::new().with_book("b1", b"data".to_vec()).with_thumbnail("b1", b"png".to_vec()),
        );

        store.download(&book, &NoProgress).await.unwrap();
        let listing = store.list().await.unwrap();
        assert_eq!(listing.len(), 1);
        let found = listing.into_iter().find(|record| record.book.id == "b1").unwrap();

        store.delete(&found.book).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(std::fs::read_dir(temp_dir.path()).unwrap().next().is_none());
        assert_eq!(store.presence(&book).await.unwrap(), Presence::Absent);
    }

    #[tokio::test]
    async fn test_presence_checks_content_blob_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book = sample_book("b1", "Title");
        let store = store_with(
            temp_dir.path(),
            MockSource::new().with_book("b1", b"data".to_vec()).with_thumbnail("b1", b"png".to_vec()),
        );
        assert_eq!(store.presence(&book).await.unwrap(), Presence::Absent);
        store.download(&book, &NoProgress).await.unwrap();

        // Siblings are irrelevant to the check.
        let key = IdentityKey::derive("Title", "b1");
        std::fs::remove_file(key.metadata_path(store.root())).unwrap();
        assert_eq!(store.presence(&book).await.unwrap(), Presence::Downloaded);
    }
}
