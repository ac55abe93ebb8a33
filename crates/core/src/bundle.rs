//! Dataset export as a single zip archive, streamed as it is written.
//!
//! The dataset directory is walked once; each regular file becomes one
//! archive entry named by its `/`-separated path relative to the dataset
//! directory (`images/1_cat.png`, `images/1_cat.txt`, ...). Entries are keyed
//! in an ordered map, so each path is written exactly once and in a stable
//! order.
//!
//! The archive is produced on a blocking thread through a bounded in-memory
//! pipe; nothing is spooled to disk and the reader sees bytes as soon as each
//! entry is compressed.

use std::collections::BTreeMap;
use std::fs::File;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, DuplexStream, ReadBuf};
use tokio::sync::oneshot;
use tokio_util::io::SyncIoBridge;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::CoreError;
use crate::fs_util;
use crate::layout::DatasetLayout;
use crate::types::DatasetId;

/// Bytes buffered between the archive writer and the reader.
const PIPE_CAPACITY: usize = 64 * 1024;

/// The resolved contents of a dataset archive, ready to be written.
#[derive(Debug)]
pub struct Bundle {
    dataset: DatasetId,
    entries: BTreeMap<String, PathBuf>,
    pub entry_count: usize,
    /// Suggested download name, `{dataset}.zip`.
    pub file_name: String,
}

impl Bundle {
    /// Archive entry names in the order they will be written.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Start writing the archive on a blocking thread and return its bytes
    /// as an async reader.
    ///
    /// Must be called from within a Tokio runtime. If writing fails part-way
    /// (a file vanished, the disk errored), the reader yields that error
    /// instead of a clean end of stream. Dropping the reader stops the writer.
    pub fn into_reader(self) -> BundleReader {
        let (writer, reader) = tokio::io::duplex(PIPE_CAPACITY);
        let sink = SyncIoBridge::new(writer);
        let (done_tx, done_rx) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            let result = write_archive(&self.entries, sink);
            match &result {
                Ok(()) => tracing::info!(
                    dataset = %self.dataset,
                    entries = self.entry_count,
                    "Dataset bundle written"
                ),
                Err(e) => tracing::warn!(error = %e, dataset = %self.dataset, "Dataset bundle aborted"),
            }
            let _ = done_tx.send(result.map_err(|e| io::Error::other(e.to_string())));
        });

        BundleReader {
            pipe: reader,
            outcome: Some(done_rx),
        }
    }
}

/// Read half of a bundle being written. See [`Bundle::into_reader`].
#[derive(Debug)]
pub struct BundleReader {
    pipe: DuplexStream,
    outcome: Option<oneshot::Receiver<io::Result<()>>>,
}

impl AsyncRead for BundleReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        ready!(Pin::new(&mut self.pipe).poll_read(cx, buf))?;
        if buf.filled().len() > before || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        // The writer closed its end; end of stream only if it finished cleanly.
        let Some(outcome) = self.outcome.as_mut() else {
            return Poll::Ready(Ok(()));
        };
        let result = ready!(Pin::new(outcome).poll(cx));
        self.outcome = None;
        Poll::Ready(match result {
            Ok(written) => written,
            Err(_) => Err(io::Error::other("bundle writer stopped unexpectedly")),
        })
    }
}

#[derive(Debug, Clone)]
pub struct BundleExporter {
    layout: DatasetLayout,
}

impl BundleExporter {
    pub fn new(layout: DatasetLayout) -> Self {
        Self { layout }
    }

    /// Resolve the archive entries of a dataset.
    ///
    /// Fails with `NotFound` before any archive byte exists, so callers can
    /// still answer with a plain error.
    pub async fn bundle(&self, id: &DatasetId) -> Result<Bundle, CoreError> {
        let dir = self.layout.dataset_dir(id);
        if !fs_util::is_dir(&dir)
            .await
            .map_err(CoreError::storage(format!("stat dataset '{id}'")))?
        {
            return Err(CoreError::NotFound {
                entity: "Dataset",
                id: id.to_string(),
            });
        }

        let entries = tokio::task::spawn_blocking(move || collect_entries(&dir))
            .await
            .map_err(|e| CoreError::Internal(format!("bundle scan failed: {e}")))??;

        tracing::debug!(dataset = %id, entries = entries.len(), "Dataset bundle started");
        Ok(Bundle {
            dataset: id.clone(),
            entry_count: entries.len(),
            entries,
            file_name: format!("{id}.zip"),
        })
    }
}

/// Every regular file below `dir`, keyed by its relative archive path.
pub fn collect_entries(dir: &Path) -> Result<BTreeMap<String, PathBuf>, CoreError> {
    let mut entries = BTreeMap::new();
    for entry in WalkDir::new(dir).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| CoreError::Storage {
            context: format!("walk {}", dir.display()),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| CoreError::Internal(format!("entry outside dataset: {e}")))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.insert(name, entry.into_path());
    }
    Ok(entries)
}

/// Write a Deflate zip of `entries` to a non-seekable sink.
fn write_archive<W: Write>(entries: &BTreeMap<String, PathBuf>, sink: W) -> Result<(), CoreError> {
    let mut zip = ZipWriter::new_stream(sink);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in entries {
        let mut source = File::open(path)
            .map_err(CoreError::storage(format!("open {}", path.display())))?;
        zip.start_file(name.as_str(), options)?;
        io::copy(&mut source, &mut zip)
            .map_err(CoreError::storage(format!("archive {}", path.display())))?;
    }

    let mut sink = zip.finish()?;
    sink.flush().map_err(CoreError::storage("flush bundle"))?;
    Ok(())
}
