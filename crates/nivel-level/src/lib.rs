pub mod bubble;
pub mod engine;
pub mod feed;
pub mod remap;
pub mod tilt;
pub mod types;

use anyhow::{Context, Result};
use engine::LevelEngine;
use feed::SampleFeed;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, watch};
use types::{RawSample, Reading, ScreenRotation, TiltResult};

/// Pushes samples into a client created with [`LevelClient::channel`].
#[derive(Clone)]
pub struct SampleSender {
    tx: mpsc::UnboundedSender<(RawSample, ScreenRotation)>,
}

impl SampleSender {
    /// Queue a sample. Returns `false` once the client is gone.
    pub fn submit(&self, sample: RawSample, rotation: ScreenRotation) -> bool {
        self.tx.send((sample, rotation)).is_ok()
    }
}

/// Runs the tilt engine over a sample source and publishes the latest reading.
///
/// Each sample is processed to completion on a background task; readers only
/// ever see the most recent result.
pub struct LevelClient {
    reading_rx: watch::Receiver<Option<Reading>>,
    processed: Arc<AtomicU64>,
    _task: tokio::task::JoinHandle<()>,
}

impl LevelClient {
    /// Open a sample file and start processing it.
    pub async fn open(
        path: impl AsRef<Path>,
        engine: LevelEngine,
        default_rotation: ScreenRotation,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open sample feed {}", path.display()))?;
        tracing::info!(path = %path.display(), "Reading samples from file");
        Ok(Self::from_reader(file, engine, default_rotation))
    }

    /// Process a textual sample stream (see [`SampleFeed`] for the format).
    pub fn from_reader<R>(reader: R, engine: LevelEngine, default_rotation: ScreenRotation) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (reading_tx, reading_rx) = watch::channel(None);
        let processed = Arc::new(AtomicU64::new(0));
        let publisher = Publisher {
            engine,
            reading_tx,
            log_tx: None,
            processed: processed.clone(),
        };

        let task = tokio::spawn(feed_read_loop(reader, publisher, default_rotation));

        Self {
            reading_rx,
            processed,
            _task: task,
        }
    }

    /// Create a client fed directly by the caller.
    pub fn channel(engine: LevelEngine) -> (Self, SampleSender) {
        Self::spawn_channel(engine, None)
    }

    /// Like [`LevelClient::channel`], but also hands out every reading in
    /// order. The stream ends once all senders are dropped.
    pub fn channel_with_readings(
        engine: LevelEngine,
    ) -> (Self, SampleSender, mpsc::UnboundedReceiver<Reading>) {
        let (log_tx, log_rx) = mpsc::unbounded_channel();
        let (client, sender) = Self::spawn_channel(engine, Some(log_tx));
        (client, sender, log_rx)
    }

    fn spawn_channel(
        engine: LevelEngine,
        log_tx: Option<mpsc::UnboundedSender<Reading>>,
    ) -> (Self, SampleSender) {
        let (reading_tx, reading_rx) = watch::channel(None);
        let (tx, rx) = mpsc::unbounded_channel();
        let processed = Arc::new(AtomicU64::new(0));
        let publisher = Publisher {
            engine,
            reading_tx,
            log_tx,
            processed: processed.clone(),
        };

        let task = tokio::spawn(sample_recv_loop(rx, publisher));

        (
            Self {
                reading_rx,
                processed,
                _task: task,
            },
            SampleSender { tx },
        )
    }

    /// Latest reading, if any sample has been processed (non-blocking).
    pub fn latest(&self) -> Option<Reading> {
        *self.reading_rx.borrow()
    }

    /// Latest tilt result (non-blocking).
    pub fn tilt(&self) -> Option<TiltResult> {
        self.latest().map(|r| r.result)
    }

    /// Watch for new readings. `changed()` errors once the source is exhausted.
    pub fn subscribe(&self) -> watch::Receiver<Option<Reading>> {
        self.reading_rx.clone()
    }

    pub fn samples_processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }
}

/// Read a blocking byte stream (stdin, a file) on its own thread and submit
/// every parsed sample to `sender`.
///
/// The thread is detached from the async runtime, so a read that never
/// returns does not hold up runtime shutdown. It ends at EOF, on a read error
/// or once the client is gone.
pub fn spawn_sample_reader<R>(
    reader: R,
    default_rotation: ScreenRotation,
    sender: SampleSender,
) -> std::io::Result<std::thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    std::thread::Builder::new()
        .name("sample-reader".into())
        .spawn(move || blocking_read_loop(reader, default_rotation, sender))
}

fn blocking_read_loop<R: Read>(mut reader: R, default_rotation: ScreenRotation, sender: SampleSender) {
    let mut feed = SampleFeed::new(default_rotation);
    let mut buf = [0u8; 4096];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                feed.finish();
                drain_feed(&mut feed, |sample, rotation| sender.submit(sample, rotation));
                tracing::info!("Sample feed closed");
                break;
            }
            Ok(n) => {
                feed.push_data(&buf[..n]);
                if !drain_feed(&mut feed, |sample, rotation| sender.submit(sample, rotation)) {
                    tracing::debug!("Level client gone, stopping sample reader");
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::error!(?e, "Sample feed read error");
                break;
            }
        }
    }
}

struct Publisher {
    engine: LevelEngine,
    reading_tx: watch::Sender<Option<Reading>>,
    log_tx: Option<mpsc::UnboundedSender<Reading>>,
    processed: Arc<AtomicU64>,
}

impl Publisher {
    fn publish(&self, sample: RawSample, rotation: ScreenRotation) {
        let result = self.engine.process(&sample, rotation);
        let reading = Reading {
            sample,
            rotation,
            result,
        };
        if let Some(log_tx) = &self.log_tx {
            let _ = log_tx.send(reading);
        }
        let _ = self.reading_tx.send(Some(reading));

        let count = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if count % 1000 == 0 {
            tracing::debug!(count, "Samples processed");
        }
    }
}

/// Background task: read the byte stream, parse lines, run the engine, publish.
async fn feed_read_loop<R>(mut reader: R, publisher: Publisher, default_rotation: ScreenRotation)
where
    R: AsyncRead + Unpin,
{
    let mut feed = SampleFeed::new(default_rotation);
    let mut buf = [0u8; 4096];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                feed.finish();
                drain_feed(&mut feed, |sample, rotation| {
                    publisher.publish(sample, rotation);
                    true
                });
                tracing::info!(
                    samples = publisher.processed.load(Ordering::Relaxed),
                    "Sample feed closed"
                );
                break;
            }
            Ok(n) => {
                feed.push_data(&buf[..n]);
                drain_feed(&mut feed, |sample, rotation| {
                    publisher.publish(sample, rotation);
                    true
                });
            }
            Err(e) => {
                tracing::error!(?e, "Sample feed read error");
                break;
            }
        }
    }
}

/// Hand every complete sample to `sink`. Returns `false` as soon as the sink
/// refuses one.
fn drain_feed<F>(feed: &mut SampleFeed, mut sink: F) -> bool
where
    F: FnMut(RawSample, ScreenRotation) -> bool,
{
    while let Some(result) = feed.next_sample() {
        match result {
            Ok((sample, rotation)) => {
                if !sink(sample, rotation) {
                    return false;
                }
            }
            Err(e) => tracing::warn!(%e, "Skipping malformed sample"),
        }
    }
    true
}

async fn sample_recv_loop(
    mut rx: mpsc::UnboundedReceiver<(RawSample, ScreenRotation)>,
    publisher: Publisher,
) {
    while let Some((sample, rotation)) = rx.recv().await {
        publisher.publish(sample, rotation);
    }
    tracing::debug!("All sample senders dropped");
}
