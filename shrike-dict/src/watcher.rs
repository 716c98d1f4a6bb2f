//! Dictionary Hot Reload
//!
//! Polls the dictionary file on an interval and rebuilds a shared
//! detector when the content changes, without interrupting concurrent
//! queries. A failed reload is logged and the previously installed
//! automaton stays authoritative.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use shrike_core::Detector;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::{parse_dictionary, DictError, DictResult};

/// Watcher configuration
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Dictionary file to watch
    pub path: PathBuf,

    /// Poll interval for change detection
    pub poll_interval: Duration,
}

impl WatcherConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            poll_interval: Duration::from_secs(5),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Reload notification sent to subscribers
#[derive(Debug, Clone)]
pub enum ReloadEvent {
    /// A changed dictionary was built and installed
    Rebuilt {
        /// Patterns in the new automaton
        patterns: usize,
    },

    /// A change was detected but the reload failed; the previous
    /// automaton remains installed
    Failed(String),
}

/// Watches a dictionary file and rebuilds a shared [`Detector`] on change
pub struct DictionaryWatcher {
    detector: Arc<Detector>,
    config: WatcherConfig,
    change_tx: broadcast::Sender<ReloadEvent>,
    handle: Option<tokio::task::JoinHandle<()>>,
    /// Hash of the last content successfully built, shared between
    /// [`load_initial`](Self::load_initial) and the poll loop so the
    /// first tick does not rebuild a dictionary that is already
    /// installed
    last_hash: Arc<RwLock<Option<u64>>>,
}

impl DictionaryWatcher {
    /// Create a watcher over `detector`. Nothing happens until
    /// [`start`](Self::start) is called.
    pub fn new(detector: Arc<Detector>, config: WatcherConfig) -> Self {
        let (change_tx, _) = broadcast::channel(16);
        Self {
            detector,
            config,
            change_tx,
            handle: None,
            last_hash: Arc::new(RwLock::new(None)),
        }
    }

    /// Load the dictionary once and build the detector. Callers usually
    /// do this before starting the poll loop so queries work from the
    /// first moment; the poll loop then skips the unchanged content.
    pub async fn load_initial(&self) -> DictResult<usize> {
        let bytes = tokio::fs::read(&self.config.path)
            .await
            .map_err(|e| DictError::Io(self.config.path.clone(), e))?;
        let hash = Self::content_hash(&bytes);
        let patterns = Self::install(&self.detector, &self.config.path, bytes)?;
        *self.last_hash.write().await = Some(hash);
        Ok(patterns)
    }

    /// Start the background poll loop
    pub fn start(&mut self) {
        let detector = Arc::clone(&self.detector);
        let config = self.config.clone();
        let change_tx = self.change_tx.clone();
        let last_hash = Arc::clone(&self.last_hash);

        let handle = tokio::spawn(async move {
            info!(path = %config.path.display(), "starting dictionary watcher");

            let mut interval = tokio::time::interval(config.poll_interval);

            loop {
                interval.tick().await;

                // One read per poll: the bytes hashed for change
                // detection are the bytes handed to the build.
                let content = match tokio::fs::read(&config.path).await {
                    Ok(content) => content,
                    Err(e) => {
                        warn!(error = %e, "failed to read dictionary file");
                        continue;
                    }
                };

                let hash = Self::content_hash(&content);
                if *last_hash.read().await == Some(hash) {
                    debug!("dictionary unchanged");
                    continue;
                }

                match Self::install(&detector, &config.path, content) {
                    Ok(patterns) => {
                        *last_hash.write().await = Some(hash);
                        info!(patterns, "dictionary reloaded");
                        let _ = change_tx.send(ReloadEvent::Rebuilt { patterns });
                    }
                    Err(e) => {
                        warn!(error = %e, "dictionary reload failed, keeping previous automaton");
                        let _ = change_tx.send(ReloadEvent::Failed(e.to_string()));
                    }
                }
            }
        });

        self.handle = Some(handle);
    }

    /// Stop the poll loop. Safe to call if never started.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Subscribe to reload notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.change_tx.subscribe()
    }

    /// The detector this watcher rebuilds
    pub fn detector(&self) -> &Arc<Detector> {
        &self.detector
    }

    /// Validate, parse, and build from already-read content
    fn install(detector: &Detector, path: &Path, bytes: Vec<u8>) -> DictResult<usize> {
        let content = String::from_utf8(bytes)
            .map_err(|_| DictError::InvalidEncoding(path.to_path_buf()))?;
        let (words, stats) = parse_dictionary(&content);
        detector.build(&words)?;
        Ok(stats.loaded)
    }

    fn content_hash(content: &[u8]) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        hasher.finish()
    }
}

impl Drop for DictionaryWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
