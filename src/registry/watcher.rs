//! Seed file watcher for registry hot reload.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::registry::loader::load_snapshot;
use crate::registry::store::RegistrySnapshot;

/// Monitors the registry seed file and emits freshly loaded snapshots.
pub struct SeedWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RegistrySnapshot>,
}

impl SeedWatcher {
    /// Create a new SeedWatcher.
    ///
    /// Returns the watcher and a receiver for snapshot updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RegistrySnapshot>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Registry seed change detected, reloading");
                        match load_snapshot(&path) {
                            Ok(snapshot) => {
                                let _ = tx.send(snapshot);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload registry, keeping current snapshot");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Registry watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::store::IdentifierStore;

    #[tokio::test]
    async fn test_seed_change_emits_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, r#"{"nodes": [{"id": "old01", "title": "Old"}]}"#).unwrap();

        let (watcher, mut rx) = SeedWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        std::fs::write(&path, r#"{"nodes": [{"id": "new01", "title": "New"}]}"#).unwrap();

        // A half-written file fails to parse and is skipped; wait for the full one.
        let snapshot = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match rx.recv().await {
                    Some(snapshot) if snapshot.lookup("new01").is_some() => break snapshot,
                    Some(_) => continue,
                    None => panic!("watcher channel closed"),
                }
            }
        })
        .await
        .expect("no snapshot after seed change");

        assert!(snapshot.lookup("old01").is_none());
    }

    #[tokio::test]
    async fn test_missing_seed_fails_to_watch() {
        let dir = tempfile::tempdir().unwrap();
        let (watcher, _rx) = SeedWatcher::new(&dir.path().join("absent.json"));
        assert!(watcher.run().is_err());
    }
}
