//! Service object that drives the daemon and owns the mirrored torrent collection.
//!
//! # Design
//! - Every mutating workflow validates its input, runs inside an operation span, awaits one
//!   collection refresh once the daemon has answered (success or failure), publishes a
//!   workflow event, and hands the daemon's reply or error back to the caller.
//! - Refresh failures after a workflow are logged and never mask the workflow outcome.
//! - Payload deletion happens only after a confirmed erase and runs detached.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use flotilla_events::{Event, EventBus};
use flotilla_rtorrent::{
    MethodCall, RequestBuilder, RpcTransport, TorrentCollection, Value, methods, processors,
};
use flotilla_telemetry::with_operation_context;
use flotilla_torrent_core::validate::{normalize_hashes, normalize_tags, validate_destination};
use flotilla_torrent_core::{
    AddFiles, AddUrls, DaemonResponse, DeleteTorrents, MoveTorrents, ReconcileDiff,
    SetFilePriority, SetPriority, SetTaxonomy, SpeedLimit, Taxonomy, TorrentDetails, TorrentError,
    TorrentInspector, TorrentRecord, TorrentResult, TorrentWorkflow, TransferStats,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cleanup::{DataRemover, is_removable, spawn_removal};
use crate::workflow::MovePlan;

/// Shared handle to the mirrored collection.
pub type SharedCollection = Arc<RwLock<TorrentCollection>>;

/// Bridge service object: workflows, read-through queries, and reconciliation.
pub struct TorrentClient {
    transport: Arc<dyn RpcTransport>,
    collection: SharedCollection,
    events: EventBus,
    remover: Arc<dyn DataRemover>,
}

impl TorrentClient {
    /// Construct a client with an empty collection.
    #[must_use]
    pub fn new(
        transport: Arc<dyn RpcTransport>,
        events: EventBus,
        remover: Arc<dyn DataRemover>,
    ) -> Self {
        Self {
            transport,
            collection: Arc::new(RwLock::new(TorrentCollection::new())),
            events,
            remover,
        }
    }

    /// Shared handle to the mirrored collection.
    #[must_use]
    pub fn collection(&self) -> SharedCollection {
        Arc::clone(&self.collection)
    }

    /// Fetch one snapshot and reconcile the collection against it.
    ///
    /// Returns `None` when the daemon answered with nothing usable; the collection is then
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns the transport or protocol error of the snapshot request.
    pub async fn refresh(&self) -> TorrentResult<Option<ReconcileDiff>> {
        let snapshot = RequestBuilder::new()
            .add_call(methods::torrent_list())
            .post_process(|mut values| Ok(values.pop()))
            .send(self.transport.as_ref())
            .await?;

        let (diff, total, taxonomy) = {
            let mut collection = self.collection.write().await;
            let previous = collection.taxonomy().clone();
            let Some(diff) = collection.update(snapshot.as_ref()) else {
                return Ok(None);
            };
            let taxonomy =
                (collection.taxonomy() != &previous).then(|| collection.taxonomy().clone());
            (diff, collection.len(), taxonomy)
        };

        if !diff.is_empty() {
            debug!(
                added = diff.added.len(),
                removed = diff.removed.len(),
                updated = diff.updated.len(),
                total,
                "torrent collection reconciled"
            );
            self.events.publish(Event::TorrentsReconciled {
                added: diff.added.clone(),
                removed: diff.removed.clone(),
                updated: diff.updated.clone(),
                total,
            });
        }
        if let Some(Taxonomy {
            statuses,
            tags,
            trackers,
        }) = taxonomy
        {
            self.events.publish(Event::TaxonomyChanged {
                statuses,
                tags,
                trackers,
            });
        }
        Ok(Some(diff))
    }

    async fn dispatch(&self, calls: Vec<MethodCall>) -> TorrentResult<DaemonResponse> {
        RequestBuilder::new()
            .add_calls(calls)
            .post_process(|values| Ok(daemon_response(values)))
            .send(self.transport.as_ref())
            .await
    }

    /// Run `work` as a traced workflow, then refresh and publish its outcome.
    async fn mutate<Fut>(
        &self,
        operation: &'static str,
        hashes: Vec<String>,
        work: Fut,
    ) -> TorrentResult<DaemonResponse>
    where
        Fut: Future<Output = TorrentResult<DaemonResponse>> + Send,
    {
        let operation_id = Uuid::new_v4().to_string();
        with_operation_context(operation_id, operation, async move {
            let result = work.await;
            if let Err(err) = self.refresh().await {
                warn!(operation, error = %err, "refresh after workflow failed");
            }
            match &result {
                Ok(_) => {
                    info!(operation, torrents = hashes.len(), "workflow completed");
                    self.events.publish(Event::WorkflowCompleted {
                        operation: operation.to_string(),
                        hashes,
                    });
                }
                Err(err) => {
                    let message = err.detail();
                    warn!(operation, error = %message, "workflow failed");
                    self.events.publish(Event::WorkflowFailed {
                        operation: operation.to_string(),
                        message,
                    });
                }
            }
            result
        })
        .await
    }

    async fn base_paths(&self, hashes: &[String]) -> TorrentResult<Vec<String>> {
        let collection = self.collection.read().await;
        hashes
            .iter()
            .map(|hash| {
                collection
                    .torrent(hash)
                    .map(|record| record.base_path.clone())
                    .ok_or_else(|| TorrentError::NotFound { hash: hash.clone() })
            })
            .collect()
    }

    /// One directory-creation batch, then one round-trip per file to stay under the payload
    /// ceiling. Reports the last file's reply.
    async fn upload_files(
        &self,
        request: AddFiles,
        destination: String,
        tags: Vec<String>,
    ) -> TorrentResult<DaemonResponse> {
        self.dispatch(vec![methods::create_directory(&destination)])
            .await?;

        let mut last = DaemonResponse::default();
        for file in &request.files {
            debug!(file = %file.name, bytes = file.bytes.len(), "uploading metainfo");
            last = self
                .dispatch(vec![methods::load_raw(
                    &file.bytes,
                    &destination,
                    request.start,
                    &tags,
                )])
                .await?;
        }
        Ok(last)
    }
}

fn daemon_response(values: Vec<Value>) -> DaemonResponse {
    DaemonResponse {
        results: values.into_iter().map(Value::into_json).collect(),
    }
}

#[async_trait]
impl TorrentWorkflow for TorrentClient {
    async fn add_urls(&self, request: AddUrls) -> TorrentResult<DaemonResponse> {
        let destination = validate_destination(&request.destination)?;
        let tags = normalize_tags(&request.tags)?;
        if request.urls.iter().all(|url| url.trim().is_empty()) {
            return Err(TorrentError::validation("urls", "empty"));
        }
        let mut calls = vec![methods::create_directory(&destination)];
        calls.extend(
            request
                .urls
                .iter()
                .map(|url| url.trim())
                .filter(|url| !url.is_empty())
                .map(|url| methods::load_url(url, &destination, request.start, &tags)),
        );
        self.mutate("add_urls", Vec::new(), self.dispatch(calls))
            .await
    }

    async fn add_files(&self, request: AddFiles) -> TorrentResult<DaemonResponse> {
        if request.files.is_empty() {
            return Err(TorrentError::validation("files", "empty"));
        }
        let destination = validate_destination(&request.destination)?;
        let tags = normalize_tags(&request.tags)?;
        self.mutate(
            "add_files",
            Vec::new(),
            self.upload_files(request, destination, tags),
        )
        .await
    }

    async fn start(&self, hashes: Vec<String>) -> TorrentResult<DaemonResponse> {
        let hashes = normalize_hashes(&hashes)?;
        let calls = methods::start(&hashes);
        self.mutate("start", hashes, self.dispatch(calls)).await
    }

    async fn stop(&self, hashes: Vec<String>) -> TorrentResult<DaemonResponse> {
        let hashes = normalize_hashes(&hashes)?;
        let calls = methods::stop(&hashes);
        self.mutate("stop", hashes, self.dispatch(calls)).await
    }

    async fn check_hash(&self, hashes: Vec<String>) -> TorrentResult<DaemonResponse> {
        let hashes = normalize_hashes(&hashes)?;
        let calls = methods::check_hash(&hashes);
        self.mutate("check_hash", hashes, self.dispatch(calls))
            .await
    }

    async fn move_torrents(&self, request: MoveTorrents) -> TorrentResult<DaemonResponse> {
        let hashes = normalize_hashes(&request.hashes)?;
        let destination = validate_destination(&request.destination)?;
        let sources = if request.move_files {
            self.base_paths(&hashes).await?
        } else {
            Vec::new()
        };
        let plan = MovePlan::new(hashes.clone(), destination, request.move_files, sources);
        let transport = self.transport.as_ref();
        self.mutate("move", hashes, async move {
            plan.run(transport).await.map(daemon_response)
        })
        .await
    }

    async fn delete_torrents(&self, request: DeleteTorrents) -> TorrentResult<DaemonResponse> {
        let hashes = normalize_hashes(&request.hashes)?;
        let doomed: Vec<PathBuf> = if request.delete_data {
            let collection = self.collection.read().await;
            hashes
                .iter()
                .filter_map(|hash| collection.torrent(hash))
                .map(|record| record.base_path.as_str())
                .filter(|path| is_removable(path))
                .map(PathBuf::from)
                .collect()
        } else {
            Vec::new()
        };
        let calls = methods::erase(&hashes);
        let remover = Arc::clone(&self.remover);
        self.mutate("delete", hashes, async move {
            let response = self.dispatch(calls).await?;
            if !doomed.is_empty() {
                spawn_removal(remover, doomed);
            }
            Ok(response)
        })
        .await
    }

    async fn set_priority(&self, request: SetPriority) -> TorrentResult<DaemonResponse> {
        let hashes = normalize_hashes(&request.hashes)?;
        let calls = methods::set_priority(&hashes, request.priority);
        self.mutate("set_priority", hashes, self.dispatch(calls))
            .await
    }

    async fn set_file_priority(&self, request: SetFilePriority) -> TorrentResult<DaemonResponse> {
        let hashes = normalize_hashes(std::slice::from_ref(&request.hash))?;
        if request.indices.is_empty() {
            return Err(TorrentError::validation("indices", "empty"));
        }
        let calls = methods::set_file_priority(&hashes[0], &request.indices, request.priority);
        self.mutate("set_file_priority", hashes, self.dispatch(calls))
            .await
    }

    async fn set_taxonomy(&self, request: SetTaxonomy) -> TorrentResult<DaemonResponse> {
        let hashes = normalize_hashes(&request.hashes)?;
        let tags = normalize_tags(&request.tags)?;
        let calls = methods::set_tags(&hashes, &tags);
        self.mutate("set_taxonomy", hashes, self.dispatch(calls))
            .await
    }

    async fn set_speed_limits(&self, limit: SpeedLimit) -> TorrentResult<DaemonResponse> {
        let calls = vec![methods::set_throttle(limit)];
        self.mutate("set_speed_limits", Vec::new(), self.dispatch(calls))
            .await
    }
}

#[async_trait]
impl TorrentInspector for TorrentClient {
    async fn torrent(&self, hash: &str) -> Option<TorrentRecord> {
        let hash = hash.trim().to_ascii_uppercase();
        self.collection.read().await.torrent(&hash).cloned()
    }

    async fn torrents(&self) -> Vec<TorrentRecord> {
        self.collection.read().await.torrents().to_vec()
    }

    async fn taxonomy(&self) -> Taxonomy {
        self.collection.read().await.taxonomy().clone()
    }

    async fn torrent_details(&self, hash: &str) -> TorrentResult<TorrentDetails> {
        let hashes = normalize_hashes(&[hash.to_string()])?;
        RequestBuilder::new()
            .add_calls(methods::torrent_details(&hashes[0]))
            .post_process(processors::torrent_details)
            .send(self.transport.as_ref())
            .await
    }

    async fn transfer_stats(&self) -> TorrentResult<TransferStats> {
        RequestBuilder::new()
            .add_calls(methods::transfer_stats())
            .post_process(processors::transfer_stats)
            .send(self.transport.as_ref())
            .await
    }
}
