use std::sync::Arc;

use anyhow::{Context, Result};
use flotilla_app::TorrentClient;
use flotilla_app::cleanup::FsDataRemover;
use flotilla_events::{Event, EventBus};
use flotilla_test_support::{RecordingTransport, TorrentRow, snapshot};
use flotilla_torrent_core::{
    SetTaxonomy, TorrentInspector, TorrentStatusFlag, TorrentWorkflow, TransportFailure,
};
use tokio_stream::StreamExt;

fn client(transport: &RecordingTransport, events: &EventBus) -> TorrentClient {
    TorrentClient::new(
        Arc::new(transport.clone()),
        events.clone(),
        Arc::new(FsDataRemover),
    )
}

#[tokio::test]
async fn second_snapshot_adds_a_stopped_torrent() -> Result<()> {
    let transport = RecordingTransport::new();
    let events = EventBus::new();
    let client = client(&transport, &events);

    transport.set_snapshot(snapshot(vec![TorrentRow::seeding("abc").tags(&["movies"])]));
    client.refresh().await?;
    transport.set_snapshot(snapshot(vec![
        TorrentRow::seeding("abc").tags(&["movies"]),
        TorrentRow::stopped("def"),
    ]));
    let diff = client.refresh().await?.context("usable snapshot")?;

    assert_eq!(diff.added, vec!["DEF".to_string()]);
    let statuses = client.status_counts().await;
    assert_eq!(statuses.get("seeding"), Some(&1));
    assert_eq!(statuses.get("stopped"), Some(&1));
    assert_eq!(client.tag_counts().await.get("movies"), Some(&1));
    assert!(
        client
            .torrent("def")
            .await
            .is_some_and(|record| record.has_status(TorrentStatusFlag::Stopped))
    );
    Ok(())
}

#[tokio::test]
async fn tag_change_is_broadcast_after_the_follow_up_refresh() -> Result<()> {
    let transport = RecordingTransport::new();
    let events = EventBus::new();
    let client = client(&transport, &events);
    transport.set_snapshot(snapshot(vec![TorrentRow::seeding("AAA")]));
    client.refresh().await?;

    let mut stream = events.subscribe();
    transport.set_snapshot(snapshot(vec![TorrentRow::seeding("AAA").tags(&["tv", "hd"])]));
    client
        .set_taxonomy(SetTaxonomy {
            hashes: vec!["AAA".into()],
            tags: vec![" tv ".into(), "hd".into(), "tv".into()],
        })
        .await?;

    let calls = transport.command_batches();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0].method, "d.custom1.set");

    let mut kinds = Vec::new();
    for _ in 0..3 {
        let envelope = stream.next().await.context("event stream closed")??;
        if let Event::TaxonomyChanged { tags, .. } = &envelope.event {
            assert_eq!(tags.get("tv"), Some(&1));
            assert_eq!(tags.get("hd"), Some(&1));
        }
        kinds.push(envelope.event.kind());
    }
    assert_eq!(
        kinds,
        vec!["torrents_reconciled", "taxonomy_changed", "workflow_completed"]
    );
    Ok(())
}

#[tokio::test]
async fn unreachable_daemon_reports_connection_failures() -> Result<()> {
    let transport = RecordingTransport::new();
    transport.set_unreachable(true);
    let events = EventBus::new();
    let client = client(&transport, &events);

    let err = client
        .start(vec!["AAA".into()])
        .await
        .expect_err("daemon offline");
    assert_eq!(err.transport_kind(), Some(TransportFailure::Connection));
    assert!(client.torrents().await.is_empty());
    assert_eq!(transport.snapshot_requests(), 1);
    Ok(())
}
