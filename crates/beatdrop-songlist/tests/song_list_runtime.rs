mod common;

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use beatdrop_proto::protocol::{Command, DeleteTarget};
use beatdrop_songlist::actions::{MenuChoice, SHARE_FAILED_TEXT};
use beatdrop_songlist::session::{MemorySessionStore, SessionStore};
use beatdrop_songlist::viewport::{NavKey, ScrollMetrics, ViewportEvent};
use common::fakes::{at_bottom, catalog_records, FakeCatalog, FakeLibrary, Harness};
use serde_json::json;
use tokio::sync::Notify;

#[tokio::test]
async fn pages_in_on_scroll_without_duplicates() {
    let catalog = FakeCatalog::new(catalog_records(45));
    let mut list = Harness::mount(catalog.clone(), FakeLibrary::default(), MemorySessionStore::new()).await;

    let first = list.view_where(|v| !v.loading && v.rows.len() == 20).await;
    assert_eq!(first.total_count, 45);
    assert!(first.show_load_more);

    list.send(ViewportEvent::Scrolled(at_bottom()));
    list.send(ViewportEvent::Scrolled(at_bottom()));
    let second = list.view_where(|v| v.rows.len() == 40 && !v.loading_more).await;
    let keys: HashSet<_> = second.rows.iter().map(|r| r.render_key.clone()).collect();
    assert_eq!(keys.len(), 40);
    assert_eq!(catalog.request_count(), 2);

    list.send(ViewportEvent::Scrolled(at_bottom()));
    let last = list.view_where(|v| v.rows.len() == 45 && !v.loading_more).await;
    assert!(!last.show_load_more);

    let (controller, _, released) = list.close().await;
    assert!(controller.session().is_closed());
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn remount_restores_scroll_position() {
    let store = MemorySessionStore::new();
    let mut list = Harness::mount(
        FakeCatalog::new(catalog_records(45)),
        FakeLibrary::default(),
        store.clone(),
    )
    .await;
    list.view_where(|v| v.rows.len() == 20).await;
    list.send(ViewportEvent::Scrolled(ScrollMetrics {
        scroll_top: 310,
        scroll_height: 1600,
        client_height: 400,
    }));
    list.view_where(|v| v.scroll_top == 310).await;
    list.close().await;
    assert_eq!(store.scroll_top(), 310);

    let again = Harness::mount(
        FakeCatalog::new(catalog_records(45)),
        FakeLibrary::default(),
        store.clone(),
    )
    .await;
    assert_eq!(*again.restored.lock().unwrap(), vec![310]);
    again.close().await;
}

#[tokio::test]
async fn song_downloaded_elsewhere_offers_delete_then_share() {
    let library = FakeLibrary::with_downloaded(["h3"]);
    let mut list = Harness::mount(
        FakeCatalog::new(catalog_records(20)),
        library.clone(),
        MemorySessionStore::new(),
    )
    .await;

    let view = list
        .view_where(|v| v.rows.len() == 20 && v.rows[3].actions.is_downloaded)
        .await;
    assert_eq!(view.rows[3].actions.primary_label, "Delete Song 3");
    assert!(!view.rows[4].actions.is_downloaded);

    list.send(ViewportEvent::Menu {
        index: 3,
        choice: MenuChoice::Share,
    });
    let notice = list.next_notice().await;
    assert_eq!(notice.text, "Sharable Link for Song 3 copied to clipboard!");

    list.send(ViewportEvent::Menu {
        index: 3,
        choice: MenuChoice::Primary,
    });
    list.view_where(|v| !v.rows[3].actions.is_downloaded).await;

    list.close().await;
    assert_eq!(
        library.executed(),
        vec![
            Command::CopyToClipboard {
                text: "beatdrop://songs/details/h3".into()
            },
            Command::Delete {
                target: DeleteTarget::Hash("h3".into())
            },
        ]
    );
}

#[tokio::test]
async fn unidentified_share_warns_and_rescans() {
    let library = FakeLibrary::default();
    let catalog = FakeCatalog::new(vec![json!({ "songName": "Mystery", "authorName": "Nobody" })]);
    let mut list = Harness::mount(catalog, library.clone(), MemorySessionStore::new()).await;
    list.view_where(|v| v.rows.len() == 1).await;

    list.send(ViewportEvent::Menu {
        index: 0,
        choice: MenuChoice::Share,
    });
    assert_eq!(list.next_notice().await.text, SHARE_FAILED_TEXT);

    list.close().await;
    assert_eq!(library.rescan_count(), 1);
    assert!(library.executed().iter().all(|c| !matches!(c, Command::CopyToClipboard { .. })));
}

#[tokio::test]
async fn share_during_running_rescan_does_not_rescan_again() {
    let gate = Arc::new(Notify::new());
    let library = FakeLibrary::gated_rescan(Arc::clone(&gate));
    let catalog = FakeCatalog::new(vec![json!({ "songName": "Mystery", "authorName": "Nobody" })]);
    let mut list = Harness::mount(catalog, library.clone(), MemorySessionStore::new()).await;
    list.view_where(|v| v.rows.len() == 1).await;

    for _ in 0..3 {
        list.send(ViewportEvent::Menu {
            index: 0,
            choice: MenuChoice::Share,
        });
        assert_eq!(list.next_notice().await.text, SHARE_FAILED_TEXT);
    }
    assert_eq!(library.rescan_count(), 1);

    let (controller, _, _) = list.close().await;
    gate.notify_one();
    assert_eq!(library.rescan_count(), 1);
    assert!(controller.session().rescan_pending());
}

#[tokio::test]
async fn closing_mid_fetch_discards_the_page() {
    let gate = Arc::new(Notify::new());
    let catalog = FakeCatalog::gated(catalog_records(20), Arc::clone(&gate));
    let list = Harness::mount(catalog.clone(), FakeLibrary::default(), MemorySessionStore::new()).await;

    let (controller, views, released) = list.close().await;
    gate.notify_one();

    assert_eq!(catalog.request_count(), 1);
    assert!(controller.session().songs().is_empty());
    assert!(controller.session().is_closed());
    assert!(views.iter().all(|v| v.rows.is_empty()));
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn keyboard_loads_more_when_auto_load_is_off() {
    let catalog = FakeCatalog::new(catalog_records(25));
    let mut list = Harness::mount(catalog.clone(), FakeLibrary::default(), MemorySessionStore::new()).await;
    list.view_where(|v| v.rows.len() == 20).await;

    list.send(ViewportEvent::SetAutoLoadMore(false));
    list.send(ViewportEvent::Scrolled(at_bottom()));
    for _ in 0..21 {
        list.send(ViewportEvent::Key(NavKey::Down));
    }
    let on_load_more = list.view_where(|v| v.highlighted == 20).await;
    assert!(on_load_more.show_load_more);
    assert_eq!(catalog.request_count(), 1);

    list.send(ViewportEvent::Key(NavKey::Activate));
    list.view_where(|v| v.rows.len() == 25).await;
    assert_eq!(catalog.request_count(), 2);

    list.close().await;
}
