//! Integration tests for the sync engine, driven on a paused Tokio clock.

mod common;

use std::time::Duration;

use common::{engine, state, Call, FakeStore};
use quill_sync::content;
use quill_sync::{DocId, DocumentPatch, DocumentStatus, InitOutcome, SyncError, SyncStatus};
use tokio::time::sleep;

const QUIET: Duration = Duration::from_millis(2000);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test(start_paused = true)]
async fn test_rapid_edits_coalesce_into_one_save() {
    let store = FakeStore::new();
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    for i in 0..5 {
        engine.notify_changed(state(&format!("draft {i}")));
        assert_eq!(engine.status(), SyncStatus::Unsaved);
        sleep(ms(500)).await;
    }
    assert!(store.content_saves(&id).is_empty());

    assert_eq!(engine.wait_settled().await, SyncStatus::Saved);
    assert_eq!(store.content_saves(&id), vec![state("draft 4")]);
}

#[tokio::test(start_paused = true)]
async fn test_save_waits_for_full_quiet_period() {
    let store = FakeStore::new();
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    engine.notify_changed(state("a"));
    sleep(QUIET - ms(1)).await;
    assert_eq!(engine.status(), SyncStatus::Unsaved);
    assert!(store.content_saves(&id).is_empty());

    sleep(ms(2)).await;
    assert_eq!(engine.status(), SyncStatus::Saved);
    assert_eq!(store.content_saves(&id), vec![state("a")]);
}

#[tokio::test(start_paused = true)]
async fn test_create_autosave_publish() {
    let store = FakeStore::new();
    let engine = engine(&store);

    let id = engine.create_new().await.unwrap();
    let entries = engine.directory_entries();
    assert_eq!(entries[0].id, id);
    assert_eq!(entries[0].title, "Untitled Draft");
    let active = engine.active().unwrap();
    assert!(active.is_owner);
    assert_eq!(active.content, content::empty_state());
    assert_eq!(engine.status(), SyncStatus::Idle);

    engine.notify_changed(state("hello"));
    assert_eq!(engine.wait_settled().await, SyncStatus::Saved);
    assert_eq!(
        store.stored(&id).unwrap().content.as_deref(),
        Some(state("hello").as_str())
    );

    let status = engine.publish().await.unwrap();
    assert_eq!(status, DocumentStatus::Published);

    let calls = store.calls();
    let tail = &calls[calls.len() - 2..];
    assert_eq!(
        tail,
        [
            Call::Patch(id.clone(), DocumentPatch::publish(state("hello"))),
            Call::Publish(id.clone()),
        ]
    );
    assert_eq!(engine.directory_entries()[0].status, DocumentStatus::Published);
    assert_eq!(engine.active().unwrap().status, DocumentStatus::Published);
    assert_eq!(engine.status(), SyncStatus::Saved);
}

#[tokio::test(start_paused = true)]
async fn test_publish_flushes_unsaved_content() {
    let store = FakeStore::new();
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    engine.notify_changed(state("fresh"));
    engine.publish().await.unwrap();
    assert_eq!(
        store.stored(&id).unwrap().content.as_deref(),
        Some(state("fresh").as_str())
    );
    // The flush covered what the debounce timer would have sent.
    assert_eq!(engine.status(), SyncStatus::Saved);

    sleep(QUIET * 2).await;
    assert!(store.content_saves(&id).is_empty());
    assert_eq!(engine.status(), SyncStatus::Saved);
    assert_eq!(store.stored(&id).unwrap().status, DocumentStatus::Published);
}

#[tokio::test(start_paused = true)]
async fn test_publish_waits_for_slow_autosave() {
    let store = FakeStore::new();
    store.set_save_latency(ms(1000));
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    engine.notify_changed(state("one"));
    sleep(QUIET + ms(1)).await;
    assert_eq!(engine.status(), SyncStatus::Saving);

    engine.notify_changed(state("two"));
    let status = engine.publish().await.unwrap();
    assert_eq!(status, DocumentStatus::Published);

    assert_eq!(store.max_patches_in_flight(), 1);
    assert_eq!(
        store.stored(&id).unwrap().content.as_deref(),
        Some(state("two").as_str())
    );
    assert_eq!(engine.status(), SyncStatus::Saved);

    sleep(QUIET * 2).await;
    assert_eq!(store.content_saves(&id), vec![state("one")]);
    assert_eq!(engine.status(), SyncStatus::Saved);
    assert_eq!(
        store.stored(&id).unwrap().content.as_deref(),
        Some(state("two").as_str())
    );
}

#[tokio::test(start_paused = true)]
async fn test_timer_during_publish_flush_defers() {
    let store = FakeStore::new();
    store.set_save_latency(ms(3000));
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    engine.notify_changed(state("published"));
    let publishing = tokio::spawn({
        let engine = engine.clone();
        async move { engine.publish().await }
    });
    sleep(ms(10)).await;
    assert_eq!(engine.status(), SyncStatus::Saving);

    engine.notify_changed(state("after"));
    publishing.await.unwrap().unwrap();
    assert_eq!(engine.status(), SyncStatus::Saving);

    assert_eq!(engine.wait_settled().await, SyncStatus::Saved);
    assert_eq!(store.max_patches_in_flight(), 1);
    assert_eq!(store.content_saves(&id), vec![state("after")]);
}

#[tokio::test(start_paused = true)]
async fn test_guest_edits_never_reach_the_store() {
    let store = FakeStore::new();
    let id = store.insert("shared", "Shared Post", Some(state("theirs")), false);
    let engine = engine(&store);

    let outcome = engine.initialize(Some(id.clone())).await;
    let InitOutcome::Activated(active) = outcome else {
        panic!("expected activation, got {outcome:?}");
    };
    assert!(!active.is_owner);

    for i in 0..50 {
        engine.notify_changed(state(&i.to_string()));
    }
    sleep(QUIET * 3).await;

    assert_eq!(engine.status(), SyncStatus::Idle);
    assert!(store
        .calls()
        .iter()
        .all(|call| !matches!(call, Call::Patch(..))));
    assert!(matches!(engine.publish().await, Err(SyncError::ReadOnly(_))));
    assert!(matches!(engine.rename("Mine").await, Err(SyncError::ReadOnly(_))));
}

#[tokio::test(start_paused = true)]
async fn test_initialize_without_id_deactivates() {
    let store = FakeStore::new();
    let engine = engine(&store);
    engine.create_new().await.unwrap();
    engine.notify_changed(state("pending"));

    assert_eq!(engine.initialize(None).await, InitOutcome::Deactivated);
    assert_eq!(engine.status(), SyncStatus::Idle);
    assert!(engine.active().is_none());

    sleep(QUIET * 2).await;
    assert!(store
        .calls()
        .iter()
        .all(|call| !matches!(call, Call::Patch(..))));
}

#[tokio::test(start_paused = true)]
async fn test_initialize_same_id_keeps_pending_save() {
    let store = FakeStore::new();
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();
    engine.notify_changed(state("keep me"));

    assert_eq!(engine.initialize(Some(id.clone())).await, InitOutcome::Unchanged);
    assert_eq!(engine.status(), SyncStatus::Unsaved);
    assert!(!store.calls().contains(&Call::Get(id.clone())));

    assert_eq!(engine.wait_settled().await, SyncStatus::Saved);
    assert_eq!(store.content_saves(&id), vec![state("keep me")]);
}

#[tokio::test(start_paused = true)]
async fn test_initialize_missing_document() {
    let store = FakeStore::new();
    let engine = engine(&store);
    let id = DocId::new("ghost");

    assert_eq!(
        engine.initialize(Some(id.clone())).await,
        InitOutcome::NotFound(id)
    );
    assert!(engine.active().is_none());
    assert_eq!(engine.status(), SyncStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_initialize_transport_failure() {
    let store = FakeStore::new();
    let id = store.insert("a", "Alpha", Some(state("a")), true);
    store.fail_loads(true);
    let engine = engine(&store);

    let outcome = engine.initialize(Some(id.clone())).await;
    assert!(matches!(outcome, InitOutcome::LoadFailed { id: ref failed, .. } if *failed == id));
    assert!(engine.active().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_initialize_substitutes_empty_state() {
    let store = FakeStore::new();
    let missing = store.insert("none", "No content", None, true);
    let placeholder = store.insert("braces", "Placeholder", Some("{}".into()), true);
    let broken = store.insert("broken", "Broken", Some("{not json".into()), true);
    let engine = engine(&store);

    for id in [missing, placeholder, broken] {
        let InitOutcome::Activated(active) = engine.initialize(Some(id)).await else {
            panic!("expected activation");
        };
        assert_eq!(active.content, content::empty_state());
        assert_eq!(active.sync, SyncStatus::Idle);
    }
}

#[tokio::test(start_paused = true)]
async fn test_latest_initialize_wins() {
    let store = FakeStore::new();
    let slow = store.insert("slow", "Slow", Some(state("slow")), true);
    let fast = store.insert("fast", "Fast", Some(state("fast")), true);
    store.set_get_latency(&slow, ms(1000));
    let engine = engine(&store);

    let (first, second) = tokio::join!(engine.initialize(Some(slow.clone())), async {
        sleep(ms(10)).await;
        engine.initialize(Some(fast.clone())).await
    });

    assert_eq!(first, InitOutcome::Superseded);
    assert!(matches!(second, InitOutcome::Activated(ref doc) if doc.id == fast));
    assert_eq!(engine.active_id(), Some(fast));
}

#[tokio::test(start_paused = true)]
async fn test_switch_discards_in_flight_save() {
    let store = FakeStore::new();
    let other = store.insert("other", "Other", Some(state("other")), true);
    store.set_save_latency(ms(1000));
    let engine = engine(&store);
    let first = engine.create_new().await.unwrap();
    engine.load_directory().await.unwrap();
    let before = engine.directory_entries();

    engine.notify_changed(state("first"));
    sleep(QUIET + ms(1)).await;
    assert_eq!(engine.status(), SyncStatus::Saving);

    let outcome = engine.initialize(Some(other.clone())).await;
    assert!(outcome.is_active());
    assert_eq!(engine.status(), SyncStatus::Idle);

    sleep(ms(2000)).await;
    assert_eq!(engine.status(), SyncStatus::Idle);
    assert_eq!(engine.active_id(), Some(other));
    assert_eq!(store.content_saves(&first), vec![state("first")]);
    // The late result leaves every entry as it was.
    assert_eq!(engine.directory_entries(), before);
}

#[tokio::test(start_paused = true)]
async fn test_switch_drops_pending_save() {
    let store = FakeStore::new();
    let other = store.insert("other", "Other", Some(state("other")), true);
    let engine = engine(&store);
    let first = engine.create_new().await.unwrap();

    engine.notify_changed(state("never sent"));
    engine.initialize(Some(other.clone())).await;
    sleep(QUIET * 2).await;

    assert!(store.content_saves(&first).is_empty());
    assert!(store.content_saves(&other).is_empty());
    assert_eq!(engine.status(), SyncStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_edit_during_save_is_followed_up() {
    let store = FakeStore::new();
    store.set_save_latency(ms(1000));
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    engine.notify_changed(state("one"));
    sleep(QUIET + ms(1)).await;
    assert_eq!(engine.status(), SyncStatus::Saving);

    engine.notify_changed(state("two"));
    assert_eq!(engine.status(), SyncStatus::Saving);

    // First save resolves while "two" is still unsent.
    sleep(ms(1000)).await;
    assert_eq!(engine.status(), SyncStatus::Unsaved);

    assert_eq!(engine.wait_settled().await, SyncStatus::Saved);
    assert_eq!(store.content_saves(&id), vec![state("one"), state("two")]);
}

#[tokio::test(start_paused = true)]
async fn test_timer_during_slow_save_defers() {
    let store = FakeStore::new();
    store.set_save_latency(ms(3000));
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    engine.notify_changed(state("one"));
    sleep(QUIET + ms(500)).await;
    engine.notify_changed(state("two"));

    // The second timer expires while the first save is still in flight.
    sleep(QUIET + ms(100)).await;
    assert_eq!(store.content_saves(&id), vec![state("one")]);
    assert_eq!(engine.status(), SyncStatus::Saving);

    assert_eq!(engine.wait_settled().await, SyncStatus::Saved);
    assert_eq!(store.content_saves(&id), vec![state("one"), state("two")]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_then_edit_recovers() {
    let store = FakeStore::new();
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    store.fail_saves(true);
    engine.notify_changed(state("lost"));
    assert_eq!(engine.wait_settled().await, SyncStatus::Error);

    // No retry on its own.
    sleep(QUIET * 3).await;
    assert_eq!(store.content_saves(&id).len(), 1);

    store.fail_saves(false);
    engine.notify_changed(state("found"));
    assert_eq!(engine.status(), SyncStatus::Unsaved);
    assert_eq!(engine.wait_settled().await, SyncStatus::Saved);
    assert_eq!(
        store.stored(&id).unwrap().content.as_deref(),
        Some(state("found").as_str())
    );
}

#[tokio::test(start_paused = true)]
async fn test_placeholder_content_is_not_saved() {
    let store = FakeStore::new();
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    engine.notify_changed("{}");
    engine.notify_changed("");
    sleep(QUIET * 2).await;

    assert_eq!(engine.status(), SyncStatus::Idle);
    assert!(store.content_saves(&id).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_notify_without_active_document() {
    let store = FakeStore::new();
    let engine = engine(&store);

    engine.notify_changed(state("orphan"));
    sleep(QUIET * 2).await;

    assert_eq!(engine.status(), SyncStatus::Idle);
    assert!(store.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_remove_active_document() {
    let store = FakeStore::new();
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();
    engine.notify_changed(state("doomed"));

    let outcome = engine.remove_by_id(&id).await.unwrap();
    assert!(outcome.was_active);
    assert!(engine.active().is_none());
    assert_eq!(engine.status(), SyncStatus::Idle);
    assert!(engine.directory_entries().iter().all(|e| e.id != id));

    sleep(QUIET * 2).await;
    assert!(store.content_saves(&id).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timer_does_not_fire_during_delete() {
    let store = FakeStore::new();
    store.set_delete_latency(ms(1000));
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    engine.notify_changed(state("doomed"));
    sleep(ms(1500)).await;
    // The quiet period ends while the delete is outstanding.
    let outcome = engine.remove_by_id(&id).await.unwrap();
    assert!(outcome.was_active);

    sleep(QUIET * 2).await;
    assert!(store.content_saves(&id).is_empty());
    assert_eq!(engine.status(), SyncStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_failed_delete_rearms_pending_save() {
    let store = FakeStore::new();
    store.fail_deletes(true);
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    engine.notify_changed(state("kept"));
    let err = engine.remove_by_id(&id).await.unwrap_err();
    assert!(matches!(err, SyncError::Client(_)));
    assert_eq!(engine.active_id(), Some(id.clone()));
    assert_eq!(engine.status(), SyncStatus::Unsaved);

    assert_eq!(engine.wait_settled().await, SyncStatus::Saved);
    assert_eq!(store.content_saves(&id), vec![state("kept")]);
}

#[tokio::test(start_paused = true)]
async fn test_remove_inactive_document() {
    let store = FakeStore::new();
    store.insert("a", "Alpha", Some(state("a")), true);
    store.insert("b", "Beta", Some(state("b")), true);
    let engine = engine(&store);
    assert_eq!(engine.load_directory().await.unwrap(), 2);
    let active = engine.create_new().await.unwrap();

    let outcome = engine.remove_by_id(&DocId::new("a")).await.unwrap();
    assert!(!outcome.was_active);
    assert_eq!(engine.active_id(), Some(active));

    let ids: Vec<_> = engine
        .directory_entries()
        .into_iter()
        .map(|e| e.id.0)
        .collect();
    assert_eq!(ids, ["new-1", "b"]);
}

#[tokio::test(start_paused = true)]
async fn test_save_touches_directory_entry() {
    let store = FakeStore::new();
    store.insert("a", "Alpha", Some(state("a")), true);
    let engine = engine(&store);
    engine.load_directory().await.unwrap();
    assert_eq!(engine.directory_entries()[0].updated_at, None);

    engine.initialize(Some(DocId::new("a"))).await;
    engine.notify_changed(state("edited"));
    engine.wait_settled().await;

    let entry = &engine.directory_entries()[0];
    assert_eq!(entry.updated_at.unwrap().to_rfc3339(), "2024-06-01T09:30:00+00:00");
}

#[tokio::test(start_paused = true)]
async fn test_rename_trims_and_skips_noop() {
    let store = FakeStore::new();
    let engine = engine(&store);
    let id = engine.create_new().await.unwrap();

    assert!(!engine.rename("   ").await.unwrap());
    assert!(!engine.rename("Untitled Draft").await.unwrap());
    assert!(engine.rename("  Field Notes ").await.unwrap());

    assert_eq!(engine.active().unwrap().title, "Field Notes");
    assert_eq!(engine.directory_entries()[0].title, "Field Notes");
    assert_eq!(store.stored(&id).unwrap().title, "Field Notes");
    let patches = store
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::Patch(..)))
        .count();
    assert_eq!(patches, 1);
}

#[tokio::test(start_paused = true)]
async fn test_commands_need_active_document() {
    let store = FakeStore::new();
    let engine = engine(&store);
    assert!(matches!(engine.publish().await, Err(SyncError::NoActiveDocument)));
    assert!(matches!(engine.rename("x").await, Err(SyncError::NoActiveDocument)));
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_transitions() {
    let store = FakeStore::new();
    store.set_save_latency(ms(100));
    let engine = engine(&store);
    let mut rx = engine.subscribe();
    engine.create_new().await.unwrap();

    engine.notify_changed(state("watched"));
    let mut seen = Vec::new();
    while rx.changed().await.is_ok() {
        let status = *rx.borrow_and_update();
        seen.push(status);
        if status == SyncStatus::Saved {
            break;
        }
    }
    assert_eq!(seen, [SyncStatus::Unsaved, SyncStatus::Saving, SyncStatus::Saved]);
}

#[tokio::test(start_paused = true)]
async fn test_reset_ignores_late_results() {
    let store = FakeStore::new();
    store.set_save_latency(ms(500));
    let engine = engine(&store);
    engine.create_new().await.unwrap();
    engine.notify_changed(state("late"));
    sleep(QUIET + ms(1)).await;

    engine.reset();
    sleep(ms(1000)).await;
    assert_eq!(engine.status(), SyncStatus::Idle);
    assert!(engine.active().is_none());
}
