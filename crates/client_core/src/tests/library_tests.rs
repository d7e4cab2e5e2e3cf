use super::*;

use crate::fake_core::{manga, TestMangaCore};

#[tokio::test]
async fn starts_pending_and_settles_after_load() {
    let core = TestMangaCore::with_library(vec![manga(1, "Alpha"), manga(2, "Beta")]);
    let library = LibraryController::new(core.clone());
    assert!(library.snapshot().loading);

    library.load().await;

    let state = library.snapshot();
    assert!(!state.loading);
    assert_eq!(state.items.len(), 2);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn delete_reloads_remaining_entries() {
    let core = TestMangaCore::with_library(vec![manga(1, "Alpha"), manga(2, "Beta")]);
    let library = LibraryController::new(core.clone());
    library.load().await;

    library.delete(MangaId(2)).await;

    let state = library.snapshot();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].id, MangaId(1));
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(
        core.calls(),
        vec!["list_library", "delete_from_library", "list_library"]
    );
}

#[tokio::test]
async fn failed_delete_still_settles_and_reports() {
    let core = TestMangaCore::with_library(vec![manga(1, "Alpha"), manga(2, "Beta")]);
    core.fail("delete_from_library");
    let library = LibraryController::new(core.clone());
    library.load().await;

    library.delete(MangaId(2)).await;

    let state = library.snapshot();
    assert!(!state.loading);
    assert_eq!(state.items.len(), 2);
    assert_eq!(
        state.error,
        Some(ErrorInfo::new("delete_from_library failed"))
    );
    assert_eq!(core.count("list_library"), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_delete_never_settles_without_its_error() {
    let core = TestMangaCore::with_library(vec![manga(1, "Alpha"), manga(2, "Beta")]);
    core.fail("delete_from_library");
    let library = LibraryController::new(core.clone());
    assert!(library.snapshot().loading);

    let mut rx = library.state().subscribe();
    let observer = tokio::spawn(async move {
        let settled = rx
            .wait_for(|s| !s.loading)
            .await
            .expect("state open")
            .clone();
        settled
    });

    library.delete(MangaId(2)).await;

    let first_settled = observer.await.expect("observer");
    assert_eq!(first_settled.items.len(), 2);
    assert_eq!(
        first_settled.error,
        Some(ErrorInfo::new("delete_from_library failed"))
    );
}

#[tokio::test]
async fn failed_reload_after_delete_keeps_previous_items() {
    let core = TestMangaCore::with_library(vec![manga(1, "Alpha"), manga(2, "Beta")]);
    let library = LibraryController::new(core.clone());
    library.load().await;
    core.fail("list_library");

    library.delete(MangaId(1)).await;

    let state = library.snapshot();
    assert!(!state.loading);
    assert_eq!(state.items.len(), 2);
    assert_eq!(state.error, Some(ErrorInfo::new("list_library failed")));
}

#[tokio::test]
async fn reload_clears_previous_error() {
    let core = TestMangaCore::with_library(vec![manga(1, "Alpha")]);
    core.fail_times("list_library", 1);
    let library = LibraryController::new(core.clone());

    library.load().await;
    assert!(library.snapshot().error.is_some());

    library.load().await;
    let state = library.snapshot();
    assert_eq!(state.error, None);
    assert_eq!(state.items.len(), 1);
}

#[tokio::test]
async fn open_returns_entry_or_records_error() {
    let core = TestMangaCore::with_library(vec![manga(1, "Alpha")]);
    let library = LibraryController::new(core.clone());

    let opened = library.open(MangaId(1)).await.expect("opened");
    assert_eq!(opened.title, "Alpha");

    assert!(library.open(MangaId(9)).await.is_none());
    assert_eq!(
        library.snapshot().error,
        Some(ErrorInfo::new("manga 9 not in library"))
    );
}

#[tokio::test]
async fn spawned_delete_is_observable_through_state() {
    let core = TestMangaCore::with_library(vec![manga(1, "Alpha"), manga(2, "Beta")]);
    let library = LibraryController::new(core.clone());
    library.spawn_load().await.expect("load task");

    library.spawn_delete(MangaId(1)).await.expect("delete task");

    let settled = library.state().wait_for(|s| !s.loading).await;
    assert_eq!(settled.items, vec![manga(2, "Beta")]);
}
