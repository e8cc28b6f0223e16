//! Session controller behavior end to end: staleness, reset, intake
//! failures and the model lifecycle.

mod common;

use std::sync::Arc;

use common::{golden_dog_jpeg, keyed_png, Fixture, PaletteProvider};
use glimpse_core::{
    DroppedItem, FailureKind, ImageOrigin, ModelStatus, PickedFile, SessionController,
    SubmitOutcome,
};

fn pick(key: u8) -> Option<PickedFile> {
    Some(PickedFile::new(keyed_png(key), "image/png").with_name(format!("{}.png", key)))
}

fn top_label(session: &SessionController) -> Option<String> {
    session
        .snapshot()
        .predictions
        .top()
        .map(|p| p.label.clone())
}

#[tokio::test]
async fn latest_submission_wins_when_older_finishes_last() {
    let mut fx = Fixture::ready().await;
    let release_a = fx.model.gate(1);
    let release_b = fx.model.gate(2);

    let session = fx.session.clone();
    let a = tokio::spawn(async move { session.pick_file(pick(1)).await });
    assert_eq!(fx.entered.recv().await, Some(1));

    let session = fx.session.clone();
    let b = tokio::spawn(async move { session.pick_file(pick(2)).await });
    assert_eq!(fx.entered.recv().await, Some(2));

    release_b.send(()).unwrap();
    assert!(b.await.unwrap().is_classified());
    release_a.send(()).unwrap();
    assert_eq!(a.await.unwrap(), SubmitOutcome::Superseded);

    let state = fx.session.snapshot();
    assert_eq!(top_label(&fx.session).as_deref(), Some("image-2"));
    assert_eq!(state.image.as_ref().unwrap().name, "2.png");
    assert!(!state.busy);
    assert!(state.failure.is_none());
}

#[tokio::test]
async fn latest_submission_wins_when_older_finishes_first() {
    let mut fx = Fixture::ready().await;
    let release_a = fx.model.gate(1);
    let release_b = fx.model.gate(2);

    let session = fx.session.clone();
    let a = tokio::spawn(async move { session.pick_file(pick(1)).await });
    assert_eq!(fx.entered.recv().await, Some(1));

    let session = fx.session.clone();
    let b = tokio::spawn(async move { session.pick_file(pick(2)).await });
    assert_eq!(fx.entered.recv().await, Some(2));

    release_a.send(()).unwrap();
    assert_eq!(a.await.unwrap(), SubmitOutcome::Superseded);

    // A's result never shows up while B is still running
    let state = fx.session.snapshot();
    assert!(state.predictions.is_empty());
    assert!(state.busy);
    assert_eq!(state.image.as_ref().unwrap().name, "2.png");

    release_b.send(()).unwrap();
    assert!(b.await.unwrap().is_classified());
    assert_eq!(top_label(&fx.session).as_deref(), Some("image-2"));
    assert!(!fx.session.snapshot().busy);
}

#[tokio::test]
async fn reset_discards_inflight_submission() {
    let mut fx = Fixture::ready().await;
    let release = fx.model.gate(4);

    let session = fx.session.clone();
    let pending = tokio::spawn(async move { session.pick_file(pick(4)).await });
    assert_eq!(fx.entered.recv().await, Some(4));
    assert!(fx.session.snapshot().busy);

    fx.session.reset();
    let state = fx.session.snapshot();
    assert!(state.is_clear());
    assert_eq!(state.model, ModelStatus::Ready);

    release.send(()).unwrap();
    assert_eq!(pending.await.unwrap(), SubmitOutcome::Superseded);
    assert!(fx.session.snapshot().is_clear());
}

#[tokio::test]
async fn reset_from_every_state_is_total() {
    // After a failure
    let fx = Fixture::ready().await;
    fx.session.pick_file(None).await;
    fx.session.reset();
    assert!(fx.session.snapshot().is_clear());

    // After a classification
    fx.session.pick_file(pick(3)).await;
    fx.session.reset();
    assert!(fx.session.snapshot().is_clear());

    // While the model is still loading
    let fx = Fixture::new();
    let release = fx.provider.gate_load();
    let session = fx.session.clone();
    let startup = tokio::spawn(async move { session.startup().await });
    let mut rx = fx.session.subscribe();
    rx.wait_for(|s| s.model.is_loading()).await.unwrap();

    fx.session.reset();
    let state = fx.session.snapshot();
    assert!(state.is_clear());
    assert_eq!(state.model, ModelStatus::Loading);

    release.send(()).unwrap();
    startup.await.unwrap().unwrap();
    assert_eq!(fx.session.snapshot().model, ModelStatus::Ready);
}

#[tokio::test]
async fn dropping_text_file_leaves_image_and_predictions() {
    let fx = Fixture::ready().await;
    fx.session.pick_file(pick(6)).await;
    let before = fx.session.snapshot();

    let outcome = fx
        .session
        .drop_items(vec![
            DroppedItem::new(b"hello".to_vec(), "text/plain").with_name("notes.txt")
        ])
        .await;
    assert!(matches!(outcome, SubmitOutcome::Failed(ref f) if f.kind == FailureKind::UnsupportedDropItem));

    let after = fx.session.snapshot();
    assert_eq!(after.failure_kind(), Some(FailureKind::UnsupportedDropItem));
    assert_eq!(after.predictions, before.predictions);
    assert_eq!(
        after.image.as_ref().unwrap().content_hash,
        before.image.as_ref().unwrap().content_hash
    );
    assert!(!after.busy);
}

#[tokio::test]
async fn drop_takes_first_image_item() {
    let fx = Fixture::ready().await;
    let outcome = fx
        .session
        .drop_items(vec![
            DroppedItem::new(b"hello".to_vec(), "text/plain"),
            DroppedItem::new(keyed_png(8), "image/png").with_name("eight.png"),
            DroppedItem::new(keyed_png(9), "image/png").with_name("nine.png"),
        ])
        .await;
    assert!(outcome.is_classified());

    let state = fx.session.snapshot();
    let image = state.image.as_ref().unwrap();
    assert_eq!(image.name, "eight.png");
    assert_eq!(image.origin, ImageOrigin::Dropped);
    assert_eq!(top_label(&fx.session).as_deref(), Some("image-8"));
}

#[tokio::test]
async fn empty_drop_is_unsupported() {
    let fx = Fixture::ready().await;
    let outcome = fx.session.drop_items(Vec::new()).await;
    assert!(matches!(outcome, SubmitOutcome::Failed(ref f) if f.kind == FailureKind::UnsupportedDropItem));
    assert!(fx.session.snapshot().image.is_none());
}

#[tokio::test]
async fn submit_before_model_ready_is_not_ready() {
    let fx = Fixture::new();
    let release = fx.provider.gate_load();
    let session = fx.session.clone();
    let startup = tokio::spawn(async move { session.startup().await });
    let mut rx = fx.session.subscribe();
    rx.wait_for(|s| s.model.is_loading() && s.busy).await.unwrap();

    let outcome = fx.session.pick_file(pick(5)).await;
    assert!(matches!(outcome, SubmitOutcome::Failed(ref f) if f.kind == FailureKind::ModelNotReady));
    let state = fx.session.snapshot();
    assert!(state.predictions.is_empty());
    assert!(state.image.is_some());
    assert!(state.model.is_loading());
    assert!(state.busy, "still loading the model");

    release.send(()).unwrap();
    startup.await.unwrap().unwrap();
    let state = fx.session.snapshot();
    assert_eq!(state.model, ModelStatus::Ready);
    assert!(!state.busy);

    // The same image goes through once the model is ready
    assert!(fx.session.pick_file(pick(5)).await.is_classified());
}

#[tokio::test]
async fn concurrent_startups_load_once() {
    let fx = Fixture::new();
    let release = fx.provider.gate_load();

    let (s1, s2) = (fx.session.clone(), fx.session.clone());
    let first = tokio::spawn(async move { s1.startup().await });
    let second = tokio::spawn(async move { s2.startup().await });
    let mut rx = fx.session.subscribe();
    rx.wait_for(|s| s.model.is_loading()).await.unwrap();

    release.send(()).unwrap();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();
    assert_eq!(fx.provider.loads(), 1);
}

#[tokio::test]
async fn model_load_failure_blocks_submit_until_retry() {
    let fx = Fixture::new();
    fx.provider.set_failing(true);

    let err = fx.session.startup().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::ModelLoadFailure);
    let state = fx.session.snapshot();
    assert!(state.model.is_failed());
    assert_eq!(state.failure_kind(), Some(FailureKind::ModelLoadFailure));

    // No automatic retry
    assert!(fx.session.startup().await.is_err());
    assert_eq!(fx.provider.loads(), 1);

    let outcome = fx.session.pick_file(pick(7)).await;
    assert!(matches!(outcome, SubmitOutcome::Failed(ref f) if f.kind == FailureKind::ModelLoadFailure));
    assert!(fx.session.snapshot().image.is_none());

    fx.provider.set_failing(false);
    fx.session.retry_model().await.unwrap();
    let state = fx.session.snapshot();
    assert_eq!(state.model, ModelStatus::Ready);
    assert!(state.failure.is_none());
    assert_eq!(fx.provider.loads(), 2);

    assert!(fx.session.pick_file(pick(7)).await.is_classified());
}

#[tokio::test]
async fn golden_dog_photo_is_classified_as_dog_breed() {
    let session = SessionController::from_provider(Arc::new(PaletteProvider));
    session.startup().await.unwrap();

    let file = PickedFile::new(golden_dog_jpeg(500, 500), "image/jpeg").with_name("dog.jpg");
    let outcome = session.pick_file(Some(file)).await;
    assert!(outcome.is_classified());

    let state = session.snapshot();
    let image = state.image.as_ref().unwrap();
    assert_eq!((image.width, image.height), (Some(500), Some(500)));
    assert_eq!(image.format.as_deref(), Some("jpeg"));

    let top = state.predictions.top().unwrap();
    assert_eq!(top.label, "golden retriever");
    assert!(top.probability > 0.3);
    assert!(state.predictions.is_ranked());
    assert_eq!(state.results.len(), 3);
    assert_eq!(state.results[0].label, "golden retriever");
    assert!(state.results[0].display.ends_with('%'));
}
