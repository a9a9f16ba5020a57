//! Integration tests for the analysis pipeline: screening, persistence,
//! status transitions and the concurrency claim.

mod common;

use common::*;

#[tokio::test]
async fn analyze_stores_detections_and_completes_the_image() {
    let h = harness().await;
    let record = h
        .images
        .upload("cat.png", png_image(64, 48))
        .await
        .expect("upload");

    h.detector
        .set_detections(vec![raw_detection("cat", 0.95, (10, 10, 50, 50))]);
    let stored = h.detections.analyze(record.id).await.expect("analyze");

    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].label, "cat");
    assert_eq!(stored[0].confidence_score, 0.95);
    assert_eq!(stored[0].image_id, record.id);
    assert_eq!(
        (
            stored[0].bbox_xmin,
            stored[0].bbox_ymin,
            stored[0].bbox_xmax,
            stored[0].bbox_ymax
        ),
        (10, 10, 50, 50)
    );

    let after = h.images.get(record.id).await.expect("get");
    assert_eq!(after.status, ImageStatus::Completed);
}

#[tokio::test]
async fn screening_drops_weak_and_malformed_candidates() {
    let h = harness().await;
    let record = h
        .images
        .upload("screen.png", png_image(64, 48))
        .await
        .expect("upload");

    h.detector.set_detections(vec![
        raw_detection("cat", 0.95, (0, 0, 10, 10)),
        // Below the 0.5 threshold.
        raw_detection("dog", 0.3, (0, 0, 10, 10)),
        // Score outside [0, 1].
        raw_detection("ghost", 1.5, (0, 0, 10, 10)),
        // Degenerate box, xmax == xmin.
        raw_detection("line", 0.9, (5, 0, 5, 10)),
        raw_detection("bird", 0.7, (1, 1, 8, 8)),
    ]);
    let stored = h.detections.analyze(record.id).await.expect("analyze");

    let labels: Vec<&str> = stored.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["cat", "bird"]);
}

#[tokio::test]
async fn stored_detections_are_ordered_by_confidence() {
    let h = harness().await;
    let record = h
        .images
        .upload("order.png", png_image(64, 48))
        .await
        .expect("upload");

    h.detector.set_detections(vec![
        raw_detection("low", 0.6, (0, 0, 10, 10)),
        raw_detection("high", 0.99, (0, 0, 10, 10)),
        raw_detection("mid", 0.8, (0, 0, 10, 10)),
    ]);
    h.detections.analyze(record.id).await.expect("analyze");

    let listed = h
        .detections
        .detections_for_image(record.id)
        .await
        .expect("list");
    let scores: Vec<f64> = listed.iter().map(|d| d.confidence_score).collect();
    assert_eq!(scores, vec![0.99, 0.8, 0.6]);
}

#[tokio::test]
async fn reanalysis_replaces_prior_detections() {
    let h = harness().await;
    let record = h
        .images
        .upload("again.png", png_image(64, 48))
        .await
        .expect("upload");

    h.detector.set_detections(vec![
        raw_detection("cat", 0.9, (0, 0, 10, 10)),
        raw_detection("dog", 0.8, (0, 0, 10, 10)),
    ]);
    h.detections.analyze(record.id).await.expect("first analyze");
    assert_eq!(count_rows(&h.pool, "detections").await, 2);

    h.detector
        .set_detections(vec![raw_detection("bird", 0.7, (2, 2, 9, 9))]);
    let second = h
        .detections
        .analyze(record.id)
        .await
        .expect("second analyze");

    assert_eq!(second.len(), 1);
    assert_eq!(second[0].label, "bird");
    // The two prior rows are gone, not appended to.
    assert_eq!(count_rows(&h.pool, "detections").await, 1);
}

#[tokio::test]
async fn pipeline_failure_marks_the_image_failed_and_keeps_priors() {
    let h = harness().await;
    let record = h
        .images
        .upload("flaky.png", png_image(64, 48))
        .await
        .expect("upload");

    h.detector
        .set_detections(vec![raw_detection("cat", 0.9, (0, 0, 10, 10))]);
    h.detections.analyze(record.id).await.expect("first analyze");

    h.detector.set_fail(true);
    let err = h.detections.analyze(record.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Upstream(_)));

    let after = h.images.get(record.id).await.expect("get");
    assert_eq!(after.status, ImageStatus::Failed);
    // The failed run never reached the replace, so the old row survives.
    let listed = h
        .detections
        .detections_for_image(record.id)
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].label, "cat");
}

#[tokio::test]
async fn failed_images_can_be_reanalyzed() {
    let h = harness().await;
    let record = h
        .images
        .upload("retry.png", png_image(64, 48))
        .await
        .expect("upload");

    h.detector.set_fail(true);
    h.detections.analyze(record.id).await.unwrap_err();

    h.detector.set_fail(false);
    h.detector
        .set_detections(vec![raw_detection("cat", 0.9, (0, 0, 10, 10))]);
    let stored = h.detections.analyze(record.id).await.expect("reanalyze");
    assert_eq!(stored.len(), 1);

    let after = h.images.get(record.id).await.expect("get");
    assert_eq!(after.status, ImageStatus::Completed);
}

#[tokio::test]
async fn a_held_processing_claim_turns_into_a_conflict() {
    let h = harness().await;
    let record = h
        .images
        .upload("busy.png", png_image(64, 48))
        .await
        .expect("upload");

    // First caller holds the claim.
    assert!(h
        .image_repo
        .claim_processing(record.id)
        .await
        .expect("claim"));
    // A second claim on the same image loses.
    assert!(!h
        .image_repo
        .claim_processing(record.id)
        .await
        .expect("second claim"));

    let err = h.detections.analyze(record.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn analyze_reports_a_missing_stored_file_as_a_storage_error() {
    let h = harness().await;
    let record = h
        .images
        .upload("drifted.png", png_image(64, 48))
        .await
        .expect("upload");

    // The file vanishes out from under the metadata row.
    std::fs::remove_file(h.dir.path().join("uploads").join(&record.storage_path))
        .expect("remove stored file");

    let err = h.detections.analyze(record.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Storage(_)));

    // The check runs before the claim, so the image is neither stuck in
    // processing nor marked failed.
    let after = h.images.get(record.id).await.expect("get");
    assert_eq!(after.status, ImageStatus::Pending);
}

#[tokio::test]
async fn undecodable_content_fails_analysis_as_validation() {
    let h = harness().await;
    // Upload screens the extension only; content is checked at analysis.
    let record = h
        .images
        .upload("fake.png", b"not really a png".to_vec())
        .await
        .expect("upload");

    let err = h.detections.analyze(record.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let after = h.images.get(record.id).await.expect("get");
    assert_eq!(after.status, ImageStatus::Failed);
}

#[tokio::test]
async fn detections_for_missing_image_is_not_found() {
    let h = harness().await;

    let err = h
        .detections
        .detections_for_image(uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn unanalyzed_image_has_an_empty_detection_list() {
    let h = harness().await;
    let record = h
        .images
        .upload("quiet.png", png_image(64, 48))
        .await
        .expect("upload");

    let listed = h
        .detections
        .detections_for_image(record.id)
        .await
        .expect("list");
    assert!(listed.is_empty());
}

#[tokio::test]
async fn analyzing_a_missing_image_is_not_found() {
    let h = harness().await;

    let err = h.detections.analyze(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
