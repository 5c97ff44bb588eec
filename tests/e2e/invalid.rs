//! Uploads that must not produce a layer.

use bytes::Bytes;
use layerprobe::fixtures::dataset;
use layerprobe::portal::{UploadResponse, UploadStep};

use crate::common::{LiveHarness, live_harness};

/// Structurally broken geospatial data gets parked at the SRS step with a
/// projection-related message rather than completing.
#[tokio::test]
#[ignore = "needs a live portal deployment"]
async fn test_invalid_data_surfaces_projection_error() {
    let Some(harness) = live_harness().await else {
        return;
    };

    let bad_dir = harness.data.bad();
    let files = dataset::main_files(&bad_dir).expect("bad data listing");
    assert!(
        !files.is_empty(),
        "no files to upload in {}",
        bad_dir.display()
    );

    for path in files {
        let stem = path.file_stem().unwrap().to_str().unwrap().to_string();
        match harness.uploads.upload_file(&path).await {
            Ok(saved) => {
                let _ = harness.uploads.wait_for_progress(&saved).await;
                assert_invalid_projection(&harness, &saved, &stem).await;
            }
            // some broken files are rejected outright at the save step
            Err(e) => {
                let status = e
                    .status()
                    .unwrap_or_else(|| panic!("unexpected failure for {}: {}", stem, e));
                assert!(status >= 400, "expected an error status, got {}", status);
            }
        }
    }
}

async fn assert_invalid_projection(harness: &LiveHarness, saved: &UploadResponse, stem: &str) {
    if let Some(message) = &saved.error_msg {
        assert!(
            message.to_ascii_lowercase().contains("srs")
                || message.to_ascii_lowercase().contains("projection"),
            "expected a projection error for {}, got {}",
            stem,
            message
        );
        return;
    }

    assert!(saved.success, "save step should still answer success");
    let redirect = saved
        .redirect_to
        .as_deref()
        .expect("invalid upload should redirect somewhere");
    assert!(
        UploadStep::Srs.in_url(redirect),
        "expected {} to be parked at the srs step, got {}",
        stem,
        redirect
    );

    // the step page names the offending upload
    let response = harness.session.get(redirect).await.expect("srs step page");
    assert!(response.status().is_success());
    let body = response.text().await.expect("srs step body");
    assert!(
        body.contains(stem),
        "srs step page does not mention {}",
        stem
    );
}

/// An extension the importer does not support is refused with an HTTP
/// error status at the save step.
#[tokio::test]
#[ignore = "needs a live portal deployment"]
async fn test_unsupported_extension_rejected() {
    let Some(harness) = live_harness().await else {
        return;
    };

    let err = harness
        .uploads
        .upload_bytes("layerprobe_notes.txt", Bytes::from_static(b"not a layer"))
        .await
        .unwrap_err();
    let status = err.status().expect("expected an HTTP status error");
    assert!(status >= 400, "expected an error status, got {}", status);
}
