//! Integration tests for gateway routing.
//!
//! Checks which backend each content kind reaches, with which prompt and
//! payload shape, and how failures and slow backends are reported.

mod fake_models;

use fake_models::{CloudCall, FakeCloud, FakeLocal, Harness, PROBE_TIMEOUT, REQUEST_TIMEOUT};
use plainly_lib::error::{CloudModelError, ExplainError};
use plainly_lib::input::{classify, ContentKind};
use plainly_lib::llm::prompts;
use plainly_lib::llm::provider::ProcessingMode;
use std::time::Duration;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn only_call(h: &Harness) -> CloudCall {
    let calls = h.cloud.calls();
    assert_eq!(calls.len(), 1, "expected exactly one cloud call: {:?}", calls);
    calls.into_iter().next().unwrap()
}

#[tokio::test]
async fn on_device_text_goes_to_local_model() {
    let h = Harness::new(FakeLocal::replying("# Local"), FakeCloud::replying("# Cloud"));
    let request = classify(ContentKind::Text("Raise prices by 40%.".to_string()));

    let markdown = h.gateway.dispatch(&request, ProcessingMode::OnDevice).await.unwrap();

    assert_eq!(markdown, "# Local");
    assert_eq!(h.local.prompts(), vec![prompts::text_prompt("Raise prices by 40%.")]);
    assert_eq!(h.cloud.call_count(), 0);
}

#[tokio::test]
async fn cloud_text_uses_text_prompt() {
    let h = Harness::new(FakeLocal::replying("# Local"), FakeCloud::replying("# Cloud"));
    let request = classify(ContentKind::Text("Raise prices by 40%.".to_string()));

    h.gateway.dispatch(&request, ProcessingMode::Cloud).await.unwrap();

    assert_eq!(
        only_call(&h),
        CloudCall::Text {
            prompt: prompts::text_prompt("Raise prices by 40%.")
        }
    );
    assert_eq!(h.local.generate_count(), 0);
}

#[tokio::test]
async fn link_uses_link_prompt_even_in_on_device_mode() {
    let h = Harness::new(FakeLocal::replying("# Local"), FakeCloud::replying("# Cloud"));
    let request = classify(ContentKind::Link("https://example.com/essay".to_string()));

    h.gateway.dispatch(&request, ProcessingMode::OnDevice).await.unwrap();

    assert_eq!(
        only_call(&h),
        CloudCall::Text {
            prompt: prompts::link_prompt("https://example.com/essay")
        }
    );
    assert_eq!(h.local.generate_count(), 0);
}

#[tokio::test]
async fn image_bytes_carry_sniffed_mime() {
    let h = Harness::new(FakeLocal::unavailable(), FakeCloud::replying("# Image"));
    let mut png = PNG_MAGIC.to_vec();
    png.extend_from_slice(&[0; 16]);
    let request = classify(ContentKind::ImageBytes(png.clone()));

    h.gateway.dispatch(&request, ProcessingMode::Cloud).await.unwrap();

    assert_eq!(
        only_call(&h),
        CloudCall::Data {
            prompt: prompts::image_prompt(),
            bytes: png.len(),
            mime: "image/png".to_string(),
        }
    );
}

#[tokio::test]
async fn unknown_image_bytes_default_to_jpeg() {
    let h = Harness::new(FakeLocal::unavailable(), FakeCloud::replying("# Image"));
    let request = classify(ContentKind::ImageBytes(vec![1, 2, 3]));

    h.gateway.dispatch(&request, ProcessingMode::Cloud).await.unwrap();

    let CloudCall::Data { mime, .. } = only_call(&h) else {
        panic!("image must be sent inline");
    };
    assert_eq!(mime, "image/jpeg");
}

#[tokio::test]
async fn video_bytes_use_video_prompt() {
    let h = Harness::new(FakeLocal::unavailable(), FakeCloud::replying("# Video"));
    let mut mov = vec![0, 0, 0, 0x14];
    mov.extend_from_slice(b"ftypqt  ");
    let request = classify(ContentKind::VideoBytes(mov.clone()));

    h.gateway.dispatch(&request, ProcessingMode::Cloud).await.unwrap();

    assert_eq!(
        only_call(&h),
        CloudCall::Data {
            prompt: prompts::video_prompt(),
            bytes: mov.len(),
            mime: "video/quicktime".to_string(),
        }
    );
}

#[tokio::test]
async fn document_keeps_declared_media_type() {
    let h = Harness::new(FakeLocal::unavailable(), FakeCloud::replying("# Doc"));
    let request = classify(ContentKind::Document {
        data: b"%PDF-1.7".to_vec(),
        media_type: "application/pdf".to_string(),
        file_name: "lease.pdf".to_string(),
    });

    h.gateway.dispatch(&request, ProcessingMode::Cloud).await.unwrap();

    let CloudCall::Data { prompt, bytes, mime } = only_call(&h) else {
        panic!("document must be sent inline");
    };
    assert!(prompt.contains("Document: lease.pdf"));
    assert_eq!(bytes, 8);
    assert_eq!(mime, "application/pdf");
}

#[tokio::test]
async fn youtube_wins_over_on_device_mode() {
    let h = Harness::new(FakeLocal::replying("# Local"), FakeCloud::replying("# Video"));
    let request = classify(ContentKind::Text(
        "watch https://www.youtube.com/watch?v=abc123 tonight".to_string(),
    ));

    h.gateway.dispatch(&request, ProcessingMode::OnDevice).await.unwrap();

    let CloudCall::Uri { uri, .. } = only_call(&h) else {
        panic!("YouTube must be sent by reference");
    };
    assert_eq!(uri, "https://www.youtube.com/watch?v=abc123");
    assert_eq!(h.local.generate_count(), 0);
}

#[tokio::test]
async fn youtube_falls_back_to_text_once() {
    let h = Harness::new(
        FakeLocal::unavailable(),
        FakeCloud::replying("# From text").failing_uri(CloudModelError::Api {
            status: 400,
            message: "Unsupported file uri".to_string(),
        }),
    );
    let request = classify(ContentKind::Link("https://youtu.be/abc123".to_string()));

    let markdown = h.gateway.dispatch(&request, ProcessingMode::Cloud).await.unwrap();

    assert_eq!(markdown, "# From text");
    let calls = h.cloud.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], CloudCall::Uri { .. }));
    assert_eq!(
        calls[1],
        CloudCall::Text {
            prompt: prompts::video_link_fallback_prompt("https://youtu.be/abc123")
        }
    );
}

#[tokio::test]
async fn youtube_second_failure_surfaces() {
    let h = Harness::new(
        FakeLocal::unavailable(),
        FakeCloud::failing(CloudModelError::Http("connection reset".to_string())),
    );
    let request = classify(ContentKind::Link("https://youtu.be/abc123".to_string()));

    let err = h
        .gateway
        .dispatch(&request, ProcessingMode::Cloud)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ExplainError::Transport("request failed: connection reset".to_string())
    );
    assert_eq!(h.cloud.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn youtube_timeout_is_not_retried() {
    let h = Harness::new(
        FakeLocal::unavailable(),
        FakeCloud::replying("# Late").with_delay(Duration::from_secs(600)),
    );
    let request = classify(ContentKind::Link("https://youtu.be/abc123".to_string()));

    let started = tokio::time::Instant::now();
    let err = h
        .gateway
        .dispatch(&request, ProcessingMode::Cloud)
        .await
        .unwrap_err();

    assert_eq!(err, ExplainError::Timeout(REQUEST_TIMEOUT));
    assert!(started.elapsed() <= REQUEST_TIMEOUT);
    assert_eq!(h.cloud.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn youtube_fallback_shares_the_request_deadline() {
    // Each call takes 3s: the reference call fails at 3s, the text
    // fallback would finish at 6s, past the 5s deadline.
    let h = Harness::new(
        FakeLocal::unavailable(),
        FakeCloud::replying("# From text")
            .with_delay(Duration::from_secs(3))
            .failing_uri(CloudModelError::Http("connection reset".to_string())),
    );
    let request = classify(ContentKind::Link("https://youtu.be/abc123".to_string()));

    let started = tokio::time::Instant::now();
    let err = h
        .gateway
        .dispatch(&request, ProcessingMode::Cloud)
        .await
        .unwrap_err();

    assert_eq!(err, ExplainError::Timeout(REQUEST_TIMEOUT));
    assert!(started.elapsed() <= REQUEST_TIMEOUT);
    assert_eq!(h.cloud.call_count(), 2);
}

#[tokio::test]
async fn empty_cloud_answer_is_generation_failure() {
    let h = Harness::new(
        FakeLocal::unavailable(),
        FakeCloud::failing(CloudModelError::EmptyResponse),
    );
    let request = classify(ContentKind::Link("https://example.com".to_string()));

    let err = h
        .gateway
        .dispatch(&request, ProcessingMode::Cloud)
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "Failed: No clear explanation could be generated."
    );
}

#[tokio::test(start_paused = true)]
async fn slow_local_model_degrades_to_placeholder() {
    let h = Harness::new(
        FakeLocal::replying("# Too late").with_delay(Duration::from_secs(60)),
        FakeCloud::replying("# Cloud"),
    );
    let request = classify(ContentKind::Text("slow".to_string()));

    let markdown = h.gateway.dispatch(&request, ProcessingMode::OnDevice).await.unwrap();

    assert_eq!(markdown, prompts::offline_placeholder("slow"));
    assert_eq!(h.cloud.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn hung_probe_counts_as_unavailable() {
    let h = Harness::new(
        FakeLocal::replying("# Local").with_probe_delay(PROBE_TIMEOUT * 10),
        FakeCloud::replying("# Cloud"),
    );
    let request = classify(ContentKind::Text("probe".to_string()));

    let markdown = h.gateway.dispatch(&request, ProcessingMode::OnDevice).await.unwrap();

    assert_eq!(markdown, prompts::offline_placeholder("probe"));
    assert_eq!(h.local.generate_count(), 0);
}

#[tokio::test]
async fn availability_is_probed_once() {
    let h = Harness::new(FakeLocal::replying("# Local"), FakeCloud::replying("# Cloud"));
    for body in ["one", "two", "three"] {
        let request = classify(ContentKind::Text(body.to_string()));
        h.gateway.dispatch(&request, ProcessingMode::OnDevice).await.unwrap();
    }
    assert_eq!(h.local.probe_count(), 1);
    assert_eq!(h.local.generate_count(), 3);
}
