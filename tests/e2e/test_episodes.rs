use crate::e2e::helpers;

use helpers::fixtures::SCRIPT;
use helpers::{TestContext, DATE};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_context::test_context;

fn segment_statuses(body: &Value) -> Vec<(u64, String)> {
    body.get("segments")
        .and_then(|v| v.as_array())
        .expect("Missing segments field")
        .iter()
        .map(|s| {
            (
                s.get("index").and_then(|v| v.as_u64()).unwrap(),
                s.get("status").and_then(|v| v.as_str()).unwrap().to_string(),
            )
        })
        .collect()
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_unknown_episode_as_idle(ctx: &TestContext) {
    let response = ctx.client.get(&format!("/api/episodes/{}", DATE)).await.unwrap();

    response.assert_status(StatusCode::OK);

    let body = response.body.as_ref().unwrap();
    assert_eq!(
        body,
        &json!({
            "date": DATE,
            "script": false,
            "dialogue_units": 0,
            "merged": false,
            "run_status": "idle",
            "segments": []
        })
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_segment_status_per_unit(ctx: &TestContext) {
    ctx.fixtures.write_script(DATE, SCRIPT).await.unwrap();
    ctx.fixtures.write_segment(DATE, 1, b"audio").await.unwrap();

    let response = ctx.client.get(&format!("/api/episodes/{}", DATE)).await.unwrap();

    response.assert_status(StatusCode::OK);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body.get("script"), Some(&json!(true)));
    assert_eq!(body.get("dialogue_units"), Some(&json!(3)));
    assert_eq!(
        segment_statuses(body),
        vec![
            (0, "pending".to_string()),
            (1, "completed".to_string()),
            (2, "pending".to_string()),
        ]
    );

    let files: Vec<&str> = body["segments"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s.get("file").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(files, vec!["part_001.mp3", "part_002.mp3", "part_003.mp3"]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_dates(ctx: &TestContext) {
    let response = ctx.client.get("/api/episodes/05-02-2025").await.unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("invalid date");

    let response = ctx
        .client
        .post("/api/episodes/not-a-date/audio", &json!({}))
        .await
        .unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_when_script_is_missing(ctx: &TestContext) {
    let response = ctx
        .client
        .post(&format!("/api/episodes/{}/audio", DATE), &json!({}))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_message("no script");
    assert_eq!(ctx.tts.submit_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_synthesize_and_merge_in_background(ctx: &TestContext) {
    ctx.fixtures.write_script(DATE, SCRIPT).await.unwrap();

    let response = ctx
        .client
        .post(&format!("/api/episodes/{}/audio", DATE), &json!({}))
        .await
        .unwrap();

    response.assert_status(StatusCode::ACCEPTED);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body.get("run_status").and_then(|v| v.as_str()), Some("running"));

    let status = ctx.wait_for_run(DATE).await;
    assert_eq!(status.get("run_status").and_then(|v| v.as_str()), Some("completed"));
    assert_eq!(status.get("merged"), Some(&json!(true)));
    assert!(segment_statuses(&status)
        .iter()
        .all(|(_, s)| s == "completed"));

    let audio = ctx.fixtures.read_final_audio(DATE).await.unwrap();
    let first = audio.find("大家好").unwrap();
    let second = audio.find("今天我们聊三条新闻").unwrap();
    let third = audio.find("第一条是关于芯片的").unwrap();
    assert!(first < second && second < third, "Segments merged out of order: {}", audio);

    let mut voices = ctx.tts.voices();
    voices.sort();
    assert_eq!(voices, vec!["voice-luo", "voice-luo", "voice-wang"]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_skip_units_with_existing_segments(ctx: &TestContext) {
    ctx.fixtures.write_script(DATE, SCRIPT).await.unwrap();
    ctx.fixtures.write_segment(DATE, 0, b"[kept]").await.unwrap();

    ctx.client
        .post(&format!("/api/episodes/{}/audio", DATE), &json!({}))
        .await
        .unwrap()
        .assert_status(StatusCode::ACCEPTED);

    let status = ctx.wait_for_run(DATE).await;
    assert_eq!(status.get("run_status").and_then(|v| v.as_str()), Some("completed"));
    assert_eq!(ctx.tts.submit_count(), 2);

    let audio = ctx.fixtures.read_final_audio(DATE).await.unwrap();
    assert!(audio.starts_with("[kept]"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refuse_a_second_run_for_the_same_episode(ctx: &TestContext) {
    ctx.fixtures.write_script(DATE, SCRIPT).await.unwrap();
    ctx.tts.hold_downloads();

    ctx.client
        .post(&format!("/api/episodes/{}/audio", DATE), &json!({}))
        .await
        .unwrap()
        .assert_status(StatusCode::ACCEPTED);

    let response = ctx
        .client
        .post(&format!("/api/episodes/{}/audio", DATE), &json!({}))
        .await
        .unwrap();
    response
        .assert_status(StatusCode::CONFLICT)
        .assert_error_message("already running");

    let response = ctx
        .client
        .post(&format!("/api/episodes/{}/merge", DATE), &json!({}))
        .await
        .unwrap();
    response.assert_status(StatusCode::CONFLICT);

    ctx.tts.release_downloads();
    let status = ctx.wait_for_run(DATE).await;
    assert_eq!(status.get("run_status").and_then(|v| v.as_str()), Some("completed"));
    assert_eq!(ctx.tts.submit_count(), 3);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_mark_failed_units_and_keep_the_rest(ctx: &TestContext) {
    let script = "**罗永浩：**第一句。\n**王自如：**FAIL 这一句会失败。\n**罗永浩：**第三句。\n";
    ctx.fixtures.write_script(DATE, script).await.unwrap();

    ctx.client
        .post(&format!("/api/episodes/{}/audio", DATE), &json!({}))
        .await
        .unwrap()
        .assert_status(StatusCode::ACCEPTED);

    let status = ctx.wait_for_run(DATE).await;
    assert_eq!(status.get("run_status").and_then(|v| v.as_str()), Some("failed"));
    assert!(status.get("last_error").and_then(|v| v.as_str()).is_some());
    assert_eq!(status.get("merged"), Some(&json!(false)));
    assert_eq!(
        segment_statuses(&status),
        vec![
            (0, "completed".to_string()),
            (1, "failed".to_string()),
            (2, "completed".to_string()),
        ]
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_merge_existing_segments(ctx: &TestContext) {
    ctx.fixtures.write_script(DATE, SCRIPT).await.unwrap();
    for (index, bytes) in [(0, "a"), (1, "b"), (2, "c")] {
        ctx.fixtures
            .write_segment(DATE, index, bytes.as_bytes())
            .await
            .unwrap();
    }

    let response = ctx
        .client
        .post(&format!("/api/episodes/{}/merge", DATE), &json!({}))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    let merge = body.get("merge").expect("Missing merge field");
    assert_eq!(merge.get("segments"), Some(&json!(3)));
    assert_eq!(merge.get("skipped"), Some(&json!(false)));
    assert_eq!(merge.get("with_intro"), Some(&json!(false)));

    assert_eq!(ctx.fixtures.read_final_audio(DATE).await.unwrap(), "abc");
    assert_eq!(ctx.tts.submit_count(), 0);

    // Second merge finds the output in place
    let response = ctx
        .client
        .post(&format!("/api/episodes/{}/merge", DATE), &json!({}))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    let merge = response.body.as_ref().unwrap().get("merge").cloned().unwrap();
    assert_eq!(merge.get("skipped"), Some(&json!(true)));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_hold_the_episode_while_merging(ctx: &TestContext) {
    ctx.fixtures.write_script(DATE, SCRIPT).await.unwrap();
    for index in 0..3 {
        ctx.fixtures.write_segment(DATE, index, b"x").await.unwrap();
    }
    ctx.concatenator.hold_merges();

    let client = ctx.client.clone();
    let merge = tokio::spawn(async move {
        client
            .post(&format!("/api/episodes/{}/merge", DATE), &json!({}))
            .await
            .unwrap()
    });

    let mut running = false;
    for _ in 0..200 {
        let status = ctx.client.get(&format!("/api/episodes/{}", DATE)).await.unwrap();
        if status.body.as_ref().and_then(|b| b.get("run_status")).and_then(|v| v.as_str())
            == Some("running")
        {
            running = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert!(running, "Merge never registered as a run");

    ctx.client
        .post(&format!("/api/episodes/{}/audio", DATE), &json!({}))
        .await
        .unwrap()
        .assert_status(StatusCode::CONFLICT)
        .assert_error_message("already running");
    ctx.client
        .post(&format!("/api/episodes/{}/merge", DATE), &json!({}))
        .await
        .unwrap()
        .assert_status(StatusCode::CONFLICT);

    ctx.concatenator.release_merges();
    merge.await.unwrap().assert_status(StatusCode::OK);

    let status = ctx.wait_for_run(DATE).await;
    assert_eq!(status.get("run_status").and_then(|v| v.as_str()), Some("completed"));
    assert_eq!(ctx.concatenator.call_count(), 1);
    assert_eq!(ctx.tts.submit_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refuse_to_merge_with_gaps(ctx: &TestContext) {
    ctx.fixtures.write_script(DATE, SCRIPT).await.unwrap();
    ctx.fixtures.write_segment(DATE, 0, b"a").await.unwrap();
    ctx.fixtures.write_segment(DATE, 2, b"c").await.unwrap();

    let response = ctx
        .client
        .post(&format!("/api/episodes/{}/merge", DATE), &json!({}))
        .await
        .unwrap();

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(ctx.concatenator.call_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_episode_responses(ctx: &TestContext) {
    let response = ctx.client.get(&format!("/api/episodes/{}", DATE)).await.unwrap();
    response.assert_header_exists("x-request-id");

    let response = ctx.client.get("/api/episodes/bad").await.unwrap();
    response.assert_header_exists("x-request-id");
}
