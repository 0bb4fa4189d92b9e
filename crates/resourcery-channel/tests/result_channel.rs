use std::time::Duration;

use resourcery_channel::{
    ChannelError, ResultChannel, StepInvocation, StepKind, StepTask, new_step_id,
};
use resourcery_core::{FieldSpec, FieldType, ProcessResult, StepResult};

fn channel(dir: &tempfile::TempDir) -> ResultChannel {
    ResultChannel::new(dir.path().join("storage/app"))
        .with_poll_interval(Duration::from_millis(20))
}

#[test]
fn second_take_returns_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let channel = channel(&dir);
    let step_id = new_step_id();

    channel
        .publish_step(&step_id, &StepResult::success("ok").with("modelPath", "x"))
        .expect("publish");

    let first = channel.take_step(&step_id).expect("take").expect("payload");
    assert!(first.success);
    assert_eq!(first.str_field("modelPath"), Some("x"));

    assert!(channel.take_step(&step_id).expect("second take").is_none());
    assert!(!channel.step_path(&step_id).exists());
}

#[test]
fn publish_is_write_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let channel = channel(&dir);

    channel
        .publish_process("p1", &ProcessResult::error("boom"))
        .expect("first publish");
    let err = channel
        .publish_process("p1", &ProcessResult::error("again"))
        .expect_err("second publish must fail");
    assert!(matches!(err, ChannelError::AlreadyPublished(_)));

    let stored = channel.take_process("p1").expect("take").expect("payload");
    assert_eq!(stored.message, "boom");
}

#[tokio::test]
async fn wait_sees_late_publish() {
    let dir = tempfile::tempdir().expect("tempdir");
    let channel = channel(&dir);
    let producer = channel.clone();

    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        producer
            .publish_step("late", &StepResult::success("done"))
            .expect("publish");
    });

    let result = channel
        .wait_step("late", Duration::from_secs(2))
        .await
        .expect("wait")
        .expect("payload before deadline");
    assert_eq!(result.message, "done");
    handle.await.expect("producer task");
}

#[tokio::test]
async fn await_step_times_out_and_cancels() {
    let dir = tempfile::tempdir().expect("tempdir");
    let channel = channel(&dir);

    let stalled = tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    let abort = stalled.abort_handle();

    let result = channel
        .await_step(StepTask::local(stalled), "never", Duration::from_millis(100))
        .await;

    assert!(!result.success);
    assert!(result.message.contains("timed out"), "{}", result.message);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(abort.is_finished(), "stalled step should be cancelled");
}

#[tokio::test]
async fn await_step_reports_silent_exit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let channel = channel(&dir);

    let quiet = tokio::spawn(async {});
    let result = channel
        .await_step(StepTask::local(quiet), "quiet", Duration::from_secs(5))
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "Step exited without reporting a result");
}

#[test]
fn invocation_args_follow_step_signatures() {
    let fields = vec![FieldSpec::new("title", FieldType::String)];

    let model = StepInvocation::new(StepKind::Model, "s1", "Post")
        .with_fields(fields.clone())
        .with_soft_deletes(true);
    assert_eq!(
        model.to_args().expect("args"),
        vec![
            "generate-model",
            "Post",
            r#"[{"name":"title","type":"string","nullable":false,"unique":false}]"#,
            "s1",
            "--soft-deletes",
        ]
    );

    let resource = StepInvocation::new(StepKind::Resource, "s2", "Post")
        .with_fields(fields)
        .with_view_page(true);
    let args = resource.to_args().expect("args");
    assert_eq!(&args[..4], &["generate-resource", "Post", "s2", "--view"]);
    assert_eq!(args[4], "--fields");

    let apply = StepInvocation::new(StepKind::ApplyMigration, "s3", "");
    assert_eq!(apply.to_args().expect("args"), vec!["apply-migration", "s3"]);
}
