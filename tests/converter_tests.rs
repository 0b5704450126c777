// tests/converter_tests.rs
//
// Drives `PandocConverter` with ordinary unix tools standing in for pandoc.
#![cfg(unix)]

use std::{path::PathBuf, sync::Arc, time::Duration};

use examinator::{
    error::ExamError,
    repository::{ExamRepository, FsExamRepository},
    utils::converter::{DocumentConverter, PandocConverter},
};

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("examinator-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn output_is_read_from_stdout() {
    let dir = temp_dir();
    let converter = PandocConverter::new("cat", Vec::new());

    let html = converter
        .to_html("<ol><li>echoed</li></ol>", &dir)
        .await
        .unwrap();
    assert_eq!(html, "<ol><li>echoed</li></ol>");

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn runs_inside_the_exam_directory() {
    let root = temp_dir();
    std::fs::create_dir_all(root.join("pa1/midterm")).unwrap();
    std::fs::write(root.join("pa1/midterm/assignment.md"), "ignored").unwrap();

    // Discards stdin and renders the name of its working directory as the only question.
    let converter = PandocConverter::new(
        "sh",
        vec![
            "-c".to_string(),
            r#"cat > /dev/null; printf '<html><body><ol><li>%s</li></ol></body></html>' "$(basename "$PWD")""#
                .to_string(),
        ],
    );
    let exams = FsExamRepository::new(&root, Arc::new(converter));
    let exam = exams.get("pa1/midterm").await.unwrap();

    assert_eq!(exam.questions().await.unwrap(), ["midterm".to_string()]);

    std::fs::remove_dir_all(root).ok();
}

#[tokio::test]
async fn large_documents_do_not_deadlock() {
    let dir = temp_dir();
    let converter = PandocConverter::new("cat", Vec::new());
    let markdown = "1. question with a long body\n".repeat(50_000);

    let html = converter.to_html(&markdown, &dir).await.unwrap();
    assert_eq!(html.len(), markdown.len());

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn nonzero_exit_is_an_error() {
    let dir = temp_dir();
    let converter = PandocConverter::new(
        "sh",
        vec!["-c".to_string(), "echo 'unknown option' >&2; exit 3".to_string()],
    );

    let err = converter.to_html("1. q", &dir).await.unwrap_err();
    match err {
        ExamError::ConverterFailed { status, stderr, .. } => {
            assert_eq!(status.code(), Some(3));
            assert_eq!(stderr, "unknown option");
        }
        other => panic!("unexpected error: {other}"),
    }

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn missing_program_is_an_error() {
    let dir = temp_dir();
    let converter = PandocConverter::new("examinator-no-such-converter", Vec::new());

    let err = converter.to_html("1. q", &dir).await.unwrap_err();
    assert!(matches!(err, ExamError::ConverterIo { .. }));

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn optional_deadline_stops_a_hung_converter() {
    let dir = temp_dir();
    let converter = PandocConverter::new("sleep", vec!["5".to_string()])
        .with_timeout(Duration::from_millis(200));

    let err = converter.to_html("1. q", &dir).await.unwrap_err();
    assert!(matches!(err, ExamError::ConverterTimeout { .. }));

    std::fs::remove_dir_all(dir).ok();
}
