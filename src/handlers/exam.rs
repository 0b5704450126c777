// src/handlers/exam.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{error::AppError, models::exam::Exam, repository::ExamRepository};

/// Loads `<subject>/<exam>` and rejects identifiers without a directory.
async fn load_exam(
    exams: &dyn ExamRepository,
    subject: &str,
    exam: &str,
) -> Result<Exam, AppError> {
    let exam_id = format!("{}/{}", subject, exam);
    let exam = exams.get(&exam_id).await?;

    if !exam.exists().await {
        return Err(AppError::NotFound(format!("Exam {} not found", exam_id)));
    }
    Ok(exam)
}

fn ensure_enrolled(exam: &Exam, student: &str) -> Result<(), AppError> {
    if !exam.has_student(student) {
        return Err(AppError::NotFound(format!(
            "Student {} is not enrolled in {}",
            student, exam.id
        )));
    }
    Ok(())
}

/// Lists every exam found under the exam root.
pub async fn list_exams(
    State(exams): State<Arc<dyn ExamRepository>>,
) -> Result<impl IntoResponse, AppError> {
    let mut summaries = Vec::new();
    for exam in exams.all().await? {
        summaries.push(exam.summary().await);
    }

    Ok(Json(summaries))
}

pub async fn get_exam(
    State(exams): State<Arc<dyn ExamRepository>>,
    Path((subject, exam)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let exam = load_exam(exams.as_ref(), &subject, &exam).await?;
    Ok(Json(exam.summary().await))
}

/// Returns the rendered question fragments; the n-th entry is question n + 1.
pub async fn get_questions(
    State(exams): State<Arc<dyn ExamRepository>>,
    Path((subject, exam)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let exam = load_exam(exams.as_ref(), &subject, &exam).await?;
    let questions = exam.questions().await.map_err(|e| {
        tracing::error!("Failed to render questions of {}: {}", exam.id, e);
        AppError::from(e)
    })?;

    Ok(Json(serde_json::json!({
        "exam": exam.id,
        "questions": questions,
    })))
}

/// Marks the exam as finished. Repeated calls succeed.
pub async fn finish_exam(
    State(exams): State<Arc<dyn ExamRepository>>,
    Path((subject, exam)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let exam = load_exam(exams.as_ref(), &subject, &exam).await?;
    exam.finish().await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_answers(
    State(exams): State<Arc<dyn ExamRepository>>,
    Path((subject, exam, student)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let exam = load_exam(exams.as_ref(), &subject, &exam).await?;
    ensure_enrolled(&exam, &student)?;

    let answers = exam.answers(&student).await?;

    Ok(Json(serde_json::json!({
        "exam": exam.id,
        "student": student,
        "answers": answers,
    })))
}

/// Stores the raw request body as the answer to one question.
///
/// * Finished exams reject new answers (409).
/// * Only students on the roster may answer (404).
/// * Question numbers start at 1 (400 for 0).
pub async fn save_answer(
    State(exams): State<Arc<dyn ExamRepository>>,
    Path((subject, exam, student, question)): Path<(String, String, String, u32)>,
    answer: String,
) -> Result<impl IntoResponse, AppError> {
    if question == 0 {
        return Err(AppError::BadRequest(
            "Question numbers start at 1".to_string(),
        ));
    }

    let exam = load_exam(exams.as_ref(), &subject, &exam).await?;
    ensure_enrolled(&exam, &student)?;

    if exam.is_finished().await {
        return Err(AppError::Conflict(format!("Exam {} is finished", exam.id)));
    }

    exam.save_answer(&student, question, &answer).await?;

    Ok(StatusCode::NO_CONTENT)
}
