// src/models/exam.rs

use std::{
    fmt,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::{fs, sync::OnceCell};

use crate::{
    config::{ASSIGNMENT_FILE, DESCRIPTION_FILE, FINISHED_FILE, START_TIME_FORMAT},
    error::ExamError,
    utils::{converter::DocumentConverter, html::extract_question_fragments},
};

/// An exam backed by the directory `<root>/<id>`.
///
/// Start time and roster are read once on load. The finished flag and the
/// answers always go to disk; questions are rendered on first use and kept
/// for the lifetime of the instance.
pub struct Exam {
    /// Path-like identifier, e.g. `"pa1/midterm"`.
    pub id: String,

    /// First segment of the identifier.
    pub subject: String,

    /// `None` when the exam has no description file.
    pub begin: Option<NaiveDateTime>,

    /// Student logins in description order.
    pub students: Vec<String>,

    dir: PathBuf,
    converter: Arc<dyn DocumentConverter>,
    questions: OnceCell<Vec<String>>,
}

/// Serializable view of an exam for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ExamSummary {
    pub id: String,
    pub subject: String,
    pub begin: Option<NaiveDateTime>,
    pub students: Vec<String>,
    pub finished: bool,
}

/// Parsed content of a description file.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub begin: NaiveDateTime,
    pub students: Vec<String>,
}

impl Exam {
    /// Loads an exam from `<root>/<exam_id>`.
    ///
    /// A missing description file yields no start time and an empty roster.
    /// Any other read failure or a malformed start time is returned.
    pub async fn load(
        root: &Path,
        exam_id: &str,
        converter: Arc<dyn DocumentConverter>,
    ) -> Result<Self, ExamError> {
        validate_exam_id(exam_id)?;

        let dir = root.join(exam_id);
        let subject = exam_id.split('/').next().unwrap_or_default().to_string();

        let description_path = dir.join(DESCRIPTION_FILE);
        let (begin, students) = match fs::read_to_string(&description_path).await {
            Ok(content) => {
                let description = parse_description(&content, &description_path)?;
                (Some(description.begin), description.students)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => (None, Vec::new()),
            Err(e) => return Err(ExamError::io(description_path, e)),
        };

        tracing::debug!(
            "Loaded exam {} ({} students, begin: {:?})",
            exam_id,
            students.len(),
            begin
        );

        Ok(Self {
            id: exam_id.to_string(),
            subject,
            begin,
            students,
            dir,
            converter,
            questions: OnceCell::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the exam directory itself is present.
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    pub fn has_student(&self, student: &str) -> bool {
        self.students.iter().any(|s| s == student)
    }

    pub async fn is_finished(&self) -> bool {
        fs::try_exists(self.dir.join(FINISHED_FILE))
            .await
            .unwrap_or(false)
    }

    /// Writes the empty sentinel file. Calling it again leaves the same state.
    pub async fn finish(&self) -> Result<(), ExamError> {
        let path = self.dir.join(FINISHED_FILE);
        fs::write(&path, b"")
            .await
            .map_err(|e| ExamError::io(&path, e))?;
        tracing::info!("Exam {} marked as finished", self.id);
        Ok(())
    }

    /// Stores `answer` as `<dir>/<student>/<question_num>`, replacing any previous content.
    pub async fn save_answer(
        &self,
        student: &str,
        question_num: u32,
        answer: &str,
    ) -> Result<(), ExamError> {
        validate_segment(student)?;

        let student_dir = self.dir.join(student);
        match fs::create_dir(&student_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(ExamError::io(&student_dir, e)),
        }

        let path = student_dir.join(question_num.to_string());
        fs::write(&path, answer)
            .await
            .map_err(|e| ExamError::io(&path, e))?;

        tracing::info!(
            "Saved answer {} of {} in exam {} ({} bytes)",
            question_num,
            student,
            self.id,
            answer.len()
        );
        Ok(())
    }

    /// Question fragments in assignment order; position + 1 is the question number.
    ///
    /// The first successful call renders `assignment.md` through the converter;
    /// later calls return the cached list. Failures are not cached.
    pub async fn questions(&self) -> Result<&[String], ExamError> {
        let questions = self
            .questions
            .get_or_try_init(|| self.render_questions())
            .await?;
        Ok(questions.as_slice())
    }

    async fn render_questions(&self) -> Result<Vec<String>, ExamError> {
        let path = self.dir.join(ASSIGNMENT_FILE);
        let markdown = fs::read_to_string(&path)
            .await
            .map_err(|e| ExamError::io(&path, e))?;

        let html = self.converter.to_html(&markdown, &self.dir).await?;
        let questions = extract_question_fragments(&html);

        tracing::debug!("Rendered {} questions for exam {}", questions.len(), self.id);
        Ok(questions)
    }

    /// One answer per question, empty where the student has not answered.
    pub async fn answers(&self, student: &str) -> Result<Vec<String>, ExamError> {
        validate_segment(student)?;

        let count = self.questions().await?.len();
        let student_dir = self.dir.join(student);

        let mut answers = Vec::with_capacity(count);
        for question_num in 1..=count {
            let path = student_dir.join(question_num.to_string());
            let answer = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
                Err(e) => return Err(ExamError::io(&path, e)),
            };
            answers.push(answer);
        }

        Ok(answers)
    }

    pub async fn summary(&self) -> ExamSummary {
        ExamSummary {
            id: self.id.clone(),
            subject: self.subject.clone(),
            begin: self.begin,
            students: self.students.clone(),
            finished: self.is_finished().await,
        }
    }
}

impl fmt::Debug for Exam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exam")
            .field("id", &self.id)
            .field("subject", &self.subject)
            .field("begin", &self.begin)
            .field("students", &self.students)
            .field("dir", &self.dir)
            .field("questions", &self.questions.get().map(Vec::len))
            .finish_non_exhaustive()
    }
}

/// Parses `DD. MM. YYYY HH:MM` on the first line and one student per following line.
/// Each line is trimmed; the roster keeps every remaining line, blank ones included.
pub fn parse_description(content: &str, path: &Path) -> Result<Description, ExamError> {
    let mut lines = content.lines().map(str::trim);

    let first = lines.next().ok_or_else(|| ExamError::EmptyDescription {
        path: path.to_path_buf(),
    })?;

    let begin = NaiveDateTime::parse_from_str(first, START_TIME_FORMAT).map_err(|source| {
        ExamError::InvalidStartTime {
            line: first.to_string(),
            source,
        }
    })?;

    let students = lines.map(str::to_string).collect();

    Ok(Description { begin, students })
}

/// Accepts relative identifiers made only of plain path segments.
pub fn validate_exam_id(exam_id: &str) -> Result<(), ExamError> {
    let path = Path::new(exam_id);
    let plain = path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));

    if exam_id.is_empty() || exam_id.contains('\\') || !plain {
        return Err(ExamError::InvalidId(exam_id.to_string()));
    }
    Ok(())
}

/// Accepts a single plain path segment (student logins).
pub fn validate_segment(segment: &str) -> Result<(), ExamError> {
    let mut components = Path::new(segment).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    if !single || segment.contains('/') || segment.contains('\\') {
        return Err(ExamError::InvalidId(segment.to_string()));
    }
    Ok(())
}
