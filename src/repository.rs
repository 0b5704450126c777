// src/repository.rs

use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;

use crate::{
    config::DESCRIPTION_FILE,
    error::ExamError,
    models::exam::{Exam, validate_exam_id},
    utils::converter::DocumentConverter,
};

/// Lookup of exams by identifier. Call sites depend on this trait only,
/// so the directory tree can be replaced by another store.
#[async_trait]
pub trait ExamRepository: Send + Sync {
    async fn get(&self, exam_id: &str) -> Result<Exam, ExamError>;

    /// Every exam that has a description file, in directory scan order.
    async fn all(&self) -> Result<Vec<Exam>, ExamError>;
}

/// Exams stored as directories under a fixed root.
#[derive(Clone)]
pub struct FsExamRepository {
    root: PathBuf,
    converter: Arc<dyn DocumentConverter>,
}

impl FsExamRepository {
    pub fn new(root: impl Into<PathBuf>, converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            root: root.into(),
            converter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Identifiers of all directories containing a description file.
    fn scan_exam_ids(root: &Path) -> Result<Vec<String>, ExamError> {
        let escaped = glob::Pattern::escape(&root.to_string_lossy());
        let pattern = format!("{}/**/{}", escaped, DESCRIPTION_FILE);

        let entries = glob::glob(&pattern).map_err(|e| {
            ExamError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
            )
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                ExamError::io(path, std::io::Error::from(e))
            })?;

            let Some(exam_id) = exam_id_for(root, &path) else {
                tracing::warn!("Skipping description outside an exam directory: {}", path.display());
                continue;
            };
            ids.push(exam_id);
        }

        Ok(ids)
    }
}

/// `<root>/a/b/description` becomes `"a/b"`.
fn exam_id_for(root: &Path, description: &Path) -> Option<String> {
    let dir = description.parent()?.strip_prefix(root).ok()?;
    let segments: Vec<&str> = dir
        .components()
        .map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect::<Option<_>>()?;

    let exam_id = segments.join("/");
    validate_exam_id(&exam_id).ok()?;
    Some(exam_id)
}

#[async_trait]
impl ExamRepository for FsExamRepository {
    async fn get(&self, exam_id: &str) -> Result<Exam, ExamError> {
        Exam::load(&self.root, exam_id, Arc::clone(&self.converter)).await
    }

    async fn all(&self) -> Result<Vec<Exam>, ExamError> {
        let root = self.root.clone();
        let ids = tokio::task::spawn_blocking(move || Self::scan_exam_ids(&root))
            .await
            .map_err(|e| {
                ExamError::io(&self.root, std::io::Error::other(e.to_string()))
            })??;

        let mut exams = Vec::with_capacity(ids.len());
        for exam_id in ids {
            exams.push(self.get(&exam_id).await?);
        }

        tracing::debug!("Found {} exams under {}", exams.len(), self.root.display());
        Ok(exams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_id_for() {
        let root = Path::new("exams");
        assert_eq!(
            exam_id_for(root, Path::new("exams/pa1/midterm/description")),
            Some("pa1/midterm".to_string())
        );
        assert_eq!(
            exam_id_for(root, Path::new("exams/pa1/2024/final/description")),
            Some("pa1/2024/final".to_string())
        );
        assert_eq!(exam_id_for(root, Path::new("exams/description")), None);
        assert_eq!(exam_id_for(root, Path::new("other/x/description")), None);
    }
}
