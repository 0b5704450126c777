// src/utils/converter.rs

use std::{path::Path, process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};

use crate::{config::Config, error::ExamError};

/// Renders markdown into a single self-contained HTML document.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// `working_dir` is where relative resource references resolve.
    async fn to_html(&self, markdown: &str, working_dir: &Path) -> Result<String, ExamError>;
}

/// Runs an external converter (pandoc by default), markdown on stdin, HTML on stdout.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl PandocConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let converter = Self::new(&config.converter_program, config.converter_args.clone());
        match config.converter_timeout {
            Some(limit) => converter.with_timeout(limit),
            None => converter,
        }
    }

    fn io_error(&self, source: std::io::Error) -> ExamError {
        ExamError::ConverterIo {
            program: self.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl DocumentConverter for PandocConverter {
    async fn to_html(&self, markdown: &str, working_dir: &Path) -> Result<String, ExamError> {
        tracing::debug!(
            "Running {} {:?} in {}",
            self.program,
            self.args,
            working_dir.display()
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.io_error(e))?;

        // Feed stdin separately so a large document cannot deadlock against a full stdout pipe.
        if let Some(mut stdin) = child.stdin.take() {
            let input = markdown.as_bytes().to_vec();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&input).await {
                    tracing::debug!("Converter closed stdin early: {}", e);
                }
            });
        }

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ExamError::ConverterTimeout {
                    program: self.program.clone(),
                    after: limit,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| self.io_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!("Converter {} failed ({}): {}", self.program, output.status, stderr);
            return Err(ExamError::ConverterFailed {
                program: self.program.clone(),
                status: output.status,
                stderr,
            });
        }

        String::from_utf8(output.stdout).map_err(|source| ExamError::InvalidOutput { source })
    }
}
