//! Exam-records collaborator client
//!
//! The portal's exam service owns student exam folders; this module only reads
//! them through `GET {origin}/api/exams/student/folders?rollNo=<roll>`. Folders are
//! returned most recent first and that order is kept as-is.

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Path of the folders endpoint on the records service
pub const FOLDERS_PATH: &str = "/api/exams/student/folders";

/// One exam event's worth of results for a student
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamFolder {
    pub exam_name: String,
    #[serde(default)]
    pub subjects: Vec<SubjectResult>,
}

/// Result for one subject within a folder
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub subject_name: String,
    #[serde(default)]
    pub marks_obtained: Option<f64>,
    #[serde(default)]
    pub max_marks: Option<f64>,
    #[serde(default)]
    pub scripts: Vec<ScriptRef>,
}

/// Link to an uploaded answer script
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScriptRef {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct FoldersResponse {
    #[serde(default)]
    folders: Vec<ExamFolder>,
}

impl ExamFolder {
    /// Subject whose name matches case-insensitively
    pub fn subject(&self, name: &str) -> Option<&SubjectResult> {
        let wanted = name.trim();
        self.subjects
            .iter()
            .find(|s| s.subject_name.trim().eq_ignore_ascii_case(wanted))
    }
}

/// Pick the folder a request refers to
///
/// With an exam name, the first folder whose name matches case-insensitively;
/// without one, the first (most recent) folder.
pub fn select_folder<'a>(folders: &'a [ExamFolder], exam_name: Option<&str>) -> Option<&'a ExamFolder> {
    match exam_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(wanted) => folders
            .iter()
            .find(|f| f.exam_name.trim().eq_ignore_ascii_case(wanted)),
        None => folders.first(),
    }
}

/// Read access to exam folders
#[async_trait]
pub trait ExamRecords: Send + Sync {
    /// Folders for `roll_no`, most recent first
    ///
    /// `origin` is the scheme + authority the records service is reached on.
    async fn folders_for(&self, origin: &str, roll_no: &str) -> AppResult<Vec<ExamFolder>>;
}

/// HTTP client for the records service
pub struct HttpExamRecords {
    client: reqwest::Client,
}

impl HttpExamRecords {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build records HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ExamRecords for HttpExamRecords {
    async fn folders_for(&self, origin: &str, roll_no: &str) -> AppResult<Vec<ExamFolder>> {
        let url = format!("{}{}", origin.trim_end_matches('/'), FOLDERS_PATH);

        let response = self
            .client
            .get(&url)
            .query(&[("rollNo", roll_no)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Exam records request failed");
                AppError::Internal("Failed to reach the exam records service".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Exam records request failed")
                        .to_string()
                });
            tracing::warn!(
                url = %url,
                status = status.as_u16(),
                message = %message,
                "Exam records service returned an error"
            );
            return Err(AppError::RecordsUpstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: FoldersResponse = response.json().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Malformed exam records response");
            AppError::Internal("Exam records service returned a malformed response".to_string())
        })?;

        tracing::debug!(folder_count = parsed.folders.len(), "Fetched exam folders");
        Ok(parsed.folders)
    }
}
