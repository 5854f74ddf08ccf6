//! Exam-summary endpoint handler
//!
//! Handles POST /exam-summary: resolves which student/subject/exam the request is
//! about, reads the matching folder from the records service and asks the
//! generation gateway for a short performance summary.

use crate::error::{AppError, AppResult};
use crate::extract::ExtractedQuery;
use crate::handlers::AppState;
use crate::handlers::extractor::ApiJson;
use crate::metrics::Endpoint;
use crate::middleware::RequestId;
use crate::prompt::{self, ExamSummaryContext};
use crate::records::select_folder;
use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, header::HOST},
};
use serde::{Deserialize, Serialize};

/// Message returned when roll number or subject cannot be resolved
pub const FIELDS_REQUIRED: &str =
    "rollNo and subjectName are required. Provide them directly or mention them in your message.";

/// Exam-summary request from client
///
/// Explicit fields take precedence; anything missing is looked for in `message`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummaryRequest {
    #[serde(default)]
    pub roll_no: Option<String>,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub exam_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request after explicit fields and message extraction were merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub roll_no: String,
    pub subject_name: String,
    pub exam_name: Option<String>,
}

impl ExamSummaryRequest {
    /// Merge explicit fields with what can be extracted from `message`
    ///
    /// # Errors
    ///
    /// `AppError::Validation` when roll number or subject is still missing.
    pub fn resolve(&self) -> AppResult<ResolvedQuery> {
        let extracted = self
            .message
            .as_deref()
            .map(ExtractedQuery::from_text)
            .unwrap_or_default();

        let roll_no = non_blank(&self.roll_no).or(extracted.roll_no);
        let subject_name = non_blank(&self.subject_name).or(extracted.subject_name);
        let exam_name = non_blank(&self.exam_name).or(extracted.exam_name);

        match (roll_no, subject_name) {
            (Some(roll_no), Some(subject_name)) => Ok(ResolvedQuery {
                roll_no,
                subject_name,
                exam_name,
            }),
            _ => Err(AppError::Validation(FIELDS_REQUIRED.to_string())),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Summary metadata returned next to the generated text
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummaryMeta {
    pub roll_no: String,
    pub exam_name: String,
    pub subject_name: String,
    pub marks_obtained: Option<f64>,
    pub max_marks: Option<f64>,
    pub script_count: usize,
    pub model: String,
}

/// Exam-summary response to client
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExamSummaryResponse {
    pub response: String,
    pub meta: ExamSummaryMeta,
}

/// Origin the records service is reached on
///
/// The configured `records.base_url` wins. Otherwise the service is assumed to be
/// co-hosted with the portal and the request's own `Host` is used. Forwarded host
/// headers are client-controlled and are not consulted; deployments behind a
/// proxy that rewrites `Host` must set `records.base_url`.
pub fn records_origin(state: &AppState, headers: &HeaderMap) -> AppResult<String> {
    if let Some(base_url) = &state.config().records.base_url {
        return Ok(base_url.trim_end_matches('/').to_string());
    }

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            AppError::Internal("Cannot determine exam records origin for this request".to_string())
        })?;

    // Only the scheme is taken from the proxy header, and only a known one
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_ascii_lowercase())
        .filter(|v| v == "http" || v == "https")
        .unwrap_or_else(|| "http".to_string());

    Ok(format!("{}://{}", scheme, host))
}

/// POST /exam-summary handler
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<ExamSummaryRequest>,
) -> Result<Json<ExamSummaryResponse>, AppError> {
    if let Err(e) = state.metrics().record_request(Endpoint::ExamSummary) {
        tracing::error!(request_id = %request_id, error = %e, "Metrics recording failed (non-fatal)");
    }

    let query = request.resolve()?;
    tracing::debug!(
        request_id = %request_id,
        roll_no = %query.roll_no,
        subject_name = %query.subject_name,
        exam_name = ?query.exam_name,
        "Resolved exam-summary query"
    );

    let origin = records_origin(&state, &headers)?;
    let folders = state.records().folders_for(&origin, &query.roll_no).await?;

    if folders.is_empty() {
        return Err(AppError::NotFound(format!(
            "No exam folders found for roll number {}",
            query.roll_no
        )));
    }

    let folder = select_folder(&folders, query.exam_name.as_deref()).ok_or_else(|| {
        AppError::NotFound(format!(
            "Exam '{}' not found for roll number {}",
            query.exam_name.as_deref().unwrap_or_default(),
            query.roll_no
        ))
    })?;

    let subject = folder.subject(&query.subject_name).ok_or_else(|| {
        AppError::NotFound(format!(
            "Subject '{}' not found in exam '{}'",
            query.subject_name, folder.exam_name
        ))
    })?;

    let prompt = prompt::exam_summary_prompt(&ExamSummaryContext {
        roll_no: &query.roll_no,
        folder,
        subject,
        note: request.message.as_deref(),
    });
    let result = state.gateway().generate(&prompt, request_id).await?;

    tracing::info!(
        request_id = %request_id,
        source = result.source.as_str(),
        model = %result.model,
        exam_name = %folder.exam_name,
        "Exam summary completed"
    );

    Ok(Json(ExamSummaryResponse {
        response: result.text,
        meta: ExamSummaryMeta {
            roll_no: query.roll_no,
            exam_name: folder.exam_name.clone(),
            subject_name: subject.subject_name.clone(),
            marks_obtained: subject.marks_obtained,
            max_marks: subject.max_marks,
            script_count: subject.scripts.len(),
            model: result.model,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ExamSummaryRequest {
        serde_json::from_str(json).expect("should deserialize")
    }

    #[test]
    fn test_resolve_from_message() {
        let resolved = request(r#"{"message": "review my paper roll 21CMR001 subject DSA"}"#)
            .resolve()
            .unwrap();
        assert_eq!(resolved.roll_no, "21CMR001");
        assert_eq!(resolved.subject_name, "DSA");
        assert_eq!(resolved.exam_name, None);
    }

    #[test]
    fn test_explicit_fields_win_over_message() {
        let resolved = request(
            r#"{"rollNo": "22ABC123", "subjectName": "OS", "message": "roll 21CMR001 subject DSA mid 2"}"#,
        )
        .resolve()
        .unwrap();
        assert_eq!(resolved.roll_no, "22ABC123");
        assert_eq!(resolved.subject_name, "OS");
        assert_eq!(resolved.exam_name.as_deref(), Some("Mid-2"));
    }

    #[test]
    fn test_blank_explicit_fields_fall_back_to_message() {
        let resolved = request(r#"{"rollNo": "  ", "subjectName": "", "message": "21CMR001 dbms"}"#)
            .resolve()
            .unwrap();
        assert_eq!(resolved.roll_no, "21CMR001");
        assert_eq!(resolved.subject_name, "DBMS");
    }

    #[test]
    fn test_unresolved_fields_are_validation_errors() {
        for json in [
            r#"{}"#,
            r#"{"rollNo": "21CMR001"}"#,
            r#"{"message": "how did I do?"}"#,
        ] {
            let err = request(json).resolve().unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "input {}", json);
        }
    }

    fn state(records_base_url: Option<&str>) -> AppState {
        let mut toml = String::from("[server]\nhost = \"127.0.0.1\"\nport = 3000\n");
        if let Some(url) = records_base_url {
            toml.push_str(&format!("\n[records]\nbase_url = \"{}\"\n", url));
        }
        let config: crate::config::Config = toml::from_str(&toml).expect("should parse config");
        AppState::new(std::sync::Arc::new(config)).expect("should create AppState")
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, value.parse().unwrap());
        }
        map
    }

    #[test]
    fn test_records_origin_prefers_configured_base_url() {
        let origin = records_origin(
            &state(Some("http://records.internal:5000/")),
            &headers(&[("host", "portal.example")]),
        )
        .unwrap();
        assert_eq!(origin, "http://records.internal:5000");
    }

    #[test]
    fn test_records_origin_ignores_forwarded_host() {
        let origin = records_origin(
            &state(None),
            &headers(&[
                ("host", "portal.example:8080"),
                ("x-forwarded-host", "attacker.example"),
            ]),
        )
        .unwrap();
        assert_eq!(origin, "http://portal.example:8080");
    }

    #[test]
    fn test_records_origin_accepts_only_known_forwarded_schemes() {
        let https = records_origin(
            &state(None),
            &headers(&[("host", "portal.example"), ("x-forwarded-proto", "HTTPS, http")]),
        )
        .unwrap();
        assert_eq!(https, "https://portal.example");

        let other = records_origin(
            &state(None),
            &headers(&[("host", "portal.example"), ("x-forwarded-proto", "gopher")]),
        )
        .unwrap();
        assert_eq!(other, "http://portal.example");
    }

    #[test]
    fn test_records_origin_without_host_is_internal_error() {
        let err = records_origin(&state(None), &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = ExamSummaryMeta {
            roll_no: "21CMR001".to_string(),
            exam_name: "Mid-1".to_string(),
            subject_name: "DSA".to_string(),
            marks_obtained: Some(21.0),
            max_marks: Some(30.0),
            script_count: 2,
            model: "gemini-1.5-flash".to_string(),
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["rollNo"], "21CMR001");
        assert_eq!(value["marksObtained"], 21.0);
        assert_eq!(value["scriptCount"], 2);
    }
}
