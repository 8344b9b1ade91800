use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    dto::candidate_dto::{
        CpfCheckQuery, CpfCheckResponse, CreateNotePayload, IntakeForm, IntakeResponse,
        UpdateCandidatePayload,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::candidate::{ResumeFile, ResumeUpload},
    services::candidate_service::IntakeRequest,
    utils::{masking, resume},
    AppState,
};

/// First hop of `X-Forwarded-For`, else `X-Real-IP`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    forwarded.or(real).map(String::from)
}

#[axum::debug_handler]
pub async fn check_cpf(
    State(state): State<AppState>,
    Query(query): Query<CpfCheckQuery>,
) -> Result<impl IntoResponse> {
    let raw = query
        .cpf
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("cpf is required".into()))?;

    let response = match state.candidate_service.find_by_cpf(&raw).await? {
        Some(candidate) => CpfCheckResponse {
            exists: true,
            masked_email: Some(masking::mask_email(&candidate.email)),
            masked_phone: Some(masking::mask_phone(&candidate.phone)),
            cep: candidate.cep,
        },
        None => CpfCheckResponse {
            exists: false,
            masked_email: None,
            masked_phone: None,
            cep: None,
        },
    };
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let max_bytes = crate::config::get_config().max_resume_bytes;
    let mut form = IntakeForm::default();
    let mut upload: Option<ResumeUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        Error::BadRequest(e.to_string())
    })? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name == "resume_file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await.map_err(|e| {
                tracing::warn!("Failed to read resume bytes: {}", e);
                Error::BadRequest("Failed to read file upload".into())
            })?;
            if !data.is_empty() {
                upload = Some(resume::validate_upload(&file_name, data, max_bytes)?);
            }
        } else {
            let value = field.text().await?;
            form.set_field(&field_name, value);
        }
    }

    let outcome = state
        .candidate_service
        .intake(IntakeRequest {
            form,
            resume: upload,
            client_ip: client_ip(&headers),
        })
        .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(IntakeResponse {
            candidate: outcome.candidate,
            application: outcome.application,
            created: outcome.created,
        }),
    ))
}

#[axum::debug_handler]
pub async fn list_candidates(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let candidates = state.candidate_service.list_candidates().await?;
    Ok(Json(candidates))
}

#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let candidate = state.candidate_service.get_with_applications(id).await?;
    Ok(Json(candidate))
}

#[axum::debug_handler]
pub async fn update_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCandidatePayload>,
) -> Result<impl IntoResponse> {
    let candidate = state.candidate_service.update_candidate(id, payload).await?;
    Ok(Json(candidate))
}

fn resume_response(file: ResumeFile, disposition: &str, headers: &HeaderMap) -> Result<Response> {
    let content_type = file
        .resume_content_type
        .clone()
        .unwrap_or_else(|| "application/pdf".to_string());
    let etag = format!("\"{}\"", hex::encode(Sha256::digest(&file.resume_data)));

    let cached = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == etag)
        .unwrap_or(false);
    let etag_value = HeaderValue::from_str(&etag)
        .map_err(|e| Error::Internal(format!("Invalid ETag header: {}", e)))?;
    if cached {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
    }

    let file_name = resume::download_name(&file.full_name, &content_type);
    let disposition = HeaderValue::from_str(&format!("{}; filename=\"{}\"", disposition, file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let content_type = HeaderValue::from_str(&content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::ETAG, etag_value),
            (header::CACHE_CONTROL, HeaderValue::from_static("private, no-cache")),
        ],
        file.resume_data,
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn download_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response> {
    let file = state.candidate_service.get_resume(id).await?;
    resume_response(file, "attachment", &headers)
}

#[axum::debug_handler]
pub async fn view_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response> {
    let file = state.candidate_service.get_resume(id).await?;
    resume_response(file, "inline", &headers)
}

#[axum::debug_handler]
pub async fn list_notes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let notes = state.candidate_service.list_notes(id).await?;
    Ok(Json(notes))
}

#[axum::debug_handler]
pub async fn create_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateNotePayload>,
) -> Result<impl IntoResponse> {
    let note = state
        .candidate_service
        .add_note(id, payload, claims.actor())
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), None);

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.9"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn resume_etag_allows_conditional_requests() {
        let file = || ResumeFile {
            full_name: "Maria Silva".into(),
            resume_data: b"%PDF-1.4 test".to_vec(),
            resume_content_type: Some("application/pdf".into()),
        };

        let resp = resume_response(file(), "inline", &HeaderMap::new()).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "inline; filename=\"Curriculo_Maria_Silva.pdf\""
        );
        let etag = resp.headers()[header::ETAG].clone();

        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, etag);
        let resp = resume_response(file(), "attachment", &headers).unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    }
}
