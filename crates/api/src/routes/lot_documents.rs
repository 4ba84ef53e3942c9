//! Lot documents routes.
//!
//! `/lots/{lot_id}/documents` lists and uploads documents,
//! `/lots/{lot_id}/documents/{document_id}` reads, downloads, replaces and
//! patches a single document.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{AppState, error::ApiError, middleware::CurrentPrincipal};
use oplots_core::document::{DocumentError, FileUpload, LotDocumentService, UploadForm};
use oplots_db::LotRepository;
use oplots_shared::AppError;
use oplots_shared::types::{DocumentId, LotId};

/// Name of the multipart part carrying the binary.
const FILE_FIELD: &str = "file";

/// Query parameters of the collection listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Any non-empty value returns every version.
    pub all: Option<String>,
}

/// Query parameters of the single document read.
#[derive(Debug, Default, Deserialize)]
pub struct ReadQuery {
    /// Version key of the binary to download.
    pub download: Option<String>,
}

/// Creates lot documents routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/lots/{lot_id}/documents",
            get(collection_get).post(collection_post),
        )
        .route(
            "/lots/{lot_id}/documents/{document_id}",
            get(get_document).put(put_document).patch(patch_document),
        )
}

fn service(state: &AppState) -> LotDocumentService<LotRepository> {
    LotDocumentService::new(
        state.storage.clone(),
        Arc::new(LotRepository::new((*state.db).clone())),
        state.urls.clone(),
    )
}

fn flag(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// GET `/lots/{lot_id}/documents`
async fn collection_get(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(lot_id): Path<LotId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let all = flag(query.all.as_deref()).is_some();
    let documents = service(&state).list(&principal, lot_id, all).await?;
    Ok(Json(json!({ "data": documents })))
}

/// POST `/lots/{lot_id}/documents`
async fn collection_post(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(lot_id): Path<LotId>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_upload_form(multipart).await?;
    let created = service(&state).upload(&principal, lot_id, form).await?;

    info!(
        message_id = "lot_document_create",
        lot_id = %lot_id,
        document_id = %created.document.id,
        role = created.role.as_str(),
        "Created lot document"
    );

    let location = HeaderValue::from_str(&created.location)
        .map_err(|e| ApiError(AppError::Internal(e.to_string())))?;
    let mut response = (
        StatusCode::CREATED,
        Json(json!({ "data": created.document })),
    )
        .into_response();
    response.headers_mut().insert(header::LOCATION, location);
    Ok(response)
}

/// GET `/lots/{lot_id}/documents/{document_id}`
///
/// With `?download=<key>` the stored binary of that version is streamed
/// back instead of the JSON view.
async fn get_document(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((lot_id, document_id)): Path<(LotId, DocumentId)>,
    Query(query): Query<ReadQuery>,
) -> Result<Response, ApiError> {
    let service = service(&state);

    if let Some(key) = flag(query.download.as_deref()) {
        let download = service
            .download(&principal, lot_id, document_id, key)
            .await?;
        let content_type = HeaderValue::from_str(&download.content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream"));
        let disposition =
            HeaderValue::from_str(&format!("attachment; filename=\"{}\"", download.filename))
                .unwrap_or(HeaderValue::from_static("attachment"));

        return Ok((
            [
                (header::CONTENT_TYPE, content_type),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            download.data,
        )
            .into_response());
    }

    let document = service.get(&principal, lot_id, document_id).await?;
    Ok(Json(json!({ "data": document })).into_response())
}

/// PUT `/lots/{lot_id}/documents/{document_id}`
async fn put_document(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((lot_id, document_id)): Path<(LotId, DocumentId)>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = read_upload_form(multipart).await?;
    let change = service(&state)
        .replace(&principal, lot_id, document_id, form)
        .await?;

    info!(
        message_id = "lot_document_put",
        lot_id = %lot_id,
        document_id = %document_id,
        role = change.role.as_str(),
        "Updated lot document"
    );

    Ok(Json(json!({ "data": change.document })))
}

/// PATCH `/lots/{lot_id}/documents/{document_id}`
async fn patch_document(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((lot_id, document_id)): Path<(LotId, DocumentId)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let data = body
        .get("data")
        .ok_or_else(|| ApiError::from(DocumentError::validation("Data not available")))?;

    let change = service(&state)
        .patch(&principal, lot_id, document_id, data)
        .await?;

    if change.saved {
        info!(
            message_id = "lot_document_patch",
            lot_id = %lot_id,
            document_id = %document_id,
            role = change.role.as_str(),
            "Updated lot document"
        );
    }

    Ok(Json(json!({ "data": change.document })))
}

/// Collect the file part and the text fields of an upload.
///
/// Text fields are passed on unparsed; the service validates them once the
/// caller is known to be allowed to upload.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILE_FIELD {
            if form.file.is_some() {
                return Err(DocumentError::validation("file: Only one file can be uploaded").into());
            }
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            form.file = Some(FileUpload {
                filename,
                content_type,
                data,
            });
        } else {
            let value = field.text().await?;
            form.fields.push((name, value));
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use oplots_core::document::ResourceUrls;
    use oplots_core::storage::{StorageConfig, StorageProvider, StorageService};
    use oplots_shared::{JwtConfig, JwtService, UserRole, types::UserId};
    use rstest::rstest;
    use chrono::Utc;
    use oplots_db::entities::{lot_documents, lots};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use tower::ServiceExt;

    fn state() -> AppState {
        state_with(DatabaseConnection::Disconnected)
    }

    fn state_with(db: DatabaseConnection) -> AppState {
        AppState {
            db: Arc::new(db),
            jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
            storage: Arc::new(
                StorageService::from_config(StorageConfig::new(StorageProvider::Memory)).unwrap(),
            ),
            urls: ResourceUrls::new("http://localhost:8080/api/v1"),
        }
    }

    fn lot_row(lot_id: LotId, owner_id: UserId) -> lots::Model {
        let now = Utc::now().fixed_offset();
        lots::Model {
            id: lot_id.into_inner(),
            lot_type: "loki".to_string(),
            status: "draft".to_string(),
            owner_id: owner_id.into_inner(),
            rectification_start_date: None,
            rectification_end_date: None,
            rev: 1,
            date_modified: now,
            created_at: now,
        }
    }

    fn document_row(
        lot_id: LotId,
        document_id: DocumentId,
        position: i32,
        key: &str,
    ) -> lot_documents::Model {
        let now = Utc::now().fixed_offset();
        lot_documents::Model {
            lot_id: lot_id.into_inner(),
            position,
            document_id: document_id.into_inner(),
            version_key: key.to_string(),
            url: format!(
                "http://localhost:8080/api/v1/lots/{lot_id}/documents/{document_id}?download={key}"
            ),
            title: "Notice v1.pdf".to_string(),
            description: None,
            format: "application/pdf".to_string(),
            document_type: Some("notice".to_string()),
            document_of: "lot".to_string(),
            related_item: None,
            language: None,
            author: Some("lot_owner".to_string()),
            hash: "sha256:00".to_string(),
            storage_key: format!("{lot_id}/{document_id}/{key}"),
            date_published: now,
            date_modified: now,
        }
    }

    /// Connection answering one lot load with the given document rows.
    fn loaded_lot(
        lot_id: LotId,
        owner_id: UserId,
        documents: Vec<lot_documents::Model>,
    ) -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![lot_row(lot_id, owner_id)]])
            .append_query_results([documents])
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_flag_ignores_empty_values() {
        assert_eq!(flag(None), None);
        assert_eq!(flag(Some("")), None);
        assert_eq!(flag(Some("1")), Some("1"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_router(state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["storage"], "memory");
    }

    #[rstest]
    #[case("Bearer not-a-jwt", "invalid_token")]
    #[case("Basic dXNlcjpwYXNz", "invalid_token")]
    #[tokio::test]
    async fn test_bad_credentials_are_rejected(#[case] authorization: &str, #[case] code: &str) {
        let uri = format!("/api/v1/lots/{}/documents", LotId::new());
        let response = create_router(state())
            .oneshot(
                Request::get(uri)
                    .header(header::AUTHORIZATION, authorization)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], code);
    }

    #[tokio::test]
    async fn test_database_failure_renders_error_envelope() {
        let app_state = state();
        let token = app_state
            .jwt_service
            .generate_access_token(UserId::new(), UserRole::Concierge)
            .unwrap();
        let uri = format!("/api/v1/lots/{}/documents?all=1", LotId::new());

        let response = create_router(app_state)
            .oneshot(
                Request::get(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "database_error");
    }

    #[tokio::test]
    async fn test_malformed_lot_id_is_bad_request() {
        let response = create_router(state())
            .oneshot(
                Request::get("/api/v1/lots/not-a-uuid/documents")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_without_data_is_unprocessable() {
        let uri = format!(
            "/api/v1/lots/{}/documents/{}",
            LotId::new(),
            DocumentId::new()
        );
        let response = create_router(state())
            .oneshot(
                Request::patch(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title": "x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["message"], "Data not available");
    }

    #[tokio::test]
    async fn test_second_file_part_is_rejected() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.pdf\"\r\nContent-Type: application/pdf\r\n\r\nA\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"b.pdf\"\r\nContent-Type: application/pdf\r\n\r\nB\r\n\
             --{boundary}--\r\n"
        );
        let uri = format!("/api/v1/lots/{}/documents", LotId::new());

        let response = create_router(state())
            .oneshot(
                Request::post(uri)
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_post_returns_created_with_location() {
        let lot_id = LotId::new();
        let owner_id = UserId::new();
        let db = loaded_lot(lot_id, owner_id, Vec::new())
            .append_exec_results([
                // lot row update, document rows delete, document rows insert
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();
        let app_state = state_with(db);
        let token = app_state
            .jwt_service
            .generate_access_token(owner_id, UserRole::Broker)
            .unwrap();

        let boundary = "XBOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notice.pdf\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"documentType\"\r\n\r\nnotice\r\n\
             --{boundary}--\r\n"
        );
        let response = create_router(app_state)
            .oneshot(
                Request::post(format!("/api/v1/lots/{lot_id}/documents"))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = body_json(response).await;
        let document_id = body["data"]["id"].as_str().unwrap();
        assert_eq!(
            location,
            format!("http://localhost:8080/api/v1/lots/{lot_id}/documents/{document_id}")
        );
        assert_eq!(body["data"]["title"], "notice.pdf");
        assert_eq!(body["data"]["author"], "lot_owner");
        assert_eq!(body["data"]["documentType"], "notice");
    }

    #[tokio::test]
    async fn test_download_streams_raw_bytes() {
        let lot_id = LotId::new();
        let document_id = DocumentId::new();
        let row = document_row(lot_id, document_id, 0, "k1");
        let storage_key = row.storage_key.clone();
        let app_state = state_with(loaded_lot(lot_id, UserId::new(), vec![row]).into_connection());
        app_state
            .storage
            .write(&storage_key, "application/pdf", "%PDF-1.4 demo".into())
            .await
            .unwrap();

        let response = create_router(app_state)
            .oneshot(
                Request::get(format!(
                    "/api/v1/lots/{lot_id}/documents/{document_id}?download=k1"
                ))
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"Notice_v1.pdf\""
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), b"%PDF-1.4 demo");
    }

    #[tokio::test]
    async fn test_download_unknown_key_is_not_found() {
        let lot_id = LotId::new();
        let document_id = DocumentId::new();
        let row = document_row(lot_id, document_id, 0, "k1");
        let app_state = state_with(loaded_lot(lot_id, UserId::new(), vec![row]).into_connection());

        let response = create_router(app_state)
            .oneshot(
                Request::get(format!(
                    "/api/v1/lots/{lot_id}/documents/{document_id}?download=other"
                ))
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "not_found");
    }

    #[tokio::test]
    async fn test_read_lists_previous_versions() {
        let lot_id = LotId::new();
        let document_id = DocumentId::new();
        let rows = vec![
            document_row(lot_id, document_id, 0, "k1"),
            document_row(lot_id, document_id, 1, "k2"),
        ];
        let app_state = state_with(loaded_lot(lot_id, UserId::new(), rows).into_connection());

        let response = create_router(app_state)
            .oneshot(
                Request::get(format!("/api/v1/lots/{lot_id}/documents/{document_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["data"]["url"].as_str().unwrap().ends_with("download=k2"));
        let previous = body["data"]["previousVersions"].as_array().unwrap();
        assert_eq!(previous.len(), 1);
        assert!(previous[0]["url"].as_str().unwrap().ends_with("download=k1"));
    }
}
