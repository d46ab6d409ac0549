//! # Registry HTTP API
//!
//! JSON over HTTP, camelCase on the wire. Reads hit the registry
//! directly and never block each other; mutations either go through the
//! typed endpoints or are submitted as a [`RegistryOp`] to `POST /tx`.
//!
//! Verification deserves its own note: `GET /credentials/:hash/verify`
//! answers 200 for *every* well-formed hash. An unknown credential is a
//! negative report, not a 404 — relying parties get one uniform response
//! shape and the endpoint leaks nothing about which hashes exist.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use attest_protocol::clock::Clock;
use attest_protocol::config::PROTOCOL_VERSION;
use attest_protocol::crypto::CredentialHash;
use attest_protocol::identity::{AttestId, DidDocument};
use attest_protocol::metadata::{put_json, ContentStore, MetadataStore, VerifiableCredential};
use attest_protocol::metadata::CredentialClaims;
use attest_protocol::registry::{
    CredentialRecord, DirectoryError, RegistryError, RegistryService, RegistryStats,
    VerificationReport,
};
use attest_protocol::submit::{RegistryOp, SubmissionOutcome, Submitter};

use crate::metrics::NodeMetrics;

#[derive(Clone)]
pub struct AppState {
    pub registry: RegistryService,
    pub submitter: Submitter,
    pub store: ContentStore,
    pub metrics: Arc<NodeMetrics>,
    pub started_at: DateTime<Utc>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/tx", post(submit_tx))
        .route("/dids", post(register_did))
        .route("/dids/:address", get(get_did))
        .route("/issuers", post(add_issuer))
        .route("/issuers/remove", post(remove_issuer))
        .route("/issuers/:address", get(issuer_status))
        .route("/credentials", post(issue_credential))
        .route("/credentials/revoke", post(revoke_credential))
        .route("/credentials/:hash", get(get_credential))
        .route("/credentials/:hash/verify", get(verify_credential))
        .route("/subjects/:address/credentials", get(subject_credentials))
        .route("/metadata/:digest", get(fetch_metadata))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Prometheus scrape surface, served on its own port.
pub fn metrics_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// API-level failure with its HTTP status.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, error = %self.message, "request failed");
        }
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let status = match &err {
            RegistryError::Unauthorized { .. } | RegistryError::NotAuthorizedIssuer { .. } => {
                StatusCode::FORBIDDEN
            }
            RegistryError::CredentialNotFound(_) | RegistryError::DidNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            RegistryError::DuplicateCredential(_)
            | RegistryError::AlreadyRegistered(_)
            | RegistryError::AlreadyRevoked(_) => StatusCode::CONFLICT,
            RegistryError::InvalidExpiry { .. } | RegistryError::LimitExceeded { .. } => {
                StatusCode::BAD_REQUEST
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Registry(e) => e.into(),
            DirectoryError::Document(e) => Self::bad_request(e.to_string()),
        }
    }
}

fn parse_address(s: &str) -> Result<AttestId, ApiError> {
    s.parse()
        .map_err(|_| ApiError::bad_request(format!("'{s}' is not a valid atst1 address")))
}

fn parse_hash(s: &str) -> Result<CredentialHash, ApiError> {
    s.parse()
        .map_err(|_| ApiError::bad_request(format!("'{s}' is not a valid credential hash")))
}

// ---------------------------------------------------------------------------
// Node info
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_seconds: i64,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: PROTOCOL_VERSION,
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    owner: String,
    #[serde(flatten)]
    stats: RegistryStats,
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let stats = state.registry.stats();
    state.metrics.update_gauges(&stats);
    Json(StatusResponse {
        owner: state.registry.owner().to_address(),
        stats,
    })
}

// ---------------------------------------------------------------------------
// Generic transaction submission
// ---------------------------------------------------------------------------

async fn submit_tx(
    State(state): State<AppState>,
    Json(op): Json<RegistryOp>,
) -> Json<SubmissionOutcome> {
    let outcome = state.submitter.submit(op).await;
    if let SubmissionOutcome::Confirmed(receipt) = &outcome {
        count_mutation(&state, &receipt.operation);
    }
    Json(outcome)
}

fn count_mutation(state: &AppState, operation: &str) {
    match operation {
        "issue_credential" => state.metrics.credentials_issued_total.inc(),
        "revoke_credential" => state.metrics.credentials_revoked_total.inc(),
        "register_did" => state.metrics.dids_registered_total.inc(),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// DIDs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterDidRequest {
    address: String,
    document: DidDocument,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterDidResponse {
    address: String,
    did: String,
    created_at: DateTime<Utc>,
}

async fn register_did(
    State(state): State<AppState>,
    Json(req): Json<RegisterDidRequest>,
) -> Result<(StatusCode, Json<RegisterDidResponse>), ApiError> {
    let owner = parse_address(&req.address)?;
    let record = state.registry.register_did(owner, req.document)?;
    state.metrics.dids_registered_total.inc();
    Ok((
        StatusCode::CREATED,
        Json(RegisterDidResponse {
            address: record.owner.to_address(),
            did: record.document.id.clone(),
            created_at: record.created_at,
        }),
    ))
}

async fn get_did(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<DidDocument>, ApiError> {
    let owner = parse_address(&address)?;
    state
        .registry
        .did_record(&owner)
        .map(|record| Json(record.document))
        .ok_or_else(|| ApiError::not_found(format!("no DID registered for {address}")))
}

// ---------------------------------------------------------------------------
// Issuers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuerRequest {
    caller: String,
    issuer: String,
}

async fn add_issuer(
    State(state): State<AppState>,
    Json(req): Json<IssuerRequest>,
) -> Result<StatusCode, ApiError> {
    let caller = parse_address(&req.caller)?;
    let issuer = parse_address(&req.issuer)?;
    state.registry.add_issuer(&caller, issuer)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_issuer(
    State(state): State<AppState>,
    Json(req): Json<IssuerRequest>,
) -> Result<StatusCode, ApiError> {
    let caller = parse_address(&req.caller)?;
    let issuer = parse_address(&req.issuer)?;
    state.registry.remove_issuer(&caller, &issuer)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssuerStatusResponse {
    address: String,
    authorized: bool,
}

async fn issuer_status(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<IssuerStatusResponse>, ApiError> {
    let id = parse_address(&address)?;
    Ok(Json(IssuerStatusResponse {
        authorized: state.registry.is_issuer(&id),
        address,
    }))
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueRequest {
    caller: String,
    expires_at: DateTime<Utc>,
    claims: CredentialClaims,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueResponse {
    hash: CredentialHash,
    #[serde(rename = "metadataURI")]
    metadata_uri: String,
    record: CredentialRecord,
}

/// Issue a credential from full claims.
///
/// The node computes the claim digest, wraps the claims into a W3C
/// Verifiable Credential, stores that document in the content store, and
/// then anchors hash plus document address on the ledger. When the
/// ledger write is rejected the stored document is harmless surplus:
/// content-addressed, unreferenced, eligible for garbage collection.
async fn issue_credential(
    State(state): State<AppState>,
    Json(req): Json<IssueRequest>,
) -> Result<(StatusCode, Json<IssueResponse>), ApiError> {
    let caller = parse_address(&req.caller)?;
    if caller != req.claims.issuer {
        return Err(ApiError::bad_request(
            "caller does not match the issuer named in the claims",
        ));
    }

    let hash = req.claims.digest();
    // The envelope's issuance date must agree with the ledger record's
    // issued_at, so both come from the registry's clock.
    let issued_at = state.registry.clock().now();
    let envelope = VerifiableCredential::from_claims(&req.claims, issued_at, req.expires_at);
    let metadata_uri = put_json(&state.store, &envelope)
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let record = state.registry.issue_credential(
        &caller,
        hash,
        req.claims.subject.clone(),
        req.claims.credential_type.clone(),
        req.expires_at,
        metadata_uri.clone(),
    )?;
    state.metrics.credentials_issued_total.inc();

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            hash,
            metadata_uri,
            record,
        }),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevokeRequest {
    caller: String,
    hash: String,
}

async fn revoke_credential(
    State(state): State<AppState>,
    Json(req): Json<RevokeRequest>,
) -> Result<Json<CredentialRecord>, ApiError> {
    let caller = parse_address(&req.caller)?;
    let hash = parse_hash(&req.hash)?;
    let record = state.registry.revoke_credential(&caller, &hash)?;
    state.metrics.credentials_revoked_total.inc();
    Ok(Json(record))
}

async fn get_credential(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<CredentialRecord>, ApiError> {
    let hash = parse_hash(&hash)?;
    state
        .registry
        .get_credential(&hash)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no credential recorded under {hash}")))
}

async fn verify_credential(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<VerificationReport>, ApiError> {
    let hash = parse_hash(&hash)?;
    let started = Instant::now();
    let (report, status) = state.registry.verify_credential(&hash);
    state
        .metrics
        .record_verification(status, started.elapsed().as_secs_f64());
    Ok(Json(report))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubjectCredentialsResponse {
    subject: String,
    hashes: Vec<CredentialHash>,
}

async fn subject_credentials(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<SubjectCredentialsResponse>, ApiError> {
    let subject = parse_address(&address)?;
    Ok(Json(SubjectCredentialsResponse {
        hashes: state.registry.credentials_by_subject(&subject),
        subject: address,
    }))
}

async fn fetch_metadata(
    State(state): State<AppState>,
    Path(digest): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uri = format!("cas://{digest}");
    let bytes = state
        .store
        .fetch(&uri)
        .await
        .map_err(|e| ApiError::not_found(e.to_string()))?;
    serde_json::from_slice(&bytes)
        .map(Json)
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

async fn render_metrics(State(state): State<AppState>) -> Result<String, ApiError> {
    state.metrics.update_gauges(&state.registry.stats());
    state.metrics.render().map_err(|e| ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_protocol::clock::ManualClock;
    use attest_protocol::crypto::AttestKeypair;
    use attest_protocol::identity::AttestDid;
    use attest_protocol::registry::RegistryConfig;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Duration;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn actor(seed: u8) -> (AttestKeypair, AttestId) {
        let kp = AttestKeypair::from_seed(&[seed; 32]);
        let id = AttestId::from_public_key(&kp.public_key());
        (kp, id)
    }

    fn test_state() -> (AppState, Arc<ManualClock>, AttestId) {
        let clock = Arc::new(ManualClock::at_unix(1_750_000_000));
        let (_, owner) = actor(1);
        let registry = RegistryService::new(RegistryConfig::new(owner.clone()), clock.clone());
        let state = AppState {
            submitter: Submitter::new(registry.clone()),
            registry,
            store: ContentStore::new(),
            metrics: Arc::new(NodeMetrics::new().unwrap()),
            started_at: Utc::now(),
        };
        (state, clock, owner)
    }

    async fn request(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn claims_body(issuer: &AttestId, subject: &AttestId) -> serde_json::Value {
        serde_json::json!({
            "credentialType": "BachelorDegree",
            "issuer": issuer.to_address(),
            "subject": subject.to_address(),
            "degree": "Bachelor of Science",
            "major": "Computer Science",
            "institution": "Example University",
            "graduationDate": "2026-06-15",
            "gpa": "3.8",
            "nonce": Uuid::from_u128(1),
        })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (state, _, _) = test_state();
        let router = create_router(state);
        let (status, body) = request(&router, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn issue_and_verify_over_http() {
        let (state, clock, owner) = test_state();
        let (_, university) = actor(2);
        let (_, student) = actor(3);
        let router = create_router(state);

        let (status, _) = request(
            &router,
            "POST",
            "/issuers",
            Some(serde_json::json!({
                "caller": owner.to_address(),
                "issuer": university.to_address(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let expires = clock.now() + Duration::days(365);
        let (status, body) = request(
            &router,
            "POST",
            "/credentials",
            Some(serde_json::json!({
                "caller": university.to_address(),
                "expiresAt": expires,
                "claims": claims_body(&university, &student),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let hash = body["hash"].as_str().unwrap().to_string();
        let metadata_uri = body["metadataURI"].as_str().unwrap().to_string();
        assert!(metadata_uri.starts_with("cas://"));

        let (status, report) =
            request(&router, "GET", &format!("/credentials/{hash}/verify"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["isValid"], true);
        assert_eq!(report["issuer"], university.to_address());
        assert_eq!(report["subject"], student.to_address());
        assert_eq!(report["metadataURI"], metadata_uri);

        // The stored envelope is retrievable by its content address.
        let digest = metadata_uri.strip_prefix("cas://").unwrap();
        let (status, doc) = request(&router, "GET", &format!("/metadata/{digest}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["credentialHash"], hash);
    }

    #[tokio::test]
    async fn envelope_issuance_date_matches_the_ledger_record() {
        let (state, clock, owner) = test_state();
        let (_, university) = actor(2);
        let (_, student) = actor(3);
        let router = create_router(state);

        request(
            &router,
            "POST",
            "/issuers",
            Some(serde_json::json!({
                "caller": owner.to_address(),
                "issuer": university.to_address(),
            })),
        )
        .await;
        clock.advance(Duration::hours(7));

        let (status, body) = request(
            &router,
            "POST",
            "/credentials",
            Some(serde_json::json!({
                "caller": university.to_address(),
                "expiresAt": clock.now() + Duration::days(365),
                "claims": claims_body(&university, &student),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let issued_at = body["record"]["issuedAt"].clone();
        assert_eq!(issued_at, serde_json::json!(clock.now()));

        // The stored envelope carries the same instant, not wall time.
        let digest = body["metadataURI"]
            .as_str()
            .unwrap()
            .strip_prefix("cas://")
            .unwrap()
            .to_string();
        let (status, doc) = request(&router, "GET", &format!("/metadata/{digest}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["issuanceDate"], issued_at);
    }

    #[tokio::test]
    async fn unknown_hash_verifies_negative_with_200() {
        let (state, _, _) = test_state();
        let router = create_router(state);
        let hash = CredentialHash::from_bytes([9u8; 32]).to_hex();
        let (status, report) =
            request(&router, "GET", &format!("/credentials/{hash}/verify"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["isValid"], false);
        assert_eq!(report["issuer"], "");
        assert_eq!(report["issuedAt"], 0);
    }

    #[tokio::test]
    async fn error_statuses_match_rejections() {
        let (state, clock, owner) = test_state();
        let (_, university) = actor(2);
        let (_, student) = actor(3);
        let (_, intruder) = actor(4);
        let router = create_router(state);

        // Non-owner managing issuers: 403.
        let (status, body) = request(
            &router,
            "POST",
            "/issuers",
            Some(serde_json::json!({
                "caller": intruder.to_address(),
                "issuer": university.to_address(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("not authorized"));

        // Unauthorized issuer: 403.
        let expires = clock.now() + Duration::days(1);
        let issue_body = serde_json::json!({
            "caller": university.to_address(),
            "expiresAt": expires,
            "claims": claims_body(&university, &student),
        });
        let (status, _) = request(&router, "POST", "/credentials", Some(issue_body.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        request(
            &router,
            "POST",
            "/issuers",
            Some(serde_json::json!({
                "caller": owner.to_address(),
                "issuer": university.to_address(),
            })),
        )
        .await;

        // First issuance succeeds, replay conflicts: 409.
        let (status, body) = request(&router, "POST", "/credentials", Some(issue_body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let hash = body["hash"].as_str().unwrap().to_string();
        let (status, _) = request(&router, "POST", "/credentials", Some(issue_body)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Revocation by a stranger: 403. Unknown hash: 404.
        let (status, _) = request(
            &router,
            "POST",
            "/credentials/revoke",
            Some(serde_json::json!({ "caller": intruder.to_address(), "hash": hash })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let missing = CredentialHash::from_bytes([0xaa; 32]).to_hex();
        let (status, _) = request(
            &router,
            "POST",
            "/credentials/revoke",
            Some(serde_json::json!({ "caller": university.to_address(), "hash": missing })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Past expiry: 400.
        let mut past = claims_body(&university, &student);
        past["nonce"] = serde_json::json!(Uuid::from_u128(2));
        let (status, _) = request(
            &router,
            "POST",
            "/credentials",
            Some(serde_json::json!({
                "caller": university.to_address(),
                "expiresAt": clock.now() - Duration::days(1),
                "claims": past,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Malformed address: 400.
        let (status, _) = request(&router, "GET", "/issuers/banana", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn did_registration_over_http() {
        let (state, _, _) = test_state();
        let (kp, university) = actor(2);
        let router = create_router(state);

        let document = DidDocument::new(
            &AttestDid::for_identity(university.clone()),
            &kp.public_key(),
        );
        let body = serde_json::json!({
            "address": university.to_address(),
            "document": document,
        });

        let (status, resp) = request(&router, "POST", "/dids", Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            resp["did"],
            format!("did:atst:{}", university.to_address())
        );

        // Single-use: 409 on re-registration.
        let (status, _) = request(&router, "POST", "/dids", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, doc) = request(
            &router,
            "GET",
            &format!("/dids/{}", university.to_address()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["id"], format!("did:atst:{}", university.to_address()));
    }

    #[tokio::test]
    async fn tx_endpoint_returns_outcomes_not_errors() {
        let (state, _, owner) = test_state();
        let (_, university) = actor(2);
        let router = create_router(state);

        let (status, body) = request(
            &router,
            "POST",
            "/tx",
            Some(serde_json::json!({
                "op": "add_issuer",
                "caller": owner.to_address(),
                "issuer": university.to_address(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "confirmed");
        assert_eq!(body["operation"], "add_issuer");

        // A rejected op is still a 200 with a failed outcome.
        let (status, body) = request(
            &router,
            "POST",
            "/tx",
            Some(serde_json::json!({
                "op": "add_issuer",
                "caller": university.to_address(),
                "issuer": university.to_address(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "failed");
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn status_and_metrics_surfaces() {
        let (state, _, owner) = test_state();
        let (_, university) = actor(2);
        let metrics_router = metrics_router(state.clone());
        let router = create_router(state);

        request(
            &router,
            "POST",
            "/issuers",
            Some(serde_json::json!({
                "caller": owner.to_address(),
                "issuer": university.to_address(),
            })),
        )
        .await;

        let (status, body) = request(&router, "GET", "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner"], owner.to_address());
        assert_eq!(body["authorizedIssuers"], 1);
        assert_eq!(body["credentials"], 0);

        let req = Request::builder()
            .method("GET")
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = metrics_router.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let text = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8(text.to_vec())
            .unwrap()
            .contains("attest_authorized_issuers 1"));
    }

    #[tokio::test]
    async fn subject_listing_includes_revoked() {
        let (state, clock, owner) = test_state();
        let (_, university) = actor(2);
        let (_, student) = actor(3);
        let router = create_router(state);

        request(
            &router,
            "POST",
            "/issuers",
            Some(serde_json::json!({
                "caller": owner.to_address(),
                "issuer": university.to_address(),
            })),
        )
        .await;

        let mut hashes = Vec::new();
        for nonce in [10u128, 11] {
            let mut claims = claims_body(&university, &student);
            claims["nonce"] = serde_json::json!(Uuid::from_u128(nonce));
            let (status, body) = request(
                &router,
                "POST",
                "/credentials",
                Some(serde_json::json!({
                    "caller": university.to_address(),
                    "expiresAt": clock.now() + Duration::days(30),
                    "claims": claims,
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            hashes.push(body["hash"].as_str().unwrap().to_string());
        }

        request(
            &router,
            "POST",
            "/credentials/revoke",
            Some(serde_json::json!({
                "caller": university.to_address(),
                "hash": hashes[0],
            })),
        )
        .await;

        let (status, body) = request(
            &router,
            "GET",
            &format!("/subjects/{}/credentials", student.to_address()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let listed: Vec<String> = body["hashes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert_eq!(listed, hashes);
    }

    #[tokio::test]
    async fn caller_must_match_claims_issuer() {
        let (state, clock, owner) = test_state();
        let (_, university) = actor(2);
        let (_, student) = actor(3);
        let (_, other) = actor(4);
        let router = create_router(state);

        request(
            &router,
            "POST",
            "/issuers",
            Some(serde_json::json!({
                "caller": owner.to_address(),
                "issuer": other.to_address(),
            })),
        )
        .await;

        // `other` is authorized but the claims name `university` as issuer.
        let (status, _) = request(
            &router,
            "POST",
            "/credentials",
            Some(serde_json::json!({
                "caller": other.to_address(),
                "expiresAt": clock.now() + Duration::days(1),
                "claims": claims_body(&university, &student),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
