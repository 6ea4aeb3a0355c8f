//! HTTP webhook gateway for mendbot.
//!
//! Receives issue-tracker webhooks and turns `issue opened` events into
//! background developer runs. The HTTP caller gets an immediate accepted
//! or ignored answer; run outcomes only show up in the logs.
//!
//! Built on Axum.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
};
use mendbot_agent::DeveloperAgent;
use mendbot_core::host::Issue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub agent: Arc<DeveloperAgent>,
    /// HMAC shared secret; `None` disables signature validation.
    pub webhook_secret: Option<String>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/webhook", post(webhook_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: mendbot_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.gateway.bind_addr();

    let agent = Arc::new(mendbot_agent::build_developer(&config, ".")?);
    let state = Arc::new(GatewayState {
        agent,
        webhook_secret: config.gateway.webhook_secret.clone(),
    });

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Validate an HMAC-SHA256 signature against the shared secret.
///
/// The expected format is `sha256=<hex_digest>` (the bare digest is also
/// accepted). Uses constant-time comparison. An empty secret disables
/// validation.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    if secret.is_empty() {
        return true;
    }

    let sig_hex = signature.strip_prefix("sha256=").unwrap_or(signature);
    let provided_bytes = match hex::decode(sig_hex) {
        Ok(b) => b,
        Err(_) => return false,
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.verify_slice(&provided_bytes).is_ok()
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The slice of the issue-tracker webhook payload the gateway cares about.
#[derive(Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    action: String,
    issue: Option<Issue>,
}

#[derive(Serialize)]
struct WebhookResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

impl WebhookResponse {
    fn accepted(issue: u64) -> Self {
        Self {
            status: "accepted",
            issue: Some(issue),
            reason: None,
        }
    }

    fn ignored(reason: &'static str) -> Self {
        Self {
            status: "ignored",
            issue: None,
            reason: Some(reason),
        }
    }
}

/// Accepts an issue-tracker webhook, spawning one background run per
/// `issue opened` event.
///
/// The body is taken raw because the signature covers the exact bytes.
async fn webhook_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<WebhookResponse>, StatusCode> {
    if let Some(secret) = state.webhook_secret.as_deref()
        && !secret.is_empty()
    {
        let signature = headers
            .get("X-Hub-Signature-256")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !verify_signature(secret, &body, signature) {
            warn!("Webhook signature validation failed");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Webhook payload was not valid JSON");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    if payload.action != "opened" {
        return Ok(Json(WebhookResponse::ignored("not an issue-opened event")));
    }

    let Some(issue) = payload.issue else {
        return Ok(Json(WebhookResponse::ignored("no issue in payload")));
    };

    let number = issue.number;
    info!(issue = number, title = %issue.title, "Scheduling developer run for opened issue");

    let agent = state.agent.clone();
    tokio::spawn(async move {
        let report = agent.run(&issue).await;
        match &report.outcome {
            mendbot_agent::RunOutcome::Succeeded { pull_request_url } => {
                info!(
                    run_id = %report.run_id,
                    issue = number,
                    url = %pull_request_url,
                    "Background run succeeded"
                );
            }
            mendbot_agent::RunOutcome::Exhausted { reason } => {
                error!(
                    run_id = %report.run_id,
                    issue = number,
                    iterations = report.iterations,
                    %reason,
                    "Background run exhausted"
                );
            }
        }
    });

    Ok(Json(WebhookResponse::accepted(number)))
}
