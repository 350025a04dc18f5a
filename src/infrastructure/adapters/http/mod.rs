//! HTTP adapter: carrier webhooks, outbound send API and health check

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::application::errors::{BotError, ValidationError};
use crate::application::services::{InboundOutcome, MessageService};
use crate::domain::entities::timestamp;
use crate::infrastructure::adapters::twilio::twiml;

/// Reply sent to the carrier when handling a message fails unexpectedly
pub const APOLOGY: &str = "⚠️ عذراً، حدث خطأ في النظام. يرجى المحاولة لاحقاً.";

/// Shared app state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MessageService>,
}

/// Inbound message webhook fields
#[derive(Debug, Default, Deserialize)]
pub struct InboundForm {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
}

/// Delivery status callback fields
#[derive(Debug, Default, Deserialize)]
pub struct StatusForm {
    #[serde(rename = "MessageSid", default)]
    pub message_sid: String,
    #[serde(rename = "MessageStatus", default)]
    pub message_status: String,
    #[serde(rename = "ErrorCode", default)]
    pub error_code: Option<String>,
    #[serde(rename = "To", default)]
    pub to: String,
}

/// Outbound send request body
#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    pub to: Option<String>,
    pub message: Option<String>,
}

/// Build the router (shared between production startup and tests)
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/whatsapp",
            post(inbound_webhook).layer(CatchPanicLayer::custom(apology_on_panic)),
        )
        .route("/send-message", post(send_message))
        .route("/status-callback", post(status_callback))
        .route("/health", get(health))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until ctrl-c
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutting down");
            }
        })
        .await
}

fn twiml_reply(text: Option<&str>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, twiml::CONTENT_TYPE)],
        twiml::message_response(text),
    )
        .into_response()
}

fn apology_on_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail, "Unhandled fault while processing message");
    twiml_reply(Some(APOLOGY))
}

/// Receive an inbound message and answer with the classified reply
pub async fn inbound_webhook(
    State(state): State<AppState>,
    form: Result<Form<InboundForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed webhook payload");
            InboundForm::default()
        }
    };

    match state.service.handle_inbound(&form.from, &form.body).await {
        Ok(InboundOutcome::Reply(text)) => twiml_reply(Some(&text)),
        Ok(InboundOutcome::Denied) => twiml_reply(None),
        Err(ValidationError::EmptyBody) => {
            (StatusCode::BAD_REQUEST, ValidationError::EmptyBody.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to process message");
            twiml_reply(Some(APOLOGY))
        }
    }
}

/// Push a message through the carrier
pub async fn send_message(
    State(state): State<AppState>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return error_json(StatusCode::BAD_REQUEST, "Missing required fields", "missing_field");
    };

    match state
        .service
        .send_outbound(request.to.as_deref(), request.message.as_deref())
        .await
    {
        Ok(sent) => Json(serde_json::json!({
            "success": true,
            "message_sid": sent.sid,
            "status": sent.status,
        }))
        .into_response(),
        Err(BotError::Validation(e)) => {
            error_json(StatusCode::BAD_REQUEST, &e.to_string(), e.reason())
        }
        Err(BotError::Carrier(e)) => {
            tracing::error!(error = %e, "Failed to send message");
            error_json(StatusCode::BAD_GATEWAY, &e.to_string(), "upstream_delivery")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to send message");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), "internal")
        }
    }
}

fn error_json(status: StatusCode, error: &str, reason: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": error, "reason": reason })),
    )
        .into_response()
}

/// Record a delivery status update. Always answers 200 so the carrier does
/// not retry.
pub async fn status_callback(
    State(state): State<AppState>,
    form: Result<Form<StatusForm>, FormRejection>,
) -> StatusCode {
    match form {
        Ok(Form(form)) => {
            state
                .service
                .record_status_fields(
                    &form.message_sid,
                    &form.message_status,
                    form.error_code.as_deref(),
                    &form.to,
                )
                .await;
        }
        Err(e) => tracing::error!(error = %e, "Error in status callback"),
    }
    StatusCode::OK
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "whatsapp-bot",
        "timestamp": timestamp::now().to_rfc3339(),
        "twilio_configured": state.service.carrier().carrier_info().configured,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{Classifier, MatchStrategy};
    use crate::domain::entities::{CommandTable, Exchange, StatusRecord};
    use crate::domain::traits::{BestEffort, Carrier};
    use crate::infrastructure::adapters::console::ConsoleCarrier;
    use crate::infrastructure::adapters::twilio::UnconfiguredCarrier;
    use crate::infrastructure::storage::MemoryStore;

    struct Harness {
        state: AppState,
        exchanges: Arc<MemoryStore<Exchange>>,
        statuses: Arc<MemoryStore<StatusRecord>>,
    }

    fn harness() -> Harness {
        harness_with(Arc::new(ConsoleCarrier::new("+14155238886")))
    }

    fn harness_with(carrier: Arc<dyn Carrier>) -> Harness {
        let exchanges = Arc::new(MemoryStore::new());
        let statuses = Arc::new(MemoryStore::new());
        let service = MessageService::new(
            Arc::new(Classifier::new(CommandTable::builtin(), MatchStrategy::Substring)),
            carrier,
            BestEffort::new(exchanges.clone(), "exchanges"),
            BestEffort::new(statuses.clone(), "statuses"),
        );
        Harness {
            state: AppState {
                service: Arc::new(service),
            },
            exchanges,
            statuses,
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn inbound(from: &str, body: &str) -> Result<Form<InboundForm>, FormRejection> {
        Ok(Form(InboundForm {
            from: from.to_string(),
            body: body.to_string(),
        }))
    }

    #[tokio::test]
    async fn test_webhook_replies_with_twiml() {
        let h = harness();
        let response = inbound_webhook(State(h.state.clone()), inbound("whatsapp:+1", "مرحبا")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            twiml::CONTENT_TYPE
        );
        let body = body_text(response).await;
        assert!(body.contains("<Message>مرحباً"));
        assert_eq!(h.exchanges.len().await, 1);
    }

    #[tokio::test]
    async fn test_webhook_empty_body_is_400() {
        let h = harness();
        let response = inbound_webhook(State(h.state.clone()), inbound("whatsapp:+1", "   ")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "No message body");
        assert_eq!(h.exchanges.len().await, 0);
    }

    #[tokio::test]
    async fn test_send_message_validation() {
        let h = harness();
        let request = SendRequest {
            to: Some("966500000000".into()),
            message: Some("hi".into()),
        };
        let response = send_message(State(h.state.clone()), Ok(Json(request))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["reason"], "invalid_phone");
        assert_eq!(h.exchanges.len().await, 0);
    }

    #[tokio::test]
    async fn test_send_message_missing_fields() {
        let h = harness();
        let response = send_message(State(h.state.clone()), Ok(Json(SendRequest::default()))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["reason"], "missing_field");
    }

    #[tokio::test]
    async fn test_send_message_ok() {
        let h = harness();
        let request = SendRequest {
            to: Some("+966500000000".into()),
            message: Some("Your order shipped".into()),
        };
        let response = send_message(State(h.state.clone()), Ok(Json(request))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "queued");
        assert_eq!(h.exchanges.len().await, 1);
    }

    #[tokio::test]
    async fn test_send_message_unconfigured_is_502() {
        let h = harness_with(Arc::new(UnconfiguredCarrier::new("missing credentials", "+14155238886")));
        let request = SendRequest {
            to: Some("+966500000000".into()),
            message: Some("hi".into()),
        };
        let response = send_message(State(h.state.clone()), Ok(Json(request))).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["reason"], "upstream_delivery");
        assert_eq!(h.exchanges.len().await, 0);
    }

    #[tokio::test]
    async fn test_status_callback_records() {
        let h = harness();
        let form = StatusForm {
            message_sid: "SM1".into(),
            message_status: "undelivered".into(),
            error_code: Some("63016".into()),
            to: "whatsapp:+1".into(),
        };
        let status = status_callback(State(h.state.clone()), Ok(Form(form))).await;

        assert_eq!(status, StatusCode::OK);
        let records = h.statuses.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message_id, "SM1");
        assert!(records[0].is_failure());
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let response = health(State(h.state.clone())).await.into_response();
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["twilio_configured"], false);
    }

    #[tokio::test]
    async fn test_panic_becomes_apology() {
        let response = apology_on_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(APOLOGY));
    }

    #[test]
    fn test_router_builds() {
        let _router = build_router(harness().state);
    }
}
