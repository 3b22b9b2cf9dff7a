use chrono::NaiveDateTime;
use serde::{Deserialize as _, Deserializer};

use crate::db::support_message::ANONYMOUS;
use crate::db::{release, MessageStatus, NewSupportMessage, SupportMessage};
use crate::prelude::*;

/// Add the support message route to the router.
pub fn add_routes(router: AxumRouter) -> AxumRouter {
    router.route("/support", any(endpoint))
}

async fn endpoint(State(state): State<SharedAppState>, Invocation(event, ctx): Invocation) -> Result<ApiResponse> {
    handle(&state, event, ctx).await
}

/// Customer submissions (`POST`), the admin listing (`GET`) and admin replies (`PUT`).
///
/// Replies are not authenticated: anyone who can reach the endpoint can answer any message.
#[tracing::instrument(name = "support", skip_all, fields(method = %event.http_method, request_id = ?ctx.request_id))]
pub async fn handle(state: &AppState, event: ApiEvent, ctx: Context) -> Result<ApiResponse> {
    if event.http_method == "OPTIONS" {
        return Ok(ApiResponse::preflight("GET, POST, PUT, OPTIONS", "Content-Type, X-User-Id"));
    }

    let Some(url) = state.config.db.url.as_deref() else {
        return Ok(AppError::NotConfigured.into());
    };

    let mut store = state.connector.connect(url).await?;
    let response = dispatch(store.as_mut(), &event).await;
    release(store, response).await
}

async fn dispatch(store: &mut dyn Store, event: &ApiEvent) -> Result<ApiResponse> {
    match event.http_method.as_str() {
        "GET" => list(store).await,
        "POST" => create(store, event).await,
        "PUT" => respond(store, event).await,
        _ => Ok(AppError::MethodNotAllowed.into()),
    }
}

async fn list(store: &mut dyn Store) -> Result<ApiResponse> {
    let messages = store.list_support_messages().await?;
    tracing::debug!("listing {} support messages", messages.len());
    Ok(ApiResponse::json(StatusCode::OK, &json!({"messages": messages})))
}

#[derive(Debug, Default, serde::Deserialize)]
struct CreateMessage {
    user_name: Option<String>,
    message: Option<String>,
}

impl CreateMessage {
    fn validate(self) -> Result<NewSupportMessage, AppError> {
        let message = self.message.filter(|m| !m.is_empty()).ok_or(AppError::MessageRequired)?;
        let user_name = self.user_name.unwrap_or_else(|| ANONYMOUS.to_string());
        Ok(NewSupportMessage { user_name, message })
    }
}

async fn create(store: &mut dyn Store, event: &ApiEvent) -> Result<ApiResponse> {
    let new = match event.json_body::<CreateMessage>().and_then(CreateMessage::validate) {
        Ok(new) => new,
        Err(e) => return Ok(e.into()),
    };

    let message = store.create_support_message(&new).await?;
    tracing::info!("support message id={} created", message.id);
    let message = CreatedMessage::from(&message);
    Ok(ApiResponse::json(StatusCode::CREATED, &json!({"success": true, "message": message})))
}

/// A freshly created message. Nothing about replies yet.
#[derive(serde::Serialize)]
struct CreatedMessage<'a> {
    id: i32,
    user_name: &'a str,
    message: &'a str,
    status: MessageStatus,
    created_at: Option<NaiveDateTime>,
}

impl<'a> From<&'a SupportMessage> for CreatedMessage<'a> {
    fn from(m: &'a SupportMessage) -> Self {
        Self { id: m.id, user_name: &m.user_name, message: &m.message, status: m.status, created_at: m.created_at }
    }
}

#[derive(Debug, Default, serde::Deserialize)]
struct RespondToMessage {
    #[serde(default, deserialize_with = "number_or_string")]
    id: Option<i32>,
    admin_response: Option<String>,
}

impl RespondToMessage {
    fn validate(self) -> Result<(i32, String), AppError> {
        let id = self.id.filter(|id| *id != 0);
        let admin_response = self.admin_response.filter(|r| !r.is_empty());
        id.zip(admin_response).ok_or(AppError::ResponseRequired)
    }
}

/// Accepts `7` or `"7"`. An empty string counts as missing.
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(i32),
        Text(String),
    }

    match Option::<Id>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Id::Number(id)) => Ok(Some(id)),
        Some(Id::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Id::Text(text)) => text.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

async fn respond(store: &mut dyn Store, event: &ApiEvent) -> Result<ApiResponse> {
    let (id, admin_response) = match event.json_body::<RespondToMessage>().and_then(RespondToMessage::validate) {
        Ok(reply) => reply,
        Err(e) => return Ok(e.into()),
    };

    let Some(message) = store.respond_to_support_message(id, &admin_response).await? else {
        return Ok(AppError::MessageNotFound.into());
    };

    tracing::info!("support message id={id} answered");
    let message = AnsweredMessage::from(&message);
    Ok(ApiResponse::json(StatusCode::OK, &json!({"success": true, "message": message})))
}

/// A message right after an admin replied to it.
#[derive(serde::Serialize)]
struct AnsweredMessage<'a> {
    id: i32,
    user_name: &'a str,
    message: &'a str,
    admin_response: Option<&'a str>,
    status: MessageStatus,
    responded_at: Option<NaiveDateTime>,
}

impl<'a> From<&'a SupportMessage> for AnsweredMessage<'a> {
    fn from(m: &'a SupportMessage) -> Self {
        Self {
            id: m.id,
            user_name: &m.user_name,
            message: &m.message,
            admin_response: m.admin_response.as_deref(),
            status: m.status,
            responded_at: m.responded_at,
        }
    }
}
