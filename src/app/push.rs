use crate::error::DispatchError;
use crate::ports::{PushSender, SubscriptionStore, TimeProvider};
use crate::state::AppState;
use crate::types::push::{
    NewSubscription, NotificationRequest, RemoveSubscription, SendReport, SubscriptionRecord,
};

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, error};

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

#[derive(Serialize)]
pub(crate) struct SubscribeResponse {
    pub(crate) success: bool,
    #[serde(rename = "subscriptionId")]
    pub(crate) subscription_id: String,
}

#[derive(Serialize)]
pub(crate) struct UnsubscribeResponse {
    pub(crate) success: bool,
}

#[derive(Serialize)]
pub(crate) struct StatsResponse {
    #[serde(rename = "subscriptionCount")]
    pub(crate) subscription_count: usize,
    pub(crate) subscriptions: Vec<SubscriptionRecord>,
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: &'static str,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(&'static str),
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(error) => (StatusCode::BAD_REQUEST, error),
            ApiError::Internal(error) => (StatusCode::INTERNAL_SERVER_ERROR, error),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

fn api_error(err: DispatchError, invalid: &'static str, failed: &'static str) -> ApiError {
    match err {
        DispatchError::Validation(reason) => {
            debug!("rejected push request: {reason}");
            ApiError::BadRequest(invalid)
        }
        other => {
            error!("push request failed: {other}");
            ApiError::Internal(failed)
        }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>, invalid: &'static str) -> Result<T, ApiError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        debug!("malformed push request body: {rejection}");
        ApiError::BadRequest(invalid)
    })
}

pub(crate) async fn vapid_public_key<S, P, T>(
    State(state): State<AppState<S, P, T>>,
) -> Json<PublicKeyResponse>
where
    S: SubscriptionStore,
    P: PushSender,
    T: TimeProvider,
{
    Json(PublicKeyResponse {
        public_key: state.dispatcher.public_key().to_string(),
    })
}

pub(crate) async fn subscribe<S, P, T>(
    State(state): State<AppState<S, P, T>>,
    payload: Result<Json<NewSubscription>, JsonRejection>,
) -> Result<Json<SubscribeResponse>, ApiError>
where
    S: SubscriptionStore,
    P: PushSender,
    T: TimeProvider,
{
    const INVALID: &str = "Invalid subscription";
    let request = body(payload, INVALID)?;
    let subscription_id = state
        .dispatcher
        .subscribe(request)
        .await
        .map_err(|err| api_error(err, INVALID, "Subscription failed"))?;
    Ok(Json(SubscribeResponse {
        success: true,
        subscription_id,
    }))
}

pub(crate) async fn unsubscribe<S, P, T>(
    State(state): State<AppState<S, P, T>>,
    payload: Result<Json<RemoveSubscription>, JsonRejection>,
) -> Result<Json<UnsubscribeResponse>, ApiError>
where
    S: SubscriptionStore,
    P: PushSender,
    T: TimeProvider,
{
    const INVALID: &str = "Invalid subscription";
    let request = body(payload, INVALID)?;
    state
        .dispatcher
        .unsubscribe(&request.subscription.endpoint)
        .await
        .map_err(|err| api_error(err, INVALID, "Unsubscribe failed"))?;
    Ok(Json(UnsubscribeResponse { success: true }))
}

pub(crate) async fn send<S, P, T>(
    State(state): State<AppState<S, P, T>>,
    payload: Result<Json<NotificationRequest>, JsonRejection>,
) -> Result<Json<SendReport>, ApiError>
where
    S: SubscriptionStore,
    P: PushSender,
    T: TimeProvider,
{
    const INVALID: &str = "Title and body are required";
    let request = body(payload, INVALID)?;
    let report = state
        .dispatcher
        .send_notification(request)
        .await
        .map_err(|err| api_error(err, INVALID, "Failed to send notifications"))?;
    Ok(Json(report))
}

pub(crate) async fn stats<S, P, T>(
    State(state): State<AppState<S, P, T>>,
) -> Result<Json<StatsResponse>, ApiError>
where
    S: SubscriptionStore,
    P: PushSender,
    T: TimeProvider,
{
    const FAILED: &str = "Failed to load subscriptions";
    let subscriptions = state
        .dispatcher
        .get_all_subscriptions()
        .await
        .map_err(|err| api_error(err, FAILED, FAILED))?;
    Ok(Json(StatsResponse {
        subscription_count: subscriptions.len(),
        subscriptions,
    }))
}
