//! Preview endpoint handlers and the redirect/direct responders.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, LOCATION},
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::{
    error::HttpError,
    preview::{CARD_CONTENT_TYPE, PreviewError, PreviewOutcome},
};

use super::HttpState;

const SOURCE: &str = "infra::http::previews";

/// Blobs are content-addressed, so the direct-serve response can promise the
/// same long immutable lifetime the object store uses.
const BLOB_CACHE_CONTROL: &str = "public, max-age=604800, immutable";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct IdQuery {
    id: Option<String>,
    refresh: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CodeQuery {
    code: Option<String>,
    refresh: Option<bool>,
}

pub(super) async fn product(
    State(state): State<HttpState>,
    Query(query): Query<IdQuery>,
) -> Response {
    let id = match parse_id("product", query.id.as_deref()) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result = state
        .previews
        .product_card(id, query.refresh.unwrap_or(false))
        .await;
    outcome_response(result, &state)
}

pub(super) async fn fund(State(state): State<HttpState>, Query(query): Query<IdQuery>) -> Response {
    let id = match parse_id("fund", query.id.as_deref()) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result = state
        .previews
        .fund_card(id, query.refresh.unwrap_or(false))
        .await;
    outcome_response(result, &state)
}

pub(super) async fn business(
    State(state): State<HttpState>,
    Query(query): Query<IdQuery>,
) -> Response {
    let id = match parse_id("business", query.id.as_deref()) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result = state
        .previews
        .business_card(id, query.refresh.unwrap_or(false))
        .await;
    outcome_response(result, &state)
}

pub(super) async fn admin_invite(
    State(state): State<HttpState>,
    Query(query): Query<CodeQuery>,
) -> Response {
    let code = match query.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => {
            return HttpError::new(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Missing invite code",
                "admin-invite request arrived without a `code` parameter",
            )
            .into_response();
        }
    };
    let result = state
        .previews
        .invite_card(&code, query.refresh.unwrap_or(false))
        .await;
    outcome_response(result, &state)
}

fn parse_id(family: &'static str, raw: Option<&str>) -> Result<Uuid, Response> {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty()).ok_or_else(|| {
        HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Missing entity id",
            format!("{family} request arrived without an `id` parameter"),
        )
        .into_response()
    })?;

    Uuid::parse_str(raw).map_err(|err| {
        HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Malformed entity id",
            format!("{family} id `{raw}` is not a UUID: {err}"),
        )
        .into_response()
    })
}

fn outcome_response(
    result: Result<PreviewOutcome, PreviewError>,
    state: &HttpState,
) -> Response {
    match result {
        Ok(PreviewOutcome::Redirect { url }) => {
            redirect_response(&url, state.redirect_max_age_secs)
        }
        Ok(PreviewOutcome::Direct { bytes }) => direct_response(bytes),
        Err(err @ PreviewError::UnknownEntity { .. }) => HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Unknown entity",
            err.to_string(),
        )
        .into_response(),
        Err(PreviewError::Source(err)) => HttpError::from_error(
            SOURCE,
            StatusCode::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable",
            &err,
        )
        .into_response(),
        Err(PreviewError::Render(err)) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Preview could not be generated",
            &err,
        )
        .into_response(),
    }
}

/// 302 to the blob with a moderate browser lifetime and permissive CORS —
/// these images are embedded by third-party link unfurlers.
fn redirect_response(url: &str, max_age_secs: u64) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();

    match HeaderValue::from_str(url) {
        Ok(value) => {
            headers.insert(LOCATION, value);
        }
        Err(_) => {
            return HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Preview could not be served",
                format!("resolved blob URL is not a valid header value: {url}"),
            )
            .into_response();
        }
    }

    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={max_age_secs}")) {
        headers.insert(CACHE_CONTROL, value);
    }
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

    response
}

/// Uncached direct serve: the bytes this request rendered go out once, with
/// the same immutable lifetime a stored blob would have carried.
fn direct_response(bytes: Bytes) -> Response {
    let mut response = Response::new(Body::from(bytes.clone()));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CARD_CONTENT_TYPE));
    if let Ok(value) = HeaderValue::from_str(&bytes.len().to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(BLOB_CACHE_CONTROL));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

    response
}
