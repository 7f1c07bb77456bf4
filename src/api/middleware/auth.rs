//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::{error::AppError, state::AppState};

/// Authenticates requests using Bearer tokens from Authorization header.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// On success the caller's [`TokenIdentity`](crate::application::services::TokenIdentity)
/// is inserted as a request extension for handlers that scope data by owner.
///
/// # Errors
///
/// Returns `401 Unauthorized` if the header is missing or malformed, or the
/// token is unknown or revoked. The response carries
/// `WWW-Authenticate: Bearer` per RFC 6750.
///
/// # Example
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/api/hts/{code}", get(hts_lookup_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    let identity = st.auth_service.authenticate(&token).await?;
    tracing::debug!(token = %identity.name, "Request authenticated");

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
