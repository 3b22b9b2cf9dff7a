use crate::db::{release, PromoCode};
use crate::prelude::*;

const NOT_FOUND: &str = "Промокод не найден";
const INACTIVE: &str = "Промокод не активен";

/// Add the promo code route to the router.
pub fn add_routes(router: AxumRouter) -> AxumRouter {
    router.route("/promo", any(endpoint))
}

async fn endpoint(State(state): State<SharedAppState>, Invocation(event, ctx): Invocation) -> Result<ApiResponse> {
    handle(&state, event, ctx).await
}

/// Check whether `?code=` names a usable promo code, and for how much.
#[tracing::instrument(name = "promo", skip_all, fields(method = %event.http_method, request_id = ?ctx.request_id))]
pub async fn handle(state: &AppState, event: ApiEvent, ctx: Context) -> Result<ApiResponse> {
    match event.http_method.as_str() {
        "OPTIONS" => return Ok(ApiResponse::preflight("GET, OPTIONS", "Content-Type")),
        "GET" => {}
        _ => return Ok(AppError::MethodNotAllowed.into()),
    }

    let Some(code) = normalize_code(event.query("code")) else {
        return Ok(AppError::PromoCodeRequired.into());
    };

    let Some(url) = state.config.db.url.as_deref() else {
        return Ok(AppError::NotConfigured.into());
    };

    let mut store = state.connector.connect(url).await?;
    let found = store.find_promo_code(&code).await;
    let found = release(store, found).await?;

    tracing::debug!("promo code={code:?} found={}", found.is_some());
    Ok(respond(found))
}

/// Trim and uppercase a code. `None` if nothing is left.
fn normalize_code(code: Option<&str>) -> Option<String> {
    Some(code?.trim().to_uppercase()).filter(|c| !c.is_empty())
}

fn respond(found: Option<PromoCode>) -> ApiResponse {
    match found {
        None => ApiResponse::json(StatusCode::NOT_FOUND, &json!({"valid": false, "error": NOT_FOUND})),
        Some(promo) if !promo.is_active() => {
            ApiResponse::json(StatusCode::OK, &json!({"valid": false, "error": INACTIVE}))
        }
        Some(promo) => ApiResponse::json(
            StatusCode::OK,
            &json!({
                "valid": true,
                "code": promo.code,
                "discount_percent": promo.discount_in_percent,
            }),
        ),
    }
}
