use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use cartaporte_core::Selector;

use crate::app::routes::render;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/simple", get(list_recent))
        .route("/next_number", get(next_number))
        .route("/:selector", get(get_crt))
        .route("/:selector/pdf", get(render::crt_pdf))
}

/// Parse a path selector; numeric segments are ids.
pub(crate) fn parse_selector(
    services: &AppServices,
    raw: &str,
) -> Result<Selector, axum::response::Response> {
    raw.parse::<Selector>().map_err(|e| {
        services.report_failure("Selector inválido", &e);
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_selector", e.to_string())
    })
}

pub async fn get_crt(
    Extension(services): Extension<Arc<AppServices>>,
    Path(selector): Path<String>,
) -> axum::response::Response {
    let selector = match parse_selector(&services, &selector) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services.resolver.get(&selector).await {
        Ok(doc) => (StatusCode::OK, Json(doc)).into_response(),
        Err(e) => {
            services.report_resolve_failure("Error al obtener CRT", &e);
            errors::resolve_error_to_response(&e)
        }
    }
}

pub async fn list_recent(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.resolver.list_recent().await {
        Ok(docs) => (StatusCode::OK, Json(docs)).into_response(),
        Err(e) => {
            services.report_resolve_failure("Error al listar CRTs", &e);
            errors::resolve_error_to_response(&e)
        }
    }
}

pub async fn next_number(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::NextNumberQuery>,
) -> axum::response::Response {
    let carrier_id = query
        .transportadora_id
        .as_deref()
        .and_then(|s| s.trim().parse::<i64>().ok());
    let (Some(carrier_id), Some(codigo)) = (carrier_id, query.codigo.as_deref()) else {
        let msg = "Código inválido: transportadora_id and codigo are required";
        services.report_failure("Código inválido", &msg);
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_input", msg);
    };

    match services.resolver.next_number(carrier_id, codigo).await {
        Ok(number) => (
            StatusCode::OK,
            Json(dto::NextNumberResponse {
                next_number: number.as_str().to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            services.report_resolve_failure("Código inválido", &e);
            errors::resolve_error_to_response(&e)
        }
    }
}
