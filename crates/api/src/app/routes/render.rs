use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::IntoResponse,
};

use cartaporte_documents::CrtDocument;
use cartaporte_observability::AuditEvent;
use cartaporte_render::RenderedPdf;

use crate::app::errors;
use crate::app::routes::crts::parse_selector;
use crate::app::services::AppServices;

/// Render a posted canonical document.
///
/// The body is decoded by hand so a malformed payload is logged and audited
/// before the 400 goes out.
pub async fn generate_pdf(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let doc: CrtDocument = match serde_json::from_slice(&body) {
        Ok(doc) => doc,
        Err(e) => {
            services.report_failure("JSON inválido en BodyParser", &e);
            return errors::json_error(StatusCode::BAD_REQUEST, "malformed_input", format!("JSON inválido: {e}"));
        }
    };

    services.audit(AuditEvent::info("Recibido nuevo CRT").with("crt", &doc));
    render_response(&services, &doc)
}

/// Resolve a stored document, then render it.
pub async fn crt_pdf(
    Extension(services): Extension<Arc<AppServices>>,
    Path(selector): Path<String>,
) -> axum::response::Response {
    let selector = match parse_selector(&services, &selector) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services.resolver.get(&selector).await {
        Ok(doc) => render_response(&services, &doc),
        Err(e) => {
            services.report_resolve_failure("Error al obtener CRT", &e);
            errors::resolve_error_to_response(&e)
        }
    }
}

fn render_response(services: &AppServices, doc: &CrtDocument) -> axum::response::Response {
    let pdf = services.render(doc);
    tracing::info!(
        numero_crt = %doc.waybill_number,
        bytes = pdf.bytes.len(),
        font = %pdf.font_name,
        font_fallback = pdf.font_fallback,
        "pdf rendered"
    );
    services.audit(
        AuditEvent::success("PDF generado exitosamente").with("crt_numero", &doc.waybill_number),
    );
    pdf_response(pdf)
}

fn pdf_response(pdf: RenderedPdf) -> axum::response::Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "inline; filename=CRT.pdf"),
        ],
        pdf.bytes,
    )
        .into_response()
}
