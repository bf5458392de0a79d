use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use cartaporte_api::app::{build_app, services::AppServices};
use cartaporte_core::{CrtId, WaybillNumber};
use cartaporte_documents::RawCrtRow;
use cartaporte_infra::store::{Carrier, CrtRecord, InMemoryCrtStore, PartyRecord};
use cartaporte_infra::{CrtStore, SchemaRevision, StoreError};
use cartaporte_observability::{AuditLevel, InMemoryAuditSink};
use cartaporte_render::FontSource;

struct TestServer {
    base_url: String,
    audit: Arc<InMemoryAuditSink>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(store: InMemoryCrtStore) -> Self {
        Self::spawn_with(Arc::new(store)).await
    }

    async fn spawn_with(store: Arc<dyn CrtStore>) -> Self {
        // Same router as prod, injected store, bound to an ephemeral port.
        let audit = Arc::new(InMemoryAuditSink::new());
        let font = FontSource::new("Arial", "/nonexistent/arial.ttf");
        let services = AppServices::new(store, audit.clone(), Some(font))
            .expect("standard layout is valid");
        let app = build_app(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            audit,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn audit_messages(&self, level: AuditLevel) -> Vec<String> {
        self.audit
            .events()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.msg)
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A store whose database is gone.
struct UnreachableStore;

const CONNECTION_REFUSED: &str = "pool timed out while waiting for an open connection";

#[async_trait]
impl CrtStore for UnreachableStore {
    fn revision(&self) -> SchemaRevision {
        SchemaRevision::Normalized
    }

    async fn fetch_by_id(&self, _id: CrtId) -> Result<RawCrtRow, StoreError> {
        Err(StoreError::Storage(CONNECTION_REFUSED.into()))
    }

    async fn fetch_by_number(&self, _number: &WaybillNumber) -> Result<RawCrtRow, StoreError> {
        Err(StoreError::Storage(CONNECTION_REFUSED.into()))
    }

    async fn fetch_recent(&self, _limit: u32) -> Result<Vec<RawCrtRow>, StoreError> {
        Err(StoreError::Storage(CONNECTION_REFUSED.into()))
    }

    async fn latest_number(
        &self,
        _carrier_id: i64,
        _prefix: &str,
        _len: usize,
    ) -> Result<Option<String>, StoreError> {
        Err(StoreError::Storage(CONNECTION_REFUSED.into()))
    }
}

fn store_with_ids(ids: &[i64]) -> InMemoryCrtStore {
    let store = InMemoryCrtStore::new(SchemaRevision::Normalized);
    store.insert_carrier(Carrier {
        id: 1,
        name: "Transportes del Chaco".into(),
        ..Carrier::default()
    });
    store.insert_party(PartyRecord {
        id: 1,
        name: "Exportadora Guaraní".into(),
        ..PartyRecord::default()
    });
    for id in ids {
        store.insert_crt(CrtRecord {
            carrier_id: Some(1),
            consignor_id: Some(1),
            ..CrtRecord::new(*id, format!("PY{id:09}")).with("peso_bruto", "1200.500")
        });
    }
    store
}

fn sample_payload() -> Value {
    json!({
        "numero_crt": "PY000000042",
        "transportadora": "Transportes del Chaco",
        "remitente": "Exportadora Guaraní",
        "destinatario_nombre": "Importadora del Plata",
        "peso_bruto": 1200.5,
        "valor": "18500.00",
        "moneda": "USD",
        "gastos": [{"tramo": "Asunción - Clorinda", "valor_remitente": 350}]
    })
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn(store_with_ids(&[])).await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn simple_list_is_newest_first() {
    let srv = TestServer::spawn(store_with_ids(&[5, 3, 9, 1])).await;
    let res = reqwest::get(srv.url("/api/crts/simple")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Vec<Value> = res.json().await.unwrap();
    let ids: Vec<i64> = body.iter().map(|d| d["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![9, 5, 3, 1]);
}

#[tokio::test]
async fn get_by_id_equals_list_entry() {
    let srv = TestServer::spawn(store_with_ids(&[2, 4])).await;
    let list: Vec<Value> = reqwest::get(srv.url("/api/crts/simple"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    for entry in list {
        let id = entry["id"].as_i64().unwrap();
        let one: Value = reqwest::get(srv.url(&format!("/api/crts/{id}")))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(one, entry);
    }
}

#[tokio::test]
async fn document_shape_is_flat_and_aliased() {
    let srv = TestServer::spawn(store_with_ids(&[1])).await;
    let doc: Value = reqwest::get(srv.url("/api/crts/PY000000001"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(doc["id"], 1);
    assert_eq!(doc["numero_crt"], "PY000000001");
    assert_eq!(doc["remitente"], "Exportadora Guaraní");
    assert_eq!(doc["remitente_nombre"], doc["remitente"]);
    assert_eq!(doc["transportadora"], doc["transportadora_nombre"]);
    assert_eq!(doc["peso_bruto"], "1200.500");
    // Absent relations are empty strings, never null.
    assert_eq!(doc["consignatario_nombre"], "");
    assert_eq!(doc["notificar_a_pais"], "");
    assert_eq!(doc["gastos"], json!([]));
}

#[tokio::test]
async fn numeric_selector_takes_precedence() {
    let store = store_with_ids(&[7]);
    // A record whose waybill number looks like another record's id.
    store.insert_crt(CrtRecord::new(8, "7"));
    let srv = TestServer::spawn(store).await;

    let doc: Value = reqwest::get(srv.url("/api/crts/7")).await.unwrap().json().await.unwrap();
    assert_eq!(doc["id"], 7);
}

#[tokio::test]
async fn unknown_selector_is_404_and_audited() {
    let srv = TestServer::spawn(store_with_ids(&[1])).await;
    let res = reqwest::get(srv.url("/api/crts/999999")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
    assert!(body["message"].as_str().unwrap().starts_with("CRT no encontrado: "));
    assert_eq!(srv.audit_messages(AuditLevel::Error), vec!["Error al obtener CRT"]);
}

#[tokio::test]
async fn out_of_range_ids_are_404() {
    let srv = TestServer::spawn(store_with_ids(&[1])).await;
    for raw in ["0", "99999999999999999999"] {
        let res = reqwest::get(srv.url(&format!("/api/crts/{raw}"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{raw}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "not_found");
        assert!(body["message"].as_str().unwrap().starts_with("CRT no encontrado: "));
    }
    assert_eq!(srv.audit_messages(AuditLevel::Error).len(), 2);
}

#[tokio::test]
async fn storage_failure_is_500_and_audited() {
    let srv = TestServer::spawn_with(Arc::new(UnreachableStore)).await;

    let res = reqwest::get(srv.url("/api/crts/simple")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "storage_error");
    assert_eq!(body["message"], CONNECTION_REFUSED);

    let errors: Vec<_> = srv
        .audit
        .events()
        .into_iter()
        .filter(|e| e.level == AuditLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].msg, "Error al listar CRTs");
    assert_eq!(errors[0].payload["err"], CONNECTION_REFUSED);

    let res = reqwest::get(srv.url("/api/crts/7")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let res = reqwest::get(srv.url("/api/crts/7/pdf")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn generate_pdf_returns_inline_pdf() {
    let srv = TestServer::spawn(store_with_ids(&[])).await;
    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/generate-pdf"))
        .json(&sample_payload())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/pdf");
    assert_eq!(res.headers()["content-disposition"], "inline; filename=CRT.pdf");
    let bytes = res.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));

    assert_eq!(srv.audit_messages(AuditLevel::Info), vec!["Recibido nuevo CRT"]);
    let success: Vec<_> = srv
        .audit
        .events()
        .into_iter()
        .filter(|e| e.level == AuditLevel::Success)
        .collect();
    assert_eq!(success.len(), 1);
    assert_eq!(success[0].msg, "PDF generado exitosamente");
    assert_eq!(success[0].payload["crt_numero"], "PY000000042");
}

#[tokio::test]
async fn same_document_renders_identically() {
    let srv = TestServer::spawn(store_with_ids(&[])).await;
    let client = reqwest::Client::new();
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let res = client
            .post(srv.url("/generate-pdf"))
            .json(&sample_payload())
            .send()
            .await
            .unwrap();
        outputs.push(res.bytes().await.unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[tokio::test]
async fn malformed_body_is_400_and_audited() {
    let srv = TestServer::spawn(store_with_ids(&[])).await;
    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/generate-pdf"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "malformed_input");
    assert_eq!(srv.audit_messages(AuditLevel::Error), vec!["JSON inválido en BodyParser"]);
    assert!(srv.audit_messages(AuditLevel::Success).is_empty());
}

#[tokio::test]
async fn stored_crt_renders_as_pdf() {
    let srv = TestServer::spawn(store_with_ids(&[3])).await;
    let res = reqwest::get(srv.url("/api/crts/3/pdf")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/pdf");

    let res = reqwest::get(srv.url("/api/crts/404/pdf")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn next_number_follows_carrier_sequence() {
    let srv = TestServer::spawn(store_with_ids(&[41])).await;

    let body: Value = reqwest::get(srv.url("/api/crts/next_number?transportadora_id=1&codigo=PY000000001"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["next_number"], "PY000000042");

    let body: Value = reqwest::get(srv.url("/api/crts/next_number?transportadora_id=9&codigo=PY000000100"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["next_number"], "PY000000100");
}

#[tokio::test]
async fn next_number_rejects_bad_seed() {
    let srv = TestServer::spawn(store_with_ids(&[])).await;
    for query in ["transportadora_id=1&codigo=AR1", "codigo=PY000000001", "transportadora_id=x&codigo=PY000000001"] {
        let res = reqwest::get(srv.url(&format!("/api/crts/next_number?{query}")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{query}");
    }
}
