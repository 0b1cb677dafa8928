//! In-process REST backend used by the endpoint and screen tests.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    routing::{get, patch, put},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct BackendState {
    collections: HashMap<String, Vec<Value>>,
    next_id: i64,
    requests: Vec<RecordedRequest>,
    failures: Vec<(Method, StatusCode)>,
    raw_list_body: Option<String>,
}

#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
    pub async fn with_records(collection: &str, records: Vec<Value>) -> Self {
        let backend = Self::default();
        backend.seed(collection, records).await;
        backend
    }

    pub async fn seed(&self, collection: &str, records: Vec<Value>) {
        let mut state = self.state.lock().await;
        let max_id = records
            .iter()
            .filter_map(|record| record["id"].as_i64())
            .max()
            .unwrap_or(0);
        state.next_id = state.next_id.max(max_id);
        state.collections.insert(collection.to_string(), records);
    }

    /// Makes the next request with `method` answer `status`.
    pub async fn fail_next(&self, method: Method, status: StatusCode) {
        self.state.lock().await.failures.push((method, status));
    }

    /// Serves `body` verbatim for every list request.
    pub async fn serve_raw_list(&self, body: &str) {
        self.state.lock().await.raw_list_body = Some(body.to_string());
    }

    pub async fn records(&self, collection: &str) -> Vec<Value> {
        self.state
            .lock()
            .await
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }

    pub async fn mutating_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|request| request.method != Method::GET)
            .collect()
    }

    pub async fn spawn(&self) -> String {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = Router::new()
            .route("/api/:collection", get(list_records).post(create_record))
            .route(
                "/api/:collection/:id",
                put(update_record).delete(delete_record),
            )
            .route("/api/:collection/:id/status/:active", patch(patch_status))
            .with_state(self.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }
}

impl BackendState {
    fn record(&mut self, method: Method, path: String, body: Option<Value>) -> Option<StatusCode> {
        self.requests.push(RecordedRequest {
            method: method.clone(),
            path,
            body,
        });
        let index = self.failures.iter().position(|(m, _)| *m == method)?;
        Some(self.failures.remove(index).1)
    }

    fn find(&self, collection: &str, id: i64) -> Option<Value> {
        self.collections
            .get(collection)?
            .iter()
            .find(|record| record["id"].as_i64() == Some(id))
            .cloned()
    }

    /// Mirrors the backend's habit of returning nested person/course objects.
    fn expand_enrollment(&self, record: &mut Value) {
        if let Some(person_id) = record["pessoaId"].as_i64() {
            record["pessoa"] = self.find("pessoas", person_id).unwrap_or(Value::Null);
        }
        if let Some(course_id) = record["cursoId"].as_i64() {
            record["curso"] = self.find("cursos", course_id).unwrap_or(Value::Null);
        }
    }
}

async fn list_records(
    State(backend): State<MockBackend>,
    Path(collection): Path<String>,
) -> Result<String, StatusCode> {
    let mut state = backend.state.lock().await;
    if let Some(status) = state.record(Method::GET, format!("/api/{collection}"), None) {
        return Err(status);
    }
    if let Some(raw) = &state.raw_list_body {
        return Ok(raw.clone());
    }
    let records = state
        .collections
        .get(&collection)
        .cloned()
        .unwrap_or_default();
    Ok(Value::Array(records).to_string())
}

async fn create_record(
    State(backend): State<MockBackend>,
    Path(collection): Path<String>,
    Json(mut body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let mut state = backend.state.lock().await;
    let path = format!("/api/{collection}");
    if let Some(status) = state.record(Method::POST, path, Some(body.clone())) {
        return Err(status);
    }
    state.next_id += 1;
    body["id"] = json!(state.next_id);
    if collection == "matriculas" {
        state.expand_enrollment(&mut body);
    }
    state
        .collections
        .entry(collection)
        .or_default()
        .push(body.clone());
    Ok((StatusCode::CREATED, Json(body)))
}

async fn update_record(
    State(backend): State<MockBackend>,
    Path((collection, id)): Path<(String, i64)>,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut state = backend.state.lock().await;
    let path = format!("/api/{collection}/{id}");
    if let Some(status) = state.record(Method::PUT, path, Some(body.clone())) {
        return Err(status);
    }
    body["id"] = json!(id);
    if collection == "matriculas" {
        state.expand_enrollment(&mut body);
    }
    let slot = state
        .collections
        .get_mut(&collection)
        .and_then(|records| records.iter_mut().find(|r| r["id"].as_i64() == Some(id)))
        .ok_or(StatusCode::NOT_FOUND)?;
    *slot = body.clone();
    Ok(Json(body))
}

async fn delete_record(
    State(backend): State<MockBackend>,
    Path((collection, id)): Path<(String, i64)>,
) -> StatusCode {
    let mut state = backend.state.lock().await;
    if let Some(status) = state.record(Method::DELETE, format!("/api/{collection}/{id}"), None) {
        return status;
    }
    let Some(records) = state.collections.get_mut(&collection) else {
        return StatusCode::NOT_FOUND;
    };
    let before = records.len();
    records.retain(|record| record["id"].as_i64() != Some(id));
    if records.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn patch_status(
    State(backend): State<MockBackend>,
    Path((collection, id, active)): Path<(String, i64, bool)>,
) -> Result<Json<Value>, StatusCode> {
    let mut state = backend.state.lock().await;
    let path = format!("/api/{collection}/{id}/status/{active}");
    if let Some(status) = state.record(Method::PATCH, path, None) {
        return Err(status);
    }
    let record = state
        .collections
        .get_mut(&collection)
        .and_then(|records| records.iter_mut().find(|r| r["id"].as_i64() == Some(id)))
        .ok_or(StatusCode::NOT_FOUND)?;
    record["ativo"] = json!(active);
    Ok(Json(record.clone()))
}

pub(crate) fn person(id: i64, name: &str, cpf: &str) -> Value {
    json!({"id": id, "nome": name, "cpf": cpf, "dataNascimento": null, "email": null, "telefone": null})
}

pub(crate) fn course(id: i64, name: &str, description: &str, active: bool) -> Value {
    json!({
        "id": id,
        "nome": name,
        "descricao": description,
        "valor": 300.0,
        "cargaHoraria": 20,
        "ativo": active
    })
}
