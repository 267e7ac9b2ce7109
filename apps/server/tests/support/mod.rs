
use anyhow::Context as _;
use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use catalog::{
    api::{create_router, requester::AuthenticatedRequester},
    db::{CatalogStore, FetchOptions, FilterExpr, InMemoryCatalogStore},
    models::{CatalogRecord, GeoPoint, Pharmacy},
    AppState, Config, Error,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt as _;
use uuid::Uuid;

pub use assertions::*;
pub use builders::*;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryCatalogStore>,
}

impl TestApp {
    pub fn new() -> anyhow::Result<Self> {
        Self::new_with_config(|_| {})
    }

    pub fn new_with_config(configure: impl FnOnce(&mut Config)) -> anyhow::Result<Self> {
        let mut config = Config::default();
        configure(&mut config);

        let store = Arc::new(InMemoryCatalogStore::new());
        let state = AppState::with_store(config, store.clone()).context("initialize AppState")?;
        let router = create_router(state.clone());

        Ok(Self {
            router,
            state,
            store,
        })
    }

    pub async fn add_pharmacy(&self, pharmacy: Pharmacy) -> Uuid {
        let id = pharmacy.id;
        self.store.insert_pharmacy(pharmacy).await;
        id
    }

    pub async fn add_medicine(&self, record: CatalogRecord) -> Uuid {
        let id = record.id;
        self.store.insert_record(record).await;
        id
    }

    pub async fn get(
        &self,
        path_and_query: &str,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        self.request(Method::GET, path_and_query, None).await
    }

    pub async fn get_json(&self, path_and_query: &str) -> anyhow::Result<(StatusCode, Value)> {
        let (status, _headers, body) = self.get(path_and_query).await?;
        Ok((status, parse_json(&body)?))
    }

    /// GET as an authenticated requester whose profile stores `location`.
    pub async fn get_json_as(
        &self,
        path_and_query: &str,
        location: Option<GeoPoint>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let requester = AuthenticatedRequester {
            id: Uuid::new_v4(),
            location,
        };
        let (status, _headers, body) = self
            .request(Method::GET, path_and_query, Some(requester))
            .await?;
        Ok((status, parse_json(&body)?))
    }

    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
        requester: Option<AuthenticatedRequester>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        dispatch(&self.router, method, path_and_query, requester).await
    }
}

pub async fn dispatch(
    router: &Router,
    method: Method,
    path_and_query: &str,
    requester: Option<AuthenticatedRequester>,
) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
    let mut request = Request::builder()
        .method(method)
        .uri(path_and_query)
        .header("host", "example.org")
        .header("accept", "application/json")
        .body(Body::empty())
        .context("build request")?;

    if let Some(requester) = requester {
        request.extensions_mut().insert(requester);
    }

    let response = router
        .clone()
        .oneshot(request)
        .await
        .context("dispatch request")?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .context("read response body")?;

    Ok((status, headers, body))
}

pub fn parse_json(body: &[u8]) -> anyhow::Result<Value> {
    serde_json::from_slice(body).with_context(|| {
        format!(
            "response body is not JSON: {}",
            String::from_utf8_lossy(body)
        )
    })
}

/// A store whose every operation fails, standing in for an unreachable database.
pub struct FailingStore;

fn unreachable_store() -> Error {
    Error::Store("connection refused".to_string())
}

#[async_trait]
impl CatalogStore for FailingStore {
    async fn count(&self, _filter: &FilterExpr) -> catalog::Result<u64> {
        Err(unreachable_store())
    }

    async fn fetch(
        &self,
        _filter: &FilterExpr,
        _options: &FetchOptions,
    ) -> catalog::Result<Vec<CatalogRecord>> {
        Err(unreachable_store())
    }

    async fn owner_locations(
        &self,
        _owner_ids: &[Uuid],
    ) -> catalog::Result<HashMap<Uuid, GeoPoint>> {
        Err(unreachable_store())
    }

    async fn owner_exists(&self, _owner_id: Uuid) -> catalog::Result<bool> {
        Err(unreachable_store())
    }
}

/// Router over [`FailingStore`].
pub fn failing_router() -> anyhow::Result<Router> {
    let state = AppState::with_store(Config::default(), Arc::new(FailingStore))
        .context("initialize AppState")?;
    Ok(create_router(state))
}
