//! Integration test harness for Storekeep.
//!
//! Drives the full router (middleware included) in-process with
//! `tower::ServiceExt::oneshot`, using the in-memory catalog store and the
//! tower-sessions `MemoryStore`, so no database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storekeep-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::Path,
    http::{HeaderMap, Method, Request, StatusCode, header},
    routing::post,
};
use chrono::Duration;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use storekeep_core::MerchantId;
use storekeep_server::config::ServerConfig;
use storekeep_server::db::{CatalogStore, MemoryCatalogStore};
use storekeep_server::middleware::{
    clear_current_merchant, create_session_layer, set_current_merchant,
};
use storekeep_server::models::CurrentMerchant;
use storekeep_server::services::TokenSigner;
use storekeep_server::{AppState, app};

/// Token signing secret used by the harness.
pub const TOKEN_SECRET: &str = "k7Qp2xVb9LmZr4TnWc8HsJd3FgYa6EuR";

/// How a request authenticates.
#[derive(Debug, Clone)]
pub enum Auth {
    None,
    /// `Cookie` header value from [`TestApp::login`].
    Cookie(String),
    /// Raw bearer token.
    Bearer(String),
}

/// A response with its body decoded.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, or a JSON string for plain-text bodies.
    pub body: Value,
}

/// Server under test.
pub struct TestApp {
    router: Router,
    signer: TokenSigner,
}

impl TestApp {
    /// Build a fresh app with empty storage.
    ///
    /// # Panics
    ///
    /// Panics if the test configuration is rejected.
    #[must_use]
    pub fn new() -> Self {
        let config = ServerConfig::from_lookup(|key| match key {
            "STOREKEEP_STORAGE" => Some("memory".to_string()),
            "STOREKEEP_TOKEN_SECRET" => Some(TOKEN_SECRET.to_string()),
            _ => None,
        })
        .unwrap_or_else(|e| panic!("test config rejected: {e}"));

        let catalog: Arc<dyn CatalogStore> = Arc::new(MemoryCatalogStore::new());
        let session_layer = create_session_layer(MemoryStore::default(), &config);
        let state = AppState::new(config, catalog)
            .unwrap_or_else(|e| panic!("test state rejected: {e}"));

        // Stand-in for the login service that shares the session store.
        let login = Router::new()
            .route("/test/login/{merchant_id}", post(login))
            .route("/test/logout", post(logout))
            .layer(session_layer.clone());

        let signer = TokenSigner::new(&SecretString::from(TOKEN_SECRET.to_string()))
            .unwrap_or_else(|e| panic!("test signer rejected: {e}"));

        Self {
            router: login.merge(app(state, session_layer)),
            signer,
        }
    }

    /// Log `merchant_id` in and return the `Cookie` header to send.
    ///
    /// # Panics
    ///
    /// Panics if the login route does not set a session cookie.
    pub async fn login(&self, merchant_id: i64) -> Auth {
        let response = self
            .send(
                Method::POST,
                &format!("/test/login/{merchant_id}"),
                None,
                &Auth::None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);

        let cookie = response
            .headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
            .unwrap_or_else(|| panic!("login did not set a session cookie"));
        Auth::Cookie(cookie)
    }

    /// Log out the session behind `auth`.
    ///
    /// # Panics
    ///
    /// Panics if the logout route fails.
    pub async fn logout(&self, auth: &Auth) {
        let response = self.send(Method::POST, "/test/logout", None, auth).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    /// Issue a bearer token for `merchant_id`.
    #[must_use]
    pub fn bearer(&self, merchant_id: i64) -> Auth {
        Auth::Bearer(
            self.signer
                .issue(MerchantId::new(merchant_id), Duration::hours(1)),
        )
    }

    /// Issue a bearer token for `merchant_id` that has already expired.
    #[must_use]
    pub fn expired_bearer(&self, merchant_id: i64) -> Auth {
        Auth::Bearer(self.signer.issue_until(
            MerchantId::new(merchant_id),
            chrono::Utc::now() - Duration::minutes(1),
        ))
    }

    /// Send a request through the full middleware stack.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        auth: &Auth,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        builder = match auth {
            Auth::None => builder,
            Auth::Cookie(cookie) => builder.header(header::COOKIE, cookie),
            Auth::Bearer(token) => {
                builder.header(header::AUTHORIZATION, format!("Bearer {token}"))
            }
        };

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap_or_else(|e| panic!("bad test request: {e}"));

        self.send_raw(request).await
    }

    /// Send a prebuilt request.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    pub async fn send_raw(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("unreadable body: {e}"));
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Create a store and return its id.
    ///
    /// # Panics
    ///
    /// Panics if creation fails.
    pub async fn create_store(&self, auth: &Auth, name: &str, description: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/api/v1/store/add",
                Some(serde_json::json!({ "name": name, "description": description })),
                auth,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["store_id"]
            .as_str()
            .unwrap_or_else(|| panic!("missing store_id: {:?}", response.body))
            .to_string()
    }

    /// Create an item and return its id.
    ///
    /// # Panics
    ///
    /// Panics if creation fails.
    pub async fn create_item(&self, auth: &Auth, store_id: &str, item: Value) -> String {
        let response = self
            .send(
                Method::POST,
                &format!("/api/v1/item/add/{store_id}"),
                Some(item),
                auth,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["item_id"]
            .as_str()
            .unwrap_or_else(|| panic!("missing item_id: {:?}", response.body))
            .to_string()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

async fn login(session: Session, Path(merchant_id): Path<i64>) -> StatusCode {
    let merchant = CurrentMerchant {
        id: MerchantId::new(merchant_id),
    };
    match set_current_merchant(&session, &merchant).await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn logout(session: Session) -> StatusCode {
    match clear_current_merchant(&session).await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
