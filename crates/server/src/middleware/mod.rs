//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (read or generate `x-request-id`)
//! 4. CORS
//! 5. Session layer (tower-sessions)
//!
//! Identity is not a layer: handlers opt in with the [`RequireMerchant`]
//! extractor.

pub mod auth;
pub mod cors;
pub mod request_id;
pub mod session;

pub use auth::{RequireMerchant, clear_current_merchant, set_current_merchant};
pub use cors::cors_layer;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
