//! JWT Pizza Mock Backend
//!
//! Stands in for the storefront's backend during browser scenarios:
//! - `route` classifies intercepted calls by path shape
//! - `session` tracks the simulated logged-in identity
//! - `router` answers each call from the reference fixtures
//! - `server` serves one router over HTTP for the browser layer

pub mod error;
pub mod route;
pub mod router;
pub mod server;
pub mod session;

pub use error::{MockError, MockResult};
pub use route::{RouteKind, JS_ROUTE_PATTERNS};
pub use router::{InterceptionRouter, MockRequest, MockResponse};
pub use server::{MockServer, MockServerConfig};
pub use session::Session;
