//! JWT Pizza E2E Test Framework
//!
//! This crate drives the storefront through real browser scenarios:
//! - Spawns the storefront dev server as a subprocess
//! - Starts one mock backend per scenario, seeded from the scenario
//! - Renders each declarative YAML scenario to a Playwright script whose
//!   backend calls are forwarded to that mock
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_storefront() -> StorefrontHandle               │
//! │    ├── MockServer::start(seed) per scenario                 │
//! │    └── run_spec(spec) -> TestResult                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    ├── name, description, tags                              │
//! │    ├── mock: { logged_in_as? }                              │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url }                               │
//! │          ├── click / fill / select { target }               │
//! │          ├── wait { target, state }                         │
//! │          ├── assert { target, visible?, text_contains? }    │
//! │          └── screenshot { name }                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod runner;
pub mod spec;
pub mod playwright;
pub mod server;
pub mod error;

pub use runner::TestRunner;
pub use spec::{Locator, TestSpec, TestStep};
pub use error::{E2eError, E2eResult};
