//! Interception router
//!
//! Answers every matched storefront call from the reference fixtures and the
//! scenario's [`Session`]. Handling is synchronous and strictly ordered; one
//! router serves exactly one simulated browsing session.

use axum::http::{Method, StatusCode};
use pizza_common::fixtures;
use pizza_common::{EntityId, Identity, RoleAssignment, RoleKind};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::route::RouteKind;
use crate::session::Session;

/// Opaque token handed out on login and registration
pub const AUTH_TOKEN: &str = "test-token";

const REGISTERED_IDENTITY_ID: EntityId = 10;
const CREATED_FRANCHISE_ID: EntityId = 10;
const CREATED_ADMIN_ID: EntityId = 10;
const CREATED_ADMIN_NAME: &str = "Test User";
const CREATED_STORE_ID: EntityId = 10;
const CREATED_STORE_FRANCHISE_ID: EntityId = 1;
const SUBMITTED_ORDER_ID: EntityId = 100;

/// An intercepted call
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: Method,
    /// Request path, optionally with a query string
    pub path: String,
    pub body: Option<Value>,
}

impl MockRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and JSON body used to fulfil an intercepted call
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl MockResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    fn message(message: &str) -> Self {
        Self::ok(json!({ "message": message }))
    }

    fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegisterPayload {
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateFranchisePayload {
    name: String,
    admins: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateStorePayload {
    name: String,
}

/// Missing or malformed bodies count as an empty object
fn payload<T: DeserializeOwned + Default>(body: Option<&Value>) -> T {
    body.and_then(|v| T::deserialize(v).ok()).unwrap_or_default()
}

/// Stateful stand-in for the storefront's backend
#[derive(Debug, Default)]
pub struct InterceptionRouter {
    session: Session,
}

impl InterceptionRouter {
    /// Create a router whose session starts bound to `seed`, or anonymous
    pub fn new(seed: Option<Identity>) -> Self {
        Self {
            session: Session::from_seed(seed),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Answer one intercepted call. `None` leaves the call unhandled: no
    /// pattern covers the path, or the category does not serve the method.
    pub fn handle(&mut self, request: &MockRequest) -> Option<MockResponse> {
        let Some(route) = RouteKind::classify(&request.path) else {
            warn!(method = %request.method, path = %request.path, "unmatched call left unhandled");
            return None;
        };
        let body = request.body.as_ref();

        let response = match (route, &request.method) {
            (RouteKind::Auth, &Method::POST) => Some(self.register(payload(body))),
            (RouteKind::Auth, &Method::PUT) => Some(self.login(payload(body))),
            (RouteKind::Auth, &Method::DELETE) => Some(self.logout()),
            (RouteKind::CurrentUser, &Method::GET) => Some(self.current_user()),
            (RouteKind::Menu, &Method::GET) => Some(menu()),
            (RouteKind::Franchises, &Method::GET) => Some(franchise_list()),
            (RouteKind::Franchises, &Method::POST) => Some(create_franchise(payload(body))),
            (RouteKind::Franchise { .. }, &Method::GET) => Some(self.owner_franchises()),
            (RouteKind::Franchise { .. }, &Method::DELETE) => {
                Some(MockResponse::message("franchise deleted"))
            }
            (RouteKind::Stores { .. }, &Method::POST) => Some(create_store(payload(body))),
            (RouteKind::Store { .. }, &Method::DELETE) => {
                Some(MockResponse::message("store deleted"))
            }
            (RouteKind::Orders, &Method::GET) => Some(self.order_history()),
            (RouteKind::Orders, &Method::POST) => Some(submit_order(body)),
            (RouteKind::OrderVerify, _) => Some(verify_order()),
            (RouteKind::Docs, &Method::GET) => Some(docs()),
            _ => None,
        };

        match &response {
            Some(r) => debug!(
                route = route.name(),
                method = %request.method,
                path = %request.path,
                status = r.status.as_u16(),
                "intercepted call answered"
            ),
            None => warn!(
                route = route.name(),
                method = %request.method,
                path = %request.path,
                "method not served by route, left unhandled"
            ),
        }
        response
    }

    fn register(&mut self, req: RegisterPayload) -> MockResponse {
        let identity = Identity {
            id: REGISTERED_IDENTITY_ID,
            display_name: req.name,
            email: req.email,
            password: req.password,
            roles: vec![RoleAssignment::diner()],
        };
        let user = identity.public();
        self.session.authenticate(identity);
        MockResponse::ok(json!({ "user": user, "token": AUTH_TOKEN }))
    }

    fn login(&mut self, req: LoginPayload) -> MockResponse {
        match fixtures::find_identity_by_credentials(&req.email, &req.password) {
            Some(identity) => {
                let user = identity.public();
                self.session.authenticate(identity.clone());
                MockResponse::ok(json!({ "user": user, "token": AUTH_TOKEN }))
            }
            None => MockResponse::error(StatusCode::NOT_FOUND, "unknown user"),
        }
    }

    fn logout(&mut self) -> MockResponse {
        self.session.clear();
        MockResponse::message("logout successful")
    }

    fn current_user(&self) -> MockResponse {
        match self.session.identity() {
            Some(identity) => MockResponse::ok(json!(identity.public())),
            None => MockResponse::error(StatusCode::UNAUTHORIZED, "unauthorized"),
        }
    }

    /// The path id is not consulted; ownership comes from the session role.
    fn owner_franchises(&self) -> MockResponse {
        let owned = match self.session.identity() {
            Some(identity) if identity.has_role(RoleKind::FranchiseOwner) => {
                fixtures::franchises_owned_by(identity)
            }
            _ => Vec::new(),
        };
        MockResponse::ok(json!(owned))
    }

    fn order_history(&self) -> MockResponse {
        let diner_id = self.session.identity().map_or(0, |i| i.id);
        MockResponse::ok(json!({
            "dinerId": diner_id,
            "orders": [fixtures::historical_order()],
            "page": 1,
        }))
    }
}

fn menu() -> MockResponse {
    MockResponse::ok(json!(fixtures::all_menu_items()))
}

fn franchise_list() -> MockResponse {
    MockResponse::ok(json!({
        "franchises": fixtures::all_franchises(),
        "more": false,
    }))
}

fn create_franchise(req: CreateFranchisePayload) -> MockResponse {
    let admins: Vec<Value> = req
        .admins
        .into_iter()
        .map(|admin| {
            let mut fields = match admin {
                Value::Object(fields) => fields,
                _ => Map::new(),
            };
            fields.insert("id".to_string(), json!(CREATED_ADMIN_ID));
            fields.insert("name".to_string(), json!(CREATED_ADMIN_NAME));
            Value::Object(fields)
        })
        .collect();

    MockResponse::ok(json!({
        "id": CREATED_FRANCHISE_ID,
        "name": req.name,
        "admins": admins,
        "stores": [],
    }))
}

fn create_store(req: CreateStorePayload) -> MockResponse {
    MockResponse::ok(json!({
        "id": CREATED_STORE_ID,
        "franchiseId": CREATED_STORE_FRANCHISE_ID,
        "name": req.name,
        "totalRevenue": 0,
    }))
}

fn submit_order(body: Option<&Value>) -> MockResponse {
    let mut order = match body {
        Some(Value::Object(fields)) => fields.clone(),
        _ => Map::new(),
    };
    order.insert("id".to_string(), json!(SUBMITTED_ORDER_ID));

    MockResponse::ok(json!({
        "order": order,
        "jwt": fixtures::ORDER_VERIFICATION_TOKEN,
    }))
}

/// Always "valid". The presented token is never inspected.
fn verify_order() -> MockResponse {
    MockResponse::ok(json!({
        "message": "valid",
        "payload": fixtures::order_verification_claims(),
    }))
}

fn docs() -> MockResponse {
    MockResponse::ok(json!({
        "version": fixtures::API_VERSION,
        "endpoints": fixtures::endpoint_docs(),
    }))
}
