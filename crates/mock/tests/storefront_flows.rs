//! Call sequences the storefront issues for the recorded browser scenarios

use axum::http::{Method, StatusCode};
use pizza_common::fixtures;
use pizza_mock::{InterceptionRouter, MockRequest};
use serde_json::{json, Value};

fn call(router: &mut InterceptionRouter, method: Method, path: &str, body: Option<Value>) -> Value {
    let mut req = MockRequest::new(method, path);
    req.body = body;
    let resp = router.handle(&req).expect("storefront call is handled");
    assert_eq!(resp.status, StatusCode::OK, "{}", path);
    resp.body
}

/// Anonymous visitor picks store 1, adds a Veggie, logs in at checkout,
/// pays and verifies the pizza.
#[test]
fn order_pizza_with_login() {
    let mut router = InterceptionRouter::anonymous();

    let menu = call(&mut router, Method::GET, "/api/order/menu", None);
    let veggie = menu
        .as_array()
        .and_then(|items| items.iter().find(|i| i["id"] == 1))
        .cloned()
        .unwrap();
    assert_eq!(veggie["title"], "Veggie");

    let stores = call(&mut router, Method::GET, "/api/franchise?page=0&limit=20&name=*", None);
    assert_eq!(stores["more"], false);
    assert_eq!(stores["franchises"][0]["stores"][0]["id"], 1);

    let auth = call(
        &mut router,
        Method::PUT,
        "/api/auth",
        Some(json!({ "email": "d@jwt.com", "password": "diner" })),
    );
    assert_eq!(auth["user"]["name"], "Kai Chen");

    let order = call(
        &mut router,
        Method::POST,
        "/api/order",
        Some(json!({
            "franchiseId": 1,
            "storeId": "1",
            "items": [{ "menuId": 1, "description": veggie["title"], "price": veggie["price"] }],
        })),
    );
    assert_eq!(order["order"]["id"], 100);
    assert_eq!(order["order"]["items"].as_array().map(Vec::len), Some(1));
    let jwt = order["jwt"].as_str().unwrap().to_string();

    let verdict = call(&mut router, Method::POST, "/api/order/verify", Some(json!({ "jwt": jwt })));
    assert_eq!(verdict["message"], "valid");
    assert_eq!(verdict["payload"]["diner"]["email"], "d@jwt.com");
}

#[test]
fn franchisee_dashboard_shows_owned_franchise() {
    let mut router = InterceptionRouter::anonymous();
    let auth = call(
        &mut router,
        Method::PUT,
        "/api/auth",
        Some(json!({ "email": "f@jwt.com", "password": "franchisee" })),
    );
    let id = auth["user"]["id"].as_u64().unwrap();

    let owned = call(&mut router, Method::GET, &format!("/api/franchise/{}", id), None);
    let owned = owned.as_array().unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0]["id"], 1);
    assert_eq!(owned[0]["name"], "pizzaPocket");
    let stores: Vec<_> = owned[0]["stores"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(stores, ["SLC", "Provo"]);

    let store = call(
        &mut router,
        Method::POST,
        "/api/franchise/1/store",
        Some(json!({ "name": "New Store" })),
    );
    assert_eq!(store["name"], "New Store");

    let closed = call(&mut router, Method::DELETE, "/api/franchise/1/store/1", None);
    assert_eq!(closed["message"], "store deleted");
}

#[test]
fn admin_creates_and_closes_franchise() {
    let mut router = InterceptionRouter::anonymous();
    call(
        &mut router,
        Method::PUT,
        "/api/auth",
        Some(json!({ "email": "a@jwt.com", "password": "admin" })),
    );

    let list = call(&mut router, Method::GET, "/api/franchise?page=0&limit=3&name=*", None);
    assert_eq!(list["franchises"].as_array().map(Vec::len), Some(2));

    let created = call(
        &mut router,
        Method::POST,
        "/api/franchise",
        Some(json!({ "stores": [], "id": "", "name": "New Franchise", "admins": [{ "email": "t@jwt.com" }] })),
    );
    assert_eq!(created["id"], 10);
    assert_eq!(created["stores"], json!([]));
    assert_eq!(created["admins"][0]["email"], "t@jwt.com");

    let closed = call(&mut router, Method::DELETE, "/api/franchise/1", None);
    assert_eq!(closed["message"], "franchise deleted");

    // Creation and deletion never touch the catalog
    let list_after = call(&mut router, Method::GET, "/api/franchise", None);
    assert_eq!(list_after, list);
    assert_eq!(fixtures::all_franchises().len(), 2);
}

#[test]
fn diner_dashboard_history() {
    let mut router = InterceptionRouter::new(fixtures::find_identity_by_email("d@jwt.com").cloned());
    let history = call(&mut router, Method::GET, "/api/order", None);
    assert_eq!(history["dinerId"], 3);
    assert_eq!(history["orders"][0]["date"], "2024-06-05T05:14:40.000Z");
}

#[test]
fn docs_page() {
    let mut router = InterceptionRouter::anonymous();
    let docs = call(&mut router, Method::GET, "/api/docs", None);
    let methods: Vec<_> = docs["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["method"].as_str().unwrap())
        .collect();
    assert_eq!(methods, ["POST", "PUT", "DELETE"]);
}
