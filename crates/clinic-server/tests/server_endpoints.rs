use std::net::SocketAddr;

use clinic_server::{AppConfig, build_app};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

async fn start_server() -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    start_server_with(AppConfig::default()).await
}

async fn start_server_with(
    mut cfg: AppConfig,
) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    cfg.rate_limit.enabled = false;
    let app = build_app(&cfg).await.expect("build app");

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = rx.await;
        })
        .await;
    });

    (format!("http://{addr}"), tx, server)
}

async fn json_of(resp: reqwest::Response) -> Value {
    resp.json().await.expect("json body")
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().contains_key("x-request-id"));
    let body = json_of(resp).await;
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].as_str().is_some_and(|t| !t.is_empty()));

    // Request ids supplied by the client are echoed back
    let resp = client
        .get(format!("{base}/health"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "req-42");

    for path in ["/nope", "/api/unknown", "/api/medicines/1/explode"] {
        let resp = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(resp.status(), 404, "{path}");
        assert_eq!(
            json_of(resp).await,
            json!({"success": false, "error": "Route not found"})
        );
    }

    // Known paths answer unsupported methods with the failure envelope
    let resp = client
        .delete(format!("{base}/api/medicines/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);
    assert_eq!(
        json_of(resp).await,
        json!({"success": false, "error": "Method not allowed"})
    );
    let resp = client.post(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 405);
    assert_eq!(json_of(resp).await["error"], "Method not allowed");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn missing_records_return_named_404() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/api/equipment/999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(
        json_of(resp).await,
        json!({"success": false, "error": "Equipment not found"})
    );

    let cases = [
        ("medicines", "Medicine not found"),
        ("supplies", "Supply not found"),
        ("patients", "Patient not found"),
        ("consultations", "Consultation not found"),
        ("admin-users", "Admin user not found"),
        ("logs", "Log not found"),
    ];
    for (resource, message) in cases {
        let resp = client
            .get(format!("{base}/api/{resource}/999"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        assert_eq!(json_of(resp).await["error"], message);
    }

    let resp = client
        .put(format!("{base}/api/patients/999"))
        .json(&json!({"first_name": "Ghost"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn create_then_read_patient() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/patients"))
        .json(&json!({"last_name": "Cruz", "first_name": "Ana"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body = json_of(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Patient created successfully");
    let created = body["data"].clone();
    assert_eq!(created["id"], "3");
    assert_eq!(created["patient_no"], "2024-0003");
    assert_eq!(created["is_active"], true);
    assert!(created["created_at"].is_string());

    let resp = client
        .get(format!("{base}/api/patients/3"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(json_of(resp).await["data"], created);

    let resp = client
        .get(format!("{base}/api/patients?search=cruz"))
        .send()
        .await
        .unwrap();
    let body = json_of(resp).await;
    assert_eq!(body["pagination"]["total"], 2);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn list_pagination_and_filters() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/api/medicines?page=1&limit=2"))
        .send()
        .await
        .unwrap();
    let body = json_of(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["pagination"],
        json!({"page": 1, "limit": 2, "total": 4, "totalPages": 2})
    );

    // Out-of-range pages are empty, not errors
    let resp = client
        .get(format!("{base}/api/medicines?page=9&limit=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = json_of(resp).await;
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["total"], 4);

    let resp = client
        .get(format!("{base}/api/medicines?low_stock=true"))
        .send()
        .await
        .unwrap();
    let body = json_of(resp).await;
    let items = body["data"].as_array().unwrap();
    assert!(!items.is_empty());
    for item in items {
        assert!(item["quantity"].as_f64().unwrap() <= item["reorder_threshold"].as_f64().unwrap());
    }
    assert_eq!(body["pagination"]["total"], items.len());

    // Filters compose with AND
    let resp = client
        .get(format!("{base}/api/medicines?low_stock=true&category=antibiotic"))
        .send()
        .await
        .unwrap();
    let body = json_of(resp).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["generic_name"], "Amoxicillin");

    let resp = client
        .get(format!("{base}/api/medicines?expiring=true&days=30"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(resp).await["pagination"]["total"], 2);

    let resp = client
        .get(format!("{base}/api/equipment?status=maintenance"))
        .send()
        .await
        .unwrap();
    let body = json_of(resp).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["code"], "EQP002");

    let resp = client
        .get(format!("{base}/api/admin-users?role=doctor"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(resp).await["data"][0]["email"], "doctor@clinic.com");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn stock_archive_and_update() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .patch(format!("{base}/api/medicines/1/stock"))
        .json(&json!({"quantity": 7}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = json_of(resp).await;
    assert_eq!(body["data"]["quantity"], 7);
    assert_eq!(body["message"], "Stock updated successfully");

    for _ in 0..2 {
        let resp = client
            .patch(format!("{base}/api/supplies/2/archive"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(json_of(resp).await["data"]["is_active"], false);
    }

    let resp = client
        .get(format!("{base}/api/supplies?is_active=false"))
        .send()
        .await
        .unwrap();
    let body = json_of(resp).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["id"], "2");

    // Unknown fields are dropped, store fields cannot be overwritten
    let resp = client
        .put(format!("{base}/api/equipment/1"))
        .json(&json!({"status": "retired", "id": "77", "hacked": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = json_of(resp).await;
    assert_eq!(body["message"], "Equipment updated successfully");
    let record = &body["data"];
    assert_eq!(record["id"], "1");
    assert_eq!(record["status"], "retired");
    assert_eq!(record["code"], "EQP001");
    assert_eq!(record["name"], "Digital BP Monitor");
    assert!(record.get("hacked").is_none());

    let resp = client
        .patch(format!("{base}/api/medicines/404/stock"))
        .json(&json!({"quantity": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn toggle_and_delete_admin_users() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .patch(format!("{base}/api/equipment/3/toggle-active"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(resp).await["data"]["is_active"], false);
    let resp = client
        .patch(format!("{base}/api/equipment/3/toggle-active"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(resp).await["data"]["is_active"], true);

    let resp = client
        .delete(format!("{base}/api/admin-users/3"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        json_of(resp).await["message"],
        "Admin user deleted successfully"
    );

    let resp = client
        .delete(format!("{base}/api/admin-users/3"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(json_of(resp).await["error"], "Admin user not found");

    let resp = client
        .post(format!("{base}/api/admin-users"))
        .json(&json!({"name": "New Nurse", "email": "nurse2@clinic.com", "role": "nurse"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    assert_eq!(json_of(resp).await["data"]["id"], "4");

    // Newest admin users come first
    let resp = client
        .get(format!("{base}/api/admin-users"))
        .send()
        .await
        .unwrap();
    let body = json_of(resp).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["4", "2", "1"]);

    // Other kinds have no delete route
    let resp = client
        .delete(format!("{base}/api/patients/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn logs_consultations_and_dashboard() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/logs"))
        .json(&json!({"user": "admin@clinic.com", "action": "export", "resource_type": "report"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let log = json_of(resp).await["data"].clone();
    assert!(log["timestamp"].is_string());
    assert!(log.get("is_active").is_none());

    let resp = client.get(format!("{base}/api/logs")).send().await.unwrap();
    let body = json_of(resp).await;
    assert_eq!(body["data"][0]["id"], log["id"]);
    assert_eq!(body["pagination"]["total"], 4);

    let resp = client
        .get(format!("{base}/api/logs?user=NURSE"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(resp).await["pagination"]["total"], 1);

    let year = time::OffsetDateTime::now_utc().year();
    let resp = client
        .post(format!("{base}/api/consultations"))
        .json(&json!({"patient_id": 1, "physician": "Dr. Reyes", "status": "scheduled"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let consultation = json_of(resp).await["data"].clone();
    assert_eq!(consultation["consultation_no"], format!("CONS-{year}-0003"));
    assert_eq!(consultation["patient_id"], 1);

    // Numeric and string patient ids match the same filter
    let resp = client
        .get(format!("{base}/api/consultations?patient_id=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(resp).await["pagination"]["total"], 2);

    let resp = client
        .get(format!("{base}/api/dashboard/metrics"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let data = json_of(resp).await["data"].clone();
    assert_eq!(data["counts"]["patients"], 2);
    assert_eq!(data["counts"]["consultations"], 3);
    assert_eq!(data["counts"]["admin_users"], 3);
    assert_eq!(data["counts"]["low_stock_medicines"], 2);
    assert_eq!(data["monthly_consultations"].as_array().unwrap().len(), 6);
    let recent = data["recent_activity"].as_array().unwrap();
    assert_eq!(recent.len(), 4);
    assert_eq!(recent[0]["action"], "export");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn auth_stub() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({"email": "admin@clinic.com", "password": "password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = json_of(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], "admin@clinic.com");
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());

    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({"email": "admin@clinic.com", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(
        json_of(resp).await,
        json!({"success": false, "error": "Invalid credentials"})
    );

    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({"email": "intruder@clinic.com", "password": "password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(format!("{base}/api/auth/register"))
        .json(&json!({"email": "new@clinic.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 501);
    assert_eq!(json_of(resp).await["error"], "Registration is not implemented");

    let resp = client
        .get(format!("{base}/api/auth/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(json_of(resp).await["data"]["role"], "admin");

    let resp = client
        .get(format!("{base}/api/auth/profile"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    // Wrong JSON type for a numeric field
    let resp = client
        .post(format!("{base}/api/medicines"))
        .json(&json!({"name": "Bad", "quantity": "many"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body = json_of(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

    // Syntax error
    let resp = client
        .post(format!("{base}/api/supplies"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Missing content type
    let resp = client
        .post(format!("{base}/api/patients"))
        .body(r#"{"first_name": "Ana"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Stock updates need a numeric quantity
    let resp = client
        .patch(format!("{base}/api/supplies/1/stock"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Expiry dates must be real calendar dates, on create and on update
    let resp = client
        .post(format!("{base}/api/medicines"))
        .json(&json!({"name": "Odd", "expiry_date": "2024-13-45"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(
        json_of(resp).await["error"],
        "expiry_date must be a valid date (YYYY-MM-DD)"
    );
    let resp = client
        .put(format!("{base}/api/supplies/1"))
        .json(&json!({"expiry_date": "next spring"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Log timestamps must be RFC 3339
    let resp = client
        .post(format!("{base}/api/logs"))
        .json(&json!({"action": "login", "timestamp": "yesterday"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(
        json_of(resp).await["error"]
            .as_str()
            .is_some_and(|e| e.contains("RFC 3339"))
    );

    // Nothing was stored by the rejected requests
    let resp = client
        .get(format!("{base}/api/logs"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(resp).await["pagination"]["total"], 3);
    let resp = client
        .get(format!("{base}/api/medicines"))
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(resp).await["pagination"]["total"], 4);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let mut cfg = AppConfig::default();
    cfg.server.body_limit_bytes = 256;
    let (base, shutdown_tx, handle) = start_server_with(cfg).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/patients"))
        .json(&json!({"first_name": "A".repeat(1024)}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    assert_eq!(
        json_of(resp).await,
        json!({"success": false, "error": "Request body too large"})
    );

    let resp = client
        .post(format!("{base}/api/patients"))
        .json(&json!({"first_name": "Ana"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn logs_sort_by_instant_and_expiry_windows_saturate() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    for (action, ts) in [
        ("whole", "2030-01-01T10:00:00Z"),
        ("frac", "2030-01-01T10:00:00.5Z"),
        ("offset", "2030-01-01T12:00:00+05:00"),
    ] {
        let resp = client
            .post(format!("{base}/api/logs"))
            .json(&json!({"action": action, "timestamp": ts}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }
    let resp = client
        .get(format!("{base}/api/logs?limit=3"))
        .send()
        .await
        .unwrap();
    let body = json_of(resp).await;
    let actions: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|log| log["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, ["frac", "whole", "offset"]);
    assert_eq!(body["data"][2]["timestamp"], "2030-01-01T07:00:00.000000Z");

    // Every seeded medicine expires well inside the widest window
    let resp = client
        .get(format!("{base}/api/medicines?expiring=true&days=4000000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(json_of(resp).await["pagination"]["total"], 4);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
