//! Router tests against an in-memory SQLite store.

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use camley_core::{
  account::{NewAccount, Role},
  store::AccountStore,
};
use camley_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, api_router, auth::hash_password};

const ADMIN: (&str, &str) = ("admin@camley.test", "admin-pass");

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store
    .ensure_admin(NewAccount {
      name:          "Admin".into(),
      email:         ADMIN.0.into(),
      password_hash: hash_password(ADMIN.1).unwrap(),
      phone:         None,
      address:       None,
      gender:        Some("F".into()),
      role:          Role::Admin,
      active:        None,
    })
    .await
    .unwrap();
  api_router(AppState::new(store))
}

fn basic((user, pass): (&str, &str)) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

async fn send(
  app: &Router,
  method: Method,
  uri: &str,
  auth: Option<(&str, &str)>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  if let Some(creds) = auth {
    req = req.header(header::AUTHORIZATION, basic(creds));
  }
  let req = match body {
    Some(body) => req
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => req.body(Body::empty()).unwrap(),
  };
  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

fn id(value: &Value) -> String { value["account_id"].as_str().unwrap().to_owned() }

/// Register a parent and have the administrator approve it.
async fn approved_parent(app: &Router, email: &'static str) -> (String, (&'static str, &'static str)) {
  let (status, account) = send(
    app,
    Method::POST,
    "/accounts/register",
    None,
    Some(json!({ "name": "Marta", "email": email, "password": "pw", "gender": "F" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let account_id = id(&account);
  let (status, _) = send(
    app,
    Method::POST,
    &format!("/accounts/{account_id}/active"),
    Some(ADMIN),
    Some(json!({ "active": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  (account_id, (email, "pw"))
}

fn student(name: &str, parent_id: &str, route_id: Option<&str>) -> Value {
  json!({
    "name": name,
    "gender": "M",
    "grade": "3",
    "school": "Colegio Central",
    "parent_id": parent_id,
    "route_id": route_id,
  })
}

// ─── Authentication ───────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_credentials_are_challenged() {
  let app = app().await;
  let req = Request::builder().uri("/dashboard").body(Body::empty()).unwrap();
  let res = app.clone().oneshot(req).await.unwrap();
  assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
  let app = app().await;
  let (status, body) =
    send(&app, Method::GET, "/dashboard", Some((ADMIN.0, "nope")), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["kind"], "unauthenticated");
}

#[tokio::test]
async fn login_email_is_case_insensitive() {
  let app = app().await;
  let (status, _) =
    send(&app, Method::GET, "/dashboard", Some(("ADMIN@Camley.test", ADMIN.1)), None).await;
  assert_eq!(status, StatusCode::OK);
}

// ─── Accounts ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn self_registered_parent_waits_for_approval() {
  let app = app().await;
  let creds = ("rosa@parents.test", "pw");
  let (status, account) = send(
    &app,
    Method::POST,
    "/accounts/register",
    None,
    Some(json!({ "name": "Rosa", "email": creds.0, "password": creds.1, "gender": "F" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(account["role"], "parent");
  assert_eq!(account["active"], false);
  assert!(account.get("password_hash").is_none());

  let (status, body) = send(&app, Method::GET, "/accounts/me", Some(creds), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["kind"], "inactive");

  let (status, _) = send(
    &app,
    Method::POST,
    &format!("/accounts/{}/active", id(&account)),
    Some(ADMIN),
    Some(json!({ "active": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, me) = send(&app, Method::GET, "/accounts/me", Some(creds), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["email"], creds.0);
}

#[tokio::test]
async fn administrators_cannot_be_registered() {
  let app = app().await;
  let (status, body) = send(
    &app,
    Method::POST,
    "/accounts/register",
    None,
    Some(json!({
      "name": "Mallory", "email": "m@x.test", "password": "pw", "gender": "M", "role": "admin"
    })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["kind"], "forbidden");
}

#[tokio::test]
async fn duplicate_email_conflicts() {
  let app = app().await;
  let body = json!({ "name": "Ana", "email": "ana@parents.test", "password": "pw", "gender": "F" });
  let (first, _) = send(&app, Method::POST, "/accounts/register", None, Some(body.clone())).await;
  let (second, err) = send(&app, Method::POST, "/accounts/register", None, Some(body)).await;
  assert_eq!(first, StatusCode::CREATED);
  assert_eq!(second, StatusCode::CONFLICT);
  assert_eq!(err["kind"], "conflict");
}

// ─── Enrollment and billing ───────────────────────────────────────────────────

#[tokio::test]
async fn enrollment_opens_the_first_billing_cycle() {
  let app = app().await;
  let (parent_id, parent) = approved_parent(&app, "marta@parents.test").await;

  let (status, enrollment) =
    send(&app, Method::POST, "/students", Some(ADMIN), Some(student("Luis", &parent_id, None)))
      .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(enrollment["first_payment"]["amount"], "50.00");
  assert_eq!(enrollment["first_payment"]["status"], "pending");

  let (status, _) =
    send(&app, Method::POST, "/students", Some(ADMIN), Some(student("Luis", &parent_id, None)))
      .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, body) =
    send(&app, Method::POST, "/students", Some(parent), Some(student("Eva", &parent_id, None)))
      .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["kind"], "forbidden");

  let (status, notes) = send(&app, Method::GET, "/notifications", Some(parent), None).await;
  assert_eq!(status, StatusCode::OK);
  // Approval first, then the enrollment notice.
  assert_eq!(notes.as_array().unwrap().len(), 2);
  assert_eq!(notes[0]["kind"], "student");
  assert_eq!(notes[1]["kind"], "system");
}

#[tokio::test]
async fn marking_paid_twice_records_one_income() {
  let app = app().await;
  let (parent_id, _) = approved_parent(&app, "marta@parents.test").await;
  let (_, enrollment) =
    send(&app, Method::POST, "/students", Some(ADMIN), Some(student("Luis", &parent_id, None)))
      .await;
  let payment_id = enrollment["first_payment"]["payment_id"].as_str().unwrap();
  let uri = format!("/payments/{payment_id}/paid");

  let (status, paid) =
    send(&app, Method::POST, &uri, Some(ADMIN), Some(json!({ "method": "transfer" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(paid["status"], "paid");
  assert_eq!(paid["method"], "transfer");

  let (status, again) = send(&app, Method::POST, &uri, Some(ADMIN), Some(json!({}))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(again["paid_at"], paid["paid_at"]);

  let (_, summary) = send(&app, Method::GET, "/finance/summary", Some(ADMIN), None).await;
  assert_eq!(summary["recent_income"].as_array().unwrap().len(), 1);
  assert_eq!(summary["total_income"], "50.00");
}

#[tokio::test]
async fn parents_only_list_their_own_payments() {
  let app = app().await;
  let (marta_id, marta) = approved_parent(&app, "marta@parents.test").await;
  let (pedro_id, _) = approved_parent(&app, "pedro@parents.test").await;
  send(&app, Method::POST, "/students", Some(ADMIN), Some(student("Luis", &marta_id, None))).await;
  send(&app, Method::POST, "/students", Some(ADMIN), Some(student("Eva", &pedro_id, None))).await;

  let (_, all) = send(&app, Method::GET, "/payments", Some(ADMIN), None).await;
  assert_eq!(all.as_array().unwrap().len(), 2);

  let (status, own) = send(&app, Method::GET, "/payments?status=pending", Some(marta), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(own.as_array().unwrap().len(), 1);

  let (status, purged) =
    send(&app, Method::POST, "/payments/purge-overdue", Some(marta), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(purged["kind"], "forbidden");
}

// ─── Attendance ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn attendance_is_taken_once_per_day() {
  let app = app().await;
  let (parent_id, parent) = approved_parent(&app, "marta@parents.test").await;
  let driver = ("jose@drivers.test", "pw");
  let (status, driver_account) = send(
    &app,
    Method::POST,
    "/accounts/register",
    Some(ADMIN),
    Some(json!({
      "name": "José", "email": driver.0, "password": driver.1, "gender": "M",
      "role": "driver", "active": true
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(driver_account["role"], "driver");

  let (status, route) = send(
    &app,
    Method::POST,
    "/routes",
    Some(ADMIN),
    Some(json!({
      "name": "Norte", "starts_at": "06:30", "ends_at": "07:45",
      "driver_id": id(&driver_account)
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let route_id = route["route_id"].as_str().unwrap();

  let (_, enrollment) = send(
    &app,
    Method::POST,
    "/students",
    Some(ADMIN),
    Some(student("Luis", &parent_id, Some(route_id))),
  )
  .await;
  let student_id = enrollment["student"]["student_id"].as_str().unwrap();
  let mark = json!({ "student_id": student_id, "status": "present" });

  let (status, _) =
    send(&app, Method::POST, "/attendance", Some(parent), Some(mark.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, record) =
    send(&app, Method::POST, "/attendance", Some(driver), Some(mark.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(record["status"], "present");

  let (status, body) = send(&app, Method::POST, "/attendance", Some(driver), Some(mark)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["kind"], "conflict");
}

// ─── Error envelope ───────────────────────────────────────────────────────────

#[tokio::test]
async fn validation_and_missing_resources() {
  let app = app().await;
  let (status, body) = send(
    &app,
    Method::POST,
    "/routes",
    Some(ADMIN),
    Some(json!({ "name": "Sur", "starts_at": "08:00", "ends_at": "07:00" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["kind"], "validation");

  let missing = uuid::Uuid::new_v4();
  let (status, body) =
    send(&app, Method::GET, &format!("/students/{missing}"), Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["kind"], "not_found");
}
