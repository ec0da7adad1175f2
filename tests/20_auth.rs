mod common;

use anyhow::Result;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{header::SET_COOKIE, StatusCode};
use serde_json::{json, Value};

use common::{employee_body, ScriptedAi, TestServer};
use workforce_api::auth::Claims;

#[tokio::test]
async fn register_returns_token_and_hides_password() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .post(server.url("/auth/register"))
        .json(&employee_body("Staff"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let cookie = res.headers().get(SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(cookie.starts_with("token="), "cookie: {}", cookie);
    assert!(cookie.contains("HttpOnly"));

    let body = res.json::<Value>().await?;
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["data"]["expiresIn"].as_u64().is_some());
    assert!(body["data"]["account"].get("password").is_none());
    assert_eq!(body["data"]["account"]["role"], "Employee");
    assert_eq!(body["data"]["account"]["hireDate"], "2022-01-10T00:00:00.000Z");
    assert_eq!(body["data"]["account"]["profilePicture"], "/default-avatar.png");

    Ok(())
}

#[tokio::test]
async fn register_reports_every_missing_field() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "email": "not-an-email", "password": "123" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .map(|f| f.iter().filter_map(|e| e["field"].as_str()).collect())
        .unwrap_or_default();
    for expected in ["password", "firstName", "lastName", "email", "category", "phone", "salary", "hireDate"] {
        assert!(fields.contains(&expected), "missing {} in {:?}", expected, fields);
    }

    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_rejected() -> Result<()> {
    let server = TestServer::start().await?;
    let mut body = employee_body("Staff");
    server.register(body.clone()).await?;

    body["email"] = json!(body["email"].as_str().unwrap_or_default().to_uppercase());
    let res = server.client.post(server.url("/auth/register")).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let payload = res.json::<Value>().await?;
    assert_eq!(payload["fields"][0]["field"], "email");

    Ok(())
}

#[tokio::test]
async fn admin_self_registration_can_be_disabled() -> Result<()> {
    let server = TestServer::start_with(ScriptedAi::unconfigured(), |config| {
        config.security.allow_admin_registration = false;
    })
    .await?;

    let res = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({
            "firstName": "Eve",
            "lastName": "Root",
            "email": "eve@example.com",
            "password": "secret123",
            "role": "Admin",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn bad_credentials_look_the_same() -> Result<()> {
    let server = TestServer::start().await?;
    let session = server.employee("Staff").await?;

    let wrong_password = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": session.email, "password": "wrong-password" }))
        .send()
        .await?;
    let unknown_email = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "nobody@example.com", "password": "wrong-password" }))
        .send()
        .await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.text().await?, unknown_email.text().await?);

    Ok(())
}

#[tokio::test]
async fn login_then_me() -> Result<()> {
    let server = TestServer::start().await?;
    let session = server.employee("Supervisor").await?;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .form(&[("email", session.email.to_uppercase()), ("password", "secret123".to_string())])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(SET_COOKIE).is_some());
    let body = res.json::<Value>().await?;
    let token = body["data"]["token"].as_str().unwrap_or_default().to_string();

    let res = server.client.get(server.url("/auth/me")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let me = res.json::<Value>().await?;
    assert_eq!(me["data"]["id"], session.id.as_str());
    assert_eq!(me["data"]["category"], "Supervisor");
    assert!(me["data"].get("password").is_none());

    Ok(())
}

#[tokio::test]
async fn login_requires_both_fields() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "someone@example.com" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn expired_or_malformed_tokens_are_refused() -> Result<()> {
    let server = TestServer::start().await?;
    let session = server.employee("Staff").await?;

    let now = chrono::Utc::now().timestamp();
    let expired = encode(
        &Header::default(),
        &Claims { id: session.id.clone(), iat: now - 120, exp: now - 60 },
        &EncodingKey::from_secret(b"development-only-secret"),
    )?;

    for auth in [
        format!("Bearer {}", expired),
        "Bearer not-a-jwt".to_string(),
        format!("Token {}", session.token),
    ] {
        let res = server
            .client
            .get(server.url("/auth/me"))
            .header("Authorization", auth.as_str())
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", auth);
        let body = res.json::<Value>().await?;
        assert_eq!(body["error"], "Not authorized to access this route");
    }

    Ok(())
}

#[tokio::test]
async fn logout_clears_the_cookie() -> Result<()> {
    let server = TestServer::start().await?;
    let session = server.employee("Staff").await?;

    let res = server.client.get(server.url("/auth/logout")).bearer_auth(&session.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res.headers().get(SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(cookie.contains("Max-Age=0"));
    let body = res.json::<Value>().await?;
    assert_eq!(body, json!({ "success": true, "data": {} }));

    Ok(())
}
