#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use workforce_api::ai::{AiError, CompletionClient, CompletionOptions, TokenStream};
use workforce_api::config::AppConfig;
use workforce_api::state::AppState;
use workforce_api::storage::LocalObjectStore;
use workforce_api::store::MemoryDocumentStore;

/// Stand-in completion client that replays a fixed reply and counts calls.
#[derive(Default)]
pub struct ScriptedAi {
    pub configured: bool,
    pub reply: String,
    pub tokens: Vec<String>,
    pub fail_stream_after: Option<usize>,
    pub refuse_stream: bool,
    pub calls: AtomicUsize,
}

impl ScriptedAi {
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn replying(reply: &str) -> Self {
        Self {
            configured: true,
            reply: reply.to_string(),
            ..Self::default()
        }
    }

    pub fn streaming(tokens: &[&str]) -> Self {
        Self {
            configured: true,
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedAi {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    async fn stream(&self, _prompt: &str, _options: &CompletionOptions) -> Result<TokenStream, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.refuse_stream {
            return Err(AiError::Upstream("503 Service Unavailable".to_string()));
        }
        let mut items: Vec<Result<String, AiError>> = self.tokens.iter().cloned().map(Ok).collect();
        if let Some(after) = self.fail_stream_after {
            items.truncate(after);
            items.push(Err(AiError::Transport("connection reset".to_string())));
        }
        Ok(stream::iter(items).boxed())
    }
}

/// A signed-in account: its bearer token and id.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub id: String,
    pub email: String,
}

/// In-process server on a free port, backed by the memory store and a
/// scratch upload directory.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub ai: Arc<ScriptedAi>,
    pub upload_dir: std::path::PathBuf,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(ScriptedAi::unconfigured(), |_| {}).await
    }

    pub async fn with_ai(ai: ScriptedAi) -> Result<Self> {
        Self::start_with(ai, |_| {}).await
    }

    pub async fn start_with(ai: ScriptedAi, configure: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        init_tracing();
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let upload_dir = std::env::temp_dir().join(format!("workforce-api-test-{}", uuid::Uuid::new_v4()));

        let mut config = AppConfig::development();
        config.api.port = port;
        config.api.enable_request_logging = false;
        config.security.bcrypt_cost = 4;
        config.storage.upload_dir = upload_dir.clone();
        configure(&mut config);

        let ai = Arc::new(ai);
        let objects = LocalObjectStore::new(&config.storage);
        let state = AppState::new(
            config,
            Arc::new(MemoryDocumentStore::new()),
            ai.clone(),
            Arc::new(objects),
        );

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let app = workforce_api::app(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            ai,
            upload_dir,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    pub fn ai_calls(&self) -> usize {
        self.ai.calls.load(Ordering::SeqCst)
    }

    pub async fn register(&self, body: Value) -> Result<Session> {
        let res = self.client.post(self.url("/auth/register")).json(&body).send().await?;
        let status = res.status();
        let payload: Value = res.json().await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed ({}): {}", status, payload);

        Ok(Session {
            token: payload["data"]["token"].as_str().context("missing token")?.to_string(),
            id: payload["data"]["account"]["id"].as_str().context("missing id")?.to_string(),
            email: payload["data"]["account"]["email"].as_str().context("missing email")?.to_string(),
        })
    }

    pub async fn admin(&self) -> Result<Session> {
        self.register(json!({
            "firstName": "Root",
            "lastName": "Admin",
            "email": unique_email("admin"),
            "password": "secret123",
            "role": "Admin",
        }))
        .await
    }

    /// Registers an Employee-role account in `category`.
    pub async fn employee(&self, category: &str) -> Result<Session> {
        self.register(employee_body(category)).await
    }

    /// Makes `member_ids` the team of `manager_id` (Admin only).
    pub async fn assign_team(&self, admin: &Session, manager_id: &str, member_ids: &[&str]) -> Result<()> {
        let res = self
            .client
            .put(self.url(&format!("/employees/{}", manager_id)))
            .bearer_auth(&admin.token)
            .json(&json!({ "team": member_ids }))
            .send()
            .await?;
        let status = res.status();
        anyhow::ensure!(status == StatusCode::OK, "team update failed ({}): {}", status, res.text().await?);
        Ok(())
    }
}

/// Routes server logs through the test harness; `RUST_LOG` picks the level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, &uuid::Uuid::new_v4().simple().to_string()[..12])
}

pub fn employee_body(category: &str) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": category,
        "email": unique_email(&category.to_lowercase()),
        "password": "secret123",
        "category": category,
        "phone": "555-0100",
        "department": "Engineering",
        "salary": 60000,
        "hireDate": "2022-01-10",
    })
}
