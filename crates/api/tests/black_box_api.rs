use std::sync::Arc;
use std::time::Duration;

use adminhub_api::app::services::{AppServices, build_services};
use adminhub_auth::{TokenStore, hash_password};
use adminhub_core::UserId;
use adminhub_directory::{NewUser, User};
use adminhub_events::{DispatchMode, EventDispatcher, ListenerRegistry};
use adminhub_infra::{AppConfig, InMemoryModelStore, ModelLifecycle, ModelPropagator, RevokeCredentials};
use reqwest::StatusCode;
use serde_json::{Value, json};

const PASSWORD: &str = "correct horse battery";

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(build_services).await
    }

    async fn spawn_with(build: impl FnOnce(AppConfig) -> AppServices) -> Self {
        // Bind first so verification links in outgoing mail point at this server.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let config = AppConfig {
            app_url: base_url.clone(),
            app_key: "test-app-key".to_string(),
            ..AppConfig::default()
        };
        let services = Arc::new(build(config));
        let app = adminhub_api::app::build_app_with_services(services.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client.delete(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    async fn register(&self, username: &str) -> (Value, String) {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "username": username,
                "name": username,
                "email": format!("{username}@example.com"),
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        let token = body["token"].as_str().unwrap().to_string();
        (body, token)
    }

    /// The verification link from the most recent welcome mail sent to `email`.
    ///
    /// Waits briefly, since queued dispatch sends mail from a worker thread.
    async fn verification_link(&self, email: &str) -> String {
        let mut mail = None;
        for _ in 0..100 {
            mail = self.services.outbox.mails().into_iter().rev().find(|m| m.to == email);
            if mail.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let mail = mail.expect("no welcome mail sent");
        mail.body
            .split_whitespace()
            .last()
            .expect("mail has no link")
            .to_string()
    }

    /// Register and verify an account, returning its token.
    async fn verified_account(&self, username: &str) -> String {
        let (_, token) = self.register(username).await;
        let link = self.verification_link(&format!("{username}@example.com")).await;
        let res = self.client.get(link).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        token
    }

    async fn login(&self, login: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "login": login, "password": PASSWORD }))
            .send()
            .await
            .unwrap()
    }

    async fn login_token(&self, login: &str) -> String {
        let res = self.login(login).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn protected_endpoints_require_a_token() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(format!("{}/health", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Unauthenticated." }));

    for bogus in ["garbage", "not-a-uuid|secret", "0190a0a0-0000-7000-8000-000000000000|secret"] {
        let res = srv.get("/auth/me", bogus).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "token {bogus}");
    }
}

#[tokio::test]
async fn registration_is_gated_until_email_is_verified() {
    let srv = TestServer::spawn().await;

    let (body, token) = srv.register("ada").await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["username"], "ada");
    assert!(body["user"].get("password_hash").is_none());

    let res = srv.get("/auth/me", &token).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let denial: Value = res.json().await.unwrap();
    assert_eq!(denial["error"], "email_not_verified");
    assert_eq!(denial["message"], "Your email address is not verified.");

    // Logout only needs authentication.
    let spare = srv.login_token("ada").await;
    let res = srv.post("/auth/logout", &spare, json!({})).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let user_id = body["user"]["id"].as_str().unwrap();
    let res = srv
        .client
        .get(srv.url(&format!("/auth/email/verify/{user_id}/forged")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_signature");

    let link = srv.verification_link("ada@example.com").await;
    let res = srv.client.get(link).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.get("/auth/me", &token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await.unwrap();
    assert_eq!(me["username"], "ada");
    assert!(me["email_verified_at"].is_string());
}

#[tokio::test]
async fn soft_delete_revokes_tokens_and_restore_is_single_shot() {
    let srv = TestServer::spawn().await;
    let admin = srv.verified_account("root").await;

    let res = srv
        .post(
            "/users",
            &admin,
            json!({
                "username": "bob",
                "name": "Bob",
                "email": "bob@example.com",
                "password": PASSWORD,
                "email_verified": true,
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let bob: Value = res.json().await.unwrap();
    let bob_id: UserId = bob["id"].as_str().unwrap().parse().unwrap();

    let first = srv.login_token("bob").await;
    let second = srv.login_token("bob@example.com").await;
    assert_eq!(srv.get("/auth/me", &first).await.status(), StatusCode::OK);
    assert_eq!(srv.services.tokens.count_for(bob_id).unwrap(), 2);

    let res = srv.delete("/users/bob", &admin).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    assert_eq!(srv.services.tokens.count_for(bob_id).unwrap(), 0);
    for token in [&first, &second] {
        assert_eq!(srv.get("/auth/me", token).await.status(), StatusCode::UNAUTHORIZED);
    }
    let deletions = srv
        .services
        .audit
        .for_key("user", "bob")
        .into_iter()
        .filter(|e| e.event_type == "user.deleted")
        .count();
    assert_eq!(deletions, 1);

    let live: Value = srv.get("/users", &admin).await.json().await.unwrap();
    assert!(live["items"].as_array().unwrap().iter().all(|u| u["username"] != "bob"));
    let trashed: Value = srv.get("/users?trashed=only", &admin).await.json().await.unwrap();
    assert_eq!(trashed["items"].as_array().unwrap().len(), 1);

    // A deleted account cannot obtain a fresh credential.
    for login in ["bob", "bob@example.com"] {
        let res = srv.login(login).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["error"], "invalid_credentials");
    }
    assert_eq!(srv.services.tokens.count_for(bob_id).unwrap(), 0);

    let res = srv.post("/users/bob/restore", &admin, json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    for token in [&first, &second] {
        assert_eq!(srv.get("/auth/me", token).await.status(), StatusCode::UNAUTHORIZED);
    }
    let late = srv.login_token("bob").await;
    assert_eq!(srv.get("/auth/me", &late).await.status(), StatusCode::OK);

    let res = srv.post("/users/bob/restore", &admin, json!({})).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "conflict");

    let res = srv.delete("/users/bob/force", &admin).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(srv.get("/users/bob", &admin).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(srv.get("/auth/me", &late).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn companies_are_addressed_by_slug_and_statistics_are_not_shadowed() {
    let srv = TestServer::spawn().await;
    let admin = srv.verified_account("root").await;

    let res = srv.post("/companies", &admin, json!({ "name": "Acme Corp" })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let acme: Value = res.json().await.unwrap();
    assert_eq!(acme["slug"], "acme-corp");

    let res = srv.post("/companies", &admin, json!({ "name": "Acme Corp" })).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv
        .post(
            "/users",
            &admin,
            json!({
                "username": "carol",
                "name": "Carol",
                "email": "carol@example.com",
                "password": PASSWORD,
                "company": "acme-corp",
                "email_verified": true,
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let members: Value = srv.get("/users?company=acme-corp", &admin).await.json().await.unwrap();
    let members = members["items"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["username"], "carol");

    let res = srv.get("/companies/statistics", &admin).await;
    assert_eq!(res.status(), StatusCode::OK);
    let stats: Value = res.json().await.unwrap();
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["with_active_users"], 1);

    let res = srv.get("/users/statistics", &admin).await;
    assert_eq!(res.status(), StatusCode::OK);
    let stats: Value = res.json().await.unwrap();
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["verified"], 2);

    let res = srv
        .client
        .patch(srv.url("/companies/acme-corp"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Acme Corporation" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let renamed: Value = res.json().await.unwrap();
    assert_eq!(renamed["name"], "Acme Corporation");
    assert_eq!(renamed["slug"], "acme-corp");

    let res = srv
        .post("/companies", &admin, json!({ "name": "Reserved", "slug": "statistics" }))
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(srv.delete("/companies/acme-corp", &admin).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(srv.get("/companies/acme-corp", &admin).await.status(), StatusCode::OK);
    assert_eq!(srv.delete("/companies/acme-corp/force", &admin).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(srv.get("/companies/acme-corp", &admin).await.status(), StatusCode::NOT_FOUND);

    let carol: Value = srv.get("/users/carol", &admin).await.json().await.unwrap();
    assert!(carol["company_id"].is_null());
}

#[tokio::test]
async fn new_accounts_notify_verified_administrators() {
    let srv = TestServer::spawn().await;
    let token = srv.verified_account("root").await;

    let res = srv
        .post(
            "/users",
            &token,
            json!({
                "username": "admin",
                "name": "Admin",
                "email": "admin@example.com",
                "password": PASSWORD,
                "is_admin": true,
                "email_verified": true,
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let admin: Value = res.json().await.unwrap();

    srv.register("dave").await;

    let notifications = srv.services.outbox.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].recipient.to_string(), admin["id"].as_str().unwrap());
    assert_eq!(notifications[0].subject, "New user created");
}

fn audit_types(srv: &TestServer, key: &str) -> Vec<String> {
    srv.services
        .audit
        .for_key("user", key)
        .into_iter()
        .map(|e| e.event_type)
        .collect()
}

#[tokio::test]
async fn queued_dispatch_still_records_deletion_before_responding() {
    let srv = TestServer::spawn_with(|config| {
        build_services(AppConfig {
            dispatch_mode: DispatchMode::Queued,
            ..config
        })
    })
    .await;
    assert_eq!(srv.services.users.dispatcher().mode(), DispatchMode::Queued);
    let admin = srv.verified_account("root").await;

    let res = srv
        .post(
            "/users",
            &admin,
            json!({
                "username": "erin",
                "name": "Erin",
                "email": "erin@example.com",
                "password": PASSWORD,
                "email_verified": true,
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let token = srv.login_token("erin").await;

    assert_eq!(srv.delete("/users/erin", &admin).await.status(), StatusCode::NO_CONTENT);

    assert!(audit_types(&srv, "erin").contains(&"user.deleted".to_string()));
    assert_eq!(srv.get("/auth/me", &token).await.status(), StatusCode::UNAUTHORIZED);

    let mut created = false;
    for _ in 0..100 {
        created = audit_types(&srv, "erin").contains(&"user.created".to_string());
        if created {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(created, "created event never reached the audit log");
}

struct OfflineTokenTable;

impl RevokeCredentials<User> for OfflineTokenTable {
    fn revoke_all(&self, _user: &User) -> anyhow::Result<usize> {
        anyhow::bail!("token table offline")
    }
}

/// Services whose user lifecycle cannot revoke credentials, seeded with a
/// verified admin `root` and a member `bob`.
fn services_with_offline_revocation(config: AppConfig) -> AppServices {
    let base = build_services(config);
    let users = ModelLifecycle::<User>::new(
        Arc::new(InMemoryModelStore::<User>::new()),
        Arc::new(ModelPropagator::<User>::with_revoker(Arc::new(OfflineTokenTable))),
        EventDispatcher::sync(ListenerRegistry::<User>::new()),
    );
    for (username, is_admin) in [("root", true), ("bob", false)] {
        let user = User::create(
            NewUser {
                username: username.to_string(),
                name: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: hash_password(PASSWORD).unwrap(),
                company_id: None,
                is_admin,
                email_verified: true,
            },
            chrono::Utc::now(),
        )
        .unwrap();
        users.create(user).unwrap();
    }
    AppServices { users, ..base }
}

#[tokio::test]
async fn failed_credential_revocation_keeps_the_account() {
    let srv = TestServer::spawn_with(services_with_offline_revocation).await;
    let admin = srv.login_token("root").await;
    let bob_token = srv.login_token("bob").await;

    let res = srv.delete("/users/bob", &admin).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "credential_revocation_failed");
    assert!(err["message"].as_str().unwrap().contains("token table offline"));

    let bob: Value = srv.get("/users/bob", &admin).await.json().await.unwrap();
    assert!(bob["deleted_at"].is_null());
    assert_eq!(srv.get("/auth/me", &bob_token).await.status(), StatusCode::OK);
}
