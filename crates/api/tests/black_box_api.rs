use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use ledgerbank_auth::AccountClaims;
use ledgerbank_core::AccountNumber;
use ledgerbank_infra::LedgerConfig;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let config = LedgerConfig {
            jwt_secret: JWT_SECRET.to_string(),
            ..LedgerConfig::default()
        };
        let app = ledgerbank_api::app::build_app(&config).await.unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(&body).send().await.unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// Returns `(account json, token)`.
    async fn open_account(&self, email: &str) -> (Value, String) {
        let res = self
            .post(
                "/account",
                json!({
                    "firstName": "Alan",
                    "lastName": "Turing",
                    "email": email,
                    "password": "enigma",
                }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        let token = body["token"].as_str().unwrap().to_string();
        (body["account"].clone(), token)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(account_number: i64, expires_in: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = AccountClaims {
        account_number: AccountNumber::new(account_number),
        issued_at: now - ChronoDuration::minutes(1),
        expires_at: now + expires_in,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    assert_eq!(srv.get("/health").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn top_up_transfer_and_overdraft() {
    let srv = TestServer::spawn().await;
    let (a, _) = srv.open_account("a@bank.test").await;
    let (b, _) = srv.open_account("b@bank.test").await;
    let a_number = a["accountNumber"].as_i64().unwrap();
    let b_number = b["accountNumber"].as_i64().unwrap();
    assert_eq!(a["balance"], "0.00");
    assert!(a.get("passwordHash").is_none());

    let res = srv
        .post("/topup", json!({ "acc_number": a_number, "amount": "100.00" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["amount"], "100.00");
    assert_eq!(
        body["success"],
        format!("account({a_number}) funded with $100.00")
    );

    let res = srv
        .post(
            "/transfer",
            json!({ "fromAccount": a_number, "toAccount": b_number, "amount": "40.00" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let view: Value = res.json().await.unwrap();
    assert_eq!(view["senderAccount"]["balance"], "60.00");
    assert_eq!(view["receiverAccount"]["balance"], "40.00");
    assert_eq!(view["status"], "Credit");
    assert_eq!(view["description"], "Bank Transfer");
    let id = view["id"].as_str().unwrap().to_string();

    let res = srv
        .post(
            "/transfer",
            json!({ "fromAccount": a_number, "toAccount": b_number, "amount": "1000.00" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "insufficient_funds");

    let res = srv.get(&format!("/transaction/{id}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let view: Value = res.json().await.unwrap();
    assert_eq!(view["senderAccount"]["balance"], "60.00");

    let history: Value = srv
        .get(&format!("/transactions/{b_number}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);

    let all: Value = srv.get("/transactions").await.json().await.unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn transfer_to_missing_account_changes_nothing() {
    let srv = TestServer::spawn().await;
    let (a, _) = srv.open_account("a@bank.test").await;
    let a_number = a["accountNumber"].as_i64().unwrap();
    srv.post("/topup", json!({ "account": a_number, "amount": "10.00" }))
        .await;

    let res = srv
        .post(
            "/transfer",
            json!({ "fromAccount": a_number, "toAccount": 1, "amount": "5.00" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_account");

    let accounts: Value = srv.get("/account").await.json().await.unwrap();
    assert_eq!(accounts[0]["balance"], "10.00");
    let all: Value = srv.get("/transactions").await.json().await.unwrap();
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_input_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let (a, _) = srv.open_account("a@bank.test").await;
    let a_number = a["accountNumber"].as_i64().unwrap();

    let res = srv
        .post("/topup", json!({ "account": a_number, "amount": "-3" }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .post(
            "/account",
            json!({ "firstname": "", "lastname": "X", "email": "x@bank.test", "password": "p" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.get("/transaction/not-a-uuid").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let srv = TestServer::spawn().await;
    srv.open_account("dup@bank.test").await;
    let res = srv
        .post(
            "/account",
            json!({ "firstname": "B", "lastname": "C", "email": "dup@bank.test", "password": "p" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_issues_a_usable_token() {
    let srv = TestServer::spawn().await;
    let (account, _) = srv.open_account("a@bank.test").await;
    let id = account["id"].as_i64().unwrap();

    let res = srv
        .post("/login", json!({ "email": "a@bank.test", "password": "wrong" }))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .post("/login", json!({ "email": "a@bank.test", "password": "enigma" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let res = srv
        .client
        .get(srv.url(&format!("/account/{id}")))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["email"], "a@bank.test");
}

#[tokio::test]
async fn account_routes_require_a_matching_token() {
    let srv = TestServer::spawn().await;
    let (mine, my_token) = srv.open_account("me@bank.test").await;
    let (theirs, _) = srv.open_account("you@bank.test").await;
    let their_id = theirs["id"].as_i64().unwrap();

    let res = srv.get(&format!("/account/{their_id}")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .get(srv.url(&format!("/account/{their_id}")))
        .bearer_auth(&my_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let expired = mint_jwt(
        mine["accountNumber"].as_i64().unwrap(),
        ChronoDuration::seconds(-30),
    );
    let my_id = mine["id"].as_i64().unwrap();
    let res = srv
        .client
        .get(srv.url(&format!("/account/{my_id}")))
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_account_with_and_without_history() {
    let srv = TestServer::spawn().await;
    let (a, a_token) = srv.open_account("a@bank.test").await;
    let (b, _) = srv.open_account("b@bank.test").await;
    let (c, c_token) = srv.open_account("c@bank.test").await;
    let a_number = a["accountNumber"].as_i64().unwrap();
    let b_number = b["accountNumber"].as_i64().unwrap();

    srv.post("/topup", json!({ "account": a_number, "amount": "5.00" }))
        .await;
    srv.post(
        "/transfer",
        json!({ "fromAccount": a_number, "toAccount": b_number, "amount": "1.00" }),
    )
    .await;

    let a_id = a["id"].as_i64().unwrap();
    let res = srv
        .client
        .delete(srv.url(&format!("/account/{a_id}")))
        .bearer_auth(&a_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let c_id = c["id"].as_i64().unwrap();
    let res = srv
        .client
        .delete(srv.url(&format!("/account/{c_id}")))
        .bearer_auth(&c_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["deleted"], c_id);

    let accounts: Value = srv.get("/account").await.json().await.unwrap();
    assert_eq!(accounts.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_json_bodies_are_validation_errors() {
    let srv = TestServer::spawn().await;
    let (a, _) = srv.open_account("a@bank.test").await;
    let a_number = a["accountNumber"].as_i64().unwrap();

    let res = srv
        .post(
            "/transfer",
            json!({ "fromAccount": "abc", "toAccount": a_number, "amount": "1.00" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");
    assert!(err["message"].is_string());

    let res = srv
        .client
        .post(srv.url("/topup"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");

    let res = srv
        .client
        .post(srv.url("/account"))
        .body("firstName=Alan")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");
}

#[tokio::test]
async fn account_lookup_by_number_requires_the_owning_token() {
    let srv = TestServer::spawn().await;
    let (mine, my_token) = srv.open_account("me@bank.test").await;
    let (theirs, _) = srv.open_account("you@bank.test").await;
    let my_number = mine["accountNumber"].as_i64().unwrap();
    let their_number = theirs["accountNumber"].as_i64().unwrap();

    let res = srv
        .client
        .get(srv.url(&format!("/account/number/{my_number}")))
        .bearer_auth(&my_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["email"], "me@bank.test");
    assert_eq!(fetched["accountNumber"], my_number);

    let res = srv
        .client
        .get(srv.url(&format!("/account/number/{their_number}")))
        .bearer_auth(&my_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "unauthorized");

    let res = srv.get(&format!("/account/number/{my_number}")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // A valid token for an account that was never opened.
    let ghost = mint_jwt(99_999_999, ChronoDuration::minutes(5));
    let res = srv
        .client
        .get(srv.url("/account/number/99999999"))
        .bearer_auth(ghost)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
