use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use coffeeshop_api::app::{build_app, services::AppServices};
use coffeeshop_auth::{JwksVerifier, StaticKeySet, VerifierConfig};
use coffeeshop_core::DrinkId;
use coffeeshop_drinks::{Drink, DrinkPatch, Ingredient, NewDrink, Recipe};
use coffeeshop_infra::{DrinkStore, InMemoryDrinkStore, StoreError};

const JWKS: &str = include_str!("../../../fixtures/auth/jwks.json");
const SIGNING_KEY: &[u8] = include_bytes!("../../../fixtures/auth/signing_key.pem");
const FOREIGN_KEY: &[u8] = include_bytes!("../../../fixtures/auth/foreign_key.pem");
const KID: &str = "coffeeshop-test-key";
const DOMAIN: &str = "coffee.test.auth0.com";
const AUDIENCE: &str = "drinks";

const MANAGER: &[&str] = &["get:drinks-detail", "post:drinks", "patch:drinks", "delete:drinks"];
const BARISTA: &[&str] = &["get:drinks-detail"];

/// Store double that counts every call, to prove rejected requests never reach it.
#[derive(Default)]
struct CountingStore {
    inner: InMemoryDrinkStore,
    calls: AtomicUsize,
}

impl CountingStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DrinkStore for CountingStore {
    async fn list_all(&self) -> Result<Vec<Drink>, StoreError> {
        self.touch();
        self.inner.list_all().await
    }

    async fn find_by_id(&self, id: DrinkId) -> Result<Option<Drink>, StoreError> {
        self.touch();
        self.inner.find_by_id(id).await
    }

    async fn create(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        self.touch();
        self.inner.create(drink).await
    }

    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError> {
        self.touch();
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: DrinkId) -> Result<(), StoreError> {
        self.touch();
        self.inner.delete(id).await
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.touch();
        self.inner.reset().await
    }
}

/// Store whose backend is always down.
struct UnavailableStore;

#[async_trait]
impl DrinkStore for UnavailableStore {
    async fn list_all(&self) -> Result<Vec<Drink>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_by_id(&self, _id: DrinkId) -> Result<Option<Drink>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn create(&self, _drink: NewDrink) -> Result<Drink, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn update(&self, _id: DrinkId, _patch: DrinkPatch) -> Result<Drink, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _id: DrinkId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn reset(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(store: Arc<dyn DrinkStore>) -> Self {
        // Same router as prod, static key set instead of the provider's JWKS endpoint.
        let verifier = Arc::new(JwksVerifier::new(
            StaticKeySet::from_json(JWKS).unwrap(),
            VerifierConfig::for_domain(DOMAIN, AUDIENCE, Algorithm::RS256),
        ));
        let app = build_app(Arc::new(AppServices::new(store)), verifier);

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

    async fn in_memory() -> (Self, Arc<InMemoryDrinkStore>) {
        let store = Arc::new(InMemoryDrinkStore::new());
        (Self::spawn(store.clone()).await, store)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

fn sign(claims: &Value, key: &[u8]) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    jsonwebtoken::encode(&header, claims, &EncodingKey::from_rsa_pem(key).unwrap())
        .expect("failed to encode jwt")
}

fn base_claims() -> Value {
    json!({
        "sub": "auth0|test-user",
        "iss": format!("https://{DOMAIN}/"),
        "aud": AUDIENCE,
        "iat": now(),
        "exp": now() + 600,
    })
}

fn mint_jwt(permissions: &[&str]) -> String {
    let mut claims = base_claims();
    claims["permissions"] = json!(permissions);
    sign(&claims, SIGNING_KEY)
}

fn espresso() -> Recipe {
    Recipe::new(vec![Ingredient::new("Espresso", "brown", 1)])
}

async fn seed(store: &InMemoryDrinkStore, titles: &[&str]) -> Vec<Drink> {
    let mut out = Vec::new();
    for title in titles {
        out.push(store.create(NewDrink::new(*title, espresso()).unwrap()).await.unwrap());
    }
    out
}

async fn body(res: reqwest::Response) -> Value {
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (srv, _store) = TestServer::in_memory().await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn public_listing_returns_every_drink_in_short_view() {
    let (srv, store) = TestServer::in_memory().await;
    seed(&store, &["Latte", "Mocha", "Cortado"]).await;

    let res = srv.client.get(srv.url("/drinks")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body(res).await;
    assert_eq!(body["success"], true);
    let drinks = body["drinks"].as_array().unwrap();
    assert_eq!(drinks.len(), store.list_all().await.unwrap().len());
    for drink in drinks {
        for ingredient in drink["recipe"].as_array().unwrap() {
            assert!(ingredient.get("name").is_none());
            assert_eq!(ingredient["color"], "brown");
        }
    }
}

#[tokio::test]
async fn detail_listing_returns_every_drink_in_long_view() {
    let (srv, store) = TestServer::in_memory().await;
    seed(&store, &["Latte", "Mocha"]).await;

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(mint_jwt(BARISTA))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body(res).await;
    let drinks = body["drinks"].as_array().unwrap();
    assert_eq!(drinks.len(), 2);
    assert_eq!(drinks[0]["recipe"][0]["name"], "Espresso");
}

#[tokio::test]
async fn protected_endpoint_without_header_is_401() {
    let (srv, _store) = TestServer::in_memory().await;

    let res = srv.client.get(srv.url("/drinks-detail")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body(res).await,
        json!({
            "success": false,
            "error": 401,
            "message": "Authorization header is expected.",
        })
    );
}

#[tokio::test]
async fn non_bearer_header_is_401() {
    let (srv, _store) = TestServer::in_memory().await;

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_utf8_header_is_401() {
    let (srv, store) = TestServer::in_memory().await;
    seed(&store, &["Latte"]).await;

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .header(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_bytes(b"Bearer \xff").unwrap(),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body(res).await;
    assert_eq!(body["error"], 401);
    assert_eq!(body["message"], "Authorization header must start with \"Bearer\".");
}

#[tokio::test]
async fn hs256_token_with_known_kid_is_401() {
    let (srv, _store) = TestServer::in_memory().await;
    let mut claims = base_claims();
    claims["permissions"] = json!(MANAGER);
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(KID.to_string());
    let token = jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(b"guessable")).unwrap();

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn detail_without_scope_is_403() {
    let (srv, _store) = TestServer::in_memory().await;

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(mint_jwt(&["post:drinks"]))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = body(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], 403);
    assert_eq!(body["message"], "Permission not found.");
}

#[tokio::test]
async fn missing_scope_never_mutates() {
    let (srv, store) = TestServer::in_memory().await;
    let latte = seed(&store, &["Latte"]).await.remove(0);
    let token = mint_jwt(BARISTA);

    let res = srv
        .client
        .post(srv.url("/drinks"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Mocha", "recipe": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .patch(srv.url(&format!("/drinks/{}", latte.id_typed())))
        .bearer_auth(&token)
        .json(&json!({ "title": "Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .delete(srv.url(&format!("/drinks/{}", latte.id_typed())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    assert_eq!(store.list_all().await.unwrap(), vec![latte]);
}

#[tokio::test]
async fn token_without_permissions_claim_is_400() {
    let (srv, _store) = TestServer::in_memory().await;
    let token = sign(&base_claims(), SIGNING_KEY);

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(res).await["message"], "Permissions not included in JWT.");
}

#[tokio::test]
async fn forged_signature_is_401_everywhere_and_store_is_untouched() {
    let store = Arc::new(CountingStore::default());
    let srv = TestServer::spawn(store.clone()).await;

    let mut claims = base_claims();
    claims["permissions"] = json!(MANAGER);
    let forged = sign(&claims, FOREIGN_KEY);

    let requests = vec![
        srv.client.get(srv.url("/drinks-detail")),
        srv.client
            .post(srv.url("/drinks"))
            .json(&json!({ "title": "Water", "recipe": [] })),
        srv.client
            .patch(srv.url("/drinks/1"))
            .json(&json!({ "title": "X" })),
        srv.client.delete(srv.url("/drinks/1")),
    ];

    for request in requests {
        let res = request.bearer_auth(&forged).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(res).await["error"], 401);
    }

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn expired_token_is_401() {
    let (srv, _store) = TestServer::in_memory().await;
    let mut claims = base_claims();
    claims["permissions"] = json!(MANAGER);
    claims["exp"] = json!(now() - 3600);

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(sign(&claims, SIGNING_KEY))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(res).await["message"], "Token expired.");
}

#[tokio::test]
async fn wrong_audience_is_401() {
    let (srv, _store) = TestServer::in_memory().await;
    let mut claims = base_claims();
    claims["permissions"] = json!(MANAGER);
    claims["aud"] = json!("someone-elses-api");

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(sign(&claims, SIGNING_KEY))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_water_returns_created_drink_under_singular_key() {
    let (srv, _store) = TestServer::in_memory().await;

    let res = srv
        .client
        .post(srv.url("/drinks"))
        .bearer_auth(mint_jwt(&["post:drinks"]))
        .json(&json!({
            "title": "Water",
            "recipe": [{ "name": "Water", "color": "blue", "parts": 1 }],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body(res).await;
    let id = body["drink"][0]["id"].as_i64().unwrap();
    assert_eq!(
        body,
        json!({
            "success": true,
            "drink": [{
                "id": id,
                "title": "Water",
                "recipe": [{ "name": "Water", "color": "blue", "parts": 1 }],
            }],
        })
    );
}

#[tokio::test]
async fn posted_recipe_round_trips_through_detail_view() {
    let (srv, _store) = TestServer::in_memory().await;
    let token = mint_jwt(MANAGER);
    let recipe = json!([{ "name": "Espresso", "color": "brown", "parts": 1 }]);

    let res = srv
        .client
        .post(srv.url("/drinks"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Doppio", "recipe": recipe }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body = body(res).await;
    let doppio = body["drinks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["title"] == "Doppio")
        .cloned()
        .unwrap();

    assert_eq!(doppio["recipe"], recipe);
}

#[tokio::test]
async fn duplicate_title_is_422() {
    let (srv, store) = TestServer::in_memory().await;
    seed(&store, &["Latte"]).await;

    let res = srv
        .client
        .post(srv.url("/drinks"))
        .bearer_auth(mint_jwt(MANAGER))
        .json(&json!({
            "title": "Latte",
            "recipe": [{ "name": "Milk", "color": "white", "parts": 3 }],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], 422);
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_body_is_422() {
    let (srv, _store) = TestServer::in_memory().await;

    let res = srv
        .client
        .post(srv.url("/drinks"))
        .bearer_auth(mint_jwt(MANAGER))
        .header("Content-Type", "application/json")
        .body("{\"title\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn patch_missing_drink_is_404() {
    let (srv, _store) = TestServer::in_memory().await;

    let res = srv
        .client
        .patch(srv.url("/drinks/999"))
        .bearer_auth(mint_jwt(&["patch:drinks"]))
        .json(&json!({ "title": "X" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body(res).await,
        json!({ "success": false, "error": 404, "message": "resource not found" })
    );
}

#[tokio::test]
async fn patch_applies_title_and_recipe_together() {
    let (srv, store) = TestServer::in_memory().await;
    let latte = seed(&store, &["Latte"]).await.remove(0);

    let res = srv
        .client
        .patch(srv.url(&format!("/drinks/{}", latte.id_typed())))
        .bearer_auth(mint_jwt(&["patch:drinks"]))
        .json(&json!({
            "title": "Oat Latte",
            "recipe": [
                { "name": "Espresso", "color": "brown", "parts": 1 },
                { "name": "Oat milk", "color": "beige", "parts": 3 },
            ],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body(res).await;
    assert_eq!(body["success"], true);
    let updated = &body["drinks"][0];
    assert_eq!(updated["id"], latte.id_typed().as_i64());
    assert_eq!(updated["title"], "Oat Latte");
    assert_eq!(updated["recipe"][1]["name"], "Oat milk");

    let stored = store.find_by_id(latte.id_typed()).await.unwrap().unwrap();
    assert_eq!(stored.title(), "Oat Latte");
    assert_eq!(stored.recipe().len(), 2);
}

#[tokio::test]
async fn patch_title_only_keeps_recipe() {
    let (srv, store) = TestServer::in_memory().await;
    let latte = seed(&store, &["Latte"]).await.remove(0);

    let res = srv
        .client
        .patch(srv.url(&format!("/drinks/{}", latte.id_typed())))
        .bearer_auth(mint_jwt(&["patch:drinks"]))
        .json(&json!({ "title": "Caffe Latte" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let stored = store.find_by_id(latte.id_typed()).await.unwrap().unwrap();
    assert_eq!(stored.title(), "Caffe Latte");
    assert_eq!(stored.recipe(), &espresso());
}

#[tokio::test]
async fn delete_is_not_repeatable() {
    let (srv, store) = TestServer::in_memory().await;
    let latte = seed(&store, &["Latte"]).await.remove(0);
    let token = mint_jwt(&["delete:drinks"]);
    let url = srv.url(&format!("/drinks/{}", latte.id_typed()));

    let res = srv.client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body(res).await,
        json!({ "success": true, "delete": latte.id_typed().as_i64() })
    );

    for _ in 0..3 {
        let res = srv.client.delete(&url).bearer_auth(&token).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_integer_id_is_404() {
    let (srv, _store) = TestServer::in_memory().await;

    let res = srv
        .client
        .delete(srv.url("/drinks/latte"))
        .bearer_auth(mint_jwt(MANAGER))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_gets_json_404() {
    let (srv, _store) = TestServer::in_memory().await;

    let res = srv.client.get(srv.url("/menu")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(res).await["message"], "resource not found");
}

#[tokio::test]
async fn store_outage_is_flattened_to_404() {
    let srv = TestServer::spawn(Arc::new(UnavailableStore)).await;

    let res = srv.client.get(srv.url("/drinks")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(mint_jwt(BARISTA))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(res).await["message"], "resource not found");
}

#[tokio::test]
async fn unsupported_method_gets_json_405() {
    let (srv, store) = TestServer::in_memory().await;
    let latte = seed(&store, &["Latte"]).await.remove(0);

    for (method, path) in [
        (reqwest::Method::GET, format!("/drinks/{}", latte.id_typed())),
        (reqwest::Method::PUT, "/drinks".to_string()),
        (reqwest::Method::DELETE, "/drinks-detail".to_string()),
    ] {
        let res = srv.client.request(method, srv.url(&path)).send().await.unwrap();

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body(res).await,
            json!({ "success": false, "error": 405, "message": "method not allowed" })
        );
    }
    assert_eq!(store.list_all().await.unwrap(), vec![latte]);
}
