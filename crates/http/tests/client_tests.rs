//! Integration tests for the catalog HTTP client

#![cfg(feature = "client")]

use catalog_http::client::albums::{AlbumQuery, CoverFile};
use catalog_http::client::artists::ArtistQuery;
use catalog_http::client::request::ApiRequest;
use catalog_http::types::{Artist, LoginRequest, TokenPair};
use catalog_http::{
    CatalogClient, ClientError, CredentialStore, MemoryStore, RefreshError, SessionEndReason,
    SessionState, StorageError,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_json, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pair(token: &str, refresh_token: &str) -> TokenPair {
    TokenPair {
        token: token.to_string(),
        refresh_token: refresh_token.to_string(),
    }
}

fn client_for(server: &MockServer, store: Arc<MemoryStore>) -> CatalogClient {
    CatalogClient::builder()
        .base_url(server.uri())
        .store(store)
        .regionals_url(format!("{}/external/regionais", server.uri()))
        .build()
        .unwrap()
}

fn artist_json(id: i64) -> serde_json::Value {
    json!({ "id": id, "name": "Serj Tankian", "albumsCount": 2 })
}

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "status": 401,
        "error": "Unauthorized",
        "message": "Token expirado",
        "path": "/api/v1/artists"
    }))
}

async fn mount_refresh(server: &MockServer, refresh_token: &str, issued: TokenPair, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("authorization", format!("Bearer {refresh_token}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": issued.token, "refreshToken": issued.refresh_token }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_artist(server: &MockServer, id: i64, token: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/artists/{id}")))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(response)
        .mount(server)
        .await;
}

fn count_login_prompts(client: &CatalogClient) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    client.session().on_login_required(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    calls
}

#[tokio::test]
async fn test_client_builder() {
    let client = CatalogClient::builder()
        .base_url("http://localhost:8080/api/v1/")
        .build();

    assert!(client.is_ok());
    let client = client.unwrap();
    assert_eq!(client.base_url(), "http://localhost:8080/api/v1");
    assert_eq!(client.session().current(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_client_builder_requires_base_url() {
    let result = CatalogClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_stored_credentials_start_authenticated() {
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = CatalogClient::builder()
        .base_url("http://localhost:8080")
        .store(store)
        .build()
        .unwrap();
    assert!(client.session().current().is_authenticated());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_replayed() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = client_for(&server, store.clone());

    mount_artist(&server, 1, "t1", unauthorized()).await;
    mount_artist(&server, 1, "t2", ResponseTemplate::new(200).set_body_json(artist_json(1))).await;
    mount_refresh(&server, "r1", pair("t2", "r2"), 1).await;

    let artist = client.get_artist(1).await.unwrap();
    assert_eq!(artist.name, "Serj Tankian");
    assert_eq!(store.get("token").unwrap().as_deref(), Some("t2"));
    assert_eq!(store.get("refreshToken").unwrap().as_deref(), Some("r2"));
    assert!(!client.is_refreshing());

    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_expirations_share_one_refresh() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = client_for(&server, store);

    for id in 1..=5 {
        mount_artist(&server, id, "t1", unauthorized()).await;
        mount_artist(&server, id, "t2", ResponseTemplate::new(200).set_body_json(artist_json(id)))
            .await;
    }
    mount_refresh(&server, "r1", pair("t2", "r2"), 1).await;

    let handles: Vec<_> = (1..=5)
        .map(|id| {
            let client = client.clone();
            tokio::spawn(async move { client.get_artist(id).await })
        })
        .collect();

    for (id, handle) in (1..=5).zip(handles) {
        let artist = handle.await.unwrap().unwrap();
        assert_eq!(artist.id, id);
    }

    // Every replay carried the same refreshed token
    let requests = server.received_requests().await.unwrap();
    let replays = requests
        .iter()
        .filter(|r| r.url.path().starts_with("/artists/"))
        .filter(|r| r.headers.get("authorization").is_some_and(|v| v == "Bearer t2"))
        .count();
    assert_eq!(replays, 5);

    server.verify().await;
}

#[tokio::test]
async fn test_two_requests_expiring_together_resend_with_new_token() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = client_for(&server, store.clone());

    mount_artist(&server, 1, "t1", unauthorized()).await;
    mount_artist(&server, 1, "t2", ResponseTemplate::new(200).set_body_json(artist_json(1))).await;
    Mock::given(method("GET"))
        .and(path("/albums/9"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/albums/9"))
        .and(header("authorization", "Bearer t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9,
            "title": "Harakiri",
            "artist": { "id": 1, "name": "Serj Tankian" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", pair("t2", "r2"), 1).await;

    let (artist, album) = tokio::join!(client.get_artist(1), client.get_album(9));
    assert_eq!(artist.unwrap().id, 1);
    assert_eq!(album.unwrap().title, "Harakiri");
    assert_eq!(store.get("token").unwrap().as_deref(), Some("t2"));
    assert_eq!(store.get("refreshToken").unwrap().as_deref(), Some("r2"));

    server.verify().await;
}

#[tokio::test]
async fn test_replayed_request_rejected_again_is_not_refreshed_twice() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = client_for(&server, store);

    mount_artist(&server, 1, "t1", unauthorized()).await;
    mount_artist(&server, 1, "t2", unauthorized()).await;
    mount_refresh(&server, "r1", pair("t2", "r2"), 1).await;

    let result = client.get_artist(1).await;
    match result {
        Err(ClientError::Unauthorized(body)) => {
            assert_eq!(body.message(), Some("Token expirado"));
        }
        other => panic!("expected unauthorized, got {other:?}"),
    }

    server.verify().await;
}

#[tokio::test]
async fn test_missing_refresh_token_ends_session_without_refresh() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    store.set("token", "t1").unwrap();
    let client = client_for(&server, store.clone());
    let prompts = count_login_prompts(&client);

    mount_artist(&server, 1, "t1", unauthorized()).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.get_artist(1).await;
    assert!(matches!(result, Err(ClientError::Unauthorized(_))));
    assert_eq!(store.get("token").unwrap(), None);
    assert_eq!(store.get("refreshToken").unwrap(), None);
    assert_eq!(prompts.load(Ordering::SeqCst), 1);
    match client.session().current() {
        SessionState::LoginRequired(event) => {
            assert_eq!(event.reason, SessionEndReason::MissingRefreshToken);
            assert_eq!(event.login_route, "/login");
        }
        other => panic!("expected login prompt, got {other:?}"),
    }

    server.verify().await;
}

#[tokio::test]
async fn test_refresh_failure_rejects_every_waiting_request() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = client_for(&server, store.clone());
    let prompts = count_login_prompts(&client);

    for id in 1..=3 {
        mount_artist(&server, id, "t1", unauthorized()).await;
    }
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "status": 403, "message": "Refresh token expirado" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (a, b, c) = tokio::join!(client.get_artist(1), client.get_artist(2), client.get_artist(3));
    let expected = RefreshError::Rejected {
        status: 403,
        message: "Refresh token expirado".to_string(),
    };
    for result in [a, b, c] {
        match result {
            Err(ClientError::RefreshFailed(err)) => assert_eq!(err, expected),
            other => panic!("expected refresh failure, got {other:?}"),
        }
    }

    assert_eq!(store.get("token").unwrap(), None);
    assert_eq!(store.get("refreshToken").unwrap(), None);
    assert_eq!(prompts.load(Ordering::SeqCst), 1);
    assert!(!client.is_refreshing());

    server.verify().await;
}

#[tokio::test]
async fn test_cancelled_request_does_not_abandon_its_refresh() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = client_for(&server, store.clone());
    let prompts = count_login_prompts(&client);

    mount_artist(&server, 1, "t1", unauthorized()).await;
    mount_artist(&server, 2, "t1", unauthorized()).await;
    mount_artist(&server, 2, "t2", ResponseTemplate::new(200).set_body_json(artist_json(2))).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("authorization", "Bearer r1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "t2", "refreshToken": "r2" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    // The request that opens the refresh is cancelled before the exchange
    // answers; a later request joins the same cycle
    let opener = tokio::time::timeout(Duration::from_millis(150), client.get_artist(1));
    let joiner = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        client.get_artist(2).await
    };
    let (opener, joiner) = tokio::join!(opener, joiner);

    assert!(opener.is_err());
    assert_eq!(joiner.unwrap().id, 2);
    assert_eq!(store.get("token").unwrap().as_deref(), Some("t2"));
    assert_eq!(store.get("refreshToken").unwrap().as_deref(), Some("r2"));
    assert_eq!(prompts.load(Ordering::SeqCst), 0);
    assert!(!client.is_refreshing());

    server.verify().await;
}

#[tokio::test]
async fn test_rejection_of_a_superseded_token_replays_without_refresh() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = client_for(&server, store.clone());

    mount_artist(
        &server,
        1,
        "t1",
        unauthorized().set_delay(Duration::from_millis(200)),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/artists/1"))
        .and(header("authorization", "Bearer t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(artist_json(1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // Another refresh stores t2 while the t1 request is still in flight
    let rotate = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.set("token", "t2").unwrap();
        store.set("refreshToken", "r2").unwrap();
    };
    let (artist, ()) = tokio::join!(client.get_artist(1), rotate);

    assert_eq!(artist.unwrap().id, 1);
    assert_eq!(store.get("refreshToken").unwrap().as_deref(), Some("r2"));

    server.verify().await;
}

/// Holds the refresh token lookup open so concurrent failures queue behind it
struct SlowRefreshLookup(MemoryStore);

impl CredentialStore for SlowRefreshLookup {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if key == "refreshToken" {
            std::thread::sleep(Duration::from_millis(200));
        }
        self.0.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.0.remove(key)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_missing_refresh_token_fails_queued_requests() {
    let server = MockServer::start().await;
    let memory = MemoryStore::new();
    memory.set("token", "t1").unwrap();
    let store = Arc::new(SlowRefreshLookup(memory));
    let client = CatalogClient::builder()
        .base_url(server.uri())
        .store(store.clone())
        .build()
        .unwrap();
    let prompts = count_login_prompts(&client);

    for id in 1..=3 {
        mount_artist(&server, id, "t1", unauthorized()).await;
    }
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (a, b, c) = tokio::join!(client.get_artist(1), client.get_artist(2), client.get_artist(3));

    let mut unauthorized_count = 0;
    let mut missing_count = 0;
    for result in [a, b, c] {
        match result {
            Err(ClientError::Unauthorized(_)) => unauthorized_count += 1,
            Err(ClientError::RefreshFailed(RefreshError::MissingRefreshToken)) => {
                missing_count += 1;
            }
            other => panic!("expected the session to end, got {other:?}"),
        }
    }
    assert_eq!(unauthorized_count, 1);
    assert_eq!(missing_count, 2);
    assert_eq!(prompts.load(Ordering::SeqCst), 1);
    assert_eq!(store.get("token").unwrap(), None);
    assert!(!client.is_refreshing());

    server.verify().await;
}

#[tokio::test]
async fn test_later_requests_carry_the_refreshed_token() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = client_for(&server, store);

    mount_artist(&server, 1, "t1", unauthorized()).await;
    mount_artist(&server, 1, "t2", ResponseTemplate::new(200).set_body_json(artist_json(1))).await;
    mount_refresh(&server, "r1", pair("t2", "r2"), 1).await;
    Mock::given(method("GET"))
        .and(path("/albums"))
        .and(header("authorization", "Bearer t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [],
            "totalElements": 0,
            "totalPages": 0,
            "number": 0,
            "size": 10
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.get_artist(1).await.unwrap();
    let page = client.list_albums(&AlbumQuery::default()).await.unwrap();
    assert!(page.content.is_empty());

    server.verify().await;
}

#[tokio::test]
async fn test_other_errors_pass_through_unchanged() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = client_for(&server, store.clone());

    mount_artist(
        &server,
        404,
        "t1",
        ResponseTemplate::new(404).set_body_json(json!({
            "status": 404,
            "error": "Not Found",
            "message": "Artista não encontrado"
        })),
    )
    .await;
    mount_artist(&server, 500, "t1", ResponseTemplate::new(500).set_body_string("boom")).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let not_found = client.get_artist(404).await.unwrap_err();
    assert_eq!(not_found.status(), Some(404));
    assert_eq!(not_found.user_message("Erro"), "Artista não encontrado");

    let failed = client.get_artist(500).await.unwrap_err();
    assert!(matches!(failed, ClientError::Status { status: 500, .. }));

    assert_eq!(store.get("token").unwrap().as_deref(), Some("t1"));
    server.verify().await;
}

#[tokio::test]
async fn test_listing_sends_default_page_parameters() {
    let server = MockServer::start().await;
    let client = client_for(&server, Arc::new(MemoryStore::new()));

    Mock::given(method("GET"))
        .and(path("/artists"))
        .and(query_param("page", "0"))
        .and(query_param("size", "10"))
        .and(query_param("sort", "name,asc"))
        .and(query_param("name", "serj"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [artist_json(1)],
            "totalElements": 1,
            "totalPages": 1,
            "number": 0,
            "size": 10
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = ArtistQuery {
        name: Some("serj".into()),
        ..ArtistQuery::default()
    };
    let page = client.list_artists(&query).await.unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].albums_count, 2);
    assert!(!page.has_next());

    server.verify().await;
}

#[tokio::test]
async fn test_cover_upload_is_replayed_after_refresh() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = client_for(&server, store);

    Mock::given(method("POST"))
        .and(path("/albums/3/cover"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/albums/3/cover"))
        .and(header("authorization", "Bearer t2"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", pair("t2", "r2"), 1).await;

    let cover = CoverFile::new("cover.png", "image/png", bytes::Bytes::from_static(b"\x89PNG"));
    client.upload_cover(3, cover).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let replay = requests
        .iter()
        .rfind(|r| r.url.path() == "/albums/3/cover")
        .unwrap();
    let body = String::from_utf8_lossy(&replay.body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"cover.png\""));

    server.verify().await;
}

#[tokio::test]
async fn test_regional_sync_falls_back_on_server_error() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("t1", "r1")));
    let client = client_for(&server, store);

    Mock::given(method("POST"))
        .and(path("/regionais/sincronizar"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": 500,
            "message": "Erro ao acessar API externa"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/external/regionais"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "nome": "Regional Norte" },
            { "id": 2, "nome": "Regional Sul" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/regionais/importar"))
        .and(header("authorization", "Bearer t1"))
        .and(body_json(json!([
            { "id": 1, "nome": "Regional Norte" },
            { "id": 2, "nome": "Regional Sul" }
        ])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "inseridos": 2,
            "atualizados": 0,
            "inativados": 0,
            "mensagem": "Sincronização concluída"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.synchronize_regionals().await.unwrap();
    assert_eq!(result.inserted, 2);
    assert_eq!(result.message, "Sincronização concluída");

    // The third-party source is fetched without credentials
    let requests = server.received_requests().await.unwrap();
    let external = requests
        .iter()
        .find(|r| r.url.path() == "/external/regionais")
        .unwrap();
    assert!(external.headers.get("authorization").is_none());

    server.verify().await;
}

#[tokio::test]
async fn test_regional_sync_propagates_other_errors() {
    let server = MockServer::start().await;
    let client = client_for(&server, Arc::new(MemoryStore::with_tokens(&pair("t1", "r1"))));

    Mock::given(method("POST"))
        .and(path("/regionais/sincronizar"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/external/regionais"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/regionais/importar"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.synchronize_regionals().await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 403, .. }));

    server.verify().await;
}

#[tokio::test]
async fn test_login_unwraps_envelope_and_stores_credentials() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let client = client_for(&server, store.clone());
    let mut session = client.session().subscribe();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "username": "admin", "password": "admin123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "message": "Login realizado com sucesso",
            "data": { "token": "t1", "refreshToken": "r1" },
            "path": "/auth/login"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client
        .login(&LoginRequest {
            username: "admin".into(),
            password: "admin123".into(),
        })
        .await
        .unwrap();
    assert_eq!(response.token, "t1");
    assert_eq!(store.get("token").unwrap().as_deref(), Some("t1"));
    assert_eq!(store.get("refreshToken").unwrap().as_deref(), Some("r1"));
    assert!(session.has_changed().unwrap());
    assert!(session.borrow_and_update().is_authenticated());

    client.logout().unwrap();
    assert_eq!(store.get("token").unwrap(), None);
    assert_eq!(client.session().current(), SessionState::Anonymous);

    server.verify().await;
}

#[tokio::test]
async fn test_rejected_login_does_not_touch_the_session() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::with_tokens(&pair("old", "old-refresh")));
    let client = client_for(&server, store.clone());
    let prompts = count_login_prompts(&client);

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client
        .login(&LoginRequest {
            username: "admin".into(),
            password: "wrong".into(),
        })
        .await;
    assert!(matches!(result, Err(ClientError::Unauthorized(_))));
    assert_eq!(prompts.load(Ordering::SeqCst), 0);
    assert_eq!(store.get("refreshToken").unwrap().as_deref(), Some("old-refresh"));

    server.verify().await;
}

#[tokio::test]
async fn test_create_artist_posts_json() {
    let server = MockServer::start().await;
    let client = client_for(&server, Arc::new(MemoryStore::with_tokens(&pair("t1", "r1"))));

    Mock::given(method("POST"))
        .and(path("/artists"))
        .and(header("authorization", "Bearer t1"))
        .and(body_json(json!({ "name": "Mike Shinoda" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 4,
            "name": "Mike Shinoda",
            "albumsCount": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created: Artist = client
        .execute(
            ApiRequest::post("/artists")
                .with_json(&json!({ "name": "Mike Shinoda" }))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.id, 4);

    server.verify().await;
}

#[tokio::test]
async fn test_artist_store_records_server_message_on_failure() {
    let server = MockServer::start().await;
    let client = client_for(&server, Arc::new(MemoryStore::with_tokens(&pair("t1", "r1"))));
    let store = catalog_http::ArtistStore::new();

    Mock::given(method("GET"))
        .and(path("/artists"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": 400,
            "message": "Parâmetro de ordenação inválido"
        })))
        .mount(&server)
        .await;

    let result = store.load(&client, &ArtistQuery::default()).await;
    assert!(result.is_err());

    let snapshot = store.snapshot();
    assert!(snapshot.items.is_empty());
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error.as_deref(), Some("Parâmetro de ordenação inválido"));
}
