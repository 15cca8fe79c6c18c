//! Router assembly: HTTP endpoints, WebSocket upgrade, the assistant function,
//! uploaded files, static SPA, CORS and HTTP tracing.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod assistant;
pub mod chat;
pub mod http;
pub mod ws;

/// Slack above the upload ceiling for multipart framing, so an oversized file
/// still reaches the size check and gets a readable error.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - the assistant function at `/functions/v1/assistant` (own CORS headers)
/// - uploaded chat files under the configured public base URL
/// - Static SPA from `./static` with index fallback
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: AppState) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));
    let files = ServeDir::new(state.config.chat.storage_dir.clone());
    let files_prefix = format!("/{}", state.config.chat.public_base_url.trim_matches('/'));
    let upload_limit = state.chat.max_upload_bytes() + MULTIPART_OVERHEAD;

    let api = Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/lessons", get(http::http_lessons))
        .route("/api/v1/quizzes", get(http::http_quizzes))
        .route("/api/v1/quizzes/answer", post(http::http_post_answer))
        .route("/api/v1/search", get(http::http_search))
        .route("/api/v1/theme", get(http::http_get_theme).put(http::http_put_theme))
        .route("/api/v1/theme/toggle", post(http::http_toggle_theme))
        .route("/api/v1/mission/stages", get(http::http_mission_stages))
        .route("/api/v1/mission", post(http::http_start_mission))
        .route("/api/v1/mission/:id", get(http::http_get_mission))
        .route("/api/v1/mission/:id/submit", post(http::http_submit_mission))
        .route("/api/v1/auth/signup", post(chat::http_sign_up))
        .route("/api/v1/auth/signin", post(chat::http_sign_in))
        .route("/api/v1/auth/signout", post(chat::http_sign_out))
        .route("/api/v1/auth/session", get(chat::http_session))
        .route(
            "/api/v1/chat/messages",
            get(chat::http_history).post(chat::http_send_message).delete(chat::http_delete_all),
        )
        .route(
            "/api/v1/chat/messages/:id",
            patch(chat::http_edit_message).delete(chat::http_delete_message),
        )
        .route(
            "/api/v1/chat/files",
            post(chat::http_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // The assistant sets its own CORS headers, so it sits outside the CORS layer.
    let functions = Router::new().route(
        "/functions/v1/assistant",
        post(assistant::assistant_query).options(assistant::assistant_preflight),
    );

    api.merge(functions)
        .nest_service(&files_prefix, files)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::theme::MemoryStorage;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use futures_util::{SinkExt, StreamExt};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        state: AppState,
        _uploads: tempfile::TempDir,
    }

    impl TestApp {
        fn new() -> Self {
            let uploads = tempfile::tempdir().unwrap();
            let mut cfg = AppConfig::default();
            cfg.chat.storage_dir = uploads.path().to_path_buf();
            cfg.chat.max_upload_bytes = 64;
            cfg.chat.organizers = vec!["mentor@school.ua".into()];
            cfg.assistant.delay_ms = 0;
            let state = AppState::with_theme_storage(cfg, Box::<MemoryStorage>::default());
            Self { router: build_router(state.clone()), state, _uploads: uploads }
        }

        async fn request(&self, method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let body = match body {
                Some(v) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(serde_json::to_vec(&v).unwrap())
                }
                None => Body::empty(),
            };
            self.send(builder.body(body).unwrap()).await
        }

        async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
            let res = self.router.clone().oneshot(req).await.unwrap();
            let status = res.status();
            let bytes = res.into_body().collect().await.unwrap().to_bytes();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }

        async fn token(&self, email: &str) -> String {
            let (status, body) = self
                .request(Method::POST, "/api/v1/auth/signup", Some(json!({ "email": email, "password": "kosmos1" })), None)
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["token"].as_str().unwrap().to_string()
        }
    }

    type Socket = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

    async fn serve(app: &TestApp) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app.router.clone();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        addr
    }

    /// Connected once the first pong arrives, so the socket's listeners are registered.
    async fn ws_connect(addr: SocketAddr) -> Socket {
        let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        ws_send(&mut ws, json!({ "type": "ping" })).await;
        ws_next(&mut ws, "pong").await;
        ws
    }

    async fn ws_send(ws: &mut Socket, v: Value) {
        ws.send(WsMessage::Text(v.to_string())).await.unwrap();
    }

    /// Next server message of type `kind`; other pushes are skipped.
    async fn ws_next(ws: &mut Socket, kind: &str) -> Value {
        let read = async {
            loop {
                match ws.next().await {
                    Some(Ok(WsMessage::Text(txt))) => {
                        let v: Value = serde_json::from_str(&txt).unwrap();
                        if v["type"] == kind {
                            return v;
                        }
                    }
                    Some(Ok(_)) => continue,
                    other => panic!("socket ended while waiting for {kind}: {other:?}"),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), read).await.unwrap()
    }

    fn multipart(file_name: &str, bytes: &[u8]) -> Request<Body> {
        let boundary = "zirka-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/chat/files")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn quiz_answers_render_verdicts() {
        let app = TestApp::new();
        let (_, list) = app.request(Method::GET, "/api/v1/quizzes", None, None).await;
        assert!(list.as_array().unwrap().iter().all(|q| q.get("answer").is_none()));

        let (status, ok) = app
            .request(Method::POST, "/api/v1/quizzes/answer", Some(json!({ "quizId": "css-text-color", "answer": "color" })), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ok["correct"], true);

        let (_, bad) = app
            .request(Method::POST, "/api/v1/quizzes/answer", Some(json!({ "quizId": "css-text-color", "answer": "font-size" })), None)
            .await;
        assert_eq!(bad["correct"], false);
        assert!(bad["message"].as_str().unwrap().contains("color"));

        let (status, _) = app
            .request(Method::POST, "/api/v1/quizzes/answer", Some(json!({ "quizId": "nope", "answer": "x" })), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_expands_synonyms() {
        let app = TestApp::new();
        let (status, body) = app.request(Method::GET, "/api/v1/search?q=%D1%84%D0%BE%D0%BD", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["terms"].as_array().unwrap().iter().any(|t| t == "background-color"));
        assert!(!body["hits"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn theme_set_toggle_and_client_hint() {
        let app = TestApp::new();
        let (_, s) = app.request(Method::PUT, "/api/v1/theme", Some(json!({ "mode": "dark" })), None).await;
        assert_eq!(s, json!({ "mode": "dark", "actual": "dark" }));
        let (_, s) = app.request(Method::POST, "/api/v1/theme/toggle", None, None).await;
        assert_eq!(s["mode"], "light");

        app.request(Method::PUT, "/api/v1/theme", Some(json!({ "mode": "system" })), None).await;
        let req = Request::builder()
            .uri("/api/v1/theme")
            .header("Sec-CH-Prefers-Color-Scheme", "\"dark\"")
            .body(Body::empty())
            .unwrap();
        let (_, s) = app.send(req).await;
        assert_eq!(s, json!({ "mode": "system", "actual": "dark" }));
    }

    #[tokio::test]
    async fn mission_flow_over_http() {
        let app = TestApp::new();
        let (_, run) = app.request(Method::POST, "/api/v1/mission", None, None).await;
        let id = run["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/mission/{id}/submit");
        let (_, out) = app.request(Method::POST, &uri, Some(json!({ "css": "color: red" })), None).await;
        assert_eq!(out["accepted"], false);
        let (_, out) = app.request(Method::POST, &uri, Some(json!({ "css": ".rocket { background-color: navy; }" })), None).await;
        assert_eq!(out["accepted"], true);
        assert_eq!(out["run"]["stage_index"], 1);

        let (status, _) = app
            .request(Method::GET, &format!("/api/v1/mission/{}", uuid::Uuid::new_v4()), None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn organizer_only_moderation() {
        let app = TestApp::new();
        let member = app.token("pupil@school.ua").await;
        let organizer = app.token("mentor@school.ua").await;

        let (status, msg) = app
            .request(Method::POST, "/api/v1/chat/messages", Some(json!({ "content": "Привіт!" })), Some(&member))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/v1/chat/messages/{}", msg["id"].as_str().unwrap());

        let (status, err) = app.request(Method::DELETE, &uri, None, Some(&member)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(err["error"].as_str().unwrap().contains("організатор"));

        let (status, edited) = app
            .request(Method::PATCH, &uri, Some(json!({ "content": "Вітаю!" })), Some(&organizer))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["content"], "Вітаю!");

        let (status, _) = app.request(Method::DELETE, &uri, None, Some(&organizer)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, history) = app.request(Method::GET, "/api/v1/chat/messages", None, None).await;
        assert!(history.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn session_roundtrip() {
        let app = TestApp::new();
        let token = app.token("olena@school.ua").await;
        let (status, s) = app.request(Method::GET, "/api/v1/auth/session", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(s["user"]["email"], "olena@school.ua");
        app.request(Method::POST, "/api/v1/auth/signout", None, Some(&token)).await;
        let (status, _) = app.request(Method::GET, "/api/v1/auth/session", None, Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upload_enforces_ceiling() {
        let app = TestApp::new();
        let (status, err) = app.send(multipart("huge.png", &[7u8; 65])).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(err["error"].as_str().unwrap().starts_with("Файл завеликий"));

        let (status, msg) = app.send(multipart("style.css", b"p { color: red; }")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(msg["kind"], "file");
        let url = msg["file_url"].as_str().unwrap();
        assert!(url.starts_with("/files/chat-files/anonymous-"));
        assert!(url.ends_with(".css"));
    }

    #[tokio::test]
    async fn assistant_echoes_and_validates() {
        let app = TestApp::new();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/functions/v1/assistant")
            .body(Body::empty())
            .unwrap();
        let res = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let (status, body) = app
            .request(Method::POST, "/functions/v1/assistant", Some(json!({ "query": "що таке padding?" })), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("що таке padding?"));

        let (status, body) = app.request(Method::POST, "/functions/v1/assistant", Some(json!({})), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn websocket_pushes_events_and_keeps_score_per_connection() {
        let app = TestApp::new();
        let addr = serve(&app).await;
        let theme = app.state.theme.clone();
        let baseline = theme.listener_count();

        let mut a = ws_connect(addr).await;
        let mut b = ws_connect(addr).await;
        assert_eq!(theme.listener_count(), baseline + 2);

        ws_send(&mut a, json!({ "type": "set_theme", "mode": "cosmic" })).await;
        for ws in [&mut a, &mut b] {
            let t = ws_next(ws, "theme").await;
            assert_eq!(t["mode"], "cosmic");
            assert_eq!(t["actual"], "dark");
        }
        app.request(Method::PUT, "/api/v1/theme", Some(json!({ "mode": "light" })), None).await;
        assert_eq!(ws_next(&mut b, "theme").await["mode"], "light");
        assert_eq!(ws_next(&mut a, "theme").await["mode"], "light");

        ws_send(&mut b, json!({ "type": "send_message", "content": "Привіт, екіпаже!" })).await;
        for ws in [&mut a, &mut b] {
            let c = ws_next(ws, "chat").await;
            assert_eq!(c["event"], "inserted");
            assert_eq!(c["message"]["content"], "Привіт, екіпаже!");
        }

        let right = json!({ "type": "check_answer", "quizId": "css-text-color", "answer": "color" });
        let wrong = json!({ "type": "check_answer", "quizId": "css-text-color", "answer": "font-size" });
        ws_send(&mut a, right.clone()).await;
        let r = ws_next(&mut a, "quiz_result").await;
        assert_eq!(r["correct"], true);
        assert_eq!(r["score"], json!({ "correct": 1, "total": 1 }));
        ws_send(&mut a, wrong).await;
        let r = ws_next(&mut a, "quiz_result").await;
        assert_eq!(r["correct"], false);
        assert_eq!(r["score"], json!({ "correct": 1, "total": 2 }));
        ws_send(&mut b, right).await;
        assert_eq!(ws_next(&mut b, "quiz_result").await["score"], json!({ "correct": 1, "total": 1 }));

        a.close(None).await.unwrap();
        drop(a);
        for _ in 0..100 {
            if theme.listener_count() == baseline + 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(theme.listener_count(), baseline + 1);
    }
}
