use axum::body::Body;
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::Router;
use richard_api::{build_router, ApiError, AppState};
use richard_core::{
    open_db_in_memory, LearningRepository, NewFlashCard, NewQuizQuestion, NewResource, NewUser,
    ResourceType, SqliteLearningRepository, SqliteUserRepository, TokenClaims, TokenCodec,
    UserId, UserRepository,
};
use rusqlite::Connection;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::util::ServiceExt; // for `oneshot`

const SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    state: AppState,
    ada: UserId,
    grace: UserId,
}

impl TestApp {
    fn new() -> Self {
        Self::with_setup(|_| {})
    }

    fn with_setup(extra: impl FnOnce(&Connection)) -> Self {
        let conn = open_db_in_memory().unwrap();
        let ada = seed_user_with_content(&conn, "ada@example.com", "Ada");
        let grace = seed_user_with_content(&conn, "grace@example.com", "Grace");
        extra(&conn);

        let state = AppState::new(conn, TokenCodec::new(SECRET));
        Self {
            router: build_router(state.clone()),
            state,
            ada,
            grace,
        }
    }

    async fn send(&self, method: Method, uri: &str, auth: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        let request = builder.body(Body::empty()).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

fn seed_user_with_content(conn: &Connection, email: &str, first_name: &str) -> UserId {
    let users = SqliteUserRepository::try_new(conn).unwrap();
    let learning = SqliteLearningRepository::try_new(conn).unwrap();
    let user = users
        .create_user(&NewUser::with_email(email).named(first_name, "Tester"))
        .unwrap();
    let folder = learning
        .create_folder(user.id, user.root_folder_id, "Course")
        .unwrap();
    let resource = learning
        .create_resource(folder.id, &NewResource::new(ResourceType::Text))
        .unwrap();
    let question = learning
        .create_quiz_question(
            resource.id,
            &NewQuizQuestion {
                question: "Question?".to_string(),
                options: vec!["yes".to_string(), "no".to_string()],
                correct_option: "yes".to_string(),
            },
        )
        .unwrap();
    learning
        .create_flash_card(
            question.id,
            &NewFlashCard {
                front: "front".to_string(),
                back: "back".to_string(),
            },
        )
        .unwrap();
    user.id
}

fn bearer(claims: &TokenClaims) -> String {
    format!("Bearer {}", TokenCodec::new(SECRET).encode(claims).unwrap())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[tokio::test]
async fn root_route_needs_no_auth() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hello from richard-api!");
}

#[tokio::test]
async fn read_me_returns_authenticated_profile() {
    let app = TestApp::new();
    let auth = bearer(&TokenClaims::for_user(app.ada));

    let (status, body) = app.send(Method::GET, "/users/me", Some(&auth)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], app.ada);
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["first_name"], "Ada");
    assert_eq!(body["resource_count"], 1);
    assert!(body["root_folder_id"].is_i64());
    assert!(body.get("google_sub").is_none());
}

#[tokio::test]
async fn invalid_credentials_are_rejected_on_both_routes() {
    let app = TestApp::new();
    let expired = bearer(&TokenClaims::for_user(app.ada).expiring_at(now_secs() - 3600));
    let foreign = format!(
        "Bearer {}",
        TokenCodec::new("other-secret")
            .encode(&TokenClaims::for_user(app.ada))
            .unwrap()
    );
    let unknown_user = bearer(&TokenClaims::for_user(app.ada + app.grace + 100));
    let no_user_id = bearer(&TokenClaims::default());

    let cases: [Option<&str>; 7] = [
        None,
        Some("Bearer not-a-jwt"),
        Some("Basic dXNlcjpwYXNz"),
        Some(expired.as_str()),
        Some(foreign.as_str()),
        Some(unknown_user.as_str()),
        Some(no_user_id.as_str()),
    ];
    for (method, uri) in [
        (Method::GET, "/users/me"),
        (Method::DELETE, "/users/delete-account"),
    ] {
        for auth in cases {
            let (status, body) = app.send(method.clone(), uri, auth).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} with {auth:?}");
            assert!(body["detail"].is_string());
        }
    }

    // Nothing was deleted by the rejected calls.
    let auth = bearer(&TokenClaims::for_user(app.ada));
    let (status, _) = app.send(Method::GET, "/users/me", Some(&auth)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unauthorized_response_carries_bearer_challenge() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/users/me")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn malformed_authorization_header_is_unprocessable() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/users/me")
        .header(AUTHORIZATION, HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap())
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_account_removes_everything_and_reports_counts() {
    let app = TestApp::new();
    let auth = bearer(&TokenClaims::for_user(app.ada));

    let (status, body) = app
        .send(Method::DELETE, "/users/delete-account", Some(&auth))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Account successfully deleted");
    assert_eq!(body["deleted_counts"]["flash_cards"], 1);
    assert_eq!(body["deleted_counts"]["quiz_questions"], 1);
    assert_eq!(body["deleted_counts"]["learning_resources"], 1);
    assert_eq!(body["deleted_counts"]["folders"], 2);
    assert_eq!(body["deleted_counts"]["user"], 1);

    let ada = app.ada;
    let (remaining, user) = app
        .state
        .with_conn(move |conn| {
            let repo = SqliteUserRepository::try_new(conn)?;
            Ok((repo.owned_counts(ada)?, repo.get_user(ada)?))
        })
        .await
        .unwrap();
    assert!(remaining.is_empty());
    assert!(user.is_none());

    // Second call with the same token can never succeed.
    let (status, _) = app
        .send(Method::DELETE, "/users/delete-account", Some(&auth))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.send(Method::GET, "/users/me", Some(&auth)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_account_leaves_other_user_untouched() {
    let app = TestApp::new();
    let grace = app.grace;
    let before = app
        .state
        .with_conn(move |conn| Ok(SqliteUserRepository::try_new(conn)?.owned_counts(grace)?))
        .await
        .unwrap();

    let auth = bearer(&TokenClaims::for_user(app.ada));
    let (status, _) = app
        .send(Method::DELETE, "/users/delete-account", Some(&auth))
        .await;
    assert_eq!(status, StatusCode::OK);

    let after = app
        .state
        .with_conn(move |conn| Ok(SqliteUserRepository::try_new(conn)?.owned_counts(grace)?))
        .await
        .unwrap();
    assert_eq!(after, before);

    let grace_auth = bearer(&TokenClaims::for_user(app.grace));
    let (status, body) = app.send(Method::GET, "/users/me", Some(&grace_auth)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "grace@example.com");
}

#[tokio::test]
async fn delete_account_without_folders_succeeds() {
    let app = TestApp::new();
    let lonely = app
        .state
        .with_conn(|conn| {
            let user = SqliteUserRepository::try_new(conn)?
                .create_user(&NewUser::with_email("lonely@example.com"))?;
            conn.execute(
                "UPDATE users SET root_folder_id = NULL WHERE id = ?1;",
                [user.id],
            )
            .map_err(richard_core::RepoError::from)?;
            conn.execute("DELETE FROM resource_folders WHERE user_id = ?1;", [user.id])
                .map_err(richard_core::RepoError::from)?;
            Ok(user.id)
        })
        .await
        .unwrap();

    let auth = bearer(&TokenClaims::for_user(lonely));
    let (status, body) = app
        .send(Method::DELETE, "/users/delete-account", Some(&auth))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted_counts"]["folders"], 0);
    assert_eq!(body["deleted_counts"]["user"], 1);
}

#[tokio::test]
async fn failed_cascade_returns_500_and_keeps_data() {
    let app = TestApp::with_setup(|conn| {
        conn.execute_batch(
            "CREATE TRIGGER reject_card_delete BEFORE DELETE ON flash_cards
             BEGIN
                 SELECT RAISE(ABORT, 'card delete rejected');
             END;",
        )
        .unwrap();
    });
    let auth = bearer(&TokenClaims::for_user(app.ada));

    let (status, body) = app
        .send(Method::DELETE, "/users/delete-account", Some(&auth))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Failed to delete account");

    let (status, body) = app.send(Method::GET, "/users/me", Some(&auth)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resource_count"], 1);

    let ada = app.ada;
    let counts = app
        .state
        .with_conn(move |conn| Ok(SqliteUserRepository::try_new(conn)?.owned_counts(ada)?))
        .await
        .unwrap();
    assert_eq!(counts.folders, 2);
    assert_eq!(counts.flash_cards, 1);
}

#[tokio::test]
async fn panic_inside_storage_work_does_not_wedge_later_requests() {
    let app = TestApp::new();
    let failed = app
        .state
        .with_conn(|conn| -> Result<(), ApiError> {
            conn.execute_batch("BEGIN IMMEDIATE;").unwrap();
            panic!("storage work blew up");
        })
        .await;
    assert!(failed.is_err());

    let auth = bearer(&TokenClaims::for_user(app.ada));
    let (status, body) = app.send(Method::GET, "/users/me", Some(&auth)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");

    // The half-open transaction was rolled back, so a new write can begin.
    let (status, _) = app
        .send(Method::DELETE, "/users/delete-account", Some(&auth))
        .await;
    assert_eq!(status, StatusCode::OK);
}
