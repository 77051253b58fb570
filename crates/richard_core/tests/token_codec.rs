use richard_core::db::open_db_in_memory;
use richard_core::{
    AccountError, AccountService, AuthError, NewUser, SqliteUserRepository, TokenClaims,
    TokenCodec, UserRepository,
};
use std::time::{SystemTime, UNIX_EPOCH};

const SECRET: &str = "test-secret";

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[test]
fn token_without_exp_is_accepted() {
    let codec = TokenCodec::new(SECRET);
    let token = codec.encode(&TokenClaims::for_user(7)).unwrap();

    let claims = codec.decode(&token).unwrap();
    assert_eq!(claims.user_id, Some(7));
    assert_eq!(claims.exp, None);
    assert_eq!(codec.user_id(&token).unwrap(), 7);
}

#[test]
fn expired_token_is_rejected() {
    let codec = TokenCodec::new(SECRET);
    let token = codec
        .encode(&TokenClaims::for_user(7).expiring_at(now_secs() - 3600))
        .unwrap();
    assert!(matches!(codec.decode(&token), Err(AuthError::Expired)));

    let fresh = codec
        .encode(&TokenClaims::for_user(7).expiring_at(now_secs() + 3600))
        .unwrap();
    assert_eq!(codec.user_id(&fresh).unwrap(), 7);
}

#[test]
fn token_signed_with_other_secret_or_garbage_is_invalid() {
    let codec = TokenCodec::new(SECRET);
    let foreign = TokenCodec::new("other-secret")
        .encode(&TokenClaims::for_user(7))
        .unwrap();
    assert!(matches!(codec.decode(&foreign), Err(AuthError::Invalid(_))));
    assert!(matches!(codec.decode("not.a.jwt"), Err(AuthError::Invalid(_))));
    assert!(matches!(codec.decode(""), Err(AuthError::Invalid(_))));
}

#[test]
fn token_without_user_id_is_rejected() {
    let codec = TokenCodec::new(SECRET);
    let claims = TokenClaims {
        email: Some("ada@example.com".to_string()),
        ..TokenClaims::default()
    };
    let token = codec.encode(&claims).unwrap();
    assert!(matches!(codec.user_id(&token), Err(AuthError::MissingUserId)));
}

#[test]
fn authenticate_requires_existing_user() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let user = repo
        .create_user(&NewUser::with_email("ada@example.com"))
        .unwrap();
    let service = AccountService::new(repo);
    let codec = TokenCodec::new(SECRET);

    let token = codec.encode(&TokenClaims::for_user(user.id)).unwrap();
    assert_eq!(service.authenticate(&codec, &token).unwrap().id, user.id);

    let stale = codec.encode(&TokenClaims::for_user(user.id + 1)).unwrap();
    assert!(matches!(
        service.authenticate(&codec, &stale),
        Err(AccountError::UserNotFound(_))
    ));
    assert!(matches!(
        service.authenticate(&codec, "garbage"),
        Err(AccountError::Auth(AuthError::Invalid(_)))
    ));
}
