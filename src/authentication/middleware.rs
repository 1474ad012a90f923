use warp::{reject::Rejection, Filter};

use crate::constants::SESSION_COOKIE;
use crate::database::error::Error;

use super::jwt::{verify_jwt_session, JwtKeys, Requester, SessionData};

/// Extracts the token from `Authorization: Bearer <t>` or `Authorization: Token <t>`.
pub fn authorization_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    if token.is_empty() {
        return None;
    }
    if scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token") {
        return Some(token);
    }
    None
}

fn resolve_requester(header: Option<String>, cookie: Option<String>, keys: &JwtKeys) -> Requester {
    let token = header
        .as_deref()
        .and_then(authorization_token)
        .map(str::to_owned)
        .or(cookie);

    match token {
        Some(token) => match verify_jwt_session(&token, keys) {
            Ok(data) => Requester::User(data.into()),
            Err(e) => {
                log::info!("Ignoring session token: {e}");
                Requester::Anonymous
            }
        },
        None => Requester::Anonymous,
    }
}

/// Never rejects; a missing or invalid token yields `Requester::Anonymous`.
pub fn with_requester(
    keys: JwtKeys,
) -> impl Filter<Extract = (Requester,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .map(move |header: Option<String>, cookie: Option<String>| {
            resolve_requester(header, cookie, &keys)
        })
}

/// Rejects with `401` unless the request carries a valid session.
pub fn with_session(
    keys: JwtKeys,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_requester(keys).and_then(|requester: Requester| async move {
        match requester {
            Requester::User(session) => Ok(session),
            Requester::Anonymous => Err(warp::reject::custom(Error::unauthorized())),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{sign_session, tests as jwt_tests};
    use crate::schema::UserRole;
    use rstest::rstest;

    #[rstest]
    #[case("Bearer abc.def", Some("abc.def"))]
    #[case("Token abc.def", Some("abc.def"))]
    #[case("bearer   abc.def  ", Some("abc.def"))]
    #[case("Basic dXNlcjpwYXNz", None)]
    #[case("Bearer ", None)]
    #[case("abc.def", None)]
    fn parses_authorization_header(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(authorization_token(header), expected);
    }

    #[tokio::test]
    async fn header_token_identifies_user() {
        let keys = jwt_tests::keys();
        let token = sign_session(&jwt_tests::user(5, UserRole::User), &keys).unwrap();

        let requester = warp::test::request()
            .header("authorization", format!("Bearer {token}"))
            .filter(&with_requester(keys))
            .await
            .unwrap();
        assert_eq!(requester.user_id(), Some(5));
    }

    #[tokio::test]
    async fn cookie_token_identifies_user() {
        let keys = jwt_tests::keys();
        let token = sign_session(&jwt_tests::user(8, UserRole::User), &keys).unwrap();

        let requester = warp::test::request()
            .header("cookie", format!("{SESSION_COOKIE}={token}"))
            .filter(&with_requester(keys))
            .await
            .unwrap();
        assert_eq!(requester.user_id(), Some(8));
    }

    #[tokio::test]
    async fn garbage_token_is_anonymous() {
        let requester = warp::test::request()
            .header("authorization", "Bearer not-a-jwt")
            .filter(&with_requester(jwt_tests::keys()))
            .await
            .unwrap();
        assert_eq!(requester, Requester::Anonymous);
    }

    #[tokio::test]
    async fn session_is_required() {
        let result = warp::test::request()
            .filter(&with_session(jwt_tests::keys()))
            .await;

        let rejection = result.unwrap_err();
        assert!(matches!(rejection.find::<Error>(), Some(Error::Unauthorized(_))));
    }
}
