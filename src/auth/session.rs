use actix_web::{
    HttpRequest,
    cookie::{Cookie, SameSite, time::Duration},
    dev::ServiceRequest,
    http::header::{AUTHORIZATION, HeaderMap},
};

use crate::config::Config;

pub const COOKIE_NAME: &str = "auth_token";

pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build(COOKIE_NAME, token)
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(config.session_ttl as i64))
        .finish()
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(COOKIE_NAME, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Session token from the `auth_token` cookie, falling back to `Authorization: Bearer`
pub fn token_from(req: &HttpRequest) -> Option<String> {
    pick_token(req.cookie(COOKIE_NAME), req.headers())
}

/// Same lookup for middleware, before the request reaches a handler
pub fn service_token(req: &ServiceRequest) -> Option<String> {
    pick_token(req.cookie(COOKIE_NAME), req.headers())
}

fn pick_token(cookie: Option<Cookie<'static>>, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = cookie.filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn cookie_wins_over_bearer_header() {
        let req = TestRequest::default()
            .cookie(Cookie::new(COOKIE_NAME, "from-cookie"))
            .insert_header((AUTHORIZATION, "Bearer from-header"))
            .to_http_request();

        assert_eq!(token_from(&req).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_header_is_a_fallback() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc.def"))
            .to_http_request();
        assert_eq!(token_from(&req).as_deref(), Some("abc.def"));

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert_eq!(token_from(&req), None);
    }

    #[test]
    fn middleware_lookup_matches_handler_lookup() {
        let req = TestRequest::default()
            .cookie(Cookie::new(COOKIE_NAME, ""))
            .insert_header((AUTHORIZATION, "Bearer xyz"))
            .to_srv_request();
        assert_eq!(service_token(&req).as_deref(), Some("xyz"));

        let req = TestRequest::default()
            .cookie(Cookie::new(COOKIE_NAME, "from-cookie"))
            .to_srv_request();
        assert_eq!(service_token(&req).as_deref(), Some("from-cookie"));
    }
}
