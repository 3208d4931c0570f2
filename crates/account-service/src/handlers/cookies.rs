//! Session cookie construction and parsing.
//!
//! Cookie flags come from one explicit options value built from
//! configuration at startup; nothing here consults the environment.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    /// `Secure` is set only in production deployments.
    pub secure: bool,
}

/// Build a `Set-Cookie` value for a session token.
pub fn session_cookie(name: &str, value: &str, max_age_secs: i64, opts: CookieOptions) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, value, max_age_secs
    );
    if opts.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build a `Set-Cookie` value that clears a session cookie.
pub fn expired_cookie(name: &str, opts: CookieOptions) -> String {
    session_cookie(name, "", 0, opts)
}

/// Extract a cookie value from the request's `Cookie` header(s).
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
        .next()
}
