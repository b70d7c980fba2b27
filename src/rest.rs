//! REST client for the asset-management backend.
//!
//! Two cross-cutting hooks live here and nowhere else:
//! - every outgoing request gets `Authorization: Bearer <token>` when a token
//!   is stored;
//! - every 401 clears the session and comes back as
//!   [`ConsoleError::Unauthorized`] carrying the login redirect.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::gate::{self, LOGIN_PATH};
use crate::models::{Identity, LoginRequest};
use crate::session::SessionManager;

pub const LOGIN_ENDPOINT: &str = "/authentication/login";

/// Keys that may carry the token in a login response, in order.
const LOGIN_TOKEN_KEYS: &[&str] = &["token", "accessToken"];
/// Keys that may carry a human-readable error in a failure payload, in order.
const ERROR_MESSAGE_KEYS: &[&str] = &["message", "error", "title"];

const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub identity: Option<Identity>,
    /// Where the console should navigate next.
    pub landing: &'static str,
}

#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    session: SessionManager,
}

impl RestClient {
    pub fn new(config: &ConsoleConfig, session: SessionManager) -> ConsoleResult<Self> {
        let http = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self::with_client(http, &config.api_base_url, session))
    }

    pub fn with_client(http: Client, base_url: &str, session: SessionManager) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            session,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds a request and runs the bearer hook on it.
    fn request(&self, method: Method, path: &str) -> ConsoleResult<RequestBuilder> {
        debug!(%method, path, "backend request");
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        Ok(match self.session.retrieve()? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Sends and runs the response interceptor.
    async fn execute(&self, builder: RequestBuilder) -> ConsoleResult<Response> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            if let Err(err) = self.session.clear() {
                warn!(error = %err, "failed to clear session after 401");
            }
            warn!("backend rejected the session; signed out");
            return Err(ConsoleError::Unauthorized {
                message: server_message(&body).unwrap_or_else(|| SESSION_EXPIRED.to_owned()),
                redirect: LOGIN_PATH.to_owned(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "backend request failed");
            return Err(ConsoleError::Api {
                status: status.as_u16(),
                message: server_message(&body),
            });
        }

        Ok(response)
    }

    /// Success body as JSON. An empty body reads as `null` and a plain-text
    /// confirmation as a JSON string.
    async fn read_value(response: Response) -> ConsoleResult<Value> {
        let text = response.text().await?;
        Ok(success_body(&text))
    }

    pub async fn get_value(&self, path: &str) -> ConsoleResult<Value> {
        let response = self.execute(self.request(Method::GET, path)?).await?;
        Self::read_value(response).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ConsoleResult<T> {
        Ok(serde_json::from_value(self.get_value(path).await?)?)
    }

    /// POST/PUT with a JSON body; returns the raw response (possibly `null`).
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ConsoleResult<Value> {
        let builder = self.request(method, path)?.json(body);
        let response = self.execute(builder).await?;
        Self::read_value(response).await
    }

    pub async fn delete(&self, path: &str) -> ConsoleResult<()> {
        self.execute(self.request(Method::DELETE, path)?).await?;
        Ok(())
    }

    /// Signs in, stores the token, and reports where to land.
    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<LoginOutcome> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ConsoleError::Validation(
                "username and password are required".to_owned(),
            ));
        }

        let builder = self.request(Method::POST, LOGIN_ENDPOINT)?.json(&LoginRequest {
            username: username.to_owned(),
            password: password.to_owned(),
        });
        let response = self.execute(builder).await?;
        let body = response.text().await?;
        let token = token_from_login_body(&body).ok_or_else(|| {
            ConsoleError::UnexpectedResponse("token missing in login response".to_owned())
        })?;

        self.session.store(&token)?;
        let identity = self.session.identity();
        let display_name = identity
            .as_ref()
            .and_then(|identity| identity.username.as_deref())
            .unwrap_or(username);
        self.session.set_display_name(display_name)?;

        let landing = gate::navigate(gate::default_landing(identity.as_ref()), identity.as_ref());
        info!(
            username = display_name,
            role = ?identity.as_ref().and_then(|identity| identity.role),
            landing,
            "signed in"
        );
        Ok(LoginOutcome { identity, landing })
    }

    pub fn logout(&self) -> ConsoleResult<()> {
        self.session.clear()?;
        info!("signed out");
        Ok(())
    }
}

/// The login endpoint has answered `{token}`, `{accessToken}` and a bare
/// string over time; all three are accepted.
pub fn token_from_login_body(body: &str) -> Option<String> {
    let non_blank = |text: &str| {
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_owned())
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => LOGIN_TOKEN_KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str).and_then(non_blank)),
        Ok(Value::String(raw)) => non_blank(&raw),
        Ok(_) => None,
        // text/plain token
        Err(_) => non_blank(body).filter(|raw| !raw.contains(char::is_whitespace)),
    }
}

pub fn success_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

/// Best-effort message from an error payload. `None` when the shape is not
/// recognized, so callers fall back to their own wording.
pub fn server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let non_blank = |text: &str| {
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_owned())
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => ERROR_MESSAGE_KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str).and_then(non_blank)),
        Ok(Value::String(text)) => non_blank(&text),
        Ok(_) => None,
        Err(_) if body.starts_with('<') || body.len() > 300 => None,
        Err(_) => Some(body.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_token_shapes() {
        assert_eq!(token_from_login_body(r#"{"token":"t1"}"#).as_deref(), Some("t1"));
        assert_eq!(
            token_from_login_body(r#"{"accessToken":"t2"}"#).as_deref(),
            Some("t2")
        );
        assert_eq!(
            token_from_login_body(r#"{"token":"t1","accessToken":"t2"}"#).as_deref(),
            Some("t1")
        );
        assert_eq!(token_from_login_body(r#""t3""#).as_deref(), Some("t3"));
        assert_eq!(token_from_login_body("t4.raw.text").as_deref(), Some("t4.raw.text"));
    }

    #[test]
    fn test_login_token_missing() {
        assert_eq!(token_from_login_body(r#"{"user":"alice"}"#), None);
        assert_eq!(token_from_login_body(r#"{"token":""}"#), None);
        assert_eq!(token_from_login_body("null"), None);
        assert_eq!(token_from_login_body(""), None);
        assert_eq!(token_from_login_body("not a token"), None);
    }

    #[test]
    fn test_success_body_shapes() {
        assert_eq!(success_body(""), Value::Null);
        assert_eq!(success_body(" \n"), Value::Null);
        assert_eq!(success_body(r#"{"assetId":3}"#), serde_json::json!({"assetId": 3}));
        assert_eq!(
            success_body("Asset created successfully"),
            Value::String("Asset created successfully".into())
        );
    }

    #[test]
    fn test_server_message_extraction() {
        assert_eq!(
            server_message(r#"{"message":"Asset not found"}"#).as_deref(),
            Some("Asset not found")
        );
        assert_eq!(
            server_message(r#"{"error":"Allocation exists"}"#).as_deref(),
            Some("Allocation exists")
        );
        assert_eq!(
            server_message(r#"{"title":"One or more validation errors occurred.","status":400}"#)
                .as_deref(),
            Some("One or more validation errors occurred.")
        );
        assert_eq!(server_message(r#""Invalid credentials""#).as_deref(), Some("Invalid credentials"));
        assert_eq!(server_message("Employee has open requests").as_deref(), Some("Employee has open requests"));
    }

    #[test]
    fn test_server_message_unrecognized_shapes() {
        assert_eq!(server_message(""), None);
        assert_eq!(server_message(r#"{"code":17}"#), None);
        assert_eq!(server_message("[1,2]"), None);
        assert_eq!(server_message("<html><body>Bad Gateway</body></html>"), None);
    }
}
