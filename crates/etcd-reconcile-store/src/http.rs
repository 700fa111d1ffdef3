//! etcd v2 REST implementation of the directory traits.
//!
//! Auth resources are JSON documents under `/v2/auth/{roles,users}/{name}`;
//! keys are form-encoded writes under `/v2/keys/{key}`. A 404 on a read maps
//! to "absent", 409 and 412 map to [`StoreError::Conflict`].

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use etcd_reconcile_core::{KeyValue, PermissionClass, RoleRecord, StoreRolePermissions, UserRecord};

use crate::config::{ConnectionSettings, Credentials, StoreConfig};
use crate::error::{Result, StoreError};
use crate::traits::{KeyValueDirectory, RoleDirectory, UserDirectory};

/// Directory backed by a live etcd v2 endpoint.
#[derive(Clone)]
pub struct HttpDirectory {
    client: reqwest::Client,
    base: Url,
    credentials: Option<Credentials>,
}

impl HttpDirectory {
    /// Build a client from resolved settings. Does not touch the network.
    pub fn new(settings: ConnectionSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            base: settings.endpoint,
            credentials: settings.credentials,
        })
    }

    /// Resolve `config`, build a client and check the endpoint is reachable.
    ///
    /// A failed check is logged and otherwise ignored; the first real call
    /// will surface the problem.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let directory = Self::new(config.resolve()?)?;

        match directory.ping().await {
            Ok(()) => debug!(endpoint = %directory.base, "Connected to store"),
            Err(e) => warn!(
                endpoint = %directory.base,
                error = %e,
                "Store connectivity check failed"
            ),
        }
        Ok(directory)
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    async fn ping(&self) -> Result<()> {
        let response = self.request(Method::GET, self.url("/v2/keys/")).send().await?;
        match check(response, "key", "/").await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    fn role_url(&self, name: &str) -> String {
        self.url(&format!("/v2/auth/roles/{}", urlencoding::encode(name)))
    }

    fn user_url(&self, username: &str) -> String {
        self.url(&format!("/v2/auth/users/{}", urlencoding::encode(username)))
    }

    fn key_url(&self, key: &str) -> String {
        self.url(&format!("/v2/keys/{}", encode_key_path(key)))
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.credentials {
            Some(c) => builder.basic_auth(&c.username, Some(&c.password)),
            None => builder,
        }
    }

    async fn put_role(&self, body: &RoleRequest<'_>) -> Result<()> {
        let response = self
            .request(Method::PUT, self.role_url(body.role))
            .json(body)
            .send()
            .await?;
        check(response, "role", body.role).await?;
        Ok(())
    }

    async fn put_user(&self, body: &UserRequest<'_>) -> Result<()> {
        let response = self
            .request(Method::PUT, self.user_url(body.user))
            .json(body)
            .send()
            .await?;
        check(response, "user", body.user).await?;
        Ok(())
    }

    async fn put_key(&self, key: &str, value: &str, create_only: bool) -> Result<KeyValue> {
        let mut form = format!("value={}", urlencoding::encode(value));
        if create_only {
            form.push_str("&prevExist=false");
        }

        let response = self
            .request(Method::PUT, self.key_url(key))
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await?;
        let response = check(response, "key", key).await?;
        read_node(response).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RoleRequest<'a> {
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    grant: Option<PermsWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    revoke: Option<PermsWire>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PermsWire {
    #[serde(default)]
    kv: RwWire,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RwWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    read: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    write: Option<Vec<String>>,
}

impl PermsWire {
    fn for_class(paths: &[String], class: PermissionClass) -> Self {
        Self {
            kv: RwWire {
                read: class.grants_read().then(|| paths.to_vec()),
                write: class.grants_write().then(|| paths.to_vec()),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RoleResponse {
    role: String,
    #[serde(default)]
    permissions: PermsWire,
}

impl From<RoleResponse> for RoleRecord {
    fn from(wire: RoleResponse) -> Self {
        RoleRecord {
            name: wire.role,
            permissions: StoreRolePermissions {
                read_paths: wire.permissions.kv.read.unwrap_or_default(),
                write_paths: wire.permissions.kv.write.unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct UserRequest<'a> {
    user: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grant: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    revoke: Option<&'a [String]>,
}

impl<'a> UserRequest<'a> {
    fn new(user: &'a str) -> Self {
        Self {
            user,
            password: None,
            grant: None,
            revoke: None,
        }
    }
}

/// Older servers list role names, newer ones embed role documents.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RoleRef {
    Name(String),
    Detailed { role: String },
}

impl RoleRef {
    fn into_name(self) -> String {
        match self {
            Self::Name(name) | Self::Detailed { role: name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: String,
    #[serde(default)]
    roles: Option<Vec<RoleRef>>,
}

impl From<UserResponse> for UserRecord {
    fn from(wire: UserResponse) -> Self {
        UserRecord {
            username: wire.user,
            roles: wire
                .roles
                .unwrap_or_default()
                .into_iter()
                .map(RoleRef::into_name)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct KeyResponse {
    node: NodeWire,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeWire {
    key: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    modified_index: u64,
}

impl From<NodeWire> for KeyValue {
    fn from(node: NodeWire) -> Self {
        KeyValue {
            key: node.key,
            value: node.value,
            modified_index: node.modified_index,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    cause: Option<String>,
}

/// Each segment is percent-encoded on its own so `/` keeps separating directories.
fn encode_key_path(key: &str) -> String {
    key.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Human-readable message from an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message,
            cause: Some(cause),
        }) if !cause.is_empty() => format!("{message} ({cause})"),
        Ok(ErrorBody { message, .. }) => message,
        Err(_) => body.trim().to_string(),
    }
}

fn status_error(status: StatusCode, kind: &'static str, name: &str, body: &str) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::not_found(kind, name),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
            StoreError::conflict(kind, name, error_message(body))
        }
        other => StoreError::Status {
            status: other.as_u16(),
            message: error_message(body),
        },
    }
}

/// Pass successful responses through, map everything else to a [`StoreError`].
async fn check(response: Response, kind: &'static str, name: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, kind, name, &body))
}

async fn read_node(response: Response) -> Result<KeyValue> {
    let body = response.text().await?;
    let parsed: KeyResponse = serde_json::from_str(&body)
        .map_err(|e| StoreError::InvalidResponse(format!("key response: {e}")))?;
    Ok(parsed.node.into())
}

fn absent_on_not_found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trait implementations
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RoleDirectory for HttpDirectory {
    async fn add_role(&self, name: &str) -> Result<()> {
        self.put_role(&RoleRequest {
            role: name,
            grant: None,
            revoke: None,
        })
        .await
    }

    async fn remove_role(&self, name: &str) -> Result<()> {
        let response = self.request(Method::DELETE, self.role_url(name)).send().await?;
        check(response, "role", name).await?;
        Ok(())
    }

    async fn get_role(&self, name: &str) -> Result<Option<RoleRecord>> {
        let response = self.request(Method::GET, self.role_url(name)).send().await?;
        let Some(response) = absent_on_not_found(check(response, "role", name).await)? else {
            return Ok(None);
        };

        let wire: RoleResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("role {name}: {e}")))?;
        Ok(Some(wire.into()))
    }

    async fn grant_role_kv(
        &self,
        name: &str,
        paths: &[String],
        class: PermissionClass,
    ) -> Result<()> {
        self.put_role(&RoleRequest {
            role: name,
            grant: Some(PermsWire::for_class(paths, class)),
            revoke: None,
        })
        .await
    }

    async fn revoke_role_kv(
        &self,
        name: &str,
        paths: &[String],
        class: PermissionClass,
    ) -> Result<()> {
        self.put_role(&RoleRequest {
            role: name,
            grant: None,
            revoke: Some(PermsWire::for_class(paths, class)),
        })
        .await
    }
}

#[async_trait]
impl UserDirectory for HttpDirectory {
    async fn add_user(&self, username: &str, password: &str) -> Result<()> {
        self.put_user(&UserRequest {
            password: Some(password),
            ..UserRequest::new(username)
        })
        .await
    }

    async fn remove_user(&self, username: &str) -> Result<()> {
        let response = self.request(Method::DELETE, self.user_url(username)).send().await?;
        check(response, "user", username).await?;
        Ok(())
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let response = self.request(Method::GET, self.user_url(username)).send().await?;
        let Some(response) = absent_on_not_found(check(response, "user", username).await)? else {
            return Ok(None);
        };

        let wire: UserResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("user {username}: {e}")))?;
        Ok(Some(wire.into()))
    }

    async fn change_password(&self, username: &str, password: &str) -> Result<()> {
        self.put_user(&UserRequest {
            password: Some(password),
            ..UserRequest::new(username)
        })
        .await
    }

    async fn grant_user(&self, username: &str, roles: &[String]) -> Result<()> {
        self.put_user(&UserRequest {
            grant: Some(roles),
            ..UserRequest::new(username)
        })
        .await
    }

    async fn revoke_user(&self, username: &str, roles: &[String]) -> Result<()> {
        self.put_user(&UserRequest {
            revoke: Some(roles),
            ..UserRequest::new(username)
        })
        .await
    }
}

#[async_trait]
impl KeyValueDirectory for HttpDirectory {
    async fn create_key(&self, key: &str, value: &str) -> Result<KeyValue> {
        self.put_key(key, value, true).await
    }

    async fn set_key(&self, key: &str, value: &str) -> Result<KeyValue> {
        self.put_key(key, value, false).await
    }

    async fn get_key(&self, key: &str) -> Result<Option<KeyValue>> {
        let response = self.request(Method::GET, self.key_url(key)).send().await?;
        match absent_on_not_found(check(response, "key", key).await)? {
            Some(response) => read_node(response).await.map(Some),
            None => Ok(None),
        }
    }

    async fn delete_key(&self, key: &str) -> Result<bool> {
        let response = self.request(Method::DELETE, self.key_url(key)).send().await?;
        Ok(absent_on_not_found(check(response, "key", key).await)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn directory(endpoint: &str) -> HttpDirectory {
        HttpDirectory::new(ConnectionSettings {
            endpoint: Url::parse(endpoint).unwrap(),
            credentials: None,
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let dir = directory("http://etcd:2379/");

        assert_eq!(dir.role_url("app"), "http://etcd:2379/v2/auth/roles/app");
        assert_eq!(dir.user_url("a b"), "http://etcd:2379/v2/auth/users/a%20b");
        assert_eq!(dir.key_url("/app/config"), "http://etcd:2379/v2/keys/app/config");
        assert_eq!(dir.key_url("plain"), "http://etcd:2379/v2/keys/plain");
    }

    #[test]
    fn test_key_segments_encoded_separately() {
        assert_eq!(encode_key_path("/a b/c?d"), "a%20b/c%3Fd");
    }

    #[test]
    fn test_grant_body_for_each_class() {
        let paths = vec!["/x".to_string()];

        let body = RoleRequest {
            role: "app",
            grant: Some(PermsWire::for_class(&paths, PermissionClass::ReadOnly)),
            revoke: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"role": "app", "grant": {"kv": {"read": ["/x"]}}})
        );

        let body = RoleRequest {
            role: "app",
            grant: None,
            revoke: Some(PermsWire::for_class(&paths, PermissionClass::ReadWrite)),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"role": "app", "revoke": {"kv": {"read": ["/x"], "write": ["/x"]}}})
        );
    }

    #[test]
    fn test_user_body_omits_unset_fields() {
        let roles = vec!["reader".to_string()];
        let body = UserRequest {
            grant: Some(&roles),
            ..UserRequest::new("alice")
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"user": "alice", "grant": ["reader"]})
        );
    }

    #[test]
    fn test_parse_role_response() {
        let wire: RoleResponse = serde_json::from_str(
            r#"{"role":"app","permissions":{"kv":{"read":["/a","/b"],"write":null}}}"#,
        )
        .unwrap();
        let record = RoleRecord::from(wire);

        assert_eq!(record.name, "app");
        assert_eq!(record.permissions.read_paths, vec!["/a", "/b"]);
        assert!(record.permissions.write_paths.is_empty());
    }

    #[test]
    fn test_parse_role_without_permissions() {
        let wire: RoleResponse = serde_json::from_str(r#"{"role":"empty"}"#).unwrap();
        assert!(RoleRecord::from(wire).permissions.is_empty());
    }

    #[test]
    fn test_parse_user_role_forms() {
        let names: UserResponse =
            serde_json::from_str(r#"{"user":"alice","roles":["a","b"]}"#).unwrap();
        assert_eq!(UserRecord::from(names).roles, vec!["a", "b"]);

        let detailed: UserResponse = serde_json::from_str(
            r#"{"user":"alice","roles":[{"role":"a","permissions":{"kv":{"read":["/"]}}}]}"#,
        )
        .unwrap();
        assert_eq!(UserRecord::from(detailed).roles, vec!["a"]);

        let none: UserResponse = serde_json::from_str(r#"{"user":"bob","roles":null}"#).unwrap();
        assert!(UserRecord::from(none).roles.is_empty());
    }

    #[test]
    fn test_parse_key_response() {
        let parsed: KeyResponse = serde_json::from_str(
            r#"{"action":"create",
                "node":{"key":"/a","value":"1","modifiedIndex":7,"createdIndex":7}}"#,
        )
        .unwrap();
        let kv = KeyValue::from(parsed.node);

        assert_eq!(kv.key, "/a");
        assert_eq!(kv.value, "1");
        assert_eq!(kv.modified_index, 7);
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"errorCode":105,"message":"Key already exists","cause":"/a","index":7}"#;

        let err = status_error(StatusCode::PRECONDITION_FAILED, "key", "/a", body);
        match err {
            StoreError::Conflict { message, .. } => {
                assert_eq!(message, "Key already exists (/a)")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(status_error(StatusCode::NOT_FOUND, "role", "app", "").is_not_found());
        assert!(matches!(
            status_error(StatusCode::CONFLICT, "role", "app", "dup"),
            StoreError::Conflict { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "role", "app", "denied"),
            StoreError::Status { status: 401, .. }
        ));
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("  plain text \n"), "plain text");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Canned-response server
    // ─────────────────────────────────────────────────────────────────────────

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// One raw HTTP request as received by the canned server.
    struct Captured(String);

    impl Captured {
        fn request_line(&self) -> &str {
            self.0.lines().next().unwrap_or_default()
        }

        fn header(&self, name: &str) -> Option<&str> {
            let head = self.0.split("\r\n\r\n").next()?;
            head.lines().skip(1).find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
            })
        }

        fn body(&self) -> &str {
            self.0.split_once("\r\n\r\n").map_or("", |(_, body)| body)
        }
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .map_or(0, |v| v.trim().parse::<usize>().unwrap());
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answer one connection per canned `(status, body)` pair, in order,
    /// and hand back what each request looked like.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (Url, JoinHandle<Vec<Captured>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();

        let handle = tokio::spawn(async move {
            let mut captured = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                captured.push(Captured(read_request(&mut stream).await));

                let reason = StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown");
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            captured
        });

        (endpoint, handle)
    }

    fn client(endpoint: Url, credentials: Option<Credentials>) -> HttpDirectory {
        HttpDirectory::new(ConnectionSettings {
            endpoint,
            credentials,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn root() -> Option<Credentials> {
        Some(Credentials {
            username: "root".into(),
            password: "pw".into(),
        })
    }

    const NOT_FOUND: &str = r#"{"errorCode":100,"message":"Key not found","cause":"/x","index":3}"#;

    #[tokio::test]
    async fn test_missing_role_is_absent_and_sends_basic_auth() {
        let (endpoint, server) = serve(vec![(404, r#"{"message":"Role not found"}"#)]).await;
        let dir = client(endpoint, root());

        assert!(dir.get_role("ghost").await.unwrap().is_none());

        let requests = server.await.unwrap();
        assert_eq!(requests[0].request_line(), "GET /v2/auth/roles/ghost HTTP/1.1");
        // base64("root:pw")
        assert_eq!(requests[0].header("authorization"), Some("Basic cm9vdDpwdw=="));
    }

    #[tokio::test]
    async fn test_missing_entities_without_credentials() {
        let (endpoint, server) = serve(vec![
            (404, r#"{"message":"User not found"}"#),
            (404, NOT_FOUND),
            (404, NOT_FOUND),
        ])
        .await;
        let dir = client(endpoint, None);

        assert!(dir.get_user("ghost").await.unwrap().is_none());
        assert!(dir.get_key("/x").await.unwrap().is_none());
        assert!(!dir.delete_key("/x").await.unwrap());

        let requests = server.await.unwrap();
        assert_eq!(requests[0].request_line(), "GET /v2/auth/users/ghost HTTP/1.1");
        assert_eq!(requests[1].request_line(), "GET /v2/keys/x HTTP/1.1");
        assert_eq!(requests[2].request_line(), "DELETE /v2/keys/x HTTP/1.1");
        assert!(requests.iter().all(|r| r.header("authorization").is_none()));
    }

    #[tokio::test]
    async fn test_get_role_parses_body() {
        let (endpoint, server) = serve(vec![(
            200,
            r#"{"role":"app","permissions":{"kv":{"read":["/a"],"write":["/a","/b"]}}}"#,
        )])
        .await;
        let dir = client(endpoint, None);

        let record = dir.get_role("app").await.unwrap().unwrap();
        assert_eq!(record.permissions.read_paths, vec!["/a"]);
        assert_eq!(record.permissions.write_paths, vec!["/a", "/b"]);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_grant_sends_both_lists_for_read_write() {
        let (endpoint, server) = serve(vec![(200, r#"{"role":"app"}"#)]).await;
        let dir = client(endpoint, root());

        dir.grant_role_kv("app", &["/a".to_string()], PermissionClass::ReadWrite)
            .await
            .unwrap();

        let requests = server.await.unwrap();
        assert_eq!(requests[0].request_line(), "PUT /v2/auth/roles/app HTTP/1.1");
        let body: serde_json::Value = serde_json::from_str(requests[0].body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"role": "app", "grant": {"kv": {"read": ["/a"], "write": ["/a"]}}})
        );
    }

    #[tokio::test]
    async fn test_duplicate_grant_is_conflict() {
        let (endpoint, server) = serve(vec![(409, r#"{"message":"duplicate permission"}"#)]).await;
        let dir = client(endpoint, None);

        let err = dir
            .grant_role_kv("app", &["/a".to_string()], PermissionClass::ReadOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_create_key_is_create_only() {
        let (endpoint, server) = serve(vec![
            (
                201,
                r#"{"action":"create","node":{"key":"/cfg","value":"v 1","modifiedIndex":9}}"#,
            ),
            (
                412,
                r#"{"errorCode":105,"message":"Key already exists","cause":"/cfg"}"#,
            ),
        ])
        .await;
        let dir = client(endpoint, None);

        let kv = dir.create_key("/cfg", "v 1").await.unwrap();
        assert_eq!(kv.value, "v 1");
        assert_eq!(kv.modified_index, 9);

        let err = dir.create_key("/cfg", "v 2").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let requests = server.await.unwrap();
        assert_eq!(requests[0].request_line(), "PUT /v2/keys/cfg HTTP/1.1");
        assert_eq!(requests[0].body(), "value=v%201&prevExist=false");
        assert_eq!(
            requests[0].header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[tokio::test]
    async fn test_connect_survives_failed_ping() {
        let (endpoint, server) = serve(vec![(500, r#"{"message":"internal"}"#)]).await;
        let config = StoreConfig::new()
            .with_endpoint(endpoint.as_str())
            .with_credentials("root", "pw");

        let dir = HttpDirectory::connect(&config).await.unwrap();
        assert_eq!(dir.endpoint(), &endpoint);

        let requests = server.await.unwrap();
        assert_eq!(requests[0].request_line(), "GET /v2/keys/ HTTP/1.1");
        assert_eq!(requests[0].header("authorization"), Some("Basic cm9vdDpwdw=="));
    }

    #[tokio::test]
    async fn test_connect_survives_unreachable_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = StoreConfig::new()
            .with_endpoint(format!("http://{addr}"))
            .with_timeout_secs(1);

        assert!(HttpDirectory::connect(&config).await.is_ok());
    }
}
