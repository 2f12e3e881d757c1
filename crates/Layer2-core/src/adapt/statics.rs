//! Statics Adapter - `/<prefix>/<mount-id>/...` 요청을 서브앱 정적 파일로 연결

use crate::application::{text_response, Application, Request, Response};
use crate::plugin::SharedRegistry;
use async_trait::async_trait;
use graft_foundation::{Error, Result};
use http::{Method, StatusCode};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// StaticFiles - 디렉토리 정적 파일 제공
// ============================================================================

/// 디렉토리 기반 정적 파일 핸들러
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL 경로를 파일 경로로 변환. 루트 밖을 가리키면 `None`
    fn resolve(&self, uri_path: &str) -> Option<PathBuf> {
        let decoded = urlencoding::decode(uri_path).ok()?;
        let relative = Path::new(decoded.trim_start_matches('/'));

        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(path)
    }
}

/// 확장자로 Content-Type 추정
fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Application for StaticFiles {
    async fn call(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        if method != Method::GET && method != Method::HEAD {
            return text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        }

        let Some(path) = self.resolve(request.uri().path()) else {
            return text_response(StatusCode::NOT_FOUND, "Not Found");
        };

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            _ => return text_response(StatusCode::NOT_FOUND, "Not Found"),
        }

        let body = tokio::fs::read(&path).await?;
        let length = body.len();
        let body = if method == Method::HEAD { Vec::new() } else { body };

        http::Response::builder()
            .status(StatusCode::OK)
            .header(http::header::CONTENT_TYPE, content_type(&path))
            .header(http::header::CONTENT_LENGTH, length)
            .body(body)
            .map_err(|e| Error::Http(e.to_string()))
    }
}

// ============================================================================
// PluggedStaticsMiddleware
// ============================================================================

/// 서브앱 정적 파일 미들웨어
///
/// `/<prefix>/<segment>/<rest>` 요청에서 `segment`를 mount id(없으면 모듈 이름)로 조회하고,
/// 찾으면 경로를 `<rest>`로 바꿔 서브앱 정적 파일 핸들러로 넘깁니다.
/// 그 외 요청은 감싼 애플리케이션으로 그대로 전달합니다.
pub struct PluggedStaticsMiddleware {
    app: Arc<dyn Application>,
    registry: SharedRegistry,
    pattern: Regex,
}

impl PluggedStaticsMiddleware {
    pub fn new(app: Arc<dyn Application>, registry: SharedRegistry, prefix: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"^/{}/([^/]+)(/.*)?$",
            regex::escape(prefix.trim_matches('/'))
        ))
        .map_err(|e| Error::Config(format!("Invalid static prefix {}: {}", prefix, e)))?;

        Ok(Self {
            app,
            registry,
            pattern,
        })
    }
}

/// 요청 경로 교체 (쿼리 유지)
fn rewrite_path(request: Request, path: &str) -> Result<Request> {
    let (mut parts, body) = request.into_parts();
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };
    parts.uri = path_and_query
        .parse::<http::Uri>()
        .map_err(|e| Error::Http(e.to_string()))?;
    Ok(Request::from_parts(parts, body))
}

#[async_trait]
impl Application for PluggedStaticsMiddleware {
    async fn call(&self, request: Request) -> Result<Response> {
        let target = self.pattern.captures(request.uri().path()).map(|caps| {
            let segment = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
            let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("/").to_string();
            (segment, rest)
        });

        if let Some((segment, rest)) = target {
            let record = self.registry.read().module_for_mount(&segment);
            if let Some(statics) = record.and_then(|r| r.statics()) {
                debug!("Serving {} from {} statics", rest, segment);
                let request = rewrite_path(request, &rest)?;
                return statics.call(request).await;
            }
        }

        self.app.call(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_traversal() {
        let statics = StaticFiles::new("/srv/public");
        assert_eq!(
            statics.resolve("/img/logo.png"),
            Some(PathBuf::from("/srv/public/img/logo.png"))
        );
        assert_eq!(statics.resolve("/../etc/passwd"), None);
        assert_eq!(statics.resolve("/img/%2e%2e/%2e%2e/secret"), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a.PNG")), "image/png");
        assert_eq!(content_type(Path::new("a.css")), "text/css; charset=utf-8");
        assert_eq!(content_type(Path::new("a")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_serves_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("img/logo.png"), b"PNG").unwrap();

        let statics = StaticFiles::new(dir.path());
        let request = http::Request::get("/img/logo.png").body(Vec::new()).unwrap();
        let response = statics.call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), b"PNG");

        let missing = http::Request::get("/img/none.png").body(Vec::new()).unwrap();
        assert_eq!(
            statics.call(missing).await.unwrap().status(),
            StatusCode::NOT_FOUND
        );
    }
}
