//! Application - 요청 처리 인터페이스
//!
//! 호스트 WSGI 스타일 애플리케이션과 미들웨어가 구현합니다.

use async_trait::async_trait;
use graft_foundation::Result;

/// HTTP 요청 (본문은 바이트)
pub type Request = http::Request<Vec<u8>>;

/// HTTP 응답 (본문은 바이트)
pub type Response = http::Response<Vec<u8>>;

/// 요청 처리기
#[async_trait]
pub trait Application: Send + Sync {
    async fn call(&self, request: Request) -> Result<Response>;
}

/// 상태 코드와 텍스트 본문으로 응답 생성
pub fn text_response(status: http::StatusCode, body: impl Into<String>) -> Result<Response> {
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(body.into().into_bytes())
        .map_err(|e| graft_foundation::Error::Http(e.to_string()))
}
