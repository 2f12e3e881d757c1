//! Error types for Graft
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Graft 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 플러깅 관련 (plug() 호출 시 동기적으로 발생)
    // ========================================================================
    #[error("Pluggable application {0} has already been plugged for this application")]
    AlreadyPlugged(String),

    #[error("Pluggable application {0} doesn't provide a default appid and none has been provided when plugging it")]
    MissingAppId(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    // ========================================================================
    // 배선(wiring) 관련 (지연 실행 중 발생)
    // ========================================================================
    #[error("Unknown model kind: {0}")]
    UnknownModelKind(String),

    #[error("Bootstrap of {module} conflicts with already seeded data: {message}")]
    SeedIntegrityConflict { module: String, message: String },

    #[error("Failed to plug {module}: {source}")]
    WiringFailure {
        module: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Application failed to start: {0}")]
    StartupAborted(String),

    #[error("Cannot resolve mount point: {0}")]
    MountPoint(String),

    // ========================================================================
    // 템플릿 관련
    // ========================================================================
    #[error("Malformed patch declaration: {0}")]
    MalformedPatch(String),

    #[error("Invalid patch action: {0}")]
    InvalidAction(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Cannot resolve partial: {0}")]
    PartialResolution(String),

    // ========================================================================
    // 데이터 관련
    // ========================================================================
    /// 스토어가 보고하는 무결성 위반 (중복 키 등)
    #[error("Integrity error: {0}")]
    Integrity(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Blocked: {0}")]
    Blocked(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("HTTP error: {0}")]
    Http(String),

    /// 서브앱이 제공한 콜백의 에러
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 이미 시드된 데이터와의 충돌인지 확인
    pub fn is_integrity_conflict(&self) -> bool {
        match self {
            Error::Integrity(_) | Error::SeedIntegrityConflict { .. } => true,
            Error::WiringFailure { source, .. } => source.is_integrity_conflict(),
            _ => false,
        }
    }

    /// 호출자에게 바로 보여줄 수 있는 설정 실수인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::AlreadyPlugged(_)
                | Error::MissingAppId(_)
                | Error::ModuleNotFound(_)
                | Error::MalformedPatch(_)
                | Error::InvalidAction(_)
                | Error::Config(_)
        )
    }

    /// 배선 실패 생성 헬퍼
    pub fn wiring(module: impl Into<String>, source: Error) -> Self {
        Error::WiringFailure {
            module: module.into(),
            source: Box::new(source),
        }
    }

    /// 시드 충돌 생성 헬퍼
    pub fn seed_conflict(module: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SeedIntegrityConflict {
            module: module.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_conflict_detection() {
        assert!(Error::Integrity("duplicate key".into()).is_integrity_conflict());
        assert!(Error::seed_conflict("shop", "dup").is_integrity_conflict());
        assert!(!Error::NotFound("x".into()).is_integrity_conflict());

        let wrapped = Error::wiring("shop", Error::Integrity("dup".into()));
        assert!(wrapped.is_integrity_conflict());
    }

    #[test]
    fn test_wiring_failure_message() {
        let err = Error::wiring("shop", Error::MountPoint("billing.x".into()));
        let msg = err.to_string();
        assert!(msg.contains("shop"));
        assert!(msg.contains("billing.x"));
    }

    #[test]
    fn test_user_facing() {
        assert!(Error::AlreadyPlugged("shop".into()).is_user_facing());
        assert!(!Error::Internal("boom".into()).is_user_facing());
    }
}
