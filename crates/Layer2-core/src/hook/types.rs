//! Hook 타입 정의
//!
//! 호스트 설정 라이프사이클의 단계

use serde::{Deserialize, Serialize};

// ============================================================================
// HookPoint - 라이프사이클 단계
// ============================================================================

/// 라이프사이클 단계 (발생 순서대로)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HookPoint {
    /// 설정 확정 전 (모델 프록시 연결 등)
    #[serde(alias = "before_config")]
    BeforeConfig,

    /// 설정 확정 직후 (지연 플러깅이 실행되는 지점)
    #[serde(alias = "config_ready")]
    ConfigReady,

    /// 새 애플리케이션 인스턴스 생성
    #[serde(alias = "new_app")]
    NewApp,

    /// 미들웨어 구성 완료, 요청 처리 직전
    #[serde(alias = "app_ready")]
    AppReady,
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeforeConfig => write!(f, "BeforeConfig"),
            Self::ConfigReady => write!(f, "ConfigReady"),
            Self::NewApp => write!(f, "NewApp"),
            Self::AppReady => write!(f, "AppReady"),
        }
    }
}
