//! Logging - tracing 구독자 초기화

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 전역 tracing 구독자 설치
///
/// `RUST_LOG`가 설정되어 있으면 그 필터를, 아니면 `default_level`을 사용합니다.
/// 이미 구독자가 설치된 경우(애플리케이션 리로드 등) 아무 일도 하지 않고 `false`를 반환합니다.
pub fn init_logging(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let _ = init_logging("debug");
        assert!(!init_logging("info"));
    }
}
