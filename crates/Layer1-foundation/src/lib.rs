//! # graft-foundation
//!
//! Foundation layer for Graft:
//! - Error: 플러깅/배선/템플릿 에러 분류 (thiserror)
//! - Config: HostConfig, PlugOptions 레이어 병합, 설정 파일 로더
//! - Logging: tracing 구독자 초기화

pub mod config;
pub mod error;
pub mod logging;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    load_config_from_file,
    // Options
    CollisionPolicy,
    // Loader
    ConfigLoader,
    // Host
    HostConfig,
    PlugOptions,
    ResolvedOptions,
    CONFIG_FILE_NAME,
    DEFAULT_RENDERER,
    DEFAULT_STATIC_PREFIX,
    LOCAL_CONFIG_FILE_NAME,
};

// ============================================================================
// Logging
// ============================================================================
pub use logging::init_logging;
