//! Config - 호스트 설정 및 플러깅 옵션
//!
//! - `host.rs` - HostConfig (렌더러, 정적 파일 접두사, i18n 등)
//! - `options.rs` - PlugOptions 레이어 병합과 ResolvedOptions
//! - `loader.rs` - 우선순위 기반 설정 파일 로더

mod host;
mod loader;
mod options;

pub use host::{HostConfig, DEFAULT_RENDERER, DEFAULT_STATIC_PREFIX};
pub use loader::{load_config_from_file, ConfigLoader, CONFIG_FILE_NAME, LOCAL_CONFIG_FILE_NAME};
pub use options::{CollisionPolicy, PlugOptions, ResolvedOptions};
