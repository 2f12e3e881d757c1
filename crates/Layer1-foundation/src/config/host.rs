//! Host Config - 호스트 애플리케이션 설정
//!
//! 서브앱을 플러깅하는 호스트 쪽 설정입니다.

use super::options::{CollisionPolicy, PlugOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 기본 정적 파일 접두사 (`/_pluggable/<mount-id>/...`)
pub const DEFAULT_STATIC_PREFIX: &str = "_pluggable";

/// 기본 렌더 엔진
pub const DEFAULT_RENDERER: &str = "jinja";

/// 호스트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// 호스트 패키지 이름
    #[serde(default = "default_package")]
    pub package: String,

    /// 기본 렌더 엔진 이름
    #[serde(default = "default_renderer", alias = "defaultRenderer")]
    pub default_renderer: String,

    /// 사용 가능한 렌더 엔진 목록
    #[serde(default = "default_renderers")]
    pub renderers: Vec<String>,

    /// i18n 활성화 여부
    #[serde(default, alias = "i18nEnabled")]
    pub i18n_enabled: bool,

    /// 기본 언어 (번역 조회용)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// 정적 파일 URL 접두사
    #[serde(default = "default_static_prefix", alias = "staticPrefix")]
    pub static_prefix: String,

    /// 전역 helper 충돌 정책
    #[serde(default, alias = "helpersCollision")]
    pub helpers_collision: CollisionPolicy,

    /// 설정 파일에서 선언된 모듈별 옵션 (module_name -> options)
    #[serde(default)]
    pub plug: HashMap<String, PlugOptions>,

    /// 확장 설정
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_package() -> String {
    "app".to_string()
}

fn default_renderer() -> String {
    DEFAULT_RENDERER.to_string()
}

fn default_renderers() -> Vec<String> {
    vec![DEFAULT_RENDERER.to_string(), "json".to_string()]
}

fn default_static_prefix() -> String {
    DEFAULT_STATIC_PREFIX.to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            package: default_package(),
            default_renderer: default_renderer(),
            renderers: default_renderers(),
            i18n_enabled: false,
            lang: None,
            static_prefix: default_static_prefix(),
            helpers_collision: CollisionPolicy::default(),
            plug: HashMap::new(),
            extra: HashMap::new(),
        }
    }
}

impl HostConfig {
    /// 새 설정 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 패턴: 패키지 이름
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// 빌더 패턴: 기본 렌더러
    pub fn with_default_renderer(mut self, renderer: impl Into<String>) -> Self {
        self.default_renderer = renderer.into();
        self
    }

    /// 빌더 패턴: i18n 활성화
    pub fn with_i18n(mut self, enabled: bool) -> Self {
        self.i18n_enabled = enabled;
        self
    }

    /// 빌더 패턴: helper 충돌 정책
    pub fn with_helpers_collision(mut self, policy: CollisionPolicy) -> Self {
        self.helpers_collision = policy;
        self
    }

    /// TOML 문자열에서 로드
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 렌더러 목록에 포함된 엔진인지 확인
    pub fn is_renderer(&self, name: &str) -> bool {
        self.renderers.iter().any(|r| r == name)
    }

    /// 설정 파일이 선언한 모듈 옵션
    pub fn declared_options(&self, module_name: &str) -> PlugOptions {
        self.plug.get(module_name).cloned().unwrap_or_default()
    }
}
