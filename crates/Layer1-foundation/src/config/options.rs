//! Plug Options - 서브앱 플러깅 옵션
//!
//! 세 단계로 병합됩니다:
//! 1. 서브앱이 `plugme()`로 선언한 기본값
//! 2. 호출자가 `plug()`에 넘긴 옵션 (1을 오버라이드)
//! 3. 최종 `appid` (항상 마지막에 강제)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// CollisionPolicy - 전역 helper 충돌 정책
// ============================================================================

/// 전역 helper 이름이 이미 존재할 때의 처리 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// 기존 helper 유지, 경고 기록
    #[default]
    Skip,

    /// 새 helper로 덮어쓰기, 경고 기록
    Overwrite,
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Overwrite => write!(f, "overwrite"),
        }
    }
}

// ============================================================================
// PlugOptions - 병합 전 옵션 레이어
// ============================================================================

/// 한 레이어의 플러깅 옵션 (설정되지 않은 키는 `None`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlugOptions {
    /// 마운트 id (경로 접두사)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plug_models: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plug_helpers: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plug_controller: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plug_bootstrap: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plug_statics: Option<bool>,

    /// 테이블 이름에 `{appid}_` 접두사 부여
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_tables: Option<bool>,

    /// 엔티티를 호스트 모델 네임스페이스에 공개
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_models: Option<bool>,

    /// helper를 호스트 helper 네임스페이스에 직접 복사
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_helpers: Option<bool>,

    /// 차단할 서브앱 루트 컨트롤러 메서드 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_controllers: Option<Vec<String>>,

    /// 서브앱 전용 추가 옵션
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl PlugOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 패턴: appid 설정
    pub fn with_appid(mut self, appid: impl Into<String>) -> Self {
        self.appid = Some(appid.into());
        self
    }

    pub fn plug_models(mut self, enabled: bool) -> Self {
        self.plug_models = Some(enabled);
        self
    }

    pub fn plug_helpers(mut self, enabled: bool) -> Self {
        self.plug_helpers = Some(enabled);
        self
    }

    pub fn plug_controller(mut self, enabled: bool) -> Self {
        self.plug_controller = Some(enabled);
        self
    }

    pub fn plug_bootstrap(mut self, enabled: bool) -> Self {
        self.plug_bootstrap = Some(enabled);
        self
    }

    pub fn plug_statics(mut self, enabled: bool) -> Self {
        self.plug_statics = Some(enabled);
        self
    }

    pub fn rename_tables(mut self, enabled: bool) -> Self {
        self.rename_tables = Some(enabled);
        self
    }

    pub fn global_models(mut self, enabled: bool) -> Self {
        self.global_models = Some(enabled);
        self
    }

    pub fn global_helpers(mut self, enabled: bool) -> Self {
        self.global_helpers = Some(enabled);
        self
    }

    pub fn block_controller(mut self, method: impl Into<String>) -> Self {
        self.block_controllers
            .get_or_insert_with(Vec::new)
            .push(method.into());
        self
    }

    /// 빌더 패턴: 추가 옵션
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// 두 레이어 병합 (`over`가 self를 오버라이드)
    pub fn merge(self, over: PlugOptions) -> PlugOptions {
        PlugOptions {
            appid: over.appid.or(self.appid),
            plug_models: over.plug_models.or(self.plug_models),
            plug_helpers: over.plug_helpers.or(self.plug_helpers),
            plug_controller: over.plug_controller.or(self.plug_controller),
            plug_bootstrap: over.plug_bootstrap.or(self.plug_bootstrap),
            plug_statics: over.plug_statics.or(self.plug_statics),
            rename_tables: over.rename_tables.or(self.rename_tables),
            global_models: over.global_models.or(self.global_models),
            global_helpers: over.global_helpers.or(self.global_helpers),
            block_controllers: over.block_controllers.or(self.block_controllers),
            extra: {
                let mut merged = self.extra;
                merged.extend(over.extra);
                merged
            },
        }
    }

    /// 기본값을 채워 최종 옵션 생성 (appid는 호출자가 확정)
    pub fn resolve(self, appid: impl Into<String>) -> ResolvedOptions {
        ResolvedOptions {
            appid: appid.into(),
            plug_models: self.plug_models.unwrap_or(true),
            plug_helpers: self.plug_helpers.unwrap_or(true),
            plug_controller: self.plug_controller.unwrap_or(true),
            plug_bootstrap: self.plug_bootstrap.unwrap_or(true),
            plug_statics: self.plug_statics.unwrap_or(true),
            rename_tables: self.rename_tables.unwrap_or(false),
            global_models: self.global_models.unwrap_or(false),
            global_helpers: self.global_helpers.unwrap_or(false),
            block_controllers: self.block_controllers.unwrap_or_default(),
            extra: self.extra,
        }
    }
}

// ============================================================================
// ResolvedOptions - 최종 옵션
// ============================================================================

/// 모든 기본값이 채워진 플러깅 옵션
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOptions {
    pub appid: String,
    pub plug_models: bool,
    pub plug_helpers: bool,
    pub plug_controller: bool,
    pub plug_bootstrap: bool,
    pub plug_statics: bool,
    pub rename_tables: bool,
    pub global_models: bool,
    pub global_helpers: bool,
    pub block_controllers: Vec<String>,
    pub extra: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_precedence() {
        let declared = PlugOptions::new()
            .with_appid("declared")
            .rename_tables(true)
            .global_helpers(true);
        let caller = PlugOptions::new().rename_tables(false);

        let merged = declared.merge(caller);
        assert_eq!(merged.appid.as_deref(), Some("declared"));
        assert_eq!(merged.rename_tables, Some(false));
        assert_eq!(merged.global_helpers, Some(true));
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = PlugOptions::new().resolve("shop");
        assert_eq!(resolved.appid, "shop");
        assert!(resolved.plug_models);
        assert!(resolved.plug_helpers);
        assert!(resolved.plug_controller);
        assert!(resolved.plug_bootstrap);
        assert!(resolved.plug_statics);
        assert!(!resolved.rename_tables);
        assert!(!resolved.global_models);
        assert!(!resolved.global_helpers);
        assert!(resolved.block_controllers.is_empty());
    }

    #[test]
    fn test_deserialize_with_extra_keys() {
        let options: PlugOptions = serde_json::from_value(serde_json::json!({
            "appid": "shop",
            "rename_tables": true,
            "currency": "EUR"
        }))
        .unwrap();

        assert_eq!(options.appid.as_deref(), Some("shop"));
        assert_eq!(options.rename_tables, Some(true));
        assert_eq!(options.extra.get("currency"), Some(&serde_json::json!("EUR")));
    }
}
