//! Pluggable traits - 서브앱 인터페이스와 모듈 카탈로그

use crate::adapt::{HelperNamespace, SeedFn};
use crate::controller::Controller;
use crate::model::ModelModule;
use crate::partial::Attr;
use graft_foundation::{Error, HostConfig, PlugOptions, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// Pluggable - 서브앱 계약
// ============================================================================

/// 호스트에 플러깅될 수 있는 서브앱
///
/// `plugme()`만 필수입니다. 나머지 구성 요소는 제공하지 않으면
/// 해당 어댑터가 건너뜁니다.
pub trait Pluggable: Send + Sync {
    /// 기본 옵션 선언 (`appid` 기본값 등)
    ///
    /// `options`는 호출자가 넘긴 옵션입니다.
    fn plugme(&self, config: &HostConfig, options: &PlugOptions) -> Result<PlugOptions>;

    /// 모델 네임스페이스
    fn model(&self) -> Option<ModelModule> {
        None
    }

    /// helper 네임스페이스
    fn helpers(&self) -> Option<HelperNamespace> {
        None
    }

    /// 루트 컨트롤러 (호출마다 새 인스턴스)
    fn root_controller(&self) -> Option<Controller> {
        None
    }

    /// 시드 진입점
    fn bootstrap(&self) -> Option<SeedFn> {
        None
    }

    /// 정적 파일 디렉토리
    fn public_dir(&self) -> Option<PathBuf> {
        None
    }

    /// partial 네임스페이스 (`partials` 속성)
    fn partials(&self) -> Option<Attr> {
        None
    }

    /// 번역 카탈로그 디렉토리
    fn i18n_dir(&self) -> Option<PathBuf> {
        None
    }

    /// 템플릿 패치 XML
    fn template_patches(&self) -> Option<String> {
        None
    }
}

// ============================================================================
// ModuleCatalog - 이름으로 서브앱 조회
// ============================================================================

/// 설치된 서브앱 모듈 목록
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, Arc<dyn Pluggable>>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 모듈 등록. 같은 이름은 교체
    pub fn register(&mut self, name: impl Into<String>, module: Arc<dyn Pluggable>) {
        let name = name.into();
        debug!("Registered pluggable module: {}", name);
        self.modules.insert(name, module);
    }

    /// 빌더 패턴: 모듈 등록
    pub fn with_module(mut self, name: impl Into<String>, module: Arc<dyn Pluggable>) -> Self {
        self.register(name, module);
        self
    }

    /// 모듈 조회
    pub fn get(&self, name: &str) -> Result<Arc<dyn Pluggable>> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ModuleNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("modules", &self.names())
            .finish()
    }
}
