//! Plugged Registry - 플러깅된 서브앱 저장소
//!
//! 하나의 설정 객체에서 만들어진 모든 애플리케이션 인스턴스가 공유합니다.

use super::traits::Pluggable;
use crate::adapt::StaticFiles;
use crate::model::ModelModule;
use chrono::{DateTime, Utc};
use graft_foundation::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// 공유 레지스트리 핸들
pub type SharedRegistry = Arc<RwLock<PluggedRegistry>>;

// ============================================================================
// PluggedModule - 플러깅 레코드
// ============================================================================

/// 배선이 끝난 서브앱 레코드
pub struct PluggedModule {
    pub appid: String,
    pub module_name: String,
    pub module: Arc<dyn Pluggable>,

    /// 배선 후의 모델 네임스페이스 (이름 변경 반영)
    pub model: Option<ModelModule>,

    /// 정적 파일 디렉토리
    pub public_dir: Option<PathBuf>,

    /// 첫 요청에서 만들어지는 정적 파일 핸들러
    statics: OnceLock<Arc<StaticFiles>>,

    pub plugged_at: DateTime<Utc>,

    /// 플러깅 순서
    pub order: usize,
}

impl PluggedModule {
    pub fn new(
        appid: impl Into<String>,
        module_name: impl Into<String>,
        module: Arc<dyn Pluggable>,
    ) -> Self {
        Self {
            appid: appid.into(),
            module_name: module_name.into(),
            module,
            model: None,
            public_dir: None,
            statics: OnceLock::new(),
            plugged_at: Utc::now(),
            order: 0,
        }
    }

    /// 정적 파일 핸들러 (처음 호출 시 생성)
    pub fn statics(&self) -> Option<Arc<StaticFiles>> {
        let dir = self.public_dir.as_ref()?;
        Some(Arc::clone(self.statics.get_or_init(|| {
            debug!("Serving {} statics from {}", self.module_name, dir.display());
            Arc::new(StaticFiles::new(dir.clone()))
        })))
    }
}

impl std::fmt::Debug for PluggedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluggedModule")
            .field("appid", &self.appid)
            .field("module_name", &self.module_name)
            .field("public_dir", &self.public_dir)
            .field("plugged_at", &self.plugged_at)
            .field("order", &self.order)
            .finish()
    }
}

// ============================================================================
// ModuleSlot - 모듈 상태
// ============================================================================

/// 레지스트리 슬롯 상태
#[derive(Debug, Clone)]
pub enum ModuleSlot {
    /// `plug()`로 예약됨, 배선 대기 중
    Reserved,
    /// 배선 완료
    Plugged(Arc<PluggedModule>),
    /// 배선 실패 (메시지)
    Failed(String),
}

// ============================================================================
// PluggedRegistry
// ============================================================================

/// 플러깅 레지스트리
#[derive(Debug, Default)]
pub struct PluggedRegistry {
    /// appid -> module_name
    appids: HashMap<String, String>,

    /// module_name -> 슬롯
    modules: HashMap<String, ModuleSlot>,

    /// 플러깅 카운터
    counter: usize,

    /// 최초 전역 배선 완료 여부
    initialized: bool,
}

impl PluggedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 공유 핸들로 생성
    pub fn shared() -> SharedRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn mark_initialized(&mut self) -> bool {
        !std::mem::replace(&mut self.initialized, true)
    }

    /// 모듈 이름 예약. 이미 있으면 `AlreadyPlugged`
    pub fn reserve(&mut self, module_name: &str) -> Result<()> {
        if self.modules.contains_key(module_name) {
            return Err(Error::AlreadyPlugged(module_name.to_string()));
        }
        self.modules
            .insert(module_name.to_string(), ModuleSlot::Reserved);
        debug!("Reserved pluggable slot: {}", module_name);
        Ok(())
    }

    /// 배선 완료 레코드 등록
    pub fn register(&mut self, mut record: PluggedModule) -> Result<Arc<PluggedModule>> {
        let module_name = record.module_name.clone();
        if matches!(self.modules.get(&module_name), Some(ModuleSlot::Plugged(_))) {
            return Err(Error::AlreadyPlugged(module_name));
        }

        self.counter += 1;
        record.order = self.counter;

        if let Some(previous) = self
            .appids
            .insert(record.appid.clone(), module_name.clone())
        {
            if previous != module_name {
                warn!(
                    "Mount id {} was used by {}, now points to {}",
                    record.appid, previous, module_name
                );
            }
        }

        info!("Plugged {} at {} (#{})", module_name, record.appid, record.order);
        let record = Arc::new(record);
        self.modules
            .insert(module_name, ModuleSlot::Plugged(Arc::clone(&record)));
        Ok(record)
    }

    /// 배선 실패 기록
    pub fn mark_failed(&mut self, module_name: &str, message: impl Into<String>) {
        self.modules
            .insert(module_name.to_string(), ModuleSlot::Failed(message.into()));
    }

    pub fn slot(&self, module_name: &str) -> Option<&ModuleSlot> {
        self.modules.get(module_name)
    }

    /// 예약/실패 포함 존재 여부
    pub fn contains(&self, module_name: &str) -> bool {
        self.modules.contains_key(module_name)
    }

    pub fn is_plugged(&self, module_name: &str) -> bool {
        matches!(self.modules.get(module_name), Some(ModuleSlot::Plugged(_)))
    }

    pub fn module(&self, module_name: &str) -> Option<Arc<PluggedModule>> {
        match self.modules.get(module_name) {
            Some(ModuleSlot::Plugged(record)) => Some(Arc::clone(record)),
            _ => None,
        }
    }

    /// URL 세그먼트로 조회 (appid 우선, 그 다음 모듈 이름)
    pub fn module_for_mount(&self, segment: &str) -> Option<Arc<PluggedModule>> {
        self.appids
            .get(segment)
            .and_then(|name| self.module(name))
            .or_else(|| self.module(segment))
    }

    /// 배선된 모듈 이름 (플러깅 순서)
    pub fn plugged(&self) -> Vec<String> {
        let mut records: Vec<&Arc<PluggedModule>> = self
            .modules
            .values()
            .filter_map(|slot| match slot {
                ModuleSlot::Plugged(record) => Some(record),
                _ => None,
            })
            .collect();
        records.sort_by_key(|r| r.order);
        records.iter().map(|r| r.module_name.clone()).collect()
    }

    /// 모듈의 마운트 id
    pub fn mount_point(&self, module_name: &str) -> Option<String> {
        self.module(module_name).map(|r| r.appid.clone())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
