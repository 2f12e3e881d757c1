//! # Hook System
//!
//! 호스트 설정 라이프사이클 훅
//!
//! ## 개요
//!
//! `plug()`는 서브앱을 즉시 배선하지 않고, 라이프사이클 단계에 훅을 등록합니다.
//! 설정 객체가 `make_app()`에서 각 단계를 순서대로 발생시키면
//! 등록 순서대로 훅이 실행됩니다.
//!
//! ## 단계
//!
//! - `BeforeConfig`: 설정 확정 전
//! - `ConfigReady`: 설정 확정 직후 (서브앱 배선)
//! - `NewApp`: 애플리케이션 인스턴스 생성 (배선 실패 검사)
//! - `AppReady`: 미들웨어 구성 완료 (마운트, 정적 파일 미들웨어)
//!
//! 훅 실행 중에 등록된 훅(`StageContext::defer`)은 해당 단계가 끝난 뒤에 추가되어
//! 이후 단계부터 실행됩니다.

mod types;

pub use types::HookPoint;

use crate::configurator::{HostContext, LiveApp};
use graft_foundation::Result;
use std::collections::HashMap;
use tracing::{debug, error};

/// 라이프사이클 훅
pub type Hook = Box<dyn FnMut(&mut StageContext<'_>) -> Result<()> + Send>;

// ============================================================================
// StageContext - 훅 실행 컨텍스트
// ============================================================================

/// 훅에 전달되는 컨텍스트
pub struct StageContext<'a> {
    pub point: HookPoint,
    pub host: &'a mut HostContext,
    /// `NewApp`, `AppReady` 단계에서만 존재
    pub app: Option<&'a mut LiveApp>,
    deferred: Vec<(HookPoint, String, Hook)>,
}

impl<'a> StageContext<'a> {
    pub fn new(point: HookPoint, host: &'a mut HostContext, app: Option<&'a mut LiveApp>) -> Self {
        Self {
            point,
            host,
            app,
            deferred: Vec::new(),
        }
    }

    /// 현재 단계가 끝난 뒤 훅 등록
    pub fn defer(&mut self, point: HookPoint, name: impl Into<String>, hook: Hook) {
        self.deferred.push((point, name.into(), hook));
    }

    pub fn into_deferred(self) -> Vec<(HookPoint, String, Hook)> {
        self.deferred
    }
}

// ============================================================================
// LifecycleHooks - 훅 레지스트리
// ============================================================================

struct RegisteredHook {
    name: String,
    hook: Hook,
}

/// 단계별 훅 목록
#[derive(Default)]
pub struct LifecycleHooks {
    hooks: HashMap<HookPoint, Vec<RegisteredHook>>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 훅 등록 (등록 순서대로 실행)
    pub fn register(&mut self, point: HookPoint, name: impl Into<String>, hook: Hook) {
        let name = name.into();
        debug!("Registered {} hook: {}", point, name);
        self.hooks
            .entry(point)
            .or_default()
            .push(RegisteredHook { name, hook });
    }

    pub fn count(&self, point: HookPoint) -> usize {
        self.hooks.get(&point).map(Vec::len).unwrap_or(0)
    }

    pub fn names(&self, point: HookPoint) -> Vec<&str> {
        self.hooks
            .get(&point)
            .map(|hooks| hooks.iter().map(|h| h.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// 단계 발생. 첫 번째 실패에서 중단
    pub fn fire(&mut self, point: HookPoint, ctx: &mut StageContext<'_>) -> Result<()> {
        let Some(hooks) = self.hooks.get_mut(&point) else {
            return Ok(());
        };

        for registered in hooks.iter_mut() {
            debug!("Running {} hook: {}", point, registered.name);
            if let Err(e) = (registered.hook)(ctx) {
                error!("{} hook {} failed: {}", point, registered.name, e);
                return Err(e);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(HookPoint, usize)> =
            self.hooks.iter().map(|(p, h)| (*p, h.len())).collect();
        counts.sort();
        f.debug_struct("LifecycleHooks").field("hooks", &counts).finish()
    }
}
