//! Controllers Adapter - 서브앱 루트 컨트롤러를 호스트 트리에 마운트
//!
//! 설정 단계에서는 마운트를 계획만 하고, 라이브 애플리케이션이 준비된 뒤
//! (`AppReady`) 실제 루트 컨트롤러에 부착합니다. 라이브 애플리케이션이 없으면
//! 호스트에 등록된 루트 컨트롤러를 사용합니다. 마운트 실패는 진단에 기록되고
//! 레지스트리 슬롯을 실패로 전환한 뒤 시작을 중단시킵니다.

use crate::controller::{Controller, PendingMount};
use crate::hook::{Hook, HookPoint, StageContext};
use crate::plugin::SharedRegistry;
use graft_foundation::{Error, ResolvedOptions, Result};
use tracing::error;

/// 컨트롤러 어댑터
pub struct ControllersAdapter {
    pending: PendingMount,
    registry: SharedRegistry,
}

impl ControllersAdapter {
    /// 마운트 계획
    pub fn plan(
        module_name: &str,
        options: &ResolvedOptions,
        controller: Controller,
        registry: SharedRegistry,
    ) -> Self {
        Self {
            pending: PendingMount::new(module_name, options.appid.clone(), controller)
                .with_blocked(options.block_controllers.clone()),
            registry,
        }
    }

    pub fn pending(&self) -> &PendingMount {
        &self.pending
    }

    /// 현재 라이브 루트(없으면 호스트 루트)에 부착
    pub fn mount(&self, ctx: &mut StageContext<'_>) -> Result<()> {
        let module_name = self.pending.module_name.clone();
        let result = match ctx.app.as_deref_mut() {
            Some(app) => self.pending.clone().commit(&mut app.root),
            None => match ctx.host.root_controller.as_mut() {
                Some(root) => self.pending.clone().commit(root),
                None => Err(Error::MountPoint(format!(
                    "{} (no root controller)",
                    self.pending.appid
                ))),
            },
        };

        result.map_err(|e| {
            error!("Failed to mount {} controller: {}", module_name, e);
            let failure = Error::wiring(&module_name, e);
            ctx.host
                .diagnostics
                .error(Some(&module_name), failure.to_string());
            self.registry
                .write()
                .mark_failed(&module_name, failure.to_string());
            failure
        })
    }

    /// `AppReady` 단계에 등록할 마운트 훅
    pub fn into_hook(self) -> (HookPoint, String, Hook) {
        let name = format!("mount:{}", self.pending.module_name);
        let hook: Hook = Box::new(move |ctx: &mut StageContext<'_>| self.mount(ctx));
        (HookPoint::AppReady, name, hook)
    }
}
