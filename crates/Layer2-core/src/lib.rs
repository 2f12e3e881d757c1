//! graft-core: Composition engine for Graft
//!
//! Layer2 - 서브앱(pluggable)을 호스트 애플리케이션에 플러깅하는 레이어
//!
//! # 주요 모듈
//!
//! - `plugin`: `Pluggable` 계약, 플러깅 레지스트리, `plug()` 오케스트레이터
//! - `configurator`: 호스트 설정 객체와 라이프사이클 단계 발생
//! - `hook`: 라이프사이클 훅 (BeforeConfig / ConfigReady / NewApp / AppReady)
//! - `adapt`: 모델, 컨트롤러, 시드, 정적 파일, helper 어댑터
//! - `model`: 엔티티 선언, 스토리지 백엔드, 세션 프록시
//! - `controller`: 객체 트리 라우팅, 마운트, 메서드 차단
//! - `template`: 렌더 엔진, 템플릿 교체, HTML 패치
//! - `partial`: `module.attr:method` partial 호출
//! - `i18n`: 서브앱 번역 폴백
//!
//! # 사용 예시
//!
//! ```ignore
//! use graft_core::{AppConfigurator, LiveApp, PlugOptions};
//!
//! let mut configurator = AppConfigurator::new(config)
//!     .with_module("shop", Arc::new(ShopApp));
//! configurator.set_root_controller(root.clone());
//!
//! // 옵션 검증과 훅 등록만 즉시 실행
//! configurator.plug("shop", PlugOptions::new().with_appid("store"))?;
//!
//! // 배선과 마운트는 애플리케이션 생성 시 실행
//! let app = configurator.make_app(LiveApp::new(root, handler))?;
//! let html = app.dispatch("/store/index", &Params::new())?;
//! let url = app.plug_url("shop", "/cart", &[("id", "3")])?;
//! ```

// Core modules
pub mod adapt;
pub mod application;
pub mod configurator;
pub mod controller;
pub mod diagnostics;
pub mod hook;
pub mod i18n;
pub mod model;
pub mod partial;
pub mod plugin;
pub mod template;
pub mod utils;

// Re-exports: Plugin
pub use plugin::{
    fail_if_failed_to_plug, init_pluggables, plug, ModuleCatalog, ModuleSlot, Pluggable,
    PluggedModule, PluggedRegistry, SharedRegistry,
};

// Re-exports: Configurator
pub use configurator::{AppConfigurator, HostContext, LiveApp, PluggedApp};

// Re-exports: Hook
pub use hook::{Hook, HookPoint, LifecycleHooks, StageContext};

// Re-exports: Adapters
pub use adapt::{
    plug_helpers, BootstrapArgs, ControllersAdapter, Helper, HelperFn, HelperNamespace,
    HelpersReport, ModelsAdapter, PluggedStaticsMiddleware, SeedChain, SeedFn, SeedOutcome,
    SeedReport, SeedStep, StaticFiles, TransactionManager,
};

// Re-exports: Model
pub use model::{
    detect_model, is_model, AppModelProxy, ColumnDef, DocumentMeta, EntityClass, ForeignKey,
    HostModel, InitModelFn, Member, ModelKind, ModelModule, SessionHandle, SessionProxy,
    SharedModel, StorageDescriptor, TableDescriptor,
};

// Re-exports: Controller
pub use controller::{
    resolve_mountpoint, BlockedControllers, Controller, ExposedMethod, Output, Params,
    PendingMount,
};

// Re-exports: Template
pub use template::{
    JinjaEngine, JsonEngine, RenderMode, RenderPipeline, Renderers, TemplateEngine,
    TemplatePatches, TemplateRef, TemplateReplacements, TemplateVars,
};

// Re-exports: Partial / i18n / Diagnostics
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use i18n::{Catalog, PluggableTranslator, Translation};
pub use partial::{Attr, ControllerFactory, PartialCaller};

// Re-exports: Application
pub use application::{text_response, Application, Request, Response};

// Re-exports: Utils
pub use utils::{mount_point, plug_redirect, plug_url, plugged};

// Re-exports: Foundation
pub use graft_foundation::{
    CollisionPolicy, Error, HostConfig, PlugOptions, ResolvedOptions, Result,
};
