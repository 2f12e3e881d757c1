//! App Configurator - 호스트 설정 객체와 플러깅된 애플리케이션
//!
//! `AppConfigurator`는 호스트가 제공하는 구성 요소(모델, 세션, helper, 시드,
//! 렌더러, 루트 컨트롤러)와 라이프사이클 훅을 보관합니다.
//! `make_app()`이 각 단계를 순서대로 발생시켜 `PluggedApp`을 만듭니다.

use crate::adapt::{BootstrapArgs, HelperNamespace, SeedChain, SeedFn, SeedReport, TransactionManager};
use crate::application::{Application, Request, Response};
use crate::controller::{BlockedControllers, Controller, Output, Params};
use crate::diagnostics::Diagnostics;
use crate::hook::{Hook, HookPoint, LifecycleHooks, StageContext};
use crate::i18n::{Catalog, PluggableTranslator};
use crate::model::{AppModelProxy, HostModel, SessionHandle, SessionProxy, SharedModel};
use crate::partial::PartialCaller;
use crate::plugin::{ModuleCatalog, Pluggable, PluggedRegistry, SharedRegistry};
use crate::template::{
    RenderPipeline, Renderers, TemplateEngine, TemplatePatches, TemplateReplacements, TemplateVars,
};
use graft_foundation::{HostConfig, PlugOptions, Result};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// HostContext - 훅이 공유하는 호스트 상태
// ============================================================================

/// 설정 단계 동안 훅이 읽고 쓰는 호스트 상태
pub struct HostContext {
    pub config: Arc<HostConfig>,
    pub model: Option<SharedModel>,
    pub session: Option<SessionHandle>,
    pub helpers: Option<HelperNamespace>,
    pub seeds: SeedChain,
    pub renderers: Renderers,
    pub replacements: TemplateReplacements,
    pub patches: TemplatePatches,
    pub blocked: BlockedControllers,
    pub transaction: Option<Arc<dyn TransactionManager>>,
    /// 라이브 애플리케이션이 없을 때 마운트 대상
    pub root_controller: Option<Controller>,
    pub app_model: AppModelProxy,
    pub session_proxy: SessionProxy,
    pub translator: Option<Arc<PluggableTranslator>>,
    pub diagnostics: Diagnostics,
    /// `call_partial` helper가 사용하는 호출기 (앱 생성 시 설정)
    pub(crate) partials: Arc<RwLock<Option<Arc<PartialCaller>>>>,
}

impl HostContext {
    pub fn new(config: Arc<HostConfig>) -> Self {
        Self {
            config,
            model: None,
            session: None,
            helpers: None,
            seeds: SeedChain::new(),
            renderers: Renderers::with_defaults(),
            replacements: TemplateReplacements::new(),
            patches: TemplatePatches::new(),
            blocked: BlockedControllers::new(),
            transaction: None,
            root_controller: None,
            app_model: AppModelProxy::new(),
            session_proxy: SessionProxy::new(),
            translator: None,
            diagnostics: Diagnostics::new(),
            partials: Arc::new(RwLock::new(None)),
        }
    }

    /// 번역기 (없으면 생성)
    pub fn ensure_translator(&mut self) -> Arc<PluggableTranslator> {
        let langs: Vec<String> = self.config.lang.iter().cloned().collect();
        Arc::clone(
            self.translator
                .get_or_insert_with(|| Arc::new(PluggableTranslator::new(langs))),
        )
    }
}

/// 생성 중인 애플리케이션 인스턴스
pub struct LiveApp {
    pub root: Controller,
    pub handler: Arc<dyn Application>,
}

impl LiveApp {
    pub fn new(root: Controller, handler: Arc<dyn Application>) -> Self {
        Self { root, handler }
    }
}

// ============================================================================
// AppConfigurator
// ============================================================================

/// 호스트 설정 객체
pub struct AppConfigurator {
    host: HostContext,
    hooks: LifecycleHooks,
    catalog: ModuleCatalog,
    registry: Option<SharedRegistry>,
}

impl AppConfigurator {
    pub fn new(config: HostConfig) -> Self {
        Self {
            host: HostContext::new(Arc::new(config)),
            hooks: LifecycleHooks::new(),
            catalog: ModuleCatalog::new(),
            registry: None,
        }
    }

    /// 빌더 패턴: 서브앱 모듈 설치
    pub fn with_module(mut self, name: impl Into<String>, module: Arc<dyn Pluggable>) -> Self {
        self.register_module(name, module);
        self
    }

    pub fn register_module(&mut self, name: impl Into<String>, module: Arc<dyn Pluggable>) {
        self.catalog.register(name, module);
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &Arc<HostConfig> {
        &self.host.config
    }

    pub fn host(&self) -> &HostContext {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut HostContext {
        &mut self.host
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.host.diagnostics
    }

    pub fn hooks(&self) -> &LifecycleHooks {
        &self.hooks
    }

    /// 플러깅 레지스트리 (첫 `plug()` 이후 존재)
    pub fn registry(&self) -> Option<&SharedRegistry> {
        self.registry.as_ref()
    }

    pub(crate) fn set_registry(&mut self, registry: SharedRegistry) {
        self.registry = Some(registry);
    }

    // ========================================================================
    // 호스트 구성 요소
    // ========================================================================

    /// 호스트 모델 설정
    pub fn set_model(&mut self, model: HostModel) -> SharedModel {
        let shared = Arc::new(RwLock::new(model));
        self.host.model = Some(Arc::clone(&shared));
        shared
    }

    pub fn set_session(&mut self, session: SessionHandle) {
        self.host.session = Some(session);
    }

    pub fn set_helpers(&mut self, helpers: HelperNamespace) {
        self.host.helpers = Some(helpers);
    }

    /// 호스트 시드 진입점
    pub fn set_bootstrap(&mut self, seed: SeedFn) {
        self.host.seeds.set_host(seed);
    }

    pub fn set_transaction_manager(&mut self, transaction: Arc<dyn TransactionManager>) {
        self.host.transaction = Some(transaction);
    }

    pub fn set_root_controller(&mut self, root: Controller) {
        self.host.root_controller = Some(root);
    }

    /// 렌더 엔진 등록
    pub fn register_engine(&mut self, engine: Arc<dyn TemplateEngine>) {
        self.host.renderers.register(engine);
    }

    // ========================================================================
    // 템플릿 / 컨트롤러 커스터마이징
    // ========================================================================

    /// `past` 템플릿 대신 `new`로 렌더링
    pub fn replace_template(&mut self, past: &str, new: &str) {
        let config = Arc::clone(&self.host.config);
        self.host.replacements.replace(past, new, &config);
    }

    /// 패치 파일 로드
    pub fn load_template_patches(&mut self, path: &Path) -> Result<usize> {
        let config = Arc::clone(&self.host.config);
        self.host.patches.load_file(path, &config)
    }

    /// 패치 XML 로드
    pub fn load_template_patches_str(&mut self, xml: &str) -> Result<usize> {
        let config = Arc::clone(&self.host.config);
        self.host.patches.load_str(xml, &config)
    }

    /// 컨트롤러 메서드 차단 (`/shop`, `purge`)
    pub fn block_controller(&mut self, controller_path: &str, method: &str) {
        self.host.blocked.add(controller_path, method);
    }

    /// 호스트 번역 카탈로그 추가
    pub fn add_host_catalog(&mut self, lang: &str, catalog: Catalog) {
        self.host.ensure_translator().add_host_catalog(lang, catalog);
    }

    // ========================================================================
    // 라이프사이클
    // ========================================================================

    pub fn register_hook(&mut self, point: HookPoint, name: impl Into<String>, hook: Hook) {
        self.hooks.register(point, name, hook);
    }

    /// 서브앱 플러깅 (`crate::plugin::plug`)
    pub fn plug(&mut self, module_name: &str, options: PlugOptions) -> Result<()> {
        crate::plugin::plug(self, module_name, options)
    }

    fn fire(&mut self, point: HookPoint, app: Option<&mut LiveApp>) -> Result<()> {
        let mut ctx = StageContext::new(point, &mut self.host, app);
        let result = self.hooks.fire(point, &mut ctx);
        for (deferred_point, name, hook) in ctx.into_deferred() {
            self.hooks.register(deferred_point, name, hook);
        }
        result
    }

    /// 애플리케이션 생성
    ///
    /// 같은 설정 객체로 여러 번 호출할 수 있습니다 (리로드).
    /// 배선은 처음 한 번만 실행되고, 마운트는 매번 새 루트에 적용됩니다.
    pub fn make_app(&mut self, app: LiveApp) -> Result<PluggedApp> {
        info!("Configuring {} application", self.host.config.package);

        self.fire(HookPoint::BeforeConfig, None)?;
        self.fire(HookPoint::ConfigReady, None)?;

        let mut live = app;
        self.fire(HookPoint::NewApp, Some(&mut live))?;
        self.fire(HookPoint::AppReady, Some(&mut live))?;

        let blocked = self.host.blocked.apply(&mut live.root);
        if blocked > 0 {
            debug!("Blocked {} controller methods", blocked);
        }

        let config = Arc::clone(&self.host.config);
        let registry = self
            .registry
            .clone()
            .unwrap_or_else(PluggedRegistry::shared);
        let renderers = Arc::new(self.host.renderers.clone());
        let replacements = Arc::new(self.host.replacements.clone());

        let mut pipeline = RenderPipeline::new(Arc::clone(&config), Arc::clone(&renderers));
        if !replacements.is_empty() {
            pipeline = pipeline.with_hook(replacements.clone());
        }
        if !self.host.patches.is_empty() {
            pipeline = pipeline.with_hook(Arc::new(self.host.patches.clone()));
        }

        let partials = Arc::new(PartialCaller::new(
            Arc::clone(&registry),
            Arc::clone(&config),
            renderers,
            replacements,
        ));
        *self.host.partials.write() = Some(Arc::clone(&partials));

        info!(
            "Application ready with {} pluggables",
            registry.read().plugged().len()
        );

        Ok(PluggedApp {
            config,
            root: Arc::new(live.root),
            handler: live.handler,
            pipeline,
            partials,
            seeds: self.host.seeds.clone(),
            transaction: self.host.transaction.clone(),
            helpers: self.host.helpers.clone(),
            model: self.host.model.clone(),
            translator: self.host.translator.clone(),
            registry,
        })
    }
}

// ============================================================================
// PluggedApp - 완성된 애플리케이션
// ============================================================================

/// 서브앱이 플러깅된 애플리케이션
pub struct PluggedApp {
    config: Arc<HostConfig>,
    root: Arc<Controller>,
    handler: Arc<dyn Application>,
    pipeline: RenderPipeline,
    partials: Arc<PartialCaller>,
    seeds: SeedChain,
    transaction: Option<Arc<dyn TransactionManager>>,
    helpers: Option<HelperNamespace>,
    model: Option<SharedModel>,
    translator: Option<Arc<PluggableTranslator>>,
    registry: SharedRegistry,
}

impl PluggedApp {
    /// 요청 처리 (미들웨어 포함)
    pub async fn call(&self, request: Request) -> Result<Response> {
        self.handler.call(request).await
    }

    /// 페이지 렌더링 (템플릿 교체와 패치 적용)
    pub fn render(&self, template: &str, vars: TemplateVars) -> Result<String> {
        self.pipeline.render(template, vars)
    }

    /// 컨트롤러 메서드 호출 후 선언 템플릿으로 렌더링
    pub fn dispatch(&self, path: &str, params: &Params) -> Result<String> {
        let method = self.root.resolve_method(path)?;
        match self.root.dispatch(path, params)? {
            Output::Rendered(body) => Ok(body),
            Output::Vars(vars) => match method.template() {
                Some(template) => self.render(template, vars),
                None => Ok(serde_json::to_string(&vars)?),
            },
        }
    }

    /// partial 렌더링
    pub fn call_partial(&self, path: &str, params: &Params) -> Result<String> {
        self.partials.call(path, params)
    }

    /// 시드 실행 (호스트 먼저, 그 다음 서브앱)
    pub fn run_bootstrap(&self, args: &BootstrapArgs) -> Result<SeedReport> {
        self.seeds.run(args, self.transaction.as_deref())
    }

    pub fn bootstrap_args(&self, command: &str) -> BootstrapArgs {
        BootstrapArgs::new(command, Arc::clone(&self.config))
    }

    pub fn config(&self) -> &Arc<HostConfig> {
        &self.config
    }

    pub fn root_controller(&self) -> &Controller {
        &self.root
    }

    pub fn helpers(&self) -> Option<&HelperNamespace> {
        self.helpers.as_ref()
    }

    pub fn model(&self) -> Option<&SharedModel> {
        self.model.as_ref()
    }

    pub fn translator(&self) -> Option<&Arc<PluggableTranslator>> {
        self.translator.as_ref()
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// 배선된 서브앱 이름
    pub fn plugged(&self) -> Vec<String> {
        crate::utils::plugged(&self.registry.read())
    }

    pub fn plug_url(&self, module_name: &str, path: &str, params: &[(&str, &str)]) -> Result<String> {
        crate::utils::plug_url(&self.registry.read(), module_name, path, params)
    }

    pub fn plug_redirect(
        &self,
        module_name: &str,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Response> {
        crate::utils::plug_redirect(&self.registry.read(), module_name, path, params)
    }
}
