//! Plug - 서브앱 플러깅 오케스트레이터
//!
//! `plug()`는 동기적으로 옵션을 검증하고 레지스트리 슬롯을 예약한 뒤
//! 라이프사이클 훅만 등록합니다. 실제 배선은 `ConfigReady` 단계에서 실행되며,
//! 배선 실패는 기록만 하고 `NewApp` 단계에서 애플리케이션 시작을 중단시킵니다.

use super::registry::{PluggedModule, PluggedRegistry, SharedRegistry};
use super::traits::Pluggable;
use crate::adapt::{plug_helpers, ControllersAdapter, Helper, ModelsAdapter, PluggedStaticsMiddleware};
use crate::configurator::AppConfigurator;
use crate::hook::{HookPoint, StageContext};
use graft_foundation::{Error, PlugOptions, ResolvedOptions, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

// ============================================================================
// 최초 전역 배선
// ============================================================================

/// 플러깅 레지스트리 조회 또는 생성
///
/// 처음 호출될 때만 전역 배선(모델 프록시, helper 주입, 정적 파일 미들웨어,
/// 번역기)을 등록합니다. 이후 호출은 같은 레지스트리를 반환합니다.
pub fn init_pluggables(configurator: &mut AppConfigurator) -> SharedRegistry {
    if let Some(registry) = configurator.registry() {
        return Arc::clone(registry);
    }

    let registry = PluggedRegistry::shared();
    registry.write().mark_initialized();
    configurator.set_registry(Arc::clone(&registry));
    info!("Initializing pluggable applications support");

    if configurator.config().i18n_enabled {
        configurator.host_mut().ensure_translator();
    }

    configurator.register_hook(
        HookPoint::BeforeConfig,
        "pluggable:app_model",
        Box::new(|ctx: &mut StageContext<'_>| {
            if let Some(model) = &ctx.host.model {
                ctx.host.app_model.configure(Arc::clone(model));
            }
            if let Some(session) = &ctx.host.session {
                ctx.host.session_proxy.configure(Arc::clone(session));
            }
            Ok(())
        }),
    );

    let helper_registry = Arc::clone(&registry);
    configurator.register_hook(
        HookPoint::ConfigReady,
        "pluggable:helpers",
        Box::new(move |ctx: &mut StageContext<'_>| {
            let partials = Arc::clone(&ctx.host.partials);
            let url_registry = Arc::clone(&helper_registry);
            let Some(helpers) = ctx.host.helpers.as_mut() else {
                return Ok(());
            };

            helpers.insert(
                "call_partial",
                Helper::function(move |args| {
                    let path = args
                        .first()
                        .and_then(Value::as_str)
                        .ok_or_else(|| anyhow::anyhow!("call_partial expects a partial path"))?;
                    let params = args
                        .get(1)
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default();
                    let caller = partials
                        .read()
                        .clone()
                        .ok_or_else(|| anyhow::anyhow!("application is not configured yet"))?;
                    Ok(Value::String(caller.call(path, &params)?))
                }),
            );
            helpers.insert(
                "plug_url",
                Helper::function(move |args| {
                    let module_name = args
                        .first()
                        .and_then(Value::as_str)
                        .ok_or_else(|| anyhow::anyhow!("plug_url expects a pluggable name"))?;
                    let path = args.get(1).and_then(Value::as_str).unwrap_or("/");
                    let url = crate::utils::plug_url(&url_registry.read(), module_name, path, &[])?;
                    Ok(Value::String(url))
                }),
            );
            debug!("Injected call_partial and plug_url helpers");
            Ok(())
        }),
    );

    let statics_registry = Arc::clone(&registry);
    configurator.register_hook(
        HookPoint::AppReady,
        "pluggable:statics",
        Box::new(move |ctx: &mut StageContext<'_>| -> Result<()> {
            let prefix = ctx.host.config.static_prefix.clone();
            if let Some(app) = ctx.app.as_deref_mut() {
                let middleware = PluggedStaticsMiddleware::new(
                    Arc::clone(&app.handler),
                    Arc::clone(&statics_registry),
                    &prefix,
                )?;
                app.handler = Arc::new(middleware);
                debug!("Enabled pluggable statics under /{}", prefix);
            }
            Ok(())
        }),
    );

    registry
}

// ============================================================================
// plug()
// ============================================================================

/// 서브앱 플러깅 예약
///
/// 옵션 병합 순서: 서브앱 `plugme()` 선언 < 설정 파일 `[plug.<module>]` < `options`.
/// `appid`가 어디에도 없으면 `MissingAppId`로 실패하며 레지스트리는 변경되지 않습니다.
pub fn plug(configurator: &mut AppConfigurator, module_name: &str, options: PlugOptions) -> Result<()> {
    schedule(configurator, module_name, options).map_err(|e| {
        if e.is_user_facing() {
            warn!("Cannot plug {}: {}", module_name, e);
        } else {
            error!("Plugging {} failed unexpectedly: {}", module_name, e);
        }
        e
    })
}

fn schedule(configurator: &mut AppConfigurator, module_name: &str, options: PlugOptions) -> Result<()> {
    let registry = init_pluggables(configurator);

    if registry.read().contains(module_name) {
        return Err(Error::AlreadyPlugged(module_name.to_string()));
    }

    let module = configurator.catalog().get(module_name)?;
    info!("Plugging {}", module_name);

    let caller = configurator
        .config()
        .declared_options(module_name)
        .merge(options);
    let declared = module.plugme(configurator.config(), &caller)?;

    let appid = caller
        .appid
        .clone()
        .or_else(|| declared.appid.clone())
        .filter(|appid| !appid.trim().is_empty())
        .ok_or_else(|| Error::MissingAppId(module_name.to_string()))?;
    let resolved = declared.merge(caller).resolve(appid);

    registry.write().reserve(module_name)?;

    let plugger = ApplicationPlugger {
        registry: Arc::clone(&registry),
        module_name: module_name.to_string(),
        module,
        options: resolved,
    };
    configurator.register_hook(
        HookPoint::ConfigReady,
        format!("plug:{}", module_name),
        Box::new(move |ctx: &mut StageContext<'_>| plugger.plug(ctx)),
    );

    let check_registry = Arc::clone(&registry);
    let check_name = module_name.to_string();
    configurator.register_hook(
        HookPoint::NewApp,
        format!("check:{}", module_name),
        Box::new(move |_ctx: &mut StageContext<'_>| {
            fail_if_failed_to_plug(&check_registry, &check_name)
        }),
    );

    Ok(())
}

/// 배선이 완료되지 않은 모듈이 있으면 시작 중단
pub fn fail_if_failed_to_plug(registry: &SharedRegistry, module_name: &str) -> Result<()> {
    if registry.read().is_plugged(module_name) {
        return Ok(());
    }
    Err(Error::StartupAborted(format!(
        "{} failed. look at the exception logged above",
        module_name
    )))
}

// ============================================================================
// ApplicationPlugger - 지연 배선
// ============================================================================

/// `ConfigReady` 단계에서 서브앱을 배선
struct ApplicationPlugger {
    registry: SharedRegistry,
    module_name: String,
    module: Arc<dyn Pluggable>,
    options: ResolvedOptions,
}

impl ApplicationPlugger {
    fn plug(&self, ctx: &mut StageContext<'_>) -> Result<()> {
        if self.registry.read().is_plugged(&self.module_name) {
            debug!("{} already plugged, skipping", self.module_name);
            return Ok(());
        }

        if let Err(e) = self.plug_application(ctx) {
            let failure = Error::wiring(&self.module_name, e);
            ctx.host
                .diagnostics
                .error(Some(&self.module_name), failure.to_string());
            self.registry
                .write()
                .mark_failed(&self.module_name, failure.to_string());
        }
        Ok(())
    }

    fn plug_application(&self, ctx: &mut StageContext<'_>) -> Result<()> {
        let options = &self.options;
        let name = self.module_name.as_str();
        let mut record = PluggedModule::new(&options.appid, name, Arc::clone(&self.module));

        if options.plug_models {
            if let Some(mut model) = self.module.model() {
                let adapter = ModelsAdapter::new(name, options);
                match ctx.host.model.clone() {
                    Some(host_model) => {
                        adapter.adapt(&mut model, &mut host_model.write())?;
                    }
                    None => ctx
                        .host
                        .diagnostics
                        .warn(Some(name), "Host has no model, skipping schema merge"),
                }
                adapter.init_model(&model, ctx.host.session.as_ref(), &mut ctx.host.diagnostics)?;
                record.model = Some(model);
            }
        }

        if options.plug_helpers {
            if let Some(helpers) = self.module.helpers() {
                let policy = ctx.host.config.helpers_collision;
                match ctx.host.helpers.as_mut() {
                    Some(app_helpers) => {
                        let report = plug_helpers(
                            app_helpers,
                            name,
                            helpers,
                            options.global_helpers,
                            policy,
                            &mut ctx.host.diagnostics,
                        );
                        debug!("{} helpers copied globally: {:?}", name, report.copied);
                    }
                    None => ctx
                        .host
                        .diagnostics
                        .warn(Some(name), "Host has no helpers namespace, skipping helpers"),
                }
            }
        }

        if options.plug_controller {
            if let Some(root) = self.module.root_controller() {
                let (point, hook_name, hook) =
                    ControllersAdapter::plan(name, options, root, Arc::clone(&self.registry))
                        .into_hook();
                ctx.defer(point, hook_name, hook);
            }
        }

        if options.plug_bootstrap {
            if let Some(seed) = self.module.bootstrap() {
                ctx.host.seeds.wrap(name, seed);
            }
        }

        if options.plug_statics {
            record.public_dir = self.module.public_dir();
            if let Some(dir) = &record.public_dir {
                if !dir.is_dir() {
                    warn!("{} statics directory {} does not exist", name, dir.display());
                }
            }
        }

        if let Some(xml) = self.module.template_patches() {
            let config = Arc::clone(&ctx.host.config);
            let loaded = ctx.host.patches.load_str(&xml, &config)?;
            debug!("Loaded {} template patches from {}", loaded, name);
        }

        if let (Some(translator), Some(dir)) = (&ctx.host.translator, self.module.i18n_dir()) {
            translator.register_module(name, dir);
        }

        self.registry.write().register(record)?;
        Ok(())
    }
}
