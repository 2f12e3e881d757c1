//! Partials - 서브앱 컨트롤러 메서드를 페이지 조각으로 렌더링
//!
//! 경로 형식은 `module.attr.path:method`입니다. 모듈 이름 뒤의 속성 경로를
//! 따라가서, 클래스면 인스턴스를 만들고 인스턴스면 그대로 사용해 메서드를 찾습니다.
//! 해석 결과는 경로별로 캐시됩니다.

use crate::controller::{Controller, ExposedMethod, Output, Params};
use crate::plugin::{Pluggable, SharedRegistry};
use crate::template::{RenderMode, Renderers, TemplateRef, TemplateReplacements};
use graft_foundation::{Error, HostConfig, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 컨트롤러 생성자
pub type ControllerFactory = Arc<dyn Fn() -> Controller + Send + Sync>;

// ============================================================================
// Attr - 모듈 속성 트리
// ============================================================================

/// 모듈 속성
#[derive(Clone)]
pub enum Attr {
    Namespace(BTreeMap<String, Attr>),
    /// 호출 시 인스턴스화
    Class(ControllerFactory),
    Instance(Controller),
}

impl Attr {
    pub fn namespace() -> Self {
        Self::Namespace(BTreeMap::new())
    }

    pub fn class(factory: impl Fn() -> Controller + Send + Sync + 'static) -> Self {
        Self::Class(Arc::new(factory))
    }

    /// 빌더 패턴: 네임스페이스 항목 추가 (네임스페이스가 아니면 무시)
    pub fn with(mut self, name: impl Into<String>, attr: Attr) -> Self {
        if let Self::Namespace(entries) = &mut self {
            entries.insert(name.into(), attr);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attr> {
        match self {
            Self::Namespace(entries) => entries.get(name),
            _ => None,
        }
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Namespace(entries) => f.debug_map().entries(entries.iter()).finish(),
            Self::Class(_) => write!(f, "Class"),
            Self::Instance(c) => write!(f, "Instance({})", c.name()),
        }
    }
}

/// 서브앱 모듈의 최상위 속성 트리
///
/// - `partials` - 서브앱이 선언한 partial 속성
/// - `controllers.RootController` - 루트 컨트롤러 클래스
fn module_namespace(module: &Arc<dyn Pluggable>) -> Attr {
    let mut root = Attr::namespace();
    if let Some(partials) = module.partials() {
        root = root.with("partials", partials);
    }
    if module.root_controller().is_some() {
        let factory_module = Arc::clone(module);
        root = root.with(
            "controllers",
            Attr::namespace().with(
                "RootController",
                Attr::class(move || factory_module.root_controller().unwrap_or_default()),
            ),
        );
    }
    root
}

// ============================================================================
// PartialCaller
// ============================================================================

/// partial 호출기
pub struct PartialCaller {
    registry: SharedRegistry,
    config: Arc<HostConfig>,
    renderers: Arc<Renderers>,
    replacements: Arc<TemplateReplacements>,
    cache: RwLock<HashMap<String, ExposedMethod>>,
}

impl PartialCaller {
    pub fn new(
        registry: SharedRegistry,
        config: Arc<HostConfig>,
        renderers: Arc<Renderers>,
        replacements: Arc<TemplateReplacements>,
    ) -> Self {
        Self {
            registry,
            config,
            renderers,
            replacements,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// 경로를 노출 메서드로 해석
    pub fn resolve(&self, path: &str) -> Result<ExposedMethod> {
        let invalid = |reason: String| Error::PartialResolution(format!("{}: {}", path, reason));

        let (module_name, rest) = path
            .split_once('.')
            .ok_or_else(|| invalid("expected module.path:method".into()))?;
        let (attr_path, method) = rest
            .split_once(':')
            .ok_or_else(|| invalid("expected module.path:method".into()))?;

        let record = self
            .registry
            .read()
            .module(module_name)
            .ok_or_else(|| invalid(format!("module {} is not plugged", module_name)))?;

        let root = module_namespace(&record.module);
        let mut current = &root;
        for step in attr_path.split('.') {
            current = current
                .get(step)
                .ok_or_else(|| invalid(format!("{} has no attribute {}", module_name, step)))?;
        }

        let controller = match current {
            Attr::Class(factory) => factory(),
            Attr::Instance(controller) => controller.clone(),
            Attr::Namespace(_) => {
                return Err(invalid(format!("{} is a namespace", attr_path)));
            }
        };

        controller
            .method(method)
            .cloned()
            .ok_or_else(|| invalid(format!("{} has no method {}", controller.name(), method)))
    }

    /// 캐시된 해석 결과 수
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }

    /// partial 호출
    ///
    /// 메서드가 변수를 반환하면 선언된 템플릿(교체 반영)으로 조각을 렌더링하고,
    /// 그 외에는 결과를 그대로 반환합니다.
    pub fn call(&self, path: &str, params: &Params) -> Result<String> {
        let cached = self.cache.read().get(path).cloned();
        let method = match cached {
            Some(method) => method,
            None => {
                let method = self.resolve(path)?;
                debug!("Resolved partial {}", path);
                self.cache.write().insert(path.to_string(), method.clone());
                method
            }
        };

        match method.call(params)? {
            Output::Rendered(body) => Ok(body),
            Output::Vars(vars) => {
                let template = method.template().ok_or_else(|| {
                    Error::Template(format!("partial {} declares no template", path))
                })?;
                let target = self
                    .replacements
                    .apply(&TemplateRef::resolve(template, &self.config));
                self.renderers.render(&target, &vars, RenderMode::Fragment)
            }
        }
    }
}
