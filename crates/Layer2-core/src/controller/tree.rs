//! Controller Tree - 객체 트리 기반 라우팅 구조
//!
//! 각 노드는 자식 컨트롤러(하위 경로)와 노출 메서드를 가집니다.
//! 마운트는 부모 노드의 자식 슬롯에 서브앱 루트를 끼워 넣는 것입니다.

use graft_foundation::{Error, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// 요청 파라미터 / 템플릿 변수
pub type Params = Map<String, Value>;

/// 노출 메서드의 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// 선언된 템플릿으로 렌더링할 변수
    Vars(Params),
    /// 이미 렌더링된 본문
    Rendered(String),
}

/// 노출 메서드 핸들러
pub type HandlerFn = Arc<dyn Fn(&Params) -> anyhow::Result<Output> + Send + Sync>;

// ============================================================================
// ExposedMethod
// ============================================================================

/// 외부에 노출된 컨트롤러 메서드
#[derive(Clone)]
pub struct ExposedMethod {
    handler: HandlerFn,
    template: Option<String>,
    blocked: bool,
}

impl ExposedMethod {
    pub fn new(handler: impl Fn(&Params) -> anyhow::Result<Output> + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            template: None,
            blocked: false,
        }
    }

    /// 빌더 패턴: 선언 템플릿 (`engine:name` 또는 `name`)
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// 차단 (이후 호출은 not-found로 응답)
    pub fn block(&mut self) {
        self.blocked = true;
    }

    /// 메서드 호출
    pub fn call(&self, params: &Params) -> Result<Output> {
        if self.blocked {
            return Err(Error::Blocked("method is not exposed".into()));
        }
        Ok((self.handler)(params)?)
    }
}

impl fmt::Debug for ExposedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExposedMethod")
            .field("template", &self.template)
            .field("blocked", &self.blocked)
            .finish()
    }
}

// ============================================================================
// Controller
// ============================================================================

/// 컨트롤러 노드
#[derive(Debug, Clone, Default)]
pub struct Controller {
    name: String,
    children: BTreeMap<String, Controller>,
    methods: BTreeMap<String, ExposedMethod>,
}

impl Controller {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 빌더 패턴: 자식 컨트롤러
    pub fn with_child(mut self, attr: impl Into<String>, child: Controller) -> Self {
        self.children.insert(attr.into(), child);
        self
    }

    /// 빌더 패턴: 노출 메서드
    pub fn with_method(mut self, name: impl Into<String>, method: ExposedMethod) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    /// 빌더 패턴: 핸들러만으로 메서드 노출
    pub fn expose(
        self,
        name: impl Into<String>,
        handler: impl Fn(&Params) -> anyhow::Result<Output> + Send + Sync + 'static,
    ) -> Self {
        self.with_method(name, ExposedMethod::new(handler))
    }

    pub fn child(&self, attr: &str) -> Option<&Controller> {
        self.children.get(attr)
    }

    pub fn child_mut(&mut self, attr: &str) -> Option<&mut Controller> {
        self.children.get_mut(attr)
    }

    /// 자식 슬롯 설정. 이전 값이 있으면 반환
    pub fn set_child(&mut self, attr: impl Into<String>, child: Controller) -> Option<Controller> {
        self.children.insert(attr.into(), child)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &Controller)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn method(&self, name: &str) -> Option<&ExposedMethod> {
        self.methods.get(name)
    }

    pub fn method_mut(&mut self, name: &str) -> Option<&mut ExposedMethod> {
        self.methods.get_mut(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// `/a/b` 형태의 경로로 하위 컨트롤러 조회
    pub fn find(&self, path: &str) -> Option<&Controller> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, segment| node.child(segment))
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut Controller> {
        let mut node = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }

    /// `/a/b/method` 경로의 메서드 조회 (빈 경로나 `/`로 끝나는 경로는 `index`)
    pub fn resolve_method(&self, path: &str) -> Result<&ExposedMethod> {
        let trimmed = path.trim_start_matches('/');
        let (parent, method) = match trimmed.rsplit_once('/') {
            Some((parent, method)) => (parent, method),
            None => ("", trimmed),
        };
        let method = if method.is_empty() { "index" } else { method };

        self.find(parent)
            .and_then(|node| node.method(method))
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    /// `/a/b/method` 경로의 메서드를 호출
    pub fn dispatch(&self, path: &str, params: &Params) -> Result<Output> {
        self.resolve_method(path)?
            .call(params)
            .map_err(|e| match e {
                Error::Blocked(_) => Error::NotFound(path.to_string()),
                other => other,
            })
    }
}
