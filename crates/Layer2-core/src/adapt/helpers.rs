//! Helpers Adapter - 서브앱 helper를 호스트 helper 네임스페이스에 연결

use crate::diagnostics::Diagnostics;
use graft_foundation::{CollisionPolicy, Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// helper 함수
pub type HelperFn = Arc<dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// helper 네임스페이스 항목
#[derive(Clone)]
pub enum Helper {
    Function(HelperFn),
    Namespace(HelperNamespace),
    Value(Value),
}

impl Helper {
    pub fn function(f: impl Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static) -> Self {
        Self::Function(Arc::new(f))
    }
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => write!(f, "Function"),
            Self::Namespace(ns) => ns.fmt(f),
            Self::Value(v) => write!(f, "Value({})", v),
        }
    }
}

// ============================================================================
// HelperNamespace
// ============================================================================

/// 이름 -> helper
#[derive(Clone, Default)]
pub struct HelperNamespace {
    entries: BTreeMap<String, Helper>,
}

impl HelperNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.insert(name, Helper::function(f));
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, Helper::Value(value));
        self
    }

    pub fn with_namespace(mut self, name: impl Into<String>, namespace: HelperNamespace) -> Self {
        self.insert(name, Helper::Namespace(namespace));
        self
    }

    /// 항목 설정. 이전 값이 있으면 반환
    pub fn insert(&mut self, name: impl Into<String>, helper: Helper) -> Option<Helper> {
        self.entries.insert(name.into(), helper)
    }

    pub fn get(&self, name: &str) -> Option<&Helper> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn namespace(&self, name: &str) -> Option<&HelperNamespace> {
        match self.entries.get(name) {
            Some(Helper::Namespace(ns)) => Some(ns),
            _ => None,
        }
    }

    /// `_`로 시작하지 않는 항목
    pub fn public_entries(&self) -> impl Iterator<Item = (&str, &Helper)> {
        self.entries
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(name, helper)| (name.as_str(), helper))
    }

    /// 점 경로(`shop.format_currency`)로 helper 호출
    pub fn call(&self, path: &str, args: &[Value]) -> Result<Value> {
        let (namespace, name) = match path.rsplit_once('.') {
            Some((prefix, name)) => {
                let ns = prefix.split('.').try_fold(self, |ns, segment| ns.namespace(segment));
                (ns, name)
            }
            None => (Some(self), path),
        };

        match namespace.and_then(|ns| ns.get(name)) {
            Some(Helper::Function(f)) => Ok(f(args)?),
            Some(Helper::Value(v)) => Ok(v.clone()),
            Some(Helper::Namespace(_)) => {
                Err(Error::InvalidInput(format!("helper {} is a namespace", path)))
            }
            None => Err(Error::NotFound(format!("helper {}", path))),
        }
    }
}

impl fmt::Debug for HelperNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

// ============================================================================
// plug_helpers
// ============================================================================

/// helper 연결 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpersReport {
    /// 서브앱 네임스페이스가 붙은 이름
    pub attached: String,
    /// 전역으로 복사된 이름
    pub copied: Vec<String>,
    /// 충돌한 이름
    pub collisions: Vec<String>,
}

/// 서브앱 helper 연결
///
/// 서브앱 네임스페이스는 항상 모듈 이름 아래에 붙습니다.
/// `global`이면 공개 항목을 호스트 네임스페이스에 직접 복사하며,
/// 충돌은 `policy`에 따라 처리하고 경고를 남깁니다.
pub fn plug_helpers(
    app_helpers: &mut HelperNamespace,
    module_name: &str,
    helpers: HelperNamespace,
    global: bool,
    policy: CollisionPolicy,
    diagnostics: &mut Diagnostics,
) -> HelpersReport {
    let mut report = HelpersReport {
        attached: module_name.to_string(),
        ..Default::default()
    };

    if global {
        for (name, helper) in helpers.public_entries() {
            if app_helpers.contains(name) {
                report.collisions.push(name.to_string());
                let message = match policy {
                    CollisionPolicy::Skip => format!(
                        "Helper {} already exists in the host helpers, keeping the existing one",
                        name
                    ),
                    CollisionPolicy::Overwrite => format!(
                        "Helper {} already exists in the host helpers, overwriting it",
                        name
                    ),
                };
                diagnostics.warn(Some(module_name), message);
                if policy == CollisionPolicy::Skip {
                    continue;
                }
            }
            app_helpers.insert(name, helper.clone());
            report.copied.push(name.to_string());
        }
    }

    debug!("Attached {} helpers as h.{}", module_name, module_name);
    app_helpers.insert(module_name, Helper::Namespace(helpers));
    report
}
