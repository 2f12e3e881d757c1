//! Template Engines - 렌더 엔진 추상화
//!
//! 호스트가 여러 엔진을 등록하고, 템플릿 참조(`engine:name`)로 선택합니다.

use graft_foundation::{Error, HostConfig, Result};
use minijinja::Environment;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// 템플릿 변수
pub type TemplateVars = Map<String, Value>;

/// 렌더링 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// 전체 페이지
    Page,
    /// 페이지 조각 (doctype 없이)
    Fragment,
}

/// 렌더 엔진
pub trait TemplateEngine: Send + Sync {
    /// 엔진 이름 (템플릿 참조의 접두사)
    fn name(&self) -> &str;

    /// 템플릿 렌더링
    fn render(&self, template: &str, vars: &TemplateVars, mode: RenderMode) -> Result<String>;
}

/// 선행 doctype 선언 제거
pub fn strip_doctype(output: &str) -> String {
    static DOCTYPE: OnceLock<Option<Regex>> = OnceLock::new();
    let doctype = DOCTYPE.get_or_init(|| Regex::new(r"(?i)^\s*<!doctype[^>]*>\s*").ok());
    match doctype {
        Some(re) => re.replace(output, "").into_owned(),
        None => output.to_string(),
    }
}

// ============================================================================
// JinjaEngine
// ============================================================================

/// minijinja 기반 엔진
pub struct JinjaEngine {
    name: String,
    env: RwLock<Environment<'static>>,
    doctype: Option<String>,
}

impl JinjaEngine {
    pub fn new() -> Self {
        Self {
            name: graft_foundation::DEFAULT_RENDERER.to_string(),
            env: RwLock::new(Environment::new()),
            doctype: None,
        }
    }

    /// 디렉토리에서 템플릿을 읽는 엔진
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let engine = Self::new();
        engine
            .env
            .write()
            .set_loader(minijinja::path_loader(dir.as_ref().to_path_buf()));
        engine
    }

    /// 빌더 패턴: 엔진 이름
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 빌더 패턴: 페이지 모드에서 붙일 doctype
    pub fn with_doctype(mut self, doctype: impl Into<String>) -> Self {
        self.doctype = Some(doctype.into());
        self
    }

    /// 빌더 패턴: 인라인 템플릿
    pub fn with_template(self, name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        self.add_template(name, source)?;
        Ok(self)
    }

    /// 인라인 템플릿 등록
    pub fn add_template(&self, name: impl Into<String>, source: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.env
            .write()
            .add_template_owned(name.clone(), source.into())
            .map_err(|e| Error::Template(format!("Cannot parse template {}: {}", name, e)))
    }
}

impl Default for JinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for JinjaEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, template: &str, vars: &TemplateVars, mode: RenderMode) -> Result<String> {
        let env = self.env.read();
        let tmpl = env
            .get_template(template)
            .map_err(|e| Error::Template(format!("Template not found: {}", e)))?;
        let rendered = tmpl
            .render(minijinja::Value::from_serialize(vars))
            .map_err(|e| Error::Template(format!("Template render error: {}", e)))?;

        Ok(match (mode, &self.doctype) {
            (RenderMode::Fragment, _) => strip_doctype(&rendered),
            (RenderMode::Page, Some(doctype))
                if !rendered.trim_start().to_ascii_lowercase().starts_with("<!doctype") =>
            {
                format!("{}\n{}", doctype, rendered)
            }
            (RenderMode::Page, _) => rendered,
        })
    }
}

// ============================================================================
// JsonEngine
// ============================================================================

/// 변수를 JSON으로 직렬화하는 엔진 (템플릿 이름 무시)
#[derive(Debug, Default)]
pub struct JsonEngine;

impl TemplateEngine for JsonEngine {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&self, _template: &str, vars: &TemplateVars, _mode: RenderMode) -> Result<String> {
        Ok(serde_json::to_string(vars)?)
    }
}

// ============================================================================
// TemplateRef - (엔진, 템플릿) 참조
// ============================================================================

/// 해석된 템플릿 참조
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateRef {
    pub engine: String,
    pub template: String,
}

impl TemplateRef {
    pub fn new(engine: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            template: template.into(),
        }
    }

    /// 참조 문자열 해석
    ///
    /// 명시적 `engine:` 접두사 > 렌더러 목록에 있는 이름 > 기본 렌더러
    pub fn resolve(reference: &str, config: &HostConfig) -> Self {
        if let Some((engine, template)) = reference.split_once(':') {
            return Self::new(engine, template);
        }
        if config.is_renderer(reference) {
            return Self::new(reference, "");
        }
        Self::new(config.default_renderer.clone(), reference)
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.engine, self.template)
    }
}

// ============================================================================
// Renderers - 엔진 레지스트리
// ============================================================================

/// 등록된 렌더 엔진들
#[derive(Clone, Default)]
pub struct Renderers {
    engines: HashMap<String, Arc<dyn TemplateEngine>>,
}

impl Renderers {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기본 엔진(jinja, json)이 등록된 레지스트리
    pub fn with_defaults() -> Self {
        let mut renderers = Self::new();
        renderers.register(Arc::new(JinjaEngine::new()));
        renderers.register(Arc::new(JsonEngine));
        renderers
    }

    /// 엔진 등록. 같은 이름은 교체
    pub fn register(&mut self, engine: Arc<dyn TemplateEngine>) {
        self.engines.insert(engine.name().to_string(), engine);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn TemplateEngine>> {
        self.engines.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 참조로 렌더링
    pub fn render(&self, target: &TemplateRef, vars: &TemplateVars, mode: RenderMode) -> Result<String> {
        let engine = self
            .get(&target.engine)
            .ok_or_else(|| Error::Template(format!("Unknown render engine: {}", target.engine)))?;
        engine.render(&target.template, vars, mode)
    }
}

impl fmt::Debug for Renderers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderers").field("engines", &self.names()).finish()
    }
}
