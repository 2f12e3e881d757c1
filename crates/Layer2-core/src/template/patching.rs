//! Template Patching - 렌더링된 HTML을 CSS 선택자로 변형
//!
//! 패치 파일 형식:
//!
//! ```xml
//! <patches>
//!   <patch template="home.html">
//!     <content selector="#sidebar" template="shop/sidebar.html"/>
//!     <replace selector=".ads"/>
//!   </patch>
//! </patches>
//! ```
//!
//! 액션은 `prepend`, `append`, `replace`, `content` 네 가지입니다.
//! 선택자와 액션 종류는 로드 시점에 검증됩니다.

use super::engine::{RenderMode, Renderers, TemplateRef, TemplateVars};
use super::render::{RenderHook, RenderRequest};
use graft_foundation::{Error, HostConfig, Result};
use lol_html::html_content::ContentType;
use lol_html::{rewrite_str, ElementContentHandlers, RewriteStrSettings, Selector};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// ActionKind
// ============================================================================

/// 패치 액션 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// 일치한 요소 앞에 조각 삽입
    Prepend,
    /// 일치한 요소 뒤에 조각 삽입
    Append,
    /// 요소를 조각으로 교체 (조각이 없으면 제거)
    Replace,
    /// 요소의 내용을 조각으로 교체
    Content,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Replace,
        ActionKind::Append,
        ActionKind::Prepend,
        ActionKind::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prepend => "prepend",
            Self::Append => "append",
            Self::Replace => "replace",
            Self::Content => "content",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                Error::InvalidAction(format!(
                    "{} is not one of the recognized actions: replace, append, prepend, content",
                    s
                ))
            })
    }
}

// ============================================================================
// Action
// ============================================================================

/// 단일 패치 액션
#[derive(Clone)]
pub struct Action {
    kind: ActionKind,
    selector_source: String,
    selector: Arc<Selector>,
    template: Option<TemplateRef>,
}

impl Action {
    /// 액션 생성. 선택자가 없거나 잘못되면 실패
    pub fn new(
        kind: &str,
        selector: Option<&str>,
        template: Option<&str>,
        config: &HostConfig,
    ) -> Result<Self> {
        let kind: ActionKind = kind.parse()?;

        let selector_source = selector
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::MalformedPatch(format!("selector missing for action {}", kind)))?
            .to_string();
        let selector = selector_source.parse::<Selector>().map_err(|e| {
            Error::MalformedPatch(format!("invalid selector {}: {}", selector_source, e))
        })?;

        let template = template
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| TemplateRef::resolve(t, config));

        Ok(Self {
            kind,
            selector_source,
            selector: Arc::new(selector),
            template,
        })
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn selector(&self) -> &str {
        &self.selector_source
    }

    pub fn template(&self) -> Option<&TemplateRef> {
        self.template.as_ref()
    }

    /// HTML에 액션 적용
    ///
    /// 조각은 첫 번째 일치 요소에서 한 번만 렌더링되며, 일치한 모든 요소에 같은 조각이 쓰입니다.
    pub fn apply(&self, html: &str, vars: &TemplateVars, renderers: &Renderers) -> Result<String> {
        let kind = self.kind;
        let template = self.template.as_ref();
        let mut fragment: Option<String> = None;

        let handlers = ElementContentHandlers::default().element(|el| {
            let content = match &fragment {
                Some(content) => content.clone(),
                None => {
                    let rendered = match template {
                        Some(target) => renderers.render(target, vars, RenderMode::Fragment)?,
                        None => String::new(),
                    };
                    fragment = Some(rendered.clone());
                    rendered
                }
            };

            match kind {
                ActionKind::Prepend => {
                    if !content.is_empty() {
                        el.before(&content, ContentType::Html);
                    }
                }
                ActionKind::Append => {
                    if !content.is_empty() {
                        el.after(&content, ContentType::Html);
                    }
                }
                ActionKind::Replace => {
                    if content.is_empty() {
                        el.remove();
                    } else {
                        el.replace(&content, ContentType::Html);
                    }
                }
                ActionKind::Content => el.set_inner_content(&content, ContentType::Html),
            }
            Ok(())
        });

        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![(Cow::Borrowed(self.selector.as_ref()), handlers)],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|e| {
            Error::Template(format!(
                "Cannot apply {} on {}: {}",
                self.kind, self.selector_source, e
            ))
        })
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind)
            .field("selector", &self.selector_source)
            .field("template", &self.template)
            .finish()
    }
}

// ============================================================================
// Patch
// ============================================================================

/// 한 템플릿에 대한 액션 묶음
#[derive(Debug, Clone)]
pub struct Patch {
    template: String,
    actions: Vec<Action>,
}

impl Patch {
    pub fn new(template: Option<&str>, config: &HostConfig) -> Result<Self> {
        let template = template
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::MalformedPatch("template missing for patch".into()))?;

        Ok(Self {
            template: TemplateRef::resolve(template, config).template,
            actions: Vec::new(),
        })
    }

    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.add_action(action);
        self
    }

    /// 대상 템플릿 이름 (엔진 접두사 제외)
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

// ============================================================================
// 패치 파일 파싱
// ============================================================================

fn xml_error(e: impl fmt::Display) -> Error {
    Error::Xml(e.to_string())
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    match element.try_get_attribute(name).map_err(xml_error)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned())),
        None => Ok(None),
    }
}

/// 열린 패치와 그 깊이
type OpenPatch = Option<(Patch, usize)>;

fn open_element(
    element: &BytesStart<'_>,
    depth: usize,
    current: &mut OpenPatch,
    patches: &mut Vec<Patch>,
    config: &HostConfig,
) -> Result<()> {
    let tag = String::from_utf8_lossy(element.name().as_ref()).into_owned();

    if tag == "patch" {
        if let Some((previous, _)) = current.take() {
            patches.push(previous);
        }
        let patch = Patch::new(attribute(element, "template")?.as_deref(), config)?;
        *current = Some((patch, depth));
        return Ok(());
    }

    if let Some((patch, patch_depth)) = current.as_mut() {
        if depth == *patch_depth + 1 {
            let action = Action::new(
                &tag,
                attribute(element, "selector")?.as_deref(),
                attribute(element, "template")?.as_deref(),
                config,
            )?;
            patch.add_action(action);
        }
    }
    Ok(())
}

/// 패치 XML 파싱
pub fn parse_patches(xml: &str, config: &HostConfig) -> Result<Vec<Patch>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut patches = Vec::new();
    let mut current: OpenPatch = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                open_element(&e, depth, &mut current, &mut patches, config)?;
            }
            Ok(Event::Empty(e)) => {
                open_element(&e, depth + 1, &mut current, &mut patches, config)?;
                if matches!(&current, Some((_, d)) if *d == depth + 1) {
                    if let Some((patch, _)) = current.take() {
                        patches.push(patch);
                    }
                }
            }
            Ok(Event::End(_)) => {
                if matches!(&current, Some((_, d)) if *d == depth) {
                    if let Some((patch, _)) = current.take() {
                        patches.push(patch);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some((patch, _)) = current.take() {
        patches.push(patch);
    }
    Ok(patches)
}

// ============================================================================
// TemplatePatches - 템플릿별 패치 저장소
// ============================================================================

/// 템플릿 이름 -> 패치 목록
#[derive(Debug, Clone, Default)]
pub struct TemplatePatches {
    by_template: BTreeMap<String, Vec<Patch>>,
}

impl TemplatePatches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, patch: Patch) {
        self.by_template
            .entry(patch.template.clone())
            .or_default()
            .push(patch);
    }

    /// XML 문자열에서 로드. 로드된 패치 수를 반환
    pub fn load_str(&mut self, xml: &str, config: &HostConfig) -> Result<usize> {
        let patches = parse_patches(xml, config)?;
        let count = patches.len();
        for patch in patches {
            self.add(patch);
        }
        Ok(count)
    }

    /// 파일에서 로드. 파일이 없으면 경고만 남김
    pub fn load_file(&mut self, path: &Path, config: &HostConfig) -> Result<usize> {
        if !path.exists() {
            warn!("No patches file at {}", path.display());
            return Ok(0);
        }
        info!("Loading Patches: {}", path.display());
        let xml = std::fs::read_to_string(path)?;
        self.load_str(&xml, config)
    }

    pub fn patches_for(&self, template: &str) -> Option<&[Patch]> {
        self.by_template.get(template).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.by_template.is_empty()
    }

    /// 패치 순서, 그 안에서 액션 순서대로 적용
    pub fn apply(
        &self,
        template: &str,
        html: &str,
        vars: &TemplateVars,
        renderers: &Renderers,
    ) -> Result<Option<String>> {
        let Some(patches) = self.patches_for(template) else {
            return Ok(None);
        };

        let mut output = html.to_string();
        for patch in patches {
            for action in patch.actions() {
                debug!("Applying {} {} on {}", action.kind(), action.selector(), template);
                output = action.apply(&output, vars, renderers)?;
            }
        }
        Ok(Some(output))
    }
}

impl RenderHook for TemplatePatches {
    fn name(&self) -> &str {
        "template_patches"
    }

    fn after_render(
        &self,
        request: &RenderRequest,
        output: &mut String,
        renderers: &Renderers,
    ) -> Result<()> {
        if let Some(patched) =
            self.apply(&request.target.template, output, &request.vars, renderers)?
        {
            *output = patched;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::JinjaEngine;
    use serde_json::json;

    fn renderers() -> Renderers {
        let mut renderers = Renderers::with_defaults();
        let engine = JinjaEngine::new()
            .with_template("bold.html", "<b>{{ label }}</b>")
            .unwrap();
        renderers.register(Arc::new(engine));
        renderers
    }

    fn vars() -> TemplateVars {
        json!({"label": "X"}).as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_patch_file() {
        let config = HostConfig::default();
        let patches = parse_patches(
            r##"<patches>
                <patch template="jinja:home.html">
                    <content selector="#sidebar" template="bold.html"/>
                    <replace selector=".ads"/>
                </patch>
                <patch template="about.html"/>
            </patches>"##,
            &config,
        )
        .unwrap();

        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].template(), "home.html");
        assert_eq!(patches[0].actions().len(), 2);
        assert_eq!(patches[0].actions()[0].kind(), ActionKind::Content);
        assert_eq!(
            patches[0].actions()[0].template(),
            Some(&TemplateRef::new("jinja", "bold.html"))
        );
        assert!(patches[0].actions()[1].template().is_none());
        assert_eq!(patches[1].template(), "about.html");
    }

    #[test]
    fn test_invalid_declarations() {
        let config = HostConfig::default();
        let err = parse_patches(
            r#"<patches><patch template="home.html"><remove selector="p"/></patch></patches>"#,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidAction(_)));

        let err = parse_patches(r#"<patches><patch><content selector="p"/></patch></patches>"#, &config)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedPatch(_)));

        let err = parse_patches(
            r#"<patches><patch template="home.html"><content template="x.html"/></patch></patches>"#,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedPatch(_)));
    }

    #[test]
    fn test_content_action() {
        let config = HostConfig::default();
        let action = Action::new("content", Some("#sidebar"), Some("bold.html"), &config).unwrap();
        let out = action
            .apply(r#"<div id="sidebar"><i>old</i></div>"#, &vars(), &renderers())
            .unwrap();
        assert_eq!(out, r#"<div id="sidebar"><b>X</b></div>"#);
    }

    #[test]
    fn test_prepend_append_replace() {
        let config = HostConfig::default();
        let html = r#"<ul><li class="a">1</li><li class="a">2</li></ul>"#;

        let prepend = Action::new("prepend", Some("li.a"), Some("bold.html"), &config).unwrap();
        assert_eq!(
            prepend.apply(html, &vars(), &renderers()).unwrap(),
            r#"<ul><b>X</b><li class="a">1</li><b>X</b><li class="a">2</li></ul>"#
        );

        let append = Action::new("append", Some("ul"), Some("bold.html"), &config).unwrap();
        assert_eq!(
            append.apply(html, &vars(), &renderers()).unwrap(),
            format!("{}<b>X</b>", html)
        );

        let remove = Action::new("replace", Some("li.a"), None, &config).unwrap();
        assert_eq!(remove.apply(html, &vars(), &renderers()).unwrap(), "<ul></ul>");
    }

    #[test]
    fn test_no_match_leaves_output() {
        let config = HostConfig::default();
        let action = Action::new("content", Some("#missing"), Some("bold.html"), &config).unwrap();
        let html = "<p>unchanged</p>";
        assert_eq!(action.apply(html, &vars(), &renderers()).unwrap(), html);
    }

    #[test]
    fn test_patches_apply_in_order() {
        let config = HostConfig::default();
        let mut patches = TemplatePatches::new();
        patches
            .load_str(
                r#"<patches>
                    <patch template="home.html">
                        <content selector="p" template="bold.html"/>
                    </patch>
                    <patch template="home.html">
                        <append selector="b" template="bold.html"/>
                    </patch>
                </patches>"#,
                &config,
            )
            .unwrap();

        let out = patches
            .apply("home.html", "<p>x</p>", &vars(), &renderers())
            .unwrap()
            .unwrap();
        assert_eq!(out, "<p><b>X</b><b>X</b></p>");
        assert!(patches
            .apply("other.html", "<p>x</p>", &vars(), &renderers())
            .unwrap()
            .is_none());
    }
}
