//! Template Replacements - 호스트 템플릿 교체 테이블
//!
//! 서브앱이 선언한 템플릿을 호스트의 다른 템플릿으로 바꿔 렌더링합니다.
//! 교체 대상 참조는 등록 시점에 한 번 해석됩니다.

use super::engine::TemplateRef;
use super::render::{RenderHook, RenderRequest};
use graft_foundation::{HostConfig, Result};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// 템플릿 교체 테이블 (원래 템플릿 이름 -> 대체 참조)
#[derive(Debug, Clone, Default)]
pub struct TemplateReplacements {
    table: BTreeMap<String, TemplateRef>,
}

impl TemplateReplacements {
    pub fn new() -> Self {
        Self::default()
    }

    /// 교체 등록. `past`는 엔진 접두사를 제외한 템플릿 이름으로 저장
    pub fn replace(&mut self, past: &str, new: &str, config: &HostConfig) {
        let past = TemplateRef::resolve(past, config).template;
        let target = TemplateRef::resolve(new, config);
        info!("Template {} replaced by {}", past, target);
        self.table.insert(past, target);
    }

    pub fn lookup(&self, template: &str) -> Option<&TemplateRef> {
        self.table.get(template)
    }

    /// 교체가 있으면 대체 참조, 없으면 원래 참조
    pub fn apply(&self, target: &TemplateRef) -> TemplateRef {
        self.lookup(&target.template)
            .cloned()
            .unwrap_or_else(|| target.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
}

impl RenderHook for TemplateReplacements {
    fn name(&self) -> &str {
        "template_replacements"
    }

    fn before_render(&self, request: &mut RenderRequest) -> Result<()> {
        if let Some(replacement) = self.lookup(&request.target.template) {
            debug!("Rendering {} instead of {}", replacement, request.target);
            request.target = replacement.clone();
        }
        Ok(())
    }
}
