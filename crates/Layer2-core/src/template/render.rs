//! Render Pipeline - 렌더 전/후 훅을 거치는 페이지 렌더링

use super::engine::{RenderMode, Renderers, TemplateRef, TemplateVars};
use graft_foundation::{HostConfig, Result};
use std::sync::Arc;
use tracing::debug;

/// 렌더 요청
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// 렌더링할 템플릿 (before 훅이 교체할 수 있음)
    pub target: TemplateRef,
    pub vars: TemplateVars,
}

/// 렌더 훅
pub trait RenderHook: Send + Sync {
    fn name(&self) -> &str;

    /// 렌더링 전 (템플릿 교체 등)
    fn before_render(&self, _request: &mut RenderRequest) -> Result<()> {
        Ok(())
    }

    /// 렌더링 후 (출력 변형 등)
    fn after_render(
        &self,
        _request: &RenderRequest,
        _output: &mut String,
        _renderers: &Renderers,
    ) -> Result<()> {
        Ok(())
    }
}

/// 훅이 적용되는 렌더 파이프라인
#[derive(Clone)]
pub struct RenderPipeline {
    config: Arc<HostConfig>,
    renderers: Arc<Renderers>,
    hooks: Vec<Arc<dyn RenderHook>>,
}

impl RenderPipeline {
    pub fn new(config: Arc<HostConfig>, renderers: Arc<Renderers>) -> Self {
        Self {
            config,
            renderers,
            hooks: Vec::new(),
        }
    }

    /// 빌더 패턴: 훅 추가 (등록 순서대로 실행)
    pub fn with_hook(mut self, hook: Arc<dyn RenderHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn renderers(&self) -> &Arc<Renderers> {
        &self.renderers
    }

    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// 페이지 렌더링
    pub fn render(&self, template: &str, vars: TemplateVars) -> Result<String> {
        let mut request = RenderRequest {
            target: TemplateRef::resolve(template, &self.config),
            vars,
        };

        for hook in &self.hooks {
            hook.before_render(&mut request)?;
        }

        debug!("Rendering {}", request.target);
        let mut output = self
            .renderers
            .render(&request.target, &request.vars, RenderMode::Page)?;

        for hook in &self.hooks {
            hook.after_render(&request, &mut output, &self.renderers)?;
        }

        Ok(output)
    }
}
