//! Template - 렌더 엔진, 템플릿 교체, HTML 패치
//!
//! - `engine.rs` - TemplateEngine, JinjaEngine, JsonEngine, Renderers, TemplateRef
//! - `render.rs` - RenderHook, RenderPipeline
//! - `replacements.rs` - 렌더 전 템플릿 교체
//! - `patching.rs` - 렌더 후 CSS 선택자 기반 패치

mod engine;
mod patching;
mod render;
mod replacements;

pub use engine::{
    strip_doctype, JinjaEngine, JsonEngine, RenderMode, Renderers, TemplateEngine, TemplateRef,
    TemplateVars,
};
pub use patching::{parse_patches, Action, ActionKind, Patch, TemplatePatches};
pub use render::{RenderHook, RenderPipeline, RenderRequest};
pub use replacements::TemplateReplacements;
