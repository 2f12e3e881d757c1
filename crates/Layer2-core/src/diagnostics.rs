//! Diagnostics - 설정 중 발생한 경고와 배선 실패 기록
//!
//! 모든 항목은 tracing으로도 기록됩니다.

use tracing::{error, warn};

/// 진단 항목 수준
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// 진단 항목
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// 관련 서브앱 모듈 이름
    pub module: Option<String>,
    pub message: String,
}

/// 진단 목록
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, module: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        match module {
            Some(module) => warn!(module, "{}", message),
            None => warn!("{}", message),
        }
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            module: module.map(str::to_string),
            message,
        });
    }

    pub fn error(&mut self, module: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        match module {
            Some(module) => error!(module, "{}", message),
            None => error!("{}", message),
        }
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            module: module.map(str::to_string),
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
