//! Bootstrap Adapter - 호스트 시드 진입점에 서브앱 시드를 연결
//!
//! 호스트 시드가 먼저 실행되고, 서브앱 시드는 플러깅 순서대로 실행됩니다.
//! 서브앱 시드가 무결성 충돌(이미 시드된 데이터)로 실패하면
//! 트랜잭션을 되돌리고 다음 단계로 계속합니다.

use crate::controller::Params;
use graft_foundation::{Error, HostConfig, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 시드 호출 인자
#[derive(Debug, Clone)]
pub struct BootstrapArgs {
    /// 실행 명령 (`setup-app` 등)
    pub command: String,
    pub config: Arc<HostConfig>,
    pub vars: Params,
}

impl BootstrapArgs {
    pub fn new(command: impl Into<String>, config: Arc<HostConfig>) -> Self {
        Self {
            command: command.into(),
            config,
            vars: Params::new(),
        }
    }
}

/// 시드 진입점
pub type SeedFn = Arc<dyn Fn(&BootstrapArgs) -> Result<()> + Send + Sync>;

/// 호스트 트랜잭션 관리자
pub trait TransactionManager: Send + Sync {
    fn commit(&self) -> Result<()>;
    fn abort(&self) -> Result<()>;
}

/// 서브앱 시드 단계
#[derive(Clone)]
pub struct SeedStep {
    pub module_name: String,
    seed: SeedFn,
}

impl SeedStep {
    pub fn new(module_name: impl Into<String>, seed: SeedFn) -> Self {
        Self {
            module_name: module_name.into(),
            seed,
        }
    }
}

/// 단계별 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded,
    /// 무결성 충돌로 되돌림 (메시지)
    Conflict(String),
}

/// 시드 실행 결과 (모듈 이름, 결과)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub host_ran: bool,
    pub steps: Vec<(String, SeedOutcome)>,
}

impl SeedReport {
    pub fn conflicts(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|(module, outcome)| match outcome {
            SeedOutcome::Conflict(_) => Some(module.as_str()),
            SeedOutcome::Seeded => None,
        })
    }
}

// ============================================================================
// SeedChain
// ============================================================================

/// 시드 체인
#[derive(Clone, Default)]
pub struct SeedChain {
    host: Option<SeedFn>,
    steps: Vec<SeedStep>,
}

impl SeedChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// 호스트 시드 설정
    pub fn set_host(&mut self, seed: SeedFn) {
        self.host = Some(seed);
    }

    /// 서브앱 시드로 체인을 감쌈
    pub fn wrap(&mut self, module_name: impl Into<String>, seed: SeedFn) {
        let step = SeedStep::new(module_name, seed);
        info!("Wrapped bootstrap with {}", step.module_name);
        self.steps.push(step);
    }

    pub fn is_wrapped(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn modules(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.module_name.as_str()).collect()
    }

    /// 체인 실행
    pub fn run(
        &self,
        args: &BootstrapArgs,
        transaction: Option<&dyn TransactionManager>,
    ) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        if let Some(host) = &self.host {
            info!("Running host bootstrap ({})", args.command);
            host(args)?;
            report.host_ran = true;
        }

        if self.is_wrapped() && transaction.is_none() {
            warn!("No transaction manager configured, pluggable seeds will not be committed");
        }

        for step in &self.steps {
            info!("Bootstrapping {}", step.module_name);
            match (step.seed)(args) {
                Ok(()) => {
                    if let Some(tx) = transaction {
                        tx.commit()?;
                    }
                    report
                        .steps
                        .push((step.module_name.clone(), SeedOutcome::Seeded));
                }
                Err(e) if e.is_integrity_conflict() => {
                    let conflict = Error::seed_conflict(&step.module_name, e.to_string());
                    error!(
                        "{}. Probably data already existed, continuing",
                        conflict
                    );
                    if let Some(tx) = transaction {
                        tx.abort()?;
                    }
                    report
                        .steps
                        .push((step.module_name.clone(), SeedOutcome::Conflict(e.to_string())));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}
