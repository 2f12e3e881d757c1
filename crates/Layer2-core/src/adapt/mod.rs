//! Adapt - 서브앱 구성 요소를 호스트에 연결하는 어댑터
//!
//! - `models.rs` - 엔티티 이름 변경과 스키마 병합
//! - `controllers.rs` - 루트 컨트롤러 마운트
//! - `bootstrap.rs` - 시드 체인
//! - `statics.rs` - 정적 파일 미들웨어
//! - `helpers.rs` - helper 네임스페이스

mod bootstrap;
mod controllers;
mod helpers;
mod models;
mod statics;

pub use bootstrap::{
    BootstrapArgs, SeedChain, SeedFn, SeedOutcome, SeedReport, SeedStep, TransactionManager,
};
pub use controllers::ControllersAdapter;
pub use helpers::{plug_helpers, Helper, HelperFn, HelperNamespace, HelpersReport};
pub use models::ModelsAdapter;
pub use statics::{PluggedStaticsMiddleware, StaticFiles};
