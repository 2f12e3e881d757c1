//! # Plugin System
//!
//! 서브앱(pluggable) 플러깅
//!
//! ## 구성
//!
//! - `traits.rs` - `Pluggable` 계약과 `ModuleCatalog`
//! - `registry.rs` - 설정 객체별 공유 레지스트리
//! - `plug.rs` - `plug()` 오케스트레이터와 지연 배선
//!
//! ## 흐름
//!
//! ```text
//! plug(configurator, "shop", options)
//!   ├─ 옵션 병합 / appid 확정 / 슬롯 예약 (동기)
//!   ├─ ConfigReady  → 모델, helper, 시드, 정적 파일, 번역 배선
//!   ├─ NewApp       → 배선 실패 시 시작 중단
//!   └─ AppReady     → 루트 컨트롤러 마운트
//! ```

mod plug;
mod registry;
mod traits;

pub use plug::{fail_if_failed_to_plug, init_pluggables, plug};
pub use registry::{ModuleSlot, PluggedModule, PluggedRegistry, SharedRegistry};
pub use traits::{ModuleCatalog, Pluggable};
