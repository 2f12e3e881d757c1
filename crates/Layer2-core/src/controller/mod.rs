//! Controller - 컨트롤러 트리와 마운트
//!
//! - `tree.rs` - Controller / ExposedMethod
//! - `mount.rs` - 마운트 id 해석, PendingMount
//! - `block.rs` - 메서드 차단

mod block;
mod mount;
mod tree;

pub use block::{map_controllers, BlockedControllers};
pub use mount::{resolve_mountpoint, split_mount_id, PendingMount};
pub use tree::{Controller, ExposedMethod, HandlerFn, Output, Params};
