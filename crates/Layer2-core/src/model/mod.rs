//! Model - 서브앱 엔티티와 호스트 스키마
//!
//! - `types.rs` - EntityClass, TableDescriptor, DocumentMeta, ModelModule
//! - `detect.rs` - 엔티티 종류 판별 (문서 우선, 그 다음 관계형)
//! - `backend.rs` - 종류별 이름 변경, 서술자, 기본 키
//! - `metadata.rs` - 호스트 SchemaMetadata / HostModel
//! - `session.rs` - SessionHandle, SessionProxy, AppModelProxy

mod backend;
mod detect;
mod metadata;
mod session;
mod types;

pub use backend::{
    backend_for, instance_primary_key, primary_key, DocumentBackend, ModelBackend,
    RelationalBackend, DOCUMENT_ID_FIELD,
};
pub use detect::{detect_model, is_model, ModelKind};
pub use metadata::{HostModel, SchemaMetadata, SharedModel, StorageDescriptor};
pub use session::{AppModelProxy, SessionHandle, SessionProxy};
pub use types::{
    ColumnDef, DocumentMeta, EntityClass, ForeignKey, InitModelFn, Member, ModelModule,
    TableDescriptor,
};
