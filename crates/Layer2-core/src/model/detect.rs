//! Model Detection - 엔티티 종류 판별

use super::types::EntityClass;
use graft_foundation::{Error, Result};

/// 영속 엔티티 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// 테이블 이름과 컬럼을 가진 관계형 엔티티
    Relational,
    /// 컬렉션 메타데이터를 가진 문서 엔티티
    Document,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relational => write!(f, "relational"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// 엔티티 종류 판별
///
/// 문서 메타데이터를 먼저 확인하고, 그 다음 테이블 식별자를 확인합니다.
pub fn detect_model(entity: &EntityClass) -> Result<ModelKind> {
    if entity.mongometa.is_some() {
        return Ok(ModelKind::Document);
    }
    if entity.tablename.is_some() && entity.table.is_some() {
        return Ok(ModelKind::Relational);
    }
    Err(Error::UnknownModelKind(format!(
        "Unable to detect model type for {}",
        entity.class_name
    )))
}

/// 영속 엔티티인지 여부
pub fn is_model(entity: &EntityClass) -> bool {
    detect_model(entity).is_ok()
}
