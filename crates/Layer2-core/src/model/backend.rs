//! Model Backends - 엔티티 종류별 이름 변경 / 병합 / 키 조회

use super::detect::{detect_model, ModelKind};
use super::metadata::StorageDescriptor;
use super::types::EntityClass;
use graft_foundation::{Error, Result};
use serde_json::Value;

/// 문서 엔티티의 기본 키 필드
pub const DOCUMENT_ID_FIELD: &str = "_id";

/// 엔티티 종류별 동작
pub trait ModelBackend: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// 저장소 이름을 `{appid}_{name}`으로 변경
    fn rename(&self, entity: &mut EntityClass, appid: &str) -> Result<()>;

    /// 호스트 스키마에 병합할 서술자
    fn descriptor(&self, entity: &EntityClass) -> Result<StorageDescriptor>;

    /// 기본 키 필드 이름
    fn primary_key(&self, entity: &EntityClass) -> Result<String>;

    /// 인스턴스의 기본 키 값
    fn instance_primary_key(&self, entity: &EntityClass, instance: &Value) -> Result<Option<Value>> {
        let key = self.primary_key(entity)?;
        Ok(instance.get(key.as_str()).cloned())
    }
}

/// 관계형 백엔드
pub struct RelationalBackend;

impl ModelBackend for RelationalBackend {
    fn kind(&self) -> ModelKind {
        ModelKind::Relational
    }

    fn rename(&self, entity: &mut EntityClass, appid: &str) -> Result<()> {
        let table = entity
            .table
            .as_mut()
            .ok_or_else(|| Error::UnknownModelKind(entity.class_name.clone()))?;
        let renamed = format!("{}_{}", appid, table.name);
        table.name = renamed.clone();
        entity.tablename = Some(renamed);
        Ok(())
    }

    fn descriptor(&self, entity: &EntityClass) -> Result<StorageDescriptor> {
        entity
            .table
            .clone()
            .map(StorageDescriptor::Table)
            .ok_or_else(|| Error::UnknownModelKind(entity.class_name.clone()))
    }

    fn primary_key(&self, entity: &EntityClass) -> Result<String> {
        entity
            .table
            .as_ref()
            .and_then(|table| table.primary_key())
            .map(|column| column.name.clone())
            .ok_or_else(|| {
                Error::NotFound(format!("{} has no primary key column", entity.class_name))
            })
    }
}

/// 문서 백엔드
pub struct DocumentBackend;

impl ModelBackend for DocumentBackend {
    fn kind(&self) -> ModelKind {
        ModelKind::Document
    }

    fn rename(&self, entity: &mut EntityClass, appid: &str) -> Result<()> {
        let meta = entity
            .mongometa
            .as_mut()
            .ok_or_else(|| Error::UnknownModelKind(entity.class_name.clone()))?;
        meta.collection = format!("{}_{}", appid, meta.collection);
        Ok(())
    }

    fn descriptor(&self, entity: &EntityClass) -> Result<StorageDescriptor> {
        entity
            .mongometa
            .clone()
            .map(StorageDescriptor::Collection)
            .ok_or_else(|| Error::UnknownModelKind(entity.class_name.clone()))
    }

    fn primary_key(&self, _entity: &EntityClass) -> Result<String> {
        Ok(DOCUMENT_ID_FIELD.to_string())
    }
}

/// 종류별 백엔드
pub fn backend_for(kind: ModelKind) -> &'static dyn ModelBackend {
    match kind {
        ModelKind::Relational => &RelationalBackend,
        ModelKind::Document => &DocumentBackend,
    }
}

/// 엔티티 클래스의 기본 키 필드 이름
pub fn primary_key(entity: &EntityClass) -> Result<String> {
    backend_for(detect_model(entity)?).primary_key(entity)
}

/// 엔티티 인스턴스의 기본 키 값
pub fn instance_primary_key(entity: &EntityClass, instance: &Value) -> Result<Option<Value>> {
    backend_for(detect_model(entity)?).instance_primary_key(entity, instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{ColumnDef, DocumentMeta, TableDescriptor};
    use serde_json::json;

    fn order() -> EntityClass {
        EntityClass::relational(
            "Order",
            TableDescriptor::new("orders")
                .with_column(ColumnDef::new("order_id", "INTEGER").primary())
                .with_column(ColumnDef::new("total", "NUMERIC")),
        )
    }

    #[test]
    fn test_relational_rename_updates_both_names() {
        let mut entity = order();
        RelationalBackend.rename(&mut entity, "shop").unwrap();
        assert_eq!(entity.tablename.as_deref(), Some("shop_orders"));
        assert_eq!(entity.table.as_ref().unwrap().name, "shop_orders");
    }

    #[test]
    fn test_document_rename() {
        let mut entity = EntityClass::document("Page", DocumentMeta::new("pages"));
        DocumentBackend.rename(&mut entity, "cms").unwrap();
        assert_eq!(entity.storage_name(), Some("cms_pages"));
    }

    #[test]
    fn test_primary_keys() {
        assert_eq!(primary_key(&order()).unwrap(), "order_id");

        let instance = json!({"order_id": 7, "total": 10});
        assert_eq!(
            instance_primary_key(&order(), &instance).unwrap(),
            Some(json!(7))
        );

        let page = EntityClass::document("Page", DocumentMeta::new("pages"));
        assert_eq!(primary_key(&page).unwrap(), "_id");
        assert_eq!(
            instance_primary_key(&page, &json!({"_id": "abc"})).unwrap(),
            Some(json!("abc"))
        );

        assert!(primary_key(&EntityClass::plain("Util")).is_err());
    }
}
