//! Schema Metadata - 호스트의 공유 스키마 레지스트리

use super::detect::ModelKind;
use super::types::{DocumentMeta, EntityClass, TableDescriptor};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// 저장소 서술자
#[derive(Debug, Clone)]
pub enum StorageDescriptor {
    Table(TableDescriptor),
    Collection(DocumentMeta),
}

impl StorageDescriptor {
    pub fn name(&self) -> &str {
        match self {
            Self::Table(table) => &table.name,
            Self::Collection(meta) => &meta.collection,
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Table(_) => ModelKind::Relational,
            Self::Collection(_) => ModelKind::Document,
        }
    }
}

/// 스키마 메타데이터 (저장소 이름 -> 서술자)
#[derive(Debug, Clone, Default)]
pub struct SchemaMetadata {
    entries: BTreeMap<String, StorageDescriptor>,
}

impl SchemaMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// 서술자 추가. 같은 이름이 있으면 교체 후 이전 값을 반환
    pub fn insert(&mut self, descriptor: StorageDescriptor) -> Option<StorageDescriptor> {
        let name = descriptor.name().to_string();
        let previous = self.entries.insert(name.clone(), descriptor);
        if previous.is_some() {
            warn!("Storage {} was already declared in the host schema, replacing it", name);
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&StorageDescriptor> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 호스트 모델 네임스페이스
#[derive(Debug, Clone, Default)]
pub struct HostModel {
    pub metadata: SchemaMetadata,
    entities: BTreeMap<String, EntityClass>,
}

impl HostModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 엔티티를 호스트 네임스페이스에 공개
    pub fn publish(&mut self, entity: EntityClass) -> Option<EntityClass> {
        self.entities.insert(entity.class_name.clone(), entity)
    }

    pub fn entity(&self, class_name: &str) -> Option<&EntityClass> {
        self.entities.get(class_name)
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(String::as_str).collect()
    }
}

/// 공유 호스트 모델
pub type SharedModel = Arc<RwLock<HostModel>>;
