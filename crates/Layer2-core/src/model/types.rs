//! Model 타입 정의 - 엔티티 클래스와 저장소 서술자

use super::session::SessionHandle;
use graft_foundation::Result;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// ForeignKey - 외래 키 (지연 평가 지원)
// ============================================================================

/// 외래 키 대상 (`table.column`)
///
/// `Lazy`는 테이블 이름 변경 이후에 대상이 결정되어야 할 때 사용합니다.
#[derive(Clone)]
pub enum ForeignKey {
    Static(String),
    Lazy(Arc<dyn Fn() -> String + Send + Sync>),
}

impl ForeignKey {
    pub fn to(spec: impl Into<String>) -> Self {
        Self::Static(spec.into())
    }

    pub fn lazy(resolve: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self::Lazy(Arc::new(resolve))
    }

    /// 현재 시점의 대상 컬럼 스펙
    pub fn column_spec(&self) -> String {
        match self {
            Self::Static(spec) => spec.clone(),
            Self::Lazy(resolve) => resolve(),
        }
    }
}

impl fmt::Debug for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(spec) => write!(f, "ForeignKey({})", spec),
            Self::Lazy(_) => write!(f, "ForeignKey(<lazy>)"),
        }
    }
}

// ============================================================================
// ColumnDef / TableDescriptor - 관계형 스타일
// ============================================================================

/// 컬럼 정의
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
    pub primary_key: bool,
    pub foreign_key: Option<ForeignKey>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            primary_key: false,
            foreign_key: None,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn references(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }
}

/// 테이블 서술자
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// 첫 번째 기본 키 컬럼
    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }
}

// ============================================================================
// DocumentMeta - 문서 스타일
// ============================================================================

/// 문서 저장소 메타데이터 (컬렉션 이름과 필드)
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub collection: String,
    pub fields: Vec<String>,
}

impl DocumentMeta {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }
}

// ============================================================================
// EntityClass - 모델 네임스페이스의 클래스
// ============================================================================

/// 모델 네임스페이스에 선언된 클래스
///
/// 어떤 속성을 가졌는지에 따라 영속 엔티티 종류가 결정됩니다
/// (`detect_model` 참조). 아무 속성도 없으면 일반 클래스입니다.
#[derive(Debug, Clone)]
pub struct EntityClass {
    pub class_name: String,
    pub tablename: Option<String>,
    pub table: Option<TableDescriptor>,
    pub mongometa: Option<DocumentMeta>,
}

impl EntityClass {
    /// 관계형 엔티티
    pub fn relational(class_name: impl Into<String>, table: TableDescriptor) -> Self {
        Self {
            class_name: class_name.into(),
            tablename: Some(table.name.clone()),
            table: Some(table),
            mongometa: None,
        }
    }

    /// 문서 엔티티
    pub fn document(class_name: impl Into<String>, meta: DocumentMeta) -> Self {
        Self {
            class_name: class_name.into(),
            tablename: None,
            table: None,
            mongometa: Some(meta),
        }
    }

    /// 영속성 속성이 없는 클래스
    pub fn plain(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            tablename: None,
            table: None,
            mongometa: None,
        }
    }

    /// 테이블 이름, 테이블, 문서 메타데이터 중 하나라도 선언했는지 여부
    pub fn has_persistence_marker(&self) -> bool {
        self.tablename.is_some() || self.table.is_some() || self.mongometa.is_some()
    }

    /// 저장소 식별자 (테이블 또는 컬렉션 이름)
    pub fn storage_name(&self) -> Option<&str> {
        if let Some(meta) = &self.mongometa {
            return Some(&meta.collection);
        }
        self.tablename.as_deref()
    }
}

// ============================================================================
// ModelModule - 서브앱의 모델 네임스페이스
// ============================================================================

/// 모델 네임스페이스 멤버
#[derive(Debug, Clone)]
pub enum Member {
    Class(EntityClass),
    Function(String),
    Value(serde_json::Value),
}

/// `init_model(session)` 진입점
pub type InitModelFn = Arc<dyn Fn(&SessionHandle) -> Result<()> + Send + Sync>;

/// 서브앱의 모델 네임스페이스
#[derive(Clone, Default)]
pub struct ModelModule {
    members: Vec<(String, Member)>,
    init_model: Option<InitModelFn>,
}

impl ModelModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// 클래스 멤버 추가 (이름은 클래스 이름)
    pub fn with_class(mut self, class: EntityClass) -> Self {
        let name = class.class_name.clone();
        self.members.push((name, Member::Class(class)));
        self
    }

    pub fn with_member(mut self, name: impl Into<String>, member: Member) -> Self {
        self.members.push((name.into(), member));
        self
    }

    pub fn with_init_model(
        mut self,
        init: impl Fn(&SessionHandle) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.init_model = Some(Arc::new(init));
        self
    }

    pub fn members(&self) -> &[(String, Member)] {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut [(String, Member)] {
        &mut self.members
    }

    pub fn init_model(&self) -> Option<&InitModelFn> {
        self.init_model.as_ref()
    }

    /// 클래스 이름으로 엔티티 조회
    pub fn class(&self, name: &str) -> Option<&EntityClass> {
        self.members.iter().find_map(|(member_name, member)| match member {
            Member::Class(class) if member_name == name => Some(class),
            _ => None,
        })
    }
}

impl fmt::Debug for ModelModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelModule")
            .field("members", &self.members)
            .field("init_model", &self.init_model.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_lazy_foreign_key_resolves_late() {
        let renamed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&renamed);
        let fk = ForeignKey::lazy(move || {
            if flag.load(Ordering::SeqCst) {
                "shop_orders.id".to_string()
            } else {
                "orders.id".to_string()
            }
        });

        assert_eq!(fk.column_spec(), "orders.id");
        renamed.store(true, Ordering::SeqCst);
        assert_eq!(fk.column_spec(), "shop_orders.id");
    }

    #[test]
    fn test_storage_name() {
        let order = EntityClass::relational(
            "Order",
            TableDescriptor::new("orders").with_column(ColumnDef::new("id", "INTEGER").primary()),
        );
        assert_eq!(order.storage_name(), Some("orders"));
        assert_eq!(order.table.as_ref().unwrap().primary_key().unwrap().name, "id");

        let page = EntityClass::document("Page", DocumentMeta::new("pages"));
        assert_eq!(page.storage_name(), Some("pages"));

        assert_eq!(EntityClass::plain("Helper").storage_name(), None);
    }
}
