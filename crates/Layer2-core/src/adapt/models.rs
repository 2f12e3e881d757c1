//! Models Adapter - 서브앱 엔티티를 호스트 스키마에 병합

use crate::diagnostics::Diagnostics;
use crate::model::{backend_for, detect_model, HostModel, Member, ModelModule, SessionHandle};
use graft_foundation::{ResolvedOptions, Result};
use tracing::{debug, info};

/// 모델 어댑터
pub struct ModelsAdapter<'a> {
    module_name: &'a str,
    options: &'a ResolvedOptions,
}

impl<'a> ModelsAdapter<'a> {
    pub fn new(module_name: &'a str, options: &'a ResolvedOptions) -> Self {
        Self {
            module_name,
            options,
        }
    }

    /// 영속 엔티티를 이름 변경 후 호스트 스키마에 병합
    ///
    /// 병합된 저장소 이름을 반환합니다. 영속 표식이 전혀 없는 클래스는 건드리지 않고,
    /// 표식은 있지만 종류를 판별할 수 없으면 `UnknownModelKind`로 실패합니다.
    pub fn adapt(&self, model: &mut ModelModule, host: &mut HostModel) -> Result<Vec<String>> {
        let mut merged = Vec::new();

        for (name, member) in model.members_mut() {
            let Member::Class(entity) = member else {
                continue;
            };
            if !entity.has_persistence_marker() {
                debug!("{}.{} is not a persistent entity", self.module_name, name);
                continue;
            }
            let kind = detect_model(entity)?;

            let backend = backend_for(kind);
            if self.options.rename_tables {
                backend.rename(entity, &self.options.appid)?;
            }

            let descriptor = backend.descriptor(entity)?;
            debug!(
                "Merging {} {} of {} into host schema",
                kind,
                descriptor.name(),
                self.module_name
            );
            merged.push(descriptor.name().to_string());
            host.metadata.insert(descriptor);

            if self.options.global_models {
                host.publish(entity.clone());
            }
        }

        info!(
            "Merged {} storage declarations from {}",
            merged.len(),
            self.module_name
        );
        Ok(merged)
    }

    /// 서브앱의 `init_model`을 호스트 세션으로 호출
    ///
    /// 호출했으면 `true`를 반환합니다.
    pub fn init_model(
        &self,
        model: &ModelModule,
        session: Option<&SessionHandle>,
        diagnostics: &mut Diagnostics,
    ) -> Result<bool> {
        let Some(init) = model.init_model() else {
            return Ok(false);
        };
        let Some(session) = session else {
            diagnostics.warn(
                Some(self.module_name),
                "Host has no data session, skipping model initialization",
            );
            return Ok(false);
        };

        init(session)?;
        debug!("Initialized {} model", self.module_name);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnDef, DocumentMeta, EntityClass, TableDescriptor};
    use graft_foundation::{Error, PlugOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn shop_model() -> ModelModule {
        ModelModule::new()
            .with_class(EntityClass::relational(
                "Order",
                TableDescriptor::new("orders").with_column(ColumnDef::new("id", "INTEGER").primary()),
            ))
            .with_class(EntityClass::document("Review", DocumentMeta::new("reviews")))
            .with_class(EntityClass::plain("Formatter"))
            .with_member("VERSION", Member::Value(serde_json::json!("1.0")))
    }

    #[test]
    fn test_rename_and_merge() {
        let options = PlugOptions::new().rename_tables(true).resolve("shop");
        let adapter = ModelsAdapter::new("shop", &options);
        let mut model = shop_model();
        let mut host = HostModel::new();

        let merged = adapter.adapt(&mut model, &mut host).unwrap();
        assert_eq!(merged, vec!["shop_orders", "shop_reviews"]);
        assert!(host.metadata.contains("shop_orders"));
        assert!(host.metadata.contains("shop_reviews"));
        assert!(!host.metadata.contains("orders"));
        assert_eq!(
            model.class("Order").unwrap().tablename.as_deref(),
            Some("shop_orders")
        );
        assert!(host.entity("Order").is_none());
    }

    #[test]
    fn test_global_models_without_rename() {
        let options = PlugOptions::new().global_models(true).resolve("shop");
        let adapter = ModelsAdapter::new("shop", &options);
        let mut model = shop_model();
        let mut host = HostModel::new();

        adapter.adapt(&mut model, &mut host).unwrap();
        assert!(host.metadata.contains("orders"));
        assert_eq!(host.entity("Order").unwrap().storage_name(), Some("orders"));
        assert!(host.entity("Formatter").is_none());
    }

    #[test]
    fn test_half_declared_entity_is_rejected() {
        let mut broken = EntityClass::plain("Broken");
        broken.tablename = Some("broken".into());
        let mut model = shop_model().with_class(broken);

        let options = PlugOptions::new().rename_tables(true).resolve("shop");
        let adapter = ModelsAdapter::new("shop", &options);
        let mut host = HostModel::new();

        let err = adapter.adapt(&mut model, &mut host).unwrap_err();
        assert!(matches!(err, Error::UnknownModelKind(ref m) if m.contains("Broken")));
        assert!(!host.metadata.contains("shop_broken"));
    }

    #[test]
    fn test_init_model_needs_session() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let model = shop_model().with_init_model(move |_session| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let options = PlugOptions::new().resolve("shop");
        let adapter = ModelsAdapter::new("shop", &options);
        let mut diagnostics = Diagnostics::new();

        assert!(!adapter.init_model(&model, None, &mut diagnostics).unwrap());
        assert_eq!(diagnostics.warnings().count(), 1);

        let session: SessionHandle = Arc::new(());
        assert!(adapter
            .init_model(&model, Some(&session), &mut diagnostics)
            .unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
