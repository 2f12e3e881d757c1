//! Session / Model Proxy
//!
//! 서브앱이 import 시점에 호스트 세션과 모델을 참조할 수 있도록
//! 실제 대상이 나중에 설정되는 프록시를 제공합니다.

use super::metadata::SharedModel;
use graft_foundation::{Error, Result};
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

/// 호스트 데이터 세션 (백엔드에 따라 구체 타입이 다름)
pub type SessionHandle = Arc<dyn Any + Send + Sync>;

/// 나중에 연결되는 세션 프록시
#[derive(Clone, Default)]
pub struct SessionProxy {
    target: Arc<RwLock<Option<SessionHandle>>>,
}

impl SessionProxy {
    pub fn new() -> Self {
        Self::default()
    }

    /// 실제 세션 연결
    pub fn configure(&self, session: SessionHandle) {
        *self.target.write() = Some(session);
    }

    pub fn is_configured(&self) -> bool {
        self.target.read().is_some()
    }

    /// 연결된 세션
    pub fn get(&self) -> Result<SessionHandle> {
        self.target
            .read()
            .clone()
            .ok_or_else(|| Error::Config("Session proxy used before configuration".into()))
    }

    /// 구체 타입으로 다운캐스트
    pub fn downcast<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.get()?
            .downcast::<T>()
            .map_err(|_| Error::Config("Session has an unexpected type".into()))
    }
}

/// 호스트 모델 네임스페이스 프록시
#[derive(Clone, Default)]
pub struct AppModelProxy {
    target: Arc<RwLock<Option<SharedModel>>>,
}

impl AppModelProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&self, model: SharedModel) {
        *self.target.write() = Some(model);
    }

    pub fn is_configured(&self) -> bool {
        self.target.read().is_some()
    }

    pub fn get(&self) -> Result<SharedModel> {
        self.target
            .read()
            .clone()
            .ok_or_else(|| Error::Config("App model proxy used before configuration".into()))
    }
}
