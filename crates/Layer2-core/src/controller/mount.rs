//! Mount - 마운트 id 해석과 서브앱 루트 컨트롤러 부착
//!
//! 마운트 id는 점으로 구분된 경로입니다. 마지막 세그먼트가 속성 이름이 되고
//! 나머지는 호스트 루트에서부터 걸어 내려갈 경로입니다.

use super::tree::Controller;
use graft_foundation::{Error, Result};
use tracing::{debug, info};

/// `a.b.c` -> (`Some("a.b")`, `"c"`), `c` -> (`None`, `"c"`)
pub fn split_mount_id(appid: &str) -> (Option<&str>, &str) {
    match appid.rsplit_once('.') {
        Some((route, name)) => (Some(route), name),
        None => (None, appid),
    }
}

/// 마운트 id의 부모 컨트롤러와 속성 이름 해석
pub fn resolve_mountpoint<'a>(
    root: &'a mut Controller,
    appid: &str,
) -> Result<(&'a mut Controller, String)> {
    let (route, name) = split_mount_id(appid);
    let mut parent = root;

    if let Some(route) = route {
        for segment in route.split('.') {
            parent = parent.child_mut(segment).ok_or_else(|| {
                Error::MountPoint(format!(
                    "{} (no controller named {} on the route)",
                    appid, segment
                ))
            })?;
        }
    }

    Ok((parent, name.to_string()))
}

/// 적용 대기 중인 마운트
///
/// 설정 단계에서 계획되고, 라이브 루트 컨트롤러가 준비된 뒤에 적용됩니다.
#[derive(Debug, Clone)]
pub struct PendingMount {
    pub module_name: String,
    pub appid: String,
    pub controller: Controller,
    pub blocked: Vec<String>,
}

impl PendingMount {
    pub fn new(module_name: impl Into<String>, appid: impl Into<String>, controller: Controller) -> Self {
        Self {
            module_name: module_name.into(),
            appid: appid.into(),
            controller,
            blocked: Vec::new(),
        }
    }

    /// 빌더 패턴: 차단할 루트 메서드
    pub fn with_blocked(mut self, methods: Vec<String>) -> Self {
        self.blocked = methods;
        self
    }

    /// 루트 컨트롤러에 부착
    pub fn commit(self, root: &mut Controller) -> Result<()> {
        let (parent, name) = resolve_mountpoint(root, &self.appid)?;

        let mut controller = self.controller;
        for method in &self.blocked {
            match controller.method_mut(method) {
                Some(exposed) => {
                    exposed.block();
                    debug!("Blocked {}.{}", self.module_name, method);
                }
                None => debug!(
                    "{} has no method {} to block",
                    self.module_name, method
                ),
            }
        }

        if parent.set_child(name.clone(), controller).is_some() {
            debug!("Replaced existing controller at {}", self.appid);
        }

        info!(
            "Mounted {} controller under {} as {}",
            self.module_name,
            parent.name(),
            name
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Output;

    fn host_root() -> Controller {
        Controller::new("RootController").with_child(
            "billing",
            Controller::new("BillingController")
                .with_child("invoices", Controller::new("InvoicesController")),
        )
    }

    #[test]
    fn test_resolve_nested() {
        let mut root = host_root();
        let (parent, name) = resolve_mountpoint(&mut root, "billing.invoices.detail").unwrap();
        assert_eq!(parent.name(), "InvoicesController");
        assert_eq!(name, "detail");
    }

    #[test]
    fn test_resolve_top_level() {
        let mut root = host_root();
        let (parent, name) = resolve_mountpoint(&mut root, "detail").unwrap();
        assert_eq!(parent.name(), "RootController");
        assert_eq!(name, "detail");
    }

    #[test]
    fn test_missing_segment() {
        let mut root = host_root();
        let err = resolve_mountpoint(&mut root, "billing.payments.detail").unwrap_err();
        assert!(matches!(err, Error::MountPoint(_)));
        assert!(err.to_string().contains("payments"));
    }

    #[test]
    fn test_commit_blocks_methods() {
        let mut root = host_root();
        let sub = Controller::new("ShopRoot")
            .expose("index", |_| Ok(Output::Rendered("shop".into())))
            .expose("admin", |_| Ok(Output::Rendered("admin".into())));

        PendingMount::new("shop", "billing.shop", sub)
            .with_blocked(vec!["admin".into()])
            .commit(&mut root)
            .unwrap();

        let mounted = root.find("billing/shop").unwrap();
        assert!(!mounted.method("index").unwrap().is_blocked());
        assert!(mounted.method("admin").unwrap().is_blocked());
    }
}
