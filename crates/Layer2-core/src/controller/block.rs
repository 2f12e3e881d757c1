//! Blocked Controllers - 호스트가 지정한 컨트롤러 메서드 차단

use super::tree::Controller;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// 컨트롤러 트리의 (경로 -> 노출 메서드 목록)
pub fn map_controllers(root: &Controller) -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    collect(root, String::new(), &mut map);
    map
}

fn collect(node: &Controller, path: String, map: &mut BTreeMap<String, Vec<String>>) {
    let key = if path.is_empty() { "/".to_string() } else { path.clone() };
    map.insert(key, node.method_names().map(str::to_string).collect());
    for (attr, child) in node.children() {
        collect(child, format!("{}/{}", path, attr), map);
    }
}

/// 차단 목록 (컨트롤러 경로, 메서드)
#[derive(Debug, Clone, Default)]
pub struct BlockedControllers {
    entries: Vec<(String, String)>,
}

impl BlockedControllers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, controller_path: impl Into<String>, method: impl Into<String>) {
        self.entries.push((controller_path.into(), method.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 트리에 적용. 차단된 메서드 수를 반환
    pub fn apply(&self, root: &mut Controller) -> usize {
        let mut blocked = 0;
        for (path, method) in &self.entries {
            match root.find_mut(path).and_then(|c| c.method_mut(method)) {
                Some(exposed) => {
                    exposed.block();
                    blocked += 1;
                    debug!("Blocked controller method {}:{}", path, method);
                }
                None => warn!("Cannot block {}:{}, no such exposed method", path, method),
            }
        }
        blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Output;

    #[test]
    fn test_map_and_block() {
        let mut root = Controller::new("Root")
            .expose("index", |_| Ok(Output::Rendered("i".into())))
            .with_child(
                "admin",
                Controller::new("Admin").expose("purge", |_| Ok(Output::Rendered("p".into()))),
            );

        let map = map_controllers(&root);
        assert_eq!(map.get("/").unwrap(), &vec!["index".to_string()]);
        assert_eq!(map.get("/admin").unwrap(), &vec!["purge".to_string()]);

        let mut blocked = BlockedControllers::new();
        blocked.add("/admin", "purge");
        blocked.add("/admin", "missing");
        assert_eq!(blocked.apply(&mut root), 1);
        assert!(root.find("admin").unwrap().method("purge").unwrap().is_blocked());
    }
}
