//! Configuration Loader
//!
//! ## 검색 우선순위
//!
//! 1. User-level: `~/.config/graft/graft.toml`
//! 2. Project-level: `graft.toml`
//! 3. Local (gitignored): `graft.local.toml`
//!
//! 각 레벨의 설정이 이전 레벨을 오버라이드합니다.
//! `.json` 확장자는 JSON으로, 그 외는 TOML로 읽습니다.

use super::host::HostConfig;
use crate::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 설정 파일 이름
pub const CONFIG_FILE_NAME: &str = "graft.toml";

/// 로컬 설정 파일 이름
pub const LOCAL_CONFIG_FILE_NAME: &str = "graft.local.toml";

// ============================================================================
// ConfigLoader - 설정 로더
// ============================================================================

/// 설정 로더
pub struct ConfigLoader {
    /// 검색 경로
    search_paths: Vec<ConfigPath>,
}

/// 설정 파일 경로 정보
#[derive(Debug, Clone)]
struct ConfigPath {
    path: PathBuf,
    /// 우선순위 (높을수록 우선)
    priority: u8,
    description: &'static str,
}

impl ConfigLoader {
    /// 새 로더 생성 (기본 검색 경로)
    pub fn new(working_dir: &Path) -> Self {
        let mut paths = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(ConfigPath {
                path: config_dir.join("graft").join(CONFIG_FILE_NAME),
                priority: 10,
                description: "User settings",
            });
        }

        paths.push(ConfigPath {
            path: working_dir.join(CONFIG_FILE_NAME),
            priority: 20,
            description: "Project settings",
        });

        paths.push(ConfigPath {
            path: working_dir.join(LOCAL_CONFIG_FILE_NAME),
            priority: 30,
            description: "Local settings",
        });

        paths.sort_by_key(|p| p.priority);

        Self { search_paths: paths }
    }

    /// 커스텀 검색 경로로 생성 (뒤쪽이 우선)
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        let search_paths = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| ConfigPath {
                path,
                priority: i as u8,
                description: "Custom",
            })
            .collect();

        Self { search_paths }
    }

    /// 모든 경로에서 설정 로드하여 병합
    pub fn load_all(&self) -> Result<HostConfig> {
        let mut merged = Value::Object(Default::default());

        for config_path in &self.search_paths {
            if !config_path.path.exists() {
                continue;
            }
            match read_config_value(&config_path.path) {
                Ok(value) => {
                    info!(
                        "Loaded {} from: {}",
                        config_path.description,
                        config_path.path.display()
                    );
                    merge_values(&mut merged, value);
                }
                Err(e) => {
                    warn!(
                        "Failed to load settings from {}: {}",
                        config_path.path.display(),
                        e
                    );
                }
            }
        }

        serde_json::from_value(merged)
            .map_err(|e| Error::Config(format!("Invalid merged configuration: {}", e)))
    }
}

/// 단일 설정 파일 로드
pub fn load_config_from_file(path: &Path) -> Result<HostConfig> {
    let value = read_config_value(path)?;
    let config: HostConfig = serde_json::from_value(value).map_err(|e| {
        Error::Config(format!("Invalid configuration at {}: {}", path.display(), e))
    })?;

    debug!(
        "Loaded config from {}: {} declared pluggables",
        path.display(),
        config.plug.len()
    );

    Ok(config)
}

fn read_config_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(toml::from_str(&content)?)
    }
}

/// 객체는 재귀적으로 병합, 그 외 값은 `later`가 대체
fn merge_values(base: &mut Value, later: Value) {
    match (base, later) {
        (Value::Object(base_map), Value::Object(later_map)) => {
            for (key, value) in later_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
