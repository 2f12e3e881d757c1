//! i18n - 서브앱 번역
//!
//! 서브앱 번역은 호스트 카탈로그를 먼저 조회하고, 없으면 서브앱 카탈로그,
//! 그래도 없으면 원문을 반환합니다.
//!
//! 카탈로그 파일은 `<i18n_dir>/<lang>.json` 또는 `<i18n_dir>/<lang>/*.json`이며
//! 형식은 `{"msgid": "번역"}` 또는 복수형 `{"msgid": ["단수", "복수"]}`입니다.

use graft_foundation::{Error, Result};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// 번역 항목
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Translation {
    Single(String),
    Plural(Vec<String>),
}

// ============================================================================
// Catalog
// ============================================================================

/// 메시지 카탈로그
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<String, Translation>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(Self {
            messages: serde_json::from_str(content)?,
        })
    }

    pub fn with_message(mut self, msgid: impl Into<String>, translation: Translation) -> Self {
        self.messages.insert(msgid.into(), translation);
        self
    }

    /// 디렉토리에서 언어 카탈로그 로드. 파일이 하나도 없으면 `None`
    pub fn load(dir: &Path, lang: &str) -> Result<Option<Self>> {
        let base = dir
            .to_str()
            .map(glob::Pattern::escape)
            .ok_or_else(|| Error::InvalidInput(format!("non UTF-8 path {}", dir.display())))?;

        let mut catalog = Catalog::new();
        let mut found = false;

        for pattern in [
            format!("{}/{}.json", base, lang),
            format!("{}/{}/*.json", base, lang),
        ] {
            let paths = glob::glob(&pattern)
                .map_err(|e| Error::InvalidInput(format!("bad catalog pattern {}: {}", pattern, e)))?;
            for entry in paths {
                let path = entry.map_err(|e| Error::Io(e.into()))?;
                let content = std::fs::read_to_string(&path)?;
                catalog.merge(Self::from_json_str(&content)?);
                debug!("Loaded catalog {}", path.display());
                found = true;
            }
        }

        Ok(found.then_some(catalog))
    }

    /// 다른 카탈로그 병합 (`other`가 우선)
    pub fn merge(&mut self, other: Catalog) {
        self.messages.extend(other.messages);
    }

    pub fn gettext(&self, msgid: &str) -> Option<&str> {
        match self.messages.get(msgid)? {
            Translation::Single(text) => Some(text),
            Translation::Plural(forms) => forms.first().map(String::as_str),
        }
    }

    pub fn ngettext(&self, singular: &str, n: u64) -> Option<&str> {
        match self.messages.get(singular)? {
            Translation::Single(text) => Some(text),
            Translation::Plural(forms) => {
                let index = if n == 1 { 0 } else { 1 };
                forms
                    .get(index)
                    .or_else(|| forms.last())
                    .map(String::as_str)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ============================================================================
// PluggableTranslator
// ============================================================================

type CatalogKey = (String, String);

/// 호스트 -> 서브앱 -> 원문 순서로 조회하는 번역기
#[derive(Debug, Default)]
pub struct PluggableTranslator {
    /// 기본 언어 우선순위
    langs: Vec<String>,
    host: RwLock<HashMap<String, Catalog>>,
    module_dirs: RwLock<HashMap<String, PathBuf>>,
    /// (모듈, 언어) -> 로드된 카탈로그 (없으면 None)
    module_catalogs: RwLock<HashMap<CatalogKey, Option<Arc<Catalog>>>>,
}

impl PluggableTranslator {
    pub fn new(langs: Vec<String>) -> Self {
        Self {
            langs,
            ..Default::default()
        }
    }

    pub fn langs(&self) -> &[String] {
        &self.langs
    }

    /// 호스트 카탈로그 추가 (같은 언어면 병합)
    pub fn add_host_catalog(&self, lang: impl Into<String>, catalog: Catalog) {
        self.host
            .write()
            .entry(lang.into())
            .or_default()
            .merge(catalog);
    }

    /// 서브앱 카탈로그 디렉토리 등록
    pub fn register_module(&self, module_name: impl Into<String>, dir: PathBuf) {
        let module_name = module_name.into();
        debug!("Registered {} translations at {}", module_name, dir.display());
        self.module_catalogs
            .write()
            .retain(|(module, _), _| module != &module_name);
        self.module_dirs.write().insert(module_name, dir);
    }

    fn module_catalog(&self, module_name: &str, lang: &str) -> Option<Arc<Catalog>> {
        let key = (module_name.to_string(), lang.to_string());
        let cached = self.module_catalogs.read().get(&key).cloned();
        if let Some(cached) = cached {
            return cached;
        }

        let dir = self.module_dirs.read().get(module_name).cloned();
        let loaded = dir.and_then(|dir| match Catalog::load(&dir, lang) {
            Ok(catalog) => catalog.map(Arc::new),
            Err(e) => {
                warn!("Cannot load {} translations for {}: {}", module_name, lang, e);
                None
            }
        });
        self.module_catalogs.write().insert(key, loaded.clone());
        loaded
    }

    fn lookup<F>(&self, module_name: &str, langs: &[&str], find: F) -> Option<String>
    where
        F: Fn(&Catalog) -> Option<&str>,
    {
        {
            let host = self.host.read();
            for lang in langs {
                if let Some(text) = host.get(*lang).and_then(&find) {
                    return Some(text.to_string());
                }
            }
        }
        for lang in langs {
            if let Some(catalog) = self.module_catalog(module_name, lang) {
                if let Some(text) = find(catalog.as_ref()) {
                    return Some(text.to_string());
                }
            }
        }
        None
    }

    fn default_langs(&self) -> Vec<&str> {
        self.langs.iter().map(String::as_str).collect()
    }

    /// 지정 언어로 번역
    pub fn ugettext_in(&self, module_name: &str, langs: &[&str], msgid: &str) -> String {
        self.lookup(module_name, langs, |c| c.gettext(msgid))
            .unwrap_or_else(|| msgid.to_string())
    }

    /// 기본 언어로 번역
    pub fn ugettext(&self, module_name: &str, msgid: &str) -> String {
        self.ugettext_in(module_name, &self.default_langs(), msgid)
    }

    /// 지정 언어로 복수형 번역
    pub fn ungettext_in(
        &self,
        module_name: &str,
        langs: &[&str],
        singular: &str,
        plural: &str,
        n: u64,
    ) -> String {
        self.lookup(module_name, langs, |c| c.ngettext(singular, n))
            .unwrap_or_else(|| (if n == 1 { singular } else { plural }).to_string())
    }

    /// 기본 언어로 복수형 번역
    pub fn ungettext(&self, module_name: &str, singular: &str, plural: &str, n: u64) -> String {
        self.ungettext_in(module_name, &self.default_langs(), singular, plural, n)
    }
}
