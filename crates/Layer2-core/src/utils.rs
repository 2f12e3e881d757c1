//! Utils - 플러깅된 서브앱 URL / 리다이렉트 / 조회

use crate::application::Response;
use crate::plugin::PluggedRegistry;
use graft_foundation::{Error, Result};
use http::StatusCode;

/// 서브앱의 URL 마운트 경로 (`billing.shop` -> `/billing/shop`)
pub fn mount_point(registry: &PluggedRegistry, module_name: &str) -> Result<String> {
    let appid = registry
        .mount_point(module_name)
        .ok_or_else(|| Error::NotFound(format!("pluggable {} is not plugged", module_name)))?;
    Ok(format!("/{}", appid.replace('.', "/")))
}

/// 서브앱 기준 URL
pub fn plug_url(
    registry: &PluggedRegistry,
    module_name: &str,
    path: &str,
    params: &[(&str, &str)],
) -> Result<String> {
    let mut url = mount_point(registry, module_name)?;
    let path = path.trim_start_matches('/');
    if !path.is_empty() {
        url.push('/');
        url.push_str(path);
    }

    if !params.is_empty() {
        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query.join("&"));
    }
    Ok(url)
}

/// 서브앱 기준 URL로의 302 응답
pub fn plug_redirect(
    registry: &PluggedRegistry,
    module_name: &str,
    path: &str,
    params: &[(&str, &str)],
) -> Result<Response> {
    let location = plug_url(registry, module_name, path, params)?;
    http::Response::builder()
        .status(StatusCode::FOUND)
        .header(http::header::LOCATION, location)
        .body(Vec::new())
        .map_err(|e| Error::Http(e.to_string()))
}

/// 배선된 서브앱 이름 (플러깅 순서)
pub fn plugged(registry: &PluggedRegistry) -> Vec<String> {
    registry.plugged()
}
