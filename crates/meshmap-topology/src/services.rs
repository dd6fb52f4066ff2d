//! Service link formatting.
//!
//! Nodes publish their services in whatever shape their firmware produced:
//! an array of objects, a map of objects or bare links, or the
//! `"Not Available"` sentinel. This module turns any of them into an ordered
//! list of `(name, link)` pairs whose hosts resolve on the mesh.

use meshmap_model::ServicePayload;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use url::{Host, Url};

/// Text shown when a node publishes nothing usable.
pub const NO_SERVICES_LABEL: &str = "No Published Services";

const NAME_KEYS: &[&str] = &["name", "title", "service"];
const LINK_KEYS: &[&str] = &["link", "url"];

/// One published service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceLink {
    pub name: String,
    pub link: String,
}

/// Formatted services for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "services", rename_all = "camelCase")]
pub enum ServiceLinks {
    NoServices,
    Listed(Vec<ServiceLink>),
}

impl ServiceLinks {
    pub fn links(&self) -> &[ServiceLink] {
        match self {
            ServiceLinks::NoServices => &[],
            ServiceLinks::Listed(links) => links,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.links().is_empty()
    }
}

impl std::fmt::Display for ServiceLinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceLinks::NoServices => f.write_str(NO_SERVICES_LABEL),
            ServiceLinks::Listed(links) => {
                for (i, service) in links.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}: {}", service.name, service.link)?;
                }
                Ok(())
            }
        }
    }
}

/// Format a node's service payload.
///
/// `domain` is the mesh DNS suffix (`.local.mesh`). Entries missing a name or
/// a usable link are skipped one at a time; if nothing survives the result is
/// [`ServiceLinks::NoServices`].
pub fn format_services(payload: &ServicePayload, domain: &str) -> ServiceLinks {
    let links: Vec<ServiceLink> = match payload {
        ServicePayload::Absent | ServicePayload::NotAvailable | ServicePayload::Unusable(_) => {
            Vec::new()
        }
        ServicePayload::List(items) => items
            .iter()
            .filter_map(|item| item.as_object().and_then(|entry| from_entry(entry, None, domain)))
            .collect(),
        ServicePayload::Map(entries) => entries
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Object(entry) => from_entry(entry, Some(key.as_str()), domain),
                Value::String(link) => from_parts(key, link, domain),
                _ => None,
            })
            .collect(),
    };

    if links.is_empty() {
        ServiceLinks::NoServices
    } else {
        ServiceLinks::Listed(links)
    }
}

fn from_entry(entry: &Map<String, Value>, key: Option<&str>, domain: &str) -> Option<ServiceLink> {
    let name = first_text(entry, NAME_KEYS).or(key)?;
    let link = first_text(entry, LINK_KEYS)?;
    from_parts(name, link, domain)
}

fn from_parts(name: &str, link: &str, domain: &str) -> Option<ServiceLink> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let Some(link) = rewrite_link(link, domain) else {
        debug!(service = name, link, "skipping service with unusable link");
        return None;
    };
    Some(ServiceLink {
        name: name.to_string(),
        link,
    })
}

fn first_text<'a>(entry: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| entry.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Rewrite a link so its host resolves on the mesh.
///
/// A hostname that does not already end in `domain` is lowercased and gets
/// the suffix appended. Only the host changes: scheme, userinfo, port, path,
/// query and fragment are copied from the input untouched. IP hosts are left
/// alone, links without a scheme are treated as `http://`, and links with no
/// parseable host return `None`.
pub fn rewrite_link(link: &str, domain: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    let link = if link.contains("://") {
        link.to_string()
    } else {
        format!("http://{}", link)
    };

    let parsed = Url::parse(&link).ok()?;
    match parsed.host()? {
        Host::Ipv4(_) | Host::Ipv6(_) => return Some(link),
        Host::Domain(_) => {}
    }

    let (start, end) = host_span(&link)?;
    let host = &link[start..end];
    let host_lower = host.to_lowercase();
    let suffix = domain.trim().trim_start_matches('.').to_lowercase();
    if suffix.is_empty() || host_lower == suffix || host_lower.ends_with(&format!(".{}", suffix)) {
        return Some(link);
    }

    let mut rewritten = String::with_capacity(link.len() + suffix.len() + 1);
    rewritten.push_str(&link[..start]);
    rewritten.push_str(host_lower.trim_end_matches('.'));
    rewritten.push('.');
    rewritten.push_str(&suffix);
    rewritten.push_str(&link[end..]);
    Some(rewritten)
}

/// Byte range of the host inside `scheme://[userinfo@]host[:port]...`.
fn host_span(link: &str) -> Option<(usize, usize)> {
    let authority_start = link.find("://")? + 3;
    let rest = &link[authority_start..];
    let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_len];
    let host_offset = authority.rfind('@').map(|at| at + 1).unwrap_or(0);
    let host_and_port = &authority[host_offset..];
    let host_len = host_and_port.find(':').unwrap_or(host_and_port.len());
    if host_len == 0 {
        return None;
    }
    let start = authority_start + host_offset;
    Some((start, start + host_len))
}
