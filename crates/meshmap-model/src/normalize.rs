//! Raw record normalization.
//!
//! Turns one raw node record (and the link table inside it) into canonical
//! types. Records without a hostname or a mappable location are dropped;
//! malformed optional values become unknown. Every problem is reported to the
//! caller's issue list.

use crate::geo::GeoPoint;
use crate::issue::Issue;
use crate::link::{LinkMetrics, LinkRecord, LinkType};
use crate::node::{ServicePayload, Telemetry};
use crate::value::{Coerced, FieldReader};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

/// Miles per kilometer.
pub const MILES_PER_KM: f64 = 0.621371;

/// Naive timestamp layouts the backend has written over time.
const NAIVE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// A polled node record in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub hostname: String,
    pub position: GeoPoint,
    pub telemetry: Telemetry,
    /// Link table entries in document order.
    pub links: Vec<LinkRecord>,
}

/// Normalize one raw node record listed under `band` at `index`.
///
/// Returns `None` when the record must be dropped; the reason is in `issues`.
pub fn normalize_node(
    raw: &Value,
    band: &str,
    index: usize,
    issues: &mut Vec<Issue>,
) -> Option<NodeRecord> {
    let placeholder = format!("#{}", index);
    let Some(fields) = raw.as_object() else {
        debug!(band, index, "dropping record that is not an object");
        issues.push(Issue::malformed(band, &placeholder, "record", raw));
        return None;
    };

    let mut reader = FieldReader::new(fields, band, placeholder.clone(), issues);

    let hostname = match reader.text("node") {
        Some(name) if !name.is_empty() => name,
        _ => {
            debug!(band, index, "dropping record without hostname");
            reader.report(Issue::missing(band, &placeholder, "node"));
            return None;
        }
    };
    reader.set_record(hostname.clone());

    let lat = reader.number("lat");
    let lon = reader.number("lon");
    let position = match (lat, lon) {
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
        _ => None,
    };
    let Some(position) = position else {
        let field = if lat.and_then(|lat| GeoPoint::new(lat, 1.0)).is_none() {
            "lat"
        } else {
            "lon"
        };
        debug!(band, node = %hostname, "dropping record without location");
        reader.report(Issue::missing(band, &hostname, field));
        return None;
    };

    let telemetry = read_telemetry(&mut reader);
    let links = match reader.raw("link_info") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(table)) => {
            let mut links = Vec::with_capacity(table.len());
            for (ip, entry) in table {
                if let Some(link) = normalize_link(ip, entry, &mut reader) {
                    links.push(link);
                }
            }
            links
        }
        // An empty array is how some backends serialize an empty table.
        Some(Value::Array(items)) if items.is_empty() => Vec::new(),
        Some(other) => {
            reader.report(Issue::malformed(band, &hostname, "link_info", other));
            Vec::new()
        }
    };

    Some(NodeRecord {
        hostname,
        position,
        telemetry,
        links,
    })
}

fn read_telemetry(reader: &mut FieldReader<'_>) -> Telemetry {
    let loadavg = read_loadavg(reader);
    let last_seen = read_last_seen(reader);
    let description = reader.text("description").map(|d| strip_line_breaks(&d));

    Telemetry {
        ssid: reader.text("ssid"),
        channel: reader.text("channel"),
        freq: reader.text("freq"),
        chanbw: reader.text("chanbw"),
        model: reader.text("model"),
        firmware_version: reader.text("firmware_version"),
        board_id: reader.text("board_id"),
        ant_desc: reader.text("antDesc"),
        ant_gain: reader.number("antGain"),
        ant_beam: reader.number("antBeam"),
        uptime: reader.text("uptime"),
        loadavg,
        hops_away: reader.count("hopsAway"),
        wlan_ip: reader.text("wlan_ip"),
        description,
        mesh_gateway: reader.flag("mesh_gateway").unwrap_or(false),
        mesh_supernode: reader.flag("mesh_supernode").unwrap_or(false),
        mesh_rf: reader.flag("meshRF").unwrap_or(true),
        last_seen,
        protocol: Default::default(),
        services: ServicePayload::from_value(reader.raw("services")),
    }
}

fn read_loadavg(reader: &mut FieldReader<'_>) -> [Option<f64>; 3] {
    match reader.raw("loadavg") {
        None | Some(Value::Null) => [None; 3],
        Some(Value::Array(items)) if items.len() == 3 => {
            let mut loads = [None; 3];
            for (slot, item) in loads.iter_mut().zip(items) {
                *slot = crate::value::coerce_number(Some(item)).ok();
            }
            loads
        }
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("not available") => [None; 3],
        Some(other) => {
            let issue = Issue::malformed(reader.band(), reader.record(), "loadavg", other);
            reader.report(issue);
            [None; 3]
        }
    }
}

fn read_last_seen(reader: &mut FieldReader<'_>) -> Option<DateTime<Utc>> {
    let raw = reader.raw("last_seen")?;
    match crate::value::coerce_text(Some(raw)) {
        Coerced::Absent => None,
        Coerced::Value(text) => match parse_timestamp(&text) {
            Some(ts) => Some(ts),
            None => {
                let issue = Issue::malformed(reader.band(), reader.record(), "last_seen", raw);
                reader.report(issue);
                None
            }
        },
        Coerced::Malformed => {
            let issue = Issue::malformed(reader.band(), reader.record(), "last_seen", raw);
            reader.report(issue);
            None
        }
    }
}

/// Parse the timestamp layouts the backend emits. Naive times are UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Replace HTML `<br>`, `<br/>` and `<br />` tags with spaces.
pub fn strip_line_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let tag_len = tail.find('>').map(|end| end + 1);
        let is_break = tag_len.is_some_and(|len| {
            let inner: String = tail[1..len - 1]
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '/')
                .collect();
            inner.eq_ignore_ascii_case("br")
        });
        match tag_len {
            Some(len) if is_break => {
                out.push(' ');
                rest = &tail[len..];
            }
            _ => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Normalize one link table entry keyed by neighbor IP.
fn normalize_link(ip: &str, entry: &Value, reader: &mut FieldReader<'_>) -> Option<LinkRecord> {
    let Some(fields) = entry.as_object() else {
        let issue = Issue::malformed(
            reader.band(),
            reader.record(),
            &format!("link_info.{}", ip),
            entry,
        );
        reader.report(issue);
        return None;
    };

    let band = reader.band().to_string();
    let record = reader.record().to_string();
    let mut issues = Vec::new();
    let mut link_reader =
        FieldReader::new(fields, &band, record, &mut issues).with_prefix(format!("link_info.{}", ip));

    let hostname = link_reader.text("hostname").filter(|h| !h.is_empty());
    let link_type = link_reader
        .text("linkType")
        .map(|t| LinkType::parse(&t))
        .unwrap_or_else(|| LinkType::Other("UNKNOWN".to_string()));

    let mut distance_km = link_reader.number("distanceKM");
    let mut distance_miles = link_reader.number("distanceMiles");
    match (distance_km, distance_miles) {
        (Some(km), None) => distance_miles = Some(km * MILES_PER_KM),
        (None, Some(mi)) => distance_km = Some(mi / MILES_PER_KM),
        _ => {}
    }

    let metrics = LinkMetrics {
        tx_rate: link_reader.number("txRate"),
        throughput: link_reader.number_any(&["Tput", "throughput"]),
        snr: link_reader.number_any(&["SnR", "snr"]),
        cost: link_reader.number("cost"),
        quality: link_reader.number_any(&["qual", "quality"]),
        distance_km,
        distance_miles,
        bearing: link_reader.number("bearing"),
    };

    let lat = link_reader.number_any(&["linkLat", "lat"]);
    let lon = link_reader.number_any(&["linkLon", "lon"]);
    let position = match (lat, lon) {
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
        _ => None,
    };

    for issue in issues {
        reader.report(issue);
    }

    Some(LinkRecord {
        neighbor_ip: ip.to_string(),
        hostname,
        link_type,
        metrics,
        position,
    })
}
