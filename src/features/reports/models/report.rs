use serde::Deserialize;
use serde_json::Value;

use super::{LocationRef, LocationType, ReportStatus};

/// Report record as written by the mobile clients.
///
/// Every field is optional on the wire; several client revisions are live
/// at once and older records omit fields freely.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    #[serde(default)]
    reporter: Option<String>,
    #[serde(default)]
    emergency: Option<String>,
    #[serde(default)]
    other_emergency: Option<String>,
    #[serde(default)]
    additional_message: Option<String>,
    #[serde(default)]
    location_type: Option<Value>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    timestamp: Option<i64>,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    reject_reason: Option<String>,
}

/// One report, normalized at ingestion: the location is parsed into a
/// [`LocationRef`] and the status string into a [`ReportStatus`] exactly
/// once, not per render.
#[derive(Debug, Clone)]
pub struct Report {
    pub reporter: Option<String>,
    pub emergency: Option<String>,
    pub other_emergency: Option<String>,
    pub additional_message: Option<String>,
    pub location_type: Option<LocationType>,
    pub location: Option<LocationRef>,
    pub image_url: Option<String>,
    pub timestamp: Option<i64>,
    pub status: ReportStatus,
    pub reject_reason: Option<String>,
}

impl Report {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let raw = RawReport::deserialize(value)?;

        let location_type = raw
            .location_type
            .as_ref()
            .and_then(Value::as_str)
            .and_then(LocationType::parse);
        let location = LocationRef::resolve(location_type, raw.location.as_deref());

        let status = match raw.status.as_ref().and_then(Value::as_str) {
            Some(s) => ReportStatus::parse(s).unwrap_or_else(|| {
                tracing::warn!("Unknown report status {:?}, treating as pending", s);
                ReportStatus::Pending
            }),
            // Records written before the status field existed read as pending.
            None => ReportStatus::Pending,
        };

        Ok(Self {
            reporter: raw.reporter,
            emergency: raw.emergency,
            other_emergency: raw.other_emergency,
            additional_message: raw.additional_message,
            location_type,
            location,
            image_url: raw.image_url,
            timestamp: raw.timestamp,
            status,
            reject_reason: raw.reject_reason,
        })
    }

    /// Emergency label shown everywhere: the category, or the free-text
    /// value when the category is "Others".
    pub fn emergency_label(&self) -> Option<&str> {
        match self.emergency.as_deref() {
            Some("Others") => self.other_emergency.as_deref(),
            other => other,
        }
    }
}

/// Epoch milliseconds from whatever the client wrote: integers, floats,
/// or numeric strings. Anything else reads as absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_timestamp))
}

fn coerce_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

/// All reports from the latest snapshot, in snapshot key order. The
/// store's push ids sort chronologically, so this is also creation order.
#[derive(Debug, Clone, Default)]
pub struct ReportTable {
    entries: Vec<(String, Report)>,
}

impl ReportTable {
    /// Parse a full-collection snapshot. Malformed entries are skipped
    /// with a warning so one bad record cannot blank the whole dashboard.
    pub fn from_snapshot(snapshot: &Value) -> Self {
        let mut entries = Vec::new();
        if let Some(map) = snapshot.as_object() {
            for (id, value) in map {
                match Report::from_value(value) {
                    Ok(report) => entries.push((id.clone(), report)),
                    Err(e) => {
                        tracing::warn!("Skipping malformed report {}: {}", id, e);
                    }
                }
            }
        }
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&Report> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, report)| report)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Report)> {
        self.entries.iter().map(|(id, report)| (id.as_str(), report))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
