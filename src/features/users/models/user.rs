use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One contact the reporter nominated for emergencies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmergencyContact {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub number: Option<String>,
}

/// A user record as stored under `users/{uid}`.
///
/// Mobile clients wrote these records over several app revisions, so
/// every field is optional and the numeric-ish ones accept either a
/// number or a string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub age: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub contact: Option<String>,
    pub home_address: Option<String>,
    pub present_address: Option<String>,
    pub organization: Option<String>,
    pub role: Option<String>,
    pub is_approved: bool,
    pub disabled: bool,
    #[serde(rename = "resubmitID")]
    pub resubmit_id: bool,
    #[serde(deserialize_with = "lenient_count")]
    pub warn_count: i64,
    pub fcm_token: Option<String>,
    pub id_front_url: Option<String>,
    pub id_back_url: Option<String>,
    pub selfie_url: Option<String>,
    pub emergency_contacts: Vec<EmergencyContact>,
}

impl User {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

/// Accepts a string or a number, yielding its display form.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

/// Accepts an integer, a float, or a numeric string; anything else is 0.
fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .unwrap_or(0))
}

/// In-memory image of the full `users` collection, replaced wholesale on
/// every store push. Entry order follows the snapshot's key order.
#[derive(Debug, Clone, Default)]
pub struct UserTable {
    entries: Vec<(String, User)>,
}

impl UserTable {
    /// Builds a table from a raw collection snapshot. Records that do
    /// not deserialize are skipped so one bad write cannot blank the
    /// whole directory.
    pub fn from_snapshot(snapshot: &Value) -> Self {
        let mut entries = Vec::new();
        if let Some(map) = snapshot.as_object() {
            for (uid, value) in map {
                match User::from_value(value) {
                    Ok(user) => entries.push((uid.clone(), user)),
                    Err(e) => {
                        tracing::warn!("Skipping malformed user {}: {}", uid, e);
                    }
                }
            }
        }
        Self { entries }
    }

    pub fn get(&self, uid: &str) -> Option<&User> {
        self.entries
            .iter()
            .find(|(key, _)| key == uid)
            .map(|(_, user)| user)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &User)> {
        self.entries.iter().map(|(uid, user)| (uid.as_str(), user))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
