use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

lazy_static! {
    /// Coordinate encoding written by the mobile client into the free-text
    /// location field, e.g. "Lat: 14.5995, Lng: 120.9842".
    static ref COORDINATE_RE: Regex =
        Regex::new(r"^\s*Lat:\s*(-?\d+(?:\.\d+)?)\s*,\s*Lng:\s*(-?\d+(?:\.\d+)?)\s*$").unwrap();
}

/// Declared source of a report's location.
///
/// Canonical names match the current mobile client; older revisions wrote
/// spaced and camel-cased variants, which must keep resolving instead of
/// silently dropping the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum LocationType {
    HomeAddress,
    PresentAddress,
    CurrentLocation,
    CustomLocation,
}

impl LocationType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "HomeAddress" | "Home Address" => Some(Self::HomeAddress),
            "PresentAddress" | "Present Address" => Some(Self::PresentAddress),
            "CurrentLocation" | "Current Location" | "currentLocation" => {
                Some(Self::CurrentLocation)
            }
            "CustomLocation" | "customLocation" | "Custom Location" => Some(Self::CustomLocation),
            _ => None,
        }
    }
}

/// Location resolved once at ingestion, so rendering never re-parses the
/// raw text.
///
/// Address variants defer to the reporter's profile at render time;
/// coordinates go through reverse geocoding; free text renders as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationRef {
    HomeAddress,
    PresentAddress,
    Coordinates { lat: f64, lng: f64 },
    FreeText(String),
}

impl LocationRef {
    /// Combine the declared location type with the raw location text.
    ///
    /// Returns `None` when a current/custom location carries no usable
    /// text, or when the type itself is unknown; the renderer picks the
    /// placeholder in both cases.
    pub fn resolve(location_type: Option<LocationType>, raw: Option<&str>) -> Option<Self> {
        match location_type? {
            LocationType::HomeAddress => Some(Self::HomeAddress),
            LocationType::PresentAddress => Some(Self::PresentAddress),
            LocationType::CurrentLocation | LocationType::CustomLocation => {
                let raw = raw?.trim();
                if raw.is_empty() {
                    return None;
                }
                match parse_coordinates(raw) {
                    Some((lat, lng)) => Some(Self::Coordinates { lat, lng }),
                    None => Some(Self::FreeText(raw.to_string())),
                }
            }
        }
    }
}

fn parse_coordinates(raw: &str) -> Option<(f64, f64)> {
    let captures = COORDINATE_RE.captures(raw)?;
    let lat = captures.get(1)?.as_str().parse().ok()?;
    let lng = captures.get(2)?.as_str().parse().ok()?;
    Some((lat, lng))
}
