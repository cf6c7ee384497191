// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - full dashboard access including publicize
pub const ROLE_ADMIN: &str = "admin";

/// End-user role - reporters managed through the dashboard
pub const ROLE_USER: &str = "user";

// =============================================================================
// RENDER PLACEHOLDERS
// =============================================================================

/// Shown when a report references a user that no longer exists
pub const UNKNOWN_USER: &str = "Unknown User";

/// Generic placeholder for absent contact/organization fields
pub const NOT_AVAILABLE: &str = "N/A";

/// Shown when a report carries no additional message
pub const NO_DESCRIPTION: &str = "No description";

/// Location fallbacks, keyed by the location kind that failed to resolve
pub const NO_HOME_ADDRESS: &str = "No Home Address";
pub const NO_PRESENT_ADDRESS: &str = "No Present Address";
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

// =============================================================================
// USER MODERATION
// =============================================================================

/// Warn count at or above which the approval card raises the warning flag
pub const WARN_FLAG_THRESHOLD: i64 = 3;
