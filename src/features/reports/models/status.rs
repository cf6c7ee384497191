use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Report handling lifecycle.
///
/// The wire strings are fixed by the mobile client and must not change:
/// `pending`, `Respond`, `onRoute`, `Responded`, `Rejected`. Older records
/// may carry `Pending` with a capital P; it reads as [`Pending`] but is
/// always written back lowercase.
///
/// Legal transitions move forward only: pending, Respond and onRoute may
/// each advance one step or drop to Rejected. Responded and Rejected are
/// terminal.
///
/// [`Pending`]: ReportStatus::Pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum ReportStatus {
    #[default]
    #[serde(rename = "pending", alias = "Pending")]
    Pending,
    Respond,
    #[serde(rename = "onRoute")]
    OnRoute,
    Responded,
    Rejected,
}

impl ReportStatus {
    /// Parse the store's status string, accepting the legacy `Pending`
    /// spelling. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" | "Pending" => Some(Self::Pending),
            "Respond" => Some(Self::Respond),
            "onRoute" => Some(Self::OnRoute),
            "Responded" => Some(Self::Responded),
            "Rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Canonical wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Respond => "Respond",
            Self::OnRoute => "onRoute",
            Self::Responded => "Responded",
            Self::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Responded | Self::Rejected)
    }

    /// States this one may legally move to. Doubles as the set of action
    /// controls the dashboard offers for a report in this state.
    pub fn next_actions(self) -> &'static [ReportStatus] {
        match self {
            Self::Pending => &[Self::Respond, Self::Rejected],
            Self::Respond => &[Self::OnRoute, Self::Rejected],
            Self::OnRoute => &[Self::Responded, Self::Rejected],
            Self::Responded | Self::Rejected => &[],
        }
    }

    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        self.next_actions().contains(&next)
    }

    /// Badge color shown next to the status in the dashboard table.
    pub fn badge_color(&self) -> &'static str {
        match self {
            Self::Pending => "#7f8c8d",
            Self::Rejected => "#e74c3c",
            Self::Respond => "#f1c40f",
            Self::OnRoute => "#3498db",
            Self::Responded => "#2ecc71",
        }
    }

    /// Icon hint attached to push payloads so the mobile client can pick
    /// a matching notification icon.
    pub fn icon_type(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Respond => "respond",
            Self::OnRoute => "on_route",
            Self::Responded => "responded",
            Self::Rejected => "rejected",
        }
    }

    /// Title and body of the reporter-facing push message, exactly as the
    /// mobile client expects them. A rejection reason is spliced into the
    /// body only when present and non-empty.
    pub fn notification_copy(&self, reason: Option<&str>) -> (String, String) {
        match self {
            Self::Rejected => {
                let mut body = String::from("Your report has been rejected by the admin.");
                if let Some(reason) = reason.filter(|r| !r.is_empty()) {
                    body.push_str(" Reason: ");
                    body.push_str(reason);
                }
                ("Report Rejected".to_string(), body)
            }
            Self::Respond => (
                "Report Verified - On Route".to_string(),
                "Your report is verified and help is on the way.".to_string(),
            ),
            Self::OnRoute => (
                "On Route".to_string(),
                "Responders are on route to your location.".to_string(),
            ),
            Self::Responded => (
                "Responded".to_string(),
                "Your report has been addressed.".to_string(),
            ),
            other => (
                "Report Update".to_string(),
                format!("Your report status changed to {}.", other),
            ),
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
