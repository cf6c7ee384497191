use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::auth::clients::AuthRecord;
use crate::features::users::models::{EmergencyContact, User};
use crate::shared::constants::WARN_FLAG_THRESHOLD;

/// One row of the approval queue.
///
/// `email_verified` comes from the auth provider, everything else from the
/// user record in the store. Which card actions apply follows from the
/// flags: unapproved accounts get Approve / Resubmit-ID, approved ones get
/// Disable / Enable.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCardDto {
    pub uid: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_approved: bool,
    pub email_verified: bool,
    pub disabled: bool,
    pub resubmit_requested: bool,
    pub warn_count: i64,
    pub warn_flag: bool,
}

impl UserCardDto {
    pub fn from_user(uid: &str, user: &User, email_verified: bool) -> Self {
        Self {
            uid: uid.to_string(),
            username: user
                .username
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| "-".to_string()),
            name: user.name.clone(),
            email: user.email.clone(),
            is_approved: user.is_approved,
            email_verified,
            disabled: user.disabled,
            resubmit_requested: user.resubmit_id,
            warn_count: user.warn_count,
            warn_flag: user.warn_count >= WARN_FLAG_THRESHOLD,
        }
    }
}

/// Nominated emergency contact, as shown on the detail view.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContactDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

impl From<&EmergencyContact> for EmergencyContactDto {
    fn from(contact: &EmergencyContact) -> Self {
        Self {
            name: contact.name.clone(),
            number: contact.number.clone(),
        }
    }
}

/// Full profile for one account, ID images included.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailDto {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub present_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub is_approved: bool,
    pub disabled: bool,
    pub warn_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_front_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_back_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selfie_url: Option<String>,
    pub emergency_contacts: Vec<EmergencyContactDto>,
}

impl UserDetailDto {
    pub fn from_user(uid: &str, user: &User) -> Self {
        Self {
            uid: uid.to_string(),
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age.clone(),
            contact: user.contact.clone(),
            home_address: user.home_address.clone(),
            present_address: user.present_address.clone(),
            organization: user.organization.clone(),
            is_approved: user.is_approved,
            disabled: user.disabled,
            warn_count: user.warn_count,
            id_front_url: user.id_front_url.clone(),
            id_back_url: user.id_back_url.clone(),
            selfie_url: user.selfie_url.clone(),
            emergency_contacts: user.emergency_contacts.iter().map(Into::into).collect(),
        }
    }
}

/// Request DTO for toggling sign-in at the auth provider.
///
/// `disable` is deliberately optional so a missing field can be reported
/// the way the original service did, rather than as a parse error.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisableUserDto {
    pub disable: Option<bool>,
}

/// Auth-provider view of one account.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecordDto {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub email_verified: bool,
    pub disabled: bool,
}

impl From<AuthRecord> for AuthRecordDto {
    fn from(record: AuthRecord) -> Self {
        Self {
            uid: record.uid,
            email: record.email,
            email_verified: record.email_verified,
            disabled: record.disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_card_applies_username_fallback_and_warn_flag() {
        let user = User {
            warn_count: 3,
            ..User::default()
        };
        let card = UserCardDto::from_user("u1", &user, false);
        assert_eq!(card.username, "-");
        assert!(card.warn_flag);
        assert!(!card.email_verified);

        let user = User {
            username: Some("jdoe".to_string()),
            warn_count: 2,
            ..User::default()
        };
        let card = UserCardDto::from_user("u1", &user, true);
        assert_eq!(card.username, "jdoe");
        assert!(!card.warn_flag);
    }

    #[test]
    fn test_card_serializes_camel_case() {
        let card = UserCardDto::from_user("u1", &User::default(), true);
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["emailVerified"], json!(true));
        assert_eq!(value["isApproved"], json!(false));
        assert_eq!(value["warnCount"], json!(0));
        // Absent optionals stay off the wire.
        assert!(value.get("name").is_none());
    }

    #[test]
    fn test_detail_carries_id_images_and_contacts() {
        let user = User::from_value(&json!({
            "name": "Jane",
            "idFrontUrl": "https://img/front.jpg",
            "emergencyContacts": [{"name": "Mom", "number": 9998887777i64}]
        }))
        .unwrap();
        let detail = UserDetailDto::from_user("u1", &user);
        assert_eq!(detail.id_front_url.as_deref(), Some("https://img/front.jpg"));
        assert_eq!(detail.emergency_contacts.len(), 1);
        assert_eq!(
            detail.emergency_contacts[0].number.as_deref(),
            Some("9998887777")
        );
    }
}
