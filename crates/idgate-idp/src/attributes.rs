//! Typed user attribute bag.
//!
//! The directory API hands back user attributes as a flat list of name/value
//! pairs. Instead of threading ad hoc maps through every caller, the bridge
//! parses the closed set of keys the gateway understands into typed fields
//! and keeps everything else in a raw passthrough map, so unknown attributes
//! survive a read-modify-write cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attribute names the gateway understands.
pub mod keys {
    pub const SUBJECT: &str = "sub";
    pub const EMAIL: &str = "email";
    pub const EMAIL_VERIFIED: &str = "email_verified";
    pub const NAME: &str = "name";
    pub const GIVEN_NAME: &str = "given_name";
    pub const FAMILY_NAME: &str = "family_name";
    pub const PHONE: &str = "phone_number";
    pub const ACCOUNT_TYPE: &str = "custom:account_type";
    pub const ORGANIZATION_ID: &str = "custom:organization_id";
    pub const ROLE: &str = "custom:role";
    pub const TIMEZONE: &str = "custom:timezone";
    pub const BUSINESS_NAME: &str = "custom:business_name";
}

/// A user's directory attributes, parsed from provider name/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttributes {
    /// Stable subject identifier assigned by the provider.
    pub subject: String,

    /// Primary email address.
    pub email: Option<String>,

    /// Whether the provider has verified the email address.
    pub email_verified: bool,

    /// Full display name.
    pub name: Option<String>,

    /// Given name.
    pub given_name: Option<String>,

    /// Family name.
    pub family_name: Option<String>,

    /// Phone number in E.164 form.
    pub phone: Option<String>,

    /// Account type tag ("personal", "team", ...).
    pub account_type: Option<String>,

    /// Organization the account belongs to, if any. An empty string from the
    /// provider is treated as absent.
    pub organization_id: Option<String>,

    /// Role tag ("individual", "owner", ...).
    pub role: Option<String>,

    /// IANA timezone name.
    pub timezone: Option<String>,

    /// Attributes outside the known key set, preserved verbatim.
    pub raw: BTreeMap<String, String>,
}

impl UserAttributes {
    /// Parses provider name/value pairs into a typed bag.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut attrs = Self::default();
        for (name, value) in pairs {
            let name = name.into();
            let value = value.into();
            match name.as_str() {
                keys::SUBJECT => attrs.subject = value,
                keys::EMAIL => attrs.email = Some(value),
                keys::EMAIL_VERIFIED => attrs.email_verified = value == "true",
                keys::NAME => attrs.name = Some(value),
                keys::GIVEN_NAME => attrs.given_name = Some(value),
                keys::FAMILY_NAME => attrs.family_name = Some(value),
                keys::PHONE => attrs.phone = Some(value),
                keys::ACCOUNT_TYPE => attrs.account_type = Some(value),
                keys::ORGANIZATION_ID => {
                    attrs.organization_id = (!value.is_empty()).then_some(value);
                }
                keys::ROLE => attrs.role = Some(value),
                keys::TIMEZONE => attrs.timezone = Some(value),
                _ => {
                    attrs.raw.insert(name, value);
                }
            }
        }
        attrs
    }

    /// Serializes the bag back to provider name/value pairs.
    ///
    /// Unset known keys are omitted; raw passthrough attributes are emitted
    /// unchanged.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.subject.is_empty() {
            pairs.push((keys::SUBJECT.to_string(), self.subject.clone()));
        }
        pairs.push((
            keys::EMAIL_VERIFIED.to_string(),
            self.email_verified.to_string(),
        ));
        let mut push = |name: &str, value: &Option<String>| {
            if let Some(v) = value {
                pairs.push((name.to_string(), v.clone()));
            }
        };
        push(keys::EMAIL, &self.email);
        push(keys::NAME, &self.name);
        push(keys::GIVEN_NAME, &self.given_name);
        push(keys::FAMILY_NAME, &self.family_name);
        push(keys::PHONE, &self.phone);
        push(keys::ACCOUNT_TYPE, &self.account_type);
        push(keys::ORGANIZATION_ID, &self.organization_id);
        push(keys::ROLE, &self.role);
        push(keys::TIMEZONE, &self.timezone);
        for (name, value) in &self.raw {
            pairs.push((name.clone(), value.clone()));
        }
        pairs
    }

    /// Best-effort display name.
    ///
    /// Falls back from the full name to "given family" and finally to the
    /// local part of the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            if !name.is_empty() {
                return name.clone();
            }
        }
        let joined = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.trim().is_empty() {
            return joined.trim().to_string();
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .unwrap_or_default()
            .to_string()
    }
}

/// Normalizes a phone number to E.164 form.
///
/// Strips spaces, dashes and parentheses and enforces a leading `+`.
#[must_use]
pub fn format_phone_e164(phone: &str) -> String {
    let digits: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    format!("+{digits}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("sub", "u-123"),
            ("email", "ada@example.com"),
            ("email_verified", "true"),
            ("given_name", "Ada"),
            ("family_name", "Lovelace"),
            ("custom:role", "owner"),
            ("custom:organization_id", "org-9"),
            ("custom:favorite_color", "teal"),
        ]
    }

    #[test]
    fn parses_known_keys_and_preserves_unknown() {
        let attrs = UserAttributes::from_pairs(sample_pairs());
        assert_eq!(attrs.subject, "u-123");
        assert_eq!(attrs.email.as_deref(), Some("ada@example.com"));
        assert!(attrs.email_verified);
        assert_eq!(attrs.role.as_deref(), Some("owner"));
        assert_eq!(attrs.organization_id.as_deref(), Some("org-9"));
        assert_eq!(
            attrs.raw.get("custom:favorite_color").map(String::as_str),
            Some("teal")
        );
    }

    #[test]
    fn empty_organization_is_absent() {
        let attrs = UserAttributes::from_pairs([("custom:organization_id", "")]);
        assert_eq!(attrs.organization_id, None);
    }

    #[test]
    fn pairs_round_trip() {
        let attrs = UserAttributes::from_pairs(sample_pairs());
        let round = UserAttributes::from_pairs(attrs.to_pairs());
        assert_eq!(attrs, round);
    }

    #[test]
    fn display_name_fallbacks() {
        let attrs = UserAttributes::from_pairs(sample_pairs());
        assert_eq!(attrs.display_name(), "Ada Lovelace");

        let named = UserAttributes::from_pairs([("name", "Countess"), ("given_name", "Ada")]);
        assert_eq!(named.display_name(), "Countess");

        let bare = UserAttributes::from_pairs([("email", "grace@example.com")]);
        assert_eq!(bare.display_name(), "grace");
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(format_phone_e164("+1 (415) 555-0100"), "+14155550100");
        assert_eq!(format_phone_e164("14155550100"), "+14155550100");
    }
}
