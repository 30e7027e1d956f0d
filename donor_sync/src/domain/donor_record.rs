use crate::domain::donation_id::DonationId;
use serde::Serialize;

/// Whether a single donation was part of a standing contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationKind {
    Recurring,
    OneTime,
}

impl DonationKind {
    pub fn from_recurring_flag(is_recurring: bool) -> Self {
        if is_recurring {
            Self::Recurring
        } else {
            Self::OneTime
        }
    }
}

/// Postal address in the shape of Mailchimp's `ADDRESS` merge field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuredAddress {
    pub addr1: String,
    pub addr2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl StructuredAddress {
    /// `addr2` is never populated by any supported platform.
    pub fn new(street: &str, city: &str, state: &str, zip: &str, country: &str) -> Self {
        Self {
            addr1: street.to_string(),
            addr2: String::new(),
            city: city.to_string(),
            state: state.to_string(),
            zip: zip.to_string(),
            country: country.to_string(),
        }
    }

    /// Single-line rendering: street, city, state, zip and country joined by
    /// two spaces. An absent state still contributes its empty segment.
    pub fn display_line(&self) -> String {
        [
            self.addr1.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.zip.as_str(),
            self.country.as_str(),
        ]
        .join("  ")
    }
}

/// One donation from one donor, normalized across source platforms.
#[derive(Debug, Clone, Serialize)]
pub struct DonorRecord {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub formatted_address: String,
    pub structured_address: StructuredAddress,
    pub phone: String,
    pub donation_id: DonationId,
    pub donation_kind: DonationKind,
}

impl DonorRecord {
    pub fn is_recurring_donor(&self) -> u32 {
        u32::from(self.donation_kind == DonationKind::Recurring)
    }

    pub fn is_one_time_donor(&self) -> u32 {
        u32::from(self.donation_kind == DonationKind::OneTime)
    }
}
