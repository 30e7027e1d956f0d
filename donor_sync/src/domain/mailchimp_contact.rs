use crate::domain::donor_record::StructuredAddress;
use crate::domain::mailing_list_client::MergeFields;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Internal fields of an aggregated contact that a rename table can export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Email,
    FirstName,
    LastName,
    FormattedAddress,
    StructuredAddress,
    Phone,
    DonorTags,
    MinDonationId,
    MaxDonationId,
    RecurringCount,
    OneTimeCount,
}

impl ContactField {
    pub fn parse(name: &str) -> Option<Self> {
        let field = match name {
            "email" => Self::Email,
            "first_name" => Self::FirstName,
            "last_name" => Self::LastName,
            "formatted_address" => Self::FormattedAddress,
            "structured_address" => Self::StructuredAddress,
            "phone" => Self::Phone,
            "donor_tags" => Self::DonorTags,
            "min_donation_id" => Self::MinDonationId,
            "max_donation_id" => Self::MaxDonationId,
            "recurring_count" => Self::RecurringCount,
            "one_time_count" => Self::OneTimeCount,
            _ => return None,
        };
        Some(field)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::FormattedAddress => "formatted_address",
            Self::StructuredAddress => "structured_address",
            Self::Phone => "phone",
            Self::DonorTags => "donor_tags",
            Self::MinDonationId => "min_donation_id",
            Self::MaxDonationId => "max_donation_id",
            Self::RecurringCount => "recurring_count",
            Self::OneTimeCount => "one_time_count",
        }
    }
}

impl Display for ContactField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Count(u32),
    Address(StructuredAddress),
    Tags(Vec<String>),
}

impl FieldValue {
    /// Rendering used for one cell of the audit file. Structured values are
    /// written as JSON.
    pub fn to_cell(&self) -> Result<String, serde_json::Error> {
        match self {
            FieldValue::Text(text) => Ok(text.clone()),
            FieldValue::Count(count) => Ok(count.to_string()),
            FieldValue::Address(address) => serde_json::to_string(address),
            FieldValue::Tags(tags) => serde_json::to_string(tags),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactColumn {
    pub name: String,
    pub field: ContactField,
    pub value: FieldValue,
}

/// A contact projected onto the mailing list's column names, in the order
/// of the rename table that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailchimpContact {
    columns: Vec<ContactColumn>,
}

impl MailchimpContact {
    pub fn new(columns: Vec<ContactColumn>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ContactColumn] {
        &self.columns
    }

    pub fn get(&self, field: ContactField) -> Option<&FieldValue> {
        self.columns
            .iter()
            .find(|column| column.field == field)
            .map(|column| &column.value)
    }

    fn text(&self, field: ContactField) -> &str {
        match self.get(field) {
            Some(FieldValue::Text(text)) => text,
            _ => "",
        }
    }

    pub fn email(&self) -> &str {
        self.text(ContactField::Email)
    }

    pub fn structured_address(&self) -> Option<&StructuredAddress> {
        match self.get(ContactField::StructuredAddress) {
            Some(FieldValue::Address(address)) => Some(address),
            _ => None,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self.get(ContactField::DonorTags) {
            Some(FieldValue::Tags(tags)) => tags,
            _ => &[],
        }
    }

    pub fn merge_fields(&self) -> MergeFields {
        MergeFields {
            first_name: self.text(ContactField::FirstName).to_string(),
            last_name: self.text(ContactField::LastName).to_string(),
            address: self.structured_address().cloned(),
            phone: self.text(ContactField::Phone).to_string(),
        }
    }
}
