use crate::configuration::TagLabels;
use crate::domain::{
    AggregatedContact, ContactColumn, ContactField, DonorTag, FieldValue, MailchimpContact,
};
use crate::utils::error_chain_fmt;
use anyhow::Context;
use std::path::Path;

/// Rename table used when exporting to Mailchimp: internal field name to
/// audience column name.
pub const MAILCHIMP_COLUMNS: [(&str, &str); 7] = [
    ("email", "Email Address"),
    ("first_name", "First Name"),
    ("last_name", "Last Name"),
    ("formatted_address", "Address"),
    ("structured_address", "Address_dict"),
    ("phone", "Phone"),
    ("donor_tags", "Tags"),
];

#[derive(thiserror::Error)]
pub enum FormatError {
    #[error("Rename table refers to unknown field '{0}'")]
    UnknownField(String),
    #[error("Rename table has no column for the email address")]
    MissingEmailColumn,
    #[error("Failed to write audit file {}", path.display())]
    Audit {
        path: std::path::PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl std::fmt::Debug for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug, Clone)]
struct ColumnMapping {
    field: ContactField,
    external_name: String,
}

/// Projects aggregated contacts onto the mailing list's column schema.
#[derive(Debug, Clone)]
pub struct ContactFormatter {
    columns: Vec<ColumnMapping>,
    tag_labels: TagLabels,
}

impl ContactFormatter {
    pub fn new<I, S>(rename_table: I, tag_labels: TagLabels) -> Result<Self, FormatError>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let columns = rename_table
            .into_iter()
            .map(|(internal, external)| {
                let field = ContactField::parse(internal.as_ref())
                    .ok_or_else(|| FormatError::UnknownField(internal.as_ref().to_string()))?;
                Ok(ColumnMapping {
                    field,
                    external_name: external.as_ref().to_string(),
                })
            })
            .collect::<Result<Vec<_>, FormatError>>()?;

        if !columns.iter().any(|c| c.field == ContactField::Email) {
            return Err(FormatError::MissingEmailColumn);
        }

        Ok(Self {
            columns,
            tag_labels,
        })
    }

    pub fn mailchimp(tag_labels: TagLabels) -> Result<Self, FormatError> {
        Self::new(MAILCHIMP_COLUMNS, tag_labels)
    }

    pub fn header(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.external_name.as_str())
    }

    pub fn format(&self, contact: &AggregatedContact) -> MailchimpContact {
        let columns = self
            .columns
            .iter()
            .map(|mapping| ContactColumn {
                name: mapping.external_name.clone(),
                field: mapping.field,
                value: self.value_of(mapping.field, contact),
            })
            .collect();

        MailchimpContact::new(columns)
    }

    /// Formats the whole batch and writes it to `audit_path` before handing
    /// the contacts back.
    #[tracing::instrument(name = "Formatting contacts", skip(self, contacts))]
    pub fn format_batch(
        &self,
        contacts: &[AggregatedContact],
        audit_path: &Path,
    ) -> Result<Vec<MailchimpContact>, FormatError> {
        let formatted: Vec<MailchimpContact> = contacts.iter().map(|c| self.format(c)).collect();

        self.write_audit(&formatted, audit_path)
            .map_err(|source| FormatError::Audit {
                path: audit_path.to_path_buf(),
                source,
            })?;

        tracing::info!(contacts = formatted.len(), "Wrote audit file");

        Ok(formatted)
    }

    fn write_audit(&self, contacts: &[MailchimpContact], path: &Path) -> Result<(), anyhow::Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b',')
            .from_path(path)
            .context("Failure creating audit file")?;

        writer
            .write_record(self.header())
            .context("Failure writing audit header")?;

        for contact in contacts {
            let cells = contact
                .columns()
                .iter()
                .map(|column| column.value.to_cell())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failure rendering contact {}", contact.email()))?;
            writer
                .write_record(&cells)
                .with_context(|| format!("Failure writing contact {}", contact.email()))?;
        }

        writer.flush().context("Failure flushing audit file")?;
        Ok(())
    }

    fn value_of(&self, field: ContactField, contact: &AggregatedContact) -> FieldValue {
        match field {
            ContactField::Email => FieldValue::Text(contact.email.clone()),
            ContactField::FirstName => FieldValue::Text(contact.first_name.clone()),
            ContactField::LastName => FieldValue::Text(contact.last_name.clone()),
            ContactField::FormattedAddress => FieldValue::Text(contact.formatted_address.clone()),
            ContactField::StructuredAddress => {
                FieldValue::Address(contact.structured_address.clone())
            }
            ContactField::Phone => FieldValue::Text(contact.phone.clone()),
            ContactField::DonorTags => FieldValue::Tags(
                contact
                    .donor_tags
                    .iter()
                    .map(|tag| self.label(*tag).to_string())
                    .collect(),
            ),
            ContactField::MinDonationId => FieldValue::Text(contact.min_donation_id.to_string()),
            ContactField::MaxDonationId => FieldValue::Text(contact.max_donation_id.to_string()),
            ContactField::RecurringCount => FieldValue::Count(contact.recurring_count),
            ContactField::OneTimeCount => FieldValue::Count(contact.one_time_count),
        }
    }

    fn label(&self, tag: DonorTag) -> &str {
        match tag {
            DonorTag::OneTime => &self.tag_labels.one_time,
            DonorTag::Recurring => &self.tag_labels.recurring,
        }
    }
}
