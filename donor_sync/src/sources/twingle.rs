use crate::domain::{DonationId, DonationKind, DonorRecord, StructuredAddress};
use crate::sources::{cell, is_numeric_one, text_code};
use serde::Deserialize;

/// One row of a Twingle transaction export. Twingle has no state field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TwingleRow {
    pub user_email: Option<String>,
    pub user_firstname: Option<String>,
    pub user_lastname: Option<String>,
    pub user_street: Option<String>,
    pub user_postal_code: Option<String>,
    pub user_city: Option<String>,
    pub user_country: Option<String>,
    pub user_telephone: Option<String>,
    pub trx_id: Option<String>,
    pub recurring: Option<String>,
    pub user_newsletter: Option<String>,
}

impl TwingleRow {
    fn has_newsletter_opt_in(&self) -> bool {
        match self.user_newsletter.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(flag) => flag.parse::<i64>() == Ok(1),
        }
    }

    fn into_donor_record(self) -> DonorRecord {
        let donation_kind =
            DonationKind::from_recurring_flag(is_numeric_one(self.recurring.as_deref()));
        let structured_address = StructuredAddress::new(
            &cell(self.user_street),
            &cell(self.user_city),
            "",
            &text_code(self.user_postal_code),
            &cell(self.user_country),
        );

        DonorRecord {
            email: cell(self.user_email),
            first_name: cell(self.user_firstname),
            last_name: cell(self.user_lastname),
            formatted_address: structured_address.display_line(),
            structured_address,
            phone: cell(self.user_telephone),
            donation_id: DonationId::parse(cell(self.trx_id)),
            donation_kind,
        }
    }
}

pub(crate) fn adapt(
    rows: impl IntoIterator<Item = TwingleRow>,
) -> impl Iterator<Item = DonorRecord> {
    rows.into_iter()
        .filter(|row| {
            let keep = row.has_newsletter_opt_in();
            if !keep {
                tracing::debug!(
                    trx_id = row.trx_id.as_deref().unwrap_or_default(),
                    "Skipping transaction without newsletter opt-in"
                );
            }
            keep
        })
        .map(TwingleRow::into_donor_record)
}
