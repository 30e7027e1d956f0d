use crate::domain::{DonationId, DonationKind, DonorRecord, StructuredAddress};
use crate::sources::{cell, is_numeric_one, text_code};
use serde::Deserialize;

/// One row of a FundraisingBox donation export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FundraisingBoxRow {
    pub email_address: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub post_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub donation_id: Option<String>,
    pub by_recurring: Option<String>,
    /// JSON object, carries the `wants_newsletter` flag.
    pub donation_meta_info: Option<String>,
}

#[derive(Deserialize)]
struct DonationMetaInfo {
    wants_newsletter: Option<serde_json::Value>,
}

impl FundraisingBoxRow {
    /// `None` when the row carries no newsletter decision at all.
    fn wants_newsletter(&self) -> Option<serde_json::Value> {
        let meta_info = self.donation_meta_info.as_deref()?.trim();
        if meta_info.is_empty() {
            return None;
        }

        match serde_json::from_str::<DonationMetaInfo>(meta_info) {
            Ok(meta_info) => meta_info.wants_newsletter,
            Err(e) => {
                tracing::warn!(
                    donation_id = self.donation_id.as_deref().unwrap_or_default(),
                    error.message = %e,
                    "Ignoring row with unreadable donation_meta_info"
                );
                None
            }
        }
    }

    fn has_newsletter_opt_in(&self) -> bool {
        matches!(self.wants_newsletter(), Some(serde_json::Value::String(flag)) if flag == "1")
    }

    fn into_donor_record(self) -> DonorRecord {
        let donation_kind =
            DonationKind::from_recurring_flag(is_numeric_one(self.by_recurring.as_deref()));
        let structured_address = StructuredAddress::new(
            &cell(self.address),
            &cell(self.city),
            &text_code(self.state),
            &text_code(self.post_code),
            &cell(self.country),
        );

        DonorRecord {
            email: cell(self.email_address),
            first_name: cell(self.first_name),
            last_name: cell(self.last_name),
            formatted_address: structured_address.display_line(),
            structured_address,
            phone: cell(self.phone),
            donation_id: DonationId::parse(cell(self.donation_id)),
            donation_kind,
        }
    }
}

pub(crate) fn adapt(
    rows: impl IntoIterator<Item = FundraisingBoxRow>,
) -> impl Iterator<Item = DonorRecord> {
    rows.into_iter()
        .filter(|row| {
            let keep = row.has_newsletter_opt_in();
            if !keep {
                tracing::debug!(
                    donation_id = row.donation_id.as_deref().unwrap_or_default(),
                    "Skipping donation without newsletter opt-in"
                );
            }
            keep
        })
        .map(FundraisingBoxRow::into_donor_record)
}
