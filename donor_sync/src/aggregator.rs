use crate::domain::{AggregatedContact, DonationId, DonorRecord, DonorTag};
use crate::utils::error_chain_fmt;
use std::collections::BTreeMap;

#[derive(thiserror::Error)]
pub enum AggregationError {
    #[error("{count} donations of {email} share the highest donation id {donation_id}")]
    DuplicateMaxDonationId {
        email: String,
        donation_id: String,
        count: usize,
    },
}

impl std::fmt::Debug for AggregationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Collapses a batch of donor records into one contact per email address,
/// ordered by email.
///
/// The representative name, address and phone come from the donation with
/// the highest id. Blank ids rank below every other id. If the highest
/// non-blank id appears more than once for the same email the batch is
/// ambiguous and rejected.
#[tracing::instrument(name = "Aggregating donor records", skip(records))]
pub fn aggregate(
    records: impl IntoIterator<Item = DonorRecord>,
) -> Result<Vec<AggregatedContact>, AggregationError> {
    let mut by_email: BTreeMap<String, Vec<DonorRecord>> = BTreeMap::new();
    for record in records {
        by_email.entry(record.email.clone()).or_default().push(record);
    }

    let contacts = by_email
        .into_iter()
        .map(|(email, donations)| aggregate_donations(email, donations))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(contacts = contacts.len(), "Aggregated donor records by email");

    Ok(contacts)
}

fn aggregate_donations(
    email: String,
    donations: Vec<DonorRecord>,
) -> Result<AggregatedContact, AggregationError> {
    // Groups are built from at least one record.
    let mut min_donation_id: &DonationId = &donations[0].donation_id;
    let mut max_donation_id: &DonationId = &donations[0].donation_id;
    let mut recurring_count = 0;
    let mut one_time_count = 0;

    for donation in &donations {
        min_donation_id = min_donation_id.min(&donation.donation_id);
        max_donation_id = max_donation_id.max(&donation.donation_id);
        recurring_count += donation.is_recurring_donor();
        one_time_count += donation.is_one_time_donor();
    }
    let min_donation_id = min_donation_id.clone();
    let max_donation_id = max_donation_id.clone();

    let mut latest = donations
        .into_iter()
        .filter(|donation| donation.donation_id == max_donation_id)
        .collect::<Vec<_>>();

    // Donations without an id carry no order, so several of them can share
    // the top spot; the first one in file order is used.
    if latest.len() != 1 && !max_donation_id.is_missing() {
        return Err(AggregationError::DuplicateMaxDonationId {
            email,
            donation_id: max_donation_id.to_string(),
            count: latest.len(),
        });
    }
    let representative = latest.remove(0);

    Ok(AggregatedContact {
        email,
        min_donation_id,
        max_donation_id,
        recurring_count,
        one_time_count,
        donor_tags: DonorTag::derive(one_time_count, recurring_count),
        first_name: representative.first_name,
        last_name: representative.last_name,
        formatted_address: representative.formatted_address,
        structured_address: representative.structured_address,
        phone: representative.phone,
    })
}
