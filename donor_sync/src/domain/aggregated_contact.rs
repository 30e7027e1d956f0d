use crate::domain::donation_id::DonationId;
use crate::domain::donor_record::StructuredAddress;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DonorTag {
    OneTime,
    Recurring,
}

impl DonorTag {
    pub fn default_label(&self) -> &'static str {
        match self {
            DonorTag::OneTime => "one-time-donor-tag",
            DonorTag::Recurring => "recurring-donor-tag",
        }
    }

    /// Tag set derived from how many one-time and recurring donations a
    /// donor made.
    pub fn derive(one_time_count: u32, recurring_count: u32) -> BTreeSet<DonorTag> {
        match (one_time_count > 0, recurring_count > 0) {
            (false, false) => BTreeSet::new(),
            (true, false) => BTreeSet::from([DonorTag::OneTime]),
            (false, true) => BTreeSet::from([DonorTag::Recurring]),
            (true, true) => BTreeSet::from([DonorTag::OneTime, DonorTag::Recurring]),
        }
    }
}

/// Every donation of one email address collapsed into a single contact.
/// Name, address and phone come from the donation with the highest id.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedContact {
    pub email: String,
    pub min_donation_id: DonationId,
    pub max_donation_id: DonationId,
    pub recurring_count: u32,
    pub one_time_count: u32,
    pub donor_tags: BTreeSet<DonorTag>,
    pub first_name: String,
    pub last_name: String,
    pub formatted_address: String,
    pub structured_address: StructuredAddress,
    pub phone: String,
}

impl AggregatedContact {
    pub fn donation_count(&self) -> u32 {
        self.recurring_count + self.one_time_count
    }
}

#[cfg(test)]
mod tests {
    use super::DonorTag;
    use std::collections::BTreeSet;

    #[test]
    fn no_donations_yield_no_tags() {
        assert_eq!(DonorTag::derive(0, 0), BTreeSet::new());
    }

    #[test]
    fn only_one_time_donations_yield_one_time_tag() {
        assert_eq!(DonorTag::derive(3, 0), BTreeSet::from([DonorTag::OneTime]));
    }

    #[test]
    fn only_recurring_donations_yield_recurring_tag() {
        assert_eq!(DonorTag::derive(0, 2), BTreeSet::from([DonorTag::Recurring]));
    }

    #[test]
    fn mixed_donations_yield_both_tags() {
        assert_eq!(
            DonorTag::derive(1, 1),
            BTreeSet::from([DonorTag::OneTime, DonorTag::Recurring])
        );
    }
}
