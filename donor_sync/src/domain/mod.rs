mod aggregated_contact;
mod donation_id;
mod donor_record;
mod mailchimp_contact;
pub mod mailing_list_client;

pub use crate::domain::aggregated_contact::{AggregatedContact, DonorTag};
pub use crate::domain::donation_id::DonationId;
pub use crate::domain::donor_record::{DonationKind, DonorRecord, StructuredAddress};
pub use crate::domain::mailchimp_contact::{
    ContactColumn, ContactField, FieldValue, MailchimpContact,
};
pub use crate::domain::mailing_list_client::{
    MailingListClient, MailingListError, MemberHash, MemberStatus, MemberUpdate, MergeFields,
    NewMember, TagStatus,
};
