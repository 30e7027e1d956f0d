use crate::domain::{
    MailchimpContact, MailingListClient, MailingListError, MemberHash, MemberStatus,
    MemberUpdate, NewMember, TagStatus,
};

/// Outcome counts of one dispatch run. Failures are only logged; this is
/// what remains for the caller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub contacts: usize,
    pub created: usize,
    pub already_existing: usize,
    pub updated: usize,
    pub tags_activated: usize,
    pub failed_calls: usize,
}

/// Upserts every contact into the list, one after the other.
///
/// Per contact the order is fixed: create, then update-or-create by member
/// hash, then one call per tag. A rejected call is logged and never stops
/// the remaining calls or contacts.
#[tracing::instrument(
    name = "Upserting contacts",
    skip(client, contacts),
    fields(contacts = contacts.len())
)]
pub async fn upsert_contacts<C>(
    client: &C,
    list_id: &str,
    contacts: &[MailchimpContact],
) -> DispatchSummary
where
    C: MailingListClient + ?Sized,
{
    let mut summary = DispatchSummary::default();

    for contact in contacts {
        summary.contacts += 1;
        upsert_contact(client, list_id, contact, &mut summary).await;
    }

    tracing::info!(
        contacts = summary.contacts,
        created = summary.created,
        already_existing = summary.already_existing,
        updated = summary.updated,
        tags_activated = summary.tags_activated,
        failed_calls = summary.failed_calls,
        "Finished upserting contacts"
    );

    summary
}

#[tracing::instrument(
    name = "Upserting contact",
    skip(client, contact, summary),
    fields(email = %contact.email())
)]
async fn upsert_contact<C>(
    client: &C,
    list_id: &str,
    contact: &MailchimpContact,
    summary: &mut DispatchSummary,
) where
    C: MailingListClient + ?Sized,
{
    let email = contact.email();
    let merge_fields = contact.merge_fields();

    let new_member = NewMember {
        email_address: email.to_string(),
        status: MemberStatus::Subscribed,
        tags: contact.tags().to_vec(),
        merge_fields: merge_fields.clone(),
    };
    match client.create_member(list_id, &new_member).await {
        Ok(()) => {
            summary.created += 1;
            tracing::info!("Created list member");
        }
        Err(MailingListError::MemberExists(detail)) => {
            summary.already_existing += 1;
            tracing::info!(detail = %detail, "List member already exists, updating instead");
        }
        Err(error) => {
            summary.failed_calls += 1;
            tracing::warn!(
                error.cause_chain = ?error,
                error.message = %error,
                "Failed to create list member"
            );
        }
    }

    let member_hash = MemberHash::from_email(email);
    let update = MemberUpdate {
        email_address: email.to_string(),
        status: MemberStatus::Subscribed,
        status_if_new: MemberStatus::Subscribed,
        merge_fields,
    };
    match client.set_member(list_id, &member_hash, &update).await {
        Ok(()) => {
            summary.updated += 1;
            tracing::info!("Updated list member");
        }
        Err(error) => {
            summary.failed_calls += 1;
            tracing::warn!(
                error.cause_chain = ?error,
                error.message = %error,
                "Failed to update list member"
            );
        }
    }

    for tag in contact.tags() {
        match client
            .update_member_tags(list_id, &member_hash, tag, TagStatus::Active)
            .await
        {
            Ok(()) => summary.tags_activated += 1,
            Err(error) => {
                summary.failed_calls += 1;
                tracing::warn!(
                    tag = %tag,
                    error.cause_chain = ?error,
                    error.message = %error,
                    "Failed to activate tag"
                );
            }
        }
    }
}
