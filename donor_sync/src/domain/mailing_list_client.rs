use crate::domain::donor_record::StructuredAddress;
use crate::utils::error_chain_fmt;
use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(thiserror::Error)]
pub enum MailingListError {
    #[error("{0}")]
    MemberExists(String),
    #[error("Request rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for MailingListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Identifier the mailing list uses to address a member: hex MD5 of the
/// lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHash(String);

impl MemberHash {
    pub fn from_email(email: &str) -> Self {
        let mut hasher = Md5::new();
        hasher.update(email.to_lowercase().as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }
}

impl AsRef<str> for MemberHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for MemberHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Subscribed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagStatus {
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeFields {
    #[serde(rename = "FNAME")]
    pub first_name: String,
    #[serde(rename = "LNAME")]
    pub last_name: String,
    #[serde(rename = "ADDRESS", skip_serializing_if = "Option::is_none")]
    pub address: Option<StructuredAddress>,
    #[serde(rename = "PHONE")]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMember {
    pub email_address: String,
    pub status: MemberStatus,
    pub tags: Vec<String>,
    pub merge_fields: MergeFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberUpdate {
    pub email_address: String,
    pub status: MemberStatus,
    pub status_if_new: MemberStatus,
    pub merge_fields: MergeFields,
}

#[async_trait]
pub trait MailingListClient: Send + Sync {
    async fn create_member(&self, list_id: &str, member: &NewMember)
        -> Result<(), MailingListError>;

    async fn set_member(
        &self,
        list_id: &str,
        member_hash: &MemberHash,
        member: &MemberUpdate,
    ) -> Result<(), MailingListError>;

    async fn update_member_tags(
        &self,
        list_id: &str,
        member_hash: &MemberHash,
        tag: &str,
        status: TagStatus,
    ) -> Result<(), MailingListError>;
}
