use crate::domain::{
    MailingListClient, MailingListError, MemberHash, MemberUpdate, NewMember, TagStatus,
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MEMBER_EXISTS_TITLE: &str = "Member Exists";

/// Mailchimp Marketing API v3 client.
#[derive(Clone)]
pub struct MailchimpClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl MailchimpClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    fn members_url(&self, list_id: &str) -> String {
        format!("{}/lists/{}/members", self.base_url, list_id)
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        request: reqwest::RequestBuilder,
        body: &T,
    ) -> Result<(), MailingListError> {
        let response = request
            // Mailchimp accepts any user name together with the API key.
            .basic_auth("donor_sync", Some(self.api_key.expose_secret()))
            .json(body)
            .send()
            .await
            .context("Failure sending request to Mailchimp")?;

        check_response(response).await
    }
}

/// Problem document Mailchimp returns for rejected requests.
#[derive(Deserialize, Default)]
struct ProblemDetail {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

async fn check_response(response: Response) -> Result<(), MailingListError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    let problem: ProblemDetail = serde_json::from_str(&body).unwrap_or_default();
    let detail = if problem.detail.is_empty() {
        body
    } else {
        problem.detail
    };

    if problem.title == MEMBER_EXISTS_TITLE {
        Err(MailingListError::MemberExists(detail))
    } else {
        Err(MailingListError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}

#[derive(Serialize)]
struct TagsRequest<'a> {
    tags: [TagRequest<'a>; 1],
}

#[derive(Serialize)]
struct TagRequest<'a> {
    name: &'a str,
    status: TagStatus,
}

#[async_trait]
impl MailingListClient for MailchimpClient {
    #[tracing::instrument(
        name = "Mailchimp create member",
        skip(self, member),
        fields(email = %member.email_address)
    )]
    async fn create_member(
        &self,
        list_id: &str,
        member: &NewMember,
    ) -> Result<(), MailingListError> {
        let request = self.http_client.post(self.members_url(list_id));
        self.send(request, member).await
    }

    #[tracing::instrument(
        name = "Mailchimp set member",
        skip(self, member),
        fields(email = %member.email_address)
    )]
    async fn set_member(
        &self,
        list_id: &str,
        member_hash: &MemberHash,
        member: &MemberUpdate,
    ) -> Result<(), MailingListError> {
        let url = format!("{}/{}", self.members_url(list_id), member_hash);
        self.send(self.http_client.put(url), member).await
    }

    #[tracing::instrument(name = "Mailchimp update member tags", skip(self))]
    async fn update_member_tags(
        &self,
        list_id: &str,
        member_hash: &MemberHash,
        tag: &str,
        status: TagStatus,
    ) -> Result<(), MailingListError> {
        let url = format!("{}/{}/tags", self.members_url(list_id), member_hash);
        let body = TagsRequest {
            tags: [TagRequest { name: tag, status }],
        };
        self.send(self.http_client.post(url), &body).await
    }
}
