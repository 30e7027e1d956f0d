pub mod mailchimp_client;

pub use mailchimp_client::MailchimpClient;
