use donor_sync::configuration::{get_configuration, Settings};
use donor_sync::sync_job::{RunSummary, SyncJob};
use once_cell::sync::Lazy;
use std::path::PathBuf;
use telemetry::{get_subscriber, init_subscriber, init_tracer};
use uuid::Uuid;
use wiremock::MockServer;

pub const LIST_ID: &str = "test-list";

pub const FUNDRAISINGBOX_HEADER: &str = "email_address;first_name;last_name;address;city;state;\
post_code;country;phone;donation_id;by_recurring;donation_meta_info";

pub const TWINGLE_HEADER: &str = "user_email;user_firstname;user_lastname;user_street;\
user_postal_code;user_city;user_country;user_telephone;trx_id;recurring;user_newsletter";

static TRACING: Lazy<()> = Lazy::new(|| {
    let mut configuration = get_configuration().expect("Failed to read configuration");
    let default_filter = "info".to_string();
    let subscriber_name = "test".to_string();
    configuration.telemetry.otlp_endpoint = String::new();
    configuration.telemetry.dataset_name = format!("test-{}", configuration.telemetry.dataset_name);

    let trace_provider = init_tracer(&configuration.telemetry);

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter,
            std::io::stdout,
            &configuration.telemetry,
            &trace_provider,
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter,
            std::io::sink,
            &configuration.telemetry,
            &trace_provider,
        );
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub data_directory: PathBuf,
    pub mailchimp_server: MockServer,
    pub settings: Settings,
}

impl TestApp {
    pub async fn run_sync(&self) -> RunSummary {
        SyncJob::build(&self.settings)
            .expect("Failed to build sync job")
            .run()
            .await
    }

    pub fn write_export(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.data_directory.join(file_name);
        std::fs::write(&path, content).expect("Failed to write donor export");
        path
    }

    pub fn archive_root(&self) -> PathBuf {
        self.data_directory.join(&self.settings.application.archive_folder)
    }

    pub async fn requests_matching(
        &self,
        http_method: &str,
        url_suffix: &str,
    ) -> Vec<wiremock::Request> {
        self.mailchimp_server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| {
                request.method.to_string().eq_ignore_ascii_case(http_method)
                    && request.url.path().ends_with(url_suffix)
            })
            .collect()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_directory);
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let mailchimp_server = MockServer::start().await;

    let data_directory = std::env::temp_dir().join(Uuid::new_v4().to_string());
    std::fs::create_dir_all(&data_directory).expect("Failed to create data directory");

    let settings = {
        let mut c = get_configuration().expect("Failed to read configuration");
        c.application.data_directory = data_directory.clone();
        c.application.debug_directory = data_directory.join("debug");
        c.application.diagnostic_mode = false;
        c.mailchimp.base_url = Some(mailchimp_server.uri());
        c.mailchimp.list_id = LIST_ID.to_string();
        c.mailchimp.timeout_milliseconds = 1000;
        c.telemetry.otlp_endpoint = String::new();
        c
    };

    TestApp {
        data_directory,
        mailchimp_server,
        settings,
    }
}

pub fn fundraisingbox_row(
    email: &str,
    first_name: &str,
    donation_id: &str,
    recurring: bool,
    wants_newsletter: Option<&str>,
) -> String {
    let meta_info = match wants_newsletter {
        Some(flag) => format!(r#""{{""wants_newsletter"":""{flag}""}}""#),
        None => String::new(),
    };
    let by_recurring = if recurring { "1" } else { "0" };
    format!(
        "{email};{first_name};Lovelace;Hauptstr. 1;Berlin;BE;01234;DE;+49 30 1234;\
         {donation_id};{by_recurring};{meta_info}"
    )
}

pub fn csv_file(header: &str, rows: &[String]) -> String {
    let mut content = String::from(header);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    content
}
