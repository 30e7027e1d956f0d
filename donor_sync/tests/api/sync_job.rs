use crate::helpers::{
    csv_file, fundraisingbox_row, spawn_app, FUNDRAISINGBOX_HEADER, LIST_ID, TWINGLE_HEADER,
};
use donor_sync::domain::MemberHash;
use donor_sync::snapshot::SnapshotSink;
use donor_sync::sync_job::SyncJob;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn accept_all_calls(server: &wiremock::MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

#[tokio::test]
async fn mixed_donations_produce_both_tags_and_latest_details() {
    let app = spawn_app().await;
    accept_all_calls(&app.mailchimp_server).await;

    app.write_export(
        "FundraisingBox.csv",
        &csv_file(
            FUNDRAISINGBOX_HEADER,
            &[
                fundraisingbox_row("a@x.com", "Old", "100", false, Some("1")),
                fundraisingbox_row("a@x.com", "Ada", "200", true, Some("1")),
            ],
        ),
    );

    let summary = app.run_sync().await;

    assert!(!summary.has_failures());
    assert_eq!(summary.processed.len(), 1);
    assert_eq!(summary.processed[0].dispatch.contacts, 1);

    let created = app
        .requests_matching("POST", &format!("/lists/{}/members", LIST_ID))
        .await;
    assert_eq!(created.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&created[0].body).unwrap();
    assert_eq!(body["email_address"], "a@x.com");
    assert_eq!(body["merge_fields"]["FNAME"], "Ada");
    assert_eq!(
        body["tags"],
        serde_json::json!(["one-time-donor-tag", "recurring-donor-tag"])
    );

    let hash = MemberHash::from_email("a@x.com");
    assert_eq!(
        app.requests_matching("PUT", &format!("/members/{}", hash)).await.len(),
        1
    );
    assert_eq!(
        app.requests_matching("POST", &format!("/members/{}/tags", hash))
            .await
            .len(),
        2
    );
}

#[tokio::test]
async fn rows_without_opt_in_never_reach_the_mailing_list() {
    let app = spawn_app().await;
    accept_all_calls(&app.mailchimp_server).await;

    app.write_export(
        "FundraisingBox.csv",
        &csv_file(
            FUNDRAISINGBOX_HEADER,
            &[
                fundraisingbox_row("b@x.com", "Bo", "300", false, None),
                fundraisingbox_row("c@x.com", "Cy", "301", false, Some("0")),
            ],
        ),
    );

    let summary = app.run_sync().await;

    assert!(!summary.has_failures());
    assert_eq!(summary.processed[0].dispatch.contacts, 0);
    let received = app.mailchimp_server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn existing_member_is_updated_after_create_is_rejected() {
    let app = spawn_app().await;
    let hash = MemberHash::from_email("a@x.com");

    Mock::given(method("POST"))
        .and(path(format!("/lists/{}/members", LIST_ID)))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "title": "Member Exists",
            "status": 400,
            "detail": "a@x.com is already a list member."
        })))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/lists/{}/members/{}", LIST_ID, hash)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/lists/{}/members/{}/tags", LIST_ID, hash)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    app.write_export(
        "FundraisingBox.csv",
        &csv_file(
            FUNDRAISINGBOX_HEADER,
            &[fundraisingbox_row("a@x.com", "Ada", "100", false, Some("1"))],
        ),
    );

    let summary = app.run_sync().await;

    let dispatch = summary.processed[0].dispatch;
    assert_eq!(dispatch.already_existing, 1);
    assert_eq!(dispatch.updated, 1);
    assert_eq!(dispatch.failed_calls, 0);
}

#[tokio::test]
async fn duplicate_max_donation_id_fails_batch_and_keeps_file() {
    let app = spawn_app().await;
    accept_all_calls(&app.mailchimp_server).await;

    let input = app.write_export(
        "FundraisingBox.csv",
        &csv_file(
            FUNDRAISINGBOX_HEADER,
            &[
                fundraisingbox_row("a@x.com", "Ada", "500", false, Some("1")),
                fundraisingbox_row("a@x.com", "Ada", "500", true, Some("1")),
            ],
        ),
    );

    let summary = app.run_sync().await;

    assert_eq!(summary.failed, vec![input.clone()]);
    assert!(input.exists());
    assert!(!app.archive_root().exists());
    assert!(app.mailchimp_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn failing_file_does_not_stop_the_next_one() {
    let app = spawn_app().await;
    accept_all_calls(&app.mailchimp_server).await;

    let broken = app.write_export(
        "FundraisingBox_1.csv",
        &csv_file(
            FUNDRAISINGBOX_HEADER,
            &[
                fundraisingbox_row("a@x.com", "Ada", "500", false, Some("1")),
                fundraisingbox_row("a@x.com", "Ada", "500", false, Some("1")),
            ],
        ),
    );
    let healthy = app.write_export(
        "FundraisingBox_2.csv",
        &csv_file(
            FUNDRAISINGBOX_HEADER,
            &[fundraisingbox_row("b@x.com", "Bo", "501", false, Some("1"))],
        ),
    );

    let summary = app.run_sync().await;

    assert_eq!(summary.failed, vec![broken]);
    assert_eq!(summary.processed.len(), 1);
    assert_eq!(summary.processed[0].input, healthy);
    assert!(!healthy.exists());
}

#[tokio::test]
async fn processed_export_and_audit_file_are_archived_together() {
    let app = spawn_app().await;
    accept_all_calls(&app.mailchimp_server).await;

    let input = app.write_export(
        "Twingle.csv",
        &csv_file(
            TWINGLE_HEADER,
            &["c@x.com;Cleo;Meyer;Ring 5;04109;Leipzig;DE;;T-1;0;1".to_string()],
        ),
    );

    let summary = app.run_sync().await;

    assert!(!summary.has_failures());
    let archived_to = &summary.processed[0].archived_to;
    assert!(archived_to.starts_with(app.archive_root()));
    assert!(!input.exists());
    assert!(archived_to.join("Twingle.csv").exists());

    let audit = std::fs::read_to_string(archived_to.join("Twingle_processed.csv")).unwrap();
    let mut lines = audit.lines();
    assert_eq!(
        lines.next(),
        Some("Email Address,First Name,Last Name,Address,Address_dict,Phone,Tags")
    );
    assert!(lines.next().unwrap().starts_with("c@x.com,Cleo,Meyer,"));
}

#[tokio::test]
async fn diagnostic_mode_writes_snapshots() {
    let mut app = spawn_app().await;
    accept_all_calls(&app.mailchimp_server).await;
    app.settings.application.diagnostic_mode = true;

    app.write_export(
        "FundraisingBox.csv",
        &csv_file(
            FUNDRAISINGBOX_HEADER,
            &[fundraisingbox_row("a@x.com", "Ada", "100", false, Some("1"))],
        ),
    );

    app.run_sync().await;

    let debug_directory = &app.settings.application.debug_directory;
    assert!(debug_directory.join("FundraisingBox_donor_records.json").exists());
    assert!(debug_directory.join("FundraisingBox_contacts.json").exists());
}

#[derive(Default)]
struct CollectingSink(Mutex<Vec<(String, serde_json::Value)>>);

impl SnapshotSink for CollectingSink {
    fn write_snapshot(
        &self,
        name: &str,
        payload: &serde_json::Value,
    ) -> Result<(), anyhow::Error> {
        self.0.lock().unwrap().push((name.to_string(), payload.clone()));
        Ok(())
    }
}

#[tokio::test]
async fn injected_snapshot_sink_receives_records_and_contacts() {
    let app = spawn_app().await;
    accept_all_calls(&app.mailchimp_server).await;

    app.write_export(
        "FundraisingBox.csv",
        &csv_file(
            FUNDRAISINGBOX_HEADER,
            &[
                fundraisingbox_row("a@x.com", "Ada", "100", false, Some("1")),
                fundraisingbox_row("a@x.com", "Ada", "101", true, Some("1")),
            ],
        ),
    );

    let sink = Arc::new(CollectingSink::default());
    let summary = SyncJob::build(&app.settings)
        .expect("Failed to build sync job")
        .with_snapshot_sink(sink.clone())
        .run()
        .await;

    assert!(!summary.has_failures());
    let snapshots = sink.0.lock().unwrap();
    let names: Vec<_> = snapshots.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec!["FundraisingBox_donor_records", "FundraisingBox_contacts"]
    );
    assert_eq!(snapshots[0].1.as_array().unwrap().len(), 2);
    assert_eq!(snapshots[1].1[0]["max_donation_id"], "101");
}
