use predicates::prelude::*;

use crate::common::{ServiceFixture, TestProject};

#[test]
fn test_env_prints_computed_names() {
    let project = TestProject::with_fixture(&ServiceFixture::basic());

    let stdout = project.run_ok(&["env"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"LOG_LEVEL="info""#,
            r#"USER_TABLE="svc-user-table-dev""#,
            r#"JOBS_QUEUE_ARN="{\"Fn::GetAtt\":[\"JobsQueue\",\"Arn\"]}""#,
            r#"JOBS_QUEUE_URL="{\"Ref\":\"JobsQueue\"}""#,
            r#"JOBS_QUEUE="svc-jobs-queue-dev""#,
            r#"ORDER_TOPIC_ARN="{\"Fn::Join\":[\":\",[\"arn\",\"aws\",\"sns\",{\"Ref\":\"AWS::Region\"},{\"Ref\":\"AWS::AccountId\"},\"svc-order-topic-dev\"]]}""#,
            r#"ORDER_TOPIC="svc-order-topic-dev""#,
        ]
    );
}

#[test]
fn test_env_fifo_queue_with_prefix_and_stage() {
    let project = TestProject::with_fixture(&ServiceFixture::fifo_queue());

    project
        .resnames_command()
        .arg("env")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"MY_QUEUE_TWO="app-my-queue-two-prod.fifo""#))
        .stdout(predicate::str::contains(r#"MY_QUEUE_TWO_ARN="{\"Fn::GetAtt\":[\"MyQueueTwo\",\"Arn\"]}""#))
        .stdout(predicate::str::contains(r#"MY_QUEUE_TWO_URL="{\"Ref\":\"MyQueueTwo\"}""#));
}

#[test]
fn test_env_stage_flag_overrides_provider_stage() {
    let project = TestProject::with_fixture(&ServiceFixture::fifo_queue());

    project
        .resnames_command()
        .args(["--stage", "qa", "env"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"MY_QUEUE_TWO="app-my-queue-two-qa.fifo""#));
}

#[test]
fn test_env_resolves_references_in_provider_environment() {
    let project = TestProject::with_fixture(&ServiceFixture::with_references());

    let stdout = project.run_ok(&["env"]);
    assert!(stdout.starts_with("ORDERS_TOPIC_NAME=\"svc-order-topic-dev\"\n"), "{stdout}");
    assert!(stdout.contains("USER_TABLE=\"svc-user-table-dev\"\n"));
}

#[test]
fn test_env_logs_exposed_keys_to_stderr() {
    let project = TestProject::with_service(
        r"
service: svc
resources:
  Resources:
    UserTable:
      Type: AWS::DynamoDB::Table
",
    );

    project
        .resnames_command()
        .arg("env")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exposing").not())
        .stderr(predicate::str::contains("Exposing env USER_TABLE"));

    project
        .resnames_command()
        .args(["--quiet", "env"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_env_functions_merge_target_from_global_config() {
    let project = TestProject::with_fixture(&ServiceFixture::with_references());
    project.write_config("merge_target = \"functions\"\n");

    let stdout = project.run_ok(&["env"]);
    assert!(stdout.contains("USER_TABLE=\"svc-user-table-dev\""));

    let rendered = project.run_ok(&["render", "--format", "json"]);
    let service: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert!(service["provider"]["environment"].get("USER_TABLE").is_none());
    assert_eq!(
        service["functions"]["worker"]["environment"]["USER_TABLE"],
        "svc-user-table-dev"
    );
}

#[test]
fn test_env_tolerates_host_sources_outside_environment() {
    let project = TestProject::with_service(
        r"
service: svc
provider:
  environment:
    LOG_LEVEL: info
functions:
  api:
    handler: api.handler
    vpc: ${ssm:/network/vpc}
resources:
  Resources:
    UserTable:
      Type: AWS::DynamoDB::Table
",
    );

    let stdout = project.run_ok(&["env"]);
    assert_eq!(stdout, "LOG_LEVEL=\"info\"\nUSER_TABLE=\"svc-user-table-dev\"\n");
}
