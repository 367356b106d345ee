use predicates::prelude::*;
use serde_json::{Value, json};

use crate::common::{ServiceFixture, TestProject};

#[test]
fn test_render_json_injects_names_and_environment() {
    let project = TestProject::with_fixture(&ServiceFixture::with_references());

    let stdout = project.run_ok(&["render", "-f", "json"]);
    let service: Value = serde_json::from_str(&stdout).unwrap();

    let resources = &service["resources"]["Resources"];
    assert_eq!(resources["UserTable"]["Properties"]["TableName"], "svc-user-table-dev");
    assert_eq!(resources["OrderTopic"]["Properties"]["TopicName"], "svc-order-topic-dev");

    let environment = &service["provider"]["environment"];
    assert_eq!(environment["ORDERS_TOPIC_NAME"], "svc-order-topic-dev");
    assert_eq!(environment["USER_TABLE"], "svc-user-table-dev");
    assert_eq!(environment["ORDER_TOPIC_ARN"]["Fn::Join"][0], ":");

    assert_eq!(service["functions"]["worker"]["environment"]["TABLE"], "svc-user-table-dev");
}

#[test]
fn test_render_yaml_keeps_explicit_names() {
    let project = TestProject::with_service(
        r"
service: svc
resources:
  Resources:
    Legacy:
      Type: AWS::DynamoDB::Table
      Properties:
        TableName: legacy-users
",
    );

    let stdout = project.run_ok(&["render"]);
    let service: Value = serde_yaml::from_str(&stdout).unwrap();
    assert_eq!(service["resources"]["Resources"]["Legacy"]["Properties"]["TableName"], json!("legacy-users"));
    assert_eq!(service["provider"]["environment"]["LEGACY"], json!("legacy-users"));
}

#[test]
fn test_render_writes_output_file() {
    let project = TestProject::with_fixture(&ServiceFixture::basic());
    let output = project.project_path().join("rendered.json");

    project
        .resnames_command()
        .args(["render", "--format", "json", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let service: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(
        service["resources"]["Resources"]["JobsQueue"]["Properties"]["QueueName"],
        "svc-jobs-queue-dev"
    );
}

#[test]
fn test_render_custom_strategy_from_service() {
    let project = TestProject::with_service(
        r"
service: svc
custom:
  resourceNames:
    strategies:
      AWS::Foo::Bar:
        tag: Name
resources:
  Resources:
    Thing:
      Type: AWS::Foo::Bar
",
    );

    let stdout = project.run_ok(&["render", "-f", "json"]);
    let service: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        service["resources"]["Resources"]["Thing"]["Properties"]["Tags"],
        json!([{"Key": "Name", "Value": "svc-thing-dev"}])
    );
}

#[test]
fn test_render_rejects_unknown_format() {
    let project = TestProject::with_fixture(&ServiceFixture::basic());

    project
        .resnames_command()
        .args(["render", "--format", "toml"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid format 'toml'"));
}
