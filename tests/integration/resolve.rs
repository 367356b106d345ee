use predicates::prelude::*;

use crate::common::{ServiceFixture, TestProject};

#[test]
fn test_resolve_single_name() {
    let project = TestProject::with_fixture(&ServiceFixture::basic());

    project
        .resnames_command()
        .args(["resolve", "name:UserTable"])
        .assert()
        .success()
        .stdout("\"svc-user-table-dev\"\n");
}

#[test]
fn test_resolve_topic_arn() {
    let project = TestProject::with_fixture(&ServiceFixture::basic());

    let stdout = project.run_ok(&["resolve", "topic:OrderTopic.arn"]);
    let arn: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(arn["Fn::Join"][1][5], "svc-order-topic-dev");
}

#[test]
fn test_resolve_several_addresses() {
    let project = TestProject::with_fixture(&ServiceFixture::basic());

    let stdout = project.run_ok(&["resolve", "name:JobsQueue", "topic:OrderTopic.topicName"]);
    assert_eq!(
        stdout,
        "name:JobsQueue = \"svc-jobs-queue-dev\"\ntopic:OrderTopic.topicName = \"svc-order-topic-dev\"\n"
    );
}

#[test]
fn test_resolve_unknown_topic_fails() {
    let project = TestProject::with_fixture(&ServiceFixture::basic());

    project
        .resnames_command()
        .args(["resolve", "topic:NoSuchTopic"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No such topic: 'NoSuchTopic'"));
}

#[test]
fn test_resolve_suggests_close_match() {
    let project = TestProject::with_fixture(&ServiceFixture::basic());

    project
        .resnames_command()
        .args(["resolve", "name:UserTabel"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Did you mean 'UserTable'?"));
}

#[test]
fn test_resolve_rejects_other_sources() {
    let project = TestProject::with_fixture(&ServiceFixture::basic());

    project
        .resnames_command()
        .args(["resolve", "self:service"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown variable source 'self'"));
}
