use predicates::prelude::*;
use serde_json::Value;

use crate::common::{ServiceFixture, TestProject};

#[test]
fn test_names_table() {
    let project = TestProject::with_fixture(&ServiceFixture::basic());

    project
        .resnames_command()
        .arg("names")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logical ID"))
        .stdout(predicate::str::contains("svc-user-table-dev"))
        .stdout(predicate::str::contains("JOBS_QUEUE"))
        .stdout(predicate::str::contains("3 resources"));
}

#[test]
fn test_names_json() {
    let project = TestProject::with_fixture(&ServiceFixture::basic());

    let stdout = project.run_ok(&["names", "--format", "json"]);
    let names: Value = serde_json::from_str(&stdout).unwrap();
    let names = names.as_array().unwrap();
    assert_eq!(names.len(), 3);
    assert_eq!(names[0]["logicalId"], "UserTable");
    assert_eq!(names[0]["resourceType"], "AWS::DynamoDB::Table");
    assert_eq!(names[0]["envKey"], "USER_TABLE");
    assert_eq!(names[0]["name"], "svc-user-table-dev");
}

#[test]
fn test_names_empty_service() {
    let project = TestProject::with_service("service: svc\n");

    project
        .resnames_command()
        .arg("names")
        .assert()
        .success()
        .stdout(predicate::str::contains("No named resources found."));
}
