use predicates::prelude::*;

use crate::common::{ServiceFixture, TestProject};

#[test]
fn test_missing_service_file() {
    let project = TestProject::new();

    project
        .resnames_command()
        .arg("env")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Service definition not found"))
        .stderr(predicate::str::contains("--service"));
}

#[test]
fn test_explicit_service_path() {
    let project = TestProject::new();
    let path = project.project_path().join("nested").join("api.yml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, ServiceFixture::basic().content).unwrap();

    project
        .resnames_command()
        .arg("--service")
        .arg(&path)
        .args(["resolve", "name:UserTable"])
        .assert()
        .success()
        .stdout("\"svc-user-table-dev\"\n");
}

#[test]
fn test_unknown_type_fails_by_default() {
    let project = TestProject::with_fixture(&ServiceFixture::unknown_type());

    project
        .resnames_command()
        .arg("env")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing name strategy for AWS::Foo::Bar"));
}

#[test]
fn test_unknown_type_skipped_by_global_config() {
    let project = TestProject::with_fixture(&ServiceFixture::unknown_type());
    project.write_config("unknown_types = \"skip\"\n");

    project
        .resnames_command()
        .arg("names")
        .assert()
        .success()
        .stdout(predicate::str::contains("No named resources found."));
}

#[test]
fn test_duplicate_environment_key() {
    let project = TestProject::with_service(
        r"
service: svc
resources:
  Resources:
    UserTable:
      Type: AWS::DynamoDB::Table
    userTable:
      Type: AWS::DynamoDB::Table
",
    );

    project
        .resnames_command()
        .arg("env")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Environment key 'USER_TABLE'"));
}

#[test]
fn test_invalid_yaml() {
    let project = TestProject::with_service("service: [unterminated\n");

    project
        .resnames_command()
        .arg("env")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid service definition"));
}

#[test]
fn test_unresolvable_naming_input() {
    let project = TestProject::with_service(
        r"
service: svc
provider:
  stage: ${env:RESNAMES_TEST_UNSET_STAGE}
",
    );

    project
        .resnames_command()
        .env_remove("RESNAMES_TEST_UNSET_STAGE")
        .arg("env")
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider.stage"));
}
