/// End-to-end tests for the CLI
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const FIXTURE: &str = "tests/fixtures/acme.context.yml";

mod exit_code_tests {
    use super::*;

    /// Exit code 0: --help should return success
    #[test]
    fn test_exit_code_help() {
        cargo_bin_cmd!("cms-stack").arg("--help").assert().code(0);
    }

    /// Exit code 0: --version should return success
    #[test]
    fn test_exit_code_version() {
        cargo_bin_cmd!("cms-stack").arg("--version").assert().code(0);
    }

    /// Exit code 2: no subcommand
    #[test]
    fn test_exit_code_missing_subcommand() {
        cargo_bin_cmd!("cms-stack").assert().code(2);
    }

    /// Exit code 2: Invalid format value
    #[test]
    fn test_exit_code_invalid_format() {
        cargo_bin_cmd!("cms-stack")
            .args(["--context", FIXTURE, "synth", "-f", "markdown"])
            .assert()
            .code(2);
    }

    /// Exit code 2: override without '='
    #[test]
    fn test_exit_code_malformed_override() {
        cargo_bin_cmd!("cms-stack")
            .args(["synth", "-c", "applicationName"])
            .assert()
            .code(2);
    }

    /// Exit code 3: nothing configured
    #[test]
    fn test_exit_code_missing_context() {
        let temp_dir = TempDir::new().unwrap();
        cargo_bin_cmd!("cms-stack")
            .current_dir(temp_dir.path())
            .args(["synth", "--no-lookups"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains(
                "Missing required context value: applicationName",
            ));
    }

    /// Exit code 3: explicit context file that does not exist
    #[test]
    fn test_exit_code_context_file_not_found() {
        cargo_bin_cmd!("cms-stack")
            .args(["--context", "/nonexistent/cms-stack.context.yml", "synth"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Failed to read file"));
    }

    /// Exit code 3: invalid CIDR in the allow-list
    #[test]
    fn test_exit_code_invalid_cidr() {
        cargo_bin_cmd!("cms-stack")
            .args([
                "--context",
                FIXTURE,
                "synth",
                "-c",
                "authorizedIPsForAdminAccess=88.121.146.23/33",
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("88.121.146.23/33"));
    }

    /// Exit code 3: --no-lookups needs a hosted zone ID
    #[test]
    fn test_exit_code_no_lookups_without_zone_id() {
        let temp_dir = TempDir::new().unwrap();
        cargo_bin_cmd!("cms-stack")
            .current_dir(temp_dir.path())
            .args([
                "synth",
                "--no-lookups",
                "-c",
                "applicationName=acme",
                "-c",
                "hostedZoneDomainName=example.com",
                "-c",
                "containerImage=strapi/strapi:latest",
                "-c",
                "authorizedIPsForAdminAccess=88.121.146.23/32",
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("hostedZoneId"));
    }
}

mod synth_tests {
    use super::*;

    #[test]
    fn test_synth_json_to_stdout() {
        let output = cargo_bin_cmd!("cms-stack")
            .args(["--context", FIXTURE, "synth"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Using hosted zone Z0123ABC"))
            .get_output()
            .stdout
            .clone();

        let template: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let resources = &template["Resources"];
        assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(
            resources["DatabaseCredentialsSecret"]["Properties"]["Name"],
            "acme-credentials"
        );
        assert_eq!(
            resources["Certificate"]["Properties"]["DomainName"],
            "acme.example.com"
        );
        assert!(resources["ServiceHttpRedirectListener"].is_object());
    }

    #[test]
    fn test_synth_yaml() {
        cargo_bin_cmd!("cms-stack")
            .args(["--context", FIXTURE, "synth", "--format", "yaml"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Type: AWS::ECS::Service"))
            .stdout(predicate::str::contains("acme-strapi-secret"));
    }

    #[test]
    fn test_synth_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("template.json");

        cargo_bin_cmd!("cms-stack")
            .args(["--context", FIXTURE, "synth", "-o"])
            .arg(&output_path)
            .assert()
            .success()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("✅ Output complete"));

        let content = fs::read_to_string(&output_path).unwrap();
        let template: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(template["Resources"]["SiteRecordAaaa"].is_object());
    }

    #[test]
    fn test_overrides_take_precedence_over_file() {
        cargo_bin_cmd!("cms-stack")
            .args([
                "--context",
                FIXTURE,
                "synth",
                "-c",
                "applicationName=shop",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("shop-credentials"))
            .stdout(predicate::str::contains("shop.example.com"));
    }

    #[test]
    fn test_context_file_is_discovered_in_working_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::copy(FIXTURE, temp_dir.path().join("cms-stack.context.yml")).unwrap();

        cargo_bin_cmd!("cms-stack")
            .current_dir(temp_dir.path())
            .arg("synth")
            .assert()
            .success()
            .stdout(predicate::str::contains("acme-credentials"));
    }

    #[test]
    fn test_unknown_context_field_warns() {
        let temp_dir = TempDir::new().unwrap();
        let context = fs::read_to_string(FIXTURE).unwrap() + "extraKey: 1\n";
        let path = temp_dir.path().join("ctx.yml");
        fs::write(&path, context).unwrap();

        cargo_bin_cmd!("cms-stack")
            .arg("--context")
            .arg(&path)
            .arg("synth")
            .assert()
            .success()
            .stderr(predicate::str::contains(
                "Unknown context field 'extraKey' will be ignored",
            ));
    }

    #[test]
    fn test_empty_allow_list_warns() {
        cargo_bin_cmd!("cms-stack")
            .args([
                "--context",
                FIXTURE,
                "synth",
                "-c",
                "authorizedIPsForAdminAccess=",
            ])
            .assert()
            .success()
            .stderr(predicate::str::contains("authorizedIPsForAdminAccess is empty"))
            .stdout(predicate::str::contains("ServiceAdminDenyRule"))
            .stdout(predicate::str::contains("ServiceAdminAllowRule").not());
    }
}

mod db_config_tests {
    use super::*;

    #[test]
    fn test_db_config_redacts_password() {
        cargo_bin_cmd!("cms-stack")
            .arg("db-config")
            .env("DATABASE_HOST", "acme.cluster.eu-west-3.rds.amazonaws.com")
            .env("DATABASE_PORT", "5432")
            .env("DATABASE_NAME", "acme")
            .env(
                "DATABASE_CREDENTIALS",
                r#"{"username":"strapi","password":"s3cr3t-value"}"#,
            )
            .env_remove("DATABASE_SSL")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"user\": \"strapi\""))
            .stdout(predicate::str::contains("\"ssl\": false"))
            .stdout(predicate::str::contains("s3cr3t-value").not());
    }

    #[test]
    fn test_db_config_missing_host() {
        cargo_bin_cmd!("cms-stack")
            .arg("db-config")
            .env_remove("DATABASE_HOST")
            .env("DATABASE_PORT", "5432")
            .env("DATABASE_NAME", "acme")
            .assert()
            .code(3)
            .stderr(predicate::str::contains("DATABASE_HOST"));
    }
}
