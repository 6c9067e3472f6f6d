//! Integration tests for YAML configuration and credential file loading.
//!
//! Uses figment::Jail so file and env var changes stay sandboxed.

use figment::Jail;
use qapps_core::{AppError, CredentialSource, Credentials, ExportConfig};

#[test]
fn loads_sections_from_yaml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.yml",
            r#"
aws:
  region: eu-west-1
  expected_account_id: "123456789012"
export:
  include_empty_apps: false
  formats:
    csv: true
    json: false
  filename_pattern: "qapps_{region}_{date}"
retrieval:
  max_qapps_per_page: 25
  retry:
    max_attempts: 5
output:
  columns:
    description: false
    categories: false
logging:
  verbose: false
"#,
        )?;

        let config = ExportConfig::load("config.yml").expect("config should load");

        assert_eq!(config.aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(
            config.aws.expected_account_id.as_deref(),
            Some("123456789012")
        );
        assert!(!config.export.include_empty_apps);
        assert!(config.export.formats.csv);
        assert!(!config.export.formats.json);
        assert_eq!(config.export.filename_pattern, "qapps_{region}_{date}");
        assert_eq!(config.retrieval.max_qapps_per_page, 25);
        assert_eq!(config.retrieval.retry.max_attempts, 5);
        // untouched keys keep their defaults
        assert_eq!(config.retrieval.max_applications_per_page, 50);
        assert_eq!(config.retrieval.retry.initial_backoff_ms, 500);
        assert_eq!(config.output.columns.get("description"), Some(&false));
        assert_eq!(config.output.columns.get("categories"), Some(&false));
        assert!(!config.logging.verbose);
        assert!(config.logging.show_permission_warnings);
        Ok(())
    });
}

#[test]
fn missing_file_uses_defaults() {
    Jail::expect_with(|_jail| {
        let config = ExportConfig::load("does-not-exist.yml").expect("defaults should load");
        assert_eq!(config, ExportConfig::default());
        Ok(())
    });
}

#[test]
fn env_overrides_yaml() {
    Jail::expect_with(|jail| {
        jail.create_file("config.yml", "aws:\n  region: eu-west-1\n")?;
        jail.set_env("QAPPS_AWS__REGION", "ap-southeast-2");
        jail.set_env("QAPPS_EXPORT__INCLUDE_EMPTY_APPS", "false");

        let config = ExportConfig::load("config.yml").expect("config should load");
        assert_eq!(config.aws.region.as_deref(), Some("ap-southeast-2"));
        assert!(!config.export.include_empty_apps);
        Ok(())
    });
}

#[test]
fn account_id_from_env_stays_a_string() {
    Jail::expect_with(|jail| {
        jail.set_env("QAPPS_AWS__EXPECTED_ACCOUNT_ID", "123456789012");
        let config = ExportConfig::load("config.yml").expect("config should load");
        assert_eq!(config.aws.expected_account_id.as_deref(), Some("123456789012"));

        jail.set_env("QAPPS_AWS__EXPECTED_ACCOUNT_ID", "012345678901");
        let config = ExportConfig::load("config.yml").expect("config should load");
        assert_eq!(config.aws.expected_account_id.as_deref(), Some("012345678901"));
        Ok(())
    });
}

#[test]
fn unquoted_account_id_in_yaml() {
    Jail::expect_with(|jail| {
        jail.create_file("config.yml", "aws:\n  expected_account_id: 123456789012\n")?;
        let config = ExportConfig::load("config.yml").expect("config should load");
        assert_eq!(config.aws.expected_account_id.as_deref(), Some("123456789012"));

        jail.create_file("config.yml", "aws:\n  expected_account_id: \"012345678901\"\n")?;
        let config = ExportConfig::load("config.yml").expect("config should load");
        assert_eq!(config.aws.expected_account_id.as_deref(), Some("012345678901"));
        Ok(())
    });
}

#[test]
fn malformed_account_id_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file("config.yml", "aws:\n  expected_account_id: \"1234-5678\"\n")?;
        assert!(matches!(
            ExportConfig::load("config.yml"),
            Err(AppError::Config(_))
        ));
        Ok(())
    });
}

#[test]
fn malformed_yaml_is_an_error() {
    Jail::expect_with(|jail| {
        jail.create_file("config.yml", "export: [unterminated\n")?;
        let result = ExportConfig::load("config.yml");
        assert!(matches!(result, Err(AppError::Config(_))));
        Ok(())
    });
}

#[test]
fn invalid_values_are_rejected_after_merge() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.yml",
            "export:\n  formats:\n    csv: false\n    json: false\n",
        )?;
        assert!(ExportConfig::load("config.yml").is_err());
        Ok(())
    });
}

#[test]
fn reads_credentials_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(
        &path,
        "# exported from the console\n\
         AWS_ACCESS_KEY_ID=AKIAEXAMPLE\n\
         AWS_SECRET_ACCESS_KEY=wJalrXUtnFEMI\n\
         AWS_SESSION_TOKEN=\"session-token\"\n\
         AWS_REGION=us-west-2\n\
         AWS_ACCOUNT_ID=123456789012\n\
         UNRELATED=ignored\n",
    )
    .unwrap();

    let creds = Credentials::from_env_file(&path).unwrap();
    assert_eq!(creds.access_key_id.as_deref(), Some("AKIAEXAMPLE"));
    assert_eq!(creds.session_token.as_deref(), Some("session-token"));
    assert_eq!(creds.region.as_deref(), Some("us-west-2"));
    assert_eq!(creds.account_id.as_deref(), Some("123456789012"));

    let source = creds.source(&ExportConfig::default()).unwrap();
    assert!(matches!(source, CredentialSource::Static { .. }));
}

#[test]
fn credentials_file_profile_beats_static_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(
        &path,
        "AWS_PROFILE=qbusiness-admin\n\
         AWS_ACCESS_KEY_ID=AKIAEXAMPLE\n\
         AWS_SECRET_ACCESS_KEY=wJalrXUtnFEMI\n",
    )
    .unwrap();

    let creds = Credentials::from_env_file(&path).unwrap();
    assert_eq!(
        creds.source(&ExportConfig::default()).unwrap(),
        CredentialSource::Profile("qbusiness-admin".to_string())
    );
}

#[test]
fn missing_credentials_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let creds = Credentials::from_env_file(dir.path().join("missing.env")).unwrap();
    assert_eq!(creds, Credentials::default());
}
