//! Tests for service definitions and submission
//!
//! These tests verify:
//! - Definition contents and naming
//! - Submission against a mocked services API
//! - Service deletion

use super::*;
use crate::error::YarnError;
use crate::testing::{test_session, BASIC_AUTH};
use chrono::{TimeZone, Utc};
use mockito::Matcher;
use serde_json::json;

fn postgres_request() -> LaunchRequest {
    let mut request = LaunchRequest::new(
        "airbyte/source-postgres",
        "read --config /data/config.json --catalog /data/catalog.json",
        "/mnt/shared/run-1",
        "/data",
    );
    request.tag = "3.2.1".to_string();
    request
}

mod definition_tests {
    use super::*;

    #[test]
    fn test_service_name_is_timestamped() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(
            service_name(&postgres_request(), now),
            "airbyte-source-postgres-read-20240305140709"
        );
    }

    #[test]
    fn test_service_name_with_suffix_is_sanitized() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let mut request = postgres_request();
        request.name_suffix = Some("tmpAB_c".to_string());

        assert_eq!(
            service_name(&request, now),
            "airbyte-source-postgres-read-20240305140709-tmpab-c"
        );
    }

    #[test]
    fn test_service_name_is_bounded() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let mut request = postgres_request();
        request.name_suffix = Some("x".repeat(30) + "--" + &"y".repeat(30));

        let name = service_name(&request, now);
        assert!(name.len() <= 63);
        assert!(!name.ends_with('-'));
        assert!(!name.contains("--"));
        assert!(name.starts_with("airbyte-20240305140709-xxx"));
    }

    #[test]
    fn test_long_image_keeps_timestamp_and_suffix() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let mut first = LaunchRequest::new(
            "airbyte/source-google-analytics-data-api",
            "read --config /data/config.json",
            "/mnt/shared",
            "/data",
        );
        let mut second = first.clone();
        first.name_suffix = Some("tmpa1b2c3d4".to_string());
        second.name_suffix = Some("tmpz9y8x7w6".to_string());

        let first = service_name(&first, now);
        let second = service_name(&second, now);

        assert_ne!(first, second);
        assert!(first.len() <= 63);
        assert!(first.starts_with("airbyte-source-google"));
        assert!(first.ends_with("-20240305140709-tmpa1b2c3d4"));
        assert!(second.ends_with("-20240305140709-tmpz9y8x7w6"));
        assert!(!first.contains("--"));
    }

    #[test]
    fn test_definition_contents() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let definition = ServiceDefinition::build(&postgres_request(), now);

        assert_eq!(definition.version, "1.0");
        assert_eq!(definition.queue, "default");
        assert_eq!(definition.components.len(), 1);

        let component = &definition.components[0];
        assert_eq!(component.name, "airbyte-container-source-postgres");
        assert_eq!(component.number_of_containers, 1);
        assert_eq!(component.restart_policy, "NEVER");
        assert_eq!(component.artifact.id, "airbyte/source-postgres:3.2.1");
        assert_eq!(component.artifact.kind, "DOCKER");
        assert_eq!(
            component.launch_command,
            "\"python main.py read --config /data/config.json --catalog /data/catalog.json > /data/stdout\""
        );
        assert_eq!(component.resource.cpus, 2);
        assert_eq!(component.resource.memory, "1024");

        let env = &component.configuration.env;
        assert_eq!(
            env["YARN_CONTAINER_RUNTIME_DOCKER_MOUNTS"],
            "/mnt/shared/run-1:/data:rw"
        );
        assert_eq!(env["YARN_CONTAINER_RUNTIME_DOCKER_RUN_OVERRIDE_DISABLE"], "true");

        let properties = &component.configuration.properties;
        assert_eq!(properties["yarn.service.default-readiness-check.enabled"], "false");
        assert_eq!(properties["dns.check.enabled"], "false");
        assert!(component.configuration.files.is_empty());

        let service_properties = &definition.configuration.properties;
        assert_eq!(service_properties["yarn.service.am-restart.max-attempts"], json!(1));
        assert_eq!(service_properties["yarn.dispatcher.drain-events.timeout"], json!(0));
    }

    #[test]
    fn test_definition_ships_config_files() {
        let mut request = postgres_request();
        request.connector_config = Some(json!({"host": "db", "port": 5432}));
        request.catalog = Some(json!({"streams": []}));

        let definition = ServiceDefinition::build(&request, Utc::now());
        let files = &definition.components[0].configuration.files;

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].kind, "JSON");
        assert_eq!(files[0].dest_file, "/data/config.json");
        assert_eq!(files[0].properties["port"], json!(5432));
        assert_eq!(files[1].dest_file, "/data/catalog.json");
    }

    #[test]
    fn test_definition_serializes_yarn_field_names() {
        let definition = ServiceDefinition::build(&postgres_request(), Utc::now());
        let value = serde_json::to_value(&definition).unwrap();

        assert_eq!(value["components"][0]["artifact"]["type"], "DOCKER");
        assert!(value["components"][0]["configuration"]
            .get("files")
            .is_none());
    }
}

mod submission_tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_returns_service_uri() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/app/v1/services")
            .match_header("authorization", BASIC_AUTH)
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "queue": "default",
                "version": "1.0",
                "configuration": {"properties": {"yarn.service.am-restart.max-attempts": 1}}
            })))
            .with_status(202)
            .with_body(r#"{"uri": "/v1/services/airbyte-source-postgres-read", "diagnostics": "Application ID: application_1_0001"}"#)
            .create_async()
            .await;

        let submitter = ServiceSubmitter::new(test_session(&server.url()));
        let service = submitter.submit(&postgres_request()).await.unwrap();

        assert_eq!(service.uri, "/v1/services/airbyte-source-postgres-read");
        assert!(service.name.starts_with("airbyte-source-postgres-read-"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_non_2xx_is_submission_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/app/v1/services")
            .with_status(500)
            .with_body("queue full")
            .create_async()
            .await;

        let submitter = ServiceSubmitter::new(test_session(&server.url()));
        let err = submitter.submit(&postgres_request()).await.unwrap_err();

        match err {
            YarnError::Submission { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "queue full");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_without_uri_names_created_service() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/app/v1/services")
            .with_status(202)
            .with_body(r#"{"diagnostics": "accepted"}"#)
            .create_async()
            .await;

        let submitter = ServiceSubmitter::new(test_session(&server.url()));
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let definition = ServiceDefinition::build(&postgres_request(), now);
        let err = submitter.submit_definition(&definition).await.unwrap_err();

        assert!(matches!(err, YarnError::MalformedSubmission { .. }));
        assert_eq!(
            err.created_service(),
            Some("airbyte-source-postgres-read-20240305140709")
        );
    }

    #[tokio::test]
    async fn test_submit_undecodable_body_names_created_service() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/app/v1/services")
            .with_status(201)
            .with_body("<html>created</html>")
            .create_async()
            .await;

        let submitter = ServiceSubmitter::new(test_session(&server.url()));
        let err = submitter.submit(&postgres_request()).await.unwrap_err();

        let name = err.created_service().unwrap();
        assert!(name.starts_with("airbyte-source-postgres-read-"));
    }

    #[tokio::test]
    async fn test_rejected_submission_leaves_no_service() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/app/v1/services")
            .with_status(400)
            .with_body("bad definition")
            .create_async()
            .await;

        let submitter = ServiceSubmitter::new(test_session(&server.url()));
        let err = submitter.submit(&postgres_request()).await.unwrap_err();
        assert!(err.created_service().is_none());
    }

    #[tokio::test]
    async fn test_delete_service() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/app/v1/services/airbyte-svc")
            .match_header("authorization", BASIC_AUTH)
            .with_status(200)
            .create_async()
            .await;

        let submitter = ServiceSubmitter::new(test_session(&server.url()));
        let service = ServiceRef {
            name: "airbyte-svc".to_string(),
            uri: "/v1/services/airbyte-svc".to_string(),
        };
        tokio_test::assert_ok!(submitter.delete(&service).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_missing_service_is_ok() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/app/v1/services/airbyte-svc")
            .with_status(404)
            .create_async()
            .await;

        let submitter = ServiceSubmitter::new(test_session(&server.url()));
        tokio_test::assert_ok!(submitter.delete_named("airbyte-svc").await);
    }

    #[tokio::test]
    async fn test_delete_rejected_is_cleanup_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/app/v1/services/airbyte-svc")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let submitter = ServiceSubmitter::new(test_session(&server.url()));
        let service = ServiceRef {
            name: "airbyte-svc".to_string(),
            uri: "/v1/services/airbyte-svc".to_string(),
        };
        let err = submitter.delete(&service).await.unwrap_err();
        assert!(matches!(err, YarnError::Cleanup { .. }));
    }
}
