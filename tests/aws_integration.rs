//! Integration tests for the AWS session and SDK backend using wiremock
//!
//! The SDK is pointed at a mock server through `endpoint_url`, so these
//! tests exercise real request signing, serialization and response parsing.

use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_sts::config::Credentials;
use aws_types::region::Region;
use aws_types::SdkConfig;
use awscensus::aws::auth::SessionError;
use awscensus::aws::client::{format_aws_error, AwsBackend, AwsSession};
use awscensus::resource::{count_listing, ListRequest};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CALLER_IDENTITY: &str = r#"<GetCallerIdentityResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <GetCallerIdentityResult>
    <Arn>arn:aws:iam::123456789012:user/auditor</Arn>
    <UserId>AIDAEXAMPLEUSERID</UserId>
    <Account>123456789012</Account>
  </GetCallerIdentityResult>
  <ResponseMetadata>
    <RequestId>01234567-89ab-cdef-0123-456789abcdef</RequestId>
  </ResponseMetadata>
</GetCallerIdentityResponse>"#;

const INVALID_TOKEN: &str = r#"<ErrorResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <Error>
    <Type>Sender</Type>
    <Code>InvalidClientTokenId</Code>
    <Message>The security token included in the request is invalid.</Message>
  </Error>
  <RequestId>01234567-89ab-cdef-0123-456789abcdef</RequestId>
</ErrorResponse>"#;

const OWNED_SNAPSHOTS: &str = r#"<DescribeSnapshotsResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
  <requestId>01234567-89ab-cdef-0123-456789abcdef</requestId>
  <snapshotSet>
    <item><snapshotId>snap-0001</snapshotId><ownerId>123456789012</ownerId></item>
    <item><snapshotId>snap-0002</snapshotId><ownerId>123456789012</ownerId></item>
  </snapshotSet>
</DescribeSnapshotsResponse>"#;

/// SDK config routed at the mock server with static test credentials
async fn mock_config(server: &MockServer) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .endpoint_url(server.uri())
        .credentials_provider(Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
            None,
            None,
            "test",
        ))
        .retry_config(RetryConfig::disabled())
        .load()
        .await
}

fn xml(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("content-type", "text/xml")
        .set_body_string(body)
}

fn amz_json(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("content-type", "application/x-amz-json-1.0")
        .set_body_string(body.to_string())
}

/// Session establishment
mod session_tests {
    use super::*;

    /// Valid credentials resolve the account ID
    #[tokio::test]
    async fn test_session_resolves_account_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("Action=GetCallerIdentity"))
            .respond_with(xml(200, CALLER_IDENTITY))
            .expect(1)
            .mount(&server)
            .await;

        let session = AwsSession::from_config(mock_config(&server).await)
            .await
            .expect("Session should be established");

        assert_eq!(session.account_id(), "123456789012");
    }

    /// Rejected credentials surface as a credential error
    #[tokio::test]
    async fn test_rejected_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("Action=GetCallerIdentity"))
            .respond_with(xml(403, INVALID_TOKEN))
            .mount(&server)
            .await;

        let result = AwsSession::from_config(mock_config(&server).await).await;

        match result {
            Err(SessionError::Credentials(source)) => {
                assert!(source.to_string().contains("caller identity"));
            }
            Err(other) => panic!("Expected credential error, got {other}"),
            Ok(_) => panic!("Expected credential error, got a session"),
        }
    }
}

/// Listing calls through the SDK backend
mod backend_tests {
    use super::*;

    /// DynamoDB ListTables follows LastEvaluatedTableName until exhausted
    #[tokio::test]
    async fn test_dynamodb_pagination() {
        let server = MockServer::start().await;

        // Second page
        Mock::given(method("POST"))
            .and(header("x-amz-target", "DynamoDB_20120810.ListTables"))
            .and(body_partial_json(json!({"ExclusiveStartTableName": "orders"})))
            .respond_with(amz_json(200, json!({"TableNames": ["sessions"]})))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;

        // First page
        Mock::given(method("POST"))
            .and(header("x-amz-target", "DynamoDB_20120810.ListTables"))
            .respond_with(amz_json(
                200,
                json!({"TableNames": ["accounts", "orders"], "LastEvaluatedTableName": "orders"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let backend = AwsBackend::new(mock_config(&server).await);
        let request = ListRequest {
            service: "dynamodb",
            sdk_method: "list_tables",
            region: "eu-west-1",
            owner: None,
        };

        let count = count_listing(&backend, &request)
            .await
            .expect("Listing should succeed");
        assert_eq!(count, 3);
    }

    /// Owner-filtered snapshot listings send the account ID
    #[tokio::test]
    async fn test_snapshots_sent_with_owner() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("Action=DescribeSnapshots"))
            .and(body_string_contains("123456789012"))
            .respond_with(xml(200, OWNED_SNAPSHOTS))
            .expect(1)
            .mount(&server)
            .await;

        let backend = AwsBackend::new(mock_config(&server).await);
        let request = ListRequest {
            service: "ec2",
            sdk_method: "describe_snapshots",
            region: "us-west-2",
            owner: Some("123456789012"),
        };

        let count = count_listing(&backend, &request)
            .await
            .expect("Listing should succeed");
        assert_eq!(count, 2);
    }

    /// Access errors propagate with a readable message
    #[tokio::test]
    async fn test_access_denied_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("x-amz-target", "DynamoDB_20120810.ListTables"))
            .respond_with(amz_json(
                400,
                json!({
                    "__type": "com.amazonaws.dynamodb.v20120810#AccessDeniedException",
                    "message": "User is not authorized to perform: dynamodb:ListTables"
                }),
            ))
            .mount(&server)
            .await;

        let backend = AwsBackend::new(mock_config(&server).await);
        let request = ListRequest {
            service: "dynamodb",
            sdk_method: "list_tables",
            region: "us-east-1",
            owner: None,
        };

        let err = count_listing(&backend, &request)
            .await
            .expect_err("Listing should fail");

        assert!(format!("{:#}", err).contains("dynamodb:list_tables in us-east-1"));
        assert!(format_aws_error(&err).starts_with("Permission denied"));
    }
}
