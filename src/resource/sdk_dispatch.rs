//! SDK Dispatch
//!
//! Maps (service, sdk_method) pairs from the counter registry to concrete
//! AWS SDK listing calls, returning one page at a time.

use super::fetcher::{ListRequest, Page};
use anyhow::{Context, Result};
use aws_sdk_sts::error::DisplayErrorContext;
use aws_types::region::Region;
use aws_types::SdkConfig;

/// Every (service, sdk_method) pair this module can execute
pub const SUPPORTED_METHODS: &[(&str, &str)] = &[
    ("ec2", "describe_instances"),
    ("ec2", "describe_volumes"),
    ("ec2", "describe_security_groups"),
    ("ec2", "describe_snapshots"),
    ("ec2", "describe_images"),
    ("ec2", "describe_vpcs"),
    ("ec2", "describe_subnets"),
    ("ec2", "describe_vpc_peering_connections"),
    ("ec2", "describe_network_acls"),
    ("ec2", "describe_addresses"),
    ("ec2", "describe_nat_gateways"),
    ("ec2", "describe_vpc_endpoints"),
    ("autoscaling", "describe_auto_scaling_groups"),
    ("autoscaling", "describe_launch_configurations"),
    ("elb", "describe_load_balancers"),
    ("elbv2", "describe_load_balancers"),
    ("s3", "list_buckets"),
    ("iam", "list_users"),
    ("iam", "list_groups"),
    ("iam", "list_roles"),
    ("iam", "list_local_policies"),
    ("iam", "list_saml_providers"),
    ("lambda", "list_functions"),
    ("glacier", "list_vaults"),
    ("events", "list_rules"),
    ("config", "describe_config_rules"),
    ("cloudtrail", "describe_trails"),
    ("sns", "list_topics"),
    ("kms", "list_keys"),
    ("dynamodb", "list_tables"),
    ("rds", "describe_db_instances"),
];

/// Whether a (service, sdk_method) pair can be dispatched
pub fn is_supported(service: &str, method: &str) -> bool {
    SUPPORTED_METHODS
        .iter()
        .any(|(s, m)| *s == service && *m == method)
}

/// Build a service client pinned to one region
macro_rules! regional_client {
    ($sdk:ident, $config:expr, $region:expr) => {
        $sdk::Client::from_conf(
            $sdk::config::Builder::from($config)
                .region(Region::new($region.to_string()))
                .build(),
        )
    };
}

/// Wrap an SDK error so the message includes the AWS error code
pub(crate) fn sdk_error<E>(err: E) -> anyhow::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    anyhow::Error::new(err).context(message)
}

fn owned_token(token: Option<&str>) -> Option<String> {
    token.map(|t| t.to_string())
}

/// Invoke one page of an AWS listing call
pub async fn invoke_sdk(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    page_token: Option<&str>,
) -> Result<Page> {
    tracing::debug!(
        "invoke_sdk: service={}, method={}, region={}, token={:?}",
        request.service,
        request.sdk_method,
        request.region,
        page_token
    );

    match request.service {
        "ec2" => invoke_ec2(config, request, page_token).await,
        "autoscaling" => invoke_autoscaling(config, request, page_token).await,
        "elb" => invoke_elb(config, request, page_token).await,
        "elbv2" => invoke_elbv2(config, request, page_token).await,
        "s3" => invoke_s3(config, request, page_token).await,
        "iam" => invoke_iam(config, request, page_token).await,
        "lambda" => invoke_lambda(config, request, page_token).await,
        "glacier" => invoke_glacier(config, request, page_token).await,
        "events" => invoke_events(config, request, page_token).await,
        "config" => invoke_config(config, request, page_token).await,
        "cloudtrail" => invoke_cloudtrail(config, request).await,
        "sns" => invoke_sns(config, request, page_token).await,
        "kms" => invoke_kms(config, request, page_token).await,
        "dynamodb" => invoke_dynamodb(config, request, page_token).await,
        "rds" => invoke_rds(config, request, page_token).await,
        _ => Err(anyhow::anyhow!("Unknown service: {}", request.service)),
    }
}

fn unknown_method(request: &ListRequest<'_>) -> anyhow::Error {
    anyhow::anyhow!(
        "Unknown {} method: {}",
        request.service,
        request.sdk_method
    )
}

// =============================================================================
// EC2
// =============================================================================

async fn invoke_ec2(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_ec2, config, request.region);
    let token = owned_token(token);

    match request.sdk_method {
        "describe_instances" => {
            let out = client
                .describe_instances()
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            let count = out
                .reservations()
                .iter()
                .map(|r| r.instances().len())
                .sum();
            Ok(Page::new(count, out.next_token()))
        }
        "describe_volumes" => {
            let out = client
                .describe_volumes()
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.volumes().len(), out.next_token()))
        }
        "describe_security_groups" => {
            let out = client
                .describe_security_groups()
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.security_groups().len(), out.next_token()))
        }
        "describe_snapshots" => {
            let owner = request
                .owner
                .context("describe_snapshots requires an owner account ID")?;
            let out = client
                .describe_snapshots()
                .owner_ids(owner)
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.snapshots().len(), out.next_token()))
        }
        "describe_images" => {
            let owner = request
                .owner
                .context("describe_images requires an owner account ID")?;
            let out = client
                .describe_images()
                .owners(owner)
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.images().len(), out.next_token()))
        }
        "describe_vpcs" => {
            let out = client
                .describe_vpcs()
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.vpcs().len(), out.next_token()))
        }
        "describe_subnets" => {
            let out = client
                .describe_subnets()
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.subnets().len(), out.next_token()))
        }
        "describe_vpc_peering_connections" => {
            let out = client
                .describe_vpc_peering_connections()
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.vpc_peering_connections().len(), out.next_token()))
        }
        "describe_network_acls" => {
            let out = client
                .describe_network_acls()
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.network_acls().len(), out.next_token()))
        }
        "describe_addresses" => {
            // Not paginated; only VPC-domain Elastic IPs
            let vpc_domain = aws_sdk_ec2::types::Filter::builder()
                .name("domain")
                .values("vpc")
                .build();
            let out = client
                .describe_addresses()
                .filters(vpc_domain)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::last(out.addresses().len()))
        }
        "describe_nat_gateways" => {
            let out = client
                .describe_nat_gateways()
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.nat_gateways().len(), out.next_token()))
        }
        "describe_vpc_endpoints" => {
            let out = client
                .describe_vpc_endpoints()
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.vpc_endpoints().len(), out.next_token()))
        }
        _ => Err(unknown_method(request)),
    }
}

// =============================================================================
// Auto Scaling / Load Balancing
// =============================================================================

async fn invoke_autoscaling(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_autoscaling, config, request.region);
    let token = owned_token(token);

    match request.sdk_method {
        "describe_auto_scaling_groups" => {
            let out = client
                .describe_auto_scaling_groups()
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.auto_scaling_groups().len(), out.next_token()))
        }
        "describe_launch_configurations" => {
            let out = client
                .describe_launch_configurations()
                .set_next_token(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.launch_configurations().len(), out.next_token()))
        }
        _ => Err(unknown_method(request)),
    }
}

async fn invoke_elb(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_elasticloadbalancing, config, request.region);

    match request.sdk_method {
        "describe_load_balancers" => {
            let out = client
                .describe_load_balancers()
                .set_marker(owned_token(token))
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(
                out.load_balancer_descriptions().len(),
                out.next_marker(),
            ))
        }
        _ => Err(unknown_method(request)),
    }
}

async fn invoke_elbv2(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_elasticloadbalancingv2, config, request.region);

    match request.sdk_method {
        "describe_load_balancers" => {
            let out = client
                .describe_load_balancers()
                .set_marker(owned_token(token))
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.load_balancers().len(), out.next_marker()))
        }
        _ => Err(unknown_method(request)),
    }
}

// =============================================================================
// Global services (S3, IAM)
// =============================================================================

async fn invoke_s3(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_s3, config, request.region);

    match request.sdk_method {
        "list_buckets" => {
            // Returns every bucket in the account regardless of region
            let out = client
                .list_buckets()
                .set_continuation_token(owned_token(token))
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.buckets().len(), out.continuation_token()))
        }
        _ => Err(unknown_method(request)),
    }
}

/// IAM only hands out a usable marker while IsTruncated is set
fn iam_next(truncated: bool, marker: Option<&str>) -> Option<&str> {
    if truncated {
        marker
    } else {
        None
    }
}

async fn invoke_iam(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_iam, config, request.region);
    let token = owned_token(token);

    match request.sdk_method {
        "list_users" => {
            let out = client
                .list_users()
                .set_marker(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(
                out.users().len(),
                iam_next(out.is_truncated(), out.marker()),
            ))
        }
        "list_groups" => {
            let out = client
                .list_groups()
                .set_marker(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(
                out.groups().len(),
                iam_next(out.is_truncated(), out.marker()),
            ))
        }
        "list_roles" => {
            let out = client
                .list_roles()
                .set_marker(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(
                out.roles().len(),
                iam_next(out.is_truncated(), out.marker()),
            ))
        }
        "list_local_policies" => {
            // Customer managed policies only; AWS managed ones are not account resources
            let out = client
                .list_policies()
                .scope(aws_sdk_iam::types::PolicyScopeType::Local)
                .set_marker(token)
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(
                out.policies().len(),
                iam_next(out.is_truncated(), out.marker()),
            ))
        }
        "list_saml_providers" => {
            let out = client
                .list_saml_providers()
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::last(out.saml_provider_list().len()))
        }
        _ => Err(unknown_method(request)),
    }
}

// =============================================================================
// Regional single-kind services
// =============================================================================

async fn invoke_lambda(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_lambda, config, request.region);

    match request.sdk_method {
        "list_functions" => {
            let out = client
                .list_functions()
                .set_marker(owned_token(token))
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.functions().len(), out.next_marker()))
        }
        _ => Err(unknown_method(request)),
    }
}

async fn invoke_glacier(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_glacier, config, request.region);

    match request.sdk_method {
        "list_vaults" => {
            // "-" selects the account owning the credentials
            let out = client
                .list_vaults()
                .account_id("-")
                .set_marker(owned_token(token))
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.vault_list().len(), out.marker()))
        }
        _ => Err(unknown_method(request)),
    }
}

async fn invoke_events(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_eventbridge, config, request.region);

    match request.sdk_method {
        "list_rules" => {
            let out = client
                .list_rules()
                .set_next_token(owned_token(token))
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.rules().len(), out.next_token()))
        }
        _ => Err(unknown_method(request)),
    }
}

async fn invoke_config(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_config, config, request.region);

    match request.sdk_method {
        "describe_config_rules" => {
            let out = client
                .describe_config_rules()
                .set_next_token(owned_token(token))
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.config_rules().len(), out.next_token()))
        }
        _ => Err(unknown_method(request)),
    }
}

async fn invoke_cloudtrail(config: &SdkConfig, request: &ListRequest<'_>) -> Result<Page> {
    let client = regional_client!(aws_sdk_cloudtrail, config, request.region);

    match request.sdk_method {
        "describe_trails" => {
            let out = client
                .describe_trails()
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::last(out.trail_list().len()))
        }
        _ => Err(unknown_method(request)),
    }
}

async fn invoke_sns(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_sns, config, request.region);

    match request.sdk_method {
        "list_topics" => {
            let out = client
                .list_topics()
                .set_next_token(owned_token(token))
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.topics().len(), out.next_token()))
        }
        _ => Err(unknown_method(request)),
    }
}

async fn invoke_kms(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_kms, config, request.region);

    match request.sdk_method {
        "list_keys" => {
            let out = client
                .list_keys()
                .set_marker(owned_token(token))
                .send()
                .await
                .map_err(sdk_error)?;
            let next = if out.truncated() {
                out.next_marker()
            } else {
                None
            };
            Ok(Page::new(out.keys().len(), next))
        }
        _ => Err(unknown_method(request)),
    }
}

async fn invoke_dynamodb(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_dynamodb, config, request.region);

    match request.sdk_method {
        "list_tables" => {
            let out = client
                .list_tables()
                .set_exclusive_start_table_name(owned_token(token))
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(
                out.table_names().len(),
                out.last_evaluated_table_name(),
            ))
        }
        _ => Err(unknown_method(request)),
    }
}

async fn invoke_rds(
    config: &SdkConfig,
    request: &ListRequest<'_>,
    token: Option<&str>,
) -> Result<Page> {
    let client = regional_client!(aws_sdk_rds, config, request.region);

    match request.sdk_method {
        "describe_db_instances" => {
            let out = client
                .describe_db_instances()
                .set_marker(owned_token(token))
                .send()
                .await
                .map_err(sdk_error)?;
            Ok(Page::new(out.db_instances().len(), out.marker()))
        }
        _ => Err(unknown_method(request)),
    }
}
