//! Shared AWS SDK configuration.

use aws_config::SdkConfig;
use tracing::debug;

/// Loads SDK configuration from the default credential chain.
///
/// An explicit region overrides whatever the environment or profile says.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    if let Some(region_str) = region {
        debug!("Using explicit region {region_str}");
        aws_config::from_env()
            .region(aws_config::Region::new(region_str.to_string()))
            .load()
            .await
    } else {
        aws_config::load_from_env().await
    }
}
