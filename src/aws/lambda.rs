//! Lambda implementation of [`ComputeApi`].

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_lambda::Client;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::operation::get_function::GetFunctionError;
use aws_sdk_lambda::operation::update_function_code::UpdateFunctionCodeError;
use aws_sdk_lambda::operation::update_function_configuration::UpdateFunctionConfigurationError;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, FunctionCode, Runtime};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::error::{ConfigError, DeployError, RemoteError, Result};

use super::api::ComputeApi;
use super::types::{CodePackage, ConfigurationUpdate, CreateFunctionRequest, FunctionRecord};

/// Lambda client backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct LambdaClient {
    /// SDK client.
    client: Client,
}

impl LambdaClient {
    /// Creates a client from shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

/// Converts a size to the signed integer the Lambda API uses.
fn to_api_int(field: &str, value: Option<u32>) -> Result<Option<i32>> {
    value
        .map(|v| {
            i32::try_from(v).map_err(|_| {
                DeployError::Config(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("{v} is out of range"),
                })
            })
        })
        .transpose()
}

fn to_environment(variables: Option<&BTreeMap<String, String>>) -> Option<Environment> {
    variables.map(|vars| {
        Environment::builder()
            .set_variables(Some(vars.clone().into_iter().collect()))
            .build()
    })
}

fn to_function_code(code: &CodePackage) -> FunctionCode {
    match code {
        CodePackage::S3 { bucket, key } => FunctionCode::builder().s3_bucket(bucket).s3_key(key).build(),
        CodePackage::ZipFile(bytes) => FunctionCode::builder().zip_file(Blob::new(bytes.clone())).build(),
    }
}

fn from_api_int(value: Option<i32>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

#[async_trait]
impl ComputeApi for LambdaClient {
    async fn get_function(&self, name: &str) -> Result<Option<FunctionRecord>> {
        trace!("GetFunction {name}");
        match self.client.get_function().function_name(name).send().await {
            Ok(output) => {
                let config = output.configuration().ok_or_else(|| {
                    RemoteError::invalid_response("GetFunction", "response carried no configuration")
                })?;
                Ok(Some(FunctionRecord {
                    name: config.function_name().unwrap_or(name).to_string(),
                    arn: config.function_arn().map(str::to_string),
                    role: config.role().map(str::to_string),
                    runtime: config.runtime().map(|r| r.as_str().to_string()),
                    handler: config.handler().map(str::to_string),
                    memory_mb: from_api_int(config.memory_size()),
                    timeout_secs: from_api_int(config.timeout()),
                }))
            }
            Err(sdk_err) => {
                if sdk_err
                    .as_service_error()
                    .is_some_and(GetFunctionError::is_resource_not_found_exception)
                {
                    debug!("Function {name} does not exist");
                    Ok(None)
                } else {
                    Err(RemoteError::api("GetFunction", DisplayErrorContext(&sdk_err).to_string()).into())
                }
            }
        }
    }

    async fn create_function(&self, request: &CreateFunctionRequest) -> Result<FunctionRecord> {
        let output = self
            .client
            .create_function()
            .function_name(&request.name)
            .role(&request.role_arn)
            .runtime(Runtime::from(request.runtime.as_str()))
            .handler(&request.handler)
            .set_memory_size(to_api_int("memory", request.memory_mb)?)
            .set_timeout(to_api_int("time_out", request.timeout_secs)?)
            .set_environment(to_environment(request.environment.as_ref()))
            .code(to_function_code(&request.code))
            .send()
            .await
            .map_err(|e| RemoteError::api("CreateFunction", DisplayErrorContext(&e).to_string()))?;

        Ok(FunctionRecord {
            name: output.function_name().unwrap_or(&request.name).to_string(),
            arn: output.function_arn().map(str::to_string),
            role: output.role().map(str::to_string),
            runtime: output.runtime().map(|r| r.as_str().to_string()),
            handler: output.handler().map(str::to_string),
            memory_mb: from_api_int(output.memory_size()),
            timeout_secs: from_api_int(output.timeout()),
        })
    }

    async fn update_function_code(&self, name: &str, code: &CodePackage) -> Result<()> {
        let builder = self.client.update_function_code().function_name(name);
        let builder = match code {
            CodePackage::S3 { bucket, key } => builder.s3_bucket(bucket).s3_key(key),
            CodePackage::ZipFile(bytes) => builder.zip_file(Blob::new(bytes.clone())),
        };

        builder.send().await.map_err(|sdk_err| {
            let message = DisplayErrorContext(&sdk_err).to_string();
            if sdk_err
                .as_service_error()
                .is_some_and(UpdateFunctionCodeError::is_resource_conflict_exception)
            {
                RemoteError::Conflict {
                    operation: "UpdateFunctionCode",
                    message,
                }
            } else {
                RemoteError::api("UpdateFunctionCode", message)
            }
        })?;
        Ok(())
    }

    async fn update_function_configuration(&self, update: &ConfigurationUpdate) -> Result<()> {
        self.client
            .update_function_configuration()
            .function_name(&update.function_name)
            .set_memory_size(to_api_int("memory", update.memory_mb)?)
            .set_timeout(to_api_int("time_out", update.timeout_secs)?)
            .set_environment(to_environment(update.environment.as_ref()))
            .set_role(update.role_arn.clone())
            .send()
            .await
            .map_err(|sdk_err| {
                let message = DisplayErrorContext(&sdk_err).to_string();
                if sdk_err
                    .as_service_error()
                    .is_some_and(UpdateFunctionConfigurationError::is_resource_conflict_exception)
                {
                    RemoteError::Conflict {
                        operation: "UpdateFunctionConfiguration",
                        message,
                    }
                } else {
                    RemoteError::api("UpdateFunctionConfiguration", message)
                }
            })?;
        Ok(())
    }

    async fn delete_function(&self, name: &str) -> Result<()> {
        self.client
            .delete_function()
            .function_name(name)
            .send()
            .await
            .map_err(|e| RemoteError::api("DeleteFunction", DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}
