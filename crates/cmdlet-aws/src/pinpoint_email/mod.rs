//! # Amazon Pinpoint Email
//!
//! Same layout as [`crate::sqs`]: wire shapes in [`model`], parameter
//! surfaces and operations in [`ops`], an in-process service in [`local`].

pub mod local;
pub mod model;
pub mod ops;

use async_trait::async_trait;
use cmdlet_framework::ServiceError;
use model::*;

pub const SERVICE: &str = "pinpoint-email";

#[async_trait]
pub trait PinpointEmailApi: Send + Sync {
    async fn create_configuration_set(
        &self,
        request: CreateConfigurationSetRequest,
    ) -> Result<CreateConfigurationSetResponse, ServiceError>;

    async fn delete_configuration_set(
        &self,
        request: DeleteConfigurationSetRequest,
    ) -> Result<DeleteConfigurationSetResponse, ServiceError>;

    async fn put_configuration_set_reputation_options(
        &self,
        request: PutConfigurationSetReputationOptionsRequest,
    ) -> Result<PutConfigurationSetReputationOptionsResponse, ServiceError>;

    async fn put_configuration_set_sending_options(
        &self,
        request: PutConfigurationSetSendingOptionsRequest,
    ) -> Result<PutConfigurationSetSendingOptionsResponse, ServiceError>;

    async fn send_email(&self, request: SendEmailRequest)
        -> Result<SendEmailResponse, ServiceError>;

    async fn create_email_identity(
        &self,
        request: CreateEmailIdentityRequest,
    ) -> Result<CreateEmailIdentityResponse, ServiceError>;

    async fn delete_email_identity(
        &self,
        request: DeleteEmailIdentityRequest,
    ) -> Result<DeleteEmailIdentityResponse, ServiceError>;

    async fn list_email_identities(
        &self,
        request: ListEmailIdentitiesRequest,
    ) -> Result<ListEmailIdentitiesResponse, ServiceError>;

    async fn get_account(&self, request: GetAccountRequest)
        -> Result<GetAccountResponse, ServiceError>;

    async fn put_account_sending_attributes(
        &self,
        request: PutAccountSendingAttributesRequest,
    ) -> Result<PutAccountSendingAttributesResponse, ServiceError>;
}
