//! Pinpoint Email operations.
//!
//! Nested request members are flattened into the parameter surface with an
//! underscore path on the wire side (`SendingOptions_SendingEnabled`) and a
//! dashed flag on the command line (`--sending-options-sending-enabled`).
//! Assembly folds them back with [`Group`], so a group whose members were
//! all left unbound never reaches the request.

use super::model::*;
use super::PinpointEmailApi;
use crate::params::parse_key_value;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clap::Args;
use cmdlet_framework::{ConfirmImpact, Group, Operation, Requirements, ServiceError};
use serde::Serialize;

fn tags(pairs: &Option<Vec<(String, String)>>) -> Option<Vec<Tag>> {
    pairs.as_ref().map(|pairs| {
        pairs
            .iter()
            .map(|(key, value)| Tag {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    })
}

fn text(data: &Option<String>, charset: &Option<String>) -> Option<Content> {
    Group::<Content>::new()
        .field(data.clone(), |c, v| c.data = Some(v))
        .field(charset.clone(), |c, v| c.charset = Some(v))
        .finish()
}

// =============================================================================
// CONFIGURATION SETS
// =============================================================================

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateConfigurationSetParams {
    #[arg(long)]
    pub configuration_set_name: Option<String>,
    /// Domain used for open and click tracking links
    #[arg(long)]
    #[serde(rename = "TrackingOptions_CustomRedirectDomain")]
    pub tracking_options_custom_redirect_domain: Option<String>,
    #[arg(long, value_enum)]
    #[serde(rename = "DeliveryOptions_TlsPolicy")]
    pub delivery_options_tls_policy: Option<TlsPolicy>,
    /// Dedicated IP pool to send through
    #[arg(long)]
    #[serde(rename = "DeliveryOptions_SendingPoolName")]
    pub delivery_options_sending_pool_name: Option<String>,
    #[arg(long)]
    #[serde(rename = "ReputationOptions_ReputationMetricsEnabled")]
    pub reputation_options_reputation_metrics_enabled: Option<bool>,
    /// RFC 3339 timestamp
    #[arg(long)]
    #[serde(rename = "ReputationOptions_LastFreshStart")]
    pub reputation_options_last_fresh_start: Option<DateTime<Utc>>,
    #[arg(long)]
    #[serde(rename = "SendingOptions_SendingEnabled")]
    pub sending_options_sending_enabled: Option<bool>,
    /// Tag as Key=Value
    #[arg(long, value_parser = parse_key_value)]
    pub tag: Option<Vec<(String, String)>>,
}

pub struct CreateConfigurationSet;

#[async_trait]
impl Operation for CreateConfigurationSet {
    const NAME: &'static str = "CreateConfigurationSet";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["ConfigurationSetName"];
    type Params = CreateConfigurationSetParams;
    type Request = CreateConfigurationSetRequest;
    type Response = CreateConfigurationSetResponse;
    type Client = dyn PinpointEmailApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("ConfigurationSetName", &p.configuration_set_name);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        CreateConfigurationSetRequest {
            configuration_set_name: p.configuration_set_name.clone(),
            tracking_options: Group::<TrackingOptions>::new()
                .field(p.tracking_options_custom_redirect_domain.clone(), |t, v| {
                    t.custom_redirect_domain = Some(v)
                })
                .finish(),
            delivery_options: Group::<DeliveryOptions>::new()
                .field(p.delivery_options_tls_policy, |d, v| d.tls_policy = Some(v))
                .field(p.delivery_options_sending_pool_name.clone(), |d, v| {
                    d.sending_pool_name = Some(v)
                })
                .finish(),
            reputation_options: Group::<ReputationOptions>::new()
                .field(p.reputation_options_reputation_metrics_enabled, |r, v| {
                    r.reputation_metrics_enabled = Some(v)
                })
                .field(p.reputation_options_last_fresh_start, |r, v| {
                    r.last_fresh_start = Some(v)
                })
                .finish(),
            sending_options: Group::<SendingOptions>::new()
                .field(p.sending_options_sending_enabled, |s, v| {
                    s.sending_enabled = Some(v)
                })
                .finish(),
            tags: tags(&p.tag),
        }
    }

    fn target(p: &Self::Params) -> String {
        p.configuration_set_name.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.create_configuration_set(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteConfigurationSetParams {
    #[arg(long)]
    pub configuration_set_name: Option<String>,
}

pub struct DeleteConfigurationSet;

#[async_trait]
impl Operation for DeleteConfigurationSet {
    const NAME: &'static str = "DeleteConfigurationSet";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::High;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["ConfigurationSetName"];
    type Params = DeleteConfigurationSetParams;
    type Request = DeleteConfigurationSetRequest;
    type Response = DeleteConfigurationSetResponse;
    type Client = dyn PinpointEmailApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("ConfigurationSetName", &p.configuration_set_name);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        DeleteConfigurationSetRequest {
            configuration_set_name: p.configuration_set_name.clone(),
        }
    }

    fn target(p: &Self::Params) -> String {
        p.configuration_set_name.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.delete_configuration_set(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutConfigurationSetReputationOptionsParams {
    #[arg(long)]
    pub configuration_set_name: Option<String>,
    #[arg(long)]
    pub reputation_metrics_enabled: Option<bool>,
}

pub struct PutConfigurationSetReputationOptions;

#[async_trait]
impl Operation for PutConfigurationSetReputationOptions {
    const NAME: &'static str = "PutConfigurationSetReputationOptions";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["ConfigurationSetName"];
    type Params = PutConfigurationSetReputationOptionsParams;
    type Request = PutConfigurationSetReputationOptionsRequest;
    type Response = PutConfigurationSetReputationOptionsResponse;
    type Client = dyn PinpointEmailApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("ConfigurationSetName", &p.configuration_set_name);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        PutConfigurationSetReputationOptionsRequest {
            configuration_set_name: p.configuration_set_name.clone(),
            reputation_metrics_enabled: p.reputation_metrics_enabled,
        }
    }

    fn target(p: &Self::Params) -> String {
        p.configuration_set_name.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.put_configuration_set_reputation_options(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutConfigurationSetSendingOptionsParams {
    #[arg(long)]
    pub configuration_set_name: Option<String>,
    #[arg(long)]
    pub sending_enabled: Option<bool>,
}

pub struct PutConfigurationSetSendingOptions;

#[async_trait]
impl Operation for PutConfigurationSetSendingOptions {
    const NAME: &'static str = "PutConfigurationSetSendingOptions";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["ConfigurationSetName"];
    type Params = PutConfigurationSetSendingOptionsParams;
    type Request = PutConfigurationSetSendingOptionsRequest;
    type Response = PutConfigurationSetSendingOptionsResponse;
    type Client = dyn PinpointEmailApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("ConfigurationSetName", &p.configuration_set_name);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        PutConfigurationSetSendingOptionsRequest {
            configuration_set_name: p.configuration_set_name.clone(),
            sending_enabled: p.sending_enabled,
        }
    }

    fn target(p: &Self::Params) -> String {
        p.configuration_set_name.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.put_configuration_set_sending_options(request).await
    }
}

// =============================================================================
// SENDING
// =============================================================================

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendEmailParams {
    /// Verified sender address
    #[arg(long)]
    pub from_email_address: Option<String>,
    #[arg(long, value_delimiter = ',')]
    #[serde(rename = "Destination_ToAddresses")]
    pub destination_to_addresses: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',')]
    #[serde(rename = "Destination_CcAddresses")]
    pub destination_cc_addresses: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',')]
    #[serde(rename = "Destination_BccAddresses")]
    pub destination_bcc_addresses: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',')]
    pub reply_to_addresses: Option<Vec<String>>,
    /// Address that receives bounces and complaints
    #[arg(long)]
    pub feedback_forwarding_email_address: Option<String>,
    #[arg(long)]
    #[serde(rename = "Content_Simple_Subject_Data")]
    pub content_simple_subject_data: Option<String>,
    #[arg(long)]
    #[serde(rename = "Content_Simple_Subject_Charset")]
    pub content_simple_subject_charset: Option<String>,
    #[arg(long)]
    #[serde(rename = "Content_Simple_Body_Text_Data")]
    pub content_simple_body_text_data: Option<String>,
    #[arg(long)]
    #[serde(rename = "Content_Simple_Body_Text_Charset")]
    pub content_simple_body_text_charset: Option<String>,
    #[arg(long)]
    #[serde(rename = "Content_Simple_Body_Html_Data")]
    pub content_simple_body_html_data: Option<String>,
    #[arg(long)]
    #[serde(rename = "Content_Simple_Body_Html_Charset")]
    pub content_simple_body_html_charset: Option<String>,
    /// Complete MIME message, headers included
    #[arg(long)]
    #[serde(rename = "Content_Raw_Data")]
    pub content_raw_data: Option<String>,
    #[arg(long)]
    #[serde(rename = "Content_Template_TemplateArn")]
    pub content_template_template_arn: Option<String>,
    /// JSON object with the template replacement values
    #[arg(long)]
    #[serde(rename = "Content_Template_TemplateData")]
    pub content_template_template_data: Option<String>,
    /// Message tag as Name=Value
    #[arg(long, value_parser = parse_key_value)]
    pub email_tag: Option<Vec<(String, String)>>,
    #[arg(long)]
    pub configuration_set_name: Option<String>,
}

impl SendEmailParams {
    fn content(&self) -> Option<EmailContent> {
        let body = Group::<Body>::new()
            .field(
                text(
                    &self.content_simple_body_text_data,
                    &self.content_simple_body_text_charset,
                ),
                |b, v| b.text = Some(v),
            )
            .field(
                text(
                    &self.content_simple_body_html_data,
                    &self.content_simple_body_html_charset,
                ),
                |b, v| b.html = Some(v),
            )
            .finish();
        let simple = Group::<SimpleMessage>::new()
            .field(
                text(
                    &self.content_simple_subject_data,
                    &self.content_simple_subject_charset,
                ),
                |s, v| s.subject = Some(v),
            )
            .field(body, |s, v| s.body = Some(v))
            .finish();
        let raw = Group::<RawMessage>::new()
            .field(self.content_raw_data.clone(), |r, v| {
                r.data = Some(v.into_bytes())
            })
            .finish();
        let template = Group::<Template>::new()
            .field(self.content_template_template_arn.clone(), |t, v| {
                t.template_arn = Some(v)
            })
            .field(self.content_template_template_data.clone(), |t, v| {
                t.template_data = Some(v)
            })
            .finish();

        Group::<EmailContent>::new()
            .field(simple, |c, v| c.simple = Some(v))
            .field(raw, |c, v| c.raw = Some(v))
            .field(template, |c, v| c.template = Some(v))
            .finish()
    }
}

pub struct SendEmail;

#[async_trait]
impl Operation for SendEmail {
    const NAME: &'static str = "SendEmail";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const DEFAULT_SELECT: &'static str = "MessageId";
    const RESPONSE_FIELDS: &'static [&'static str] = &["MessageId"];
    const PASS_THROUGH: &'static [&'static str] = &["FromEmailAddress"];
    type Params = SendEmailParams;
    type Request = SendEmailRequest;
    type Response = SendEmailResponse;
    type Client = dyn PinpointEmailApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require_any(
            "Destination",
            &[
                p.destination_to_addresses.is_some(),
                p.destination_cc_addresses.is_some(),
                p.destination_bcc_addresses.is_some(),
            ],
        )
        .require_any(
            "Content",
            &[
                p.content_simple_subject_data.is_some(),
                p.content_simple_subject_charset.is_some(),
                p.content_simple_body_text_data.is_some(),
                p.content_simple_body_text_charset.is_some(),
                p.content_simple_body_html_data.is_some(),
                p.content_simple_body_html_charset.is_some(),
                p.content_raw_data.is_some(),
                p.content_template_template_arn.is_some(),
                p.content_template_template_data.is_some(),
            ],
        );
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        SendEmailRequest {
            from_email_address: p.from_email_address.clone(),
            destination: Group::<Destination>::new()
                .field(p.destination_to_addresses.clone(), |d, v| {
                    d.to_addresses = Some(v)
                })
                .field(p.destination_cc_addresses.clone(), |d, v| {
                    d.cc_addresses = Some(v)
                })
                .field(p.destination_bcc_addresses.clone(), |d, v| {
                    d.bcc_addresses = Some(v)
                })
                .finish(),
            reply_to_addresses: p.reply_to_addresses.clone(),
            feedback_forwarding_email_address: p.feedback_forwarding_email_address.clone(),
            content: p.content(),
            email_tags: p.email_tag.as_ref().map(|pairs| {
                pairs
                    .iter()
                    .map(|(name, value)| MessageTag {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect()
            }),
            configuration_set_name: p.configuration_set_name.clone(),
        }
    }

    fn target(p: &Self::Params) -> String {
        let recipients: Vec<&str> = [
            &p.destination_to_addresses,
            &p.destination_cc_addresses,
            &p.destination_bcc_addresses,
        ]
        .into_iter()
        .flatten()
        .flatten()
        .map(String::as_str)
        .collect();
        recipients.join(", ")
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.send_email(request).await
    }
}

// =============================================================================
// IDENTITIES
// =============================================================================

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEmailIdentityParams {
    /// Email address or domain
    #[arg(long)]
    pub email_identity: Option<String>,
    #[arg(long, value_parser = parse_key_value)]
    pub tag: Option<Vec<(String, String)>>,
}

pub struct CreateEmailIdentity;

#[async_trait]
impl Operation for CreateEmailIdentity {
    const NAME: &'static str = "CreateEmailIdentity";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const RESPONSE_FIELDS: &'static [&'static str] =
        &["IdentityType", "VerifiedForSendingStatus"];
    const PASS_THROUGH: &'static [&'static str] = &["EmailIdentity"];
    type Params = CreateEmailIdentityParams;
    type Request = CreateEmailIdentityRequest;
    type Response = CreateEmailIdentityResponse;
    type Client = dyn PinpointEmailApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("EmailIdentity", &p.email_identity);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        CreateEmailIdentityRequest {
            email_identity: p.email_identity.clone(),
            tags: tags(&p.tag),
        }
    }

    fn target(p: &Self::Params) -> String {
        p.email_identity.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.create_email_identity(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteEmailIdentityParams {
    #[arg(long)]
    pub email_identity: Option<String>,
}

pub struct DeleteEmailIdentity;

#[async_trait]
impl Operation for DeleteEmailIdentity {
    const NAME: &'static str = "DeleteEmailIdentity";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::High;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["EmailIdentity"];
    type Params = DeleteEmailIdentityParams;
    type Request = DeleteEmailIdentityRequest;
    type Response = DeleteEmailIdentityResponse;
    type Client = dyn PinpointEmailApi;

    fn requirements(p: &Self::Params, req: &mut Requirements) {
        req.require("EmailIdentity", &p.email_identity);
    }

    fn assemble(p: &Self::Params) -> Self::Request {
        DeleteEmailIdentityRequest {
            email_identity: p.email_identity.clone(),
        }
    }

    fn target(p: &Self::Params) -> String {
        p.email_identity.clone().unwrap_or_default()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.delete_email_identity(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListEmailIdentitiesParams {
    /// Token from a previous page
    #[arg(long)]
    pub next_token: Option<String>,
    #[arg(long)]
    pub page_size: Option<i32>,
}

pub struct ListEmailIdentities;

#[async_trait]
impl Operation for ListEmailIdentities {
    const NAME: &'static str = "ListEmailIdentities";
    const SERVICE: &'static str = super::SERVICE;
    const DEFAULT_SELECT: &'static str = "EmailIdentities";
    const RESPONSE_FIELDS: &'static [&'static str] = &["EmailIdentities", "NextToken"];
    type Params = ListEmailIdentitiesParams;
    type Request = ListEmailIdentitiesRequest;
    type Response = ListEmailIdentitiesResponse;
    type Client = dyn PinpointEmailApi;

    fn assemble(p: &Self::Params) -> Self::Request {
        ListEmailIdentitiesRequest {
            next_token: p.next_token.clone(),
            page_size: p.page_size,
        }
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.list_email_identities(request).await
    }
}

// =============================================================================
// ACCOUNT
// =============================================================================

#[derive(Debug, Clone, Default, Args, Serialize)]
pub struct GetAccountParams {}

pub struct GetAccount;

#[async_trait]
impl Operation for GetAccount {
    const NAME: &'static str = "GetAccount";
    const SERVICE: &'static str = super::SERVICE;
    const RESPONSE_FIELDS: &'static [&'static str] = &[
        "SendQuota",
        "SendingEnabled",
        "DedicatedIpAutoWarmupEnabled",
        "EnforcementStatus",
        "ProductionAccessEnabled",
    ];
    type Params = GetAccountParams;
    type Request = GetAccountRequest;
    type Response = GetAccountResponse;
    type Client = dyn PinpointEmailApi;

    fn assemble(_: &Self::Params) -> Self::Request {
        GetAccountRequest {}
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.get_account(request).await
    }
}

#[derive(Debug, Clone, Default, Args, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutAccountSendingAttributesParams {
    /// Pause (false) or resume (true) sending for the whole account
    #[arg(long)]
    pub sending_enabled: Option<bool>,
}

pub struct PutAccountSendingAttributes;

#[async_trait]
impl Operation for PutAccountSendingAttributes {
    const NAME: &'static str = "PutAccountSendingAttributes";
    const SERVICE: &'static str = super::SERVICE;
    const IMPACT: ConfirmImpact = ConfirmImpact::Medium;
    const RESPONSE_FIELDS: &'static [&'static str] = &[];
    const PASS_THROUGH: &'static [&'static str] = &["SendingEnabled"];
    type Params = PutAccountSendingAttributesParams;
    type Request = PutAccountSendingAttributesRequest;
    type Response = PutAccountSendingAttributesResponse;
    type Client = dyn PinpointEmailApi;

    fn assemble(p: &Self::Params) -> Self::Request {
        PutAccountSendingAttributesRequest {
            sending_enabled: p.sending_enabled,
        }
    }

    fn target(_: &Self::Params) -> String {
        "account".to_string()
    }

    async fn call(
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ServiceError> {
        client.put_account_sending_attributes(request).await
    }
}
