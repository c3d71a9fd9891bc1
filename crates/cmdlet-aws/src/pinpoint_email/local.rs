//! In-process Pinpoint Email service.
//!
//! Identities created here are verified immediately. Sending checks the
//! account and configuration set sending switches and that the sender
//! address, or its domain, is a known identity.

use super::model::*;
use super::{PinpointEmailApi, SERVICE};
use async_trait::async_trait;
use cmdlet_framework::{LocalBackend, LocalHandle, Region, ServiceError};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_24_HOUR_SEND: f64 = 200.0;
const MAX_SEND_RATE: f64 = 1.0;

fn bad_request(message: impl Into<String>) -> ServiceError {
    ServiceError::api("BadRequestException", message)
}

fn not_found(what: &str, name: &str) -> ServiceError {
    ServiceError::api("NotFoundException", format!("{what} {name} does not exist."))
}

fn required<'a>(parameter: &str, value: &'a Option<String>) -> Result<&'a str, ServiceError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(bad_request(format!("{parameter} is required."))),
    }
}

/// Stored configuration set.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationSet {
    pub delivery: Option<DeliveryOptions>,
    pub reputation: ReputationOptions,
    pub sending_enabled: bool,
    pub tracking: Option<TrackingOptions>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone)]
struct Identity {
    identity_type: IdentityType,
    tags: Vec<Tag>,
}

/// A message accepted by [`PinpointEmailState::send_email`].
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub message_id: String,
    pub from: Option<String>,
    pub recipients: Vec<String>,
    pub configuration_set: Option<String>,
}

#[derive(Debug)]
pub struct PinpointEmailState {
    configuration_sets: BTreeMap<String, ConfigurationSet>,
    identities: BTreeMap<String, Identity>,
    sending_enabled: bool,
    outbox: Vec<SentEmail>,
}

impl Default for PinpointEmailState {
    fn default() -> Self {
        Self::new()
    }
}

impl PinpointEmailState {
    pub fn new() -> Self {
        Self {
            configuration_sets: BTreeMap::new(),
            identities: BTreeMap::new(),
            sending_enabled: true,
            outbox: Vec::new(),
        }
    }

    pub fn create_configuration_set(
        &mut self,
        request: CreateConfigurationSetRequest,
    ) -> Result<CreateConfigurationSetResponse, ServiceError> {
        let name = required("ConfigurationSetName", &request.configuration_set_name)?.to_string();
        if self.configuration_sets.contains_key(&name) {
            return Err(ServiceError::api(
                "AlreadyExistsException",
                format!("Configuration set {name} already exists."),
            ));
        }
        let set = ConfigurationSet {
            delivery: request.delivery_options,
            reputation: request.reputation_options.unwrap_or_default(),
            sending_enabled: request
                .sending_options
                .and_then(|s| s.sending_enabled)
                .unwrap_or(true),
            tracking: request.tracking_options,
            tags: request.tags.unwrap_or_default(),
        };
        debug!(configuration_set = %name, ?set, "Configuration set created");
        self.configuration_sets.insert(name, set);
        Ok(CreateConfigurationSetResponse {})
    }

    pub fn delete_configuration_set(
        &mut self,
        request: DeleteConfigurationSetRequest,
    ) -> Result<DeleteConfigurationSetResponse, ServiceError> {
        let name = required("ConfigurationSetName", &request.configuration_set_name)?;
        self.configuration_sets
            .remove(name)
            .ok_or_else(|| not_found("Configuration set", name))?;
        Ok(DeleteConfigurationSetResponse {})
    }

    fn configuration_set_mut(
        &mut self,
        name: &Option<String>,
    ) -> Result<&mut ConfigurationSet, ServiceError> {
        let name = required("ConfigurationSetName", name)?;
        self.configuration_sets
            .get_mut(name)
            .ok_or_else(|| not_found("Configuration set", name))
    }

    pub fn put_configuration_set_reputation_options(
        &mut self,
        request: PutConfigurationSetReputationOptionsRequest,
    ) -> Result<PutConfigurationSetReputationOptionsResponse, ServiceError> {
        let set = self.configuration_set_mut(&request.configuration_set_name)?;
        set.reputation.reputation_metrics_enabled =
            Some(request.reputation_metrics_enabled.unwrap_or(false));
        Ok(PutConfigurationSetReputationOptionsResponse {})
    }

    pub fn put_configuration_set_sending_options(
        &mut self,
        request: PutConfigurationSetSendingOptionsRequest,
    ) -> Result<PutConfigurationSetSendingOptionsResponse, ServiceError> {
        let set = self.configuration_set_mut(&request.configuration_set_name)?;
        set.sending_enabled = request.sending_enabled.unwrap_or(false);
        Ok(PutConfigurationSetSendingOptionsResponse {})
    }

    fn is_verified(&self, address: &str) -> bool {
        self.identities.contains_key(address)
            || address
                .rsplit_once('@')
                .is_some_and(|(_, domain)| self.identities.contains_key(domain))
    }

    pub fn send_email(
        &mut self,
        request: SendEmailRequest,
    ) -> Result<SendEmailResponse, ServiceError> {
        let recipients: Vec<String> = request
            .destination
            .iter()
            .flat_map(|d| [&d.to_addresses, &d.cc_addresses, &d.bcc_addresses])
            .flatten()
            .flatten()
            .cloned()
            .collect();
        if recipients.is_empty() {
            return Err(bad_request("Destination must contain at least one address."));
        }
        if request.content.is_none() {
            return Err(bad_request("Content is required."));
        }
        if !self.sending_enabled {
            return Err(ServiceError::api(
                "SendingPausedException",
                "Sending is disabled for this account.",
            ));
        }
        if let Some(set_name) = request.configuration_set_name.as_deref() {
            let set = self
                .configuration_sets
                .get(set_name)
                .ok_or_else(|| not_found("Configuration set", set_name))?;
            if !set.sending_enabled {
                return Err(ServiceError::api(
                    "SendingPausedException",
                    format!("Sending is disabled for configuration set {set_name}."),
                ));
            }
        }
        if let Some(from) = request.from_email_address.as_deref() {
            if !self.is_verified(from) {
                return Err(ServiceError::api(
                    "MessageRejected",
                    format!("Email address is not verified. The following identities failed the check: {from}"),
                ));
            }
        }
        if self.outbox.len() as f64 >= MAX_24_HOUR_SEND {
            return Err(ServiceError::api(
                "LimitExceededException",
                "Daily message quota exceeded.",
            ));
        }

        let message_id = format!("{}-000000", uuid::Uuid::new_v4().simple());
        self.outbox.push(SentEmail {
            message_id: message_id.clone(),
            from: request.from_email_address,
            recipients,
            configuration_set: request.configuration_set_name,
        });
        Ok(SendEmailResponse {
            message_id: Some(message_id),
        })
    }

    pub fn create_email_identity(
        &mut self,
        request: CreateEmailIdentityRequest,
    ) -> Result<CreateEmailIdentityResponse, ServiceError> {
        let identity = required("EmailIdentity", &request.email_identity)?.to_string();
        if self.identities.contains_key(&identity) {
            return Err(ServiceError::api(
                "AlreadyExistsException",
                format!("Email identity {identity} already exists."),
            ));
        }
        let identity_type = if identity.contains('@') {
            IdentityType::EmailAddress
        } else {
            IdentityType::Domain
        };
        self.identities.insert(
            identity,
            Identity {
                identity_type,
                tags: request.tags.unwrap_or_default(),
            },
        );
        Ok(CreateEmailIdentityResponse {
            identity_type: Some(identity_type),
            verified_for_sending_status: Some(true),
        })
    }

    pub fn delete_email_identity(
        &mut self,
        request: DeleteEmailIdentityRequest,
    ) -> Result<DeleteEmailIdentityResponse, ServiceError> {
        let identity = required("EmailIdentity", &request.email_identity)?;
        self.identities
            .remove(identity)
            .ok_or_else(|| not_found("Email identity", identity))?;
        Ok(DeleteEmailIdentityResponse {})
    }

    pub fn list_email_identities(
        &self,
        request: ListEmailIdentitiesRequest,
    ) -> Result<ListEmailIdentitiesResponse, ServiceError> {
        let page_size = match request.page_size {
            None => DEFAULT_PAGE_SIZE,
            Some(n) if (1..=1000).contains(&n) => n as usize,
            Some(n) => return Err(bad_request(format!("PageSize {n} is out of range."))),
        };
        let start = match request.next_token.as_deref() {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .ok()
                .filter(|i| *i <= self.identities.len())
                .ok_or_else(|| bad_request("Invalid NextToken."))?,
        };

        let page: Vec<IdentityInfo> = self
            .identities
            .iter()
            .skip(start)
            .take(page_size)
            .map(|(name, identity)| IdentityInfo {
                identity_type: identity.identity_type,
                identity_name: name.clone(),
                sending_enabled: true,
            })
            .collect();
        let end = start + page.len();
        Ok(ListEmailIdentitiesResponse {
            email_identities: Some(page),
            next_token: (end < self.identities.len()).then(|| end.to_string()),
        })
    }

    pub fn get_account(&self, _: GetAccountRequest) -> Result<GetAccountResponse, ServiceError> {
        Ok(GetAccountResponse {
            send_quota: Some(SendQuota {
                max24_hour_send: MAX_24_HOUR_SEND,
                max_send_rate: MAX_SEND_RATE,
                sent_last24_hours: self.outbox.len() as f64,
            }),
            sending_enabled: Some(self.sending_enabled),
            dedicated_ip_auto_warmup_enabled: Some(false),
            enforcement_status: Some("HEALTHY".to_string()),
            production_access_enabled: Some(false),
        })
    }

    pub fn put_account_sending_attributes(
        &mut self,
        request: PutAccountSendingAttributesRequest,
    ) -> Result<PutAccountSendingAttributesResponse, ServiceError> {
        self.sending_enabled = request.sending_enabled.unwrap_or(false);
        Ok(PutAccountSendingAttributesResponse {})
    }

    pub fn outbox(&self) -> &[SentEmail] {
        &self.outbox
    }

    pub fn configuration_set(&self, name: &str) -> Option<&ConfigurationSet> {
        self.configuration_sets.get(name)
    }

    /// Tags recorded on an identity or configuration set.
    pub fn tags(&self, name: &str) -> Option<Vec<Tag>> {
        self.identities
            .get(name)
            .map(|i| i.tags.clone())
            .or_else(|| self.configuration_sets.get(name).map(|s| s.tags.clone()))
    }
}

/// [`PinpointEmailApi`] backed by an in-process [`PinpointEmailState`].
#[derive(Clone)]
pub struct LocalPinpointEmail {
    region: String,
    handle: LocalHandle<PinpointEmailState>,
}

impl LocalPinpointEmail {
    /// Starts a backend for `region`. Must be called within a Tokio runtime.
    pub fn spawn(region: &Region) -> Self {
        let (backend, handle) = LocalBackend::new(PinpointEmailState::new(), 64);
        tokio::spawn(backend.run(SERVICE));
        info!(%region, "Local Pinpoint Email started");
        Self {
            region: region.to_string(),
            handle,
        }
    }

    pub async fn inspect<R, F>(&self, f: F) -> Result<R, ServiceError>
    where
        R: Send + 'static,
        F: FnOnce(&PinpointEmailState) -> R + Send + 'static,
    {
        self.handle.exec(move |s| Ok(f(s))).await
    }
}

#[async_trait]
impl PinpointEmailApi for LocalPinpointEmail {
    #[instrument(skip_all, fields(region = %self.region))]
    async fn create_configuration_set(
        &self,
        request: CreateConfigurationSetRequest,
    ) -> Result<CreateConfigurationSetResponse, ServiceError> {
        self.handle
            .exec(move |s| s.create_configuration_set(request))
            .await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn delete_configuration_set(
        &self,
        request: DeleteConfigurationSetRequest,
    ) -> Result<DeleteConfigurationSetResponse, ServiceError> {
        self.handle
            .exec(move |s| s.delete_configuration_set(request))
            .await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn put_configuration_set_reputation_options(
        &self,
        request: PutConfigurationSetReputationOptionsRequest,
    ) -> Result<PutConfigurationSetReputationOptionsResponse, ServiceError> {
        self.handle
            .exec(move |s| s.put_configuration_set_reputation_options(request))
            .await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn put_configuration_set_sending_options(
        &self,
        request: PutConfigurationSetSendingOptionsRequest,
    ) -> Result<PutConfigurationSetSendingOptionsResponse, ServiceError> {
        self.handle
            .exec(move |s| s.put_configuration_set_sending_options(request))
            .await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn send_email(
        &self,
        request: SendEmailRequest,
    ) -> Result<SendEmailResponse, ServiceError> {
        self.handle.exec(move |s| s.send_email(request)).await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn create_email_identity(
        &self,
        request: CreateEmailIdentityRequest,
    ) -> Result<CreateEmailIdentityResponse, ServiceError> {
        self.handle
            .exec(move |s| s.create_email_identity(request))
            .await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn delete_email_identity(
        &self,
        request: DeleteEmailIdentityRequest,
    ) -> Result<DeleteEmailIdentityResponse, ServiceError> {
        self.handle
            .exec(move |s| s.delete_email_identity(request))
            .await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn list_email_identities(
        &self,
        request: ListEmailIdentitiesRequest,
    ) -> Result<ListEmailIdentitiesResponse, ServiceError> {
        self.handle
            .exec(move |s| s.list_email_identities(request))
            .await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn get_account(
        &self,
        request: GetAccountRequest,
    ) -> Result<GetAccountResponse, ServiceError> {
        self.handle.exec(move |s| s.get_account(request)).await
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn put_account_sending_attributes(
        &self,
        request: PutAccountSendingAttributesRequest,
    ) -> Result<PutAccountSendingAttributesResponse, ServiceError> {
        self.handle
            .exec(move |s| s.put_account_sending_attributes(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_set(state: &mut PinpointEmailState, name: &str) -> Result<(), ServiceError> {
        state
            .create_configuration_set(CreateConfigurationSetRequest {
                configuration_set_name: Some(name.into()),
                ..Default::default()
            })
            .map(|_| ())
    }

    fn email(from: &str, to: &str) -> SendEmailRequest {
        SendEmailRequest {
            from_email_address: Some(from.into()),
            destination: Some(Destination {
                to_addresses: Some(vec![to.into()]),
                ..Default::default()
            }),
            content: Some(EmailContent {
                raw: Some(RawMessage {
                    data: Some(b"raw".to_vec()),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_configuration_set_lifecycle() {
        let mut state = PinpointEmailState::new();
        create_set(&mut state, "cs").unwrap();
        let dup = create_set(&mut state, "cs").unwrap_err();
        assert_eq!(dup.code(), Some("AlreadyExistsException"));

        state
            .delete_configuration_set(DeleteConfigurationSetRequest {
                configuration_set_name: Some("cs".into()),
            })
            .unwrap();
        let gone = state
            .delete_configuration_set(DeleteConfigurationSetRequest {
                configuration_set_name: Some("cs".into()),
            })
            .unwrap_err();
        assert_eq!(gone.code(), Some("NotFoundException"));
    }

    #[test]
    fn test_send_requires_verified_sender_domain() {
        let mut state = PinpointEmailState::new();
        let rejected = state
            .send_email(email("me@example.com", "you@example.org"))
            .unwrap_err();
        assert_eq!(rejected.code(), Some("MessageRejected"));

        state
            .create_email_identity(CreateEmailIdentityRequest {
                email_identity: Some("example.com".into()),
                tags: None,
            })
            .unwrap();
        let sent = state
            .send_email(email("me@example.com", "you@example.org"))
            .unwrap();
        assert!(sent.message_id.is_some());
        assert_eq!(state.outbox()[0].recipients, ["you@example.org"]);
    }

    #[test]
    fn test_paused_configuration_set_blocks_sending() {
        let mut state = PinpointEmailState::new();
        create_set(&mut state, "cs").unwrap();
        state
            .put_configuration_set_sending_options(PutConfigurationSetSendingOptionsRequest {
                configuration_set_name: Some("cs".into()),
                sending_enabled: Some(false),
            })
            .unwrap();
        let mut request = email("me@example.com", "you@example.org");
        request.from_email_address = None;
        request.configuration_set_name = Some("cs".into());
        let err = state.send_email(request).unwrap_err();
        assert_eq!(err.code(), Some("SendingPausedException"));
    }

    #[test]
    fn test_account_sending_switch() {
        let mut state = PinpointEmailState::new();
        state
            .put_account_sending_attributes(PutAccountSendingAttributesRequest {
                sending_enabled: Some(false),
            })
            .unwrap();
        let account = state.get_account(GetAccountRequest {}).unwrap();
        assert_eq!(account.sending_enabled, Some(false));

        let mut request = email("me@example.com", "you@example.org");
        request.from_email_address = None;
        assert_eq!(
            state.send_email(request).unwrap_err().code(),
            Some("SendingPausedException")
        );
    }

    #[test]
    fn test_identity_types_and_paging() {
        let mut state = PinpointEmailState::new();
        for identity in ["a@example.com", "b.example", "c.example"] {
            state
                .create_email_identity(CreateEmailIdentityRequest {
                    email_identity: Some(identity.into()),
                    tags: None,
                })
                .unwrap();
        }
        let first = state
            .list_email_identities(ListEmailIdentitiesRequest {
                next_token: None,
                page_size: Some(2),
            })
            .unwrap();
        let identities = first.email_identities.unwrap();
        assert_eq!(identities[0].identity_type, IdentityType::EmailAddress);
        assert_eq!(identities[1].identity_type, IdentityType::Domain);
        assert_eq!(first.next_token.as_deref(), Some("2"));

        let second = state
            .list_email_identities(ListEmailIdentitiesRequest {
                next_token: first.next_token,
                page_size: Some(2),
            })
            .unwrap();
        assert_eq!(second.email_identities.map(|v| v.len()), Some(1));
        assert_eq!(second.next_token, None);
    }

    #[tokio::test]
    async fn test_local_facade_round_trip() {
        let email = LocalPinpointEmail::spawn(&Region::new("eu-west-1"));
        email
            .create_email_identity(CreateEmailIdentityRequest {
                email_identity: Some("sender@example.com".into()),
                tags: Some(vec![Tag {
                    key: "team".into(),
                    value: "ops".into(),
                }]),
            })
            .await
            .unwrap();
        let tags = email
            .inspect(|s| s.tags("sender@example.com"))
            .await
            .unwrap();
        assert_eq!(tags.map(|t| t.len()), Some(1));
    }
}
