//! REST facade over the hypermedia client.

use chrono::{DateTime, TimeDelta, Utc};
use hateoas::header::HeaderValue;
use hateoas::{Client, ClientConfig, Headers, LinkSet, Page, SELF_REL};
use log::{debug, info};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::types::{
    AccessKey, AccessKeys, Clients, DeviceClient, OAuthToken, ObjectInstances, ObjectType,
    ObjectTypes, SUBSCRIPTION_MEDIA_TYPE, SubscriptionRequest, SubscriptionResponse,
    Subscriptions,
};

const AUTHENTICATE_REL: &str = "authenticate";
const ACCESS_KEYS_REL: &str = "accesskeys";
const CLIENTS_REL: &str = "clients";
const SUBSCRIPTIONS_REL: &str = "subscriptions";
const OBJECT_TYPES_REL: &str = "objecttypes";
const INSTANCES_REL: &str = "instances";

/// Token obtained by the last successful authentication.
#[derive(Debug, Default)]
struct AuthState {
    token: Option<OAuthToken>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct NewAccessKey<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
}

/// Client for the device server REST API.
///
/// Every call is a single navigation from the entry point (or from a URL
/// taken from an earlier response). Authentication state is owned by the
/// client and changed only through `&mut self` methods.
#[derive(Debug)]
pub struct RestClient {
    hateoas: Client,
    auth: AuthState,
}

impl RestClient {
    /// Wraps an existing hypermedia client.
    ///
    /// # Errors
    ///
    /// Returns [`hateoas::Error::Config`] if `hateoas` has no entry point.
    pub fn new(hateoas: Client) -> Result<Self, Error> {
        if hateoas.entry_url().is_none() {
            return Err(hateoas::Error::Config(
                "device server client needs an entry URL".to_string(),
            )
            .into());
        }

        Ok(Self {
            hateoas,
            auth: AuthState::default(),
        })
    }

    /// Builds the hypermedia client from `config` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn connect(config: ClientConfig) -> Result<Self, Error> {
        Self::new(Client::new(config)?)
    }

    /// The underlying hypermedia client, for requests this facade does not cover.
    pub const fn hateoas(&self) -> &Client {
        &self.hateoas
    }

    /// Mutable access to the underlying hypermedia client.
    pub const fn hateoas_mut(&mut self) -> &mut Client {
        &mut self.hateoas
    }

    /// Token from the last successful `authenticate` or `refresh_auth`.
    pub const fn token(&self) -> Option<&OAuthToken> {
        self.auth.token.as_ref()
    }

    /// When the current token expires, as computed from `expires_in`.
    pub const fn token_expires(&self) -> Option<DateTime<Utc>> {
        self.auth.expires_at
    }

    /// Sends `Authorization: Bearer <token>` from now on; an empty token stops sending it.
    ///
    /// Returns the previous header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value.
    pub fn set_bearer_token(&mut self, token: &str) -> Result<Option<HeaderValue>, Error> {
        Ok(self.hateoas.set_bearer_token(token)?)
    }

    /// Exchanges an access key and secret for a token.
    ///
    /// On failure the previous token and `Authorization` header stay in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the credentials.
    pub async fn authenticate(&mut self, credentials: &AccessKey) -> Result<(), Error> {
        let secret = credentials
            .secret
            .as_ref()
            .map(|s| s.expose_secret())
            .unwrap_or_default();

        self.request_token(&[
            ("grant_type", "password"),
            ("username", credentials.key.as_str()),
            ("password", secret),
        ])
        .await
    }

    /// Exchanges a refresh token for a new token.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the refresh token.
    pub async fn refresh_auth(&mut self, refresh_token: &str) -> Result<(), Error> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn request_token(&mut self, form: &[(&str, &str)]) -> Result<(), Error> {
        let token: OAuthToken = self
            .hateoas
            .post_form("", &[AUTHENTICATE_REL], &Headers::new(), form)
            .await?
            .value;

        self.hateoas
            .set_bearer_token(token.access_token.expose_secret())?;

        let expires_at = TimeDelta::try_seconds(token.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
        info!(
            "Authenticated, token expires {}",
            expires_at.map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
        );

        self.auth = AuthState {
            token: Some(token),
            expires_at,
        };
        Ok(())
    }

    /// Creates a new access key in the current organisation.
    ///
    /// The response is the only place the new key's secret is ever returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is not authorised to create keys.
    pub async fn create_access_key(&self, name: &str) -> Result<AccessKey, Error> {
        let key = self
            .hateoas
            .post::<AccessKey, _>(
                "",
                &[ACCESS_KEYS_REL],
                &Headers::new(),
                &NewAccessKey { name },
            )
            .await?;
        debug!("Created access key {}", key.value.links.self_href());
        Ok(key.value)
    }

    /// Lists access keys a page at a time.
    ///
    /// Pass `None` for the first page, then the previous page until this
    /// returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be fetched.
    pub async fn get_access_keys(
        &self,
        previous: Option<&AccessKeys>,
    ) -> Result<Option<AccessKeys>, Error> {
        self.page_along("", ACCESS_KEYS_REL, previous).await
    }

    /// Deletes an access key through its `self` link.
    ///
    /// # Errors
    ///
    /// Returns [`hateoas::Error::LinkNotFound`] if the key has no `self` link.
    pub async fn delete_access_key(&self, key: &AccessKey) -> Result<(), Error> {
        self.delete_self(&key.links).await
    }

    /// Lists connected clients a page at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be fetched.
    pub async fn get_clients(&self, previous: Option<&Clients>) -> Result<Option<Clients>, Error> {
        self.page_along("", CLIENTS_REL, previous).await
    }

    /// Lists the object types a client supports, a page at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has no `self` link or a page cannot be fetched.
    pub async fn get_object_types(
        &self,
        client: &DeviceClient,
        previous: Option<&ObjectTypes>,
    ) -> Result<Option<ObjectTypes>, Error> {
        let start = &client.links.get(SELF_REL)?.href;
        self.page_along(start, OBJECT_TYPES_REL, previous).await
    }

    /// Lists the instances of an object type, a page at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the object type has no `self` link or a page cannot be fetched.
    pub async fn get_object_instances(
        &self,
        object_type: &ObjectType,
        previous: Option<&ObjectInstances>,
    ) -> Result<Option<ObjectInstances>, Error> {
        let start = &object_type.links.get(SELF_REL)?.href;
        self.page_along(start, INSTANCES_REL, previous).await
    }

    /// Lists subscriptions a page at a time.
    ///
    /// `endpoint` selects whose subscriptions to list; empty means the
    /// organisation's own. It is only used for the first page.
    ///
    /// # Errors
    ///
    /// Returns [`hateoas::Error::Config`] if both `endpoint` and `previous`
    /// are given.
    pub async fn get_subscriptions(
        &self,
        endpoint: &str,
        previous: Option<&Subscriptions>,
    ) -> Result<Option<Subscriptions>, Error> {
        if !endpoint.is_empty() && previous.is_some() {
            return Err(hateoas::Error::Config(
                "cannot get subscriptions for both an endpoint and a previous page".to_string(),
            )
            .into());
        }
        self.page_along(endpoint, SUBSCRIPTIONS_REL, previous).await
    }

    /// Creates a webhook subscription.
    ///
    /// `endpoint` is empty to subscribe at the entry point (client connect
    /// and disconnect events), or the `self` URL of a resource to observe it.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the subscription.
    pub async fn subscribe(
        &self,
        endpoint: &str,
        request: &SubscriptionRequest,
    ) -> Result<SubscriptionResponse, Error> {
        let response = self
            .hateoas
            .post::<SubscriptionResponse, _>(
                endpoint,
                &[SUBSCRIPTIONS_REL],
                &Headers::from([("Content-Type", SUBSCRIPTION_MEDIA_TYPE)]),
                request,
            )
            .await?;
        debug!("Subscribed {} as {}", request.subscription_type, response.value.id);
        Ok(response.value)
    }

    /// Removes a subscription through its `self` link.
    ///
    /// # Errors
    ///
    /// Returns [`hateoas::Error::LinkNotFound`] if the subscription has no `self` link.
    pub async fn unsubscribe(&self, subscription: &SubscriptionResponse) -> Result<(), Error> {
        self.delete_self(&subscription.links).await
    }

    /// Deletes the resource at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`hateoas::Error::Config`] for an empty URL, which would
    /// otherwise target the entry point.
    pub async fn delete(&self, url: &str) -> Result<(), Error> {
        if url.is_empty() {
            return Err(
                hateoas::Error::Config("refusing to DELETE the entry point".to_string()).into(),
            );
        }
        self.hateoas.delete(url, &[], &Headers::new()).await?;
        debug!("Deleted {url}");
        Ok(())
    }

    /// Deletes whatever the `self` link in `links` points at.
    ///
    /// # Errors
    ///
    /// Returns [`hateoas::Error::LinkNotFound`] if there is no `self` link.
    pub async fn delete_self(&self, links: &LinkSet) -> Result<(), Error> {
        let target = links.get(SELF_REL)?;
        self.delete(&target.href).await
    }

    async fn page_along<T: DeserializeOwned>(
        &self,
        start: &str,
        rel: &str,
        previous: Option<&Page<T>>,
    ) -> Result<Option<Page<T>>, Error> {
        match previous {
            None => Ok(Some(
                self.hateoas
                    .first_page(start, &[rel], &Headers::new())
                    .await?,
            )),
            Some(previous) => Ok(self.hateoas.next_page(previous).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use hateoas::Link;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_entry(server: &MockServer, rels: &[(&str, &str)]) {
        let links: Vec<_> = rels
            .iter()
            .map(|(rel, p)| json!({"rel": rel, "href": format!("{}{p}", server.uri())}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Links": links})))
            .mount(server)
            .await;
    }

    fn client_for(server: &MockServer) -> RestClient {
        RestClient::connect(ClientConfig::new(server.uri())).unwrap()
    }

    #[test]
    fn test_new_requires_entry_point() {
        let err = RestClient::new(Client::new(ClientConfig::default()).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Hateoas(hateoas::Error::Config(_))));
    }

    #[tokio::test]
    async fn test_subscribe_sends_lwm2m_media_type() {
        let server = MockServer::start().await;
        mount_entry(&server, &[("subscriptions", "/subscriptions")]).await;

        Mock::given(method("POST"))
            .and(path("/subscriptions"))
            .and(header("content-type", SUBSCRIPTION_MEDIA_TYPE))
            .and(body_json(json!({
                "SubscriptionType": "ClientConnected",
                "Url": "http://127.0.0.1/mywebhook",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "ID": "sub-1",
                "Links": [{"rel": "self", "href": format!("{}/subscriptions/sub-1", server.uri())}],
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/subscriptions/sub-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = SubscriptionRequest::builder()
            .subscription_type("ClientConnected")
            .url("http://127.0.0.1/mywebhook")
            .build();

        let subscription = client.subscribe("", &request).await.unwrap();
        assert_eq!(subscription.id, "sub-1");

        client.unsubscribe(&subscription).await.unwrap();
    }

    #[tokio::test]
    async fn test_subscriptions_reject_endpoint_with_previous() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let previous: Subscriptions =
            serde_json::from_value(json!({"PageInfo": {}, "Items": []})).unwrap();

        let err = client
            .get_subscriptions("http://elsewhere/clients/1", Some(&previous))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Hateoas(hateoas::Error::Config(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_self_without_link() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let err = client.delete_self(&LinkSet::new()).await.unwrap_err();
        assert!(err.is_link_not_found());

        let err = client.delete("").await.unwrap_err();
        assert!(matches!(err, Error::Hateoas(hateoas::Error::Config(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_object_instances_from_client() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("GET"))
            .and(path("/clients/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Links": [{"rel": "objecttypes", "href": format!("{uri}/clients/c1/objecttypes")}],
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/clients/c1/objecttypes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "PageInfo": {"TotalCount": 1, "ItemsCount": 1, "StartIndex": 0},
                "Items": [{
                    "ObjectTypeID": "3303",
                    "Links": [{"rel": "self", "href": format!("{uri}/clients/c1/objecttypes/3303")}],
                }],
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/clients/c1/objecttypes/3303"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Links": [{"rel": "instances", "href": format!("{uri}/clients/c1/objecttypes/3303/instances")}],
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/clients/c1/objecttypes/3303/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "PageInfo": {"TotalCount": 1, "ItemsCount": 1, "StartIndex": 0},
                "Items": [{"InstanceID": "0", "SensorValue": 21.5}],
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let device = DeviceClient {
            name: "sensor".to_string(),
            links: [Link::new("self", format!("{uri}/clients/c1"))]
                .into_iter()
                .collect(),
        };

        let types = client.get_object_types(&device, None).await.unwrap().unwrap();
        assert_eq!(types.items[0].object_type_id, "3303");
        assert!(client.get_object_types(&device, Some(&types)).await.unwrap().is_none());

        let instances = client
            .get_object_instances(&types.items[0], None)
            .await
            .unwrap()
            .unwrap();
        let instance = &instances.items[0];
        assert_eq!(instance.instance_id().unwrap(), 0);
        assert!((instance.field::<f64>("SensorValue").unwrap() - 21.5).abs() < f64::EPSILON);
    }
}
