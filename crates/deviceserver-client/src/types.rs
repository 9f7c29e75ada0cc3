//! Resource representations exchanged with the device server.

use hateoas::{LinkSet, Page};
use secrecy::SecretString;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use typed_builder::TypedBuilder;

/// Media type the service expects for new subscriptions.
pub const SUBSCRIPTION_MEDIA_TYPE: &str = "application/vnd.oma.lwm2m.subscription+json";

/// The root resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Top-level relations visible to the current session.
    #[serde(rename = "Links", default)]
    pub links: LinkSet,
}

/// An organisation access key.
///
/// `Secret` is only present in the response that created the key. The
/// same shape is used for the CLI credentials file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AccessKey {
    /// Resource links; `self` identifies the key for deletion.
    #[serde(rename = "Links", default)]
    pub links: LinkSet,
    /// Human readable label.
    #[serde(rename = "Name", default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Key id, the OAuth username.
    #[serde(rename = "Key", default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    /// Key secret, the OAuth password.
    #[serde(
        rename = "Secret",
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_secret"
    )]
    pub secret: Option<SecretString>,
}

/// Paginated access keys.
pub type AccessKeys = Page<AccessKey>;

/// Threshold attributes of an observation subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
pub struct SubscriptionAttributes {
    #[serde(rename = "Pmin", default, skip_serializing_if = "String::is_empty")]
    pub pmin: String,
    #[serde(rename = "Pmax", default, skip_serializing_if = "String::is_empty")]
    pub pmax: String,
    #[serde(rename = "Step", default, skip_serializing_if = "String::is_empty")]
    pub step: String,
    #[serde(rename = "LessThan", default, skip_serializing_if = "String::is_empty")]
    pub less_than: String,
    #[serde(rename = "GreaterThan", default, skip_serializing_if = "String::is_empty")]
    pub greater_than: String,
}

/// A webhook subscription.
///
/// ```
/// use deviceserver_client::SubscriptionRequest;
///
/// let request = SubscriptionRequest::builder()
///     .subscription_type("ClientConnected")
///     .url("http://127.0.0.1/mywebhook")
///     .build();
/// assert!(request.attributes.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct SubscriptionRequest {
    /// e.g. `ClientConnected`, `ClientDisconnected` or `Observation`.
    #[builder(setter(into))]
    #[serde(rename = "SubscriptionType")]
    pub subscription_type: String,
    /// Webhook the service will call.
    #[builder(setter(into))]
    #[serde(rename = "Url")]
    pub url: String,
    #[builder(default, setter(into))]
    #[serde(rename = "AcceptContentType", default, skip_serializing_if = "String::is_empty")]
    pub accept_content_type: String,
    #[builder(default, setter(into))]
    #[serde(rename = "Property", default, skip_serializing_if = "String::is_empty")]
    pub property: String,
    #[builder(default, setter(strip_option))]
    #[serde(rename = "Attributes", default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<SubscriptionAttributes>,
}

/// Paginated subscriptions.
pub type Subscriptions = Page<SubscriptionRequest>;

/// Result of creating a subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Links", default)]
    pub links: LinkSet,
}

/// Token response of the `authenticate` relation.
#[derive(Debug, Deserialize)]
pub struct OAuthToken {
    #[serde(with = "secret")]
    pub access_token: SecretString,
    #[serde(default)]
    pub token_type: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default, with = "optional_secret")]
    pub refresh_token: Option<SecretString>,
}

/// A device connected to the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceClient {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Links", default)]
    pub links: LinkSet,
}

/// Paginated clients.
pub type Clients = Page<DeviceClient>;

/// An LWM2M object type supported by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    #[serde(rename = "ObjectTypeID", default)]
    pub object_type_id: String,
    #[serde(rename = "Links", default)]
    pub links: LinkSet,
}

/// Paginated object types.
pub type ObjectTypes = Page<ObjectType>;

/// An object instance.
///
/// The properties depend on the object type, so the instance is kept as a
/// JSON object and read through typed accessors that fail instead of
/// guessing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectInstance(pub Map<String, Value>);

impl ObjectInstance {
    /// Raw property value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Decodes property `name` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`hateoas::Error::Decode`] if the property is missing or not a `T`.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> hateoas::Result<T> {
        let value = self
            .get(name)
            .ok_or_else(|| decode_error(format!("missing property '{name}'")))?;
        T::deserialize(value).map_err(hateoas::Error::Decode)
    }

    /// The `InstanceID` property, sent either as a number or a numeric string.
    ///
    /// # Errors
    ///
    /// Returns [`hateoas::Error::Decode`] if the property is missing or not an integer.
    pub fn instance_id(&self) -> hateoas::Result<i64> {
        match self.get("InstanceID") {
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|e| decode_error(format!("InstanceID '{s}': {e}"))),
            Some(_) => self.field("InstanceID"),
            None => Err(decode_error("missing property 'InstanceID'")),
        }
    }

    /// The `Links` property.
    ///
    /// # Errors
    ///
    /// Returns [`hateoas::Error::Decode`] if the property is missing or malformed.
    pub fn links(&self) -> hateoas::Result<LinkSet> {
        self.field("Links")
    }
}

/// Paginated object instances.
pub type ObjectInstances = Page<ObjectInstance>;

fn decode_error(msg: impl std::fmt::Display) -> hateoas::Error {
    hateoas::Error::Decode(serde_json::Error::custom(msg))
}

mod secret {
    use secrecy::SecretString;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
        String::deserialize(d).map(SecretString::from)
    }
}

mod optional_secret {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        secret: &Option<SecretString>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match secret {
            Some(secret) => s.serialize_some(secret.expose_secret()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SecretString>, D::Error> {
        Ok(Option::<String>::deserialize(d)?
            .filter(|s| !s.is_empty())
            .map(SecretString::from))
    }
}
