//! # deviceserver-client
//!
//! Client for the creatordev.io device server REST API, built on the
//! [`hateoas`] navigation client.
//!
//! A fresh organisation has no access keys, so the first key is created
//! with a short-lived token signed by the pre-shared key ([`token_from_psk`]).
//! Afterwards the key and secret are exchanged for an OAuth token with
//! [`RestClient::authenticate`].
//!
//! ## Example
//!
//! ```no_run
//! use deviceserver_client::{RestClient, token_from_psk};
//! use hateoas::ClientConfig;
//! use secrecy::{ExposeSecret, SecretString};
//!
//! # async fn example() -> Result<(), deviceserver_client::Error> {
//! let mut client = RestClient::connect(ClientConfig::new("https://deviceserver.creatordev.io"))?;
//!
//! let psk = SecretString::from("my-psk".to_string());
//! client.set_bearer_token(token_from_psk(&psk, 0)?.expose_secret())?;
//! let key = client.create_access_key("bob").await?;
//!
//! client.set_bearer_token("")?;
//! client.authenticate(&key).await?;
//!
//! let mut page = client.get_access_keys(None).await?;
//! while let Some(keys) = page {
//!     for k in &keys.items {
//!         println!("{} = {}", k.name, k.key);
//!     }
//!     page = client.get_access_keys(Some(&keys)).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod jwt;
pub mod types;

pub use client::RestClient;
pub use error::{Error, SignatureError};
pub use jwt::{ClaimSigner, HS256, OrgClaim, PSK_TOKEN_LIFETIME, sign, token_from_psk, verify};
pub use types::{
    AccessKey, AccessKeys, Clients, DeviceClient, EntryPoint, OAuthToken, ObjectInstance,
    ObjectInstances, ObjectType, ObjectTypes, SUBSCRIPTION_MEDIA_TYPE, SubscriptionAttributes,
    SubscriptionRequest, SubscriptionResponse, Subscriptions,
};
