//! Command implementations for the CLI.

use std::io::Write;

use anyhow::{Context, Result, bail};
use deviceserver_client::{RestClient, token_from_psk};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::Settings;
use crate::credentials::{read_credentials, write_credentials};
use crate::display::{display_ok, format_created_key, format_key_entry};

/// Connects and authenticates with the stored credentials.
async fn authenticated_client(settings: &Settings) -> Result<RestClient> {
    let mut client = RestClient::connect(settings.client_config())?;
    let credentials = read_credentials(&settings.credentials)?;

    client
        .authenticate(&credentials)
        .await
        .context("Authentication failed")?;
    Ok(client)
}

/// Creates a new key/secret in the organisation of the stored credentials.
pub async fn create_key(settings: &Settings, name: &str) -> Result<()> {
    let client = authenticated_client(settings).await?;
    let key = client.create_access_key(name).await?;

    println!("{}", format_created_key(&key));
    Ok(())
}

/// Lists every access key, following pagination to the end.
pub async fn list_keys(settings: &Settings) -> Result<()> {
    let client = authenticated_client(settings).await?;

    let mut count = 0;
    let mut page = client.get_access_keys(None).await?;
    while let Some(keys) = page {
        for key in &keys.items {
            println!("{}", format_key_entry(count, key));
            count += 1;
        }
        page = client.get_access_keys(Some(&keys)).await?;
    }

    Ok(())
}

/// Deletes the key whose `self` URL is given.
pub async fn delete_key(settings: &Settings, self_url: &str) -> Result<()> {
    validate_self_url(self_url, &settings.deviceserver_url)?;

    let client = authenticated_client(settings).await?;
    client.delete(self_url).await?;
    Ok(())
}

/// Writes a PSK-signed admin token to `out`.
pub fn admin_token(out: &mut impl Write, psk: &SecretString, org_id: i64) -> Result<()> {
    let token = token_from_psk(psk, org_id)?;
    writeln!(out, "{}", token.expose_secret())?;
    Ok(())
}

/// Creates an organisation key with a PSK token and stores it as the credentials.
///
/// An `org_id` of zero lets the service allocate a new organisation.
pub async fn create_org(
    settings: &Settings,
    name: &str,
    psk: &SecretString,
    org_id: i64,
) -> Result<()> {
    let mut client = RestClient::connect(settings.client_config())?;
    let token = token_from_psk(psk, org_id)?;
    client.set_bearer_token(token.expose_secret())?;

    let key = client.create_access_key(name).await?;
    write_credentials(&settings.credentials, &key)?;

    display_ok();
    Ok(())
}

/// Checks that `self_url` is an http(s) URL on the configured device server.
pub fn validate_self_url(self_url: &str, deviceserver_url: &str) -> Result<Url> {
    let target = Url::parse(self_url).with_context(|| format!("Invalid self link '{self_url}'"))?;
    let server = Url::parse(deviceserver_url)
        .with_context(|| format!("Invalid device server URL '{deviceserver_url}'"))?;

    if !matches!(target.scheme(), "http" | "https") {
        bail!("Invalid scheme for self link: {}", target.scheme());
    }
    if target.host_str() != server.host_str() || target.port() != server.port() {
        bail!("Self link is not for this device server ({deviceserver_url})");
    }

    Ok(target)
}
