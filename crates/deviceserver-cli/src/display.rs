//! Output formatting.

use colored::Colorize;
use deviceserver_client::AccessKey;
use secrecy::ExposeSecret;

/// Full description of a newly created key, secret included.
pub fn format_created_key(key: &AccessKey) -> String {
    let secret = key
        .secret
        .as_ref()
        .map_or("", |s| s.expose_secret());

    format!(
        "{}   {}\n{}    {}\n{} {}\n{}   {}",
        "Name:".bright_blue(),
        key.name,
        "Key:".bright_blue(),
        key.key.bright_cyan(),
        "Secret:".bright_blue(),
        secret.bright_yellow(),
        "Self:".bright_blue(),
        key.links.self_href()
    )
}

/// One entry of the key listing.
pub fn format_key_entry(index: usize, key: &AccessKey) -> String {
    format!(
        "[{index}] '{}' = {}\n  {}\n",
        key.name,
        key.key.bright_cyan(),
        key.links.self_href()
    )
}

pub fn display_ok() {
    println!("{}", "OK".bright_green());
}
