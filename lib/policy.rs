//! Generated server policy files.
//!
//! `caps.txt` and `robots.txt` are synthesized from settings at startup and
//! installed into the cache as generated entries. Should one ever be
//! evicted, the content factory rebuilds it on the next fetch.

use std::fmt::Write as _;

use bytes::Bytes;
use tracing::info;

use crate::cache::contents::GeneratedContents;
use crate::cache::fcache::FileCache;
use crate::error::FileError;
use crate::menu::line::CRLF;
use crate::settings::Settings;
use crate::{SERVER_SOFTWARE, SERVER_VERSION};

/// Synthesize the `caps.txt` capability statement.
#[must_use]
pub fn generate_caps_txt(settings: &Settings) -> Bytes {
    let mut text = String::new();
    for line in [
        "CAPS",
        "",
        "# This is an automatically generated",
        "# server policy file: caps.txt",
        "",
        "CapsVersion=1",
        "ExpireCapsAfter=1800",
        "",
        "PathDelimeter=/",
        "PathIdentity=.",
        "PathParent=..",
        "PathParentDouble=FALSE",
        "PathEscapeCharacter=\\",
        "PathKeepPreDelimeter=FALSE",
        "",
    ] {
        text.push_str(line);
        text.push_str(CRLF);
    }
    let _ = write!(
        text,
        "ServerSoftware={SERVER_SOFTWARE}{CRLF}\
         ServerSoftwareVersion={SERVER_VERSION}{CRLF}\
         ServerDescription={}{CRLF}\
         ServerGeolocationString={}{CRLF}\
         ServerDefaultEncoding=ascii{CRLF}\
         {CRLF}\
         ServerAdmin={}{CRLF}",
        settings.description, settings.geolocation, settings.admin_email,
    );
    Bytes::from(text)
}

/// Synthesize the `robots.txt` anti-crawler statement.
#[must_use]
pub fn generate_robots_txt() -> Bytes {
    let mut text = String::new();
    for line in [
        "Usage-agent: *",
        "Disallow: *",
        "",
        "Crawl-delay: 99999",
        "",
        "# This server does not support scraping",
    ] {
        text.push_str(line);
        text.push_str(CRLF);
    }
    Bytes::from(text)
}

/// Synthesize both policy files and install them into `cache` at their
/// canonical paths. Runs single-threaded at startup, before the listener or
/// the monitor exist.
pub async fn install_policy_files(
    cache: &FileCache,
    settings: &Settings,
) -> Result<(), FileError> {
    cache
        .install(
            &settings.caps_txt_path(),
            Box::new(GeneratedContents::new(generate_caps_txt(settings))),
        )
        .await?;
    info!("cached generated policy file: /caps.txt");

    cache
        .install(
            &settings.robots_txt_path(),
            Box::new(GeneratedContents::new(generate_robots_txt())),
        )
        .await?;
    info!("cached generated policy file: /robots.txt");

    Ok(())
}
