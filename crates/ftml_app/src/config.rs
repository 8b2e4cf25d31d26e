use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use ftml_core::MapOptions;
use ftml_engine::{ConvertOptions, PublishSettings, PublishTarget, ASSET_FOLDER};
use log::LevelFilter;
use serde::Deserialize;

use crate::cli::{ConvertArgs, PublishArgs};

/// Settings read from the optional RON file; command-line flags win over them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub portal_url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub source_id: Option<String>,
    pub customer: Option<String>,
    pub asset_folder: String,
    pub default_editorial_type: String,
    pub default_lang: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let map = MapOptions::default();
        let publish = PublishSettings::default();
        Self {
            portal_url: None,
            user: None,
            password: None,
            source_id: None,
            customer: None,
            asset_folder: ASSET_FOLDER.to_string(),
            default_editorial_type: map.default_editorial_type,
            default_lang: map.default_lang,
            connect_timeout_secs: publish.connect_timeout.as_secs(),
            request_timeout_secs: publish.request_timeout.as_secs(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `path`, or returns defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {path:?}"))?;
        ron::from_str(&text).with_context(|| format!("cannot parse config file {path:?}"))
    }

    pub fn apply_convert(&mut self, args: &ConvertArgs) {
        if let Some(customer) = &args.customer {
            self.customer = Some(customer.clone());
        }
    }

    pub fn apply_publish(&mut self, args: &PublishArgs) {
        self.apply_convert(&args.convert);
        override_with(&mut self.portal_url, &args.portal);
        override_with(&mut self.user, &args.user);
        override_with(&mut self.password, &args.password);
        override_with(&mut self.source_id, &args.source);
    }

    pub fn log_level(&self) -> anyhow::Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| anyhow!("unknown log level `{}`", self.log_level))
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            customer: self.customer.clone().filter(|c| !c.is_empty()),
            asset_folder: self.asset_folder.clone(),
            map: MapOptions {
                default_editorial_type: self.default_editorial_type.clone(),
                default_lang: self.default_lang.clone(),
                ..MapOptions::default()
            },
            ..ConvertOptions::default()
        }
    }

    pub fn publish_settings(&self) -> PublishSettings {
        PublishSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// Fails with the name of the first missing setting.
    pub fn publish_target(&self) -> anyhow::Result<PublishTarget> {
        Ok(PublishTarget {
            portal_url: required(&self.portal_url, "portal url (--portal)")?,
            login: required(&self.user, "user (--user)")?,
            password: required(&self.password, "password (--password or FTML_PASSWORD)")?,
            source_id: required(&self.source_id, "source id (--source)")?,
            customer: self.customer.clone().unwrap_or_default(),
        })
    }
}

fn override_with(slot: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        slot.clone_from(value);
    }
}

fn required(value: &Option<String>, what: &str) -> anyhow::Result<String> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("missing {what}"))
}
