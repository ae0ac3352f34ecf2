//! Configuration management for the ROC node.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use handover_core::SessionConfig;
use roc_common::constants::{
    DEFAULT_GATE_ID, DEFAULT_LISTEN_ADDR, DEFAULT_MAILBOX_CAPACITY, DEFAULT_ORIGINATOR_ID,
    DEFAULT_RECEIVER_ID, DEFAULT_REDIS_URL, DEFAULT_VESSEL_ID, TAKEOVER_INTERVAL_MS,
    VESSEL_POLL_INTERVAL_MS, markers,
};

use crate::transport::check_segment;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// This ROC's identity (no default; set here, via --roc or ROC_ID)
    #[serde(default)]
    pub roc_id: Option<String>,

    /// Session mailbox capacity
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Handover session configuration
    #[serde(default)]
    pub handover: HandoverConfig,
}

/// Vessel, gate and parties of the handover this node takes part in
#[derive(Debug, Clone, Deserialize)]
pub struct HandoverConfig {
    #[serde(default = "default_gate_id")]
    pub gate_id: String,

    #[serde(default = "default_vessel_id")]
    pub vessel_id: String,

    /// ROC currently responsible for the vessel
    #[serde(default = "default_originator_id")]
    pub originator_id: String,

    /// ROC taking over at the gate
    #[serde(default = "default_receiver_id")]
    pub receiver_id: String,

    /// Marker in the vessel's handover request payload
    #[serde(default = "default_request_marker")]
    pub request_marker: String,

    /// Marker in the vessel's state payload once handover has finished
    #[serde(default = "default_completion_marker")]
    pub completion_marker: String,

    #[serde(default = "default_vessel_poll_interval")]
    pub vessel_poll_interval_ms: u64,

    #[serde(default = "default_takeover_interval")]
    pub takeover_interval_ms: u64,
}

impl Default for HandoverConfig {
    fn default() -> Self {
        Self {
            gate_id: default_gate_id(),
            vessel_id: default_vessel_id(),
            originator_id: default_originator_id(),
            receiver_id: default_receiver_id(),
            request_marker: default_request_marker(),
            completion_marker: default_completion_marker(),
            vessel_poll_interval_ms: default_vessel_poll_interval(),
            takeover_interval_ms: default_takeover_interval(),
        }
    }
}

// Default value functions
fn default_redis_url() -> String { DEFAULT_REDIS_URL.to_string() }
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_mailbox_capacity() -> usize { DEFAULT_MAILBOX_CAPACITY }
fn default_gate_id() -> String { DEFAULT_GATE_ID.to_string() }
fn default_vessel_id() -> String { DEFAULT_VESSEL_ID.to_string() }
fn default_originator_id() -> String { DEFAULT_ORIGINATOR_ID.to_string() }
fn default_receiver_id() -> String { DEFAULT_RECEIVER_ID.to_string() }
fn default_request_marker() -> String { markers::READY_FOR_HANDOVER.to_string() }
fn default_completion_marker() -> String { markers::HANDOVER_COMPLETED.to_string() }
fn default_vessel_poll_interval() -> u64 { VESSEL_POLL_INTERVAL_MS }
fn default_takeover_interval() -> u64 { TAKEOVER_INTERVAL_MS }

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            // Use defaults if config file doesn't exist
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref roc) = args.roc {
            config.roc_id = Some(roc.clone());
        }
        if let Some(ref redis_url) = args.redis_url {
            config.redis_url = redis_url.clone();
        }
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }

        Ok(config)
    }

    /// Build the session configuration for this node
    pub fn session_config(&self) -> Result<SessionConfig> {
        let self_id = match self.roc_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.trim(),
            _ => bail!("ROC id is not set (use --roc, ROC_ID or roc_id in the config file)"),
        };
        if self.handover.vessel_poll_interval_ms == 0 || self.handover.takeover_interval_ms == 0 {
            bail!("Handover timer intervals must be greater than zero");
        }

        let handover = &self.handover;
        check_segment("vessel id", &handover.vessel_id)?;
        check_segment("gate id", &handover.gate_id)?;
        check_segment("ROC id", self_id)?;
        check_segment("originator id", &handover.originator_id)?;
        check_segment("receiver id", &handover.receiver_id)?;

        Ok(SessionConfig {
            gate_id: handover.gate_id.clone(),
            vessel_id: handover.vessel_id.clone(),
            self_id: self_id.into(),
            originator_id: handover.originator_id.as_str().into(),
            receiver_id: handover.receiver_id.as_str().into(),
            request_marker: handover.request_marker.clone(),
            completion_marker: handover.completion_marker.clone(),
            vessel_poll_interval: Duration::from_millis(handover.vessel_poll_interval_ms),
            takeover_interval: Duration::from_millis(handover.takeover_interval_ms),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            listen_addr: default_listen_addr(),
            roc_id: None,
            mailbox_capacity: default_mailbox_capacity(),
            handover: HandoverConfig::default(),
        }
    }
}
