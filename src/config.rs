use std::path::Path;

use toml_edit::{DocumentMut, Item};

use crate::error::{Error, Result};

/// Identity of the development peer and the chaincode it hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConfig {
    pub peer_id: String,
    pub channel_id: String,
    pub chaincode_id: String,
}

impl Default for PeerConfig {
    fn default() -> Self {
        PeerConfig {
            peer_id: "peer0".to_string(),
            channel_id: "mychannel".to_string(),
            chaincode_id: "events_cc".to_string(),
        }
    }
}

impl PeerConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn peer_id(mut self, peer_id: impl Into<String>) -> Self {
        self.peer_id = peer_id.into();
        self
    }

    pub fn channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    pub fn chaincode_id(mut self, chaincode_id: impl Into<String>) -> Self {
        self.chaincode_id = chaincode_id.into();
        self
    }

    /// Reads a config file. Keys live in a `[peer]` table; missing keys keep
    /// their defaults and unknown keys are ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let doc: DocumentMut = contents.parse()?;
        let mut config = Self::default();

        let table = match doc.get("peer") {
            None => return Ok(config),
            Some(item) => item
                .as_table_like()
                .ok_or_else(|| Error::Config("`peer` must be a table".to_string()))?,
        };

        if let Some(item) = table.get("peer_id") {
            config.peer_id = string_value("peer_id", item)?;
        }
        if let Some(item) = table.get("channel_id") {
            config.channel_id = string_value("channel_id", item)?;
        }
        if let Some(item) = table.get("chaincode_id") {
            config.chaincode_id = string_value("chaincode_id", item)?;
        }

        Ok(config)
    }
}

fn string_value(key: &str, item: &Item) -> Result<String> {
    match item.as_str() {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        Some(_) => Err(Error::Config(format!("`{}` must not be empty", key))),
        None => Err(Error::Config(format!("`{}` must be a string", key))),
    }
}
