//! interest.toml configuration parser.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::DocumentOptions;
use crate::error::{ShellError, ShellResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub server: ServerConfig,
    pub document: DocumentConfig,
    pub queue: QueueConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub lang: String,
    /// Markup inserted verbatim at the end of `<head>`.
    pub head_content: Option<String>,
    /// Attribute text inserted verbatim into the `<body>` open tag.
    pub body_attributes: Option<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            head_content: None,
            body_attributes: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Chunks buffered per response before the renderer waits for the
    /// client. Unbounded when absent.
    pub capacity: Option<usize>,
}

impl ShellConfig {
    pub fn from_file(path: &Path) -> ShellResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ShellError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ShellResult<Self> {
        let config: ShellConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ShellResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ShellResult<()> {
        if self.queue.capacity == Some(0) {
            return Err(ShellError::InvalidConfig(
                "queue.capacity must be greater than 0".to_string(),
            ));
        }
        if self.document.lang.trim().is_empty() {
            return Err(ShellError::InvalidConfig(
                "document.lang must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace the port of the bind address.
    pub fn with_port(mut self, port: u16) -> Self {
        self.server.bind.set_port(port);
        self
    }

    pub fn document_options(&self) -> DocumentOptions {
        DocumentOptions {
            lang: self.document.lang.clone(),
            head_content: self.document.head_content.clone(),
            body_attributes: self.document.body_attributes.clone(),
        }
    }
}
