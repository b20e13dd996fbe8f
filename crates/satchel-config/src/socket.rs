//! Listen endpoint parsing and rendering.
//!
//! Endpoints are expressed as `unix://` or `tcp://` URLs on the command line
//! and handed to the engine unmodified. Parsing rejects malformed addresses
//! early so the daemon never starts with an endpoint it cannot describe.

use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// An address the engine accepts connections on.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum ListenEndpoint {
    /// Unix domain socket endpoint.
    Unix {
        /// Filesystem path of the socket.
        path: Utf8PathBuf,
    },
    /// TCP endpoint.
    Tcp {
        /// Host name or address to bind.
        host: String,
        /// Port to bind.
        port: u16,
    },
}

impl ListenEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket path when the endpoint uses the Unix transport.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }
}

impl fmt::Display for ListenEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for ListenEndpoint {
    type Err = EndpointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => parse_unix(&url, input),
            "tcp" => parse_tcp(&url, input),
            other => Err(EndpointParseError::UnsupportedScheme(other.to_string())),
        }
    }
}

fn parse_unix(url: &Url, input: &str) -> Result<ListenEndpoint, EndpointParseError> {
    // `unix://run/x.sock` parses the first segment as an authority; insist on
    // the empty-authority form so the whole path survives.
    if url.host_str().is_some_and(|host| !host.is_empty()) {
        return Err(EndpointParseError::UnixAuthority(input.to_string()));
    }
    let path = url.path();
    if path.is_empty() {
        return Err(EndpointParseError::MissingUnixPath(input.to_string()));
    }
    Ok(ListenEndpoint::unix(path))
}

fn parse_tcp(url: &Url, input: &str) -> Result<ListenEndpoint, EndpointParseError> {
    let host = url
        .host_str()
        .ok_or_else(|| EndpointParseError::MissingHost(input.to_string()))?;
    let port = url
        .port()
        .ok_or_else(|| EndpointParseError::MissingPort(input.to_string()))?;
    Ok(ListenEndpoint::tcp(host, port))
}

/// Errors encountered while parsing a [`ListenEndpoint`] from text.
#[derive(Debug, Error)]
pub enum EndpointParseError {
    /// Scheme was neither `unix` nor `tcp`.
    #[error("unsupported listen scheme '{0}'")]
    UnsupportedScheme(String),
    /// Unix endpoint carried a host component.
    #[error("unix endpoint '{0}' must use the unix:///absolute/path form")]
    UnixAuthority(String),
    /// Unix endpoint had no path component.
    #[error("missing socket path in '{0}'")]
    MissingUnixPath(String),
    /// TCP endpoint had no host component.
    #[error("missing host in '{0}'")]
    MissingHost(String),
    /// TCP endpoint had no port.
    #[error("missing port in '{0}'")]
    MissingPort(String),
    /// Input was not a valid URL at all.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
