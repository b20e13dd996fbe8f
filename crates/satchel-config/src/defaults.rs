//! Default locations for daemon state and collaborator processes.

use crate::socket::ListenEndpoint;

/// Default daemon home directory.
pub const HOME_DIR: &str = "/var/lib/satchel";

/// Default engine listen endpoint in URL form.
pub const LISTEN_ENDPOINT: &str = "unix:///run/satchel/satcheld.sock";

/// Socket path component of [`LISTEN_ENDPOINT`].
pub const LISTEN_SOCKET_PATH: &str = "/run/satchel/satcheld.sock";

/// Default runtime backend socket path.
pub const RUNTIME_ADDR: &str = "/run/satchel/containerd.sock";

/// Default runtime backend executable.
pub const RUNTIME_PATH: &str = "/usr/local/bin/containerd";

/// Default configuration file handed to the runtime backend.
pub const RUNTIME_CONFIG: &str = "/etc/satchel/containerd.toml";

/// Default engine listen endpoint.
#[must_use]
pub fn listen_endpoint() -> ListenEndpoint {
    ListenEndpoint::unix(LISTEN_SOCKET_PATH)
}
