//! Server configuration

use std::net::SocketAddr;

/// Default dispatch queue depth when none is configured
const DEFAULT_DISPATCH_CAPACITY: usize = 1024;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Depth of the coordinator's dispatch queue
    pub dispatch_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // The original deployment's signaling port
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            max_connections: 0, // Unlimited
            tcp_nodelay: true,  // Important for low latency
            dispatch_capacity: DEFAULT_DISPATCH_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }

    /// Set the dispatch queue depth (minimum 1)
    pub fn dispatch_capacity(mut self, capacity: usize) -> Self {
        self.dispatch_capacity = capacity.max(1);
        self
    }
}
