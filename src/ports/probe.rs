//! OS-level port probing
//!
//! Allocation ("is this port free?") and resolution ("is this workspace
//! live?") ask the same question, so both go through [`PortProbe`].

use std::collections::HashSet;
use std::net::{Ipv4Addr, TcpListener};
use std::sync::{Arc, Mutex};
use tracing::trace;

pub trait PortProbe: Send + Sync {
    /// Whether something on this host already holds `port`
    fn is_in_use(&self, port: u16) -> bool;
}

/// Probes by binding the port on the loopback interface and releasing it
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpBindProbe;

impl PortProbe for TcpBindProbe {
    fn is_in_use(&self, port: u16) -> bool {
        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)) {
            Ok(listener) => {
                drop(listener);
                false
            }
            Err(e) => {
                trace!(port, error = %e, "Port is not bindable");
                true
            }
        }
    }
}

/// Probe answering from a fixed set of ports considered bound
#[derive(Debug, Clone, Default)]
pub struct MockPortProbe {
    in_use: Arc<Mutex<HashSet<u16>>>,
}

impl MockPortProbe {
    /// Every port is free
    pub fn free() -> Self {
        Self::default()
    }

    pub fn with_in_use<I: IntoIterator<Item = u16>>(ports: I) -> Self {
        Self {
            in_use: Arc::new(Mutex::new(ports.into_iter().collect())),
        }
    }

    pub fn bind(&self, port: u16) {
        self.in_use
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(port);
    }
}

impl PortProbe for MockPortProbe {
    fn is_in_use(&self, port: u16) -> bool {
        self.in_use
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_port_is_in_use() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(TcpBindProbe.is_in_use(port));
    }

    #[test]
    fn test_released_port_is_free_again() {
        let port = {
            let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
            listener.local_addr().unwrap().port()
        };

        assert!(!TcpBindProbe.is_in_use(port));
    }
}
