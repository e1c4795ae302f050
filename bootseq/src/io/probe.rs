//! Network readiness probing.

use std::fmt;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, instrument};

use crate::core::error::StepError;

/// A host/port pair to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Bounded polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(1),
        }
    }
}

/// A single reachability check.
pub trait Probe {
    /// Returns `TransientProbeFailure` when the endpoint is not (yet) reachable.
    fn probe(&self, endpoint: &Endpoint) -> Result<(), StepError>;
}

/// Pause between attempts. Injected so tests never block.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Probe that opens (and immediately drops) a TCP connection.
pub struct TcpProbe {
    pub connect_timeout: Duration,
}

impl Probe for TcpProbe {
    fn probe(&self, endpoint: &Endpoint) -> Result<(), StepError> {
        let transient = |reason: String| StepError::TransientProbeFailure {
            endpoint: endpoint.to_string(),
            reason,
        };
        // Resolution failures are transient too: container DNS may lag the service.
        let addrs = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|err| transient(format!("resolve: {err}")))?;
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(_) => return Ok(()),
                Err(err) => last_err = Some(err),
            }
        }
        Err(transient(match last_err {
            Some(err) => err.to_string(),
            None => "no addresses resolved".to_string(),
        }))
    }
}

/// Poll `endpoint` until it answers or `policy.max_attempts` probes were made.
///
/// Sleeps `policy.interval` between attempts, never after the last one.
/// Returns the 1-based attempt that succeeded. Transient failures are logged at
/// debug level only; exhausting the bound yields `ProbeTimeout`.
#[instrument(skip_all, fields(endpoint = %endpoint, max_attempts = policy.max_attempts))]
pub fn wait_for_endpoint<P: Probe + ?Sized, S: Sleeper + ?Sized>(
    probe: &P,
    sleeper: &S,
    endpoint: &Endpoint,
    policy: PollPolicy,
) -> Result<u32, StepError> {
    for attempt in 1..=policy.max_attempts {
        match probe.probe(endpoint) {
            Ok(()) => {
                debug!(attempt, "endpoint reachable");
                return Ok(attempt);
            }
            Err(StepError::TransientProbeFailure { reason, .. }) => {
                debug!(attempt, max_attempts = policy.max_attempts, %reason, "probe failed");
            }
            Err(other) => return Err(other),
        }
        if attempt < policy.max_attempts {
            sleeper.sleep(policy.interval);
        }
    }
    Err(StepError::ProbeTimeout {
        endpoint: endpoint.to_string(),
        attempts: policy.max_attempts,
    })
}
