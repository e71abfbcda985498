use core::time::Duration;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::OnceLock;

use crate::{Error, FlakeGenerator, FlakeId, Result};

/// Documentation-only address (TEST-NET-1). Connecting a UDP socket to it
/// selects the outbound interface without sending anything.
const PROBE_ADDR: (Ipv4Addr, u16) = (Ipv4Addr::new(192, 0, 2, 1), 9);

static DEFAULT_GENERATOR: OnceLock<FlakeGenerator> = OnceLock::new();

/// Derives a worker ID from an IPv4 address: the address as a big-endian
/// integer, modulo 1024.
///
/// Hosts whose addresses agree in their low 10 bits collide, so this is a
/// convenience for small deployments, not an allocation scheme.
///
/// ```
/// use flakeid::worker_id_from_ipv4;
/// use std::net::Ipv4Addr;
///
/// assert_eq!(worker_id_from_ipv4(Ipv4Addr::new(10, 0, 0, 1)), 1);
/// assert_eq!(worker_id_from_ipv4(Ipv4Addr::new(192, 168, 1, 10)), 266);
/// ```
pub fn worker_id_from_ipv4(ip: Ipv4Addr) -> u64 {
    u64::from(u32::from(ip)) % (FlakeId::max_worker_id() + 1)
}

/// Returns the IPv4 address this host would use for outbound traffic.
///
/// # Errors
///
/// Returns [`Error::WorkerDiscovery`] if no socket can be bound, there is no
/// IPv4 route, or the selected address is unspecified.
pub fn local_ipv4() -> Result<Ipv4Addr> {
    let discovery = |e: std::io::Error| Error::WorkerDiscovery {
        reason: e.to_string(),
    };

    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(discovery)?;
    socket.connect(PROBE_ADDR).map_err(discovery)?;
    match socket.local_addr().map_err(discovery)?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
        ip => Err(Error::WorkerDiscovery {
            reason: format!("no usable IPv4 address (got {ip})"),
        }),
    }
}

impl FlakeGenerator {
    /// Creates a system-clock generator whose worker ID is derived from the
    /// host's outbound IPv4 address via [`worker_id_from_ipv4`].
    ///
    /// # Errors
    ///
    /// - [`Error::WorkerDiscovery`] if the local address cannot be determined.
    /// - [`Error::EpochInFuture`] if `epoch` is later than the current time.
    pub fn from_local_ip(epoch: Duration) -> Result<Self> {
        let ip = local_ipv4()?;
        let worker_id = worker_id_from_ipv4(ip);

        #[cfg(feature = "tracing")]
        tracing::info!(%ip, worker_id, "derived worker id from local address");

        Self::new(worker_id, epoch)
    }
}

/// Returns a lazily initialised process-wide generator.
///
/// The generator uses [`FlakeGenerator::from_local_ip`] with the default
/// epoch. Prefer constructing a [`FlakeGenerator`] explicitly and passing it
/// to whatever needs IDs; this exists for call sites with no configuration to
/// hand.
///
/// # Errors
///
/// Returns the construction error if the generator has not been initialised
/// yet and the local address cannot be determined. A later call retries.
pub fn default_generator() -> Result<&'static FlakeGenerator> {
    if let Some(generator) = DEFAULT_GENERATOR.get() {
        return Ok(generator);
    }
    let generator = FlakeGenerator::from_local_ip(Duration::ZERO)?;
    // A racing thread may have won; its instance is kept and ours dropped.
    Ok(DEFAULT_GENERATOR.get_or_init(|| generator))
}
