use std::net::{IpAddr, Ipv4Addr};

use log::debug;
use trust_dns_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveError;
use trust_dns_resolver::proto::rr::RData;
use trust_dns_resolver::{system_conf, Resolver};

use crate::error::{PingError, Result};

/// Outcome of resolving the ping target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// End of the CNAME chain, or the name as given when there is none.
    pub cname: String,
    pub addrs: Vec<Ipv4Addr>,
}

impl Resolution {
    /// The address probed: the first A record.
    pub fn addr(&self) -> Ipv4Addr {
        self.addrs[0]
    }
}

/// Resolve `host` to IPv4 addresses and its canonical name.
///
/// Address literals are returned as-is without a DNS round trip.
pub fn resolve(host: &str) -> Result<Resolution> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(addr) => Ok(Resolution {
                cname: host.to_string(),
                addrs: vec![addr],
            }),
            IpAddr::V6(_) => Err(PingError::UnsupportedAddress(ip)),
        };
    }

    let resolve_err = |source: ResolveError| PingError::Resolve {
        host: host.to_string(),
        source,
    };

    let (config, mut opts) = system_conf::read_system_conf().unwrap_or_else(|e| {
        debug!("no usable system resolver config ({}), using defaults", e);
        (ResolverConfig::default(), ResolverOpts::default())
    });
    opts.ip_strategy = LookupIpStrategy::Ipv4Only;
    let resolver = Resolver::new(config, opts).map_err(|e| resolve_err(e.into()))?;

    let lookup = resolver.lookup_ip(host).map_err(resolve_err)?;
    let cnames = lookup
        .as_lookup()
        .record_iter()
        .filter_map(|record| record.data().and_then(RData::as_cname))
        .map(|name| name.to_string());
    let cname = canonical_name(host, cnames);

    let addrs: Vec<Ipv4Addr> = lookup
        .iter()
        .filter_map(|ip| match ip {
            IpAddr::V4(addr) => Some(addr),
            IpAddr::V6(_) => None,
        })
        .collect();
    debug!("{} resolved to {:?} via {}", host, addrs, cname);

    if addrs.is_empty() {
        return Err(PingError::NoAddress(host.to_string()));
    }
    Ok(Resolution { cname, addrs })
}

/// Pick the last CNAME target seen, without its trailing dot.
fn canonical_name<I>(host: &str, cnames: I) -> String
where
    I: IntoIterator<Item = String>,
{
    cnames
        .into_iter()
        .last()
        .map(|name| name.trim_end_matches('.').to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| host.to_string())
}
