use crate::shared::error::StackError;
use crate::shared::Result;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// AWS does not allow subnets smaller than a /28
pub const SMALLEST_SUBNET_PREFIX: u8 = 28;

/// Address block of the VPC when none is configured
pub const DEFAULT_VPC_CIDR: Ipv4Cidr = Ipv4Cidr {
    network: Ipv4Addr::new(10, 0, 0, 0),
    prefix: 24,
};

/// An IPv4 network in CIDR notation, with no host bits set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn new(network: Ipv4Addr, prefix: u8) -> Result<Self> {
        if prefix > 32 {
            return Err(invalid(
                &format!("{}/{}", network, prefix),
                "prefix length must be between 0 and 32",
            ));
        }
        let bits = u32::from(network);
        if bits & !Self::mask(prefix) != 0 {
            return Err(invalid(
                &format!("{}/{}", network, prefix),
                "host bits are set; use the network address",
            ));
        }
        Ok(Self { network, prefix })
    }

    fn mask(prefix: u8) -> u32 {
        if prefix == 0 {
            0
        } else {
            u32::MAX << (32 - prefix)
        }
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Whether `other` lies entirely inside this network
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix >= self.prefix
            && u32::from(other.network) & Self::mask(self.prefix) == u32::from(self.network)
    }

    /// Splits this network into `count` equally sized subnets.
    ///
    /// The subnet size is the largest block that still fits `count` subnets
    /// (the next power of two), allocated from the bottom of the range.
    ///
    /// # Errors
    /// Returns an error if `count` is zero or the subnets would be smaller
    /// than [`SMALLEST_SUBNET_PREFIX`]
    pub fn subdivide(&self, count: usize) -> Result<Vec<Ipv4Cidr>> {
        if count == 0 {
            anyhow::bail!("Cannot split {} into zero subnets", self);
        }
        let extra_bits = count.next_power_of_two().trailing_zeros() as u8;
        let subnet_prefix = self.prefix + extra_bits;
        if subnet_prefix > SMALLEST_SUBNET_PREFIX {
            return Err(StackError::InvalidContext {
                key: "network.cidr".to_string(),
                reason: format!(
                    "{} is too small for {} subnets (each would be a /{}, smallest allowed is /{})",
                    self, count, subnet_prefix, SMALLEST_SUBNET_PREFIX
                ),
            }
            .into());
        }

        let block_size = 1u32 << (32 - subnet_prefix);
        let base = u32::from(self.network);
        (0..count as u32)
            .map(|i| Ipv4Cidr::new(Ipv4Addr::from(base + i * block_size), subnet_prefix))
            .collect()
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = split_cidr(s)?;
        let network = Ipv4Addr::from_str(addr).map_err(|e| invalid(s, &e.to_string()))?;
        Ipv4Cidr::new(network, prefix)
    }
}

/// An IPv6 network in CIDR notation, with no host bits set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv6Cidr {
    network: Ipv6Addr,
    prefix: u8,
}

impl Ipv6Cidr {
    pub fn new(network: Ipv6Addr, prefix: u8) -> Result<Self> {
        if prefix > 128 {
            return Err(invalid(
                &format!("{}/{}", network, prefix),
                "prefix length must be between 0 and 128",
            ));
        }
        let mask = if prefix == 0 {
            0
        } else {
            u128::MAX << (128 - prefix)
        };
        if u128::from(network) & !mask != 0 {
            return Err(invalid(
                &format!("{}/{}", network, prefix),
                "host bits are set; use the network address",
            ));
        }
        Ok(Self { network, prefix })
    }
}

impl fmt::Display for Ipv6Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// A source range for an allow-list entry, either address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IpCidr {
    V4(Ipv4Cidr),
    V6(Ipv6Cidr),
}

impl fmt::Display for IpCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpCidr::V4(c) => c.fmt(f),
            IpCidr::V6(c) => c.fmt(f),
        }
    }
}

impl FromStr for IpCidr {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains(':') {
            let (addr, prefix) = split_cidr(s)?;
            let network = Ipv6Addr::from_str(addr).map_err(|e| invalid(s, &e.to_string()))?;
            Ok(IpCidr::V6(Ipv6Cidr::new(network, prefix)?))
        } else {
            Ok(IpCidr::V4(Ipv4Cidr::from_str(s)?))
        }
    }
}

fn split_cidr(s: &str) -> Result<(&str, u8)> {
    let (addr, prefix) = s
        .split_once('/')
        .ok_or_else(|| invalid(s, "missing '/<prefix>' suffix"))?;
    let prefix = prefix
        .parse::<u8>()
        .map_err(|_| invalid(s, "prefix length is not a number"))?;
    Ok((addr, prefix))
}

fn invalid(value: &str, reason: &str) -> anyhow::Error {
    StackError::InvalidCidr {
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
