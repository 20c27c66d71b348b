//! Fixed-width IPv4 address arithmetic.
//!
//! Pure functions over 32-bit addresses and prefix lengths: dotted-quad
//! parsing, masks, block bounds and strict CIDR parsing. Nothing here holds
//! state, so every function is safe to call from anywhere.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;

use super::block::AddressBlock;
use crate::error::{PlanError, PlanResult};

/// Longest valid IPv4 prefix length.
pub const MAX_PREFIX: u8 = 32;

static CIDR_PATTERN: LazyLock<Regex> = LazyLock::new(||
    Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})/(\d{1,2})$").unwrap()
);

/// Parse a dotted-quad address into its integer form.
///
/// Fails with `MalformedInput` on wrong arity, non-numeric octets or
/// octets outside `[0, 255]`.
///
/// # Examples
/// ```
/// use subnet_planner::ip::address::address_to_integer;
///
/// assert_eq!(address_to_integer("10.0.0.1"), Ok(0x0A00_0001));
/// assert!(address_to_integer("10.0.0").is_err());
/// assert!(address_to_integer("10.0.0.256").is_err());
/// ```
pub fn address_to_integer(dotted: &str) -> PlanResult<u32> {
    let parts: Vec<&str> = dotted.split('.').collect();
    if parts.len() != 4 {
        return Err(PlanError::malformed(format!(
            "'{}' must have exactly 4 octets, found {}",
            dotted,
            parts.len()
        )));
    }

    let mut value: u32 = 0;
    for part in parts {
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PlanError::malformed(format!(
                "'{}' has non-numeric octet '{}'",
                dotted, part
            )));
        }
        let octet: u16 = part
            .parse()
            .map_err(|_| PlanError::malformed(format!("'{}' has invalid octet '{}'", dotted, part)))?;
        if octet > 255 {
            return Err(PlanError::malformed(format!(
                "'{}' has octet {} outside [0, 255]",
                dotted, octet
            )));
        }
        value = (value << 8) | u32::from(octet);
    }
    Ok(value)
}

/// Render an integer address as a dotted quad. Exact inverse of
/// [`address_to_integer`].
pub fn integer_to_address(value: u32) -> String {
    Ipv4Addr::from(value).to_string()
}

fn check_prefix(prefix: u8) -> PlanResult<()> {
    if prefix > MAX_PREFIX {
        return Err(PlanError::malformed(format!(
            "prefix /{} outside [0, {}]",
            prefix, MAX_PREFIX
        )));
    }
    Ok(())
}

/// Netmask for a prefix length, clamped to /32.
pub(crate) fn mask_bits(prefix: u8) -> u32 {
    match prefix.min(MAX_PREFIX) {
        0 => 0,
        p => u32::MAX << (MAX_PREFIX - p),
    }
}

/// Netmask for a prefix length. Fails if `prefix` is outside `[0, 32]`.
pub fn prefix_to_mask(prefix: u8) -> PlanResult<u32> {
    check_prefix(prefix)?;
    Ok(mask_bits(prefix))
}

/// Number of addresses in a block of the given prefix: `2^(32 - prefix)`.
///
/// `prefix` must already be validated to `[0, 32]`. Release builds clamp
/// anything larger to /32 and report a single address.
pub fn address_count(prefix: u8) -> u64 {
    debug_assert!(prefix <= MAX_PREFIX, "prefix /{} is out of range", prefix);
    1u64 << (MAX_PREFIX - prefix.min(MAX_PREFIX))
}

/// Usable host count: 1 for /32, 2 for /31 (point-to-point),
/// otherwise the block size minus network and broadcast.
///
/// Same `[0, 32]` precondition as [`address_count`]; larger prefixes are
/// treated as /32 in release builds.
pub fn usable_hosts(prefix: u8) -> u64 {
    debug_assert!(prefix <= MAX_PREFIX, "prefix /{} is out of range", prefix);
    match prefix {
        p if p >= MAX_PREFIX => 1,
        31 => 2,
        p => address_count(p).saturating_sub(2),
    }
}

/// Parse strict `ddd.ddd.ddd.ddd/pp` CIDR text.
///
/// Host bits in the address part are cleared, so the returned block always
/// starts at its network address.
///
/// # Examples
/// ```
/// use subnet_planner::ip::address::parse_cidr;
///
/// let block = parse_cidr("192.168.1.77/24").unwrap();
/// assert_eq!(block.to_string(), "192.168.1.0/24");
/// assert!(parse_cidr("10.0.0.256/24").is_err());
/// assert!(parse_cidr("10.0.0.0/33").is_err());
/// ```
pub fn parse_cidr(text: &str) -> PlanResult<AddressBlock> {
    let caps = CIDR_PATTERN
        .captures(text)
        .ok_or_else(|| PlanError::malformed(format!("'{}' is not in a.b.c.d/p form", text)))?;

    let prefix: u8 = caps[5]
        .parse()
        .map_err(|_| PlanError::malformed(format!("'{}' has an invalid prefix", text)))?;
    check_prefix(prefix)?;

    let dotted = format!("{}.{}.{}.{}", &caps[1], &caps[2], &caps[3], &caps[4]);
    let ip = address_to_integer(&dotted)?;
    AddressBlock::new(ip, prefix)
}

/// Network address of `ip` under `prefix`.
pub fn network(ip: u32, prefix: u8) -> u32 {
    ip & mask_bits(prefix)
}

/// Broadcast (last) address of the block containing `ip`.
pub fn broadcast(ip: u32, prefix: u8) -> u32 {
    network(ip, prefix) | !mask_bits(prefix)
}

/// First and last host addresses of the block containing `ip`.
///
/// A /32 yields the single address twice. A /31 yields both of its
/// addresses (RFC 3021). Anything larger excludes network and broadcast.
pub fn host_range(ip: u32, prefix: u8) -> (u32, u32) {
    let net = network(ip, prefix);
    let last = broadcast(ip, prefix);
    match prefix {
        p if p >= MAX_PREFIX => (net, net),
        31 => (net, last),
        _ => (net + 1, last - 1),
    }
}

/// True iff `ip` lies inside `cidr`.
///
/// Returns `false` when either argument fails to parse; it never errors.
pub fn contains(ip: &str, cidr: &str) -> bool {
    let (Ok(addr), Ok(block)) = (address_to_integer(ip), parse_cidr(cidr)) else {
        return false;
    };
    block.contains_address(addr)
}
