//! Centralized validation functions for partneracl.
//!
//! This module provides unified validation for:
//! - IPv4 addresses and CIDR ranges
//! - SIDs (format only; existence is checked against the reference table)
//! - Certification ids and partner names
//! - Audit metadata (employee id, requester, contact email)

use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

use crate::error::AclError;

/// Opening and closing sequences of a partner block header.
pub const HEADER_OPEN: &str = "##--";
pub const HEADER_CLOSE: &str = "--##";

static SID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{2}$").expect("static regex"));

static CERT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("static regex"));

static EMPLOYEE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z])([0-9]{6})$").expect("static regex"));

/// Check whether a string is a usable IPv4 source address.
///
/// Accepts a dotted quad with an optional `/0`..`/32` suffix.
/// The unspecified address `0.0.0.0` is rejected with or without a suffix.
/// Zero-padded octets such as `010` are rejected: `inet_aton`-style
/// parsers read them as octal, so the router could see another address.
///
/// # Examples
/// ```
/// use partneracl::validation::is_valid_ipv4;
/// assert!(is_valid_ipv4("10.1.1.1"));
/// assert!(is_valid_ipv4("192.168.0.0/24"));
/// assert!(!is_valid_ipv4("0.0.0.0/8"));
/// assert!(!is_valid_ipv4("256.1.1.1"));
/// assert!(!is_valid_ipv4("010.1.1.1"));
/// ```
pub fn is_valid_ipv4(ip_str: &str) -> bool {
    if !ip_str.is_ascii() {
        return false;
    }

    let (addr_part, prefix_part) = match ip_str.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (ip_str, None),
    };

    let addr: Ipv4Addr = match addr_part.parse() {
        Ok(addr) => addr,
        Err(_) => return false,
    };

    if let Some(prefix) = prefix_part {
        if prefix.is_empty() || prefix.len() > 2 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        if ip_str.parse::<ipnet::Ipv4Net>().is_err() {
            return false;
        }
    }

    !addr.is_unspecified()
}

/// Validate an IPv4 address or CIDR and return it trimmed.
pub fn validate_ipv4(ip_str: &str) -> Result<String, AclError> {
    let ip = ip_str.trim();
    if !is_valid_ipv4(ip) {
        return Err(AclError::invalid(
            "IP address",
            format!("'{}' is not a dotted-quad IPv4 address (optional /0-32)", ip),
        ));
    }
    Ok(ip.to_string())
}

/// Check the SID format: one letter followed by two letters or digits.
///
/// # Examples
/// ```
/// use partneracl::validation::is_valid_sid_format;
/// assert!(is_valid_sid_format("A1b"));
/// assert!(!is_valid_sid_format("abcd"));
/// assert!(!is_valid_sid_format("12"));
/// ```
pub fn is_valid_sid_format(sid: &str) -> bool {
    SID_RE.is_match(sid)
}

/// Validate a SID and return it trimmed.
pub fn validate_sid(sid: &str) -> Result<String, AclError> {
    let sid = sid.trim();
    if !is_valid_sid_format(sid) {
        return Err(AclError::invalid(
            "SID",
            format!("'{}' must be 3 characters: a letter then letters or digits", sid),
        ));
    }
    Ok(sid.to_string())
}

/// Validate a certification id (digits only).
pub fn validate_certification_id(cert_id: &str) -> Result<String, AclError> {
    let cert_id = cert_id.trim();
    if !CERT_ID_RE.is_match(cert_id) {
        return Err(AclError::invalid(
            "certification id",
            format!("'{}' must be numeric", cert_id),
        ));
    }
    Ok(cert_id.to_string())
}

/// Validate a partner name for use inside a block header.
pub fn validate_partner_name(name: &str) -> Result<String, AclError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AclError::invalid("partner name", "cannot be empty"));
    }
    if name.contains(HEADER_OPEN) || name.contains(HEADER_CLOSE) {
        return Err(AclError::invalid(
            "partner name",
            format!("cannot contain '{}' or '{}'", HEADER_OPEN, HEADER_CLOSE),
        ));
    }
    if name.contains(['\n', '\r']) {
        return Err(AclError::invalid("partner name", "cannot contain line breaks"));
    }
    Ok(name.to_string())
}

/// Validate an employee id: one letter from `allowed_letters` then 6 digits.
///
/// The letter is matched case-insensitively and returned uppercase.
pub fn validate_employee_id(employee_id: &str, allowed_letters: &str) -> Result<String, AclError> {
    let employee_id = employee_id.trim();
    let caps = EMPLOYEE_ID_RE.captures(employee_id).ok_or_else(|| {
        AclError::invalid(
            "employee id",
            format!("'{}' must be one letter followed by 6 digits", employee_id),
        )
    })?;

    let letter = caps[1].to_ascii_uppercase();
    if !allowed_letters.to_ascii_uppercase().contains(letter.as_str()) {
        return Err(AclError::invalid(
            "employee id",
            format!(
                "'{}' must start with one of: {}",
                employee_id,
                allowed_letters.to_ascii_uppercase()
            ),
        ));
    }

    Ok(format!("{}{}", letter, &caps[2]))
}

/// Validate free-text requester name. The audit tag uses `|` and `#` as
/// delimiters so neither may appear.
pub fn validate_requested_by(name: &str) -> Result<String, AclError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AclError::invalid("requester name", "cannot be empty"));
    }
    if name.contains(['|', '#', '\n', '\r']) {
        return Err(AclError::invalid(
            "requester name",
            "cannot contain '|', '#' or line breaks",
        ));
    }
    Ok(name.to_string())
}

/// Validate a contact email: must contain `@` and `.`, no whitespace or
/// audit delimiters.
pub fn validate_email(email: &str) -> Result<String, AclError> {
    let email = email.trim();
    if !email.contains('@') || !email.contains('.') {
        return Err(AclError::invalid(
            "email",
            format!("'{}' must contain '@' and '.'", email),
        ));
    }
    if email.contains(|c: char| c.is_whitespace() || c == '|' || c == '#') {
        return Err(AclError::invalid(
            "email",
            format!("'{}' cannot contain whitespace, '|' or '#'", email),
        ));
    }
    Ok(email.to_string())
}
