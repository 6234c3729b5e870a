//! Human-facing ticket numbers and opaque scan codes.
//!
//! [`TicketNumber`] is printed on the ticket (`TKT-<unix millis>-<9 base36>`).
//! [`ScanCode`] is the bearer credential encoded in the QR image
//! (`QR-<uuid v4>`). Both are unique across the store; the store's unique
//! indexes are the real guarantee, generation is only probabilistically
//! unique.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Prefix of every ticket number.
pub const TICKET_NUMBER_PREFIX: &str = "TKT";

/// Prefix of every scan code.
pub const SCAN_CODE_PREFIX: &str = "QR";

/// Length of the random base36 suffix of a ticket number.
pub const TICKET_NUMBER_SUFFIX_LEN: usize = 9;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Human-displayable ticket number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketNumber(String);

impl TicketNumber {
    /// Wraps a stored ticket number.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the ticket number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque scan code presented at the gate.
///
/// Never derived from the ticket or owner id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanCode(String);

impl ScanCode {
    /// Wraps a scanned or stored code.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of fresh ticket identifiers.
///
/// Pure and synchronous. Swappable so tests can force collisions.
pub trait IdentifierGenerator: Send + Sync + fmt::Debug {
    /// Produces a new ticket number for a ticket issued at `issued_at`.
    fn ticket_number(&self, issued_at: DateTime<Utc>) -> TicketNumber;

    /// Produces a new high-entropy scan code.
    fn scan_code(&self) -> ScanCode;
}

/// Default generator backed by the thread-local RNG and UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentifiers;

impl IdentifierGenerator for RandomIdentifiers {
    fn ticket_number(&self, issued_at: DateTime<Utc>) -> TicketNumber {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..TICKET_NUMBER_SUFFIX_LEN)
            .filter_map(|_| BASE36.get(rng.gen_range(0..BASE36.len())))
            .map(|b| char::from(*b))
            .collect();
        TicketNumber(format!(
            "{TICKET_NUMBER_PREFIX}-{}-{suffix}",
            issued_at.timestamp_millis()
        ))
    }

    fn scan_code(&self) -> ScanCode {
        ScanCode(format!("{SCAN_CODE_PREFIX}-{}", uuid::Uuid::new_v4()))
    }
}
