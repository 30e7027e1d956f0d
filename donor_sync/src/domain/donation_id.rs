use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Identifier of a single donation as the source platform emits it.
///
/// Only used to order donations of one donor. A blank identifier sorts
/// first, all-digit identifiers compare numerically and come next, and
/// everything else compares as text.
#[derive(Debug, Clone)]
pub struct DonationId {
    raw: String,
    key: OrderingKey,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum OrderingKey {
    Missing,
    Numeric(u128),
    Text(String),
}

impl DonationId {
    pub fn parse(s: impl Into<String>) -> Self {
        let raw: String = s.into();
        let trimmed = raw.trim();
        let is_numeric = !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit());

        let key = if trimmed.is_empty() {
            OrderingKey::Missing
        } else {
            match trimmed.parse::<u128>() {
                Ok(value) if is_numeric => OrderingKey::Numeric(value),
                _ => OrderingKey::Text(trimmed.to_string()),
            }
        };

        Self { raw, key }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_missing(&self) -> bool {
        self.key == OrderingKey::Missing
    }
}

impl PartialEq for DonationId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DonationId {}

impl PartialOrd for DonationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DonationId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl AsRef<str> for DonationId {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl Display for DonationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.raw.fmt(f)
    }
}

impl Serialize for DonationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
