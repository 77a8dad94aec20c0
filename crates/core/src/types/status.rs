//! Order status.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Stored as a free-form string. The four well-known values are parsed
/// case-insensitively; anything else is preserved verbatim in `Other` so a
/// status written by another tool is never lost on read-modify-write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    /// Stable string form used in storage and logs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("completed".parse(), Ok(OrderStatus::Completed));
        assert_eq!("PROCESSING".parse(), Ok(OrderStatus::Processing));
        assert_eq!("Canceled".parse(), Ok(OrderStatus::Cancelled));
    }

    #[test]
    fn test_unknown_status_round_trips() {
        let status: OrderStatus = "On Hold".parse().unwrap_or_default();
        assert_eq!(status, OrderStatus::Other("On Hold".to_owned()));
        assert_eq!(String::from(status), "On Hold");
    }

    #[test]
    fn test_serialized_as_plain_string() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap_or_default();
        assert_eq!(json, "\"Cancelled\"");
    }
}
