//! Order status labels and transitions.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a storefront order.
///
/// Serialized as the Spanish label shown to shoppers and staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, not yet picked up by staff.
    #[default]
    #[serde(rename = "En proceso")]
    EnProceso,
    /// Being prepared.
    #[serde(rename = "Procesando")]
    Procesando,
    /// Handed to delivery.
    #[serde(rename = "Enviado")]
    Enviado,
    /// Delivered.
    #[serde(rename = "Completado")]
    Completado,
    /// Cancelled.
    #[serde(rename = "Cancelado")]
    Cancelado,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::EnProceso,
        Self::Procesando,
        Self::Enviado,
        Self::Completado,
        Self::Cancelado,
    ];

    /// The display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EnProceso => "En proceso",
            Self::Procesando => "Procesando",
            Self::Enviado => "Enviado",
            Self::Completado => "Completado",
            Self::Cancelado => "Cancelado",
        }
    }

    /// Completed and cancelled orders accept no further changes.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completado | Self::Cancelado)
    }

    /// Whether an order in this status may move to `next`.
    ///
    /// Re-applying the current status is always allowed (it is a no-op).
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self == next || !self.is_terminal()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.label().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!("en PROCESO".parse::<OrderStatus>().unwrap(), OrderStatus::EnProceso);
        assert!("Perdido".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&OrderStatus::EnProceso).unwrap();
        assert_eq!(json, "\"En proceso\"");
    }

    #[test]
    fn test_terminal_states_are_final() {
        assert!(OrderStatus::EnProceso.can_transition_to(OrderStatus::Enviado));
        assert!(OrderStatus::Enviado.can_transition_to(OrderStatus::Procesando));
        assert!(!OrderStatus::Completado.can_transition_to(OrderStatus::Enviado));
        assert!(!OrderStatus::Cancelado.can_transition_to(OrderStatus::EnProceso));
        assert!(OrderStatus::Cancelado.can_transition_to(OrderStatus::Cancelado));
    }
}
