use core::str::FromStr;

use serde::{Deserialize, Serialize};

use velo_core::{DomainError, DomainResult};

/// Order status lifecycle.
///
/// ```text
/// pending -> confirmed -> processing -> shipped -> delivered   (terminal)
/// pending -> cancelled                                         (terminal)
/// confirmed -> cancelled                                       (terminal)
/// ```
///
/// No skipping, no leaving a terminal state. Which states may move to
/// `Cancelled` is a [`CancellationPolicy`] decision, not hard-wired.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// The single forward successor on the fulfilment path.
    pub fn successor(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Processing),
            OrderStatus::Processing => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// The set of states from which an order may be cancelled.
///
/// The default (`pending` and `confirmed`) matches the point up to which no
/// fulfilment work has started. Terminal states are never cancellable,
/// whatever the policy says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationPolicy {
    cancellable_from: Vec<OrderStatus>,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            cancellable_from: vec![OrderStatus::Pending, OrderStatus::Confirmed],
        }
    }
}

impl CancellationPolicy {
    pub fn new(cancellable_from: Vec<OrderStatus>) -> Self {
        Self { cancellable_from }
    }

    pub fn allows_cancel_from(&self, from: OrderStatus) -> bool {
        !from.is_terminal() && self.cancellable_from.contains(&from)
    }
}

/// Validate a single transition against the graph and the cancellation policy.
pub fn validate_transition(
    from: OrderStatus,
    to: OrderStatus,
    policy: &CancellationPolicy,
) -> DomainResult<()> {
    let legal = if to == OrderStatus::Cancelled {
        policy.allows_cancel_from(from)
    } else {
        from.successor() == Some(to)
    };
    if legal {
        Ok(())
    } else {
        Err(DomainError::invalid_transition(from.as_str(), to.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_fulfilment_chain_is_legal() {
        let policy = CancellationPolicy::default();
        let chain = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ];
        for pair in chain.windows(2) {
            validate_transition(pair[0], pair[1], &policy).unwrap();
        }
    }

    #[test]
    fn skipping_states_is_rejected() {
        let err = validate_transition(
            OrderStatus::Pending,
            OrderStatus::Shipped,
            &CancellationPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: "pending",
                to: "shipped"
            }
        );
    }

    #[test]
    fn terminal_states_have_no_exits() {
        let policy = CancellationPolicy::default();
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            for to in [
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Cancelled,
            ] {
                assert!(validate_transition(terminal, to, &policy).is_err());
            }
        }
    }

    #[test]
    fn default_policy_cancels_from_pending_and_confirmed_only() {
        let policy = CancellationPolicy::default();
        validate_transition(OrderStatus::Pending, OrderStatus::Cancelled, &policy).unwrap();
        validate_transition(OrderStatus::Confirmed, OrderStatus::Cancelled, &policy).unwrap();
        assert!(
            validate_transition(OrderStatus::Processing, OrderStatus::Cancelled, &policy).is_err()
        );
        assert!(validate_transition(OrderStatus::Shipped, OrderStatus::Cancelled, &policy).is_err());
    }

    #[test]
    fn policy_can_widen_the_cancellable_set() {
        let policy = CancellationPolicy::new(vec![
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
        ]);
        validate_transition(OrderStatus::Processing, OrderStatus::Cancelled, &policy).unwrap();
    }

    #[test]
    fn policy_cannot_make_terminal_states_cancellable() {
        let policy = CancellationPolicy::new(vec![OrderStatus::Cancelled]);
        assert!(
            validate_transition(OrderStatus::Cancelled, OrderStatus::Cancelled, &policy).is_err()
        );
    }

    #[test]
    fn status_parses_its_own_display() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }
}
