use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Fixed vocabulary of payment method tags a pass may restrict itself to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Online,
    ExternalApp,
    AmbassadorCash,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Online,
        PaymentMethod::ExternalApp,
        PaymentMethod::AmbassadorCash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::ExternalApp => "external_app",
            PaymentMethod::AmbassadorCash => "ambassador_cash",
        }
    }

    pub fn parse(tag: &str) -> Option<PaymentMethod> {
        match tag {
            "online" => Some(PaymentMethod::Online),
            "external_app" => Some(PaymentMethod::ExternalApp),
            "ambassador_cash" => Some(PaymentMethod::AmbassadorCash),
            _ => None,
        }
    }

    /// Validates a raw tag list against the vocabulary and normalizes it for
    /// storage: deduplicated, sorted, and `None` when empty. `None`/empty both
    /// mean "all methods allowed"; storage never holds an empty array.
    pub fn normalize_list(tags: &[String]) -> Result<Option<Vec<String>>, AppError> {
        let mut methods: Vec<PaymentMethod> = Vec::with_capacity(tags.len());
        for tag in tags {
            let m = PaymentMethod::parse(tag).ok_or_else(|| AppError::Validation {
                field: "allowed_payment_methods",
                reason: format!(
                    "unknown payment method '{}', expected one of: online, external_app, ambassador_cash",
                    tag
                ),
            })?;
            if !methods.contains(&m) {
                methods.push(m);
            }
        }
        if methods.is_empty() {
            return Ok(None);
        }
        methods.sort();
        Ok(Some(methods.iter().map(|m| m.as_str().to_string()).collect()))
    }
}

/// A purchasable ticket tier belonging to exactly one event.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Pass {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub is_active: bool,
    pub max_quantity: Option<i64>,
    pub sold_quantity: i64,
    pub allowed_payment_methods: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl Pass {
    pub fn is_unlimited(&self) -> bool {
        self.max_quantity.is_none()
    }

    /// `None` for unlimited passes, otherwise never negative even if the
    /// stored counters are momentarily inconsistent.
    pub fn remaining_quantity(&self) -> Option<i64> {
        self.max_quantity.map(|max| (max - self.sold_quantity).max(0))
    }

    pub fn is_sold_out(&self) -> bool {
        self.remaining_quantity() == Some(0)
    }

    /// Checkout-side authorization: a missing or empty allow-list permits
    /// every method; a non-empty list permits exactly its members.
    pub fn is_method_allowed(&self, method: PaymentMethod) -> bool {
        match &self.allowed_payment_methods {
            None => true,
            Some(list) if list.is_empty() => true,
            Some(list) => list.iter().any(|m| m == method.as_str()),
        }
    }
}

/// Wire shape exposed to admin callers. The stock fields are always
/// server-computed, never trusted from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassResponse {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub is_active: bool,
    pub max_quantity: Option<i64>,
    pub sold_quantity: i64,
    pub remaining_quantity: Option<i64>,
    pub is_sold_out: bool,
    pub is_unlimited: bool,
    pub allowed_payment_methods: Option<Vec<String>>,
}

impl From<Pass> for PassResponse {
    fn from(p: Pass) -> Self {
        PassResponse {
            remaining_quantity: p.remaining_quantity(),
            is_sold_out: p.is_sold_out(),
            is_unlimited: p.is_unlimited(),
            id: p.id,
            event_id: p.event_id,
            name: p.name,
            description: p.description,
            price: p.price,
            is_active: p.is_active,
            max_quantity: p.max_quantity,
            sold_quantity: p.sold_quantity,
            allowed_payment_methods: p.allowed_payment_methods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn pass(max: Option<i64>, sold: i64) -> Pass {
        Pass {
            id: 1,
            event_id: 1,
            name: "VIP".to_string(),
            description: None,
            price: 50.0,
            is_active: true,
            max_quantity: max,
            sold_quantity: sold,
            allowed_payment_methods: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unlimited_pass_has_no_remaining_count() {
        let p = pass(None, 42);
        assert!(p.is_unlimited());
        assert_eq!(p.remaining_quantity(), None);
        assert!(!p.is_sold_out());
    }

    #[test]
    fn bounded_pass_counts_down() {
        let p = pass(Some(10), 3);
        assert_eq!(p.remaining_quantity(), Some(7));
        assert!(!p.is_sold_out());
    }

    #[test]
    fn zero_capacity_is_sold_out_at_birth() {
        let p = pass(Some(0), 0);
        assert_eq!(p.remaining_quantity(), Some(0));
        assert!(p.is_sold_out());
        assert!(!p.is_unlimited());
    }

    #[test]
    fn oversold_counters_clamp_to_zero_remaining() {
        // can only happen transiently; the read side must not go negative
        let p = pass(Some(5), 7);
        assert_eq!(p.remaining_quantity(), Some(0));
        assert!(p.is_sold_out());
    }

    #[test]
    fn missing_and_empty_allow_list_permit_everything() {
        let mut p = pass(None, 0);
        for m in PaymentMethod::ALL {
            assert!(p.is_method_allowed(m));
        }
        p.allowed_payment_methods = Some(vec![]);
        for m in PaymentMethod::ALL {
            assert!(p.is_method_allowed(m));
        }
    }

    #[test]
    fn non_empty_allow_list_permits_exactly_its_members() {
        let mut p = pass(None, 0);
        p.allowed_payment_methods = Some(vec!["online".to_string()]);
        assert!(p.is_method_allowed(PaymentMethod::Online));
        assert!(!p.is_method_allowed(PaymentMethod::ExternalApp));
        assert!(!p.is_method_allowed(PaymentMethod::AmbassadorCash));
    }

    #[test]
    fn normalize_rejects_unknown_tags() {
        let err = PaymentMethod::normalize_list(&["online".into(), "crypto".into()]).unwrap_err();
        assert!(err.to_string().contains("crypto"));
    }

    #[test]
    fn normalize_empty_list_means_unrestricted() {
        assert_eq!(PaymentMethod::normalize_list(&[]).unwrap(), None);
    }

    #[test]
    fn normalize_dedupes_and_sorts() {
        let got = PaymentMethod::normalize_list(&[
            "ambassador_cash".into(),
            "online".into(),
            "ambassador_cash".into(),
        ])
        .unwrap();
        assert_eq!(got, Some(vec!["online".to_string(), "ambassador_cash".to_string()]));
    }

    #[test]
    fn response_carries_computed_stock_fields() {
        let resp = PassResponse::from(pass(Some(10), 10));
        assert_eq!(resp.remaining_quantity, Some(0));
        assert!(resp.is_sold_out);
        assert!(!resp.is_unlimited);
        assert_eq!(resp.sold_quantity, 10);
    }

    proptest! {
        #[test]
        fn remaining_quantity_derivation(max in 0i64..100_000, sold in 0i64..100_000) {
            let p = pass(Some(max), sold);
            prop_assert_eq!(p.remaining_quantity(), Some((max - sold).max(0)));
            prop_assert_eq!(p.is_sold_out(), p.remaining_quantity() == Some(0));
        }

        #[test]
        fn remaining_is_none_iff_unlimited(sold in 0i64..100_000) {
            let p = pass(None, sold);
            prop_assert!(p.remaining_quantity().is_none());
            prop_assert!(!p.is_sold_out());
        }
    }
}
