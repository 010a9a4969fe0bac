//! passes.rs
//!
//! Service layer for the pass inventory and entitlement rules. Every
//! mutation validates before it writes, and every guarded write is a single
//! conditional statement so that concurrent admin edits and checkout
//! increments cannot drive `sold_quantity` past `max_quantity` or leave a
//! capacity below the confirmed sales count.

use crate::database::Database;
use crate::error::AppError;
use crate::models::{Pass, PaymentMethod};

const PASS_COLUMNS: &str = "id, event_id, name, description, price, is_active, \
     max_quantity, sold_quantity, allowed_payment_methods, created_at";

/// Input for pass creation, as received from the admin API.
#[derive(Debug, Clone)]
pub struct NewPass {
    pub event_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub max_quantity: Option<i64>,
    pub allowed_payment_methods: Vec<String>,
    pub is_active: Option<bool>,
}

impl NewPass {
    /// Field-scoped validation; nothing is written when any field fails.
    /// Returns the trimmed name and the normalized allow-list.
    pub fn validate(&self) -> Result<(String, Option<Vec<String>>), AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::Validation {
                field: "price",
                reason: format!("must be a non-negative number, got {}", self.price),
            });
        }
        if let Some(max) = self.max_quantity {
            if max < 0 {
                return Err(AppError::Validation {
                    field: "max_quantity",
                    reason: format!("must be null (unlimited) or >= 0, got {}", max),
                });
            }
        }
        let methods = PaymentMethod::normalize_list(&self.allowed_payment_methods)?;
        Ok((name.to_string(), methods))
    }
}

/// Rejects a capacity below the confirmed sales count. The floor for
/// `max_quantity` is always `sold`, never zero.
pub fn check_capacity(new_max: Option<i64>, sold: i64) -> Result<(), AppError> {
    match new_max {
        None => Ok(()),
        Some(n) if n < 0 => Err(AppError::Validation {
            field: "max_quantity",
            reason: format!("must be null (unlimited) or >= 0, got {}", n),
        }),
        Some(n) if n < sold => Err(AppError::CapacityBelowSold { requested: n, sold }),
        Some(_) => Ok(()),
    }
}

#[derive(Clone)]
pub struct PassService {
    db: Database,
}

impl PassService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, pass_id: i64) -> Result<Pass, AppError> {
        let pass = sqlx::query_as::<_, Pass>(&format!(
            "SELECT {PASS_COLUMNS} FROM passes WHERE id = $1"
        ))
        .bind(pass_id)
        .fetch_optional(&self.db.pool)
        .await?;

        pass.ok_or(AppError::NotFound("pass"))
    }

    pub async fn list_for_event(
        &self,
        event_id: i64,
        include_inactive: bool,
    ) -> Result<Vec<Pass>, AppError> {
        let event_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)",
        )
        .bind(event_id)
        .fetch_one(&self.db.pool)
        .await?;

        if !event_exists {
            return Err(AppError::NotFound("event"));
        }

        let mut q = format!("SELECT {PASS_COLUMNS} FROM passes WHERE event_id = $1");
        if !include_inactive {
            q.push_str(" AND is_active = true");
        }
        q.push_str(" ORDER BY id");

        let passes = sqlx::query_as::<_, Pass>(&q)
            .bind(event_id)
            .fetch_all(&self.db.pool)
            .await?;

        Ok(passes)
    }

    /// Creates a pass with `sold_quantity = 0` and `is_active = true` unless
    /// overridden. Zero capacity is legal ("coming soon" tiers are sold out
    /// from birth). Not idempotent; callers must not auto-retry.
    pub async fn create(&self, req: NewPass) -> Result<Pass, AppError> {
        let (name, methods) = req.validate()?;

        let event_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)",
        )
        .bind(req.event_id)
        .fetch_one(&self.db.pool)
        .await?;

        if !event_exists {
            return Err(AppError::NotFound("event"));
        }

        let pass = sqlx::query_as::<_, Pass>(&format!(
            "INSERT INTO passes
                 (event_id, name, description, price, is_active, max_quantity,
                  sold_quantity, allowed_payment_methods)
             VALUES ($1, $2, $3, $4, $5, $6, 0, $7)
             RETURNING {PASS_COLUMNS}"
        ))
        .bind(req.event_id)
        .bind(&name)
        .bind(&req.description)
        .bind(req.price)
        .bind(req.is_active.unwrap_or(true))
        .bind(req.max_quantity)
        .bind(&methods)
        .fetch_one(&self.db.pool)
        .await?;

        tracing::info!(
            pass_id = pass.id,
            event_id = pass.event_id,
            "pass created"
        );
        Ok(pass)
    }

    /// Replaces `max_quantity`. The pre-check gives the caller an error with
    /// both numbers; the write itself re-checks against `sold_quantity` in
    /// one statement, so a checkout increment racing the edit turns into a
    /// retryable `Conflict` instead of a capacity below sales.
    pub async fn set_max_quantity(
        &self,
        pass_id: i64,
        new_max: Option<i64>,
    ) -> Result<Pass, AppError> {
        let current = self.get(pass_id).await?;
        check_capacity(new_max, current.sold_quantity)?;

        let updated = sqlx::query_as::<_, Pass>(&format!(
            "UPDATE passes
             SET max_quantity = $2
             WHERE id = $1
               AND ($2::BIGINT IS NULL OR $2::BIGINT >= sold_quantity)
             RETURNING {PASS_COLUMNS}"
        ))
        .bind(pass_id)
        .bind(new_max)
        .fetch_optional(&self.db.pool)
        .await?;

        match updated {
            Some(pass) => Ok(pass),
            None => {
                // lost the race: either the pass vanished or sales moved up
                let fresh = self.get(pass_id).await?;
                Err(AppError::Conflict(format!(
                    "sold quantity moved to {} while updating capacity; retry with fresh data",
                    fresh.sold_quantity
                )))
            }
        }
    }

    /// Visibility toggle only; no interaction with the stock counters.
    /// Setting the same value twice is a no-op success.
    pub async fn set_active(&self, pass_id: i64, is_active: bool) -> Result<Pass, AppError> {
        let updated = sqlx::query_as::<_, Pass>(&format!(
            "UPDATE passes SET is_active = $2 WHERE id = $1 RETURNING {PASS_COLUMNS}"
        ))
        .bind(pass_id)
        .bind(is_active)
        .fetch_optional(&self.db.pool)
        .await?;

        updated.ok_or(AppError::NotFound("pass"))
    }

    /// Whole-list replacement of the allow-list. The empty set is stored as
    /// NULL ("all methods allowed"); storage never holds an empty array.
    pub async fn set_allowed_payment_methods(
        &self,
        pass_id: i64,
        methods: Vec<String>,
    ) -> Result<Pass, AppError> {
        let normalized = PaymentMethod::normalize_list(&methods)?;

        let updated = sqlx::query_as::<_, Pass>(&format!(
            "UPDATE passes SET allowed_payment_methods = $2 WHERE id = $1 RETURNING {PASS_COLUMNS}"
        ))
        .bind(pass_id)
        .bind(&normalized)
        .fetch_optional(&self.db.pool)
        .await?;

        updated.ok_or(AppError::NotFound("pass"))
    }

    /// Deletion is allowed only for passes that never sold. The guard is in
    /// the DELETE itself, so a sale landing between check and delete fails
    /// the statement rather than orphaning sold tickets.
    pub async fn delete(&self, pass_id: i64) -> Result<(), AppError> {
        let current = self.get(pass_id).await?;
        if current.sold_quantity > 0 {
            return Err(AppError::PassHasSales { sold: current.sold_quantity });
        }

        let result = sqlx::query("DELETE FROM passes WHERE id = $1 AND sold_quantity = 0")
            .bind(pass_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            let fresh = self.get(pass_id).await?;
            return Err(AppError::PassHasSales { sold: fresh.sold_quantity });
        }

        tracing::info!(pass_id, "pass deleted");
        Ok(())
    }

    /// Sole writer of `sold_quantity` (checkout collaborator). Entitlement
    /// check first, then a conditional increment that cannot exceed
    /// `max_quantity` no matter how many sales race.
    pub async fn record_sale(
        &self,
        pass_id: i64,
        method: PaymentMethod,
    ) -> Result<Pass, AppError> {
        let current = self.get(pass_id).await?;
        if !current.is_active {
            return Err(AppError::PassInactive);
        }
        if !current.is_method_allowed(method) {
            return Err(AppError::MethodNotAllowed {
                method: method.as_str().to_string(),
            });
        }

        let updated = sqlx::query_as::<_, Pass>(&format!(
            "UPDATE passes
             SET sold_quantity = sold_quantity + 1
             WHERE id = $1
               AND is_active = true
               AND (max_quantity IS NULL OR sold_quantity < max_quantity)
             RETURNING {PASS_COLUMNS}"
        ))
        .bind(pass_id)
        .fetch_optional(&self.db.pool)
        .await?;

        match updated {
            Some(pass) => {
                tracing::info!(
                    pass_id,
                    sold = pass.sold_quantity,
                    method = method.as_str(),
                    "sale recorded"
                );
                Ok(pass)
            }
            None => {
                let fresh = self.get(pass_id).await?;
                if !fresh.is_active {
                    Err(AppError::PassInactive)
                } else if fresh.is_sold_out() {
                    Err(AppError::SoldOut)
                } else {
                    Err(AppError::Conflict(
                        "pass changed while recording the sale; retry".to_string(),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_pass() -> NewPass {
        NewPass {
            event_id: 1,
            name: "VIP".to_string(),
            description: Some("front row".to_string()),
            price: 50.0,
            max_quantity: Some(100),
            allowed_payment_methods: vec![],
            is_active: None,
        }
    }

    #[test]
    fn validate_accepts_a_plain_pass() {
        let (name, methods) = new_pass().validate().unwrap();
        assert_eq!(name, "VIP");
        assert_eq!(methods, None);
    }

    #[test]
    fn validate_trims_the_name() {
        let mut req = new_pass();
        req.name = "  Early Bird  ".to_string();
        let (name, _) = req.validate().unwrap();
        assert_eq!(name, "Early Bird");
    }

    #[test]
    fn validate_rejects_blank_name() {
        let mut req = new_pass();
        req.name = "   ".to_string();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn validate_rejects_negative_price() {
        let mut req = new_pass();
        req.price = -1.0;
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn validate_rejects_nan_price() {
        let mut req = new_pass();
        req.price = f64::NAN;
        assert!(req.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_capacity() {
        let mut req = new_pass();
        req.max_quantity = Some(-5);
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("max_quantity"));
    }

    #[test]
    fn validate_allows_zero_capacity() {
        let mut req = new_pass();
        req.max_quantity = Some(0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_payment_tag() {
        let mut req = new_pass();
        req.allowed_payment_methods = vec!["online".into(), "carrier_pigeon".into()];
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("carrier_pigeon"));
    }

    #[test]
    fn capacity_floor_is_sold_quantity_not_zero() {
        assert!(check_capacity(Some(12), 12).is_ok());
        let err = check_capacity(Some(11), 12).unwrap_err();
        match err {
            AppError::CapacityBelowSold { requested, sold } => {
                assert_eq!(requested, 11);
                assert_eq!(sold, 12);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unlimited_capacity_always_passes_the_check() {
        assert!(check_capacity(None, 1_000_000).is_ok());
    }
}
