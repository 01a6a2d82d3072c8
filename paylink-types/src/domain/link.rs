//! Payment link and linked product models.
//!
//! Links themselves (CRUD, ownership) are managed elsewhere; this service
//! only needs them for validation at initiation time, usage accounting and
//! stock decrement on success.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;
use crate::error::DomainError;

/// Sentinel stock value meaning "unlimited" - never decremented.
pub const UNLIMITED_STOCK: i64 = -1;

/// Unique identifier for a payment link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(Uuid);

impl LinkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LinkId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a product attached to a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProductId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Product sold through a payment link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedProduct {
    pub id: ProductId,
    pub name: String,
    /// Remaining stock; [`UNLIMITED_STOCK`] means no limit.
    pub stock: i64,
}

impl LinkedProduct {
    /// Whether at least one unit can still be sold.
    pub fn has_stock(&self) -> bool {
        self.stock == UNLIMITED_STOCK || self.stock > 0
    }
}

/// A merchant's shareable payment link, as seen by the transaction engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLink {
    pub id: LinkId,
    pub merchant_id: Uuid,
    pub slug: String,
    pub amount: Money,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    pub product: Option<LinkedProduct>,
}

impl PaymentLink {
    /// Validates that the link can accept a new payment attempt.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::LinkInactive);
        }
        if let Some(expires_at) = self.expires_at {
            if now >= expires_at {
                return Err(DomainError::LinkExpired);
            }
        }
        if let Some(limit) = self.usage_limit {
            if self.usage_count >= limit {
                return Err(DomainError::LinkExhausted);
            }
        }
        if let Some(product) = &self.product {
            if !product.has_stock() {
                return Err(DomainError::OutOfStock);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;
    use chrono::Duration;

    fn link() -> PaymentLink {
        PaymentLink {
            id: LinkId::new(),
            merchant_id: Uuid::new_v4(),
            slug: "pay-abc".into(),
            amount: Money::new(5000, Currency::XAF).unwrap(),
            is_active: true,
            expires_at: None,
            usage_limit: None,
            usage_count: 0,
            product: None,
        }
    }

    #[test]
    fn test_active_link_validates() {
        assert!(link().validate(Utc::now()).is_ok());
    }

    #[test]
    fn test_inactive_link_rejected() {
        let mut l = link();
        l.is_active = false;
        assert!(matches!(
            l.validate(Utc::now()),
            Err(DomainError::LinkInactive)
        ));
    }

    #[test]
    fn test_expired_link_rejected() {
        let mut l = link();
        l.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(matches!(
            l.validate(Utc::now()),
            Err(DomainError::LinkExpired)
        ));
    }

    #[test]
    fn test_exhausted_link_rejected() {
        let mut l = link();
        l.usage_limit = Some(3);
        l.usage_count = 3;
        assert!(matches!(
            l.validate(Utc::now()),
            Err(DomainError::LinkExhausted)
        ));
    }

    #[test]
    fn test_out_of_stock_rejected() {
        let mut l = link();
        l.product = Some(LinkedProduct {
            id: ProductId::new(),
            name: "T-shirt".into(),
            stock: 0,
        });
        assert!(matches!(
            l.validate(Utc::now()),
            Err(DomainError::OutOfStock)
        ));
    }

    #[test]
    fn test_unlimited_stock_always_passes() {
        let mut l = link();
        l.product = Some(LinkedProduct {
            id: ProductId::new(),
            name: "E-book".into(),
            stock: UNLIMITED_STOCK,
        });
        assert!(l.validate(Utc::now()).is_ok());
    }
}
