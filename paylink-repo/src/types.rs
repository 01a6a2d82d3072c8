//! Database row structs and parsing helpers for the SQLite adapter.

use sqlx::FromRow;

use paylink_types::{
    Carrier, Currency, LinkId, LinkedProduct, Money, PaymentLink, PaymentStatus, PhoneNumber,
    ProductId, RepoError, Transaction, TransactionId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Transaction row from database.
#[derive(FromRow)]
pub struct DbTransaction {
    pub id: String,
    pub reference: String,
    pub merchant_id: String,
    pub link_id: String,
    pub status: String,
    pub carrier: String,
    pub provider_transaction_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub failure_reason: Option<String>,
    pub provider_response: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl DbTransaction {
    pub fn into_domain(self) -> Result<Transaction, RepoError> {
        let id = parse_uuid(&self.id)?;
        let merchant_id = parse_uuid(&self.merchant_id)?;
        let link_id = parse_uuid(&self.link_id)?;

        let provider_response = match self.provider_response {
            Some(raw) => Some(
                serde_json::from_str(&raw).map_err(|e| RepoError::Database(e.to_string()))?,
            ),
            None => None,
        };

        Ok(Transaction {
            id: TransactionId::from_uuid(id),
            reference: self.reference.into(),
            merchant_id,
            link_id: LinkId::from_uuid(link_id),
            status: parse_status(&self.status)?,
            carrier: parse_carrier(&self.carrier)?,
            provider_transaction_id: self.provider_transaction_id,
            customer_name: self.customer_name,
            customer_phone: PhoneNumber::from_stored(self.customer_phone),
            customer_email: self.customer_email,
            amount: parse_money(self.amount, &self.currency)?,
            failure_reason: self.failure_reason,
            provider_response,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Payment link row joined with its optional product.
#[derive(FromRow)]
pub struct DbPaymentLink {
    pub id: String,
    pub merchant_id: String,
    pub slug: String,
    pub amount: i64,
    pub currency: String,
    pub is_active: i64,
    pub expires_at: Option<String>,
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub product_stock: Option<i64>,
}

impl DbPaymentLink {
    pub fn into_domain(self) -> Result<PaymentLink, RepoError> {
        let product = match (self.product_id, self.product_name, self.product_stock) {
            (Some(id), Some(name), Some(stock)) => Some(LinkedProduct {
                id: ProductId::from_uuid(parse_uuid(&id)?),
                name,
                stock,
            }),
            _ => None,
        };

        let expires_at = match self.expires_at {
            Some(raw) => Some(parse_datetime(&raw)?),
            None => None,
        };

        Ok(PaymentLink {
            id: LinkId::from_uuid(parse_uuid(&self.id)?),
            merchant_id: parse_uuid(&self.merchant_id)?,
            slug: self.slug,
            amount: parse_money(self.amount, &self.currency)?,
            is_active: self.is_active != 0,
            expires_at,
            usage_limit: self.usage_limit,
            usage_count: self.usage_count,
            product,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_uuid(s: &str) -> Result<uuid::Uuid, RepoError> {
    uuid::Uuid::parse_str(s).map_err(|e| RepoError::Database(e.to_string()))
}

pub fn parse_datetime(s: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| RepoError::Database(e.to_string()))
}

pub fn parse_status(s: &str) -> Result<PaymentStatus, RepoError> {
    s.parse().map_err(RepoError::Database)
}

pub fn parse_carrier(s: &str) -> Result<Carrier, RepoError> {
    s.parse().map_err(RepoError::Database)
}

pub fn parse_currency(s: &str) -> Result<Currency, RepoError> {
    match s {
        "XAF" => Ok(Currency::XAF),
        "NGN" => Ok(Currency::NGN),
        "GHS" => Ok(Currency::GHS),
        _ => Err(RepoError::Database(format!("Unknown currency: {}", s))),
    }
}

pub fn parse_money(amount: i64, currency: &str) -> Result<Money, RepoError> {
    Money::new(amount, parse_currency(currency)?).map_err(RepoError::Domain)
}
