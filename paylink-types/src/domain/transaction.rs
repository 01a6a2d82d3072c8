//! Transaction aggregate and the payment status state machine.

use chrono::{DateTime, Utc};
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::link::{LinkId, PaymentLink};
use super::money::Money;
use super::phone::PhoneNumber;
use crate::error::DomainError;

/// Unique internal identifier for a Transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random TransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TransactionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Mobile-money carriers the provider can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Carrier {
    MtnMomo,
    OrangeMoney,
}

impl Carrier {
    /// The payment-mode code expected by the provider's API.
    pub fn wire_code(&self) -> &'static str {
        match self {
            Carrier::MtnMomo => "MTN",
            Carrier::OrangeMoney => "ORANGE",
        }
    }
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Carrier::MtnMomo => write!(f, "MTN_MOMO"),
            Carrier::OrangeMoney => write!(f, "ORANGE_MONEY"),
        }
    }
}

impl std::str::FromStr for Carrier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MTN_MOMO" | "MTN" => Ok(Carrier::MtnMomo),
            "ORANGE_MONEY" | "ORANGE" => Ok(Carrier::OrangeMoney),
            _ => Err(format!("Unknown carrier: {}", s)),
        }
    }
}

/// Lifecycle status of a payment attempt.
///
/// The machine only moves forward:
/// `Pending -> Processing -> {Success, Failed, Cancelled}`, plus the direct
/// `Pending -> Failed` edge when the provider rejects at initiation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Cancelled,
}

/// Closed mapping from provider status vocabulary to the internal enum.
/// Adding a synonym is a data change here, not a new code path.
const PROVIDER_STATUS_MAP: &[(&str, PaymentStatus)] = &[
    ("completed", PaymentStatus::Success),
    ("successful", PaymentStatus::Success),
    ("success", PaymentStatus::Success),
    ("confirmed", PaymentStatus::Success),
    ("failed", PaymentStatus::Failed),
    ("failure", PaymentStatus::Failed),
    ("rejected", PaymentStatus::Failed),
    ("declined", PaymentStatus::Failed),
    ("error", PaymentStatus::Failed),
    ("cancelled", PaymentStatus::Cancelled),
    ("canceled", PaymentStatus::Cancelled),
    ("aborted", PaymentStatus::Cancelled),
    ("processing", PaymentStatus::Processing),
    ("in_progress", PaymentStatus::Processing),
    ("accepted", PaymentStatus::Processing),
    ("pending", PaymentStatus::Pending),
    ("initiated", PaymentStatus::Pending),
    ("created", PaymentStatus::Pending),
];

impl PaymentStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Success | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Processing)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Processing, PaymentStatus::Success)
                | (PaymentStatus::Processing, PaymentStatus::Failed)
                | (PaymentStatus::Processing, PaymentStatus::Cancelled)
        )
    }

    /// Maps the provider's free-text status onto the internal enum.
    ///
    /// Matching is case-insensitive over known synonyms; anything
    /// unrecognized defaults to `Pending` - never silently to a terminal
    /// state.
    pub fn from_provider(raw: &str) -> PaymentStatus {
        let needle = raw.trim().to_ascii_lowercase();
        PROVIDER_STATUS_MAP
            .iter()
            .find(|(synonym, _)| *synonym == needle)
            .map(|(_, status)| *status)
            .unwrap_or(PaymentStatus::Pending)
    }
}

impl AsRef<str> for PaymentStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown payment status: {}", s)),
        }
    }
}

/// This system's own globally-unique transaction identifier, distinct from
/// the provider-assigned transaction id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalReference(String);

impl ExternalReference {
    /// Generates a fresh reference: `TXN-<millis>-<8 alphanumerics>`.
    pub fn generate() -> Self {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(|b| (b as char).to_ascii_uppercase())
            .collect();
        Self(format!("TXN-{}-{}", Utc::now().timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExternalReference {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ExternalReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A payment attempt against a merchant's link - the aggregate root.
///
/// Amount and reference are immutable after creation; the provider
/// transaction id is write-once; status only moves forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub reference: ExternalReference,
    pub merchant_id: Uuid,
    pub link_id: LinkId,
    pub status: PaymentStatus,
    pub carrier: Carrier,
    /// Assigned by the provider once it accepts the initiation.
    pub provider_transaction_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: PhoneNumber,
    pub customer_email: Option<String>,
    pub amount: Money,
    /// Set only when the status is `Failed`.
    pub failure_reason: Option<String>,
    /// Raw last provider response, kept for diagnostics.
    pub provider_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a new Pending attempt against a validated link.
    ///
    /// The amount is copied from the link at this moment and never changes,
    /// regardless of later link edits.
    pub fn initiate(
        link: &PaymentLink,
        carrier: Carrier,
        customer_name: String,
        customer_phone: PhoneNumber,
        customer_email: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            reference: ExternalReference::generate(),
            merchant_id: link.merchant_id,
            link_id: link.id,
            status: PaymentStatus::Pending,
            carrier,
            provider_transaction_id: None,
            customer_name,
            customer_phone,
            customer_email,
            amount: link.amount,
            failure_reason: None,
            provider_response: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a status transition, enforcing the forward-only machine.
    ///
    /// Used by in-memory adapters and tests; SQL adapters enforce the same
    /// guard in the UPDATE predicate.
    pub fn apply_status(
        &mut self,
        next: PaymentStatus,
        failure_reason: Option<String>,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next == PaymentStatus::Failed {
            self.failure_reason = failure_reason;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records the provider's acceptance: write-once provider id, move to
    /// Processing.
    pub fn accept(&mut self, provider_transaction_id: String) -> Result<(), DomainError> {
        if self.provider_transaction_id.is_some() {
            return Err(DomainError::Validation(
                "Provider transaction id already set".into(),
            ));
        }
        self.apply_status(PaymentStatus::Processing, None)?;
        self.provider_transaction_id = Some(provider_transaction_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, LinkId};

    fn sample_link() -> PaymentLink {
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

    fn sample_tx() -> Transaction {
        Transaction::initiate(
            &sample_link(),
            Carrier::MtnMomo,
            "Jean Mbarga".into(),
            PhoneNumber::normalize("0612345678").unwrap(),
            None,
        )
    }

    #[test]
    fn test_initiate_copies_amount_from_link() {
        let link = sample_link();
        let tx = Transaction::initiate(
            &link,
            Carrier::OrangeMoney,
            "Jean".into(),
            PhoneNumber::normalize("0612345678").unwrap(),
            None,
        );
        assert_eq!(tx.amount, link.amount);
        assert_eq!(tx.status, PaymentStatus::Pending);
        assert!(tx.provider_transaction_id.is_none());
    }

    #[test]
    fn test_reference_format() {
        let reference = ExternalReference::generate();
        let parts: Vec<&str> = reference.as_str().splitn(3, '-').collect();
        assert_eq!(parts[0], "TXN");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Processing));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(PaymentStatus::Processing.can_transition_to(PaymentStatus::Success));
        assert!(PaymentStatus::Processing.can_transition_to(PaymentStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states_are_sealed() {
        for terminal in [
            PaymentStatus::Success,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(PaymentStatus::Pending));
            assert!(!terminal.can_transition_to(PaymentStatus::Processing));
            assert!(!terminal.can_transition_to(PaymentStatus::Success));
        }
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut tx = sample_tx();
        tx.accept("FAP-123".into()).unwrap();
        tx.apply_status(PaymentStatus::Success, None).unwrap();
        let result = tx.apply_status(PaymentStatus::Processing, None);
        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_provider_id_is_write_once() {
        let mut tx = sample_tx();
        tx.accept("FAP-123".into()).unwrap();
        assert!(tx.accept("FAP-456".into()).is_err());
        assert_eq!(tx.provider_transaction_id.as_deref(), Some("FAP-123"));
    }

    #[test]
    fn test_provider_status_synonyms() {
        assert_eq!(
            PaymentStatus::from_provider("COMPLETED"),
            PaymentStatus::Success
        );
        assert_eq!(
            PaymentStatus::from_provider("Successful"),
            PaymentStatus::Success
        );
        assert_eq!(
            PaymentStatus::from_provider("declined"),
            PaymentStatus::Failed
        );
        assert_eq!(
            PaymentStatus::from_provider("CANCELED"),
            PaymentStatus::Cancelled
        );
        assert_eq!(
            PaymentStatus::from_provider("in_progress"),
            PaymentStatus::Processing
        );
    }

    #[test]
    fn test_unknown_provider_status_defaults_to_pending() {
        assert_eq!(
            PaymentStatus::from_provider("SOMETHING_NEW"),
            PaymentStatus::Pending
        );
        assert_eq!(PaymentStatus::from_provider(""), PaymentStatus::Pending);
    }
}
