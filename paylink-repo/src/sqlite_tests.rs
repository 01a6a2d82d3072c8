//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use paylink_types::{
        Carrier, LinkRef, PaymentRepository, PaymentStatus, PhoneNumber, ProductId, RepoError,
        Transaction, TransactionId,
    };
    use uuid::Uuid;

    use crate::SqliteRepo;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    /// Links and products are owned by an external service; tests seed them
    /// directly, the way that service would.
    async fn seed_link(repo: &SqliteRepo, slug: &str, amount: i64, stock: Option<i64>) -> LinkSeed {
        let link_id = Uuid::new_v4();
        let merchant_id = Uuid::new_v4();
        let product_id = match stock {
            Some(stock) => {
                let id = Uuid::new_v4();
                sqlx::query("INSERT INTO products (id, name, stock) VALUES (?, ?, ?)")
                    .bind(id.to_string())
                    .bind("Test product")
                    .bind(stock)
                    .execute(repo.pool())
                    .await
                    .unwrap();
                Some(id)
            }
            None => None,
        };

        sqlx::query(
            r#"INSERT INTO payment_links
               (id, merchant_id, slug, amount, currency, is_active, product_id, created_at)
               VALUES (?, ?, ?, ?, 'XAF', 1, ?, ?)"#,
        )
        .bind(link_id.to_string())
        .bind(merchant_id.to_string())
        .bind(slug)
        .bind(amount)
        .bind(product_id.map(|id| id.to_string()))
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(repo.pool())
        .await
        .unwrap();

        LinkSeed {
            link_id,
            product_id,
        }
    }

    struct LinkSeed {
        link_id: Uuid,
        product_id: Option<Uuid>,
    }

    async fn seed_pending_tx(repo: &SqliteRepo, slug: &str) -> Transaction {
        let link = repo
            .find_link(&LinkRef::Slug(slug.to_string()))
            .await
            .unwrap()
            .unwrap();
        let tx = Transaction::initiate(
            &link,
            Carrier::MtnMomo,
            "Jean Mbarga".into(),
            PhoneNumber::normalize("0612345678").unwrap(),
            Some("jean@example.com".into()),
        );
        repo.create_transaction(tx).await.unwrap()
    }

    async fn usage_count(repo: &SqliteRepo, link_id: Uuid) -> i64 {
        let (count,): (i64,) =
            sqlx::query_as("SELECT usage_count FROM payment_links WHERE id = ?")
                .bind(link_id.to_string())
                .fetch_one(repo.pool())
                .await
                .unwrap();
        count
    }

    async fn stock(repo: &SqliteRepo, product_id: Uuid) -> i64 {
        let (stock,): (i64,) = sqlx::query_as("SELECT stock FROM products WHERE id = ?")
            .bind(product_id.to_string())
            .fetch_one(repo.pool())
            .await
            .unwrap();
        stock
    }

    #[tokio::test]
    async fn test_create_and_fetch_transaction() {
        let repo = setup_repo().await;
        seed_link(&repo, "pay-abc", 5000, None).await;

        let created = seed_pending_tx(&repo, "pay-abc").await;
        let fetched = repo.get_transaction(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.reference, created.reference);
        assert_eq!(fetched.status, PaymentStatus::Pending);
        assert_eq!(fetched.amount.amount(), 5000);
        assert_eq!(fetched.customer_phone.as_str(), "+237612345678");
    }

    #[tokio::test]
    async fn test_find_by_reference() {
        let repo = setup_repo().await;
        seed_link(&repo, "pay-abc", 5000, None).await;

        let created = seed_pending_tx(&repo, "pay-abc").await;
        let fetched = repo
            .find_by_reference(&created.reference)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched.id, created.id);
    }

    #[tokio::test]
    async fn test_get_transaction_not_found() {
        let repo = setup_repo().await;
        let result = repo.get_transaction(TransactionId::new()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_mark_processing_bumps_usage_exactly_once() {
        let repo = setup_repo().await;
        let seed = seed_link(&repo, "pay-abc", 5000, None).await;
        let tx = seed_pending_tx(&repo, "pay-abc").await;

        let updated = repo
            .mark_processing(tx.id, "FAP-001", Some(serde_json::json!({"ok": true})))
            .await
            .unwrap();

        assert_eq!(updated.status, PaymentStatus::Processing);
        assert_eq!(updated.provider_transaction_id.as_deref(), Some("FAP-001"));
        assert_eq!(usage_count(&repo, seed.link_id).await, 1);

        // A second acceptance for the same record is a conflict, and the
        // usage counter must not move again.
        let again = repo.mark_processing(tx.id, "FAP-002", None).await;
        assert!(matches!(again, Err(RepoError::Conflict(_))));
        assert_eq!(usage_count(&repo, seed.link_id).await, 1);

        let after = repo.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(after.provider_transaction_id.as_deref(), Some("FAP-001"));
    }

    #[tokio::test]
    async fn test_mark_failed_leaves_usage_untouched() {
        let repo = setup_repo().await;
        let seed = seed_link(&repo, "pay-abc", 5000, None).await;
        let tx = seed_pending_tx(&repo, "pay-abc").await;

        let failed = repo
            .mark_failed(tx.id, "Insufficient funds", None)
            .await
            .unwrap();

        assert_eq!(failed.status, PaymentStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some("Insufficient funds"));
        assert_eq!(usage_count(&repo, seed.link_id).await, 0);
    }

    #[tokio::test]
    async fn test_find_by_provider_tx_id() {
        let repo = setup_repo().await;
        seed_link(&repo, "pay-abc", 5000, None).await;
        let tx = seed_pending_tx(&repo, "pay-abc").await;
        repo.mark_processing(tx.id, "FAP-042", None).await.unwrap();

        let fetched = repo
            .find_by_provider_tx_id("FAP-042")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, tx.id);

        assert!(
            repo.find_by_provider_tx_id("FAP-missing")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_apply_status_reaches_terminal_then_seals() {
        let repo = setup_repo().await;
        seed_link(&repo, "pay-abc", 5000, None).await;
        let tx = seed_pending_tx(&repo, "pay-abc").await;
        repo.mark_processing(tx.id, "FAP-001", None).await.unwrap();

        let applied = repo
            .apply_status(tx.id, PaymentStatus::Success, None, None)
            .await
            .unwrap();
        assert!(applied.was_applied());
        assert_eq!(applied.transaction().status, PaymentStatus::Success);

        // Late contradictory report: no write, status keeps its value.
        let late = repo
            .apply_status(
                tx.id,
                PaymentStatus::Failed,
                Some("late failure".into()),
                None,
            )
            .await
            .unwrap();
        assert!(!late.was_applied());
        assert_eq!(late.transaction().status, PaymentStatus::Success);
        assert!(late.transaction().failure_reason.is_none());
    }

    #[tokio::test]
    async fn test_apply_status_rejects_backward_move() {
        let repo = setup_repo().await;
        seed_link(&repo, "pay-abc", 5000, None).await;
        let tx = seed_pending_tx(&repo, "pay-abc").await;
        repo.mark_processing(tx.id, "FAP-001", None).await.unwrap();

        let result = repo
            .apply_status(tx.id, PaymentStatus::Pending, None, None)
            .await
            .unwrap();
        assert!(!result.was_applied());
        assert_eq!(result.transaction().status, PaymentStatus::Processing);
    }

    #[tokio::test]
    async fn test_apply_failed_records_reason() {
        let repo = setup_repo().await;
        seed_link(&repo, "pay-abc", 5000, None).await;
        let tx = seed_pending_tx(&repo, "pay-abc").await;
        repo.mark_processing(tx.id, "FAP-001", None).await.unwrap();

        let applied = repo
            .apply_status(
                tx.id,
                PaymentStatus::Failed,
                Some("Payer cancelled on phone".into()),
                None,
            )
            .await
            .unwrap();
        assert!(applied.was_applied());
        assert_eq!(
            applied.transaction().failure_reason.as_deref(),
            Some("Payer cancelled on phone")
        );
    }

    #[tokio::test]
    async fn test_decrement_stock_floors_at_zero() {
        let repo = setup_repo().await;
        let seed = seed_link(&repo, "pay-abc", 5000, Some(1)).await;
        let product_id = ProductId::from_uuid(seed.product_id.unwrap());

        assert!(repo.decrement_stock(product_id).await.unwrap());
        assert_eq!(stock(&repo, seed.product_id.unwrap()).await, 0);

        // Second success on the same product: no-op, never below zero.
        assert!(!repo.decrement_stock(product_id).await.unwrap());
        assert_eq!(stock(&repo, seed.product_id.unwrap()).await, 0);
    }

    #[tokio::test]
    async fn test_unlimited_stock_is_never_decremented() {
        let repo = setup_repo().await;
        let seed = seed_link(&repo, "pay-abc", 5000, Some(-1)).await;
        let product_id = ProductId::from_uuid(seed.product_id.unwrap());

        assert!(!repo.decrement_stock(product_id).await.unwrap());
        assert_eq!(stock(&repo, seed.product_id.unwrap()).await, -1);
    }

    #[tokio::test]
    async fn test_find_link_by_slug_and_id() {
        let repo = setup_repo().await;
        let seed = seed_link(&repo, "pay-abc", 7500, Some(3)).await;

        let by_slug = repo
            .find_link(&LinkRef::Slug("pay-abc".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_slug.amount.amount(), 7500);
        assert_eq!(by_slug.product.as_ref().unwrap().stock, 3);

        let by_id = repo
            .find_link(&LinkRef::Id(by_slug.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*by_id.id.as_uuid(), seed.link_id);

        assert!(
            repo.find_link(&LinkRef::Slug("missing".into()))
                .await
                .unwrap()
                .is_none()
        );
    }
}
