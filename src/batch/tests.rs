//! Tests for batch accumulation and flush scheduling

#[cfg(test)]
mod tests {
    use crate::{
        ActionKind, Transaction, TransactionOptions,
        batch::{BatchAccumulator, FlushScheduler, FlushTrigger},
    };
    use tokio::time::{Duration, Instant};

    /// Helper function to create a test transaction with a payload of `size` bytes
    fn create_test_tx(id: &str, size: usize) -> Transaction {
        let (tx, _rx) = Transaction::new(
            ActionKind::Index,
            "events",
            id,
            vec![b'x'; size],
            TransactionOptions::default(),
        );
        tx
    }

    #[test]
    fn test_count_trigger_fires_at_threshold() {
        let mut acc = BatchAccumulator::new(3, 1024);

        assert_eq!(acc.push(create_test_tx("1", 10)), None);
        assert_eq!(acc.push(create_test_tx("2", 10)), None);
        assert_eq!(acc.push(create_test_tx("3", 10)), Some(FlushTrigger::Count));
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_size_trigger_fires_before_count() {
        let mut acc = BatchAccumulator::new(100, 50);

        assert_eq!(acc.push(create_test_tx("1", 20)), None);
        assert_eq!(acc.push(create_test_tx("2", 20)), None);
        assert_eq!(acc.push(create_test_tx("3", 10)), Some(FlushTrigger::Size));
        assert_eq!(acc.size_bytes(), 50);
    }

    #[test]
    fn test_oversized_transaction_flushes_alone() {
        let mut acc = BatchAccumulator::new(100, 50);

        assert_eq!(acc.push(create_test_tx("big", 500)), Some(FlushTrigger::Size));
        let batch = acc.take().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.size_bytes, 500);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_take_preserves_order_and_resets() {
        let mut acc = BatchAccumulator::new(10, 1024);
        for id in ["a", "b", "c"] {
            acc.push(create_test_tx(id, 1));
        }

        let batch = acc.take().unwrap();
        let ids: Vec<&str> = batch.transactions.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(acc.len(), 0);
        assert_eq!(acc.size_bytes(), 0);
    }

    #[test]
    fn test_empty_take_yields_nothing_and_keeps_ids() {
        let mut acc = BatchAccumulator::new(10, 1024);
        assert!(acc.take().is_none());

        acc.push(create_test_tx("1", 1));
        assert_eq!(acc.take().unwrap().batch_id, 1);

        assert!(acc.take().is_none());
        acc.push(create_test_tx("2", 1));
        assert_eq!(acc.take().unwrap().batch_id, 2);
    }

    #[test]
    fn test_batch_refresh_flag() {
        let mut acc = BatchAccumulator::new(10, 1024);
        acc.push(create_test_tx("1", 1));
        let (tx, _rx) = Transaction::new(
            ActionKind::Update,
            "events",
            "2",
            b"{}".to_vec(),
            TransactionOptions::new().with_refresh(),
        );
        acc.push(tx);

        assert!(acc.take().unwrap().requires_refresh());

        acc.push(create_test_tx("3", 1));
        assert!(!acc.take().unwrap().requires_refresh());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_ticks_after_one_period() {
        let start = Instant::now();
        let mut scheduler = FlushScheduler::new(Duration::from_secs(1));

        scheduler.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(1));

        scheduler.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_reset_restarts_period() {
        let start = Instant::now();
        let mut scheduler = FlushScheduler::new(Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(700)).await;
        scheduler.reset();
        assert_eq!(scheduler.since_last_flush(), Duration::ZERO);

        scheduler.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(1700));
    }
}
