//! End-to-end flows through the engine facade.
//!
//! Store → engine components → ledger → change feed, with the in-memory store.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use proptest::prelude::*;

    use stockflow_core::{ArticleId, InventoryId, LocationId, MovementId, UserId};
    use stockflow_events::{Event, EventEnvelope, InMemoryEventBus};
    use stockflow_infra::{
        ArticleQuery, ArticleStore, CommitReceipt, DocumentStore, EngineConfig, InMemoryStore, LocationStore,
        MovementStore, PublishingStore, StoreChange, StoreError, WriteBatch,
    };
    use stockflow_inventory::{Article, ArticleChanges, ArticleRecord, Location, Movement, MovementKind, Unit};

    use crate::adjuster::AdjustMode;
    use crate::engine::InventoryEngine;
    use crate::transfer::TransferRequest;

    type Engine = InventoryEngine<Arc<InMemoryStore>>;

    fn setup() -> (Engine, Arc<InMemoryStore>) {
        stockflow_observability::init_for_tests();
        let store = Arc::new(InMemoryStore::new());
        (InventoryEngine::new(store.clone(), EngineConfig::default()), store)
    }

    async fn create<S: DocumentStore + Clone>(
        engine: &InventoryEngine<S>,
        record: ArticleRecord,
        inventory: InventoryId,
    ) -> Article {
        let outcome = engine.create_article(&record, inventory, UserId::new()).await;
        assert!(outcome.success, "{}", outcome.message);
        engine
            .store()
            .get_article(outcome.article_id.unwrap())
            .await
            .unwrap()
            .unwrap()
    }

    fn transfer(article: &Article, to: Option<InventoryId>, quantity: i64) -> TransferRequest {
        TransferRequest {
            article_id: article.id,
            from_inventory: article.inventory_id,
            to_inventory: to,
            quantity,
            description: String::new(),
            destination_location: None,
            user_id: UserId::new(),
        }
    }

    #[tokio::test]
    async fn cable_transfer_splits_into_new_destination_record() {
        let (engine, store) = setup();
        let (a, b) = (InventoryId::new(), InventoryId::new());
        let cable = create(&engine, ArticleRecord::material("Cable UTP", 100, Unit::Metro), a).await;

        let outcome = engine.transfer(transfer(&cable, Some(b), 30)).await;

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.warning, None);
        assert_eq!(store.get_article(cable.id).await.unwrap().unwrap().quantity(), 70);

        let in_b = store.query_articles(&ArticleQuery::in_inventory(b)).await.unwrap();
        assert_eq!(in_b.len(), 1);
        assert_eq!(in_b[0].name, "Cable UTP");
        assert_eq!(in_b[0].quantity(), 30);

        let transfers: Vec<Movement> = engine
            .history(cable.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.kind == MovementKind::Transfer)
            .collect();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].quantity, 30);
        assert_eq!(Some(transfers[0].id), outcome.movement_id);
    }

    #[tokio::test]
    async fn duplicate_serial_in_another_inventory_is_refused() {
        let (engine, store) = setup();
        let router = create(&engine, ArticleRecord::equipment("Router", "SN123"), InventoryId::new()).await;
        let movements = store.movement_count();

        let outcome = engine
            .create_article(&ArticleRecord::equipment("Router", "SN123"), InventoryId::new(), UserId::new())
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.conflict, Some(router.id));
        assert!(outcome.message.contains("SN123"));
        assert_eq!(store.article_count(), 1);
        assert_eq!(store.movement_count(), movements);
    }

    #[tokio::test]
    async fn decrement_to_fifteen_writes_one_exit_of_five() {
        let (engine, _store) = setup();
        let screws = create(&engine, ArticleRecord::material("Tornillo", 20, Unit::Unidad), InventoryId::new()).await;

        let outcome = engine
            .adjust(screws.id, 15, AdjustMode::Decrement, None, UserId::new())
            .await;

        assert!(outcome.success);
        let exits: Vec<Movement> = engine
            .history(screws.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.kind == MovementKind::Exit)
            .collect();
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].quantity, 5);
        assert_eq!(outcome.message, "quantity updated to 15");
    }

    #[tokio::test]
    async fn code_match_wins_over_composite_match() {
        let (engine, _store) = setup();
        let inv = InventoryId::new();
        create(&engine, ArticleRecord::material("Cable", 5, Unit::Metro), inv).await;
        let coded = create(
            &engine,
            ArticleRecord::material("Tornillo", 5, Unit::Caja).with_code("TOR-001"),
            inv,
        )
        .await;

        let candidate = Article::from_record(
            &ArticleRecord::material("Cable", 1, Unit::Metro).with_code("tor-001"),
            ArticleId::new(),
            inv,
            Utc::now(),
        )
        .unwrap();

        let found = engine.find_duplicate(&candidate, inv, None).await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(coded.id));
        assert!(engine.find_duplicate(&candidate, InventoryId::new(), None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ledger_entries_never_change() {
        let (engine, store) = setup();
        let (a, b) = (InventoryId::new(), InventoryId::new());
        let cable = create(&engine, ArticleRecord::material("Cable", 50, Unit::Metro), a).await;

        let first = engine.transfer(transfer(&cable, Some(b), 10)).await.movement_id.unwrap();
        let snapshot = store.get_movement(first).await.unwrap().unwrap();

        engine.adjust(cable.id, 5, AdjustMode::Direct, Some("recount"), UserId::new()).await;
        let cable = store.get_article(cable.id).await.unwrap().unwrap();
        engine.transfer(transfer(&cable, Some(b), 5)).await;
        let changes = ArticleChanges {
            name: Some("Cable UTP".into()),
            ..ArticleChanges::default()
        };
        engine.record_edit(cable.id, &changes, UserId::new()).await;

        let later = store.get_movement(first).await.unwrap().unwrap();
        assert_eq!(later, snapshot);
        assert_eq!(later.kind, MovementKind::Transfer);
        assert_eq!(later.quantity, 10);
        assert_eq!(later.occurred_at, snapshot.occurred_at);

        let history = engine.inventory_history(b).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.windows(2).all(|w| w[0].occurred_at <= w[1].occurred_at));
    }

    #[tokio::test]
    async fn store_failure_is_reported_and_leaves_no_trace() {
        let (engine, store) = setup();
        let cable = create(&engine, ArticleRecord::material("Cable", 20, Unit::Metro), InventoryId::new()).await;
        let movements = store.movement_count();
        store.fail_next_commit(StoreError::Unavailable("connection reset".into()));

        let outcome = engine.adjust(cable.id, 10, AdjustMode::Decrement, None, UserId::new()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.message, "could not save changes");
        assert_eq!(store.get_article(cable.id).await.unwrap().unwrap().quantity(), 20);
        assert_eq!(store.movement_count(), movements);
    }

    #[tokio::test]
    async fn locations_share_one_namespace() {
        let (engine, _store) = setup();
        let created = engine.create_location("Bodega Central", Some(InventoryId::new())).await;
        assert!(created.success);

        let clash = engine.create_location("bodega central", Some(InventoryId::new())).await;
        assert!(!clash.success);
        assert!(clash.message.starts_with("nombre:"));

        let renamed = engine.rename_location(created.location_id.unwrap(), "Bodega Norte").await;
        assert!(renamed.success, "{}", renamed.message);
        assert_eq!(engine.list_locations(None).await.unwrap()[0].name, "Bodega Norte");
    }

    #[tokio::test]
    async fn change_feed_sees_every_committed_write() {
        stockflow_observability::init_for_tests();
        let bus: Arc<InMemoryEventBus<EventEnvelope<StoreChange>>> = Arc::new(InMemoryEventBus::new());
        let store = Arc::new(PublishingStore::new(InMemoryStore::new(), bus.clone()));
        let engine = InventoryEngine::new(store, EngineConfig::default());
        let feed = engine.subscribe();

        let cable = create(&engine, ArticleRecord::material("Cable", 8, Unit::Metro), InventoryId::new()).await;
        let rejected = engine
            .adjust(cable.id, 9, AdjustMode::Decrement, None, UserId::new())
            .await;
        assert!(!rejected.success);

        let events: Vec<&'static str> = feed.drain().iter().map(|e| e.payload().event_type()).collect();
        assert_eq!(events, vec!["article.created", "movement.recorded"]);
    }

    /// Store that lets another writer commit right before each of our commits.
    struct RacingStore {
        inner: Arc<InMemoryStore>,
        competitor: Mutex<Option<WriteBatch>>,
    }

    #[async_trait]
    impl ArticleStore for RacingStore {
        async fn get_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
            self.inner.get_article(id).await
        }

        async fn query_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, StoreError> {
            self.inner.query_articles(query).await
        }
    }

    #[async_trait]
    impl MovementStore for RacingStore {
        async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>, StoreError> {
            self.inner.get_movement(id).await
        }

        async fn movements_for_article(&self, article_id: ArticleId) -> Result<Vec<Movement>, StoreError> {
            self.inner.movements_for_article(article_id).await
        }

        async fn movements_for_inventory(&self, inventory_id: InventoryId) -> Result<Vec<Movement>, StoreError> {
            self.inner.movements_for_inventory(inventory_id).await
        }
    }

    #[async_trait]
    impl LocationStore for RacingStore {
        async fn get_location(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
            self.inner.get_location(id).await
        }

        async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
            self.inner.list_locations().await
        }
    }

    #[async_trait]
    impl DocumentStore for RacingStore {
        async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError> {
            let competitor = self.competitor.lock().unwrap().take();
            if let Some(competitor) = competitor {
                self.inner.commit(competitor).await?;
            }
            self.inner.commit(batch).await
        }
    }

    #[tokio::test]
    async fn stale_update_is_rejected_without_lost_update() {
        stockflow_observability::init_for_tests();
        let inner = Arc::new(InMemoryStore::new());
        let racing = Arc::new(RacingStore {
            inner: inner.clone(),
            competitor: Mutex::new(None),
        });
        let engine = InventoryEngine::new(racing.clone(), EngineConfig::default());
        let cable = create(&engine, ArticleRecord::material("Cable", 20, Unit::Metro), InventoryId::new()).await;
        let movements = inner.movement_count();

        // Someone else sets the quantity to 50 after we read 20.
        let mut theirs = cable.clone();
        theirs.set_quantity(50).unwrap();
        let mut competitor = WriteBatch::new();
        competitor.update_article(theirs);
        *racing.competitor.lock().unwrap() = Some(competitor);

        let outcome = engine.adjust(cable.id, 15, AdjustMode::Decrement, None, UserId::new()).await;

        assert!(!outcome.success);
        assert!(outcome.message.contains("modified concurrently"));
        assert_eq!(inner.get_article(cable.id).await.unwrap().unwrap().quantity(), 50);
        assert_eq!(inner.movement_count(), movements);

        // A retry reads the new version and goes through.
        let retry = engine.adjust(cable.id, 15, AdjustMode::Decrement, None, UserId::new()).await;
        assert!(retry.success, "{}", retry.message);
        let exit = inner.get_movement(retry.movement_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(exit.quantity, 35);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Adjust(i64),
        Edit(i64),
        Move,
        CreateSameSerial,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0i64..4).prop_map(Op::Adjust),
            (0i64..4).prop_map(Op::Edit),
            Just(Op::Move),
            Just(Op::CreateSameSerial),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        #[test]
        fn equipment_stays_single_and_unique(ops in proptest::collection::vec(op(), 1..12)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let (engine, store) = setup();
                let inventories = [InventoryId::new(), InventoryId::new()];
                let router = create(&engine, ArticleRecord::equipment("Router", "SN-42"), inventories[0]).await;

                for op in ops {
                    let current = store.get_article(router.id).await.unwrap().unwrap();
                    match op {
                        Op::Adjust(q) => {
                            engine.adjust(router.id, q, AdjustMode::Direct, None, UserId::new()).await;
                        }
                        Op::Edit(q) => {
                            let changes = ArticleChanges { quantity: Some(q), ..ArticleChanges::default() };
                            engine.record_edit(router.id, &changes, UserId::new()).await;
                        }
                        Op::Move => {
                            let other = if current.inventory_id == inventories[0] { inventories[1] } else { inventories[0] };
                            let outcome = engine.transfer(transfer(&current, Some(other), 1)).await;
                            assert!(outcome.success, "{}", outcome.message);
                        }
                        Op::CreateSameSerial => {
                            let outcome = engine
                                .create_article(&ArticleRecord::equipment("Router", "sn-42"), inventories[1], UserId::new())
                                .await;
                            assert!(!outcome.success);
                        }
                    }

                    let all = store
                        .query_articles(&ArticleQuery::all().with_serial("SN-42"))
                        .await
                        .unwrap();
                    assert_eq!(all.len(), 1);
                    assert_eq!(all[0].quantity(), 1);
                    assert!(all[0].to_record().quantity == Some(1));
                }
            });
        }
    }
}
