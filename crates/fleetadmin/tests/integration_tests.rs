//! Integration tests for fleetadmin.
//!
//! Drive the grid engine against the in-memory record store the way the app
//! does: load an entity, mutate optimistically, settle the store call, and
//! check reconcile/rollback behavior end to end.

use fleetadmin::schema::EntityKind;
use fleetadmin::service::{MemoryStore, RecordStore};
use grid_engine::{
    FilterCondition, FilterOperator, GridController, MutationError, MutationOp, MutationSuccess,
    Row, RowId,
};

/// Build a controller loaded with the entity's records from the store.
async fn load_grid(store: &MemoryStore, entity: EntityKind) -> GridController {
    let records = store.list(entity.path()).await.unwrap();
    let mut grid = GridController::new(entity.columns(), 25);
    grid.load_records(&records);
    grid
}

#[tokio::test]
async fn test_load_and_view_vehicles() {
    let store = MemoryStore::with_demo_data();
    let grid = load_grid(&store, EntityKind::Vehicles).await;

    let view = grid.view();
    assert_eq!(view.total_rows, grid.rows().len());
    assert!(view.total_rows > 0);
}

#[tokio::test]
async fn test_update_round_trip_reconciles_to_server_state() {
    let store = MemoryStore::with_demo_data();
    let mut grid = load_grid(&store, EntityKind::Vehicles).await;
    let id = RowId::new("1");

    let request = grid.begin_update(&id, "model", "Volvo FH17").unwrap();
    // Optimistic: visible before the store call settles.
    assert_eq!(grid.row(&id).unwrap().get("model").display(), "Volvo FH17");

    let (record_id, record) = match request.op {
        MutationOp::Update { ref id, ref record } => (id.clone(), record.clone()),
        _ => panic!("expected update op"),
    };
    let outcome = store
        .update(EntityKind::Vehicles.path(), record_id.as_str(), record)
        .await
        .map(|record| MutationSuccess::Updated { record });
    grid.resolve(request.id, outcome);

    assert_eq!(grid.row(&id).unwrap().get("model").display(), "Volvo FH17");
    assert!(!grid.is_locked(&id));

    // The store itself was updated too.
    let records = store.list(EntityKind::Vehicles.path()).await.unwrap();
    let stored = records.iter().find(|r| r["id"] == serde_json::json!(1)).unwrap();
    assert_eq!(stored["model"], serde_json::json!("Volvo FH17"));
}

#[tokio::test]
async fn test_failed_update_rolls_back_to_pre_edit_row() {
    let store = MemoryStore::with_demo_data();
    let mut grid = load_grid(&store, EntityKind::Vehicles).await;
    let id = RowId::new("1");
    let before = grid.row(&id).unwrap().clone();

    let request = grid.begin_update(&id, "model", "Phantom").unwrap();
    let (record_id, record) = match request.op {
        MutationOp::Update { ref id, ref record } => (id.clone(), record.clone()),
        _ => panic!("expected update op"),
    };

    store.fail_next(MutationError::Server("validation failed".to_string()));
    let outcome = store
        .update(EntityKind::Vehicles.path(), record_id.as_str(), record)
        .await
        .map(|record| MutationSuccess::Updated { record });
    assert!(outcome.is_err());
    grid.resolve(request.id, outcome);

    // Canonical row is exactly the pre-edit row again.
    assert_eq!(grid.row(&id).unwrap(), &before);
    assert!(!grid.is_locked(&id));

    // The store never saw the change.
    let records = store.list(EntityKind::Vehicles.path()).await.unwrap();
    let stored = records.iter().find(|r| r["id"] == serde_json::json!(1)).unwrap();
    assert_eq!(stored["model"], before.get("model").to_json());
}

#[tokio::test]
async fn test_create_round_trip_swaps_in_the_server_row() {
    let store = MemoryStore::with_demo_data();
    let mut grid = load_grid(&store, EntityKind::Drivers).await;
    let count_before = grid.rows().len();

    let request = grid.begin_create(Row::blank);
    assert_eq!(grid.rows().len(), count_before + 1);

    let record = match request.op {
        MutationOp::Create { ref record } => record.clone(),
        _ => panic!("expected create op"),
    };
    let outcome = store
        .create(EntityKind::Drivers.path(), record)
        .await
        .map(|record| MutationSuccess::Created { record });
    grid.resolve(request.id, outcome);

    assert_eq!(grid.rows().len(), count_before + 1);
    // The provisional id was swapped for the store-assigned one.
    assert!(grid.rows().iter().all(|r| !r.id().as_str().starts_with("new-")));
    assert!(grid.rows().iter().all(|r| !r.is_new));
    assert_eq!(store.record_count(EntityKind::Drivers.path()), count_before + 1);
}

#[tokio::test]
async fn test_failed_create_leaves_no_orphan_row() {
    let store = MemoryStore::with_demo_data();
    let mut grid = load_grid(&store, EntityKind::Drivers).await;
    let count_before = grid.rows().len();

    let request = grid.begin_create(Row::blank);
    let record = match request.op {
        MutationOp::Create { ref record } => record.clone(),
        _ => panic!("expected create op"),
    };

    store.fail_next(MutationError::Network("connection reset".to_string()));
    let outcome = store
        .create(EntityKind::Drivers.path(), record)
        .await
        .map(|record| MutationSuccess::Created { record });
    grid.resolve(request.id, outcome);

    assert_eq!(grid.rows().len(), count_before);
    assert_eq!(store.record_count(EntityKind::Drivers.path()), count_before);
}

#[tokio::test]
async fn test_delete_round_trip_and_rollback() {
    let store = MemoryStore::with_demo_data();
    let mut grid = load_grid(&store, EntityKind::Alerts).await;
    let count_before = grid.rows().len();
    let id = RowId::new("31");

    // Failure path first: the row comes back.
    let request = grid.begin_delete(&id).unwrap();
    store.fail_next(MutationError::Server("forbidden".to_string()));
    let outcome = store
        .delete(EntityKind::Alerts.path(), "31")
        .await
        .map(|()| MutationSuccess::Deleted);
    grid.resolve(request.id, outcome);
    assert_eq!(grid.rows().len(), count_before);
    assert!(grid.row(&id).is_some());

    // Then the success path: the row stays gone, here and in the store.
    let request = grid.begin_delete(&id).unwrap();
    let outcome = store
        .delete(EntityKind::Alerts.path(), "31")
        .await
        .map(|()| MutationSuccess::Deleted);
    grid.resolve(request.id, outcome);
    assert_eq!(grid.rows().len(), count_before - 1);
    assert_eq!(store.record_count(EntityKind::Alerts.path()), count_before - 1);
}

#[tokio::test]
async fn test_filter_sort_paginate_over_loaded_records() {
    let store = MemoryStore::with_demo_data();
    let mut grid = load_grid(&store, EntityKind::Vehicles).await;

    grid.filters.stage_add(FilterCondition::new(
        "in_service",
        FilterOperator::Equals,
        "true",
    ));
    grid.apply_filters().unwrap();
    grid.set_sort(grid_engine::SortState::descending("odometer_km"));

    let view = grid.view();
    assert!(view.total_rows > 0);
    assert!(view.total_rows < grid.rows().len());

    let odometers: Vec<f64> = view
        .rows
        .iter()
        .map(|r| r.get("odometer_km").as_number().unwrap())
        .collect();
    let mut sorted = odometers.clone();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
    assert_eq!(odometers, sorted);
}

#[tokio::test]
async fn test_in_flight_guard_blocks_reentry_until_settled() {
    let store = MemoryStore::with_demo_data();
    let mut grid = load_grid(&store, EntityKind::Vehicles).await;
    let id = RowId::new("2");

    let request = grid.begin_update(&id, "model", "Scania R500").unwrap();
    // This is what the UI checks before re-entering edit mode.
    assert!(grid.is_locked(&id));

    grid.resolve(
        request.id,
        Ok(MutationSuccess::Updated {
            record: serde_json::json!({"id": 2, "plate": "KA-5110", "model": "Scania R500",
                                       "odometer_km": 287410, "in_service": true,
                                       "commissioned": "2021-02-03", "last_seen": "2026-08-07T04:02:00Z"}),
        }),
    );
    assert!(!grid.is_locked(&id));
}
