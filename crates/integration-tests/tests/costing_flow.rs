//! Full-cycle costing flow: receive, allocate FIFO, return, write off.

use rust_decimal::Decimal;

use saltbox_core::ProductId;
use saltbox_costing::{CostingEngine, CostingError, ExpenseKind};
use saltbox_integration_tests::{consumer, dec, on_day, receive_simple_lot};

// =============================================================================
// FIFO Consumption
// =============================================================================

#[test]
fn test_fifo_consumption_across_two_lots() {
    let engine = CostingEngine::default();
    receive_simple_lot(&engine, 1, "100", "10", 1);
    receive_simple_lot(&engine, 1, "50", "12", 2);
    assert_eq!(engine.available_quantity(ProductId::new(1)), dec("150"));

    let allocations = engine
        .allocate(ProductId::new(1), dec("120"), consumer(1, 1), on_day(3))
        .unwrap();

    let cogs: Decimal = allocations.iter().map(|a| a.total_cost).sum();
    assert_eq!(cogs, dec("1240.00"));

    let lots = engine.lots(ProductId::new(1));
    assert_eq!(lots[0].remaining_qty, Decimal::ZERO);
    assert_eq!(lots[1].remaining_qty, dec("30"));
}

#[test]
fn test_return_restores_both_lots() {
    let engine = CostingEngine::default();
    receive_simple_lot(&engine, 1, "100", "10", 1);
    receive_simple_lot(&engine, 1, "50", "12", 2);
    engine
        .allocate(ProductId::new(1), dec("120"), consumer(1, 1), on_day(3))
        .unwrap();

    let summary = engine.reverse(consumer(1, 1)).unwrap();
    assert_eq!(summary.allocations_removed, 2);

    let lots = engine.lots(ProductId::new(1));
    assert_eq!(lots[0].remaining_qty, dec("100"));
    assert_eq!(lots[1].remaining_qty, dec("50"));
    assert!(engine.allocations_for_consumer(consumer(1, 1)).is_empty());

    // Second reversal is a no-op.
    let summary = engine.reverse(consumer(1, 1)).unwrap();
    assert_eq!(summary.allocations_removed, 0);
}

#[test]
fn test_oversell_fails_cleanly() {
    let engine = CostingEngine::default();
    receive_simple_lot(&engine, 1, "100", "10", 1);
    receive_simple_lot(&engine, 1, "50", "12", 2);

    let err = engine
        .allocate(ProductId::new(1), dec("500"), consumer(1, 1), on_day(3))
        .unwrap_err();
    assert!(matches!(
        err,
        CostingError::InsufficientInventory { .. }
    ));

    // State untouched by the failed call.
    assert_eq!(engine.available_quantity(ProductId::new(1)), dec("150"));
    assert!(engine.allocations_for_consumer(consumer(1, 1)).is_empty());
    assert!(engine.reconcile().is_empty());
}

#[test]
fn test_partial_allocation_keeps_shortfall_visible() {
    let engine = CostingEngine::default();
    receive_simple_lot(&engine, 1, "30", "10", 1);

    let result = engine
        .allocate_partial(ProductId::new(1), dec("45"), consumer(9, 1), on_day(2))
        .unwrap();
    assert_eq!(result.unallocated_qty, dec("15"));
    assert_eq!(engine.available_quantity(ProductId::new(1)), Decimal::ZERO);

    // The created allocations behave like any others: reversible.
    engine.reverse(consumer(9, 1)).unwrap();
    assert_eq!(engine.available_quantity(ProductId::new(1)), dec("30"));
}

// =============================================================================
// Write-offs
// =============================================================================

#[test]
fn test_write_off_emits_loss_fact_and_survives_reconcile() {
    let engine = CostingEngine::default();
    receive_simple_lot(&engine, 1, "20", "2.50", 1);

    let summary = engine
        .consume_for_write_off(ProductId::new(1), dec("8"), on_day(2))
        .unwrap();
    assert_eq!(summary.total_cost, dec("20.00"));
    assert_eq!(engine.available_quantity(ProductId::new(1)), dec("12"));

    let expenses = engine.recorded_expenses();
    assert_eq!(expenses.last().unwrap().kind, ExpenseKind::WriteOff);
    assert_eq!(expenses.last().unwrap().amount, dec("20.00"));

    assert!(engine.reconcile().is_empty());
}

// =============================================================================
// Interleaved history
// =============================================================================

#[test]
fn test_interleaved_history_keeps_conservation() {
    let engine = CostingEngine::default();
    receive_simple_lot(&engine, 1, "100", "10", 1);
    receive_simple_lot(&engine, 2, "40", "7", 1);
    receive_simple_lot(&engine, 1, "50", "12", 5);

    engine
        .allocate(ProductId::new(1), dec("60"), consumer(1, 1), on_day(6))
        .unwrap();
    engine
        .allocate(ProductId::new(2), dec("10"), consumer(1, 2), on_day(6))
        .unwrap();
    engine
        .allocate(ProductId::new(1), dec("70"), consumer(2, 1), on_day(7))
        .unwrap();
    engine.reverse(consumer(1, 1)).unwrap();
    engine
        .consume_for_write_off(ProductId::new(1), dec("5"), on_day(8))
        .unwrap();
    engine
        .allocate(ProductId::new(1), dec("40"), consumer(3, 1), on_day(9))
        .unwrap();

    // 150 received − 70 − 5 − 40 = 35 still on hand.
    assert_eq!(engine.available_quantity(ProductId::new(1)), dec("35"));
    assert_eq!(engine.available_quantity(ProductId::new(2)), dec("30"));
    assert!(engine.reconcile().is_empty());
}

#[test]
fn test_weighted_average_cost_tracks_consumption() {
    let engine = CostingEngine::default();
    receive_simple_lot(&engine, 1, "100", "10", 1);
    receive_simple_lot(&engine, 1, "50", "12", 2);

    assert_eq!(
        engine.weighted_average_cost(ProductId::new(1)),
        dec("1600") / dec("150")
    );

    engine
        .allocate(ProductId::new(1), dec("150"), consumer(1, 1), on_day(3))
        .unwrap();
    assert_eq!(engine.weighted_average_cost(ProductId::new(1)), Decimal::ZERO);
}
