//! End-to-end order lifecycle against an on-disk database.

use std::sync::{Arc, Barrier};

use tempfile::TempDir;

use cortado_server::catalog::CatalogService;
use cortado_server::orders::manager::OrdersManager;
use cortado_server::stock::StockLedger;
use cortado_server::storage::PosStorage;
use shared::models::Recipe;
use shared::order::{
    CommandErrorCode, OrderCommand, OrderCommandPayload, OrderItemInput, OrderStatus, OrderType,
    PaymentInput, PaymentMethod, PaymentStatus,
};
use shared::stock::MovementKind;

struct TestServer {
    manager: OrdersManager,
    storage: PosStorage,
    tenant_id: i64,
    latte_id: i64,
    beans_id: i64,
    milk_id: i64,
    table_id: i64,
    // Keeps the database directory alive for the test's duration
    _dir: TempDir,
}

fn server() -> TestServer {
    let dir = TempDir::new().unwrap();
    let storage = PosStorage::open(dir.path().join("cortado.redb")).unwrap();
    let catalog = Arc::new(CatalogService::new(storage.clone()));

    let tenant = catalog
        .create_tenant(
            "Cafe Central".to_string(),
            "standard".to_string(),
            "Europe/Lisbon".to_string(),
        )
        .unwrap();
    let latte = catalog
        .create_menu_item(tenant.id, "Latte".to_string(), 3.5, 10.0, vec![], vec![])
        .unwrap();
    let beans = catalog
        .create_ingredient(
            tenant.id,
            "Espresso beans".to_string(),
            "g".to_string(),
            500.0,
            100.0,
            0.02,
        )
        .unwrap();
    let milk = catalog
        .create_ingredient(
            tenant.id,
            "Milk".to_string(),
            "ml".to_string(),
            2000.0,
            500.0,
            0.001,
        )
        .unwrap();
    catalog
        .set_recipes(
            tenant.id,
            latte.id,
            vec![
                Recipe {
                    menu_item_id: latte.id,
                    ingredient_id: beans.id,
                    quantity_needed: 18.0,
                },
                Recipe {
                    menu_item_id: latte.id,
                    ingredient_id: milk.id,
                    quantity_needed: 150.0,
                },
            ],
        )
        .unwrap();
    let table = catalog
        .create_dining_table(tenant.id, "T1".to_string(), 4)
        .unwrap();

    let ledger = Arc::new(StockLedger::new(storage.clone()));
    let manager = OrdersManager::new(storage.clone(), catalog, ledger);

    TestServer {
        manager,
        storage,
        tenant_id: tenant.id,
        latte_id: latte.id,
        beans_id: beans.id,
        milk_id: milk.id,
        table_id: table.id,
        _dir: dir,
    }
}

impl TestServer {
    fn command(&self, payload: OrderCommandPayload) -> OrderCommand {
        OrderCommand::new(self.tenant_id, "op-1".to_string(), "Ana".to_string(), payload)
    }

    fn open_order(&self, quantity: i32) -> String {
        let response = self.manager.execute_command(self.command(
            OrderCommandPayload::OpenOrder {
                order_type: OrderType::DineIn,
                table_id: Some(self.table_id),
                guest_count: Some(2),
                items: vec![OrderItemInput {
                    menu_item_id: self.latte_id,
                    variant_id: None,
                    modifier_ids: vec![],
                    quantity,
                    note: None,
                }],
            },
        ));
        assert!(response.success, "open failed: {:?}", response.error);
        response.order_id.unwrap()
    }

    fn stock(&self, ingredient_id: i64) -> f64 {
        self.storage
            .get_ingredient(ingredient_id)
            .unwrap()
            .unwrap()
            .current_stock
    }
}

#[test]
fn full_lifecycle_deducts_stock_and_survives_replay() {
    let server = server();
    let order_id = server.open_order(2);

    for payload in [
        OrderCommandPayload::ConfirmOrder {
            order_id: order_id.clone(),
        },
        OrderCommandPayload::StartPreparing {
            order_id: order_id.clone(),
        },
        OrderCommandPayload::MarkReady {
            order_id: order_id.clone(),
        },
        OrderCommandPayload::MarkServed {
            order_id: order_id.clone(),
        },
        OrderCommandPayload::AddPayment {
            order_id: order_id.clone(),
            payment: PaymentInput {
                method: PaymentMethod::Cash,
                amount: 7.7,
                tendered: Some(10.0),
                reference: None,
            },
        },
        OrderCommandPayload::CompleteOrder {
            order_id: order_id.clone(),
        },
    ] {
        let response = server.manager.execute_command(server.command(payload));
        assert!(response.success, "step failed: {:?}", response.error);
    }

    // Two lattes: 36g of beans, 300ml of milk
    assert_eq!(server.stock(server.beans_id), 464.0);
    assert_eq!(server.stock(server.milk_id), 1700.0);

    let snapshot = server
        .manager
        .get_order(server.tenant_id, &order_id)
        .unwrap();
    assert_eq!(snapshot.status, OrderStatus::Completed);
    assert_eq!(snapshot.payment_status, PaymentStatus::Paid);
    assert!(snapshot.verify_checksum());

    // Transition timestamps were stamped in visit order
    let stamps = [
        snapshot.confirmed_at.unwrap(),
        snapshot.preparing_at.unwrap(),
        snapshot.ready_at.unwrap(),
        snapshot.served_at.unwrap(),
        snapshot.completed_at.unwrap(),
    ];
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));

    // Replaying the event stream reproduces the stored snapshot
    let rebuilt = server
        .manager
        .rebuild_snapshot(server.tenant_id, &order_id)
        .unwrap();
    assert_eq!(rebuilt.state_checksum, snapshot.state_checksum);
    assert_eq!(rebuilt.total, snapshot.total);
    assert_eq!(rebuilt.payments.len(), 1);
}

#[test]
fn partial_payments_progress_to_paid_in_order() {
    let server = server();
    // 4 lattes: subtotal 14.00, tax 1.40, total 15.40
    let order_id = server.open_order(4);

    let snapshot = server
        .manager
        .get_order(server.tenant_id, &order_id)
        .unwrap();
    assert_eq!(snapshot.total, 15.4);
    assert_eq!(snapshot.payment_status, PaymentStatus::Unpaid);

    for (amount, expected) in [(5.0, PaymentStatus::Partial), (10.4, PaymentStatus::Paid)] {
        let response = server
            .manager
            .execute_command(server.command(OrderCommandPayload::AddPayment {
                order_id: order_id.clone(),
                payment: PaymentInput {
                    method: PaymentMethod::Card,
                    amount,
                    tendered: None,
                    reference: None,
                },
            }));
        assert!(response.success);
        let snapshot = server
            .manager
            .get_order(server.tenant_id, &order_id)
            .unwrap();
        assert_eq!(snapshot.payment_status, expected);
    }
}

#[test]
fn non_positive_payment_rejected_without_record() {
    let server = server();
    let order_id = server.open_order(1);

    for amount in [0.0, -5.0] {
        let response = server
            .manager
            .execute_command(server.command(OrderCommandPayload::AddPayment {
                order_id: order_id.clone(),
                payment: PaymentInput {
                    method: PaymentMethod::Cash,
                    amount,
                    tendered: None,
                    reference: None,
                },
            }));
        assert!(!response.success);
        assert_eq!(
            response.error.unwrap().code,
            CommandErrorCode::InvalidAmount
        );
    }

    let snapshot = server
        .manager
        .get_order(server.tenant_id, &order_id)
        .unwrap();
    assert!(snapshot.payments.is_empty());
    assert_eq!(snapshot.paid_amount, 0.0);
}

#[test]
fn concurrent_start_preparing_deducts_once() {
    let server = server();
    let order_id = server.open_order(2);
    assert!(
        server
            .manager
            .execute_command(server.command(OrderCommandPayload::ConfirmOrder {
                order_id: order_id.clone(),
            }))
            .success
    );

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let manager = server.manager.clone();
            let cmd = server.command(OrderCommandPayload::StartPreparing {
                order_id: order_id.clone(),
            });
            std::thread::spawn(move || manager.execute_command(cmd))
        })
        .collect();
    let responses: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let succeeded = responses.iter().filter(|r| r.success).count();
    assert_eq!(succeeded, 1);
    let failed = responses.iter().find(|r| !r.success).unwrap();
    assert_eq!(
        failed.error.as_ref().unwrap().code,
        CommandErrorCode::InvalidTransition
    );

    // Stock was deducted exactly once
    assert_eq!(server.stock(server.beans_id), 464.0);
    let deductions = server
        .storage
        .get_movements(server.tenant_id)
        .unwrap()
        .iter()
        .filter(|m| m.kind == MovementKind::OrderDeduct)
        .count();
    assert_eq!(deductions, 2); // one per ingredient, not per attempt
}

#[test]
fn concurrent_opens_cannot_share_a_table() {
    let server = server();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let manager = server.manager.clone();
            let cmd = server.command(OrderCommandPayload::OpenOrder {
                order_type: OrderType::DineIn,
                table_id: Some(server.table_id),
                guest_count: Some(2),
                items: vec![],
            });
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                manager.execute_command(cmd)
            })
        })
        .collect();
    let responses: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let succeeded = responses.iter().filter(|r| r.success).count();
    assert_eq!(succeeded, 1);
    let failed = responses.iter().find(|r| !r.success).unwrap();
    assert_eq!(
        failed.error.as_ref().unwrap().code,
        CommandErrorCode::TableOccupied
    );

    // Exactly one active order holds the table
    let active = server.manager.get_active_orders(server.tenant_id).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].table_id, Some(server.table_id));
}

#[test]
fn duplicate_open_command_creates_one_order() {
    let server = server();
    let cmd = server.command(OrderCommandPayload::OpenOrder {
        order_type: OrderType::Takeaway,
        table_id: None,
        guest_count: None,
        items: vec![],
    });

    let first = server.manager.execute_command(cmd.clone());
    let second = server.manager.execute_command(cmd);

    assert!(first.success && !first.duplicate);
    assert!(second.success && second.duplicate);
    assert_eq!(
        server
            .manager
            .get_active_orders(server.tenant_id)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn tenants_are_isolated() {
    let server = server();
    let order_id = server.open_order(1);

    // A second tenant on the same server sees none of it
    let other = {
        let catalog = Arc::new(CatalogService::new(server.storage.clone()));
        catalog
            .create_tenant(
                "Cafe Rival".to_string(),
                "standard".to_string(),
                "Europe/Madrid".to_string(),
            )
            .unwrap()
    };

    assert!(server
        .manager
        .get_active_orders(other.id)
        .unwrap()
        .is_empty());

    let foreign_confirm = OrderCommand::new(
        other.id,
        "op-2".to_string(),
        "Rui".to_string(),
        OrderCommandPayload::ConfirmOrder {
            order_id: order_id.clone(),
        },
    );
    let response = server.manager.execute_command(foreign_confirm);
    assert!(!response.success);
    assert_eq!(
        response.error.unwrap().code,
        CommandErrorCode::TenantMismatch
    );

    // The order is untouched
    let snapshot = server
        .manager
        .get_order(server.tenant_id, &order_id)
        .unwrap();
    assert_eq!(snapshot.status, OrderStatus::Pending);
}

#[test]
fn ledger_replay_matches_cached_stock() {
    let server = server();
    let order_id = server.open_order(3);
    for payload in [
        OrderCommandPayload::ConfirmOrder {
            order_id: order_id.clone(),
        },
        OrderCommandPayload::StartPreparing {
            order_id: order_id.clone(),
        },
    ] {
        assert!(server.manager.execute_command(server.command(payload)).success);
    }

    let ledger = StockLedger::new(server.storage.clone());
    for ingredient_id in [server.beans_id, server.milk_id] {
        let verification = ledger.verify(server.tenant_id, ingredient_id).unwrap();
        assert!(
            verification.consistent,
            "cached {} != replayed {}",
            verification.cached_stock, verification.replayed_stock
        );
    }
}

#[test]
fn order_numbers_are_sequential_per_day() {
    let server = server();
    let a = server.open_order(1);
    // Free the table so the next dine-in open is allowed
    assert!(
        server
            .manager
            .execute_command(server.command(OrderCommandPayload::CancelOrder {
                order_id: a.clone(),
                reason: "test".to_string(),
            }))
            .success
    );
    let b = server.open_order(1);

    let num_a = server
        .manager
        .get_order(server.tenant_id, &a)
        .unwrap()
        .order_number;
    let num_b = server
        .manager
        .get_order(server.tenant_id, &b)
        .unwrap()
        .order_number;

    assert_ne!(num_a, num_b);
    let (date_a, seq_a) = num_a.strip_prefix("ORD").unwrap().split_once('-').unwrap();
    let (date_b, seq_b) = num_b.strip_prefix("ORD").unwrap().split_once('-').unwrap();
    assert_eq!(date_a, date_b);
    assert_eq!(
        seq_b.parse::<u64>().unwrap(),
        seq_a.parse::<u64>().unwrap() + 1
    );
}
