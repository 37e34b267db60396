//! Offline unit tests for narx-db pool configuration and row types.
//! These tests do not require a live database connection.

use narx_core::{AppConfig, Environment};
use narx_db::{PoolConfig, ProductRow, ShoppingListItemRow};
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        currency_symbol: "сум".to_string(),
        usd_rate: Decimal::from(12_800),
        recent_feed_size: 10,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm the row types exposed to the server
/// have the expected fields. No database required.
#[test]
fn row_types_have_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let product = ProductRow {
        id: Uuid::new_v4(),
        name: "Молоко".to_string(),
        category: "Молочные продукты".to_string(),
        unit: "л".to_string(),
        created_by: Some(Uuid::new_v4()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    assert_eq!(product.unit, "л");

    let item = ShoppingListItemRow {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        product_id: None,
        text: "Хлеб".to_string(),
        is_checked: false,
        created_at: Utc::now(),
    };
    assert!(!item.is_checked);
    assert!(item.product_id.is_none());
}
