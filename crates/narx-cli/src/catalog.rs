//! Catalog command handlers for the CLI.
//!
//! Called from `main` after the pool is established. Output is plain
//! stdout lines; errors propagate so the process exits non-zero.

use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use narx_core::{
    DisplayOptions, FavoriteToggle, ProductCategory, ReportObservation, SearchState,
};

fn display_options() -> DisplayOptions {
    match narx_core::load_app_config() {
        Ok(config) => DisplayOptions {
            currency_symbol: config.currency_symbol,
        },
        Err(_) => DisplayOptions::default(),
    }
}

/// Runs a paged search, printing up to `pages` pages of results. The
/// session state carries the query and filter across load-more steps.
pub(crate) async fn run_search(
    pool: &sqlx::PgPool,
    query: &str,
    category: Option<ProductCategory>,
    pages: u32,
) -> anyhow::Result<()> {
    let mut state = SearchState::new(query, category);

    loop {
        let page = narx_db::search_products(
            pool,
            narx_db::ProductSearch {
                query: &state.query,
                category: state.category.map(ProductCategory::as_str),
                limit: i64::from(state.page_size),
                offset: state.offset(),
            },
        )
        .await?;

        if page.items.is_empty() && state.page == 1 {
            println!("no products match \"{query}\"");
            return Ok(());
        }

        for product in &page.items {
            println!(
                "{}  {}  [{}]  {}",
                product.id, product.name, product.category, product.unit
            );
        }

        let total = u64::try_from(page.total).unwrap_or(0);
        if state.page >= pages || !state.has_more(total) {
            if state.has_more(total) {
                println!("... {} total, rerun with --pages to see more", page.total);
            }
            return Ok(());
        }
        state.next_page();
    }
}

pub(crate) async fn run_show(pool: &sqlx::PgPool, product_id: Uuid) -> anyhow::Result<()> {
    let product = narx_db::get_product(pool, product_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} not found"))?;

    let history = narx_db::list_prices_for_product(pool, product_id).await?;
    let observations: Vec<ReportObservation> = history
        .iter()
        .map(|r| ReportObservation {
            price: r.price,
            normalized_price: r.normalized_price,
            observed_at: r.created_at,
        })
        .collect();

    let now = Utc::now();
    let view = narx_core::aggregate(&observations, now);
    let current_store = view
        .current
        .as_ref()
        .and_then(|c| history.get(c.index))
        .map(|r| r.store_name.as_str());
    let opts = display_options();
    let model = narx_core::present(&product.name, &product.unit, &view, current_store, now, &opts);

    println!("{}  [{}]", model.display_name, product.category);
    println!("  цена:      {} / {}", model.formatted_price, model.unit_label);
    println!("  диапазон:  {}", model.price_range);
    println!("  магазин:   {}", model.store_name);
    println!("  обновлено: {}", model.last_update_relative);
    println!("  отчётов:   {}", history.len());

    for report in history.iter().rev() {
        println!(
            "    {}  {}  {} {} x {}",
            narx_core::display::format_short_date(report.created_at),
            report.store_name,
            narx_core::display::format_price(Some(report.price), &opts),
            report.unit,
            report.quantity,
        );
    }

    Ok(())
}

pub(crate) struct ReportArgs<'a> {
    pub product_id: Uuid,
    pub store: &'a str,
    pub price: Decimal,
    pub quantity: Decimal,
    pub unit: &'a str,
    pub currency: &'a str,
    pub user: Option<Uuid>,
}

pub(crate) async fn run_report(pool: &sqlx::PgPool, args: ReportArgs<'_>) -> anyhow::Result<()> {
    anyhow::ensure!(args.price > Decimal::ZERO, "price must be positive");
    anyhow::ensure!(args.quantity > Decimal::ZERO, "quantity must be positive");

    narx_db::get_product(pool, args.product_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {} not found", args.product_id))?;

    let usd_rate = narx_core::load_app_config()
        .map(|c| c.usd_rate)
        .unwrap_or_else(|_| Decimal::from(12_800));
    let price = narx_core::to_base_currency(args.price, args.currency, usd_rate)?;

    let store = narx_db::upsert_store_by_name(pool, args.store, args.user).await?;
    let normalized_price = narx_core::normalize(Decimal::from(price), args.quantity, args.unit);

    let row = narx_db::insert_price(
        pool,
        &narx_db::NewPrice {
            product_id: args.product_id,
            store_id: store.id,
            price,
            currency: narx_core::BASE_CURRENCY,
            quantity: args.quantity,
            unit: args.unit,
            normalized_price,
            created_by: args.user,
        },
    )
    .await?;

    match normalized_price {
        Some(normalized) => println!(
            "reported {} at {} ({} per {})",
            row.price,
            store.name,
            normalized,
            narx_core::base_unit_label(args.unit)
        ),
        None => println!("reported {} at {} (not normalized)", row.price, store.name),
    }

    Ok(())
}

pub(crate) async fn run_recent(pool: &sqlx::PgPool, limit: usize) -> anyhow::Result<()> {
    // Over-fetch so deduplication by product still fills the feed.
    let fetch = i64::try_from(limit * 2).unwrap_or(i64::MAX);
    let rows = narx_db::list_recent_prices(pool, fetch).await?;
    let deduped = narx_core::dedupe_recent(rows, limit, |r| r.product_id);

    let opts = display_options();
    let now = Utc::now();
    for report in deduped {
        println!(
            "{}  {}  {}  {}",
            narx_core::display::format_relative_time(report.created_at, now),
            report.product_name,
            narx_core::display::format_price(Some(report.price), &opts),
            report.store_name,
        );
    }

    Ok(())
}

/// Toggles a favorite with the optimistic projection the client UI uses:
/// apply locally first, then persist, rolling the projection back if the
/// write fails.
pub(crate) async fn run_favorite(
    pool: &sqlx::PgPool,
    user: Uuid,
    product_id: Uuid,
) -> anyhow::Result<()> {
    let mut local: HashSet<Uuid> = narx_db::list_favorite_products(pool, user)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let toggle = FavoriteToggle::plan(&local, product_id);
    toggle.apply(&mut local);

    match narx_db::toggle_favorite(pool, user, product_id).await {
        Ok(is_favorite) => {
            if is_favorite != toggle.make_favorite {
                tracing::warn!(%product_id, "favorite state drifted under a concurrent toggle");
            }
            if is_favorite {
                println!("added {product_id} to favorites");
            } else {
                println!("removed {product_id} from favorites");
            }
            Ok(())
        }
        Err(e) => {
            toggle.invert().apply(&mut local);
            Err(anyhow::anyhow!("favorite toggle failed: {e}"))
        }
    }
}
