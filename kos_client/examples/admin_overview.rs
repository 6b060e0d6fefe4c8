//! Prints the admin dashboard totals, optionally filtered:
//! `cargo run --example admin_overview -- <ride_status> <payment_status> <driver_id>`

use anyhow::Result;

use kos_client::{init_logger, AdminOverviewFilters, ClientConfig, KosClient};

#[tokio::main]
async fn main() -> Result<()> {
    init_logger("warn");

    let mut args = std::env::args().skip(1);
    let filters = AdminOverviewFilters {
        ride_status:    args.next(),
        payment_status: args.next(),
        driver_id:      args.next().and_then(|v| v.parse().ok()),
    };

    let api = KosClient::from_config(&ClientConfig::from_env()?)?;
    let overview = api.admin_overview(&filters).await?;

    let t = &overview.totals;
    println!("rides      {} total / {} pending / {} completed", t.rides_total, t.rides_pending, t.rides_completed);
    println!("payments   {} ok / {} failed", t.payments_succeeded, t.payments_failed);
    println!("drivers    {}", t.drivers_total);
    println!("revenue    {:.2} EUR", t.revenue_eur);
    Ok(())
}
