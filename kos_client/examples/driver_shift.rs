//! Driver shift: log in, look at the pending queue, take the first ride.
//!
//! KOS_DRIVER_EMAIL / KOS_DRIVER_PASSWORD come from the environment or `.env`.

use anyhow::{Context, Result};

use kos_client::{init_logger, ClientConfig, KosClient, LoginPayload, RideStatus};

#[tokio::main]
async fn main() -> Result<()> {
    init_logger("info");

    let config = ClientConfig::from_env()?;
    let api = KosClient::from_config(&config)?;
    api.on_session_invalidated(|| eprintln!("session expired, please log in again"));

    // 1) reuse the stored session if there is one
    if !api.is_authenticated() {
        let email = std::env::var("KOS_DRIVER_EMAIL").context("KOS_DRIVER_EMAIL not set")?;
        let password = std::env::var("KOS_DRIVER_PASSWORD").context("KOS_DRIVER_PASSWORD not set")?;
        api.login(&LoginPayload { email, password }).await?;
    }
    let me = api.me().await?;
    println!("on shift: {} ({})", me.name, me.vehicle_plate);

    // 2) pending queue
    let pending = api.pending_rides().await?;
    println!("{} pending ride(s)", pending.len());

    // 3) take the first one and start it
    if let Some(ride) = pending.first() {
        let accepted = api.accept_ride(ride.id).await?;
        println!("accepted #{}: {} -> {}", accepted.id, accepted.pickup_address, accepted.dest_address);
        let started = api.update_ride_status(accepted.id, RideStatus::InProgress).await?;
        println!("ride #{} is now {}", started.id, started.status);
    }

    let active = api.assigned_rides(&[RideStatus::Accepted, RideStatus::InProgress]).await?;
    println!("{:#?}", active);
    Ok(())
}
