//! Rider flow: estimate a trip, book it, check the payment attached to it.

use anyhow::Result;

use kos_client::{init_logger, ClientConfig, CreateRidePayload, KosClient, RideEstimatePayload};

#[tokio::main]
async fn main() -> Result<()> {
    init_logger("info");

    let api = KosClient::from_config(&ClientConfig::from_env()?)?;

    let trip = RideEstimatePayload {
        pickup_address:  "Riva 1, Split".into(),
        dropoff_address: "Zračna luka Split".into(),
        scheduled_time:  "2026-10-20T09:30".into(),
        passenger_count: 2,
    };
    let estimate = api.estimate_ride(&trip).await?;
    println!(
        "{:.1} km, ~{:.0} min, {:.2} EUR",
        estimate.distance_km, estimate.duration_minutes, estimate.fare
    );

    let created = api
        .create_ride(&CreateRidePayload {
            trip,
            rider_name:  "Ana".into(),
            rider_email: "ana@example.com".into(),
            rider_phone: "+385 91 000 000".into(),
            notes:       Some("two suitcases".into()),
        })
        .await?;
    println!("booked ride #{}", created.ride.id);
    if let Some(err) = &created.payment_error {
        println!("payment not set up: {err}");
    }

    let stripe = api.stripe_config().await?;
    if stripe.configured {
        let details = api.payment_for_ride(created.ride.id).await?;
        println!("payment status: {}", details.payment_status);
    }
    Ok(())
}
