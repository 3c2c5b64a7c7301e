use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use food_realtime_rs::{EndpointConfig, MessageKind, SharedChannel};

/// Several listeners on one socket: the transport opens with the first
/// subscriber and closes after the last one leaves.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let endpoint = EndpointConfig::from_env()?;
    let shared = SharedChannel::from_endpoint(&endpoint, Default::default())?;

    let orders = Arc::new(AtomicUsize::new(0));
    let menus = Arc::new(AtomicUsize::new(0));

    let orders_seen = Arc::clone(&orders);
    let order_grid = shared.subscribe(move |message| {
        if matches!(message.kind, MessageKind::NewOrder | MessageKind::OrderUpdate) {
            orders_seen.fetch_add(1, Ordering::Relaxed);
            println!("🧾 grid: {} {}", message.kind, message.data);
        }
    });

    let menus_seen = Arc::clone(&menus);
    let live_menu = shared.subscribe(move |message| {
        if message.kind == MessageKind::MenuUpdate {
            menus_seen.fetch_add(1, Ordering::Relaxed);
            println!("🍟 menu: {}", message.data);
        }
    });

    println!("👥 {} subscribers on one socket", shared.subscriber_count());
    println!("⏳ Listening for 60 seconds...\n");
    tokio::time::sleep(Duration::from_secs(60)).await;

    order_grid.unsubscribe().await;
    println!("Grid left, socket still up: {}", shared.channel().is_some());

    live_menu.unsubscribe().await;
    println!("Menu left, socket still up: {}", shared.channel().is_some());

    println!(
        "\n📋 Saw {} order events and {} menu updates",
        orders.load(Ordering::Relaxed),
        menus.load(Ordering::Relaxed)
    );
    Ok(())
}
