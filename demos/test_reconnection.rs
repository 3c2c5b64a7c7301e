use std::time::Duration;
use food_realtime_rs::{ChannelStatus, EndpointConfig, RealtimeChannel, RealtimeChannelOptions};

/// Watch reconnection against a real backend. Stop and restart the server
/// while this runs to see the backoff schedule.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing to see logs
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("🦀 Testing Reconnection\n");

    let endpoint = EndpointConfig::from_env()?;
    println!("📡 Connecting to: {}\n", endpoint.websocket_url()?);

    // Short delays so a few cycles fit in the demo window
    let options = RealtimeChannelOptions {
        initial_reconnect_delay: Some(500),
        max_reconnect_delay: Some(8000),
        max_reconnect_attempts: Some(6),
        ..Default::default()
    };
    let channel = RealtimeChannel::open_endpoint(&endpoint, options, |message| {
        println!("\n📨 {} {}", message.kind, message.data);
    })?;

    let mut status = channel.status_receiver();

    println!("⏳ Watching status for 90 seconds...");
    println!("💡 To trigger a reconnect:");
    println!("   1. Stop the backend while this is running");
    println!("   2. Start it again after a few seconds");
    println!("   3. Watch the delays double and reset once connected\n");

    let watch = async {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            match &current {
                ChannelStatus::Connecting => println!("🔌 Connecting"),
                ChannelStatus::Open => println!("🟢 Connected"),
                ChannelStatus::Reconnecting { attempt, delay } => {
                    println!("🟡 Retry {} in {:?}", attempt, delay)
                }
                ChannelStatus::Exhausted { attempts } => {
                    println!("🔴 Exhausted after {} attempts, retrying manually", attempts);
                    channel.retry().await;
                }
                ChannelStatus::Idle | ChannelStatus::Closed => {}
            }
        }
    };
    let _ = tokio::time::timeout(Duration::from_secs(90), watch).await;

    // Manual close must not trigger reconnection
    println!("\n✅ Closing (should NOT auto-reconnect)...");
    channel.close().await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    if channel.is_connected().await {
        return Err("Should NOT reconnect after close".into());
    }
    println!("✅ Correctly stayed closed: {:?}", channel.status());

    println!("\n🎉 Reconnection demo completed!");
    Ok(())
}
