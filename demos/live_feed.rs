use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use food_realtime_rs::{
    ChannelStatus, EndpointConfig, InboundMessage, MessageKind, RealtimeChannel,
    RealtimeChannelOptions,
};

#[derive(Debug, Deserialize)]
struct OrderSummary {
    #[serde(rename = "OrderID")]
    order_id: u64,
    #[serde(rename = "OrderStatus", default)]
    status: Option<String>,
    #[serde(rename = "Total", default)]
    total: Option<Value>,
}

/// Orders keyed by id, the way a dashboard grid would hold them
#[derive(Default)]
struct OrderBoard {
    orders: BTreeMap<u64, OrderSummary>,
    menu: Vec<Value>,
}

impl OrderBoard {
    fn apply(&mut self, message: &InboundMessage) {
        match message.kind {
            MessageKind::NewOrder | MessageKind::OrderUpdate => {
                match message.data_as::<OrderSummary>() {
                    Ok(order) => {
                        println!(
                            "📦 Order #{} [{}] total={}",
                            order.order_id,
                            order.status.as_deref().unwrap_or("Pending"),
                            order.total.as_ref().map(Value::to_string).unwrap_or_default()
                        );
                        self.orders.insert(order.order_id, order);
                    }
                    Err(e) => eprintln!("⚠️  Unreadable order payload: {}", e),
                }
            }
            MessageKind::MenuUpdate => {
                self.menu = message.data.as_array().cloned().unwrap_or_default();
                println!("🍔 Menu replaced ({} items)", self.menu.len());
            }
            _ => println!("❓ Unhandled {} message", message.kind),
        }
    }
}

/// Prints the live order feed until Ctrl-C
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "food_realtime_rs=info".into()),
        )
        .init();

    let endpoint = EndpointConfig::from_env()?;
    println!("📡 Connecting to: {}\n", endpoint.websocket_url()?);

    let board = Arc::new(Mutex::new(OrderBoard::default()));
    let board_for_feed = Arc::clone(&board);

    let options = RealtimeChannelOptions {
        on_status_change: Some(Arc::new(|status| match status {
            ChannelStatus::Open => println!("🟢 Live"),
            ChannelStatus::Reconnecting { attempt, delay } => {
                println!("🟡 Reconnecting in {:?} (attempt {})", delay, attempt)
            }
            ChannelStatus::Exhausted { attempts } => {
                println!("🔴 Gave up after {} attempts", attempts)
            }
            _ => {}
        })),
        ..Default::default()
    };

    let channel = RealtimeChannel::open_endpoint(&endpoint, options, move |message| {
        if let Ok(mut board) = board_for_feed.lock() {
            board.apply(&message);
        }
    })?;

    tokio::signal::ctrl_c().await?;

    println!("\nClosing...");
    channel.close().await;

    if let Ok(board) = board.lock() {
        println!(
            "Tracked {} orders, {} menu items",
            board.orders.len(),
            board.menu.len()
        );
    }
    Ok(())
}
