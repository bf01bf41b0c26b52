//! Subscribes to `NotifyUserChanges` and logs every notification received.

use clap::Parser;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use user_management::connect_user_client;
use user_management::ConnectionParams;
use user_management::NotificationSubscriber;
use user_management::Result;

#[derive(Parser, Debug)]
#[command(version, about = "Print user change notifications from a running service")]
struct Args {
    /// Service address, `host:port`
    #[arg(short, long, env = "USERMGMT_ADDRESS", default_value = "127.0.0.1:5566")]
    address: String,

    /// Connect timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    connect_timeout_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let params = ConnectionParams {
        connect_timeout_in_ms: args.connect_timeout_ms,
        ..Default::default()
    };

    let mut client = connect_user_client(&args.address, &params).await?;
    let mut subscriber = NotificationSubscriber::subscribe(&mut client).await?;
    info!(address = %args.address, "Subscribed to user change notifications");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C detected.");
                break;
            }
            next = subscriber.next_action() => match next {
                Ok(Some(action)) => info!("{}", action),
                Ok(None) => {
                    warn!("Service closed the notification stream");
                    break;
                }
                Err(status) => {
                    error!(%status, "Notification stream failed");
                    break;
                }
            },
        }
    }

    Ok(())
}
