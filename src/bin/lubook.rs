use anyhow::Result;
use lubook::cli::{actions, actions::Action, start, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse arguments and initialize telemetry
    let action = start()?;

    // Handle the action
    match action {
        Action::Server { .. } => actions::server::handle(action).await?,
    }

    // Flush any pending spans before exiting
    telemetry::shutdown_tracer();

    Ok(())
}
