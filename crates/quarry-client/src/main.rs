use quarry_client::{ClientConfig, ConnectIntent, Connection, Session, SessionEvent};
use quarry_protocol_core::{ConnectionState, ProtocolAdapter, ProtocolVersion};
use quarry_protocol_versions::ProtocolTables;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/client.toml"));
    let config = ClientConfig::load(&config_path)?;
    let address = config.server_address()?;
    let tables = ProtocolTables::shared()?;
    info!("Connecting to {} as {}", address, config.username);

    let version = select_version(&config, &tables).await?;
    info!("Using protocol {}", version);

    let conn = Connection::new(address, version, tables.clone(), config.network());
    let (session, mut events) = Session::new(tables, config.brand.clone());
    conn.connect(
        ConnectIntent::Login {
            username: config.username.clone(),
        },
        Arc::new(session),
    );

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => log_event(event),
                None => {
                    report_close(&conn, conn.closed().await);
                    break;
                }
            },
            state = conn.closed() => {
                report_close(&conn, state);
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Disconnecting");
                conn.disconnect();
                report_close(&conn, conn.closed().await);
                break;
            }
        }
    }
    Ok(())
}

/// The configured version, or the one the server advertises in its status.
async fn select_version(
    config: &ClientConfig,
    tables: &Arc<ProtocolTables>,
) -> anyhow::Result<ProtocolVersion> {
    let versions = tables.versions();
    if config.version != "auto" {
        if let Some(version) = versions.by_name(&config.version) {
            return Ok(version);
        }
        let protocol: u32 = config
            .version
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown version {:?}", config.version))?;
        return Ok(tables.resolve_version(protocol));
    }

    let probe = Connection::new(
        config.server_address()?,
        versions.lowest(),
        tables.clone(),
        config.network(),
    );
    let (session, mut events) = Session::new(tables.clone(), config.brand.clone());
    probe.connect(ConnectIntent::Status, Arc::new(session));

    let mut detected = None;
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Status(status) => {
                info!(
                    "Server runs {} ({}): {}",
                    status.version.name,
                    status.version.protocol,
                    status.motd()
                );
                detected = status.protocol();
            }
            SessionEvent::Pong { latency_ms } => {
                info!("Ping {} ms", latency_ms);
                break;
            }
            _ => {}
        }
        if probe.state().is_terminal() {
            break;
        }
    }
    probe.disconnect();
    if probe.closed().await == ConnectionState::Failed {
        if let Some(e) = probe.last_error() {
            anyhow::bail!("Status probe failed: {}", e);
        }
    }

    match detected {
        Some(protocol) => Ok(tables.resolve_version(protocol)),
        None => {
            warn!("Server did not report a usable version, trying the newest known");
            Ok(versions.highest())
        }
    }
}

fn log_event(event: SessionEvent) {
    match event {
        SessionEvent::LoggedIn(profile) => info!("Login succeeded: {}", profile.name),
        SessionEvent::Joined { entity_id } => info!("Joined the game as entity {}", entity_id),
        SessionEvent::Chat(text) => info!("[chat] {}", text),
        SessionEvent::Health { health, food, .. } => info!("Health {} food {}", health, food),
        SessionEvent::Kicked(reason) => warn!("Kicked: {}", reason),
        other => tracing::debug!("{:?}", other),
    }
}

fn report_close(conn: &Connection, state: ConnectionState) {
    match conn.last_error() {
        Some(e) if state == ConnectionState::Failed => error!("Connection failed: {}", e),
        _ => info!("Disconnected"),
    }
}
