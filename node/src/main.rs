// Copyright (c) 2026 ATTEST Contributors. MIT License.

//! ATTEST registry node: serves the credential registry over HTTP with a
//! sled-backed mirror and a Prometheus metrics endpoint.

mod api;
mod cli;
mod logging;
mod metrics;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use attest_protocol::clock::SystemClock;
use attest_protocol::config::PROTOCOL_VERSION;
use attest_protocol::crypto::AttestKeypair;
use attest_protocol::identity::AttestId;
use attest_protocol::metadata::ContentStore;
use attest_protocol::registry::{
    AuthorizationPolicy, MirrorSink, RegistryConfig, RegistryEvent, RegistryService,
};
use attest_protocol::storage::RegistryDb;
use attest_protocol::submit::Submitter;

use cli::{AttestNodeCli, Command, InitArgs, PolicyArg, RunArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = AttestNodeCli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Init(args) => init(args),
        Command::Version => {
            println!("attest-node {}", env!("CARGO_PKG_VERSION"));
            println!("protocol {PROTOCOL_VERSION}");
            Ok(())
        }
    }
}

struct DbSink(Arc<RegistryDb>);

impl MirrorSink for DbSink {
    fn apply(&self, event: &RegistryEvent) {
        self.0.apply(event);
    }
}

async fn run(args: RunArgs) -> Result<()> {
    logging::init_logging(args.log_format);
    info!(version = PROTOCOL_VERSION, "starting attest-node");

    let owner = resolve_owner(&args)?;

    let db = Arc::new(if args.dev {
        RegistryDb::open_temporary().context("opening in-memory database")?
    } else {
        RegistryDb::open(&args.data_dir)
            .with_context(|| format!("opening database at {}", args.data_dir.display()))?
    });
    let snapshot = db.snapshot().context("reading back registry mirror")?;
    if !snapshot.is_empty() {
        info!(
            credentials = snapshot.credentials.len(),
            dids = snapshot.dids.len(),
            "resuming registry from existing mirror"
        );
    }

    let policy = match args.policy {
        PolicyArg::TrustAtIssuance => AuthorizationPolicy::TrustAtIssuance,
        PolicyArg::RecheckCurrent => AuthorizationPolicy::RecheckCurrent,
    };
    let registry = RegistryService::restore(
        RegistryConfig::new(owner).with_policy(policy),
        Arc::new(SystemClock),
        vec![Box::new(DbSink(db.clone()))],
        snapshot,
    );

    let state = api::AppState {
        submitter: Submitter::new(registry.clone()),
        registry,
        store: ContentStore::new(),
        metrics: Arc::new(metrics::NodeMetrics::new()?),
        started_at: Utc::now(),
    };

    let api_addr = SocketAddr::from(([0, 0, 0, 0], args.api_port));
    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], args.metrics_port));

    let metrics_app = api::metrics_router(state.clone());
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .with_context(|| format!("binding metrics listener on {metrics_addr}"))?;
    info!(addr = %metrics_addr, "metrics endpoint listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, metrics_app).await {
            warn!(error = %e, "metrics server stopped");
        }
    });

    let app = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(api_addr)
        .await
        .with_context(|| format!("binding API listener on {api_addr}"))?;
    info!(addr = %api_addr, "registry API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving registry API")?;

    db.flush().context("flushing database on shutdown")?;
    info!("attest-node stopped");
    Ok(())
}

fn resolve_owner(args: &RunArgs) -> Result<AttestId> {
    match &args.owner {
        Some(address) => address
            .parse()
            .with_context(|| format!("'{address}' is not a valid atst1 owner address")),
        None if args.dev => {
            let keypair = AttestKeypair::generate();
            let owner = AttestId::from_public_key(&keypair.public_key());
            warn!(owner = %owner, "dev mode: generated ephemeral owner identity");
            // Printed, not logged: dev-only convenience for driving the
            // owner endpoints by hand.
            println!("dev owner address: {}", owner.to_address());
            println!("dev owner secret:  {}", hex::encode(keypair.secret_key_bytes()));
            Ok(owner)
        }
        None => bail!("--owner is required outside --dev mode"),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let keypair = AttestKeypair::generate();
    let owner = AttestId::from_public_key(&keypair.public_key());
    let secret = hex::encode(keypair.secret_key_bytes());

    println!("address:    {}", owner.to_address());
    println!("did:        did:atst:{}", owner.to_address());
    println!("public key: {}", keypair.public_key_hex());
    match &args.out {
        Some(path) => {
            std::fs::write(path, format!("{secret}\n"))
                .with_context(|| format!("writing secret key to {}", path.display()))?;
            println!("secret key written to {}", path.display());
        }
        None => println!("secret key: {secret}"),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received sigterm, shutting down"),
    }
}
