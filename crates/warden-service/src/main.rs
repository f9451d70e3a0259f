use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use warden_core::action::{Action, ActionRegistry};
use warden_core::resource::{ResourceId, ResourceKind, UserId};
use warden_core::role::role_model;
use warden_service::cli::{Cli, Command};
use warden_service::config::{AppConfig, LogFormat};
use warden_service::fixture::Fixture;
use warden_service::service::AuthzService;
use warden_storage::InMemoryStore;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    let registry = tracing_subscriber::registry().with(filter);

    match config.log.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr);
            registry.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr);
            registry.with(fmt_layer).init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    match cli.command {
        Command::Check {
            fixture,
            user,
            kind,
            resource,
            via,
            action,
        } => {
            let request = CheckRequest {
                user: UserId::new(user),
                kind: kind.parse()?,
                resource: ResourceId::new(resource),
                via: via.map(ResourceId::new),
                action,
            };
            run_check(&config, &fixture, request).await
        }
        Command::Actions { kind } => run_actions(&kind),
        Command::Roles { kind } => run_roles(&kind),
    }
}

struct CheckRequest {
    user: UserId,
    kind: ResourceKind,
    resource: ResourceId,
    via: Option<ResourceId>,
    action: String,
}

async fn run_check(
    config: &AppConfig,
    fixture_path: &Path,
    request: CheckRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::load(fixture_path)?;
    let action = Action::parse(request.kind, &request.action)?;

    let service = AuthzService::start(Arc::new(InMemoryStore::new()), &config.to_service_config());
    fixture.apply(&service).await?;

    let mut scope = service
        .access()
        .user(&request.user)
        .on(request.kind, &request.resource);
    if let Some(ref via) = request.via {
        scope = scope.via(via);
    }
    let decision = scope.check(action).await;
    service.shutdown().await;
    let decision = decision?;

    let verdict = if decision.allowed { "allowed" } else { "denied" };
    match decision.role {
        Some(role) => println!("{verdict}: {} (role {role})", decision.reason),
        None => println!("{verdict}: {}", decision.reason),
    }
    Ok(())
}

fn run_actions(kind: &str) -> Result<(), Box<dyn std::error::Error>> {
    for action in ActionRegistry::actions(kind)? {
        println!("{action}");
    }
    Ok(())
}

fn run_roles(kind: &str) -> Result<(), Box<dyn std::error::Error>> {
    let kind: ResourceKind = kind.parse()?;
    let model = role_model();

    for role in model.roles(kind) {
        let actions = model
            .allowed_actions(*role)
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join(", ");
        println!("{:>3}  {:<12} {}", role.rank(), role.name(), actions);
    }
    Ok(())
}
