//! Mint a bearer token for a caller, signed with the configured secret.
//!
//! The secret and token lifetime come from `CROP_CONNECT_*` settings; the
//! caller is taken from the command line.

use std::ffi::OsString;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use crop_connect::config::WorkflowSettings;
use crop_connect::domain::{Caller, Role, UserId};
use crop_connect::outbound::identity::JwtIdentityResolver;
use crop_connect::telemetry::init_tracing;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::info;

/// `issue-token` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "issue-token",
    about = "Sign a bearer token for a workflow caller",
    version
)]
struct CliArgs {
    /// Role granted to the caller.
    #[arg(long, value_name = "admin|validator|farmer|buyer")]
    role: Role,
    /// Caller id. A fresh id is generated when omitted.
    #[arg(long = "user-id", value_name = "uuid")]
    user_id: Option<UserId>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let args = CliArgs::parse();
    let settings = WorkflowSettings::load_from_iter([OsString::from("issue-token")])
        .wrap_err("failed to load CROP_CONNECT settings")?;
    let secret = settings
        .jwt_secret()
        .ok_or_else(|| eyre!("CROP_CONNECT_JWT_SECRET is not set"))?;

    let resolver = JwtIdentityResolver::with_secret(
        secret,
        settings.token_ttl(),
        Arc::new(DefaultClock),
    )
    .wrap_err("invalid token settings")?;
    let caller = Caller::new(args.user_id.unwrap_or_else(UserId::random), args.role);
    let token = resolver.issue(caller).wrap_err("failed to sign token")?;

    info!(user_id = %caller.id, role = %caller.role, "issued token");
    println!("{token}");
    Ok(())
}
