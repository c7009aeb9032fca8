//! gymkeep CLI: the `gym` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use gym_kernel::{NewClass, Trainer};
use support::Ctx;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "GYM_LOG";

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = Ctx::open_or_exit(cli.store.as_deref(), cli.config.as_deref(), cli.json);

    match cli.command {
        Commands::RegisterMember { id, secret, name } => {
            commands::account::register_member(&ctx, id, secret, name)
        }

        Commands::RegisterOperator {
            id,
            secret,
            name,
            access_level,
        } => commands::account::register_operator(&ctx, id, secret, name, access_level),

        Commands::Plans => commands::catalog::plans(&ctx),

        Commands::Facilities => commands::catalog::facilities(&ctx),

        Commands::Classes => commands::class::list(&ctx),

        Commands::Whoami { auth } => commands::account::whoami(&ctx, auth),

        Commands::ChangeSecret { auth, new_secret } => {
            commands::account::change_secret(&ctx, auth, new_secret)
        }

        Commands::Activate { auth, plan } => commands::membership::activate(&ctx, auth, plan),

        Commands::CancelMembership { auth } => commands::membership::cancel(&ctx, auth),

        Commands::Visit { auth } => commands::membership::visit(&ctx, auth),

        Commands::CheckIn {
            auth,
            facility,
            zone,
        } => commands::zone::check_in(&ctx, auth, facility, zone),

        Commands::CheckOut { auth, facility } => commands::zone::check_out(&ctx, auth, facility),

        Commands::AddClass {
            auth,
            facility,
            category,
            trainer,
            specialization,
            duration,
            capacity,
            start,
        } => commands::class::add(
            &ctx,
            auth,
            facility,
            NewClass {
                category,
                trainer: Trainer {
                    name: trainer,
                    specialization,
                },
                duration_minutes: duration,
                capacity,
                start_time: start,
            },
        ),

        Commands::RemoveClass {
            auth,
            facility,
            class_id,
        } => commands::class::remove(&ctx, auth, facility, class_id),

        Commands::Reserve {
            auth,
            facility,
            class_id,
        } => commands::class::reserve(&ctx, auth, facility, class_id),

        Commands::CancelReservation {
            auth,
            facility,
            class_id,
        } => commands::class::cancel_reservation(&ctx, auth, facility, class_id),

        Commands::Reservations { auth } => commands::class::reservations(&ctx, auth),

        Commands::Stats { auth } => commands::catalog::stats(&ctx, auth),
    }
}

/// Logs go to stderr so `--json` stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("warning: failed to initialize logging: {err}");
    }
}
