use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use gym_kernel::ClassCategory;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gym",
    about = "gymkeep: memberships, zone check-in and class reservations for a fitness-club chain",
    version
)]
pub struct Cli {
    /// Snapshot file (overrides config and GYM_STORE_PATH)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// TOML config file (default: .gym/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr (GYM_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Login for one invocation; nothing is remembered between runs.
#[derive(Args, Debug, Clone)]
pub struct Credentials {
    /// Account identifier
    #[arg(long)]
    pub user: String,

    /// Account secret
    #[arg(long)]
    pub secret: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a member account
    RegisterMember {
        #[arg(long)]
        id: String,

        #[arg(long)]
        secret: String,

        /// Full name
        #[arg(long)]
        name: String,
    },

    /// Register an operator account
    RegisterOperator {
        #[arg(long)]
        id: String,

        #[arg(long)]
        secret: String,

        /// Full name
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "standard")]
        access_level: String,
    },

    /// List membership plans
    Plans,

    /// List facilities with live zone occupancy
    Facilities,

    /// List every scheduled class, earliest first
    Classes,

    /// Show the logged-in account
    Whoami {
        #[command(flatten)]
        auth: Credentials,
    },

    /// Change the account secret
    ChangeSecret {
        #[command(flatten)]
        auth: Credentials,

        #[arg(long)]
        new_secret: String,
    },

    /// Activate (or renew) a membership
    Activate {
        #[command(flatten)]
        auth: Credentials,

        /// monthly (short-cycle) or annual (long-cycle)
        #[arg(long)]
        plan: String,
    },

    /// Cancel the current membership
    CancelMembership {
        #[command(flatten)]
        auth: Credentials,
    },

    /// Record a gym visit
    Visit {
        #[command(flatten)]
        auth: Credentials,
    },

    /// Enter a zone
    CheckIn {
        #[command(flatten)]
        auth: Credentials,

        /// Facility key (F1, F2, F3)
        #[arg(long)]
        facility: String,

        /// Zone key (Cardio, Strength, Calisthenics)
        #[arg(long)]
        zone: String,
    },

    /// Leave the current zone
    CheckOut {
        #[command(flatten)]
        auth: Credentials,

        #[arg(long)]
        facility: String,
    },

    /// Schedule a class (operators)
    AddClass {
        #[command(flatten)]
        auth: Credentials,

        #[arg(long)]
        facility: String,

        /// fitness, pilates or yoga
        #[arg(long, value_parser = parse_category)]
        category: ClassCategory,

        /// Trainer name
        #[arg(long)]
        trainer: String,

        /// Trainer specialization
        #[arg(long, default_value = "")]
        specialization: String,

        /// Duration in minutes
        #[arg(long)]
        duration: u32,

        /// Maximum participants
        #[arg(long)]
        capacity: u32,

        /// Start time, RFC 3339 or `YYYY-MM-DD HH:MM` (UTC)
        #[arg(long, value_parser = parse_start_time)]
        start: DateTime<Utc>,
    },

    /// Remove a class (operators)
    RemoveClass {
        #[command(flatten)]
        auth: Credentials,

        #[arg(long)]
        facility: String,

        #[arg(long = "class")]
        class_id: String,
    },

    /// Reserve a place in a class
    Reserve {
        #[command(flatten)]
        auth: Credentials,

        #[arg(long)]
        facility: String,

        #[arg(long = "class")]
        class_id: String,
    },

    /// Cancel a class reservation
    CancelReservation {
        #[command(flatten)]
        auth: Credentials,

        #[arg(long)]
        facility: String,

        #[arg(long = "class")]
        class_id: String,
    },

    /// List my reserved classes
    Reservations {
        #[command(flatten)]
        auth: Credentials,
    },

    /// Club statistics (operators)
    Stats {
        #[command(flatten)]
        auth: Credentials,
    },
}

fn parse_category(raw: &str) -> Result<ClassCategory, String> {
    raw.parse().map_err(|e: gym_kernel::GymError| e.to_string())
}

fn parse_start_time(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("expected RFC 3339 or `YYYY-MM-DD HH:MM`, got `{raw}`"))
}
