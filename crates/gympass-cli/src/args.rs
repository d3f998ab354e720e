//! Command line definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use gympass_shared::{BarcodeStatus, ClientStatus, SubscriptionType};

#[derive(Parser, Debug)]
#[command(name = "gympass")]
#[command(version, about = "Gym membership badges and check-ins", long_about = None)]
pub struct Cli {
    /// Print full results as JSON instead of a one-line message
    #[arg(long, global = true)]
    pub json: bool,

    /// SQLite database file
    #[arg(long, global = true, env = "GYMPASS_DB_PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage members
    Client {
        #[command(subcommand)]
        action: ClientAction,
    },
    /// Issue and manage badges
    Barcode {
        #[command(subcommand)]
        action: BarcodeAction,
    },
    /// Resolve scanned badges; reads one token per line from stdin when
    /// no token is given
    Scan {
        token: Option<String>,
    },
    /// Check-ins and reports
    Attendance {
        #[command(subcommand)]
        action: AttendanceAction,
    },
    /// Save or restore a JSON backup
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ClientAction {
    /// Register a member
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        /// daily, monthly, quarterly, semiannual or annual
        #[arg(long, default_value = "monthly")]
        plan: SubscriptionType,
        /// Subscription start (defaults to today)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Subscription end (defaults to one month after start)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Edit a member's details
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        plan: Option<SubscriptionType>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Set a member active, inactive or suspended
    Status { id: i64, status: ClientStatus },
    /// Delete a member without history
    Delete { id: i64 },
    /// Show a member with subscription and badge state
    Show { id: i64 },
    /// List all members
    List,
    /// Search name, phone and email
    Search { query: String },
}

#[derive(Subcommand, Debug)]
pub enum BarcodeAction {
    /// Issue a new badge, retiring the current one
    Generate { client_id: i64 },
    /// Expire the current badge and issue a new one
    Renew { client_id: i64 },
    Activate { record_id: i64 },
    Deactivate { record_id: i64 },
    /// List badges, optionally by status
    List {
        #[arg(long)]
        status: Option<BarcodeStatus>,
    },
    /// Every badge issued to a member
    History { client_id: i64 },
    Search { query: String },
    /// Copy a badge image to a file
    Export { record_id: i64, dest: PathBuf },
    /// Re-render the images of all active badges
    Render,
}

#[derive(Subcommand, Debug)]
pub enum AttendanceAction {
    /// Check a member in by id
    CheckIn {
        client_id: i64,
        /// Refuse a second check-in on the same day
        #[arg(long, conflicts_with = "allow_duplicate")]
        no_duplicate: bool,
        /// Allow a second check-in on the same day
        #[arg(long)]
        allow_duplicate: bool,
    },
    CheckOut { attendance_id: i64 },
    /// Attendance for a day (defaults to today)
    Report { date: Option<NaiveDate> },
    /// Every visit of a member
    History { client_id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum BackupAction {
    /// Write a backup (defaults to the backup directory)
    Save {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Merge a backup into the database
    Restore { file: PathBuf },
}
