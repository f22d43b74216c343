use clap::{Parser, Subcommand};
use raktsarthi::models::BloodGroup;
use std::path::PathBuf;

/// Parse a `GROUP=UNITS` stock entry such as `O-=12`
fn parse_stock_entry(raw: &str) -> Result<(BloodGroup, i64), String> {
    let (group, units) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected GROUP=UNITS, got '{}'", raw))?;
    let group: BloodGroup = group.parse()?;
    let units: i64 = units
        .trim()
        .parse()
        .map_err(|_| format!("invalid unit count in '{}'", raw))?;
    Ok((group, units))
}

#[derive(Parser)]
#[command(name = "raktsarthi")]
#[command(about = "Blood donation coordination: donors, blood banks, requests and camps")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database and show configuration
    Init,

    /// Show statistics
    Stats {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Donor and patient accounts
    #[command(subcommand)]
    Donor(DonorCommand),

    /// Blood bank accounts
    #[command(subcommand)]
    Bank(BankCommand),

    /// Donor health forms and eligibility
    #[command(subcommand)]
    Health(HealthCommand),

    /// Blood bank stock
    #[command(subcommand)]
    Inventory(InventoryCommand),

    /// Patient blood requests
    #[command(subcommand)]
    Request(RequestCommand),

    /// Donation camps
    #[command(subcommand)]
    Camp(CampCommand),
}

#[derive(Subcommand)]
pub enum DonorCommand {
    /// Register a donor or patient
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        /// Blood group, e.g. "O+"
        #[arg(long)]
        blood_group: Option<String>,
        #[arg(long)]
        city: Option<String>,
        /// donor or patient
        #[arg(long, default_value = "donor")]
        role: String,
    },

    /// Show a profile
    Show { id: String },
}

#[derive(Subcommand)]
pub enum BankCommand {
    /// Register a blood bank
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        city: Option<String>,
    },

    /// Show a blood bank with its stock
    Show { id: String },

    /// List blood banks
    List {
        #[arg(long)]
        city: Option<String>,
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum HealthCommand {
    /// Submit a health form from a JSON file
    Submit {
        /// Donor id
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        file: PathBuf,
    },

    /// Replace a submitted form; review goes back to pending
    Update {
        #[arg(long = "as")]
        actor: String,
        record_id: String,
        #[arg(long)]
        file: PathBuf,
    },

    /// Review a form as a blood bank
    Review {
        #[arg(long = "as")]
        actor: String,
        record_id: String,
        /// approved, rejected, requires_review or pending
        #[arg(long)]
        status: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show a donor's latest form and verdict
    Show { donor_id: String },

    /// List forms by review status
    List {
        #[arg(long, default_value = "pending")]
        status: String,
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum InventoryCommand {
    /// Show reconciled stock for a blood bank
    Show {
        bank_id: String,
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Add or remove units, e.g. `adjust --as BANK O+ -2`
    Adjust {
        #[arg(long = "as")]
        actor: String,
        blood_group: String,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },

    /// Set the unit count for a blood group
    Set {
        #[arg(long = "as")]
        actor: String,
        blood_group: String,
        #[arg(allow_negative_numbers = true)]
        units: i64,
    },

    /// Save several groups at once, e.g. `save --as BANK A+=4 O-=2`
    Save {
        #[arg(long = "as")]
        actor: String,
        #[arg(required = true, value_parser = parse_stock_entry)]
        counts: Vec<(BloodGroup, i64)>,
    },
}

#[derive(Subcommand)]
pub enum RequestCommand {
    /// Create a blood request
    Create {
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        patient: String,
        #[arg(long)]
        blood_group: String,
        #[arg(long)]
        units: u32,
        /// critical, urgent or normal
        #[arg(long, default_value = "normal")]
        urgency: String,
        #[arg(long)]
        hospital: String,
        #[arg(long, default_value = "")]
        hospital_address: String,
        #[arg(long)]
        contact: String,
        /// Date needed by (YYYY-MM-DD)
        #[arg(long)]
        required_by: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Cancel your own pending request
    Cancel {
        #[arg(long = "as")]
        actor: String,
        request_id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Approve a pending request and deduct stock
    Approve {
        #[arg(long = "as")]
        actor: String,
        request_id: String,
    },

    /// Decline a pending request
    Reject {
        #[arg(long = "as")]
        actor: String,
        request_id: String,
    },

    /// List requests pending for a bank, or your own requests
    List {
        #[arg(long, conflicts_with = "mine")]
        bank: Option<String>,
        #[arg(long)]
        mine: Option<String>,
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum CampCommand {
    /// Organize a camp
    Create {
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Camp date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "09:00")]
        start: String,
        #[arg(long, default_value = "17:00")]
        end: String,
        #[arg(long)]
        venue: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long, default_value = "")]
        state: String,
        #[arg(long, default_value = "")]
        pincode: String,
        #[arg(long)]
        target: u32,
    },

    /// List camps
    List {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show a camp with its roster
    Show { camp_id: String },

    /// Register for a camp as a donor
    Register {
        #[arg(long = "as")]
        actor: String,
        camp_id: String,
    },

    /// Withdraw your registration
    Unregister {
        #[arg(long = "as")]
        actor: String,
        camp_id: String,
    },

    /// Mark a registered donor as attended
    Attend {
        #[arg(long = "as")]
        actor: String,
        camp_id: String,
        donor_id: String,
        /// Clear the attended flag instead
        #[arg(long)]
        undo: bool,
    },

    /// Record units collected so far
    Collected {
        #[arg(long = "as")]
        actor: String,
        camp_id: String,
        units: u32,
    },

    /// Change camp status
    Status {
        #[arg(long = "as")]
        actor: String,
        camp_id: String,
        status: String,
    },

    /// Delete a camp and its registrations
    Delete {
        #[arg(long = "as")]
        actor: String,
        camp_id: String,
        #[arg(short, long)]
        yes: bool,
    },

    /// Refill placeholder registration fields from donor profiles
    Backfill,

    /// Remove registrations with invalid donor ids or names
    Cleanup {
        #[arg(short, long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_negative_delta() {
        let cli = Cli::try_parse_from([
            "raktsarthi", "inventory", "adjust", "--as", "bank-1", "O+", "-3",
        ])
        .unwrap();

        match cli.command {
            Commands::Inventory(InventoryCommand::Adjust { actor, blood_group, delta }) => {
                assert_eq!(actor, "bank-1");
                assert_eq!(blood_group, "O+");
                assert_eq!(delta, -3);
            }
            _ => panic!("expected inventory adjust"),
        }
        assert_eq!(cli.config, "config/default");
    }

    #[test]
    fn test_parse_inventory_save_entries() {
        let cli = Cli::try_parse_from([
            "raktsarthi", "inventory", "save", "--as", "bank-1", "A+=4", "O-=2",
        ])
        .unwrap();

        match cli.command {
            Commands::Inventory(InventoryCommand::Save { counts, .. }) => {
                assert_eq!(counts, vec![(BloodGroup::APos, 4), (BloodGroup::ONeg, 2)]);
            }
            _ => panic!("expected inventory save"),
        }

        assert!(Cli::try_parse_from(["raktsarthi", "inventory", "save", "--as", "b", "A+4"]).is_err());
        assert!(Cli::try_parse_from(["raktsarthi", "inventory", "save", "--as", "b", "Q=1"]).is_err());
        assert!(Cli::try_parse_from(["raktsarthi", "inventory", "save", "--as", "b"]).is_err());
    }

    #[test]
    fn test_request_list_flags_conflict() {
        let result = Cli::try_parse_from([
            "raktsarthi", "request", "list", "--bank", "b", "--mine", "m",
        ]);
        assert!(result.is_err());
    }
}
