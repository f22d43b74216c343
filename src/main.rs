mod cli;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use cli::{
    BankCommand, CampCommand, Cli, Commands, DonorCommand, HealthCommand, InventoryCommand,
    RequestCommand,
};
use colored::*;
use raktsarthi::{
    accounts::AccountService,
    camps::CampService,
    eligibility::EligibilityEvaluator,
    error::{RaktError, Result},
    health::HealthService,
    inventory::InventoryLedger,
    models::{
        BloodCamp, BloodGroup, BloodRequest, CampLocation, CampStatus, DonorHealthRecord,
        DonorProfile, HealthForm, Hospital, InventoryItem, NewCamp, NewRequest, ReviewStatus, Role,
        Urgency,
    },
    requests::RequestService,
    storage::Database,
    utils, Config,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("raktsarthi=debug,info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match Database::new(&config.database.path) {
        Ok(db) => run(cli.command, &config, &db),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn run(command: Commands, config: &Config, db: &Database) -> Result<()> {
    match command {
        Commands::Init => initialize(config, db),
        Commands::Stats { format } => show_stats(db, &format),
        Commands::Donor(cmd) => donor_command(db, cmd),
        Commands::Bank(cmd) => bank_command(db, cmd),
        Commands::Health(cmd) => health_command(config, db, cmd),
        Commands::Inventory(cmd) => inventory_command(db, cmd),
        Commands::Request(cmd) => request_command(db, cmd),
        Commands::Camp(cmd) => camp_command(db, cmd),
    }
}

fn parse_group(raw: &str) -> Result<BloodGroup> {
    raw.parse().map_err(RaktError::Validation)
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| RaktError::Validation(format!("invalid date '{}': {}", raw, e)))
}

fn read_form(path: &std::path::Path) -> Result<HealthForm> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

fn initialize(config: &Config, db: &Database) -> Result<()> {
    println!("{}", "Initializing RaktSarthi...".green());
    let stats = db.get_stats()?;
    println!("{}", "✓ Database initialized".green());
    println!("{}", "✓ Configuration loaded".green());
    println!("\n{}", "Configuration:".cyan());
    println!("  Database:          {}", config.database.path);
    println!("  Min weight:        {} kg", config.eligibility.min_weight_kg);
    println!(
        "  Donation interval: {} days",
        config.eligibility.min_days_between_donations
    );
    println!("  Donors:            {}", stats.donors);
    println!("  Blood banks:       {}", stats.blood_banks);

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to add a blood bank", "raktsarthi bank register".yellow());
    println!("  {} to add a donor", "raktsarthi donor register".yellow());
    println!("  {} to view statistics", "raktsarthi stats".yellow());
    Ok(())
}

fn show_stats(db: &Database, format: &str) -> Result<()> {
    let stats = db.get_stats()?;

    // Stock totals per group across every bank
    let ledger = InventoryLedger::new(db);
    let now = Utc::now();
    let mut totals: Vec<(BloodGroup, u64)> = BloodGroup::ALL.iter().map(|g| (*g, 0)).collect();
    for bank in db.list_banks()? {
        for item in ledger.read(&bank.id, now)?.items {
            if let Some(slot) = totals.iter_mut().find(|(g, _)| *g == item.blood_group) {
                slot.1 += item.units as u64;
            }
        }
    }

    if format == "json" {
        let stock: serde_json::Map<String, serde_json::Value> = totals
            .iter()
            .map(|(g, units)| (g.to_string(), serde_json::Value::from(*units)))
            .collect();
        let payload = serde_json::json!({ "stats": stats, "stock": stock });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("{}", "=== RaktSarthi Statistics ===".cyan().bold());
    println!("\nAccounts:");
    println!("  Donors/patients: {}", stats.donors);
    println!("  Blood banks:     {}", stats.blood_banks);
    println!("  Health forms:    {}", stats.health_records);

    println!("\nRequests:");
    println!("  Total:     {}", stats.requests);
    println!("  Pending:   {}", stats.pending_requests.to_string().yellow());

    println!("\nCamps:");
    println!("  Total:          {}", stats.camps);
    println!("  Registrations:  {}", stats.camp_registrations);
    println!("  Units collected: {}", stats.camp_units_collected);

    println!("\n{}", "Stock across all banks:".yellow());
    for (group, units) in totals {
        println!("  {:<4} {}", group.to_string(), units);
    }
    Ok(())
}

fn donor_command(db: &Database, cmd: DonorCommand) -> Result<()> {
    let service = AccountService::new(db);
    match cmd {
        DonorCommand::Register { name, email, phone, blood_group, city, role } => {
            let role: Role = role.parse().map_err(RaktError::Validation)?;
            let mut profile = DonorProfile::new(&name, &email, role);
            if let Some(phone) = phone {
                profile = profile.with_phone(&phone);
            }
            if let Some(group) = blood_group {
                profile = profile.with_blood_group(parse_group(&group)?);
            }
            if let Some(city) = city {
                profile = profile.with_city(&city);
            }

            let profile = service.register_donor(profile)?;
            println!("{}", "✓ Account registered".green());
            println!("ID: {}", profile.id);
        }
        DonorCommand::Show { id } => {
            let profile = service.donor(&id)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }
    Ok(())
}

fn print_inventory(items: &[InventoryItem]) {
    utils::print_table_border(50);
    utils::print_table_row(&["Group", "Units", "Last updated"], &[6, 14, 24]);
    utils::print_table_border(50);
    for item in items {
        utils::print_table_row(
            &[
                item.blood_group.as_str(),
                &utils::format_units(item.units),
                &utils::format_timestamp(&item.last_updated),
            ],
            &[6, 14, 24],
        );
    }
    utils::print_table_border(50);
}

fn bank_command(db: &Database, cmd: BankCommand) -> Result<()> {
    let service = AccountService::new(db);
    match cmd {
        BankCommand::Register { name, email, city } => {
            let bank = service.register_bank(&name, &email, city, Utc::now())?;
            println!("{}", "✓ Blood bank registered".green());
            println!("ID: {}", bank.id);
        }
        BankCommand::Show { id } => {
            let bank = service.bank(&id)?;
            let stock = InventoryLedger::new(db).read(&bank.id, Utc::now())?;
            println!("{}", bank.name.cyan().bold());
            println!("Email: {}", bank.email);
            if let Some(city) = &bank.city {
                println!("City:  {}", city);
            }
            let total: u64 = stock.items.iter().map(|item| item.units as u64).sum();
            println!("Stock source: {:?}, {} units on hand", stock.source, total);
            print_inventory(&stock.items);
        }
        BankCommand::List { city, format } => {
            let banks = service.list_banks(city.as_deref())?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&banks)?);
                return Ok(());
            }
            utils::print_table_border(80);
            utils::print_table_row(&["ID", "Name", "City"], &[38, 24, 14]);
            utils::print_table_border(80);
            for bank in &banks {
                utils::print_table_row(
                    &[&bank.id, &bank.name, bank.city.as_deref().unwrap_or("-")],
                    &[38, 24, 14],
                );
            }
            utils::print_table_border(80);
        }
    }
    Ok(())
}

fn print_verdict(record: &DonorHealthRecord) {
    println!("Form:   {}", record.id);
    println!("Review: {}", record.review.status);
    if record.eligibility.is_eligible {
        println!("{}", "✓ Eligible to donate".green());
    } else {
        println!("{}", "✗ Not eligible to donate".red());
        for reason in &record.eligibility.reasons {
            println!("  - {}", reason);
        }
    }
}

fn health_command(config: &Config, db: &Database, cmd: HealthCommand) -> Result<()> {
    let evaluator = EligibilityEvaluator::new(config.eligibility.clone());
    let service = HealthService::new(db, evaluator);
    match cmd {
        HealthCommand::Submit { actor, file } => {
            let form = read_form(&file)?;
            let record = service.submit(&actor, form, Utc::now())?;
            println!("{}", "✓ Health form submitted".green());
            print_verdict(&record);
        }
        HealthCommand::Update { actor, record_id, file } => {
            let form = read_form(&file)?;
            let record = service.update(&actor, &record_id, form, Utc::now())?;
            println!("{}", "✓ Health form updated".green());
            print_verdict(&record);
        }
        HealthCommand::Review { actor, record_id, status, notes } => {
            let status: ReviewStatus = status.parse().map_err(RaktError::Validation)?;
            let record = service.review(&actor, &record_id, status, notes, Utc::now())?;
            println!("✓ Form {} marked {}", record.id, record.review.status);
        }
        HealthCommand::Show { donor_id } => match service.latest_for_donor(&donor_id)? {
            Some(record) => print_verdict(&record),
            None => println!("No health form on file for {}", donor_id),
        },
        HealthCommand::List { status, format } => {
            let status: ReviewStatus = status.parse().map_err(RaktError::Validation)?;
            let records = service.list_by_status(status)?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }
            utils::print_table_border(90);
            utils::print_table_row(&["Form", "Donor", "Name", "Eligible", "Submitted"], &[14, 14, 20, 9, 24]);
            utils::print_table_border(90);
            for record in &records {
                utils::print_table_row(
                    &[
                        &utils::format_id(&record.id),
                        &utils::format_id(&record.donor_id),
                        &record.form.full_name,
                        if record.eligibility.is_eligible { "yes" } else { "no" },
                        &utils::format_timestamp(&record.submitted_at),
                    ],
                    &[14, 14, 20, 9, 24],
                );
            }
            utils::print_table_border(90);
        }
    }
    Ok(())
}

fn inventory_command(db: &Database, cmd: InventoryCommand) -> Result<()> {
    let ledger = InventoryLedger::new(db);
    match cmd {
        InventoryCommand::Show { bank_id, format } => {
            let stock = ledger.read(&bank_id, Utc::now())?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&stock)?);
                return Ok(());
            }
            print_inventory(&stock.items);
        }
        InventoryCommand::Adjust { actor, blood_group, delta } => {
            let item = ledger.adjust_units(&actor, parse_group(&blood_group)?, delta, Utc::now())?;
            println!("✓ {} now at {}", item.blood_group, utils::format_units(item.units));
        }
        InventoryCommand::Set { actor, blood_group, units } => {
            let item = ledger.set_units(&actor, parse_group(&blood_group)?, units, Utc::now())?;
            println!("✓ {} set to {}", item.blood_group, utils::format_units(item.units));
        }
        InventoryCommand::Save { actor, counts } => {
            let items = ledger.save_all(&actor, &counts, Utc::now())?;
            println!("{}", "✓ Inventory saved".green());
            print_inventory(&items);
        }
    }
    Ok(())
}

fn print_requests(requests: &[BloodRequest]) {
    utils::print_table_border(100);
    utils::print_table_row(
        &["ID", "Patient", "Group", "Units", "Urgency", "Needed by", "Status"],
        &[14, 18, 6, 6, 10, 12, 10],
    );
    utils::print_table_border(100);
    for request in requests {
        utils::print_table_row(
            &[
                &utils::format_id(&request.id),
                &request.patient_name,
                request.blood_group.as_str(),
                &request.units.to_string(),
                &utils::format_urgency(request.urgency),
                &request.required_by.to_string(),
                &utils::format_request_status(request.status),
            ],
            &[14, 18, 6, 6, 10, 12, 10],
        );
    }
    utils::print_table_border(100);
}

fn request_command(db: &Database, cmd: RequestCommand) -> Result<()> {
    let service = RequestService::new(db);
    match cmd {
        RequestCommand::Create {
            actor,
            patient,
            blood_group,
            units,
            urgency,
            hospital,
            hospital_address,
            contact,
            required_by,
            description,
        } => {
            let urgency: Urgency = urgency.parse().map_err(RaktError::Validation)?;
            let details = NewRequest {
                patient_name: patient,
                blood_group: parse_group(&blood_group)?,
                units,
                urgency,
                hospital: Hospital {
                    name: hospital,
                    address: hospital_address,
                    geo: None,
                },
                contact_number: contact,
                required_by: parse_date(&required_by)?,
                description,
            };
            let request = service.create(&actor, details, Utc::now())?;
            println!("{}", "✓ Blood request created".green());
            println!("ID: {}", request.id);
        }
        RequestCommand::Cancel { actor, request_id, yes } => {
            if !yes && !utils::confirm_action(&format!("Cancel request {}?", request_id)) {
                println!("Cancelled");
                return Ok(());
            }
            let request = service.cancel(&actor, &request_id)?;
            println!("✓ Request {} {}", request.id, request.status);
        }
        RequestCommand::Approve { actor, request_id } => {
            let approval = service.approve(&actor, &request_id, Utc::now())?;
            println!("{}", "✓ Request fulfilled".green());
            println!(
                "{} stock now {}",
                approval.inventory_item.blood_group,
                utils::format_units(approval.inventory_item.units)
            );
        }
        RequestCommand::Reject { actor, request_id } => {
            service.reject(&actor, &request_id)?;
            println!("✓ Request {} declined", request_id);
        }
        RequestCommand::List { bank, mine, format } => {
            let requests = match (bank, mine) {
                (Some(bank), _) => service.list_pending_for_bank(&bank)?,
                (None, Some(user)) => service.list_for_requester(&user)?,
                (None, None) => {
                    return Err(RaktError::Validation(
                        "pass --bank <id> or --mine <id>".to_string(),
                    ))
                }
            };
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&requests)?);
                return Ok(());
            }
            print_requests(&requests);
        }
    }
    Ok(())
}

fn print_camp(camp: &BloodCamp) {
    println!("{}", camp.name.cyan().bold());
    println!("Organizer: {}", camp.organizer_name);
    println!(
        "When:      {} {}-{}",
        camp.date, camp.start_time, camp.end_time
    );
    println!("Where:     {}, {}", camp.location.venue, camp.location.city);
    println!("Status:    {}", utils::format_camp_status(camp.status));
    println!(
        "Units:     {}/{} collected",
        camp.collected_units, camp.target_units
    );

    if camp.registered_donors.is_empty() {
        println!("\nNo registrations yet");
        return;
    }

    println!("\n{}", "Registered donors:".yellow());
    utils::print_table_border(90);
    utils::print_table_row(&["Donor", "Name", "Phone", "Group", "Attended"], &[14, 20, 16, 14, 8]);
    utils::print_table_border(90);
    for entry in &camp.registered_donors {
        utils::print_table_row(
            &[
                &utils::format_id(&entry.donor_id),
                &entry.name,
                &entry.phone,
                &entry.blood_group,
                if entry.attended { "yes" } else { "no" },
            ],
            &[14, 20, 16, 14, 8],
        );
    }
    utils::print_table_border(90);
}

fn camp_command(db: &Database, cmd: CampCommand) -> Result<()> {
    let service = CampService::new(db);
    match cmd {
        CampCommand::Create {
            actor,
            name,
            description,
            date,
            start,
            end,
            venue,
            address,
            city,
            state,
            pincode,
            target,
        } => {
            let details = NewCamp {
                name,
                description,
                date: parse_date(&date)?,
                start_time: start,
                end_time: end,
                location: CampLocation {
                    venue,
                    address,
                    city,
                    state,
                    pincode,
                    geo: None,
                },
                target_units: target,
            };
            let camp = service.create(&actor, details, Utc::now())?;
            println!("{}", "✓ Camp created".green());
            println!("ID: {}", camp.id);
        }
        CampCommand::List { city, status, format } => {
            let status = status
                .map(|s| s.parse::<CampStatus>())
                .transpose()
                .map_err(RaktError::Validation)?;
            let camps = service.list(city.as_deref(), status)?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&camps)?);
                return Ok(());
            }
            utils::print_table_border(100);
            utils::print_table_row(
                &["ID", "Name", "Date", "City", "Status", "Donors", "Units"],
                &[14, 22, 10, 12, 10, 6, 8],
            );
            utils::print_table_border(100);
            for camp in &camps {
                utils::print_table_row(
                    &[
                        &utils::format_id(&camp.id),
                        &camp.name,
                        &camp.date.to_string(),
                        &camp.location.city,
                        &utils::format_camp_status(camp.status),
                        &camp.registered_donors.len().to_string(),
                        &format!("{}/{}", camp.collected_units, camp.target_units),
                    ],
                    &[14, 22, 10, 12, 10, 6, 8],
                );
            }
            utils::print_table_border(100);
        }
        CampCommand::Show { camp_id } => print_camp(&service.get(&camp_id)?),
        CampCommand::Register { actor, camp_id } => {
            let entry = service.register_donor(&camp_id, &actor, Utc::now())?;
            println!("{}", "✓ Registered for camp".green());
            println!("Name: {}  Phone: {}  Group: {}", entry.name, entry.phone, entry.blood_group);
        }
        CampCommand::Unregister { actor, camp_id } => {
            service.unregister_donor(&camp_id, &actor)?;
            println!("✓ Registration withdrawn");
        }
        CampCommand::Attend { actor, camp_id, donor_id, undo } => {
            let entry = service.mark_attendance(&actor, &camp_id, &donor_id, !undo)?;
            println!("✓ {} attended: {}", entry.name, entry.attended);
        }
        CampCommand::Collected { actor, camp_id, units } => {
            let camp = service.record_collection(&actor, &camp_id, units)?;
            println!("✓ {}/{} units collected", camp.collected_units, camp.target_units);
        }
        CampCommand::Status { actor, camp_id, status } => {
            let status: CampStatus = status.parse().map_err(RaktError::Validation)?;
            let camp = service.update_status(&actor, &camp_id, status)?;
            println!("✓ Camp {} is now {}", camp.id, utils::format_camp_status(camp.status));
        }
        CampCommand::Delete { actor, camp_id, yes } => {
            if !yes && !utils::confirm_action(&format!("Delete camp {} and all registrations?", camp_id)) {
                println!("Cancelled");
                return Ok(());
            }
            service.delete(&actor, &camp_id)?;
            println!("✓ Camp deleted");
        }
        CampCommand::Backfill => {
            let summary = service.backfill_all()?;
            println!("{}", "=== Registration Backfill ===".cyan().bold());
            println!("Camps scanned:    {}", summary.camps_scanned);
            println!("Entries scanned:  {}", summary.entries_scanned);
            println!("Entries updated:  {}", summary.entries_updated.to_string().green());
            println!("Unresolved:       {}", summary.unresolved.to_string().yellow());
        }
        CampCommand::Cleanup { yes } => {
            if !yes && !utils::confirm_action("Permanently remove invalid registrations from all camps?") {
                println!("Cancelled");
                return Ok(());
            }
            let removed = service.cleanup_all()?;
            info!("Cleanup removed {} registrations", removed);
            println!("✓ Removed {} invalid registrations", removed);
        }
    }
    Ok(())
}
