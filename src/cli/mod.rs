pub mod commands;

pub use commands::{
    BankCommand, CampCommand, Cli, Commands, DonorCommand, HealthCommand, InventoryCommand,
    RequestCommand,
};
