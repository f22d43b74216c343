pub mod db;

pub use db::{Collection, Database, DatabaseStats};
