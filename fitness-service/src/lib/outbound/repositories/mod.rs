pub mod memory;
pub mod reset_ledger;
pub mod user;

pub use memory::InMemoryResetLedger;
pub use memory::InMemoryUserRepository;
pub use reset_ledger::PostgresResetLedger;
pub use user::PostgresUserRepository;
