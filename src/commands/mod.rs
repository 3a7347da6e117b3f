pub mod facts;
pub mod module;
pub mod sqlite;

pub use facts::handle_facts_command;
pub use module::{handle_module_command, module_invocation, run_module};
pub use sqlite::handle_sqlite_command;
