//! In-memory account ledger with file persistence.
mod account;
pub mod codec;
mod ledger;
mod operation;
mod session;
mod state;
mod storage;
mod types;

pub use account::*;
pub use ledger::*;
pub use operation::*;
pub use session::*;
pub use state::*;
pub use storage::*;
pub use types::*;
