pub mod email;
pub mod types;

pub use email::{EmailContext, EmailHeaders, EmailRecord};
pub use types::{ChatTurn, ScanStats, Speaker, Verdict};
