//! DNS mail-exchange resolution.
//!
//! The public entry point is [`resolve_mail_exchange`], which queries DNS and
//! returns the hostname of the most preferred MX record.

mod error;
mod resolver;
mod types;

pub use error::MxError as Error;
pub use resolver::{LookupMx, build_resolver, resolve_mail_exchange};
pub use types::MxRecord;
