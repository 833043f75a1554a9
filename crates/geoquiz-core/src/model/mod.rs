pub mod country;
pub mod filter;
pub mod format;
