pub mod allowlist;

pub use allowlist::Allowlist;
