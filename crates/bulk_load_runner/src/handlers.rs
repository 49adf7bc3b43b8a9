pub mod import;
pub mod links;
pub mod poll;
pub mod provision;
pub mod simulate;
pub mod teardown;
pub mod upload;
