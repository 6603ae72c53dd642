// Interface adapters: wire format, stage and storage adapters, access rules.

pub mod access;
pub mod protocol;
pub mod stage;
pub mod stores;
pub mod utils;
