pub mod feed;
pub mod fetch;
pub mod plot;
pub mod process;
