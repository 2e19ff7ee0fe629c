pub mod asset;
pub mod requests;
pub mod task;
pub mod template;
