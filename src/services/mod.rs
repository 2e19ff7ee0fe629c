pub mod assets;
pub mod storage;
pub mod tasks;
pub mod templates;
pub mod validation;
