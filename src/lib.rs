#[macro_use]
extern crate diesel;

pub mod database;
pub mod error;
pub mod settings;
pub mod windows;

pub use crate::database::models::block::Block;
pub use crate::database::models::issue::{Issue, IssueType};
pub use crate::database::models::meeting::Meeting;
pub use crate::database::models::note::Note;
pub use crate::database::models::table::Table;
pub use crate::error::Error;
pub use crate::settings::Settings;
