pub mod block;
pub mod issue;
pub mod meeting;
pub mod note;
pub mod table;
