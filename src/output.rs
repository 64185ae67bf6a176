//! Output formatters (human and JSONL)

pub mod action_list;
pub mod human;
pub mod jsonl;

pub use action_list::{ActionInfo, ActionListHumanFormatter, ActionListJsonlFormatter};
pub use human::HumanFormatter;
pub use jsonl::JsonlFormatter;
