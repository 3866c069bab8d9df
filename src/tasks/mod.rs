mod dismiss;

pub use dismiss::{DismissReason, DismissTimer, Dismisser};
