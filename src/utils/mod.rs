pub mod error;
pub mod format;
pub mod output;

pub use error::{AppError, AppResult, report_error};
pub use output::{OutputStyle, handle_empty_list, print_success, print_warning};
