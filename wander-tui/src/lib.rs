mod command;
mod feeders;
mod styles;
mod tui;
mod view;

pub use command::{Command, parse_command, parse_key};
pub use tui::{Mode, UiState, run};
pub use view::{breadcrumb_line, lead_label};
