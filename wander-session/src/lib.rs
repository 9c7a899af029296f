//! Per-session navigation state for Wander.
//!
//! [`Wanderer`] owns the breadcrumb [`NavigationHistory`], the displayed
//! article and its suggested links, and turns UI [`Action`]s into calls on
//! [`wander_wiki::WikiApi`]. One action runs at a time; nothing here is shared
//! across tasks.

mod history;
mod wanderer;

pub use history::NavigationHistory;
pub use wanderer::{Action, SessionSettings, SessionView, WanderError, Wanderer};
