// Terminal UI module using ratatui

mod app;
mod shell;
mod widgets;

pub use app::{fields_for, options_for, App, AppEvent, DashboardScreen, Field, OnboardingScreen, Screen};
pub use shell::{render, Shell};
