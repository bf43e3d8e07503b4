// Profile, workout and progress data models

pub mod activity;
pub mod user;
pub mod validation;
pub mod weight;
pub mod workout;

pub use activity::*;
pub use user::*;
pub use validation::*;
pub use weight::*;
pub use workout::*;
