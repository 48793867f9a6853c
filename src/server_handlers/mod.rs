pub mod health;
pub mod schedules;
pub mod terms;

pub use health::*;
pub use schedules::*;
pub use terms::*;
