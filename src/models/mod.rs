pub mod date_format;
pub mod flight;
pub mod message;
pub mod passenger;

pub use flight::*;
pub use message::*;
pub use passenger::*;
