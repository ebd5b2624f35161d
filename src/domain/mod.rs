pub mod dates;
pub mod day_window;
pub mod layout;
pub mod models;
pub mod selection;
