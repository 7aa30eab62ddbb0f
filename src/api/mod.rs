pub mod attendance;
pub mod building;
pub mod cleaner;
pub mod schedule;
pub mod time_off;
