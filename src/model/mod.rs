pub mod building;
pub mod cleaner;
pub mod clock_record;
pub mod role;
pub mod schedule_entry;
pub mod time_off_request;
