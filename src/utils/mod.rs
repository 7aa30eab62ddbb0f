pub mod db_utils;
pub mod geofence;
pub mod site_cache;
pub mod time_off_cache;
