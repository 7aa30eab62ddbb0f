use crate::api::attendance::{ClockInRequest, ClockOutRequest, WindowQuery};
use crate::api::building::{BuildingListResponse, CreateBuilding};
use crate::api::cleaner::{CleanerListResponse, CreateCleaner};
use crate::api::schedule::{
    AssignCleaner, CreateScheduleEntry, ScheduleListResponse, ScheduleQuery,
};
use crate::api::time_off::{
    AvailabilityQuery, AvailabilityResponse, CreateTimeOff, DeclineTimeOff, TimeOffFilter,
    TimeOffListResponse,
};
use crate::model::building::Building;
use crate::model::cleaner::Cleaner;
use crate::model::clock_record::{ClockOutReason, ClockRecord, ClockStatus};
use crate::model::schedule_entry::ScheduleEntry;
use crate::model::time_off_request::{RequestStatus, RequestType, TimeOffRequest};
use crate::utils::geofence::{ClockInWindow, Coordinate, GeofenceResult};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CleanOps API",
        version = "1.0.0",
        description = r#"
## Cleaning Operations Backend

This API powers the operations backend of a commercial cleaning company.

### Key Features
- **Cleaner Management**
  - Create, update, list, and view cleaner profiles
- **Buildings & Geofences**
  - Site coordinates and per-site geofence radius
- **Scheduling**
  - Shift entries with time-off-aware cleaner assignment
- **Time-Off Management**
  - Single-shift, date-range, and recurring requests with supervisor review
- **Attendance**
  - Geofenced clock-in/clock-out with early-window enforcement

### Security
Most endpoints are protected using **JWT Bearer authentication**.
Sensitive operations require the **Admin** or **Supervisor** role.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::time_off::time_off_list,
        crate::api::time_off::get_time_off,
        crate::api::time_off::create_time_off,
        crate::api::time_off::approve_time_off,
        crate::api::time_off::decline_time_off,
        crate::api::time_off::cancel_time_off,
        crate::api::time_off::check_availability,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::active_record,
        crate::api::attendance::clock_in_window,

        crate::api::schedule::create_entry,
        crate::api::schedule::assign_cleaner,
        crate::api::schedule::list_entries,

        crate::api::cleaner::create_cleaner,
        crate::api::cleaner::get_cleaner,
        crate::api::cleaner::list_cleaners,
        crate::api::cleaner::update_cleaner,
        crate::api::cleaner::delete_cleaner,

        crate::api::building::create_building,
        crate::api::building::get_building,
        crate::api::building::list_buildings,
        crate::api::building::update_building
    ),
    components(
        schemas(
            TimeOffRequest,
            TimeOffFilter,
            TimeOffListResponse,
            CreateTimeOff,
            DeclineTimeOff,
            AvailabilityQuery,
            AvailabilityResponse,
            RequestType,
            RequestStatus,
            ClockRecord,
            ClockStatus,
            ClockOutReason,
            ClockInRequest,
            ClockOutRequest,
            WindowQuery,
            ClockInWindow,
            Coordinate,
            GeofenceResult,
            ScheduleEntry,
            CreateScheduleEntry,
            AssignCleaner,
            ScheduleQuery,
            ScheduleListResponse,
            Cleaner,
            CreateCleaner,
            CleanerListResponse,
            Building,
            CreateBuilding,
            BuildingListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "TimeOff", description = "Time-off request APIs"),
        (name = "Attendance", description = "Geofenced clock-in/out APIs"),
        (name = "Schedule", description = "Shift scheduling APIs"),
        (name = "Cleaner", description = "Cleaner management APIs"),
        (name = "Building", description = "Building site APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
