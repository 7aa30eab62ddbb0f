use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Which of the three date shapes a request carries. Exactly one of
/// `shift_date`, `start_date`+`end_date`, `requested_dates` is populated,
/// matching this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    SingleShift,
    DateRange,
    RecurringInstances,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
    Cancelled,
}

impl RequestStatus {
    /// Terminal statuses accept no further transitions apart from review
    /// metadata written at the moment of the transition itself.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TimeOffRequest {
    pub id: u64,
    pub cleaner_id: u64,
    /// Legacy schema shim: older rows were keyed by display name only.
    pub cleaner_name: String,
    #[schema(example = "date_range")]
    pub request_type: String,
    #[schema(example = "2024-03-05", format = "date", value_type = String, nullable = true)]
    pub shift_date: Option<NaiveDate>,
    #[schema(example = "2024-01-10", format = "date", value_type = String, nullable = true)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2024-01-15", format = "date", value_type = String, nullable = true)]
    pub end_date: Option<NaiveDate>,
    pub recurring_shift_id: Option<u64>,
    /// JSON array of YYYY-MM-DD strings, TEXT in the store.
    #[schema(example = r#"["2024-02-01","2024-02-08"]"#, nullable = true)]
    pub requested_dates: Option<String>,
    pub reason: String,
    pub notes: Option<String>,
    #[schema(example = "approved")]
    pub status: String,
    pub reviewed_by: Option<u64>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TimeOffRequest {
    pub fn shape(&self) -> Option<RequestType> {
        self.request_type.parse().ok()
    }

    /// Parsed `requested_dates` list; unparseable or absent lists are empty.
    pub fn recurring_dates(&self) -> Vec<NaiveDate> {
        self.requested_dates
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<NaiveDate>>(raw).ok())
            .unwrap_or_default()
    }

    /// Does this request cover `date`? Range endpoints are inclusive on
    /// both sides; the other two shapes match exact days.
    pub fn covers(&self, date: NaiveDate) -> bool {
        match self.shape() {
            Some(RequestType::SingleShift) => self.shift_date == Some(date),
            Some(RequestType::DateRange) => match (self.start_date, self.end_date) {
                (Some(start), Some(end)) => start <= date && date <= end,
                _ => false,
            },
            Some(RequestType::RecurringInstances) => self.recurring_dates().contains(&date),
            None => false,
        }
    }

    /// Window-overlap test used when deciding whether a row belongs in a
    /// date-scoped cache.
    pub fn overlaps_window(&self, window_start: NaiveDate, window_end: NaiveDate) -> bool {
        match self.shape() {
            Some(RequestType::SingleShift) => self
                .shift_date
                .map(|d| window_start <= d && d <= window_end)
                .unwrap_or(false),
            Some(RequestType::DateRange) => match (self.start_date, self.end_date) {
                (Some(start), Some(end)) => start <= window_end && end >= window_start,
                _ => false,
            },
            Some(RequestType::RecurringInstances) => self
                .recurring_dates()
                .iter()
                .any(|d| window_start <= *d && *d <= window_end),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn base_request(request_type: &str) -> TimeOffRequest {
        TimeOffRequest {
            id: 1,
            cleaner_id: 7,
            cleaner_name: "Jane Doe".to_string(),
            request_type: request_type.to_string(),
            shift_date: None,
            start_date: None,
            end_date: None,
            recurring_shift_id: None,
            requested_dates: None,
            reason: "vacation".to_string(),
            notes: None,
            status: "approved".to_string(),
            reviewed_by: Some(2),
            reviewed_at: None,
            decline_reason: None,
            created_at: None,
        }
    }

    #[test]
    fn date_range_covers_both_endpoints() {
        let mut req = base_request("date_range");
        req.start_date = Some(date("2024-01-10"));
        req.end_date = Some(date("2024-01-15"));

        assert!(req.covers(date("2024-01-10")));
        assert!(req.covers(date("2024-01-15")));
        assert!(!req.covers(date("2024-01-09")));
        assert!(!req.covers(date("2024-01-16")));
    }

    #[test]
    fn recurring_matches_exact_days_only() {
        let mut req = base_request("recurring_instances");
        req.requested_dates = Some(r#"["2024-02-01","2024-02-08"]"#.to_string());

        assert!(req.covers(date("2024-02-01")));
        assert!(req.covers(date("2024-02-08")));
        assert!(!req.covers(date("2024-02-02")));
    }

    #[test]
    fn unknown_type_and_garbage_dates_never_match() {
        let mut req = base_request("sabbatical");
        assert!(!req.covers(date("2024-02-01")));

        req.request_type = "recurring_instances".to_string();
        req.requested_dates = Some("not json".to_string());
        assert!(!req.covers(date("2024-02-01")));
    }

    #[test]
    fn window_overlap_covers_spanning_ranges() {
        let mut req = base_request("date_range");
        req.start_date = Some(date("2024-01-01"));
        req.end_date = Some(date("2024-01-31"));

        // request fully spans the query window
        assert!(req.overlaps_window(date("2024-01-10"), date("2024-01-15")));
        // window fully after the range
        assert!(!req.overlaps_window(date("2024-02-01"), date("2024-02-15")));
    }

    #[test]
    fn status_parsing_round_trips() {
        let status: RequestStatus = "approved".parse().unwrap();
        assert_eq!(status, RequestStatus::Approved);
        assert_eq!(status.to_string(), "approved");
        assert!(status.is_terminal());
        assert!(!"pending".parse::<RequestStatus>().unwrap().is_terminal());
    }
}
