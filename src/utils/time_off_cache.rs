use chrono::NaiveDate;
use sqlx::MySqlPool;

use crate::model::time_off_request::TimeOffRequest;

/// A date-window-scoped snapshot of approved time-off requests.
///
/// Owned by the caller and only as fresh as the last `fetch_approved`; there
/// is no TTL and no background refresh. Store failures propagate so the call
/// site decides the safe default instead of silently assuming availability.
#[derive(Debug, Default)]
pub struct TimeOffCache {
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    requests: Vec<TimeOffRequest>,
}

impl TimeOffCache {
    /// Load every approved request overlapping `[window_start, window_end]`.
    ///
    /// Single-shift and date-range rows are filtered in SQL; recurring rows
    /// carry their dates as a JSON list, so they are fetched by status and
    /// narrowed here against the window.
    pub async fn fetch_approved(
        pool: &MySqlPool,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Self, sqlx::Error> {
        let rows = sqlx::query_as::<_, TimeOffRequest>(
            r#"
            SELECT
                id, cleaner_id, cleaner_name, request_type,
                shift_date, start_date, end_date,
                recurring_shift_id, requested_dates,
                reason, notes, status,
                reviewed_by, reviewed_at, decline_reason, created_at
            FROM time_off_requests
            WHERE status = 'approved'
              AND (
                    (request_type = 'single_shift' AND shift_date BETWEEN ? AND ?)
                 OR (request_type = 'date_range' AND start_date <= ? AND end_date >= ?)
                 OR (request_type = 'recurring_instances')
              )
            ORDER BY id
            "#,
        )
        .bind(window_start)
        .bind(window_end)
        .bind(window_end)
        .bind(window_start)
        .fetch_all(pool)
        .await?;

        let requests = rows
            .into_iter()
            .filter(|r| r.overlaps_window(window_start, window_end))
            .collect();

        Ok(Self {
            window_start: Some(window_start),
            window_end: Some(window_end),
            requests,
        })
    }

    /// Build a cache from an already-fetched list. Test seam, and useful for
    /// callers that batch one store read across several queries.
    pub fn from_requests(
        window_start: NaiveDate,
        window_end: NaiveDate,
        requests: Vec<TimeOffRequest>,
    ) -> Self {
        Self {
            window_start: Some(window_start),
            window_end: Some(window_end),
            requests,
        }
    }

    pub fn requests(&self) -> &[TimeOffRequest] {
        &self.requests
    }

    /// Does `cleaner_id` have approved time off covering `date`?
    pub fn is_unavailable(&self, cleaner_id: u64, date: NaiveDate) -> bool {
        self.details_for(cleaner_id, date).is_some()
    }

    /// First matching request in fetch order; overlapping approvals for the
    /// same cleaner and day are not disambiguated beyond that.
    pub fn details_for(&self, cleaner_id: u64, date: NaiveDate) -> Option<&TimeOffRequest> {
        self.requests
            .iter()
            .find(|r| r.cleaner_id == cleaner_id && r.covers(date))
    }

    /// Legacy lookup path for rows predating stable cleaner ids. Exact
    /// string match, no case or whitespace normalization.
    pub fn details_for_name<'a>(
        &'a self,
        cleaner_name: &str,
        date: NaiveDate,
    ) -> Option<&'a TimeOffRequest> {
        self.requests
            .iter()
            .find(|r| r.cleaner_name == cleaner_name && r.covers(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(id: u64, cleaner_id: u64, name: &str, reason: &str) -> TimeOffRequest {
        TimeOffRequest {
            id,
            cleaner_id,
            cleaner_name: name.to_string(),
            request_type: "single_shift".to_string(),
            shift_date: None,
            start_date: None,
            end_date: None,
            recurring_shift_id: None,
            requested_dates: None,
            reason: reason.to_string(),
            notes: None,
            status: "approved".to_string(),
            reviewed_by: Some(1),
            reviewed_at: None,
            decline_reason: None,
            created_at: None,
        }
    }

    fn single_shift(id: u64, cleaner_id: u64, name: &str, day: &str) -> TimeOffRequest {
        let mut r = request(id, cleaner_id, name, "appointment");
        r.shift_date = Some(date(day));
        r
    }

    fn date_range(id: u64, cleaner_id: u64, name: &str, start: &str, end: &str) -> TimeOffRequest {
        let mut r = request(id, cleaner_id, name, "vacation");
        r.request_type = "date_range".to_string();
        r.start_date = Some(date(start));
        r.end_date = Some(date(end));
        r
    }

    #[test]
    fn assignment_scenario_matches_by_id_and_day() {
        let cache = TimeOffCache::from_requests(
            date("2024-03-01"),
            date("2024-03-31"),
            vec![single_shift(1, 7, "Jane Doe", "2024-03-05")],
        );

        assert!(cache.is_unavailable(7, date("2024-03-05")));
        let detail = cache.details_for(7, date("2024-03-05")).unwrap();
        assert_eq!(detail.reason, "appointment");

        assert!(!cache.is_unavailable(7, date("2024-03-06")));
        assert!(cache.details_for(7, date("2024-03-06")).is_none());
        // a different cleaner is unaffected
        assert!(!cache.is_unavailable(8, date("2024-03-05")));
    }

    #[test]
    fn range_request_blocks_every_covered_day() {
        let cache = TimeOffCache::from_requests(
            date("2024-01-01"),
            date("2024-01-31"),
            vec![date_range(1, 7, "Jane Doe", "2024-01-10", "2024-01-15")],
        );

        assert!(cache.is_unavailable(7, date("2024-01-10")));
        assert!(cache.is_unavailable(7, date("2024-01-15")));
        assert!(!cache.is_unavailable(7, date("2024-01-09")));
        assert!(!cache.is_unavailable(7, date("2024-01-16")));
    }

    #[test]
    fn first_match_in_fetch_order_wins() {
        let cache = TimeOffCache::from_requests(
            date("2024-01-01"),
            date("2024-01-31"),
            vec![
                date_range(1, 7, "Jane Doe", "2024-01-10", "2024-01-15"),
                single_shift(2, 7, "Jane Doe", "2024-01-12"),
            ],
        );

        let detail = cache.details_for(7, date("2024-01-12")).unwrap();
        assert_eq!(detail.id, 1);
    }

    #[test]
    fn cache_layer_is_consistent_with_direct_filter() {
        let requests = vec![
            single_shift(1, 7, "Jane Doe", "2024-01-05"),
            date_range(2, 8, "Amir Khan", "2024-01-04", "2024-01-06"),
        ];
        let cache = TimeOffCache::from_requests(
            date("2024-01-01"),
            date("2024-01-31"),
            requests.clone(),
        );

        for day in ["2024-01-04", "2024-01-05", "2024-01-06", "2024-01-07"] {
            for cleaner in [7u64, 8u64] {
                let direct = requests
                    .iter()
                    .any(|r| r.cleaner_id == cleaner && r.covers(date(day)));
                assert_eq!(cache.is_unavailable(cleaner, date(day)), direct);
            }
        }
    }

    #[test]
    fn name_lookup_is_exact_match_only() {
        let cache = TimeOffCache::from_requests(
            date("2024-03-01"),
            date("2024-03-31"),
            vec![single_shift(1, 7, "Jane Doe", "2024-03-05")],
        );

        assert!(cache.details_for_name("Jane Doe", date("2024-03-05")).is_some());
        assert!(cache.details_for_name("jane doe", date("2024-03-05")).is_none());
        assert!(cache.details_for_name("Jane Doe ", date("2024-03-05")).is_none());
    }

    #[test]
    fn empty_cache_reports_available() {
        let cache = TimeOffCache::default();
        assert!(!cache.is_unavailable(7, date("2024-03-05")));
    }
}
