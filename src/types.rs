use crate::error::{Result, SkySettleError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wire and storage format for flight dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MIN_FLIGHT_NUMBER_LEN: usize = 2;

/// The flight the user last submitted for a check.
///
/// Follow-up requests (history, delay reason) reuse it so the user is not
/// prompted again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightQuery {
    pub flight_number: String,
    pub flight_date: NaiveDate,
}

impl FlightQuery {
    /// Validate raw form input and build a query from it.
    pub fn from_input(flight_number: &str, flight_date: Option<&str>) -> Result<Self> {
        let flight_number = flight_number.trim();
        if flight_number.chars().count() < MIN_FLIGHT_NUMBER_LEN {
            return Err(SkySettleError::Validation(
                "Flight number must be at least 2 characters.".to_string(),
            ));
        }

        let flight_date = match flight_date.map(str::trim) {
            None | Some("") => {
                return Err(SkySettleError::Validation(
                    "Flight date is required.".to_string(),
                ))
            }
            Some(raw) => parse_date(raw)?,
        };

        Ok(Self {
            flight_number: flight_number.to_string(),
            flight_date,
        })
    }

    /// Date in `YYYY-MM-DD` form, as used in query strings
    pub fn date_param(&self) -> String {
        self.flight_date.format(DATE_FORMAT).to_string()
    }

    /// Query string pairs shared by all flight endpoints
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("flight_number", self.flight_number.clone()),
            ("date", self.date_param()),
        ]
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        SkySettleError::Validation(format!(
            "Invalid flight date '{raw}', expected YYYY-MM-DD."
        ))
    })
}

/// Aggregate history for a flight as returned by `/flight-stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightStats {
    pub total_flights: u32,
    pub on_time: u32,
    pub delayed: u32,
    pub cancelled: u32,
    pub avg_delay_minutes: f64,
}

impl FlightStats {
    /// Share of `count` in the total, in percent. Zero when there were no flights.
    pub fn percentage(&self, count: u32) -> f64 {
        if self.total_flights == 0 {
            0.0
        } else {
            f64::from(count) * 100.0 / f64::from(self.total_flights)
        }
    }
}

/// Reasoning and answer segments derived from the accumulated response text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedContent {
    pub reasoning: String,
    pub final_answer: String,
}

/// Which streamed endpoint a buffer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseView {
    Compensation,
    DelayReason,
}

impl ResponseView {
    pub fn title(&self) -> &'static str {
        match self {
            ResponseView::Compensation => "Flight Check Result",
            ResponseView::DelayReason => "Delay Information",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_from_valid_input() {
        let query = FlightQuery::from_input("  BA1234 ", Some("2024-05-12")).unwrap();
        assert_eq!(query.flight_number, "BA1234");
        assert_eq!(query.date_param(), "2024-05-12");
        assert_eq!(
            query.query_pairs(),
            [
                ("flight_number", "BA1234".to_string()),
                ("date", "2024-05-12".to_string())
            ]
        );
    }

    #[test]
    fn test_query_rejects_short_flight_number() {
        let err = FlightQuery::from_input("B", Some("2024-05-12")).unwrap_err();
        assert!(matches!(err, SkySettleError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation error: Flight number must be at least 2 characters."
        );

        assert!(FlightQuery::from_input("   ", Some("2024-05-12")).is_err());
    }

    #[test]
    fn test_query_requires_date() {
        let err = FlightQuery::from_input("BA1234", None).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Flight date is required.");

        let err = FlightQuery::from_input("BA1234", Some(" ")).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Flight date is required.");
    }

    #[test]
    fn test_query_rejects_malformed_date() {
        let err = FlightQuery::from_input("BA1234", Some("12/05/2024")).unwrap_err();
        assert!(err.to_string().contains("expected YYYY-MM-DD"));
    }

    #[test]
    fn test_stats_deserialize_and_percentages() {
        let stats: FlightStats = serde_json::from_str(
            r#"{"total_flights":42,"on_time":28,"delayed":12,"cancelled":2,"avg_delay_minutes":45}"#,
        )
        .unwrap();
        assert_eq!(stats.total_flights, 42);
        assert_eq!(stats.avg_delay_minutes, 45.0);
        assert!((stats.percentage(stats.delayed) - 28.571).abs() < 0.01);

        let empty = FlightStats {
            total_flights: 0,
            on_time: 0,
            delayed: 0,
            cancelled: 0,
            avg_delay_minutes: 0.0,
        };
        assert_eq!(empty.percentage(0), 0.0);
    }
}
