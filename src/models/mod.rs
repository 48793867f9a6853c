// Core data structures shared by the catalog, the generator and the server.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One weekly meeting of a section.
///
/// `days` follows the registration system layout: `[Sun, Mon, Tue, Wed, Thu, Fri, Sat]`.
/// Times are wall-clock strings, either `"HHMM"` or `"HH:MM"`; empty means TBD.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTime {
    pub days: [bool; 7],
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub start_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub end_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub building: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room: String,
}

impl MeetingTime {
    /// Whether the meeting happens on the given weekday, 0 = Monday .. 4 = Friday.
    pub fn meets_on(&self, weekday: usize) -> bool {
        weekday < 5 && self.days[weekday + 1]
    }

    pub fn meets_on_weekday(&self) -> bool {
        (0..5).any(|d| self.meets_on(d))
    }
}

/// A scheduled section of a course within a term. Owned by the catalog and
/// shared read-only with the generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub crn: String,
    pub term: String,
    pub subject: String,
    pub course_number: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub credits: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instructor: String,
    #[serde(default)]
    pub enrollment: i32,
    #[serde(default)]
    pub max_enrollment: i32,
    #[serde(default)]
    pub seats_available: i32,
    #[serde(default)]
    pub wait_count: i32,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub meeting_times: Vec<MeetingTime>,
    /// 0.0 when unknown.
    #[serde(default)]
    pub gpa: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_rate: Option<f64>,
}

impl Section {
    pub fn course_key(&self) -> CourseKey {
        CourseKey::new(&self.subject, &self.course_number)
    }

    /// True when the section has no fixed weekly meeting on Monday..Friday
    /// (online, arranged, TBD). Such sections must never reach mask building.
    pub fn is_async(&self) -> bool {
        !self.meeting_times.iter().any(|mt| {
            !mt.start_time.is_empty() && !mt.end_time.is_empty() && mt.meets_on_weekday()
        })
    }
}

/// Course identity: subject plus course number, rendered as `"CSCI:241"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseKey {
    pub subject: String,
    pub number: String,
}

impl CourseKey {
    pub fn new(subject: &str, number: &str) -> Self {
        CourseKey {
            subject: subject.trim().to_uppercase(),
            number: number.trim().to_uppercase(),
        }
    }

    /// Accepts `"CSCI 241"`, `"csci:241"` or `"CSCI241"`. Returns `None` when
    /// no subject/number split can be found.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().to_uppercase().replace(':', " ");
        let parts: Vec<&str> = cleaned.split_whitespace().collect();
        if parts.len() == 2 {
            return Some(CourseKey::new(parts[0], parts[1]));
        }

        let compact: String = parts.concat();
        let split_at = compact.find(|c: char| c.is_ascii_digit())?;
        let (subject, number) = compact.split_at(split_at);
        if subject.is_empty() || number.is_empty() {
            return None;
        }
        Some(CourseKey::new(subject, number))
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject, self.number)
    }
}

/// A window of time the student cannot attend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedTime {
    /// 0 = Monday .. 4 = Friday
    pub day: i32,
    pub start_time: String,
    pub end_time: String,
}
