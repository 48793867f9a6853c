//! Schedule generation engine.
//!
//! Pipeline, one request at a time:
//!
//! 1. [`groups`] resolves every requested course to its schedulable sections,
//!    each paired with a precomputed [`TimeMask`].
//! 2. [`search`] enumerates conflict-free combinations by backtracking.
//! 3. [`scorer`] rates every combination.
//! 4. [`response`] deduplicates sections into the compact wire format.
//!
//! [`service::GeneratorService`] wires the steps together.

mod cancel;
mod groups;
mod mask;
mod response;
mod scorer;
mod search;
mod service;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{BlockedTime, CourseKey, Section};

pub use cancel::CancelToken;
pub use groups::{build_groups, CourseGroup, GroupedCourses, SectionData};
pub use mask::{parse_time_to_mins, TimeMask};
pub use response::{CourseInfo, ScheduleRef, ScheduleResponse, SectionInfo};
pub use scorer::score_schedule;
pub use search::{backtrack, SearchParams};
pub use service::{clamp_bounds, GeneratorService};

/// Schedules returned to the client.
pub const MAX_SCHEDULES_TO_RETURN: usize = 2000;
/// Safety limit on combinations enumerated per request.
pub const MAX_SCHEDULES_TO_GENERATE: usize = 20000;
pub const MAX_INPUT_COURSES: usize = 13;
pub const DEFAULT_MAX_COURSES: usize = 8;

/// Engine-facing limits, normally taken from [`crate::config::Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorLimits {
    pub generate_cap: usize,
    pub response_cap: usize,
    pub default_max_courses: usize,
}

impl Default for GeneratorLimits {
    fn default() -> Self {
        GeneratorLimits {
            generate_cap: MAX_SCHEDULES_TO_GENERATE,
            response_cap: MAX_SCHEDULES_TO_RETURN,
            default_max_courses: DEFAULT_MAX_COURSES,
        }
    }
}

/// One requested course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSpec {
    pub subject: String,
    pub course_number: String,
    #[serde(default)]
    pub required: bool,
    /// When present, only these CRNs are considered for the course.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_section_ids: Option<Vec<String>>,
}

impl CourseSpec {
    /// Normalized key of the requested course. An empty `course_number` means
    /// the whole code was sent in `subject` (`"CSCI 241"`, `"csci241"`).
    pub fn course_key(&self) -> Option<CourseKey> {
        if self.course_number.trim().is_empty() {
            return CourseKey::parse(&self.subject);
        }
        if self.subject.trim().is_empty() {
            return None;
        }
        Some(CourseKey::new(&self.subject, &self.course_number))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub term: String,
    #[serde(default)]
    pub courses: Vec<CourseSpec>,
    #[serde(default)]
    pub blocked_times: Vec<BlockedTime>,
    /// 0 selects the default (all requested courses).
    #[serde(default)]
    pub min_courses: usize,
    /// 0 selects the default ([`DEFAULT_MAX_COURSES`]).
    #[serde(default)]
    pub max_courses: usize,
}

/// What happened to one requested course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CourseStatus {
    /// Has schedulable sections.
    Found,
    /// Only async/TBD sections exist.
    AsyncOnly,
    /// Every timed section overlaps the blocked times.
    Blocked,
    /// Every section was excluded by the allowed-section list.
    CrnFiltered,
    /// Course exists, but not in this term.
    NotOffered,
    /// Course code was never seen in any term.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseResult {
    pub name: String,
    pub status: CourseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// Fixed set of quality measures computed for every schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreComponent {
    #[serde(rename = "GPA")]
    Gpa,
    Gap,
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub name: ScoreComponent,
    pub value: f64,
}

/// A combination of sections produced by the search.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub sections: Vec<Arc<Section>>,
    pub score: f64,
    pub weights: Vec<Weight>,
}

impl Schedule {
    pub fn new(sections: Vec<Arc<Section>>) -> Self {
        Schedule { sections, score: 0.0, weights: Vec::new() }
    }

    pub fn crns(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.crn.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStats {
    /// Number of schedules found before truncation.
    pub total_generated: usize,
    pub time_ms: f64,
}

/// Full result of one generation, before deduplication.
#[derive(Debug, Clone, Default)]
pub struct GenerateOutcome {
    /// Sorted by descending score.
    pub schedules: Vec<Schedule>,
    pub asyncs: Vec<Arc<Section>>,
    pub course_results: Vec<CourseResult>,
    pub stats: GenerateStats,
}
