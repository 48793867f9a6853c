use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use super::cancel::CancelToken;
use super::groups::build_groups;
use super::mask::TimeMask;
use super::response::ScheduleResponse;
use super::scorer::score_schedule;
use super::search::{backtrack, SearchParams};
use super::{GenerateOutcome, GenerateRequest, GenerateStats, GeneratorLimits};
use crate::catalog::CourseCatalog;
use crate::gpa::GpaLookup;

/// Schedule generation over an injected catalog. Holds no per-request state,
/// so one instance can serve concurrent requests.
pub struct GeneratorService {
    catalog: Arc<dyn CourseCatalog>,
    gpa: Arc<dyn GpaLookup>,
    limits: GeneratorLimits,
}

impl GeneratorService {
    pub fn new(catalog: Arc<dyn CourseCatalog>, gpa: Arc<dyn GpaLookup>, limits: GeneratorLimits) -> Self {
        GeneratorService { catalog, gpa, limits }
    }

    /// Produces every valid schedule for `req`, scored and sorted by
    /// descending score. Never fails; missing data shows up in
    /// `course_results` and as an empty schedule list.
    pub fn generate(&self, req: &GenerateRequest, cancel: &CancelToken) -> GenerateOutcome {
        let start = Instant::now();

        let blocked = TimeMask::from_blocked_times(&req.blocked_times);
        let grouped = build_groups(self.catalog.as_ref(), &req.term, &req.courses, &blocked);

        let (min_courses, max_courses) = clamp_bounds(
            req.min_courses,
            req.max_courses,
            grouped.results.len(),
            self.limits.default_max_courses,
        );

        let mut schedules = if grouped.missing_required {
            Vec::new()
        } else {
            backtrack(
                SearchParams {
                    groups: &grouped.groups,
                    required: grouped.required,
                    base_mask: blocked,
                    min_courses,
                    max_courses,
                    limit: self.limits.generate_cap,
                },
                cancel,
            )
        };

        for schedule in schedules.iter_mut() {
            score_schedule(schedule);
        }
        schedules.sort_by(|a, b| b.score.total_cmp(&a.score));

        let stats = GenerateStats {
            total_generated: schedules.len(),
            time_ms: start.elapsed().as_micros() as f64 / 1000.0,
        };

        info!(
            term = %req.term,
            courses = grouped.results.len(),
            groups = grouped.groups.len(),
            min_courses,
            max_courses,
            generated = stats.total_generated,
            cancelled = cancel.is_cancelled(),
            time_ms = stats.time_ms,
            "generated schedules"
        );

        GenerateOutcome {
            schedules,
            asyncs: grouped.asyncs,
            course_results: grouped.results,
            stats,
        }
    }

    /// [`generate`](Self::generate) followed by truncation and deduplication.
    pub fn generate_response(&self, req: &GenerateRequest, cancel: &CancelToken) -> ScheduleResponse {
        let outcome = self.generate(req, cancel);
        ScheduleResponse::assemble(outcome, self.limits.response_cap, self.gpa.as_ref())
    }
}

/// Resolves the requested bounds. 0 means default: min = all requested
/// courses, max = `default_max`. Both end up in `[1, total]` with max >= min.
pub fn clamp_bounds(min_req: usize, max_req: usize, total: usize, default_max: usize) -> (usize, usize) {
    let total = total.max(1);

    let min_courses = if min_req == 0 { total } else { min_req };
    let min_courses = min_courses.clamp(1, total);

    let max_courses = if max_req == 0 { default_max } else { max_req };
    let max_courses = max_courses.clamp(1, total).max(min_courses);

    (min_courses, max_courses)
}
