// Backtracking enumeration of conflict-free section combinations.
//
// Required groups come first and each contributes exactly one section. After
// that, every node of the optional phase is a candidate schedule; optional
// groups are visited in increasing index order so each combination is
// produced once.

use std::sync::Arc;

use super::cancel::CancelToken;
use super::groups::{CourseGroup, SectionData};
use super::mask::TimeMask;
use super::Schedule;
use crate::models::Section;

#[derive(Debug, Clone, Copy)]
pub struct SearchParams<'a> {
    /// Required groups in `[0, required)`, optional groups after them.
    pub groups: &'a [CourseGroup],
    pub required: usize,
    /// Occupied time before any section is chosen (the user's blocked times).
    pub base_mask: TimeMask,
    pub min_courses: usize,
    pub max_courses: usize,
    /// Stop once this many schedules have been recorded.
    pub limit: usize,
}

struct Search<'a> {
    groups: &'a [CourseGroup],
    required: usize,
    min_courses: usize,
    max_courses: usize,
    limit: usize,
    cancel: &'a CancelToken,
    chosen: Vec<Arc<Section>>,
    mask: TimeMask,
    results: Vec<Schedule>,
}

/// Runs the search. Never fails: a dead required course, a cancelled token or
/// the limit all just end the enumeration with whatever was found so far.
pub fn backtrack(params: SearchParams<'_>, cancel: &CancelToken) -> Vec<Schedule> {
    // every schedule carries one section per required course
    if params.required.min(params.groups.len()) > params.max_courses {
        return Vec::new();
    }
    let mut search = Search {
        groups: params.groups,
        required: params.required.min(params.groups.len()),
        min_courses: params.min_courses,
        max_courses: params.max_courses,
        limit: params.limit,
        cancel,
        chosen: Vec::with_capacity(params.max_courses),
        mask: params.base_mask,
        results: Vec::with_capacity(params.limit.min(100)),
    };
    search.required_phase(0);
    search.results
}

impl<'a> Search<'a> {
    fn halted(&self) -> bool {
        self.results.len() >= self.limit || self.cancel.is_cancelled()
    }

    /// Pushes `data`, runs `next`, then restores the selection and mask.
    fn descend(&mut self, data: &SectionData, next: impl FnOnce(&mut Self)) {
        let saved = self.mask;
        self.chosen.push(Arc::clone(&data.section));
        self.mask = self.mask.merge(&data.mask);
        next(self);
        self.chosen.pop();
        self.mask = saved;
    }

    fn required_phase(&mut self, idx: usize) {
        if self.halted() {
            return;
        }
        if idx == self.required {
            self.optional_phase(idx);
            return;
        }
        let groups = self.groups;
        for data in &groups[idx].sections {
            if self.mask.conflicts(&data.mask) {
                continue;
            }
            self.descend(data, |s| s.required_phase(idx + 1));
        }
    }

    fn optional_phase(&mut self, idx: usize) {
        if self.halted() {
            return;
        }

        let size = self.chosen.len();
        if size >= self.min_courses && size <= self.max_courses {
            self.results.push(Schedule::new(self.chosen.clone()));
        }

        if size >= self.max_courses || idx >= self.groups.len() {
            return;
        }
        if size + (self.groups.len() - idx) < self.min_courses {
            return;
        }

        let groups = self.groups;
        for g in idx..groups.len() {
            for data in &groups[g].sections {
                if self.mask.conflicts(&data.mask) {
                    continue;
                }
                self.descend(data, |s| s.optional_phase(g + 1));
            }
        }
    }
}
