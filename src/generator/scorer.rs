// Schedule quality. Every component is normalized to [0, 1] and rounded to two
// decimals; 0 doubles as "no data" and is left out of the aggregate.

use super::mask::parse_time_to_mins;
use super::{Schedule, ScoreComponent, Weight};

const DAY_BEGIN_MINS: i32 = 8 * 60;
const DAY_END_MINS: i32 = 17 * 60;

#[derive(Debug, Clone, Copy)]
struct DayStats {
    class_time: i32,
    first_start: i32,
    last_end: i32,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Fills `weights` and `score` of `schedule`.
pub fn score_schedule(schedule: &mut Schedule) {
    let weights = vec![
        Weight { name: ScoreComponent::Gpa, value: weigh_gpa(schedule) },
        Weight { name: ScoreComponent::Gap, value: weigh_gap(schedule) },
        Weight { name: ScoreComponent::Start, value: weigh_start(schedule) },
        Weight { name: ScoreComponent::End, value: weigh_end(schedule) },
    ];

    let present: Vec<f64> = weights.iter().map(|w| w.value).filter(|v| *v > 0.0).collect();
    schedule.score = if present.is_empty() {
        0.0
    } else {
        round2(present.iter().sum::<f64>() / present.len() as f64)
    };
    schedule.weights = weights;
}

// Instructor GPA lives outside the generator; until it is wired in the
// component stays at 0 and drops out of the average.
fn weigh_gpa(_schedule: &Schedule) -> f64 {
    0.0
}

/// 1 - idle/span per weekday with classes, averaged over those days.
fn weigh_gap(schedule: &Schedule) -> f64 {
    let mut days: [Option<DayStats>; 5] = [None; 5];

    for section in &schedule.sections {
        for mt in &section.meeting_times {
            let (Some(start), Some(end)) = (parse_time_to_mins(&mt.start_time), parse_time_to_mins(&mt.end_time)) else {
                continue;
            };
            if end <= start {
                continue;
            }
            for (day, slot) in days.iter_mut().enumerate() {
                if !mt.meets_on(day) {
                    continue;
                }
                let ds = slot.get_or_insert(DayStats { class_time: 0, first_start: start, last_end: end });
                ds.class_time += end - start;
                ds.first_start = ds.first_start.min(start);
                ds.last_end = ds.last_end.max(end);
            }
        }
    }

    let active: Vec<f64> = days
        .iter()
        .flatten()
        .map(|ds| {
            let span = ds.last_end - ds.first_start;
            if span <= 0 {
                return 1.0;
            }
            let idle = (span - ds.class_time).max(0);
            1.0 - idle as f64 / span as f64
        })
        .collect();

    if active.is_empty() {
        return 0.0;
    }
    round2(active.iter().sum::<f64>() / active.len() as f64)
}

/// 08:00 start = 0, 17:00 or later = 1.
fn weigh_start(schedule: &Schedule) -> f64 {
    let earliest = earliest_start(schedule).max(DAY_BEGIN_MINS);
    if earliest >= DAY_END_MINS {
        return 1.0;
    }
    round2((earliest - DAY_BEGIN_MINS) as f64 / (DAY_END_MINS - DAY_BEGIN_MINS) as f64)
}

/// 08:00 end = 1, 17:00 or later = 0.
fn weigh_end(schedule: &Schedule) -> f64 {
    let latest = latest_end(schedule).min(DAY_END_MINS);
    if latest <= DAY_BEGIN_MINS {
        return 1.0;
    }
    round2(1.0 - (latest - DAY_BEGIN_MINS) as f64 / (DAY_END_MINS - DAY_BEGIN_MINS) as f64)
}

fn earliest_start(schedule: &Schedule) -> i32 {
    schedule
        .sections
        .iter()
        .flat_map(|s| s.meeting_times.iter())
        .filter_map(|mt| parse_time_to_mins(&mt.start_time))
        .min()
        .unwrap_or(24 * 60)
}

fn latest_end(schedule: &Schedule) -> i32 {
    schedule
        .sections
        .iter()
        .flat_map(|s| s.meeting_times.iter())
        .filter_map(|mt| parse_time_to_mins(&mt.end_time))
        .max()
        .unwrap_or(0)
}
