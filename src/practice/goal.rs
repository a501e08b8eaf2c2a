pub const GOAL_HOURS: i64 = 10_000;
pub const ASSUMED_DAILY_HOURS: f64 = 2.0;
const DAYS_PER_YEAR: f64 = 365.0;

/// Years left to reach [`GOAL_HOURS`] at [`ASSUMED_DAILY_HOURS`] a day.
/// `None` once the goal is met or passed.
pub fn time_to_goal_years(total_hours: i64) -> Option<f64> {
    let remaining = GOAL_HOURS.saturating_sub(total_hours);
    let days = remaining as f64 / ASSUMED_DAILY_HOURS;
    (days > 0.0).then(|| days / DAYS_PER_YEAR)
}
