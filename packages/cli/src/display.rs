//! Plain-text rendering for CLI output.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use worm_watch_client::{SeasonStatus, is_first_year};
use worm_watch_server_models::{ApiReport, ApiStats};

const NOTES_WIDTH: usize = 40;

/// One table row for a report.
pub fn report_line(report: &ApiReport) -> String {
    let area = worm_watch_neighborhood::nearest(report.lat, report.lng)
        .map_or("-", |n| n.name.as_str());
    let notes = report.notes.as_deref().map_or_else(String::new, truncate);

    format!(
        "{:<20} {:<18} {:<30} {notes}",
        report.created_at.format("%Y-%m-%d %H:%M").to_string(),
        format!("{} {}", report.intensity.value(), report.intensity.label()),
        area,
    )
}

fn truncate(notes: &str) -> String {
    if notes.chars().count() > NOTES_WIDTH {
        let head: String = notes.chars().take(NOTES_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        notes.to_string()
    }
}

/// The stats snapshot with the season banner on top.
pub fn stats_summary(stats: &ApiStats, now: DateTime<Utc>) -> String {
    let active = usize::try_from(stats.total_active_reports).unwrap_or(0);
    let mut out = String::new();

    let _ = writeln!(out, "Season status: {}", SeasonStatus::at(now, active));
    let _ = writeln!(out);
    let _ = writeln!(out, "Reports this week:    {}", stats.total_reports_this_week);
    let _ = writeln!(out, "Intensity this week:  {}", stats.total_intensity_this_week);
    let _ = writeln!(out, "Active reports:       {}", stats.total_active_reports);
    let _ = writeln!(out, "All-time reports:     {}", stats.total_reports_all_time);

    if is_first_year(Some(stats)) {
        let _ = writeln!(out, "Last season:          no data yet (first year)");
    } else {
        let peak = stats
            .last_season_peak_intensity
            .map_or_else(|| "-".to_string(), |i| format!("{} {}", i.emoji(), i.label()));
        let last = stats
            .last_season_last_report_date
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let _ = writeln!(out, "Last season reports:  {}", stats.last_season_total_reports);
        let _ = writeln!(out, "Last season peak:     {peak}");
        let _ = writeln!(out, "Last season ended:    {last}");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use worm_watch_report_models::Intensity;

    #[test]
    fn report_line_names_neighbourhood_and_truncates_notes() {
        let report = ApiReport {
            lat: 49.885,
            lng: -97.135,
            intensity: Intensity::GettingGross,
            notes: Some("w".repeat(60)),
            created_at: "2026-06-01T12:30:00Z".parse().unwrap(),
        };

        let line = report_line(&report);

        assert!(line.starts_with("2026-06-01 12:30"));
        assert!(line.contains("Osborne Village"));
        assert!(line.contains(Intensity::GettingGross.label()));
        assert!(line.ends_with(&format!("{}...", "w".repeat(NOTES_WIDTH - 3))));
    }

    #[test]
    fn stats_summary_flags_first_year() {
        let now: DateTime<Utc> = "2026-06-01T00:00:00Z".parse().unwrap();

        let summary = stats_summary(&ApiStats::default(), now);
        assert!(summary.starts_with("Season status: WATCH"));
        assert!(summary.contains("first year"));

        let stats = ApiStats {
            total_active_reports: 2,
            last_season_total_reports: 9,
            last_season_peak_intensity: Some(Intensity::Plague),
            ..ApiStats::default()
        };
        let summary = stats_summary(&stats, now);
        assert!(summary.starts_with("Season status: ACTIVE"));
        assert!(summary.contains("Last season reports:  9"));
        assert!(summary.contains(Intensity::Plague.label()));
    }
}
