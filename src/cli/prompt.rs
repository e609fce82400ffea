use chrono::{DateTime, Utc};

/// Asks before a destructive or outward-facing action. `--yes` skips the
/// prompt; in non-interactive mode its absence is an error.
pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required for this operation in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Format a datetime as relative time (e.g., "2 days ago")
#[must_use]
pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let diff = Utc::now().signed_duration_since(*dt);

    match diff.num_seconds() {
        s if s < 0 => "in the future".to_string(),
        s if s < 60 => "just now".to_string(),
        _ if diff.num_minutes() < 60 => plural(diff.num_minutes(), "minute"),
        _ if diff.num_hours() < 24 => plural(diff.num_hours(), "hour"),
        _ if diff.num_days() < 30 => plural(diff.num_days(), "day"),
        _ if diff.num_days() < 365 => plural(diff.num_days() / 30, "month"),
        _ => plural(diff.num_days() / 365, "year"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_relative_time() {
        let now = Utc::now();
        assert_eq!(format_relative_time(&now), "just now");
        assert_eq!(format_relative_time(&(now - Duration::minutes(1))), "1 minute ago");
        assert_eq!(format_relative_time(&(now - Duration::hours(5))), "5 hours ago");
        assert_eq!(format_relative_time(&(now - Duration::days(90))), "3 months ago");
        assert_eq!(format_relative_time(&(now + Duration::hours(1))), "in the future");
    }

    #[test]
    fn test_confirm_requires_yes_when_non_interactive() {
        assert!(confirm_action("go?", true, true).unwrap());
        assert!(confirm_action("go?", false, true).is_err());
    }
}
