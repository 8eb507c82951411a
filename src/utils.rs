//! Small formatting helpers

use std::time::Duration;

/// Format an elapsed time as MM:SS.SS
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    let minutes = (secs / 60.0) as u64;
    let seconds = secs % 60.0;
    format!("{:02}:{:05.2}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed_zero() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00.00");
    }

    #[test]
    fn test_format_elapsed_seconds_only() {
        assert_eq!(format_elapsed(Duration::from_millis(45_670)), "00:45.67");
    }

    #[test]
    fn test_format_elapsed_minutes_and_seconds() {
        assert_eq!(format_elapsed(Duration::from_millis(125_450)), "02:05.45");
    }

    #[test]
    fn test_format_elapsed_long_pass() {
        // Minutes are not wrapped into hours
        assert_eq!(format_elapsed(Duration::from_secs(3661)), "61:01.00");
    }
}
