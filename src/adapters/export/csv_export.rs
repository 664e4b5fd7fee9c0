//! CSV export of attendance history. Uses the `csv` crate for quoting and escaping.
//!
//! Semicolon-delimited, one row per session/request, timestamps in UTC.

use crate::domain::{AttendanceSession, OverrideRequest};
use chrono::{DateTime, Utc};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn fmt_time(t: DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, csv::Error> {
    let bytes = wtr.into_inner().map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::Other,
            e.to_string(),
        ))
    })?;
    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}

/// Header: `Date;Student;Class;CheckIn;CheckOut;Hours`. Open sessions leave the
/// last two columns empty.
pub fn sessions_to_csv(sessions: &[AttendanceSession]) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_writer(Vec::new());

    wtr.write_record(["Date", "Student", "Class", "CheckIn", "CheckOut", "Hours"])?;

    for s in sessions {
        let date = s.date.format("%Y-%m-%d").to_string();
        let check_out = s.check_out_at.map(fmt_time).unwrap_or_default();
        let hours = s
            .duration_hours
            .map(|h| format!("{:.2}", h))
            .unwrap_or_default();
        wtr.write_record([
            date.as_str(),
            s.subject_name.as_str(),
            s.class_name.as_str(),
            fmt_time(s.check_in_at).as_str(),
            check_out.as_str(),
            hours.as_str(),
        ])?;
    }

    wtr.flush()?;
    finish(wtr)
}

/// Header: `Student;Class;From;To;Status;Reason`. Newlines in reasons become spaces.
pub fn overrides_to_csv(requests: &[OverrideRequest]) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_writer(Vec::new());

    wtr.write_record(["Student", "Class", "From", "To", "Status", "Reason"])?;

    for r in requests {
        let reason = r.reason.replace('\n', " ").replace('\r', "");
        wtr.write_record([
            r.subject_name.as_str(),
            r.class_name.as_str(),
            fmt_time(r.requested_from).as_str(),
            fmt_time(r.requested_to).as_str(),
            r.status.as_str(),
            reason.as_str(),
        ])?;
    }

    wtr.flush()?;
    finish(wtr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, OverrideStatus, Role, UserProfile};
    use chrono::TimeZone;

    fn ada() -> UserProfile {
        UserProfile {
            id: "stu-1".into(),
            role: Role::Student,
            class_name: "CS-1".into(),
            display_name: "Ada; Lovelace".into(),
        }
    }

    #[test]
    fn test_sessions_to_csv() {
        let loc = Coordinate::new(0.0, 0.0).unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 17, 30, 0).unwrap();
        let mut closed = AttendanceSession::open(&ada(), "CS-1", loc, t0);
        closed.close(t1, loc).unwrap();
        let open = AttendanceSession::open(&ada(), "CS-1", loc, t1);

        let csv = sessions_to_csv(&[closed, open]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Date;Student;Class;CheckIn;CheckOut;Hours");
        // Delimiter inside a field is quoted.
        assert_eq!(
            lines[1],
            "2024-01-01;\"Ada; Lovelace\";CS-1;2024-01-01 09:00;2024-01-01 17:30;8.50"
        );
        assert!(lines[2].ends_with("2024-01-01 17:30;;"));
    }

    #[test]
    fn test_overrides_to_csv() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let req = OverrideRequest {
            id: "r".into(),
            subject_id: "stu-1".into(),
            subject_name: "Ada".into(),
            class_name: "CS-1".into(),
            reason: "line one\nline two".into(),
            requested_from: t0,
            requested_to: t0,
            status: OverrideStatus::Pending,
            created_at: t0,
        };
        let csv = overrides_to_csv(&[req]).unwrap();
        assert!(csv.contains("pending;line one line two"));
    }

    #[test]
    fn test_empty_history_has_header_only() {
        let csv = sessions_to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
