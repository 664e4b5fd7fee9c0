//! Implements InputPort. Inquire-based interactive menu.
//!
//! Presentation only: every action calls a use case and renders its typed result.

use crate::adapters::export::{overrides_to_csv, sessions_to_csv};
use crate::domain::{AttendanceSession, DomainError, OverrideRequest, Role};
use crate::ports::InputPort;
use crate::usecases::{AttendanceService, GeofenceService, OverrideService};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{Confirm, CustomType, Select, Text};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const INPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

const CHECK_IN: &str = "Check in";
const CHECK_OUT: &str = "Check out";
const REQUEST_OVERRIDE: &str = "Request attendance override";
const HISTORY: &str = "Attendance history";
const EXPORT: &str = "Export history to CSV";
const CONFIGURE_FENCE: &str = "Configure class geofence (advisor)";
const QUIT: &str = "Quit";

/// Global prompt styling. Call once before the first prompt.
pub fn apply_theme() {
    let config = RenderConfig::default_colored()
        .with_prompt_prefix(Styled::new("◆").with_fg(Color::LightGreen))
        .with_highlighted_option_prefix(Styled::new("➜").with_fg(Color::LightBlue));
    inquire::set_global_render_config(config);
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Renders a failure the way a student should read it.
fn describe_error(e: &DomainError) -> String {
    match e {
        DomainError::LoginRequired => "Login required.".to_string(),
        DomainError::NoGeofenceConfigured(_) => "Advisor has not set a geofence.".to_string(),
        DomainError::OutsideGeofence { excess_meters } => {
            format!("Outside area: {}m beyond the allowed zone.", excess_meters)
        }
        DomainError::NoActiveSession => "No active check-in.".to_string(),
        DomainError::SessionAlreadyOpen => "You are already checked in.".to_string(),
        e if e.is_retryable() => format!("{} (try again)", e),
        e => e.to_string(),
    }
}

fn parse_input_time(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(s.trim(), INPUT_TIME_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|_| format!("expected {}", "YYYY-MM-DD HH:MM"))
}

fn session_line(s: &AttendanceSession) -> String {
    let out = s
        .check_out_at
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "open".to_string());
    let hours = s
        .duration_hours
        .map(|h| format!("{:.2}h", h))
        .unwrap_or_default();
    format!(
        "{}  {:<20} in {}  out {:<5} {}",
        s.date,
        s.subject_name,
        s.check_in_at.format("%H:%M"),
        out,
        hours
    )
}

/// File name and rendered contents for each export. A failed override lookup
/// becomes an error entry, so no header-only file is written for it.
fn export_files(
    sessions: &[AttendanceSession],
    requests: Result<Vec<OverrideRequest>, DomainError>,
    stamp: &str,
) -> Vec<(String, Result<String, String>)> {
    let overrides = match requests {
        Ok(requests) => overrides_to_csv(&requests).map_err(|e| e.to_string()),
        Err(e) => Err(describe_error(&e)),
    };
    vec![
        (
            format!("attendance-{}.csv", stamp),
            sessions_to_csv(sessions).map_err(|e| e.to_string()),
        ),
        (format!("overrides-{}.csv", stamp), overrides),
    ]
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    attendance: Arc<AttendanceService>,
    overrides: Arc<OverrideService>,
    geofences: Arc<GeofenceService>,
    export_dir: PathBuf,
}

impl TuiInputPort {
    pub fn new(
        attendance: Arc<AttendanceService>,
        overrides: Arc<OverrideService>,
        geofences: Arc<GeofenceService>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            attendance,
            overrides,
            geofences,
            export_dir,
        }
    }

    async fn check_in(&self) {
        let pb = spinner("Acquiring location...");
        let result = self.attendance.check_in_current_user().await;
        pb.finish_and_clear();
        match result {
            Ok(s) => println!("✓ Checked in at {} ({})", s.check_in_at.format("%H:%M"), s.class_name),
            Err(e) => println!("✗ {}", describe_error(&e)),
        }
    }

    async fn check_out(&self) {
        let pb = spinner("Acquiring location...");
        let result = self.attendance.check_out_current_user().await;
        pb.finish_and_clear();
        match result {
            Ok(s) => println!(
                "✓ Checked out. Time on site: {:.2}h",
                s.duration_hours.unwrap_or_default()
            ),
            Err(e) => println!("✗ {}", describe_error(&e)),
        }
    }

    async fn request_override(&self) -> Result<(), inquire::InquireError> {
        let reason = Text::new("Reason:").prompt()?;
        let from = Text::new("From (YYYY-MM-DD HH:MM, UTC):").prompt()?;
        let to = Text::new("To (YYYY-MM-DD HH:MM, UTC):").prompt()?;
        let (from, to) = match (parse_input_time(&from), parse_input_time(&to)) {
            (Ok(f), Ok(t)) => (f, t),
            (Err(e), _) | (_, Err(e)) => {
                println!("✗ Invalid time: {}", e);
                return Ok(());
            }
        };
        match self
            .overrides
            .submit_override_current_user(&reason, from, to)
            .await
        {
            Ok(r) => println!("✓ Request submitted (status: {})", r.status.as_str()),
            Err(e) => println!("✗ {}", describe_error(&e)),
        }
        Ok(())
    }

    async fn history(&self) {
        match self.attendance.history_current_user().await {
            Ok(sessions) if sessions.is_empty() => println!("No attendance recorded yet."),
            Ok(sessions) => {
                for s in &sessions {
                    println!("{}", session_line(s));
                }
            }
            Err(e) => println!("✗ {}", describe_error(&e)),
        }
        match self.overrides.my_requests().await {
            Ok(requests) => {
                for r in requests {
                    println!(
                        "override {} → {}  [{}]  {}",
                        r.requested_from.format(INPUT_TIME_FORMAT),
                        r.requested_to.format(INPUT_TIME_FORMAT),
                        r.status.as_str(),
                        r.reason
                    );
                }
            }
            Err(e) => println!("✗ Override requests: {}", describe_error(&e)),
        }
    }

    async fn export(&self) {
        let sessions = match self.attendance.history_current_user().await {
            Ok(s) => s,
            Err(e) => {
                println!("✗ {}", describe_error(&e));
                return;
            }
        };
        let requests = self.overrides.my_requests().await;
        if let Err(e) = tokio::fs::create_dir_all(&self.export_dir).await {
            println!("✗ Cannot create {}: {}", self.export_dir.display(), e);
            return;
        }
        let stamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
        for (name, rendered) in export_files(&sessions, requests, &stamp) {
            let path = self.export_dir.join(name);
            let written = match rendered {
                Ok(csv) => tokio::fs::write(&path, csv).await.map_err(|e| e.to_string()),
                Err(e) => Err(e),
            };
            match written {
                Ok(()) => println!("✓ Wrote {}", path.display()),
                Err(e) => println!("✗ Export to {} failed: {}", path.display(), e),
            }
        }
    }

    async fn configure_fence(&self) -> Result<(), inquire::InquireError> {
        if let Ok(Some(current)) = self.geofences.current_fence().await {
            println!(
                "Current zone: center {} radius {:.0}m",
                current.center, current.radius_meters
            );
        }
        let lat = CustomType::<f64>::new("Center latitude:").prompt()?;
        let lng = CustomType::<f64>::new("Center longitude:").prompt()?;
        let radius = CustomType::<f64>::new("Radius (meters):")
            .with_default(100.0)
            .prompt()?;
        if !Confirm::new("Save this geofence?").with_default(true).prompt()? {
            return Ok(());
        }
        match self.geofences.configure(lat, lng, radius).await {
            Ok(f) => println!("✓ Geofence saved for {}", f.class_name),
            Err(e) => println!("✗ {}", describe_error(&e)),
        }
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        let is_advisor = matches!(
            self.geofences.current_user_role().await,
            Ok(Some(Role::Advisor))
        );
        let mut options = vec![CHECK_IN, CHECK_OUT, REQUEST_OVERRIDE, HISTORY, EXPORT];
        if is_advisor {
            options.push(CONFIGURE_FENCE);
        }
        options.push(QUIT);

        loop {
            let choice = match Select::new("What would you like to do?", options.clone()).prompt() {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "menu closed");
                    return Ok(());
                }
            };
            let prompt_result = match choice {
                CHECK_IN => {
                    self.check_in().await;
                    Ok(())
                }
                CHECK_OUT => {
                    self.check_out().await;
                    Ok(())
                }
                REQUEST_OVERRIDE => self.request_override().await,
                HISTORY => {
                    self.history().await;
                    Ok(())
                }
                EXPORT => {
                    self.export().await;
                    Ok(())
                }
                CONFIGURE_FENCE => self.configure_fence().await,
                _ => return Ok(()),
            };
            if let Err(e) = prompt_result {
                warn!(error = %e, "prompt cancelled");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_input_time() {
        assert_eq!(
            parse_input_time(" 2024-01-01 09:30 ").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap()
        );
        assert!(parse_input_time("yesterday").is_err());
    }

    #[test]
    fn test_describe_outside() {
        let msg = describe_error(&DomainError::OutsideGeofence { excess_meters: 42 });
        assert_eq!(msg, "Outside area: 42m beyond the allowed zone.");
        let retry = describe_error(&DomainError::StoreUnavailable("db locked".into()));
        assert!(retry.ends_with("(try again)"));
    }

    #[test]
    fn test_export_skips_overrides_when_lookup_fails() {
        let files = export_files(
            &[],
            Err(DomainError::StoreUnavailable("db locked".into())),
            "20240101-090000",
        );
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, "attendance-20240101-090000.csv");
        assert!(files[0].1.is_ok());
        assert_eq!(files[1].0, "overrides-20240101-090000.csv");
        let err = files[1].1.as_ref().unwrap_err();
        assert!(err.contains("db locked"));

        let files = export_files(&[], Ok(vec![]), "x");
        assert!(files[1].1.is_ok());
    }
}
