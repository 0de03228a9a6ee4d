use crate::application::bootstrap::bootstrap_workspace;
use crate::application::drop::DropPayload;
use crate::application::planner::PlannerService;
use crate::application::schedule::{Slot, SlotAxis};
use crate::domain::models::{weekday_code, ScheduleRecord, WeeklySchedule};
use crate::infrastructure::api_client::RestPlannerClient;
use crate::infrastructure::config::{
    read_api_base_url, read_api_bearer_token, read_timeline_settings,
};
use crate::infrastructure::error::InfraError;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub struct AppState {
    config_dir: PathBuf,
    logs_dir: PathBuf,
    planner: PlannerService<RestPlannerClient, RestPlannerClient>,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;

        let settings = read_timeline_settings(&bootstrap.config_dir)?;
        let axis = SlotAxis::from_settings(settings.start, settings.end, settings.interval_minutes);

        let base_url = read_api_base_url(&bootstrap.config_dir)?;
        let mut client = RestPlannerClient::new(base_url);
        if let Some(token) = read_api_bearer_token(&bootstrap.config_dir)? {
            client = client.with_bearer_token(token);
        }
        let client = Arc::new(client);
        let planner = PlannerService::new(Arc::clone(&client), client).with_axis(axis);

        Ok(Self {
            config_dir: bootstrap.config_dir,
            logs_dir: bootstrap.logs_dir,
            planner,
            log_guard: Mutex::new(()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn planner(&self) -> &PlannerService<RestPlannerClient, RestPlannerClient> {
        &self.planner
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

pub async fn weekly_schedule_impl(
    state: &AppState,
    week_start: String,
) -> Result<WeeklySchedule, InfraError> {
    let week_start = week_start_of(parse_date_input(&week_start, "week_start")?);
    let schedule = state.planner().weekly_schedule(week_start).await?;

    let occurrence_count: usize = schedule
        .days
        .iter()
        .map(|day| day.occurrences.len())
        .sum();
    state.log_info(
        "weekly_schedule",
        &format!("composed week starting {week_start} with {occurrence_count} occurrences"),
    );
    Ok(schedule)
}

pub async fn handle_drop_impl(
    state: &AppState,
    payload: DropPayload,
    date: String,
    slot_start: String,
    slot_end: String,
) -> Result<ScheduleRecord, InfraError> {
    let date = parse_date_input(&date, "date")?;
    let slot = Slot {
        start: parse_time_input(&slot_start, "slot_start")?,
        end: parse_time_input(&slot_end, "slot_end")?,
    };

    let record = state.planner().apply_drop(payload, date, slot).await?;
    state.log_info(
        "handle_drop",
        &format!(
            "placed task_id={} record_id={} on {} at {}-{}",
            record.task_id, record.id, record.date, record.start_time, record.end_time
        ),
    );
    Ok(record)
}

/// Monday of the week containing `date`.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days((weekday_code(date.weekday()) - 1) as i64)
}

/// Week navigation: the Monday `offset_weeks` away from the given one.
pub fn shift_week(week_start: NaiveDate, offset_weeks: i64) -> NaiveDate {
    week_start + Duration::weeks(offset_weeks)
}

fn parse_date_input(value: &str, field_name: &str) -> Result<NaiveDate, InfraError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|error| InfraError::InvalidConfig(format!("{field_name} must be YYYY-MM-DD: {error}")))
}

fn parse_time_input(value: &str, field_name: &str) -> Result<NaiveTime, InfraError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|error| InfraError::InvalidConfig(format!("{field_name} must be HH:MM: {error}")))
}
