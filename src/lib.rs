pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::bootstrap::{bootstrap_workspace, BootstrapResult};
pub use application::commands::{
    handle_drop_impl, shift_week, week_start_of, weekly_schedule_impl, AppState,
};
pub use application::drop::{handle_drop, DropOutcome, DropPayload};
pub use application::planner::PlannerService;
pub use application::schedule::{allocate, compose, Slot, SlotAxis, DAYS_PER_WEEK};
pub use domain::models::{
    DailySchedule, ScheduleRecord, ScheduledTask, Task, TaskKind, WeeklySchedule,
};
pub use infrastructure::api_client::RestPlannerClient;
pub use infrastructure::config::TimelineSettings;
pub use infrastructure::error::InfraError;
pub use infrastructure::record_repository::{
    InMemoryScheduleRecordRepository, ScheduleRecordRepository,
};
pub use infrastructure::task_repository::{InMemoryTaskRepository, TaskRepository};
