use crate::application::drop::{handle_drop, DropPayload};
use crate::application::schedule::{compose, Slot, SlotAxis, DAYS_PER_WEEK};
use crate::domain::models::{ScheduleRecord, WeeklySchedule};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::record_repository::ScheduleRecordRepository;
use crate::infrastructure::task_repository::TaskRepository;
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

/// Orchestrates the pure composition engine over the repository traits. The
/// service keeps no task or record state between calls; every operation
/// works from freshly fetched repository values.
pub struct PlannerService<T, R>
where
    T: TaskRepository,
    R: ScheduleRecordRepository,
{
    task_repository: Arc<T>,
    record_repository: Arc<R>,
    axis: SlotAxis,
}

impl<T, R> PlannerService<T, R>
where
    T: TaskRepository,
    R: ScheduleRecordRepository,
{
    pub fn new(task_repository: Arc<T>, record_repository: Arc<R>) -> Self {
        Self {
            task_repository,
            record_repository,
            axis: SlotAxis::default(),
        }
    }

    pub fn with_axis(mut self, axis: SlotAxis) -> Self {
        self.axis = axis;
        self
    }

    pub fn axis(&self) -> &SlotAxis {
        &self.axis
    }

    pub async fn weekly_schedule(&self, week_start: NaiveDate) -> Result<WeeklySchedule, InfraError> {
        let tasks = self.task_repository.list().await?;
        let week_end = week_start + Duration::days(DAYS_PER_WEEK as i64);
        let records = self.record_repository.query(week_start, week_end).await?;
        Ok(compose(&tasks, &records, week_start, &self.axis))
    }

    /// Applies a drag-and-drop placement: resolves the drop against fresh
    /// repository state, then issues the mutations in order. The displaced
    /// record's delete is awaited before the replacement create, so a create
    /// failure leaves the slot empty rather than doubly occupied.
    pub async fn apply_drop(
        &self,
        payload: DropPayload,
        date: NaiveDate,
        slot: Slot,
    ) -> Result<ScheduleRecord, InfraError> {
        let tasks = self.task_repository.list().await?;
        let day_records = self.record_repository.query(date, date + Duration::days(1)).await?;
        let outcome = handle_drop(&tasks, &day_records, payload, date, slot)?;

        if let Some(task) = &outcome.register_task {
            self.task_repository.create(task).await?;
        }
        if let Some(record_id) = outcome.delete_record_id.as_deref() {
            self.record_repository.delete(record_id).await?;
        }
        self.record_repository.create(&outcome.create_record).await
    }
}
