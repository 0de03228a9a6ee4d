use crate::domain::models::ScheduleRecord;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

#[async_trait]
pub trait ScheduleRecordRepository: Send + Sync {
    /// Records whose date falls in the half-open range `[start, end)`.
    async fn query(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ScheduleRecord>, InfraError>;
    async fn create(&self, record: &ScheduleRecord) -> Result<ScheduleRecord, InfraError>;
    async fn delete(&self, record_id: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Default)]
pub struct InMemoryScheduleRecordRepository {
    records: Mutex<HashMap<String, ScheduleRecord>>,
}

impl InMemoryScheduleRecordRepository {
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, ScheduleRecord>>, InfraError> {
        self.records.lock().map_err(|error| {
            InfraError::InvalidConfig(format!("record store lock poisoned: {error}"))
        })
    }
}

#[async_trait]
impl ScheduleRecordRepository for InMemoryScheduleRecordRepository {
    async fn query(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ScheduleRecord>, InfraError> {
        let records = self.lock()?;
        let mut matching: Vec<ScheduleRecord> = records
            .values()
            .filter(|record| record.date >= start && record.date < end)
            .cloned()
            .collect();
        matching.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(matching)
    }

    async fn create(&self, record: &ScheduleRecord) -> Result<ScheduleRecord, InfraError> {
        record.validate().map_err(InfraError::InvalidConfig)?;
        let mut records = self.lock()?;
        records.insert(record.id.clone(), record.clone());
        Ok(record.clone())
    }

    async fn delete(&self, record_id: &str) -> Result<(), InfraError> {
        let mut records = self.lock()?;
        records.remove(record_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
    }

    fn time(value: &str) -> NaiveTime {
        NaiveTime::parse_from_str(value, "%H:%M").expect("valid time")
    }

    fn sample_record(id: &str, day: &str) -> ScheduleRecord {
        ScheduleRecord {
            id: id.to_string(),
            task_id: "t1".to_string(),
            date: date(day),
            start_time: time("09:00"),
            end_time: time("10:00"),
            is_completed: None,
        }
    }

    #[tokio::test]
    async fn query_returns_half_open_range_sorted_by_id() {
        let repository = InMemoryScheduleRecordRepository::default();
        repository
            .create(&sample_record("rec-2", "2025-08-25"))
            .await
            .expect("create rec-2");
        repository
            .create(&sample_record("rec-1", "2025-08-27"))
            .await
            .expect("create rec-1");
        repository
            .create(&sample_record("rec-3", "2025-09-01"))
            .await
            .expect("create rec-3");

        let week = repository
            .query(date("2025-08-25"), date("2025-09-01"))
            .await
            .expect("query week");
        let ids: Vec<&str> = week.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["rec-1", "rec-2"]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repository = InMemoryScheduleRecordRepository::default();
        repository
            .create(&sample_record("rec-1", "2025-08-25"))
            .await
            .expect("create");
        repository.delete("rec-1").await.expect("first delete");
        repository.delete("rec-1").await.expect("second delete");
        let remaining = repository
            .query(date("2025-08-25"), date("2025-08-26"))
            .await
            .expect("query");
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_invalid_record() {
        let repository = InMemoryScheduleRecordRepository::default();
        let mut record = sample_record("rec-1", "2025-08-25");
        record.end_time = record.start_time;
        assert!(repository.create(&record).await.is_err());
    }
}
