use crate::application::schedule::Slot;
use crate::domain::models::{ScheduleRecord, Task};
use crate::infrastructure::error::InfraError;
use chrono::{NaiveDate, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{sequence}", Utc::now().timestamp_micros())
}

/// Drag payload delivered by the view layer: either a full task value (first
/// placement of a task that may not be tracked yet) or a bare task id
/// (re-drag of an already-scheduled occurrence).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPayload {
    Task(Task),
    TaskId(String),
}

/// Repository mutation instructions produced by a drop. The caller applies
/// them in order: register the task, delete the displaced record, create the
/// replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropOutcome {
    pub register_task: Option<Task>,
    pub delete_record_id: Option<String>,
    pub create_record: ScheduleRecord,
}

/// Resolves a drag-and-drop placement against the current task and record
/// state. Placing onto an occupied `(date, start, end)` triple evicts the
/// occupant (overwrite, never merge). The task's own default times are never
/// touched; placement is per occurrence.
pub fn handle_drop(
    tasks: &[Task],
    records: &[ScheduleRecord],
    payload: DropPayload,
    date: NaiveDate,
    slot: Slot,
) -> Result<DropOutcome, InfraError> {
    if slot.end <= slot.start {
        return Err(InfraError::InvalidPayload(
            "drop slot end must be after its start".to_string(),
        ));
    }

    let (task_id, register_task, carried_completion) = match payload {
        DropPayload::Task(task) => {
            task.validate().map_err(InfraError::InvalidPayload)?;
            let known = tasks.iter().any(|candidate| candidate.id == task.id);
            let completion = task.is_completed;
            let register = (!known).then(|| task.clone());
            (task.id, register, Some(completion))
        }
        DropPayload::TaskId(raw) => {
            let task_id = raw.trim();
            if task_id.is_empty() {
                return Err(InfraError::InvalidPayload(
                    "drop payload task id must not be empty".to_string(),
                ));
            }
            if !tasks.iter().any(|candidate| candidate.id == task_id) {
                return Err(InfraError::TaskNotFound(task_id.to_string()));
            }
            (task_id.to_string(), None, None)
        }
    };

    let delete_record_id = records
        .iter()
        .filter(|record| record.occupies(date, slot.start, slot.end))
        .map(|record| record.id.as_str())
        .min()
        .map(ToOwned::to_owned);

    // A full-task payload carries the dragged occurrence's completion state;
    // a bare id leaves the record inheriting the task default at render time.
    let create_record = ScheduleRecord {
        id: next_id("rec"),
        task_id,
        date,
        start_time: slot.start,
        end_time: slot.end,
        is_completed: carried_completion,
    };

    Ok(DropOutcome {
        register_task,
        delete_record_id,
        create_record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TaskKind;
    use chrono::NaiveTime;

    fn time(value: &str) -> NaiveTime {
        NaiveTime::parse_from_str(value, "%H:%M").expect("valid time")
    }

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
    }

    fn slot(start: &str, end: &str) -> Slot {
        Slot {
            start: time(start),
            end: time(end),
        }
    }

    fn sample_task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            theme_color: "#33ff57".to_string(),
            kind: TaskKind::Regular,
            progress: 0,
            is_completed: false,
            description: None,
            start_date: None,
            end_date: None,
            repeat_weekdays: Vec::new(),
            start_time: None,
            end_time: None,
        }
    }

    fn sample_record(id: &str, task_id: &str, day: &str, start: &str, end: &str) -> ScheduleRecord {
        ScheduleRecord {
            id: id.to_string(),
            task_id: task_id.to_string(),
            date: date(day),
            start_time: time(start),
            end_time: time(end),
            is_completed: None,
        }
    }

    #[test]
    fn drop_onto_free_slot_creates_record_without_eviction() {
        let tasks = vec![sample_task("t1")];
        let outcome = handle_drop(
            &tasks,
            &[],
            DropPayload::TaskId("t1".to_string()),
            date("2025-08-25"),
            slot("09:00", "10:00"),
        )
        .expect("drop succeeds");

        assert!(outcome.register_task.is_none());
        assert!(outcome.delete_record_id.is_none());
        assert_eq!(outcome.create_record.task_id, "t1");
        assert_eq!(outcome.create_record.date, date("2025-08-25"));
        assert_eq!(outcome.create_record.start_time, time("09:00"));
        assert!(outcome.create_record.id.starts_with("rec-"));
    }

    #[test]
    fn drop_onto_occupied_slot_evicts_the_occupant() {
        let tasks = vec![sample_task("a"), sample_task("b")];
        let records = vec![sample_record("rec-1", "a", "2025-08-25", "09:00", "10:00")];

        let outcome = handle_drop(
            &tasks,
            &records,
            DropPayload::TaskId("b".to_string()),
            date("2025-08-25"),
            slot("09:00", "10:00"),
        )
        .expect("drop succeeds");

        assert_eq!(outcome.delete_record_id.as_deref(), Some("rec-1"));
        assert_eq!(outcome.create_record.task_id, "b");
    }

    #[test]
    fn drop_does_not_evict_records_on_other_triples() {
        let tasks = vec![sample_task("a")];
        let records = vec![
            sample_record("rec-1", "a", "2025-08-25", "10:00", "11:00"),
            sample_record("rec-2", "a", "2025-08-26", "09:00", "10:00"),
        ];

        let outcome = handle_drop(
            &tasks,
            &records,
            DropPayload::TaskId("a".to_string()),
            date("2025-08-25"),
            slot("09:00", "10:00"),
        )
        .expect("drop succeeds");
        assert!(outcome.delete_record_id.is_none());
    }

    #[test]
    fn unknown_full_task_payload_is_registered_first() {
        let outcome = handle_drop(
            &[],
            &[],
            DropPayload::Task(sample_task("fresh")),
            date("2025-08-25"),
            slot("14:00", "15:00"),
        )
        .expect("drop succeeds");

        let registered = outcome.register_task.expect("task registration");
        assert_eq!(registered.id, "fresh");
        assert_eq!(outcome.create_record.task_id, "fresh");
    }

    #[test]
    fn known_full_task_payload_is_not_registered_again() {
        let tasks = vec![sample_task("t1")];
        let outcome = handle_drop(
            &tasks,
            &[],
            DropPayload::Task(sample_task("t1")),
            date("2025-08-25"),
            slot("14:00", "15:00"),
        )
        .expect("drop succeeds");
        assert!(outcome.register_task.is_none());
    }

    #[test]
    fn full_task_payload_carries_completion_state() {
        let mut dragged = sample_task("t1");
        dragged.is_completed = true;
        let outcome = handle_drop(
            &[sample_task("t1")],
            &[],
            DropPayload::Task(dragged),
            date("2025-08-25"),
            slot("14:00", "15:00"),
        )
        .expect("drop succeeds");
        assert_eq!(outcome.create_record.is_completed, Some(true));
    }

    #[test]
    fn bare_id_payload_inherits_task_completion_at_render() {
        let outcome = handle_drop(
            &[sample_task("t1")],
            &[],
            DropPayload::TaskId("t1".to_string()),
            date("2025-08-25"),
            slot("14:00", "15:00"),
        )
        .expect("drop succeeds");
        assert_eq!(outcome.create_record.is_completed, None);
    }

    #[test]
    fn bare_id_payload_of_unknown_task_is_rejected() {
        let result = handle_drop(
            &[],
            &[],
            DropPayload::TaskId("missing".to_string()),
            date("2025-08-25"),
            slot("09:00", "10:00"),
        );
        assert!(matches!(result, Err(InfraError::TaskNotFound(_))));
    }

    #[test]
    fn blank_payload_id_is_an_invalid_payload() {
        let result = handle_drop(
            &[],
            &[],
            DropPayload::TaskId("   ".to_string()),
            date("2025-08-25"),
            slot("09:00", "10:00"),
        );
        assert!(matches!(result, Err(InfraError::InvalidPayload(_))));
    }

    #[test]
    fn inverted_target_slot_is_an_invalid_payload() {
        let result = handle_drop(
            &[sample_task("t1")],
            &[],
            DropPayload::TaskId("t1".to_string()),
            date("2025-08-25"),
            slot("10:00", "09:00"),
        );
        assert!(matches!(result, Err(InfraError::InvalidPayload(_))));
    }

    #[test]
    fn invalid_full_task_payload_is_rejected() {
        let mut task = sample_task("t1");
        task.title = "   ".to_string();
        let result = handle_drop(
            &[],
            &[],
            DropPayload::Task(task),
            date("2025-08-25"),
            slot("09:00", "10:00"),
        );
        assert!(matches!(result, Err(InfraError::InvalidPayload(_))));
    }

    #[test]
    fn minted_record_ids_are_unique() {
        let tasks = vec![sample_task("t1")];
        let first = handle_drop(
            &tasks,
            &[],
            DropPayload::TaskId("t1".to_string()),
            date("2025-08-25"),
            slot("09:00", "10:00"),
        )
        .expect("first drop");
        let second = handle_drop(
            &tasks,
            &[],
            DropPayload::TaskId("t1".to_string()),
            date("2025-08-25"),
            slot("09:00", "10:00"),
        )
        .expect("second drop");
        assert_ne!(first.create_record.id, second.create_record.id);
    }
}
