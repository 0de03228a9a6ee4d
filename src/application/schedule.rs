use crate::domain::models::{
    DailySchedule, ScheduleRecord, ScheduledTask, Task, TaskKind, WeeklySchedule,
};
use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use std::collections::{HashMap, HashSet};

pub const DAYS_PER_WEEK: usize = 7;

// Rendering fallback for records whose task no longer exists.
const UNRESOLVED_TASK_COLOR: &str = "#9ca3af";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Ordered display slot boundaries for one day of the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAxis {
    slots: Vec<Slot>,
}

impl SlotAxis {
    /// Builds an axis of back-to-back slots covering `[start, end)`.
    /// A trailing partial slot that would cross `end` is not emitted.
    pub fn from_settings(start: NaiveTime, end: NaiveTime, interval_minutes: u32) -> Self {
        let mut slots = Vec::new();
        if interval_minutes == 0 || end <= start {
            return Self { slots };
        }

        let step = Duration::minutes(interval_minutes as i64);
        let mut cursor = start;
        loop {
            let (next, wrapped) = cursor.overflowing_add_signed(step);
            if wrapped != 0 || next > end || next <= cursor {
                break;
            }
            slots.push(Slot {
                start: cursor,
                end: next,
            });
            cursor = next;
        }
        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<Slot> {
        self.slots.get(index).copied()
    }

    /// Indexes of every slot overlapped by the half-open range `[start, end)`.
    pub fn covering(&self, start: NaiveTime, end: NaiveTime) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.start < end && start < slot.end)
            .map(|(index, _)| index)
            .collect()
    }
}

impl Default for SlotAxis {
    fn default() -> Self {
        let start = NaiveTime::from_hms_opt(9, 0, 0).expect("valid fixed time");
        let end = NaiveTime::from_hms_opt(22, 0, 0).expect("valid fixed time");
        Self::from_settings(start, end, 60)
    }
}

pub fn synthetic_record_id(task_id: &str, date: NaiveDate, slot_index: usize) -> String {
    format!("auto-{task_id}-{date}-{slot_index}")
}

/// Assigns the first free axis slot to an untimed recurring task. Returns
/// `None` when the task does not apply to `date`, carries a fixed time, or
/// every slot is already occupied (the occurrence is simply omitted).
pub fn allocate(
    task: &Task,
    date: NaiveDate,
    axis: &SlotAxis,
    occupied: &HashSet<usize>,
) -> Option<ScheduledTask> {
    if !task.applies_on(date) || !task.is_untimed() {
        return None;
    }

    let (index, slot) = axis
        .slots()
        .iter()
        .enumerate()
        .find(|(index, _)| !occupied.contains(index))?;

    Some(occurrence_from_task(
        task,
        synthetic_record_id(&task.id, date, index),
        slot.start,
        slot.end,
    ))
}

/// Composes the weekly grid from task definitions and explicit placement
/// records. Pure function of its inputs: tasks are processed in id order and
/// records in record-id order, so unchanged inputs reproduce an identical
/// schedule.
pub fn compose(
    tasks: &[Task],
    records: &[ScheduleRecord],
    week_start: NaiveDate,
    axis: &SlotAxis,
) -> WeeklySchedule {
    let task_index: HashMap<&str, &Task> = tasks.iter().map(|task| (task.id.as_str(), task)).collect();
    let mut ordered_tasks: Vec<&Task> = tasks.iter().collect();
    ordered_tasks.sort_by(|left, right| left.id.cmp(&right.id));

    let days = (0..DAYS_PER_WEEK)
        .map(|offset| {
            let date = week_start + Duration::days(offset as i64);
            compose_day(&ordered_tasks, &task_index, records, date, axis)
        })
        .collect();

    WeeklySchedule { week_start, days }
}

fn compose_day(
    ordered_tasks: &[&Task],
    task_index: &HashMap<&str, &Task>,
    records: &[ScheduleRecord],
    date: NaiveDate,
    axis: &SlotAxis,
) -> DailySchedule {
    let mut day_records: Vec<&ScheduleRecord> = records
        .iter()
        .filter(|record| record.date == date)
        .collect();
    day_records.sort_by(|left, right| left.id.cmp(&right.id));

    let mut occupied: HashSet<usize> = HashSet::new();
    let mut occurrences: Vec<ScheduledTask> = Vec::new();
    let mut tasks_with_records: HashSet<&str> = HashSet::new();

    // Explicit records claim their slots first and suppress the owning
    // task's default placement for the day, conflicting or not.
    for record in &day_records {
        tasks_with_records.insert(record.task_id.as_str());

        let covered = axis.covering(record.start_time, record.end_time);
        if covered.iter().any(|index| occupied.contains(index)) {
            // Two explicit records on one slot is stale data; the first by
            // record id ordering is surfaced and the rest dropped.
            continue;
        }
        occupied.extend(covered);
        occurrences.push(occurrence_from_record(
            record,
            task_index.get(record.task_id.as_str()).copied(),
        ));
    }

    // Fixed-time recurring tasks fill in around the explicit records.
    for task in ordered_tasks {
        let Some((start, end)) = task.fixed_slot() else {
            continue;
        };
        if !task.applies_on(date) || tasks_with_records.contains(task.id.as_str()) {
            continue;
        }

        let covered = axis.covering(start, end);
        if covered.iter().any(|index| occupied.contains(index)) {
            continue;
        }
        let slot_index = covered
            .first()
            .copied()
            .unwrap_or_else(|| start.hour() as usize);
        occupied.extend(covered);
        occurrences.push(occurrence_from_task(
            task,
            synthetic_record_id(&task.id, date, slot_index),
            start,
            end,
        ));
    }

    // Remaining applicable untimed tasks take the first free slot each.
    for task in ordered_tasks {
        if !task.is_untimed() || tasks_with_records.contains(task.id.as_str()) {
            continue;
        }
        let Some(occurrence) = allocate(task, date, axis, &occupied) else {
            continue;
        };
        occupied.extend(axis.covering(occurrence.start_time, occurrence.end_time));
        occurrences.push(occurrence);
    }

    occurrences.sort_by(|left, right| {
        left.start_time
            .cmp(&right.start_time)
            .then_with(|| left.record_id.cmp(&right.record_id))
    });

    DailySchedule { date, occurrences }
}

fn occurrence_from_task(
    task: &Task,
    record_id: String,
    start: NaiveTime,
    end: NaiveTime,
) -> ScheduledTask {
    ScheduledTask {
        task_id: task.id.clone(),
        record_id,
        title: task.title.clone(),
        theme_color: task.theme_color.clone(),
        start_time: start,
        end_time: end,
        is_completed: task.is_completed,
        task_type: task.kind,
    }
}

fn occurrence_from_record(record: &ScheduleRecord, task: Option<&Task>) -> ScheduledTask {
    match task {
        Some(task) => ScheduledTask {
            task_id: task.id.clone(),
            record_id: record.id.clone(),
            title: task.title.clone(),
            theme_color: task.theme_color.clone(),
            start_time: record.start_time,
            end_time: record.end_time,
            is_completed: record.is_completed.unwrap_or(task.is_completed),
            task_type: task.kind,
        },
        // The task may have been deleted after the record was made; the
        // occurrence still renders from what the record carries.
        None => ScheduledTask {
            task_id: record.task_id.clone(),
            record_id: record.id.clone(),
            title: record.task_id.clone(),
            theme_color: UNRESOLVED_TASK_COLOR.to_string(),
            start_time: record.start_time,
            end_time: record.end_time,
            is_completed: record.is_completed.unwrap_or(false),
            task_type: TaskKind::Regular,
        },
    }
}
