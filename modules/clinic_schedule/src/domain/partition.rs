//! Slot partitioner: splits a wall-clock window into equal, contiguous slots.
//!
//! `partition` never fails. Anything that cannot produce a slot (bad times,
//! non-positive duration, empty or inverted window) yields an empty list, so
//! it is safe to call on half-typed input for a live preview.
//! `validate_window` explains why a window was declined.

use thiserror::Error;

use crate::contract::model::{Actor, SlotBatch, SlotInterval};
use crate::contract::time::{ParseWallTimeError, WallTime};
use crate::domain::repo::NewTimeSlot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("start time: {0}")]
    Start(ParseWallTimeError),

    #[error("end time: {0}")]
    End(ParseWallTimeError),

    #[error("duration must be a positive number of minutes, got {0}")]
    NonPositiveDuration(i64),

    #[error("start time {start} must be before end time {end}")]
    EmptyRange { start: WallTime, end: WallTime },
}

/// Partition `[start_time, end_time)` into slots of `duration_minutes`.
///
/// The remainder shorter than `duration_minutes` at the end of the window is dropped.
pub fn partition(start_time: &str, end_time: &str, duration_minutes: i64) -> Vec<SlotInterval> {
    match (start_time.parse::<WallTime>(), end_time.parse::<WallTime>()) {
        (Ok(start), Ok(end)) => partition_window(start, end, duration_minutes),
        _ => Vec::new(),
    }
}

/// Typed form of [`partition`].
pub fn partition_window(start: WallTime, end: WallTime, duration_minutes: i64) -> Vec<SlotInterval> {
    if duration_minutes <= 0 || start >= end {
        return Vec::new();
    }

    let span = start.minutes_until(end);
    if duration_minutes > span {
        return Vec::new();
    }

    // From here the step is at most one day, so cursor arithmetic cannot overflow.
    let count = span / duration_minutes;
    let mut slots = Vec::with_capacity(count as usize);
    let mut from = start;

    for _ in 0..count {
        let Some(to) = WallTime::from_minutes(from.minutes_since_midnight() + duration_minutes)
        else {
            debug_assert!(false, "slot end past {end}");
            break;
        };
        slots.push(SlotInterval { start: from, end: to });
        from = to;
    }

    slots
}

/// Check a window and explain why it cannot be partitioned.
///
/// Succeeding does not guarantee a non-empty partition: a window shorter than
/// `duration_minutes` passes validation and still yields no slots.
pub fn validate_window(
    start_time: &str,
    end_time: &str,
    duration_minutes: i64,
) -> Result<(WallTime, WallTime), PartitionError> {
    let start = start_time
        .parse::<WallTime>()
        .map_err(PartitionError::Start)?;
    let end = end_time.parse::<WallTime>().map_err(PartitionError::End)?;

    if duration_minutes <= 0 {
        return Err(PartitionError::NonPositiveDuration(duration_minutes));
    }
    if start >= end {
        return Err(PartitionError::EmptyRange { start, end });
    }

    Ok((start, end))
}

/// One storable candidate per interval of the batch window, all available.
pub fn build_candidates(batch: &SlotBatch, actor: &Actor) -> Vec<NewTimeSlot> {
    partition(&batch.start_time, &batch.end_time, batch.duration)
        .into_iter()
        .map(|interval| NewTimeSlot {
            doctor_id: actor.doctor_id.clone(),
            doctor_name: actor.doctor_name.clone(),
            date: batch.date,
            start_time: interval.start,
            end_time: interval.end,
            duration: interval.length_minutes() as u32,
            is_available: true,
        })
        .collect()
}
