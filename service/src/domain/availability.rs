//! Availability of [`Room`]s for [`Reservation`]s.
//!
//! All the checks here are day-granular: a [`Reservation`] occupies every
//! UTC calendar day from its start day to its end day, both inclusive, so a
//! [`Reservation`] ending on some day conflicts with another one starting on
//! the same day.
//!
//! Nothing here reads the clock: the current day is always passed in.
//!
//! [`Room`]: crate::domain::Room

use std::{collections::BTreeSet, iter::FusedIterator};

use common::Date;
use derive_more::{Display, Error};

use crate::domain::{
    reservation::{self, Status},
    Reservation,
};

/// Number of days after today a [`Reservation`] may still touch.
pub const BOOKING_HORIZON_DAYS: i64 = 14;

/// Returns the inclusive sequence of days from `start` to `end`.
///
/// The sequence is empty if `start` is later than `end`.
#[must_use]
pub fn occupied_days(start: Date, end: Date) -> OccupiedDays {
    OccupiedDays {
        next: (start <= end).then_some(start),
        last: end,
    }
}

/// Inclusive sequence of days occupied by a [`Reservation`].
///
/// Being [`Clone`], the sequence may be restarted from any point by cloning.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OccupiedDays {
    /// Next day to yield, if any.
    next: Option<Date>,

    /// Last day to yield.
    last: Date,
}

impl Iterator for OccupiedDays {
    type Item = Date;

    fn next(&mut self) -> Option<Self::Item> {
        let day = self.next?;
        self.next = day.next_day().filter(|d| *d <= self.last);
        Some(day)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.next.map_or(0, |d| {
            usize::try_from(d.days_until(self.last) + 1).unwrap_or(usize::MAX)
        });
        (len, Some(len))
    }
}

impl ExactSizeIterator for OccupiedDays {}

impl FusedIterator for OccupiedDays {}

/// Returns all the days held by the provided [`Reservation`]s of a single
/// room.
///
/// Only [`Reservation`]s in a [holding](Status::is_holding) [`Status`] are
/// counted, and the `exclude`d one is skipped.
#[must_use]
pub fn room_occupied_days<'r>(
    reservations: impl IntoIterator<Item = &'r Reservation>,
    exclude: Option<reservation::Id>,
) -> BTreeSet<Date> {
    reservations
        .into_iter()
        .filter(|r| r.is_holding() && Some(r.id) != exclude)
        .flat_map(|r| occupied_days(r.starts_on(), r.ends_on()))
        .collect()
}

/// Returns the days of the `start..=end` range already held by the provided
/// [`Reservation`]s of a single room.
///
/// An empty result means the range is free.
#[must_use]
pub fn check_conflict<'r>(
    reservations: impl IntoIterator<Item = &'r Reservation>,
    start: Date,
    end: Date,
    exclude: Option<reservation::Id>,
) -> BTreeSet<Date> {
    let occupied = room_occupied_days(reservations, exclude);
    occupied_days(start, end)
        .filter(|d| occupied.contains(d))
        .collect()
}

/// Checks whether the `start..=end` range may be booked on the `today` day.
///
/// # Errors
///
/// - [`DateRangeError::InPast`] if any of the dates precedes `today`;
/// - [`DateRangeError::TooFar`] if any of the dates goes later than
///   [`BOOKING_HORIZON_DAYS`] after `today`;
/// - [`DateRangeError::Inverted`] if `start` is later than `end`.
pub fn validate_date_range(
    start: Date,
    end: Date,
    today: Date,
) -> Result<(), DateRangeError> {
    for date in [start, end] {
        let offset = today.days_until(date);
        if offset < 0 {
            return Err(DateRangeError::InPast(date));
        }
        if offset > BOOKING_HORIZON_DAYS {
            return Err(DateRangeError::TooFar(date));
        }
    }
    if start > end {
        return Err(DateRangeError::Inverted { start, end });
    }
    Ok(())
}

/// Error of booking a range of days.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum DateRangeError {
    /// Date precedes the current day.
    #[display("`{_0}` is in the past")]
    InPast(#[error(not(source))] Date),

    /// Date goes beyond the booking horizon.
    #[display("`{_0}` is beyond the booking horizon")]
    TooFar(#[error(not(source))] Date),

    /// Start date goes after the end date.
    #[display("start `{start}` goes after end `{end}`")]
    Inverted {
        /// Start of the range.
        start: Date,

        /// End of the range.
        end: Date,
    },
}

impl DateRangeError {
    /// Indicates whether this error is caused by a date lying outside the
    /// booking window, rather than by a malformed range.
    #[must_use]
    pub const fn is_out_of_window(&self) -> bool {
        matches!(self, Self::InPast(_) | Self::TooFar(_))
    }
}

/// Returns the [`Status`] the provided [`Reservation`] should have on the
/// `today` day, or [`None`] if its current [`Status`] is up to date.
///
/// A [`Status::Booked`] reservation becomes [`Status::Active`] once its start
/// day comes, and a [`Status::Active`] one becomes [`Status::Expired`] once
/// its end day passes. Both steps may happen at once for a reservation that
/// has been missed for a while. Terminal statuses never change.
#[must_use]
pub fn advance_status(
    reservation: &Reservation,
    today: Date,
) -> Option<Status> {
    let mut status = reservation.status;
    if status == Status::Booked && reservation.starts_on() <= today {
        status = Status::Active;
    }
    if status == Status::Active && reservation.ends_on() < today {
        status = Status::Expired;
    }
    (status != reservation.status).then_some(status)
}

#[cfg(test)]
mod spec {
    use std::collections::BTreeSet;

    use common::{Date, DateTime};

    use crate::domain::{
        reservation::{self, Status},
        room, user, Reservation,
    };

    use super::{
        advance_status, check_conflict, occupied_days, room_occupied_days,
        validate_date_range, DateRangeError,
    };

    fn day(n: i64) -> Date {
        Date::from_ymd(2024, 5, 1).unwrap().checked_add_days(n).unwrap()
    }

    fn reservation(start: i64, end: i64, status: Status) -> Reservation {
        Reservation {
            id: reservation::Id::new(),
            room_id: room::Id::new(),
            user_id: user::Id::new(),
            starts_at: DateTime::at_midnight(day(start)).coerce(),
            ends_at: DateTime::at_midnight(day(end)).coerce(),
            status,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    fn days(range: impl IntoIterator<Item = i64>) -> BTreeSet<Date> {
        range.into_iter().map(day).collect()
    }

    #[test]
    fn occupied_days_are_inclusive() {
        assert_eq!(occupied_days(day(0), day(3)).collect::<Vec<_>>(), [
            day(0),
            day(1),
            day(2),
            day(3),
        ]);
        assert_eq!(occupied_days(day(2), day(2)).count(), 1);
        assert_eq!(occupied_days(day(3), day(2)).count(), 0);
    }

    #[test]
    fn occupied_days_count_matches_span() {
        for (start, end) in [(0, 0), (0, 1), (0, 13), (5, 40), (-3, 3)] {
            let seq = occupied_days(day(start), day(end));
            let expected = usize::try_from(end - start + 1).unwrap();

            assert_eq!(seq.len(), expected);
            assert_eq!(seq.count(), expected);
        }
    }

    #[test]
    fn occupied_days_cross_month_boundary() {
        let start = Date::from_ymd(2024, 2, 28).unwrap();
        let end = Date::from_ymd(2024, 3, 1).unwrap();

        assert_eq!(
            occupied_days(start, end)
                .map(|d| d.to_string())
                .collect::<Vec<_>>(),
            ["2024-02-28", "2024-02-29", "2024-03-01"],
        );
    }

    #[test]
    fn occupied_days_restart() {
        let seq = occupied_days(day(0), day(2));
        let mut partial = seq.clone();
        _ = partial.next();

        assert_eq!(seq.collect::<Vec<_>>(), [day(0), day(1), day(2)]);
        assert_eq!(partial.clone().collect::<Vec<_>>(), [day(1), day(2)]);
        assert_eq!(partial.collect::<Vec<_>>(), [day(1), day(2)]);
    }

    #[test]
    fn room_occupied_days_skip_released_and_excluded() {
        let booked = reservation(0, 1, Status::Booked);
        let active = reservation(3, 4, Status::Active);
        let refused = reservation(6, 7, Status::Refused);
        let expired = reservation(9, 9, Status::Expired);
        let all = [booked.clone(), active.clone(), refused, expired];

        assert_eq!(room_occupied_days(&all, None), days([0, 1, 3, 4]));
        assert_eq!(room_occupied_days(&all, Some(booked.id)), days([3, 4]));
        assert_eq!(room_occupied_days(&all, Some(active.id)), days([0, 1]));
    }

    #[test]
    fn room_occupied_days_merge_overlaps() {
        let all = [
            reservation(0, 3, Status::Booked),
            reservation(2, 5, Status::Active),
        ];

        assert_eq!(room_occupied_days(&all, None), days(0..=5));
    }

    #[test]
    fn no_conflict_on_empty_room() {
        let none: [Reservation; 0] = [];

        assert!(check_conflict(&none, day(0), day(3), None).is_empty());
    }

    #[test]
    fn conflicts_on_shared_boundary_day() {
        let all = [reservation(0, 3, Status::Booked)];

        assert_eq!(check_conflict(&all, day(3), day(5), None), days([3]));
        assert!(check_conflict(&all, day(4), day(5), None).is_empty());
    }

    #[test]
    fn conflict_is_symmetric() {
        let a = reservation(2, 6, Status::Booked);
        let b = reservation(5, 9, Status::Booked);

        assert_eq!(
            check_conflict([&a], b.starts_on(), b.ends_on(), None),
            check_conflict([&b], a.starts_on(), a.ends_on(), None),
        );
        assert_eq!(
            check_conflict([&a], b.starts_on(), b.ends_on(), None),
            days([5, 6]),
        );
    }

    #[test]
    fn refused_reservation_does_not_block() {
        let all = [reservation(0, 3, Status::Refused)];

        assert!(check_conflict(&all, day(0), day(3), None).is_empty());
    }

    #[test]
    fn update_excludes_own_days() {
        let own = reservation(0, 3, Status::Booked);
        let other = reservation(6, 8, Status::Booked);
        let all = [own.clone(), other];

        assert!(check_conflict(&all, day(1), day(4), Some(own.id)).is_empty());
        assert_eq!(
            check_conflict(&all, day(1), day(6), Some(own.id)),
            days([6]),
        );
        assert_eq!(check_conflict(&all, day(1), day(4), None), days(1..=3));
    }

    #[test]
    fn accepts_range_within_window() {
        let today = day(0);

        assert_eq!(validate_date_range(day(0), day(0), today), Ok(()));
        assert_eq!(validate_date_range(day(0), day(14), today), Ok(()));
        assert_eq!(validate_date_range(day(14), day(14), today), Ok(()));
    }

    #[test]
    fn rejects_range_out_of_window() {
        let today = day(0);

        assert_eq!(
            validate_date_range(day(20), day(21), today),
            Err(DateRangeError::TooFar(day(20))),
        );
        assert_eq!(
            validate_date_range(day(1), day(15), today),
            Err(DateRangeError::TooFar(day(15))),
        );
        assert_eq!(
            validate_date_range(day(-1), day(2), today),
            Err(DateRangeError::InPast(day(-1))),
        );
        assert!(validate_date_range(day(20), day(21), today)
            .unwrap_err()
            .is_out_of_window());
    }

    #[test]
    fn rejects_inverted_range() {
        let err = validate_date_range(day(5), day(4), day(0)).unwrap_err();

        assert_eq!(
            err,
            DateRangeError::Inverted {
                start: day(5),
                end: day(4),
            },
        );
        assert!(!err.is_out_of_window());
    }

    #[test]
    fn activates_on_start_day() {
        let mut r = reservation(0, 2, Status::Booked);

        assert_eq!(advance_status(&r, day(-1)), None);
        assert_eq!(advance_status(&r, day(0)), Some(Status::Active));

        r.status = Status::Active;
        assert_eq!(advance_status(&r, day(0)), None);
    }

    #[test]
    fn expires_after_end_day() {
        let r = reservation(0, 2, Status::Active);

        assert_eq!(advance_status(&r, day(2)), None);
        assert_eq!(advance_status(&r, day(3)), Some(Status::Expired));
    }

    #[test]
    fn catches_up_missed_days() {
        let r = reservation(0, 2, Status::Booked);

        assert_eq!(advance_status(&r, day(1)), Some(Status::Active));
        assert_eq!(advance_status(&r, day(5)), Some(Status::Expired));
    }

    #[test]
    fn never_leaves_terminal_status() {
        for status in [Status::Refused, Status::Expired] {
            let r = reservation(0, 2, status);

            for today in -3..6 {
                assert_eq!(advance_status(&r, day(today)), None);
            }
        }
    }

    #[test]
    fn advancing_is_idempotent_and_monotonic() {
        let mut all = [
            reservation(0, 0, Status::Booked),
            reservation(-4, -2, Status::Active),
            reservation(-1, 3, Status::Booked),
            reservation(2, 4, Status::Booked),
            reservation(-5, 5, Status::Refused),
        ];
        let today = day(0);

        let mut transitions = 0;
        for _ in 0..2 {
            for r in &mut all {
                if let Some(to) = advance_status(r, today) {
                    assert!(to.u8() > r.status.u8());
                    r.status = to;
                    transitions += 1;
                }
            }
        }

        assert_eq!(transitions, 3);
        assert_eq!(
            all.iter().map(|r| r.status).collect::<Vec<_>>(),
            [
                Status::Active,
                Status::Expired,
                Status::Active,
                Status::Booked,
                Status::Refused,
            ],
        );
    }
}
