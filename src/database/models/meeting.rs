use std::fmt::{Display, Formatter};

use chrono::{NaiveDate, NaiveDateTime};
use diesel::{ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::database::schema::meeting;
use crate::error::Error;
use crate::windows;

/// Meetings dated before this were imported from the previous document
/// system and carry legacy formatting.
pub const OLD_SYSTEM_CUTOVER: NaiveDate = match NaiveDate::from_ymd_opt(2015, 9, 30) {
    Some(date) => date,
    None => panic!("invalid cutover date"),
};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Clone, Debug, PartialEq)]
#[diesel(table_name = meeting)]
pub struct Meeting {
    id: Uuid,
    pub meeting_date: NaiveDate,
}

impl Meeting {
    pub fn new(meeting_date: NaiveDate) -> Meeting {
        Meeting {
            id: Uuid::new_v4(),
            meeting_date,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn insert(&self, conn: &mut PgConnection) -> Result<Self, Error> {
        Ok(diesel::insert_into(meeting::table)
            .values(self)
            .get_result(conn)?)
    }

    pub fn find_by_id(conn: &mut PgConnection, find_id: impl Into<Uuid>) -> Result<Self, Error> {
        use crate::database::schema::meeting::dsl::*;

        let uuid = find_id.into();

        Ok(meeting.find(uuid).get_result(conn)?)
    }

    pub fn find_by_date(
        conn: &mut PgConnection,
        date: NaiveDate,
    ) -> Result<Option<Self>, Error> {
        use crate::database::schema::meeting::dsl::*;

        Ok(meeting
            .filter(meeting_date.eq(date))
            .first(conn)
            .optional()?)
    }

    /// All meetings, newest first.
    pub fn list(conn: &mut PgConnection) -> Result<Vec<Self>, Error> {
        use crate::database::schema::meeting::dsl::*;

        Ok(meeting.order(meeting_date.desc()).load(conn)?)
    }

    /// Meetings still accepting new issues, earliest first.
    pub fn normal_targets(
        conn: &mut PgConnection,
        now: NaiveDateTime,
    ) -> Result<Vec<Self>, Error> {
        use crate::database::schema::meeting::dsl::*;

        Ok(meeting
            .filter(meeting_date.ge(windows::normal_from(now)))
            .order(meeting_date.asc())
            .load(conn)?)
    }

    /// The meeting new issues attach to by default.
    pub fn normal_target(
        conn: &mut PgConnection,
        now: NaiveDateTime,
    ) -> Result<Option<Self>, Error> {
        use crate::database::schema::meeting::dsl::*;

        Ok(meeting
            .filter(meeting_date.ge(windows::normal_from(now)))
            .order(meeting_date.asc())
            .first(conn)
            .optional()?)
    }

    pub fn exists_normal(conn: &mut PgConnection, now: NaiveDateTime) -> Result<bool, Error> {
        use crate::database::schema::meeting::dsl::*;

        let count: i64 = meeting
            .filter(meeting_date.ge(windows::normal_from(now)))
            .count()
            .get_result(conn)?;

        Ok(count > 0)
    }

    /// Meetings open for late additions.
    pub fn append_targets(
        conn: &mut PgConnection,
        now: NaiveDateTime,
    ) -> Result<Vec<Self>, Error> {
        use crate::database::schema::meeting::dsl::*;

        Ok(meeting
            .filter(meeting_date.eq_any(windows::append_dates(now)))
            .order(meeting_date.asc())
            .load(conn)?)
    }

    pub fn exists_append(conn: &mut PgConnection, now: NaiveDateTime) -> Result<bool, Error> {
        use crate::database::schema::meeting::dsl::*;

        let count: i64 = meeting
            .filter(meeting_date.eq_any(windows::append_dates(now)))
            .count()
            .get_result(conn)?;

        Ok(count > 0)
    }

    /// Meetings tables may be posted to: the normal window when it has any
    /// meeting, otherwise the append window.
    pub fn posting_table_targets(
        conn: &mut PgConnection,
        now: NaiveDateTime,
    ) -> Result<Vec<Self>, Error> {
        let normal = Self::normal_targets(conn, now)?;

        if normal.is_empty() {
            debug!("Normal window empty, falling back to append window");
            Self::append_targets(conn, now)
        } else {
            Ok(normal)
        }
    }

    /// The meeting whose issues are currently open for minute-taking.
    ///
    /// At most one meeting matches since meeting dates are unique.
    pub fn posting_note_target(
        conn: &mut PgConnection,
        now: NaiveDateTime,
    ) -> Result<Option<Self>, Error> {
        Self::find_by_date(conn, windows::posting_note_date(now))
    }

    pub fn exists_posting_note_target(
        conn: &mut PgConnection,
        now: NaiveDateTime,
    ) -> Result<bool, Error> {
        Ok(Self::posting_note_target(conn, now)?.is_some())
    }

    /// Meetings whose issue ordering may still be edited, earliest first.
    pub fn rearrange_targets(
        conn: &mut PgConnection,
        now: NaiveDateTime,
    ) -> Result<Vec<Self>, Error> {
        use crate::database::schema::meeting::dsl::*;

        Ok(meeting
            .filter(meeting_date.ge(windows::rearrange_from(now)))
            .order(meeting_date.asc())
            .load(conn)?)
    }

    /// Past meetings whose notes are available for download, newest first.
    pub fn download_targets(
        conn: &mut PgConnection,
        now: NaiveDateTime,
    ) -> Result<Vec<Self>, Error> {
        use crate::database::schema::meeting::dsl::*;

        Ok(meeting
            .filter(meeting_date.le(windows::download_until(now)))
            .order(meeting_date.desc())
            .load(conn)?)
    }

    pub fn has_issue(&self, conn: &mut PgConnection) -> Result<bool, Error> {
        use crate::database::schema::issue::dsl::*;

        let count: i64 = issue
            .filter(meeting_id.eq(self.id))
            .count()
            .get_result(conn)?;

        Ok(count > 0)
    }

    pub fn is_migrated_from_old_system(&self) -> bool {
        self.meeting_date < OLD_SYSTEM_CUTOVER
    }
}

impl Display for Meeting {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.meeting_date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meetings_before_the_cutover_are_migrated() {
        let date = NaiveDate::from_ymd_opt(2015, 9, 29).unwrap();
        assert!(Meeting::new(date).is_migrated_from_old_system());
    }

    #[test]
    fn meetings_on_or_after_the_cutover_are_not_migrated() {
        let on_cutover = NaiveDate::from_ymd_opt(2015, 9, 30).unwrap();
        assert!(!Meeting::new(on_cutover).is_migrated_from_old_system());

        let later = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(!Meeting::new(later).is_migrated_from_old_system());
    }

    #[test]
    fn displays_as_iso_date() {
        let meeting = Meeting::new(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        assert_eq!(meeting.to_string(), "2024-05-10");
    }
}
