use std::fmt::{Display, Formatter};

use chrono::NaiveDateTime;
use diesel::{ExpressionMethods, PgConnection, QueryDsl, RunQueryDsl};
use uuid::Uuid;

use crate::database::models::issue::Issue;
use crate::database::models::meeting::Meeting;
use crate::database::schema::{block, note};
use crate::error::Error;

#[derive(Queryable, Identifiable, Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = block)]
pub struct Block {
    id: Uuid,
    pub name: String,
}

impl Block {
    pub fn new(name: String) -> Block {
        Block {
            id: Uuid::new_v4(),
            name,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn insert(&self, conn: &mut PgConnection) -> Result<Self, Error> {
        Ok(diesel::insert_into(block::table)
            .values(self)
            .get_result(conn)?)
    }

    pub fn all(conn: &mut PgConnection) -> Result<Vec<Self>, Error> {
        use crate::database::schema::block::dsl::*;

        Ok(block.order(name.asc()).load(conn)?)
    }

    pub fn find_by_id(conn: &mut PgConnection, find_id: impl Into<Uuid>) -> Result<Self, Error> {
        use crate::database::schema::block::dsl::*;

        let uuid = find_id.into();

        Ok(block.find(uuid).get_result(conn)?)
    }

    /// Blocks that already submitted a note for the current issue of the
    /// meeting in the posting-note window.
    ///
    /// "Current issue" is the meeting's first issue in agenda order. Empty
    /// when no meeting is in the window or it has no issues yet. Uniqueness
    /// of (issue, block) means no block appears twice.
    pub fn posted_note_blocks(
        conn: &mut PgConnection,
        now: NaiveDateTime,
    ) -> Result<Vec<Self>, Error> {
        let Some(meeting) = Meeting::posting_note_target(conn, now)? else {
            return Ok(Vec::new());
        };

        let Some(issue) = Issue::first_of_meeting(conn, &meeting)? else {
            return Ok(Vec::new());
        };

        Ok(block::table
            .inner_join(note::table)
            .filter(note::issue_id.eq(issue.id()))
            .order(block::name.asc())
            .select(block::all_columns)
            .load(conn)?)
    }

    pub fn exists_posted_note_blocks(
        conn: &mut PgConnection,
        now: NaiveDateTime,
    ) -> Result<bool, Error> {
        Ok(!Self::posted_note_blocks(conn, now)?.is_empty())
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
