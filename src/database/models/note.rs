use diesel::result::DatabaseErrorKind;
use diesel::{ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::database::schema::{block, note};
use crate::error::Error;

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Clone, Debug)]
#[diesel(table_name = note)]
pub struct Note {
    id: Uuid,
    pub issue_id: Uuid,
    pub block_id: Uuid,
    pub text: String,
    hashed_password: String,
}

impl Note {
    pub fn new(issue_id: Uuid, block_id: Uuid, text: String, hashed_password: String) -> Note {
        Note {
            id: Uuid::new_v4(),
            issue_id,
            block_id,
            text,
            hashed_password,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn hashed_password(&self) -> &str {
        self.hashed_password.as_ref()
    }

    /// Inserts the note. Each block may submit at most one note per issue;
    /// a second submission trips the unique constraint and surfaces as
    /// [`Error::DuplicateNote`] so the caller can tell the block it already
    /// submitted.
    pub fn insert(&self, conn: &mut PgConnection) -> Result<Self, Error> {
        diesel::insert_into(note::table)
            .values(self)
            .get_result(conn)
            .map_err(|why| map_insert_error(why, self.issue_id, self.block_id))
    }

    /// Replace the note's text. The (issue, block) pair never changes.
    pub fn set_text(&mut self, conn: &mut PgConnection, new_text: String) -> Result<Self, Error> {
        self.text = new_text;

        Ok(diesel::update(&*self).set(&*self).get_result(conn)?)
    }

    pub fn find_by_id(conn: &mut PgConnection, find_id: impl Into<Uuid>) -> Result<Self, Error> {
        use crate::database::schema::note::dsl::*;

        let uuid = find_id.into();

        Ok(note.find(uuid).get_result(conn)?)
    }

    pub fn find_for_issue_and_block(
        conn: &mut PgConnection,
        issue: Uuid,
        block: Uuid,
    ) -> Result<Option<Self>, Error> {
        Ok(note::table
            .filter(note::issue_id.eq(issue))
            .filter(note::block_id.eq(block))
            .first(conn)
            .optional()?)
    }

    /// Notes for one issue, ordered by the submitting block's name.
    pub fn for_issue(conn: &mut PgConnection, issue: Uuid) -> Result<Vec<Self>, Error> {
        Ok(note::table
            .inner_join(block::table)
            .filter(note::issue_id.eq(issue))
            .order(block::name.asc())
            .select(note::all_columns)
            .load(conn)?)
    }
}

/// A unique violation on insert means the (issue, block) pair is already
/// covered; anything else passes through unchanged.
fn map_insert_error(error: diesel::result::Error, issue_id: Uuid, block_id: Uuid) -> Error {
    match error {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            warn!(
                "Block {} already submitted a note for issue {}",
                block_id, issue_id
            );
            Error::DuplicateNote { issue_id, block_id }
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_violation() -> diesel::result::Error {
        diesel::result::Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        )
    }

    #[test]
    fn second_submission_surfaces_as_duplicate_note() {
        let issue = Uuid::new_v4();
        let block = Uuid::new_v4();

        match map_insert_error(unique_violation(), issue, block) {
            Error::DuplicateNote { issue_id, block_id } => {
                assert_eq!(issue_id, issue);
                assert_eq!(block_id, block);
            }
            other => panic!("expected DuplicateNote, got {:?}", other),
        }
    }

    #[test]
    fn other_insert_errors_pass_through() {
        let error = map_insert_error(
            diesel::result::Error::NotFound,
            Uuid::new_v4(),
            Uuid::new_v4(),
        );

        match error {
            Error::DieselError {
                source: diesel::result::Error::NotFound,
            } => {}
            other => panic!("expected a diesel error, got {:?}", other),
        }
    }
}
