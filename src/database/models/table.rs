use std::fmt::{Display, Formatter};

use diesel::{ExpressionMethods, PgConnection, QueryDsl, RunQueryDsl};
use uuid::Uuid;

use crate::database::schema::issue_table;
use crate::error::Error;

/// A CSV-like table attached to an issue. The stored text is tab-delimited
/// fields on newline-separated rows, with no escaping; embedded tabs or
/// newlines cannot be represented. Kept as-is for compatibility with
/// existing data.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Clone, Debug)]
#[diesel(table_name = issue_table)]
pub struct Table {
    id: Uuid,
    pub issue_id: Uuid,
    pub caption: String,
    pub csv_text: String,
    pub table_order: i32,
}

impl Table {
    pub fn new(issue_id: Uuid, caption: String, csv_text: String, table_order: i32) -> Table {
        Table {
            id: Uuid::new_v4(),
            issue_id,
            caption,
            csv_text,
            table_order,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn insert(&self, conn: &mut PgConnection) -> Result<Self, Error> {
        Ok(diesel::insert_into(issue_table::table)
            .values(self)
            .get_result(conn)?)
    }

    pub fn update(&self, conn: &mut PgConnection) -> Result<Self, Error> {
        Ok(diesel::update(self).set(self).get_result(conn)?)
    }

    pub fn find_by_id(conn: &mut PgConnection, find_id: impl Into<Uuid>) -> Result<Self, Error> {
        use crate::database::schema::issue_table::dsl::*;

        let uuid = find_id.into();

        Ok(issue_table.find(uuid).get_result(conn)?)
    }

    /// Tables of one issue in display order.
    pub fn for_issue(conn: &mut PgConnection, issue: Uuid) -> Result<Vec<Self>, Error> {
        Ok(issue_table::table
            .filter(issue_table::issue_id.eq(issue))
            .order(issue_table::table_order.asc())
            .load(conn)?)
    }

    /// Parses the stored text into rows of fields. Re-parses from the stored
    /// string on every call. Ragged rows pass through unvalidated; an empty
    /// line yields an empty row.
    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.csv_text.split('\n').map(|line| {
            if line.is_empty() {
                Vec::new()
            } else {
                line.split('\t').map(str::to_string).collect()
            }
        })
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.caption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str) -> Table {
        Table::new(Uuid::new_v4(), "caption".to_string(), text.to_string(), 1)
    }

    #[test]
    fn splits_rows_on_newlines_and_fields_on_tabs() {
        let rows: Vec<Vec<String>> = table("a\tb\nc\td\te").rows().collect();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d", "e"]]);
    }

    #[test]
    fn ragged_rows_pass_through() {
        let rows: Vec<Vec<String>> = table("a\nb\tc\td").rows().collect();
        assert_eq!(rows, vec![vec!["a"], vec!["b", "c", "d"]]);
    }

    #[test]
    fn empty_lines_become_empty_rows() {
        let rows: Vec<Vec<String>> = table("a\tb\n\nc").rows().collect();
        assert_eq!(rows, vec![vec!["a".to_string(), "b".to_string()], vec![], vec!["c".to_string()]]);
    }

    #[test]
    fn rows_are_restartable() {
        let t = table("a\tb");
        assert_eq!(t.rows().count(), 1);
        assert_eq!(t.rows().count(), 1);
    }

    #[test]
    fn fields_keep_stray_whitespace() {
        let rows: Vec<Vec<String>> = table(" a \tb").rows().collect();
        assert_eq!(rows, vec![vec![" a ", "b"]]);
    }
}
