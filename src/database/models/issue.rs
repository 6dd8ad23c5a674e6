use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use chrono::{NaiveDate, NaiveDateTime};
use diesel::{ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl};
use uuid::Uuid;

use crate::database::models::meeting::Meeting;
use crate::database::models::note::Note;
use crate::database::models::table::Table;
use crate::database::schema::{issue, issue_issue_types, issue_type};
use crate::error::Error;
use crate::windows;

/// Order value marking an issue as "additional": appended after the
/// regularly numbered agenda, not yet assigned a slot.
pub const ADDITIONAL_ISSUE_ORDER: i32 = -1;

/// Name of the seeded issue type marking an issue as put to a vote.
pub const VOTE_TYPE_NAME: &str = "採決";

const ADDITIONAL_ISSUE_LABEL: &str = "追加議案";

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Clone, Debug)]
#[diesel(table_name = issue)]
pub struct Issue {
    id: Uuid,
    pub meeting_id: Uuid,
    pub title: String,
    pub author: String,
    pub body: String,
    pub vote_content: String,
    hashed_password: String,
    pub issue_order: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = issue_type)]
pub struct IssueType {
    id: Uuid,
    pub name: String,
}

#[derive(Associations, Queryable, Identifiable, Insertable, Clone, Debug)]
#[diesel(table_name = issue_issue_types)]
#[diesel(belongs_to(Issue))]
#[diesel(belongs_to(IssueType))]
pub struct IssueIssueType {
    id: Uuid,
    issue_id: Uuid,
    issue_type_id: Uuid,
}

impl Issue {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        meeting_id: Uuid,
        title: String,
        author: String,
        body: String,
        vote_content: String,
        hashed_password: String,
        now: NaiveDateTime,
    ) -> Issue {
        Issue {
            id: Uuid::new_v4(),
            meeting_id,
            title,
            author,
            body,
            vote_content,
            hashed_password,
            issue_order: ADDITIONAL_ISSUE_ORDER,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn hashed_password(&self) -> &str {
        self.hashed_password.as_ref()
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    pub fn insert(&self, conn: &mut PgConnection) -> Result<Self, Error> {
        Ok(diesel::insert_into(issue::table)
            .values(self)
            .get_result(conn)?)
    }

    pub fn update(&mut self, conn: &mut PgConnection, now: NaiveDateTime) -> Result<Self, Error> {
        self.updated_at = now;

        Ok(diesel::update(&*self).set(&*self).get_result(conn)?)
    }

    pub fn set_issue_order(
        &mut self,
        conn: &mut PgConnection,
        new_order: i32,
        now: NaiveDateTime,
    ) -> Result<Self, Error> {
        self.issue_order = new_order;

        self.update(conn, now)
    }

    pub fn find_by_id(conn: &mut PgConnection, find_id: impl Into<Uuid>) -> Result<Self, Error> {
        use crate::database::schema::issue::dsl::*;

        let uuid = find_id.into();

        Ok(issue.find(uuid).get_result(conn)?)
    }

    /// Issues of one meeting in agenda order. Additional issues (order -1)
    /// sort ahead of the numbered ones; ties break on creation time.
    pub fn for_meeting(conn: &mut PgConnection, meeting: Uuid) -> Result<Vec<Self>, Error> {
        Ok(issue::table
            .filter(issue::meeting_id.eq(meeting))
            .order((issue::issue_order.asc(), issue::created_at.asc()))
            .load(conn)?)
    }

    fn first_for_meeting(conn: &mut PgConnection, meeting: Uuid) -> Result<Option<Self>, Error> {
        Ok(issue::table
            .filter(issue::meeting_id.eq(meeting))
            .order((issue::issue_order.asc(), issue::created_at.asc()))
            .first(conn)
            .optional()?)
    }

    /// All issues, newest meeting first, agenda order within a meeting.
    pub fn list(conn: &mut PgConnection) -> Result<Vec<Self>, Error> {
        use crate::database::schema::meeting;

        Ok(issue::table
            .inner_join(meeting::table)
            .order((meeting::meeting_date.desc(), issue::issue_order.asc()))
            .select(issue::all_columns)
            .load(conn)?)
    }

    /// Issues whose meeting currently accepts table postings, grouped
    /// newest meeting first, agenda order within a meeting.
    pub fn posting_table_issues(
        conn: &mut PgConnection,
        now: NaiveDateTime,
    ) -> Result<Vec<Self>, Error> {
        let meetings = Meeting::posting_table_targets(conn, now)?;
        let meeting_ids: Vec<Uuid> = meetings.iter().map(Meeting::id).collect();

        let mut issues: Vec<Issue> = issue::table
            .filter(issue::meeting_id.eq_any(meeting_ids))
            .load(conn)?;

        let meeting_dates: HashMap<Uuid, NaiveDate> = meetings
            .iter()
            .map(|meeting| (meeting.id(), meeting.meeting_date))
            .collect();
        sort_agenda(&mut issues, &meeting_dates);

        Ok(issues)
    }

    /// Types assigned to this issue, ordered by name.
    pub fn issue_types(&self, conn: &mut PgConnection) -> Result<Vec<IssueType>, Error> {
        Ok(issue_issue_types::table
            .inner_join(issue_type::table)
            .filter(issue_issue_types::issue_id.eq(self.id))
            .order(issue_type::name.asc())
            .select(issue_type::all_columns)
            .load(conn)?)
    }

    pub fn add_issue_type(
        &self,
        conn: &mut PgConnection,
        kind: &IssueType,
    ) -> Result<(), Error> {
        let link = IssueIssueType {
            id: Uuid::new_v4(),
            issue_id: self.id,
            issue_type_id: kind.id,
        };

        diesel::insert_into(issue_issue_types::table)
            .values(&link)
            .execute(conn)?;

        Ok(())
    }

    /// Title for the general agenda view, e.g. `【3】Budget【Finance・Vote】`.
    pub fn qualified_title(&self, conn: &mut PgConnection) -> Result<String, Error> {
        let names = self.issue_type_names(conn)?;

        Ok(format_qualified_title(self.issue_order, &self.title, &names))
    }

    /// Title for the note-taking view, with its own `0 - ` numbering prefix.
    pub fn qualified_title_for_note(&self, conn: &mut PgConnection) -> Result<String, Error> {
        let names = self.issue_type_names(conn)?;

        Ok(format_qualified_title_for_note(
            self.issue_order,
            &self.title,
            &names,
        ))
    }

    /// Title with the type suffix but no order token.
    pub fn title_with_types(&self, conn: &mut PgConnection) -> Result<String, Error> {
        let names = self.issue_type_names(conn)?;

        Ok(format!("{}【{}】", self.title, names.join("・")))
    }

    fn issue_type_names(&self, conn: &mut PgConnection) -> Result<Vec<String>, Error> {
        Ok(self
            .issue_types(conn)?
            .into_iter()
            .map(|kind| kind.name)
            .collect())
    }

    /// Whether this issue is put to a vote.
    ///
    /// The vote type must be seeded; a missing vocabulary row is a data
    /// integrity error, not "not votable".
    pub fn is_votable(&self, conn: &mut PgConnection) -> Result<bool, Error> {
        let vote_type = IssueType::vote_type(conn)?;

        let count: i64 = issue_issue_types::table
            .filter(issue_issue_types::issue_id.eq(self.id))
            .filter(issue_issue_types::issue_type_id.eq(vote_type.id))
            .count()
            .get_result(conn)?;

        Ok(count > 0)
    }

    /// Notes submitted for this issue, ordered by block name.
    pub fn notes(&self, conn: &mut PgConnection) -> Result<Vec<Note>, Error> {
        Note::for_issue(conn, self.id)
    }

    /// Tables attached to this issue, in display order.
    pub fn tables(&self, conn: &mut PgConnection) -> Result<Vec<Table>, Error> {
        Table::for_issue(conn, self.id)
    }

    /// Body text with HTML tags stripped, for plain-text contexts.
    pub fn plain_text(&self) -> String {
        let mut output = String::with_capacity(self.body.len());
        let mut in_tag = false;

        for c in self.body.chars() {
            match c {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag => output.push(c),
                _ => {}
            }
        }

        output
    }

    /// Whether the issue's meeting is still far enough out to accept edits.
    /// Recomputed on every call; never cached.
    pub fn is_editable(&self, conn: &mut PgConnection, now: NaiveDateTime) -> Result<bool, Error> {
        let meeting = Meeting::find_by_id(conn, self.meeting_id)?;

        Ok(meeting.meeting_date >= windows::normal_from(now))
    }

    pub(crate) fn first_of_meeting(
        conn: &mut PgConnection,
        meeting: &Meeting,
    ) -> Result<Option<Self>, Error> {
        Self::first_for_meeting(conn, meeting.id())
    }
}

impl IssueType {
    pub fn new(name: String) -> IssueType {
        IssueType {
            id: Uuid::new_v4(),
            name,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn insert(&self, conn: &mut PgConnection) -> Result<Self, Error> {
        Ok(diesel::insert_into(issue_type::table)
            .values(self)
            .get_result(conn)?)
    }

    pub fn all(conn: &mut PgConnection) -> Result<Vec<Self>, Error> {
        use crate::database::schema::issue_type::dsl::*;

        Ok(issue_type.order(name.asc()).load(conn)?)
    }

    pub fn find_by_name(
        conn: &mut PgConnection,
        find_name: &str,
    ) -> Result<Option<Self>, Error> {
        use crate::database::schema::issue_type::dsl::*;

        Ok(issue_type
            .filter(name.eq(find_name))
            .first(conn)
            .optional()?)
    }

    /// The seeded vote type. Missing row means the vocabulary was never
    /// seeded and surfaces as [`Error::IssueTypeNotFound`].
    pub fn vote_type(conn: &mut PgConnection) -> Result<Self, Error> {
        Self::find_by_name(conn, VOTE_TYPE_NAME)?.ok_or_else(|| Error::IssueTypeNotFound {
            name: VOTE_TYPE_NAME.to_string(),
        })
    }
}

/// Global agenda ordering: newest meeting first, issue order ascending
/// within a meeting, creation time as the final tie-break.
fn sort_agenda(issues: &mut [Issue], meeting_dates: &HashMap<Uuid, NaiveDate>) {
    issues.sort_by(|a, b| {
        let date_a = meeting_dates.get(&a.meeting_id);
        let date_b = meeting_dates.get(&b.meeting_id);

        date_b
            .cmp(&date_a)
            .then(a.issue_order.cmp(&b.issue_order))
            .then(a.created_at.cmp(&b.created_at))
    });
}

fn order_token(issue_order: i32) -> String {
    if issue_order > 0 {
        issue_order.to_string()
    } else {
        ADDITIONAL_ISSUE_LABEL.to_string()
    }
}

pub fn format_qualified_title(issue_order: i32, title: &str, type_names: &[String]) -> String {
    format!(
        "【{}】{}【{}】",
        order_token(issue_order),
        title,
        type_names.join("・")
    )
}

pub fn format_qualified_title_for_note(
    issue_order: i32,
    title: &str,
    type_names: &[String],
) -> String {
    format!(
        "【0 - {}】{}【{}】",
        order_token(issue_order),
        title,
        type_names.join("・")
    )
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl Display for IssueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn qualified_title_uses_the_order_number() {
        let title = format_qualified_title(3, "Budget", &types(&["Finance", "Vote"]));
        assert_eq!(title, "【3】Budget【Finance・Vote】");
    }

    #[test]
    fn qualified_title_labels_additional_issues() {
        let title = format_qualified_title(
            ADDITIONAL_ISSUE_ORDER,
            "Budget",
            &types(&["Finance", "Vote"]),
        );
        assert_eq!(title, "【追加議案】Budget【Finance・Vote】");
    }

    #[test]
    fn note_title_prefixes_its_own_numbering() {
        let title = format_qualified_title_for_note(3, "Budget", &types(&["Finance", "Vote"]));
        assert_eq!(title, "【0 - 3】Budget【Finance・Vote】");

        let additional =
            format_qualified_title_for_note(ADDITIONAL_ISSUE_ORDER, "Budget", &types(&["Vote"]));
        assert_eq!(additional, "【0 - 追加議案】Budget【Vote】");
    }

    #[test]
    fn qualified_title_with_single_type_has_no_separator() {
        let title = format_qualified_title(1, "Opening", &types(&["report"]));
        assert_eq!(title, "【1】Opening【report】");
    }

    #[test]
    fn order_zero_counts_as_additional() {
        assert_eq!(order_token(0), "追加議案");
        assert_eq!(order_token(-1), "追加議案");
        assert_eq!(order_token(1), "1");
    }

    #[test]
    fn plain_text_strips_tags() {
        let mut issue = Issue::new(
            Uuid::new_v4(),
            "title".to_string(),
            "author".to_string(),
            "<p>hello <b>world</b></p>".to_string(),
            String::new(),
            "hash".to_string(),
            chrono::NaiveDate::from_ymd_opt(2024, 5, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        );
        assert_eq!(issue.plain_text(), "hello world");

        issue.body = "no markup".to_string();
        assert_eq!(issue.plain_text(), "no markup");
    }

    fn issue_for(meeting_id: Uuid, title: &str, order: i32, minute: u32) -> Issue {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap();
        let mut issue = Issue::new(
            meeting_id,
            title.to_string(),
            "author".to_string(),
            "body".to_string(),
            String::new(),
            "hash".to_string(),
            now,
        );
        issue.issue_order = order;
        issue
    }

    fn titles(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|issue| issue.title.as_str()).collect()
    }

    #[test]
    fn agenda_sort_groups_newest_meeting_first() {
        let newer = Uuid::new_v4();
        let older = Uuid::new_v4();
        let meeting_dates = HashMap::from([
            (newer, NaiveDate::from_ymd_opt(2024, 5, 12).unwrap()),
            (older, NaiveDate::from_ymd_opt(2024, 5, 11).unwrap()),
        ]);

        let mut issues = vec![
            issue_for(older, "old-1", 1, 0),
            issue_for(newer, "new-2", 2, 1),
            issue_for(older, "old-2", 2, 2),
            issue_for(newer, "new-1", 1, 3),
        ];
        sort_agenda(&mut issues, &meeting_dates);

        assert_eq!(titles(&issues), vec!["new-1", "new-2", "old-1", "old-2"]);
    }

    #[test]
    fn agenda_sort_puts_additional_issues_first_within_a_meeting() {
        let meeting = Uuid::new_v4();
        let meeting_dates =
            HashMap::from([(meeting, NaiveDate::from_ymd_opt(2024, 5, 12).unwrap())]);

        let mut issues = vec![
            issue_for(meeting, "numbered", 1, 0),
            issue_for(meeting, "late-add", ADDITIONAL_ISSUE_ORDER, 1),
            issue_for(meeting, "later-add", ADDITIONAL_ISSUE_ORDER, 2),
        ];
        sort_agenda(&mut issues, &meeting_dates);

        assert_eq!(titles(&issues), vec!["late-add", "later-add", "numbered"]);
    }

    #[test]
    fn new_issues_start_as_additional() {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let issue = Issue::new(
            Uuid::new_v4(),
            "title".to_string(),
            "author".to_string(),
            "body".to_string(),
            String::new(),
            "hash".to_string(),
            now,
        );

        assert_eq!(issue.issue_order, ADDITIONAL_ISSUE_ORDER);
        assert_eq!(issue.created_at(), now);
        assert_eq!(issue.updated_at(), now);
    }
}
