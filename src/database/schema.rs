diesel::table! {
    meeting (id) {
        id -> Uuid,
        meeting_date -> Date,
    }
}

diesel::table! {
    issue_type (id) {
        id -> Uuid,
        name -> Text,
    }
}

diesel::table! {
    issue (id) {
        id -> Uuid,
        meeting_id -> Uuid,
        title -> Text,
        author -> Text,
        body -> Text,
        vote_content -> Text,
        hashed_password -> Text,
        issue_order -> Int4,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    issue_issue_types (id) {
        id -> Uuid,
        issue_id -> Uuid,
        issue_type_id -> Uuid,
    }
}

diesel::table! {
    block (id) {
        id -> Uuid,
        name -> Text,
    }
}

diesel::table! {
    note (id) {
        id -> Uuid,
        issue_id -> Uuid,
        block_id -> Uuid,
        text -> Text,
        hashed_password -> Text,
    }
}

diesel::table! {
    issue_table (id) {
        id -> Uuid,
        issue_id -> Uuid,
        caption -> Text,
        csv_text -> Text,
        table_order -> Int4,
    }
}

diesel::joinable!(issue -> meeting (meeting_id));
diesel::joinable!(issue_issue_types -> issue (issue_id));
diesel::joinable!(issue_issue_types -> issue_type (issue_type_id));
diesel::joinable!(note -> issue (issue_id));
diesel::joinable!(note -> block (block_id));
diesel::joinable!(issue_table -> issue (issue_id));

diesel::allow_tables_to_appear_in_same_query!(
    meeting,
    issue_type,
    issue,
    issue_issue_types,
    block,
    note,
    issue_table,
);
