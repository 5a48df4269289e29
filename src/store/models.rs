use super::schema;
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::tracked_file)]
pub struct NewTrackedFile<'a> {
    pub rel_path: &'a str,
    pub first_seen: NaiveDateTime,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = schema::tracked_file)]
pub struct TrackedFile {
    pub id: i32,
    pub rel_path: String,
    pub first_seen: NaiveDateTime,
}
