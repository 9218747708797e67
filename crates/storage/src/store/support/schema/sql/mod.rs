#![forbid(unsafe_code)]

mod core;
mod entities;
mod indexes;
mod reference;

pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(core::SQL);
    sql.push_str(reference::SQL);
    sql.push_str(entities::SQL);
    sql.push_str(indexes::SQL);
    sql
}
