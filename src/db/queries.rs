use rusqlite::params;
use rusqlite::OptionalExtension;

use super::connection::Database;
use crate::errors::{DsnLinksError, Result};
use crate::host::HostGraph;
use crate::types::*;

// ---------------------------------------------------------------------------
// Helpers: map rusqlite rows to domain types
// ---------------------------------------------------------------------------

/// Maps a row from the `objects` table to a `HostObject`.
fn row_to_object(row: &rusqlite::Row) -> rusqlite::Result<HostObject> {
    Ok(HostObject {
        id: row.get("id")?,
        name: row.get("name")?,
        type_name: row.get("type_name")?,
        parent: row.get("parent_id")?,
    })
}

/// Maps the `{prefix}_*` columns of a joined row to a `HostObject`.
fn prefixed_object(row: &rusqlite::Row, prefix: &str) -> rusqlite::Result<HostObject> {
    Ok(HostObject {
        id: row.get(format!("{prefix}_id").as_str())?,
        name: row.get(format!("{prefix}_name").as_str())?,
        type_name: row.get(format!("{prefix}_type").as_str())?,
        parent: row.get(format!("{prefix}_parent").as_str())?,
    })
}

fn row_to_position(row: &rusqlite::Row) -> rusqlite::Result<Position> {
    Ok(Position {
        file: row.get("file")?,
        begin_line: row.get("begin_line")?,
        code: row.get("code")?,
    })
}

fn row_to_reference(row: &rusqlite::Row) -> rusqlite::Result<ReferenceEdge> {
    let kind_str: String = row.get("kind")?;
    Ok(ReferenceEdge {
        kind: AccessKind::from_str(&kind_str).unwrap_or(AccessKind::Generic),
        source: row.get("source_id")?,
        target: row.get("target_id")?,
        bookmark: Bookmark {
            file: row.get("file")?,
            begin_line: row.get("begin_line")?,
            begin_column: row.get("begin_column")?,
            end_line: row.get("end_line")?,
            end_column: row.get("end_column")?,
        },
    })
}

/// Builds the error mapper for a failed statement in `operation`.
fn db_error(operation: &'static str) -> impl Fn(rusqlite::Error) -> DsnLinksError {
    move |e| DsnLinksError::Database {
        message: e.to_string(),
        operation: operation.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Object operations
// ---------------------------------------------------------------------------

impl Database {
    /// Inserts an object; fails if the ID is already taken.
    pub fn insert_object(&self, object: &HostObject) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO objects (id, name, type_name, parent_id) VALUES (?1, ?2, ?3, ?4)",
                params![object.id, object.name, object.type_name, object.parent],
            )
            .map_err(db_error("insert_object"))?;
        Ok(())
    }

    /// Inserts an object with a generated ID and returns it.
    pub fn add_object(&self, name: &str, type_name: &str, parent: Option<&str>) -> Result<HostObject> {
        let object = HostObject {
            id: generate_object_id(type_name, name, parent.unwrap_or_default()),
            name: name.to_string(),
            type_name: type_name.to_string(),
            parent: parent.map(str::to_string),
        };
        self.insert_object(&object)?;
        Ok(object)
    }

    /// Retrieves an object by ID, returning `None` if not found.
    pub fn get_object(&self, id: &str) -> Result<Option<HostObject>> {
        self.conn()
            .query_row(
                "SELECT id, name, type_name, parent_id FROM objects WHERE id = ?1",
                params![id],
                row_to_object,
            )
            .optional()
            .map_err(db_error("get_object"))
    }

    /// Returns all objects of one type, in insertion order.
    pub fn get_objects_by_type(&self, type_name: &str) -> Result<Vec<HostObject>> {
        let mut stmt = self
            .conn()
            .prepare_cached(
                "SELECT id, name, type_name, parent_id FROM objects
                 WHERE type_name = ?1 ORDER BY rowid",
            )
            .map_err(db_error("get_objects_by_type"))?;

        let rows = stmt
            .query_map(params![type_name], row_to_object)
            .map_err(db_error("get_objects_by_type"))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_error("get_objects_by_type"))
    }
}

// ---------------------------------------------------------------------------
// Link operations
// ---------------------------------------------------------------------------

impl Database {
    /// Inserts a call link and its positions in a single transaction,
    /// returning the new link's row ID.
    pub fn insert_call_link(&self, caller: &str, callee: &str, positions: &[Position]) -> Result<i64> {
        let tx = self
            .conn()
            .unchecked_transaction()
            .map_err(db_error("insert_call_link"))?;

        tx.execute(
            "INSERT INTO call_links (caller_id, callee_id) VALUES (?1, ?2)",
            params![caller, callee],
        )
        .map_err(db_error("insert_call_link"))?;
        let link_id = tx.last_insert_rowid();

        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO positions (link_id, seq, file, begin_line, code)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(db_error("insert_call_link"))?;
            for (seq, pos) in positions.iter().enumerate() {
                stmt.execute(params![link_id, seq as i64, pos.file, pos.begin_line, pos.code])
                    .map_err(db_error("insert_call_link"))?;
            }
        }

        tx.commit().map_err(db_error("insert_call_link"))?;
        Ok(link_id)
    }

    /// Returns the positions of a call link in their original order.
    pub fn get_positions(&self, link_id: i64) -> Result<Vec<Position>> {
        let mut stmt = self
            .conn()
            .prepare_cached(
                "SELECT file, begin_line, code FROM positions WHERE link_id = ?1 ORDER BY seq",
            )
            .map_err(db_error("get_positions"))?;

        let rows = stmt
            .query_map(params![link_id], row_to_position)
            .map_err(db_error("get_positions"))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_error("get_positions"))
    }

    /// Returns every reference link, in creation order.
    pub fn get_reference_links(&self) -> Result<Vec<ReferenceEdge>> {
        let mut stmt = self
            .conn()
            .prepare_cached(
                "SELECT kind, source_id, target_id, file,
                        begin_line, begin_column, end_line, end_column
                 FROM reference_links ORDER BY id",
            )
            .map_err(db_error("get_reference_links"))?;

        let rows = stmt
            .query_map([], row_to_reference)
            .map_err(db_error("get_reference_links"))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_error("get_reference_links"))
    }
}

// ---------------------------------------------------------------------------
// Host graph
// ---------------------------------------------------------------------------

impl HostGraph for Database {
    fn objects_of_types(&self, types: &[String]) -> Result<Vec<HostObject>> {
        let mut objects = Vec::new();
        for type_name in types {
            objects.extend(self.get_objects_by_type(type_name)?);
        }
        Ok(objects)
    }

    fn call_links(&self, caller_type: &str, callees: &[ObjectId]) -> Result<Vec<CallLink>> {
        let mut stmt = self
            .conn()
            .prepare_cached(
                "SELECT cl.id AS link_id,
                        caller.id AS caller_id, caller.name AS caller_name,
                        caller.type_name AS caller_type, caller.parent_id AS caller_parent,
                        callee.id AS callee_id, callee.name AS callee_name,
                        callee.type_name AS callee_type, callee.parent_id AS callee_parent
                 FROM call_links cl
                 JOIN objects caller ON caller.id = cl.caller_id
                 JOIN objects callee ON callee.id = cl.callee_id
                 WHERE cl.callee_id = ?1 AND caller.type_name = ?2",
            )
            .map_err(db_error("call_links"))?;

        let mut found: Vec<(i64, HostObject, HostObject)> = Vec::new();
        for callee in callees {
            let rows = stmt
                .query_map(params![callee, caller_type], |row| {
                    Ok((
                        row.get::<_, i64>("link_id")?,
                        prefixed_object(row, "caller")?,
                        prefixed_object(row, "callee")?,
                    ))
                })
                .map_err(db_error("call_links"))?;
            for row in rows {
                found.push(row.map_err(db_error("call_links"))?);
            }
        }
        found.sort_by_key(|(id, _, _)| *id);
        found.dedup_by_key(|(id, _, _)| *id);

        let mut links = Vec::with_capacity(found.len());
        for (link_id, caller, callee) in found {
            links.push(CallLink {
                caller,
                callee,
                positions: self.get_positions(link_id)?,
            });
        }
        Ok(links)
    }

    fn create_object(&mut self, object: NewObject) -> Result<HostObject> {
        self.add_object(&object.name, &object.type_name, Some(object.parent.as_str()))
    }

    fn create_link(&mut self, edge: &ReferenceEdge) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO reference_links
                    (kind, source_id, target_id, file,
                     begin_line, begin_column, end_line, end_column)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    edge.kind.as_str(),
                    edge.source,
                    edge.target,
                    edge.bookmark.file,
                    edge.bookmark.begin_line,
                    edge.bookmark.begin_column,
                    edge.bookmark.end_line,
                    edge.bookmark.end_column,
                ],
            )
            .map_err(db_error("create_link"))?;
        Ok(())
    }
}
