//! SQLite-backed property graph

use crate::GraphError;
use recomm_domain::traits::{
    GraphAccess, Neighborhood, RecommendationWrite, ViolationFilter, WriteAck, WriteMode,
};
use recomm_domain::{
    current_timestamp, Clause, ClauseId, Direction, Element, ElementId, Predicate,
    PropertyValue, Recommendation, RecommendationId, RecommendationStatus, Relation,
    RelationType, Severity, Violation, ViolationId, ViolationStatus,
};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const VIOLATION_SELECT: &str = "SELECT v.id, v.element_id, v.clause_id, v.measured, v.required, \
     v.severity, s.status, s.version \
     FROM violations v JOIN violation_status s ON s.violation_id = v.id";

const RECOMMENDATION_SELECT: &str = "SELECT r.body, s.status \
     FROM recommendations r JOIN recommendation_status s ON s.recommendation_id = r.id";

/// SQLite implementation of [`GraphAccess`]
///
/// The connection sits behind a mutex so one graph can be shared across the
/// pipeline's workers. Reads run inside a transaction so each call sees a
/// single snapshot; writes take the database lock up front.
pub struct SqliteGraph {
    conn: Mutex<Connection>,
}

impl SqliteGraph {
    /// Open (or create) a graph database at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let graph = Self {
            conn: Mutex::new(conn),
        };
        graph.initialize_schema()?;
        Ok(graph)
    }

    /// Open a private in-memory graph
    pub fn in_memory() -> Result<Self, GraphError> {
        Self::new(":memory:")
    }

    fn initialize_schema(&self) -> Result<(), GraphError> {
        let conn = self.lock()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, GraphError> {
        self.conn
            .lock()
            .map_err(|e| GraphError::Lock(e.to_string()))
    }

    /// Number of elements and relations currently loaded
    pub fn counts(&self) -> Result<(usize, usize), GraphError> {
        let conn = self.lock()?;
        let elements: i64 = conn.query_row("SELECT COUNT(*) FROM elements", [], |row| row.get(0))?;
        let relations: i64 =
            conn.query_row("SELECT COUNT(*) FROM relations", [], |row| row.get(0))?;
        Ok((elements as usize, relations as usize))
    }

    /// Insert an element and its outgoing relations
    ///
    /// Incoming relations on `element` are ignored; they are derived from the
    /// other end's outgoing edges.
    pub fn insert_element(&self, element: &Element) -> Result<(), GraphError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        insert_element_row(&tx, element)?;
        for relation in element
            .relations
            .iter()
            .filter(|r| r.direction == Direction::Outgoing)
        {
            insert_relation_row(&tx, &element.id, &relation.target, relation.relation_type)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert a typed edge; inserting the same edge twice is a no-op
    pub fn insert_relation(
        &self,
        from: &ElementId,
        to: &ElementId,
        relation_type: RelationType,
    ) -> Result<(), GraphError> {
        let conn = self.lock()?;
        insert_relation_row(&conn, from, to, relation_type)
    }

    /// Bulk-load elements and edges in a single transaction
    pub fn insert_batch(
        &self,
        elements: &[Element],
        relations: &[(ElementId, ElementId, RelationType)],
    ) -> Result<(), GraphError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for element in elements {
            insert_element_row(&tx, element)?;
        }
        for (from, to, relation_type) in relations {
            insert_relation_row(&tx, from, to, *relation_type)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove every element and relation, keeping clauses, violations and recommendations
    pub fn clear_model(&self) -> Result<(), GraphError> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM relations; DELETE FROM elements;")?;
        Ok(())
    }

    /// Insert or replace a clause
    pub fn insert_clause(&self, clause: &Clause) -> Result<(), GraphError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO clauses (id, description, predicate, severity)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                clause.id.as_str(),
                clause.description,
                serde_json::to_string(&clause.predicate)?,
                clause.severity.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Insert a violation from the compliance feed
    ///
    /// The violation's status becomes its first event, so a fresh violation
    /// reads back at version 1. Re-inserting a known id is a
    /// [`GraphError::Duplicate`].
    pub fn insert_violation(&self, violation: &Violation) -> Result<(), GraphError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let exists: Option<String> = tx
            .query_row(
                "SELECT id FROM violations WHERE id = ?1",
                params![violation.id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(GraphError::Duplicate(violation.id.to_string()));
        }
        tx.execute(
            "INSERT INTO violations (id, element_id, clause_id, measured, required, severity, severity_rank)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                violation.id.as_str(),
                violation.element_id.as_str(),
                violation.clause_id.as_str(),
                serde_json::to_string(&violation.measured)?,
                serde_json::to_string(&violation.required)?,
                violation.severity.as_str(),
                severity_rank(violation.severity),
            ],
        )?;
        insert_violation_event(&tx, &violation.id, violation.status, "detected")?;
        tx.commit()?;
        Ok(())
    }
}

fn severity_rank(severity: Severity) -> i64 {
    match severity {
        Severity::Low => 0,
        Severity::Medium => 1,
        Severity::High => 2,
        Severity::Critical => 3,
    }
}

fn id_to_bytes(id: RecommendationId) -> Vec<u8> {
    id.value().to_be_bytes().to_vec()
}

fn insert_element_row(conn: &Connection, element: &Element) -> Result<(), GraphError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO elements (id, element_type, properties) VALUES (?1, ?2, ?3)",
        params![
            element.id.as_str(),
            element.element_type,
            serde_json::to_string(&element.properties)?,
        ],
    )?;
    if inserted == 0 {
        return Err(GraphError::Duplicate(element.id.to_string()));
    }
    Ok(())
}

fn insert_relation_row(
    conn: &Connection,
    from: &ElementId,
    to: &ElementId,
    relation_type: RelationType,
) -> Result<(), GraphError> {
    conn.execute(
        "INSERT OR IGNORE INTO relations (from_id, to_id, relation_type) VALUES (?1, ?2, ?3)",
        params![from.as_str(), to.as_str(), relation_type.as_str()],
    )?;
    Ok(())
}

fn insert_violation_event(
    conn: &Connection,
    id: &ViolationId,
    status: ViolationStatus,
    reason: &str,
) -> Result<(), GraphError> {
    conn.execute(
        "INSERT INTO violation_events (violation_id, status, reason, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![id.as_str(), status.as_str(), reason, current_timestamp() as i64],
    )?;
    Ok(())
}

fn insert_recommendation_event(
    conn: &Connection,
    id: &[u8],
    status: RecommendationStatus,
    reason: &str,
) -> Result<(), GraphError> {
    conn.execute(
        "INSERT INTO recommendation_events (recommendation_id, status, reason, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![id, status.as_str(), reason, current_timestamp() as i64],
    )?;
    Ok(())
}

/// Current (status, version) of a violation
fn violation_state(
    conn: &Connection,
    id: &ViolationId,
) -> Result<Option<(ViolationStatus, u64)>, GraphError> {
    let row: Option<(String, i64)> = conn
        .query_row(
            "SELECT status, version FROM violation_status WHERE violation_id = ?1",
            params![id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    match row {
        Some((status, version)) => {
            let status = ViolationStatus::parse(&status)
                .ok_or_else(|| GraphError::InvalidData(format!("violation status: {}", status)))?;
            Ok(Some((status, version as u64)))
        }
        None => Ok(None),
    }
}

fn recommendation_state(
    conn: &Connection,
    id: &[u8],
) -> Result<Option<RecommendationStatus>, GraphError> {
    let row: Option<String> = conn
        .query_row(
            "SELECT status FROM recommendation_status WHERE recommendation_id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    row.map(|s| {
        RecommendationStatus::parse(&s)
            .ok_or_else(|| GraphError::InvalidData(format!("recommendation status: {}", s)))
    })
    .transpose()
}

fn read_relations(conn: &Connection, id: &ElementId) -> Result<Vec<Relation>, GraphError> {
    let mut stmt = conn.prepare(
        "SELECT to_id, relation_type, 'outgoing' FROM relations WHERE from_id = ?1
         UNION ALL
         SELECT from_id, relation_type, 'incoming' FROM relations WHERE to_id = ?1",
    )?;
    let rows = stmt.query_map(params![id.as_str()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut relations = Vec::new();
    for row in rows {
        let (target, label, direction) = row?;
        let relation_type = RelationType::parse(&label)
            .ok_or_else(|| GraphError::InvalidData(format!("relation type: {}", label)))?;
        let direction = if direction == "outgoing" {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };
        relations.push(Relation {
            relation_type,
            target: ElementId::new(target),
            direction,
        });
    }
    relations.sort();
    Ok(relations)
}

fn read_element(conn: &Connection, id: &ElementId) -> Result<Option<Element>, GraphError> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT element_type, properties FROM elements WHERE id = ?1",
            params![id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((element_type, properties)) = row else {
        return Ok(None);
    };
    let properties: BTreeMap<String, PropertyValue> = serde_json::from_str(&properties)?;
    let relations = read_relations(conn, id)?;
    Ok(Some(Element {
        id: id.clone(),
        element_type,
        properties,
        relations,
    }))
}

fn read_neighbors(
    conn: &Connection,
    id: &ElementId,
    relation_types: &[RelationType],
    max_hops: u32,
) -> Result<Vec<Element>, GraphError> {
    let mut visited = BTreeSet::from([id.clone()]);
    let mut frontier = vec![id.clone()];
    for _ in 0..max_hops {
        let mut next = Vec::new();
        for node in &frontier {
            for relation in read_relations(conn, node)? {
                if !relation_types.contains(&relation.relation_type) {
                    continue;
                }
                if visited.insert(relation.target.clone()) {
                    next.push(relation.target);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    visited.remove(id);

    let mut elements = Vec::with_capacity(visited.len());
    for neighbor in &visited {
        match read_element(conn, neighbor)? {
            Some(element) => elements.push(element),
            None => tracing::warn!(element = %neighbor, "relation points at a missing element"),
        }
    }
    Ok(elements)
}

fn read_clause(conn: &Connection, id: &ClauseId) -> Result<Option<Clause>, GraphError> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT description, predicate, severity FROM clauses WHERE id = ?1",
            params![id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    let Some((description, predicate, severity)) = row else {
        return Ok(None);
    };
    let predicate: Predicate = serde_json::from_str(&predicate)?;
    let severity = Severity::parse(&severity)
        .ok_or_else(|| GraphError::InvalidData(format!("severity: {}", severity)))?;
    Ok(Some(Clause {
        id: id.clone(),
        description,
        predicate,
        severity,
    }))
}

fn read_element_recommendations(
    conn: &Connection,
    id: &ElementId,
) -> Result<Vec<Recommendation>, GraphError> {
    let sql = format!(
        "{} JOIN recommendation_targets t ON t.recommendation_id = r.id \
         WHERE t.element_id = ?1 ORDER BY r.id",
        RECOMMENDATION_SELECT
    );
    query_recommendations(conn, &sql, &[&id.as_str()])
}

fn row_to_violation(row: &rusqlite::Row<'_>) -> rusqlite::Result<[String; 7]> {
    Ok([
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ])
}

fn build_violation(fields: [String; 7], version: i64) -> Result<Violation, GraphError> {
    let [id, element_id, clause_id, measured, required, severity, status] = fields;
    Ok(Violation {
        id: ViolationId::new(id),
        element_id: ElementId::new(element_id),
        clause_id: ClauseId::new(clause_id),
        measured: serde_json::from_str(&measured)?,
        required: serde_json::from_str(&required)?,
        severity: Severity::parse(&severity)
            .ok_or_else(|| GraphError::InvalidData(format!("severity: {}", severity)))?,
        status: ViolationStatus::parse(&status)
            .ok_or_else(|| GraphError::InvalidData(format!("violation status: {}", status)))?,
        version: version as u64,
    })
}

fn query_violations(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Violation>, GraphError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok((row_to_violation(row)?, row.get::<_, i64>(7)?)))?;
    let mut violations = Vec::new();
    for row in rows {
        let (fields, version) = row?;
        violations.push(build_violation(fields, version)?);
    }
    Ok(violations)
}

fn query_recommendations(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Recommendation>, GraphError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut recommendations = Vec::new();
    for row in rows {
        let (body, status) = row?;
        let mut recommendation: Recommendation = serde_json::from_str(&body)?;
        recommendation.status = RecommendationStatus::parse(&status)
            .ok_or_else(|| GraphError::InvalidData(format!("recommendation status: {}", status)))?;
        recommendations.push(recommendation);
    }
    Ok(recommendations)
}

impl GraphAccess for SqliteGraph {
    type Error = GraphError;

    fn fetch_element(&self, id: &ElementId) -> Result<Option<Element>, Self::Error> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        read_element(&tx, id)
    }

    fn fetch_neighbors(
        &self,
        id: &ElementId,
        relation_types: &[RelationType],
        max_hops: u32,
    ) -> Result<Vec<Element>, Self::Error> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        read_neighbors(&tx, id, relation_types, max_hops)
    }

    fn fetch_neighborhood(
        &self,
        element_id: &ElementId,
        clause_id: &ClauseId,
        relation_types: &[RelationType],
        max_hops: u32,
        include_history: bool,
    ) -> Result<Option<Neighborhood>, Self::Error> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let Some(element) = read_element(&tx, element_id)? else {
            return Ok(None);
        };
        let recommendations = if include_history {
            read_element_recommendations(&tx, element_id)?
        } else {
            Vec::new()
        };
        Ok(Some(Neighborhood {
            element,
            clause: read_clause(&tx, clause_id)?,
            neighbors: read_neighbors(&tx, element_id, relation_types, max_hops)?,
            recommendations,
        }))
    }

    fn fetch_clause(&self, id: &ClauseId) -> Result<Option<Clause>, Self::Error> {
        let conn = self.lock()?;
        read_clause(&conn, id)
    }

    fn fetch_violation(&self, id: &ViolationId) -> Result<Option<Violation>, Self::Error> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE v.id = ?1", VIOLATION_SELECT);
        let mut found = query_violations(&conn, &sql, &[&id.as_str()])?;
        Ok(found.pop())
    }

    fn fetch_open_violations(&self, filter: &ViolationFilter) -> Result<Vec<Violation>, Self::Error> {
        let conn = self.lock()?;
        let mut sql = format!("{} WHERE s.status = 'open'", VIOLATION_SELECT);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(severity) = filter.min_severity {
            sql.push_str(" AND v.severity_rank >= ?");
            params.push(Box::new(severity_rank(severity)));
        }

        if let Some(clause_id) = &filter.clause_id {
            sql.push_str(" AND v.clause_id = ?");
            params.push(Box::new(clause_id.to_string()));
        }

        if let Some(element_id) = &filter.element_id {
            sql.push_str(" AND v.element_id = ?");
            params.push(Box::new(element_id.to_string()));
        }

        sql.push_str(" ORDER BY v.id");

        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        query_violations(&conn, &sql, &param_refs)
    }

    fn fetch_recommendation(
        &self,
        id: RecommendationId,
    ) -> Result<Option<Recommendation>, Self::Error> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE r.id = ?1", RECOMMENDATION_SELECT);
        let id_bytes = id_to_bytes(id);
        let mut found = query_recommendations(&conn, &sql, &[&id_bytes])?;
        Ok(found.pop())
    }

    fn fetch_recommendations_for_violation(
        &self,
        id: &ViolationId,
    ) -> Result<Vec<Recommendation>, Self::Error> {
        let conn = self.lock()?;
        let sql = format!(
            "{} JOIN recommendation_resolves x ON x.recommendation_id = r.id \
             WHERE x.violation_id = ?1 ORDER BY r.id",
            RECOMMENDATION_SELECT
        );
        query_recommendations(&conn, &sql, &[&id.as_str()])
    }

    fn fetch_recommendations_for_element(
        &self,
        id: &ElementId,
    ) -> Result<Vec<Recommendation>, Self::Error> {
        let conn = self.lock()?;
        read_element_recommendations(&conn, id)
    }

    fn write_recommendation(&self, write: &RecommendationWrite) -> Result<WriteAck, Self::Error> {
        let recommendation = &write.recommendation;
        if recommendation.violation_ids.is_empty() {
            return Err(GraphError::InvalidData(
                "recommendation addresses no violation".to_string(),
            ));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Version check. Returning early drops `tx`, which rolls it back.
        let mut versions = BTreeMap::new();
        for violation_id in &recommendation.violation_ids {
            let expected = write.expected_versions.get(violation_id).copied().ok_or_else(|| {
                GraphError::InvalidData(format!("no expected version for {}", violation_id))
            })?;
            let (status, actual) = violation_state(&tx, violation_id)?
                .ok_or_else(|| GraphError::NotFound(violation_id.to_string()))?;
            if actual != expected {
                return Ok(WriteAck::Conflict {
                    violation_id: violation_id.clone(),
                    expected,
                    actual,
                });
            }
            if status.is_terminal() {
                return Err(GraphError::InvalidTransition(format!(
                    "violation {} is {}",
                    violation_id, status
                )));
            }
            versions.insert(violation_id.clone(), actual);
        }

        for target in &recommendation.target_elements {
            let exists: Option<String> = tx
                .query_row(
                    "SELECT id FROM elements WHERE id = ?1",
                    params![target.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(GraphError::NotFound(target.to_string()));
            }
        }

        let id_bytes = id_to_bytes(recommendation.id);
        let status = match write.mode {
            WriteMode::Accept => RecommendationStatus::Accepted,
            WriteMode::Propose => RecommendationStatus::Proposed,
        };

        // Live recommendations to supersede, collected before the new edges exist
        let mut superseded: BTreeSet<Vec<u8>> = BTreeSet::new();
        if write.mode == WriteMode::Accept {
            let mut stmt = tx.prepare(
                "SELECT x.recommendation_id FROM recommendation_resolves x
                 JOIN recommendation_status s ON s.recommendation_id = x.recommendation_id
                 WHERE x.violation_id = ?1 AND s.status IN ('proposed', 'accepted')",
            )?;
            for violation_id in &recommendation.violation_ids {
                let rows = stmt.query_map(params![violation_id.as_str()], |row| {
                    row.get::<_, Vec<u8>>(0)
                })?;
                for row in rows {
                    superseded.insert(row?);
                }
            }
        }

        let mut stored = recommendation.clone();
        stored.status = status;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO recommendations (id, body, created_at) VALUES (?1, ?2, ?3)",
            params![
                &id_bytes,
                serde_json::to_string(&stored)?,
                recommendation.created_at as i64
            ],
        )?;
        if inserted == 0 {
            return Err(GraphError::Duplicate(recommendation.id.to_string()));
        }

        for violation_id in &recommendation.violation_ids {
            tx.execute(
                "INSERT INTO recommendation_resolves (recommendation_id, violation_id) VALUES (?1, ?2)",
                params![&id_bytes, violation_id.as_str()],
            )?;
        }
        for target in &recommendation.target_elements {
            tx.execute(
                "INSERT OR IGNORE INTO recommendation_targets (recommendation_id, element_id) VALUES (?1, ?2)",
                params![&id_bytes, target.as_str()],
            )?;
        }
        insert_recommendation_event(&tx, &id_bytes, status, "stored")?;

        if write.mode == WriteMode::Accept {
            let reason = format!("superseded by {}", recommendation.id);
            for old in &superseded {
                insert_recommendation_event(&tx, old, RecommendationStatus::Superseded, &reason)?;
            }
            let reason = format!("accepted {}", recommendation.id);
            for (violation_id, version) in versions.iter_mut() {
                insert_violation_event(&tx, violation_id, ViolationStatus::Addressed, &reason)?;
                *version += 1;
            }
        }

        tx.commit()?;
        tracing::debug!(
            recommendation = %recommendation.id,
            mode = ?write.mode,
            superseded = superseded.len(),
            "recommendation written"
        );
        Ok(WriteAck::Committed { versions })
    }

    fn append_recommendation_event(
        &self,
        id: RecommendationId,
        status: RecommendationStatus,
        reason: &str,
    ) -> Result<(), Self::Error> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id_bytes = id_to_bytes(id);
        let current = recommendation_state(&tx, &id_bytes)?
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;
        if !current.can_transition_to(status) {
            return Err(GraphError::InvalidTransition(format!(
                "recommendation {} is {}, cannot become {}",
                id, current, status
            )));
        }
        insert_recommendation_event(&tx, &id_bytes, status, reason)?;
        tx.commit()?;
        Ok(())
    }

    fn append_violation_event(
        &self,
        id: &ViolationId,
        expected_version: u64,
        status: ViolationStatus,
        reason: &str,
    ) -> Result<WriteAck, Self::Error> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (current, actual) =
            violation_state(&tx, id)?.ok_or_else(|| GraphError::NotFound(id.to_string()))?;
        if actual != expected_version {
            return Ok(WriteAck::Conflict {
                violation_id: id.clone(),
                expected: expected_version,
                actual,
            });
        }
        if !current.can_transition_to(status) {
            return Err(GraphError::InvalidTransition(format!(
                "violation {} is {}, cannot become {}",
                id, current, status
            )));
        }
        insert_violation_event(&tx, id, status, reason)?;
        tx.commit()?;
        Ok(WriteAck::Committed {
            versions: BTreeMap::from([(id.clone(), actual + 1)]),
        })
    }
}
