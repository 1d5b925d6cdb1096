//! Schema revisions for the version approval workflow.
//!
//! Each [`Revision`] is a plain descriptor: which columns to add to which
//! table, and how to take them away again. Applying a descriptor is the job
//! of a [`SchemaBuilder`]: [`MemorySchema`] for tests, and the Postgres DDL
//! renderer in the db crate for real deployments.
//!
//! Revision B re-declares the three columns revision A introduced. Adds are
//! idempotent, so replaying A then B against one schema never fails. When the
//! two run in sequence, [`RevisionSet::down`] only drops what a revision
//! introduced itself, which restores exactly the shape it started from.

use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Tables and columns
// ---------------------------------------------------------------------------

/// Table holding content versions.
pub const VERSIONS_TABLE: &str = "content_versions";

/// Table holding per-collection configuration.
pub const COLLECTIONS_TABLE: &str = "collections";

/// Column type of an added column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Boolean { default: bool },
    String { max_length: u32 },
}

/// One column a revision adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl ColumnSpec {
    /// A `NOT NULL` boolean column with a default.
    pub const fn boolean(name: &'static str, default: bool) -> Self {
        Self {
            name,
            column_type: ColumnType::Boolean { default },
            nullable: false,
        }
    }

    /// A bounded string column.
    pub const fn string(name: &'static str, max_length: u32, nullable: bool) -> Self {
        Self {
            name,
            column_type: ColumnType::String { max_length },
            nullable,
        }
    }

    fn add_to(&self, table: &mut dyn TableBuilder) {
        match self.column_type {
            ColumnType::Boolean { default } => {
                table.add_boolean_column(self.name, default, self.nullable)
            }
            ColumnType::String { max_length } => {
                table.add_string_column(self.name, max_length, self.nullable)
            }
        }
    }
}

pub const REVIEW_REQUESTED: ColumnSpec = ColumnSpec::boolean("review_requested", false);
pub const REVIEWED: ColumnSpec = ColumnSpec::boolean("reviewed", false);
pub const APPROVED: ColumnSpec = ColumnSpec::boolean("approved", false);
pub const REJECT_REASON: ColumnSpec = ColumnSpec::string("reject_reason", 255, true);
pub const VERSIONING_RESTRICTIONS: ColumnSpec =
    ColumnSpec::boolean("versioning_restrictions", false);

// ---------------------------------------------------------------------------
// Builder interface
// ---------------------------------------------------------------------------

/// Column-level operations inside one `alter_table` call.
///
/// Builders that cannot see the live schema (DDL renderers) report
/// `has_column == false` and must make their adds idempotent themselves.
pub trait TableBuilder {
    fn has_column(&self, name: &str) -> bool;
    fn add_boolean_column(&mut self, name: &str, default: bool, nullable: bool);
    fn add_string_column(&mut self, name: &str, max_length: u32, nullable: bool);
    fn drop_columns(&mut self, names: &[&str]);
}

/// Structural storage that revisions are applied to.
///
/// `alter_table` only fails for a table `has_table` does not know, so checking
/// every table up front keeps a revision all-or-nothing.
pub trait SchemaBuilder {
    fn has_table(&self, table: &str) -> bool;

    fn alter_table(
        &mut self,
        table: &str,
        alter: &mut dyn FnMut(&mut dyn TableBuilder),
    ) -> Result<(), SchemaError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Unknown revision: {0}")]
    UnknownRevision(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Revision {0} is already applied")]
    AlreadyApplied(&'static str),

    #[error("Revision {0} is not applied")]
    NotApplied(&'static str),

    #[error("Revision {id} is out of order, expected {expected}")]
    OutOfOrder { id: &'static str, expected: String },
}

// ---------------------------------------------------------------------------
// Revisions
// ---------------------------------------------------------------------------

/// Columns a revision adds to one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlterTable {
    pub table: &'static str,
    pub columns: &'static [ColumnSpec],
}

/// One discrete, reversible schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision {
    pub id: &'static str,
    pub name: &'static str,
    pub changes: &'static [AlterTable],
}

impl Revision {
    /// Add every declared column that the table does not already have.
    pub fn up(&self, builder: &mut dyn SchemaBuilder) -> Result<(), SchemaError> {
        ensure_tables(builder, self.changes.iter().map(|change| change.table))?;
        for change in self.changes {
            builder.alter_table(change.table, &mut |table: &mut dyn TableBuilder| {
                for column in change.columns {
                    if !table.has_column(column.name) {
                        column.add_to(table);
                    }
                }
            })?;
        }
        Ok(())
    }

    /// Drop every declared column.
    pub fn down(&self, builder: &mut dyn SchemaBuilder) -> Result<(), SchemaError> {
        let owned: Vec<(&'static str, Vec<&'static str>)> = self
            .changes
            .iter()
            .map(|change| (change.table, change.columns.iter().map(|c| c.name).collect()))
            .collect();
        drop_all(builder, &owned)
    }
}

/// Review request, decision and reject reason on versions.
pub const REVISION_A: Revision = Revision {
    id: "20241030A",
    name: "support-versioning-approval",
    changes: &[AlterTable {
        table: VERSIONS_TABLE,
        columns: &[REVIEW_REQUESTED, APPROVED, REJECT_REASON],
    }],
};

/// Adds `reviewed` to versions and `versioning_restrictions` to collections.
pub const REVISION_B: Revision = Revision {
    id: "20241031A",
    name: "support-versioning-approval",
    changes: &[
        AlterTable {
            table: VERSIONS_TABLE,
            columns: &[REVIEW_REQUESTED, REVIEWED, APPROVED, REJECT_REASON],
        },
        AlterTable {
            table: COLLECTIONS_TABLE,
            columns: &[VERSIONING_RESTRICTIONS],
        },
    ],
};

/// All revisions, in the order they must be applied.
pub const REVISIONS: &[Revision] = &[REVISION_A, REVISION_B];

fn drop_all(
    builder: &mut dyn SchemaBuilder,
    owned: &[(&'static str, Vec<&'static str>)],
) -> Result<(), SchemaError> {
    ensure_tables(
        builder,
        owned
            .iter()
            .filter(|(_, columns)| !columns.is_empty())
            .map(|(table, _)| *table),
    )?;
    for (table, columns) in owned.iter().rev() {
        if columns.is_empty() {
            continue;
        }
        builder.alter_table(table, &mut |t: &mut dyn TableBuilder| {
            t.drop_columns(columns)
        })?;
    }
    Ok(())
}

fn ensure_tables<'a>(
    builder: &dyn SchemaBuilder,
    tables: impl IntoIterator<Item = &'a str>,
) -> Result<(), SchemaError> {
    match tables.into_iter().find(|table| !builder.has_table(table)) {
        Some(missing) => Err(SchemaError::UnknownTable(missing.to_string())),
        None => Ok(()),
    }
}

/// The ordered revision list, applied one revision at a time.
#[derive(Debug, Clone, Copy)]
pub struct RevisionSet {
    revisions: &'static [Revision],
}

impl Default for RevisionSet {
    fn default() -> Self {
        Self::ordered()
    }
}

impl RevisionSet {
    pub fn ordered() -> Self {
        Self {
            revisions: REVISIONS,
        }
    }

    pub fn revisions(&self) -> &'static [Revision] {
        self.revisions
    }

    pub fn get(&self, id: &str) -> Result<&'static Revision, SchemaError> {
        self.position(id).map(|idx| &self.revisions[idx])
    }

    fn position(&self, id: &str) -> Result<usize, SchemaError> {
        self.revisions
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| SchemaError::UnknownRevision(id.to_string()))
    }

    /// Columns first introduced by `id`, grouped per table in declaration
    /// order. Columns an earlier revision already declares are excluded.
    pub fn owned_columns(
        &self,
        id: &str,
    ) -> Result<Vec<(&'static str, Vec<&'static str>)>, SchemaError> {
        let idx = self.position(id)?;
        let earlier = &self.revisions[..idx];
        let declared_earlier = |table: &str, column: &str| -> bool {
            earlier.iter().any(|r| {
                r.changes
                    .iter()
                    .any(|c| c.table == table && c.columns.iter().any(|col| col.name == column))
            })
        };

        Ok(self.revisions[idx]
            .changes
            .iter()
            .map(|change| {
                let columns = change
                    .columns
                    .iter()
                    .map(|c| c.name)
                    .filter(|name| !declared_earlier(change.table, *name))
                    .collect();
                (change.table, columns)
            })
            .collect())
    }

    /// Apply `id` on top of its predecessors.
    pub fn up(&self, id: &str, builder: &mut dyn SchemaBuilder) -> Result<(), SchemaError> {
        self.get(id)?.up(builder)
    }

    /// Revert `id`, dropping only the columns it introduced.
    pub fn down(&self, id: &str, builder: &mut dyn SchemaBuilder) -> Result<(), SchemaError> {
        let owned = self.owned_columns(id)?;
        drop_all(builder, &owned)
    }
}

/// Which revisions of a [`RevisionSet`] have been applied, enforcing the
/// fixed application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionHistory {
    applied: Vec<&'static str>,
}

impl RevisionHistory {
    pub fn applied(&self) -> &[&'static str] {
        &self.applied
    }

    /// Apply the next pending revision. `id` must be exactly the next one.
    pub fn apply(
        &mut self,
        set: &RevisionSet,
        id: &str,
        builder: &mut dyn SchemaBuilder,
    ) -> Result<(), SchemaError> {
        let revision = set.get(id)?;
        if self.applied.contains(&revision.id) {
            return Err(SchemaError::AlreadyApplied(revision.id));
        }
        let next = set.revisions().get(self.applied.len()).map(|r| r.id);
        if next != Some(revision.id) {
            return Err(SchemaError::OutOfOrder {
                id: revision.id,
                expected: next.unwrap_or("none").to_string(),
            });
        }
        set.up(revision.id, builder)?;
        self.applied.push(revision.id);
        Ok(())
    }

    /// Revert the most recently applied revision. `id` must be that one.
    pub fn revert(
        &mut self,
        set: &RevisionSet,
        id: &str,
        builder: &mut dyn SchemaBuilder,
    ) -> Result<(), SchemaError> {
        let revision = set.get(id)?;
        match self.applied.last() {
            Some(last) if *last == revision.id => {}
            Some(last) if self.applied.contains(&revision.id) => {
                return Err(SchemaError::OutOfOrder {
                    id: revision.id,
                    expected: (*last).to_string(),
                });
            }
            _ => return Err(SchemaError::NotApplied(revision.id)),
        }
        set.down(revision.id, builder)?;
        self.applied.pop();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory schema
// ---------------------------------------------------------------------------

/// A column of a [`MemorySchema`] table. Base columns carry no type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryColumn {
    pub name: String,
    pub column_type: Option<ColumnType>,
    pub nullable: bool,
}

/// Tables as ordered column lists. Used to check revision round trips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySchema {
    tables: BTreeMap<String, Vec<MemoryColumn>>,
}

impl MemorySchema {
    /// Add a table with untyped base columns.
    pub fn with_table(mut self, table: &str, columns: &[&str]) -> Self {
        let columns = columns
            .iter()
            .map(|name| MemoryColumn {
                name: name.to_string(),
                column_type: None,
                nullable: true,
            })
            .collect();
        self.tables.insert(table.to_string(), columns);
        self
    }

    /// Column names of `table` in creation order, or empty if unknown.
    pub fn columns(&self, table: &str) -> Vec<&str> {
        self.tables
            .get(table)
            .map(|cols| cols.iter().map(|c| c.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn column(&self, table: &str, name: &str) -> Option<&MemoryColumn> {
        self.tables.get(table)?.iter().find(|c| c.name == name)
    }
}

struct MemoryTable<'a> {
    columns: &'a mut Vec<MemoryColumn>,
}

impl MemoryTable<'_> {
    fn push(&mut self, name: &str, column_type: ColumnType, nullable: bool) {
        if self.has_column(name) {
            return;
        }
        self.columns.push(MemoryColumn {
            name: name.to_string(),
            column_type: Some(column_type),
            nullable,
        });
    }
}

impl TableBuilder for MemoryTable<'_> {
    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    fn add_boolean_column(&mut self, name: &str, default: bool, nullable: bool) {
        self.push(name, ColumnType::Boolean { default }, nullable);
    }

    fn add_string_column(&mut self, name: &str, max_length: u32, nullable: bool) {
        self.push(name, ColumnType::String { max_length }, nullable);
    }

    fn drop_columns(&mut self, names: &[&str]) {
        self.columns.retain(|c| !names.contains(&c.name.as_str()));
    }
}

impl SchemaBuilder for MemorySchema {
    fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    fn alter_table(
        &mut self,
        table: &str,
        alter: &mut dyn FnMut(&mut dyn TableBuilder),
    ) -> Result<(), SchemaError> {
        let columns = self
            .tables
            .get_mut(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?;
        alter(&mut MemoryTable { columns });
        Ok(())
    }
}
