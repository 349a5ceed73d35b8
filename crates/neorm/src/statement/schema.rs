//! DDL chain: `CREATE DATABASE`, `CREATE TABLE` column definitions and `ALTER TABLE`.
//!
//! Schema statements never bind arguments; defaults are rendered as literals after being
//! checked against the column's declared type.

use super::{Statement, StatementKind};
use crate::dialect::TypeFamily;
use crate::error::{OrmError, OrmResult};
use crate::value::{Value, quote_literal};

impl Statement {
    /// Start `CREATE DATABASE name` and remember `name` as the statement's schema.
    pub fn create_schema(&mut self, name: &str) -> &mut Self {
        self.start(StatementKind::Schema, format!("CREATE DATABASE {name}"));
        self.state.if_not_exists_at = Some("CREATE DATABASE".len());
        self.schema = Some(name.to_string());
        self
    }

    /// Start `USE name`.
    pub fn use_schema(&mut self, name: &str) -> &mut Self {
        self.start(StatementKind::Schema, format!("USE {name}"));
        self.schema = Some(name.to_string());
        self
    }

    /// Start `CREATE TABLE name`.
    pub fn create_table(&mut self, name: &str) -> &mut Self {
        self.start(StatementKind::Schema, format!("CREATE TABLE {name}"));
        self.state.if_not_exists_at = Some("CREATE TABLE".len());
        self.state.creating_table = true;
        self.table = Some(name.to_string());
        self
    }

    /// Insert `IF NOT EXISTS` after `CREATE DATABASE` / `CREATE TABLE`.
    pub fn if_not_exists(&mut self) -> OrmResult<&mut Self> {
        let at = self.state.if_not_exists_at.take().ok_or_else(|| {
            OrmError::usage("if_not_exists must follow create_schema or create_table")
        })?;
        self.text.insert_str(at, " IF NOT EXISTS");
        Ok(self)
    }

    /// Begin a column definition.
    ///
    /// Inside `ALTER TABLE` this is ` ADD COLUMN name`; inside `CREATE TABLE` the first
    /// column opens the column list.
    pub fn add_column(&mut self, name: &str) -> &mut Self {
        self.state.column_type = None;
        if self.state.altering_table {
            return self.push(&format!(" ADD COLUMN {name}"));
        }
        self.open_or_separate();
        self.push(name)
    }

    /// ` TYPE`, uppercased. The first type keyword after a column name is its declared
    /// type for [`default`](Statement::default).
    pub fn type_(&mut self, keyword: &str) -> &mut Self {
        let keyword = keyword.trim().to_ascii_uppercase();
        self.text.push(' ');
        self.text.push_str(&keyword);
        if self.state.column_type.is_none() {
            self.state.column_type = Some(keyword);
        }
        self
    }

    pub fn null(&mut self) -> &mut Self {
        self.push(" NULL")
    }

    pub fn not_null(&mut self) -> &mut Self {
        self.push(" NOT NULL")
    }

    pub fn auto_increment(&mut self) -> &mut Self {
        self.push(" AUTO_INCREMENT")
    }

    /// ` DEFAULT <literal>`, validated against the declared column type.
    pub fn default(&mut self, value: impl Into<Value>) -> OrmResult<&mut Self> {
        let value = value.into();
        let declared = self
            .state
            .column_type
            .as_deref()
            .ok_or_else(|| OrmError::usage("default requires a declared column type"))?;

        let mismatch = |expected: &str| {
            OrmError::usage(format!(
                "default for {declared} column must be {expected}, got {}",
                value.type_name()
            ))
        };

        let literal = match self.dialect.type_family(declared) {
            Some(TypeFamily::Integer) => match &value {
                Value::Int(n) => n.to_string(),
                _ => return Err(mismatch("an integer")),
            },
            Some(TypeFamily::Boolean) => match &value {
                Value::Int(n @ (0 | 1)) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(mismatch("a boolean or 0/1")),
            },
            Some(TypeFamily::Text) => match &value {
                Value::Text(s) => quote_literal(s),
                Value::Json(j) => quote_literal(&j.to_string()),
                _ => return Err(mismatch("a string")),
            },
            Some(TypeFamily::DateTime) => match &value {
                Value::Text(s) | Value::Json(serde_json::Value::String(s)) => s.clone(),
                Value::Json(j) => j.to_string(),
                _ => return Err(mismatch("a string")),
            },
            None => value.to_sql_literal(),
        };

        self.text.push_str(" DEFAULT ");
        self.text.push_str(&literal);
        Ok(self)
    }

    pub fn unique(&mut self) -> &mut Self {
        self.push(" UNIQUE")
    }

    /// ` CHECK (condition)`
    pub fn check(&mut self, condition: &str) -> &mut Self {
        self.push(&format!(" CHECK ({condition})"))
    }

    pub fn character_set(&mut self, charset: &str) -> &mut Self {
        self.push(&format!(" CHARACTER SET {charset}"))
    }

    /// ` PRIMARY KEY`; a statement holds at most one.
    pub fn primary_key(&mut self) -> OrmResult<&mut Self> {
        self.claim_primary_key()?;
        Ok(self.push(" PRIMARY KEY"))
    }

    /// `FOREIGN KEY (column) REFERENCES ref_table(ref_column)`
    pub fn foreign_key(&mut self, column: &str, ref_table: &str, ref_column: &str) -> &mut Self {
        let clause = format!("FOREIGN KEY ({column})");
        self.table_constraint(&clause);
        self.push(&format!(" REFERENCES {ref_table}({ref_column})"))
    }

    /// `CONSTRAINT name FOREIGN KEY (column) REFERENCES ref_table(ref_column)`
    pub fn foreign_key_with_constraint(
        &mut self,
        constraint: &str,
        column: &str,
        ref_table: &str,
        ref_column: &str,
    ) -> &mut Self {
        let clause = format!("CONSTRAINT {constraint} FOREIGN KEY ({column})");
        self.table_constraint(&clause);
        self.push(&format!(" REFERENCES {ref_table}({ref_column})"))
    }

    pub fn unsigned(&mut self) -> &mut Self {
        self.push(" UNSIGNED")
    }

    pub fn zerofill(&mut self) -> &mut Self {
        self.push(" ZEROFILL")
    }

    /// ` ENUM('a', 'b', ...)`
    pub fn enum_<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let values: Vec<String> = values
            .into_iter()
            .map(|v| quote_literal(v.as_ref()))
            .collect();
        if self.state.column_type.is_none() {
            self.state.column_type = Some("ENUM".to_string());
        }
        self.push(&format!(" ENUM({})", values.join(", ")))
    }

    pub fn on_update(&mut self, action: &str) -> &mut Self {
        self.push(&format!(" ON UPDATE {action}"))
    }

    pub fn on_delete(&mut self, action: &str) -> &mut Self {
        self.push(&format!(" ON DELETE {action}"))
    }

    /// ` GENERATED ALWAYS AS expression`
    pub fn generated_always(&mut self, expression: &str) -> &mut Self {
        self.push(&format!(" GENERATED ALWAYS AS {expression}"))
    }

    pub fn virtual_(&mut self) -> &mut Self {
        self.push(" VIRTUAL")
    }

    pub fn stored(&mut self) -> &mut Self {
        self.push(" STORED")
    }

    pub fn spatial(&mut self) -> &mut Self {
        self.push(" SPATIAL")
    }

    pub fn generated(&mut self) -> &mut Self {
        self.push(" GENERATED")
    }

    /// `INDEX (a, b)` as a table-level entry of the column list.
    pub fn index<I>(&mut self, columns: I) -> OrmResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        if columns.is_empty() {
            return Err(OrmError::usage("index requires at least one column"));
        }
        self.open_or_separate();
        Ok(self.push(&format!("INDEX ({})", columns.join(", "))))
    }

    /// ` COMMENT 'text'`
    pub fn comment(&mut self, text: &str) -> &mut Self {
        let quoted = quote_literal(text);
        self.push(&format!(" COMMENT {quoted}"))
    }

    /// ` DEFAULT <literal> ON NULL`
    pub fn default_on_null(&mut self, value: impl Into<Value>) -> &mut Self {
        let literal = value.into().to_sql_literal();
        self.push(&format!(" DEFAULT {literal} ON NULL"))
    }

    pub fn invisible(&mut self) -> &mut Self {
        self.push(" INVISIBLE")
    }

    /// Append ` keyword` verbatim.
    pub fn custom_keyword(&mut self, keyword: &str) -> &mut Self {
        self.push(&format!(" {keyword}"))
    }

    // ------------------------------------------------------------------
    // ALTER TABLE
    // ------------------------------------------------------------------

    /// Start `ALTER TABLE name`.
    pub fn alter_table(&mut self, name: &str) -> &mut Self {
        self.start(StatementKind::Schema, format!("ALTER TABLE {name}"));
        self.state.altering_table = true;
        self.table = Some(name.to_string());
        self
    }

    /// ` ADD definition`
    pub fn add_clause(&mut self, definition: &str) -> &mut Self {
        self.push(&format!(" ADD {definition}"))
    }

    /// ` DROP target`
    pub fn drop_clause(&mut self, target: &str) -> &mut Self {
        self.push(&format!(" DROP {target}"))
    }

    pub fn modify_column(&mut self, column: &str) -> &mut Self {
        self.state.column_type = None;
        self.push(&format!(" MODIFY COLUMN {column}"))
    }

    pub fn change_column(&mut self, old: &str, new: &str) -> &mut Self {
        self.state.column_type = None;
        self.push(&format!(" CHANGE COLUMN {old} {new}"))
    }

    pub fn after(&mut self, column: &str) -> &mut Self {
        self.push(&format!(" AFTER {column}"))
    }

    pub fn first(&mut self) -> &mut Self {
        self.push(" FIRST")
    }

    pub fn drop_column(&mut self, column: &str) -> &mut Self {
        self.push(&format!(" DROP COLUMN {column}"))
    }

    pub fn add_index(&mut self, name: &str, column: &str) -> &mut Self {
        self.push(&format!(" ADD INDEX {name} ({column})"))
    }

    pub fn add_unique_index(&mut self, name: &str, column: &str) -> &mut Self {
        self.push(&format!(" ADD UNIQUE INDEX {name} ({column})"))
    }

    pub fn drop_index(&mut self, name: &str) -> &mut Self {
        self.push(&format!(" DROP INDEX {name}"))
    }

    /// ` ADD PRIMARY KEY (column)`; shares the one-primary-key rule with
    /// [`primary_key`](Statement::primary_key).
    pub fn add_primary_key(&mut self, column: &str) -> OrmResult<&mut Self> {
        self.claim_primary_key()?;
        Ok(self.push(&format!(" ADD PRIMARY KEY ({column})")))
    }

    pub fn drop_primary_key(&mut self) -> &mut Self {
        self.push(" DROP PRIMARY KEY")
    }

    pub fn drop_foreign_key(&mut self, name: &str) -> &mut Self {
        self.push(&format!(" DROP FOREIGN KEY {name}"))
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> &mut Self {
        self.push(&format!(" RENAME COLUMN {old} TO {new}"))
    }

    pub fn rename_table(&mut self, new: &str) -> &mut Self {
        self.push(&format!(" RENAME TO {new}"))
    }

    pub fn add_constraint(&mut self, constraint: &str) -> &mut Self {
        self.push(&format!(" ADD CONSTRAINT {constraint}"))
    }

    pub fn drop_constraint(&mut self, constraint: &str) -> &mut Self {
        self.push(&format!(" DROP CONSTRAINT {constraint}"))
    }

    pub fn add_fulltext_index(&mut self, column: &str) -> &mut Self {
        self.push(&format!(" ADD FULLTEXT ({column})"))
    }

    pub fn add_spatial_index(&mut self, column: &str) -> &mut Self {
        self.push(&format!(" ADD SPATIAL INDEX ({column})"))
    }

    pub fn disable_keys(&mut self) -> &mut Self {
        self.push(" DISABLE KEYS")
    }

    pub fn enable_keys(&mut self) -> &mut Self {
        self.push(" ENABLE KEYS")
    }

    /// ` ENGINE = engine`. In `CREATE TABLE` the open column list is closed first.
    pub fn engine(&mut self, engine: &str) -> &mut Self {
        self.close_column_list();
        self.push(&format!(" ENGINE = {engine}"))
    }

    // ------------------------------------------------------------------

    /// Emit ` (` for the first column-list entry, `, ` for the rest.
    fn open_or_separate(&mut self) {
        if self.state.column_list_opened {
            self.text.push_str(", ");
        } else {
            self.text.push_str(" (");
            self.state.column_list_opened = true;
        }
    }

    /// Close an open `CREATE TABLE` column list.
    pub(super) fn close_column_list(&mut self) {
        if self.state.creating_table
            && self.state.column_list_opened
            && !self.state.column_list_closed
        {
            self.text.push(')');
            self.state.column_list_closed = true;
        }
    }

    /// Table-level constraint: ` ADD ...` when altering, a column-list entry otherwise.
    fn table_constraint(&mut self, clause: &str) {
        if self.state.altering_table {
            self.text.push_str(" ADD ");
        } else {
            self.open_or_separate();
        }
        self.text.push_str(clause);
    }

    fn claim_primary_key(&mut self) -> OrmResult<()> {
        if self.state.has_primary_key {
            return Err(OrmError::usage("a table cannot have two primary keys"));
        }
        self.state.has_primary_key = true;
        Ok(())
    }
}
