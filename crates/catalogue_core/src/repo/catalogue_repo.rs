//! Catalogue repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the minimal row-store surface the engine needs: query by owner,
//!   insert, conditional upsert, predicate delete.
//! - Enforce `(owner, key, locale)` uniqueness at the application layer.
//!
//! # Invariants
//! - Upserts update in place when a matching row exists, insert otherwise.
//! - Schema shape is validated once at construction, not per call.

use crate::config::CatalogueConfig;
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::catalogue_item::{CatalogueItem, OwnerRef};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CATALOGUE_TABLE: &str = "catalogue_items";
const FIXED_COLUMNS: &[&str] = &["id", "key", "value"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalogue row persistence and schema validation.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: String,
    },
    InvalidIdentifier(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; run migrations first"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{column}` is missing from `{table}`")
            }
            Self::InvalidIdentifier(name) => {
                write!(f, "configured name `{name}` is not a valid SQL identifier")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted catalogue data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Row-store contract required by the catalogue engine.
pub trait CatalogueRepository {
    /// Inserts one fresh row for `(owner, key, locale)`.
    fn insert_item(
        &self,
        owner: &OwnerRef,
        key: &str,
        locale: &str,
        value: &str,
    ) -> RepoResult<CatalogueItem>;

    /// Updates the matching row in place, or inserts one when absent.
    fn upsert_item(
        &self,
        owner: &OwnerRef,
        key: &str,
        locale: &str,
        value: &str,
    ) -> RepoResult<CatalogueItem>;

    /// Deletes rows matching the owner plus optional key/locale narrowing.
    /// Returns the number of deleted rows; zero matches are not an error.
    fn delete_where(
        &self,
        owner: &OwnerRef,
        key: Option<&str>,
        locale: Option<&str>,
    ) -> RepoResult<usize>;

    /// Lists all rows for one owner in insertion (`id`) order.
    fn items_for_owner(&self, owner: &OwnerRef) -> RepoResult<Vec<CatalogueItem>>;
}

/// SQLite-backed catalogue repository.
///
/// Column names for the locale tag and the polymorphic owner pair come from
/// [`CatalogueConfig`] and are interpolated into SQL, so they are validated
/// once at construction.
pub struct SqliteCatalogueRepository<'conn> {
    conn: &'conn Connection,
    locale_column: String,
    owner_type_column: String,
    owner_id_column: String,
}

impl<'conn> SqliteCatalogueRepository<'conn> {
    /// Binds a repository to an already-migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version does not match.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    /// - `InvalidIdentifier` when configured column names are not plain
    ///   identifiers.
    pub fn try_new(conn: &'conn Connection, config: &CatalogueConfig) -> RepoResult<Self> {
        let locale_column = validated_identifier(&config.locale_identifier)?;
        let owner_type_column = validated_identifier(&config.owner_type_column())?;
        let owner_id_column = validated_identifier(&config.owner_id_column())?;

        let actual_version =
            conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let columns = table_columns(conn, CATALOGUE_TABLE)?;
        if columns.is_empty() {
            return Err(RepoError::MissingRequiredTable(CATALOGUE_TABLE));
        }

        let required = FIXED_COLUMNS
            .iter()
            .map(|column| (*column).to_string())
            .chain([
                locale_column.clone(),
                owner_type_column.clone(),
                owner_id_column.clone(),
            ]);
        for column in required {
            if !columns.contains(&column) {
                return Err(RepoError::MissingRequiredColumn {
                    table: CATALOGUE_TABLE,
                    column,
                });
            }
        }

        Ok(Self {
            conn,
            locale_column,
            owner_type_column,
            owner_id_column,
        })
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT id, \"key\", value, {locale}, {owner_type}, {owner_id} FROM {CATALOGUE_TABLE}",
            locale = self.locale_column,
            owner_type = self.owner_type_column,
            owner_id = self.owner_id_column,
        )
    }

    fn find_item(
        &self,
        owner: &OwnerRef,
        key: &str,
        locale: &str,
    ) -> RepoResult<Option<CatalogueItem>> {
        let sql = format!(
            "{select} WHERE {owner_type} = ?1 AND {owner_id} = ?2 AND \"key\" = ?3 AND {locale_col} = ?4;",
            select = self.select_sql(),
            owner_type = self.owner_type_column,
            owner_id = self.owner_id_column,
            locale_col = self.locale_column,
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![owner.kind, owner.id, key, locale])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }

        Ok(None)
    }
}

impl CatalogueRepository for SqliteCatalogueRepository<'_> {
    fn insert_item(
        &self,
        owner: &OwnerRef,
        key: &str,
        locale: &str,
        value: &str,
    ) -> RepoResult<CatalogueItem> {
        let sql = format!(
            "INSERT INTO {CATALOGUE_TABLE} (\"key\", value, {locale_col}, {owner_type}, {owner_id})
             VALUES (?1, ?2, ?3, ?4, ?5);",
            locale_col = self.locale_column,
            owner_type = self.owner_type_column,
            owner_id = self.owner_id_column,
        );

        self.conn
            .execute(&sql, params![key, value, locale, owner.kind, owner.id])?;

        Ok(CatalogueItem {
            id: Some(self.conn.last_insert_rowid()),
            key: key.to_string(),
            value: value.to_string(),
            locale: locale.to_string(),
            owner: Some(owner.clone()),
        })
    }

    fn upsert_item(
        &self,
        owner: &OwnerRef,
        key: &str,
        locale: &str,
        value: &str,
    ) -> RepoResult<CatalogueItem> {
        let sql = format!(
            "UPDATE {CATALOGUE_TABLE}
             SET value = ?1, updated_at = (strftime('%s', 'now') * 1000)
             WHERE {owner_type} = ?2 AND {owner_id} = ?3 AND \"key\" = ?4 AND {locale_col} = ?5;",
            owner_type = self.owner_type_column,
            owner_id = self.owner_id_column,
            locale_col = self.locale_column,
        );

        let changed = self
            .conn
            .execute(&sql, params![value, owner.kind, owner.id, key, locale])?;

        if changed == 0 {
            return self.insert_item(owner, key, locale, value);
        }

        debug!(
            "event=catalogue_upsert module=repo status=ok owner={}:{} key={key} locale={locale}",
            owner.kind, owner.id
        );

        self.find_item(owner, key, locale)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "updated row missing for `{key}`/`{locale}` of owner {}:{}",
                owner.kind, owner.id
            ))
        })
    }

    fn delete_where(
        &self,
        owner: &OwnerRef,
        key: Option<&str>,
        locale: Option<&str>,
    ) -> RepoResult<usize> {
        let mut sql = format!(
            "DELETE FROM {CATALOGUE_TABLE} WHERE {owner_type} = ? AND {owner_id} = ?",
            owner_type = self.owner_type_column,
            owner_id = self.owner_id_column,
        );
        let mut bind_values: Vec<Value> =
            vec![Value::Text(owner.kind.clone()), Value::Integer(owner.id)];

        if let Some(key) = key {
            sql.push_str(" AND \"key\" = ?");
            bind_values.push(Value::Text(key.to_string()));
        }
        if let Some(locale) = locale {
            sql.push_str(&format!(" AND {} = ?", self.locale_column));
            bind_values.push(Value::Text(locale.to_string()));
        }
        sql.push(';');

        let deleted = self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(deleted)
    }

    fn items_for_owner(&self, owner: &OwnerRef) -> RepoResult<Vec<CatalogueItem>> {
        let sql = format!(
            "{select} WHERE {owner_type} = ?1 AND {owner_id} = ?2 ORDER BY id ASC;",
            select = self.select_sql(),
            owner_type = self.owner_type_column,
            owner_id = self.owner_id_column,
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![owner.kind, owner.id])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }

        Ok(items)
    }
}

// Columns are read positionally because locale/owner column names are
// configuration-driven.
fn parse_item_row(row: &Row<'_>) -> RepoResult<CatalogueItem> {
    Ok(CatalogueItem {
        id: Some(row.get(0)?),
        key: row.get(1)?,
        value: row.get(2)?,
        locale: row.get(3)?,
        owner: Some(OwnerRef {
            kind: row.get(4)?,
            id: row.get(5)?,
        }),
    })
}

fn validated_identifier(name: &str) -> RepoResult<String> {
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let rest_ok = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if starts_ok && rest_ok {
        return Ok(name.to_string());
    }

    Err(RepoError::InvalidIdentifier(name.to_string()))
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let mut rows = stmt.query([table])?;
    let mut columns = Vec::new();

    while let Some(row) = rows.next()? {
        columns.push(row.get(0)?);
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::{validated_identifier, RepoError};

    #[test]
    fn identifier_accepts_plain_column_names() {
        assert_eq!(validated_identifier("lang").unwrap(), "lang");
        assert_eq!(validated_identifier("_locale2").unwrap(), "_locale2");
    }

    #[test]
    fn identifier_rejects_injection_attempts() {
        for bad in ["", "1lang", "lang; DROP TABLE x", "lang name", "lang-tag"] {
            assert!(matches!(
                validated_identifier(bad),
                Err(RepoError::InvalidIdentifier(_))
            ));
        }
    }
}
