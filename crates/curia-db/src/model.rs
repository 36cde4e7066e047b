//! The model trait.
//!
//! A [`Model`] maps a Rust type onto one table. The trait lists the builder
//! operations a model exposes as provided methods that delegate to
//! [`QueryBuilder`]; anything else is reached through
//! [`Model::query`].

use curia_core::{CuriaError, CuriaResult};

use crate::connection::ConnectionExt;
use crate::manager::DatabaseManager;
use crate::query::{Operand, QueryBuilder};
use crate::row::Row;
use crate::value::Value;

/// A type stored in a database table.
///
/// # Examples
///
/// ```
/// use curia_core::CuriaResult;
/// use curia_db::model::Model;
/// use curia_db::row::Row;
///
/// struct Article {
///     id: i64,
///     title: String,
/// }
///
/// impl Model for Article {
///     fn table_name() -> &'static str {
///         "articles"
///     }
///
///     fn from_row(row: &Row) -> CuriaResult<Self> {
///         Ok(Article {
///             id: row.get("id")?,
///             title: row.get("title")?,
///         })
///     }
/// }
///
/// assert_eq!(Article::primary_key(), "id");
/// ```
pub trait Model: Sized {
    /// The table rows are stored in.
    fn table_name() -> &'static str;

    /// The primary key column.
    fn primary_key() -> &'static str {
        "id"
    }

    /// The connection to use; `None` means the default connection.
    fn connection_name() -> Option<&'static str> {
        None
    }

    /// Builds an instance from a result row.
    fn from_row(row: &Row) -> CuriaResult<Self>;

    /// Starts a query against this model's table.
    fn query(db: &DatabaseManager) -> CuriaResult<QueryBuilder> {
        Ok(db.connection(Self::connection_name())?.table(Self::table_name()))
    }

    /// Loads every row.
    fn all(db: &DatabaseManager) -> CuriaResult<Vec<Self>> {
        Self::query(db)?.get()?.iter().map(Self::from_row).collect()
    }

    /// Loads the row with the given primary key.
    fn find(db: &DatabaseManager, id: impl Into<Value>) -> CuriaResult<Option<Self>> {
        Self::query(db)?
            .where_(Self::primary_key(), "=", id.into())
            .first()?
            .map(|row| Self::from_row(&row))
            .transpose()
    }

    /// Inserts a row and loads it back by its generated key.
    fn create<K, V>(db: &DatabaseManager, attributes: impl IntoIterator<Item = (K, V)>) -> CuriaResult<Self>
    where
        K: Into<String>,
        V: Into<Operand>,
    {
        let id = Self::query(db)?.insert_get_id(attributes, Some(Self::primary_key()))?;
        Self::find(db, id)?.ok_or_else(|| {
            CuriaError::DoesNotExist(format!(
                "{} with {} {id} vanished after insert",
                Self::table_name(),
                Self::primary_key()
            ))
        })
    }

    /// Deletes the row with the given primary key.
    fn destroy(db: &DatabaseManager, id: impl Into<Value>) -> CuriaResult<u64> {
        Self::query(db)?
            .where_(Self::primary_key(), "=", id.into())
            .delete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::testing::RecordingConnection;
    use curia_core::DatabaseSection;
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    struct Article {
        id: i64,
        title: String,
    }

    impl Model for Article {
        fn table_name() -> &'static str {
            "articles"
        }

        fn primary_key() -> &'static str {
            "article_id"
        }

        fn from_row(row: &Row) -> CuriaResult<Self> {
            Ok(Self {
                id: row.get("article_id")?,
                title: row.get("title")?,
            })
        }
    }

    fn setup() -> (Rc<RecordingConnection>, DatabaseManager) {
        let recorder = Rc::new(RecordingConnection::new());
        let manager = DatabaseManager::new(DatabaseSection::default(), |_, _| {
            Err(CuriaError::OperationalError("unused".to_string()))
        });
        let conn: Rc<dyn Connection> = recorder.clone();
        manager.add_connection("default", conn);
        (recorder, manager)
    }

    fn article_row(id: i64, title: &str) -> Row {
        Row::from_pairs([("article_id", Value::Int(id)), ("title", Value::from(title))])
    }

    #[test]
    fn test_all_maps_rows() {
        let (recorder, db) = setup();
        recorder.push_rows(vec![article_row(1, "a"), article_row(2, "b")]);
        let articles = Article::all(&db).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[1].title, "b");
        assert_eq!(recorder.sql_log(), vec!["select * from `articles`"]);
    }

    #[test]
    fn test_find_uses_primary_key() {
        let (recorder, db) = setup();
        recorder.push_rows(vec![article_row(7, "seven")]);
        let article = Article::find(&db, 7).unwrap();
        assert_eq!(
            article,
            Some(Article {
                id: 7,
                title: "seven".to_string()
            })
        );
        assert_eq!(
            recorder.last_statement().unwrap().0,
            "select * from `articles` where `article_id` = ? limit 1"
        );
    }

    #[test]
    fn test_create_inserts_then_reloads() {
        let (recorder, db) = setup();
        recorder.push_rows(vec![article_row(1, "hello")]);
        let article = Article::create(&db, [("title", "hello")]).unwrap();
        assert_eq!(article.id, 1);
        assert_eq!(
            recorder.sql_log(),
            vec![
                "insert into `articles` (`title`) values (?)",
                "select * from `articles` where `article_id` = ? limit 1",
            ]
        );
    }

    #[test]
    fn test_create_missing_row_after_insert() {
        let (_, db) = setup();
        let err = Article::create(&db, [("title", "ghost")]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_destroy() {
        let (recorder, db) = setup();
        assert_eq!(Article::destroy(&db, 3).unwrap(), 1);
        assert_eq!(
            recorder.last_statement().unwrap(),
            (
                "delete from `articles` where `article_id` = ?".to_string(),
                vec![Value::Int(3)]
            )
        );
    }
}
