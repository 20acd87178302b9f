use super::schema::{files, folders};
use super::{CatalogStore, FileAttrs, FileKey, FileRecord, FolderRecord};
use crate::error::Error;
use crate::media::MediaInfo;
use crate::platform::Availability;
use chrono::{NaiveDateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::Path;
use tracing::{debug, info};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Nullable name columns are stored as `''` so the unique constraints treat
/// "no folder name" as a single value.
const NONE_NAME: &str = "";

#[derive(Debug, Insertable)]
#[diesel(table_name = folders)]
struct NewFolder<'a> {
    folder_name: &'a str,
    project_year: i32,
    media_type: &'a str,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = files)]
struct NewFile<'a> {
    folder_id: i32,
    subfolder_name: &'a str,
    file_name: &'a str,
    file_size: i64,
    modified_secs: i64,
    stored: &'a str,
    updated_at: NaiveDateTime,
    duration_secs: Option<i64>,
    resolution: Option<&'a str>,
    rating: Option<i32>,
}

/// SQLite-backed catalog.
pub struct SqliteCatalog {
    conn: SqliteConnection,
}

impl SqliteCatalog {
    /// Open (or create) the catalog at `path` and bring its schema up to date.
    pub fn open(path: &str) -> Result<Self, Error> {
        let conn = SqliteConnection::establish(path)?;
        let mut catalog = SqliteCatalog { conn };
        catalog.configure()?;
        catalog.migrate()?;
        debug!("Opened catalog at {}", path);
        Ok(catalog)
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        Self::open(":memory:")
    }

    /// Open for a run that must not write. A catalog that does not exist yet
    /// is stood in for by an empty in-memory one instead of being created.
    pub fn open_for_preview(path: &str) -> Result<Self, Error> {
        if Path::new(path).exists() {
            return Self::open(path);
        }
        info!("No catalog at {} yet, previewing against an empty one", path);
        Self::open_in_memory()
    }

    fn configure(&mut self) -> Result<(), Error> {
        self.conn
            .batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), Error> {
        let applied = self
            .conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| Error::Migration(e.to_string()))?;
        if !applied.is_empty() {
            info!("Applied {} catalog migration(s)", applied.len());
        }
        Ok(())
    }

    pub fn folder_count(&mut self) -> Result<i64, Error> {
        Ok(folders::table.count().get_result(&mut self.conn)?)
    }

    pub fn file_count(&mut self) -> Result<i64, Error> {
        Ok(files::table.count().get_result(&mut self.conn)?)
    }

}

/// folder_name, subfolder_name, file_name, file_size, modified_secs, stored,
/// rating, duration_secs, resolution
type FileRow = (
    String,
    String,
    String,
    i64,
    i64,
    String,
    Option<i32>,
    Option<i64>,
    Option<String>,
);

fn to_column(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or(NONE_NAME)
}

fn from_column(value: String) -> Option<String> {
    if value == NONE_NAME {
        None
    } else {
        Some(value)
    }
}

fn find_folder_id(conn: &mut SqliteConnection, folder: &FolderRecord) -> QueryResult<Option<i32>> {
    folders::table
        .filter(folders::folder_name.eq(to_column(&folder.folder_name)))
        .filter(folders::project_year.eq(folder.project_year))
        .filter(folders::media_type.eq(&folder.media_type))
        .select(folders::folder_id)
        .first::<i32>(conn)
        .optional()
}

impl CatalogStore for SqliteCatalog {
    fn fetch_known_folders(&mut self, media_type: &str) -> Result<Vec<FolderRecord>, Error> {
        let rows = folders::table
            .filter(folders::media_type.eq(media_type))
            .order((folders::project_year, folders::folder_name))
            .select((folders::folder_name, folders::project_year, folders::media_type))
            .load::<(String, i32, String)>(&mut self.conn)?;

        Ok(rows
            .into_iter()
            .map(|(folder_name, project_year, media_type)| FolderRecord {
                folder_name: from_column(folder_name),
                project_year,
                media_type,
            })
            .collect())
    }

    fn fetch_known_files(
        &mut self,
        year: i32,
        media_type: &str,
    ) -> Result<Vec<FileRecord>, Error> {
        let rows = files::table
            .inner_join(folders::table)
            .filter(folders::project_year.eq(year))
            .filter(folders::media_type.eq(media_type))
            .select((
                folders::folder_name,
                files::subfolder_name,
                files::file_name,
                files::file_size,
                files::modified_secs,
                files::stored,
                files::rating,
                files::duration_secs,
                files::resolution,
            ))
            .load::<FileRow>(&mut self.conn)?;

        Ok(rows
            .into_iter()
            .map(|row| FileRecord {
                key: FileKey {
                    folder: FolderRecord {
                        folder_name: from_column(row.0),
                        project_year: year,
                        media_type: media_type.to_string(),
                    },
                    subfolder: from_column(row.1),
                    file_name: row.2,
                },
                attrs: FileAttrs {
                    file_size: row.3,
                    modified_secs: row.4,
                    stored: Availability::parse(&row.5),
                    rating: row.6,
                },
                media: MediaInfo {
                    duration_secs: row.7,
                    resolution: row.8,
                },
            })
            .collect())
    }

    fn upsert_folders(&mut self, records: &[FolderRecord]) -> Result<usize, Error> {
        // sqlite batch inserts do not support on_conflict, so go row by row
        self.conn.transaction::<_, Error, _>(|conn| {
            let mut inserted = 0;
            for record in records {
                let row = NewFolder {
                    folder_name: to_column(&record.folder_name),
                    project_year: record.project_year,
                    media_type: &record.media_type,
                };
                inserted += diesel::insert_into(folders::table)
                    .values(&row)
                    .on_conflict((
                        folders::folder_name,
                        folders::project_year,
                        folders::media_type,
                    ))
                    .do_nothing()
                    .execute(conn)?;
            }
            Ok(inserted)
        })
    }

    fn upsert_files(&mut self, records: &[FileRecord]) -> Result<usize, Error> {
        let now = Utc::now().naive_utc();
        self.conn.transaction::<_, Error, _>(|conn| {
            let mut written = 0;
            for record in records {
                let folder_id = find_folder_id(conn, &record.key.folder)?.ok_or_else(|| {
                    Error::Other(format!(
                        "folder {:?} ({}) is not cataloged",
                        record.key.folder.folder_name, record.key.folder.project_year
                    ))
                })?;
                let row = NewFile {
                    folder_id,
                    subfolder_name: to_column(&record.key.subfolder),
                    file_name: &record.key.file_name,
                    file_size: record.attrs.file_size,
                    modified_secs: record.attrs.modified_secs,
                    stored: record.attrs.stored.as_str(),
                    updated_at: now,
                    duration_secs: record.media.duration_secs,
                    resolution: record.media.resolution.as_deref(),
                    rating: record.attrs.rating,
                };
                written += diesel::insert_into(files::table)
                    .values(&row)
                    .on_conflict((files::folder_id, files::subfolder_name, files::file_name))
                    .do_update()
                    .set((
                        files::file_size.eq(excluded(files::file_size)),
                        files::modified_secs.eq(excluded(files::modified_secs)),
                        files::stored.eq(excluded(files::stored)),
                        files::updated_at.eq(excluded(files::updated_at)),
                        files::duration_secs.eq(excluded(files::duration_secs)),
                        files::resolution.eq(excluded(files::resolution)),
                        files::rating.eq(excluded(files::rating)),
                    ))
                    .execute(conn)?;
            }
            Ok(written)
        })
    }

    fn delete_folders(&mut self, records: &[FolderRecord]) -> Result<usize, Error> {
        self.conn.transaction::<_, Error, _>(|conn| {
            let mut deleted = 0;
            for record in records {
                deleted += diesel::delete(
                    folders::table
                        .filter(folders::folder_name.eq(to_column(&record.folder_name)))
                        .filter(folders::project_year.eq(record.project_year))
                        .filter(folders::media_type.eq(&record.media_type)),
                )
                .execute(conn)?;
            }
            Ok(deleted)
        })
    }

    fn delete_files(&mut self, keys: &[FileKey]) -> Result<usize, Error> {
        self.conn.transaction::<_, Error, _>(|conn| {
            let mut deleted = 0;
            for key in keys {
                let folder_id = match find_folder_id(conn, &key.folder)? {
                    Some(id) => id,
                    None => continue,
                };
                deleted += diesel::delete(
                    files::table
                        .filter(files::folder_id.eq(folder_id))
                        .filter(files::subfolder_name.eq(to_column(&key.subfolder)))
                        .filter(files::file_name.eq(&key.file_name)),
                )
                .execute(conn)?;
            }
            Ok(deleted)
        })
    }
}
