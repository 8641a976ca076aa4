//! A local decentralized web node (DWN): records owned by a DID, stored in
//! SQLite.
//!
//! There is no sync with remote nodes. Each record belongs to the DID that
//! wrote it, and only that DID can read or query it back.

use std::{path::Path, str::FromStr as _, sync::Arc};

use chrono::{DateTime, Utc};
use did_simple::methods::key::DidKey;
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use sqlx::{
	migrate::{MigrateError, Migrator},
	sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use tracing::debug;
use uuid::Uuid;

use crate::UuidProvider;

static MIGRATOR: Migrator = sqlx::migrate!();

/// A connection pool to a database that has had all migrations applied.
#[derive(Debug, Clone)]
pub struct MigratedDbPool(SqlitePool);

impl MigratedDbPool {
	pub async fn new(pool: SqlitePool) -> Result<Self, MigrateError> {
		MIGRATOR.run(&pool).await?;
		Ok(Self(pool))
	}

	/// Opens the database file at `path`, creating it if it doesn't exist.
	pub async fn open(path: &Path) -> Result<Self, DwnError> {
		let connect_opts = SqliteConnectOptions::new()
			.create_if_missing(true)
			.filename(path);
		let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
		Ok(Self::new(pool).await?)
	}

	/// A private database that lives only as long as the pool does.
	pub async fn in_memory() -> Result<Self, DwnError> {
		let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
		// Each connection to `:memory:` is its own database, so the pool must
		// hold exactly one connection and never recycle it.
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.min_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect_with(connect_opts)
			.await?;
		Ok(Self::new(pool).await?)
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.0
	}
}

/// Handle to the node. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Dwn {
	db: MigratedDbPool,
	uuids: Arc<UuidProvider>,
}

impl Dwn {
	pub fn new(db: MigratedDbPool) -> Self {
		Self::with_uuid_provider(db, UuidProvider::default())
	}

	pub fn with_uuid_provider(db: MigratedDbPool, uuids: UuidProvider) -> Self {
		Self {
			db,
			uuids: Arc::new(uuids),
		}
	}

	pub async fn in_memory() -> Result<Self, DwnError> {
		Ok(Self::new(MigratedDbPool::in_memory().await?))
	}

	/// Checks that the database can be reached.
	pub async fn ping(&self) -> Result<(), DwnError> {
		sqlx::query("SELECT 1").execute(self.db.pool()).await?;
		Ok(())
	}

	/// The records interface, acting as `author`.
	pub fn records(&self, author: DidKey) -> Records {
		Records {
			dwn: self.clone(),
			author,
		}
	}
}

#[derive(Debug, Clone)]
pub struct RecordsCreateRequest {
	pub data: Vec<u8>,
	/// Names the shape of the data, e.g. a credential type.
	pub schema: String,
	/// Mime type of the data, e.g. `application/vc+jwt`.
	pub data_format: String,
	pub published: bool,
}

/// Metadata about a record's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDescriptor {
	pub schema: String,
	pub data_format: String,
	pub published: bool,
	pub date_created: DateTime<Utc>,
	pub date_published: Option<DateTime<Utc>>,
	/// Lowercase hex sha256 of the data. A plain digest, not a multiformats CID.
	pub data_digest: String,
	pub data_size: u64,
}

/// The records of one author.
#[derive(Debug, Clone)]
pub struct Records {
	dwn: Dwn,
	author: DidKey,
}

impl Records {
	pub fn author(&self) -> &DidKey {
		&self.author
	}

	#[tracing::instrument(skip_all, fields(author = %self.author, schema = %request.schema))]
	pub async fn create(&self, request: RecordsCreateRequest) -> Result<Record, DwnError> {
		if request.schema.trim().is_empty() {
			return Err(DwnError::InvalidRequest("schema must not be empty"));
		}
		if request.data_format.trim().is_empty() {
			return Err(DwnError::InvalidRequest("data format must not be empty"));
		}
		let data_size = u64::try_from(request.data.len())
			.map_err(|_| DwnError::InvalidRequest("data is too large"))?;
		let stored_size = i64::try_from(data_size)
			.map_err(|_| DwnError::InvalidRequest("data is too large"))?;

		let record_id = self.dwn.uuids.next_v4();
		let date_created = Utc::now();
		let descriptor = RecordDescriptor {
			schema: request.schema,
			data_format: request.data_format,
			published: request.published,
			date_created,
			date_published: request.published.then_some(date_created),
			data_digest: data_digest(&request.data),
			data_size,
		};

		sqlx::query(
			"INSERT INTO records (record_id, author, schema, data_format, published, \
			date_created, date_published, data_digest, data_size, data) \
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
		)
		.bind(record_id)
		.bind(self.author.as_str())
		.bind(&descriptor.schema)
		.bind(&descriptor.data_format)
		.bind(descriptor.published)
		.bind(descriptor.date_created)
		.bind(descriptor.date_published)
		.bind(&descriptor.data_digest)
		.bind(stored_size)
		.bind(&request.data)
		.execute(self.dwn.db.pool())
		.await?;
		debug!(%record_id, "created record");

		Ok(Record {
			id: record_id,
			author: self.author.clone(),
			descriptor,
			db: self.dwn.db.clone(),
		})
	}

	/// Fetches one of this author's records.
	pub async fn read(&self, record_id: Uuid) -> Result<Record, DwnError> {
		let row: Option<RecordRow> = sqlx::query_as(
			"SELECT record_id, schema, data_format, published, date_created, \
			date_published, data_digest, data_size \
			FROM records WHERE record_id = ?1 AND author = ?2",
		)
		.bind(record_id)
		.bind(self.author.as_str())
		.fetch_optional(self.dwn.db.pool())
		.await?;
		let row = row.ok_or(DwnError::NotFound(record_id))?;
		self.record_from_row(row)
	}

	/// All of this author's records, optionally only those with `schema`, oldest
	/// first.
	pub async fn query(&self, schema: Option<&str>) -> Result<Vec<Record>, DwnError> {
		let rows: Vec<RecordRow> = sqlx::query_as(
			"SELECT record_id, schema, data_format, published, date_created, \
			date_published, data_digest, data_size \
			FROM records WHERE author = ?1 AND (?2 IS NULL OR schema = ?2) \
			ORDER BY rowid",
		)
		.bind(self.author.as_str())
		.bind(schema)
		.fetch_all(self.dwn.db.pool())
		.await?;
		rows.into_iter()
			.map(|row| self.record_from_row(row))
			.collect()
	}

	fn record_from_row(&self, row: RecordRow) -> Result<Record, DwnError> {
		let data_size = u64::try_from(row.data_size).map_err(|_| {
			DwnError::DataIntegrity {
				record_id: row.record_id,
			}
		})?;
		Ok(Record {
			id: row.record_id,
			author: self.author.clone(),
			descriptor: RecordDescriptor {
				schema: row.schema,
				data_format: row.data_format,
				published: row.published,
				date_created: row.date_created,
				date_published: row.date_published,
				data_digest: row.data_digest,
				data_size,
			},
			db: self.dwn.db.clone(),
		})
	}
}

#[derive(sqlx::FromRow)]
struct RecordRow {
	record_id: Uuid,
	schema: String,
	data_format: String,
	published: bool,
	date_created: DateTime<Utc>,
	date_published: Option<DateTime<Utc>>,
	data_digest: String,
	data_size: i64,
}

/// Handle to a stored record. The data itself is only loaded on request.
#[derive(Debug, Clone)]
pub struct Record {
	id: Uuid,
	author: DidKey,
	descriptor: RecordDescriptor,
	db: MigratedDbPool,
}

impl Record {
	pub fn id(&self) -> Uuid {
		self.id
	}

	pub fn author(&self) -> &DidKey {
		&self.author
	}

	pub fn descriptor(&self) -> &RecordDescriptor {
		&self.descriptor
	}

	/// Loads the record's data, checking it against the descriptor's digest.
	pub async fn data_bytes(&self) -> Result<Vec<u8>, DwnError> {
		let data: Option<Vec<u8>> =
			sqlx::query_scalar("SELECT data FROM records WHERE record_id = ?")
				.bind(self.id)
				.fetch_optional(self.db.pool())
				.await?;
		let data = data.ok_or(DwnError::NotFound(self.id))?;
		if data_digest(&data) != self.descriptor.data_digest {
			return Err(DwnError::DataIntegrity { record_id: self.id });
		}
		Ok(data)
	}

	pub async fn data_text(&self) -> Result<String, DwnError> {
		Ok(String::from_utf8(self.data_bytes().await?)?)
	}
}

fn data_digest(data: &[u8]) -> String {
	format!("{:x}", Sha256::digest(data))
}

#[derive(thiserror::Error, Debug)]
pub enum DwnError {
	#[error("database error")]
	Database(#[from] sqlx::Error),
	#[error("failed to migrate database")]
	Migrate(#[from] MigrateError),
	#[error("invalid request: {0}")]
	InvalidRequest(&'static str),
	#[error("record {0} not found")]
	NotFound(Uuid),
	#[error("data of record {record_id} does not match its digest")]
	DataIntegrity { record_id: Uuid },
	#[error("record data is not valid utf8")]
	NotUtf8(#[from] std::string::FromUtf8Error),
}
