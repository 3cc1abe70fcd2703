//! In-process backend implementation
//! 进程内后端实现
//!
//! Mirrors the hosted backend closely enough for offline runs and tests:
//! ordered selects with equality filters, the composite content RPC, bucket
//! objects with public URLs, and password sessions. Failures can be injected
//! per table, per function and per bucket, and every call is counted.
//! 足以模拟托管后端用于离线运行和测试：支持有序查询、组合RPC、存储桶对象和密码会话。
//! 可以按表、函数和存储桶注入失败，并统计每次调用。

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{
    AuthService, AuthUser, BackendError, BackendResult, ContentBackend, FileUpload, ListOptions,
    ObjectInfo, ObjectStorage, SelectQuery, Session,
};
use crate::constants::{tables, PUBLIC_OBJECT_PATH, SITE_CONTENT_RPC};

/// Base URL used for public object URLs / 公共对象URL使用的基础地址
pub const MEMORY_PUBLIC_BASE: &str = "http://memory.local";

/// Tables the composite RPC returns as single objects / 组合RPC以单对象返回的表
const SINGLETON_TABLES: [&str; 4] = [
    tables::HERO_CONTENT,
    tables::ABOUT_CONTENT,
    tables::ONBOARDING_CONTENT,
    tables::FOOTER_CONTENT,
];

/// Tables the composite RPC returns as arrays, with their sort column
/// 组合RPC以数组返回的表及其排序列
const COLLECTION_TABLES: [(&str, Option<&str>); 6] = [
    (tables::STATISTICS, Some("order")),
    (tables::TEAM_MEMBERS, Some("order")),
    (tables::EVENTS, Some("day")),
    (tables::GALLERY_IMAGES, Some("order")),
    (tables::SECTION_CONTENT, None),
    (tables::BUTTON_LABELS, None),
];

#[derive(Debug, Clone)]
enum RpcHandler {
    /// Assemble the site content object from the current tables / 从当前表组装站点内容
    SiteContent,
    Fixed(Value),
}

#[derive(Debug, Clone)]
struct StoredObject {
    id: String,
    path: String,
    size: u64,
    created_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Clone)]
struct UserRecord {
    id: String,
    email: String,
    password: String,
}

/// Call counters / 调用计数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub selects: BTreeMap<String, usize>,
    pub rpcs: usize,
    pub writes: usize,
    pub uploads: usize,
    pub removes: usize,
    pub sign_ins: usize,
    pub sign_outs: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<String, Vec<Value>>,
    functions: HashMap<String, RpcHandler>,
    failing_tables: HashMap<String, String>,
    failing_functions: HashMap<String, String>,
    failing_buckets: HashMap<String, String>,
    buckets: BTreeMap<String, Vec<StoredObject>>,
    users: HashMap<String, UserRecord>,
    session: Option<Session>,
    calls: CallCounts,
    seq: u64,
}

/// Seed file layout / 种子文件结构
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    /// Rows per table; an object is accepted for single-row tables / 每张表的行
    pub tables: BTreeMap<String, Value>,
    /// Accounts that may sign in / 可登录的账户
    pub users: Vec<FixtureUser>,
    /// Serve the composite content RPC / 是否提供组合内容RPC
    pub site_content_rpc: bool,
}

#[derive(Debug, Deserialize)]
pub struct FixtureUser {
    pub email: String,
    pub password: String,
}

/// In-memory backend / 内存后端
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    /// Create an empty backend / 创建空后端
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a backend from a fixture / 从种子数据构建后端
    pub fn from_fixture(fixture: Fixture) -> Self {
        let backend = Self::new();
        for (table, rows) in fixture.tables {
            let rows = match rows {
                Value::Array(rows) => rows,
                Value::Null => Vec::new(),
                single => vec![single],
            };
            backend.set_table(&table, rows);
        }
        for user in fixture.users {
            backend.add_user(&user.email, &user.password);
        }
        if fixture.site_content_rpc {
            backend.enable_site_content_rpc();
        }
        backend
    }

    /// Load a fixture file / 加载种子文件
    pub fn from_fixture_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&raw)?;
        Ok(Self::from_fixture(fixture))
    }

    /// Builder form of [`set_table`](Self::set_table) / [`set_table`](Self::set_table) 的构建器形式
    pub fn with_table(self, table: &str, rows: Vec<Value>) -> Self {
        self.set_table(table, rows);
        self
    }

    /// Replace the rows of a table / 替换表中的行
    pub fn set_table(&self, table: &str, rows: Vec<Value>) {
        self.state.write().tables.insert(table.to_string(), rows);
    }

    /// Current rows of a table / 表的当前行
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .read()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Serve `get_all_site_content` from the current tables / 基于当前表提供组合RPC
    pub fn enable_site_content_rpc(&self) {
        self.state
            .write()
            .functions
            .insert(SITE_CONTENT_RPC.to_string(), RpcHandler::SiteContent);
    }

    /// Answer a function with a fixed payload / 为函数设置固定返回值
    pub fn set_rpc_response(&self, function: &str, value: Value) {
        self.state
            .write()
            .functions
            .insert(function.to_string(), RpcHandler::Fixed(value));
    }

    /// Make every read and write on a table fail / 使某张表的所有读写失败
    pub fn fail_table(&self, table: &str, message: &str) {
        self.state
            .write()
            .failing_tables
            .insert(table.to_string(), message.to_string());
    }

    /// Make a function call fail / 使函数调用失败
    pub fn fail_rpc(&self, function: &str, message: &str) {
        self.state
            .write()
            .failing_functions
            .insert(function.to_string(), message.to_string());
    }

    /// Make every operation on a bucket fail / 使某个存储桶的所有操作失败
    pub fn fail_bucket(&self, bucket: &str, message: &str) {
        self.state
            .write()
            .failing_buckets
            .insert(bucket.to_string(), message.to_string());
    }

    /// Remove all injected failures / 清除所有注入的失败
    pub fn clear_failures(&self) {
        let mut state = self.state.write();
        state.failing_tables.clear();
        state.failing_functions.clear();
        state.failing_buckets.clear();
    }

    /// Register an account / 注册账户
    pub fn add_user(&self, email: &str, password: &str) {
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.state
            .write()
            .users
            .insert(email.to_ascii_lowercase(), record);
    }

    /// Snapshot of the call counters / 调用计数快照
    pub fn calls(&self) -> CallCounts {
        self.state.read().calls.clone()
    }

    /// Number of selects issued against a table / 针对某表的查询次数
    pub fn select_count(&self, table: &str) -> usize {
        self.state
            .read()
            .calls
            .selects
            .get(table)
            .copied()
            .unwrap_or(0)
    }

    /// Paths stored in a bucket / 存储桶中的对象路径
    pub fn object_paths(&self, bucket: &str) -> Vec<String> {
        self.state
            .read()
            .buckets
            .get(bucket)
            .map(|objects| objects.iter().map(|o| o.path.clone()).collect())
            .unwrap_or_default()
    }

    /// Put an object directly, bypassing counters / 直接写入对象（不计数）
    pub fn put_object(&self, bucket: &str, path: &str, size: u64) {
        let mut state = self.state.write();
        state.seq += 1;
        let seq = state.seq;
        state
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .push(StoredObject {
                id: Uuid::new_v4().to_string(),
                path: path.to_string(),
                size,
                created_at: Utc::now(),
                seq,
            });
    }

    fn site_content(state: &MemoryState) -> Value {
        let mut out = Map::new();
        for table in SINGLETON_TABLES {
            let row = state
                .tables
                .get(table)
                .and_then(|rows| rows.first().cloned())
                .unwrap_or(Value::Null);
            out.insert(table.to_string(), row);
        }
        for (table, order) in COLLECTION_TABLES {
            let mut rows = state.tables.get(table).cloned().unwrap_or_default();
            if let Some(column) = order {
                rows.sort_by(|a, b| compare_column(a, b, column));
            }
            out.insert(table.to_string(), Value::Array(rows));
        }
        Value::Object(out)
    }
}

fn not_found(message: String) -> BackendError {
    BackendError::Status {
        status: 404,
        message,
    }
}

fn failure(message: &str) -> BackendError {
    BackendError::Status {
        status: 500,
        message: message.to_string(),
    }
}

/// Compare two rows by a column; nulls and missing values sort last
/// 按列比较两行；空值和缺失值排在最后
fn compare_column(a: &Value, b: &Value, column: &str) -> Ordering {
    let left = a.get(column).filter(|v| !v.is_null());
    let right = b.get(column).filter(|v| !v.is_null());
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn cell_matches(row: &Value, column: &str, expected: &str) -> bool {
    match row.get(column) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == expected,
    }
}

fn project(row: &Value, columns: &str) -> Value {
    if columns.trim() == "*" {
        return row.clone();
    }
    let mut out = Map::new();
    for column in columns.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if let Some(v) = row.get(column) {
            out.insert(column.to_string(), v.clone());
        }
    }
    Value::Object(out)
}

#[async_trait]
impl ContentBackend for MemoryBackend {
    async fn select(&self, table: &str, query: &SelectQuery) -> BackendResult<Vec<Value>> {
        let mut state = self.state.write();
        *state.calls.selects.entry(table.to_string()).or_insert(0) += 1;

        if let Some(message) = state.failing_tables.get(table) {
            return Err(failure(message));
        }
        let Some(rows) = state.tables.get(table) else {
            return Err(not_found(format!(
                "relation \"public.{}\" does not exist",
                table
            )));
        };

        let mut selected: Vec<Value> = rows
            .iter()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|(column, value)| cell_matches(row, column, value))
            })
            .cloned()
            .collect();

        if let Some(order) = &query.order {
            selected.sort_by(|a, b| {
                let ord = compare_column(a, b, &order.column);
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            selected.truncate(limit);
        }

        Ok(selected
            .iter()
            .map(|row| project(row, &query.columns))
            .collect())
    }

    async fn rpc(&self, function: &str) -> BackendResult<Value> {
        let mut state = self.state.write();
        state.calls.rpcs += 1;

        if let Some(message) = state.failing_functions.get(function) {
            return Err(failure(message));
        }
        match state.functions.get(function) {
            Some(RpcHandler::SiteContent) => Ok(Self::site_content(&state)),
            Some(RpcHandler::Fixed(value)) => Ok(value.clone()),
            None => Err(not_found(format!(
                "Could not find the function public.{} without parameters",
                function
            ))),
        }
    }

    async fn insert(&self, table: &str, row: &Value) -> BackendResult<()> {
        let mut state = self.state.write();
        state.calls.writes += 1;

        if let Some(message) = state.failing_tables.get(table) {
            return Err(failure(message));
        }
        let Value::Object(fields) = row else {
            return Err(BackendError::Status {
                status: 400,
                message: "row must be a JSON object".to_string(),
            });
        };

        let mut fields = fields.clone();
        let rows = state.tables.entry(table.to_string()).or_default();
        match fields.get("id") {
            Some(Value::Null) | None => {
                fields.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
            }
            Some(id) => {
                if rows.iter().any(|r| r.get("id") == Some(id)) {
                    return Err(BackendError::Status {
                        status: 409,
                        message: format!(
                            "duplicate key value violates unique constraint \"{}_pkey\"",
                            table
                        ),
                    });
                }
            }
        }
        fields
            .entry("created_at".to_string())
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        rows.push(Value::Object(fields));
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        column: &str,
        value: &str,
        patch: &Value,
    ) -> BackendResult<()> {
        let mut state = self.state.write();
        state.calls.writes += 1;

        if let Some(message) = state.failing_tables.get(table) {
            return Err(failure(message));
        }
        let Some(patch) = patch.as_object() else {
            return Err(BackendError::Status {
                status: 400,
                message: "patch must be a JSON object".to_string(),
            });
        };
        let Some(rows) = state.tables.get_mut(table) else {
            return Err(not_found(format!(
                "relation \"public.{}\" does not exist",
                table
            )));
        };
        for row in rows.iter_mut().filter(|r| cell_matches(r, column, value)) {
            if let Some(fields) = row.as_object_mut() {
                for (k, v) in patch {
                    fields.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, column: &str, value: &str) -> BackendResult<()> {
        let mut state = self.state.write();
        state.calls.writes += 1;

        if let Some(message) = state.failing_tables.get(table) {
            return Err(failure(message));
        }
        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|r| !cell_matches(r, column, value));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MemoryBackend {
    async fn upload(&self, bucket: &str, path: &str, file: &FileUpload) -> BackendResult<()> {
        let mut state = self.state.write();
        state.calls.uploads += 1;

        if let Some(message) = state.failing_buckets.get(bucket) {
            return Err(failure(message));
        }
        if state
            .buckets
            .get(bucket)
            .is_some_and(|objects| objects.iter().any(|o| o.path == path))
        {
            return Err(BackendError::Status {
                status: 409,
                message: "The resource already exists".to_string(),
            });
        }
        state.seq += 1;
        let seq = state.seq;
        state
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .push(StoredObject {
                id: Uuid::new_v4().to_string(),
                path: path.to_string(),
                size: file.bytes.len() as u64,
                created_at: Utc::now(),
                seq,
            });
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> BackendResult<()> {
        let mut state = self.state.write();
        state.calls.removes += 1;

        if let Some(message) = state.failing_buckets.get(bucket) {
            return Err(failure(message));
        }
        if let Some(objects) = state.buckets.get_mut(bucket) {
            objects.retain(|o| !paths.contains(&o.path));
        }
        Ok(())
    }

    async fn list(&self, bucket: &str, options: &ListOptions) -> BackendResult<Vec<ObjectInfo>> {
        let state = self.state.read();

        if let Some(message) = state.failing_buckets.get(bucket) {
            return Err(failure(message));
        }
        let mut objects: Vec<&StoredObject> = state
            .buckets
            .get(bucket)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|o| o.path.starts_with(&options.prefix))
                    .collect()
            })
            .unwrap_or_default();

        objects.sort_by_key(|o| (o.created_at, o.seq));
        if options.newest_first {
            objects.reverse();
        }

        Ok(objects
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .map(|o| ObjectInfo {
                id: Some(o.id.clone()),
                name: o.path.clone(),
                size: Some(o.size),
                created_at: Some(o.created_at.to_rfc3339()),
            })
            .collect())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}{}{}/{}",
            MEMORY_PUBLIC_BASE,
            PUBLIC_OBJECT_PATH,
            bucket,
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl AuthService for MemoryBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session> {
        let mut state = self.state.write();
        state.calls.sign_ins += 1;

        let user = state
            .users
            .get(&email.to_ascii_lowercase())
            .filter(|u| u.password == password)
            .cloned()
            .ok_or_else(|| BackendError::Status {
                status: 400,
                message: "Invalid login credentials".to_string(),
            })?;

        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_in: Some(3600),
            user: AuthUser {
                id: user.id,
                email: Some(user.email),
            },
        };
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<Session> {
        let mut state = self.state.write();
        let current = state
            .session
            .clone()
            .filter(|s| s.refresh_token.as_deref() == Some(refresh_token))
            .ok_or_else(|| BackendError::Status {
                status: 400,
                message: "Invalid Refresh Token".to_string(),
            })?;

        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Some(Uuid::new_v4().to_string()),
            ..current
        };
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        let mut state = self.state.write();
        state.calls.sign_outs += 1;
        state.session = None;
        Ok(())
    }

    fn current_session(&self) -> Option<Session> {
        self.state.read().session.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_select_orders_filters_and_projects() {
        let backend = MemoryBackend::new().with_table(
            "statistics",
            vec![
                json!({"id": "a", "label": "Events", "value": "20+", "order": 2}),
                json!({"id": "b", "label": "Days", "value": "2", "order": 1}),
                json!({"id": "c", "label": "Prizes", "value": "1L", "order": null}),
            ],
        );

        let rows = backend
            .select("statistics", &SelectQuery::all().order_asc("order"))
            .await
            .unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        let rows = backend
            .select("statistics", &SelectQuery::columns("label").eq("id", "a"))
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"label": "Events"})]);
        assert_eq!(backend.select_count("statistics"), 2);
    }

    #[tokio::test]
    async fn test_select_missing_table_is_an_error() {
        let backend = MemoryBackend::new();
        let err = backend
            .select("events", &SelectQuery::all())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_rejects_duplicates() {
        let backend = MemoryBackend::new();
        backend
            .insert("gallery_images", &json!({"image_url": "x.png"}))
            .await
            .unwrap();
        let rows = backend.rows("gallery_images");
        assert!(rows[0]["id"].as_str().is_some());
        assert!(rows[0]["created_at"].as_str().is_some());

        backend
            .insert("events", &json!({"id": "heist", "title": "Heist"}))
            .await
            .unwrap();
        let err = backend
            .insert("events", &json!({"id": "heist", "title": "Heist"}))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
    }

    #[tokio::test]
    async fn test_update_and_delete_by_column() {
        let backend = MemoryBackend::new().with_table(
            "team_members",
            vec![json!({"id": 1, "name": "A"}), json!({"id": 2, "name": "B"})],
        );
        backend
            .update("team_members", "id", "1", &json!({"name": "Alpha"}))
            .await
            .unwrap();
        backend.delete("team_members", "id", "2").await.unwrap();

        assert_eq!(
            backend.rows("team_members"),
            vec![json!({"id": 1, "name": "Alpha"})]
        );
    }

    #[tokio::test]
    async fn test_site_content_rpc_reflects_tables() {
        let backend = MemoryBackend::new()
            .with_table("hero_content", vec![json!({"id": "h"})])
            .with_table(
                "events",
                vec![json!({"id": "b", "day": 2}), json!({"id": "a", "day": 1})],
            );

        assert_eq!(backend.rpc(SITE_CONTENT_RPC).await.unwrap_err().status(), Some(404));

        backend.enable_site_content_rpc();
        let payload = backend.rpc(SITE_CONTENT_RPC).await.unwrap();
        assert_eq!(payload["hero_content"]["id"], "h");
        assert_eq!(payload["about_content"], Value::Null);
        assert_eq!(payload["events"][0]["id"], "a");
        assert_eq!(payload["statistics"], json!([]));
    }

    #[tokio::test]
    async fn test_storage_listing_newest_first() {
        let backend = MemoryBackend::new();
        for name in ["one.pdf", "two.pdf", "three.pdf"] {
            backend
                .upload("admin-documents", name, &FileUpload::new(name, vec![0u8; 4]))
                .await
                .unwrap();
        }

        let listed = backend
            .list("admin-documents", &ListOptions::newest_first(2))
            .await
            .unwrap();
        let names: Vec<&str> = listed.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["three.pdf", "two.pdf"]);
        assert_eq!(listed[0].size, Some(4));

        backend
            .remove("admin-documents", &["two.pdf".to_string()])
            .await
            .unwrap();
        assert_eq!(
            backend.object_paths("admin-documents"),
            vec!["one.pdf".to_string(), "three.pdf".to_string()]
        );
        assert_eq!(
            backend.public_url("admin-documents", "one.pdf"),
            "http://memory.local/storage/v1/object/public/admin-documents/one.pdf"
        );
    }

    #[tokio::test]
    async fn test_password_sessions() {
        let backend = MemoryBackend::new();
        backend.add_user("admin@fest.edu", "secret");

        assert!(backend
            .sign_in_with_password("admin@fest.edu", "wrong")
            .await
            .is_err());
        assert!(backend.current_session().is_none());

        let session = backend
            .sign_in_with_password("Admin@Fest.edu", "secret")
            .await
            .unwrap();
        assert_eq!(session.user.email.as_deref(), Some("admin@fest.edu"));

        let refreshed = backend
            .refresh_session(session.refresh_token.as_deref().unwrap())
            .await
            .unwrap();
        assert_ne!(refreshed.access_token, session.access_token);
        assert_eq!(refreshed.user, session.user);

        backend.sign_out().await.unwrap();
        assert!(backend.current_session().is_none());
    }

    #[test]
    fn test_fixture_accepts_single_row_objects() {
        let fixture: Fixture = serde_json::from_value(json!({
            "tables": {
                "hero_content": {"id": "h", "title": "T"},
                "events": [{"id": "e"}]
            },
            "users": [{"email": "a@b.c", "password": "p"}],
            "site_content_rpc": true
        }))
        .unwrap();

        let backend = MemoryBackend::from_fixture(fixture);
        assert_eq!(backend.rows("hero_content").len(), 1);
        assert_eq!(backend.rows("events").len(), 1);
    }
}
