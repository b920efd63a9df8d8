//! Redis storage gateway
//!
//! Layout:
//! - record: HASH at `<prefix>:<id>`
//! - index bucket: SET of ids at `<prefix>:<field>:<bucket>`
//! - bucket directory: ZSET at `<prefix>:<field>` with every bucket as a
//!   score-0 member, so range scans are `ZRANGEBYLEX`
//!
//! The directory sits outside the `<prefix>:<field>:` namespace so that no
//! bucket name, the empty string included, can collide with it.
//!
//! Removing the last id from a bucket also drops the bucket from its
//! directory. Both happen in one script so a concurrent `index_add` to the
//! same bucket cannot be lost between the two steps.
//!
//! The connection manager reconnects on its own; this gateway adds no retry.

use std::collections::BTreeSet;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use crate::index::IndexEntry;

use super::errors::{StorageError, StorageResult};
use super::gateway::{Fields, ScanBounds, StorageGateway};

const SCAN_COUNT: usize = 200;

/// KEYS[1] bucket set, KEYS[2] directory; ARGV[1] id, ARGV[2] bucket
const INDEX_REMOVE_LUA: &str = r#"
redis.call('SREM', KEYS[1], ARGV[1])
if redis.call('SCARD', KEYS[1]) == 0 then
    redis.call('ZREM', KEYS[2], ARGV[2])
end
return 1
"#;

/// `user:age:` -> `user:age`
fn directory_key(index_prefix: &str) -> &str {
    index_prefix.strip_suffix(':').unwrap_or(index_prefix)
}

/// Redis-backed gateway
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    remove_script: Script,
}

impl RedisStore {
    /// Opens a managed connection to `redis://[:password@]host:port/db`.
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            remove_script: Script::new(INDEX_REMOVE_LUA),
        })
    }
}

#[async_trait]
impl StorageGateway for RedisStore {
    async fn put(&self, key: &str, fields: &Fields) -> StorageResult<()> {
        let items: Vec<(&str, &str)> = fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if !items.is_empty() {
            pipe.hset_multiple(key, &items).ignore();
        }

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Fields> {
        let mut conn = self.conn.clone();
        let fields: Fields = match conn.hgetall(key).await {
            Ok(fields) => fields,
            // Key holds an index structure, not a record
            Err(e) if e.code() == Some("WRONGTYPE") => return Err(StorageError::NotFound(key.to_string())),
            Err(e) => return Err(e.into()),
        };
        if fields.is_empty() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(fields)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        if removed == 0 {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(())
    }

    async fn scan_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", prefix);
        let mut keys = BTreeSet::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .arg("TYPE")
                .arg("hash")
                .query_async(&mut conn)
                .await?;

            keys.extend(
                batch
                    .into_iter()
                    .filter(|k| k.len() > prefix.len() && !k[prefix.len()..].contains(':')),
            );

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys.into_iter().collect())
    }

    async fn index_add(&self, entry: &IndexEntry, id: &str) -> StorageResult<()> {
        let mut pipe = redis::pipe();
        pipe.atomic()
            .sadd(entry.key(), id)
            .ignore()
            .zadd(directory_key(&entry.prefix), &entry.bucket, 0)
            .ignore();

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn index_remove(&self, entry: &IndexEntry, id: &str) -> StorageResult<()> {
        let mut invocation = self.remove_script.prepare_invoke();
        invocation
            .key(entry.key())
            .key(directory_key(&entry.prefix))
            .arg(id)
            .arg(&entry.bucket);

        let mut conn = self.conn.clone();
        let _: i64 = invocation.invoke_async(&mut conn).await?;
        Ok(())
    }

    async fn index_members(&self, entry: &IndexEntry) -> StorageResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut ids: Vec<String> = conn.smembers(entry.key()).await?;
        ids.sort();
        Ok(ids)
    }

    async fn index_scan(&self, prefix: &str, bounds: &ScanBounds) -> StorageResult<Vec<String>> {
        if bounds.is_inverted() {
            return Ok(Vec::new());
        }

        let min = bounds
            .lower
            .as_ref()
            .map_or_else(|| "-".to_string(), |b| format!("[{}", b));
        let max = bounds
            .upper
            .as_ref()
            .map_or_else(|| "+".to_string(), |b| format!("[{}", b));

        let mut conn = self.conn.clone();
        let buckets: Vec<String> = conn.zrangebylex(directory_key(prefix), min, max).await?;
        if buckets.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for bucket in &buckets {
            pipe.smembers(format!("{}{}", prefix, bucket));
        }
        let sets: Vec<Vec<String>> = pipe.query_async(&mut conn).await?;

        let ids: BTreeSet<String> = sets.into_iter().flatten().collect();
        Ok(ids.into_iter().collect())
    }

    async fn ping(&self) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests below the first one need a server; they run only when REDIS_URL is set
    // and keep their keys under a per-test namespace.

    struct Fixture {
        store: RedisStore,
        ns: String,
    }

    impl Fixture {
        async fn new() -> Option<Self> {
            let url = std::env::var("REDIS_URL").ok()?;
            let store = RedisStore::connect(&url).await.unwrap();
            let ns = format!("omtest{}", uuid::Uuid::new_v4().simple());
            Some(Self { store, ns })
        }

        fn key(&self, suffix: &str) -> String {
            format!("{}:{}", self.ns, suffix)
        }

        fn entry(&self, field: &str, bucket: &str) -> IndexEntry {
            IndexEntry {
                field: field.to_string(),
                prefix: format!("{}:{}:", self.ns, field),
                bucket: bucket.to_string(),
            }
        }

        async fn directory(&self, field: &str) -> Vec<String> {
            let mut conn = self.store.conn.clone();
            conn.zrange(self.key(field), 0, -1).await.unwrap()
        }

        async fn cleanup(self) {
            let mut conn = self.store.conn.clone();
            let keys: Vec<String> = conn.keys(format!("{}*", self.ns)).await.unwrap();
            if !keys.is_empty() {
                let _: i64 = conn.del(keys).await.unwrap();
            }
        }
    }

    fn fields(name: &str) -> Fields {
        let mut f = Fields::new();
        f.insert("name".to_string(), name.to_string());
        f
    }

    #[test]
    fn test_directory_key_outside_bucket_namespace() {
        assert_eq!(directory_key("user:city:"), "user:city");
        // Empty-string bucket key differs from the directory
        assert_ne!(format!("{}{}", "user:city:", ""), directory_key("user:city:"));
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let Some(fx) = Fixture::new().await else { return };
        let key = fx.key("1");

        fx.store.put(&key, &fields("Ana")).await.unwrap();
        assert_eq!(fx.store.get(&key).await.unwrap(), fields("Ana"));

        let mut replacement = Fields::new();
        replacement.insert("city".to_string(), "Lima".to_string());
        fx.store.put(&key, &replacement).await.unwrap();
        assert_eq!(fx.store.get(&key).await.unwrap(), replacement);

        fx.store.delete(&key).await.unwrap();
        assert!(fx.store.get(&key).await.unwrap_err().is_not_found());
        assert!(fx.store.delete(&key).await.unwrap_err().is_not_found());

        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_get_on_index_key_is_not_found() {
        let Some(fx) = Fixture::new().await else { return };
        let lima = fx.entry("city", "Lima");
        fx.store.index_add(&lima, "1").await.unwrap();

        assert!(fx.store.get(&lima.key()).await.unwrap_err().is_not_found());
        assert!(fx.store.get(&fx.key("city")).await.unwrap_err().is_not_found());

        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_scan_keys_only_records() {
        let Some(fx) = Fixture::new().await else { return };
        fx.store.put(&fx.key("1"), &fields("a")).await.unwrap();
        fx.store.put(&fx.key("2"), &fields("b")).await.unwrap();
        fx.store.put(&fx.key("nested:3"), &fields("c")).await.unwrap();
        fx.store.index_add(&fx.entry("city", "Lima"), "1").await.unwrap();

        let prefix = format!("{}:", fx.ns);
        assert_eq!(
            fx.store.scan_keys(&prefix).await.unwrap(),
            vec![fx.key("1"), fx.key("2")]
        );

        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_index_scan_bounds() {
        let Some(fx) = Fixture::new().await else { return };
        for (bucket, id) in [("", "0"), ("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")] {
            fx.store.index_add(&fx.entry("x", bucket), id).await.unwrap();
        }
        let prefix = format!("{}:x:", fx.ns);

        let ids = fx
            .store
            .index_scan(&prefix, &ScanBounds::new(Some("b".into()), Some("c".into())))
            .await
            .unwrap();
        assert_eq!(ids, vec!["2", "3"]);

        let ids = fx
            .store
            .index_scan(&prefix, &ScanBounds::new(None, Some("a".into())))
            .await
            .unwrap();
        assert_eq!(ids, vec!["0", "1"]);

        let ids = fx
            .store
            .index_scan(&prefix, &ScanBounds::new(Some("z".into()), Some("a".into())))
            .await
            .unwrap();
        assert!(ids.is_empty());

        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_last_removal_drops_bucket_from_directory() {
        let Some(fx) = Fixture::new().await else { return };
        let lima = fx.entry("city", "Lima");
        fx.store.index_add(&lima, "1").await.unwrap();
        fx.store.index_add(&lima, "2").await.unwrap();

        fx.store.index_remove(&lima, "1").await.unwrap();
        assert_eq!(fx.directory("city").await, vec!["Lima"]);

        fx.store.index_remove(&lima, "2").await.unwrap();
        assert!(fx.directory("city").await.is_empty());
        assert!(fx.store.index_members(&lima).await.unwrap().is_empty());

        fx.cleanup().await;
    }

    #[tokio::test]
    async fn test_concurrent_remove_and_add_keep_bucket_listed() {
        let Some(fx) = Fixture::new().await else { return };
        let prefix = format!("{}:age:", fx.ns);

        for round in 0..50 {
            let bucket = format!("b{:03}", round);
            let entry = fx.entry("age", &bucket);
            fx.store.index_add(&entry, "a").await.unwrap();

            let (removed, added) = tokio::join!(
                fx.store.index_remove(&entry, "a"),
                fx.store.index_add(&entry, "b"),
            );
            removed.unwrap();
            added.unwrap();

            let bounds = ScanBounds::new(Some(bucket.clone()), Some(bucket.clone()));
            assert_eq!(fx.store.index_scan(&prefix, &bounds).await.unwrap(), vec!["b"], "round {}", round);
        }

        fx.cleanup().await;
    }
}
