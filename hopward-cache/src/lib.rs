use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use hopward_proto::packet::question::Question;
use hopward_proto::packet::DnsPacket;

#[derive(Debug)]
pub enum CacheError {
    Io(std::io::Error),
    Codec(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cache snapshot io error: {err}"),
            Self::Codec(err) => write!(f, "cache snapshot codec error: {err}"),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<std::io::Error> for CacheError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct Snapshot {
    maxsize: usize,
    entries: Vec<(Question, DnsPacket, SystemTime)>,
}

struct Inner {
    maxsize: usize,
    order: VecDeque<Question>,
    entries: HashMap<Question, (DnsPacket, SystemTime)>,
}

impl Inner {
    fn sweep(&mut self, now: SystemTime) {
        self.order.retain(|key| match self.entries.get(key) {
            Some((_, expires_at)) if *expires_at > now => true,
            _ => {
                self.entries.remove(key);
                false
            }
        });
    }

    fn remove(&mut self, key: &Question) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|item| item != key);
        }
    }

    fn insert(&mut self, key: Question, value: DnsPacket, expires_at: SystemTime) {
        self.remove(&key);
        if self.order.len() >= self.maxsize {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, (value, expires_at));
    }
}

/// TTL-bounded, FIFO-eviction cache keyed by `Question`. A single
/// `std::sync::Mutex` guards the whole map; every public method takes the
/// lock once for its entire body so an internal sweep never tries to
/// re-acquire it, giving the same net effect as a reentrant lock without
/// needing one.
pub struct Cache {
    inner: Mutex<Inner>,
}

impl Cache {
    pub fn new(maxsize: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                maxsize,
                order: VecDeque::new(),
                entries: HashMap::new(),
            }),
        }
    }

    /// Sweeps expired entries, then returns a clone of the current value for
    /// `key` if present and unexpired. Reading never reorders entries: this
    /// is FIFO-by-insertion, not LRU.
    pub fn get(&self, key: &Question) -> Option<DnsPacket> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.sweep(SystemTime::now());
        inner.entries.get(key).map(|(value, _)| value.clone())
    }

    /// Records `now + ttl_seconds` as the absolute expiration. Replacing an
    /// existing key removes it first so it's reinserted at the back of the
    /// insertion queue; a new key evicts the oldest entry once the cache is
    /// at `maxsize`.
    pub fn put(&self, key: Question, value: DnsPacket, ttl_seconds: u32) {
        let expires_at = SystemTime::now() + Duration::from_secs(ttl_seconds as u64);
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.insert(key, value, expires_at);
    }

    /// Drops all entries whose expiration has passed. Intended to be called
    /// once per second from a background task, in addition to the implicit
    /// sweep `get` performs.
    pub fn sweep(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.sweep(SystemTime::now());
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically snapshots `{maxsize, entries}` to `path`: write to a
    /// sibling temp file, then rename over the destination.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        let entries = inner
            .order
            .iter()
            .filter_map(|key| {
                inner
                    .entries
                    .get(key)
                    .map(|(value, expires_at)| (key.clone(), value.clone(), *expires_at))
            })
            .collect();
        let snapshot = Snapshot {
            maxsize: inner.maxsize,
            entries,
        };
        drop(inner);

        let bytes = bincode::serde::encode_to_vec(&snapshot, bincode::config::standard())
            .map_err(|err| CacheError::Codec(err.to_string()))?;

        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, bytes)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Restores from `path`; any read or deserialize error yields a fresh
    /// empty cache sized `default_maxsize` rather than a fatal error, since a
    /// missing or corrupt snapshot at startup is never fatal.
    pub fn load(path: &Path, default_maxsize: usize) -> Self {
        match Self::try_load(path) {
            Ok(cache) => cache,
            Err(err) => {
                tracing::warn!(%err, path = %path.display(), "failed to load cache snapshot, starting empty");
                Self::new(default_maxsize)
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self, CacheError> {
        let bytes = std::fs::read(path)?;
        let (snapshot, _): (Snapshot, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|err| CacheError::Codec(err.to_string()))?;

        let mut order = VecDeque::with_capacity(snapshot.entries.len());
        let mut entries = HashMap::with_capacity(snapshot.entries.len());
        for (key, value, expires_at) in snapshot.entries {
            order.push_back(key.clone());
            entries.insert(key, (value, expires_at));
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                maxsize: snapshot.maxsize,
                order,
                entries,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopward_proto::packet::header::Header;
    use hopward_proto::packet::question::Question;
    use hopward_proto::packet::QueryType;

    fn packet_for(name: &str) -> DnsPacket {
        DnsPacket::new(Header::response(1)).with_question(Question::new(name.into(), QueryType::A))
    }

    #[test]
    fn should_return_stored_value_before_expiry() {
        let cache = Cache::new(10);
        let key = Question::new("example.com".into(), QueryType::A);
        cache.put(key.clone(), packet_for("example.com"), 60);
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn should_not_return_expired_entry() {
        let cache = Cache::new(10);
        let key = Question::new("example.com".into(), QueryType::A);
        cache.put(key.clone(), packet_for("example.com"), 0);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn should_evict_oldest_entry_when_full() {
        let cache = Cache::new(2);
        let a = Question::new("a.com".into(), QueryType::A);
        let b = Question::new("b.com".into(), QueryType::A);
        let c = Question::new("c.com".into(), QueryType::A);

        cache.put(a.clone(), packet_for("a.com"), 60);
        cache.put(b.clone(), packet_for("b.com"), 60);
        cache.put(c.clone(), packet_for("c.com"), 60);

        assert!(cache.get(&a).is_none());
        assert!(cache.get(&b).is_some());
        assert!(cache.get(&c).is_some());
    }

    #[test]
    fn replacing_a_key_refreshes_its_eviction_position() {
        let cache = Cache::new(2);
        let a = Question::new("a.com".into(), QueryType::A);
        let b = Question::new("b.com".into(), QueryType::A);

        cache.put(a.clone(), packet_for("a.com"), 60);
        cache.put(b.clone(), packet_for("b.com"), 60);
        cache.put(a.clone(), packet_for("a.com"), 60);

        let c = Question::new("c.com".into(), QueryType::A);
        cache.put(c.clone(), packet_for("c.com"), 60);

        assert!(cache.get(&b).is_none());
        assert!(cache.get(&a).is_some());
        assert!(cache.get(&c).is_some());
    }

    #[test]
    fn should_round_trip_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.bin");

        let cache = Cache::new(5);
        let key = Question::new("example.com".into(), QueryType::A);
        cache.put(key.clone(), packet_for("example.com"), 300);
        cache.save(&path).unwrap();

        let loaded = Cache::load(&path, 5);
        assert!(loaded.get(&key).is_some());
    }

    #[test]
    fn load_falls_back_to_empty_cache_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.bin");

        let cache = Cache::load(&path, 7);
        assert_eq!(cache.len(), 0);
    }
}
