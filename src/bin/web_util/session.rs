use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use std::time::{Duration, Instant};

use warp::{reject, Filter};

/// Sessions unused for this long are dropped
const SESSION_TTL: Duration = Duration::from_secs(30 * 60);
/// Most sessions kept at once, the least recently used one makes room for a new one
const MAX_SESSIONS: usize = 256;

/// State kept between requests of one browser session
pub struct Session<S> {
    pub id: u64,
    state: Arc<Mutex<S>>,
}

impl<S> Session<S> {
    /// A poisoned session is still usable, every request leaves it consistent
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Finds the live session named by the `id` query parameter. Without an id, or with one this
/// server hasn't issued or has since dropped, a new session is started under a new id.
pub fn with_session<S, F>(
    factory: F,
) -> impl Filter<Extract = (Session<S>,), Error = reject::Rejection> + Clone
where
    S: Send + 'static,
    F: Fn() -> S + Send + Sync + 'static,
{
    let container = Arc::new(SessionContainer::new(factory, SESSION_TTL, MAX_SESSIONS));
    warp::query::<SessionKey>().map(move |key: SessionKey| container.session(key))
}

struct Entry<S> {
    state: Arc<Mutex<S>>,
    last_used: Instant,
}

struct SessionContainer<S, F> {
    map: Mutex<HashMap<u64, Entry<S>>>,
    next_session_id: AtomicU64,
    factory: F,
    ttl: Duration,
    capacity: usize,
}

#[derive(serde::Deserialize)]
struct SessionKey {
    id: Option<u64>,
}

impl<S, F: Fn() -> S> SessionContainer<S, F> {
    fn new(factory: F, ttl: Duration, capacity: usize) -> SessionContainer<S, F> {
        SessionContainer {
            map: Mutex::new(HashMap::new()),
            next_session_id: AtomicU64::new(1000),
            factory,
            ttl,
            capacity: capacity.max(1),
        }
    }

    fn session(&self, key: SessionKey) -> Session<S> {
        self.session_at(key, Instant::now())
    }

    fn session_at(&self, key: SessionKey, now: Instant) -> Session<S> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        let ttl = self.ttl;
        map.retain(|_, entry| now.saturating_duration_since(entry.last_used) < ttl);

        if let Some(id) = key.id {
            if let Some(entry) = map.get_mut(&id) {
                entry.last_used = now;
                return Session {
                    id,
                    state: entry.state.clone(),
                };
            }
            log::debug!("Session {} is unknown or expired, starting a new one", id);
        }

        if map.len() >= self.capacity {
            let oldest = map
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                log::debug!("Dropping session {} to make room", oldest);
                map.remove(&oldest);
            }
        }

        let id = self.new_session_id();
        log::debug!("Starting session {}", id);
        let state = Arc::new(Mutex::new((self.factory)()));
        map.insert(
            id,
            Entry {
                state: state.clone(),
                last_used: now,
            },
        );
        Session { id, state }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.map.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn new_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::SeqCst)
    }
}
