use crate::actions::{self, Action, ActionContext};
use crate::catalog::Catalog;
use crate::entities::character::Character;
use crate::error::EngineError;
use crate::ids::IdGenerator;
use crate::inventory::changes::ProfileChangesEvent;
use crate::inventory::state::CharacterState;
use crate::persistence::store::ProfileStore;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// One live character. `committed` is bumped under the `state` lock, so a
/// higher version always holds every earlier commit; `saved` remembers the
/// newest version written and keeps older snapshots from overwriting it.
struct LiveCharacter {
    state: Mutex<CharacterState>,
    committed: AtomicU64,
    saved: Mutex<u64>,
}

impl LiveCharacter {
    fn new(state: CharacterState) -> Self {
        Self {
            state: Mutex::new(state),
            committed: AtomicU64::new(0),
            saved: Mutex::new(0),
        }
    }
}

type SharedState = Arc<LiveCharacter>;

/// Live characters keyed by session id. Actions on one character run one at
/// a time under that character's lock; different characters do not contend
/// beyond the short registry lookup.
pub struct SessionRegistry {
    catalog: Arc<Catalog>,
    store: Arc<dyn ProfileStore>,
    ids: Arc<dyn IdGenerator>,
    sessions: Mutex<LruCache<String, SharedState>>,
}

impl SessionRegistry {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn ProfileStore>,
        ids: Arc<dyn IdGenerator>,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            catalog,
            store,
            ids,
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn sessions(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, SharedState>>, EngineError> {
        self.sessions
            .lock()
            .map_err(|_| EngineError::LockPoisoned("session registry".to_string()))
    }

    fn state(&self, session: &str) -> Result<SharedState, EngineError> {
        if let Some(state) = self.sessions()?.get(session) {
            return Ok(Arc::clone(state));
        }

        let character = self.store.load_character(session).map_err(EngineError::Load)?;
        let loaded = CharacterState::load(character, self.catalog.items())?;

        let mut sessions = self.sessions()?;
        // A concurrent caller may have loaded the same session meanwhile.
        if let Some(state) = sessions.get(session) {
            return Ok(Arc::clone(state));
        }
        let state = Arc::new(LiveCharacter::new(loaded));
        if let Some((evicted, _)) = sessions.push(session.to_string(), Arc::clone(&state)) {
            log::debug!("session {} evicted from the live set", evicted);
        }
        log::info!("session {} loaded", session);
        Ok(state)
    }

    /// Runs `f` against the live state of `session`, loading it if needed.
    pub fn with_character<T>(
        &self,
        session: &str,
        f: impl FnOnce(&CharacterState) -> T,
    ) -> Result<T, EngineError> {
        let live = self.state(session)?;
        let state = live
            .state
            .lock()
            .map_err(|_| EngineError::LockPoisoned(session.to_string()))?;
        Ok(f(&state))
    }

    /// Applies one action and persists the result. A failed save leaves the
    /// committed in-memory state and its diff in place.
    pub fn handle(
        &self,
        session: &str,
        action: &Action,
        event: &mut ProfileChangesEvent,
    ) -> Result<(), EngineError> {
        let live = self.state(session)?;
        let (version, committed) = {
            let mut state = live
                .state
                .lock()
                .map_err(|_| EngineError::LockPoisoned(session.to_string()))?;
            let ctx = ActionContext {
                catalog: &self.catalog,
                ids: self.ids.as_ref(),
            };
            let character_id = state.character().id.clone();
            actions::apply(ctx, &mut state, action, event.changes_for(&character_id))?;
            let version = live.committed.fetch_add(1, Ordering::SeqCst) + 1;
            (version, state.character().clone())
        };
        self.persist(session, &live, version, &committed)
    }

    /// Writes the snapshot of commit `version` unless a newer one is already
    /// on disk. Saves of one character never run concurrently.
    fn persist(
        &self,
        session: &str,
        live: &LiveCharacter,
        version: u64,
        committed: &Character,
    ) -> Result<(), EngineError> {
        let mut saved = live
            .saved
            .lock()
            .map_err(|_| EngineError::LockPoisoned(session.to_string()))?;
        if *saved >= version {
            log::debug!("session {} commit {} superseded by {}", session, version, *saved);
            return Ok(());
        }
        self.store.save_character(session, committed).map_err(|err| {
            log::error!("saving session {} failed: {}", session, err);
            EngineError::Persist(err)
        })?;
        *saved = version;
        Ok(())
    }

    /// Decodes and applies every payload in order. Failures become warnings
    /// carrying the payload index; later payloads still run.
    pub fn handle_batch(
        &self,
        session: &str,
        payloads: &[serde_json::Value],
        event: &mut ProfileChangesEvent,
    ) {
        for (index, payload) in payloads.iter().enumerate() {
            let result = Action::decode(payload.clone())
                .map_err(EngineError::from)
                .and_then(|action| self.handle(session, &action, event));
            if let Err(err) = result {
                log::warn!("session {} action {} failed: {}", session, index, err);
                event.warn(index, err.to_string());
            }
        }
    }
}
