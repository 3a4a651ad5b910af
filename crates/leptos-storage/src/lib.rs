//! Leptos Storage Utilities
//!
//! Mirrors one key/value storage slot as reactive state. Writers (including
//! other browser tabs) announce changes through a subscription, so every
//! consumer of a slot re-reads after any mutation. Values are JSON-encoded;
//! removing a slot is the canonical "unset", and readers fall back to a
//! caller-supplied default.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use leptos::logging::warn;
use leptos::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Storage backend failure
#[derive(Debug)]
pub enum StorageError {
    /// No usable backend in this execution context
    Unavailable(String),
    /// The backend rejected a read or write
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
            StorageError::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Slot codec failure
#[derive(Debug)]
pub enum SlotError {
    /// Stored text could not be decoded
    Decode(serde_json::Error),
    /// The next value could not be encoded
    Encode(serde_json::Error),
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotError::Decode(err) => write!(f, "slot decode error: {err}"),
            SlotError::Encode(err) => write!(f, "slot encode error: {err}"),
        }
    }
}

impl std::error::Error for SlotError {}

/// Active change subscription; dropping it unsubscribes
pub struct Subscription(Option<Box<dyn FnOnce()>>);

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(cancel)))
    }

    /// Cancel explicitly instead of waiting for drop
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.0.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.0.take() {
            cancel();
        }
    }
}

/// Raw key/value capability backing a slot
///
/// `subscribe` must deliver the new raw contents (`None` = removed) to the
/// callback whenever any writer mutates the key.
pub trait StorageBacking {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn subscribe(&self, key: &str, on_change: Rc<dyn Fn(Option<String>)>) -> Subscription;
}

/// In-memory backing, used by tests and non-browser contexts
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    slots: HashMap<String, String>,
    listeners: Vec<Listener>,
    next_listener_id: u64,
}

struct Listener {
    id: u64,
    key: String,
    on_change: Rc<dyn Fn(Option<String>)>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&self, key: &str, value: Option<&str>) {
        // Collect first: a listener may write back through the same backing
        let matching: Vec<Rc<dyn Fn(Option<String>)>> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|listener| listener.key == key)
            .map(|listener| Rc::clone(&listener.on_change))
            .collect();
        for on_change in matching {
            on_change(value.map(str::to_string));
        }
    }
}

impl StorageBacking for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.borrow().slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .borrow_mut()
            .slots
            .insert(key.to_string(), value.to_string());
        self.notify(key, Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.borrow_mut().slots.remove(key);
        self.notify(key, None);
        Ok(())
    }

    fn subscribe(&self, key: &str, on_change: Rc<dyn Fn(Option<String>)>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner.listeners.push(Listener {
                id,
                key: key.to_string(),
                on_change,
            });
            id
        };
        let inner = Rc::clone(&self.inner);
        Subscription::new(move || {
            inner.borrow_mut().listeners.retain(|listener| listener.id != id);
        })
    }
}

/// `window.localStorage` backing
///
/// Writes dispatch a synthetic `storage` event on the window so subscribers
/// in the same tab re-read; the browser fires the native event in other tabs.
#[derive(Clone)]
pub struct BrowserStorage {
    storage: web_sys::Storage,
}

impl BrowserStorage {
    /// Fails when the context has no window or no local storage
    pub fn new() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window in this context".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|_| StorageError::Unavailable("local storage access denied".to_string()))?
            .ok_or_else(|| StorageError::Unavailable("local storage is disabled".to_string()))?;
        Ok(Self { storage })
    }

    fn dispatch_change(&self, key: &str, new_value: Option<&str>) {
        let Some(window) = web_sys::window() else { return };
        let init = web_sys::StorageEventInit::new();
        init.set_key(Some(key));
        init.set_new_value(new_value);
        if let Ok(event) = web_sys::StorageEvent::new_with_event_init_dict("storage", &init) {
            let _ = window.dispatch_event(&event);
        }
    }
}

impl StorageBacking for BrowserStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|err| StorageError::Backend(format!("{err:?}")))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| StorageError::Backend(format!("{err:?}")))?;
        self.dispatch_change(key, Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|err| StorageError::Backend(format!("{err:?}")))?;
        self.dispatch_change(key, None);
        Ok(())
    }

    fn subscribe(&self, key: &str, on_change: Rc<dyn Fn(Option<String>)>) -> Subscription {
        let Some(window) = web_sys::window() else {
            return Subscription::new(|| {});
        };
        let key = key.to_string();
        let listener =
            Closure::<dyn FnMut(web_sys::StorageEvent)>::new(move |ev: web_sys::StorageEvent| {
                // key() is None when the whole store was cleared
                match ev.key() {
                    Some(changed) if changed != key => {}
                    _ => on_change(ev.new_value()),
                }
            });
        let _ = window.add_event_listener_with_callback("storage", listener.as_ref().unchecked_ref());
        Subscription::new(move || {
            let _ =
                window.remove_event_listener_with_callback("storage", listener.as_ref().unchecked_ref());
            drop(listener);
        })
    }
}

/// One write intent for a slot
///
/// A resolved `None` removes the slot instead of storing a null literal.
pub enum SlotUpdate<T> {
    /// Store this value, or remove the slot on `None`
    Value(Option<T>),
    /// Compute the next value from the previous parsed contents
    With(Box<dyn FnOnce(Option<T>) -> Option<T>>),
}

enum SlotAction {
    Write(String),
    Remove,
}

fn resolve_update<T>(update: SlotUpdate<T>, prev_raw: Option<&str>) -> Result<SlotAction, SlotError>
where
    T: Serialize + DeserializeOwned,
{
    let next = match update {
        SlotUpdate::Value(next) => next,
        SlotUpdate::With(update) => {
            let prev = match prev_raw {
                Some(raw) => Some(serde_json::from_str(raw).map_err(SlotError::Decode)?),
                None => None,
            };
            update(prev)
        }
    };
    match next {
        Some(value) => serde_json::to_string(&value)
            .map(SlotAction::Write)
            .map_err(SlotError::Encode),
        None => Ok(SlotAction::Remove),
    }
}

fn decode_or<T>(raw: Option<String>, key: &str, default: &T) -> T
where
    T: Clone + DeserializeOwned,
{
    match raw {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!("storage slot {key:?} holds malformed data: {err}");
                default.clone()
            }
        },
        None => default.clone(),
    }
}

/// Writer half of a storage slot
///
/// Keep the handle alive for as long as the paired read signal is in use;
/// dropping the last clone ends the change subscription.
#[derive(Clone)]
pub struct SlotHandle<T> {
    key: Arc<str>,
    backing: Rc<dyn StorageBacking>,
    raw: ReadSignal<Option<String>>,
    _subscription: Rc<Subscription>,
    _marker: PhantomData<fn(T)>,
}

impl<T> SlotHandle<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    /// Store a literal value
    pub fn set(&self, value: T) {
        self.apply(SlotUpdate::Value(Some(value)));
    }

    /// Remove the slot; readers fall back to their default
    pub fn clear(&self) {
        self.apply(SlotUpdate::Value(None));
    }

    /// Compute the next value from the previous one
    pub fn update(&self, update: impl FnOnce(Option<T>) -> Option<T> + 'static) {
        self.apply(SlotUpdate::With(Box::new(update)));
    }

    /// Resolve and persist one write intent
    ///
    /// Codec and backend failures are logged and leave the slot unchanged.
    pub fn apply(&self, update: SlotUpdate<T>) {
        let prev_raw = self.raw.get_untracked();
        let action = match resolve_update(update, prev_raw.as_deref()) {
            Ok(action) => action,
            Err(err) => {
                warn!("storage slot {:?} update dropped: {err}", self.key);
                return;
            }
        };
        let result = match action {
            SlotAction::Write(raw) => self.backing.write(&self.key, &raw),
            SlotAction::Remove => self.backing.remove(&self.key),
        };
        if let Err(err) = result {
            warn!("storage slot {:?} write failed: {err}", self.key);
        }
    }
}

/// Mirror one slot of `backing` as reactive state
///
/// An unset slot is seeded with `initial` (written and announced to
/// subscribers). The read signal re-evaluates whenever any writer mutates
/// the key, in this context or another tab sharing the backing.
pub fn use_storage_slot<T>(
    backing: Rc<dyn StorageBacking>,
    key: impl Into<String>,
    initial: T,
) -> (Signal<T>, SlotHandle<T>)
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let key: Arc<str> = Arc::from(key.into());

    let stored = match backing.read(&key) {
        Ok(stored) => stored,
        Err(err) => {
            warn!("storage slot {key:?} read failed: {err}");
            None
        }
    };

    let stored = match stored {
        Some(raw) => Some(raw),
        // First use of an empty slot seeds it with the initial value
        None => match serde_json::to_string(&initial) {
            Ok(raw) => {
                if let Err(err) = backing.write(&key, &raw) {
                    warn!("storage slot {key:?} seed write failed: {err}");
                }
                Some(raw)
            }
            Err(err) => {
                warn!("storage slot {key:?} seed dropped: {}", SlotError::Encode(err));
                None
            }
        },
    };

    let (raw, set_raw) = signal(stored);

    let subscription = backing.subscribe(
        &key,
        Rc::new(move |new_raw: Option<String>| set_raw.set(new_raw)),
    );

    let value = {
        let key = Arc::clone(&key);
        let initial = initial.clone();
        Signal::derive(move || decode_or(raw.get(), &key, &initial))
    };

    let handle = SlotHandle {
        key,
        backing,
        raw,
        _subscription: Rc::new(subscription),
        _marker: PhantomData,
    };

    (value, handle)
}

/// Mirror a `localStorage` slot as reactive state
///
/// Client-only: outside a browser context this fails fast with a descriptive
/// panic on first use.
pub fn use_local_storage<T>(key: impl Into<String>, initial: T) -> (Signal<T>, SlotHandle<T>)
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let backing = BrowserStorage::new()
        .unwrap_or_else(|err| panic!("use_local_storage is a client-only hook: {err}"));
    use_storage_slot(Rc::new(backing), key, initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        theme: String,
        font_size: u32,
    }

    fn prefs() -> Prefs {
        Prefs {
            theme: "dark".to_string(),
            font_size: 14,
        }
    }

    fn slot<T>(backing: &MemoryStorage, key: &str, initial: T) -> (Signal<T>, SlotHandle<T>)
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        use_storage_slot(Rc::new(backing.clone()), key, initial)
    }

    #[test]
    fn test_round_trip() {
        let backing = MemoryStorage::new();
        let (value, handle) = slot(&backing, "prefs", prefs());

        let next = Prefs {
            theme: "light".to_string(),
            font_size: 16,
        };
        handle.set(next.clone());

        assert_eq!(value.get_untracked(), next);
    }

    #[test]
    fn test_unset_slot_is_seeded() {
        let backing = MemoryStorage::new();
        let (value, _handle) = slot(&backing, "counter", 3u32);

        assert_eq!(backing.read("counter").unwrap().as_deref(), Some("3"));
        assert_eq!(value.get_untracked(), 3);
    }

    #[test]
    fn test_existing_contents_win_over_initial() {
        let backing = MemoryStorage::new();
        backing.write("counter", "41").unwrap();

        let (value, _handle) = slot(&backing, "counter", 0u32);
        assert_eq!(value.get_untracked(), 41);
    }

    #[test]
    fn test_seeding_notifies_existing_subscribers() {
        let backing = MemoryStorage::new();
        let seen = Rc::new(RefCell::new(None::<String>));
        let seen_in_listener = Rc::clone(&seen);
        let _sub = backing.subscribe(
            "counter",
            Rc::new(move |raw| *seen_in_listener.borrow_mut() = raw),
        );

        let (_value, _handle) = slot(&backing, "counter", 5u32);
        assert_eq!(seen.borrow().as_deref(), Some("5"));
    }

    #[test]
    fn test_clear_removes_slot_and_readers_fall_back() {
        let backing = MemoryStorage::new();
        let (value, handle) = slot(&backing, "counter", 7u32);

        handle.set(99);
        handle.clear();

        assert_eq!(backing.read("counter").unwrap(), None);
        assert_eq!(value.get_untracked(), 7);
    }

    #[test]
    fn test_functional_update_sees_previous_value() {
        let backing = MemoryStorage::new();
        let (value, handle) = slot(&backing, "counter", 10u32);

        handle.update(|prev| prev.map(|n| n + 5));
        assert_eq!(value.get_untracked(), 15);
    }

    #[test]
    fn test_update_resolving_to_none_removes_slot() {
        let backing = MemoryStorage::new();
        let (value, handle) = slot(&backing, "counter", 10u32);

        handle.update(|_| None);

        assert_eq!(backing.read("counter").unwrap(), None);
        assert_eq!(value.get_untracked(), 10);
    }

    #[test]
    fn test_malformed_contents_fall_back_to_default() {
        let backing = MemoryStorage::new();
        backing.write("prefs", "not json").unwrap();

        let (value, handle) = slot(&backing, "prefs", prefs());
        assert_eq!(value.get_untracked(), prefs());

        // A functional update cannot parse the previous contents either;
        // the slot is left as it was
        handle.update(|prev| prev);
        assert_eq!(backing.read("prefs").unwrap().as_deref(), Some("not json"));
    }

    #[test]
    fn test_cross_writer_notification() {
        let backing = MemoryStorage::new();
        let (value, _handle) = slot(&backing, "counter", 0u32);
        let (_other_value, other_handle) = slot(&backing, "counter", 0u32);

        other_handle.set(23);
        assert_eq!(value.get_untracked(), 23);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let backing = MemoryStorage::new();
        let notified = Rc::new(RefCell::new(0u32));
        let count = Rc::clone(&notified);
        let sub = backing.subscribe("k", Rc::new(move |_| *count.borrow_mut() += 1));

        backing.write("k", "1").unwrap();
        sub.unsubscribe();
        backing.write("k", "2").unwrap();

        assert_eq!(*notified.borrow(), 1);
    }

    #[test]
    fn test_subscribers_only_see_their_key() {
        let backing = MemoryStorage::new();
        let notified = Rc::new(RefCell::new(0u32));
        let count = Rc::clone(&notified);
        let _sub = backing.subscribe("mine", Rc::new(move |_| *count.borrow_mut() += 1));

        backing.write("other", "1").unwrap();
        backing.remove("other").unwrap();

        assert_eq!(*notified.borrow(), 0);
    }
}
