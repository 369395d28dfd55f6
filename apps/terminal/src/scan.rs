//! # Scan Dispatch
//!
//! Turns raw scanner / keyboard input into cart-ready results without
//! letting anything but the foreground loop touch the cart.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scan Dispatch                                    │
//! │                                                                         │
//! │  stdin line "5901234" ──► ScanDispatcher::submit(Scan("5901234"))      │
//! │                                  │                                      │
//! │                                  ▼  tokio::spawn (worker)               │
//! │                    ┌──────────────────────────────┐                     │
//! │                    │ timeout(lookup_timeout, {    │                     │
//! │                    │   exact barcode?  ──► Resolved                     │
//! │                    │   else LIKE search in stock  │                     │
//! │                    │        ──► Candidates / NotFound                   │
//! │                    │ })                           │                     │
//! │                    └──────────────┬───────────────┘                     │
//! │                                   │ mpsc<DispatchEvent>                 │
//! │  FocusKeeper (every 500ms) ───────┤ ReassertFocus (if focus lock on)    │
//! │                                   ▼                                     │
//! │                    Foreground loop: the ONLY cart writer                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Workers never block the foreground: each submission is its own task and
//! results arrive in completion order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tally_core::validation::validate_uuid;
use tally_core::{CartLine, Product};
use tally_db::{DbResult, Database};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Capacity of the dispatch event channel.
const EVENT_BUFFER: usize = 64;

// =============================================================================
// Input & Events
// =============================================================================

/// One submission to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanInput {
    /// Scanner output or typed text: exact barcode first, then search.
    Scan(String),
    /// Manual add of a candidate by product id.
    Pick(String),
}

/// Result handed back to the foreground loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// A single product, snapshotted for the cart.
    Resolved { query: String, line: CartLine },
    /// No exact barcode match; in-stock products matching the text.
    Candidates { query: String, products: Vec<Product> },
    /// Nothing matched.
    NotFound { query: String },
    /// The lookup errored or timed out. Nothing was changed.
    LookupFailed { query: String, message: String },
    /// Re-arm the scan prompt.
    ReassertFocus,
}

// =============================================================================
// Scan Dispatcher
// =============================================================================

/// Lookup tuning for [`ScanDispatcher`].
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub lookup_timeout: Duration,
    pub search_limit: u32,
}

/// Single ingestion point for scans and picks.
#[derive(Debug, Clone)]
pub struct ScanDispatcher {
    db: Database,
    config: DispatchConfig,
    events: mpsc::Sender<DispatchEvent>,
}

impl ScanDispatcher {
    /// Creates a dispatcher and the receiving end the foreground loop reads.
    pub fn new(db: Database, config: DispatchConfig) -> (Self, mpsc::Receiver<DispatchEvent>) {
        let (events, rx) = mpsc::channel(EVENT_BUFFER);
        (ScanDispatcher { db, config, events }, rx)
    }

    /// Sender for other producers on the same channel (the focus keeper).
    pub fn events(&self) -> mpsc::Sender<DispatchEvent> {
        self.events.clone()
    }

    /// Resolves `input` on a worker task. Blank input is dropped.
    ///
    /// Returns the worker handle, or `None` when nothing was spawned.
    pub fn submit(&self, input: ScanInput) -> Option<JoinHandle<()>> {
        let input = match input {
            ScanInput::Scan(text) => ScanInput::Scan(text.trim().to_string()),
            ScanInput::Pick(id) => ScanInput::Pick(id.trim().to_string()),
        };
        let query = match &input {
            ScanInput::Scan(q) | ScanInput::Pick(q) => q.clone(),
        };
        if query.is_empty() {
            return None;
        }

        debug!(?input, "Scan submitted");

        let db = self.db.clone();
        let config = self.config;
        let events = self.events.clone();

        Some(tokio::spawn(async move {
            let event =
                match tokio::time::timeout(config.lookup_timeout, resolve(&db, &input, config)).await {
                    Ok(Ok(event)) => event,
                    Ok(Err(e)) => {
                        warn!(query = %query, error = %e, "Scan lookup failed");
                        DispatchEvent::LookupFailed {
                            query,
                            message: e.to_string(),
                        }
                    }
                    Err(_) => {
                        warn!(query = %query, "Scan lookup timed out");
                        DispatchEvent::LookupFailed {
                            query,
                            message: "lookup timed out".to_string(),
                        }
                    }
                };

            if events.send(event).await.is_err() {
                debug!("Dispatch receiver gone, dropping scan result");
            }
        }))
    }
}

async fn resolve(db: &Database, input: &ScanInput, config: DispatchConfig) -> DbResult<DispatchEvent> {
    match input {
        ScanInput::Scan(query) => {
            if let Some(product) = db.products().get_by_barcode(query).await? {
                return Ok(DispatchEvent::Resolved {
                    query: query.clone(),
                    line: CartLine::from_product(&product),
                });
            }

            let products = db.products().search_in_stock(query, config.search_limit).await?;
            if products.is_empty() {
                Ok(DispatchEvent::NotFound {
                    query: query.clone(),
                })
            } else {
                Ok(DispatchEvent::Candidates {
                    query: query.clone(),
                    products,
                })
            }
        }
        ScanInput::Pick(product_id) if validate_uuid(product_id).is_err() => {
            Ok(DispatchEvent::NotFound {
                query: product_id.clone(),
            })
        }
        ScanInput::Pick(product_id) => match db.products().get_by_id(product_id).await? {
            Some(product) if product.is_active => Ok(DispatchEvent::Resolved {
                query: product_id.clone(),
                line: CartLine::from_product(&product),
            }),
            _ => Ok(DispatchEvent::NotFound {
                query: product_id.clone(),
            }),
        },
    }
}

// =============================================================================
// Focus Keeper
// =============================================================================

/// Periodically asks the foreground to re-arm the scan prompt.
///
/// ## Lifecycle
/// ```text
/// start() ──► tick ──► focus_lock on?  ──► ReassertFocus
///               │            off?      ──► (skip)
///               │
/// stop()  ──► oneshot fires ──► task exits without waiting for a tick
/// ```
///
/// `stop` is idempotent and never blocks. Dropping the keeper stops it.
#[derive(Debug)]
pub struct FocusKeeper {
    focus_lock: Arc<AtomicBool>,
    stop: Mutex<Option<oneshot::Sender<()>>>,
    handle: JoinHandle<()>,
}

impl FocusKeeper {
    /// Spawns the ticking task with the focus lock enabled.
    pub fn start(period: Duration, events: mpsc::Sender<DispatchEvent>) -> Self {
        let focus_lock = Arc::new(AtomicBool::new(true));
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let enabled = Arc::clone(&focus_lock);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if !enabled.load(Ordering::Acquire) {
                            continue;
                        }
                        match events.try_send(DispatchEvent::ReassertFocus) {
                            // A pending reassert already covers this tick.
                            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                            Err(mpsc::error::TrySendError::Closed(_)) => break,
                        }
                    }
                }
            }
            debug!("Focus keeper stopped");
        });

        FocusKeeper {
            focus_lock,
            stop: Mutex::new(Some(stop_tx)),
            handle,
        }
    }

    /// Turns the focus lock on or off. Read on every tick.
    pub fn set_focus_lock(&self, enabled: bool) {
        self.focus_lock.store(enabled, Ordering::Release);
    }

    pub fn focus_lock(&self) -> bool {
        self.focus_lock.load(Ordering::Acquire)
    }

    /// Signals the task to exit.
    pub fn stop(&self) {
        let sender = match self.stop.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(tx) = sender {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for FocusKeeper {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
