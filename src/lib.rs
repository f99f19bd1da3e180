//! fphook: in-page API instrumentation for fingerprinting detection
//!
//! The engine wraps browser capability surfaces (methods, property getters
//! and constructors) so that every touch is reported to a host-bound sink
//! and then forwarded, unchanged, to the original implementation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  init      - walks the catalog once         │
//! │  catalog   - declarative surface table      │
//! ├─────────────────────────────────────────────┤
//! │  engine    - hook_method / hook_getter /    │
//! │              hook_constructor               │
//! │  registry  - wrapped identities (weak)      │
//! │  reporter  - dedup + JSON event to sink     │
//! │  guard     - no fault reaches the page      │
//! ├─────────────────────────────────────────────┤
//! │        fphook-host (page object model)      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let page = StubPage::new();
//! let sink = RecordingSink::install(page.realm(), DEFAULT_BINDING)?;
//! let settings = Settings::default().with_optimize_events(true);
//! let (engine, report) = inject(page.realm(), &settings, &Catalog::builtin()?);
//!
//! run_probe(page.realm())?;
//! for event in sink.events() {
//!     println!("{}.{}", event.api, event.method);
//! }
//! ```

pub mod catalog;
pub mod engine;
pub mod error;
pub mod guard;
pub mod init;
pub mod registry;
pub mod reporter;
pub mod settings;
pub mod stub;

pub use catalog::{Catalog, CatalogEntry, EntryKind, EntryOptions, OnReturnHook};
pub use engine::{Engine, HookOptions, HookOutcome, OnReturn};
pub use error::{CatalogError, HookError, SettingsError};
pub use guard::Guard;
pub use init::{initialize, inject, InitReport};
pub use registry::IdentityRegistry;
pub use reporter::{Event, RecordingSink, Reporter};
pub use settings::{Settings, DEFAULT_BINDING};
pub use stub::{run_probe, ProbeStep, StubPage};

pub use fphook_host as host;
