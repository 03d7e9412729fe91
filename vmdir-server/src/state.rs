//! Process-wide server state.
//!
//! Built once at startup and shared by `Arc`. Nothing in here is a global:
//! every worker is handed the same [`DirectoryServerState`].

use crate::config::ServerConfig;
use crate::context::RequestContext;
use crate::error::{ServerError, ServerResult};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use vmdir_replication::UtdVectorCache;
use vmdir_schema::{
    IndexDefinition, LdapSchema, SchemaDefinitions, SchemaDiff, compat, merge, read_schema_file,
};
use vmdir_types::{ChangeEvent, InvocationId, SessionId, Usn};
use vmdir_watch::{MemoryEventRepository, WatchClient, WatchRequest, WatchSessionManager};

/// The running schema.
///
/// Readers take a cheap `Arc` snapshot that stays valid however many
/// upgrades are published after it.
#[derive(Debug, Default)]
pub struct SchemaHandle {
    current: RwLock<Arc<LdapSchema>>,
}

impl SchemaHandle {
    #[must_use]
    pub fn new(schema: LdapSchema) -> Self {
        Self {
            current: RwLock::new(Arc::new(schema)),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<LdapSchema> {
        Arc::clone(&*self.current.read())
    }

    /// Swaps in `schema` and returns the one it replaced.
    pub fn publish(&self, schema: Arc<LdapSchema>) -> Arc<LdapSchema> {
        std::mem::replace(&mut *self.current.write(), schema)
    }
}

/// A point-in-time summary of the server, printed as JSON by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub invocation_id: String,
    pub schema_entities: usize,
    pub schema_indices: usize,
    pub utd_vector: String,
    pub active_sessions: usize,
    pub inactive_sessions: usize,
    pub latest_revision: Option<u64>,
}

pub struct DirectoryServerState {
    invocation_id: InvocationId,
    schema: SchemaHandle,
    // Held for the whole check-merge-publish sequence so two upgrades
    // cannot both merge against the same running schema.
    upgrade_lock: Mutex<()>,
    utd: UtdVectorCache,
    events: Arc<MemoryEventRepository>,
    watch: WatchSessionManager,
}

impl DirectoryServerState {
    /// Builds the state from `config`, loading the schema file if one is
    /// configured.
    pub fn new(config: &ServerConfig) -> ServerResult<Self> {
        let invocation_id = match &config.invocation_id {
            Some(id) => InvocationId::parse(id)
                .map_err(|e| ServerError::Config(format!("invocation_id: {e}")))?,
            None => {
                let id = InvocationId::generate();
                info!(invocation_id = %id, "no invocation id configured, generated one");
                id
            }
        };

        let mut schema = LdapSchema::new();
        if let Some(path) = &config.schema_file {
            schema.load_definitions(&read_schema_file(path)?)?;
        } else {
            warn!("no schema file configured, starting with an empty schema");
        }

        let events = Arc::new(MemoryEventRepository::new());
        let watch = WatchSessionManager::new(events.clone())
            .with_poll_timeout(config.poll_timeout());

        info!(
            invocation_id = %invocation_id,
            schema_entities = schema.len(),
            "directory server state initialized"
        );

        Ok(Self {
            invocation_id,
            schema: SchemaHandle::new(schema),
            upgrade_lock: Mutex::new(()),
            utd: UtdVectorCache::new(),
            events,
            watch,
        })
    }

    pub fn invocation_id(&self) -> &InvocationId {
        &self.invocation_id
    }

    // ── Schema ───────────────────────────────────────────────────

    #[must_use]
    pub fn schema(&self) -> Arc<LdapSchema> {
        self.schema.snapshot()
    }

    /// Checks `defs` against the running schema, merges them in and
    /// publishes the result. On any error the running schema is unchanged.
    pub fn upgrade_schema(
        &self,
        ctx: &RequestContext,
        defs: &SchemaDefinitions,
    ) -> ServerResult<Arc<LdapSchema>> {
        ctx.in_scope(|| {
            let _guard = self.upgrade_lock.lock();
            let running = self.schema.snapshot();
            let merged = Arc::new(Self::merged_candidate(&running, defs)?);
            self.schema.publish(Arc::clone(&merged));
            info!(
                definitions = defs.len(),
                before = running.len(),
                after = merged.len(),
                "schema upgraded"
            );
            Ok(merged)
        })
    }

    /// The LDAP operations an upgrade with `defs` would apply to the running
    /// schema. Nothing is published.
    pub fn preview_schema_upgrade(
        &self,
        ctx: &RequestContext,
        defs: &SchemaDefinitions,
    ) -> ServerResult<SchemaDiff> {
        ctx.in_scope(|| {
            let running = self.schema.snapshot();
            let merged = Self::merged_candidate(&running, defs)?;
            Ok(running.diff(&merged)?)
        })
    }

    fn merged_candidate(running: &LdapSchema, defs: &SchemaDefinitions) -> ServerResult<LdapSchema> {
        let incoming = LdapSchema::parse_definitions(defs, running)
            .inspect_err(|e| warn!(error = %e, "schema upgrade definitions rejected"))?;
        compat::check_schema_upgrade(running, &incoming)
            .inspect_err(|e| warn!(error = %e, "schema upgrade not compatible"))?;
        let mut merged = merge::merge_schema(running, &incoming)
            .inspect_err(|e| warn!(error = %e, "merged schema failed verification"))?;
        merged.remove_noop_data();
        Ok(merged)
    }

    /// Index declarations of the running schema, sorted by attribute.
    pub fn indices(&self) -> Vec<IndexDefinition> {
        let mut out: Vec<_> = self.schema.snapshot().indices().cloned().collect();
        out.sort_by(|a, b| a.attribute.cmp(&b.attribute));
        out
    }

    // ── Replication ──────────────────────────────────────────────

    pub fn utd_vector(&self) -> &UtdVectorCache {
        &self.utd
    }

    /// Records that every change from `partner` up to `usn` is applied.
    pub fn record_applied_usn(
        &self,
        ctx: &RequestContext,
        partner: &str,
        usn: Usn,
    ) -> ServerResult<()> {
        ctx.in_scope(|| Ok(self.utd.add(partner, usn)?))
    }

    /// The first USN to ask `partner` for.
    pub fn usn_needed_from(&self, partner: &str) -> Usn {
        self.utd.snapshot().usn_needed_from(partner)
    }

    // ── Watch ────────────────────────────────────────────────────

    pub fn watch_sessions(&self) -> &WatchSessionManager {
        &self.watch
    }

    pub fn events(&self) -> &Arc<MemoryEventRepository> {
        &self.events
    }

    pub fn open_watch(
        &self,
        ctx: &RequestContext,
        request: WatchRequest,
        client: Arc<dyn WatchClient>,
    ) -> ServerResult<SessionId> {
        ctx.in_scope(|| Ok(self.watch.add_new_session(request, client)?))
    }

    pub fn close_watch(&self, id: SessionId) -> ServerResult<()> {
        Ok(self.watch.delete_session(id)?)
    }

    /// Stores a committed change and wakes every parked watch session.
    pub fn publish_change(&self, event: ChangeEvent) {
        self.events.publish(event);
        self.notify_new_events();
    }

    pub fn notify_new_events(&self) -> usize {
        self.watch.activate_sessions()
    }

    // ── Status ───────────────────────────────────────────────────

    #[must_use]
    pub fn status(&self) -> ServerStatus {
        let schema = self.schema.snapshot();
        ServerStatus {
            invocation_id: self.invocation_id.to_string(),
            schema_entities: schema.len(),
            schema_indices: schema.indices().count(),
            utd_vector: self.utd.serialized(),
            active_sessions: self.watch.active_len(),
            inactive_sessions: self.watch.inactive_len(),
            latest_revision: self.events.latest_revision(),
        }
    }
}
