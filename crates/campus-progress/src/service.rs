//! Progress service — fan-out of bulk reads and per-pair derivation.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Instant;

use campus_core::context::RequestContext;
use campus_core::error::CampusResult;
use campus_core::models::module::ModuleStatus;
use campus_core::models::progress::{ModuleLabel, ModuleProgress, UserLabel};
use campus_core::models::user::UserStatus;
use campus_core::repository::ProgressSource;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assignment::{PairFilter, resolve_pairs};
use crate::config::ProgressConfig;
use crate::derive::derive_progress;
use crate::error::ProgressError;
use crate::lookup::{LookupMaps, ProgressRows};
use crate::report::{DashboardCard, TenantProgressEntry, TenantProgressQuery, TenantProgressReport};
use crate::sort::sort_dashboard;

/// Progress service.
///
/// Generic over the bulk read source so that the engine has no
/// dependency on the database crate. Every public operation issues a
/// fixed number of reads, independent of how many pairs it covers.
pub struct ProgressService<S: ProgressSource> {
    source: S,
    config: ProgressConfig,
}

fn ensure_tenant(ctx: &RequestContext) -> CampusResult<()> {
    if ctx.tenant_id.is_nil() {
        return Err(ProgressError::MissingTenant.into());
    }
    Ok(())
}

fn known_modules(modules: &[ModuleLabel]) -> HashSet<Uuid> {
    modules.iter().map(|m| m.module_id).collect()
}

/// Unknown module ids derive as empty (and so Completed) modules; clear
/// their certificate eligibility.
fn unless_unknown(mut progress: ModuleProgress, known: &HashSet<Uuid>) -> ModuleProgress {
    if !known.contains(&progress.module_id) {
        progress.certificate_eligible = false;
    }
    progress
}

fn distinct(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

impl<S: ProgressSource> ProgressService<S> {
    pub fn new(source: S, config: ProgressConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Progress of a single (user, module) pair.
    ///
    /// Facts are extracted by scanning the pair's rows directly; this is
    /// the reference the batched operations must agree with.
    pub async fn module_progress(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        module_id: Uuid,
    ) -> CampusResult<ModuleProgress> {
        ensure_tenant(ctx)?;
        ctx.ensure_can_view_user(user_id)?;

        let (user_ids, module_ids) = ([user_id], [module_id]);
        let (rows, modules) = tokio::try_join!(
            self.fetch_rows(ctx.tenant_id, &user_ids, &module_ids),
            self.source.module_labels(ctx.tenant_id, &module_ids),
        )?;

        let progress = derive_progress(&rows.facts_for(user_id, module_id));
        Ok(unless_unknown(progress, &known_modules(&modules)))
    }

    /// Progress of one user across many modules, keyed by module id.
    ///
    /// Duplicate ids collapse. Every requested id gets an entry; ids that
    /// match no module of the tenant read as empty modules and are never
    /// certificate eligible.
    pub async fn user_progress(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        module_ids: &[Uuid],
    ) -> CampusResult<BTreeMap<Uuid, ModuleProgress>> {
        ensure_tenant(ctx)?;
        ctx.ensure_can_view_user(user_id)?;

        let module_ids = distinct(module_ids.iter().copied());
        if module_ids.len() > self.config.max_modules_per_request {
            return Err(ProgressError::TooManyModules {
                requested: module_ids.len(),
                limit: self.config.max_modules_per_request,
            }
            .into());
        }
        if module_ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let started = Instant::now();
        let user_ids = [user_id];
        let (rows, modules) = tokio::try_join!(
            self.fetch_rows(ctx.tenant_id, &user_ids, &module_ids),
            self.source.module_labels(ctx.tenant_id, &module_ids),
        )?;
        let maps = LookupMaps::build(&rows);
        let known = known_modules(&modules);

        let progress: BTreeMap<Uuid, ModuleProgress> = module_ids
            .iter()
            .map(|&module_id| {
                let progress = derive_progress(&maps.facts(user_id, module_id));
                (module_id, unless_unknown(progress, &known))
            })
            .collect();

        self.log_batch("user_progress", 1, module_ids.len(), progress.len(), started);
        Ok(progress)
    }

    /// Progress of every assigned (user, module) pair in the tenant.
    ///
    /// Pairs come from group membership joined with group assignments;
    /// a module reached through several groups is reported once with the
    /// earliest deadline. Inactive users are skipped, as are unpublished
    /// modules unless the configuration includes them.
    pub async fn tenant_progress(
        &self,
        ctx: &RequestContext,
        query: TenantProgressQuery,
    ) -> CampusResult<TenantProgressReport> {
        ensure_tenant(ctx)?;
        ctx.ensure_can_view_tenant()?;
        let tenant_id = ctx.tenant_id;
        let started = Instant::now();

        let (memberships, assignments) = tokio::try_join!(
            self.source.memberships(tenant_id, None),
            self.source.assignments(tenant_id),
        )?;

        let filter = PairFilter {
            user_id: None,
            group_id: query.group_id,
            module_id: query.module_id,
        };
        let candidates = resolve_pairs(&memberships, &assignments, &filter);
        debug!(
            tenant_id = %tenant_id,
            memberships = memberships.len(),
            assignments = assignments.len(),
            pairs = candidates.len(),
            "Resolved assigned pairs"
        );

        if candidates.is_empty() {
            return Ok(TenantProgressReport {
                tenant_id,
                ..Default::default()
            });
        }

        let user_ids = distinct(candidates.iter().map(|p| p.user_id));
        let module_ids = distinct(candidates.iter().map(|p| p.module_id));
        let group_ids = distinct(candidates.iter().flat_map(|p| p.groups.iter().copied()));

        let (rows, users, modules, groups) = tokio::try_join!(
            self.fetch_rows(tenant_id, &user_ids, &module_ids),
            self.source.user_labels(tenant_id, &user_ids),
            self.source.module_labels(tenant_id, &module_ids),
            self.source.group_labels(tenant_id, &group_ids),
        )?;

        let active_users: HashMap<Uuid, &UserLabel> = users
            .iter()
            .filter(|u| u.status != UserStatus::Inactive)
            .map(|u| (u.user_id, u))
            .collect();
        let visible_modules = self.visible_modules(&modules);
        let maps = LookupMaps::build(&rows);

        let entries: Vec<TenantProgressEntry> = candidates
            .into_iter()
            .filter(|p| {
                active_users.contains_key(&p.user_id) && visible_modules.contains_key(&p.module_id)
            })
            .map(|p| TenantProgressEntry {
                progress: derive_progress(&maps.facts(p.user_id, p.module_id)),
                user_id: p.user_id,
                module_id: p.module_id,
                groups: p.groups,
                deadline: p.deadline,
            })
            .collect();

        let mut report = TenantProgressReport {
            tenant_id,
            ..Default::default()
        };
        for entry in &entries {
            if let Some(user) = active_users.get(&entry.user_id) {
                report
                    .user_names
                    .insert(entry.user_id, user.display_name.clone());
            }
            if let Some(module) = visible_modules.get(&entry.module_id) {
                report
                    .module_titles
                    .insert(entry.module_id, module.title.clone());
            }
        }
        for group in &groups {
            if entries.iter().any(|e| e.groups.contains(&group.group_id)) {
                report.group_names.insert(group.group_id, group.name.clone());
            }
        }
        report.entries = entries;

        self.log_batch(
            "tenant_progress",
            report.user_names.len(),
            report.module_titles.len(),
            report.entries.len(),
            started,
        );
        Ok(report)
    }

    /// The caller's own assigned modules, in dashboard order.
    pub async fn user_dashboard(&self, ctx: &RequestContext) -> CampusResult<Vec<DashboardCard>> {
        ensure_tenant(ctx)?;
        let (tenant_id, user_id) = (ctx.tenant_id, ctx.user_id);
        let started = Instant::now();

        let (memberships, assignments) = tokio::try_join!(
            self.source.memberships(tenant_id, Some(user_id)),
            self.source.assignments(tenant_id),
        )?;

        let filter = PairFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        let pairs = resolve_pairs(&memberships, &assignments, &filter);
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids = [user_id];
        let module_ids = distinct(pairs.iter().map(|p| p.module_id));
        let (rows, modules) = tokio::try_join!(
            self.fetch_rows(tenant_id, &user_ids, &module_ids),
            self.source.module_labels(tenant_id, &module_ids),
        )?;

        let visible_modules = self.visible_modules(&modules);
        let maps = LookupMaps::build(&rows);

        let mut cards: Vec<DashboardCard> = pairs
            .into_iter()
            .filter_map(|p| {
                let module = visible_modules.get(&p.module_id)?;
                Some(DashboardCard {
                    module_id: p.module_id,
                    title: module.title.clone(),
                    deadline: p.deadline,
                    progress: derive_progress(&maps.facts(user_id, p.module_id)),
                })
            })
            .collect();
        sort_dashboard(&mut cards);

        self.log_batch("user_dashboard", 1, module_ids.len(), cards.len(), started);
        Ok(cards)
    }

    /// Issue the seven progress reads of one batch concurrently.
    async fn fetch_rows(
        &self,
        tenant_id: Uuid,
        user_ids: &[Uuid],
        module_ids: &[Uuid],
    ) -> CampusResult<ProgressRows> {
        let (section_counts, completions, quizzes, attempts, overrides, certificates, access) = tokio::try_join!(
            self.source.section_counts(tenant_id, module_ids),
            self.source.completions(tenant_id, user_ids, module_ids),
            self.source.quizzes(tenant_id, module_ids),
            self.source.quiz_attempts(tenant_id, user_ids, module_ids),
            self.source.overrides(tenant_id, user_ids, module_ids),
            self.source.certificates(tenant_id, user_ids, module_ids),
            self.source.last_access(tenant_id, user_ids, module_ids),
        )?;

        Ok(ProgressRows {
            section_counts,
            completions,
            quizzes,
            attempts,
            overrides,
            certificates,
            access,
        })
    }

    fn visible_modules<'a>(&self, modules: &'a [ModuleLabel]) -> HashMap<Uuid, &'a ModuleLabel> {
        modules
            .iter()
            .filter(|m| self.config.include_unpublished || m.status == ModuleStatus::Published)
            .map(|m| (m.module_id, m))
            .collect()
    }

    fn log_batch(
        &self,
        operation: &'static str,
        users: usize,
        modules: usize,
        pairs: usize,
        started: Instant,
    ) {
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if elapsed_ms > self.config.slow_batch_threshold_ms {
            warn!(
                operation,
                users, modules, pairs, elapsed_ms, "Slow progress batch"
            );
        } else {
            info!(
                operation,
                users, modules, pairs, elapsed_ms, "Progress batch computed"
            );
        }
    }
}
