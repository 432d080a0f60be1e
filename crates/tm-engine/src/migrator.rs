//! The public migration engine.
//!
//! [`Migrator`] validates step counts, serves ledger reads through the
//! caller-supplied [`QueryContext`], plans `up`/`down` from the ledger as
//! committed, and hands each step to the [`Executor`], stopping at the first
//! failure.

use crate::error::{MigrateError, MigrateResult};
use crate::executor::{Direction, Executor};
use crate::ledger::{Ledger, LedgerRecord};
use crate::planner;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tm_core::config::validate_table_name;
use tm_core::{DirectorySource, Migration, MigrationSource, DEFAULT_TABLE_NAME};
use tm_db::{QueryContext, StepRunner};

/// Constructor input for [`Migrator`].
pub struct MigratorOptions {
    /// Context used for `plan`, `list` and `version`. When bound to a caller
    /// transaction those reads see that transaction's snapshot.
    pub context: Option<Arc<dyn QueryContext>>,

    /// Runner that commits every step on its own
    pub runner: Option<Arc<dyn StepRunner>>,

    /// Location handed to the migration source
    pub migrations_path: PathBuf,

    /// Ledger table, defaults to [`DEFAULT_TABLE_NAME`]
    pub table_name: String,
}

impl MigratorOptions {
    pub fn new(migrations_path: impl Into<PathBuf>) -> Self {
        Self {
            context: None,
            runner: None,
            migrations_path: migrations_path.into(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }

    pub fn with_context(mut self, context: Arc<dyn QueryContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn StepRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }
}

/// Outcome of a successful `up` or `down`: the versions touched, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub direction: Direction,
    pub versions: Vec<i64>,
}

impl StepReport {
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Migration engine over one loaded migration set.
pub struct Migrator {
    migrations: Vec<Migration>,
    ledger: Ledger,
    context: Arc<dyn QueryContext>,
    executor: Executor,
}

impl Migrator {
    /// Build a migrator reading `*.up.sql`/`*.down.sql` files from
    /// `options.migrations_path`.
    pub fn new(options: MigratorOptions) -> MigrateResult<Self> {
        Self::with_source(options, &DirectorySource)
    }

    /// Build a migrator with a custom [`MigrationSource`].
    ///
    /// Fails fast: the configuration is checked, migrations are loaded and
    /// the ledger table is created before this returns.
    pub fn with_source(
        options: MigratorOptions,
        source: &dyn MigrationSource,
    ) -> MigrateResult<Self> {
        let context = options.context.ok_or_else(|| {
            MigrateError::ConfigError("no query context supplied".to_string())
        })?;
        let runner = options
            .runner
            .ok_or_else(|| MigrateError::ConfigError("no step runner supplied".to_string()))?;
        validate_table_name(&options.table_name).map_err(MigrateError::ConfigError)?;

        let migrations = source.load(&options.migrations_path)?;
        let ledger = Ledger::new(options.table_name);
        let executor = Executor::new(runner, ledger.clone());
        executor.ensure_ledger()?;

        log::debug!(
            "Migrator ready: {} migrations from {}, ledger {} on {}",
            migrations.len(),
            options.migrations_path.display(),
            ledger.table(),
            context.db_type()
        );
        Ok(Self {
            migrations,
            ledger,
            context,
            executor,
        })
    }

    /// Replace the context used for ledger reads.
    ///
    /// A context bound to an open transaction keeps that transaction's
    /// snapshot, so `plan`, `list` and `version` through it do not see steps
    /// committed after it began. `up` and `down` plan from the runner's own
    /// read and are not affected.
    pub fn set_context(&mut self, context: Arc<dyn QueryContext>) {
        self.context = context;
    }

    /// The loaded migrations, ascending by version.
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Apply pending migrations in ascending order; `steps == 0` applies all.
    pub fn up(&self, steps: i64) -> MigrateResult<StepReport> {
        let steps = check_steps(steps, Direction::Up)?;
        let current = self.version()?;
        let applied = self.executor.applied_versions()?;

        let mut plan = planner::plan_up(&self.migrations, &applied);
        if steps > 0 {
            plan.truncate(steps);
        }
        if plan.is_empty() {
            log::info!("No pending migrations (current version {current})");
        }
        self.run_plan(&plan, Direction::Up)
    }

    /// Revert applied migrations in descending order; `steps == 0` reverts
    /// all.
    pub fn down(&self, steps: i64) -> MigrateResult<StepReport> {
        let steps = check_steps(steps, Direction::Down)?;
        let current = self.version()?;
        let applied = self.executor.applied_versions()?;
        self.warn_unknown(&applied);

        let plan = planner::plan_down(&self.migrations, &applied, steps);
        if plan.is_empty() {
            log::info!("Nothing to roll back (current version {current})");
        }
        self.run_plan(&plan, Direction::Down)
    }

    /// Migrations an unbounded `up` would apply now, ascending.
    pub fn plan(&self) -> MigrateResult<Vec<Migration>> {
        let applied = self.applied_versions()?;
        Ok(planner::plan_up(&self.migrations, &applied)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Ledger rows, ascending by version.
    pub fn list(&self) -> MigrateResult<Vec<LedgerRecord>> {
        self.ledger
            .applied_records(self.context.as_ref())
            .map_err(MigrateError::ledger("read"))
    }

    /// Highest applied version, 0 when nothing is applied.
    pub fn version(&self) -> MigrateResult<i64> {
        self.ledger
            .current_version(self.context.as_ref())
            .map_err(MigrateError::ledger("fetch version"))
    }

    /// Applied versions that match no loaded migration, ascending.
    pub fn unknown_versions(&self) -> MigrateResult<Vec<i64>> {
        let applied = self.applied_versions()?;
        Ok(planner::unknown_versions(&self.migrations, &applied))
    }

    fn applied_versions(&self) -> MigrateResult<BTreeSet<i64>> {
        self.ledger
            .applied_versions(self.context.as_ref())
            .map_err(MigrateError::ledger("read"))
    }

    fn warn_unknown(&self, applied: &BTreeSet<i64>) {
        let unknown = planner::unknown_versions(&self.migrations, applied);
        if !unknown.is_empty() {
            log::warn!("Ledger has versions with no loaded migration: {unknown:?}");
        }
    }

    fn run_plan(&self, plan: &[&Migration], direction: Direction) -> MigrateResult<StepReport> {
        log::debug!(
            "Planned {direction}: {:?}",
            plan.iter().map(|m| m.version).collect::<Vec<_>>()
        );
        let mut versions = Vec::with_capacity(plan.len());
        for migration in plan {
            match direction {
                Direction::Up => self.executor.apply_step(migration)?,
                Direction::Down => self.executor.revert_step(migration)?,
            }
            versions.push(migration.version);
        }
        if !versions.is_empty() {
            log::info!("Migrated {direction} {} step(s): {versions:?}", versions.len());
        }
        Ok(StepReport {
            direction,
            versions,
        })
    }
}

fn check_steps(steps: i64, direction: Direction) -> MigrateResult<usize> {
    usize::try_from(steps).map_err(|_| {
        MigrateError::InvalidArgument(format!(
            "{direction} step count must be zero or positive, got {steps}"
        ))
    })
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
