//! Export pipeline
//!
//! One run: verify the caller identity, list applications, collect library
//! items per application, flatten into rows and write every enabled format.
//! All inputs come in through [`RunContext`]; nothing is read from globals.

use chrono::{DateTime, FixedOffset, Local, Utc};
use qapps_client::{
    ApplicationLister, CallerIdentity, CollectionStats, CollectorOptions, ManagementApi,
    RetryPolicy, SubApplicationCollector,
};
use qapps_core::{AppError, Credentials, ExportConfig, RunMetadata};
use qapps_export::{
    build_rows, expand_pattern, ApplicationRows, ColumnSet, Exporter, FilenameContext,
};

use crate::summary::RunSummary;

/// Everything a run needs besides the API itself
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: ExportConfig,
    pub credentials: Credentials,
    /// Instant the run started; drives the filename and retrieval timestamp
    pub started_at: DateTime<FixedOffset>,
}

impl RunContext {
    pub fn new(
        config: ExportConfig,
        credentials: Credentials,
        started_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            config,
            credentials,
            started_at,
        }
    }

    /// Context stamped with the current local time
    pub fn now(config: ExportConfig, credentials: Credentials) -> Self {
        Self::new(config, credentials, Local::now().fixed_offset())
    }

    pub fn region(&self) -> String {
        self.config.resolve_region(self.credentials.region.as_deref())
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_settings(&self.config.retrieval.retry)
    }
}

/// Execute a full export run.
///
/// Returns an error only for fatal conditions: every column disabled, the
/// identity check failing, the first application page failing, an unusable
/// output directory or the export policy rejecting the written formats.
pub async fn run<A>(api: &A, ctx: &RunContext) -> Result<RunSummary, AppError>
where
    A: ManagementApi + ?Sized,
{
    let retry = ctx.retry_policy();
    let region = ctx.region();
    let mut warnings = Vec::new();

    // Column overrides are checked before any API call is made
    let columns = ColumnSet::resolve(&ctx.config.output.columns)?;
    for name in ColumnSet::unknown_names(&ctx.config.output.columns) {
        warnings.push(format!("Unknown column '{}' in output.columns was ignored", name));
    }

    let identity = verify_identity(api, ctx, &retry, &mut warnings).await?;
    let account_id = identity
        .account_id
        .clone()
        .or_else(|| ctx.credentials.expected_account(&ctx.config).map(str::to_string));

    let run_metadata = RunMetadata {
        retrieval_timestamp: ctx.started_at.with_timezone(&Utc),
        region: region.clone(),
        account_id: account_id.clone(),
    };

    let listed = ApplicationLister::new(
        api,
        &retry,
        ctx.config.retrieval.max_applications_per_page,
    )
    .list()
    .await?;
    warnings.extend(listed.warnings);

    let collector = SubApplicationCollector::new(
        api,
        &retry,
        CollectorOptions {
            page_size: ctx.config.retrieval.max_qapps_per_page,
            show_permission_warnings: ctx.config.logging.show_permission_warnings,
        },
    );

    let application_count = listed.applications.len();
    let mut stats = CollectionStats::default();
    let mut total_users = 0;
    let mut groups = Vec::with_capacity(application_count);

    for application in listed.applications {
        let collection = collector.collect(&application).await;
        stats.absorb(&collection.stats);
        warnings.extend(collection.warnings);

        total_users += collection
            .items
            .iter()
            .filter_map(|c| c.usage.as_ref().and_then(|u| u.user_count))
            .sum::<i64>();

        groups.push(ApplicationRows {
            application,
            items: collection
                .items
                .into_iter()
                .map(|c| (c.item, c.usage))
                .collect(),
        });
    }

    let rows = build_rows(groups, ctx.config.export.include_empty_apps, &run_metadata);

    let base_name = expand_pattern(
        &ctx.config.export.filename_pattern,
        &FilenameContext {
            timestamp: ctx.started_at.naive_local(),
            region: &region,
            account: account_id.as_deref(),
        },
    );

    let exporter = Exporter::from_settings(&ctx.config.export);
    tracing::info!(
        output_dir = %exporter.output_dir().display(),
        formats = ?exporter.formats(),
        rows = rows.len(),
        base_name = %base_name,
        "Writing export"
    );
    let report = exporter.export(&base_name, &columns, &rows)?;

    for failure in &report.failures {
        warnings.push(format!(
            "{} export to {} failed: {}",
            failure.format,
            failure.path.display(),
            failure.error
        ));
    }

    if !report.is_acceptable(ctx.config.export.fail_on_partial_export) {
        let failed: Vec<String> = report
            .failures
            .iter()
            .map(|f| format!("{} ({})", f.format, f.error))
            .collect();
        return Err(AppError::Export(format!(
            "export failed for {}",
            failed.join(", ")
        )));
    }

    Ok(RunSummary {
        region,
        account_id,
        applications: application_count,
        stats,
        total_users,
        rows: rows.len(),
        written: report.written,
        warnings,
    })
}

/// STS identity check. Failure is fatal; an account other than the expected
/// one only produces a warning.
async fn verify_identity<A>(
    api: &A,
    ctx: &RunContext,
    retry: &RetryPolicy,
    warnings: &mut Vec<String>,
) -> Result<CallerIdentity, AppError>
where
    A: ManagementApi + ?Sized,
{
    let identity = retry.run(|| api.caller_identity()).await.map_err(|failed| {
        tracing::error!(error = %failed, "Credential check failed");
        AppError::from(failed)
    })?;

    tracing::info!(
        account_id = identity.account_id.as_deref().unwrap_or("unknown"),
        principal = identity.principal_name().unwrap_or("unknown"),
        "Authenticated"
    );

    if let (Some(expected), Some(actual)) = (
        ctx.credentials.expected_account(&ctx.config),
        identity.account_id.as_deref(),
    ) {
        if expected != actual {
            tracing::warn!(expected, actual, "Credentials belong to an unexpected account");
            warnings.push(format!(
                "Authenticated to account {} but {} was expected",
                actual, expected
            ));
        }
    }

    Ok(identity)
}
