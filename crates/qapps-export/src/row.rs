use qapps_core::{Application, RunMetadata, SubApplicationItem, UsageMetadata};

/// One flattened export record: an application joined with at most one
/// library item and its usage metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub application: Application,
    pub item: Option<SubApplicationItem>,
    pub usage: Option<UsageMetadata>,
    pub run: RunMetadata,
}

/// Everything collected for one application, in list order
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationRows {
    pub application: Application,
    pub items: Vec<(SubApplicationItem, Option<UsageMetadata>)>,
}

/// Join applications with their items into rows.
///
/// One row per item. An application without items yields a single
/// placeholder row when `include_empty_apps` is set and nothing otherwise.
pub fn build_rows(
    applications: Vec<ApplicationRows>,
    include_empty_apps: bool,
    run: &RunMetadata,
) -> Vec<ExportRow> {
    let mut rows = Vec::new();

    for ApplicationRows { application, items } in applications {
        if items.is_empty() {
            if include_empty_apps {
                rows.push(ExportRow {
                    application,
                    item: None,
                    usage: None,
                    run: run.clone(),
                });
            } else {
                tracing::debug!(application_id = %application.id, "Skipping application without Q Apps");
            }
            continue;
        }

        for (item, usage) in items {
            rows.push(ExportRow {
                application: application.clone(),
                item: Some(item),
                usage,
                run: run.clone(),
            });
        }
    }

    rows
}
