//! Request pipelines: list fixes, list runnable fixes, run one fix.
//!
//! These entry points are transport-agnostic: diagnostics and project state are reached only
//! through the port traits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use codefix_diagnostics::{Located, locate};
use codefix_domain::{FixEngine, FixResolution, FixTarget, ProviderRegistry, RegisteredFix};
use codefix_edit::{
    ApplyOptions, CancelSignal, Cancelled, Document, EditError, LiveProject, ProjectSnapshot,
};
use codefix_types::edit::{NamedFix, Position};
use codefix_types::endpoints;
use codefix_types::response::{
    AvailableFix, AvailableFixesResponse, CodeCheckResponse, DiagnosticKey, DiagnosticLocation,
    RunFixRequest, RunFixResponse,
};
use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{debug, error, warn};

use crate::aggregate::{attach_fixes, merge_all};
use crate::error::CoreError;
use crate::observe::{RequestMetrics, RequestObserver, TracingObserver};
use crate::ports::{DiagnosticSource, ProjectModel, ProviderSource};
use crate::settings::ServiceSettings;

/// A range the editor has selected, in 1-based end-exclusive coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

/// The fix service.
///
/// Read-only after construction; one instance serves concurrent requests. Each request owns its
/// own snapshot lineage and publishes at most once.
pub struct FixService {
    engine: FixEngine,
    diagnostics: Arc<dyn DiagnosticSource>,
    project: Arc<dyn ProjectModel>,
    settings: ServiceSettings,
    observer: Arc<dyn RequestObserver>,
}

impl FixService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        diagnostics: Arc<dyn DiagnosticSource>,
        project: Arc<dyn ProjectModel>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            engine: FixEngine::new(registry),
            diagnostics,
            project,
            settings,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Build the registry from `source`; duplicate provider ids fail here, at startup.
    pub fn from_source(
        source: &dyn ProviderSource,
        diagnostics: Arc<dyn DiagnosticSource>,
        project: Arc<dyn ProjectModel>,
        settings: ServiceSettings,
    ) -> Result<Self, CoreError> {
        let registry = ProviderRegistry::from_source(source)?;
        Ok(Self::new(Arc::new(registry), diagnostics, project, settings))
    }

    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ProviderRegistry {
        self.engine.registry()
    }

    /// Every reported diagnostic, each with the fixes its providers offer.
    ///
    /// With `file_name` only that file's diagnostics are returned. Output order is the rule
    /// engine's order; a diagnostic whose providers all fail is kept with no fixes.
    pub async fn list_fixes_for_diagnostics(
        &self,
        file_name: Option<&Utf8Path>,
        cancel: &CancelSignal,
    ) -> Result<CodeCheckResponse, CoreError> {
        let started = Instant::now();
        let files = file_name.map(|f| vec![f.to_path_buf()]);
        let located = self.load_locations(files.as_deref(), file_name, cancel).await?;

        let resolved: Vec<(DiagnosticKey, Vec<NamedFix>)> = stream::iter(&located.locations)
            .map(|location| self.fixes_for_location(location, cancel))
            .buffered(self.settings.max_concurrent_diagnostics.max(1))
            .try_collect()
            .await?;

        let fixes: HashMap<DiagnosticKey, Vec<NamedFix>> = resolved.into_iter().collect();
        let response = CodeCheckResponse {
            quick_fixes: attach_fixes(located.locations, fixes),
        };

        self.observe(
            endpoints::CODE_CHECK_WITH_FIXES,
            file_name,
            started,
            response.quick_fixes.len(),
            response.fix_count(),
        );
        Ok(response)
    }

    /// [`Self::list_fixes_for_diagnostics`] for each file, merged into one response.
    pub async fn list_fixes_for_files(
        &self,
        files: &[Utf8PathBuf],
        cancel: &CancelSignal,
    ) -> Result<CodeCheckResponse, CoreError> {
        let shards: Vec<CodeCheckResponse> = stream::iter(files)
            .map(|file| self.list_fixes_for_diagnostics(Some(file.as_path()), cancel))
            .buffered(self.settings.max_concurrent_files.max(1))
            .try_collect()
            .await?;
        Ok(merge_all(shards))
    }

    /// Fixes that can be run in `file_name`, without computing their edits.
    pub async fn list_available_fixes(
        &self,
        file_name: &Utf8Path,
        selection: Option<Selection>,
        cancel: &CancelSignal,
    ) -> Result<AvailableFixesResponse, CoreError> {
        let started = Instant::now();
        let files = [file_name.to_path_buf()];
        let mut located = self
            .load_locations(Some(files.as_slice()), Some(file_name), cancel)
            .await?;
        if let Some(selection) = selection {
            located
                .locations
                .retain(|l| l.span().intersects(selection.start, selection.end));
        }

        let per_location: Vec<Vec<AvailableFix>> = stream::iter(&located.locations)
            .map(|location| async move {
                let candidates = self.candidates_for(location, cancel).await?;
                Ok::<_, Cancelled>(
                    candidates
                        .map(|(_, _, fixes)| fixes)
                        .unwrap_or_default()
                        .iter()
                        .map(|fix| AvailableFix {
                            identifier: fix.identifier().to_string(),
                            title: fix.title().to_string(),
                            diagnostic_id: fix.diagnostic_id.clone(),
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .buffered(self.settings.max_concurrent_diagnostics.max(1))
            .try_collect()
            .await?;

        let response = AvailableFixesResponse {
            code_actions: per_location.into_iter().flatten().collect(),
        };
        self.observe(
            endpoints::AVAILABLE_FIXES,
            Some(file_name),
            started,
            located.locations.len(),
            response.code_actions.len(),
        );
        Ok(response)
    }

    /// Compute one fix by identifier and optionally publish it.
    ///
    /// Side effects run against the live project. The live snapshot is replaced once, after every
    /// operation succeeded, and only when `apply_immediately` is set. A fix that fails to compute
    /// yields an empty response and publishes nothing.
    pub async fn run_named_fix(
        &self,
        request: &RunFixRequest,
        cancel: &CancelSignal,
    ) -> Result<RunFixResponse, CoreError> {
        let started = Instant::now();
        let file_name = request.file_name.as_path();
        let files = [request.file_name.clone()];
        let located = self
            .load_locations(Some(files.as_slice()), Some(file_name), cancel)
            .await?;

        let mut chosen = None;
        for location in &located.locations {
            let Some((_, snapshot, candidates)) = self.candidates_for(location, cancel).await?
            else {
                continue;
            };
            if let Some(fix) = candidates
                .into_iter()
                .find(|c| c.identifier() == request.identifier)
            {
                chosen = Some((location, snapshot, fix));
                break;
            }
        }

        let Some((location, base, fix)) = chosen else {
            return Err(CoreError::UnknownFix {
                file_name: request.file_name.clone(),
                identifier: request.identifier.clone(),
            });
        };

        let opts = ApplyOptions {
            wants_text_changes: request.wants_text_changes,
            wants_all_operations: request.wants_all_operations,
        };
        let live: &dyn LiveProject = self.project.as_ref();
        let directory = location.file_name.parent();

        let changes = match FixEngine::compute_changes(
            fix.fix.as_ref(),
            &base,
            directory,
            &opts,
            Some(live),
            cancel,
        )
        .await
        {
            Ok(changes) => changes,
            Err(EditError::Cancelled(c)) => return Err(c.into()),
            Err(err) => {
                error!(
                    provider = %fix.provider_id,
                    diagnostic = %fix.diagnostic_id,
                    fix = %fix.title(),
                    error = %err,
                    "an error occurred when running a code fix"
                );
                self.observe(endpoints::RUN_FIX, Some(file_name), started, 1, 0);
                return Ok(RunFixResponse::default());
            }
        };

        if request.apply_immediately {
            cancel.check()?;
            if changes.snapshot.version() == base.version() {
                debug!(fix = %fix.title(), "fix produced no content changes, nothing to publish");
            } else if !self
                .project
                .publish(base.version(), changes.snapshot.clone())
            {
                warn!(
                    fix = %fix.title(),
                    file = %file_name,
                    "publishing the fix was rejected because the project changed concurrently"
                );
            }
        }

        if !changes.deferred.is_empty() {
            debug!(deferred = ?changes.deferred, "side effects not executed");
        }

        let response = RunFixResponse {
            file_edits: changes.file_edits,
            opened: changes.opened,
        };
        self.observe(endpoints::RUN_FIX, Some(file_name), started, 1, 1);
        Ok(response)
    }

    async fn load_locations(
        &self,
        files: Option<&[Utf8PathBuf]>,
        target: Option<&Utf8Path>,
        cancel: &CancelSignal,
    ) -> Result<Located, CoreError> {
        cancel.check()?;
        let documents = match self.diagnostics.get_diagnostics(files).await {
            Ok(documents) => documents,
            Err(err) => {
                cancel.check()?;
                return Err(CoreError::DiagnosticSource(err));
            }
        };
        let documents = self.settings.rules.filter(documents);
        Ok(locate(&documents, target))
    }

    /// The document, snapshot and candidate fixes for one location.
    ///
    /// `None` when no provider handles the rule or the file is not in a loaded project.
    async fn candidates_for(
        &self,
        location: &DiagnosticLocation,
        cancel: &CancelSignal,
    ) -> Result<Option<(Document, ProjectSnapshot, Vec<RegisteredFix>)>, Cancelled> {
        let Some((document, snapshot)) = self.loaded_document(location, cancel).await? else {
            return Ok(None);
        };
        let target = FixTarget::from(location);
        let fixes = self
            .engine
            .candidate_fixes(&target, &document, &snapshot, cancel)
            .await?;
        Ok(Some((document, snapshot, fixes)))
    }

    async fn fixes_for_location(
        &self,
        location: &DiagnosticLocation,
        cancel: &CancelSignal,
    ) -> Result<(DiagnosticKey, Vec<NamedFix>), Cancelled> {
        let Some((document, snapshot)) = self.loaded_document(location, cancel).await? else {
            return Ok((location.original, Vec::new()));
        };
        let target = FixTarget::from(location);
        let resolutions = self
            .engine
            .fixes_for(&target, &document, &snapshot, cancel)
            .await?;
        Ok((
            location.original,
            resolutions
                .into_iter()
                .map(FixResolution::into_named_fix)
                .collect(),
        ))
    }

    async fn loaded_document(
        &self,
        location: &DiagnosticLocation,
        cancel: &CancelSignal,
    ) -> Result<Option<(Document, ProjectSnapshot)>, Cancelled> {
        cancel.check()?;
        if self
            .engine
            .registry()
            .applicable_providers(&location.id)
            .is_empty()
        {
            return Ok(None);
        }

        match self.project.wait_for_fully_loaded(&location.file_name).await {
            Ok(Some(document)) => Ok(Some((document, self.project.current_snapshot()))),
            Ok(None) => {
                debug!(file = %location.file_name, "file is not part of a loaded project");
                Ok(None)
            }
            Err(err) => {
                cancel.check()?;
                warn!(
                    file = %location.file_name,
                    error = %format!("{err:#}"),
                    "waiting for the project to load failed"
                );
                Ok(None)
            }
        }
    }

    fn observe(
        &self,
        endpoint: &'static str,
        file_name: Option<&Utf8Path>,
        started: Instant,
        locations: usize,
        fixes: usize,
    ) {
        self.observer.on_request(&RequestMetrics {
            endpoint,
            file_name: file_name.map(Utf8Path::to_path_buf),
            elapsed: started.elapsed(),
            locations,
            fixes,
        });
    }
}
