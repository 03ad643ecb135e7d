use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use camino::Utf8Path;
use codefix_edit::{
    AppliedChanges, ApplyOptions, CancelSignal, Cancelled, Document, EditError, EditResult,
    LiveProject, ProjectSnapshot, apply_operations,
};
use codefix_types::edit::NamedFix;
use futures_util::FutureExt;
use tracing::{debug, error, warn};

use crate::provider::{CandidateFix, FixContext, FixProvider, FixTarget};
use crate::registry::ProviderRegistry;

/// What one provider produced for one diagnostic.
pub enum ProviderOutcome {
    NoFix,
    Fixes(Vec<Box<dyn CandidateFix>>),
    /// The provider returned an error or panicked. Anything it registered is discarded.
    Failed { reason: String },
}

impl std::fmt::Debug for ProviderOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderOutcome::NoFix => f.write_str("NoFix"),
            ProviderOutcome::Fixes(fixes) => f
                .debug_tuple("Fixes")
                .field(&fixes.iter().map(|x| x.title()).collect::<Vec<_>>())
                .finish(),
            ProviderOutcome::Failed { reason } => {
                f.debug_struct("Failed").field("reason", reason).finish()
            }
        }
    }
}

/// The result of turning a candidate fix into edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixResolution {
    Resolved(NamedFix),
    /// Operations could not be computed or applied; `fix` carries the title and no edits.
    Failed { fix: NamedFix, reason: String },
}

impl FixResolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, FixResolution::Resolved(_))
    }

    pub fn named_fix(&self) -> &NamedFix {
        match self {
            FixResolution::Resolved(fix) | FixResolution::Failed { fix, .. } => fix,
        }
    }

    pub fn into_named_fix(self) -> NamedFix {
        match self {
            FixResolution::Resolved(fix) | FixResolution::Failed { fix, .. } => fix,
        }
    }
}

/// A candidate fix together with where it came from.
pub struct RegisteredFix {
    pub provider_id: String,
    pub diagnostic_id: String,
    pub fix: Box<dyn CandidateFix>,
}

impl RegisteredFix {
    pub fn title(&self) -> &str {
        self.fix.title()
    }

    pub fn identifier(&self) -> &str {
        self.fix.identifier()
    }
}

/// Invokes providers for diagnostics and materializes their fixes.
///
/// Every (diagnostic, provider) invocation and every fix resolution is isolated: a failure or
/// panic costs at most that one provider's fixes or that one fix's edits. Cancellation is the only
/// error that escapes.
#[derive(Debug, Clone)]
pub struct FixEngine {
    registry: Arc<ProviderRegistry>,
}

impl FixEngine {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Ask one provider for candidate fixes.
    pub async fn invoke(
        provider: &dyn FixProvider,
        target: &FixTarget,
        document: &Document,
        snapshot: &ProjectSnapshot,
        cancel: &CancelSignal,
    ) -> Result<ProviderOutcome, Cancelled> {
        cancel.check()?;

        let mut ctx = FixContext::new(
            target.clone(),
            document.clone(),
            snapshot.clone(),
            cancel.clone(),
        );
        let result = AssertUnwindSafe(provider.register_fixes(&mut ctx))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(())) => {
                let fixes = ctx.into_fixes();
                if fixes.is_empty() {
                    Ok(ProviderOutcome::NoFix)
                } else {
                    Ok(ProviderOutcome::Fixes(fixes))
                }
            }
            Ok(Err(err)) => {
                cancel.check()?;
                warn!(
                    provider = %provider.id(),
                    diagnostic = %target.diagnostic_id,
                    file = %target.span.file_name,
                    error = %format!("{err:#}"),
                    "fix provider failed"
                );
                Ok(ProviderOutcome::Failed {
                    reason: format!("{err:#}"),
                })
            }
            Err(payload) => {
                let panic_msg = panic_payload_to_string(&payload);
                error!(
                    provider = %provider.id(),
                    diagnostic = %target.diagnostic_id,
                    file = %target.span.file_name,
                    panic = %panic_msg,
                    "fix provider panicked"
                );
                Ok(ProviderOutcome::Failed {
                    reason: format!("provider panicked: {panic_msg}"),
                })
            }
        }
    }

    /// Candidate fixes from every applicable provider, in registry then emission order.
    pub async fn candidate_fixes(
        &self,
        target: &FixTarget,
        document: &Document,
        snapshot: &ProjectSnapshot,
        cancel: &CancelSignal,
    ) -> Result<Vec<RegisteredFix>, Cancelled> {
        let mut out = Vec::new();
        for (descriptor, provider) in self.registry.applicable(&target.diagnostic_id) {
            match Self::invoke(provider, target, document, snapshot, cancel).await? {
                ProviderOutcome::Fixes(fixes) => {
                    debug!(
                        provider = %descriptor.id,
                        diagnostic = %target.diagnostic_id,
                        count = fixes.len(),
                        "provider registered fixes"
                    );
                    out.extend(fixes.into_iter().map(|fix| RegisteredFix {
                        provider_id: descriptor.id.clone(),
                        diagnostic_id: target.diagnostic_id.clone(),
                        fix,
                    }));
                }
                ProviderOutcome::NoFix | ProviderOutcome::Failed { .. } => {}
            }
        }
        Ok(out)
    }

    /// Compute a fix's edits in preview: nothing runs against the live project.
    pub async fn resolve(
        fix: &RegisteredFix,
        base: &ProjectSnapshot,
        document_directory: Option<&Utf8Path>,
        cancel: &CancelSignal,
    ) -> Result<FixResolution, Cancelled> {
        let changes = Self::compute_changes(
            fix.fix.as_ref(),
            base,
            document_directory,
            &ApplyOptions::default(),
            None,
            cancel,
        )
        .await;

        match changes {
            Ok(changes) => Ok(FixResolution::Resolved(NamedFix {
                message: fix.title().to_string(),
                file_edits: changes.file_edits,
            })),
            Err(EditError::Cancelled(c)) => Err(c),
            Err(err) => {
                error!(
                    provider = %fix.provider_id,
                    diagnostic = %fix.diagnostic_id,
                    fix = %fix.title(),
                    error = %err,
                    "an error occurred when computing a code fix"
                );
                Ok(FixResolution::Failed {
                    fix: NamedFix::title_only(fix.title()),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Compute a fix's operations and apply them to `base`.
    ///
    /// A panic anywhere in the fix's code becomes [`EditError::Runtime`].
    pub async fn compute_changes(
        fix: &dyn CandidateFix,
        base: &ProjectSnapshot,
        document_directory: Option<&Utf8Path>,
        opts: &ApplyOptions,
        live: Option<&dyn LiveProject>,
        cancel: &CancelSignal,
    ) -> EditResult<AppliedChanges> {
        let work = operations_then_apply(fix, base, document_directory, opts, live, cancel);
        match AssertUnwindSafe(work).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(EditError::Runtime(anyhow::anyhow!(
                "fix `{}` panicked: {}",
                fix.title(),
                panic_payload_to_string(&payload)
            ))),
        }
    }

    /// All fixes for one diagnostic, resolved in preview.
    pub async fn fixes_for(
        &self,
        target: &FixTarget,
        document: &Document,
        snapshot: &ProjectSnapshot,
        cancel: &CancelSignal,
    ) -> Result<Vec<FixResolution>, Cancelled> {
        let candidates = self
            .candidate_fixes(target, document, snapshot, cancel)
            .await?;
        let directory = target.span.file_name.parent();

        let mut out = Vec::with_capacity(candidates.len());
        for fix in &candidates {
            out.push(Self::resolve(fix, snapshot, directory, cancel).await?);
        }
        Ok(out)
    }
}

async fn operations_then_apply(
    fix: &dyn CandidateFix,
    base: &ProjectSnapshot,
    document_directory: Option<&Utf8Path>,
    opts: &ApplyOptions,
    live: Option<&dyn LiveProject>,
    cancel: &CancelSignal,
) -> EditResult<AppliedChanges> {
    cancel.check()?;
    let operations = match fix.operations(base, cancel).await {
        Ok(ops) => ops,
        Err(_) if cancel.is_cancelled() => return Err(EditError::Cancelled(Cancelled)),
        Err(err) => {
            return Err(EditError::Runtime(
                err.context(format!("compute operations for `{}`", fix.title())),
            ));
        }
    };
    apply_operations(&operations, base, document_directory, opts, live, cancel).await
}

fn panic_payload_to_string(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
