//! Compilation engine: fingerprint, compile or reuse, swap, migrate, retire.
//!
//! ```text
//! compile(paths)
//!   ├─ read + fingerprint ──unchanged + cached artifact──► load image ─┐
//!   └─ changed ──► script front-end ──errors──► Failed (nothing swapped) │
//!                        │ ok                                           │
//!                        ▼                                              ▼
//!                  write cache + debug copy ──────────────────► install(unit)
//!                                                      UnitLoaded → reload_all
//!                                                      → swap → retire previous
//! ```

mod artifact;
mod events;


pub use artifact::{ARTIFACT_DIR_NAME, ARTIFACT_EXTENSION, ArtifactStore, DIAGNOSTICS_FILE};
pub use events::{EventBus, ReloadEvent};

use crate::freshness::{FingerprintCache, hash_path_set, hash_sources};
use crate::logger::Console;
use crate::scene::{ObjectRegistry, audit, reload_all};
use crate::script::{Diagnostic, Severity, compile_sources, read_sources};
use crate::unit::{BEHAVIOUR, HostSurface, LoadContext, TypeHandle, Unit, UnitOrigin, UnloadOutcome};
use std::{path::PathBuf, sync::Arc, time::Instant};

/// Prefix of every script unit name.
pub const UNIT_NAME_PREFIX: &str = "ScriptAssembly_";

/// Stable unit name for a path set: prefix plus the first 8 upper-case hex
/// digits of the sorted-path digest. Collisions are not detected.
pub fn unit_name(paths: &[PathBuf]) -> String {
    let hex = hash_path_set(paths).to_hex();
    format!("{UNIT_NAME_PREFIX}{}", hex[..8].to_ascii_uppercase())
}

#[derive(Debug, Clone)]
pub enum CompileResult {
    /// Built from source and now current.
    Compiled(Arc<Unit>),
    /// Reused from the artifact cache and now current.
    Cached(Arc<Unit>),
    /// Compilation failed; nothing was swapped and the previous unit (if
    /// any) is still current.
    Failed(Vec<Diagnostic>),
}

impl CompileResult {
    pub fn unit(&self) -> Option<&Arc<Unit>> {
        match self {
            Self::Compiled(unit) | Self::Cached(unit) => Some(unit),
            Self::Failed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.unit().is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompilerOptions {
    pub debug_copies: bool,
    pub persist_diagnostics: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            debug_copies: true,
            persist_diagnostics: true,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompileStats {
    /// Front-end runs that produced a unit.
    pub compiles: usize,
    pub cache_hits: usize,
    pub failures: usize,
}

/// Owns the current unit and everything needed to replace it.
///
/// `compile` takes `&mut self`: callers sharing a compiler wrap it in a
/// mutex, which serializes compile and swap sequences.
pub struct ScriptCompiler {
    host: HostSurface,
    context: LoadContext,
    fingerprints: FingerprintCache,
    artifacts: ArtifactStore,
    registry: Arc<ObjectRegistry>,
    console: Console,
    events: Arc<EventBus>,
    options: CompilerOptions,
    stats: CompileStats,
}

impl ScriptCompiler {
    pub fn new(artifacts: ArtifactStore, console: Console) -> Self {
        Self {
            host: HostSurface::engine_core(),
            context: LoadContext::new(),
            fingerprints: FingerprintCache::new(),
            artifacts,
            registry: Arc::new(ObjectRegistry::new()),
            console,
            events: Arc::new(EventBus::new()),
            options: CompilerOptions::default(),
            stats: CompileStats::default(),
        }
    }

    /// Replace the host surface. Only meaningful before the first compile.
    pub fn with_host(mut self, host: HostSurface) -> Self {
        self.host = host;
        self
    }

    pub fn with_registry(mut self, registry: Arc<ObjectRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn host(&self) -> &HostSurface {
        &self.host
    }

    pub fn registry(&self) -> &Arc<ObjectRegistry> {
        &self.registry
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn context(&self) -> &LoadContext {
        &self.context
    }

    pub fn current_unit(&self) -> Option<Arc<Unit>> {
        self.context.current()
    }

    pub fn stats(&self) -> CompileStats {
        self.stats
    }

    /// Compile `paths` into a new current unit, reusing the cached artifact
    /// when no source changed. On failure the previous unit stays current.
    pub fn compile(&mut self, paths: &[PathBuf]) -> CompileResult {
        let start = Instant::now();
        if paths.is_empty() {
            return self.fail(vec![Diagnostic::error("no scripts provided")], paths);
        }

        let name = unit_name(paths);
        let (sources, read_errors) = read_sources(paths);
        if !read_errors.is_empty() {
            return self.fail(read_errors, paths);
        }

        let freshness = self.fingerprints.observe_all(&sources);
        let fingerprint = hash_sources(&sources).to_hex();

        if !freshness.any_changed() {
            match self.artifacts.load_cached(&name) {
                Ok(Some(image)) if image.fingerprint.as_deref() == Some(fingerprint.as_str()) => {
                    crate::debug!("compile"; "cache hit {} in {:?}", name, start.elapsed());
                    self.stats.cache_hits += 1;
                    let unit = Unit::from_image(image, UnitOrigin::Script);
                    self.install(Arc::clone(&unit));
                    return CompileResult::Cached(unit);
                }
                Ok(Some(_)) => crate::debug!("compile"; "cached {} is stale", name),
                Ok(None) => {}
                Err(e) => self.console.editor_warning(format!(
                    "[Compiler] ignoring cached artifact {}: {e}",
                    self.artifacts.cached_path(&name).display()
                )),
            }
        } else {
            crate::debug!("compile"; "{} of {} scripts changed", freshness.changed.len(), paths.len());
        }

        let compilation = compile_sources(&name, &sources, &self.host);
        let Some(image) = compilation.image else {
            return self.fail(compilation.diagnostics, paths);
        };
        let image = image.with_fingerprint(fingerprint);
        self.report_diagnostics(&compilation.diagnostics);

        if let Err(e) = self.artifacts.write_cached(&image) {
            self.console
                .editor_warning(format!("[Compiler] could not cache {name}: {e}"));
            // Without a fresh cache entry, the next unchanged compile must rebuild.
            self.invalidate(paths);
        }
        if self.options.debug_copies
            && let Err(e) = self.artifacts.write_debug_copy(&image)
        {
            self.console
                .editor_warning(format!("[Compiler] could not write debug copy of {name}: {e}"));
        }

        self.stats.compiles += 1;
        let unit = Unit::from_image(image, UnitOrigin::Script);
        self.console
            .editor_log(format!("[Compiler] compiled {} in {:?}", unit.identity(), start.elapsed()));
        self.events
            .emit(ReloadEvent::CompileSucceeded(unit.identity()));
        self.install(Arc::clone(&unit));
        CompileResult::Compiled(unit)
    }

    /// Retire the current unit. No-op when nothing is loaded.
    pub fn unload_current(&mut self) -> UnloadOutcome {
        let current = self.context.unload_current();
        self.report_retired(&current);
        current
    }

    /// Types the inspector may attach: concrete core behaviours plus the
    /// concrete components of the current unit.
    pub fn addable_component_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.host.addable_types().map(|c| c.name.clone()).collect();
        if let Some(unit) = self.context.current() {
            names.extend(
                unit.component_types()
                    .filter(|c| c.name != BEHAVIOUR)
                    .map(|c| c.name.clone()),
            );
        }
        names
    }

    /// Resolve a component type, current unit first.
    pub fn type_handle(&self, name: &str) -> Option<TypeHandle> {
        self.context
            .current()
            .and_then(|unit| TypeHandle::resolve(&unit, name))
            .or_else(|| self.host.handle(name))
    }

    /// Load `unit`, migrate the registry onto it, make it current, then
    /// retire the previous unit.
    fn install(&mut self, unit: Arc<Unit>) {
        let identity = unit.identity();
        self.console
            .editor_log(format!("[HotReload] loaded {identity}"));
        self.events.emit(ReloadEvent::UnitLoaded(identity));

        let report = reload_all(&self.registry, &unit, &self.host, &self.console);
        if report.migrated + report.orphaned + report.failed > 0 {
            crate::debug!(
                "reload";
                "migrated {}, orphaned {}, failed {}",
                report.migrated,
                report.orphaned,
                report.failed
            );
        }
        self.events.emit(ReloadEvent::Migrated(report));

        if let Some(previous) = self.context.install(unit) {
            let outcome = self.context.retire(previous);
            self.report_retired(&outcome);
        }

        for released in self.context.prune_retired() {
            self.console
                .editor_log(format!("[HotReload] {released} was released"));
            self.events.emit(ReloadEvent::UnitUnloaded(released));
        }
    }

    fn report_retired(&self, outcome: &UnloadOutcome) {
        match outcome {
            UnloadOutcome::Empty => {}
            UnloadOutcome::Unloaded(unit) => {
                self.console
                    .editor_log(format!("[HotReload] unloaded {unit}"));
                self.events.emit(ReloadEvent::UnitUnloaded(unit.clone()));
            }
            UnloadOutcome::Leaked { unit, refs } => {
                self.console.editor_warning(format!(
                    "[HotReload] {unit} was not unloaded: {refs} live reference(s) remain"
                ));
                let holders = audit(&self.registry, unit.id);
                for leak in &holders {
                    self.console
                        .editor_warning(format!("[HotReload]   {leak}"));
                }
                self.events.emit(ReloadEvent::UnitLeaked {
                    unit: unit.clone(),
                    holders,
                });
            }
        }
    }

    fn fail(&mut self, diagnostics: Vec<Diagnostic>, paths: &[PathBuf]) -> CompileResult {
        self.stats.failures += 1;
        self.invalidate(paths);
        self.report_diagnostics(&diagnostics);
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        self.console.editor_error(format!(
            "[Compiler] compilation failed with {}",
            crate::utils::plural::plural_count(errors, "error")
        ));
        CompileResult::Failed(diagnostics)
    }

    /// A failed set must recompile next time even if its content is unchanged.
    fn invalidate(&self, paths: &[PathBuf]) {
        for path in paths {
            self.fingerprints.invalidate(path);
        }
    }

    fn report_diagnostics(&self, diagnostics: &[Diagnostic]) {
        for d in diagnostics {
            match d.severity {
                Severity::Error => self.console.editor_error(d.to_string()),
                Severity::Warning => self.console.editor_warning(d.to_string()),
                Severity::Info => self.console.editor_log(d.to_string()),
            }
        }
        if self.options.persist_diagnostics
            && let Err(e) = self.artifacts.write_diagnostics(diagnostics)
        {
            crate::debug!("compile"; "could not write diagnostics: {}", e);
        }
        self.events
            .emit(ReloadEvent::CompileDiagnostics(diagnostics.to_vec()));
    }
}
