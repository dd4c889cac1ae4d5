//! Watch mode: keep the project's scripts compiled and hot-reloaded until
//! Ctrl+C.
//!
//! ```text
//! main thread                tokio runtime (2 workers)
//! ───────────                ─────────────────────────
//! watch_project ──block_on──► Coordinator ─► ChangeDetector
//!                                  │
//!                                  └──────► CompilerActor ─► spawn_blocking(compile)
//! reporter thread ◄── ReloadEvent ─────────────┘
//! ```

use super::common::open_compiler;
use crate::actor::{Coordinator, Project};
use crate::compiler::{ReloadEvent, ScriptCompiler};
use crate::config::ProjectConfig;
use crate::core::register_shutdown;
use crate::logger::status_detach;
use crate::scene::{Added, ObjectHandle};
use crate::utils::plural::plural_count;
use crate::{debug, log};
use anyhow::{Context, Result, bail};
use crossbeam::channel::Receiver;

/// Run the coordinator for `config`'s project until the shutdown signal.
pub fn watch_project(config: &ProjectConfig, sandbox: bool) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
    if !register_shutdown(shutdown_tx) {
        bail!("a watch session is already running in this process");
    }

    let compiler = open_compiler(config);
    let events = compiler.events().subscribe();
    std::thread::spawn(move || report_events(&events));

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let project = Project::from_config(config);
    rt.block_on(async {
        let handle = Coordinator::with_config(config, compiler)
            .with_shutdown_signal(shutdown_rx)
            .with_status(true)
            .start();

        log!(
            "watch";
            "watching {} for .{} changes (Ctrl+C to stop)",
            project.script_root().display(),
            project.extension()
        );
        handle.set_project(Some(project)).await?;

        // Held until shutdown so the sandbox objects stay registered.
        let _sandbox = if sandbox {
            handle.flush().await?;
            let sandbox = Sandbox::populate(&handle.compiler().lock());
            log!("watch"; "sandbox: {}", plural_count(sandbox.len(), "object"));
            status_detach();
            sandbox
        } else {
            Sandbox::default()
        };

        handle.wait().await
    })
}

/// Summarize reload events that the status line does not show.
fn report_events(events: &Receiver<ReloadEvent>) {
    for event in events {
        match event {
            ReloadEvent::Migrated(report) if report.migrated + report.orphaned + report.failed > 0 => {
                log!(
                    "reload";
                    "migrated {}, orphaned {}, failed {}",
                    report.migrated,
                    report.orphaned,
                    report.failed
                );
                status_detach();
            }
            ReloadEvent::UnitLeaked { unit, holders } => {
                log!(
                    "reload";
                    "{} is still held by {}",
                    unit,
                    plural_count(holders.len(), "component")
                );
                status_detach();
            }
            ReloadEvent::UnitUnloaded(unit) => debug!("reload"; "released {}", unit),
            ReloadEvent::ScriptsChanged => debug!("watch"; "scripts changed"),
            _ => {}
        }
    }
}

/// Objects spawned by `watch --sandbox`: one per addable component type,
/// so every reload has live instances to migrate.
#[derive(Default)]
pub struct Sandbox {
    objects: Vec<ObjectHandle>,
}

impl Sandbox {
    pub fn populate(compiler: &ScriptCompiler) -> Self {
        let mut objects = Vec::new();
        for name in compiler.addable_component_types() {
            let Some(ty) = compiler.type_handle(&name) else {
                continue;
            };
            let object = compiler
                .registry()
                .spawn(format!("Sandbox {name}"), compiler.host());
            match object.lock().add_component(ty) {
                Ok(Added::New(_)) => {}
                Ok(Added::Existing(_)) => debug!("sandbox"; "{} already attached", name),
                Err(e) => {
                    compiler
                        .console()
                        .editor_warning(format!("[Sandbox] could not add {name}: {e}"));
                    continue;
                }
            }
            objects.push(object);
        }
        Self { objects }
    }

    pub fn objects(&self) -> &[ObjectHandle] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
