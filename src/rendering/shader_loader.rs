use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, channel},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use notify_debouncer_mini::{
    new_debouncer_opt, notify::*, DebounceEventResult, DebouncedEventKind, Debouncer,
};
use pollster::block_on;
use wgpu::PollType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShaderId {
    Lambert,
}

#[derive(Debug, Clone)]
pub(crate) struct ShaderDefinition {
    pub id: ShaderId,
    pub name: &'static str,
    path: &'static str,
    /// Compiled into the binary, used when the file can't be read.
    builtin: &'static str,
}

pub(crate) const LAMBERT_SHADER: ShaderDefinition = ShaderDefinition {
    id: ShaderId::Lambert,
    name: "Lambert shader",
    path: "lambert.wgsl",
    builtin: include_str!("../shaders/lambert.wgsl"),
};

pub(crate) type PipelineFactory = Arc<
    dyn Send
        + Sync
        + Fn(&wgpu::Device, &ShaderDefinition, &str) -> anyhow::Result<wgpu::RenderPipeline>,
>;

// Compiles a shader into a pipeline and recompiles it in the watcher thread
// whenever its file changes.
pub(crate) struct ShaderLoader {
    pipeline: wgpu::RenderPipeline,
    receiver: mpsc::Receiver<(ShaderId, wgpu::RenderPipeline)>,
    _debouncer: Option<Debouncer<RecommendedWatcher>>,
}

impl ShaderLoader {
    pub fn new(
        device: wgpu::Device,
        shader_folder: &Path,
        shader_def: ShaderDefinition,
        factory: PipelineFactory,
    ) -> anyhow::Result<Self> {
        let source = read_shader_source(shader_folder, &shader_def);
        let pipeline = compile(&device, &shader_def, &source, &factory)
            .with_context(|| format!("Failed to compile {}", shader_def.name))?;

        let (sender, receiver) = channel();

        // Hot reload is a development convenience; running without it is fine.
        let debouncer = match watch(shader_folder, device, shader_def, factory, sender) {
            Ok(debouncer) => Some(debouncer),
            Err(e) => {
                log::warn!("Shader hot reload disabled: {:#}", e);
                None
            }
        };

        Ok(Self {
            pipeline,
            receiver,
            _debouncer: debouncer,
        })
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub(crate) fn load_pending_shaders(&mut self) {
        while let Ok((id, pipeline)) = self.receiver.try_recv() {
            log::info!("Shader reloaded: {:?}", id);
            self.pipeline = pipeline;
        }
    }
}

fn read_shader_source(shader_folder: &Path, shader_def: &ShaderDefinition) -> Cow<'static, str> {
    let path = shader_folder.join(shader_def.path);
    match std::fs::read_to_string(&path) {
        Ok(source) => Cow::Owned(source),
        Err(e) => {
            log::debug!(
                "Using built-in {} ({} unreadable: {})",
                shader_def.name,
                path.display(),
                e
            );
            Cow::Borrowed(shader_def.builtin)
        }
    }
}

fn watch(
    shader_folder: &Path,
    device: wgpu::Device,
    shader_def: ShaderDefinition,
    factory: PipelineFactory,
    sender: mpsc::Sender<(ShaderId, wgpu::RenderPipeline)>,
) -> anyhow::Result<Debouncer<RecommendedWatcher>> {
    let absolute_shader_folder: PathBuf = shader_folder
        .canonicalize()
        .with_context(|| format!("Shader folder {} not found", shader_folder.display()))?;
    let folder = absolute_shader_folder.clone();

    let mut debouncer = new_debouncer_opt(
        notify_debouncer_mini::Config::default().with_timeout(Duration::from_millis(100)),
        move |res: DebounceEventResult| match res {
            Ok(events) => {
                let changed = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any && event.path.ends_with(shader_def.path)
                });
                if !changed {
                    return;
                }

                let source = read_shader_source(&folder, &shader_def);
                match compile(&device, &shader_def, &source, &factory) {
                    Ok(pipeline) => {
                        // The renderer is gone when this fails; nothing to do.
                        let _ = sender.send((shader_def.id, pipeline));
                    }
                    Err(e) => log::error!("Failed to reload {}: {:#}", shader_def.name, e),
                }
            }
            Err(e) => log::error!("Error debouncing shader changes: {}", e),
        },
    )
    .context("Failed to create shader watcher")?;

    debouncer
        .watcher()
        .watch(&absolute_shader_folder, RecursiveMode::Recursive)
        .context("Failed to watch shader folder")?;

    Ok(debouncer)
}

fn compile(
    device: &wgpu::Device,
    shader_def: &ShaderDefinition,
    source: &str,
    factory: &PipelineFactory,
) -> anyhow::Result<wgpu::RenderPipeline> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let pipeline = factory(device, shader_def, source);

    device
        .poll(PollType::Wait)
        .context("Failed to poll device after shader compilation.")?;

    if let Some(error) = block_on(device.pop_error_scope()) {
        return Err(anyhow::anyhow!(
            "Shader compilation failed for {}: {}",
            shader_def.name,
            error
        ));
    }

    pipeline
}
