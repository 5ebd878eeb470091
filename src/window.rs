use std::{sync::Arc, time::Instant};

use anyhow::Context;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use itertools::Itertools;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, Event, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    config::AppConfig,
    engine,
    rendering::renderer::Renderer,
    stage::Stage,
    views::{Sample, View},
};

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

impl ImguiState {
    fn new(window: &Window) -> Self {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // Disable INI support because it's broken in the published version of imgui
        context.set_ini_filename(None);

        Self { context, platform }
    }
}

struct App {
    config: AppConfig,
    stage: Stage,
    sample: Sample,
    view: Box<dyn View>,
    renderer: Option<Renderer>,
    imgui: Option<ImguiState>,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn from_config(config: AppConfig) -> Self {
        let (width, height) = config.window_size;
        let sample = config.initial_sample;
        let view = sample.create_view(&config);

        Self {
            stage: Stage::new(width, height),
            sample,
            view,
            renderer: None,
            imgui: None,
            last_frame: Instant::now(),
            error: None,
            config,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let (width, height) = self.config.window_size;
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window_title.clone())
            .with_inner_size(PhysicalSize::new(width, height));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );

        let mut imgui = ImguiState::new(&window);
        let renderer = pollster::block_on(Renderer::new(
            window.clone(),
            &mut imgui.context,
            &self.config.shader_folder,
        ))?;

        let size = window.inner_size();
        self.stage.resize(size.width, size.height);

        self.view
            .mount(&mut self.stage)
            .with_context(|| format!("Failed to mount {}", self.view.title()))?;

        self.renderer = Some(renderer);
        self.imgui = Some(imgui);

        Ok(())
    }

    fn switch_sample(&mut self, sample: Sample) -> anyhow::Result<()> {
        self.view
            .unmount(&mut self.stage)
            .with_context(|| format!("Failed to unmount {}", self.view.title()))?;

        let mut view = sample.create_view(&self.config);
        view.mount(&mut self.stage)
            .with_context(|| format!("Failed to mount {}", view.title()))?;
        log::info!("Switched to {}", view.title());

        self.view = view;
        self.sample = sample;

        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let (Some(renderer), Some(imgui)) = (self.renderer.as_mut(), self.imgui.as_mut()) else {
            return Ok(());
        };

        let delta_time = self.last_frame.elapsed();
        self.last_frame = Instant::now();
        imgui.context.io_mut().update_delta_time(delta_time);

        renderer.window.request_redraw();

        imgui
            .platform
            .prepare_frame(imgui.context.io_mut(), &renderer.window)
            .context("Failed to prepare Imgui frame")?;

        let ui = imgui.context.new_frame();

        let current = self.sample;
        let outputs = self.stage.output_labels().join(", ");
        let view = &mut self.view;
        let mut requested = None;
        ui.window("boxstage")
            .always_auto_resize(true)
            .build(|| {
                for (i, sample) in Sample::ALL.into_iter().enumerate() {
                    if i > 0 {
                        ui.same_line();
                    }
                    if ui.button(sample.label()) && sample != current {
                        requested = Some(sample);
                    }
                }
                ui.text_disabled(format!("output: {}", outputs));
                ui.separator();
                view.draw_ui(ui);
            });

        imgui.platform.prepare_render(ui, &renderer.window);

        engine::update(self.view.as_mut(), delta_time).context("Error during engine::update")?;

        let snapshot = self.view.render_frame();

        match renderer.render(snapshot.as_ref(), &mut imgui.context) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.resize(renderer.size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timeout");
            }
            Err(other) => {
                log::error!("Unexpected error: {:?}", other);
            }
        }

        if let Some(sample) = requested {
            self.switch_sample(sample)?;
        }

        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        if let Err(e) = self.open_window(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.stage.resize(new_size.width, new_size.height);
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(*new_size);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw(event_loop) {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                let captured = self
                    .imgui
                    .as_ref()
                    .is_some_and(|imgui| imgui.context.io().want_capture_keyboard);
                if !captured {
                    self.view.handle_key(key_event);
                }
            }
            _ => (),
        }

        if let (Some(renderer), Some(imgui)) = (self.renderer.as_ref(), self.imgui.as_mut()) {
            imgui.platform.handle_event::<()>(
                imgui.context.io_mut(),
                &renderer.window,
                &Event::WindowEvent { window_id, event },
            );
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let captured = self
            .imgui
            .as_ref()
            .is_none_or(|imgui| imgui.context.io().want_capture_mouse);
        if !captured {
            self.view.handle_device_event(&event);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.renderer.is_none() {
            return;
        }

        if let Err(e) = self.view.unmount(&mut self.stage) {
            log::error!("Failed to unmount {}: {:#}", self.view.title(), e);
        }
    }
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::from_config(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
