use std::{
    collections::VecDeque,
    sync::{mpsc, Arc},
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use glyphquad::{TextAnchor, TextConfig, TextRenderer};
use rand::Rng;
use wgpu::{
    Color, CommandEncoderDescriptor, Device, DeviceDescriptor, LoadOp, Operations, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RequestAdapterOptions, StoreOp, Surface,
    SurfaceConfiguration, TextureView, TextureViewDescriptor,
};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

const WORDS: [&str; 10] = [
    "hello", "glyph", "你好", "cache", "quad", "世界", "wgpu", "Ωmega", "こんにちは", "textures",
];
const MAX_DANCERS: usize = 12;
const DANCER_LIFETIME: Duration = Duration::from_secs(4);

struct Dancer {
    text: String,
    x: f32,
    y: f32,
    scale: f32,
    color: [f32; 3],
    born: Instant,
}

// stops once the receiving end is gone
fn spawn_dancers(tx: mpsc::Sender<Dancer>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        loop {
            let dancer = Dancer {
                text: WORDS[rng.gen_range(0..WORDS.len())].to_string(),
                x: rng.gen_range(0.05..0.85),
                y: rng.gen_range(0.15..0.8),
                scale: rng.gen_range(0.5..2.0),
                color: [rng.gen(), rng.gen(), rng.gen()],
                born: Instant::now(),
            };
            if tx.send(dancer).is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(300));
        }
    })
}

#[derive(Default)]
struct FpsCounter {
    frames: VecDeque<Instant>,
}

impl FpsCounter {
    /// Records a frame and returns how many landed in the last second.
    fn tick(&mut self) -> usize {
        let now = Instant::now();
        self.frames.push_back(now);
        while self
            .frames
            .front()
            .is_some_and(|frame| now.duration_since(*frame) > Duration::from_secs(1))
        {
            self.frames.pop_front();
        }
        self.frames.len()
    }
}

struct Gpu {
    window: Arc<Window>,
    surface: Surface<'static>,
    device: Arc<Device>,
    queue: Arc<Queue>,
    config: SurfaceConfiguration,
    text: TextRenderer,
}

impl Gpu {
    fn new(window: Arc<Window>, font_path: &str) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window.clone())?;

        let (adapter, device, queue) = pollster::block_on(async {
            let adapter = instance
                .request_adapter(&RequestAdapterOptions {
                    compatible_surface: Some(&surface),
                    ..Default::default()
                })
                .await
                .ok_or(anyhow!("No suitable adapter found."))?;

            let (device, queue) = adapter
                .request_device(&DeviceDescriptor::default(), None)
                .await?;

            Ok::<(wgpu::Adapter, Device, Queue), anyhow::Error>((adapter, device, queue))
        })?;

        let config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or(anyhow!("Surface isn't supported by the adapter."))?;
        surface.configure(&device, &config);

        let device = Arc::new(device);
        let queue = Arc::new(queue);
        let text = TextRenderer::new(
            device.clone(),
            queue.clone(),
            config.format,
            config.width,
            config.height,
            font_path,
            TextConfig::default().with_shadow(true),
        )?;

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            text,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.text.resize(width, height);
    }

    fn clear(&self, view: &TextureView) {
        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor { label: None });
        encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("clear pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(Color {
                        r: 0.08,
                        g: 0.08,
                        b: 0.1,
                        a: 1.0,
                    }),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.queue.submit(Some(encoder.finish()));
    }

    fn draw(&mut self, dancers: &VecDeque<Dancer>, fps: usize) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        self.clear(&view);

        let white = [1.0, 1.0, 1.0];
        self.text
            .draw_text(&view, &format!("FPS: {fps}"), 0.0, 1.0, 1.0, TextAnchor::TopLeft, white)?;
        self.text
            .draw_text(&view, "glyphquad", 1.0, 1.0, 1.0, TextAnchor::TopRight, white)?;
        self.text.draw_text(
            &view,
            "Hello, 世界!",
            0.5,
            0.5,
            2.0,
            TextAnchor::Center,
            [1.0, 0.8, 0.2],
        )?;

        for dancer in dancers {
            let age = dancer.born.elapsed().as_secs_f32();
            let y = dancer.y + 0.03 * (age * 6.0).sin();
            self.text.draw_text(
                &view,
                &dancer.text,
                dancer.x,
                y,
                dancer.scale,
                TextAnchor::BottomLeft,
                dancer.color,
            )?;
        }

        let stats = self.text.cache_stats();
        let footer = format!(
            "glyphs cached: {}  hits: {}  misses: {}  evictions: {}",
            self.text.cache().len(),
            stats.hits,
            stats.misses,
            stats.evictions
        );
        let grey = [0.6, 0.6, 0.6];
        let line = self.text.line_height(0.75).unwrap_or(24.0);
        self.text.draw_text(
            &view,
            &footer,
            0.5,
            line / self.config.height as f32,
            0.75,
            TextAnchor::Bottom,
            grey,
        )?;
        self.text
            .draw_text(&view, "Esc to quit", 0.5, 0.0, 0.75, TextAnchor::Bottom, grey)?;

        frame.present();
        Ok(())
    }
}

struct HelloText {
    font_path: String,
    gpu: Option<Gpu>,
    incoming: mpsc::Receiver<Dancer>,
    dancers: VecDeque<Dancer>,
    fps: FpsCounter,
}

impl HelloText {
    fn new(font_path: String, incoming: mpsc::Receiver<Dancer>) -> Self {
        Self {
            font_path,
            gpu: None,
            incoming,
            dancers: VecDeque::new(),
            fps: FpsCounter::default(),
        }
    }

    fn update_dancers(&mut self) {
        self.dancers.extend(self.incoming.try_iter());
        self.dancers
            .retain(|dancer| dancer.born.elapsed() < DANCER_LIFETIME);
        while self.dancers.len() > MAX_DANCERS {
            self.dancers.pop_front();
        }
    }
}

impl ApplicationHandler for HelloText {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        let attributes = Window::default_attributes().with_title("hello text");
        let gpu = event_loop
            .create_window(attributes)
            .map_err(anyhow::Error::from)
            .and_then(|window| Gpu::new(Arc::new(window), &self.font_path));
        match gpu {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(err) => {
                log::error!("Couldn't start: {err:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.update_dancers();
                let fps = self.fps.tick();
                if let Some(gpu) = self.gpu.as_mut() {
                    if let Err(err) = gpu.draw(&self.dancers, fps) {
                        log::error!("Frame failed: {err:#}");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = self.gpu.as_ref() {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let font_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Roboto.ttf".into());

    let (tx, rx) = mpsc::channel();
    let producer = spawn_dancers(tx);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = HelloText::new(font_path, rx);
    event_loop.run_app(&mut app)?;

    // hanging up the receiver ends the producer
    drop(app);
    producer
        .join()
        .map_err(|_| anyhow!("Dancer thread panicked."))?;
    Ok(())
}
