use std::{fs, mem, path::PathBuf, process, sync::Arc};

use anyhow::Context;
use bytemuck::NoUninit;
use freehand::{
    capture::{strokes_from_commands, Response, StrokeCapture},
    config::{self, Config, Paint},
    math::{midpoint, vec2, Vec2f, Vec2u},
    path, render,
    viewport::{CoordinateTransform, Viewport},
};
use wgpu::{
    util::{DeviceExt, TextureDataOrder},
    Adapter, Backends, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, BlendState,
    Buffer, BufferBindingType, BufferDescriptor, BufferUsages, Color, ColorTargetState,
    ColorWrites, CommandEncoder, Device, DeviceDescriptor, Extent3d, FilterMode, FragmentState,
    InstanceDescriptor, LoadOp, MemoryHints, MultisampleState, Operations,
    PipelineCompilationOptions, PipelineLayoutDescriptor, PrimitiveState, PrimitiveTopology,
    Queue, RenderPass, RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline,
    RenderPipelineDescriptor, RequestAdapterOptions, SamplerBindingType, SamplerDescriptor,
    ShaderModuleDescriptor, ShaderSource, ShaderStages, Surface, SurfaceError, SurfaceTarget,
    Texture, TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType,
    TextureUsages, TextureViewDimension, VertexState,
};
use winit::{
    application::ApplicationHandler,
    event::{MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::NamedKey,
    window::{Window, WindowId},
};

use crate::{
    cmd::Cmd,
    input::{Button, Input, TouchPhase},
};

/// Maximum distance (in pixels) between a stroke's curve and the polyline that is stamped along.
const FLATTEN_TOLERANCE: f32 = 0.25;
/// Spacing between brush impressions, relative to the stroke width.
const STAMP_SPACING: f32 = 0.2;
const MIN_STAMP_SPACING_PX: f32 = 0.5;
/// Scroll distance of one wheel line, for devices that report pixels.
const PIXELS_PER_LINE: f32 = 40.0;
/// Side length of the round brush texture.
const BRUSH_SIZE: u32 = 32;

const BACKGROUND: Color = Color {
    r: 0.08,
    g: 0.08,
    b: 0.08,
    a: 1.0,
};
/// Color of the image's area. The image itself is not drawn.
const PAGE_COLOR: [f32; 4] = [0.92, 0.92, 0.9, 1.0];

pub struct App {
    instance: wgpu::Instance,
    paint: Paint,
    export: Option<PathBuf>,
    input: Input,
    board: Board,
    win: Option<Win>,
}

/// The strokes and the view they are shown in.
struct Board {
    capture: StrokeCapture,
    viewport: Viewport,
    /// The capture consumed the last pointer move of the gesture in progress, so panning and
    /// zooming are held back until the pointer goes up.
    claimed: bool,
}

impl Board {
    fn new(capture: StrokeCapture, viewport: Viewport) -> Self {
        Self {
            capture,
            viewport,
            claimed: false,
        }
    }

    /// Applies `cmd`, returning whether the window needs to be redrawn.
    fn apply(&mut self, cmd: Cmd) -> bool {
        match cmd {
            Cmd::PointerDown { index, position } => {
                self.capture.on_pointer_down(index, position);
                false
            }
            Cmd::PointerMove {
                position,
                active_pointers,
            } => {
                let response =
                    self.capture
                        .on_pointer_move(&self.viewport, position, active_pointers);
                self.claimed = response.is_consumed();
                response == Response::Changed
            }
            Cmd::PointerUp => {
                self.capture.on_pointer_up();
                self.claimed = false;
                true
            }
            Cmd::Pan { .. } | Cmd::Zoom { .. } if self.claimed => false,
            Cmd::Pan { delta } => {
                self.viewport.pan(delta);
                true
            }
            Cmd::Zoom { center, factor } => {
                self.viewport.scale_about(center, factor);
                true
            }
            Cmd::Clear => {
                log::info!("clearing strokes");
                self.capture.reset();
                true
            }
            Cmd::Undo => self.capture.undo(),
            Cmd::Redo => self.capture.redo(),
            Cmd::Fit => {
                self.viewport.fit();
                true
            }
            Cmd::Export => false,
        }
    }
}

struct Gpu {
    adapter: Adapter,
    device: Device,
    queue: Queue,
    /// Format of the window surface, used as the format of every render target.
    format: TextureFormat,

    render_pipeline: RenderPipeline,
    sampler_bg: BindGroup,

    texture_bgl: BindGroupLayout,
    uniforms_bgl: BindGroupLayout,
    instances_bgl: BindGroupLayout,
}

impl Gpu {
    fn new(
        instance: &wgpu::Instance,
        surface: &Surface<'_>,
        width: u32,
        height: u32,
    ) -> anyhow::Result<Self> {
        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            compatible_surface: Some(surface),
            ..Default::default()
        }))
        .context("failed to find a supported graphics adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(&DeviceDescriptor {
            memory_hints: MemoryHints::MemoryUsage,
            ..Default::default()
        }))?;

        let config = surface
            .get_default_config(&adapter, width, height)
            .context("adapter does not support surface")?;

        // Shader
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("shader"),
            source: ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let sampler_bgl = layout(
            &device,
            "sampler",
            ShaderStages::FRAGMENT,
            BindingType::Sampler(SamplerBindingType::Filtering),
        );
        let texture_bgl = layout(
            &device,
            "texture",
            ShaderStages::FRAGMENT,
            BindingType::Texture {
                sample_type: TextureSampleType::Float { filterable: true },
                view_dimension: TextureViewDimension::D2,
                multisampled: false,
            },
        );
        let uniforms_bgl = layout(
            &device,
            "uniforms",
            ShaderStages::VERTEX,
            buffer_binding(BufferBindingType::Uniform),
        );
        let instances_bgl = layout(
            &device,
            "instances",
            ShaderStages::VERTEX,
            buffer_binding(BufferBindingType::Storage { read_only: true }),
        );

        // Pipeline.
        let render_pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("main_render_pipeline"),
            layout: Some(&device.create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some("main_render_pipeline"),
                bind_group_layouts: &[&sampler_bgl, &texture_bgl, &uniforms_bgl, &instances_bgl],
                ..Default::default()
            })),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vertex"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[],
            },
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fragment"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: config.format,
                    blend: Some(BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: ColorWrites::all(),
                })],
            }),
            multiview: None,
            cache: None,
        });
        let sampler = device.create_sampler(&SamplerDescriptor {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..Default::default()
        });
        let sampler_bg = bind(&device, &sampler_bgl, BindingResource::Sampler(&sampler));

        Ok(Gpu {
            adapter,
            device,
            queue,
            format: config.format,
            render_pipeline,
            sampler_bg,
            texture_bgl,
            uniforms_bgl,
            instances_bgl,
        })
    }

    fn buffer(&self, size: u64, usage: BufferUsages) -> Buffer {
        self.device.create_buffer(&BufferDescriptor {
            label: None,
            size,
            usage: usage | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Uploads a premultiplied RGBA8 texture.
    fn texture_rgba(&self, width: u32, height: u32, data: &[u8]) -> Texture {
        self.device.create_texture_with_data(
            &self.queue,
            &TextureDescriptor {
                label: None,
                size: Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: TextureDimension::D2,
                format: TextureFormat::Rgba8Unorm,
                usage: TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            TextureDataOrder::MipMajor,
            data,
        )
    }
}

/// Layout of a bind group with a single entry at binding 0.
fn layout(device: &Device, label: &str, visibility: ShaderStages, ty: BindingType) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            count: None,
            visibility,
            ty,
        }],
    })
}

fn buffer_binding(ty: BufferBindingType) -> BindingType {
    BindingType::Buffer {
        ty,
        has_dynamic_offset: false,
        min_binding_size: None,
    }
}

fn bind(device: &Device, layout: &BindGroupLayout, resource: BindingResource<'_>) -> BindGroup {
    device.create_bind_group(&BindGroupDescriptor {
        label: None,
        layout,
        entries: &[BindGroupEntry {
            binding: 0,
            resource,
        }],
    })
}

/// Coverage mask of an anti-aliased disc filling a `size`x`size` square, as premultiplied white.
fn round_brush(size: u32) -> Vec<u8> {
    let radius = size as f32 / 2.0;
    let center = vec2(radius, radius);
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let pixel_center = vec2(x as f32 + 0.5, y as f32 + 0.5);
            let dist = (pixel_center - center).length();
            let coverage = (radius - dist).clamp(0.0, 1.0);
            let c = (coverage * 255.0).round() as u8;
            data.extend_from_slice(&[c; 4]);
        }
    }
    data
}

struct Win {
    window: Arc<Window>,
    surface: Surface<'static>,
    gpu: Gpu,

    /// Offscreen layer the strokes are stamped onto.
    canvas: Drawable,
    brush: Drawable,
    page: Drawable,
}

impl Win {
    fn recreate_swapchain(&self) {
        let res = self.window.inner_size();
        if res.width == 0 || res.height == 0 {
            return;
        }

        let config = self
            .surface
            .get_default_config(&self.gpu.adapter, res.width, res.height)
            .expect("adapter does not support surface");

        log::debug!(
            "configuring window surface for {}x{} (format: {:?}, present mode: {:?}, alpha mode: {:?})",
            res.width,
            res.height,
            config.format,
            config.present_mode,
            config.alpha_mode,
        );

        self.surface.configure(&self.gpu.device, &config);
    }

    fn redraw(&mut self, capture: &StrokeCapture, viewport: &Viewport, paint: &Paint) {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }

        let st = match self.surface.get_current_texture() {
            Ok(st) => st,
            Err(err @ (SurfaceError::Outdated | SurfaceError::Lost)) => {
                log::debug!("surface error: {}", err);
                self.recreate_swapchain();
                self.surface
                    .get_current_texture()
                    .expect("failed to acquire next frame after recreating swapchain")
            }
            Err(e) => {
                panic!("failed to acquire frame: {}", e);
            }
        };

        if self.canvas.texture.width() != size.width || self.canvas.texture.height() != size.height
        {
            log::debug!("resizing canvas to {}x{}", size.width, size.height);
            self.canvas = Drawable::empty(&self.gpu, size.width, size.height);
        }
        let window_size = vec2(size.width as f32, size.height as f32);

        // Impressions are stamped opaque and the whole canvas is blended with the paint's alpha,
        // so overlapping impressions (and strokes) don't build up.
        let stroke_color = config::Color {
            a: 0xff,
            ..paint.color
        }
        .premultiplied();
        let alpha = f32::from(paint.color.a) / 255.0;
        let width = paint.stroke_width;
        let spacing = (width * STAMP_SPACING).max(MIN_STAMP_SPACING_PX);

        let snapshot = capture.snapshot();
        let impressions: Vec<Instance> = render::render(viewport, &snapshot)
            .iter()
            .flat_map(|curve| render::stamp(&curve.flatten(FLATTEN_TOLERANCE), spacing))
            .map(|pos| Instance::new(pos, vec2(width, width), stroke_color))
            .collect();
        self.brush.set_instances(&self.gpu, &impressions);

        let source_size = viewport.source_size().as_f32();
        match (
            viewport.source_to_view(vec2(0.0, 0.0)),
            viewport.source_to_view(source_size),
        ) {
            (Some(min), Some(max)) => self.page.set_instances(
                &self.gpu,
                &[Instance::new(midpoint(min, max), max - min, PAGE_COLOR)],
            ),
            _ => self.page.clear(),
        }
        self.canvas.set_instances(
            &self.gpu,
            &[Instance::new(window_size / 2.0, window_size, [alpha; 4])],
        );

        let mut enc = self.gpu.device.create_command_encoder(&Default::default());

        let mut pass = Pass::new(&self.gpu, &mut enc, &self.canvas.texture, Color::TRANSPARENT);
        self.brush.draw(&mut pass);
        drop(pass);

        // Draw the image area and the strokes onto the window surface.
        let mut pass = Pass::new(&self.gpu, &mut enc, &st.texture, BACKGROUND);
        self.page.draw(&mut pass);
        self.canvas.draw(&mut pass);
        drop(pass);

        self.gpu.queue.submit([enc.finish()]);
        self.window.pre_present_notify();
        st.present();
    }
}

impl App {
    pub fn new(mut config: Config) -> anyhow::Result<Self> {
        let mut capture = StrokeCapture::for_stroke_width(config.paint.stroke_width);
        if let Some(file) = &config.load {
            let text = fs::read_to_string(file)
                .with_context(|| format!("failed to read strokes from '{}'", file.display()))?;
            let strokes = strokes_from_commands(&path::parse(&text)?)?;
            log::info!("loaded {} strokes from '{}'", strokes.len(), file.display());
            capture.load(strokes);
        }

        Ok(Self {
            instance: wgpu::Instance::new(&InstanceDescriptor {
                backends: Backends::PRIMARY,
                ..Default::default()
            }),
            board: Board::new(
                capture,
                Viewport::new(vec2(config.image.width, config.image.height)),
            ),
            input: Input::new(mem::take(&mut config.bind)),
            paint: config.paint,
            export: config.export,
            win: None,
        })
    }

    fn create_win(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Win> {
        let window = Arc::new(
            event_loop.create_window(Window::default_attributes().with_title("Freehand"))?,
        );

        let surface = self
            .instance
            .create_surface(SurfaceTarget::from(window.clone()))?;
        let res = window.inner_size();
        let gpu = Gpu::new(&self.instance, &surface, res.width.max(1), res.height.max(1))?;

        log::debug!(
            "creating canvas at {}x{}, format={:?}",
            res.width,
            res.height,
            gpu.format
        );
        let canvas = Drawable::empty(&gpu, res.width.max(1), res.height.max(1));
        let brush = Drawable::from_texture(
            &gpu,
            gpu.texture_rgba(BRUSH_SIZE, BRUSH_SIZE, &round_brush(BRUSH_SIZE)),
        );
        let page = Drawable::from_texture(&gpu, gpu.texture_rgba(1, 1, &[0xff; 4]));

        Ok(Win {
            window,
            surface,
            gpu,
            canvas,
            brush,
            page,
        })
    }

    fn handle(&mut self, cmd: Cmd) {
        let redraw = match cmd {
            Cmd::Export => {
                if let Err(e) = self.export() {
                    log::error!("export failed: {e:#}");
                }
                false
            }
            cmd => self.board.apply(cmd),
        };

        if redraw {
            if let Some(win) = &self.win {
                win.window.request_redraw();
            }
        }
    }

    /// Writes every closed stroke as `M`/`L` path data, one stroke per line.
    fn export(&self) -> anyhow::Result<()> {
        let mut out = String::new();
        for stroke in self.board.capture.strokes() {
            out.push_str(&path::serialize_all(&stroke.commands()));
            out.push('\n');
        }

        match &self.export {
            Some(file) => {
                fs::write(file, out)
                    .with_context(|| format!("failed to write '{}'", file.display()))?;
                log::info!(
                    "exported {} strokes to '{}'",
                    self.board.capture.strokes().len(),
                    file.display()
                );
            }
            None => print!("{out}"),
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.win.is_none() {
            let win = match self.create_win(event_loop) {
                Ok(win) => win,
                Err(e) => {
                    eprintln!("could not create window: {e}");
                    process::exit(1);
                }
            };
            win.recreate_swapchain();
            let size = win.window.inner_size();
            self.board.viewport.resize(vec2(size.width, size.height));
            self.win = Some(win);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(win) = &mut self.win else { return };

        let mut cmds = Vec::new();
        let mut send = |cmd: Cmd| cmds.push(cmd);
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                win.redraw(&self.board.capture, &self.board.viewport, &self.paint)
            },
            WindowEvent::Resized(size) => {
                win.recreate_swapchain();
                self.board.viewport.resize(vec2(size.width, size.height));
                win.window.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = vec2(position.x as f32, position.y as f32);
                self.input.cursor_moved(position, &mut send);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => Button::Draw,
                    MouseButton::Right | MouseButton::Middle => Button::Pan,
                    _ => return,
                };
                self.input.button(button, state.is_pressed(), &mut send);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                self.input.scrolled(lines, &mut send);
            }
            WindowEvent::Touch(touch) => {
                let phase = match touch.phase {
                    winit::event::TouchPhase::Started => TouchPhase::Started,
                    winit::event::TouchPhase::Moved => TouchPhase::Moved,
                    winit::event::TouchPhase::Ended | winit::event::TouchPhase::Cancelled => {
                        TouchPhase::Ended
                    }
                };
                let position = vec2(touch.location.x as f32, touch.location.y as f32);
                self.input.touch(touch.id, phase, position, &mut send);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                if let Some(key) = config_key(&event.logical_key) {
                    self.input.key_pressed(&key, &mut send);
                }
            }
            _ => {}
        }

        for cmd in cmds {
            self.handle(cmd);
        }
    }
}

fn config_key(key: &winit::keyboard::Key) -> Option<config::Key> {
    use winit::keyboard::Key;

    Some(match key {
        Key::Character(c) => c.as_str().parse().ok()?,
        Key::Named(NamedKey::Escape) => config::Key::Escape,
        Key::Named(NamedKey::Delete) => config::Key::Delete,
        Key::Named(NamedKey::Backspace) => config::Key::Backspace,
        Key::Named(NamedKey::Enter) => config::Key::Enter,
        Key::Named(NamedKey::Space) => config::Key::Space,
        Key::Named(NamedKey::Tab) => config::Key::Tab,
        _ => return None,
    })
}

#[derive(Clone, Copy, NoUninit)]
#[repr(C)]
struct Uniforms {
    render_target_size: Vec2u,
    _padding: Vec2u,
}

#[derive(Debug, Clone, Copy, NoUninit)]
#[repr(C)]
struct Instance {
    /// Center position in pixel coordinates.
    pos: Vec2f,
    size: Vec2f,
    /// Premultiplied RGBA, multiplied with the texture.
    color: [f32; 4],
}

impl Instance {
    fn new(pos: Vec2f, size: Vec2f, color: [f32; 4]) -> Self {
        Self { pos, size, color }
    }
}

struct Pass<'a> {
    gpu: &'a Gpu,
    pass: RenderPass<'a>,
    render_target_size: Vec2u,
}

impl<'a> Pass<'a> {
    fn new(gpu: &'a Gpu, enc: &'a mut CommandEncoder, target: &Texture, clear: Color) -> Self {
        let pass = enc.begin_render_pass(&RenderPassDescriptor {
            color_attachments: &[Some(RenderPassColorAttachment {
                view: &target.create_view(&Default::default()),
                depth_slice: None,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(clear),
                    ..Default::default()
                },
            })],
            ..Default::default()
        });

        Self {
            gpu,
            pass,
            render_target_size: vec2(target.width(), target.height()),
        }
    }
}

struct Drawable {
    texture: Texture,
    uniform_buf: Buffer,
    instance_buf: Buffer,
    texture_bg: BindGroup,
    uniforms_bg: BindGroup,
    instances_bg: BindGroup,
    instance_count: u32,
}

impl Drawable {
    fn empty(gpu: &Gpu, width: u32, height: u32) -> Self {
        let texture = gpu.device.create_texture(&TextureDescriptor {
            label: Some("canvas"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: gpu.format,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self::from_texture(gpu, texture)
    }

    fn from_texture(gpu: &Gpu, texture: Texture) -> Self {
        let uniform_buf = gpu.buffer(mem::size_of::<Uniforms>() as u64, BufferUsages::UNIFORM);
        // 1 instance preallocated
        let instance_buf = gpu.buffer(mem::size_of::<Instance>() as u64, BufferUsages::STORAGE);
        let texture_bg = bind(
            &gpu.device,
            &gpu.texture_bgl,
            BindingResource::TextureView(&texture.create_view(&Default::default())),
        );
        let uniforms_bg = bind(
            &gpu.device,
            &gpu.uniforms_bgl,
            BindingResource::Buffer(uniform_buf.as_entire_buffer_binding()),
        );
        let instances_bg = bind(
            &gpu.device,
            &gpu.instances_bgl,
            BindingResource::Buffer(instance_buf.as_entire_buffer_binding()),
        );

        Self {
            texture,
            uniform_buf,
            instance_buf,
            texture_bg,
            uniforms_bg,
            instances_bg,
            instance_count: 0,
        }
    }

    fn clear(&mut self) {
        self.instance_count = 0;
    }

    fn set_instances(&mut self, gpu: &Gpu, instances: &[Instance]) {
        self.instance_count = instances.len() as u32;
        if instances.is_empty() {
            return;
        }

        let size = (mem::size_of::<Instance>() * instances.len()) as u64;
        if self.instance_buf.size() < size {
            // Grow geometrically, strokes get longer one impression at a time.
            self.instance_buf = gpu.buffer(size.next_power_of_two(), BufferUsages::STORAGE);
            self.instances_bg = bind(
                &gpu.device,
                &gpu.instances_bgl,
                BindingResource::Buffer(self.instance_buf.as_entire_buffer_binding()),
            );
        }
        gpu.queue
            .write_buffer(&self.instance_buf, 0, bytemuck::cast_slice(instances));
    }

    fn draw(&self, p: &mut Pass<'_>) {
        if self.instance_count == 0 {
            return;
        }

        // Every `Drawable` is drawn at most once per submission, so its uniforms can be rewritten
        // here.
        let uniforms = Uniforms {
            render_target_size: p.render_target_size,
            _padding: vec2(0, 0),
        };
        p.gpu
            .queue
            .write_buffer(&self.uniform_buf, 0, bytemuck::bytes_of(&uniforms));

        p.pass.set_pipeline(&p.gpu.render_pipeline);
        p.pass.set_bind_group(0, &p.gpu.sampler_bg, &[]);
        p.pass.set_bind_group(1, &self.texture_bg, &[]);
        p.pass.set_bind_group(2, &self.uniforms_bg, &[]);
        p.pass.set_bind_group(3, &self.instances_bg, &[]);
        p.pass.draw(0..4, 0..self.instance_count);
    }
}
