//! 场景容器性能基准测试
//!
//! 测试输入逐模块转发、实体引擎单帧处理的开销

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scene_editor::module::{
    Module, Project, ProjectModuleContainer, SceneContext, SceneModule, SceneModuleContainer, SceneTab,
};
use scene_editor::platform::{
    dispatch_input, InputEvent, InputEventType, KeyCode, ModuleInput, MouseButton,
};
use scene_editor::prelude::{EditorConfig, EditorModuleContainer, HeadlessGraphics};
use scene_editor::render::{RenderBatch, SharedBatch};
use scene_editor::scene::{ComponentScheme, EditorScene, EntityScheme};

struct Listener<const N: usize> {
    hits: u64,
}

impl<const N: usize> Module for Listener<N> {}

impl<const N: usize> ModuleInput for Listener<N> {
    fn touch_down(&mut self, _: &InputEvent, _: f32, _: f32, _: u32, _: MouseButton) -> bool {
        self.hits += 1;
        false
    }

    fn key_down(&mut self, _: &InputEvent, _: KeyCode) -> bool {
        self.hits += 1;
        N == 0
    }
}

impl<const N: usize> SceneModule for Listener<N> {
    fn set_scene_context(&mut self, _context: SceneContext) {}
}

fn scene_container(scene: EditorScene, batch: &SharedBatch) -> SceneModuleContainer {
    let graphics = Rc::new(HeadlessGraphics::new(1280, 720));
    let editor = EditorModuleContainer::with_default_modules(graphics, EditorConfig::default()).unwrap();
    let project = ProjectModuleContainer::with_project(Rc::new(editor), Project::new("bench", "/tmp/bench")).unwrap();
    SceneModuleContainer::new(Rc::new(project), SceneTab::new(0, "bench"), scene.into_shared(), batch).unwrap()
}

fn with_listeners(count: usize) -> SceneModuleContainer {
    let batch = RenderBatch::shared();
    let mut container = scene_container(EditorScene::new("bench", 1280.0, 720.0), &batch);

    macro_rules! add {
        ($($n:literal),*) => {
            $(
                if $n < count {
                    container.add(Listener::<$n> { hits: 0 }).unwrap();
                }
            )*
        };
    }
    add!(0, 1, 2, 3, 4, 5, 6, 7);
    container.init().unwrap();
    container
}

fn bench_input_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("input_fan_out");
    let touch = InputEvent::new(
        InputEventType::TouchDown { pointer: 0, button: MouseButton::Left },
        10.0,
        10.0,
    );
    let key = InputEvent::new(InputEventType::KeyDown(KeyCode::A), 0.0, 0.0);

    for count in [1usize, 4, 8].iter() {
        let mut container = with_listeners(*count);
        group.bench_with_input(BenchmarkId::new("touch_down", count), count, |b, _| {
            b.iter(|| black_box(dispatch_input(&mut container, black_box(&touch))));
        });
        group.bench_with_input(BenchmarkId::new("key_down", count), count, |b, _| {
            b.iter(|| black_box(dispatch_input(&mut container, black_box(&key))));
        });
    }

    group.finish();
}

fn sprite_scheme(index: usize) -> EntityScheme {
    EntityScheme::new()
        .with(ComponentScheme::Name { name: format!("sprite_{index}") })
        .with(ComponentScheme::Transform {
            position: [(index % 64) as f32 * 16.0, (index / 64) as f32 * 16.0],
            scale: [1.0, 1.0],
            origin: [0.0, 0.0],
            rotation: 0.0,
        })
        .with(ComponentScheme::Sprite {
            texture: "tile.png".into(),
            width: 16.0,
            height: 16.0,
            tint: [1.0; 4],
            flip_x: false,
            flip_y: false,
        })
        .with(ComponentScheme::ZIndex { value: (index % 7) as i32 })
}

fn bench_engine_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_frame");

    for count in [100usize, 1000, 5000].iter() {
        let batch = RenderBatch::shared();
        let mut scene = EditorScene::new("bench", 1280.0, 720.0);
        scene.schemes = (0..*count).map(sprite_scheme).collect();
        let mut container = scene_container(scene, &batch);
        container.init().unwrap();
        container.resize().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                black_box(batch.borrow_mut().take_passes());
                container.render(&batch).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_input_fan_out, bench_engine_frame);
criterion_main!(benches);
