//! 无窗口运行一个场景标签页
//!
//! 创建编辑器、项目、场景三级容器，加载几个实体，
//! 模拟一帧渲染和几次输入，最后把场景保存到临时目录。

use std::rc::Rc;

use anyhow::Context;
use bevy_ecs::entity::Entity;
use scene_editor::core::init_logging;
use scene_editor::ecs::{EntityName, ZIndexManipulatorManager};
use scene_editor::module::SceneTab;
use scene_editor::platform::{KeyCode, MouseButton};
use scene_editor::prelude::*;
use scene_editor::scene::{ComponentScheme, LayerInfo};

fn sprite(name: &str, x: f32, layer: u32) -> EntityScheme {
    EntityScheme::new()
        .with(ComponentScheme::Name { name: name.into() })
        .with(ComponentScheme::Transform {
            position: [x, 0.0],
            scale: [1.0, 1.0],
            origin: [0.0, 0.0],
            rotation: 0.0,
        })
        .with(ComponentScheme::Sprite {
            texture: format!("sprites/{name}.png"),
            width: 32.0,
            height: 32.0,
            tint: [1.0; 4],
            flip_x: false,
            flip_y: false,
        })
        .with(ComponentScheme::Layer { id: layer })
}

fn main() -> anyhow::Result<()> {
    let config = EditorConfig::load_or_default();
    init_logging(&config.logging);

    let workspace = tempfile::tempdir().context("creating project directory")?;
    let project = Project::new("demo", workspace.path());
    project.save()?;
    project.save_exporter_settings(&config.exporter)?;

    let graphics = Rc::new(HeadlessGraphics::new(800, 600));
    let editor = Rc::new(EditorModuleContainer::with_default_modules(graphics.clone(), config)?);
    let project_container = Rc::new(ProjectModuleContainer::with_project(editor, project)?);

    let mut scene = EditorScene::new("level_1", 800.0, 600.0);
    scene.layers.push(LayerInfo::new(1, "Foreground"));
    scene.schemes.push(sprite("tree", -64.0, 0));
    scene.schemes.push(sprite("hero", 0.0, 1));
    scene.schemes.push(sprite("rock", 64.0, 0));
    let scene_path = project_container
        .project()
        .map(|p| p.scenes_path().join("level_1.json"))
        .context("project not set")?;
    scene.save_to(&scene_path)?;
    let scene = EditorScene::load(&scene_path)?.into_shared();

    let batch = RenderBatch::shared();
    let mut container = SceneModuleContainer::new(project_container, SceneTab::new(0, "level_1"), scene, &batch)?;
    let camera = container.add(CameraModule::new())?;
    let io = container.add(SceneIoModule::new())?;
    container.init()?;
    container.on_show();
    container.resize()?;

    container.render(&batch)?;
    println!("frame 1: {} draw commands", batch.borrow().command_count());

    let press = InputEvent::new(
        InputEventType::TouchDown { pointer: 0, button: MouseButton::Right },
        400.0,
        300.0,
    );
    let drag = InputEvent::new(InputEventType::TouchDragged { pointer: 0 }, 350.0, 280.0);
    let scroll = InputEvent::new(InputEventType::Scrolled { amount: 2 }, 400.0, 300.0);
    println!("right press handled: {}", dispatch_input(&mut container, &press));
    dispatch_input(&mut container, &drag);
    dispatch_input(&mut container, &scroll);
    {
        let camera = camera.borrow();
        println!("camera at {:?}, zoom {:?}", camera.position(), camera.zoom());
    }

    let engine = container.entity_engine_mut();
    let mut names = engine.world_mut().query::<(Entity, &EntityName)>();
    let rock = names
        .iter(engine.world())
        .find(|(_, name)| name.0 == "rock")
        .map(|(entity, _)| entity);
    if let Some(rock) = rock {
        engine.with_manager::<ZIndexManipulatorManager, _>(|z, world| z.send_to_back(world, rock));
    }

    let home = InputEvent::new(InputEventType::KeyDown(KeyCode::Home), 0.0, 0.0);
    dispatch_input(&mut container, &home);

    graphics.set_size(1024, 768);
    container.resize()?;
    container.render(&batch)?;
    println!("frame 2: {} draw passes", batch.borrow().passes().len());

    container.save()?;
    println!("scene saved {} time(s) to {}", io.borrow().saves(), scene_path.display());

    container.on_hide();
    container.dispose();
    Ok(())
}
