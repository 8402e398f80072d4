use std::cell::RefCell;
use std::rc::Rc;

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::core::{EditorError, EditorResult};
use crate::ecs::*;
use crate::module::{TextureCacheModule, TextureReloaded};
use crate::render::{DrawCommand, RenderBatch};
use crate::scene::{ComponentScheme, EditorScene, EntityScheme, LayerInfo};

type Log = Rc<RefCell<Vec<&'static str>>>;

struct Recording {
    label: &'static str,
    log: Log,
}

impl EngineSystem for Recording {
    fn process(&mut self, _world: &mut World, _managers: &mut Managers) -> EditorResult<()> {
        self.log.borrow_mut().push(self.label);
        Ok(())
    }

    crate::impl_as_any!();
}

struct Passive(Log);

impl EngineSystem for Passive {
    fn process(&mut self, _world: &mut World, _managers: &mut Managers) -> EditorResult<()> {
        self.0.borrow_mut().push("passive");
        Ok(())
    }

    crate::impl_as_any!();
}

fn sprite_scheme(name: &str, layer: u32, z: i32) -> EntityScheme {
    EntityScheme::new()
        .with(ComponentScheme::Name { name: name.into() })
        .with(ComponentScheme::Transform {
            position: [0.0, 0.0],
            scale: [1.0, 1.0],
            origin: [0.0, 0.0],
            rotation: 0.0,
        })
        .with(ComponentScheme::Sprite {
            texture: format!("{name}.png"),
            width: 8.0,
            height: 8.0,
            tint: [1.0; 4],
            flip_x: false,
            flip_y: false,
        })
        .with(ComponentScheme::Layer { id: layer })
        .with(ComponentScheme::ZIndex { value: z })
}

#[test]
fn test_process_requires_initialize() {
    let mut engine = EntityEngine::new();
    assert!(matches!(engine.process(), Err(EditorError::IllegalState(_))));
    engine.initialize().unwrap();
    assert!(engine.process().is_ok());
    assert!(engine.initialize().is_err());
}

#[test]
fn test_systems_run_in_order_and_passive_skipped() {
    let log: Log = Rc::default();
    let mut engine = EntityEngine::new();
    engine.set_system(Recording { label: "first", log: log.clone() }, false).unwrap();
    engine.set_system(Passive(log.clone()), true).unwrap();
    engine.initialize().unwrap();

    engine.set_delta(0.5);
    engine.process().unwrap();
    assert_eq!(*log.borrow(), vec!["first"]);

    engine.process_system::<Passive>().unwrap();
    assert_eq!(*log.borrow(), vec!["first", "passive"]);
    assert_eq!(engine.is_passive::<Passive>(), Some(true));

    let time = engine.world().resource::<Time>();
    assert_eq!(time.frame, 1);
    assert_eq!(time.elapsed_seconds, 0.5);
}

#[test]
fn test_same_type_manager_is_replaced() {
    let mut engine = EntityEngine::new();
    engine.set_manager(CameraManager::screen()).unwrap();
    engine
        .set_manager(CameraManager::new(SceneViewport::Fit, 10.0, 10.0))
        .unwrap();

    assert_eq!(engine.managers().len(), 1);
    assert_eq!(engine.manager::<CameraManager>().unwrap().viewport(), SceneViewport::Fit);
}

#[test]
fn test_fixed_types_reject_registration() {
    let log: Log = Rc::default();
    let mut engine = EntityEngine::new();
    EngineInfrastructure::empty()
        .with_manager(CameraManager::screen())
        .with_passive_system(Passive(log.clone()))
        .install(&mut engine)
        .unwrap();

    let err = engine
        .set_manager(CameraManager::new(SceneViewport::Fit, 10.0, 10.0))
        .unwrap_err();
    assert!(matches!(err, EditorError::IllegalState(_)));
    assert!(engine.set_system(Passive(log), false).is_err());
    assert_eq!(engine.manager::<CameraManager>().unwrap().viewport(), SceneViewport::Screen);
    assert_eq!(engine.is_passive::<Passive>(), Some(true));
}

#[test]
fn test_transaction_restores_replaced_entries() {
    let log: Log = Rc::default();
    let mut engine = EntityEngine::new();
    engine.set_manager(CameraManager::screen()).unwrap();
    engine.set_system(Recording { label: "old", log: log.clone() }, false).unwrap();

    let result: EditorResult<()> = engine.transaction(|engine| {
        engine.set_manager(CameraManager::new(SceneViewport::Fit, 10.0, 10.0))?;
        engine.set_system(Recording { label: "new", log: log.clone() }, false)?;
        engine.set_system(Passive(log.clone()), true)?;
        Err(EditorError::illegal_state("abort"))
    });
    assert!(result.is_err());
    assert_eq!(engine.managers().len(), 1);
    assert_eq!(engine.manager::<CameraManager>().unwrap().viewport(), SceneViewport::Screen);
    assert_eq!(engine.system_count(), 1);

    engine.initialize().unwrap();
    engine.process().unwrap();
    assert_eq!(*log.borrow(), vec!["old"]);

    engine
        .transaction(|engine| engine.set_manager(CameraManager::new(SceneViewport::Fit, 10.0, 10.0)))
        .unwrap();
    assert_eq!(engine.manager::<CameraManager>().unwrap().viewport(), SceneViewport::Fit);
}

#[test]
fn test_failed_build_despawns_entity() {
    let mut engine = EntityEngine::new();
    engine.set_manager(EntityProxyCache::new()).unwrap();

    let result = engine.build_entity(|entity| {
        entity.insert(ZIndex(1));
        Err(EditorError::illegal_state("nope"))
    });
    assert!(result.is_err());
    assert_eq!(engine.entity_count(), 0);
    assert!(engine.manager::<EntityProxyCache>().unwrap().is_empty());
}

#[test]
fn test_proxy_cache_tracks_entities() {
    let mut engine = EntityEngine::new();
    engine.set_manager(EntityProxyCache::new()).unwrap();

    let a = sprite_scheme("a", 0, 0).build(&mut engine).unwrap();
    let b = sprite_scheme("b", 0, 0).build(&mut engine).unwrap();
    assert_eq!(engine.world().get::<ProxyId>(b), Some(&ProxyId(1)));

    assert!(engine.despawn(a));
    assert!(!engine.despawn(a));
    let cache = engine.manager::<EntityProxyCache>().unwrap();
    assert_eq!(cache.entity(ProxyId(0)), None);
    assert_eq!(cache.get(b).map(|p| p.id), Some(ProxyId(1)));
}

#[test]
fn test_serializer_orders_by_layer_then_z() {
    let mut engine = EntityEngine::new();
    engine.set_manager(EntityProxyCache::new()).unwrap();
    engine.set_manager(EntitySerializerManager::new()).unwrap();

    sprite_scheme("top", 1, 0).build(&mut engine).unwrap();
    sprite_scheme("front", 0, 5).build(&mut engine).unwrap();
    sprite_scheme("back", 0, -1).build(&mut engine).unwrap();

    let schemes = engine
        .with_manager::<EntitySerializerManager, _>(|s, world| s.serialize_all(world))
        .unwrap();
    let names: Vec<_> = schemes.iter().filter_map(|s| s.name()).collect();
    assert_eq!(names, vec!["back", "front", "top"]);
    assert_eq!(schemes[0], sprite_scheme("back", 0, -1));
}

#[test]
fn test_texture_reload_bumps_generation() {
    let mut cache = TextureCacheModule::new();
    cache.register("hero.png", 8, 8);

    let mut engine = EntityEngine::new();
    engine.set_manager(TextureReloaderManager::new(cache.subscribe())).unwrap();
    engine.initialize().unwrap();
    let hero = sprite_scheme("hero", 0, 0).build(&mut engine).unwrap();
    let other = sprite_scheme("other", 0, 0).build(&mut engine).unwrap();

    cache.reload("hero.png");
    cache.reload("hero.png");
    engine.process().unwrap();

    assert_eq!(engine.world().get::<Sprite>(hero).unwrap().texture_generation, 2);
    assert_eq!(engine.world().get::<Sprite>(other).unwrap().texture_generation, 0);
    assert_eq!(engine.manager::<TextureReloaderManager>().unwrap().applied(), 2);
}

#[test]
fn test_reloader_survives_closed_channel() {
    let (tx, rx) = crossbeam_channel::unbounded::<TextureReloaded>();
    drop(tx);

    let mut engine = EntityEngine::new();
    engine.set_manager(TextureReloaderManager::new(rx)).unwrap();
    engine.initialize().unwrap();
    assert!(engine.process().is_ok());
}

#[test]
fn test_reloader_unsubscribes_on_dispose() {
    let cache = Rc::new(RefCell::new(TextureCacheModule::new()));
    cache.borrow_mut().register("hero.png", 8, 8);

    let mut engine = EntityEngine::new();
    engine.set_manager(TextureReloaderManager::subscribed(&cache)).unwrap();
    assert_eq!(cache.borrow().subscriber_count(), 1);

    engine.dispose();
    assert_eq!(cache.borrow().subscriber_count(), 0);
    assert_eq!(cache.borrow_mut().reload("hero.png"), Some(1));
}

#[test]
fn test_group_providers() {
    let mut engine = EntityEngine::new();
    engine.set_system(GroupIdProviderSystem::new(), true).unwrap();
    engine.set_system(GroupProxyProviderSystem::new(), true).unwrap();
    engine.initialize().unwrap();

    let a = sprite_scheme("a", 0, 0)
        .with(ComponentScheme::Groups { ids: vec![0, 2] })
        .build(&mut engine)
        .unwrap();
    engine.world_mut().get_mut::<Transform>(a).unwrap().position = Vec2::new(10.0, 0.0);
    sprite_scheme("b", 0, 0)
        .with(ComponentScheme::Groups { ids: vec![0] })
        .build(&mut engine)
        .unwrap();

    engine.process_system::<GroupIdProviderSystem>().unwrap();
    engine.process_system::<GroupProxyProviderSystem>().unwrap();

    let ids = engine.system_mut::<GroupIdProviderSystem>().unwrap();
    assert_eq!(ids.free_group_id(), 1);
    assert_eq!(ids.allocate(), 1);
    assert_eq!(ids.free_group_id(), 3);

    let proxies = engine.system::<GroupProxyProviderSystem>().unwrap();
    let group = proxies.proxy(0).unwrap();
    assert_eq!(group.entities.len(), 2);
    assert_eq!(group.bounds, Some((Vec2::ZERO, Vec2::new(18.0, 8.0))));
    assert_eq!(proxies.proxy(2).unwrap().entities, vec![a]);
}

#[test]
fn test_standard_infrastructure_renders_visible_layers() {
    let batch = RenderBatch::shared();
    let cache = Rc::new(RefCell::new(TextureCacheModule::new()));
    let mut scene = EditorScene::new("level", 320.0, 240.0);
    scene.layers.push(LayerInfo::new(1, "Hidden").hidden());

    let infrastructure = EngineInfrastructure::standard(&batch, &cache, &scene);
    assert!(infrastructure.has_manager::<CameraManager>());
    assert_eq!(cache.borrow().subscriber_count(), 1);

    let mut engine = EntityEngine::new();
    infrastructure.install(&mut engine).unwrap();
    engine.initialize().unwrap();
    engine.manager_mut::<CameraManager>().unwrap().resize(64, 64);

    sprite_scheme("shown", 0, 0).build(&mut engine).unwrap();
    sprite_scheme("hidden", 1, 0).build(&mut engine).unwrap();
    engine.process().unwrap();

    let batch = batch.borrow();
    let sprites: Vec<_> = batch
        .passes()
        .iter()
        .flat_map(|p| &p.commands)
        .filter_map(|c| match c {
            DrawCommand::Sprite { texture, .. } => Some(texture.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(sprites, vec!["shown.png"]);

    // 64x64 视口、32 像素网格：每个方向 -32, 0, 32 三条线
    let lines = batch
        .passes()
        .iter()
        .flat_map(|p| &p.commands)
        .filter(|c| matches!(c, DrawCommand::Line { .. }))
        .count();
    assert_eq!(lines, 6);
}
