//! 纹理重载同步
//!
//! 从 `TextureCacheModule` 订阅的通道中取出重载事件，
//! 更新引用该纹理的 `Sprite` 的代数，渲染时据此提交新纹理。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, TryRecvError};

use super::{EngineManager, Sprite};
use crate::module::{ModuleRef, TextureCacheModule, TextureReloaded};

#[derive(Debug)]
pub struct TextureReloaderManager {
    receiver: Receiver<TextureReloaded>,
    /// 释放时据此退订
    subscription: Option<(Weak<RefCell<TextureCacheModule>>, u64)>,
    applied: u64,
    disconnected: bool,
}

impl TextureReloaderManager {
    pub fn new(receiver: Receiver<TextureReloaded>) -> Self {
        Self {
            receiver,
            subscription: None,
            applied: 0,
            disconnected: false,
        }
    }

    /// 向纹理缓存订阅，`dispose` 时退订
    pub fn subscribed(cache: &ModuleRef<TextureCacheModule>) -> Self {
        let (id, receiver) = cache.borrow_mut().subscribe_with_id();
        Self {
            subscription: Some((Rc::downgrade(cache), id)),
            ..Self::new(receiver)
        }
    }

    /// 已应用的重载事件数
    pub fn applied(&self) -> u64 {
        self.applied
    }

    fn drain(&mut self) -> HashMap<String, u64> {
        let mut latest = HashMap::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let generation = latest.entry(event.path).or_insert(event.generation);
                    *generation = (*generation).max(event.generation);
                    self.applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        tracing::debug!(target: "texture", "Texture cache closed the reload channel");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
        latest
    }
}

impl EngineManager for TextureReloaderManager {
    fn before_process(&mut self, world: &mut World) {
        let latest = self.drain();
        if latest.is_empty() {
            return;
        }

        let mut query = world.query::<&mut Sprite>();
        for mut sprite in query.iter_mut(world) {
            if let Some(&generation) = latest.get(&sprite.texture) {
                sprite.texture_generation = generation;
            }
        }
        tracing::debug!(target: "texture", "Applied {} texture reloads", latest.len());
    }

    fn dispose(&mut self) {
        self.receiver = crossbeam_channel::never();
        self.disconnected = true;

        let Some((cache, id)) = self.subscription.take() else {
            return;
        };
        let Some(cache) = cache.upgrade() else {
            return;
        };
        match cache.try_borrow_mut() {
            Ok(mut cache) => {
                cache.unsubscribe(id);
            }
            Err(_) => tracing::warn!(target: "texture", "Texture cache busy, subscriber {} left for pruning", id),
        };
    }

    crate::impl_as_any!();
}
