//! 模块容器
//!
//! 保存某一作用域内的模块，维护插入顺序并驱动生命周期。
//! 同一类型的模块只能添加一次，否则按类型查找会有歧义。

use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{Module, ModuleLookup, ModuleRef};
use crate::core::{EditorError, EditorResult};

struct ModuleEntry<M: ?Sized> {
    type_id: TypeId,
    type_name: &'static str,
    /// 指向具体类型 `RefCell<T>` 的句柄，用于按类型向下转型
    handle: Rc<dyn Any>,
    module: Rc<RefCell<M>>,
}

pub struct ModuleContainer<M: ?Sized> {
    scope: &'static str,
    entries: Vec<ModuleEntry<M>>,
    initialized: Cell<bool>,
}

impl<M: Module + ?Sized> ModuleContainer<M> {
    pub fn new(scope: &'static str) -> Self {
        Self {
            scope,
            entries: Vec::new(),
            initialized: Cell::new(false),
        }
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    /// 添加模块
    ///
    /// `module` 必须与 `handle` 指向同一个对象，调用方负责把具体类型转换为 `M`。
    pub fn insert<T: Any>(&mut self, handle: ModuleRef<T>, module: Rc<RefCell<M>>) -> EditorResult<()> {
        self.ensure_absent::<T>()?;

        tracing::debug!(target: "module", scope = self.scope, "Adding module {}", type_name::<T>());
        self.entries.push(ModuleEntry {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            handle,
            module,
        });
        Ok(())
    }

    /// 移除模块，不调用其 `dispose`
    pub fn remove(&mut self, type_id: TypeId) -> Option<Rc<RefCell<M>>> {
        let index = self.entries.iter().position(|e| e.type_id == type_id)?;
        tracing::debug!(target: "module", scope = self.scope, "Removing module {}", self.entries[index].type_name);
        Some(self.entries.remove(index).module)
    }

    pub fn ensure_absent<T: Any>(&self) -> EditorResult<()> {
        if self.contains(TypeId::of::<T>()) {
            return Err(EditorError::DuplicateModule(type_name::<T>()));
        }
        Ok(())
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.entries.iter().any(|e| e.type_id == type_id)
    }

    pub fn find(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self.entries
            .iter()
            .find(|e| e.type_id == type_id)
            .map(|e| Rc::clone(&e.handle))
    }

    /// 当前模块列表的快照，遍历期间容器的修改不会影响本次遍历
    pub fn snapshot(&self) -> Vec<Rc<RefCell<M>>> {
        self.entries.iter().map(|e| Rc::clone(&e.module)).collect()
    }

    pub fn type_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.type_name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// 初始化所有模块：先依次 `init`，全部完成后再依次 `post_init`
    ///
    /// 只有全部模块初始化成功后容器才标记为已初始化。
    pub fn init_all(&self, lookup: &dyn ModuleLookup) -> EditorResult<()> {
        if self.initialized.get() {
            return Err(EditorError::illegal_state(format!(
                "{} module container already initialized",
                self.scope
            )));
        }

        let modules = self.snapshot();
        for module in &modules {
            module.borrow_mut().init(lookup)?;
        }
        for module in &modules {
            module.borrow_mut().post_init();
        }
        self.initialized.set(true);

        tracing::debug!(target: "module", scope = self.scope, "Initialized {} modules", modules.len());
        Ok(())
    }

    /// 初始化在容器初始化之后才加入的单个模块
    pub fn init_late(&self, module: &Rc<RefCell<M>>, lookup: &dyn ModuleLookup) -> EditorResult<()> {
        let mut module = module.borrow_mut();
        module.init(lookup)?;
        module.post_init();
        Ok(())
    }

    pub fn resize_all(&self) {
        for module in self.snapshot() {
            module.borrow_mut().resize();
        }
    }

    /// 逆序释放并清空所有模块
    pub fn dispose_all(&mut self) {
        for entry in self.entries.drain(..).rev() {
            entry.module.borrow_mut().dispose();
        }
        self.initialized.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleLookupExt;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Named {
        name: &'static str,
        log: Log,
    }

    impl Module for Named {
        fn init(&mut self, _modules: &dyn ModuleLookup) -> EditorResult<()> {
            self.log.borrow_mut().push(format!("init {}", self.name));
            Ok(())
        }

        fn post_init(&mut self) {
            self.log.borrow_mut().push(format!("post {}", self.name));
        }

        fn dispose(&mut self) {
            self.log.borrow_mut().push(format!("dispose {}", self.name));
        }
    }

    struct Other(Named);

    impl Module for Other {
        fn init(&mut self, modules: &dyn ModuleLookup) -> EditorResult<()> {
            self.0.init(modules)
        }

        fn post_init(&mut self) {
            self.0.post_init()
        }

        fn dispose(&mut self) {
            self.0.dispose()
        }
    }

    struct Local<'a>(&'a ModuleContainer<dyn Module>);

    impl ModuleLookup for Local<'_> {
        fn lookup_local(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
            self.0.find(type_id)
        }

        fn lookup_in_hierarchy(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
            self.0.find(type_id)
        }
    }

    fn add<T: Module>(container: &mut ModuleContainer<dyn Module>, module: T) -> EditorResult<ModuleRef<T>> {
        let handle = Rc::new(RefCell::new(module));
        let erased: Rc<RefCell<dyn Module>> = handle.clone();
        container.insert(handle.clone(), erased)?;
        Ok(handle)
    }

    #[test]
    fn test_lifecycle_order() {
        let log: Log = Rc::default();
        let mut container: ModuleContainer<dyn Module> = ModuleContainer::new("test");
        add(&mut container, Named { name: "a", log: log.clone() }).unwrap();
        add(&mut container, Other(Named { name: "b", log: log.clone() })).unwrap();

        container.init_all(&Local(&container)).unwrap();
        container.dispose_all();

        assert_eq!(
            *log.borrow(),
            vec!["init a", "init b", "post a", "post b", "dispose b", "dispose a"]
        );
        assert!(container.is_empty());
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let log: Log = Rc::default();
        let mut container: ModuleContainer<dyn Module> = ModuleContainer::new("test");
        add(&mut container, Named { name: "a", log: log.clone() }).unwrap();
        let err = add(&mut container, Named { name: "b", log }).err().unwrap();
        assert!(matches!(err, EditorError::DuplicateModule(_)));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_typed_lookup() {
        let log: Log = Rc::default();
        let mut container: ModuleContainer<dyn Module> = ModuleContainer::new("test");
        let handle = add(&mut container, Named { name: "a", log }).unwrap();

        let lookup = Local(&container);
        let found = lookup.get::<Named>().unwrap();
        assert!(Rc::ptr_eq(&found, &handle));
        assert!(lookup.get::<Other>().is_none());
        assert!(matches!(lookup.require::<Other>(), Err(EditorError::ModuleNotFound(_))));
    }

    struct Failing;

    impl Module for Failing {
        fn init(&mut self, _modules: &dyn ModuleLookup) -> EditorResult<()> {
            Err(EditorError::missing("texture atlas"))
        }
    }

    #[test]
    fn test_failed_init_leaves_container_uninitialized() {
        let log: Log = Rc::default();
        let mut container: ModuleContainer<dyn Module> = ModuleContainer::new("test");
        add(&mut container, Named { name: "a", log: log.clone() }).unwrap();
        add(&mut container, Failing).unwrap();

        assert!(container.init_all(&Local(&container)).is_err());
        assert!(!container.is_initialized());
        assert_eq!(*log.borrow(), vec!["init a"]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let log: Log = Rc::default();
        let mut container: ModuleContainer<dyn Module> = ModuleContainer::new("test");
        add(&mut container, Named { name: "a", log: log.clone() }).unwrap();
        add(&mut container, Failing).unwrap();
        add(&mut container, Other(Named { name: "b", log })).unwrap();

        assert!(container.remove(TypeId::of::<Failing>()).is_some());
        assert!(container.remove(TypeId::of::<Failing>()).is_none());
        assert_eq!(container.len(), 2);
        assert!(container.type_names()[1].ends_with("Other"));
    }

    #[test]
    fn test_double_init_fails() {
        let container: ModuleContainer<dyn Module> = ModuleContainer::new("test");
        container.init_all(&Local(&container)).unwrap();
        assert!(matches!(
            container.init_all(&Local(&container)),
            Err(EditorError::IllegalState(_))
        ));
    }
}
