use std::collections::HashMap;
use std::sync::Arc;

use navshell_types::{AsyncCallable, CallableKind, SyncCallable};

/// 可调用函数注册表 - 按函数名与调用方式管理外部函数
#[derive(Default)]
pub struct CallableRegistry {
    sync: HashMap<String, Arc<dyn SyncCallable>>,
    async_: HashMap<String, Arc<dyn AsyncCallable>>,
}

/// A registered callable of either kind.
#[derive(Clone)]
pub enum RegisteredCallable {
    Sync(Arc<dyn SyncCallable>),
    Async(Arc<dyn AsyncCallable>),
}

impl CallableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册同步函数
    pub fn register_sync(&mut self, name: &str, callable: impl SyncCallable) -> &mut Self {
        self.sync.insert(name.to_string(), Arc::new(callable));
        self
    }

    /// 注册异步函数
    pub fn register_async(&mut self, name: &str, callable: impl AsyncCallable) -> &mut Self {
        self.async_.insert(name.to_string(), Arc::new(callable));
        self
    }

    /// 按调用方式获取函数
    pub fn get(&self, name: &str, kind: CallableKind) -> Option<RegisteredCallable> {
        match kind {
            CallableKind::Sync => self.sync.get(name).cloned().map(RegisteredCallable::Sync),
            CallableKind::Async => self.async_.get(name).cloned().map(RegisteredCallable::Async),
        }
    }

    /// 获取所有已注册的函数名
    pub fn registered_names(&self) -> Vec<(String, CallableKind)> {
        let mut names: Vec<(String, CallableKind)> = self
            .sync
            .keys()
            .map(|n| (n.clone(), CallableKind::Sync))
            .chain(self.async_.keys().map(|n| (n.clone(), CallableKind::Async)))
            .collect();
        names.sort_by(|a, b| a.0.cmp(&b.0));
        names
    }
}
