//! wasmtime-backed element store.
//!
//! Compiles and instantiates the element-store module, resolves its C-ABI
//! exports, and implements both calling conventions on top of the exported
//! allocator and linear memory.

use std::path::Path;

use wasmtime::{Config, Engine, Instance, Linker, Memory, Module, OptLevel, Store, TypedFunc,
    WasmParams, WasmResults};
use wasmtime_wasi::preview1::{self, WasiP1Ctx};
use wasmtime_wasi::WasiCtxBuilder;

use crate::error::StoreError;
use crate::store::{truncate_to_char_boundary, ElementStore, GuestPtr, RawElementStore,
    StoreResult};

/// Element store backed by a compiled WebAssembly module.
pub struct WasmStore {
    store: Store<WasiP1Ctx>,
    memory: Memory,
    exports: ModuleExports,
}

impl std::fmt::Debug for WasmStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmStore").finish_non_exhaustive()
    }
}

/// Typed handles to the module's C-ABI exports.
struct ModuleExports {
    clear: TypedFunc<(), ()>,
    get_element_count: TypedFunc<(), i32>,
    add_element: TypedFunc<(i32,), ()>,
    append_child: TypedFunc<(i32, i32), ()>,
    get_first_child: TypedFunc<(i32,), i32>,
    set_element_attr: TypedFunc<(i32, i32, i32), ()>,
    get_element_attr: TypedFunc<(i32, i32), i32>,
    case_create_elements: TypedFunc<(), ()>,
    case_restruct_tree: TypedFunc<(), ()>,
    malloc: TypedFunc<(i32,), i32>,
    free: TypedFunc<(i32,), ()>,
}

impl WasmStore {
    /// Loads and instantiates the module at `path`.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| StoreError::ModuleRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_binary(&bytes)
    }

    /// Instantiates the module from its binary (or text) encoding.
    pub fn from_binary(bytes: &[u8]) -> StoreResult<Self> {
        let mut config = Config::new();
        config.cranelift_opt_level(OptLevel::Speed);
        let engine = Engine::new(&config).map_err(|e| StoreError::Compilation {
            reason: "failed to configure engine".to_string(),
            source: e,
        })?;

        let module = Module::new(&engine, bytes).map_err(|e| StoreError::Compilation {
            reason: "failed to compile module".to_string(),
            source: e,
        })?;

        let mut linker: Linker<WasiP1Ctx> = Linker::new(&engine);
        preview1::add_to_linker_sync(&mut linker, |ctx| ctx).map_err(|e| {
            StoreError::Instantiation {
                reason: "failed to link WASI".to_string(),
                source: e,
            }
        })?;
        // Emscripten modules may import host hooks beyond WASI; only fail
        // if such an import is actually called.
        linker
            .define_unknown_imports_as_traps(&module)
            .map_err(|e| StoreError::Instantiation {
                reason: "failed to stub unknown imports".to_string(),
                source: e,
            })?;

        let wasi = WasiCtxBuilder::new()
            .inherit_stdout()
            .inherit_stderr()
            .build_p1();
        let mut store = Store::new(&engine, wasi);

        let instance =
            linker
                .instantiate(&mut store, &module)
                .map_err(|e| StoreError::Instantiation {
                    reason: "failed to instantiate module".to_string(),
                    source: e,
                })?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| StoreError::ExportNotFound {
                name: "memory".to_string(),
            })?;

        let exports = ModuleExports {
            clear: typed_func(&mut store, &instance, "clear")?,
            get_element_count: typed_func(&mut store, &instance, "get_element_count")?,
            add_element: typed_func(&mut store, &instance, "add_element")?,
            append_child: typed_func(&mut store, &instance, "append_child")?,
            get_first_child: typed_func(&mut store, &instance, "get_first_child")?,
            set_element_attr: typed_func(&mut store, &instance, "set_element_attr")?,
            get_element_attr: typed_func(&mut store, &instance, "get_element_attr")?,
            case_create_elements: typed_func(&mut store, &instance, "case_create_elements")?,
            case_restruct_tree: typed_func(&mut store, &instance, "case_restruct_tree")?,
            malloc: typed_func(&mut store, &instance, "malloc")?,
            free: typed_func(&mut store, &instance, "free")?,
        };

        // Reactor-style modules expose their constructors through
        // `_initialize`; run it before any store call.
        if let Ok(initialize) =
            instance.get_typed_func::<(), ()>(&mut store, "_initialize")
        {
            initialize.call(&mut store, ()).map_err(trap)?;
        }

        Ok(Self {
            store,
            memory,
            exports,
        })
    }

    /// Allocate a guest buffer holding `value` as a NUL-terminated C string.
    fn alloc_cstr(&mut self, value: &str) -> StoreResult<GuestPtr> {
        let len = value.len() + 1;
        let ptr = self.alloc(len)?;
        self.write_cstr(ptr, len, value)?;
        Ok(ptr)
    }
}

/// Looks up a typed export function by name.
fn typed_func<Params, Results>(
    store: &mut Store<WasiP1Ctx>,
    instance: &Instance,
    name: &str,
) -> StoreResult<TypedFunc<Params, Results>>
where
    Params: WasmParams,
    Results: WasmResults,
{
    instance
        .get_typed_func::<Params, Results>(&mut *store, name)
        .map_err(|_| StoreError::ExportNotFound {
            name: name.to_string(),
        })
}

fn trap(e: wasmtime::Error) -> StoreError {
    StoreError::Trap {
        message: e.to_string(),
    }
}

impl ElementStore for WasmStore {
    fn clear(&mut self) -> StoreResult<()> {
        self.exports.clear.call(&mut self.store, ()).map_err(trap)
    }

    fn element_count(&mut self) -> StoreResult<u32> {
        self.element_count_raw()
    }

    fn add_element(&mut self, id: &str) -> StoreResult<()> {
        let id_ptr = self.alloc_cstr(id)?;
        let res = self
            .exports
            .add_element
            .call(&mut self.store, (id_ptr.0 as i32,));
        self.free(id_ptr)?;
        res.map_err(trap)
    }

    fn append_child(&mut self, parent_id: &str, child_id: &str) -> StoreResult<()> {
        let parent_ptr = self.alloc_cstr(parent_id)?;
        let child_ptr = self.alloc_cstr(child_id)?;
        let res = self
            .exports
            .append_child
            .call(&mut self.store, (parent_ptr.0 as i32, child_ptr.0 as i32));
        self.free(parent_ptr)?;
        self.free(child_ptr)?;
        res.map_err(trap)
    }

    fn first_child(&mut self, id: &str) -> StoreResult<String> {
        let id_ptr = self.alloc_cstr(id)?;
        let res = self
            .exports
            .get_first_child
            .call(&mut self.store, (id_ptr.0 as i32,));
        self.free(id_ptr)?;
        let child_ptr = res.map_err(trap)?;
        self.read_cstr(GuestPtr(child_ptr as u32))
    }

    fn set_attr(&mut self, id: &str, key: &str, value: &str) -> StoreResult<()> {
        let id_ptr = self.alloc_cstr(id)?;
        let key_ptr = self.alloc_cstr(key)?;
        let value_ptr = self.alloc_cstr(value)?;
        let res = self.exports.set_element_attr.call(
            &mut self.store,
            (id_ptr.0 as i32, key_ptr.0 as i32, value_ptr.0 as i32),
        );
        self.free(id_ptr)?;
        self.free(key_ptr)?;
        self.free(value_ptr)?;
        res.map_err(trap)
    }

    fn attr(&mut self, id: &str, key: &str) -> StoreResult<String> {
        let id_ptr = self.alloc_cstr(id)?;
        let key_ptr = self.alloc_cstr(key)?;
        let res = self
            .exports
            .get_element_attr
            .call(&mut self.store, (id_ptr.0 as i32, key_ptr.0 as i32));
        self.free(id_ptr)?;
        self.free(key_ptr)?;
        // The returned pointer aliases module-owned storage; never freed here.
        let value_ptr = res.map_err(trap)?;
        self.read_cstr(GuestPtr(value_ptr as u32))
    }

    fn create_elements(&mut self) -> StoreResult<()> {
        self.exports
            .case_create_elements
            .call(&mut self.store, ())
            .map_err(trap)
    }

    fn restruct_tree(&mut self) -> StoreResult<()> {
        self.exports
            .case_restruct_tree
            .call(&mut self.store, ())
            .map_err(trap)
    }

    fn raw(&mut self) -> &mut dyn RawElementStore {
        self
    }
}

impl RawElementStore for WasmStore {
    fn alloc(&mut self, len: usize) -> StoreResult<GuestPtr> {
        let ptr = self
            .exports
            .malloc
            .call(&mut self.store, (len as i32,))
            .map_err(trap)?;
        if ptr == 0 {
            return Err(StoreError::AllocFailed { len });
        }
        Ok(GuestPtr(ptr as u32))
    }

    fn free(&mut self, ptr: GuestPtr) -> StoreResult<()> {
        self.exports
            .free
            .call(&mut self.store, (ptr.0 as i32,))
            .map_err(trap)
    }

    fn write_cstr(&mut self, ptr: GuestPtr, capacity: usize, value: &str) -> StoreResult<()> {
        let truncated = truncate_to_char_boundary(value, capacity.saturating_sub(1));
        let mut bytes = Vec::with_capacity(truncated.len() + 1);
        bytes.extend_from_slice(truncated.as_bytes());
        bytes.push(0);
        self.memory
            .write(&mut self.store, ptr.0 as usize, &bytes)
            .map_err(|_| StoreError::MemoryAccess { addr: ptr.0 })
    }

    fn read_cstr(&mut self, ptr: GuestPtr) -> StoreResult<String> {
        if ptr.is_null() {
            return Ok(String::new());
        }
        let data = self.memory.data(&self.store);
        let start = ptr.0 as usize;
        if start >= data.len() {
            return Err(StoreError::MemoryAccess { addr: ptr.0 });
        }
        let tail = &data[start..];
        let len = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(StoreError::MemoryAccess { addr: ptr.0 })?;
        std::str::from_utf8(&tail[..len])
            .map(str::to_owned)
            .map_err(|_| StoreError::InvalidUtf8 { addr: ptr.0 })
    }

    fn add_element_raw(&mut self, id: GuestPtr) -> StoreResult<()> {
        self.exports
            .add_element
            .call(&mut self.store, (id.0 as i32,))
            .map_err(trap)
    }

    fn append_child_raw(&mut self, parent: GuestPtr, child: GuestPtr) -> StoreResult<()> {
        self.exports
            .append_child
            .call(&mut self.store, (parent.0 as i32, child.0 as i32))
            .map_err(trap)
    }

    fn first_child_raw(&mut self, id: GuestPtr) -> StoreResult<GuestPtr> {
        let ptr = self
            .exports
            .get_first_child
            .call(&mut self.store, (id.0 as i32,))
            .map_err(trap)?;
        Ok(GuestPtr(ptr as u32))
    }

    fn set_attr_raw(&mut self, id: GuestPtr, key: GuestPtr, value: GuestPtr) -> StoreResult<()> {
        self.exports
            .set_element_attr
            .call(&mut self.store, (id.0 as i32, key.0 as i32, value.0 as i32))
            .map_err(trap)
    }

    fn element_count_raw(&mut self) -> StoreResult<u32> {
        let count = self
            .exports
            .get_element_count
            .call(&mut self.store, ())
            .map_err(trap)?;
        Ok(count as u32)
    }
}
