//! # Target and Modules
//!
//! The program being debugged, seen as an ordered list of loaded images.
//!
//! Each [`Module`] may provide a [`SymbolBackend`] that answers "does this
//! image define namespace / symbol X". Reading debug information is expensive,
//! so a module created with [`Module::new`] only parses its binary the first
//! time somebody asks for the backend. A binary that fails to load is logged and
//! then treated as a module without a backend; lookups skip it silently.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::SymbridgeResult;
use crate::symbols::{SymbolBackend, SymbolTable};

/// Loads a module's symbol backend from its path.
pub type BackendLoader = fn(&Path) -> SymbridgeResult<Box<dyn SymbolBackend>>;

fn load_dwarf_backend(path: &Path) -> SymbridgeResult<Box<dyn SymbolBackend>>
{
    Ok(Box::new(SymbolTable::from_object_file(path)?))
}

/// A loaded image (executable or shared library).
pub struct Module
{
    path: PathBuf,
    loader: Option<BackendLoader>,
    backend: OnceCell<Option<Box<dyn SymbolBackend>>>,
}

impl Module
{
    /// Module whose backend is read lazily from the binary's debug information.
    pub fn new(path: impl Into<PathBuf>) -> Self
    {
        Self::with_loader(path, load_dwarf_backend)
    }

    /// Module whose backend is produced lazily by `loader`.
    pub fn with_loader(path: impl Into<PathBuf>, loader: BackendLoader) -> Self
    {
        Self {
            path: path.into(),
            loader: Some(loader),
            backend: OnceCell::new(),
        }
    }

    /// Module with an already constructed backend.
    pub fn with_backend(path: impl Into<PathBuf>, backend: impl SymbolBackend + 'static) -> Self
    {
        let boxed: Box<dyn SymbolBackend> = Box::new(backend);
        Self {
            path: path.into(),
            loader: None,
            backend: OnceCell::with_value(Some(boxed)),
        }
    }

    /// Module that has no symbol information at all.
    pub fn without_backend(path: impl Into<PathBuf>) -> Self
    {
        Self {
            path: path.into(),
            loader: None,
            backend: OnceCell::with_value(None),
        }
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    /// File name component of the path, for log messages.
    pub fn file_name(&self) -> String
    {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |name| name.to_string_lossy().into_owned())
    }

    /// The module's symbol backend, loading it on first use.
    pub fn symbol_backend(&self) -> Option<&dyn SymbolBackend>
    {
        self.backend
            .get_or_init(|| {
                let loader = self.loader?;
                match loader(&self.path) {
                    Ok(backend) => {
                        tracing::debug!(module = %self.path.display(), "Loaded symbol backend");
                        Some(backend)
                    }
                    Err(err) => {
                        tracing::warn!(module = %self.path.display(), error = %err, "Failed to load symbol backend");
                        None
                    }
                }
            })
            .as_deref()
    }
}

impl fmt::Debug for Module
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Module")
            .field("path", &self.path)
            .field("backend_loaded", &self.backend.get().is_some())
            .finish()
    }
}

/// Ordered list of the modules a target has loaded.
#[derive(Debug, Default, Clone)]
pub struct ModuleList
{
    modules: Vec<Arc<Module>>,
}

impl ModuleList
{
    #[must_use]
    pub fn new() -> Self
    {
        Self { modules: Vec::new() }
    }

    pub fn append(&mut self, module: Module) -> Arc<Module>
    {
        let module = Arc::new(module);
        self.modules.push(Arc::clone(&module));
        module
    }

    pub fn len(&self) -> usize
    {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.modules.is_empty()
    }

    /// Module at position `index` in load order.
    pub fn module_at(&self, index: usize) -> Option<&Arc<Module>>
    {
        self.modules.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Module>>
    {
        self.modules.iter()
    }
}

/// The debugged program, as far as name resolution is concerned.
#[derive(Debug, Default)]
pub struct Target
{
    images: ModuleList,
}

impl Target
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Target whose images are already known.
    pub fn with_images(images: ModuleList) -> Self
    {
        Self { images }
    }

    pub fn images(&self) -> &ModuleList
    {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ModuleList
    {
        &mut self.images
    }
}
